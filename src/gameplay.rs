use macroquad::prelude::{
    DARKBLUE, DARKGRAY, DARKGREEN, DARKPURPLE, KeyCode, ORANGE, Rect, Vec2, debug, info, vec2, warn,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::clipboard::{ClipboardSink, SystemClipboard};
use crate::config::GameConfig;
use crate::model::*;
use crate::renderer::{DragView, Renderer};
use crate::reveal::RevealTimer;
use crate::session::{GameSession, SwapOutcome};

/// Normalised steps of a drag gesture over the player's bottles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragEvent {
    Start(usize),
    Enter(usize),
    Over(usize),
    Leave,
    /// Released over a slot, or over nothing we could resolve.
    Drop(Option<usize>),
    End,
}

pub enum Screen {
    Setup,
    Playing(GameSession),
}

pub struct GameEngine {
    config: GameConfig,
    bottle_count: BottleCount,
    screen: Screen,
    dragged: Option<usize>,
    drop_target: Option<usize>,
    dragging_slider: bool,
    pointer: Vec2,
    clock: f64,
    reveal_timer: RevealTimer,
    next_generation: u64,
    rng: StdRng,
    clipboard: Box<dyn ClipboardSink>,
    renderer: Renderer,
}

impl GameEngine {
    pub fn new(config: GameConfig) -> Self {
        Self::with_parts(config, StdRng::from_os_rng(), Box::new(SystemClipboard))
    }

    pub fn with_parts(config: GameConfig, rng: StdRng, clipboard: Box<dyn ClipboardSink>) -> Self {
        Self {
            config,
            bottle_count: config.default_bottle_count,
            screen: Screen::Setup,
            dragged: None,
            drop_target: None,
            dragging_slider: false,
            pointer: Vec2::ZERO,
            clock: 0.0,
            reveal_timer: RevealTimer::new(),
            next_generation: 0,
            rng,
            clipboard,
            renderer: Renderer::new(),
        }
    }

    pub fn get_session(&self) -> Option<&GameSession> {
        match &self.screen {
            Screen::Playing(session) => Some(session),
            Screen::Setup => None,
        }
    }

    fn get_session_mut(&mut self) -> Option<&mut GameSession> {
        match &mut self.screen {
            Screen::Playing(session) => Some(session),
            Screen::Setup => None,
        }
    }

    pub fn get_bottle_count(&self) -> BottleCount {
        self.bottle_count
    }

    pub fn get_dragged_slot(&self) -> Option<usize> {
        self.dragged
    }

    pub fn get_drop_target(&self) -> Option<usize> {
        self.drop_target
    }

    /// Advances the frame clock and fires a due reveal timer.
    pub fn update(&mut self, now: f64) {
        self.clock = now;
        let session = match &mut self.screen {
            Screen::Playing(session) => Some(session),
            Screen::Setup => None,
        };
        self.reveal_timer.poll(now, session);
    }

    pub fn render(&mut self) {
        self.renderer.autoset_viewport();
        let buttons = self.get_buttons();
        match &self.screen {
            Screen::Setup => {
                self.renderer.render_setup(self.get_bottle_count(), &buttons);
            }
            Screen::Playing(session) => {
                let drag = DragView {
                    dragged: self.get_dragged_slot(),
                    drop_target: self.get_drop_target(),
                    pointer: self.pointer,
                };
                self.renderer.render_game(session, &buttons, drag);
            }
        }
    }

    fn get_buttons(&self) -> Vec<Button> {
        match &self.screen {
            Screen::Setup => vec![
                Button::new("-", ControlAction::DecreaseBottles, DARKGRAY)
                    .disabled(self.bottle_count.get() == BottleCount::MIN),
                Button::new("+", ControlAction::IncreaseBottles, DARKGRAY)
                    .disabled(self.bottle_count.get() == BottleCount::MAX),
                Button::new(
                    &format!("Start Game with {} Bottles", self.bottle_count.get()),
                    ControlAction::StartGame,
                    DARKGREEN,
                ),
            ],
            Screen::Playing(session) => {
                let peek_label = if session.is_revealed() { "Revealed!" } else { "Peek (3s)" };
                vec![
                    Button::new(peek_label, ControlAction::Peek, DARKBLUE)
                        .disabled(session.is_revealed() || session.is_won()),
                    Button::new("New Game", ControlAction::NewGame, DARKGREEN),
                    Button::new("Change Bottle Count", ControlAction::ChangeSettings, DARKPURPLE),
                    Button::new("Copy Result", ControlAction::CopyResult, ORANGE),
                ]
            }
        }
    }

    pub fn handle_pointer_pressed(&mut self, x: f32, y: f32) {
        self.pointer = vec2(x, y);
        let Some(hit) = self.renderer.get_hit_test_registry().hit_test(x, y).copied() else {
            return;
        };
        match hit.item {
            HitItem::Button { action } => self.handle_game_action(action),
            HitItem::UserSlot { index } => self.handle_drag(DragEvent::Start(index)),
            HitItem::Slider => {
                self.dragging_slider = true;
                self.set_count_from_slider(hit.rect, x);
            }
        }
    }

    pub fn handle_pointer_moved(&mut self, x: f32, y: f32) {
        self.pointer = vec2(x, y);
        if self.dragging_slider {
            if let Some(slider) = self.renderer.get_hit_test_registry().find(HitItem::Slider).copied() {
                self.set_count_from_slider(slider.rect, x);
            }
            return;
        }
        if self.dragged.is_none() {
            return;
        }
        match self.slot_at(x, y) {
            Some(index) if self.drop_target == Some(index) => self.handle_drag(DragEvent::Over(index)),
            Some(index) => self.handle_drag(DragEvent::Enter(index)),
            None if self.drop_target.is_some() => self.handle_drag(DragEvent::Leave),
            None => {}
        }
    }

    pub fn handle_pointer_released(&mut self, x: f32, y: f32) {
        self.pointer = vec2(x, y);
        if self.dragging_slider {
            self.dragging_slider = false;
            return;
        }
        if self.dragged.is_none() {
            return;
        }
        let target = self.slot_at(x, y);
        self.handle_drag(DragEvent::Drop(target));
        self.handle_drag(DragEvent::End);
    }

    fn slot_at(&self, x: f32, y: f32) -> Option<usize> {
        match self.renderer.get_hit_test_registry().hit_test(x, y)?.item {
            HitItem::UserSlot { index } => Some(index),
            _ => None,
        }
    }

    fn set_count_from_slider(&mut self, track: Rect, x: f32) {
        if track.w > 0.0 {
            self.handle_game_action(ControlAction::SetBottleCount(
                BottleCount::from_slider_fraction((x - track.x) / track.w).get(),
            ));
        }
    }

    pub fn handle_drag(&mut self, event: DragEvent) {
        match event {
            DragEvent::Start(index) => {
                let Some(session) = self.get_session() else {
                    return;
                };
                if session.is_won() || index >= session.get_user_order().len() {
                    return;
                }
                self.dragged = Some(index);
                self.drop_target = None;
            }
            DragEvent::Enter(index) | DragEvent::Over(index) => {
                if self.dragged.is_some() {
                    self.drop_target = Some(index);
                }
            }
            DragEvent::Leave => {
                self.drop_target = None;
            }
            DragEvent::Drop(target) => {
                self.drop_target = None;
                let (Some(origin), Some(target)) = (self.dragged, target) else {
                    return;
                };
                let Some(session) = self.get_session_mut() else {
                    return;
                };
                let outcome = session.swap(origin, target);
                if outcome == SwapOutcome::Won {
                    self.reveal_timer.cancel();
                }
                if !outcome.is_counted() {
                    debug!("Drop {} -> {} ignored: {:?}", origin, target, outcome);
                }
            }
            DragEvent::End => {
                self.dragged = None;
                self.drop_target = None;
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyCode) {
        let action = match (&self.screen, key) {
            (Screen::Setup, KeyCode::Enter | KeyCode::KpEnter) => ControlAction::StartGame,
            (Screen::Setup, KeyCode::Left) => ControlAction::DecreaseBottles,
            (Screen::Setup, KeyCode::Right) => ControlAction::IncreaseBottles,
            (Screen::Playing(_), KeyCode::N) => ControlAction::NewGame,
            (Screen::Playing(_), KeyCode::P) => ControlAction::Peek,
            (Screen::Playing(_), KeyCode::C) => ControlAction::CopyResult,
            (Screen::Playing(_), KeyCode::Escape) => ControlAction::ChangeSettings,
            _ => return,
        };
        self.handle_game_action(action);
    }

    pub fn handle_game_action(&mut self, action: ControlAction) {
        match action {
            ControlAction::StartGame | ControlAction::NewGame => {
                self.start_game();
            }
            ControlAction::ChangeSettings => {
                self.reset();
            }
            ControlAction::IncreaseBottles => {
                self.set_bottle_count(self.bottle_count.change(1));
            }
            ControlAction::DecreaseBottles => {
                self.set_bottle_count(self.bottle_count.change(-1));
            }
            ControlAction::SetBottleCount(count) => {
                self.set_bottle_count(BottleCount::new(count));
            }
            ControlAction::Peek => {
                let (now, duration) = (self.clock, self.config.reveal_seconds);
                let Some(session) = self.get_session_mut() else {
                    return;
                };
                if session.reveal() {
                    let generation = session.get_generation();
                    self.reveal_timer.schedule(generation, now, duration);
                    info!("Peeking at game {} for {}s", generation, duration);
                }
            }
            ControlAction::CopyResult => {
                let Some(summary) = self.get_session().map(GameSession::get_summary) else {
                    return;
                };
                match self.clipboard.set_text(&summary) {
                    Ok(()) => info!("Copied result: {}", summary),
                    Err(e) => warn!("Could not copy result: {}", e),
                }
            }
        }
    }

    fn set_bottle_count(&mut self, count: BottleCount) {
        // The count is fixed for the lifetime of a session.
        if matches!(self.screen, Screen::Setup) {
            self.bottle_count = count;
        }
    }

    fn start_game(&mut self) {
        let generation = self.next_generation;
        self.next_generation += 1;
        self.clear_transient_state();
        let session = GameSession::new(self.bottle_count, generation, &mut self.rng);
        self.screen = Screen::Playing(session);
    }

    fn reset(&mut self) {
        self.clear_transient_state();
        self.screen = Screen::Setup;
        debug!("Returned to setup with {} bottles selected", self.bottle_count.get());
    }

    fn clear_transient_state(&mut self) {
        self.reveal_timer.cancel();
        self.dragged = None;
        self.drop_target = None;
        self.dragging_slider = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::testing::MemoryClipboard;

    fn engine_with(clipboard: MemoryClipboard) -> GameEngine {
        GameEngine::with_parts(GameConfig::default(), StdRng::seed_from_u64(11), Box::new(clipboard))
    }

    fn engine() -> GameEngine {
        engine_with(MemoryClipboard::default())
    }

    fn playing(count: usize) -> GameEngine {
        let mut engine = engine();
        engine.handle_game_action(ControlAction::SetBottleCount(count));
        engine.handle_game_action(ControlAction::StartGame);
        engine
    }

    fn solve(engine: &mut GameEngine) {
        loop {
            let session = engine.get_session().unwrap();
            if session.is_won() {
                return;
            }
            let reference = session.get_reference_order().to_vec();
            let user = session.get_user_order().to_vec();
            let slot = (0..reference.len()).find(|&i| reference[i] != user[i]).unwrap();
            let source = user.iter().position(|c| *c == reference[slot]).unwrap();
            engine.handle_drag(DragEvent::Start(source));
            engine.handle_drag(DragEvent::Drop(Some(slot)));
            engine.handle_drag(DragEvent::End);
        }
    }

    #[test]
    fn starts_on_setup_with_default_count() {
        let engine = engine();
        assert!(engine.get_session().is_none());
        assert_eq!(engine.get_bottle_count(), BottleCount::DEFAULT);
    }

    #[test]
    fn setup_count_adjusts_within_bounds() {
        let mut engine = engine();
        for _ in 0..20 {
            engine.handle_game_action(ControlAction::IncreaseBottles);
        }
        assert_eq!(engine.get_bottle_count().get(), 13);
        for _ in 0..20 {
            engine.handle_key(KeyCode::Left);
        }
        assert_eq!(engine.get_bottle_count().get(), 3);
        engine.handle_game_action(ControlAction::SetBottleCount(40));
        assert_eq!(engine.get_bottle_count().get(), 13);
    }

    #[test]
    fn start_game_deals_selected_count() {
        let engine = playing(7);
        let session = engine.get_session().unwrap();
        assert_eq!(session.get_count().get(), 7);
        assert_eq!(session.get_user_order().len(), 7);
        assert_eq!(session.get_swap_attempts(), 0);
    }

    #[test]
    fn count_is_frozen_during_a_game() {
        let mut engine = playing(4);
        engine.handle_game_action(ControlAction::IncreaseBottles);
        engine.handle_game_action(ControlAction::SetBottleCount(9));
        assert_eq!(engine.get_bottle_count().get(), 4);
        engine.handle_game_action(ControlAction::NewGame);
        assert_eq!(engine.get_session().unwrap().get_count().get(), 4);
    }

    #[test]
    fn drag_and_drop_swaps_slots() {
        let mut engine = playing(5);
        let before = engine.get_session().unwrap().get_user_order().to_vec();

        engine.handle_drag(DragEvent::Start(0));
        assert_eq!(engine.get_dragged_slot(), Some(0));
        engine.handle_drag(DragEvent::Enter(3));
        assert_eq!(engine.get_drop_target(), Some(3));
        engine.handle_drag(DragEvent::Drop(Some(3)));
        assert_eq!(engine.get_drop_target(), None);
        engine.handle_drag(DragEvent::End);
        assert_eq!(engine.get_dragged_slot(), None);

        let session = engine.get_session().unwrap();
        assert_eq!(session.get_user_order()[0], before[3]);
        assert_eq!(session.get_user_order()[3], before[0]);
        assert_eq!(session.get_swap_attempts(), 1);
    }

    #[test]
    fn unresolved_drop_clears_hover_without_swapping() {
        let mut engine = playing(5);
        let before = engine.get_session().unwrap().clone();

        engine.handle_drag(DragEvent::Start(1));
        engine.handle_drag(DragEvent::Over(2));
        engine.handle_drag(DragEvent::Drop(None));
        engine.handle_drag(DragEvent::End);

        assert_eq!(engine.get_drop_target(), None);
        assert_eq!(engine.get_session().unwrap(), &before);
    }

    #[test]
    fn drop_on_origin_is_not_counted() {
        let mut engine = playing(5);
        engine.handle_drag(DragEvent::Start(2));
        engine.handle_drag(DragEvent::Drop(Some(2)));
        engine.handle_drag(DragEvent::End);
        assert_eq!(engine.get_session().unwrap().get_swap_attempts(), 0);
    }

    #[test]
    fn hover_without_drag_is_ignored() {
        let mut engine = playing(5);
        engine.handle_drag(DragEvent::Enter(1));
        assert_eq!(engine.get_drop_target(), None);
        engine.handle_drag(DragEvent::Drop(Some(1)));
        assert_eq!(engine.get_session().unwrap().get_swap_attempts(), 0);
    }

    #[test]
    fn leave_clears_drop_target() {
        let mut engine = playing(5);
        engine.handle_drag(DragEvent::Start(0));
        engine.handle_drag(DragEvent::Enter(4));
        engine.handle_drag(DragEvent::Leave);
        assert_eq!(engine.get_drop_target(), None);
        assert_eq!(engine.get_dragged_slot(), Some(0));
    }

    #[test]
    fn drags_cannot_start_after_victory() {
        let mut engine = playing(6);
        solve(&mut engine);
        let session = engine.get_session().unwrap();
        assert!(session.is_won());
        assert!(session.is_revealed());

        engine.handle_drag(DragEvent::Start(0));
        assert_eq!(engine.get_dragged_slot(), None);
    }

    #[test]
    fn peek_hides_after_reveal_duration() {
        let mut engine = playing(5);
        engine.update(100.0);
        engine.handle_game_action(ControlAction::Peek);
        assert!(engine.get_session().unwrap().is_revealed());

        engine.update(102.5);
        assert!(engine.get_session().unwrap().is_revealed());
        engine.update(103.0);
        assert!(!engine.get_session().unwrap().is_revealed());
    }

    #[test]
    fn reveal_is_permanent_once_won_during_peek() {
        let mut engine = playing(4);
        engine.update(1.0);
        engine.handle_key(KeyCode::P);
        solve(&mut engine);
        engine.update(10.0);
        assert!(engine.get_session().unwrap().is_revealed());
    }

    #[test]
    fn stale_peek_does_not_touch_new_game() {
        let mut engine = playing(5);
        engine.update(0.0);
        engine.handle_game_action(ControlAction::Peek);
        engine.handle_game_action(ControlAction::NewGame);

        engine.update(1.0);
        engine.handle_game_action(ControlAction::Peek);
        engine.update(3.5);
        assert!(engine.get_session().unwrap().is_revealed());
        engine.update(4.0);
        assert!(!engine.get_session().unwrap().is_revealed());
    }

    #[test]
    fn change_settings_discards_session() {
        let mut engine = playing(8);
        engine.handle_drag(DragEvent::Start(0));
        engine.handle_key(KeyCode::Escape);
        assert!(engine.get_session().is_none());
        assert_eq!(engine.get_dragged_slot(), None);
        assert_eq!(engine.get_bottle_count().get(), 8);
    }

    #[test]
    fn new_game_gets_fresh_generation() {
        let mut engine = playing(5);
        let first = engine.get_session().unwrap().get_generation();
        engine.handle_key(KeyCode::N);
        let second = engine.get_session().unwrap().get_generation();
        assert!(second > first);
        assert_eq!(engine.get_session().unwrap().get_swap_attempts(), 0);
    }

    #[test]
    fn copy_result_writes_summary() {
        let clipboard = MemoryClipboard::default();
        let copied = clipboard.copied.clone();
        let mut engine = engine_with(clipboard);

        engine.handle_game_action(ControlAction::CopyResult);
        assert!(copied.borrow().is_empty());

        engine.handle_game_action(ControlAction::StartGame);
        engine.handle_key(KeyCode::C);
        let expected = engine.get_session().unwrap().get_summary();
        assert_eq!(copied.borrow().as_slice(), &[expected]);
    }

    #[test]
    fn copy_failure_is_swallowed() {
        let clipboard = MemoryClipboard { fail: true, ..Default::default() };
        let mut engine = engine_with(clipboard);
        engine.handle_game_action(ControlAction::StartGame);
        engine.handle_game_action(ControlAction::CopyResult);
        assert!(engine.get_session().is_some());
    }

    #[test]
    fn pointer_gestures_route_through_hit_test() {
        let mut engine = playing(5);
        let before = engine.get_session().unwrap().get_user_order().to_vec();
        {
            let registry = engine.renderer.get_hit_test_registry_mut();
            registry.push(Rect::new(0.0, 0.0, 50.0, 100.0), HitItem::UserSlot { index: 0 }, 0);
            registry.push(Rect::new(60.0, 0.0, 50.0, 100.0), HitItem::UserSlot { index: 1 }, 1);
        }

        engine.handle_pointer_pressed(10.0, 10.0);
        assert_eq!(engine.get_dragged_slot(), Some(0));
        engine.handle_pointer_moved(70.0, 20.0);
        assert_eq!(engine.get_drop_target(), Some(1));
        engine.handle_pointer_moved(55.0, 20.0);
        assert_eq!(engine.get_drop_target(), None);
        engine.handle_pointer_moved(80.0, 20.0);
        engine.handle_pointer_released(80.0, 20.0);

        assert_eq!(engine.get_dragged_slot(), None);
        let after = engine.get_session().unwrap().get_user_order();
        assert_eq!(after[0], before[1]);
        assert_eq!(after[1], before[0]);
    }

    #[test]
    fn pointer_release_off_target_cancels() {
        let mut engine = playing(5);
        engine
            .renderer
            .get_hit_test_registry_mut()
            .push(Rect::new(0.0, 0.0, 50.0, 100.0), HitItem::UserSlot { index: 0 }, 0);
        engine.handle_pointer_pressed(10.0, 10.0);
        engine.handle_pointer_released(500.0, 500.0);
        assert_eq!(engine.get_dragged_slot(), None);
        assert_eq!(engine.get_session().unwrap().get_swap_attempts(), 0);
    }

    #[test]
    fn slider_drag_sets_count() {
        let mut engine = engine();
        engine
            .renderer
            .get_hit_test_registry_mut()
            .push(Rect::new(100.0, 0.0, 200.0, 20.0), HitItem::Slider, 0);

        engine.handle_pointer_pressed(100.0, 10.0);
        assert_eq!(engine.get_bottle_count().get(), 3);
        engine.handle_pointer_moved(200.0, 300.0);
        assert_eq!(engine.get_bottle_count().get(), 8);
        engine.handle_pointer_moved(900.0, 300.0);
        assert_eq!(engine.get_bottle_count().get(), 13);
        engine.handle_pointer_released(900.0, 300.0);
        engine.handle_pointer_moved(100.0, 10.0);
        assert_eq!(engine.get_bottle_count().get(), 13);
    }

    #[test]
    fn pointer_press_on_button_runs_action() {
        let mut engine = engine();
        engine.renderer.get_hit_test_registry_mut().push(
            Rect::new(0.0, 0.0, 100.0, 40.0),
            HitItem::Button { action: ControlAction::StartGame },
            0,
        );
        engine.handle_pointer_pressed(20.0, 20.0);
        assert!(engine.get_session().is_some());
    }

    #[test]
    fn peek_button_disabled_while_revealed() {
        let mut engine = playing(5);
        let peek = |engine: &GameEngine| {
            engine
                .get_buttons()
                .into_iter()
                .find(|b| b.get_action() == ControlAction::Peek)
                .unwrap()
        };
        assert!(peek(&engine).is_enabled());
        assert_eq!(peek(&engine).get_label(), "Peek (3s)");
        engine.handle_game_action(ControlAction::Peek);
        assert!(!peek(&engine).is_enabled());
        assert_eq!(peek(&engine).get_label(), "Revealed!");
    }
}
