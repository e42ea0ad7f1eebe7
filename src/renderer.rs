use std::{collections::HashMap, sync::Mutex};

use macroquad::prelude::*;

use crate::config::WINDOW_TITLE;
use crate::model::{
    BottleColor, BottleCount, Button, ControlAction, HIDDEN_BOTTLE_COLOR, HitItem, HitTestRegistry,
};
use crate::session::GameSession;

const BACKGROUND: Color = Color::new(0.11, 0.12, 0.20, 1.0);
const PANEL: Color = Color::new(0.17, 0.18, 0.29, 1.0);
const MUTED_TEXT: Color = Color::new(0.75, 0.77, 0.85, 1.0);
const WIN_TEXT: Color = Color::new(0.60, 0.98, 0.60, 1.0);

#[derive(Hash, PartialEq, Eq, Clone, Debug)]
struct TextCacheKey {
    text: String,
    w_px: u16,
    h_px: u16,
}

/// Font size plus the offset that centres the text in its rect. The y offset
/// is to the baseline.
type TextFit = (f32, f32, f32);

pub struct CachedTextSizer {
    cache: Mutex<HashMap<TextCacheKey, TextFit>>,
}

impl CachedTextSizer {
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn get_text_fit(&self, text: &str, rect_width: f32, rect_height: f32) -> TextFit {
        let key = TextCacheKey {
            text: text.to_string(),
            w_px: rect_width.round().clamp(0.0, u16::MAX as f32) as u16,
            h_px: rect_height.round().clamp(0.0, u16::MAX as f32) as u16,
        };

        if let Ok(cache) = self.cache.lock()
            && let Some(fit) = cache.get(&key)
        {
            return *fit;
        }

        let fit = Self::measure(text, rect_width, rect_height);
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, fit);
        }
        fit
    }

    fn measure(text: &str, rect_width: f32, rect_height: f32) -> TextFit {
        let reference_size = 100u16;
        let dimensions = measure_text(text, None, reference_size, 1.0);
        if dimensions.width <= 0.0 || dimensions.height <= 0.0 {
            return (0.0, 0.0, 0.0);
        }
        let scale = (rect_width / dimensions.width).min(rect_height / dimensions.height);
        let final_width = dimensions.width * scale;
        let final_height = dimensions.height * scale;
        let offset_x = (rect_width - final_width) / 2.0;
        let offset_y = (rect_height - final_height) / 2.0 + dimensions.offset_y * scale;
        (reference_size as f32 * scale, offset_x, offset_y)
    }
}

/// Transient drag state the router hands over for drawing.
#[derive(Copy, Clone, Debug)]
pub struct DragView {
    pub dragged: Option<usize>,
    pub drop_target: Option<usize>,
    pub pointer: Vec2,
}

#[derive(Copy, Clone, Debug, Default)]
struct BottleStyle {
    hidden: bool,
    dimmed: bool,
    highlighted: bool,
}

pub struct Renderer {
    cached_text_sizer: CachedTextSizer,
    hit_test: HitTestRegistry,
    draw_order: usize,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            cached_text_sizer: CachedTextSizer::new(),
            hit_test: HitTestRegistry::new(),
            draw_order: 0,
            x: 0.0,
            y: 0.0,
            width: 1024.0,
            height: 720.0,
        }
    }

    fn next_order(&mut self) -> usize {
        let o = self.draw_order;
        self.draw_order += 1;
        o
    }

    pub fn get_hit_test_registry(&self) -> &HitTestRegistry {
        &self.hit_test
    }

    #[cfg(test)]
    pub fn get_hit_test_registry_mut(&mut self) -> &mut HitTestRegistry {
        &mut self.hit_test
    }

    pub fn set_viewport(&mut self, x: f32, y: f32, width: f32, height: f32) -> bool {
        if self.x == x && self.y == y && self.width == width && self.height == height {
            return false;
        }
        self.x = x;
        self.y = y;
        self.width = width;
        self.height = height;
        true
    }

    pub fn autoset_viewport(&mut self) -> bool {
        let (screen_w, screen_h) = (screen_width(), screen_height());
        self.set_viewport(0.0, 0.0, screen_w, screen_h)
    }

    fn begin_frame(&mut self) {
        self.hit_test.clear();
        self.draw_order = 0;
        clear_background(BACKGROUND);
    }

    /// Splits the viewport into stacked bands, each a fraction of the height.
    fn bands<const N: usize>(&self, fractions: [f32; N]) -> [Rect; N] {
        let padding = 10.0;
        let inner_w = self.width - 2.0 * padding;
        let inner_h = self.height - 2.0 * padding;
        let mut y = self.y + padding;
        fractions.map(|f| {
            let rect = Rect::new(self.x + padding, y, inner_w, inner_h * f);
            y += inner_h * f;
            rect
        })
    }

    pub fn render_setup(&mut self, count: BottleCount, buttons: &[Button]) {
        self.begin_frame();
        let [title, heading, selection, slider, labels, preview_heading, preview, legend, start] =
            self.bands([0.09, 0.06, 0.06, 0.06, 0.05, 0.05, 0.22, 0.27, 0.10]);

        self.render_text(WINDOW_TITLE, inset(title, 0.2, 0.1), WHITE);
        self.render_text("Game Setup", inset(heading, 0.35, 0.1), MUTED_TEXT);
        self.render_text(
            &format!("Select Number of Bottles: {}", count.get()),
            inset(selection, 0.3, 0.1),
            WHITE,
        );

        let step_width = slider.h * 1.6;
        let track = Rect::new(
            slider.x + step_width + 20.0,
            slider.y,
            slider.w - 2.0 * (step_width + 20.0),
            slider.h,
        );
        self.render_slider(count, track);
        for button in buttons {
            let rect = match button.get_action() {
                ControlAction::DecreaseBottles => Rect::new(slider.x, slider.y, step_width, slider.h),
                ControlAction::IncreaseBottles => {
                    Rect::new(slider.x + slider.w - step_width, slider.y, step_width, slider.h)
                }
                _ => continue,
            };
            self.render_button(button, rect);
        }

        let label_w = track.w / 4.0;
        for (text, centre) in [("3 (Easy)", 0.0), ("8 (Medium)", 0.5), ("13 (Hard)", 1.0)] {
            let x = track.x + track.w * centre - label_w / 2.0;
            self.render_text(text, inset(Rect::new(x, labels.y, label_w, labels.h), 0.05, 0.15), MUTED_TEXT);
        }

        self.render_text("Colors in this game:", inset(preview_heading, 0.35, 0.1), MUTED_TEXT);
        self.render_color_preview(count, preview);

        let legend_lines = [
            "Difficulty Levels",
            "3-5 bottles: Easy - Good for beginners",
            "6-9 bottles: Medium - Balanced challenge",
            "10-13 bottles: Hard - Memory master test!",
        ];
        let line_h = legend.h / legend_lines.len() as f32;
        for (i, line) in legend_lines.iter().enumerate() {
            let rect = Rect::new(legend.x, legend.y + i as f32 * line_h, legend.w, line_h);
            let color = if i == 0 { WHITE } else { MUTED_TEXT };
            self.render_text(line, inset(rect, 0.25, 0.15), color);
        }

        let start_buttons: Vec<&Button> = buttons
            .iter()
            .filter(|b| b.get_action() == ControlAction::StartGame)
            .collect();
        self.render_button_lineup(&start_buttons, inset(start, 0.3, 0.1));
    }

    fn render_slider(&mut self, count: BottleCount, track: Rect) {
        let order = self.next_order();
        self.hit_test.push(track, HitItem::Slider, order);

        let bar_h = track.h * 0.2;
        let bar_y = track.y + (track.h - bar_h) / 2.0;
        draw_rectangle(track.x, bar_y, track.w, bar_h, PANEL);
        let filled = track.w * count.get_slider_fraction();
        draw_rectangle(track.x, bar_y, filled, bar_h, SKYBLUE);
        draw_circle(track.x + filled, track.y + track.h / 2.0, track.h * 0.4, WHITE);
    }

    fn render_color_preview(&mut self, count: BottleCount, rect: Rect) {
        let colors = count.get_colors();
        let spacing = 8.0;
        let swatch_w = (rect.w - spacing * (colors.len() as f32 - 1.0)) / colors.len() as f32;
        let swatch_h = rect.h * 0.65;
        for (i, color) in colors.iter().enumerate() {
            let x = rect.x + i as f32 * (swatch_w + spacing);
            let side = swatch_w.min(swatch_h);
            draw_rectangle(x + (swatch_w - side) / 2.0, rect.y, side, side, color.get_color());
            draw_rectangle_lines(x + (swatch_w - side) / 2.0, rect.y, side, side, 2.0, BLACK);
            self.render_text(
                color.get_name(),
                inset(Rect::new(x, rect.y + swatch_h, swatch_w, rect.h - swatch_h), 0.05, 0.2),
                MUTED_TEXT,
            );
        }
    }

    pub fn render_game(&mut self, session: &GameSession, buttons: &[Button], drag: DragView) {
        self.begin_frame();
        let [title, info, instructions, reference_heading, reference, user_heading, user, status, controls] =
            self.bands([0.07, 0.05, 0.05, 0.06, 0.22, 0.05, 0.22, 0.13, 0.09]);
        let count = session.get_count();

        self.render_text(WINDOW_TITLE, inset(title, 0.25, 0.1), WHITE);
        self.render_text(
            &format!(
                "Bottles: {}    Difficulty: {}",
                count.get(),
                count.get_difficulty().get_label()
            ),
            inset(info, 0.35, 0.1),
            MUTED_TEXT,
        );
        self.render_text(
            &format!(
                "Match the computer's hidden arrangement! Drag bottles to swap. Get all {} in place to win!",
                count.get()
            ),
            inset(instructions, 0.05, 0.15),
            MUTED_TEXT,
        );

        let (heading_text, peek_area) = split_right(reference_heading, 0.2);
        self.render_text("Computer's Arrangement", inset(heading_text, 0.3, 0.1), WHITE);
        if let Some(peek) = buttons.iter().find(|b| b.get_action() == ControlAction::Peek) {
            self.render_button(peek, inset(peek_area, 0.02, 0.08));
        }
        let hidden = !session.is_revealed();
        for (i, color) in session.get_reference_order().iter().enumerate() {
            let slot = slot_rect(reference, i, count.get());
            let style = BottleStyle { hidden, ..Default::default() };
            self.render_bottle(*color, i, style, slot, None);
        }

        self.render_text("Your Arrangement", inset(user_heading, 0.35, 0.1), WHITE);
        for (i, color) in session.get_user_order().iter().enumerate() {
            let slot = slot_rect(user, i, count.get());
            let style = BottleStyle {
                hidden: false,
                dimmed: drag.dragged == Some(i),
                highlighted: drag.drop_target == Some(i),
            };
            self.render_bottle(*color, i, style, slot, Some(HitItem::UserSlot { index: i }));
        }

        self.render_status(session, status);

        let lineup: Vec<&Button> = buttons
            .iter()
            .filter(|b| b.get_action() != ControlAction::Peek)
            .collect();
        self.render_button_lineup(&lineup, inset(controls, 0.1, 0.1));

        // Drawn last and never registered, so hit tests see the slot beneath.
        if let Some(index) = drag.dragged
            && let Some(color) = session.get_user_order().get(index)
        {
            let slot = slot_rect(user, index, count.get());
            let floating = Rect::new(
                drag.pointer.x - slot.w / 2.0,
                drag.pointer.y - slot.h / 2.0,
                slot.w,
                slot.h,
            );
            self.render_bottle(*color, index, BottleStyle::default(), floating, None);
        }
    }

    fn render_status(&mut self, session: &GameSession, rect: Rect) {
        draw_rectangle(rect.x, rect.y, rect.w, rect.h, PANEL);
        let half = rect.h / 2.0;
        self.render_text(
            &format!(
                "Matches: {} out of {}    Swaps: {}",
                session.get_matches(),
                session.get_count().get(),
                session.get_swap_attempts()
            ),
            inset(Rect::new(rect.x, rect.y, rect.w, half), 0.3, 0.15),
            WHITE,
        );
        let (message_color, message) = if session.is_won() {
            (WIN_TEXT, format!("Congratulations! You won! {}", session.get_status_message()))
        } else {
            (MUTED_TEXT, session.get_status_message())
        };
        self.render_text(
            &message,
            inset(Rect::new(rect.x, rect.y + half, rect.w, half), 0.1, 0.15),
            message_color,
        );
    }

    pub fn render_text(&self, text: &str, rect: Rect, color: Color) {
        let (font_size, x, y) = self.cached_text_sizer.get_text_fit(text, rect.w, rect.h);
        if font_size >= 1.0 {
            draw_text(text, rect.x + x, rect.y + y, font_size, color);
        }
    }

    /// A bottle is a neck on top of a body; `rect` covers the bottle plus
    /// its position number underneath.
    fn render_bottle(
        &mut self,
        color: BottleColor,
        index: usize,
        style: BottleStyle,
        rect: Rect,
        hit_item: Option<HitItem>,
    ) {
        if let Some(item) = hit_item {
            let order = self.next_order();
            self.hit_test.push(rect, item, order);
        }

        let number_h = rect.h * 0.15;
        let bottle_h = rect.h - number_h;
        let neck_h = bottle_h * 0.18;
        let neck_w = rect.w * 0.4;
        let body = Rect::new(rect.x, rect.y + neck_h, rect.w, bottle_h - neck_h);
        let neck = Rect::new(rect.x + (rect.w - neck_w) / 2.0, rect.y, neck_w, neck_h + 2.0);

        let mut fill = if style.hidden { HIDDEN_BOTTLE_COLOR } else { color.get_color() };
        if style.dimmed {
            fill.a = 0.35;
        }
        draw_rectangle(neck.x, neck.y, neck.w, neck.h, fill);
        draw_rectangle(body.x, body.y, body.w, body.h, fill);
        draw_rectangle_lines(body.x, body.y, body.w, body.h, 3.0, BLACK);
        draw_rectangle_lines(neck.x, neck.y, neck.w, neck.h, 2.0, BLACK);

        let label = if style.hidden { "?" } else { color.get_name() };
        self.render_text(label, inset(body, 0.08, 0.35), BLACK);
        self.render_text(
            &(index + 1).to_string(),
            inset(Rect::new(rect.x, rect.y + bottle_h, rect.w, number_h), 0.3, 0.1),
            MUTED_TEXT,
        );

        if style.highlighted {
            draw_rectangle_lines(rect.x - 4.0, rect.y - 4.0, rect.w + 8.0, bottle_h + 8.0, 4.0, WHITE);
        }
    }

    pub fn render_button(&mut self, button: &Button, rect: Rect) {
        let mut color = button.get_color();
        if button.is_enabled() {
            let order = self.next_order();
            self.hit_test.push(rect, HitItem::Button { action: button.get_action() }, order);
        } else {
            color.a = 0.4;
        }

        draw_rectangle(rect.x, rect.y, rect.w, rect.h, color);
        draw_rectangle_lines(rect.x, rect.y, rect.w, rect.h, 2.0, BLACK);
        self.render_text(button.get_label(), inset(rect, 0.08, 0.2), WHITE);
    }

    pub fn render_button_lineup(&mut self, buttons: &[&Button], rect: Rect) {
        if buttons.is_empty() {
            return;
        }
        let button_count = buttons.len() as f32;
        let spacing = 10.0;
        let total_spacing = spacing * (button_count - 1.0);
        let button_width = (rect.w - total_spacing) / button_count;
        for (i, button) in buttons.iter().enumerate() {
            let button_x = rect.x + i as f32 * (button_width + spacing);
            self.render_button(button, Rect::new(button_x, rect.y, button_width, rect.h));
        }
    }
}

/// Shrinks a rect by a fraction of its width and height on each side.
fn inset(rect: Rect, fx: f32, fy: f32) -> Rect {
    let dx = rect.w * fx / 2.0;
    let dy = rect.h * fy / 2.0;
    Rect::new(rect.x + dx, rect.y + dy, rect.w - 2.0 * dx, rect.h - 2.0 * dy)
}

/// Splits off the right `fraction` of a rect.
fn split_right(rect: Rect, fraction: f32) -> (Rect, Rect) {
    let right_w = rect.w * fraction;
    (
        Rect::new(rect.x, rect.y, rect.w - right_w, rect.h),
        Rect::new(rect.x + rect.w - right_w, rect.y, right_w, rect.h),
    )
}

/// Slot `index` of `count` evenly spaced slots in a row. Bottles are kept
/// at most half as wide as they are tall and the row is centred.
fn slot_rect(row: Rect, index: usize, count: usize) -> Rect {
    let spacing = 12.0;
    let available = (row.w - spacing * (count as f32 - 1.0)) / count as f32;
    let slot_w = available.min(row.h * 0.5);
    let used = slot_w * count as f32 + spacing * (count as f32 - 1.0);
    let start_x = row.x + (row.w - used) / 2.0;
    Rect::new(start_x + index as f32 * (slot_w + spacing), row.y, slot_w, row.h)
}
