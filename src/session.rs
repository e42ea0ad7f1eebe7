use macroquad::prelude::{debug, info};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::model::{BottleColor, BottleCount};

/// What a call to [`GameSession::swap`] actually did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SwapOutcome {
    /// Source and target were the same slot.
    Identity,
    /// The session was already won; nothing moves after victory.
    AlreadyWon,
    OutOfBounds,
    Swapped,
    /// The swap put the last bottle in place.
    Won,
}

impl SwapOutcome {
    pub fn is_counted(&self) -> bool {
        matches!(self, SwapOutcome::Swapped | SwapOutcome::Won)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WinRating {
    ExcellentMemory,
    GoodJob,
    WellDone,
}

impl WinRating {
    pub fn get_label(&self) -> &'static str {
        match self {
            WinRating::ExcellentMemory => "Excellent memory!",
            WinRating::GoodJob => "Good job!",
            WinRating::WellDone => "Well done!",
        }
    }
}

/// One game: the hidden reference arrangement and the player's arrangement.
///
/// The match count and won flag are derived from the two orders and are only
/// ever recomputed, never assigned from outside.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameSession {
    count: BottleCount,
    generation: u64,
    reference_order: Vec<BottleColor>,
    user_order: Vec<BottleColor>,
    matches: usize,
    swap_attempts: u32,
    won: bool,
    revealed: bool,
}

impl GameSession {
    /// Deals a new game. Both orders are independent uniform shuffles of the
    /// first `count` palette colours; a user order that already solves the
    /// puzzle is dealt again.
    pub fn new<R: Rng + ?Sized>(count: BottleCount, generation: u64, rng: &mut R) -> Self {
        let mut reference_order = count.get_colors();
        reference_order.shuffle(rng);
        let mut user_order = count.get_colors();
        loop {
            user_order.shuffle(rng);
            if user_order != reference_order {
                break;
            }
        }
        let session = Self::from_orders(count, generation, reference_order, user_order);
        info!(
            "Dealt game {} with {} bottles ({} already in place)",
            generation,
            count.get(),
            session.matches
        );
        session
    }

    fn from_orders(
        count: BottleCount,
        generation: u64,
        reference_order: Vec<BottleColor>,
        user_order: Vec<BottleColor>,
    ) -> Self {
        let mut session = Self {
            count,
            generation,
            reference_order,
            user_order,
            matches: 0,
            swap_attempts: 0,
            won: false,
            revealed: false,
        };
        session.recount_matches();
        session
    }

    pub fn swap(&mut self, source: usize, target: usize) -> SwapOutcome {
        if self.won {
            return SwapOutcome::AlreadyWon;
        }
        let len = self.user_order.len();
        if source >= len || target >= len {
            return SwapOutcome::OutOfBounds;
        }
        if source == target {
            return SwapOutcome::Identity;
        }

        self.user_order.swap(source, target);
        self.swap_attempts += 1;
        self.recount_matches();
        debug!(
            "Swapped slots {} and {}: {}/{} matches after {} swaps",
            source,
            target,
            self.matches,
            len,
            self.swap_attempts
        );

        if self.matches == len {
            self.won = true;
            self.revealed = true;
            info!("Game {} solved in {} swaps", self.generation, self.swap_attempts);
            return SwapOutcome::Won;
        }
        SwapOutcome::Swapped
    }

    /// Shows the reference arrangement. Returns false when it is already
    /// showing or the game is over.
    pub fn reveal(&mut self) -> bool {
        if self.revealed || self.won {
            return false;
        }
        self.revealed = true;
        true
    }

    /// Hides the reference arrangement again. Once won it stays visible.
    pub fn hide_reveal(&mut self) -> bool {
        if self.won || !self.revealed {
            return false;
        }
        self.revealed = false;
        true
    }

    fn recount_matches(&mut self) {
        self.matches = self
            .reference_order
            .iter()
            .zip(&self.user_order)
            .filter(|(reference, user)| reference == user)
            .count();
    }

    pub fn get_count(&self) -> BottleCount {
        self.count
    }

    pub fn get_generation(&self) -> u64 {
        self.generation
    }

    pub fn get_reference_order(&self) -> &[BottleColor] {
        &self.reference_order
    }

    pub fn get_user_order(&self) -> &[BottleColor] {
        &self.user_order
    }

    pub fn get_matches(&self) -> usize {
        self.matches
    }

    pub fn get_swap_attempts(&self) -> u32 {
        self.swap_attempts
    }

    pub fn is_won(&self) -> bool {
        self.won
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn get_win_rating(&self) -> Option<WinRating> {
        if !self.won {
            return None;
        }
        let count = self.count.get() as u32;
        Some(match self.swap_attempts {
            n if n <= count * 2 => WinRating::ExcellentMemory,
            n if n <= count * 4 => WinRating::GoodJob,
            _ => WinRating::WellDone,
        })
    }

    /// Feedback line shown under the counters.
    pub fn get_status_message(&self) -> String {
        let count = self.count.get();
        if let Some(rating) = self.get_win_rating() {
            return format!(
                "All {} bottles are in the correct positions! {}",
                count,
                rating.get_label()
            );
        }
        match self.matches {
            0 => "No matches yet. Drag bottles to swap positions!".to_string(),
            1 => "Good! 1 bottle is in the correct position!".to_string(),
            2 => "Great! 2 bottles are in the correct positions!".to_string(),
            3 => "Excellent! 3 bottles are in the correct positions!".to_string(),
            m => format!("Awesome! {} bottles are in the correct positions!", m),
        }
    }

    /// One-line result for sharing.
    pub fn get_summary(&self) -> String {
        let count = self.count.get();
        match self.get_win_rating() {
            Some(rating) => format!(
                "Color Bottle Matching: solved {} bottles in {} swaps. {}",
                count,
                self.swap_attempts,
                rating.get_label()
            ),
            None => format!(
                "Color Bottle Matching: {}/{} matches after {} swaps ({})",
                self.matches,
                count,
                self.swap_attempts,
                self.count.get_difficulty().get_label()
            ),
        }
    }
}
