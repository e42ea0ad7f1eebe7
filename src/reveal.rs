use macroquad::prelude::debug;

use crate::session::GameSession;

#[derive(Copy, Clone, Debug, PartialEq)]
struct PendingHide {
    generation: u64,
    due_at: f64,
}

/// One-shot timer that hides a peeked reference arrangement again.
///
/// The pending hide remembers which session it was scheduled for; if that
/// session has been replaced by the time it fires, firing does nothing.
#[derive(Default, Debug)]
pub struct RevealTimer {
    pending: Option<PendingHide>,
}

impl RevealTimer {
    pub fn new() -> Self {
        Self { pending: None }
    }

    pub fn schedule(&mut self, generation: u64, now: f64, duration: f64) {
        self.pending = Some(PendingHide {
            generation,
            due_at: now + duration,
        });
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Fires the hide if it is due. Returns true when the timer fired,
    /// whether or not it still had a session to act on.
    pub fn poll(&mut self, now: f64, session: Option<&mut GameSession>) -> bool {
        let Some(pending) = self.pending else {
            return false;
        };
        if now < pending.due_at {
            return false;
        }
        self.pending = None;
        match session {
            Some(session) if session.get_generation() == pending.generation => {
                if session.hide_reveal() {
                    debug!("Reveal window for game {} closed", pending.generation);
                }
            }
            _ => debug!("Dropped stale reveal timer for game {}", pending.generation),
        }
        true
    }
}
