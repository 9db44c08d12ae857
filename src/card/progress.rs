//! Bounded stamp counter and its display message.

use super::rules::{
    progress_message, CAMERA_UNAVAILABLE_MESSAGE, INVALID_CODE_MESSAGE, REWARD_UNLOCKED_MESSAGE,
    TOTAL_DRINKS,
};

/// What the user currently sees on the card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressState {
    drink_count: u32,
    message: String,
}

impl ProgressState {
    /// Stamps collected, never above the card total.
    pub fn drink_count(&self) -> u32 {
        self.drink_count
    }

    /// Current message; empty when nothing should be shown.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Effect of an accepted scan on the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// A stamp was added below the reward threshold.
    Stamped {
        /// Stamps after this one.
        count: u32,
    },
    /// The final stamp was added.
    RewardUnlocked,
    /// The card was already full; nothing changed.
    AlreadyFull,
}

/// Owns the counter, clamped to `[0, total]`.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    state: ProgressState,
    total: u32,
}

impl ProgressStore {
    /// Creates a store for the standard card.
    pub fn new() -> Self {
        Self::with_total(TOTAL_DRINKS)
    }

    /// Creates a store for a card with `total` stamps (at least one).
    pub fn with_total(total: u32) -> Self {
        Self {
            state: ProgressState::default(),
            total: total.max(1),
        }
    }

    /// Count and message currently shown.
    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    /// Stamps needed for the reward.
    pub fn total(&self) -> u32 {
        self.total
    }

    /// True once every slot is stamped.
    pub fn is_full(&self) -> bool {
        self.state.drink_count >= self.total
    }

    /// Applies an accepted scan. Saturates at the total and keeps the
    /// unlocked message once the card is full.
    pub fn record_accepted(&mut self) -> Transition {
        if self.is_full() {
            return Transition::AlreadyFull;
        }

        self.state.drink_count += 1;
        if self.state.drink_count == self.total {
            self.state.message = REWARD_UNLOCKED_MESSAGE.to_string();
            Transition::RewardUnlocked
        } else {
            self.state.message = progress_message(self.state.drink_count, self.total);
            Transition::Stamped {
                count: self.state.drink_count,
            }
        }
    }

    /// Replaces the message; the count is untouched.
    pub fn show_invalid_code(&mut self) {
        self.state.message = INVALID_CODE_MESSAGE.to_string();
    }

    /// Replaces the message; the count is untouched.
    pub fn show_camera_unavailable(&mut self) {
        self.state.message = CAMERA_UNAVAILABLE_MESSAGE.to_string();
    }

    /// Clears the card unconditionally.
    pub fn reset(&mut self) {
        self.state = ProgressState::default();
    }
}

impl Default for ProgressStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_empty() {
        let store = ProgressStore::new();
        assert_eq!(store.state().drink_count(), 0);
        assert_eq!(store.state().message(), "");
        assert_eq!(store.total(), TOTAL_DRINKS);
    }

    #[test]
    fn test_counts_up_to_reward() {
        let mut store = ProgressStore::new();

        for n in 1..TOTAL_DRINKS {
            assert_eq!(store.record_accepted(), Transition::Stamped { count: n });
            assert_eq!(store.state().message(), progress_message(n, TOTAL_DRINKS));
        }

        assert_eq!(store.record_accepted(), Transition::RewardUnlocked);
        assert_eq!(store.state().drink_count(), TOTAL_DRINKS);
        assert_eq!(store.state().message(), REWARD_UNLOCKED_MESSAGE);
    }

    #[test]
    fn test_saturates_and_keeps_unlocked_message() {
        let mut store = ProgressStore::with_total(2);
        store.record_accepted();
        store.record_accepted();

        assert_eq!(store.record_accepted(), Transition::AlreadyFull);
        assert_eq!(store.state().drink_count(), 2);
        assert_eq!(store.state().message(), REWARD_UNLOCKED_MESSAGE);
    }

    #[test]
    fn test_invalid_code_keeps_count() {
        let mut store = ProgressStore::new();
        store.record_accepted();
        store.show_invalid_code();

        assert_eq!(store.state().drink_count(), 1);
        assert_eq!(store.state().message(), INVALID_CODE_MESSAGE);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut store = ProgressStore::new();
        store.record_accepted();
        store.show_camera_unavailable();

        store.reset();
        assert_eq!(store.state(), &ProgressState::default());
    }
}
