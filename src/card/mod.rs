//! Stamp card state machine.
//!
//! Decoded payloads pass through the [`ScanValidator`] (cooldown gate,
//! then content check) before reaching the [`ProgressStore`]. The card
//! is plain synchronous state; the scanner owns it on a single task.

mod progress;
pub mod render;
pub mod rules;
mod validator;

pub use progress::{ProgressState, ProgressStore, Transition};
pub use render::{render_card, stamps, Stamp};
pub use validator::{DebounceState, ScanRejection, ScanValidator};

/// A payload decoded from one frame, stamped with the time it resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEvent {
    /// Raw decoded text, untrimmed.
    pub text: String,
    /// Wall-clock milliseconds when the decode resolved.
    pub timestamp_ms: i64,
}

impl ScanEvent {
    /// Creates an event for `text` decoded at `timestamp_ms`.
    pub fn new(text: impl Into<String>, timestamp_ms: i64) -> Self {
        Self {
            text: text.into(),
            timestamp_ms,
        }
    }
}

/// Result of feeding one decoded payload to the card.
pub type ScanOutcome = Result<Transition, ScanRejection>;

/// Running totals, for metrics and the exit summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CardStats {
    /// Payloads handed to the card.
    pub decoded: u64,
    /// Payloads dropped by the cooldown gate.
    pub rate_limited: u64,
    /// Empty payloads.
    pub empty: u64,
    /// Payloads missing a required token.
    pub invalid: u64,
    /// Payloads that passed both checks.
    pub accepted: u64,
    /// Cards completed.
    pub rewards_unlocked: u64,
    /// User resets.
    pub resets: u64,
    /// True once the camera has opened; false after an acquisition failure.
    pub camera_available: bool,
}

/// Validator plus progress store for one mounted widget.
#[derive(Debug, Clone, Default)]
pub struct LoyaltyCard {
    validator: ScanValidator,
    progress: ProgressStore,
    stats: CardStats,
}

impl LoyaltyCard {
    /// Creates an empty card with the default rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a card from explicit parts.
    pub fn with_parts(validator: ScanValidator, progress: ProgressStore) -> Self {
        Self {
            validator,
            progress,
            stats: CardStats::default(),
        }
    }

    /// Count and message currently shown.
    pub fn state(&self) -> &ProgressState {
        self.progress.state()
    }

    /// Stamps needed for the reward.
    pub fn total(&self) -> u32 {
        self.progress.total()
    }

    /// Running totals since mount.
    pub fn stats(&self) -> CardStats {
        self.stats
    }

    /// Current cooldown state.
    pub fn debounce(&self) -> DebounceState {
        self.validator.debounce()
    }

    /// Handles one decoded payload.
    pub fn handle_scan(&mut self, event: &ScanEvent) -> ScanOutcome {
        self.stats.decoded += 1;

        match self.validator.check(event) {
            Ok(()) => {
                self.stats.accepted += 1;
                let transition = self.progress.record_accepted();
                match transition {
                    Transition::Stamped { count } => {
                        tracing::info!(count, total = self.total(), "Drink added");
                    }
                    Transition::RewardUnlocked => {
                        self.stats.rewards_unlocked += 1;
                        tracing::info!(total = self.total(), "Free drink unlocked");
                    }
                    Transition::AlreadyFull => {
                        tracing::debug!("Card already full, scan ignored");
                    }
                }
                Ok(transition)
            }
            Err(rejection) => {
                match &rejection {
                    ScanRejection::RateLimited { .. } => self.stats.rate_limited += 1,
                    ScanRejection::EmptyPayload => self.stats.empty += 1,
                    ScanRejection::InvalidContent { .. } => {
                        self.stats.invalid += 1;
                        self.progress.show_invalid_code();
                    }
                }
                tracing::debug!(reason = %rejection, "Scan rejected");
                Err(rejection)
            }
        }
    }

    /// Marks the camera as usable.
    pub fn camera_ready(&mut self) {
        self.stats.camera_available = true;
    }

    /// Surfaces a failed camera acquisition. The count is untouched.
    pub fn camera_unavailable(&mut self) {
        self.stats.camera_available = false;
        self.progress.show_camera_unavailable();
    }

    /// User-triggered reset; not subject to cooldown or validation.
    pub fn reset(&mut self) {
        self.stats.resets += 1;
        self.progress.reset();
        tracing::info!("Card reset");
    }
}
