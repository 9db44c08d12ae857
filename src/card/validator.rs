//! Cooldown gate and content check for decoded payloads.

use super::rules::{is_valid_payload, normalize, COOLDOWN_MS};
use super::ScanEvent;
use thiserror::Error;

/// Why a decoded payload did not produce a stamp.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanRejection {
    /// Arrived inside the cooldown window of the previous gated scan.
    #[error("scan arrived {elapsed_ms} ms after the previous one (cooldown {cooldown_ms} ms)")]
    RateLimited {
        /// Time since the previous gated scan; negative for out-of-order stamps.
        elapsed_ms: i64,
        /// Window that applied.
        cooldown_ms: i64,
    },
    /// Decoder returned an empty string.
    #[error("decoded payload is empty")]
    EmptyPayload,
    /// Payload is missing one of the required tokens.
    #[error("payload {normalized:?} is not a loyalty code")]
    InvalidContent {
        /// Trimmed, lowercased payload.
        normalized: String,
    },
}

/// Time of the last scan that got past the rate gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebounceState {
    last_accepted_ms: Option<i64>,
}

impl DebounceState {
    /// Timestamp of the last gated scan, if any.
    pub fn last_accepted_ms(&self) -> Option<i64> {
        self.last_accepted_ms
    }
}

/// Decides whether a decoded payload is a new, legitimate stamp.
///
/// The cooldown timestamp moves as soon as a scan clears the rate gate,
/// before the payload is checked. A rejected payload therefore still
/// opens a fresh cooldown window.
#[derive(Debug, Clone)]
pub struct ScanValidator {
    debounce: DebounceState,
    cooldown_ms: i64,
}

impl ScanValidator {
    /// Creates a validator with the standard cooldown.
    pub fn new() -> Self {
        Self::with_cooldown(COOLDOWN_MS)
    }

    /// Creates a validator with a custom cooldown window.
    pub fn with_cooldown(cooldown_ms: i64) -> Self {
        Self {
            debounce: DebounceState::default(),
            cooldown_ms: cooldown_ms.max(0),
        }
    }

    /// Current cooldown state.
    pub fn debounce(&self) -> DebounceState {
        self.debounce
    }

    /// Cooldown window in milliseconds.
    pub fn cooldown_ms(&self) -> i64 {
        self.cooldown_ms
    }

    /// Runs the gate and the content check for one decoded payload.
    pub fn check(&mut self, event: &ScanEvent) -> Result<(), ScanRejection> {
        if let Some(last) = self.debounce.last_accepted_ms {
            let elapsed_ms = event.timestamp_ms - last;
            if elapsed_ms < self.cooldown_ms {
                return Err(ScanRejection::RateLimited {
                    elapsed_ms,
                    cooldown_ms: self.cooldown_ms,
                });
            }
        }
        self.debounce.last_accepted_ms = Some(event.timestamp_ms);

        if event.text.is_empty() {
            return Err(ScanRejection::EmptyPayload);
        }

        let normalized = normalize(&event.text);
        tracing::debug!(payload = %normalized, "QR payload");

        if !is_valid_payload(&normalized) {
            return Err(ScanRejection::InvalidContent { normalized });
        }

        Ok(())
    }
}

impl Default for ScanValidator {
    fn default() -> Self {
        Self::new()
    }
}
