//! Prometheus metrics exporter for the scanner.
//!
//! # Metrics Exposed
//!
//! ## Scan Loop
//! - `snuggest_scan_ticks_total` - Decode ticks run
//! - `snuggest_scan_ticks_skipped_total` - Ticks with no frame ready, or dropped when behind
//! - `snuggest_decode_submitted_total` - Frames handed to the decoder
//! - `snuggest_decode_miss_total` - Decodes that found no code
//!
//! ## Validation
//! - `snuggest_scans_decoded_total` - Payloads delivered to the card
//! - `snuggest_scans_rate_limited_total` - Payloads inside the cooldown window
//! - `snuggest_scans_invalid_total` - Payloads failing the content check
//! - `snuggest_scans_accepted_total` - Accepted stamps
//!
//! ## Card
//! - `snuggest_rewards_unlocked_total` - Completed cards
//! - `snuggest_card_resets_total` - Resets
//! - `snuggest_drink_count` - Current stamps
//! - `snuggest_camera_available` - Camera status (1=streaming, 0=unavailable)
//!
//! The HTTP exporter (`/metrics`, `/health`) is behind the `metrics` feature.

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, MetricsState, ServerError};
