//! Snuggest Loyalty Card Library
//!
//! A stamp card driven by a live camera. Frames are sampled on every
//! tick, decoded as QR codes, filtered by a cooldown gate and a loose
//! content match, and counted toward a free drink.
//!
//! # Architecture
//!
//! ```text
//! capture → scan loop → decode → validator → progress → render
//!                                   ↓
//!                          metrics (counters, gauges)
//! ```
//!
//! # Design Principles
//!
//! - **Single owner**: one task owns the card; all inputs arrive on one queue
//! - **Fire-and-forget decode**: ticks never wait on the decoder
//! - **Nothing crashes the card**: every failure ends as "no change" or a message
//! - **In-session only**: no persistence, no server-side verification
//!
//! # Example
//!
//! ```no_run
//! use snuggest_loyalty::{
//!     capture::MockCamera,
//!     decode::RqrrDecoder,
//!     scanner::{SystemClock, WidgetConfig, WidgetHandle},
//! };
//! use std::sync::Arc;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let widget = WidgetHandle::mount(
//!     MockCamera::new,
//!     RqrrDecoder::new(),
//!     Arc::new(SystemClock),
//!     WidgetConfig::default(),
//! );
//!
//! let mut updates = widget.subscribe();
//! updates.changed().await?;
//! println!("{} stamps", updates.borrow().state.drink_count());
//!
//! widget.reset();
//! let done = widget.unmount().await?;
//! println!("{:?}", done.card.stats());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod capture;
pub mod card;
pub mod config;
pub mod decode;
pub mod metrics;
pub mod scanner;

// Re-export commonly used types at crate root
pub use capture::{Camera, CameraError, CaptureConfig, Frame, MockCamera};
pub use card::{LoyaltyCard, ProgressState, ScanEvent, ScanRejection, Transition};
pub use config::{ConfigError, FileConfig};
pub use decode::{FrameDecoder, RqrrDecoder};
pub use scanner::{CardSnapshot, WidgetConfig, WidgetHandle};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
