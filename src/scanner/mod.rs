//! Camera scanning pipeline and widget lifecycle.
//!
//! ```text
//! capture thread: tick → frame_ready? → capture → ½ downscale ─┐
//!                                                              │ spawn_blocking
//! blocking pool:                             decode → ScanEvent ┘
//!                                                   │
//! card task:     WidgetInput queue (scan / reset / camera) → LoyaltyCard → watch
//! ```

mod clock;
mod scan_loop;
mod widget;

pub use clock::{Clock, ManualClock, SystemClock};
pub use scan_loop::{
    DecodeDispatcher, ScanCounters, ScanCountersSnapshot, ScanLoop, StopSignal, TickOutcome,
};
pub use widget::{CardSnapshot, Unmounted, WidgetConfig, WidgetError, WidgetHandle, WidgetInput};
