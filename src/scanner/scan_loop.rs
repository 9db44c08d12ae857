//! Per-tick frame sampling and fire-and-forget decoding.
//!
//! The loop runs on its own blocking thread because camera capture
//! blocks. Each tick halves the current frame and hands it to the
//! decoder on the tokio blocking pool without waiting for the result,
//! so several decodes may be in flight and may finish in any order.

use super::clock::Clock;
use super::widget::WidgetInput;
use crate::capture::{Camera, Frame};
use crate::card::ScanEvent;
use crate::decode::FrameDecoder;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// Shared flag that ends the scan loop at its next tick.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    /// Creates an untriggered signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the loop to stop.
    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// True once [`StopSignal::trigger`] was called on any clone.
    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Counters updated by the capture thread and decode tasks.
#[derive(Debug, Default)]
pub struct ScanCounters {
    ticks: AtomicU64,
    not_ready: AtomicU64,
    late: AtomicU64,
    capture_failures: AtomicU64,
    submitted: AtomicU64,
    decoded: AtomicU64,
    misses: AtomicU64,
}

/// Point-in-time copy of [`ScanCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanCountersSnapshot {
    /// Ticks that ran.
    pub ticks: u64,
    /// Ticks skipped because the camera had no frame yet.
    pub not_ready: u64,
    /// Ticks dropped because the loop fell behind schedule.
    pub late: u64,
    /// Ticks whose capture returned an error.
    pub capture_failures: u64,
    /// Frames handed to the decoder.
    pub submitted: u64,
    /// Decodes that found a code.
    pub decoded: u64,
    /// Decodes that found nothing.
    pub misses: u64,
}

impl ScanCounters {
    /// Reads every counter.
    pub fn snapshot(&self) -> ScanCountersSnapshot {
        ScanCountersSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            not_ready: self.not_ready.load(Ordering::Relaxed),
            late: self.late.load(Ordering::Relaxed),
            capture_failures: self.capture_failures.load(Ordering::Relaxed),
            submitted: self.submitted.load(Ordering::Relaxed),
            decoded: self.decoded.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No usable frame yet; try again next tick.
    NotReady,
    /// Capturing the frame failed; skipped.
    CaptureFailed,
    /// A downscaled frame was handed to the decoder.
    Submitted {
        /// Width of the downscaled frame.
        width: u32,
        /// Height of the downscaled frame.
        height: u32,
    },
}

/// Hands frames to the decoder and routes results to the widget.
#[derive(Clone)]
pub struct DecodeDispatcher {
    runtime: Handle,
    decoder: Arc<dyn FrameDecoder>,
    clock: Arc<dyn Clock>,
    results: UnboundedSender<WidgetInput>,
    counters: Arc<ScanCounters>,
}

impl DecodeDispatcher {
    /// Creates a dispatcher that decodes on `runtime` and queues hits on `results`.
    pub fn new(
        runtime: Handle,
        decoder: Arc<dyn FrameDecoder>,
        clock: Arc<dyn Clock>,
        results: UnboundedSender<WidgetInput>,
        counters: Arc<ScanCounters>,
    ) -> Self {
        Self {
            runtime,
            decoder,
            clock,
            results,
            counters,
        }
    }

    /// True once the widget has stopped listening.
    pub fn is_closed(&self) -> bool {
        self.results.is_closed()
    }

    /// Starts decoding `frame` without waiting for it.
    ///
    /// A hit is stamped with the clock when the decode resolves and
    /// queued for the widget. Results that arrive after teardown are
    /// dropped.
    pub fn submit(&self, frame: Frame) -> JoinHandle<()> {
        self.counters.submitted.fetch_add(1, Ordering::Relaxed);

        let decoder = Arc::clone(&self.decoder);
        let clock = Arc::clone(&self.clock);
        let results = self.results.clone();
        let counters = Arc::clone(&self.counters);

        self.runtime.spawn_blocking(move || {
            match decoder.decode(frame.pixels(), frame.width(), frame.height()) {
                Some(text) => {
                    counters.decoded.fetch_add(1, Ordering::Relaxed);
                    let event = ScanEvent::new(text, clock.now_ms());
                    if results.send(WidgetInput::Scan(event)).is_err() {
                        tracing::trace!(sequence = frame.sequence(), "Decode finished after teardown");
                    }
                }
                None => {
                    counters.misses.fetch_add(1, Ordering::Relaxed);
                    tracing::trace!(sequence = frame.sequence(), "No QR code in frame");
                }
            }
        })
    }
}

/// Samples an open camera once per tick.
pub struct ScanLoop<C> {
    camera: C,
    dispatcher: DecodeDispatcher,
    counters: Arc<ScanCounters>,
    tick_interval: Duration,
}

impl<C: Camera> ScanLoop<C> {
    /// Creates a loop over an already opened camera.
    pub fn new(camera: C, dispatcher: DecodeDispatcher, tick_interval: Duration) -> Self {
        let counters = Arc::clone(&dispatcher.counters);
        Self {
            camera,
            dispatcher,
            counters,
            tick_interval: tick_interval.max(Duration::from_millis(1)),
        }
    }

    /// Runs one decode tick.
    pub fn tick(&mut self) -> TickOutcome {
        self.counters.ticks.fetch_add(1, Ordering::Relaxed);

        if !self.camera.frame_ready() {
            self.counters.not_ready.fetch_add(1, Ordering::Relaxed);
            return TickOutcome::NotReady;
        }

        let frame = match self.camera.capture() {
            Ok(frame) => frame,
            Err(e) => {
                self.counters.capture_failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("Frame capture failed: {}", e);
                return TickOutcome::CaptureFailed;
            }
        };

        let Some(scaled) = frame.downscale_half() else {
            self.counters.not_ready.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(?frame, "Frame too small to sample");
            return TickOutcome::NotReady;
        };

        let (width, height) = (scaled.width(), scaled.height());
        // Completion is delivered through the widget queue
        drop(self.dispatcher.submit(scaled));
        TickOutcome::Submitted { width, height }
    }

    /// Ticks until `stop` fires or the widget goes away, then closes
    /// the camera and hands it back.
    ///
    /// Ticks that fall behind schedule are dropped rather than bursted.
    pub fn run(mut self, stop: &StopSignal) -> C {
        tracing::info!(
            interval_ms = self.tick_interval.as_millis() as u64,
            dimensions = ?self.camera.dimensions(),
            "Scan loop started"
        );

        let mut next_tick = Instant::now();
        while !stop.is_triggered() && !self.dispatcher.is_closed() {
            let outcome = self.tick();
            tracing::trace!(?outcome, "Tick");

            next_tick += self.tick_interval;
            let now = Instant::now();
            if next_tick > now {
                std::thread::sleep(next_tick - now);
            } else {
                let missed = ((now - next_tick).as_millis() / self.tick_interval.as_millis()) as u64;
                if missed > 0 {
                    self.counters.late.fetch_add(missed, Ordering::Relaxed);
                }
                next_tick = now;
            }
        }

        self.camera.close();
        tracing::info!(counters = ?self.counters.snapshot(), "Scan loop stopped");
        self.camera
    }
}
