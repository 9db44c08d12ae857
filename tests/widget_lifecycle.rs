//! Mount / scan / reset / unmount behavior of the widget.

use qrcode::{Color, QrCode};
use snuggest_loyalty::capture::{Camera, CameraError, CaptureConfig, Frame, MockCamera};
use snuggest_loyalty::card::rules::{CAMERA_UNAVAILABLE_MESSAGE, REWARD_UNLOCKED_MESSAGE};
use snuggest_loyalty::decode::{FrameDecoder, RqrrDecoder};
use snuggest_loyalty::scanner::{CardSnapshot, ManualClock, WidgetConfig, WidgetHandle};
use snuggest_loyalty::ScanEvent;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

const CODE: &str = "snuggest-drink-qr";

/// Decoder that finds the same payload in every frame.
struct AlwaysDecodes(&'static str);

impl FrameDecoder for AlwaysDecodes {
    fn decode(&self, _rgba: &[u8], _width: u32, _height: u32) -> Option<String> {
        Some(self.0.to_string())
    }
}

/// Decoder that never finds a code.
struct NeverDecodes;

impl FrameDecoder for NeverDecodes {
    fn decode(&self, _rgba: &[u8], _width: u32, _height: u32) -> Option<String> {
        None
    }
}

/// Decoder that takes a while before finding the payload, and counts
/// how many decodes finished.
struct SlowDecoder {
    delay: Duration,
    finished: Arc<AtomicU64>,
}

impl FrameDecoder for SlowDecoder {
    fn decode(&self, _rgba: &[u8], _width: u32, _height: u32) -> Option<String> {
        std::thread::sleep(self.delay);
        self.finished.fetch_add(1, Ordering::SeqCst);
        Some(CODE.to_string())
    }
}

/// Camera pointed at a printed loyalty code.
struct PrintedCodeCamera {
    frame: Frame,
    open: bool,
}

impl PrintedCodeCamera {
    fn new(text: &str) -> Self {
        let code = QrCode::new(text.as_bytes()).unwrap();
        let modules = code.width();
        let colors = code.to_colors();
        let (quiet, module_px) = (4, 6);
        let side = (modules + 2 * quiet) * module_px;

        let mut pixels = vec![255u8; side * side * 4];
        for y in 0..side {
            for x in 0..side {
                let (mx, my) = (x / module_px, y / module_px);
                let inside = (quiet..quiet + modules).contains(&mx)
                    && (quiet..quiet + modules).contains(&my);
                if inside && colors[(my - quiet) * modules + (mx - quiet)] == Color::Dark {
                    let i = (y * side + x) * 4;
                    pixels[i..i + 3].copy_from_slice(&[0, 0, 0]);
                }
            }
        }

        Self {
            frame: Frame::new(pixels, side as u32, side as u32, 0),
            open: false,
        }
    }
}

impl Camera for PrintedCodeCamera {
    fn open(&mut self, _config: &CaptureConfig) -> Result<(), CameraError> {
        self.open = true;
        Ok(())
    }

    fn frame_ready(&self) -> bool {
        self.open
    }

    fn dimensions(&self) -> Option<(u32, u32)> {
        Some((self.frame.width(), self.frame.height()))
    }

    fn capture(&mut self) -> Result<Frame, CameraError> {
        Ok(self.frame.clone())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self) {
        self.open = false;
    }
}

fn config() -> WidgetConfig {
    WidgetConfig {
        capture: CaptureConfig::with_dimensions(64, 48),
        tick_interval: Duration::from_millis(2),
    }
}

async fn wait_until(
    widget: &WidgetHandle,
    mut pred: impl FnMut(&CardSnapshot) -> bool,
) -> CardSnapshot {
    let mut updates = widget.subscribe();
    let snapshot = tokio::time::timeout(Duration::from_secs(5), updates.wait_for(|s| pred(s)))
        .await
        .expect("timed out waiting for widget state")
        .expect("widget stopped publishing")
        .clone();
    snapshot
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_camera_denied_shows_message_and_never_scans() {
    let widget = WidgetHandle::mount(
        || MockCamera::denied("permission prompt dismissed"),
        AlwaysDecodes(CODE),
        Arc::new(ManualClock::default()),
        config(),
    );

    let snapshot = wait_until(&widget, |s| !s.state.message().is_empty()).await;
    assert_eq!(snapshot.state.message(), CAMERA_UNAVAILABLE_MESSAGE);
    assert_eq!(snapshot.state.drink_count(), 0);
    assert!(!snapshot.stats.camera_available);

    let done = widget.unmount().await.unwrap();
    assert_eq!(done.counters.ticks, 0);
    assert_eq!(done.counters.submitted, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_repeated_frames_stamp_once_per_window() {
    let clock = ManualClock::starting_at(10_000);
    let widget = WidgetHandle::mount(
        MockCamera::new,
        AlwaysDecodes(CODE),
        Arc::new(clock.clone()),
        config(),
    );

    let snapshot = wait_until(&widget, |s| s.stats.rate_limited >= 3).await;
    assert_eq!(snapshot.state.drink_count(), 1);
    assert_eq!(snapshot.state.message(), "Drink added! (1/5)");
    assert!(snapshot.stats.camera_available);

    clock.advance(1_200);
    let snapshot = wait_until(&widget, |s| s.state.drink_count() == 2).await;
    assert_eq!(snapshot.state.message(), "Drink added! (2/5)");

    let done = widget.unmount().await.unwrap();
    assert_eq!(done.card.state().drink_count(), 2);
    assert!(done.counters.submitted >= done.counters.decoded);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_printed_code_stamps_through_real_decoder() {
    let clock = ManualClock::starting_at(1_000);
    let widget = WidgetHandle::mount(
        || PrintedCodeCamera::new(CODE),
        RqrrDecoder::new(),
        Arc::new(clock.clone()),
        config(),
    );

    let snapshot = wait_until(&widget, |s| s.state.drink_count() == 1).await;
    assert_eq!(snapshot.state.message(), "Drink added! (1/5)");

    clock.advance(1_200);
    let snapshot = wait_until(&widget, |s| s.state.drink_count() == 2).await;
    assert_eq!(snapshot.stats.invalid, 0);

    widget.unmount().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_printed_foreign_code_is_invalid() {
    let widget = WidgetHandle::mount(
        || PrintedCodeCamera::new("https://example.com/menu"),
        RqrrDecoder::new(),
        Arc::new(ManualClock::default()),
        config(),
    );

    let snapshot = wait_until(&widget, |s| s.stats.invalid >= 1).await;
    assert_eq!(snapshot.state.drink_count(), 0);
    assert_eq!(snapshot.state.message(), "Invalid QR code.");

    widget.unmount().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_pushed_scans_follow_reward_scenario() {
    let widget = WidgetHandle::mount(
        MockCamera::new,
        NeverDecodes,
        Arc::new(ManualClock::default()),
        config(),
    );

    for t in [0, 500, 1_300, 2_500, 3_700, 4_900] {
        assert!(widget.push_scan(ScanEvent::new(CODE, t)));
    }

    let snapshot = wait_until(&widget, |s| s.stats.decoded == 6).await;
    assert_eq!(snapshot.state.drink_count(), 5);
    assert_eq!(snapshot.state.message(), REWARD_UNLOCKED_MESSAGE);
    assert_eq!(snapshot.stats.rate_limited, 1);

    assert!(widget.reset());
    let snapshot = wait_until(&widget, |s| s.stats.resets == 1).await;
    assert_eq!(snapshot.state.drink_count(), 0);
    assert_eq!(snapshot.state.message(), "");

    widget.unmount().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reset_after_scan_wins_in_arrival_order() {
    let widget = WidgetHandle::mount(
        MockCamera::new,
        NeverDecodes,
        Arc::new(ManualClock::default()),
        config(),
    );

    widget.push_scan(ScanEvent::new(CODE, 0));
    widget.reset();

    let snapshot = wait_until(&widget, |s| s.stats.resets == 1).await;
    assert_eq!(snapshot.stats.accepted, 1);
    assert_eq!(snapshot.state.drink_count(), 0);
    assert_eq!(snapshot.state.message(), "");

    widget.unmount().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unmount_with_decodes_in_flight() {
    let finished = Arc::new(AtomicU64::new(0));
    let widget = WidgetHandle::mount(
        MockCamera::new,
        SlowDecoder {
            delay: Duration::from_millis(40),
            finished: Arc::clone(&finished),
        },
        Arc::new(ManualClock::default()),
        WidgetConfig {
            tick_interval: Duration::from_millis(5),
            ..config()
        },
    );

    wait_until(&widget, |s| s.stats.camera_available).await;
    tokio::time::sleep(Duration::from_millis(60)).await;
    let done = widget.unmount().await.unwrap();
    assert!(done.counters.submitted > 0);

    let finished_at_unmount = finished.load(Ordering::SeqCst);

    // Decodes still running finish after teardown; their hits never reach the card
    tokio::time::sleep(Duration::from_millis(150)).await;
    let finished_total = finished.load(Ordering::SeqCst);
    assert!(finished_total > finished_at_unmount);
    assert!(done.card.stats().decoded < finished_total);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_updates_close_after_unmount() {
    let widget = WidgetHandle::mount(
        MockCamera::new,
        NeverDecodes,
        Arc::new(ManualClock::default()),
        config(),
    );
    let updates = widget.subscribe();

    widget.unmount().await.unwrap();
    assert!(updates.has_changed().is_err());
}
