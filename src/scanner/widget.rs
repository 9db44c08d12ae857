//! Mounted widget: the card task plus its capture thread.

use super::clock::Clock;
use super::scan_loop::{DecodeDispatcher, ScanCounters, ScanCountersSnapshot, ScanLoop, StopSignal};
use crate::capture::{Camera, CaptureConfig};
use crate::card::{CardStats, LoyaltyCard, ProgressState, ScanEvent};
use crate::config::FileConfig;
use crate::decode::FrameDecoder;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Errors that can occur while tearing the widget down.
#[derive(Debug, Error)]
pub enum WidgetError {
    /// The card or capture task panicked or was cancelled.
    #[error("widget task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Everything the card task reacts to, in arrival order.
#[derive(Debug)]
pub enum WidgetInput {
    /// A decoded payload.
    Scan(ScanEvent),
    /// The camera opened and the scan loop is running.
    CameraReady,
    /// Opening the camera failed; carries the reason for the log.
    CameraUnavailable(String),
    /// User asked to clear the card.
    Reset,
}

/// What presentation and metrics read after each input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardSnapshot {
    /// Count and message.
    pub state: ProgressState,
    /// Stamps needed for the reward.
    pub total: u32,
    /// Running totals since mount.
    pub stats: CardStats,
}

impl CardSnapshot {
    fn of(card: &LoyaltyCard) -> Self {
        Self {
            state: card.state().clone(),
            total: card.total(),
            stats: card.stats(),
        }
    }
}

/// Mount-time settings.
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    /// Camera selection and stream format.
    pub capture: CaptureConfig,
    /// Time between decode ticks.
    pub tick_interval: Duration,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            capture: CaptureConfig::default(),
            tick_interval: Duration::from_millis(16),
        }
    }
}

impl From<&FileConfig> for WidgetConfig {
    fn from(config: &FileConfig) -> Self {
        Self {
            capture: config.capture.clone(),
            tick_interval: Duration::from_millis(config.scan.tick_interval_ms),
        }
    }
}

/// Final state handed back by [`WidgetHandle::unmount`].
#[derive(Debug)]
pub struct Unmounted {
    /// The card as the last handled input left it.
    pub card: LoyaltyCard,
    /// Scan loop totals at teardown.
    pub counters: ScanCountersSnapshot,
}

/// Handle to a mounted widget.
///
/// Dropping the handle without unmounting also stops the widget: the
/// card task exits and the capture thread notices the closed queue.
pub struct WidgetHandle {
    inputs: mpsc::UnboundedSender<WidgetInput>,
    shutdown_tx: watch::Sender<bool>,
    snapshots: watch::Receiver<CardSnapshot>,
    stop: StopSignal,
    counters: Arc<ScanCounters>,
    card_task: JoinHandle<LoyaltyCard>,
    scan_task: JoinHandle<()>,
}

impl WidgetHandle {
    /// Mounts a fresh card and starts camera acquisition.
    ///
    /// The camera is built and opened on the capture thread. If opening
    /// fails the scan loop never starts and the card shows the
    /// camera-unavailable message. Must be called inside a tokio runtime.
    pub fn mount<F, C, D>(
        camera_factory: F,
        decoder: D,
        clock: Arc<dyn Clock>,
        config: WidgetConfig,
    ) -> Self
    where
        F: FnOnce() -> C + Send + 'static,
        C: Camera,
        D: FrameDecoder + 'static,
    {
        Self::mount_card(LoyaltyCard::new(), camera_factory, decoder, clock, config)
    }

    /// Like [`WidgetHandle::mount`], starting from an existing card.
    pub fn mount_card<F, C, D>(
        card: LoyaltyCard,
        camera_factory: F,
        decoder: D,
        clock: Arc<dyn Clock>,
        config: WidgetConfig,
    ) -> Self
    where
        F: FnOnce() -> C + Send + 'static,
        C: Camera,
        D: FrameDecoder + 'static,
    {
        let (inputs, inputs_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (snapshot_tx, snapshots) = watch::channel(CardSnapshot::of(&card));
        let stop = StopSignal::new();
        let counters = Arc::new(ScanCounters::default());

        let card_task = tokio::spawn(run_card(card, inputs_rx, shutdown_rx, snapshot_tx));

        let dispatcher = DecodeDispatcher::new(
            Handle::current(),
            Arc::new(decoder),
            clock,
            inputs.clone(),
            Arc::clone(&counters),
        );
        let scan_inputs = inputs.clone();
        let scan_stop = stop.clone();
        let WidgetConfig {
            capture,
            tick_interval,
        } = config;

        let scan_task = tokio::task::spawn_blocking(move || {
            let mut camera = camera_factory();
            match camera.open(&capture) {
                Ok(()) => {
                    if scan_inputs.send(WidgetInput::CameraReady).is_err() {
                        camera.close();
                        return;
                    }
                    ScanLoop::new(camera, dispatcher, tick_interval).run(&scan_stop);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Camera unavailable, scanning disabled");
                    let _ = scan_inputs.send(WidgetInput::CameraUnavailable(e.to_string()));
                }
            }
        });

        tracing::info!("Widget mounted");

        Self {
            inputs,
            shutdown_tx,
            snapshots,
            stop,
            counters,
            card_task,
            scan_task,
        }
    }

    /// Queues a reset. Returns false once the widget is gone.
    pub fn reset(&self) -> bool {
        self.inputs.send(WidgetInput::Reset).is_ok()
    }

    /// Queues a payload decoded outside the scan loop.
    pub fn push_scan(&self, event: ScanEvent) -> bool {
        self.inputs.send(WidgetInput::Scan(event)).is_ok()
    }

    /// Latest published card state.
    pub fn snapshot(&self) -> CardSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified after every handled input.
    pub fn subscribe(&self) -> watch::Receiver<CardSnapshot> {
        self.snapshots.clone()
    }

    /// Current scan loop totals.
    pub fn counters(&self) -> ScanCountersSnapshot {
        self.counters.snapshot()
    }

    /// Stops scanning, closes the camera and returns the final card.
    ///
    /// Inputs still queued when the shutdown is seen are discarded.
    pub async fn unmount(self) -> Result<Unmounted, WidgetError> {
        self.stop.trigger();
        let _ = self.shutdown_tx.send(true);

        let card = self.card_task.await?;
        self.scan_task.await?;

        tracing::info!("Widget unmounted");
        Ok(Unmounted {
            card,
            counters: self.counters.snapshot(),
        })
    }
}

/// Single logical owner of the card state.
async fn run_card(
    mut card: LoyaltyCard,
    mut inputs: mpsc::UnboundedReceiver<WidgetInput>,
    mut shutdown: watch::Receiver<bool>,
    snapshots: watch::Sender<CardSnapshot>,
) -> LoyaltyCard {
    loop {
        tokio::select! {
            biased;

            _ = shutdown.changed() => break,

            input = inputs.recv() => {
                let Some(input) = input else { break };
                apply(&mut card, input);
                snapshots.send_replace(CardSnapshot::of(&card));
            }
        }
    }
    card
}

fn apply(card: &mut LoyaltyCard, input: WidgetInput) {
    match input {
        WidgetInput::Scan(event) => {
            let _ = card.handle_scan(&event);
        }
        WidgetInput::CameraReady => card.camera_ready(),
        WidgetInput::CameraUnavailable(reason) => {
            tracing::warn!(%reason, "Showing camera-unavailable message");
            card.camera_unavailable();
        }
        WidgetInput::Reset => card.reset(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::rules::CAMERA_UNAVAILABLE_MESSAGE;

    #[test]
    fn test_apply_routes_inputs() {
        let mut card = LoyaltyCard::new();

        apply(&mut card, WidgetInput::CameraReady);
        assert!(card.stats().camera_available);

        apply(&mut card, WidgetInput::Scan(ScanEvent::new("snuggest drink qr", 0)));
        assert_eq!(card.state().drink_count(), 1);

        apply(&mut card, WidgetInput::CameraUnavailable("gone".into()));
        assert_eq!(card.state().message(), CAMERA_UNAVAILABLE_MESSAGE);

        apply(&mut card, WidgetInput::Reset);
        assert_eq!(card.state(), &ProgressState::default());
    }

    #[test]
    fn test_config_from_file() {
        let mut file = FileConfig::default();
        file.scan.tick_interval_ms = 40;

        let config = WidgetConfig::from(&file);
        assert_eq!(config.tick_interval, Duration::from_millis(40));
        assert_eq!(config.capture.width, file.capture.width);
    }
}
