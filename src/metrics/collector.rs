//! Metrics collection and registry.

use crate::card::CardStats;
use crate::scanner::{CardSnapshot, ScanCountersSnapshot};
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Registration or encoding failed.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of widget state for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Decode ticks run.
    pub ticks: u64,
    /// Ticks skipped (no frame yet, or behind schedule).
    pub ticks_skipped: u64,
    /// Frames handed to the decoder.
    pub decodes_submitted: u64,
    /// Decodes that found no code.
    pub decode_misses: u64,
    /// Payloads that reached the card.
    pub scans_decoded: u64,
    /// Payloads inside the cooldown window.
    pub scans_rate_limited: u64,
    /// Payloads failing the content check (empty ones included).
    pub scans_invalid: u64,
    /// Payloads accepted as stamps.
    pub scans_accepted: u64,
    /// Completed cards.
    pub rewards_unlocked: u64,
    /// User resets.
    pub resets: u64,
    /// Current stamps on the card.
    pub drink_count: u32,
    /// Whether the camera is streaming.
    pub camera_available: bool,
}

impl MetricsSnapshot {
    /// Creates a snapshot from the card and scan loop state.
    pub fn from_widget(card: &CardSnapshot, scan: &ScanCountersSnapshot) -> Self {
        let stats: &CardStats = &card.stats;
        Self {
            ticks: scan.ticks,
            ticks_skipped: scan.not_ready + scan.late,
            decodes_submitted: scan.submitted,
            decode_misses: scan.misses,
            scans_decoded: stats.decoded,
            scans_rate_limited: stats.rate_limited,
            scans_invalid: stats.invalid + stats.empty,
            scans_accepted: stats.accepted,
            rewards_unlocked: stats.rewards_unlocked,
            resets: stats.resets,
            drink_count: card.state.drink_count(),
            camera_available: stats.camera_available,
        }
    }
}

/// Prometheus metrics registry for the scanner.
pub struct MetricsRegistry {
    registry: Registry,

    // Scan loop metrics
    ticks_total: IntCounter,
    ticks_skipped_total: IntCounter,
    decode_submitted_total: IntCounter,
    decode_miss_total: IntCounter,

    // Validation metrics
    scans_decoded_total: IntCounter,
    scans_rate_limited_total: IntCounter,
    scans_invalid_total: IntCounter,
    scans_accepted_total: IntCounter,

    // Card metrics
    rewards_unlocked_total: IntCounter,
    resets_total: IntCounter,
    drink_count: IntGauge,
    camera_available: IntGauge,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all scanner metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let ticks_total = IntCounter::new("snuggest_scan_ticks_total", "Decode ticks run")?;
        let ticks_skipped_total = IntCounter::new(
            "snuggest_scan_ticks_skipped_total",
            "Ticks skipped because no frame was ready or the loop fell behind",
        )?;
        let decode_submitted_total = IntCounter::new(
            "snuggest_decode_submitted_total",
            "Downscaled frames handed to the QR decoder",
        )?;
        let decode_miss_total = IntCounter::new(
            "snuggest_decode_miss_total",
            "Decodes that found no QR code",
        )?;

        let scans_decoded_total = IntCounter::new(
            "snuggest_scans_decoded_total",
            "Decoded payloads delivered to the card",
        )?;
        let scans_rate_limited_total = IntCounter::new(
            "snuggest_scans_rate_limited_total",
            "Payloads dropped inside the cooldown window",
        )?;
        let scans_invalid_total = IntCounter::new(
            "snuggest_scans_invalid_total",
            "Payloads that failed the content check",
        )?;
        let scans_accepted_total = IntCounter::new(
            "snuggest_scans_accepted_total",
            "Payloads accepted as stamps",
        )?;

        let rewards_unlocked_total = IntCounter::new(
            "snuggest_rewards_unlocked_total",
            "Cards completed",
        )?;
        let resets_total = IntCounter::new("snuggest_card_resets_total", "Card resets")?;
        let drink_count = IntGauge::new("snuggest_drink_count", "Stamps on the card")?;
        let camera_available = IntGauge::new(
            "snuggest_camera_available",
            "Camera status (1=streaming, 0=unavailable)",
        )?;

        registry.register(Box::new(ticks_total.clone()))?;
        registry.register(Box::new(ticks_skipped_total.clone()))?;
        registry.register(Box::new(decode_submitted_total.clone()))?;
        registry.register(Box::new(decode_miss_total.clone()))?;
        registry.register(Box::new(scans_decoded_total.clone()))?;
        registry.register(Box::new(scans_rate_limited_total.clone()))?;
        registry.register(Box::new(scans_invalid_total.clone()))?;
        registry.register(Box::new(scans_accepted_total.clone()))?;
        registry.register(Box::new(rewards_unlocked_total.clone()))?;
        registry.register(Box::new(resets_total.clone()))?;
        registry.register(Box::new(drink_count.clone()))?;
        registry.register(Box::new(camera_available.clone()))?;

        Ok(Self {
            registry,
            ticks_total,
            ticks_skipped_total,
            decode_submitted_total,
            decode_miss_total,
            scans_decoded_total,
            scans_rate_limited_total,
            scans_invalid_total,
            scans_accepted_total,
            rewards_unlocked_total,
            resets_total,
            drink_count,
            camera_available,
        })
    }

    /// Updates all metrics from a snapshot of widget state.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        // Counters only move forward by the difference
        advance(&self.ticks_total, snapshot.ticks);
        advance(&self.ticks_skipped_total, snapshot.ticks_skipped);
        advance(&self.decode_submitted_total, snapshot.decodes_submitted);
        advance(&self.decode_miss_total, snapshot.decode_misses);
        advance(&self.scans_decoded_total, snapshot.scans_decoded);
        advance(&self.scans_rate_limited_total, snapshot.scans_rate_limited);
        advance(&self.scans_invalid_total, snapshot.scans_invalid);
        advance(&self.scans_accepted_total, snapshot.scans_accepted);
        advance(&self.rewards_unlocked_total, snapshot.rewards_unlocked);
        advance(&self.resets_total, snapshot.resets);

        self.drink_count.set(snapshot.drink_count as i64);
        self.camera_available
            .set(if snapshot.camera_available { 1 } else { 0 });
    }

    /// Last camera status pushed by [`MetricsRegistry::update`].
    pub fn camera_available(&self) -> bool {
        self.camera_available.get() == 1
    }

    /// Current stamp gauge.
    pub fn drink_count(&self) -> i64 {
        self.drink_count.get()
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn advance(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}
