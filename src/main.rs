//! Snuggest Loyalty Card CLI
//!
//! Mounts the stamp card on the local camera and redraws it in the
//! terminal whenever a scan, reset or camera event changes it.

use clap::Parser;
use snuggest_loyalty::{
    card::render_card,
    config::FileConfig,
    decode::RqrrDecoder,
    metrics::{MetricsRegistry, MetricsSnapshot},
    scanner::{SystemClock, WidgetConfig, WidgetHandle},
};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// How often scan loop counters are pushed to metrics between card events.
const METRICS_REFRESH: Duration = Duration::from_secs(1);

#[derive(Debug, Parser)]
#[command(name = "snuggest-card", version, about = "Camera-driven loyalty stamp card")]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Camera device index (overrides the facing preference).
    #[arg(long)]
    device: Option<u32>,

    /// Milliseconds between decode ticks.
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Port for the Prometheus endpoint (0 disables it).
    #[arg(long)]
    metrics_port: Option<u16>,

    /// Default log level when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,
}

/// Commands typed on stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Reset,
    Quit,
}

fn parse_control(line: &str) -> Option<Control> {
    match line.trim().to_ascii_lowercase().as_str() {
        "r" | "reset" => Some(Control::Reset),
        "q" | "quit" | "exit" => Some(Control::Quit),
        _ => None,
    }
}

fn load_config(cli: &Cli) -> Result<FileConfig, snuggest_loyalty::ConfigError> {
    let mut config = match &cli.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };

    if let Some(device) = cli.device {
        config.capture.device_id = Some(device);
    }
    if let Some(tick_ms) = cli.tick_ms {
        config.scan.tick_interval_ms = tick_ms;
    }
    if let Some(port) = cli.metrics_port {
        config.output.metrics_port = port;
    }

    config.validate()?;
    Ok(config)
}

#[cfg(feature = "camera")]
fn camera() -> snuggest_loyalty::capture::NokhwaCamera {
    snuggest_loyalty::capture::NokhwaCamera::new()
}

#[cfg(not(feature = "camera"))]
fn camera() -> snuggest_loyalty::capture::UnavailableCamera {
    snuggest_loyalty::capture::UnavailableCamera
}

/// Where metric snapshots go.
enum MetricsSink {
    Local(MetricsRegistry),
    #[cfg(feature = "metrics")]
    Served(Arc<tokio::sync::RwLock<snuggest_loyalty::metrics::MetricsState>>),
}

impl MetricsSink {
    fn start(registry: MetricsRegistry, port: u16) -> Self {
        #[cfg(feature = "metrics")]
        if port != 0 {
            use snuggest_loyalty::metrics::{MetricsServer, MetricsServerConfig};

            let server = MetricsServer::new(MetricsServerConfig::with_port(port), registry);
            let state = server.state();
            tokio::spawn(async move {
                if let Err(e) = server.run().await {
                    warn!("Metrics server stopped: {}", e);
                }
            });
            return MetricsSink::Served(state);
        }

        #[cfg(not(feature = "metrics"))]
        if port != 0 {
            warn!(port, "Built without the `metrics` feature, exporter disabled");
        }

        MetricsSink::Local(registry)
    }

    async fn update(&self, snapshot: &MetricsSnapshot) {
        match self {
            MetricsSink::Local(registry) => registry.update(snapshot),
            #[cfg(feature = "metrics")]
            MetricsSink::Served(state) => state.read().await.update(snapshot),
        }
    }
}

/// Pushes the current card and scan loop totals to the sink.
///
/// The scan loop counts ticks and misses without producing card inputs,
/// so this also runs on a timer.
async fn refresh_metrics(metrics: &MetricsSink, widget: &WidgetHandle) {
    metrics
        .update(&MetricsSnapshot::from_widget(&widget.snapshot(), &widget.counters()))
        .await;
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(cli.log_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Snuggest Loyalty Card v{}", snuggest_loyalty::VERSION);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let registry = match MetricsRegistry::new() {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Failed to create metrics registry: {}", e);
            std::process::exit(1);
        }
    };
    let metrics = MetricsSink::start(registry, config.output.metrics_port);

    let (quit_tx, mut quit_rx) = mpsc::unbounded_channel::<()>();
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = quit_tx.send(());
    }) {
        warn!("Failed to install Ctrl-C handler: {}", e);
    }

    let (control_tx, mut control_rx) = mpsc::unbounded_channel::<Control>();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines().map_while(Result::ok) {
            if let Some(control) = parse_control(&line) {
                if control_tx.send(control).is_err() {
                    break;
                }
            }
        }
    });

    let widget = WidgetHandle::mount(
        camera,
        RqrrDecoder::new(),
        Arc::new(SystemClock),
        WidgetConfig::from(&config),
    );

    let mut updates = widget.subscribe();
    let mut shown = updates.borrow_and_update().state.clone();
    print!("{}", render_card(&shown, widget.snapshot().total, &config.output.qr_image));

    let mut metrics_tick = tokio::time::interval(METRICS_REFRESH);
    metrics_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            Some(()) = quit_rx.recv() => {
                info!("Interrupted");
                break;
            }
            Some(control) = control_rx.recv() => match control {
                Control::Reset => {
                    widget.reset();
                }
                Control::Quit => break,
            },
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                // Rate-limited repeats publish too; only redraw on a visible change
                if snapshot.state != shown {
                    println!();
                    print!("{}", render_card(&snapshot.state, snapshot.total, &config.output.qr_image));
                    shown = snapshot.state.clone();
                }
                refresh_metrics(&metrics, &widget).await;
            }
            _ = metrics_tick.tick() => refresh_metrics(&metrics, &widget).await,
        }
    }

    match widget.unmount().await {
        Ok(done) => {
            let stats = done.card.stats();
            info!(
                stamps = done.card.state().drink_count(),
                accepted = stats.accepted,
                rate_limited = stats.rate_limited,
                invalid = stats.invalid,
                decode_misses = done.counters.misses,
                ticks = done.counters.ticks,
                "Done"
            );
        }
        Err(e) => {
            eprintln!("Widget shutdown failed: {}", e);
            std::process::exit(1);
        }
    }
}
