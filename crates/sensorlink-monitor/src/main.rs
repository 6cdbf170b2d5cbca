//! SensorLink monitor
//!
//! Listens for sensor board telemetry, prints the live view to the console
//! and logs every reading to a CSV file.

mod console;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use sensorlink_core::config::MonitorConfig;
use sensorlink_core::demo::DemoSensor;
use sensorlink_core::monitor::Monitor;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Deployment presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Profile {
    /// 100-row window, 2 s offline threshold
    Compact,
    /// 300-row window, 1 s offline threshold, elapsed column
    LongDuration,
}

#[derive(Parser, Debug)]
#[command(name = "sensorlink-monitor", version, about = "Live UDP telemetry monitor")]
struct Cli {
    /// JSON configuration file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Preset used when no configuration file is given
    #[arg(long, value_enum, default_value = "compact")]
    profile: Profile,

    /// Address:port to listen on (overrides the configuration)
    #[arg(long)]
    bind: Option<String>,

    /// Directory for session logs (overrides the configuration)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Rolling window size (overrides the configuration)
    #[arg(long)]
    window: Option<usize>,

    /// Write the effective configuration to this file and exit
    #[arg(long)]
    write_config: Option<PathBuf>,

    /// Feed the monitor from a simulated sensor board
    #[arg(long)]
    demo: bool,

    /// Demo send interval in milliseconds
    #[arg(long, default_value_t = 500)]
    demo_interval_ms: u64,
}

impl Cli {
    fn resolve_config(&self) -> anyhow::Result<MonitorConfig> {
        let mut config = match &self.config {
            Some(path) => MonitorConfig::load(path)
                .with_context(|| format!("loading configuration from {}", path.display()))?,
            None => match self.profile {
                Profile::Compact => MonitorConfig::compact(),
                Profile::LongDuration => MonitorConfig::long_duration(),
            },
        };

        if let Some(bind) = &self.bind {
            config.bind_addr = bind.clone();
        }
        if let Some(log_dir) = &self.log_dir {
            config.log_dir = log_dir.clone();
        }
        if let Some(window) = self.window {
            config.window_capacity = window;
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

/// Send simulated board datagrams to `target` until cancelled
async fn run_demo(
    target: SocketAddr,
    interval: Duration,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let socket = UdpSocket::bind("127.0.0.1:0").await.context("binding demo sender")?;
    let mut sensor = DemoSensor::new();
    let mut ticker = tokio::time::interval(interval);
    let start = Instant::now();

    tracing::info!("Demo sensor sending to {} every {:?}", target, interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        let payload = sensor.next_payload(start.elapsed().as_millis() as u64);
        if let Err(e) = socket.send_to(payload.as_bytes(), target).await {
            tracing::warn!("Demo send failed: {}", e);
        }
    }
    Ok(())
}

/// Loopback address to reach a socket bound to `addr`
fn loopback_target(addr: SocketAddr) -> SocketAddr {
    if addr.ip().is_unspecified() {
        SocketAddr::from(([127, 0, 0, 1], addr.port()))
    } else {
        addr
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    if let Some(path) = &cli.write_config {
        config
            .save(path)
            .with_context(|| format!("writing configuration to {}", path.display()))?;
        println!("Configuration written to {}", path.display());
        return Ok(());
    }

    let monitor = Monitor::start(config).await.context("starting monitor")?;
    let local_addr = monitor.local_addr()?;
    println!("Saving to: {}", monitor.session().log_path().display());

    let cancel = CancellationToken::new();
    let (requests_tx, requests_rx) = mpsc::channel(32);

    let presenter = tokio::spawn(console::present(monitor.subscribe(), cancel.clone()));
    let input = tokio::spawn(console::read_commands(
        requests_tx,
        monitor.subscribe(),
        cancel.clone(),
    ));

    let demo = if cli.demo {
        let target = loopback_target(local_addr);
        let interval = Duration::from_millis(cli.demo_interval_ms.max(10));
        Some(tokio::spawn(run_demo(target, interval, cancel.clone())))
    } else {
        None
    };

    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let report = monitor.run(requests_rx, cancel.clone()).await;
    cancel.cancel();

    let _ = presenter.await;
    // stdin reads cannot be interrupted; don't wait on the input task
    input.abort();
    ctrl_c.abort();
    if let Some(demo) = demo {
        demo.await??;
    }

    println!(
        "Session {} finished: {} readings, {} rejected, {} rows written, {} dropped -> {}",
        report.session_id,
        report.packet_count,
        report.decode_errors,
        report.rows_written,
        report.dropped_rows,
        report.log_path.display()
    );
    Ok(())
}
