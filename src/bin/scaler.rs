use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use resource_scaler::{
    activity::FileActivityLog,
    config::{Config, read_config_file},
    monitors::host::{HostMonitor, MonitorExit},
    provisioner::CommandProvisioner,
    sampler::SystemSampler,
    scaler::Scaler,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

/// Watch local CPU, memory and disk usage and create a cloud instance once
/// any of them exceeds the threshold.
#[derive(Debug, Clone, Parser)]
#[command(version)]
struct Args {
    /// JSON config file
    #[arg(short, long, env = "SCALER_CONFIG")]
    file: Option<PathBuf>,

    /// Percentage above which scaling is triggered
    #[arg(long, env = "SCALER_THRESHOLD")]
    threshold: Option<f64>,

    /// Seconds between two samples
    #[arg(long, env = "SCALER_INTERVAL")]
    interval: Option<u64>,

    /// File the activity log is appended to
    #[arg(long, env = "SCALER_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Cloud SDK binary
    #[arg(long, env = "SCALER_PROGRAM")]
    program: Option<PathBuf>,

    #[arg(long, env = "SCALER_INSTANCE_NAME")]
    instance_name: Option<String>,

    #[arg(long, env = "SCALER_MACHINE_TYPE")]
    machine_type: Option<String>,

    #[arg(long, env = "SCALER_ZONE")]
    zone: Option<String>,

    /// Kill the provisioning command after this many seconds
    #[arg(long, env = "SCALER_PROVISION_TIMEOUT")]
    provision_timeout: Option<u64>,
}

impl Args {
    fn resolve(self) -> anyhow::Result<Config> {
        let mut config = match &self.file {
            Some(path) => read_config_file(path)?,
            None => Config::default(),
        };

        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if let Some(interval) = self.interval {
            config.interval = interval;
        }
        if let Some(log_file) = self.log_file {
            config.log_file = log_file;
        }
        if let Some(program) = self.program {
            config.provisioner.program = program;
        }
        if let Some(instance_name) = self.instance_name {
            config.provisioner.instance_name = instance_name;
        }
        if let Some(machine_type) = self.machine_type {
            config.provisioner.machine_type = machine_type;
        }
        if let Some(zone) = self.zone {
            config.provisioner.zone = zone;
        }
        if self.provision_timeout.is_some() {
            config.provisioner.timeout = self.provision_timeout;
        }

        config.validate()?;
        Ok(config)
    }
}

fn init() {
    dotenv::dotenv().ok();

    let filter = filter::Targets::new().with_target("resource_scaler", LevelFilter::DEBUG);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

/// Resolves on Ctrl-C. Never resolves if the signal handler cannot be installed.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config = args.resolve()?;
    debug!("resolved config: {config:?}");

    let log = FileActivityLog::open(&config.log_file)
        .with_context(|| format!("failed to open log file {}", config.log_file.display()))?;

    let scaler = Scaler::new(
        CommandProvisioner::from_config(&config.provisioner),
        config.provisioner.instance_spec(),
    );
    let mut monitor = HostMonitor::new(
        SystemSampler::new(&config.sampler),
        scaler,
        log,
        config.threshold,
        config.poll_interval(),
    );

    // dropping the run future mid-poll also kills a running provisioning command
    let outcome = tokio::select! {
        result = monitor.run(CancellationToken::new()) => Some(result),
        _ = interrupted() => None,
    };

    match outcome {
        Some(result) => match result.context("resource monitoring failed")? {
            MonitorExit::Scaled(outcome) => debug!("finished after escalation: {outcome:?}"),
            MonitorExit::Cancelled { polls } => debug!("cancelled after {polls} polls"),
        },
        None => debug!("interrupted after {} polls", monitor.polls()),
    }

    Ok(())
}
