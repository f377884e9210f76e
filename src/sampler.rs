//! Host utilization sampling
//!
//! [`SystemSampler`] reads CPU, memory and disk utilization through `sysinfo`.
//! CPU usage only has meaning relative to a previous refresh, so every sample
//! refreshes, waits for the observation window and refreshes again.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use sysinfo::{Disks, System};
use tracing::{instrument, trace};

use crate::config::SamplerConfig;
use crate::util::{round_percent, used_percent};
use crate::{Metric, Sample};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SampleError {
    #[error("{metric} usage unavailable: {reason}")]
    MetricUnavailable { metric: Metric, reason: String },
}

impl SampleError {
    pub fn unavailable(metric: Metric, reason: impl Into<String>) -> Self {
        SampleError::MetricUnavailable {
            metric,
            reason: reason.into(),
        }
    }
}

#[async_trait]
pub trait Sampler: Send {
    async fn sample(&mut self) -> Result<Sample, SampleError>;
}

#[derive(Debug)]
pub struct SystemSampler {
    system: System,
    disk_mount: PathBuf,
    cpu_window: Duration,
}

impl SystemSampler {
    pub fn new(config: &SamplerConfig) -> Self {
        let cpu_window =
            Duration::from_millis(config.cpu_window_ms).max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);

        Self {
            system: System::new(),
            disk_mount: config.disk_mount.clone(),
            cpu_window,
        }
    }

    pub fn cpu_window(&self) -> Duration {
        self.cpu_window
    }

    async fn cpu_usage(&mut self) -> Result<f64, SampleError> {
        self.system.refresh_cpu_usage();
        tokio::time::sleep(self.cpu_window).await;
        self.system.refresh_cpu_usage();

        if self.system.cpus().is_empty() {
            return Err(SampleError::unavailable(Metric::Cpu, "no CPUs reported"));
        }

        let usage = self.system.global_cpu_usage() as f64;
        if !usage.is_finite() {
            return Err(SampleError::unavailable(
                Metric::Cpu,
                format!("invalid reading {usage}"),
            ));
        }

        Ok(round_percent(usage.clamp(0.0, 100.0)))
    }

    fn memory_usage(&mut self) -> Result<f64, SampleError> {
        self.system.refresh_memory();
        used_percent(self.system.total_memory(), self.system.available_memory())
            .ok_or_else(|| SampleError::unavailable(Metric::Memory, "total memory reported as 0"))
    }

    fn disk_usage(&self) -> Result<f64, SampleError> {
        let disks = Disks::new_with_refreshed_list();
        disk_usage_at(
            disks
                .list()
                .iter()
                .map(|disk| (disk.mount_point(), disk.total_space(), disk.available_space())),
            &self.disk_mount,
        )
    }
}

/// Usage of the filesystem holding `path`, i.e. the mount point that is the
/// longest prefix of it.
fn disk_usage_at<'a>(
    disks: impl Iterator<Item = (&'a Path, u64, u64)>,
    path: &Path,
) -> Result<f64, SampleError> {
    let Some((_, total, available)) = disks
        .filter(|(mount_point, _, _)| path.starts_with(mount_point))
        .max_by_key(|(mount_point, _, _)| mount_point.components().count())
    else {
        return Err(SampleError::unavailable(
            Metric::Disk,
            format!("no filesystem found for {}", path.display()),
        ));
    };

    used_percent(total, available).ok_or_else(|| {
        SampleError::unavailable(
            Metric::Disk,
            format!("filesystem holding {} reports no capacity", path.display()),
        )
    })
}

#[async_trait]
impl Sampler for SystemSampler {
    #[instrument(skip(self))]
    async fn sample(&mut self) -> Result<Sample, SampleError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(SampleError::unavailable(
                Metric::Cpu,
                "platform not supported by sysinfo",
            ));
        }

        let cpu = self.cpu_usage().await?;
        let memory = self.memory_usage()?;
        let disk = self.disk_usage()?;

        let sample = Sample::new(cpu, memory, disk);
        trace!("sampled {sample:?}");
        Ok(sample)
    }
}
