use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::trace;

use crate::provisioner::InstanceSpec;
use crate::util::{
    DEFAULT_CPU_WINDOW_MS, DEFAULT_DISK_MOUNT, DEFAULT_INSTANCE_NAME, DEFAULT_INTERVAL_SECS,
    DEFAULT_LOG_FILE, DEFAULT_MACHINE_TYPE, DEFAULT_PROGRAM, DEFAULT_THRESHOLD, DEFAULT_ZONE,
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("threshold must be a percentage between 0 and 100, got {0}")]
    Threshold(f64),

    #[error("poll interval must be at least one second")]
    Interval,

    #[error("provisioning parameter `{0}` must not be empty")]
    EmptyParameter(&'static str),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Percentage above which any metric triggers escalation
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Seconds between two samples
    #[serde(default = "default_interval")]
    pub interval: u64,

    /// File the activity log is appended to
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    #[serde(default)]
    pub sampler: SamplerConfig,

    #[serde(default)]
    pub provisioner: ProvisionerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            interval: default_interval(),
            log_file: default_log_file(),
            sampler: SamplerConfig::default(),
            provisioner: ProvisionerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SamplerConfig {
    /// Path whose filesystem is reported as disk usage
    #[serde(default = "default_disk_mount")]
    pub disk_mount: PathBuf,

    /// Observation window for CPU utilization in milliseconds
    #[serde(default = "default_cpu_window_ms")]
    pub cpu_window_ms: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            disk_mount: default_disk_mount(),
            cpu_window_ms: default_cpu_window_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProvisionerConfig {
    /// Cloud SDK binary used to create the instance
    #[serde(default = "default_program")]
    pub program: PathBuf,

    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    #[serde(default = "default_machine_type")]
    pub machine_type: String,

    #[serde(default = "default_zone")]
    pub zone: String,

    /// Upper bound for the provisioning command in seconds, unbounded if unset
    #[serde(default)]
    pub timeout: Option<u64>,
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            instance_name: default_instance_name(),
            machine_type: default_machine_type(),
            zone: default_zone(),
            timeout: None,
        }
    }
}

impl ProvisionerConfig {
    pub fn instance_spec(&self) -> InstanceSpec {
        InstanceSpec {
            instance_name: self.instance_name.clone(),
            machine_type: self.machine_type.clone(),
            zone: self.zone.clone(),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.threshold.is_finite() || !(0.0..=100.0).contains(&self.threshold) {
            return Err(ConfigError::Threshold(self.threshold));
        }

        if self.interval == 0 {
            return Err(ConfigError::Interval);
        }

        let ProvisionerConfig {
            instance_name,
            machine_type,
            zone,
            ..
        } = &self.provisioner;

        for (name, value) in [
            ("instance_name", instance_name),
            ("machine_type", machine_type),
            ("zone", zone),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyParameter(name));
            }
        }

        if self.provisioner.program.as_os_str().is_empty() {
            return Err(ConfigError::EmptyParameter("program"));
        }

        Ok(())
    }
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECS
}

fn default_log_file() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_FILE)
}

fn default_disk_mount() -> PathBuf {
    PathBuf::from(DEFAULT_DISK_MOUNT)
}

fn default_cpu_window_ms() -> u64 {
    DEFAULT_CPU_WINDOW_MS
}

fn default_program() -> PathBuf {
    PathBuf::from(DEFAULT_PROGRAM)
}

fn default_instance_name() -> String {
    DEFAULT_INSTANCE_NAME.to_string()
}

fn default_machine_type() -> String {
    DEFAULT_MACHINE_TYPE.to_string()
}

fn default_zone() -> String {
    DEFAULT_ZONE.to_string()
}

pub fn parse_config(path: &Path, content: &str) -> Result<Config, ConfigError> {
    serde_json::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_config_file(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let file_content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(path, &file_content).inspect(|config| trace!("loaded config: {config:?}"))
}
