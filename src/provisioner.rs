//! Capacity provisioning through an external command.

use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use crate::config::ProvisionerConfig;

/// Parameters of the compute instance created on escalation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceSpec {
    pub instance_name: String,
    pub machine_type: String,
    pub zone: String,
}

impl InstanceSpec {
    /// Arguments of `gcloud compute instances create`.
    pub fn create_args(&self) -> Vec<String> {
        vec![
            "compute".to_string(),
            "instances".to_string(),
            "create".to_string(),
            self.instance_name.clone(),
            format!("--machine-type={}", self.machine_type),
            format!("--zone={}", self.zone),
        ]
    }
}

impl fmt::Display for InstanceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} in {})",
            self.instance_name, self.machine_type, self.zone
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait for `{command}`: {source}")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command `{command}` returned non-zero exit status {}", display_code(.code))]
    Exited { command: String, code: Option<i32> },

    #[error("command `{command}` did not finish within {}s", .after.as_secs())]
    TimedOut { command: String, after: Duration },
}

fn display_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "unknown (terminated by signal)".to_string(), |code| code.to_string())
}

#[async_trait]
pub trait Provisioner: Send + Sync {
    async fn provision(&self, spec: &InstanceSpec) -> Result<(), ProvisionError>;
}

/// Runs the cloud SDK binary as a child process and waits for it.
#[derive(Debug, Clone)]
pub struct CommandProvisioner {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl CommandProvisioner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
        }
    }

    pub fn from_config(config: &ProvisionerConfig) -> Self {
        Self::new(config.program.clone()).with_timeout(config.timeout())
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn command_line(&self, spec: &InstanceSpec) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(spec.create_args());
        parts.join(" ")
    }
}

#[async_trait]
impl Provisioner for CommandProvisioner {
    #[instrument(skip(self), fields(program = %self.program.display()))]
    async fn provision(&self, spec: &InstanceSpec) -> Result<(), ProvisionError> {
        let command = self.command_line(spec);
        debug!("running {command}");

        let mut child = Command::new(&self.program)
            .args(spec.create_args())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProvisionError::Spawn {
                command: command.clone(),
                source,
            })?;

        let waited = match self.timeout {
            Some(after) => {
                let waited = tokio::time::timeout(after, child.wait()).await;
                let Ok(waited) = waited else {
                    if let Err(e) = child.kill().await {
                        warn!("failed to kill {command} after timeout: {e}");
                    }
                    return Err(ProvisionError::TimedOut { command, after });
                };
                waited
            }
            None => child.wait().await,
        };

        let status = waited.map_err(|source| ProvisionError::Wait {
            command: command.clone(),
            source,
        })?;

        debug!("{command} exited with {status}");

        if status.success() {
            Ok(())
        } else {
            Err(ProvisionError::Exited {
                command,
                code: status.code(),
            })
        }
    }
}
