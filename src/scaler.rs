use std::fmt;

use tracing::{error, instrument};

use crate::provisioner::{InstanceSpec, Provisioner};

/// Result of one escalation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScaleOutcome {
    Succeeded,
    Failed { reason: String },
}

impl ScaleOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ScaleOutcome::Succeeded)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ScaleOutcome::Succeeded => None,
            ScaleOutcome::Failed { reason } => Some(reason),
        }
    }
}

impl fmt::Display for ScaleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaleOutcome::Succeeded => write!(f, "Successfully triggered GCP scaling."),
            ScaleOutcome::Failed { reason } => write!(f, "Failed to scale to GCP: {reason}"),
        }
    }
}

/// Creates one instance with fixed parameters. No retry, no existence check.
#[derive(Debug)]
pub struct Scaler<P> {
    provisioner: P,
    spec: InstanceSpec,
}

impl<P> Scaler<P>
where
    P: Provisioner,
{
    pub fn new(provisioner: P, spec: InstanceSpec) -> Self {
        Self { provisioner, spec }
    }

    pub fn spec(&self) -> &InstanceSpec {
        &self.spec
    }

    #[instrument(skip(self), fields(instance = %self.spec))]
    pub async fn scale_out(&self) -> ScaleOutcome {
        match self.provisioner.provision(&self.spec).await {
            Ok(()) => ScaleOutcome::Succeeded,
            Err(e) => {
                error!("provisioning failed: {e}");
                ScaleOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}
