//! Polling loop for the local host
//!
//! ```text
//! sample → log line → evaluate ──within──→ sleep(interval) → sample ...
//!                         │
//!                         └──exceeded──→ warn → scale out once → log outcome → Terminated
//! ```
//!
//! The loop never retries an escalation: after the first breach it terminates
//! whatever the outcome. A sampler error ends the loop immediately and is
//! returned to the caller without anything being logged for that poll.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace, warn};

use crate::Sample;
use crate::activity::{ActivityLog, Severity};
use crate::monitors::resources::ResourceEvaluation;
use crate::provisioner::Provisioner;
use crate::sampler::{SampleError, Sampler};
use crate::scaler::{ScaleOutcome, Scaler};

pub const THRESHOLD_WARNING: &str = "Resource threshold exceeded! Triggering cloud scaling...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Running,
    Terminated,
}

/// Result of a single poll.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Every metric stayed at or below the threshold.
    Continue(Sample),
    /// A metric exceeded the threshold and the scaler ran.
    Escalated(ScaleOutcome),
    /// A metric exceeded the threshold, but shutdown was requested while
    /// sampling, so the scaler did not run.
    Interrupted(Sample),
}

/// How [`HostMonitor::run`] finished.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorExit {
    Scaled(ScaleOutcome),
    Cancelled { polls: u64 },
}

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error(transparent)]
    Sample(#[from] SampleError),

    #[error("monitor already escalated and terminated")]
    Terminated,
}

pub struct HostMonitor<S, P, L> {
    sampler: S,
    scaler: Scaler<P>,
    log: L,
    threshold: f64,
    interval: Duration,
    state: MonitorState,
    polls: u64,
}

impl<S, P, L> HostMonitor<S, P, L>
where
    S: Sampler,
    P: Provisioner,
    L: ActivityLog,
{
    pub fn new(sampler: S, scaler: Scaler<P>, log: L, threshold: f64, interval: Duration) -> Self {
        Self {
            sampler,
            scaler,
            log,
            threshold,
            interval,
            state: MonitorState::Running,
            polls: 0,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Number of samples taken so far.
    pub fn polls(&self) -> u64 {
        self.polls
    }

    /// Take one sample, log it and escalate if needed. Never sleeps.
    pub async fn poll_once(&mut self) -> Result<Step, MonitorError> {
        self.poll(&CancellationToken::new()).await
    }

    /// A breach seen after `shutdown` was cancelled is not escalated.
    #[instrument(skip_all, fields(poll = self.polls + 1))]
    async fn poll(&mut self, shutdown: &CancellationToken) -> Result<Step, MonitorError> {
        if self.state == MonitorState::Terminated {
            return Err(MonitorError::Terminated);
        }

        let sample = self.sampler.sample().await?;
        self.polls += 1;

        self.log.log(Severity::Info, &sample.to_string());

        let evaluation = ResourceEvaluation::evaluate(&sample, self.threshold);
        trace!("{sample:?} (max: {}) -> {evaluation:?}", self.threshold);

        let ResourceEvaluation::Exceeded(metrics) = evaluation else {
            return Ok(Step::Continue(sample));
        };

        if shutdown.is_cancelled() {
            debug!("{metrics:?} above {}%, but shutdown was requested", self.threshold);
            return Ok(Step::Interrupted(sample));
        }

        warn!("{metrics:?} above {}%, scaling out", self.threshold);
        self.log.announce(THRESHOLD_WARNING);

        let outcome = self.scaler.scale_out().await;
        let severity = if outcome.is_success() {
            Severity::Info
        } else {
            Severity::Error
        };
        self.log.log(severity, &outcome.to_string());

        self.state = MonitorState::Terminated;
        debug!("monitor terminated after {} polls", self.polls);

        Ok(Step::Escalated(outcome))
    }

    /// Poll until the first breach, sleeping `interval` between polls.
    ///
    /// Runs indefinitely while every sample stays within the threshold. The
    /// token is observed while sleeping and once more between sampling and
    /// escalating; an escalation already underway is not interrupted.
    pub async fn run(&mut self, shutdown: CancellationToken) -> Result<MonitorExit, MonitorError> {
        debug!(
            "starting host monitor with threshold {}% and interval {:?}",
            self.threshold, self.interval
        );

        loop {
            match self.poll(&shutdown).await? {
                Step::Continue(_) => {}
                Step::Escalated(outcome) => return Ok(MonitorExit::Scaled(outcome)),
                Step::Interrupted(_) => {
                    debug!("shutdown requested before escalation");
                    return Ok(MonitorExit::Cancelled { polls: self.polls });
                }
            }

            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("shutdown requested after {} polls", self.polls);
                    return Ok(MonitorExit::Cancelled { polls: self.polls });
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}
