//! Helper functions for integration tests

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use resource_scaler::{
    Sample,
    activity::MemoryActivityLog,
    monitors::host::HostMonitor,
    provisioner::{InstanceSpec, ProvisionError, Provisioner},
    sampler::{SampleError, Sampler},
    scaler::Scaler,
};
use tokio_util::sync::CancellationToken;

pub const THRESHOLD: f64 = 75.0;

pub const INTERVAL: Duration = Duration::from_secs(10);

pub fn create_test_spec() -> InstanceSpec {
    InstanceSpec {
        instance_name: "gcp-instance".to_string(),
        machine_type: "e2-medium".to_string(),
        zone: "asia-south2-a".to_string(),
    }
}

/// Replays scripted results, then repeats the last sample forever.
///
/// Optionally cancels a token once a given number of samples was handed out.
pub struct ScriptedSampler {
    script: VecDeque<Result<Sample, SampleError>>,
    last: Sample,
    taken: usize,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl ScriptedSampler {
    pub fn new(script: Vec<Result<Sample, SampleError>>) -> Self {
        Self {
            script: script.into(),
            last: Sample::new(10.0, 10.0, 10.0),
            taken: 0,
            cancel_after: None,
        }
    }

    pub fn repeating(sample: Sample) -> Self {
        let mut sampler = Self::new(vec![]);
        sampler.last = sample;
        sampler
    }

    pub fn cancel_after(mut self, samples: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((samples, token));
        self
    }
}

#[async_trait]
impl Sampler for ScriptedSampler {
    async fn sample(&mut self) -> Result<Sample, SampleError> {
        let result = match self.script.pop_front() {
            Some(result) => result,
            None => Ok(self.last),
        };

        if let Ok(sample) = &result {
            self.last = *sample;
        }

        self.taken += 1;
        if let Some((limit, token)) = &self.cancel_after
            && self.taken >= *limit
        {
            token.cancel();
        }

        result
    }
}

/// Counts calls and answers with a fixed result.
#[derive(Clone)]
pub struct RecordingProvisioner {
    calls: Arc<AtomicUsize>,
    exit_code: Option<i32>,
}

impl RecordingProvisioner {
    pub fn succeeding() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            exit_code: None,
        }
    }

    pub fn failing(exit_code: i32) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            exit_code: Some(exit_code),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provisioner for RecordingProvisioner {
    async fn provision(&self, spec: &InstanceSpec) -> Result<(), ProvisionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.exit_code {
            None => Ok(()),
            Some(code) => Err(ProvisionError::Exited {
                command: format!("gcloud compute instances create {}", spec.instance_name),
                code: Some(code),
            }),
        }
    }
}

pub type TestMonitor = HostMonitor<ScriptedSampler, RecordingProvisioner, MemoryActivityLog>;

pub fn create_test_monitor(
    sampler: ScriptedSampler,
    provisioner: RecordingProvisioner,
    log: MemoryActivityLog,
) -> TestMonitor {
    HostMonitor::new(
        sampler,
        Scaler::new(provisioner, create_test_spec()),
        log,
        THRESHOLD,
        INTERVAL,
    )
}
