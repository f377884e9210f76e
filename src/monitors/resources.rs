use crate::{Metric, Sample};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceEvaluation {
    Within,
    /// Metrics strictly above the threshold, in CPU, memory, disk order.
    Exceeded(Vec<Metric>),
}

impl ResourceEvaluation {
    /// A metric breaches only when it is strictly greater than `threshold`.
    pub fn evaluate(sample: &Sample, threshold: f64) -> ResourceEvaluation {
        let exceeded: Vec<Metric> = Metric::ALL
            .into_iter()
            .filter(|metric| sample.value(*metric) > threshold)
            .collect();

        if exceeded.is_empty() {
            ResourceEvaluation::Within
        } else {
            ResourceEvaluation::Exceeded(exceeded)
        }
    }

    pub fn is_breach(&self) -> bool {
        matches!(self, ResourceEvaluation::Exceeded(_))
    }
}
