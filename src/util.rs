use std::fmt;

pub const DEFAULT_THRESHOLD: f64 = 75.0;

pub const DEFAULT_INTERVAL_SECS: u64 = 10;

pub const DEFAULT_LOG_FILE: &str = "resource_usage.log";

pub const DEFAULT_PROGRAM: &str = "./google-cloud-sdk/bin/gcloud";

pub const DEFAULT_INSTANCE_NAME: &str = "gcp-instance";

pub const DEFAULT_MACHINE_TYPE: &str = "e2-medium";

pub const DEFAULT_ZONE: &str = "asia-south2-a";

pub const DEFAULT_DISK_MOUNT: &str = "/";

pub const DEFAULT_CPU_WINDOW_MS: u64 = 1000;

/// Percentage rendered with at least one decimal digit.
///
/// Whole numbers print as `40.0`; everything else uses the shortest
/// representation of the value, so no digits are dropped.
#[derive(Debug, Clone, Copy)]
pub struct Percent(pub f64);

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Percent(value) = *self;
        if value.is_finite() && value.fract() == 0.0 {
            write!(f, "{value:.1}")
        } else {
            write!(f, "{value}")
        }
    }
}

/// Round a percentage to one decimal digit.
pub fn round_percent(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `(total - available) / total` in percent, `None` for an empty total.
pub fn used_percent(total: u64, available: u64) -> Option<f64> {
    if total == 0 {
        return None;
    }
    let used = total.saturating_sub(available) as f64;
    Some(round_percent(used / total as f64 * 100.0))
}
