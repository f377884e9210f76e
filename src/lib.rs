pub mod activity;
pub mod config;
pub mod monitors;
pub mod provisioner;
pub mod sampler;
pub mod scaler;
pub mod util;

use std::fmt;

use crate::util::Percent;

/// One synchronized reading of host utilization, all values in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
}

impl Sample {
    pub fn new(cpu: f64, memory: f64, disk: f64) -> Self {
        Self { cpu, memory, disk }
    }

    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Cpu => self.cpu,
            Metric::Memory => self.memory,
            Metric::Disk => self.disk,
        }
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CPU: {}%, Memory: {}%, Disk: {}%",
            Percent(self.cpu),
            Percent(self.memory),
            Percent(self.disk)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Cpu,
    Memory,
    Disk,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Cpu, Metric::Memory, Metric::Disk];
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Metric::Cpu => "CPU",
            Metric::Memory => "Memory",
            Metric::Disk => "Disk",
        };
        f.write_str(name)
    }
}
