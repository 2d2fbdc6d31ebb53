use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::Serialize;

use crate::topology::Devices;

const KB_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;
const KB_PER_TB: f64 = KB_PER_GB * 1024.0;

/// Rounds to 2 decimals, halves away from zero.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Converts a kilobyte value to a gigabyte value, rounded to 2 decimals.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn to_gb(kb: u64) -> f64 {
    round2(kb as f64 / KB_PER_GB)
}

/// Converts a kilobyte value to a terabyte value, rounded to 2 decimals.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn to_tb(kb: u64) -> f64 {
    round2(kb as f64 / KB_PER_TB)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Unit {
    #[default]
    Gb,
    Tb,
}

impl Unit {
    #[must_use]
    pub fn convert(self, kb: u64) -> f64 {
        match self {
            Self::Gb => to_gb(kb),
            Self::Tb => to_tb(kb),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gb => f.write_str("GB"),
            Self::Tb => f.write_str("TB"),
        }
    }
}

impl FromStr for Unit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "gb" => Ok(Self::Gb),
            "tb" => Ok(Self::Tb),
            _ => Err(anyhow!("unknown unit: {}", s)),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RootSummary {
    name: String,
    osds: usize,
    kb: u64,
    kb_used: u64,
    kb_avail: u64,
    average_utilization: f64,
}

impl RootSummary {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of devices below this root.
    #[must_use]
    pub const fn osds(&self) -> usize {
        self.osds
    }

    #[must_use]
    pub const fn kb(&self) -> u64 {
        self.kb
    }

    #[must_use]
    pub const fn kb_used(&self) -> u64 {
        self.kb_used
    }

    #[must_use]
    pub const fn kb_avail(&self) -> u64 {
        self.kb_avail
    }

    #[must_use]
    pub fn total(&self, unit: Unit) -> f64 {
        unit.convert(self.kb)
    }

    #[must_use]
    pub fn used(&self, unit: Unit) -> f64 {
        unit.convert(self.kb_used)
    }

    #[must_use]
    pub fn available(&self, unit: Unit) -> f64 {
        unit.convert(self.kb_avail)
    }

    /// Mean utilization of all devices in percent, `0` without devices.
    #[must_use]
    pub const fn average_utilization(&self) -> f64 {
        self.average_utilization
    }
}

/// Sums up the devices of one root.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn summarize(name: &str, devices: &Devices) -> RootSummary {
    let osds = devices.len();

    let mut utilization = 0.0;
    let mut kb = 0_u64;
    let mut kb_used = 0_u64;
    let mut kb_avail = 0_u64;

    for stats in devices.devices().values() {
        utilization += stats.utilization;
        kb = kb.saturating_add(stats.kb);
        kb_used = kb_used.saturating_add(stats.kb_used);
        kb_avail = kb_avail.saturating_add(stats.kb_avail);
    }

    let average_utilization = if osds == 0 {
        0.0
    } else {
        utilization / osds as f64
    };

    RootSummary {
        name: name.into(),
        osds,
        kb,
        kb_used,
        kb_avail,
        average_utilization,
    }
}
