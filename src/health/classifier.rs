use serde::Serialize;

use super::gaps::{longest_failed_run, GapPolicy};
use super::metrics::{DerivedValue, MetricDeriver};
use super::series::ReadingSeries;
use crate::model::NodeClass;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    /// The data source had no series for the day.
    NoData,
    /// Every sample of the day failed.
    Abnormal,
    /// Some samples failed and at least one failed run exceeded the gap threshold.
    Degraded,
    Normal,
}

impl HealthState {
    pub const ALL: [HealthState; 4] = [
        HealthState::NoData,
        HealthState::Abnormal,
        HealthState::Degraded,
        HealthState::Normal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HealthState::NoData => "no_data",
            HealthState::Abnormal => "abnormal",
            HealthState::Degraded => "degraded",
            HealthState::Normal => "normal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayStats {
    pub total_count: usize,
    pub failed_count: usize,
    pub longest_failed_run: usize,
    pub long_gap: bool,
}

impl DayStats {
    pub fn from_series(series: &ReadingSeries, policy: &GapPolicy) -> Self {
        Self {
            total_count: series.total_count(),
            failed_count: series.failed_count(),
            longest_failed_run: longest_failed_run(series.samples()),
            long_gap: policy.is_abnormal(series.samples()),
        }
    }
}

/// First match wins: absent, all failed, failures with a long gap, otherwise normal.
pub fn classify(stats: Option<&DayStats>) -> HealthState {
    let Some(stats) = stats else {
        return HealthState::NoData;
    };
    if stats.total_count.saturating_sub(stats.failed_count) == 0 {
        HealthState::Abnormal
    } else if stats.failed_count > 0 && stats.long_gap {
        HealthState::Degraded
    } else {
        HealthState::Normal
    }
}

/// Classification result for one sensor-day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayVerdict {
    pub state: HealthState,
    pub stats: Option<DayStats>,
    pub derived: Option<DerivedValue>,
}

impl DayVerdict {
    pub fn failed_count(&self) -> usize {
        self.stats.map(|s| s.failed_count).unwrap_or(0)
    }
}

pub fn classify_day(
    series: Option<&ReadingSeries>,
    class: NodeClass,
    policy: &GapPolicy,
) -> DayVerdict {
    let Some(series) = series else {
        return DayVerdict {
            state: HealthState::NoData,
            stats: None,
            derived: None,
        };
    };
    let stats = DayStats::from_series(series, policy);
    let derived = MetricDeriver::for_class(class).derive(&series.valid_values());
    DayVerdict {
        state: classify(Some(&stats)),
        stats: Some(stats),
        derived,
    }
}
