//! Per sensor-day health classification.
//!
//! A day's readings flow through [`series::ReadingSeries`], the gap check in [`gaps`], the
//! node-class value rules in [`metrics`], and end up as a [`classifier::DayVerdict`].

pub mod classifier;
pub mod gaps;
pub mod metrics;
pub mod series;

pub use classifier::{classify, classify_day, DayStats, DayVerdict, HealthState};
pub use gaps::{GapPolicy, DEFAULT_GAP_THRESHOLD};
pub use metrics::{DerivedValue, MetricDeriver};
pub use series::{RawReading, ReadingSeries, Sample, FAILED_SENTINEL};
