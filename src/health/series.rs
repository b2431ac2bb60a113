/// Raw wire value the gateways use for a failed or missing sample.
pub const FAILED_SENTINEL: f64 = -9999.0;

/// One sample as delivered by a data source, before sentinel decoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawReading {
    pub epoch_seconds: i64,
    pub value: Option<f64>,
}

impl RawReading {
    pub fn new(epoch_seconds: i64, value: f64) -> Self {
        Self {
            epoch_seconds,
            value: Some(value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    Value(f64),
    Failed,
}

impl Sample {
    /// NULL, non-finite and sentinel values all decode to `Failed`.
    pub fn from_raw(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() && v != FAILED_SENTINEL => Sample::Value(v),
            _ => Sample::Failed,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Sample::Failed)
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Sample::Value(v) => Some(*v),
            Sample::Failed => None,
        }
    }
}

/// Read-only view over one sensor-day fetch result.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingSeries {
    samples: Vec<Sample>,
}

impl ReadingSeries {
    pub fn from_raw(raw: &[RawReading]) -> Self {
        Self::from_samples(raw.iter().map(|r| Sample::from_raw(r.value)))
    }

    pub fn from_samples(samples: impl IntoIterator<Item = Sample>) -> Self {
        Self {
            samples: samples.into_iter().collect(),
        }
    }

    pub fn total_count(&self) -> usize {
        self.samples.len()
    }

    pub fn failed_count(&self) -> usize {
        self.samples.iter().filter(|s| s.is_failed()).count()
    }

    /// Ordered samples with failed markers left in place.
    pub fn samples(&self) -> impl Iterator<Item = Sample> + '_ {
        self.samples.iter().copied()
    }

    /// Ordered valid values with failed samples dropped.
    pub fn valid_values(&self) -> Vec<f64> {
        self.samples.iter().filter_map(Sample::value).collect()
    }
}
