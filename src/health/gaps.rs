use super::series::Sample;

/// Roughly one day of hourly samples.
pub const DEFAULT_GAP_THRESHOLD: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    Valid,
    Failed,
}

/// A maximal stretch of samples of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub kind: RunKind,
    pub len: usize,
}

/// Coalesces samples into runs in input order. Distinct valid values share one kind, so only
/// the failed stretches carry information.
pub fn collapse_runs(samples: impl IntoIterator<Item = Sample>) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    for sample in samples {
        let kind = if sample.is_failed() {
            RunKind::Failed
        } else {
            RunKind::Valid
        };
        match runs.last_mut() {
            Some(run) if run.kind == kind => run.len += 1,
            _ => runs.push(Run { kind, len: 1 }),
        }
    }
    runs
}

/// Flags a day abnormal when a failed run is strictly longer than `max_failed_run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapPolicy {
    pub max_failed_run: usize,
}

impl Default for GapPolicy {
    fn default() -> Self {
        Self {
            max_failed_run: DEFAULT_GAP_THRESHOLD,
        }
    }
}

impl GapPolicy {
    /// Thresholds below 1 are raised to 1 so a lone failed sample never trips the check.
    pub fn new(max_failed_run: usize) -> Self {
        Self {
            max_failed_run: max_failed_run.max(1),
        }
    }

    pub fn is_abnormal(&self, samples: impl IntoIterator<Item = Sample>) -> bool {
        collapse_runs(samples)
            .iter()
            .any(|run| run.kind == RunKind::Failed && run.len > self.max_failed_run)
    }
}

pub fn longest_failed_run(samples: impl IntoIterator<Item = Sample>) -> usize {
    collapse_runs(samples)
        .iter()
        .filter(|run| run.kind == RunKind::Failed)
        .map(|run| run.len)
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(n: usize) -> Vec<Sample> {
        vec![Sample::Failed; n]
    }

    fn valid(values: &[f64]) -> Vec<Sample> {
        values.iter().map(|v| Sample::Value(*v)).collect()
    }

    #[test]
    fn distinct_valid_values_form_a_single_run() {
        let mut samples = valid(&[1.0, 2.0, 3.0]);
        samples.extend(failed(2));
        samples.extend(valid(&[4.0]));
        assert_eq!(
            collapse_runs(samples),
            vec![
                Run { kind: RunKind::Valid, len: 3 },
                Run { kind: RunKind::Failed, len: 2 },
                Run { kind: RunKind::Valid, len: 1 },
            ]
        );
    }

    #[test]
    fn empty_series_is_not_abnormal() {
        assert!(!GapPolicy::default().is_abnormal(Vec::new()));
        assert_eq!(longest_failed_run(Vec::new()), 0);
    }

    #[test]
    fn run_must_exceed_threshold() {
        let policy = GapPolicy::new(24);
        assert!(!policy.is_abnormal(failed(24)));
        assert!(policy.is_abnormal(failed(25)));
    }

    #[test]
    fn single_failed_sample_never_trips() {
        assert_eq!(GapPolicy::new(0).max_failed_run, 1);
        assert!(!GapPolicy::new(0).is_abnormal(failed(1)));
        assert!(!GapPolicy::new(1).is_abnormal(failed(1)));
        assert!(!GapPolicy::new(24).is_abnormal(failed(1)));
    }

    #[test]
    fn verdict_depends_on_sample_order() {
        let policy = GapPolicy::new(3);

        let mut clustered = failed(4);
        clustered.extend(valid(&[1.0, 2.0, 3.0, 4.0]));
        assert!(policy.is_abnormal(clustered));

        let interleaved: Vec<Sample> = (0..8)
            .map(|i| if i % 2 == 0 { Sample::Failed } else { Sample::Value(i as f64) })
            .collect();
        assert!(!policy.is_abnormal(interleaved));
    }

    #[test]
    fn longest_failed_run_ignores_valid_runs() {
        let mut samples = valid(&[1.0; 40]);
        samples.extend(failed(3));
        samples.extend(valid(&[2.0]));
        samples.extend(failed(7));
        assert_eq!(longest_failed_run(samples), 7);
    }
}
