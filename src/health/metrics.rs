use crate::model::NodeClass;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DerivedValue {
    /// Last valid battery voltage of the day.
    Voltage(f64),
    /// Last minus first valid cumulative reading, rounded to two decimals.
    Delta(f64),
}

impl DerivedValue {
    pub fn value(&self) -> f64 {
        match self {
            DerivedValue::Voltage(v) | DerivedValue::Delta(v) => *v,
        }
    }

    pub fn display(&self) -> String {
        format_value(self.value())
    }
}

/// Per node-class rule turning a day's valid values into a display value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricDeriver {
    Battery,
    CumulativeMeter,
    Generic,
}

impl MetricDeriver {
    pub fn for_class(class: NodeClass) -> Self {
        match class {
            NodeClass::Battery => MetricDeriver::Battery,
            NodeClass::CumulativeMeter => MetricDeriver::CumulativeMeter,
            NodeClass::Generic => MetricDeriver::Generic,
        }
    }

    /// `valid_values` must already be failed-filtered and in time order. Too few values yield 0.
    pub fn derive(&self, valid_values: &[f64]) -> Option<DerivedValue> {
        match self {
            MetricDeriver::Battery => Some(DerivedValue::Voltage(
                valid_values.last().copied().unwrap_or(0.0),
            )),
            MetricDeriver::CumulativeMeter => {
                let delta = match (valid_values.first(), valid_values.last()) {
                    (Some(first), Some(last)) if valid_values.len() >= 2 => round2(last - first),
                    _ => 0.0,
                };
                Some(DerivedValue::Delta(delta))
            }
            MetricDeriver::Generic => None,
        }
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Two-decimal rendering without trailing zeros; negative zero prints as `0`.
pub fn format_value(value: f64) -> String {
    let rounded = round2(value);
    if rounded == 0.0 {
        return "0".to_string();
    }
    format!("{rounded}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meter_delta_needs_two_values() {
        let meter = MetricDeriver::CumulativeMeter;
        assert_eq!(meter.derive(&[100.0, 130.0]), Some(DerivedValue::Delta(30.0)));
        assert_eq!(meter.derive(&[100.0]), Some(DerivedValue::Delta(0.0)));
        assert_eq!(meter.derive(&[]), Some(DerivedValue::Delta(0.0)));
    }

    #[test]
    fn meter_delta_uses_endpoints_only() {
        let meter = MetricDeriver::CumulativeMeter;
        let derived = meter.derive(&[1520.114, 1490.0, 1700.0, 1534.2]).unwrap();
        assert!((derived.value() - 14.09).abs() < 1e-9);
        assert_eq!(derived.display(), "14.09");
    }

    #[test]
    fn battery_takes_last_value() {
        let battery = MetricDeriver::Battery;
        assert_eq!(battery.derive(&[]), Some(DerivedValue::Voltage(0.0)));
        assert_eq!(battery.derive(&[3.7, 3.6]), Some(DerivedValue::Voltage(3.6)));
    }

    #[test]
    fn generic_has_no_derived_value() {
        assert_eq!(MetricDeriver::Generic.derive(&[1.0, 2.0]), None);
    }

    #[test]
    fn deriver_follows_node_class() {
        assert_eq!(MetricDeriver::for_class(NodeClass::Battery), MetricDeriver::Battery);
        assert_eq!(
            MetricDeriver::for_class(NodeClass::CumulativeMeter),
            MetricDeriver::CumulativeMeter
        );
        assert_eq!(MetricDeriver::for_class(NodeClass::Generic), MetricDeriver::Generic);
    }

    #[test]
    fn format_value_trims_and_normalizes_zero() {
        assert_eq!(format_value(30.0), "30");
        assert_eq!(format_value(3.6), "3.6");
        assert_eq!(format_value(-0.0), "0");
        assert_eq!(format_value(0.004), "0");
        assert_eq!(format_value(-12.346), "-12.35");
    }
}
