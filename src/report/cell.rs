use serde::Serialize;

use crate::health::{DayVerdict, HealthState};
use crate::model::NodeClass;

pub const NO_DATA_MARKER: &str = "";
pub const ABNORMAL_MARKER: &str = "X";
pub const DEGRADED_MARKER: &str = "?";
pub const OK_MARKER: &str = "OK";

/// Report palette. Cells without a highlight render plain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Highlight {
    Red,
    Green,
}

impl Highlight {
    pub fn token(self) -> &'static str {
        match self {
            Highlight::Red => "red",
            Highlight::Green => "green",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportCell {
    pub text: String,
    pub highlight: Option<Highlight>,
}

impl ReportCell {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            highlight: None,
        }
    }

    pub fn highlighted(text: impl Into<String>, highlight: Highlight) -> Self {
        Self {
            text: text.into(),
            highlight: Some(highlight),
        }
    }

    pub fn color_token(&self) -> &'static str {
        self.highlight.map(Highlight::token).unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellStyle {
    /// Append `(N missing)` to normal days that still had failed samples.
    pub annotate_missing: bool,
}

pub fn render_cell(verdict: &DayVerdict, class: NodeClass, style: &CellStyle) -> ReportCell {
    let derived_text = || {
        verdict
            .derived
            .map(|d| d.display())
            .unwrap_or_else(|| "0".to_string())
    };

    match verdict.state {
        HealthState::NoData => ReportCell::plain(NO_DATA_MARKER),
        HealthState::Abnormal => ReportCell::highlighted(ABNORMAL_MARKER, Highlight::Red),
        HealthState::Degraded => {
            let text = match class {
                NodeClass::Battery => derived_text(),
                NodeClass::CumulativeMeter | NodeClass::Generic => DEGRADED_MARKER.to_string(),
            };
            ReportCell::highlighted(text, Highlight::Green)
        }
        HealthState::Normal => {
            let mut text = match class {
                NodeClass::Battery | NodeClass::CumulativeMeter => derived_text(),
                NodeClass::Generic => OK_MARKER.to_string(),
            };
            let failed = verdict.failed_count();
            if style.annotate_missing && failed > 0 {
                text.push_str(&format!(" ({failed} missing)"));
            }
            ReportCell::plain(text)
        }
    }
}
