use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::{commit, report_stamp, stage, ReportSink};
use crate::error::{ReportError, ReportResult};
use crate::model::SensorType;
use crate::report::{Report, ReportCell, ReportSummary};

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    days: Vec<NaiveDate>,
    summary: &'a ReportSummary,
    sheets: Vec<JsonSheet<'a>>,
}

#[derive(Debug, Serialize)]
struct JsonSheet<'a> {
    title: &'static str,
    sensor_type: SensorType,
    name_column_width: usize,
    columns: Vec<String>,
    rows: Vec<JsonRow<'a>>,
}

#[derive(Debug, Serialize)]
struct JsonRow<'a> {
    gateway_id: &'a str,
    node_id: &'a str,
    name: &'a str,
    cells: Vec<Option<&'a ReportCell>>,
}

/// Whole report in one document, highlights included.
pub struct JsonSink {
    output_dir: PathBuf,
}

impl JsonSink {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
        }
    }
}

fn to_document(report: &Report) -> JsonReport<'_> {
    let sheets = report
        .sheets
        .iter()
        .map(|sheet| JsonSheet {
            title: sheet.title(),
            sensor_type: sheet.sensor_type,
            name_column_width: sheet.name_column_width(),
            columns: sheet.day_labels(),
            rows: sheet
                .rows()
                .iter()
                .enumerate()
                .map(|(idx, row)| JsonRow {
                    gateway_id: &row.gateway_id,
                    node_id: &row.node_id,
                    name: &row.name,
                    cells: (1..=sheet.columns().len())
                        .map(|col| sheet.cell(idx + 1, col))
                        .collect(),
                })
                .collect(),
        })
        .collect();

    JsonReport {
        generated_at: Utc::now().to_rfc3339(),
        days: report.days.iter().map(|d| d.date).collect(),
        summary: &report.summary,
        sheets,
    }
}

impl ReportSink for JsonSink {
    fn write(&mut self, report: &Report) -> ReportResult<Vec<PathBuf>> {
        let path = self
            .output_dir
            .join(format!("gscan-{}.json", report_stamp(report)));
        let contents = serde_json::to_vec_pretty(&to_document(report))
            .map_err(|err| ReportError::sink(format!("failed to encode report: {err}")))?;
        let written = commit(vec![stage(&path, &contents)?])?;
        tracing::info!(path = %path.display(), "wrote json report");
        Ok(written)
    }
}
