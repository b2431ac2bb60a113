use std::path::{Path, PathBuf};

use super::{commit, report_stamp, stage, ReportSink};
use crate::error::{ReportError, ReportResult};
use crate::report::{Report, ReportCell, Sheet};

/// One text grid per sheet plus a sibling grid of highlight tokens, since CSV has no styling.
pub struct CsvSink {
    output_dir: PathBuf,
}

impl CsvSink {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
        }
    }
}

fn encode_grid<F>(grid: &[Vec<ReportCell>], field: F) -> ReportResult<Vec<u8>>
where
    F: Fn(usize, usize, &ReportCell) -> String,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    for (r, line) in grid.iter().enumerate() {
        let record: Vec<String> = line
            .iter()
            .enumerate()
            .map(|(c, cell)| field(r, c, cell))
            .collect();
        writer.write_record(&record)?;
    }
    writer
        .into_inner()
        .map_err(|err| ReportError::sink(format!("failed to flush csv: {err}")))
}

fn sheet_paths(dir: &Path, sheet: &Sheet, stamp: &str) -> (PathBuf, PathBuf) {
    let base = format!("gscan-{}-{stamp}", sheet.sensor_type.slug());
    (
        dir.join(format!("{base}.csv")),
        dir.join(format!("{base}-colors.csv")),
    )
}

impl ReportSink for CsvSink {
    fn write(&mut self, report: &Report) -> ReportResult<Vec<PathBuf>> {
        let stamp = report_stamp(report);
        let mut staged = Vec::with_capacity(report.sheets.len() * 2);
        for sheet in &report.sheets {
            let grid = sheet.to_grid();
            let (text_path, color_path) = sheet_paths(&self.output_dir, sheet, &stamp);

            let text = encode_grid(&grid, |_, _, cell| cell.text.clone())?;
            // Header row and name column keep their labels so the grids line up.
            let colors = encode_grid(&grid, |r, c, cell| {
                if r == 0 || c == 0 {
                    cell.text.clone()
                } else {
                    cell.color_token().to_string()
                }
            })?;

            staged.push(stage(&text_path, &text)?);
            staged.push(stage(&color_path, &colors)?);
        }
        let written = commit(staged)?;
        for path in &written {
            tracing::info!(path = %path.display(), "wrote csv sheet");
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::{GapPolicy, RawReading};
    use crate::model::{NodeClass, SensorNode, SensorType};
    use crate::report::{assemble, CellStyle, RunConfig, ScanMode};
    use crate::source::SnapshotSource;
    use crate::time::day_window;
    use chrono::{NaiveDate, Utc};

    #[test]
    fn writes_text_and_color_grids_per_sheet() {
        let day = day_window(&Utc, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()).unwrap();
        let mut source = SnapshotSource::new()
            .with_node(
                "gw",
                SensorNode {
                    node_id: "esp-1".to_string(),
                    name: "North, station".to_string(),
                    sensor_type: SensorType::Weather,
                    node_class: NodeClass::Generic,
                },
            )
            .with_readings(
                "gw",
                "esp-1",
                vec![RawReading::new(day.start_epoch(), -9999.0)],
            );
        let config = RunConfig {
            gateways: vec!["gw".to_string()],
            days: vec![day],
            mode: ScanMode::NoLevel,
            gap_policy: GapPolicy::default(),
            cell_style: CellStyle::default(),
        };
        let report = assemble(&mut source, &config).expect("report");

        let dir = tempfile::tempdir().expect("tempdir");
        let written = CsvSink::new(dir.path()).write(&report).expect("write");
        assert_eq!(written.len(), 4);

        let text = std::fs::read_to_string(dir.path().join("gscan-weather-2024-06-01.csv"))
            .expect("text csv");
        assert_eq!(text, "Sensor,6/1\n\"North, station\",X\n");

        let colors =
            std::fs::read_to_string(dir.path().join("gscan-weather-2024-06-01-colors.csv"))
                .expect("color csv");
        assert_eq!(colors, "Sensor,6/1\n\"North, station\",red\n");
    }

    #[test]
    fn failed_write_leaves_no_sheet_behind() {
        let day = day_window(&Utc, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()).unwrap();
        let mut source = SnapshotSource::new().with_node(
            "gw",
            SensorNode {
                node_id: "esp-1".to_string(),
                name: "North station".to_string(),
                sensor_type: SensorType::Weather,
                node_class: NodeClass::Generic,
            },
        );
        let config = RunConfig {
            gateways: vec!["gw".to_string()],
            days: vec![day],
            mode: ScanMode::All,
            gap_policy: GapPolicy::default(),
            cell_style: CellStyle::default(),
        };
        let report = assemble(&mut source, &config).expect("report");

        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("gscan-water-level-2024-06-01.csv");
        std::fs::create_dir(&blocker).expect("blocker dir");
        std::fs::write(blocker.join("keep"), b"x").expect("blocker file");

        let result = CsvSink::new(dir.path()).write(&report);
        assert!(matches!(result, Err(ReportError::Sink(_))));

        let mut left: Vec<String> = std::fs::read_dir(dir.path())
            .expect("read dir")
            .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        left.sort();
        assert_eq!(left, vec!["gscan-water-level-2024-06-01.csv".to_string()]);
    }
}
