pub mod csv_file;
pub mod json_file;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{ReportError, ReportResult};
use crate::report::Report;

pub use self::csv_file::CsvSink;
pub use self::json_file::JsonSink;

/// Receives a finished report. Sinks never see a partially classified run.
pub trait ReportSink {
    /// Returns the paths written.
    fn write(&mut self, report: &Report) -> ReportResult<Vec<PathBuf>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Csv,
    Json,
}

pub fn sink_for(format: ReportFormat, output_dir: &Path) -> Box<dyn ReportSink> {
    match format {
        ReportFormat::Csv => Box::new(CsvSink::new(output_dir)),
        ReportFormat::Json => Box::new(JsonSink::new(output_dir)),
    }
}

/// `YYYY-MM-DD` for a single day, `first_last` for a range.
pub(crate) fn report_stamp(report: &Report) -> String {
    match (report.days.first(), report.days.last()) {
        (Some(first), Some(last)) if first.date != last.date => {
            format!("{}_{}", first.date, last.date)
        }
        (Some(first), _) => first.date.to_string(),
        _ => "empty".to_string(),
    }
}

/// A fully written temp file waiting to be renamed onto its final path.
pub(crate) struct StagedFile {
    tmp: tempfile::NamedTempFile,
    path: PathBuf,
}

pub(crate) fn stage(path: &Path, contents: &[u8]) -> ReportResult<StagedFile> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|err| {
        ReportError::sink(format!("failed to create {}: {err}", dir.display()))
    })?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|err| ReportError::sink(format!("failed to create temp file: {err}")))?;
    tmp.write_all(contents)
        .and_then(|_| tmp.flush())
        .map_err(|err| ReportError::sink(format!("failed to write {}: {err}", path.display())))?;
    Ok(StagedFile {
        tmp,
        path: path.to_path_buf(),
    })
}

/// Renames every staged file into place. A failed rename removes the files already committed;
/// unrenamed temp files are deleted on drop.
pub(crate) fn commit(staged: Vec<StagedFile>) -> ReportResult<Vec<PathBuf>> {
    let mut committed: Vec<PathBuf> = Vec::with_capacity(staged.len());
    for file in staged {
        if let Err(err) = file.tmp.persist(&file.path) {
            for path in &committed {
                if let Err(remove_err) = std::fs::remove_file(path) {
                    tracing::warn!(path = %path.display(), error = %remove_err, "failed to roll back report file");
                }
            }
            return Err(ReportError::sink(format!(
                "failed to persist {}: {}",
                file.path.display(),
                err.error
            )));
        }
        committed.push(file.path);
    }
    Ok(committed)
}
