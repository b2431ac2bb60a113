use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

use crate::report::ScanMode;
use crate::sink::ReportFormat;
use crate::time::parse_date;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "gscan",
    version,
    about = "Daily sensor-fleet health report: classifies every sensor-day of the configured gateways"
)]
pub struct Args {
    /// Report a single day (YYYY-MM-DD). Defaults to yesterday.
    #[arg(short = 'd', long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,
    /// First day of an inclusive range; requires --to.
    #[arg(long, value_parser = parse_date)]
    pub from: Option<NaiveDate>,
    /// Last day of an inclusive range; requires --from.
    #[arg(long, value_parser = parse_date)]
    pub to: Option<NaiveDate>,
    /// Sensor-type categories to scan.
    #[arg(long, value_enum, default_value_t = ScanMode::All)]
    pub mode: ScanMode,
    /// Gateway to scan; repeatable. Overrides GSCAN_GATEWAYS and the config file.
    #[arg(short = 'g', long = "gateway")]
    pub gateways: Vec<String>,
    /// JSON config file (defaults to GSCAN_CONFIG_PATH, then the setup state dir).
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Override database URL (otherwise GSCAN_DATABASE_URL/DATABASE_URL or config file).
    #[arg(long)]
    pub database_url: Option<String>,
    /// Read gateways and readings from a JSON snapshot instead of the database.
    #[arg(long)]
    pub snapshot: Option<PathBuf>,
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,
    #[arg(long, value_enum)]
    pub format: Option<ReportFormat>,
    #[arg(short = 'l', long)]
    pub log_file: Option<PathBuf>,
    /// Longest tolerated run of failed samples before a day is flagged.
    #[arg(long)]
    pub gap_threshold: Option<usize>,
    /// Append "(N missing)" to normal days that still lost samples.
    #[arg(long, default_value_t = false)]
    pub annotate_missing: bool,
}
