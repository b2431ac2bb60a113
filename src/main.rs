use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use std::process::ExitCode;

use gscan::cli::Args;
use gscan::config::{self, Settings, SourceConfig};
use gscan::error::ReportError;
use gscan::health::HealthState;
use gscan::logging::init_tracing;
use gscan::report::{assemble, Report, RunConfig};
use gscan::sink::sink_for;
use gscan::source::{DataSource, PgDataSource, SnapshotSource};

fn exit_code(err: &anyhow::Error) -> ExitCode {
    let code = err
        .downcast_ref::<ReportError>()
        .map(ReportError::exit_code)
        .unwrap_or(1);
    ExitCode::from(code as u8)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let file = match config::load_config_file(args.config.as_deref(), &config::env_optional) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("gscan: {err}");
            return ExitCode::from(err.exit_code() as u8);
        }
    };
    let log_file = config::resolve_log_file(&args, &file);
    if let Err(err) = init_tracing(Some(&log_file)) {
        eprintln!("gscan: {err}");
        return ExitCode::from(err.exit_code() as u8);
    }

    match run(&args, &file) {
        Ok(()) => {
            tracing::info!("gscand terminated.");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "gscand aborted");
            exit_code(&err)
        }
    }
}

fn run(args: &Args, file: &config::ConfigFile) -> Result<()> {
    let today = Local::now().date_naive();
    let settings = Settings::resolve(args, file, &config::env_optional, today)?;
    let run_config = settings.run_config(&Local)?;
    log_banner(&settings, &run_config);

    let mut source: Box<dyn DataSource> = match &settings.source {
        SourceConfig::Postgres { database_url } => Box::new(
            PgDataSource::connect(database_url).context("failed to connect to the readings database")?,
        ),
        SourceConfig::Snapshot { path } => Box::new(
            SnapshotSource::load(path)
                .with_context(|| format!("failed to load snapshot {}", path.display()))?,
        ),
    };

    let report = assemble(source.as_mut(), &run_config)?;
    log_summary(&report);

    let written = sink_for(settings.format, &settings.output_dir).write(&report)?;
    for path in &written {
        tracing::info!(path = %path.display(), "report written");
    }
    Ok(())
}

fn log_banner(settings: &Settings, run_config: &RunConfig) {
    tracing::info!("{}", "-".repeat(50));
    tracing::info!("<<< gscan daemon >>>");
    tracing::info!("gscand starting");
    tracing::info!(
        gateways = %settings.gateways.join(","),
        mode = ?settings.mode,
        gap_threshold = settings.gap_policy.max_failed_run,
        "target gateways"
    );
    for day in &run_config.days {
        tracing::info!(
            date = %day.date,
            start = %day.start.with_timezone(&Local),
            end = %day.end.with_timezone(&Local),
            "target date"
        );
    }
}

fn log_summary(report: &Report) {
    let counts = HealthState::ALL
        .iter()
        .map(|state| format!("{}={}", state.as_str(), report.summary.count(*state)))
        .collect::<Vec<_>>()
        .join(" ");
    tracing::info!(
        cells = report.summary.cells,
        sheets = report.sheets.len(),
        days = report.days.len(),
        "{counts}"
    );
}
