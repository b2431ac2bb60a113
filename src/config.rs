use chrono::{NaiveDate, TimeZone};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::cli::Args;
use crate::error::{ReportError, ReportResult};
use crate::health::GapPolicy;
use crate::report::{CellStyle, RunConfig, ScanMode};
use crate::sink::ReportFormat;
use crate::time::{day_windows, DateSelection};

const DEFAULT_CONFIG_PATH: &str = "/etc/gscan/config.json";
pub const DEFAULT_LOG_FILE: &str = "gscand.log";
const DEFAULT_OUTPUT_DIR: &str = ".";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default)]
    pub gateways: Vec<String>,
    #[serde(default)]
    pub gap_threshold: Option<usize>,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    #[serde(default)]
    pub format: Option<ReportFormat>,
    #[serde(default)]
    pub annotate_missing: Option<bool>,
}

/// Where a run's readings come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceConfig {
    Postgres { database_url: String },
    Snapshot { path: PathBuf },
}

/// Fully resolved settings: CLI flag, then environment, then config file, then defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub source: SourceConfig,
    pub gateways: Vec<String>,
    pub selection: DateSelection,
    pub mode: ScanMode,
    pub gap_policy: GapPolicy,
    pub cell_style: CellStyle,
    pub output_dir: PathBuf,
    pub format: ReportFormat,
}

pub fn env_optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Explicit paths must exist; the fallback locations are optional.
fn config_path<E>(explicit: Option<&Path>, env: &E) -> (PathBuf, bool)
where
    E: Fn(&str) -> Option<String>,
{
    if let Some(path) = explicit {
        return (path.to_path_buf(), true);
    }
    if let Some(path) = env("GSCAN_CONFIG_PATH") {
        return (PathBuf::from(path), true);
    }
    if let Some(state_dir) = env("FARM_SETUP_STATE_DIR") {
        return (PathBuf::from(state_dir).join("gscan.json"), false);
    }
    (PathBuf::from(DEFAULT_CONFIG_PATH), false)
}

pub fn load_config_file<E>(explicit: Option<&Path>, env: &E) -> ReportResult<ConfigFile>
where
    E: Fn(&str) -> Option<String>,
{
    let (path, required) = config_path(explicit, env);
    if !path.exists() {
        if required {
            return Err(ReportError::config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        return Ok(ConfigFile::default());
    }
    let raw = std::fs::read_to_string(&path).map_err(|err| {
        ReportError::config(format!("failed to read config {}: {err}", path.display()))
    })?;
    serde_json::from_str(&raw).map_err(|err| {
        ReportError::config(format!("failed to parse config {}: {err}", path.display()))
    })
}

pub fn normalize_database_url(url: String) -> String {
    if let Some(stripped) = url.strip_prefix("postgresql+psycopg://") {
        return format!("postgresql://{stripped}");
    }
    url
}

fn split_gateways(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn resolve_log_file(args: &Args, file: &ConfigFile) -> PathBuf {
    args.log_file
        .clone()
        .or_else(|| file.log_file.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE))
}

impl Settings {
    /// Date flags are checked first so usage errors surface before configuration problems.
    pub fn resolve<E>(args: &Args, file: &ConfigFile, env: &E, today: NaiveDate) -> ReportResult<Self>
    where
        E: Fn(&str) -> Option<String>,
    {
        let selection = DateSelection::resolve(args.date, args.from, args.to, today)?;

        let gateways = if !args.gateways.is_empty() {
            args.gateways.clone()
        } else if let Some(raw) = env("GSCAN_GATEWAYS") {
            split_gateways(&raw)
        } else {
            file.gateways.clone()
        };
        if gateways.is_empty() {
            return Err(ReportError::config(
                "no gateways configured (use --gateway, GSCAN_GATEWAYS or the config file)",
            ));
        }

        let source = match &args.snapshot {
            Some(path) => SourceConfig::Snapshot { path: path.clone() },
            None => {
                let database_url = args
                    .database_url
                    .clone()
                    .or_else(|| env("GSCAN_DATABASE_URL"))
                    .or_else(|| env("DATABASE_URL"))
                    .or_else(|| file.database_url.clone())
                    .ok_or_else(|| {
                        ReportError::config("database_url not provided and not found in config")
                    })?;
                SourceConfig::Postgres {
                    database_url: normalize_database_url(database_url),
                }
            }
        };

        let gap_threshold = match args.gap_threshold {
            Some(value) => value,
            None => match env("GSCAN_GAP_THRESHOLD") {
                Some(raw) => raw.parse::<usize>().map_err(|_| {
                    ReportError::config(format!("invalid GSCAN_GAP_THRESHOLD: {raw}"))
                })?,
                None => file
                    .gap_threshold
                    .unwrap_or(GapPolicy::default().max_failed_run),
            },
        };

        Ok(Self {
            source,
            gateways,
            selection,
            mode: args.mode,
            gap_policy: GapPolicy::new(gap_threshold),
            cell_style: CellStyle {
                annotate_missing: args.annotate_missing || file.annotate_missing.unwrap_or(false),
            },
            output_dir: args
                .output_dir
                .clone()
                .or_else(|| file.output_dir.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            format: args.format.or(file.format).unwrap_or_default(),
        })
    }

    pub fn run_config<Tz: TimeZone>(&self, tz: &Tz) -> ReportResult<RunConfig> {
        Ok(RunConfig {
            gateways: self.gateways.clone(),
            days: day_windows(tz, &self.selection)?,
            mode: self.mode,
            gap_policy: self.gap_policy,
            cell_style: self.cell_style,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::collections::HashMap;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["gscan"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).expect("args")
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn normalize_database_url_strips_psycopg_driver() {
        assert_eq!(
            normalize_database_url("postgresql+psycopg://postgres@127.0.0.1:5432/iot".to_string()),
            "postgresql://postgres@127.0.0.1:5432/iot"
        );
        assert_eq!(
            normalize_database_url("postgresql://db/iot".to_string()),
            "postgresql://db/iot"
        );
    }

    #[test]
    fn cli_beats_env_beats_file() {
        let file = ConfigFile {
            database_url: Some("postgresql://file/iot".to_string()),
            gateways: vec!["gw-file".to_string()],
            gap_threshold: Some(12),
            ..ConfigFile::default()
        };
        let env = env_of(&[
            ("GSCAN_GATEWAYS", "gw-env-1, gw-env-2,"),
            ("DATABASE_URL", "postgresql+psycopg://env/iot"),
        ]);

        let settings = Settings::resolve(&args(&[]), &file, &env, today()).expect("settings");
        assert_eq!(settings.gateways, vec!["gw-env-1".to_string(), "gw-env-2".to_string()]);
        assert_eq!(
            settings.source,
            SourceConfig::Postgres {
                database_url: "postgresql://env/iot".to_string()
            }
        );
        assert_eq!(settings.gap_policy.max_failed_run, 12);
        assert_eq!(
            settings.selection,
            DateSelection::Single(NaiveDate::from_ymd_opt(2024, 6, 14).unwrap())
        );

        let settings = Settings::resolve(
            &args(&["-g", "gw-cli", "--gap-threshold", "30", "--database-url", "postgresql://cli/iot"]),
            &file,
            &env,
            today(),
        )
        .expect("settings");
        assert_eq!(settings.gateways, vec!["gw-cli".to_string()]);
        assert_eq!(settings.gap_policy.max_failed_run, 30);
        assert_eq!(
            settings.source,
            SourceConfig::Postgres {
                database_url: "postgresql://cli/iot".to_string()
            }
        );
    }

    #[test]
    fn date_usage_error_wins_over_missing_config() {
        let err = Settings::resolve(
            &args(&["--date", "2024-06-01", "--from", "2024-06-01", "--to", "2024-06-02"]),
            &ConfigFile::default(),
            &env_of(&[]),
            today(),
        )
        .unwrap_err();
        assert!(matches!(err, ReportError::Usage(_)));
    }

    #[test]
    fn missing_gateways_or_database_is_a_config_error() {
        let err = Settings::resolve(&args(&[]), &ConfigFile::default(), &env_of(&[]), today())
            .unwrap_err();
        assert!(matches!(err, ReportError::Config(_)));

        let err = Settings::resolve(&args(&["-g", "gw"]), &ConfigFile::default(), &env_of(&[]), today())
            .unwrap_err();
        assert!(matches!(err, ReportError::Config(_)));
    }

    #[test]
    fn snapshot_needs_no_database() {
        let settings = Settings::resolve(
            &args(&["-g", "gw", "--snapshot", "fleet.json"]),
            &ConfigFile::default(),
            &env_of(&[]),
            today(),
        )
        .expect("settings");
        assert_eq!(
            settings.source,
            SourceConfig::Snapshot {
                path: PathBuf::from("fleet.json")
            }
        );
        assert_eq!(settings.format, ReportFormat::Csv);
        assert_eq!(settings.output_dir, PathBuf::from("."));
    }

    #[test]
    fn bad_env_threshold_is_rejected() {
        let err = Settings::resolve(
            &args(&["-g", "gw", "--snapshot", "fleet.json"]),
            &ConfigFile::default(),
            &env_of(&[("GSCAN_GAP_THRESHOLD", "lots")]),
            today(),
        )
        .unwrap_err();
        assert!(matches!(err, ReportError::Config(_)));
    }

    #[test]
    fn config_file_loading() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gscan.json");
        std::fs::write(
            &path,
            r#"{ "gateways": ["gw-1"], "format": "json", "annotate_missing": true }"#,
        )
        .expect("write");

        let file = load_config_file(Some(&path), &env_of(&[])).expect("load");
        assert_eq!(file.gateways, vec!["gw-1".to_string()]);
        assert_eq!(file.format, Some(ReportFormat::Json));
        assert_eq!(file.annotate_missing, Some(true));

        let missing = dir.path().join("absent.json");
        assert!(load_config_file(Some(&missing), &env_of(&[])).is_err());

        let state_dir = dir.path().join("state");
        let env = env_of(&[("FARM_SETUP_STATE_DIR", state_dir.to_str().unwrap())]);
        let file = load_config_file(None, &env).expect("optional default");
        assert!(file.gateways.is_empty());

        std::fs::write(&path, "{ not json").expect("write");
        let err = load_config_file(Some(&path), &env_of(&[])).unwrap_err();
        assert!(matches!(err, ReportError::Config(_)));
    }

    #[test]
    fn log_file_defaults_to_gscand_log() {
        assert_eq!(
            resolve_log_file(&args(&[]), &ConfigFile::default()),
            PathBuf::from(DEFAULT_LOG_FILE)
        );
        let file = ConfigFile {
            log_file: Some(PathBuf::from("/var/log/gscand/gscand.log")),
            ..ConfigFile::default()
        };
        assert_eq!(
            resolve_log_file(&args(&["-l", "run.log"]), &file),
            PathBuf::from("run.log")
        );
    }
}
