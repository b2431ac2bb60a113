use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::error::{ReportError, ReportResult};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

const MAX_RANGE_DAYS: i64 = 366;
const GAP_PROBE_MINUTES: i64 = 30;
const GAP_PROBE_STEPS: i64 = 8;

/// clap value parser for `YYYY-MM-DD` arguments.
pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| format!("not a valid date: {raw}"))
}

/// Which calendar days a run reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSelection {
    Single(NaiveDate),
    /// Inclusive on both ends.
    Range { from: NaiveDate, to: NaiveDate },
}

impl DateSelection {
    /// Validates the date flags. With nothing supplied the run covers the day before `today`.
    pub fn resolve(
        date: Option<NaiveDate>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        today: NaiveDate,
    ) -> ReportResult<Self> {
        match (date, from, to) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => Err(ReportError::usage(
                "--date cannot be combined with --from/--to",
            )),
            (Some(date), None, None) => Ok(DateSelection::Single(date)),
            (None, Some(from), Some(to)) => {
                if to < from {
                    return Err(ReportError::usage(format!(
                        "range end {to} is before range start {from}"
                    )));
                }
                if (to - from).num_days() + 1 > MAX_RANGE_DAYS {
                    return Err(ReportError::usage(format!(
                        "date range {from}..{to} exceeds {MAX_RANGE_DAYS} days"
                    )));
                }
                Ok(DateSelection::Range { from, to })
            }
            (None, Some(_), None) => Err(ReportError::usage("--from requires --to")),
            (None, None, Some(_)) => Err(ReportError::usage("--to requires --from")),
            (None, None, None) => today
                .pred_opt()
                .map(DateSelection::Single)
                .ok_or_else(|| ReportError::usage("no day precedes the current date")),
        }
    }

    /// Days in request order.
    pub fn days(&self) -> Vec<NaiveDate> {
        match *self {
            DateSelection::Single(date) => vec![date],
            DateSelection::Range { from, to } => from
                .iter_days()
                .take_while(|day| *day <= to)
                .collect(),
        }
    }
}

/// One reporting day and its inclusive UTC bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DayWindow {
    pub date: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    /// Column header, `month/day` without padding.
    pub fn label(&self) -> String {
        format!("{}/{}", self.date.month(), self.date.day())
    }

    pub fn start_epoch(&self) -> i64 {
        self.start.timestamp()
    }

    pub fn end_epoch(&self) -> i64 {
        self.end.timestamp()
    }
}

/// Local day `[00:00:00, 23:59:59.999999]` for `date` in `tz`.
pub fn day_window<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> ReportResult<DayWindow> {
    let start_local = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| ReportError::usage(format!("invalid day {date}")))?;
    let end_local = date
        .and_hms_micro_opt(23, 59, 59, 999_999)
        .ok_or_else(|| ReportError::usage(format!("invalid day {date}")))?;

    let start = resolve_local(tz, start_local, Edge::Start)
        .ok_or_else(|| ReportError::usage(format!("unable to resolve start of day {date}")))?;
    let end = resolve_local(tz, end_local, Edge::End)
        .ok_or_else(|| ReportError::usage(format!("unable to resolve end of day {date}")))?;

    Ok(DayWindow { date, start, end })
}

pub fn day_windows<Tz: TimeZone>(tz: &Tz, selection: &DateSelection) -> ReportResult<Vec<DayWindow>> {
    selection
        .days()
        .into_iter()
        .map(|date| day_window(tz, date))
        .collect()
}

#[derive(Debug, Clone, Copy)]
enum Edge {
    Start,
    End,
}

// Ambiguous local times widen the window; nonexistent ones (DST gaps) are probed inward.
fn resolve_local<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime, edge: Edge) -> Option<DateTime<Utc>> {
    for step in 0..=GAP_PROBE_STEPS {
        let offset = Duration::minutes(step * GAP_PROBE_MINUTES);
        let probe = match edge {
            Edge::Start => local + offset,
            Edge::End => local - offset,
        };
        match tz.from_local_datetime(&probe) {
            LocalResult::Single(dt) => return Some(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, latest) => {
                let picked = match edge {
                    Edge::Start => earliest,
                    Edge::End => latest,
                };
                return Some(picked.with_timezone(&Utc));
            }
            LocalResult::None => continue,
        }
    }
    None
}
