use clap::ValueEnum;
use serde::Serialize;
use std::collections::BTreeMap;

use super::cell::{render_cell, CellStyle, ReportCell};
use super::sheet::Sheet;
use crate::error::ReportResult;
use crate::health::{classify_day, DayVerdict, GapPolicy, HealthState, RawReading, ReadingSeries};
use crate::model::{Gateway, SensorNode, SensorType};
use crate::source::DataSource;
use crate::time::DayWindow;

/// Which sensor-type categories a run scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ScanMode {
    #[default]
    All,
    NoWeather,
    NoLevel,
    NoMeter,
}

impl ScanMode {
    pub fn includes(self, sensor_type: SensorType) -> bool {
        !matches!(
            (self, sensor_type),
            (ScanMode::NoWeather, SensorType::Weather)
                | (ScanMode::NoLevel, SensorType::WaterLevel)
                | (ScanMode::NoMeter, SensorType::WaterMeter)
        )
    }

    pub fn sensor_types(self) -> Vec<SensorType> {
        SensorType::ALL
            .into_iter()
            .filter(|t| self.includes(*t))
            .collect()
    }
}

/// Everything a run needs; built once from CLI, env and config file.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub gateways: Vec<String>,
    pub days: Vec<DayWindow>,
    pub mode: ScanMode,
    pub gap_policy: GapPolicy,
    pub cell_style: CellStyle,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub cells: usize,
    pub by_state: BTreeMap<HealthState, usize>,
}

impl ReportSummary {
    fn record(&mut self, state: HealthState) {
        self.cells += 1;
        *self.by_state.entry(state).or_insert(0) += 1;
    }

    pub fn count(&self, state: HealthState) -> usize {
        self.by_state.get(&state).copied().unwrap_or(0)
    }
}

/// The finished cell matrix, one sheet per scanned sensor-type.
#[derive(Debug, Clone)]
pub struct Report {
    pub days: Vec<DayWindow>,
    pub sheets: Vec<Sheet>,
    pub summary: ReportSummary,
}

impl Report {
    pub fn sheet(&self, sensor_type: SensorType) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.sensor_type == sensor_type)
    }
}

/// Classifies one sensor-day from its fetched readings. Pure function of its arguments.
pub fn evaluate_cell(
    node: &SensorNode,
    readings: Option<&[RawReading]>,
    gap_policy: &GapPolicy,
    style: &CellStyle,
) -> (DayVerdict, ReportCell) {
    let series = readings.map(ReadingSeries::from_raw);
    let verdict = classify_day(series.as_ref(), node.node_class, gap_policy);
    let cell = render_cell(&verdict, node.node_class, style);
    (verdict, cell)
}

struct SheetPlan {
    sheet: Sheet,
    nodes: Vec<(String, SensorNode)>,
}

/// Resolves every catalog up front, then walks day x sheet x sensor sequentially. Any data source
/// error aborts the run before a report exists.
pub fn assemble<S: DataSource + ?Sized>(source: &mut S, config: &RunConfig) -> ReportResult<Report> {
    let mut gateways: Vec<Gateway> = Vec::with_capacity(config.gateways.len());
    for gateway_id in &config.gateways {
        let gateway = source.gateway(gateway_id)?;
        tracing::debug!(gateway = %gateway.gateway_id, "resolved gateway");
        gateways.push(gateway);
    }

    let mut plans: Vec<SheetPlan> = Vec::new();
    for sensor_type in config.mode.sensor_types() {
        let mut plan = SheetPlan {
            sheet: Sheet::new(sensor_type),
            nodes: Vec::new(),
        };
        for gateway in &gateways {
            for node in source.sensor_nodes(gateway, sensor_type)? {
                let known_rows = plan.sheet.rows().len();
                if plan.sheet.row_for(&gateway.gateway_id, &node) <= known_rows {
                    tracing::warn!(
                        gateway = %gateway.gateway_id,
                        node = %node.node_id,
                        "sensor node listed twice; keeping first entry"
                    );
                    continue;
                }
                plan.nodes.push((gateway.gateway_id.clone(), node));
            }
        }
        for day in &config.days {
            plan.sheet.column_for(day);
        }
        tracing::info!(
            sheet = sensor_type.slug(),
            sensors = plan.nodes.len(),
            "sensor catalog loaded"
        );
        plans.push(plan);
    }

    let mut summary = ReportSummary::default();
    for day in &config.days {
        tracing::info!(day = %day.date, start = %day.start, end = %day.end, "scanning day");
        for plan in &mut plans {
            let col = plan.sheet.column_for(day);
            for (gateway_id, node) in &plan.nodes {
                let readings = source.readings(
                    gateway_id,
                    &node.node_id,
                    day.start_epoch(),
                    day.end_epoch(),
                )?;
                let (verdict, cell) = evaluate_cell(
                    node,
                    readings.as_deref(),
                    &config.gap_policy,
                    &config.cell_style,
                );
                tracing::debug!(
                    gateway = %gateway_id,
                    node = %node.node_id,
                    day = %day.date,
                    state = verdict.state.as_str(),
                    failed = verdict.failed_count(),
                    longest_gap = verdict.stats.map(|s| s.longest_failed_run).unwrap_or(0),
                    text = %cell.text,
                    "classified sensor-day"
                );
                summary.record(verdict.state);
                let row = plan.sheet.row_for(gateway_id, node);
                plan.sheet.place(row, col, cell);
            }
        }
    }

    Ok(Report {
        days: config.days.clone(),
        sheets: plans.into_iter().map(|p| p.sheet).collect(),
        summary,
    })
}
