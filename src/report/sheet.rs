use std::collections::HashMap;

use super::cell::ReportCell;
use crate::model::{SensorNode, SensorType};
use crate::time::DayWindow;

pub const CORNER_HEADER: &str = "Sensor";

const MIN_NAME_COLUMN_WIDTH: usize = 10;
const NAME_COLUMN_PADDING: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    pub gateway_id: String,
    pub node_id: String,
    pub name: String,
}

/// Sensor x day table for one sensor-type. Grid row 0 holds day labels and grid column 0 holds
/// sensor names; every other index is assigned on first sight.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub sensor_type: SensorType,
    rows: Vec<SheetRow>,
    columns: Vec<DayWindow>,
    row_index: HashMap<(String, String), usize>,
    column_index: HashMap<DayWindow, usize>,
    cells: HashMap<(usize, usize), ReportCell>,
}

impl Sheet {
    pub fn new(sensor_type: SensorType) -> Self {
        Self {
            sensor_type,
            rows: Vec::new(),
            columns: Vec::new(),
            row_index: HashMap::new(),
            column_index: HashMap::new(),
            cells: HashMap::new(),
        }
    }

    pub fn title(&self) -> &'static str {
        self.sensor_type.sheet_title()
    }

    /// Grid row for a node (1-based), registering it if unseen.
    pub fn row_for(&mut self, gateway_id: &str, node: &SensorNode) -> usize {
        let key = (gateway_id.to_string(), node.node_id.clone());
        if let Some(row) = self.row_index.get(&key) {
            return *row;
        }
        self.rows.push(SheetRow {
            gateway_id: gateway_id.to_string(),
            node_id: node.node_id.clone(),
            name: node.name.clone(),
        });
        let row = self.rows.len();
        self.row_index.insert(key, row);
        row
    }

    /// Grid column for a day (1-based), registering it if unseen.
    pub fn column_for(&mut self, day: &DayWindow) -> usize {
        if let Some(col) = self.column_index.get(day) {
            return *col;
        }
        self.columns.push(*day);
        let col = self.columns.len();
        self.column_index.insert(*day, col);
        col
    }

    /// Cells are write-once; returns false when the slot was already taken.
    pub fn place(&mut self, row: usize, col: usize, cell: ReportCell) -> bool {
        if self.cells.contains_key(&(row, col)) {
            return false;
        }
        self.cells.insert((row, col), cell);
        true
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&ReportCell> {
        self.cells.get(&(row, col))
    }

    pub fn rows(&self) -> &[SheetRow] {
        &self.rows
    }

    pub fn columns(&self) -> &[DayWindow] {
        &self.columns
    }

    pub fn day_labels(&self) -> Vec<String> {
        self.columns.iter().map(DayWindow::label).collect()
    }

    pub fn name_column_width(&self) -> usize {
        let widest = self
            .rows
            .iter()
            .map(|r| r.name.chars().count())
            .chain(std::iter::once(CORNER_HEADER.chars().count()))
            .max()
            .unwrap_or(0);
        (widest + NAME_COLUMN_PADDING).max(MIN_NAME_COLUMN_WIDTH)
    }

    /// Full grid including the header row and name column.
    pub fn to_grid(&self) -> Vec<Vec<ReportCell>> {
        let mut grid = Vec::with_capacity(self.rows.len() + 1);
        let mut header = vec![ReportCell::plain(CORNER_HEADER)];
        header.extend(self.day_labels().into_iter().map(ReportCell::plain));
        grid.push(header);

        for (idx, row) in self.rows.iter().enumerate() {
            let mut line = vec![ReportCell::plain(row.name.clone())];
            for col in 1..=self.columns.len() {
                line.push(
                    self.cell(idx + 1, col)
                        .cloned()
                        .unwrap_or_else(|| ReportCell::plain("")),
                );
            }
            grid.push(line);
        }
        grid
    }
}
