pub mod assembler;
pub mod cell;
pub mod sheet;


pub use assembler::{assemble, evaluate_cell, Report, ReportSummary, RunConfig, ScanMode};
pub use cell::{render_cell, CellStyle, Highlight, ReportCell};
pub use sheet::{Sheet, SheetRow, CORNER_HEADER};
