//! # Informe Plantas
//!
//! Core of a safety and ergonomics inspection report tool. A report is a tree
//! of plants, levels and sub-levels; each sub-level collects spreadsheet
//! tables, images, collages, charts and free-text cards.
//!
//! ## Features
//!
//! - **Spreadsheet reading**: streaming `.xlsx`/`.xlsm` and `.ods` readers that
//!   produce a plain cell grid anchored at A1
//! - **Table detection**: finds one or more logical tables in a sparse grid
//!   by region growing, with blank-row segmentation and whole-grid fallbacks
//! - **Charts**: chart records built from table columns, renderer-ready series
//!   and repair of dependent charts when a table is replaced
//! - **Persistence**: JSON storage of the live tree plus export, import and
//!   merge of configuration documents
//!
//! Logging goes through `tracing`; installing a subscriber is up to the host.
mod error;
pub mod chart;
pub mod detection;
pub mod grid;
mod helpers;
pub mod report;
pub mod spreadsheet;

pub use error::InformeError;
pub use detection::{detect_tables, detect_tables_with, DetectionCriteria, LogicalTable};
pub use grid::{CellValue, Grid};
