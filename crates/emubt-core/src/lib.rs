//! emubt-core: Core library for converting EMUBT symbol tables to and from CSV
//!
//! This library provides functionality to:
//! - Decode the packed `data` attribute of `<symbol>` elements into byte grids
//! - Export every symbol of an `.emubt` document as its own CSV grid file
//! - Match edited CSV files back to their document and symbol by name
//! - Re-encode the grids and write a modified copy of the document

pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod grid;
pub mod import;
pub mod sanitize;
pub mod scanner;
pub mod symbol;
pub mod token;

pub use config::{run_batch, BatchFile, BatchReport, Job, JobReport};
pub use document::{Document, ElementHandle};
pub use error::{Error, Result};
pub use export::{export_directory, export_document, ExportOptions, ExportReport};
pub use grid::{flatten, read_grid_file, reshape, write_grid_file, CellFormat, Grid};
pub use import::{
    apply_grid_file, encode_grid, import_directory, import_group, GroupReport, ImportOptions,
    ImportReport, DEFAULT_OUT_PREFIX,
};
pub use sanitize::sanitize;
pub use scanner::{find_document, group_grid_files, list_documents, GridFile, GridGroup};
pub use symbol::{extract, symbols, SymbolEntry, SymbolIndex};
pub use token::{format_token, parse_token, tokenize};
