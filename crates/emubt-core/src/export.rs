//! EMUBT -> CSV export
//!
//! Every well-formed `<symbol>` becomes one grid file named
//! `<document_stem>__<sanitized_name>.csv`.

use crate::document::Document;
use crate::error::{Error, Result};
use crate::grid::{reshape, write_grid_file, CellFormat};
use crate::scanner::{grid_file_name, list_documents};
use crate::symbol::symbols;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Options for an export run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Spelling of exported cells
    #[serde(default)]
    pub format: CellFormat,
    /// Where grid files go; defaults to each document's directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<PathBuf>,
}

/// Outcome of an export run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportReport {
    /// Documents that were parsed
    pub documents: usize,
    /// Grid files that were written
    pub files_written: Vec<PathBuf>,
    /// Symbols left out (`<document>:<symbol>`, reason)
    pub skipped: Vec<(String, String)>,
    /// Documents or files that failed (path, error message)
    pub errors: Vec<(PathBuf, String)>,
}

impl ExportReport {
    /// Fold another report into this one
    pub fn merge(&mut self, other: ExportReport) {
        self.documents += other.documents;
        self.files_written.extend(other.files_written);
        self.skipped.extend(other.skipped);
        self.errors.extend(other.errors);
    }
}

/// Export every document found directly inside `dir`
///
/// Only failing to list the directory is an error; a document that cannot
/// be parsed is recorded in the report and the run moves on.
pub fn export_directory<P: AsRef<Path>>(dir: P, options: &ExportOptions) -> Result<ExportReport> {
    let dir = dir.as_ref();
    let documents = list_documents(dir)?;
    let mut report = ExportReport::default();

    if documents.is_empty() {
        tracing::info!(dir = %dir.display(), "no .emubt files found");
        return Ok(report);
    }

    for path in documents {
        match export_document(&path, options) {
            Ok(doc_report) => report.merge(doc_report),
            Err(e) => {
                tracing::error!(file = %path.display(), "{}", e);
                report.errors.push((path, e.to_string()));
            }
        }
    }

    Ok(report)
}

/// Export all symbols of one document
pub fn export_document<P: AsRef<Path>>(path: P, options: &ExportOptions) -> Result<ExportReport> {
    let path = path.as_ref();
    let doc = Document::load(path)?;

    let out_dir = match &options.out_dir {
        Some(dir) => dir.clone(),
        None => path.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    if !out_dir.as_os_str().is_empty() {
        fs::create_dir_all(&out_dir)?;
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut report = export_symbols(&doc, &stem, &out_dir, options.format);
    report.documents = 1;
    Ok(report)
}

/// Write one grid file per well-formed symbol of `doc`
pub fn export_symbols(doc: &Document, stem: &str, out_dir: &Path, format: CellFormat) -> ExportReport {
    let mut report = ExportReport::default();

    for entry in symbols(doc) {
        let label = format!("{}:{}", stem, entry.name);

        let values = match entry.decode() {
            Ok(values) => values,
            Err(e @ Error::DimensionMismatch { .. }) => {
                // Not a table we can lay out; leave it alone
                tracing::debug!(symbol = %label, "{}", e);
                report.skipped.push((label, e.to_string()));
                continue;
            }
            Err(e) => {
                tracing::warn!(symbol = %label, "unreadable data: {}", e);
                report.skipped.push((label, e.to_string()));
                continue;
            }
        };

        let rows: Vec<Vec<String>> = reshape(&values, entry.width)
            .into_iter()
            .map(|row| row.into_iter().map(|v| format.render(v)).collect())
            .collect();

        let csv_path = out_dir.join(grid_file_name(stem, &entry.sanitized_name));
        match write_grid_file(&csv_path, &rows) {
            Ok(()) => {
                tracing::info!(
                    "Exported table -> {} ({}x{})",
                    csv_path.display(),
                    entry.width,
                    entry.height
                );
                report.files_written.push(csv_path);
            }
            Err(e) => {
                tracing::error!(file = %csv_path.display(), "{}", e);
                report.errors.push((csv_path, e.to_string()));
            }
        }
    }

    report
}
