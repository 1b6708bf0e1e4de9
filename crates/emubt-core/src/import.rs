//! CSV -> EMUBT import
//!
//! Grid files are grouped by the document stem in their name. Each group is
//! applied to one parsed document; every file succeeds or fails on its own,
//! and the document is written under a prefixed name only if at least one
//! symbol changed.

use crate::document::Document;
use crate::error::{Error, Result};
use crate::grid::{read_grid_file, Grid};
use crate::sanitize::sanitize;
use crate::scanner::{find_document, group_grid_files, GridFile, GridGroup};
use crate::symbol::{extract, SymbolEntry, SymbolIndex, DATA_ATTR};
use crate::token::{encode_packed, parse_token};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix prepended to the original filename of a rewritten document
pub const DEFAULT_OUT_PREFIX: &str = "altered_";

/// Options for an import run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOptions {
    /// Prefix for output documents
    #[serde(default = "default_out_prefix")]
    pub out_prefix: String,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            out_prefix: default_out_prefix(),
        }
    }
}

fn default_out_prefix() -> String {
    DEFAULT_OUT_PREFIX.to_string()
}

/// A symbol whose data was replaced from a grid file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedSymbol {
    /// Sanitized symbol name
    pub symbol: String,
    /// Grid file the data came from
    pub source: PathBuf,
}

/// Outcome for one group of grid files
#[derive(Debug, Clone, Default, Serialize)]
pub struct GroupReport {
    /// Document stem shared by the group
    pub stem: String,
    /// Source document, if one was found
    pub document: Option<PathBuf>,
    /// Written document, if any symbol changed and saving succeeded
    pub output: Option<PathBuf>,
    /// Symbols that were updated
    pub applied: Vec<AppliedSymbol>,
    /// Grid files that were rejected (path, reason)
    pub skipped: Vec<(PathBuf, String)>,
    /// Failure that stopped the whole group
    pub error: Option<String>,
}

impl GroupReport {
    fn new(stem: &str) -> Self {
        Self {
            stem: stem.to_string(),
            ..Self::default()
        }
    }

    /// Number of symbols changed in this group
    pub fn changed(&self) -> usize {
        self.applied.len()
    }
}

/// Outcome of an import run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    /// Per-group results, in processing order
    pub groups: Vec<GroupReport>,
    /// Documents that were written
    pub outputs: Vec<PathBuf>,
}

impl ImportReport {
    /// Total symbols changed across all groups
    pub fn changed(&self) -> usize {
        self.groups.iter().map(GroupReport::changed).sum()
    }

    /// Total grid files rejected across all groups
    pub fn skipped(&self) -> usize {
        self.groups.iter().map(|g| g.skipped.len()).sum()
    }

    /// Groups that failed as a whole
    pub fn failed_groups(&self) -> impl Iterator<Item = &GroupReport> {
        self.groups.iter().filter(|g| g.error.is_some())
    }
}

/// Import every grid file group found directly inside `dir`
///
/// Only failing to list the directory is an error; everything else is
/// recorded in the report.
pub fn import_directory<P: AsRef<Path>>(dir: P, options: &ImportOptions) -> Result<ImportReport> {
    let dir = dir.as_ref();
    let groups = group_grid_files(dir)?;
    let mut report = ImportReport::default();

    if groups.is_empty() {
        tracing::info!(
            dir = %dir.display(),
            "no CSVs found matching pattern '*__*.csv'"
        );
        return Ok(report);
    }

    for group in &groups {
        let group_report = import_group(dir, group, options);
        if let Some(output) = &group_report.output {
            report.outputs.push(output.clone());
        }
        report.groups.push(group_report);
    }

    Ok(report)
}

/// Apply one group of grid files to its document in `dir`
pub fn import_group(dir: &Path, group: &GridGroup, options: &ImportOptions) -> GroupReport {
    let mut report = GroupReport::new(&group.stem);

    let doc_path = match find_document(dir, &group.stem) {
        Ok(Some(path)) => path,
        Ok(None) => {
            let e = Error::DocumentNotFound {
                stem: group.stem.clone(),
                dir: dir.to_path_buf(),
            };
            tracing::warn!("[SKIP] {}", e);
            report.error = Some(e.to_string());
            return report;
        }
        Err(e) => {
            tracing::error!(stem = %group.stem, "{}", e);
            report.error = Some(e.to_string());
            return report;
        }
    };
    report.document = Some(doc_path.clone());

    let mut doc = match Document::load(&doc_path) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::error!("[ERROR] {}", e);
            report.error = Some(e.to_string());
            return report;
        }
    };

    let index = extract(&doc);
    let doc_name = file_name(&doc_path);

    for grid_file in &group.files {
        match apply_grid_file(&mut doc, &index, grid_file) {
            Ok(symbol) => {
                tracing::info!(
                    "[OK] Updated '{}' from {}",
                    symbol,
                    file_name(&grid_file.path)
                );
                report.applied.push(AppliedSymbol {
                    symbol,
                    source: grid_file.path.clone(),
                });
            }
            Err(e @ Error::UnmatchedSymbol { .. }) => {
                tracing::warn!(
                    "[WARN] {}: {} (from {})",
                    doc_name,
                    e,
                    file_name(&grid_file.path)
                );
                report.skipped.push((grid_file.path.clone(), e.to_string()));
            }
            Err(e) => {
                tracing::error!("[ERROR] {}: {}", file_name(&grid_file.path), e);
                report.skipped.push((grid_file.path.clone(), e.to_string()));
            }
        }
    }

    if report.applied.is_empty() {
        tracing::info!("[INFO] {}: no changes", doc_name);
        return report;
    }

    let out_path = output_path(&doc_path, &options.out_prefix);
    match doc.save(&out_path) {
        Ok(()) => {
            tracing::info!(
                "[SAVED] {} ({} symbol(s) updated)",
                file_name(&out_path),
                report.changed()
            );
            report.output = Some(out_path);
        }
        Err(e) => {
            tracing::error!("[ERROR] {}", e);
            report.error = Some(e.to_string());
        }
    }

    report
}

/// Validate one grid file against its symbol and rewrite the symbol's data
///
/// Returns the sanitized symbol name. The document is untouched on error.
pub fn apply_grid_file(doc: &mut Document, index: &SymbolIndex, grid_file: &GridFile) -> Result<String> {
    let name = sanitize(&grid_file.symbol_name);
    let entry = index.get(&name).ok_or_else(|| Error::UnmatchedSymbol {
        name: name.clone(),
        document: doc.source_path().to_path_buf(),
    })?;

    let grid = read_grid_file(&grid_file.path)?;
    let packed = encode_grid(&grid, entry)?;
    doc.set_attribute(entry.handle, DATA_ATTR, &packed)?;

    Ok(name)
}

/// Check a grid against a symbol's declared size and encode it as packed data
///
/// Only the total cell count has to agree; the grid's own shape may differ.
pub fn encode_grid(grid: &Grid, entry: &SymbolEntry) -> Result<String> {
    let expected = entry.cell_count();
    if grid.cell_count() != expected {
        return Err(Error::DimensionMismatch {
            found: grid.cell_count(),
            width: entry.width,
            height: entry.height,
        });
    }

    let values = grid.cells().map(parse_token).collect::<Result<Vec<_>>>()?;
    if values.len() != expected {
        return Err(Error::DimensionMismatch {
            found: values.len(),
            width: entry.width,
            height: entry.height,
        });
    }

    Ok(encode_packed(&values))
}

/// `<prefix><original filename>` next to the original document
pub fn output_path(doc_path: &Path, prefix: &str) -> PathBuf {
    let name = format!("{}{}", prefix, file_name(doc_path));
    match doc_path.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
