//! Directory scanner for EMUBT documents and their CSV grid files
//!
//! Grid files are named `<document_stem>__<symbol_name>.csv`; the first
//! `__` in the stem separates the two parts.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Separator between document stem and symbol name in grid filenames
pub const SEPARATOR: &str = "__";

/// Extension of source documents (matched case-insensitively)
pub const DOCUMENT_EXTENSION: &str = "emubt";

/// Extension of grid files
pub const GRID_EXTENSION: &str = "csv";

/// One grid file and the two halves of its name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridFile {
    /// Full path to the file
    pub path: PathBuf,
    /// Part before the first separator
    pub document_stem: String,
    /// Part after the first separator (not yet sanitized)
    pub symbol_name: String,
}

/// Grid files that target the same document stem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridGroup {
    /// Document stem as written in the grid filenames
    pub stem: String,
    /// Members, sorted by path
    pub files: Vec<GridFile>,
}

/// Filename for a symbol's grid file
pub fn grid_file_name(document_stem: &str, sanitized_name: &str) -> String {
    format!("{}{}{}.{}", document_stem, SEPARATOR, sanitized_name, GRID_EXTENSION)
}

/// Split a grid file stem at the first separator
///
/// Examples:
/// - "bank0__Gain_Table" -> ("bank0", "Gain_Table")
/// - "a__b__c" -> ("a", "b__c")
/// - "plain" -> None
pub fn split_grid_stem(stem: &str) -> Option<(&str, &str)> {
    stem.split_once(SEPARATOR)
}

/// Source documents directly inside `dir`, sorted by path
pub fn list_documents<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    Ok(list_files(dir.as_ref())?
        .into_iter()
        .filter(|path| is_document(path))
        .collect())
}

/// Grid files directly inside `dir`, sorted by path
pub fn list_grid_files<P: AsRef<Path>>(dir: P) -> Result<Vec<GridFile>> {
    let mut grids = Vec::new();

    for path in list_files(dir.as_ref())? {
        if !path.extension().is_some_and(|ext| ext == GRID_EXTENSION) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if let Some((document_stem, symbol_name)) = split_grid_stem(stem) {
            grids.push(GridFile {
                document_stem: document_stem.to_string(),
                symbol_name: symbol_name.to_string(),
                path: path.clone(),
            });
        }
    }

    Ok(grids)
}

/// Group grid files by document stem (case-sensitive), groups sorted by stem
pub fn group_grid_files<P: AsRef<Path>>(dir: P) -> Result<Vec<GridGroup>> {
    let mut groups: BTreeMap<String, Vec<GridFile>> = BTreeMap::new();

    for grid in list_grid_files(dir)? {
        groups
            .entry(grid.document_stem.clone())
            .or_default()
            .push(grid);
    }

    Ok(groups
        .into_iter()
        .map(|(stem, files)| GridGroup { stem, files })
        .collect())
}

/// Find the document for `stem`, comparing stems case-insensitively
pub fn find_document<P: AsRef<Path>>(dir: P, stem: &str) -> Result<Option<PathBuf>> {
    let wanted = stem.to_lowercase();

    Ok(list_documents(dir)?.into_iter().find(|path| {
        path.file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|s| s.to_lowercase() == wanted)
    }))
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(DOCUMENT_EXTENSION))
}

/// Regular files directly inside `dir` (no recursion), sorted by path
fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("'{}' is not a directory", dir.display()),
        )
        .into());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), "skipping unreadable entry: {}", e);
                continue;
            }
        };
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    tracing::debug!(dir = %dir.display(), count = files.len(), "scanned directory");
    Ok(files)
}
