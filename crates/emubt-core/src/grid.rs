//! CSV grid codec
//!
//! A grid file is one symbol's table laid out as `height` rows of `width`
//! cells, with no header row.

use crate::error::{Error, Result};
use crate::token::format_token;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// How exported cells are spelled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellFormat {
    /// Decimal text (`60`)
    #[default]
    Decimal,
    /// Uppercase hex without prefix (`3C`)
    Hex,
}

impl CellFormat {
    /// Render one value in this format
    pub fn render(self, value: i64) -> String {
        match self {
            CellFormat::Decimal => value.to_string(),
            CellFormat::Hex => format_token(value),
        }
    }
}

impl FromStr for CellFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "decimal" | "dec" => Ok(CellFormat::Decimal),
            "hex" => Ok(CellFormat::Hex),
            other => Err(format!("unknown cell format '{}' (expected decimal or hex)", other)),
        }
    }
}

impl std::fmt::Display for CellFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellFormat::Decimal => write!(f, "decimal"),
            CellFormat::Hex => write!(f, "hex"),
        }
    }
}

/// A rectangular grid of text cells read from a CSV file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    /// Non-blank rows, each with the same number of cells
    pub rows: Vec<Vec<String>>,
    /// Source file path
    pub source_path: PathBuf,
}

impl Grid {
    /// Number of cells per row
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Total number of cells
    pub fn cell_count(&self) -> usize {
        self.width() * self.height()
    }

    /// Cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().flatten().map(String::as_str)
    }
}

/// Split a flat sequence into consecutive rows of `width` values
pub fn reshape<T: Clone>(values: &[T], width: usize) -> Vec<Vec<T>> {
    if width == 0 {
        return Vec::new();
    }
    values.chunks(width).map(<[T]>::to_vec).collect()
}

/// Concatenate rows in order
pub fn flatten<T: Clone>(rows: &[Vec<T>]) -> Vec<T> {
    rows.iter().flatten().cloned().collect()
}

/// Read a grid file, dropping blank cells and blank rows
pub fn read_grid_file<P: AsRef<Path>>(path: P) -> Result<Grid> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    read_grid(BufReader::new(file), path)
}

/// Read a grid from a string (useful for testing)
pub fn read_grid_str(content: &str, source_name: &str) -> Result<Grid> {
    read_grid(content.as_bytes(), Path::new(source_name))
}

fn read_grid<R: Read>(reader: R, path: &Path) -> Result<Grid> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true) // row lengths are checked below
        .from_reader(reader);

    let mut rows = Vec::new();
    for result in csv_reader.records() {
        let record = result.map_err(|e| Error::Csv {
            path: path.to_path_buf(),
            source: e,
        })?;

        let row: Vec<String> = record
            .iter()
            .filter(|cell| !cell.trim().is_empty())
            .map(str::to_string)
            .collect();

        if !row.is_empty() {
            rows.push(row);
        }
    }

    if rows.is_empty() {
        return Err(Error::EmptyGrid {
            path: path.to_path_buf(),
        });
    }

    let lengths: BTreeSet<usize> = rows.iter().map(Vec::len).collect();
    if lengths.len() != 1 {
        return Err(Error::InconsistentRowLength {
            path: path.to_path_buf(),
            lengths: lengths.into_iter().collect(),
        });
    }

    Ok(Grid {
        rows,
        source_path: path.to_path_buf(),
    })
}

/// Write rows as CSV, one record per line, no header
pub fn write_grid_file<P: AsRef<Path>>(path: P, rows: &[Vec<String>]) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| Error::Csv {
            path: path.to_path_buf(),
            source: e,
        })?;

    for row in rows {
        writer.write_record(row).map_err(|e| Error::Csv {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    writer.flush()?;
    Ok(())
}
