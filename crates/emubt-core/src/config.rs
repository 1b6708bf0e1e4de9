//! Batch job files
//!
//! A batch file lists export and import jobs to run in order:
//!
//! ```json
//! { "jobs": [
//!     { "export": { "dir": "tables", "format": "hex" } },
//!     { "import": { "dir": "tables", "out_prefix": "altered_" } }
//! ] }
//! ```

use crate::error::{Error, Result};
use crate::export::{export_directory, ExportOptions, ExportReport};
use crate::grid::CellFormat;
use crate::import::{import_directory, ImportOptions, ImportReport, DEFAULT_OUT_PREFIX};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// One conversion over a directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Job {
    /// EMUBT -> CSV
    Export {
        dir: PathBuf,
        #[serde(default)]
        format: CellFormat,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        out_dir: Option<PathBuf>,
    },
    /// CSV -> EMUBT
    Import {
        dir: PathBuf,
        #[serde(default = "default_out_prefix")]
        out_prefix: String,
    },
}

fn default_out_prefix() -> String {
    DEFAULT_OUT_PREFIX.to_string()
}

impl Job {
    /// Directory the job scans
    pub fn dir(&self) -> &Path {
        match self {
            Job::Export { dir, .. } | Job::Import { dir, .. } => dir,
        }
    }

    /// Run the job
    pub fn run(&self) -> Result<JobReport> {
        match self {
            Job::Export {
                dir,
                format,
                out_dir,
            } => {
                let options = ExportOptions {
                    format: *format,
                    out_dir: out_dir.clone(),
                };
                export_directory(dir, &options).map(JobReport::Export)
            }
            Job::Import { dir, out_prefix } => {
                let options = ImportOptions {
                    out_prefix: out_prefix.clone(),
                };
                import_directory(dir, &options).map(JobReport::Import)
            }
        }
    }
}

/// A batch file containing conversion jobs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFile {
    /// Jobs, run in order
    pub jobs: Vec<Job>,
}

impl BatchFile {
    /// Load a batch file from JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Save the batch file to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// Result of one finished job
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobReport {
    Export(ExportReport),
    Import(ImportReport),
}

/// Result of a batch run
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// Jobs that ran to completion
    pub completed: Vec<JobReport>,
    /// Jobs that could not run (directory, error message)
    pub errors: Vec<(PathBuf, String)>,
}

/// Run every job; a failing job does not stop the ones after it
pub fn run_batch(batch: &BatchFile) -> BatchReport {
    let mut report = BatchReport::default();

    for job in &batch.jobs {
        match job.run() {
            Ok(job_report) => report.completed.push(job_report),
            Err(e) => {
                tracing::error!(dir = %job.dir().display(), "job failed: {}", e);
                report.errors.push((job.dir().to_path_buf(), e.to_string()));
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_batch_file_serialization() {
        let batch = BatchFile {
            jobs: vec![
                Job::Export {
                    dir: PathBuf::from("tables"),
                    format: CellFormat::Hex,
                    out_dir: None,
                },
                Job::Import {
                    dir: PathBuf::from("tables"),
                    out_prefix: "new_".to_string(),
                },
            ],
        };

        let json = serde_json::to_string_pretty(&batch).unwrap();
        let loaded: BatchFile = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, batch);
    }

    #[test]
    fn test_batch_file_defaults() {
        let json = r#"{"jobs": [{"export": {"dir": "a"}}, {"import": {"dir": "b"}}]}"#;
        let batch: BatchFile = serde_json::from_str(json).unwrap();

        assert_eq!(
            batch.jobs[0],
            Job::Export {
                dir: PathBuf::from("a"),
                format: CellFormat::Decimal,
                out_dir: None,
            }
        );
        assert_eq!(
            batch.jobs[1],
            Job::Import {
                dir: PathBuf::from("b"),
                out_prefix: "altered_".to_string(),
            }
        );
    }

    #[test]
    fn test_run_batch_continues_after_failure() {
        let tmp = TempDir::new().unwrap();
        let batch = BatchFile {
            jobs: vec![
                Job::Export {
                    dir: tmp.path().join("missing"),
                    format: CellFormat::Decimal,
                    out_dir: None,
                },
                Job::Import {
                    dir: tmp.path().to_path_buf(),
                    out_prefix: "altered_".to_string(),
                },
            ],
        };

        let report = run_batch(&batch);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.completed.len(), 1);
    }
}
