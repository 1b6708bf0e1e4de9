//! EMUBT CSV CLI
//!
//! Command-line tool for exporting EMUBT symbol tables to CSV grids and
//! importing edited grids back into the documents.

use clap::{Parser, Subcommand};
use emubt_core::{
    export_directory, import_directory, run_batch, symbols, BatchFile, CellFormat, Document,
    ExportOptions, ExportReport, ImportOptions, ImportReport, Job, JobReport, DEFAULT_OUT_PREFIX,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "emubt-cli")]
#[command(about = "EMUBT symbol table <-> CSV converter", long_about = None)]
#[command(version)]
struct Cli {
    /// Show debug diagnostics
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only show warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export every symbol of every .emubt file to its own CSV
    Export {
        /// Directory to scan (defaults to the executable's directory)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Cell format (decimal or hex)
        #[arg(short, long, default_value = "decimal")]
        format: CellFormat,

        /// Write CSV files here instead of next to the documents
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Re-encode <doc>__<symbol>.csv files into altered copies of their documents
    Import {
        /// Directory to scan (defaults to the executable's directory)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Prefix for written documents
        #[arg(short, long, default_value = DEFAULT_OUT_PREFIX)]
        prefix: String,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the symbols of a single document
    Inspect {
        /// Path to .emubt file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Run a batch of export/import jobs
    Batch {
        /// Path to batch file (JSON)
        #[arg(short, long)]
        batch: PathBuf,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a batch file template
    CreateBatch {
        /// Output path for the batch file
        #[arg(short, long)]
        output: PathBuf,

        /// Directory the jobs operate on
        #[arg(short, long)]
        dir: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();
}

fn run(command: Commands) -> emubt_core::Result<()> {
    match command {
        Commands::Export {
            dir,
            format,
            output,
            json,
        } => cmd_export(&resolve_dir(dir)?, format, output, json),
        Commands::Import { dir, prefix, json } => cmd_import(&resolve_dir(dir)?, prefix, json),
        Commands::Inspect { file } => cmd_inspect(&file),
        Commands::Batch { batch, json } => cmd_batch(&batch, json),
        Commands::CreateBatch { output, dir } => cmd_create_batch(&output, &dir),
    }
}

/// Use the given directory, or the one holding the executable
fn resolve_dir(dir: Option<PathBuf>) -> emubt_core::Result<PathBuf> {
    if let Some(dir) = dir {
        return Ok(dir);
    }
    let exe = std::env::current_exe()?;
    Ok(exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(".")))
}

fn cmd_export(
    dir: &Path,
    format: CellFormat,
    out_dir: Option<PathBuf>,
    json: bool,
) -> emubt_core::Result<()> {
    let options = ExportOptions { format, out_dir };
    tracing::info!("Exporting .emubt tables in: {}", dir.display());

    let report = export_directory(dir, &options)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_export_summary(&report);
    }
    Ok(())
}

fn cmd_import(dir: &Path, out_prefix: String, json: bool) -> emubt_core::Result<()> {
    let options = ImportOptions { out_prefix };
    tracing::info!("Re-encoding CSVs in: {}", dir.display());

    let report = import_directory(dir, &options)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_import_summary(&report);
    }
    Ok(())
}

fn cmd_inspect(file: &Path) -> emubt_core::Result<()> {
    let doc = Document::load(file)?;
    let entries = symbols(&doc);

    println!("File: {}", file.display());
    println!("Symbols: {}", entries.len());
    println!();
    println!("NAME\tKEY\tSIZE\tCELLS");
    println!("{}", "-".repeat(48));

    for entry in &entries {
        let cells = match entry.decode() {
            Ok(values) => values.len().to_string(),
            Err(e) => format!("invalid ({})", e),
        };
        println!(
            "{}\t{}\t{}x{}\t{}",
            entry.name, entry.sanitized_name, entry.width, entry.height, cells
        );
    }

    Ok(())
}

fn cmd_batch(batch_path: &Path, json: bool) -> emubt_core::Result<()> {
    let batch = BatchFile::load(batch_path)?;
    tracing::info!("Running batch with {} job(s)", batch.jobs.len());

    let report = run_batch(&batch);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for job_report in &report.completed {
        match job_report {
            JobReport::Export(r) => print_export_summary(r),
            JobReport::Import(r) => print_import_summary(r),
        }
        println!();
    }

    if !report.errors.is_empty() {
        println!("Errors ({}):", report.errors.len());
        for (dir, err) in &report.errors {
            println!("  {}: {}", dir.display(), err);
        }
    }

    Ok(())
}

fn cmd_create_batch(output: &Path, dir: &Path) -> emubt_core::Result<()> {
    let batch = BatchFile {
        jobs: vec![
            Job::Export {
                dir: dir.to_path_buf(),
                format: CellFormat::Decimal,
                out_dir: None,
            },
            Job::Import {
                dir: dir.to_path_buf(),
                out_prefix: DEFAULT_OUT_PREFIX.to_string(),
            },
        ],
    };

    batch.save(output)?;
    println!("Created batch file: {}", output.display());
    println!();
    println!("Edit the file to configure your jobs, then run:");
    println!("  emubt-cli batch --batch {}", output.display());

    Ok(())
}

fn print_export_summary(report: &ExportReport) {
    println!("Export complete:");
    println!("  {} document(s) read", report.documents);
    println!("  {} CSV file(s) written", report.files_written.len());

    if !report.skipped.is_empty() {
        println!("  {} symbol(s) skipped", report.skipped.len());
    }

    if !report.errors.is_empty() {
        println!("\nErrors:");
        for (path, err) in &report.errors {
            println!("  {}: {}", path.display(), err);
        }
    }
}

fn print_import_summary(report: &ImportReport) {
    println!("Import complete:");
    println!("  {} group(s) processed", report.groups.len());
    println!("  {} symbol(s) updated", report.changed());
    println!("  {} CSV file(s) skipped", report.skipped());

    for path in &report.outputs {
        println!("  - {}", path.display());
    }

    let failed: Vec<_> = report.failed_groups().collect();
    if !failed.is_empty() {
        println!("\nFailed groups:");
        for group in failed {
            println!(
                "  {}: {}",
                group.stem,
                group.error.as_deref().unwrap_or_default()
            );
        }
    }
}
