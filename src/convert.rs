//! Single-file and folder conversion drivers

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, warn};

use crate::config::{ConvertOptions, FolderConfig, SOURCE_EXTENSION};
use crate::error::{ConvertError, Result};
use crate::table::Table;

/// Result of one file's pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    Converted,
    Skipped(String),
}

/// What happened to one file in folder mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub input: PathBuf,
    pub output: PathBuf,
    pub outcome: ConversionOutcome,
}

/// Totals of a folder run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderSummary {
    pub converted: usize,
    pub skipped: usize,
    pub files: Vec<FileOutcome>,
}

impl FolderSummary {
    fn record(&mut self, input: PathBuf, output: PathBuf, outcome: ConversionOutcome) {
        match outcome {
            ConversionOutcome::Converted => self.converted += 1,
            ConversionOutcome::Skipped(_) => self.skipped += 1,
        }
        self.files.push(FileOutcome {
            input,
            output,
            outcome,
        });
    }
}

/// Reads, coerces and writes one file; nothing is written unless the table has rows
pub fn convert_file(
    input_path: &Path,
    output_path: &Path,
    options: &ConvertOptions,
) -> Result<Table> {
    let content = options.reader().read(input_path)?;
    if content.sniffed {
        println!("Detected delimiter: '{}'", content.delimiter as char);
    }

    let table = Table::from_records(content.records, options.no_type_conversion);
    if table.is_empty() {
        eprintln!(
            "Warning: No data read from {}. File might be empty or incorrectly formatted.",
            input_path.display()
        );
        return Err(ConvertError::EmptyInput(input_path.to_path_buf()));
    }
    println!("Successfully read data from {}", input_path.display());

    options.format.writer().write(&table, output_path)?;
    println!("Successfully wrote data to {}", output_path.display());

    Ok(table)
}

/// Converts a single file; every failure is returned to the caller
pub fn convert_single(
    input_path: &Path,
    output_path: &Path,
    options: &ConvertOptions,
) -> Result<()> {
    println!("--- Processing single file ---");
    println!("Input: {}", input_path.display());
    println!("Output: {}", output_path.display());

    if !input_path.is_file() {
        return Err(ConvertError::NotFound(input_path.to_path_buf()));
    }

    convert_file(input_path, output_path, options)?;
    println!("Conversion completed successfully.");
    Ok(())
}

/// Converts every `.csv` entry directly inside the input directory.
///
/// Only a missing input directory or an uncreatable output directory is an
/// error; per-file failures are counted as skipped.
pub fn convert_folder(folders: &FolderConfig, options: &ConvertOptions) -> Result<FolderSummary> {
    let FolderConfig {
        input_dir,
        output_dir,
    } = folders;

    println!("--- Processing folder ---");
    println!("Input directory: {}", input_dir.display());
    println!("Output directory: {}", output_dir.display());

    if !input_dir.is_dir() {
        return Err(ConvertError::NotFound(input_dir.clone()));
    }

    fs::create_dir_all(output_dir).map_err(|source| ConvertError::OutputDir {
        path: output_dir.clone(),
        source,
    })?;
    println!("Ensured output directory '{}' exists.", output_dir.display());

    println!("Scanning for CSV files...");
    let mut summary = FolderSummary::default();
    for input_path in list_sources(input_dir)? {
        let output_path = output_dir.join(output_name(&input_path, options));
        println!(
            "\nProcessing '{}' -> '{}'",
            file_label(&input_path),
            file_label(&output_path)
        );

        let outcome = match convert_file(&input_path, &output_path, options) {
            Ok(_) => {
                println!("Successfully converted '{}'.", file_label(&input_path));
                ConversionOutcome::Converted
            }
            Err(e) if e.is_fatal_for_batch() => return Err(e),
            Err(e) => {
                error!("{}", e);
                println!("Could not convert '{}'. Skipping.", file_label(&input_path));
                ConversionOutcome::Skipped(e.to_string())
            }
        };
        summary.record(input_path, output_path, outcome);
    }

    println!("\n--- Folder processing summary ---");
    println!("Successfully converted: {} file(s)", summary.converted);
    println!("Skipped/Failed:       {} file(s)", summary.skipped);
    println!("---------------------------------");

    Ok(summary)
}

/// Entries of `dir` whose name ends in `.csv` (any case), sorted by name
fn list_sources(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| ConvertError::from_read_io(dir, e))?;

    let mut sources = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        if has_source_extension(&entry.file_name().to_string_lossy()) {
            sources.push(entry.path());
        }
    }
    sources.sort();
    Ok(sources)
}

fn has_source_extension(name: &str) -> bool {
    let suffix = format!(".{}", SOURCE_EXTENSION);
    name.len() >= suffix.len()
        && name.is_char_boundary(name.len() - suffix.len())
        && name[name.len() - suffix.len()..].eq_ignore_ascii_case(&suffix)
}

/// Source file name with its extension replaced by the target format's
fn output_name(input_path: &Path, options: &ConvertOptions) -> PathBuf {
    let name = input_path.file_name().map(PathBuf::from).unwrap_or_default();
    name.with_extension(options.format.extension())
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
