pub mod xls;
pub mod xlsx;

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{ConvertError, Result};
use crate::table::Table;

pub use xls::XlsWriter;
pub use xlsx::XlsxWriter;

/// Name of the single sheet every writer produces
pub const SHEET_NAME: &str = "Sheet1";

/// Target spreadsheet container
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Office Open XML workbook (`.xlsx`)
    #[default]
    Modern,
    /// BIFF8 workbook in an OLE compound file (`.xls`)
    Legacy,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Modern => "xlsx",
            OutputFormat::Legacy => "xls",
        }
    }

    /// Guesses the format from an output path; only `.xls` selects `Legacy`
    pub fn from_path(path: &Path) -> Self {
        match path.extension() {
            Some(ext) if ext.to_string_lossy().eq_ignore_ascii_case("xls") => {
                OutputFormat::Legacy
            }
            _ => OutputFormat::Modern,
        }
    }

    pub fn writer(self) -> Box<dyn SheetWriter> {
        match self {
            OutputFormat::Modern => Box::new(XlsxWriter),
            OutputFormat::Legacy => Box::new(XlsWriter),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "xlsx" | "modern" => Ok(OutputFormat::Modern),
            "xls" | "legacy" => Ok(OutputFormat::Legacy),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Serializes a table into a single-sheet spreadsheet file
pub trait SheetWriter {
    fn write(&self, table: &Table, output_path: &Path) -> Result<()>;
}

/// Writes a fully serialized workbook to disk, removing the file if the write fails
pub(crate) fn persist(output_path: &Path, bytes: &[u8]) -> Result<()> {
    if let Err(e) = fs::write(output_path, bytes) {
        if output_path.is_file() {
            let _ = fs::remove_file(output_path);
        }
        return Err(ConvertError::from_write_io(output_path, e));
    }

    debug!(
        path = %output_path.display(),
        bytes = bytes.len(),
        "workbook saved"
    );
    Ok(())
}

pub(crate) fn write_error(output_path: &Path, reason: impl ToString) -> ConvertError {
    ConvertError::Write {
        path: output_path.to_path_buf(),
        reason: reason.to_string(),
    }
}
