//! Resolved conversion settings shared by both orchestration modes

use std::path::PathBuf;

use crate::reader::CsvReader;
use crate::writers::OutputFormat;

pub const DEFAULT_INPUT_DIR: &str = "input";
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Extension (compared case-insensitively) of files picked up in folder mode
pub const SOURCE_EXTENSION: &str = "csv";

/// Settings applied to every file in a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Target spreadsheet container
    pub format: OutputFormat,
    /// Skip sniffing and split on this delimiter
    pub delimiter: Option<u8>,
    /// Keep every field as text
    pub no_type_conversion: bool,
}

impl ConvertOptions {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    pub fn reader(&self) -> CsvReader {
        match self.delimiter {
            Some(delim) => CsvReader::with_delimiter(delim),
            None => CsvReader::new(),
        }
    }
}

/// Input and output directories for folder mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for FolderConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ConvertOptions::default();
        assert_eq!(options.format, OutputFormat::Modern);
        assert_eq!(options.delimiter, None);
        assert!(!options.no_type_conversion);

        let folders = FolderConfig::default();
        assert_eq!(folders.input_dir, PathBuf::from("input"));
        assert_eq!(folders.output_dir, PathBuf::from("output"));
    }

    #[test]
    fn test_reader_uses_delimiter_override() {
        let options = ConvertOptions {
            delimiter: Some(b';'),
            ..ConvertOptions::default()
        };
        assert_eq!(options.reader().delimiter, Some(b';'));
        assert_eq!(ConvertOptions::default().reader().delimiter, None);
    }
}
