#![allow(clippy::approx_constant)]

pub mod config;
pub mod convert;
pub mod error;
pub mod format_detection;
pub mod reader;
pub mod table;
pub mod value_conversion;
pub mod writers;

// Re-export commonly used items for convenience
pub use config::{ConvertOptions, FolderConfig};
pub use convert::{
    convert_file, convert_folder, convert_single, ConversionOutcome, FileOutcome, FolderSummary,
};
pub use error::ConvertError;
pub use format_detection::sniff_delimiter;
pub use reader::{CsvContent, CsvReader};
pub use table::{Cell, Row, Table};
pub use value_conversion::convert_field_value;
pub use writers::{OutputFormat, SheetWriter, XlsWriter, XlsxWriter};
