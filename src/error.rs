use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while converting CSV files into spreadsheets
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Input file or directory does not exist
    #[error("input not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Destination exists but cannot be written
    #[error("permission denied when writing {}", .path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Source could not be read, decoded, or parsed as CSV
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Source was readable but contained no non-empty rows
    #[error("no data read from {}; the file is empty or contains only blank rows", .0.display())]
    EmptyInput(PathBuf),

    /// Spreadsheet serialization or the final write failed
    #[error("failed to write {}: {reason}", .path.display())]
    Write { path: PathBuf, reason: String },

    /// Output directory could not be created
    #[error("could not create output directory {}: {source}", .path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Invalid combination of command-line arguments
    #[error("{0}")]
    Usage(String),
}

impl ConvertError {
    /// Maps an I/O failure on the destination to `PermissionDenied` or `Write`
    pub fn from_write_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::PermissionDenied {
            ConvertError::PermissionDenied {
                path: path.to_path_buf(),
                source,
            }
        } else {
            ConvertError::Write {
                path: path.to_path_buf(),
                reason: source.to_string(),
            }
        }
    }

    /// Maps an I/O failure on the source to `NotFound` or `Read`
    pub fn from_read_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            ConvertError::NotFound(path.to_path_buf())
        } else {
            ConvertError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    /// Whether this error aborts a whole folder run rather than a single file
    pub fn is_fatal_for_batch(&self) -> bool {
        matches!(self, ConvertError::OutputDir { .. })
    }
}

pub type Result<T, E = ConvertError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_io_permission_denied() {
        let err = ConvertError::from_write_io(
            Path::new("out.xlsx"),
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(err, ConvertError::PermissionDenied { .. }));
    }

    #[test]
    fn test_write_io_other_is_write_error() {
        let err = ConvertError::from_write_io(
            Path::new("out.xlsx"),
            io::Error::new(io::ErrorKind::Other, "disk full"),
        );
        match err {
            ConvertError::Write { reason, .. } => assert!(reason.contains("disk full")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_read_io_not_found() {
        let err = ConvertError::from_read_io(
            Path::new("missing.csv"),
            io::Error::from(io::ErrorKind::NotFound),
        );
        assert!(matches!(err, ConvertError::NotFound(_)));
        assert!(!err.is_fatal_for_batch());
    }

    #[test]
    fn test_output_dir_is_fatal_for_batch() {
        let err = ConvertError::OutputDir {
            path: PathBuf::from("output"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert!(err.is_fatal_for_batch());
    }

    #[test]
    fn test_write_errors_are_not_fatal_for_batch() {
        let err = ConvertError::from_write_io(
            Path::new("output/a.xlsx"),
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert!(!err.is_fatal_for_batch());
        assert!(!ConvertError::Usage("bad".to_string()).is_fatal_for_batch());
    }
}
