use std::fs;
use std::io;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::debug;

use crate::error::{ConvertError, Result};
use crate::format_detection::{sample_of, sniff_delimiter, DEFAULT_DELIMITER};

const UTF8_BOM: char = '\u{feff}';

/// Rows of raw fields read from one CSV file
#[derive(Debug, Clone, PartialEq)]
pub struct CsvContent {
    pub delimiter: u8,
    /// Whether `delimiter` came from the sniffer rather than an override or fallback
    pub sniffed: bool,
    pub records: Vec<Vec<String>>,
}

/// Reads whole CSV files, sniffing the delimiter unless one is given
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvReader {
    pub delimiter: Option<u8>,
}

impl CsvReader {
    pub fn new() -> Self {
        Self { delimiter: None }
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self {
            delimiter: Some(delimiter),
        }
    }

    /// Reads and parses the file at `path` as UTF-8 CSV
    pub fn read(&self, path: &Path) -> Result<CsvContent> {
        let bytes = fs::read(path).map_err(|e| ConvertError::from_read_io(path, e))?;
        let text = String::from_utf8(bytes).map_err(|e| ConvertError::Read {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidData, e),
        })?;

        self.parse(&text).map_err(|e| ConvertError::Read {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Parses CSV text already held in memory.
    ///
    /// Rows whose fields are all empty are dropped.
    pub fn parse(&self, text: &str) -> std::result::Result<CsvContent, csv::Error> {
        let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);

        let (delimiter, sniffed) = match self.delimiter {
            Some(delim) => (delim, false),
            None => match sniff_delimiter(sample_of(text)) {
                Some(delim) => (delim, true),
                None => {
                    eprintln!(
                        "Warning: Could not automatically detect delimiter. Assuming '{}'.",
                        DEFAULT_DELIMITER as char
                    );
                    (DEFAULT_DELIMITER, false)
                }
            },
        };

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .quote(b'"')
            .double_quote(true)
            .has_headers(false)
            .flexible(true) // Rows may have different widths
            .from_reader(text.as_bytes());

        let mut records = Vec::new();
        let mut dropped = 0;
        for result in reader.records() {
            let record = result?;
            if record.iter().all(str::is_empty) {
                dropped += 1;
                continue;
            }
            records.push(record.iter().map(str::to_string).collect());
        }

        debug!(
            rows = records.len(),
            dropped,
            delimiter = %(delimiter as char),
            "parsed CSV content"
        );

        Ok(CsvContent {
            delimiter,
            sniffed,
            records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> CsvContent {
        CsvReader::new().parse(text).unwrap()
    }

    #[test]
    fn test_parse_comma_scenario() {
        let content = parse("a,b,c\n1,2,x\n");
        assert_eq!(content.delimiter, b',');
        assert!(content.sniffed);
        assert_eq!(
            content.records,
            vec![vec!["a", "b", "c"], vec!["1", "2", "x"]]
        );
    }

    #[test]
    fn test_parse_semicolon_scenario() {
        let content = parse("a;b\n3.5;y\n");
        assert_eq!(content.delimiter, b';');
        assert_eq!(content.records, vec![vec!["a", "b"], vec!["3.5", "y"]]);
    }

    #[test]
    fn test_parse_drops_blank_rows() {
        let content = parse("a,b\n\n1,2\n,\n\"\",\"\"\n\n3,4\n");
        assert_eq!(
            content.records,
            vec![vec!["a", "b"], vec!["1", "2"], vec!["3", "4"]]
        );
    }

    #[test]
    fn test_parse_quoted_fields() {
        let content = parse("name,note\n\"Smith, John\",\"two\nlines\"\n\"say \"\"hi\"\"\",x\n");
        assert_eq!(
            content.records,
            vec![
                vec!["name", "note"],
                vec!["Smith, John", "two\nlines"],
                vec!["say \"hi\"", "x"],
            ]
        );
    }

    #[test]
    fn test_parse_ragged_rows() {
        let content = parse("a,b,c\n1,2,3\n4,5\n6,7,8\n");
        assert_eq!(content.records[2], vec!["4", "5"]);
    }

    #[test]
    fn test_parse_empty_input() {
        let content = parse("");
        assert!(content.records.is_empty());
        assert_eq!(content.delimiter, b',');
        assert!(!content.sniffed);
    }

    #[test]
    fn test_parse_falls_back_to_comma() {
        let content = parse("only\nsingle\ncolumn\n");
        assert_eq!(content.delimiter, b',');
        assert!(!content.sniffed);
        assert_eq!(content.records.len(), 3);
    }

    #[test]
    fn test_parse_strips_bom() {
        let content = parse("\u{feff}a;b\n1;2\n");
        assert_eq!(content.records[0], vec!["a", "b"]);
    }

    #[test]
    fn test_delimiter_override() {
        let content = CsvReader::with_delimiter(b';').parse("a,b;c\n").unwrap();
        assert_eq!(content.delimiter, b';');
        assert!(!content.sniffed);
        assert_eq!(content.records, vec![vec!["a,b", "c"]]);
    }

    #[test]
    fn test_read_missing_file() {
        let err = CsvReader::new()
            .read(Path::new("definitely/not/here.csv"))
            .unwrap_err();
        assert!(matches!(err, ConvertError::NotFound(_)));
    }

    #[test]
    fn test_read_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.csv");
        fs::write(&path, b"name,city\nJos\xe9,M\xe1laga\n").unwrap();

        let err = CsvReader::new().read(&path).unwrap_err();
        assert!(matches!(err, ConvertError::Read { .. }));
    }
}
