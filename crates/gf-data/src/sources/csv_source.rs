use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;

use csv::ReaderBuilder;
use gf_core::{CellValue, Row};
use tracing::{debug, info};

use crate::config::NullConfig;
use crate::DataError;

/// Loads the rows of a CSV file for a row store
///
/// The header row names the fields. Cells are kept as text, and cells matching
/// the null configuration become [`CellValue::Null`].
#[derive(Debug, Clone)]
pub struct CsvRowSource {
    /// Path to the CSV file
    path: PathBuf,
    null_config: NullConfig,
    delimiter: u8,
}

impl CsvRowSource {
    /// Create a CSV source for a file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            null_config: NullConfig::default(),
            delimiter: b',',
        }
    }

    pub fn with_null_config(mut self, null_config: NullConfig) -> Self {
        self.null_config = null_config;
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Get the source file name
    pub fn source_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown.csv")
    }

    /// Read every row of the file
    pub fn load(&self) -> Result<Vec<Row>, DataError> {
        let file = File::open(&self.path)?;
        let rows = self.read_rows(BufReader::new(file))?;
        info!(source = self.source_name(), rows = rows.len(), "Loaded CSV rows");
        Ok(rows)
    }

    /// Read rows from any reader, using this source's settings
    pub fn read_rows<R: Read>(&self, reader: R) -> Result<Vec<Row>, DataError> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(self.delimiter)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();
        if headers.is_empty() {
            return Err(DataError::Csv("missing header row".to_string()));
        }
        debug!(columns = headers.len(), "Read CSV header");

        let mut rows = Vec::new();
        for result in csv_reader.records() {
            let record = result?;
            let mut row = Row::with_capacity(headers.len());
            for (idx, name) in headers.iter().enumerate() {
                let value = match record.get(idx) {
                    Some(cell) if !self.null_config.is_null(cell) => CellValue::Text(cell.to_string()),
                    // Short records and null placeholders
                    _ => CellValue::Null,
                };
                row.insert(name.clone(), value);
            }
            rows.push(row);
        }

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_rows_with_nulls() {
        let data = "name,age,city\nAda,36,London\nBob,,Paris\nCy,41\n";
        let rows = CsvRowSource::new("inline.csv").read_rows(data.as_bytes()).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["age"], CellValue::Text("36".to_string()));
        assert!(rows[1]["age"].is_null());
        assert!(rows[2]["city"].is_null());
        let fields: Vec<_> = rows[0].keys().cloned().collect();
        assert_eq!(fields, vec!["name", "age", "city"]);
    }

    #[test]
    fn test_custom_null_patterns_and_delimiter() {
        let data = "a;b\nN/A;x\n";
        let rows = CsvRowSource::new("inline.csv")
            .with_delimiter(b';')
            .with_null_config(NullConfig::with_common_patterns())
            .read_rows(data.as_bytes())
            .unwrap();

        assert!(rows[0]["a"].is_null());
        assert_eq!(rows[0]["b"], CellValue::from("x"));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id,label").unwrap();
        writeln!(file, "1,first").unwrap();
        writeln!(file, "2,second").unwrap();

        let source = CsvRowSource::new(file.path());
        let rows = source.load().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["label"], CellValue::from("second"));
    }

    #[test]
    fn test_missing_file() {
        let err = CsvRowSource::new("/nonexistent/rows.csv").load().unwrap_err();
        assert!(matches!(err, DataError::Io(_)));
    }
}
