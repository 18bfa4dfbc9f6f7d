//! Feature-matrix loading

use crate::error::{Result, ToolboxError};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Reads feature matrices from CSV, TSV, Parquet or JSON files
#[derive(Debug, Clone)]
pub struct DataLoader {
    /// Rows used to infer CSV column types
    infer_schema_length: usize,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self {
            infer_schema_length: 100,
        }
    }

    /// Set how many rows CSV type inference looks at
    pub fn with_infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = rows;
        self
    }

    /// Load a delimited file with a header row
    pub fn load_csv(&self, path: impl AsRef<Path>, delimiter: u8) -> Result<DataFrame> {
        let file = open(path.as_ref())?;

        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .with_parse_options(CsvParseOptions::default().with_separator(delimiter))
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| ToolboxError::DataError(e.to_string()))
    }

    /// Load a Parquet file
    pub fn load_parquet(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let file = open(path.as_ref())?;

        ParquetReader::new(file)
            .finish()
            .map_err(|e| ToolboxError::DataError(e.to_string()))
    }

    /// Load a JSON file
    pub fn load_json(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let file = open(path.as_ref())?;

        JsonReader::new(file)
            .finish()
            .map_err(|e| ToolboxError::DataError(e.to_string()))
    }

    /// Detect file format from extension and load; unknown extensions are
    /// read as CSV
    pub fn load_auto(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "tsv" => self.load_csv(path, b'\t'),
            "parquet" | "pq" => self.load_parquet(path),
            "json" => self.load_json(path),
            _ => self.load_csv(path, b','),
        }
    }
}

fn open(path: &Path) -> Result<File> {
    File::open(path)
        .map_err(|e| ToolboxError::DataError(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catboost::features::{ColumnKind, FeatureSchema};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_file(suffix: &str, contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(suffix)
            .tempfile()
            .unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    #[test]
    fn test_load_csv_infers_kinds() {
        let file = create_file(".csv", "age,country,income\n31,PT,1200.5\n45,ES,2300.0\n");
        let df = DataLoader::new().load_auto(file.path()).unwrap();

        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 3);
        assert_eq!(df.column_kind("age"), Some(ColumnKind::Numeric));
        assert_eq!(df.column_kind("country"), Some(ColumnKind::Categorical));
    }

    #[test]
    fn test_load_tsv() {
        let file = create_file(".tsv", "a\tb\n1\tx\n2\ty\n");
        let df = DataLoader::new().load_auto(file.path()).unwrap();
        assert_eq!(df.column_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_missing_file() {
        let err = DataLoader::new().load_auto("/nonexistent/data.csv").unwrap_err();
        assert!(matches!(err, ToolboxError::DataError(_)));
    }
}
