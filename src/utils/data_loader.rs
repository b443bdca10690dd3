//! CSV loading and saving

use crate::error::{Result, TissueError};
use polars::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// CSV loader for the raw diagnostic table
#[derive(Debug, Clone)]
pub struct DataLoader {
    delimiter: u8,
    /// Rows read to infer column types
    infer_schema_length: usize,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            infer_schema_length: 100,
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = rows;
        self
    }

    /// Load a CSV file with a header row
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| TissueError::DataError(format!("{}: {}", path.display(), e)))?;

        let parse_opts = CsvParseOptions::default().with_separator(self.delimiter);

        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| TissueError::DataError(e.to_string()))
    }

    /// Header and row count without parsing the values
    pub fn get_file_info(&self, path: impl AsRef<Path>) -> Result<FileInfo> {
        let path = path.as_ref();
        let file_size = std::fs::metadata(path)?.len();

        let reader = BufReader::new(File::open(path)?);
        let mut lines = reader.lines();

        let header = lines.next().transpose()?.unwrap_or_default();
        let separator = self.delimiter as char;
        let columns: Vec<String> = header
            .split(separator)
            .map(|s| s.trim().trim_matches('"').to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let mut n_rows = 0;
        for line in lines {
            if !line?.trim().is_empty() {
                n_rows += 1;
            }
        }

        Ok(FileInfo {
            path: path.display().to_string(),
            file_size,
            n_rows,
            n_cols: columns.len(),
            columns,
        })
    }
}

/// File information
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub path: String,
    pub file_size: u64,
    pub n_rows: usize,
    pub n_cols: usize,
    pub columns: Vec<String>,
}

/// Save a DataFrame as CSV
pub struct DataSaver;

impl DataSaver {
    pub fn save_csv(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        CsvWriter::new(&mut file)
            .finish(df)
            .map_err(|e| TissueError::DataError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv() -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "id,diagnosis,radius_mean,texture_mean,Unnamed: 32").unwrap();
        writeln!(file, "1,M,17.99,10.38,").unwrap();
        writeln!(file, "2,B,13.54,14.36,").unwrap();
        writeln!(file, "3,B,12.45,15.70,").unwrap();
        file
    }

    #[test]
    fn test_load_csv() {
        let file = create_test_csv();
        let df = DataLoader::new().load_csv(file.path()).unwrap();

        assert_eq!(df.height(), 3);
        assert_eq!(df.width(), 5);
        assert_eq!(df.column("radius_mean").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("Unnamed: 32").unwrap().null_count(), 3);
    }

    #[test]
    fn test_missing_file() {
        let err = DataLoader::new().load_csv("/nonexistent/data.csv").unwrap_err();
        assert!(matches!(err, TissueError::DataError(_)));
    }

    #[test]
    fn test_get_file_info() {
        let file = create_test_csv();
        let info = DataLoader::new().get_file_info(file.path()).unwrap();

        assert_eq!(info.n_rows, 3);
        assert_eq!(info.n_cols, 5);
        assert_eq!(info.columns[1], "diagnosis");
    }

    #[test]
    fn test_save_and_reload() {
        let mut df = df!(
            "diagnosis" => &["M", "B", "B"],
            "radius_mean" => &[17.99, 13.54, 12.45]
        )
        .unwrap();

        let file = NamedTempFile::new().unwrap();
        DataSaver::save_csv(&mut df, file.path()).unwrap();

        let loaded = DataLoader::new().load_csv(file.path()).unwrap();
        assert_eq!(loaded.shape(), (3, 2));
    }
}
