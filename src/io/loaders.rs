use std::fs::File;
use std::path::Path;

use polars::prelude::*;

use crate::core::error::{GapFixError, GapFixResult};

/// Supported on-disk dataset formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Parquet,
    Csv,
    Json,
}

impl TableFormat {
    /// Detect the format from a path's extension.
    ///
    /// Anything outside {parquet, csv, json} is [`GapFixError::UnsupportedFormat`],
    /// which is fatal for that file but lets a batch continue.
    pub fn from_path(path: &Path) -> GapFixResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "parquet" => Ok(TableFormat::Parquet),
            "csv" => Ok(TableFormat::Csv),
            "json" => Ok(TableFormat::Json),
            _ => Err(GapFixError::UnsupportedFormat(ext)),
        }
    }
}

/// Unified interface for reading and writing dataset tables.
pub struct TableLoader;

impl TableLoader {
    /// Load a table, auto-detecting the format from the extension.
    pub fn load(path: &Path) -> GapFixResult<DataFrame> {
        let format = TableFormat::from_path(path)?;
        Self::load_as(path, format)
    }

    /// Load a table in an explicit format.
    pub fn load_as(path: &Path, format: TableFormat) -> GapFixResult<DataFrame> {
        let result = match format {
            TableFormat::Parquet => File::open(path)
                .map_err(PolarsError::from)
                .and_then(|f| ParquetReader::new(f).finish()),
            TableFormat::Csv => CsvReadOptions::default()
                .with_has_header(true)
                .with_parse_options(CsvParseOptions::default().with_try_parse_dates(true))
                .try_into_reader_with_file_path(Some(path.into()))
                .and_then(|r| r.finish()),
            TableFormat::Json => File::open(path)
                .map_err(PolarsError::from)
                .and_then(|f| JsonReader::new(f).with_json_format(JsonFormat::Json).finish()),
        };
        result.map_err(|e| GapFixError::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Write a table back in the format matching the path's extension.
    pub fn write(path: &Path, df: &mut DataFrame) -> GapFixResult<()> {
        let format = TableFormat::from_path(path)?;
        Self::write_as(path, df, format)
    }

    /// Write a table in an explicit format.
    pub fn write_as(path: &Path, df: &mut DataFrame, format: TableFormat) -> GapFixResult<()> {
        let write_err = |e: String| GapFixError::Write {
            path: path.to_path_buf(),
            reason: e,
        };

        let mut file = File::create(path).map_err(|e| write_err(e.to_string()))?;
        match format {
            TableFormat::Parquet => {
                ParquetWriter::new(&mut file)
                    .finish(df)
                    .map_err(|e| write_err(e.to_string()))?;
            }
            TableFormat::Csv => {
                CsvWriter::new(&mut file)
                    .include_header(true)
                    .finish(df)
                    .map_err(|e| write_err(e.to_string()))?;
            }
            TableFormat::Json => {
                JsonWriter::new(&mut file)
                    .with_json_format(JsonFormat::Json)
                    .finish(df)
                    .map_err(|e| write_err(e.to_string()))?;
            }
        }
        Ok(())
    }
}
