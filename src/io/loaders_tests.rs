use polars::prelude::*;

use super::loaders::{TableFormat, TableLoader};
use crate::core::error::GapFixError;
use crate::time::datetime_series_from_ms;

fn sample_df() -> DataFrame {
    let ms: Vec<i64> = (0..5).map(|i| i * 3_600_000).collect();
    DataFrame::new(vec![
        datetime_series_from_ms("timestamp", ms).into_column(),
        Series::new("value".into(), &[1.0f64, 2.0, 3.0, 4.0, 5.0]).into_column(),
        Series::new("label".into(), &["a", "b", "c", "d", "e"]).into_column(),
    ])
    .unwrap()
}

#[test]
fn format_detection_by_extension() {
    use std::path::Path;

    assert_eq!(
        TableFormat::from_path(Path::new("a.parquet")).unwrap(),
        TableFormat::Parquet
    );
    assert_eq!(
        TableFormat::from_path(Path::new("a.CSV")).unwrap(),
        TableFormat::Csv
    );
    assert_eq!(
        TableFormat::from_path(Path::new("a.json")).unwrap(),
        TableFormat::Json
    );
    assert!(matches!(
        TableFormat::from_path(Path::new("a.txt")),
        Err(GapFixError::UnsupportedFormat(_))
    ));
    assert!(matches!(
        TableFormat::from_path(Path::new("noext")),
        Err(GapFixError::UnsupportedFormat(_))
    ));
}

#[test]
fn parquet_round_trip_preserves_shape() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.parquet");

    let mut df = sample_df();
    TableLoader::write(&path, &mut df).unwrap();
    let back = TableLoader::load(&path).unwrap();

    assert_eq!(back.height(), 5);
    assert_eq!(back.width(), 3);
    assert!(back.column("timestamp").unwrap().dtype().is_temporal());
}

#[test]
fn csv_round_trip_keeps_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.csv");

    let mut df = sample_df();
    TableLoader::write(&path, &mut df).unwrap();
    let back = TableLoader::load(&path).unwrap();

    assert_eq!(back.height(), 5);
    let values: Vec<Option<f64>> = back
        .column("value")
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(values[4], Some(5.0));
}

#[test]
fn json_round_trip_keeps_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.json");

    let mut df = sample_df();
    TableLoader::write(&path, &mut df).unwrap();
    let back = TableLoader::load(&path).unwrap();

    assert_eq!(back.height(), 5);
    assert_eq!(back.width(), 3);
}

#[test]
fn load_of_missing_file_is_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = TableLoader::load(&dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, GapFixError::Load { .. }));
}
