//! Integration tests for wind rose rendering.

use chrono::NaiveDateTime;
use tempfile::TempDir;

use windrose_core::chart::{ChartOptions, plot_windrose};
use windrose_core::error::WindroseError;
use windrose_core::model::{DATETIME_FORMAT, ForecastRecord, ForecastTable};

fn record(datetime: &str, speed: f64, direction: f64) -> ForecastRecord {
    ForecastRecord {
        datetime: NaiveDateTime::parse_from_str(datetime, DATETIME_FORMAT).unwrap(),
        speed,
        direction,
    }
}

fn sample_table() -> ForecastTable {
    vec![
        record("2026-08-29 12:00:00", 1.2, 10.0),
        record("2026-08-29 15:00:00", 3.4, 95.0),
        record("2026-08-29 18:00:00", 5.6, 180.0),
        record("2026-08-29 21:00:00", 2.1, 270.0),
        record("2026-08-30 00:00:00", 7.8, 350.0),
    ]
    .into_iter()
    .collect()
}

#[test]
fn renders_png_into_output_directory() {
    let dir = TempDir::new().unwrap();
    let options = ChartOptions {
        output_dir: dir.path().join("plots"),
        show_chart: false,
    };

    let path = plot_windrose(&sample_table(), "München", &options).unwrap();

    assert!(path.exists());
    let meta = std::fs::metadata(&path).unwrap();
    assert!(meta.len() > 0);

    let name = path.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("windrose_München_"));
    assert!(name.contains("29.08.2026_12-00"));
    assert!(name.contains("30.08.2026_00-00"));
    assert!(name.ends_with(".png"));
}

#[test]
fn rendering_twice_overwrites_the_same_file() {
    let dir = TempDir::new().unwrap();
    let options = ChartOptions {
        output_dir: dir.path().to_path_buf(),
        show_chart: false,
    };
    let table = sample_table();

    let first = plot_windrose(&table, "Berlin", &options).unwrap();
    let second = plot_windrose(&table, "Berlin", &options).unwrap();

    assert_eq!(first, second);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn label_with_separators_is_sanitized_in_the_filename() {
    let dir = TempDir::new().unwrap();
    let options = ChartOptions {
        output_dir: dir.path().to_path_buf(),
        show_chart: false,
    };

    let path = plot_windrose(&sample_table(), "Lat 52.4000, Lon 13.0667", &options).unwrap();

    let name = path.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("windrose_Lat_52.4000__Lon_13.0667_"));
    assert!(!name.contains(' '));
    assert!(!name.contains(','));
}

#[test]
fn unwritable_output_directory_reports_the_path() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not_a_dir");
    std::fs::write(&blocker, "plain file").unwrap();

    let options = ChartOptions {
        output_dir: blocker.join("plots"),
        show_chart: false,
    };
    let err = plot_windrose(&sample_table(), "Berlin", &options).unwrap_err();

    match err {
        WindroseError::OutputDirCreation(path, _) => {
            assert_eq!(path, blocker.join("plots"));
        }
        other => panic!("expected OutputDirCreation, got {other:?}"),
    }
}

#[test]
fn empty_table_fails_before_touching_the_filesystem() {
    let dir = TempDir::new().unwrap();
    let output_dir = dir.path().join("plots");
    let options = ChartOptions {
        output_dir: output_dir.clone(),
        show_chart: false,
    };

    let err = plot_windrose(&ForecastTable::default(), "Berlin", &options).unwrap_err();

    assert!(matches!(err, WindroseError::EmptyData));
    assert!(!output_dir.exists());
}
