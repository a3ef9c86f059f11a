//! Integration tests for descriptor file loading and prediction output.

use std::path::PathBuf;

use jp2rt_models::io::{load_dataset, load_descriptors, load_retention_times, write_predictions};
use jp2rt_models::LoadError;

fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[test]
fn trailing_numeric_fields_are_descriptors() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "d.tsv", "12.3\tfoo\t1.0\t2.0\t3.0\n4.5\tbar\t4.0\t5.0\t6.0\n");

    let x = load_descriptors(&path).unwrap();
    assert_eq!(x.shape(), &[2, 3]);
    assert_eq!(x.row(0).to_vec(), vec![1.0, 2.0, 3.0]);
    assert_eq!(x.row(1).to_vec(), vec![4.0, 5.0, 6.0]);

    let y = load_retention_times(&path).unwrap();
    assert_eq!(y.to_vec(), vec![12.3, 4.5]);
}

#[test]
fn unparseable_cells_become_missing() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "d.tsv", "1.0\tC\t1.0\t2.0\n2.0\tCC\tNA\t\n");
    let data = load_dataset(&path).unwrap();
    assert_eq!(data.x.shape(), &[2, 2]);
    assert!(data.x[[1, 0]].is_nan());
    assert!(data.x[[1, 1]].is_nan());
    assert_eq!(data.y.to_vec(), vec![1.0, 2.0]);
}

#[test]
fn unparseable_retention_time_is_nan() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "d.tsv", "rt\tC\t1.0\n");
    let y = load_retention_times(&path).unwrap();
    assert!(y[0].is_nan());
}

#[test]
fn row_width_is_checked() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "d.tsv", "1.0\tC\t1.0\t2.0\n2.0\tCC\t3.0\n");
    match load_descriptors(&path) {
        Err(LoadError::InconsistentRow {
            line,
            expected,
            found,
        }) => {
            assert_eq!(line, 2);
            assert_eq!(expected, 4);
            assert_eq!(found, 3);
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn empty_and_descriptorless_files_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let empty = write(&dir, "empty.tsv", "");
    assert!(matches!(load_descriptors(&empty), Err(LoadError::Empty(_))));

    let no_desc = write(&dir, "names.tsv", "1.0\tfoo\tbar\n");
    assert!(matches!(
        load_descriptors(&no_desc),
        Err(LoadError::NoDescriptors(_))
    ));

    let missing = dir.path().join("missing.tsv");
    assert!(matches!(load_descriptors(&missing), Err(LoadError::Io { .. })));
}

// ---------------------------------------------------------------------------
// Writing predictions
// ---------------------------------------------------------------------------

#[test]
fn predictions_are_prepended_to_source_lines() {
    let dir = tempfile::tempdir().unwrap();
    let src = write(&dir, "src.tsv", "a\tCCO\t1.0\nb\tCCC\t2.0\n");
    let dst = dir.path().join("dst.tsv");

    let n = write_predictions(&src, &dst, &[1.5, 2.25]).unwrap();
    assert_eq!(n, 2);
    assert_eq!(
        std::fs::read_to_string(&dst).unwrap(),
        "1.5\ta\tCCO\t1.0\n2.25\tb\tCCC\t2.0\n"
    );
}

#[test]
fn prediction_count_must_match_lines() {
    let dir = tempfile::tempdir().unwrap();
    let src = write(&dir, "src.tsv", "a\t1.0\nb\t2.0\n");
    let dst = dir.path().join("dst.tsv");
    assert!(matches!(
        write_predictions(&src, &dst, &[1.0]),
        Err(LoadError::RowCountMismatch {
            source_rows: 2,
            predictions: 1
        })
    ));
    assert!(!dst.exists());
}

#[test]
fn integral_predictions_keep_a_decimal_point() {
    let dir = tempfile::tempdir().unwrap();
    let src = write(&dir, "src.tsv", "a\tCCO\t1.0\n\nb\tCCC\t2.0\n");
    let dst = dir.path().join("dst.tsv");

    write_predictions(&src, &dst, &[3.0, 0.5]).unwrap();
    assert_eq!(
        std::fs::read_to_string(&dst).unwrap(),
        "3.0\ta\tCCO\t1.0\n0.5\tb\tCCC\t2.0\n"
    );
}

#[test]
fn source_line_endings_are_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let src = write(&dir, "src.tsv", "a\tCCO\t1.0\r\nb\tCCC\t2.0\r\nc\tC\t3.0");
    let dst = dir.path().join("dst.tsv");

    let n = write_predictions(&src, &dst, &[1.5, 2.0, 7.25]).unwrap();
    assert_eq!(n, 3);
    assert_eq!(
        std::fs::read_to_string(&dst).unwrap(),
        "1.5\ta\tCCO\t1.0\r\n2.0\tb\tCCC\t2.0\r\n7.25\tc\tC\t3.0"
    );
}
