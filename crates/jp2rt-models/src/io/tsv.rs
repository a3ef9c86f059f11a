//! Headerless tab separated descriptor files.
//!
//! Every line is `<retention time>\t<extra fields...>\t<d1>\t...\t<dn>`. The
//! number of trailing descriptor columns is inferred from the first line and
//! must hold for every other line.
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use csv::StringRecord;
use ndarray::{Array1, Array2};

use crate::error::LoadError;

/// Descriptor matrix and retention times read from one file.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub x: Array2<f64>,
    pub y: Array1<f64>,
}

fn parse_cell(field: &str) -> f64 {
    field.trim().parse::<f64>().unwrap_or(f64::NAN)
}

fn is_numeric(field: &str) -> bool {
    field.trim().parse::<f64>().is_ok()
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> LoadError {
    let path = path.to_path_buf();
    move |source| LoadError::Io { path, source }
}

fn read_records(path: &Path) -> Result<Vec<StringRecord>, LoadError> {
    let file = File::open(path).map_err(io_error(path))?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(file);

    let records = reader
        .records()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
    if records.is_empty() {
        return Err(LoadError::Empty(path.to_path_buf()));
    }
    Ok(records)
}

fn line_of(record: &StringRecord, index: usize) -> usize {
    record
        .position()
        .map(|p| p.line() as usize)
        .unwrap_or(index + 1)
}

/// Number of trailing numeric fields of `record`. The leading field is the
/// retention time, so it never counts as a descriptor.
pub fn count_descriptors(record: &StringRecord) -> usize {
    let trailing = record.iter().rev().take_while(|f| is_numeric(f)).count();
    trailing.min(record.len().saturating_sub(1))
}

fn descriptor_matrix(path: &Path, records: &[StringRecord]) -> Result<Array2<f64>, LoadError> {
    let width = records[0].len();
    let n = count_descriptors(&records[0]);
    if n == 0 {
        return Err(LoadError::NoDescriptors(path.to_path_buf()));
    }

    let mut x = Array2::from_elem((records.len(), n), f64::NAN);
    for ((index, record), mut row) in records.iter().enumerate().zip(x.rows_mut()) {
        if record.len() != width {
            return Err(LoadError::InconsistentRow {
                line: line_of(record, index),
                expected: width,
                found: record.len(),
            });
        }
        for (cell, field) in row.iter_mut().zip(record.iter().skip(width - n)) {
            *cell = parse_cell(field);
        }
    }
    Ok(x)
}

fn target_vector(records: &[StringRecord]) -> Array1<f64> {
    records
        .iter()
        .map(|r| r.get(0).map_or(f64::NAN, parse_cell))
        .collect()
}

/// Load the trailing descriptor columns of every line.
pub fn load_descriptors<P: AsRef<Path>>(path: P) -> Result<Array2<f64>, LoadError> {
    let path = path.as_ref();
    let records = read_records(path)?;
    let x = descriptor_matrix(path, &records)?;
    log::debug!(
        "Read {} rows with {} descriptors from {}",
        x.nrows(),
        x.ncols(),
        path.display()
    );
    Ok(x)
}

/// Load the first column of every line.
pub fn load_retention_times<P: AsRef<Path>>(path: P) -> Result<Array1<f64>, LoadError> {
    let records = read_records(path.as_ref())?;
    Ok(target_vector(&records))
}

/// Load descriptors and retention times with a single read of `path`.
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<Dataset, LoadError> {
    let path = path.as_ref();
    let records = read_records(path)?;
    let x = descriptor_matrix(path, &records)?;
    let y = target_vector(&records);
    Ok(Dataset { x, y })
}

/// Float rendering shared by every file this workspace writes. Integral
/// values keep a trailing `.0` so they read back as floats.
pub fn format_value(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Write `prediction\t<original line>` for every non-blank line of `src`.
/// Source lines are copied byte for byte, terminators included.
pub fn write_predictions<P: AsRef<Path>, Q: AsRef<Path>>(
    src: P,
    dst: Q,
    predictions: &[f64],
) -> Result<usize, LoadError> {
    let (src, dst) = (src.as_ref(), dst.as_ref());

    let mut content = String::new();
    File::open(src)
        .and_then(|mut f| f.read_to_string(&mut content))
        .map_err(io_error(src))?;
    let lines: Vec<&str> = content
        .split_inclusive('\n')
        .filter(|l| !l.trim_end_matches(['\r', '\n']).is_empty())
        .collect();
    if lines.len() != predictions.len() {
        return Err(LoadError::RowCountMismatch {
            source_rows: lines.len(),
            predictions: predictions.len(),
        });
    }

    let mut writer = BufWriter::new(File::create(dst).map_err(io_error(dst))?);
    for (line, p) in lines.iter().zip(predictions) {
        write!(writer, "{}\t{}", format_value(*p), line).map_err(io_error(dst))?;
    }
    writer.flush().map_err(io_error(dst))?;
    Ok(lines.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(line: &str) -> StringRecord {
        StringRecord::from(line.split('\t').collect::<Vec<_>>())
    }

    #[test]
    fn test_count_descriptors() {
        assert_eq!(count_descriptors(&record("12.3\tfoo\t1.0\t2.0\t3.0")), 3);
        assert_eq!(count_descriptors(&record("12.3\t1.0\t2.0")), 2);
        assert_eq!(count_descriptors(&record("12.3\tfoo\tbar")), 0);
        assert_eq!(count_descriptors(&record("12.3\tC\tNaN\t1e-3")), 2);
        assert_eq!(count_descriptors(&record("x")), 0);
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(3.0), "3.0");
        assert_eq!(format_value(0.25), "0.25");
        assert_eq!(format_value(1e20), "100000000000000000000");
        assert_eq!(format_value(f64::NAN), "NaN");
    }
}
