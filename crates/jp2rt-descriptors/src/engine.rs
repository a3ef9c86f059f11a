use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{DescriptorError, Result};
use crate::row::TsvRow;

/// A named group of descriptors computed together.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DescriptorFamily {
    pub name: String,
    pub descriptors: Vec<String>,
}

/// Computes descriptor vectors from molecular structures.
pub trait DescriptorEngine: Send + Sync {
    /// Descriptor values of one structure, in [`DescriptorEngine::families`]
    /// order.
    fn compute(&self, structure: &str) -> Result<Vec<f64>>;

    /// Descriptor families in computation order.
    fn families(&self) -> Result<Vec<DescriptorFamily>>;

    fn descriptor_count(&self) -> Result<usize> {
        Ok(self.families()?.iter().map(|f| f.descriptors.len()).sum())
    }

    /// Append descriptors to every non-empty line of `src`, writing the
    /// result to `dst` in input order. Returns the number of rows written.
    fn annotate_file(&self, src: &Path, dst: &Path) -> Result<usize> {
        let reader = BufReader::new(File::open(src).map_err(DescriptorError::io(src))?);
        let mut rows = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(DescriptorError::io(src))?;
            if line.trim_end_matches('\r').is_empty() {
                continue;
            }
            rows.push(TsvRow::parse(&line, index + 1)?);
        }
        log::info!("Computing descriptors of {} structures", rows.len());

        let lines = rows
            .par_iter()
            .map(|row| self.compute(row.structure()).map(|d| row.render(&d)))
            .collect::<Result<Vec<_>>>()?;

        let mut writer = BufWriter::new(File::create(dst).map_err(DescriptorError::io(dst))?);
        for line in &lines {
            writeln!(writer, "{}", line).map_err(DescriptorError::io(dst))?;
        }
        writer.flush().map_err(DescriptorError::io(dst))?;
        Ok(lines.len())
    }
}
