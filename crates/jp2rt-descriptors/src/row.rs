//! Rows of a structure file: any number of leading fields followed by the
//! structure (SMILES) in the last field.

use jp2rt_models::io::format_value;

use crate::error::{DescriptorError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsvRow {
    extra: Vec<String>,
    structure: String,
}

impl TsvRow {
    /// Split `line` on tabs. Trailing empty fields are ignored; `number` is
    /// the 1-based line number reported when the structure is blank.
    pub fn parse(line: &str, number: usize) -> Result<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let mut fields: Vec<&str> = line.split('\t').collect();
        while fields.last().is_some_and(|f| f.is_empty()) {
            fields.pop();
        }
        let structure = match fields.pop() {
            Some(s) if !s.trim().is_empty() => s.to_string(),
            _ => return Err(DescriptorError::BlankStructure { line: number }),
        };
        Ok(Self {
            extra: fields.into_iter().map(str::to_string).collect(),
            structure,
        })
    }

    pub fn extra(&self) -> &[String] {
        &self.extra
    }

    pub fn structure(&self) -> &str {
        &self.structure
    }

    /// `extra...\tstructure\td1\t...\tdn`
    pub fn render(&self, descriptors: &[f64]) -> String {
        let mut out = String::new();
        for field in &self.extra {
            out.push_str(field);
            out.push('\t');
        }
        out.push_str(&self.structure);
        for value in descriptors {
            out.push('\t');
            out.push_str(&format_value(*value));
        }
        out
    }
}
