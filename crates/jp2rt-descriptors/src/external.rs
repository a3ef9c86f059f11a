//! Descriptor engine backed by an external program.
//!
//! The program is invoked as `<command> --list-descriptors` to list the
//! descriptor families and as `<command> <src> <dst>` to annotate a file of
//! structures, appending the descriptor values to every line.

use std::ffi::OsStr;
use std::fs;
use std::path::Path;
use std::process::Command;

use crate::engine::{DescriptorEngine, DescriptorFamily};
use crate::error::{DescriptorError, Result};

/// Environment variable holding the engine command line.
pub const ENGINE_ENV: &str = "JP2RT_DESCRIPTOR_ENGINE";

const LIST_FLAG: &str = "--list-descriptors";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalEngine {
    program: String,
    args: Vec<String>,
}

impl ExternalEngine {
    /// Engine running the whitespace separated `command_line`.
    pub fn new(command_line: &str) -> Result<Self> {
        let mut words = command_line.split_whitespace().map(str::to_string);
        let program = words.next().ok_or(DescriptorError::NotConfigured(ENGINE_ENV))?;
        Ok(Self {
            program,
            args: words.collect(),
        })
    }

    pub fn from_env() -> Result<Self> {
        match std::env::var(ENGINE_ENV) {
            Ok(command_line) => Self::new(&command_line),
            Err(_) => Err(DescriptorError::NotConfigured(ENGINE_ENV)),
        }
    }

    /// The explicitly given command line, falling back to the environment.
    pub fn resolve(command_line: Option<&str>) -> Result<Self> {
        match command_line {
            Some(command_line) => Self::new(command_line),
            None => Self::from_env(),
        }
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run the program with `extra` arguments and return its stdout.
    fn run<I, S>(&self, extra: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        log::debug!("Running descriptor engine: {}", self.command_line());
        let output = Command::new(&self.program)
            .args(&self.args)
            .args(extra)
            .output()
            .map_err(DescriptorError::io(&self.program))?;
        if !output.status.success() {
            return Err(DescriptorError::Engine {
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Parse the family listing printed by `--list-descriptors`.
pub fn parse_listing(text: &str) -> Result<Vec<DescriptorFamily>> {
    let mut families: Vec<DescriptorFamily> = Vec::new();
    for line in text.lines().map(|l| l.trim_end_matches('\r')) {
        if line.trim().is_empty() {
            continue;
        }
        match line.strip_prefix('\t') {
            Some(entry) => {
                let (number, name) = entry
                    .split_once(": ")
                    .filter(|(n, _)| n.trim().parse::<usize>().is_ok())
                    .ok_or_else(|| DescriptorError::Parse(format!("bad descriptor line '{}'", line)))?;
                let family = families.last_mut().ok_or_else(|| {
                    DescriptorError::Parse(format!("descriptor {} listed before any family", number))
                })?;
                family.descriptors.push(name.to_string());
            }
            None => families.push(DescriptorFamily {
                name: line.trim().to_string(),
                descriptors: Vec::new(),
            }),
        }
    }
    Ok(families)
}

/// Descriptor values following the structure on an annotated line.
fn parse_values(line: &str) -> Result<Vec<f64>> {
    line.split('\t')
        .skip(1)
        .map(|field| {
            field
                .trim()
                .parse::<f64>()
                .map_err(|_| DescriptorError::Parse(format!("'{}' is not a number", field)))
        })
        .collect()
}

impl DescriptorEngine for ExternalEngine {
    fn compute(&self, structure: &str) -> Result<Vec<f64>> {
        if structure.trim().is_empty() {
            return Err(DescriptorError::BlankStructure { line: 1 });
        }
        let dir = tempfile::tempdir().map_err(DescriptorError::io(std::env::temp_dir()))?;
        let src = dir.path().join("structure.tsv");
        let dst = dir.path().join("descriptors.tsv");
        fs::write(&src, format!("{}\n", structure)).map_err(DescriptorError::io(&src))?;

        self.run([src.as_os_str(), dst.as_os_str()])?;
        let annotated = fs::read_to_string(&dst).map_err(DescriptorError::io(&dst))?;
        let line = annotated
            .lines()
            .find(|l| !l.trim().is_empty())
            .ok_or_else(|| DescriptorError::Parse("engine wrote no output".to_string()))?;
        parse_values(line)
    }

    fn families(&self) -> Result<Vec<DescriptorFamily>> {
        parse_listing(&self.run([LIST_FLAG])?)
    }

    /// Hand the whole file to the program in a single invocation.
    fn annotate_file(&self, src: &Path, dst: &Path) -> Result<usize> {
        log::info!("Computing descriptors of {} with {}", src.display(), self.program);
        self.run([src.as_os_str(), dst.as_os_str()])?;
        let annotated = fs::read_to_string(dst).map_err(DescriptorError::io(dst))?;
        Ok(annotated.lines().filter(|l| !l.trim().is_empty()).count())
    }
}
