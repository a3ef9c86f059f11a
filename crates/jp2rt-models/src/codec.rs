//! Versioned model archives.
//!
//! A `.jp2rt` file is a deflated zip archive holding, under a directory named
//! after the file stem, a `MANIFEST.txt` with `Key: Value` lines and the
//! bincode-encoded [`Pipeline`]. Loading validates the manifest before the
//! model bytes are decoded and refuses archives written by a newer manifest
//! format or a newer release of this crate.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{ManifestError, ModelError, Result};
use crate::pipeline::Pipeline;
use crate::version::Version;

pub const MANIFEST_VERSION: &str = "1.0";
pub const TOOL_NAME: &str = "JP2RT";
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const ARCHIVE_EXTENSION: &str = "jp2rt";

pub const MANIFEST_VERSION_KEY: &str = "Manifest-Version";
pub const TOOL_VERSION_KEY: &str = "JP2RT-Version";

const MANIFEST_ENTRY: &str = "MANIFEST.txt";
const MODEL_ENTRY: &str = "model.bincode";

/// Ordered `Key: Value` metadata stored next to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<(String, String)>,
}

impl Manifest {
    /// Manifest written by this build.
    pub fn current() -> Self {
        Self {
            entries: vec![
                (MANIFEST_VERSION_KEY.to_string(), MANIFEST_VERSION.to_string()),
                (TOOL_VERSION_KEY.to_string(), TOOL_VERSION.to_string()),
            ],
        }
    }

    /// Parse `Key: Value` lines up to the first blank line.
    pub fn parse(text: &str) -> std::result::Result<Self, ManifestError> {
        let mut entries = Vec::new();
        for line in text.lines() {
            if line.trim().is_empty() {
                break;
            }
            let (key, value) = line
                .split_once(':')
                .ok_or_else(|| ManifestError::MalformedLine(line.to_string()))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(ManifestError::MalformedLine(line.to_string()));
            }
            entries.push((key.to_string(), value.trim().to_string()));
        }
        Ok(Self { entries })
    }

    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{}: {}\n", k, v))
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn version(&self, key: &str) -> std::result::Result<Option<Version>, ManifestError> {
        self.get(key)
            .map(|value| {
                value
                    .parse::<Version>()
                    .map_err(|_| ManifestError::UnparseableVersion {
                        key: key.to_string(),
                        value: value.to_string(),
                    })
            })
            .transpose()
    }

    /// Check both mandatory versions against the given supported ones.
    pub fn validate_against(
        &self,
        manifest_version: &Version,
        tool_version: &Version,
    ) -> std::result::Result<(), ManifestError> {
        let found = self
            .version(MANIFEST_VERSION_KEY)?
            .ok_or(ManifestError::MissingManifestVersion)?;
        if &found > manifest_version {
            return Err(ManifestError::ManifestVersionTooHigh {
                found,
                supported: manifest_version.clone(),
            });
        }

        let found = self
            .version(TOOL_VERSION_KEY)?
            .ok_or_else(|| ManifestError::MissingToolVersion(TOOL_VERSION_KEY.to_string()))?;
        if &found > tool_version {
            return Err(ManifestError::ToolVersionTooHigh {
                found,
                supported: tool_version.clone(),
            });
        }
        Ok(())
    }

    /// Check the manifest against the versions of this build.
    pub fn validate(&self) -> std::result::Result<(), ManifestError> {
        self.validate_against(&supported_manifest_version()?, &supported_tool_version()?)
    }
}

fn supported_manifest_version() -> std::result::Result<Version, ManifestError> {
    MANIFEST_VERSION
        .parse()
        .map_err(|_| ManifestError::UnparseableVersion {
            key: MANIFEST_VERSION_KEY.to_string(),
            value: MANIFEST_VERSION.to_string(),
        })
}

fn supported_tool_version() -> std::result::Result<Version, ManifestError> {
    TOOL_VERSION
        .parse()
        .map_err(|_| ManifestError::UnparseableVersion {
            key: TOOL_VERSION_KEY.to_string(),
            value: TOOL_VERSION.to_string(),
        })
}

/// The path a model saved or loaded as `path` actually lives at.
pub fn archive_path<P: AsRef<Path>>(path: P) -> PathBuf {
    path.as_ref().with_extension(ARCHIVE_EXTENSION)
}

fn archive_stem(archive: &Path) -> String {
    archive
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string())
}

/// Save `pipeline` to `<path>.jp2rt` and return the archive size in bytes.
///
/// The archive is assembled in a temporary file next to the destination and
/// renamed into place once complete.
pub fn save<P: AsRef<Path>>(pipeline: &Pipeline, path: P) -> Result<u64> {
    let archive = archive_path(&path);
    let stem = archive_stem(&archive);
    let payload = bincode::serialize(pipeline)?;

    let dir = match archive.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    {
        let mut zip = ZipWriter::new(tmp.as_file_mut());
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        zip.start_file(format!("{}/{}", stem, MANIFEST_ENTRY), options)?;
        zip.write_all(Manifest::current().render().as_bytes())?;
        zip.start_file(format!("{}/{}", stem, MODEL_ENTRY), options)?;
        zip.write_all(&payload)?;
        zip.finish()?;
    }
    tmp.as_file().sync_all()?;
    let written = tmp.as_file().metadata()?.len();
    tmp.persist(&archive).map_err(|e| e.error)?;

    log::info!("Model saved to {} ({} bytes)", archive.display(), written);
    Ok(written)
}

/// Directory inside the archive that holds the manifest: the file stem, or
/// the only directory with a manifest when the file was renamed.
fn locate_prefix(zip: &ZipArchive<File>, stem: &str) -> std::result::Result<String, ManifestError> {
    let wanted = format!("{}/{}", stem, MANIFEST_ENTRY);
    if zip.file_names().any(|name| name == wanted) {
        return Ok(stem.to_string());
    }
    let mut candidates = zip.file_names().filter_map(|name| {
        name.strip_suffix(MANIFEST_ENTRY)
            .and_then(|p| p.strip_suffix('/'))
            .filter(|p| !p.contains('/'))
    });
    match (candidates.next(), candidates.next()) {
        (Some(prefix), None) => Ok(prefix.to_string()),
        _ => Err(ManifestError::MissingEntry(wanted)),
    }
}

fn read_entry(zip: &mut ZipArchive<File>, name: &str) -> Result<Vec<u8>> {
    let mut entry = match zip.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(ModelError::InvalidModel(ManifestError::MissingEntry(
                name.to_string(),
            )))
        }
        Err(e) => return Err(e.into()),
    };
    let mut buf = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut buf)?;
    Ok(buf)
}

/// Load a pipeline from `<path>.jp2rt`, validating its manifest first.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Pipeline> {
    let archive = archive_path(&path);
    let stem = archive_stem(&archive);
    let mut zip = ZipArchive::new(File::open(&archive)?)?;

    let prefix = locate_prefix(&zip, &stem)?;
    let manifest_bytes = read_entry(&mut zip, &format!("{}/{}", prefix, MANIFEST_ENTRY))?;
    let text = String::from_utf8_lossy(&manifest_bytes);
    let manifest = Manifest::parse(&text)?;
    manifest.validate()?;
    log::debug!(
        "Manifest of {} accepted ({} {})",
        archive.display(),
        TOOL_VERSION_KEY,
        manifest.get(TOOL_VERSION_KEY).unwrap_or_default()
    );

    let payload = read_entry(&mut zip, &format!("{}/{}", prefix, MODEL_ENTRY))?;
    let pipeline: Pipeline = bincode::deserialize(&payload)?;
    log::info!(
        "Loaded {} model from {}",
        pipeline.regressor_name(),
        archive.display()
    );
    Ok(pipeline)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    #[test]
    fn test_current_manifest_text() {
        let text = Manifest::current().render();
        assert_eq!(
            text,
            format!("Manifest-Version: 1.0\nJP2RT-Version: {}\n", TOOL_VERSION)
        );
        assert!(Manifest::parse(&text).unwrap().validate().is_ok());
    }

    #[test]
    fn test_parse_stops_at_blank_line() {
        let m = Manifest::parse("A: 1\nB:2\n\nC: 3\n").unwrap();
        assert_eq!(m.get("A"), Some("1"));
        assert_eq!(m.get("B"), Some("2"));
        assert_eq!(m.get("C"), None);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(
            Manifest::parse("Manifest-Version 1.0\n"),
            Err(ManifestError::MalformedLine("Manifest-Version 1.0".to_string()))
        );
        assert!(Manifest::parse(": 1.0\n").is_err());
    }

    #[test]
    fn test_validation_order_and_variants() {
        let supported = (v("1.0"), v("0.3.0"));
        let check = |text: &str| {
            Manifest::parse(text)
                .unwrap()
                .validate_against(&supported.0, &supported.1)
        };

        assert_eq!(check("JP2RT-Version: 0.1\n"), Err(ManifestError::MissingManifestVersion));
        assert_eq!(
            check("Manifest-Version: 1.0\n"),
            Err(ManifestError::MissingToolVersion("JP2RT-Version".to_string()))
        );
        assert!(matches!(
            check("Manifest-Version: 1.1\nJP2RT-Version: 9.9\n"),
            Err(ManifestError::ManifestVersionTooHigh { .. })
        ));
        assert!(matches!(
            check("Manifest-Version: 1\nJP2RT-Version: 0.3.1\n"),
            Err(ManifestError::ToolVersionTooHigh { .. })
        ));
        assert!(matches!(
            check("Manifest-Version: one\nJP2RT-Version: 0.3.0\n"),
            Err(ManifestError::UnparseableVersion { .. })
        ));
        assert_eq!(check("Manifest-Version: 1.0\nJP2RT-Version: 0.2.2\n"), Ok(()));
        assert_eq!(check("Manifest-Version: 1.0\nJP2RT-Version: 0.3.0-alpha\n"), Ok(()));
    }

    #[test]
    fn test_post_release_archives_are_too_new() {
        let supported = (v("1.0"), v("0.3.0"));
        let check = |text: &str| {
            Manifest::parse(text)
                .unwrap()
                .validate_against(&supported.0, &supported.1)
        };
        assert!(matches!(
            check("Manifest-Version: 1.0\nJP2RT-Version: 0.3.0post1\n"),
            Err(ManifestError::ToolVersionTooHigh { .. })
        ));
        assert!(matches!(
            check("Manifest-Version: 1.0.post1\nJP2RT-Version: 0.3.0\n"),
            Err(ManifestError::ManifestVersionTooHigh { .. })
        ));
        assert!(matches!(
            check("Manifest-Version: 1.0\nJP2RT-Version: 0.3.0-final\n"),
            Err(ManifestError::UnparseableVersion { .. })
        ));
    }

    #[test]
    fn test_archive_path() {
        assert_eq!(archive_path("out/model"), PathBuf::from("out/model.jp2rt"));
        assert_eq!(archive_path("out/model.jp2rt"), PathBuf::from("out/model.jp2rt"));
        assert_eq!(archive_path("m.joblib"), PathBuf::from("m.jp2rt"));
    }
}
