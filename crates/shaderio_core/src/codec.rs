// SPDX-License-Identifier: MIT OR Apache-2.0
//! Manifest encoding and decoding.
//!
//! Manifests are written as pretty RON by default, or as JSON when the file
//! extension asks for it. Decoding reads the format version first, so a file
//! from a newer writer is rejected before any other field is interpreted.

use crate::error::{DecodeError, Result, TransferError};
use crate::manifest::{Manifest, FORMAT_VERSION};
use crate::value::AttributeValue;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// On-disk syntax of a manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ManifestFormat {
    /// Rusty Object Notation
    #[default]
    Ron,
    /// JSON
    Json,
}

impl ManifestFormat {
    /// Pick the format from a file extension, if it names one
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "ron" => Some(Self::Ron),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Conventional file extension
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Ron => "ron",
            Self::Json => "json",
        }
    }
}

/// Only the version field, read before the full manifest.
///
/// A missing field reads as 0, which no writer emits.
#[derive(Deserialize)]
#[serde(rename = "Manifest")]
struct VersionProbe {
    #[serde(default)]
    format_version: u32,
}

/// JSON has no literal for infinities or NaN
fn ensure_finite(manifest: &Manifest) -> Result<()> {
    for node in &manifest.nodes {
        for (name, value) in &node.attributes {
            let finite = match value {
                AttributeValue::Float(x) => x.is_finite(),
                AttributeValue::Vector(xs) => xs.iter().all(|x| x.is_finite()),
                _ => true,
            };
            if !finite {
                return Err(TransferError::Encode(format!(
                    "{}.{name} holds a non-finite float, which JSON cannot represent",
                    node.name
                )));
            }
        }
    }
    Ok(())
}

/// Serialize a manifest
pub fn encode(manifest: &Manifest, format: ManifestFormat) -> Result<String> {
    match format {
        ManifestFormat::Ron => {
            let config = ron::ser::PrettyConfig::default()
                .struct_names(true)
                .enumerate_arrays(false);
            ron::ser::to_string_pretty(manifest, config)
                .map_err(|e| TransferError::Encode(e.to_string()))
        }
        ManifestFormat::Json => {
            ensure_finite(manifest)?;
            serde_json::to_string_pretty(manifest).map_err(|e| TransferError::Encode(e.to_string()))
        }
    }
}

/// Deserialize and validate a manifest
pub fn decode(bytes: &[u8], format: ManifestFormat) -> std::result::Result<Manifest, DecodeError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| DecodeError::Malformed(format!("not UTF-8: {e}")))?;

    let found = parse::<VersionProbe>(text, format)?.format_version;
    if found == 0 {
        return Err(DecodeError::Malformed("missing format_version".to_string()));
    }
    if found > FORMAT_VERSION {
        return Err(DecodeError::UnsupportedVersion {
            found,
            supported: FORMAT_VERSION,
        });
    }

    let manifest: Manifest = parse(text, format)?;
    manifest
        .validate()
        .map_err(|e| DecodeError::Malformed(e.to_string()))?;
    Ok(manifest)
}

fn parse<T>(text: &str, format: ManifestFormat) -> std::result::Result<T, DecodeError>
where
    T: for<'de> Deserialize<'de>,
{
    match format {
        ManifestFormat::Ron => ron::from_str(text).map_err(|e| DecodeError::Malformed(e.to_string())),
        ManifestFormat::Json => {
            serde_json::from_str(text).map_err(|e| DecodeError::Malformed(e.to_string()))
        }
    }
}

/// Write a manifest to `path`, replacing any existing file atomically.
///
/// The manifest is fully encoded before the file system is touched; on any
/// failure the destination is left as it was.
pub fn save(manifest: &Manifest, path: &Path, format: ManifestFormat) -> Result<()> {
    let content = encode(manifest, format)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(|e| TransferError::io(dir, e))?;
    file.write_all(content.as_bytes())
        .and_then(|()| file.as_file().sync_all())
        .map_err(|e| TransferError::io(file.path(), e))?;
    file.persist(path)
        .map_err(|e| TransferError::io(path, e.error))?;

    tracing::debug!("Wrote manifest to {}", path.display());
    Ok(())
}

/// Read and decode a manifest from `path`
pub fn load(path: &Path, default_format: ManifestFormat) -> Result<Manifest> {
    let bytes = std::fs::read(path).map_err(|e| TransferError::io(path, e))?;
    let format = ManifestFormat::from_path(path).unwrap_or(default_format);
    Ok(decode(&bytes, format)?)
}
