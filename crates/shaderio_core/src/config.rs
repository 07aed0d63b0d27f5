// SPDX-License-Identifier: MIT OR Apache-2.0
//! Export and import settings.
//!
//! Settings are stored as RON. Every field has a default, so a config file
//! only needs to name what it changes.

use crate::codec::ManifestFormat;
use crate::error::{Result, TransferError};
use crate::manifest::DEFAULT_ROOT_TYPE;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current settings format version
pub const CONFIG_FORMAT_VERSION: u32 = 1;

/// Which connections graph capture follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Traversal {
    /// Only nodes feeding into the roots
    #[default]
    Upstream,
    /// Nodes on either side of every connection
    Both,
}

/// Settings for graph and assignment capture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureOptions {
    /// Node type of shading-network roots
    pub root_type: String,
    /// Node types never captured or traversed
    pub excluded_types: Vec<String>,
    /// Traversal direction
    pub traversal: Traversal,
    /// Store file paths relative to the manifest when the file lives beside it
    pub relative_paths: bool,
}

impl CaptureOptions {
    /// Check if a node type is excluded from capture
    pub fn is_excluded(&self, node_type: &str) -> bool {
        self.excluded_types.iter().any(|t| t == node_type)
    }
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            root_type: DEFAULT_ROOT_TYPE.to_string(),
            excluded_types: [
                "mesh",
                "transform",
                "nurbsSurface",
                "nurbsCurve",
                "materialInfo",
                "renderPartition",
                "lightLinker",
                "hyperLayout",
                "nodeGraphEditorInfo",
                "defaultShaderList",
                "defaultTextureList",
                "defaultRenderUtilityList",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            traversal: Traversal::Upstream,
            relative_paths: true,
        }
    }
}

/// What to do when a recorded root name already exists in the target scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConflictPolicy {
    /// Create everything, suffixing colliding names
    #[default]
    Rename,
    /// Leave networks whose root already exists alone
    Skip,
}

/// Settings for reconstruction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Root-name conflict handling
    pub conflict_policy: ConflictPolicy,
}

/// Complete tool settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderIoConfig {
    /// Settings format version
    pub version: u32,
    /// Capture settings
    pub capture: CaptureOptions,
    /// Import settings
    pub import: ImportOptions,
    /// Manifest syntax used when the path extension does not decide
    pub format: ManifestFormat,
}

impl Default for ShaderIoConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_FORMAT_VERSION,
            capture: CaptureOptions::default(),
            import: ImportOptions::default(),
            format: ManifestFormat::default(),
        }
    }
}

impl ShaderIoConfig {
    /// Parse settings from RON text
    pub fn from_ron(s: &str) -> Result<Self> {
        let config: Self = ron::from_str(s).map_err(|e| TransferError::Config(e.to_string()))?;

        // Version check
        if config.version > CONFIG_FORMAT_VERSION {
            return Err(TransferError::Config(format!(
                "Config version {} is newer than supported version {}",
                config.version, CONFIG_FORMAT_VERSION
            )));
        }
        if config.capture.root_type.is_empty() {
            return Err(TransferError::Config("root_type must not be empty".to_string()));
        }

        Ok(config)
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| TransferError::io(path, e))?;
        Self::from_ron(&content)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);

        let content = ron::ser::to_string_pretty(self, config)
            .map_err(|e| TransferError::Config(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| TransferError::io(path, e))
    }
}
