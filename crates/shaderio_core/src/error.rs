// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error and warning types shared by export and import.

use crate::record::NodeId;
use crate::report::ImportReport;
use crate::scene::SceneError;
use std::fmt;
use std::path::PathBuf;

/// A manifest could not be decoded. Fatal to the operation.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The manifest was written by a newer format version
    #[error("Manifest format version {found} is not supported (supported: {supported})")]
    UnsupportedVersion {
        /// Version found in the file
        found: u32,
        /// Highest version this build reads
        supported: u32,
    },

    /// The manifest is syntactically or structurally invalid
    #[error("Malformed manifest: {0}")]
    Malformed(String),
}

/// A recorded reference that does not resolve during import.
///
/// Non-fatal: the single attribute, connection or target is skipped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UnresolvedReference {
    /// No live node exists for a recorded node id
    #[error("Node {id} was not reconstructed ({context})")]
    Node {
        /// Recorded node id
        id: NodeId,
        /// What needed the node
        context: String,
    },

    /// A mesh named in an assignment is not in the target scene
    #[error("Mesh not found: {0}")]
    Mesh(String),

    /// A referenced file could not be located
    #[error("File not found for {node}.{attribute}: {path}")]
    File {
        /// Node name in the manifest
        node: String,
        /// Attribute holding the path
        attribute: String,
        /// Recorded path
        path: String,
    },
}

/// A problem that skipped part of an operation without aborting it
#[derive(Debug, Clone, PartialEq)]
pub enum TransferWarning {
    /// A root that is not of the configured root type captured nothing
    UnsupportedRoot {
        /// Root node name
        name: String,
        /// Its actual type
        node_type: String,
    },
    /// A node vanished or was invalid during traversal
    InvalidNode(String),
    /// A recorded reference did not resolve on import
    Unresolved(UnresolvedReference),
    /// A host call failed for one sub-step
    Scene {
        /// The sub-step that failed
        step: String,
        /// Error reported by the host
        error: SceneError,
    },
    /// A network was not reconstructed because its root already exists
    NetworkSkipped {
        /// Root name that already exists
        name: String,
    },
}

impl fmt::Display for TransferWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedRoot { name, node_type } => {
                write!(f, "{name} has unsupported root type {node_type}; nothing captured")
            }
            Self::InvalidNode(what) => write!(f, "Skipped invalid node: {what}"),
            Self::Unresolved(reference) => write!(f, "{reference}"),
            Self::Scene { step, error } => write!(f, "{step} failed: {error}"),
            Self::NetworkSkipped { name } => write!(f, "{name} already exists; network skipped"),
        }
    }
}

impl From<UnresolvedReference> for TransferWarning {
    fn from(reference: UnresolvedReference) -> Self {
        Self::Unresolved(reference)
    }
}

/// A generated procedure could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Procedure line {line}: {message}")]
pub struct ProcedureError {
    /// 1-based line number
    pub line: usize,
    /// What was wrong with the line
    pub message: String,
}

/// Fatal error of one export or import
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// Manifest decoding failed
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A generated procedure could not be parsed
    #[error(transparent)]
    Procedure(#[from] ProcedureError),

    /// Manifest encoding failed
    #[error("Failed to encode manifest: {0}")]
    Encode(String),

    /// File system error
    #[error("I/O error on {path:?}: {source}")]
    Io {
        /// File being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Export was requested with nothing usable selected
    #[error("Nothing to export: {0}")]
    NothingSelected(String),

    /// The caller cancelled the operation between steps
    #[error("Operation cancelled")]
    Cancelled,

    /// An import was cancelled part way; the report covers what was applied
    #[error("Import cancelled after creating {} nodes", .0.nodes_created())]
    ImportCancelled(Box<ImportReport>),

    /// The configuration file is invalid
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl TransferError {
    /// Wrap an I/O error with the path it concerns
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for export and import operations
pub type Result<T> = std::result::Result<T, TransferError>;
