// SPDX-License-Identifier: MIT OR Apache-2.0
//! Results returned to the caller after an export or import.

use crate::error::TransferWarning;
use crate::record::NodeId;
use indexmap::IndexMap;
use std::fmt;
use std::path::PathBuf;

/// Outcome of an export
#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    /// File the manifest was written to
    pub path: Option<PathBuf>,
    /// Number of captured nodes
    pub nodes: usize,
    /// Number of captured connections
    pub connections: usize,
    /// Number of captured assignment targets
    pub targets: usize,
    /// Skipped roots and nodes
    pub warnings: Vec<TransferWarning>,
}

/// Outcome of an import
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    /// Scene name given to each reconstructed node
    pub created: IndexMap<NodeId, String>,
    /// Attributes set successfully
    pub attributes_applied: usize,
    /// Connections made successfully
    pub connections_made: usize,
    /// Assignment targets applied successfully
    pub assignments_applied: usize,
    /// Everything that was skipped, in the order it happened
    pub warnings: Vec<TransferWarning>,
}

impl ImportReport {
    /// Number of nodes created
    pub fn nodes_created(&self) -> usize {
        self.created.len()
    }

    /// Check if the import applied everything without a skip
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub(crate) fn warn(&mut self, warning: impl Into<TransferWarning>) {
        let warning = warning.into();
        tracing::warn!("{warning}");
        self.warnings.push(warning);
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Created {} nodes, set {} attributes, made {} connections, applied {} assignments",
            self.nodes_created(),
            self.attributes_applied,
            self.connections_made,
            self.assignments_applied
        )?;
        for warning in &self.warnings {
            writeln!(f, "warning: {warning}")?;
        }
        Ok(())
    }
}

impl fmt::Display for ExportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Exported {} nodes, {} connections, {} assignment targets",
            self.nodes, self.connections, self.targets
        )?;
        if let Some(path) = &self.path {
            write!(f, " to {}", path.display())?;
        }
        writeln!(f)?;
        for warning in &self.warnings {
            writeln!(f, "warning: {warning}")?;
        }
        Ok(())
    }
}
