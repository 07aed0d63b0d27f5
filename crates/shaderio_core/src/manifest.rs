// SPDX-License-Identifier: MIT OR Apache-2.0
//! The manifest: everything captured by one export.

use crate::record::{AssignmentRecord, ConnectionRecord, NodeId, NodeRecord};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

/// Current manifest format version
pub const FORMAT_VERSION: u32 = 1;

/// Root node type used when none is configured
pub const DEFAULT_ROOT_TYPE: &str = "shadingEngine";

/// Complete capture of one export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Format version, checked on decode
    pub format_version: u32,
    /// Node type designating shading-network roots
    pub root_type: String,
    /// Nodes in capture order
    pub nodes: Vec<NodeRecord>,
    /// Connections in capture order
    pub connections: Vec<ConnectionRecord>,
    /// Surface assignments per root
    pub assignments: Vec<AssignmentRecord>,
}

impl Manifest {
    /// Create an empty manifest for roots of `root_type`
    pub fn new(root_type: impl Into<String>) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            root_type: root_type.into(),
            nodes: Vec::new(),
            connections: Vec::new(),
            assignments: Vec::new(),
        }
    }

    /// Get a node by id
    pub fn node(&self, id: NodeId) -> Option<&NodeRecord> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Iterate nodes of the root type
    pub fn roots(&self) -> impl Iterator<Item = &NodeRecord> {
        self.nodes.iter().filter(move |n| n.node_type == self.root_type)
    }

    /// Get the number of assignment targets across all records
    pub fn target_count(&self) -> usize {
        self.assignments.iter().map(|a| a.targets.len()).sum()
    }

    /// Check the structural invariants of the manifest
    pub fn validate(&self) -> Result<(), ManifestError> {
        let mut types = HashMap::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if types.insert(node.id, node.node_type.as_str()).is_some() {
                return Err(ManifestError::DuplicateNodeId(node.id));
            }
        }

        for connection in &self.connections {
            for id in [connection.source_id, connection.dest_id] {
                if !types.contains_key(&id) {
                    return Err(ManifestError::DanglingConnection(id));
                }
            }
        }

        for assignment in &self.assignments {
            match types.get(&assignment.root_node_id) {
                None => return Err(ManifestError::UnknownRoot(assignment.root_node_id)),
                Some(node_type) if *node_type != self.root_type => {
                    return Err(ManifestError::NotARoot {
                        id: assignment.root_node_id,
                        node_type: (*node_type).to_string(),
                    });
                }
                Some(_) => {}
            }
        }

        Ok(())
    }

    /// Collect `root` and every node feeding into it through connections.
    ///
    /// Safe on cyclic graphs; the result is in breadth-first order.
    pub fn upstream_of(&self, root: NodeId) -> Vec<NodeId> {
        let mut sources: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for c in &self.connections {
            sources.entry(c.dest_id).or_default().push(c.source_id);
        }

        let mut visited = HashSet::from([root]);
        let mut order = vec![root];
        let mut queue = VecDeque::from([root]);
        while let Some(id) = queue.pop_front() {
            for &source in sources.get(&id).into_iter().flatten() {
                if visited.insert(source) {
                    order.push(source);
                    queue.push_back(source);
                }
            }
        }
        order
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT_TYPE)
    }
}

/// Structural violation found by [`Manifest::validate`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ManifestError {
    /// Two nodes share an id
    #[error("Duplicate node id {0}")]
    DuplicateNodeId(NodeId),

    /// A connection references a node that is not in the manifest
    #[error("Connection references unknown node {0}")]
    DanglingConnection(NodeId),

    /// An assignment references a node that is not in the manifest
    #[error("Assignment references unknown node {0}")]
    UnknownRoot(NodeId),

    /// An assignment references a node that is not a root
    #[error("Assignment root {id} has type {node_type}, not the root type")]
    NotARoot {
        /// Referenced id
        id: NodeId,
        /// Its actual type
        node_type: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::AssignmentTarget;

    fn sample() -> Manifest {
        let mut m = Manifest::default();
        m.nodes.push(NodeRecord::new(NodeId(0), "shadingEngine", "blinn1SG"));
        m.nodes.push(NodeRecord::new(NodeId(1), "blinn", "blinn1"));
        m.nodes.push(NodeRecord::new(NodeId(2), "file", "file1"));
        m.connections.push(ConnectionRecord::new(NodeId(1), "outColor", NodeId(0), "surfaceShader"));
        m.connections.push(ConnectionRecord::new(NodeId(2), "outColor", NodeId(1), "color"));
        m.assignments.push(AssignmentRecord::new(NodeId(0), vec![AssignmentTarget::whole("pCube1")]));
        m
    }

    #[test]
    fn test_valid_manifest() {
        assert_eq!(sample().validate(), Ok(()));
        assert_eq!(sample().roots().count(), 1);
    }

    #[test]
    fn test_duplicate_id() {
        let mut m = sample();
        m.nodes.push(NodeRecord::new(NodeId(2), "place2dTexture", "place2dTexture1"));
        assert_eq!(m.validate(), Err(ManifestError::DuplicateNodeId(NodeId(2))));
    }

    #[test]
    fn test_dangling_connection() {
        let mut m = sample();
        m.connections.push(ConnectionRecord::new(NodeId(7), "outUV", NodeId(2), "uvCoord"));
        assert_eq!(m.validate(), Err(ManifestError::DanglingConnection(NodeId(7))));
    }

    #[test]
    fn test_assignment_must_target_root() {
        let mut m = sample();
        m.assignments.push(AssignmentRecord::new(NodeId(1), vec![AssignmentTarget::whole("pSphere1")]));
        assert!(matches!(m.validate(), Err(ManifestError::NotARoot { .. })));
    }

    #[test]
    fn test_upstream_with_cycle() {
        let mut m = sample();
        m.connections.push(ConnectionRecord::new(NodeId(1), "outTransparency", NodeId(2), "alphaGain"));
        assert_eq!(m.upstream_of(NodeId(0)), vec![NodeId(0), NodeId(1), NodeId(2)]);
        assert_eq!(m.upstream_of(NodeId(2)), vec![NodeId(2), NodeId(1)]);
    }
}
