// SPDX-License-Identifier: MIT OR Apache-2.0
//! Records produced by one export: nodes, connections and assignments.

use crate::faces::FaceSet;
use crate::value::AttributeValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a node within one manifest.
///
/// Ids are assigned sequentially in first-visit order during capture and have
/// no meaning outside the manifest that holds them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A captured node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Id unique within the manifest
    pub id: NodeId,
    /// Host node type tag
    pub node_type: String,
    /// Scene name at export time (advisory, may change on import)
    pub name: String,
    /// Captured attribute values by name.
    ///
    /// Comparison ignores order; serialization keeps capture order.
    #[serde(default)]
    pub attributes: IndexMap<String, AttributeValue>,
}

impl NodeRecord {
    /// Create a node record with no attributes
    pub fn new(id: NodeId, node_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            node_type: node_type.into(),
            name: name.into(),
            attributes: IndexMap::new(),
        }
    }

    /// Add an attribute value
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

/// A captured attribute connection `source.source_attr -> dest.dest_attr`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionRecord {
    /// Source node id
    pub source_id: NodeId,
    /// Source attribute name
    pub source_attr: String,
    /// Destination node id
    pub dest_id: NodeId,
    /// Destination attribute name
    pub dest_attr: String,
}

impl ConnectionRecord {
    /// Create a new connection record
    pub fn new(
        source_id: NodeId,
        source_attr: impl Into<String>,
        dest_id: NodeId,
        dest_attr: impl Into<String>,
    ) -> Self {
        Self {
            source_id,
            source_attr: source_attr.into(),
            dest_id,
            dest_attr: dest_attr.into(),
        }
    }

    /// Check if this connection involves a specific node
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.source_id == node_id || self.dest_id == node_id
    }
}

/// One mesh surface that uses a shading network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentTarget {
    /// Mesh name, resolved by name on import
    pub mesh_name: String,
    /// Assigned faces, or `None` for the whole object
    #[serde(default)]
    pub face_indices: Option<FaceSet>,
}

impl AssignmentTarget {
    /// Target covering the whole mesh
    pub fn whole(mesh_name: impl Into<String>) -> Self {
        Self {
            mesh_name: mesh_name.into(),
            face_indices: None,
        }
    }

    /// Target covering a subset of faces
    pub fn faces(mesh_name: impl Into<String>, faces: FaceSet) -> Self {
        Self {
            mesh_name: mesh_name.into(),
            face_indices: Some(faces),
        }
    }

    /// Check if this target is a whole-object assignment
    pub fn is_whole(&self) -> bool {
        self.face_indices.is_none()
    }
}

/// The surfaces assigned to one shading-network root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    /// Root node id (a node of the manifest's root type)
    pub root_node_id: NodeId,
    /// Assigned surfaces in capture order
    pub targets: Vec<AssignmentTarget>,
}

impl AssignmentRecord {
    /// Create an assignment record
    pub fn new(root_node_id: NodeId, targets: Vec<AssignmentTarget>) -> Self {
        Self { root_node_id, targets }
    }
}
