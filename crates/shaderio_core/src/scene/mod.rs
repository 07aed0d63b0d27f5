// SPDX-License-Identifier: MIT OR Apache-2.0
//! The host scene as seen by capture and reconstruction.
//!
//! [`Scene`] is the only way the core touches a scene graph. A host adapter
//! implements it over its native API; [`MemoryScene`] is a self-contained
//! implementation used by the command line and the tests.

pub mod memory;
pub mod schema;

pub use memory::{MemoryScene, SceneHandle};
pub use schema::{AttributeDef, NodeCategory, NodeSchema, NodeSchemaRegistry};

use crate::faces::FaceSet;
use crate::value::{AttributeKind, AttributeValue};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

/// Which end of a connection a node is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlugDirection {
    /// The node's attribute is driven by the other node
    Incoming,
    /// The node's attribute drives the other node
    Outgoing,
}

/// One connection as seen from a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlugConnection<H> {
    /// Attribute on the queried node
    pub attr: String,
    /// Node on the other end
    pub other: H,
    /// Attribute on the other node
    pub other_attr: String,
    /// Direction relative to the queried node
    pub direction: PlugDirection,
}

/// Type and name of a live node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    /// Host node type
    pub node_type: String,
    /// Current scene name
    pub name: String,
}

/// Current value of an attribute and whether it is at its default
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeInfo {
    /// Attribute name
    pub name: String,
    /// Current value
    pub value: AttributeValue,
    /// True when the value equals the type's default
    pub is_default: bool,
}

/// A selected mesh, or one selected face of it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedComponent<H> {
    /// The selected node
    pub node: H,
    /// Face index, or `None` when the whole node is selected
    pub face: Option<u32>,
}

/// A shading root the host reports on part or all of a mesh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshAssignment<H> {
    /// Root node
    pub root: H,
    /// Faces it covers, or `None` if the host reports an object-level assignment
    pub faces: Option<FaceSet>,
}

/// Failure reported by a host call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    /// The handle no longer refers to a live node
    #[error("Invalid node handle: {0}")]
    InvalidHandle(String),

    /// The host does not know the node type
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    /// A node with this name already exists
    #[error("Name already in use: {0}")]
    NameInUse(String),

    /// The attribute does not exist on the node
    #[error("Attribute not found: {node}.{attribute}")]
    AttributeNotFound {
        /// Node name
        node: String,
        /// Attribute name
        attribute: String,
    },

    /// The value kind does not fit the attribute
    #[error("Type mismatch on {attribute}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Attribute name
        attribute: String,
        /// Kind the attribute holds
        expected: AttributeKind,
        /// Kind that was supplied
        found: AttributeKind,
    },

    /// The destination attribute already has an incoming connection
    #[error("Destination already connected: {node}.{attribute}")]
    AlreadyConnected {
        /// Node name
        node: String,
        /// Attribute name
        attribute: String,
    },

    /// Self-loop not allowed
    #[error("Self-loop not allowed on {0}")]
    SelfLoop(String),

    /// The node is not a mesh
    #[error("Not a mesh: {0}")]
    NotAMesh(String),

    /// A face index is past the end of the mesh
    #[error("Face {face} out of range for {mesh} ({count} faces)")]
    FaceOutOfRange {
        /// Mesh name
        mesh: String,
        /// Offending index
        face: u32,
        /// Number of faces on the mesh
        count: u32,
    },

    /// Any other host failure
    #[error("{0}")]
    Host(String),
}

/// Operations the core needs from a host scene graph
pub trait Scene {
    /// Live node handle
    type Handle: Clone + Eq + Hash + Debug;

    /// Create a node of `node_type` named `name`
    fn create_node(&mut self, node_type: &str, name: &str) -> Result<Self::Handle, SceneError>;

    /// Set an attribute value
    fn set_attribute(
        &mut self,
        node: &Self::Handle,
        name: &str,
        value: AttributeValue,
    ) -> Result<(), SceneError>;

    /// Connect `source.source_attr` to `dest.dest_attr`
    fn connect(
        &mut self,
        source: &Self::Handle,
        source_attr: &str,
        dest: &Self::Handle,
        dest_attr: &str,
    ) -> Result<(), SceneError>;

    /// Connections on a node, both directions
    fn list_connections(&self, node: &Self::Handle) -> Vec<PlugConnection<Self::Handle>>;

    /// Current selection in selection order
    fn selection(&self) -> Vec<SelectedComponent<Self::Handle>>;

    /// Assign a shading root to faces of a mesh, or to the whole mesh
    fn assign_shader_to_faces(
        &mut self,
        root: &Self::Handle,
        mesh: &Self::Handle,
        faces: Option<&FaceSet>,
    ) -> Result<(), SceneError>;

    /// Find a mesh by name
    fn resolve_mesh_by_name(&self, name: &str) -> Option<Self::Handle>;

    /// Find any node by name
    fn node_by_name(&self, name: &str) -> Option<Self::Handle>;

    /// Type and name of a node, or `None` if the handle is stale
    fn node_info(&self, node: &Self::Handle) -> Option<NodeInfo>;

    /// Writable attributes of a node with their current values
    fn attributes(&self, node: &Self::Handle) -> Vec<AttributeInfo>;

    /// Number of faces, or `None` if the node is not a mesh
    fn face_count(&self, mesh: &Self::Handle) -> Option<u32>;

    /// Shading roots the host currently reports on a mesh
    fn shading_assignments(&self, mesh: &Self::Handle) -> Vec<MeshAssignment<Self::Handle>>;

    /// Check if a node is one the host creates by itself in every scene
    fn is_default_node(&self, _node: &Self::Handle) -> bool {
        false
    }
}
