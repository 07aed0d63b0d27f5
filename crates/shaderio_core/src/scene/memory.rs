// SPDX-License-Identifier: MIT OR Apache-2.0
//! In-memory scene graph implementing [`Scene`].
//!
//! Models the parts of a host that shading transfer depends on: typed nodes
//! with schema defaults, single-source attribute connections, meshes with a
//! per-face shading root (last writer wins), selection and deletion. The whole
//! scene serializes to RON so it can be stored as a snapshot file.

use super::schema::NodeSchemaRegistry;
use super::{
    AttributeInfo, MeshAssignment, NodeInfo, PlugConnection, PlugDirection, Scene, SceneError,
    SelectedComponent,
};
use crate::faces::FaceSet;
use crate::value::AttributeValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Handle of a node in a [`MemoryScene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneHandle(pub u32);

impl fmt::Display for SceneHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Attribute storage: current value and the schema default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SceneAttribute {
    value: AttributeValue,
    default: AttributeValue,
}

/// Per-face shading state of a mesh
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MeshFaces {
    face_shaders: Vec<Option<SceneHandle>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SceneNode {
    name: String,
    node_type: String,
    #[serde(default)]
    default_node: bool,
    attributes: IndexMap<String, SceneAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mesh: Option<MeshFaces>,
}

/// A connection `source.source_attr -> dest.dest_attr`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneConnection {
    /// Source node
    pub source: SceneHandle,
    /// Source attribute
    pub source_attr: String,
    /// Destination node
    pub dest: SceneHandle,
    /// Destination attribute
    pub dest_attr: String,
}

/// In-memory scene graph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryScene {
    /// Known node types
    #[serde(default)]
    registry: NodeSchemaRegistry,
    /// Node slots; deleted nodes leave `None` so handles stay stable
    nodes: Vec<Option<SceneNode>>,
    connections: Vec<SceneConnection>,
    #[serde(default)]
    selection: Vec<SelectedComponent<SceneHandle>>,
}

impl MemoryScene {
    /// Create an empty scene with the builtin node types
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty scene with a custom type registry
    pub fn with_registry(registry: NodeSchemaRegistry) -> Self {
        Self {
            registry,
            ..Self::default()
        }
    }

    /// Get the type registry
    pub fn registry(&self) -> &NodeSchemaRegistry {
        &self.registry
    }

    /// Load a scene snapshot from a RON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        ron::from_str(&contents)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save a scene snapshot to a RON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let content = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }

    /// Create a polygon mesh with `face_count` unshaded faces
    pub fn add_mesh(&mut self, name: &str, face_count: u32) -> Result<SceneHandle, SceneError> {
        let handle = self.create_node("mesh", name)?;
        if let Some(node) = self.slot_mut(handle) {
            node.mesh = Some(MeshFaces {
                face_shaders: vec![None; face_count as usize],
            });
        }
        Ok(handle)
    }

    /// Flag a node as one the host creates itself
    pub fn mark_default(&mut self, handle: SceneHandle) {
        if let Some(node) = self.slot_mut(handle) {
            node.default_node = true;
        }
    }

    /// Delete a node along with its connections and face assignments
    pub fn delete_node(&mut self, handle: SceneHandle) -> bool {
        let Some(slot) = self.nodes.get_mut(handle.0 as usize) else {
            return false;
        };
        if slot.take().is_none() {
            return false;
        }

        self.connections
            .retain(|c| c.source != handle && c.dest != handle);
        self.selection.retain(|s| s.node != handle);
        for node in self.nodes.iter_mut().flatten() {
            if let Some(mesh) = &mut node.mesh {
                for shader in &mut mesh.face_shaders {
                    if *shader == Some(handle) {
                        *shader = None;
                    }
                }
            }
        }
        true
    }

    /// Add a whole node or one face to the selection
    pub fn select(&mut self, node: SceneHandle, face: Option<u32>) {
        self.selection.push(SelectedComponent { node, face });
    }

    /// Clear the selection
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Get the current value of an attribute
    pub fn attribute(&self, handle: SceneHandle, name: &str) -> Option<&AttributeValue> {
        self.slot(handle)?.attributes.get(name).map(|a| &a.value)
    }

    /// Faces of `mesh` currently shaded by `root`
    pub fn faces_assigned_to(&self, root: SceneHandle, mesh: SceneHandle) -> Vec<u32> {
        let Some(faces) = self.slot(mesh).and_then(|n| n.mesh.as_ref()) else {
            return Vec::new();
        };
        faces
            .face_shaders
            .iter()
            .enumerate()
            .filter(|(_, shader)| **shader == Some(root))
            .map(|(face, _)| face as u32)
            .collect()
    }

    /// Iterate live nodes
    pub fn handles(&self) -> impl Iterator<Item = SceneHandle> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| SceneHandle(i as u32))
    }

    /// Get all connections
    pub fn connections(&self) -> &[SceneConnection] {
        &self.connections
    }

    /// Get the number of live nodes
    pub fn node_count(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    /// Get the source driving `handle.attr`, if connected
    pub fn source_of(&self, handle: SceneHandle, attr: &str) -> Option<(SceneHandle, &str)> {
        self.connections
            .iter()
            .find(|c| c.dest == handle && c.dest_attr == attr)
            .map(|c| (c.source, c.source_attr.as_str()))
    }

    fn slot(&self, handle: SceneHandle) -> Option<&SceneNode> {
        self.nodes.get(handle.0 as usize)?.as_ref()
    }

    fn slot_mut(&mut self, handle: SceneHandle) -> Option<&mut SceneNode> {
        self.nodes.get_mut(handle.0 as usize)?.as_mut()
    }

    fn live(&self, handle: SceneHandle) -> Result<&SceneNode, SceneError> {
        self.slot(handle)
            .ok_or_else(|| SceneError::InvalidHandle(handle.to_string()))
    }

    fn has_attribute(&self, handle: SceneHandle, attr: &str) -> Result<(), SceneError> {
        let node = self.live(handle)?;
        if node.attributes.contains_key(attr) {
            Ok(())
        } else {
            Err(SceneError::AttributeNotFound {
                node: node.name.clone(),
                attribute: attr.to_string(),
            })
        }
    }
}

impl Scene for MemoryScene {
    type Handle = SceneHandle;

    fn create_node(&mut self, node_type: &str, name: &str) -> Result<SceneHandle, SceneError> {
        let schema = self
            .registry
            .get(node_type)
            .ok_or_else(|| SceneError::UnknownNodeType(node_type.to_string()))?;
        if self.node_by_name(name).is_some() {
            return Err(SceneError::NameInUse(name.to_string()));
        }

        let attributes = schema
            .attributes
            .iter()
            .map(|def| {
                let attr = SceneAttribute {
                    value: def.default.clone(),
                    default: def.default.clone(),
                };
                (def.name.clone(), attr)
            })
            .collect();

        let handle = SceneHandle(self.nodes.len() as u32);
        self.nodes.push(Some(SceneNode {
            name: name.to_string(),
            node_type: node_type.to_string(),
            default_node: false,
            attributes,
            mesh: None,
        }));
        Ok(handle)
    }

    fn set_attribute(
        &mut self,
        node: &SceneHandle,
        name: &str,
        value: AttributeValue,
    ) -> Result<(), SceneError> {
        self.has_attribute(*node, name)?;
        let Some(attr) = self
            .slot_mut(*node)
            .and_then(|n| n.attributes.get_mut(name))
        else {
            return Err(SceneError::InvalidHandle(node.to_string()));
        };

        let expected = attr.default.kind();
        let found = value.kind();
        attr.value = value.coerce(expected).ok_or_else(|| SceneError::TypeMismatch {
            attribute: name.to_string(),
            expected,
            found,
        })?;
        Ok(())
    }

    fn connect(
        &mut self,
        source: &SceneHandle,
        source_attr: &str,
        dest: &SceneHandle,
        dest_attr: &str,
    ) -> Result<(), SceneError> {
        self.has_attribute(*source, source_attr)?;
        self.has_attribute(*dest, dest_attr)?;

        if source == dest {
            return Err(SceneError::SelfLoop(self.live(*source)?.name.clone()));
        }
        if self.source_of(*dest, dest_attr).is_some() {
            return Err(SceneError::AlreadyConnected {
                node: self.live(*dest)?.name.clone(),
                attribute: dest_attr.to_string(),
            });
        }

        self.connections.push(SceneConnection {
            source: *source,
            source_attr: source_attr.to_string(),
            dest: *dest,
            dest_attr: dest_attr.to_string(),
        });
        Ok(())
    }

    fn list_connections(&self, node: &SceneHandle) -> Vec<PlugConnection<SceneHandle>> {
        let mut plugs = Vec::new();
        for c in &self.connections {
            if c.dest == *node {
                plugs.push(PlugConnection {
                    attr: c.dest_attr.clone(),
                    other: c.source,
                    other_attr: c.source_attr.clone(),
                    direction: PlugDirection::Incoming,
                });
            }
            if c.source == *node {
                plugs.push(PlugConnection {
                    attr: c.source_attr.clone(),
                    other: c.dest,
                    other_attr: c.dest_attr.clone(),
                    direction: PlugDirection::Outgoing,
                });
            }
        }
        plugs
    }

    fn selection(&self) -> Vec<SelectedComponent<SceneHandle>> {
        self.selection.clone()
    }

    fn assign_shader_to_faces(
        &mut self,
        root: &SceneHandle,
        mesh: &SceneHandle,
        faces: Option<&FaceSet>,
    ) -> Result<(), SceneError> {
        self.live(*root)?;
        let node = self
            .slot_mut(*mesh)
            .ok_or_else(|| SceneError::InvalidHandle(mesh.to_string()))?;
        let name = node.name.clone();
        let mesh_faces = node.mesh.as_mut().ok_or(SceneError::NotAMesh(name.clone()))?;

        match faces {
            None => mesh_faces.face_shaders.fill(Some(*root)),
            Some(faces) => {
                let count = mesh_faces.face_shaders.len() as u32;
                if faces.max() >= count {
                    return Err(SceneError::FaceOutOfRange {
                        mesh: name,
                        face: faces.max(),
                        count,
                    });
                }
                for face in faces.iter() {
                    mesh_faces.face_shaders[face as usize] = Some(*root);
                }
            }
        }
        Ok(())
    }

    fn resolve_mesh_by_name(&self, name: &str) -> Option<SceneHandle> {
        self.node_by_name(name)
            .filter(|h| self.slot(*h).is_some_and(|n| n.mesh.is_some()))
    }

    fn node_by_name(&self, name: &str) -> Option<SceneHandle> {
        self.nodes
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|n| n.name == name))
            .map(|i| SceneHandle(i as u32))
    }

    fn node_info(&self, node: &SceneHandle) -> Option<NodeInfo> {
        self.slot(*node).map(|n| NodeInfo {
            node_type: n.node_type.clone(),
            name: n.name.clone(),
        })
    }

    fn attributes(&self, node: &SceneHandle) -> Vec<AttributeInfo> {
        let Some(node) = self.slot(*node) else {
            return Vec::new();
        };
        node.attributes
            .iter()
            .map(|(name, attr)| AttributeInfo {
                name: name.clone(),
                value: attr.value.clone(),
                is_default: attr.value == attr.default,
            })
            .collect()
    }

    fn face_count(&self, mesh: &SceneHandle) -> Option<u32> {
        self.slot(*mesh)?
            .mesh
            .as_ref()
            .map(|m| m.face_shaders.len() as u32)
    }

    fn shading_assignments(&self, mesh: &SceneHandle) -> Vec<MeshAssignment<SceneHandle>> {
        let Some(faces) = self.slot(*mesh).and_then(|n| n.mesh.as_ref()) else {
            return Vec::new();
        };

        let mut by_root: IndexMap<SceneHandle, Vec<u32>> = IndexMap::new();
        for (face, shader) in faces.face_shaders.iter().enumerate() {
            if let Some(root) = shader {
                by_root.entry(*root).or_default().push(face as u32);
            }
        }

        let face_count = faces.face_shaders.len();
        by_root
            .into_iter()
            .filter_map(|(root, indices)| {
                let whole = indices.len() == face_count;
                let faces = if whole { None } else { Some(FaceSet::new(indices).ok()?) };
                Some(MeshAssignment { root, faces })
            })
            .collect()
    }

    fn is_default_node(&self, node: &SceneHandle) -> bool {
        self.slot(*node).is_some_and(|n| n.default_node)
    }
}
