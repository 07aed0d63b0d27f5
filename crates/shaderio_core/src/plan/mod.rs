// SPDX-License-Identifier: MIT OR Apache-2.0
//! Reconstruction planning.
//!
//! A [`ReconstructionPlan`] is the ordered list of Scene API operations that
//! rebuilds a manifest: create every node, then set attributes, then connect,
//! then assign. Live import ([`Executor`]) and the generated procedure
//! ([`procedure`]) are two consumers of the same plan.

pub mod execute;
pub mod procedure;

pub use execute::{unique_name, Executor, IdentityMap};

use crate::config::{ConflictPolicy, ImportOptions};
use crate::faces::FaceSet;
use crate::manifest::Manifest;
use crate::record::NodeId;
use crate::scene::Scene;
use crate::value::AttributeValue;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// One step of a reconstruction
#[derive(Debug, Clone, PartialEq)]
pub enum PlanOp {
    /// Create a node, picking a free name derived from `name`
    CreateNode {
        /// Recorded id the live node stands for
        id: NodeId,
        /// Host node type
        node_type: String,
        /// Recorded name
        name: String,
    },
    /// Set one attribute; file paths are resolved at execution
    SetAttribute {
        /// Recorded node id
        id: NodeId,
        /// Attribute name
        attribute: String,
        /// Recorded value
        value: AttributeValue,
    },
    /// Connect two reconstructed nodes
    Connect {
        /// Recorded source id
        source: NodeId,
        /// Source attribute
        source_attr: String,
        /// Recorded destination id
        dest: NodeId,
        /// Destination attribute
        dest_attr: String,
    },
    /// Assign a reconstructed root to a mesh found by name
    Assign {
        /// Recorded root id
        root: NodeId,
        /// Mesh name
        mesh_name: String,
        /// Faces, or `None` for the whole mesh
        faces: Option<FaceSet>,
    },
}

/// Ordered operations rebuilding one manifest
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconstructionPlan {
    /// Directory relative file paths are resolved against
    pub source_dir: Option<PathBuf>,
    /// Roots left out because they already exist in the target scene
    pub skipped_roots: Vec<String>,
    /// Operations in execution order
    pub ops: Vec<PlanOp>,
}

impl ReconstructionPlan {
    /// Count operations of each phase: (create, set, connect, assign)
    pub fn counts(&self) -> (usize, usize, usize, usize) {
        self.ops.iter().fold((0, 0, 0, 0), |(c, s, k, a), op| match op {
            PlanOp::CreateNode { .. } => (c + 1, s, k, a),
            PlanOp::SetAttribute { .. } => (c, s + 1, k, a),
            PlanOp::Connect { .. } => (c, s, k + 1, a),
            PlanOp::Assign { .. } => (c, s, k, a + 1),
        })
    }
}

/// Builds a [`ReconstructionPlan`] from a manifest
pub struct Planner<'a> {
    manifest: &'a Manifest,
    source_dir: Option<PathBuf>,
    options: ImportOptions,
}

impl<'a> Planner<'a> {
    /// Create a planner for `manifest`
    pub fn new(manifest: &'a Manifest) -> Self {
        Self {
            manifest,
            source_dir: None,
            options: ImportOptions::default(),
        }
    }

    /// Directory the manifest was read from
    pub fn source_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.source_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Import settings
    pub fn options(mut self, options: ImportOptions) -> Self {
        self.options = options;
        self
    }

    /// Plan the reconstruction into `scene`.
    ///
    /// The scene is only consulted for the conflict policy; names are
    /// disambiguated when the plan runs.
    pub fn plan<S: Scene>(&self, scene: &S) -> ReconstructionPlan {
        let skipped = self.skipped_nodes(scene);
        let skipped_roots: Vec<String> = self
            .manifest
            .roots()
            .filter(|root| skipped.contains(&root.id))
            .map(|root| root.name.clone())
            .collect();

        let kept = |id: &NodeId| !skipped.contains(id);
        let mut ops = Vec::new();

        for node in self.manifest.nodes.iter().filter(|n| kept(&n.id)) {
            ops.push(PlanOp::CreateNode {
                id: node.id,
                node_type: node.node_type.clone(),
                name: node.name.clone(),
            });
        }

        for node in self.manifest.nodes.iter().filter(|n| kept(&n.id)) {
            for (attribute, value) in &node.attributes {
                ops.push(PlanOp::SetAttribute {
                    id: node.id,
                    attribute: attribute.clone(),
                    value: value.clone(),
                });
            }
        }

        for c in &self.manifest.connections {
            if kept(&c.source_id) && kept(&c.dest_id) {
                ops.push(PlanOp::Connect {
                    source: c.source_id,
                    source_attr: c.source_attr.clone(),
                    dest: c.dest_id,
                    dest_attr: c.dest_attr.clone(),
                });
            }
        }

        for assignment in self.manifest.assignments.iter().filter(|a| kept(&a.root_node_id)) {
            for target in &assignment.targets {
                ops.push(PlanOp::Assign {
                    root: assignment.root_node_id,
                    mesh_name: target.mesh_name.clone(),
                    faces: target.face_indices.clone(),
                });
            }
        }

        ReconstructionPlan {
            source_dir: self.source_dir.clone(),
            skipped_roots,
            ops,
        }
    }

    /// Nodes belonging only to networks whose root name is already taken
    fn skipped_nodes<S: Scene>(&self, scene: &S) -> HashSet<NodeId> {
        if self.options.conflict_policy != ConflictPolicy::Skip {
            return HashSet::new();
        }

        let (existing, fresh): (Vec<_>, Vec<_>) = self
            .manifest
            .roots()
            .partition(|root| scene.node_by_name(&root.name).is_some());
        if existing.is_empty() {
            return HashSet::new();
        }

        let still_needed: HashSet<NodeId> = fresh
            .iter()
            .flat_map(|root| self.manifest.upstream_of(root.id))
            .collect();

        existing
            .iter()
            .flat_map(|root| self.manifest.upstream_of(root.id))
            .filter(|id| !still_needed.contains(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::faces::FaceSet;
    use crate::record::{AssignmentRecord, AssignmentTarget, ConnectionRecord, NodeRecord};
    use crate::scene::MemoryScene;

    /// Two networks sharing file1: redSG <- lambert2 <- file1 -> blinn1 -> blueSG
    fn two_networks() -> Manifest {
        let mut m = Manifest::default();
        m.nodes.push(NodeRecord::new(NodeId(0), "shadingEngine", "redSG"));
        m.nodes.push(NodeRecord::new(NodeId(1), "lambert", "lambert2").with_attribute("diffuse", 0.6));
        m.nodes.push(NodeRecord::new(NodeId(2), "file", "file1"));
        m.nodes.push(NodeRecord::new(NodeId(3), "shadingEngine", "blueSG"));
        m.nodes.push(NodeRecord::new(NodeId(4), "blinn", "blinn1"));
        m.connections.push(ConnectionRecord::new(NodeId(1), "outColor", NodeId(0), "surfaceShader"));
        m.connections.push(ConnectionRecord::new(NodeId(2), "outColor", NodeId(1), "color"));
        m.connections.push(ConnectionRecord::new(NodeId(4), "outColor", NodeId(3), "surfaceShader"));
        m.connections.push(ConnectionRecord::new(NodeId(2), "outColor", NodeId(4), "color"));
        m.assignments.push(AssignmentRecord::new(
            NodeId(0),
            vec![AssignmentTarget::faces("pCubeShape1", FaceSet::new([0, 1]).unwrap())],
        ));
        m.assignments.push(AssignmentRecord::new(NodeId(3), vec![AssignmentTarget::whole("pSphereShape1")]));
        m
    }

    #[test]
    fn test_phase_order() {
        let m = two_networks();
        let plan = Planner::new(&m).plan(&MemoryScene::new());
        assert_eq!(plan.counts(), (5, 1, 4, 2));

        let phase = |op: &PlanOp| match op {
            PlanOp::CreateNode { .. } => 0,
            PlanOp::SetAttribute { .. } => 1,
            PlanOp::Connect { .. } => 2,
            PlanOp::Assign { .. } => 3,
        };
        let phases: Vec<_> = plan.ops.iter().map(phase).collect();
        assert!(phases.windows(2).all(|w| w[0] <= w[1]));
        assert!(plan.skipped_roots.is_empty());
    }

    #[test]
    fn test_connections_keep_recorded_order() {
        let m = two_networks();
        let plan = Planner::new(&m).plan(&MemoryScene::new());
        let connects: Vec<_> = plan
            .ops
            .iter()
            .filter_map(|op| match op {
                PlanOp::Connect { source, dest, .. } => Some((source.0, dest.0)),
                _ => None,
            })
            .collect();
        assert_eq!(connects, vec![(1, 0), (2, 1), (4, 3), (2, 4)]);
    }

    #[test]
    fn test_rename_policy_ignores_existing_roots() {
        let m = two_networks();
        let mut scene = MemoryScene::new();
        scene.create_node("shadingEngine", "redSG").unwrap();
        let plan = Planner::new(&m).plan(&scene);
        assert_eq!(plan.counts().0, 5);
    }

    #[test]
    fn test_skip_policy_keeps_shared_nodes() {
        let m = two_networks();
        let mut scene = MemoryScene::new();
        scene.create_node("shadingEngine", "redSG").unwrap();

        let plan = Planner::new(&m)
            .options(ImportOptions {
                conflict_policy: ConflictPolicy::Skip,
            })
            .plan(&scene);

        assert_eq!(plan.skipped_roots, vec!["redSG".to_string()]);
        let created: Vec<_> = plan
            .ops
            .iter()
            .filter_map(|op| match op {
                PlanOp::CreateNode { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(created, ["file1", "blueSG", "blinn1"]);
        // lambert2's attribute and both redSG connections are gone
        assert_eq!(plan.counts(), (3, 0, 2, 1));
    }
}
