// SPDX-License-Identifier: MIT OR Apache-2.0
//! Live execution of a [`ReconstructionPlan`] against a [`Scene`].

use super::{PlanOp, ReconstructionPlan};
use crate::cancel::CancelToken;
use crate::error::{Result, TransferError, TransferWarning, UnresolvedReference};
use crate::faces::FaceSet;
use crate::record::NodeId;
use crate::report::ImportReport;
use crate::scene::Scene;
use crate::value::AttributeValue;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Recorded node id to the live node created for it during one import
#[derive(Debug, Clone)]
pub struct IdentityMap<H> {
    handles: HashMap<NodeId, H>,
}

impl<H> IdentityMap<H> {
    /// Create an empty map
    pub fn new() -> Self {
        Self {
            handles: HashMap::new(),
        }
    }

    /// Record the live node for `id`
    pub fn insert(&mut self, id: NodeId, handle: H) {
        self.handles.insert(id, handle);
    }

    /// Get the live node for `id`
    pub fn get(&self, id: NodeId) -> Option<&H> {
        self.handles.get(&id)
    }

    /// Number of mapped nodes
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Check if nothing was mapped
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl<H> Default for IdentityMap<H> {
    fn default() -> Self {
        Self::new()
    }
}

/// Pick a name not used in `scene`, derived from `wanted`.
///
/// Trailing digits are incremented (`blinn1` becomes `blinn2`), otherwise a
/// counter starting at 1 is appended.
pub fn unique_name<S: Scene>(scene: &S, wanted: &str) -> String {
    if scene.node_by_name(wanted).is_none() {
        return wanted.to_string();
    }

    let base = wanted.trim_end_matches(|c: char| c.is_ascii_digit());
    let mut counter = wanted[base.len()..]
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_add(1))
        .unwrap_or(1);

    loop {
        let candidate = format!("{base}{counter}");
        if scene.node_by_name(&candidate).is_none() {
            return candidate;
        }
        counter += 1;
    }
}

/// Locate a recorded file on disk.
///
/// The manifest directory is tried first (the relative path, or the file
/// name of an absolute path), then the recorded path itself.
fn resolve_file(source_dir: Option<&Path>, recorded: &str) -> Option<String> {
    let path = Path::new(recorded);
    let mut candidates: Vec<PathBuf> = Vec::with_capacity(2);

    if let Some(dir) = source_dir {
        if path.is_absolute() {
            if let Some(name) = path.file_name() {
                candidates.push(dir.join(name));
            }
        } else {
            candidates.push(dir.join(path));
        }
    }
    candidates.push(path.to_path_buf());

    candidates
        .into_iter()
        .find(|candidate| candidate.is_file())
        .map(|found| found.to_string_lossy().replace('\\', "/"))
}

/// Runs plans against a mutable scene
pub struct Executor<'a, S: Scene> {
    scene: &'a mut S,
    cancel: Option<&'a CancelToken>,
    identity: IdentityMap<S::Handle>,
}

impl<'a, S: Scene> Executor<'a, S> {
    /// Create an executor writing into `scene`
    pub fn new(scene: &'a mut S) -> Self {
        Self {
            scene,
            cancel: None,
            identity: IdentityMap::new(),
        }
    }

    /// Stop between operations when `token` is cancelled
    pub fn cancel_token(mut self, token: &'a CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Live nodes created so far
    pub fn identity(&self) -> &IdentityMap<S::Handle> {
        &self.identity
    }

    /// Apply every operation of `plan` in order.
    ///
    /// Failed operations are reported as warnings and skipped. Only
    /// cancellation stops the run early; nodes created before it remain and
    /// are listed in the report carried by [`TransferError::ImportCancelled`].
    /// Each call starts from an empty identity map.
    pub fn execute(&mut self, plan: &ReconstructionPlan) -> Result<ImportReport> {
        self.identity = IdentityMap::new();
        let mut report = ImportReport::default();
        for name in &plan.skipped_roots {
            report.warn(TransferWarning::NetworkSkipped { name: name.clone() });
        }

        for op in &plan.ops {
            if self.cancel.is_some_and(CancelToken::is_cancelled) {
                tracing::info!("Import cancelled after {} nodes", report.nodes_created());
                return Err(TransferError::ImportCancelled(Box::new(report)));
            }
            match op {
                PlanOp::CreateNode { id, node_type, name } => {
                    self.create(*id, node_type, name, &mut report);
                }
                PlanOp::SetAttribute { id, attribute, value } => {
                    self.set(plan.source_dir.as_deref(), *id, attribute, value, &mut report);
                }
                PlanOp::Connect {
                    source,
                    source_attr,
                    dest,
                    dest_attr,
                } => self.connect(*source, source_attr, *dest, dest_attr, &mut report),
                PlanOp::Assign { root, mesh_name, faces } => {
                    self.assign(*root, mesh_name, faces.as_ref(), &mut report);
                }
            }
        }

        tracing::debug!(
            "Plan executed: {} nodes, {} attributes, {} connections, {} assignments, {} warnings",
            report.nodes_created(),
            report.attributes_applied,
            report.connections_made,
            report.assignments_applied,
            report.warnings.len()
        );
        Ok(report)
    }

    fn create(&mut self, id: NodeId, node_type: &str, name: &str, report: &mut ImportReport) {
        let wanted = if name.is_empty() { node_type } else { name };
        let name = unique_name(&*self.scene, wanted);
        match self.scene.create_node(node_type, &name) {
            Ok(handle) => {
                if name != wanted {
                    tracing::debug!("{wanted} exists, created {name}");
                }
                self.identity.insert(id, handle);
                report.created.insert(id, name);
            }
            Err(error) => report.warn(TransferWarning::Scene {
                step: format!("create {node_type} {wanted}"),
                error,
            }),
        }
    }

    fn set(
        &mut self,
        source_dir: Option<&Path>,
        id: NodeId,
        attribute: &str,
        value: &AttributeValue,
        report: &mut ImportReport,
    ) {
        let Some(handle) = self.identity.get(id) else {
            report.warn(UnresolvedReference::Node {
                id,
                context: format!("attribute {attribute}"),
            });
            return;
        };
        let node = report.created.get(&id).cloned().unwrap_or_default();

        let value = match value {
            AttributeValue::FilePath(recorded) if !recorded.is_empty() => {
                match resolve_file(source_dir, recorded) {
                    Some(found) => AttributeValue::FilePath(found),
                    None => {
                        report.warn(UnresolvedReference::File {
                            node,
                            attribute: attribute.to_string(),
                            path: recorded.clone(),
                        });
                        return;
                    }
                }
            }
            other => other.clone(),
        };

        match self.scene.set_attribute(handle, attribute, value) {
            Ok(()) => report.attributes_applied += 1,
            Err(error) => report.warn(TransferWarning::Scene {
                step: format!("set {node}.{attribute}"),
                error,
            }),
        }
    }

    fn connect(
        &mut self,
        source: NodeId,
        source_attr: &str,
        dest: NodeId,
        dest_attr: &str,
        report: &mut ImportReport,
    ) {
        let step = format!("connect {source}.{source_attr} -> {dest}.{dest_attr}");
        let (Some(from), Some(to)) = (self.identity.get(source), self.identity.get(dest)) else {
            let id = if self.identity.get(source).is_none() { source } else { dest };
            report.warn(UnresolvedReference::Node { id, context: step });
            return;
        };

        match self.scene.connect(from, source_attr, to, dest_attr) {
            Ok(()) => report.connections_made += 1,
            Err(error) => report.warn(TransferWarning::Scene { step, error }),
        }
    }

    fn assign(
        &mut self,
        root: NodeId,
        mesh_name: &str,
        faces: Option<&FaceSet>,
        report: &mut ImportReport,
    ) {
        let Some(root_handle) = self.identity.get(root) else {
            report.warn(UnresolvedReference::Node {
                id: root,
                context: format!("assignment to {mesh_name}"),
            });
            return;
        };
        let Some(mesh) = self.scene.resolve_mesh_by_name(mesh_name) else {
            report.warn(UnresolvedReference::Mesh(mesh_name.to_string()));
            return;
        };

        match self.scene.assign_shader_to_faces(root_handle, &mesh, faces) {
            Ok(()) => report.assignments_applied += 1,
            Err(error) => report.warn(TransferWarning::Scene {
                step: format!("assign {root} to {mesh_name}"),
                error,
            }),
        }
    }
}
