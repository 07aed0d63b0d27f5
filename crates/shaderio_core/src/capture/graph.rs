// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node graph capture.
//!
//! Walks outward from shading-network roots breadth-first, assigning each
//! discovered node the next [`NodeId`]. A visited map keyed by live handle
//! guarantees termination on feedback loops and that every node is
//! recorded exactly once, even when several roots share it.

use crate::cancel::CancelToken;
use crate::config::{CaptureOptions, Traversal};
use crate::error::{Result, TransferWarning};
use crate::record::{ConnectionRecord, NodeId, NodeRecord};
use crate::scene::{NodeInfo, PlugDirection, Scene};
use crate::value::AttributeValue;
use indexmap::IndexMap;
use std::collections::{HashSet, VecDeque};
use std::path::Path;

/// Nodes and connections captured from one set of roots
#[derive(Debug, Clone)]
pub struct CapturedGraph<H> {
    /// Node records in id order
    pub nodes: Vec<NodeRecord>,
    /// Connections between captured nodes
    pub connections: Vec<ConnectionRecord>,
    /// Live handle of every captured node
    pub ids: IndexMap<H, NodeId>,
    /// Roots or nodes that were skipped
    pub warnings: Vec<TransferWarning>,
}

impl<H: std::hash::Hash + Eq> CapturedGraph<H> {
    /// Get the id assigned to a live node
    pub fn id_of(&self, handle: &H) -> Option<NodeId> {
        self.ids.get(handle).copied()
    }
}

/// Breadth-first capture of shading networks from a [`Scene`]
pub struct GraphCapture<'a, S: Scene> {
    scene: &'a S,
    options: &'a CaptureOptions,
    manifest_dir: Option<&'a Path>,
    cancel: Option<&'a CancelToken>,
}

impl<'a, S: Scene> GraphCapture<'a, S> {
    /// Create a capture over `scene`
    pub fn new(scene: &'a S, options: &'a CaptureOptions) -> Self {
        Self {
            scene,
            options,
            manifest_dir: None,
            cancel: None,
        }
    }

    /// Directory the manifest will be written to, for relative file paths
    pub fn manifest_dir(mut self, dir: &'a Path) -> Self {
        self.manifest_dir = Some(dir);
        self
    }

    /// Stop between roots when `token` is cancelled
    pub fn cancel_token(mut self, token: &'a CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Capture every node reachable from `roots`, in root order
    pub fn capture(&self, roots: &[S::Handle]) -> Result<CapturedGraph<S::Handle>> {
        let mut visited: IndexMap<S::Handle, NodeInfo> = IndexMap::new();
        let mut rejected: HashSet<S::Handle> = HashSet::new();
        let mut warnings = Vec::new();

        for root in roots {
            if let Some(cancel) = self.cancel {
                cancel.check()?;
            }

            let Some(info) = self.scene.node_info(root) else {
                tracing::warn!("Skipping invalid root {:?}", root);
                warnings.push(TransferWarning::InvalidNode(format!("{root:?}")));
                continue;
            };
            if info.node_type != self.options.root_type {
                tracing::warn!(
                    "Root {} has type {}, expected {}; capturing nothing",
                    info.name,
                    info.node_type,
                    self.options.root_type
                );
                warnings.push(TransferWarning::UnsupportedRoot {
                    name: info.name,
                    node_type: info.node_type,
                });
                continue;
            }
            if visited.contains_key(root) {
                continue;
            }

            visited.insert(root.clone(), info);
            self.walk(root, &mut visited, &mut rejected, &mut warnings)?;
        }

        let ids: IndexMap<S::Handle, NodeId> = visited
            .keys()
            .enumerate()
            .map(|(i, handle)| (handle.clone(), NodeId(i as u32)))
            .collect();

        let mut nodes = Vec::with_capacity(visited.len());
        let mut connections = Vec::new();
        let mut seen_connections = HashSet::new();

        for (handle, info) in visited {
            let id = ids[&handle];
            let mut connected_inputs = HashSet::new();

            for plug in self.scene.list_connections(&handle) {
                if plug.direction != PlugDirection::Incoming {
                    continue;
                }
                let Some(&source_id) = ids.get(&plug.other) else {
                    continue;
                };
                let record = ConnectionRecord::new(source_id, plug.other_attr, id, plug.attr.clone());
                if seen_connections.insert(record.clone()) {
                    connections.push(record);
                }
                connected_inputs.insert(plug.attr);
            }

            let mut node = NodeRecord::new(id, info.node_type, info.name);
            for attr in self.scene.attributes(&handle) {
                if attr.is_default || connected_inputs.contains(&attr.name) {
                    continue;
                }
                let value = match attr.value {
                    AttributeValue::FilePath(path) => AttributeValue::FilePath(self.portable_path(&path)),
                    other => other,
                };
                node.attributes.insert(attr.name, value);
            }
            nodes.push(node);
        }

        tracing::debug!(
            "Captured {} nodes and {} connections from {} roots",
            nodes.len(),
            connections.len(),
            roots.len()
        );

        Ok(CapturedGraph {
            nodes,
            connections,
            ids,
            warnings,
        })
    }

    /// Breadth-first walk from one root already in `visited`
    fn walk(
        &self,
        root: &S::Handle,
        visited: &mut IndexMap<S::Handle, NodeInfo>,
        rejected: &mut HashSet<S::Handle>,
        warnings: &mut Vec<TransferWarning>,
    ) -> Result<()> {
        let mut queue = VecDeque::from([root.clone()]);

        while let Some(node) = queue.pop_front() {
            if let Some(cancel) = self.cancel {
                cancel.check()?;
            }

            for plug in self.scene.list_connections(&node) {
                if self.options.traversal == Traversal::Upstream
                    && plug.direction != PlugDirection::Incoming
                {
                    continue;
                }
                if visited.contains_key(&plug.other) || rejected.contains(&plug.other) {
                    continue;
                }

                match self.admit(&plug.other) {
                    Ok(info) => {
                        visited.insert(plug.other.clone(), info);
                        queue.push_back(plug.other);
                    }
                    Err(warning) => {
                        warnings.extend(warning);
                        rejected.insert(plug.other);
                    }
                }
            }
        }
        Ok(())
    }

    /// Decide whether a discovered node belongs in the capture.
    ///
    /// `Err(None)` is a silent exclusion, `Err(Some(_))` a reported skip.
    fn admit(&self, handle: &S::Handle) -> std::result::Result<NodeInfo, Option<TransferWarning>> {
        let Some(info) = self.scene.node_info(handle) else {
            tracing::warn!("Skipping invalid node {:?} during traversal", handle);
            return Err(Some(TransferWarning::InvalidNode(format!("{handle:?}"))));
        };
        if self.options.is_excluded(&info.node_type) {
            tracing::trace!("Excluding {} ({})", info.name, info.node_type);
            return Err(None);
        }
        if self.scene.is_default_node(handle) {
            tracing::trace!("Excluding default node {}", info.name);
            return Err(None);
        }
        Ok(info)
    }

    /// Normalize a file path, relative to the manifest when it lives beside it
    fn portable_path(&self, raw: &str) -> String {
        let normalized = raw.replace('\\', "/");
        if !self.options.relative_paths {
            return normalized;
        }
        let Some(dir) = self.manifest_dir else {
            return normalized;
        };

        let path = Path::new(&normalized);
        match path.strip_prefix(dir) {
            Ok(relative) if path.is_absolute() && !relative.as_os_str().is_empty() => relative
                .iter()
                .map(|part| part.to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
            _ => normalized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{MemoryScene, SceneHandle};

    /// blinn1SG <- blinn1 <- file1 <- place2dTexture1
    fn textured_network(scene: &mut MemoryScene) -> (SceneHandle, SceneHandle, SceneHandle, SceneHandle) {
        let sg = scene.create_node("shadingEngine", "blinn1SG").unwrap();
        let blinn = scene.create_node("blinn", "blinn1").unwrap();
        let file = scene.create_node("file", "file1").unwrap();
        let place = scene.create_node("place2dTexture", "place2dTexture1").unwrap();
        scene.connect(&blinn, "outColor", &sg, "surfaceShader").unwrap();
        scene.connect(&file, "outColor", &blinn, "color").unwrap();
        scene.connect(&place, "outUV", &file, "uvCoord").unwrap();
        (sg, blinn, file, place)
    }

    #[test]
    fn test_breadth_first_ids() {
        let mut scene = MemoryScene::new();
        let (sg, blinn, file, place) = textured_network(&mut scene);
        let options = CaptureOptions::default();

        let graph = GraphCapture::new(&scene, &options).capture(&[sg]).unwrap();
        assert_eq!(graph.nodes.len(), 4);
        assert_eq!(graph.id_of(&sg), Some(NodeId(0)));
        assert_eq!(graph.id_of(&blinn), Some(NodeId(1)));
        assert_eq!(graph.id_of(&file), Some(NodeId(2)));
        assert_eq!(graph.id_of(&place), Some(NodeId(3)));
        assert_eq!(
            graph.connections,
            vec![
                ConnectionRecord::new(NodeId(1), "outColor", NodeId(0), "surfaceShader"),
                ConnectionRecord::new(NodeId(2), "outColor", NodeId(1), "color"),
                ConnectionRecord::new(NodeId(3), "outUV", NodeId(2), "uvCoord"),
            ]
        );
        assert!(graph.warnings.is_empty());
    }

    #[test]
    fn test_only_non_default_unconnected_attributes() {
        let mut scene = MemoryScene::new();
        let (sg, blinn, _, _) = textured_network(&mut scene);
        scene.set_attribute(&blinn, "eccentricity", AttributeValue::Float(0.12)).unwrap();
        scene
            .set_attribute(&blinn, "color", AttributeValue::Vector(vec![1.0, 0.0, 0.0]))
            .unwrap();
        let options = CaptureOptions::default();

        let graph = GraphCapture::new(&scene, &options).capture(&[sg]).unwrap();
        let blinn_record = &graph.nodes[1];
        // color is driven by file1, so its stale value is not recorded
        assert_eq!(blinn_record.attributes.len(), 1);
        assert_eq!(blinn_record.attributes["eccentricity"], AttributeValue::Float(0.12));
        assert!(graph.nodes[0].attributes.is_empty());
    }

    #[test]
    fn test_feedback_loop_terminates() {
        let mut scene = MemoryScene::new();
        let sg = scene.create_node("shadingEngine", "sg").unwrap();
        let a = scene.create_node("multiplyDivide", "a").unwrap();
        let b = scene.create_node("multiplyDivide", "b").unwrap();
        scene.connect(&a, "output", &sg, "surfaceShader").unwrap();
        scene.connect(&b, "output", &a, "input1").unwrap();
        scene.connect(&a, "output", &b, "input1").unwrap();
        let options = CaptureOptions::default();

        let graph = GraphCapture::new(&scene, &options).capture(&[sg]).unwrap();
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.connections.len(), 3);
        let names: Vec<_> = graph.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["sg", "a", "b"]);
    }

    #[test]
    fn test_shared_nodes_captured_once() {
        let mut scene = MemoryScene::new();
        let (sg, _, file, _) = textured_network(&mut scene);
        let sg2 = scene.create_node("shadingEngine", "lambert2SG").unwrap();
        let lambert = scene.create_node("lambert", "lambert2").unwrap();
        scene.connect(&lambert, "outColor", &sg2, "surfaceShader").unwrap();
        scene.connect(&file, "outColor", &lambert, "color").unwrap();
        let options = CaptureOptions::default();

        let graph = GraphCapture::new(&scene, &options).capture(&[sg, sg2, sg]).unwrap();
        assert_eq!(graph.nodes.len(), 6);
        assert_eq!(graph.id_of(&sg2), Some(NodeId(4)));
        assert_eq!(graph.id_of(&lambert), Some(NodeId(5)));
        assert_eq!(graph.connections.len(), 5);
    }

    #[test]
    fn test_excluded_and_default_nodes() {
        let mut scene = MemoryScene::new();
        let mesh = scene.add_mesh("pCubeShape1", 6).unwrap();
        let sg = scene.create_node("shadingEngine", "sg").unwrap();
        let lambert1 = scene.create_node("lambert", "lambert1").unwrap();
        scene.connect(&lambert1, "outColor", &sg, "surfaceShader").unwrap();
        scene.connect(&mesh, "instObjGroups", &sg, "volumeShader").unwrap();
        scene.mark_default(lambert1);
        let options = CaptureOptions::default();

        let graph = GraphCapture::new(&scene, &options).capture(&[sg]).unwrap();
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.connections.is_empty());
        assert!(graph.warnings.is_empty());
    }

    #[test]
    fn test_unsupported_root_is_reported() {
        let mut scene = MemoryScene::new();
        let (sg, blinn, _, _) = textured_network(&mut scene);
        let options = CaptureOptions::default();

        let graph = GraphCapture::new(&scene, &options).capture(&[blinn, sg]).unwrap();
        assert_eq!(graph.nodes.len(), 4);
        assert_eq!(
            graph.warnings,
            vec![TransferWarning::UnsupportedRoot {
                name: "blinn1".into(),
                node_type: "blinn".into()
            }]
        );
    }

    #[test]
    fn test_deleted_root_skipped() {
        let mut scene = MemoryScene::new();
        let (sg, _, _, _) = textured_network(&mut scene);
        let gone = scene.create_node("shadingEngine", "gone").unwrap();
        scene.delete_node(gone);
        let options = CaptureOptions::default();

        let graph = GraphCapture::new(&scene, &options).capture(&[gone, sg]).unwrap();
        assert_eq!(graph.nodes.len(), 4);
        assert!(matches!(graph.warnings[..], [TransferWarning::InvalidNode(_)]));
    }

    #[test]
    fn test_traverse_both_directions() {
        let mut scene = MemoryScene::new();
        let (sg, _, file, _) = textured_network(&mut scene);
        let info = scene.create_node("materialInfo", "materialInfo1").unwrap();
        scene.connect(&sg, "surfaceShader", &info, "shadingGroup").unwrap();
        // lambert2 only reads from file1
        let lambert = scene.create_node("lambert", "lambert2").unwrap();
        scene.connect(&file, "outAlpha", &lambert, "diffuse").unwrap();

        let upstream = CaptureOptions::default();
        let graph = GraphCapture::new(&scene, &upstream).capture(&[sg]).unwrap();
        assert_eq!(graph.nodes.len(), 4);

        let both = CaptureOptions {
            traversal: Traversal::Both,
            ..CaptureOptions::default()
        };
        let graph = GraphCapture::new(&scene, &both).capture(&[sg]).unwrap();
        assert_eq!(graph.nodes.len(), 5);
        assert!(graph.id_of(&lambert).is_some());
        assert!(graph.id_of(&info).is_none());
    }

    #[test]
    fn test_file_paths_relative_to_manifest() {
        let mut scene = MemoryScene::new();
        let (sg, _, file, _) = textured_network(&mut scene);
        let dir = std::env::temp_dir().join("shaderio_export");
        let inside = dir.join("textures").join("brick.png");
        scene
            .set_attribute(&file, "fileTextureName", AttributeValue::FilePath(inside.to_string_lossy().into()))
            .unwrap();
        let options = CaptureOptions::default();

        let graph = GraphCapture::new(&scene, &options)
            .manifest_dir(&dir)
            .capture(&[sg])
            .unwrap();
        assert_eq!(
            graph.nodes[2].attributes["fileTextureName"],
            AttributeValue::FilePath("textures/brick.png".into())
        );

        let elsewhere = CaptureOptions {
            relative_paths: false,
            ..CaptureOptions::default()
        };
        let graph = GraphCapture::new(&scene, &elsewhere)
            .manifest_dir(&dir)
            .capture(&[sg])
            .unwrap();
        assert_eq!(
            graph.nodes[2].attributes["fileTextureName"].as_file_path(),
            Some(inside.to_string_lossy().replace('\\', "/").as_str())
        );
    }

    #[test]
    fn test_cancelled_capture() {
        let mut scene = MemoryScene::new();
        let (sg, _, _, _) = textured_network(&mut scene);
        let options = CaptureOptions::default();
        let token = CancelToken::new();
        token.cancel();

        let result = GraphCapture::new(&scene, &options)
            .cancel_token(&token)
            .capture(&[sg]);
        assert!(matches!(result, Err(crate::error::TransferError::Cancelled)));
    }
}
