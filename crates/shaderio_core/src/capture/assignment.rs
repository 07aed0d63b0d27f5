// SPDX-License-Identifier: MIT OR Apache-2.0
//! Assignment capture: which mesh surfaces use which shading root.

use crate::error::TransferWarning;
use crate::faces::FaceSet;
use crate::record::AssignmentTarget;
use crate::scene::{Scene, SelectedComponent};
use indexmap::IndexMap;
use std::collections::BTreeSet;

/// Targets found for each root, in the order roots were first seen
#[derive(Debug, Clone)]
pub struct CapturedAssignments<H> {
    /// Assigned surfaces per root handle
    pub targets: IndexMap<H, Vec<AssignmentTarget>>,
    /// Selected items that could not be used
    pub warnings: Vec<TransferWarning>,
}

impl<H> CapturedAssignments<H> {
    /// Iterate the roots in discovery order
    pub fn roots(&self) -> impl Iterator<Item = &H> {
        self.targets.keys()
    }
}

/// What the selection holds, grouped per mesh.
///
/// `None` means the whole mesh was selected, which wins over face picks.
fn group_by_mesh<H: Clone + Eq + std::hash::Hash>(
    selection: &[SelectedComponent<H>],
) -> IndexMap<H, Option<BTreeSet<u32>>> {
    let mut meshes: IndexMap<H, Option<BTreeSet<u32>>> = IndexMap::new();
    for item in selection {
        match item.face {
            None => {
                meshes.insert(item.node.clone(), None);
            }
            Some(face) => {
                let entry = meshes
                    .entry(item.node.clone())
                    .or_insert_with(|| Some(BTreeSet::new()));
                if let Some(faces) = entry {
                    faces.insert(face);
                }
            }
        }
    }
    meshes
}

/// Record the surfaces of the selected meshes per shading root.
///
/// Each root gets one target per mesh it appears on. A root covering every
/// face of the mesh within the selection records `face_indices = None`,
/// otherwise the explicit sorted face set. Overlapping or missing
/// assignments are recorded exactly as the host reports them.
pub fn capture_assignments<S: Scene>(
    scene: &S,
    selection: &[SelectedComponent<S::Handle>],
) -> CapturedAssignments<S::Handle> {
    let mut targets: IndexMap<S::Handle, Vec<AssignmentTarget>> = IndexMap::new();
    let mut warnings = Vec::new();

    for (mesh, picked) in group_by_mesh(selection) {
        let Some(info) = scene.node_info(&mesh) else {
            warnings.push(TransferWarning::InvalidNode(format!("{mesh:?}")));
            continue;
        };
        let Some(face_count) = scene.face_count(&mesh) else {
            tracing::debug!("Ignoring selected non-mesh {}", info.name);
            continue;
        };

        let picked = match picked {
            None => None,
            Some(faces) => {
                let in_range = faces.into_iter().filter(|f| *f < face_count);
                match FaceSet::new(in_range) {
                    Ok(set) => Some(set),
                    Err(_) => {
                        tracing::debug!("No valid faces selected on {}", info.name);
                        continue;
                    }
                }
            }
        };

        for assignment in scene.shading_assignments(&mesh) {
            let faces = match (assignment.faces, &picked) {
                (None, None) => None,
                (None, Some(picked)) => Some(picked.clone()),
                (Some(faces), None) => Some(faces),
                (Some(faces), Some(picked)) => match faces.intersection(picked) {
                    Some(common) => Some(common),
                    None => continue,
                },
            };

            let target = match faces {
                Some(faces) if !faces.covers(face_count) => {
                    AssignmentTarget::faces(info.name.clone(), faces)
                }
                _ => AssignmentTarget::whole(info.name.clone()),
            };
            targets.entry(assignment.root).or_default().push(target);
        }
    }

    CapturedAssignments { targets, warnings }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{MemoryScene, SceneHandle};

    fn split_cube() -> (MemoryScene, SceneHandle, SceneHandle, SceneHandle) {
        let mut scene = MemoryScene::new();
        let mesh = scene.add_mesh("pCubeShape1", 10).unwrap();
        let r1 = scene.create_node("shadingEngine", "redSG").unwrap();
        let r2 = scene.create_node("shadingEngine", "blueSG").unwrap();
        scene.assign_shader_to_faces(&r2, &mesh, None).unwrap();
        scene
            .assign_shader_to_faces(&r1, &mesh, Some(&FaceSet::new([0, 2, 4]).unwrap()))
            .unwrap();
        (scene, mesh, r1, r2)
    }

    #[test]
    fn test_split_faces() {
        let (mut scene, mesh, r1, r2) = split_cube();
        scene.select(mesh, None);

        let captured = capture_assignments(&scene, &scene.selection());
        assert_eq!(
            captured.targets[&r1],
            vec![AssignmentTarget::faces("pCubeShape1", FaceSet::new([0, 2, 4]).unwrap())]
        );
        assert_eq!(
            captured.targets[&r2],
            vec![AssignmentTarget::faces("pCubeShape1", FaceSet::new([1, 3, 5, 6, 7, 8, 9]).unwrap())]
        );
    }

    #[test]
    fn test_whole_object_shortcut() {
        let mut scene = MemoryScene::new();
        let mesh = scene.add_mesh("pSphereShape1", 400).unwrap();
        let sg = scene.create_node("shadingEngine", "lambert2SG").unwrap();
        // assigned face by face, still reported as the whole object
        scene
            .assign_shader_to_faces(&sg, &mesh, Some(&FaceSet::new(0..400).unwrap()))
            .unwrap();
        scene.select(mesh, None);

        let captured = capture_assignments(&scene, &scene.selection());
        assert_eq!(captured.targets[&sg], vec![AssignmentTarget::whole("pSphereShape1")]);
    }

    #[test]
    fn test_face_selection_restricts_targets() {
        let (mut scene, mesh, r1, r2) = split_cube();
        scene.select(mesh, Some(2));
        scene.select(mesh, Some(3));
        scene.select(mesh, Some(42));

        let captured = capture_assignments(&scene, &scene.selection());
        let roots: Vec<_> = captured.roots().copied().collect();
        assert_eq!(roots, vec![r1, r2]);
        assert_eq!(
            captured.targets[&r1],
            vec![AssignmentTarget::faces("pCubeShape1", FaceSet::new([2]).unwrap())]
        );
        assert_eq!(
            captured.targets[&r2],
            vec![AssignmentTarget::faces("pCubeShape1", FaceSet::new([3]).unwrap())]
        );
    }

    #[test]
    fn test_whole_selection_wins_over_faces() {
        let (mut scene, mesh, r1, _) = split_cube();
        scene.select(mesh, Some(2));
        scene.select(mesh, None);
        scene.select(mesh, Some(3));

        let captured = capture_assignments(&scene, &scene.selection());
        assert_eq!(captured.targets[&r1][0].face_indices, Some(FaceSet::new([0, 2, 4]).unwrap()));
    }

    #[test]
    fn test_unshaded_and_non_mesh_selection() {
        let mut scene = MemoryScene::new();
        let mesh = scene.add_mesh("pPlaneShape1", 4).unwrap();
        let lambert = scene.create_node("lambert", "lambert2").unwrap();
        scene.select(mesh, None);
        scene.select(lambert, None);

        let captured = capture_assignments(&scene, &scene.selection());
        assert!(captured.targets.is_empty());
        assert!(captured.warnings.is_empty());
    }
}
