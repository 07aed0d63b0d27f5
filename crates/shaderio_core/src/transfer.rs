// SPDX-License-Identifier: MIT OR Apache-2.0
//! Top-level export and import operations.

use crate::cancel::CancelToken;
use crate::capture::{capture_assignments, CaptureMode, GraphCapture};
use crate::codec::{self, ManifestFormat};
use crate::config::{CaptureOptions, ImportOptions, ShaderIoConfig};
use crate::error::{Result, TransferError, TransferWarning};
use crate::manifest::Manifest;
use crate::plan::{procedure, Executor, Planner, ReconstructionPlan};
use crate::record::AssignmentRecord;
use crate::report::{ExportReport, ImportReport};
use crate::scene::Scene;
use indexmap::IndexSet;
use std::path::{Path, PathBuf};

/// Capture the current selection of `scene` into a manifest.
///
/// In [`CaptureMode::Mesh`] the selection holds meshes or faces and the
/// networks shading them are captured with their assignments. In
/// [`CaptureMode::ShaderOnly`] the selection holds roots and no assignments
/// are recorded. `manifest_dir` is where the manifest will live, used to
/// make file paths relative.
pub fn export_manifest<S: Scene>(
    scene: &S,
    mode: CaptureMode,
    options: &CaptureOptions,
    manifest_dir: Option<&Path>,
    cancel: &CancelToken,
) -> Result<(Manifest, Vec<TransferWarning>)> {
    let selection = scene.selection();
    if selection.is_empty() {
        return Err(TransferError::NothingSelected("the selection is empty".to_string()));
    }
    tracing::info!("Exporting {} selected items ({:?} mode)", selection.len(), mode);

    let mut warnings = Vec::new();
    let (roots, targets) = match mode {
        CaptureMode::Mesh => {
            let captured = capture_assignments(scene, &selection);
            warnings.extend(captured.warnings);
            let roots: Vec<_> = captured.targets.keys().cloned().collect();
            (roots, Some(captured.targets))
        }
        CaptureMode::ShaderOnly => {
            let roots: IndexSet<_> = selection.into_iter().map(|item| item.node).collect();
            (roots.into_iter().collect(), None)
        }
    };
    if roots.is_empty() {
        return Err(TransferError::NothingSelected(
            "no shading network is assigned to the selection".to_string(),
        ));
    }

    let mut capture = GraphCapture::new(scene, options).cancel_token(cancel);
    if let Some(dir) = manifest_dir {
        capture = capture.manifest_dir(dir);
    }
    let graph = capture.capture(&roots)?;
    warnings.extend(graph.warnings.iter().cloned());

    let mut manifest = Manifest::new(options.root_type.clone());
    for (root, root_targets) in targets.into_iter().flatten() {
        // roots skipped by the capture carry no assignment
        if let Some(id) = graph.id_of(&root) {
            manifest.assignments.push(AssignmentRecord::new(id, root_targets));
        }
    }
    manifest.nodes = graph.nodes;
    manifest.connections = graph.connections;

    if manifest.nodes.is_empty() {
        return Err(TransferError::NothingSelected(
            "no selected root could be captured".to_string(),
        ));
    }

    tracing::info!(
        "Captured {} nodes, {} connections, {} assignment targets",
        manifest.nodes.len(),
        manifest.connections.len(),
        manifest.target_count()
    );
    Ok((manifest, warnings))
}

/// Export the selection of `scene` to the manifest file at `path`.
///
/// Nothing is written unless the whole manifest was captured and encoded.
pub fn export_to_file<S: Scene>(
    scene: &S,
    path: &Path,
    mode: CaptureMode,
    config: &ShaderIoConfig,
    cancel: &CancelToken,
) -> Result<ExportReport> {
    let dir = parent_dir(path);
    let (manifest, warnings) = export_manifest(scene, mode, &config.capture, Some(&dir), cancel)?;

    let format = ManifestFormat::from_path(path).unwrap_or(config.format);
    codec::save(&manifest, path, format)?;
    tracing::info!("Manifest written to {}", path.display());

    Ok(ExportReport {
        path: Some(path.to_path_buf()),
        nodes: manifest.nodes.len(),
        connections: manifest.connections.len(),
        targets: manifest.target_count(),
        warnings,
    })
}

/// Plan the reconstruction of `manifest` into `scene`
pub fn plan_import<S: Scene>(
    scene: &S,
    manifest: &Manifest,
    source_dir: Option<&Path>,
    options: &ImportOptions,
) -> ReconstructionPlan {
    let mut planner = Planner::new(manifest).options(options.clone());
    if let Some(dir) = source_dir {
        planner = planner.source_dir(dir);
    }
    planner.plan(scene)
}

/// Reconstruct `manifest` inside `scene`.
///
/// `source_dir` is the directory the manifest was read from; relative file
/// paths resolve against it.
pub fn import_manifest<S: Scene>(
    scene: &mut S,
    manifest: &Manifest,
    source_dir: Option<&Path>,
    options: &ImportOptions,
    cancel: &CancelToken,
) -> Result<ImportReport> {
    tracing::info!(
        "Importing {} nodes, {} connections, {} assignment targets",
        manifest.nodes.len(),
        manifest.connections.len(),
        manifest.target_count()
    );
    let plan = plan_import(scene, manifest, source_dir, options);
    let report = Executor::new(scene).cancel_token(cancel).execute(&plan)?;
    log_import(&report);
    Ok(report)
}

/// Read the manifest at `path` and reconstruct it inside `scene`
pub fn import_from_file<S: Scene>(
    scene: &mut S,
    path: &Path,
    config: &ShaderIoConfig,
    cancel: &CancelToken,
) -> Result<ImportReport> {
    let manifest = codec::load(path, config.format)?;
    let dir = parent_dir(path);
    import_manifest(scene, &manifest, Some(&dir), &config.import, cancel)
}

/// Render the procedure equivalent to importing `manifest` into `scene`
pub fn generate_procedure<S: Scene>(
    scene: &S,
    manifest: &Manifest,
    source_dir: Option<&Path>,
    options: &ImportOptions,
) -> String {
    procedure::render(&plan_import(scene, manifest, source_dir, options))
}

/// Parse a generated procedure and run it against `scene`
pub fn run_procedure<S: Scene>(scene: &mut S, text: &str, cancel: &CancelToken) -> Result<ImportReport> {
    let plan = procedure::parse(text)?;
    tracing::info!("Running procedure with {} operations", plan.ops.len());
    let report = Executor::new(scene).cancel_token(cancel).execute(&plan)?;
    log_import(&report);
    Ok(report)
}

fn log_import(report: &ImportReport) {
    tracing::info!(
        "Import finished: {} nodes, {} attributes, {} connections, {} assignments, {} warnings",
        report.nodes_created(),
        report.attributes_applied,
        report.connections_made,
        report.assignments_applied,
        report.warnings.len()
    );
}

/// Absolute directory containing `path`, where relative file paths of a
/// manifest stored at `path` are resolved
pub fn parent_dir(path: &Path) -> PathBuf {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::faces::FaceSet;
    use crate::record::NodeId;
    use crate::scene::MemoryScene;

    #[test]
    fn test_parent_dir_is_absolute() {
        let here = std::path::absolute(".").unwrap();
        assert_eq!(parent_dir(Path::new("bundle.ron")), here);
        assert_eq!(parent_dir(Path::new("textures/bundle.ron")), here.join("textures"));
        assert!(parent_dir(Path::new("/tmp/bundle.ron")).ends_with("tmp"));
    }

    #[test]
    fn test_empty_selection_is_an_error() {
        let scene = MemoryScene::new();
        let result = export_manifest(
            &scene,
            CaptureMode::Mesh,
            &CaptureOptions::default(),
            None,
            &CancelToken::new(),
        );
        assert!(matches!(result, Err(TransferError::NothingSelected(_))));
    }

    #[test]
    fn test_unshaded_mesh_is_an_error() {
        let mut scene = MemoryScene::new();
        let mesh = scene.add_mesh("pCubeShape1", 6).unwrap();
        scene.select(mesh, None);
        let result = export_manifest(
            &scene,
            CaptureMode::Mesh,
            &CaptureOptions::default(),
            None,
            &CancelToken::new(),
        );
        assert!(matches!(result, Err(TransferError::NothingSelected(_))));
    }

    #[test]
    fn test_shader_only_mode() {
        let mut scene = MemoryScene::new();
        let mesh = scene.add_mesh("pCubeShape1", 6).unwrap();
        let sg = scene.create_node("shadingEngine", "lambert2SG").unwrap();
        let lambert = scene.create_node("lambert", "lambert2").unwrap();
        scene.connect(&lambert, "outColor", &sg, "surfaceShader").unwrap();
        scene.assign_shader_to_faces(&sg, &mesh, None).unwrap();
        scene.select(sg, None);
        scene.select(sg, None);

        let (manifest, warnings) = export_manifest(
            &scene,
            CaptureMode::ShaderOnly,
            &CaptureOptions::default(),
            None,
            &CancelToken::new(),
        )
        .unwrap();
        assert!(warnings.is_empty());
        assert_eq!(manifest.nodes.len(), 2);
        assert!(manifest.assignments.is_empty());
    }

    #[test]
    fn test_mesh_mode_links_assignments_to_ids() {
        let mut scene = MemoryScene::new();
        let mesh = scene.add_mesh("pCubeShape1", 6).unwrap();
        let red = scene.create_node("shadingEngine", "redSG").unwrap();
        let blue = scene.create_node("shadingEngine", "blueSG").unwrap();
        scene.assign_shader_to_faces(&blue, &mesh, None).unwrap();
        scene
            .assign_shader_to_faces(&red, &mesh, Some(&FaceSet::new([0]).unwrap()))
            .unwrap();
        scene.select(mesh, None);

        let (manifest, _) = export_manifest(
            &scene,
            CaptureMode::Mesh,
            &CaptureOptions::default(),
            None,
            &CancelToken::new(),
        )
        .unwrap();
        assert_eq!(manifest.nodes[0].name, "redSG");
        assert_eq!(manifest.assignments[0].root_node_id, NodeId(0));
        assert_eq!(manifest.assignments[1].root_node_id, NodeId(1));
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_export_then_import_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.json");

        let mut scene = MemoryScene::new();
        let mesh = scene.add_mesh("pCubeShape1", 6).unwrap();
        let sg = scene.create_node("shadingEngine", "blinn1SG").unwrap();
        let blinn = scene.create_node("blinn", "blinn1").unwrap();
        scene.connect(&blinn, "outColor", &sg, "surfaceShader").unwrap();
        scene.assign_shader_to_faces(&sg, &mesh, None).unwrap();
        scene.select(mesh, None);

        let config = ShaderIoConfig::default();
        let report = export_to_file(&scene, &path, CaptureMode::Mesh, &config, &CancelToken::new()).unwrap();
        assert_eq!((report.nodes, report.connections, report.targets), (2, 1, 1));
        assert!(std::fs::read_to_string(&path).unwrap().trim_start().starts_with('{'));

        let mut target = MemoryScene::new();
        let cube = target.add_mesh("pCubeShape1", 6).unwrap();
        let report = import_from_file(&mut target, &path, &config, &CancelToken::new()).unwrap();
        assert!(report.is_clean());
        let new_sg = target.node_by_name("blinn1SG").unwrap();
        assert_eq!(target.faces_assigned_to(new_sg, cube), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_generated_procedure_runs() {
        let mut manifest = Manifest::default();
        manifest
            .nodes
            .push(crate::record::NodeRecord::new(NodeId(0), "lambert", "lambert2").with_attribute("diffuse", 0.3));

        let scene = MemoryScene::new();
        let text = generate_procedure(&scene, &manifest, None, &ImportOptions::default());
        assert!(text.contains(r#"n0 = create_node("lambert", "lambert2")"#));

        let mut target = MemoryScene::new();
        let report = run_procedure(&mut target, &text, &CancelToken::new()).unwrap();
        assert_eq!((report.nodes_created(), report.attributes_applied), (1, 1));

        let result = run_procedure(&mut target, "bogus(", &CancelToken::new());
        assert!(matches!(result, Err(TransferError::Procedure(_))));
    }
}
