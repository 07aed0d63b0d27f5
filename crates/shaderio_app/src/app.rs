// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command execution over scene snapshot files.

use crate::cli::{Cli, Command};
use shaderio_core::codec;
use shaderio_core::{
    export_to_file, generate_procedure, import_from_file, parent_dir, run_procedure, CancelToken, FaceSet,
    MemoryScene, Scene, ShaderIoConfig, TransferError,
};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors surfaced to the command line
#[derive(Error, Debug)]
pub enum AppError {
    /// Export or import failed
    #[error(transparent)]
    Transfer(#[from] TransferError),

    /// A scene snapshot or procedure file could not be read or written
    #[error("{action} {path:?}: {source}")]
    File {
        /// What was being done
        action: &'static str,
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A `--select` argument could not be used
    #[error("Invalid selection {0:?}")]
    Selection(String),
}

/// Result type for commands
pub type Result<T> = std::result::Result<T, AppError>;

fn load_scene(path: &Path) -> Result<MemoryScene> {
    MemoryScene::load(path).map_err(|source| AppError::File {
        action: "Failed to read scene",
        path: path.to_path_buf(),
        source,
    })
}

fn save_scene(scene: &MemoryScene, path: &Path) -> Result<()> {
    scene.save(path).map_err(|source| AppError::File {
        action: "Failed to write scene",
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!("Scene written to {}", path.display());
    Ok(())
}

/// Split `pCubeShape1.f[0:3,7]` into the node name and its faces
fn parse_selection(arg: &str) -> Result<(&str, Option<FaceSet>)> {
    let Some((name, rest)) = arg.split_once(".f[") else {
        return Ok((arg, None));
    };
    let faces = rest
        .strip_suffix(']')
        .ok_or_else(|| AppError::Selection(arg.to_string()))?;
    let faces = faces
        .parse::<FaceSet>()
        .map_err(|_| AppError::Selection(arg.to_string()))?;
    Ok((name, Some(faces)))
}

/// Replace the saved selection of `scene` with `args`
fn apply_selection(scene: &mut MemoryScene, args: &[String]) -> Result<()> {
    scene.clear_selection();
    for arg in args {
        let (name, faces) = parse_selection(arg)?;
        let handle = scene
            .node_by_name(name)
            .ok_or_else(|| AppError::Selection(arg.clone()))?;
        match faces {
            None => scene.select(handle, None),
            Some(faces) => {
                for face in faces.iter() {
                    scene.select(handle, Some(face));
                }
            }
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<ShaderIoConfig> {
    match path {
        Some(path) => {
            let config = ShaderIoConfig::load(path)?;
            tracing::debug!("Loaded settings from {}", path.display());
            Ok(config)
        }
        None => Ok(ShaderIoConfig::default()),
    }
}

/// Run one command, returning what to print on stdout
pub fn run(cli: Cli) -> Result<String> {
    let mut config = load_config(cli.config.as_deref())?;
    let cancel = CancelToken::new();

    match cli.command {
        Command::Export {
            scene,
            out,
            mode,
            format,
            select,
        } => {
            let mut snapshot = load_scene(&scene)?;
            if !select.is_empty() {
                apply_selection(&mut snapshot, &select)?;
            }
            if let Some(format) = format {
                config.format = format.into();
            }
            let report = export_to_file(&snapshot, &out, mode.into(), &config, &cancel)?;
            Ok(report.to_string())
        }

        Command::Import {
            scene,
            manifest,
            out,
            conflict,
        } => {
            let mut snapshot = load_scene(&scene)?;
            if let Some(conflict) = conflict {
                config.import.conflict_policy = conflict.into();
            }
            let report = import_from_file(&mut snapshot, &manifest, &config, &cancel)?;
            save_scene(&snapshot, out.as_deref().unwrap_or(&scene))?;
            Ok(report.to_string())
        }

        Command::Script { manifest, scene } => {
            let snapshot = match scene {
                Some(path) => load_scene(&path)?,
                None => MemoryScene::new(),
            };
            let loaded = codec::load(&manifest, config.format)?;
            let source_dir = parent_dir(&manifest);
            Ok(generate_procedure(&snapshot, &loaded, Some(&source_dir), &config.import))
        }

        Command::Run { scene, procedure, out } => {
            let mut snapshot = load_scene(&scene)?;
            let text = std::fs::read_to_string(&procedure).map_err(|source| AppError::File {
                action: "Failed to read procedure",
                path: procedure.clone(),
                source,
            })?;
            let report = run_procedure(&mut snapshot, &text, &cancel)?;
            save_scene(&snapshot, out.as_deref().unwrap_or(&scene))?;
            Ok(report.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use shaderio_core::AttributeValue;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("shaderio").chain(args.iter().copied())).unwrap()
    }

    fn source_scene(path: &Path) {
        let mut scene = MemoryScene::new();
        let mesh = scene.add_mesh("pCubeShape1", 6).unwrap();
        let sg = scene.create_node("shadingEngine", "blinn1SG").unwrap();
        let blinn = scene.create_node("blinn", "blinn1").unwrap();
        scene.set_attribute(&blinn, "eccentricity", AttributeValue::Float(0.2)).unwrap();
        scene.connect(&blinn, "outColor", &sg, "surfaceShader").unwrap();
        scene.assign_shader_to_faces(&sg, &mesh, None).unwrap();
        scene.save(path).unwrap();
    }

    fn target_scene(path: &Path) {
        let mut scene = MemoryScene::new();
        scene.add_mesh("pCubeShape1", 6).unwrap();
        scene.save(path).unwrap();
    }

    #[test]
    fn test_parse_selection() {
        assert_eq!(parse_selection("pCubeShape1").unwrap(), ("pCubeShape1", None));
        let (name, faces) = parse_selection("pCubeShape1.f[0:3,7]").unwrap();
        assert_eq!(name, "pCubeShape1");
        assert_eq!(faces.unwrap().to_string(), "0:3,7");
        assert!(parse_selection("pCubeShape1.f[0:3").is_err());
        assert!(parse_selection("pCubeShape1.f[]").is_err());
    }

    #[test]
    fn test_export_import_commands() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.ron");
        let target = dir.path().join("target.ron");
        let result = dir.path().join("result.ron");
        let manifest = dir.path().join("bundle.json");
        source_scene(&source);
        target_scene(&target);

        let s = |p: &Path| p.to_string_lossy().into_owned();
        let output = run(cli(&[
            "export", "--scene", &s(&source), "--out", &s(&manifest), "--select", "pCubeShape1.f[0:2]",
        ]))
        .unwrap();
        assert!(output.starts_with("Exported 2 nodes, 1 connections, 1 assignment targets"));

        let output = run(cli(&[
            "import", "--scene", &s(&target), "--manifest", &s(&manifest), "--out", &s(&result),
        ]))
        .unwrap();
        assert!(output.starts_with("Created 2 nodes"));

        let rebuilt = MemoryScene::load(&result).unwrap();
        let sg = rebuilt.node_by_name("blinn1SG").unwrap();
        let mesh = rebuilt.resolve_mesh_by_name("pCubeShape1").unwrap();
        assert_eq!(rebuilt.faces_assigned_to(sg, mesh), vec![0, 1, 2]);
        // the target snapshot itself was not touched
        assert_eq!(MemoryScene::load(&target).unwrap().node_count(), 1);
    }

    #[test]
    fn test_script_then_run() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.ron");
        let target = dir.path().join("target.ron");
        let manifest = dir.path().join("bundle.ron");
        let procedure = dir.path().join("rebuild.txt");
        source_scene(&source);
        target_scene(&target);

        let s = |p: &Path| p.to_string_lossy().into_owned();
        run(cli(&["export", "--scene", &s(&source), "--out", &s(&manifest), "--select", "pCubeShape1"])).unwrap();

        let text = run(cli(&["script", "--manifest", &s(&manifest)])).unwrap();
        assert!(text.contains(r#"assign(n0, "pCubeShape1", all)"#));
        std::fs::write(&procedure, text).unwrap();

        let output = run(cli(&["run", "--scene", &s(&target), "--procedure", &s(&procedure)])).unwrap();
        assert!(output.starts_with("Created 2 nodes, set 1 attributes"));
        let rebuilt = MemoryScene::load(&target).unwrap();
        assert_eq!(rebuilt.node_count(), 3);
    }

    #[test]
    fn test_unknown_selection() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.ron");
        source_scene(&source);
        let out = dir.path().join("bundle.ron");

        let result = run(cli(&[
            "export",
            "--scene",
            &source.to_string_lossy(),
            "--out",
            &out.to_string_lossy(),
            "--select",
            "pTorusShape1",
        ]));
        assert!(matches!(result, Err(AppError::Selection(_))));
        assert!(!out.exists());
    }
}
