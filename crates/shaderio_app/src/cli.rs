// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command-line arguments.

use clap::{Parser, Subcommand, ValueEnum};
use shaderio_core::{CaptureMode, ConflictPolicy, ManifestFormat};
use std::path::PathBuf;

/// Export and import shading networks between scene snapshots
#[derive(Parser, Debug, Clone)]
#[command(name = "shaderio", author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file (RON)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Capture the selected networks of a scene into a manifest
    Export {
        /// Scene snapshot to read
        #[arg(long)]
        scene: PathBuf,

        /// Manifest file to write
        #[arg(long)]
        out: PathBuf,

        /// What the selection holds
        #[arg(long, value_enum, default_value_t = ModeArg::Mesh)]
        mode: ModeArg,

        /// Manifest syntax when the file extension does not decide it
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Replace the saved selection, e.g. `pCubeShape1` or `pCubeShape1.f[0:3,7]`
        #[arg(long = "select")]
        select: Vec<String>,
    },

    /// Rebuild the networks of a manifest inside a scene
    Import {
        /// Scene snapshot to import into
        #[arg(long)]
        scene: PathBuf,

        /// Manifest file to read
        #[arg(long)]
        manifest: PathBuf,

        /// Where to write the resulting scene (defaults to overwriting `--scene`)
        #[arg(long)]
        out: Option<PathBuf>,

        /// What to do when a root name already exists
        #[arg(long, value_enum)]
        conflict: Option<ConflictArg>,
    },

    /// Print the procedure equivalent to importing a manifest
    Script {
        /// Manifest file to read
        #[arg(long)]
        manifest: PathBuf,

        /// Scene the procedure will run in, for the conflict policy
        #[arg(long)]
        scene: Option<PathBuf>,
    },

    /// Run a generated procedure against a scene
    Run {
        /// Scene snapshot to modify
        #[arg(long)]
        scene: PathBuf,

        /// Procedure file
        #[arg(long)]
        procedure: PathBuf,

        /// Where to write the resulting scene (defaults to overwriting `--scene`)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

/// Export capture mode
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModeArg {
    /// Meshes or faces are selected
    #[default]
    Mesh,
    /// Shading roots are selected
    Shader,
}

impl From<ModeArg> for CaptureMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Mesh => CaptureMode::Mesh,
            ModeArg::Shader => CaptureMode::ShaderOnly,
        }
    }
}

/// Manifest syntax
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    /// Rusty Object Notation
    Ron,
    /// JSON
    Json,
}

impl From<FormatArg> for ManifestFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Ron => ManifestFormat::Ron,
            FormatArg::Json => ManifestFormat::Json,
        }
    }
}

/// Import conflict policy
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictArg {
    /// Suffix colliding names
    Rename,
    /// Leave existing networks alone
    Skip,
}

impl From<ConflictArg> for ConflictPolicy {
    fn from(conflict: ConflictArg) -> Self {
        match conflict {
            ConflictArg::Rename => ConflictPolicy::Rename,
            ConflictArg::Skip => ConflictPolicy::Skip,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_export() {
        let cli = Cli::try_parse_from([
            "shaderio", "-v", "export", "--scene", "a.ron", "--out", "m.json", "--mode", "shader",
            "--select", "blinn1SG",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Command::Export { mode, format, select, .. } => {
                assert_eq!(mode, ModeArg::Shader);
                assert_eq!(format, None);
                assert_eq!(select, vec!["blinn1SG".to_string()]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_import_with_global_config() {
        let cli = Cli::try_parse_from([
            "shaderio", "import", "--scene", "b.ron", "--manifest", "m.ron", "--conflict", "skip",
            "--config", "shaderio.ron",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("shaderio.ron")));
        assert!(matches!(
            cli.command,
            Command::Import {
                conflict: Some(ConflictArg::Skip),
                out: None,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_required_argument() {
        assert!(Cli::try_parse_from(["shaderio", "run", "--scene", "a.ron"]).is_err());
    }
}
