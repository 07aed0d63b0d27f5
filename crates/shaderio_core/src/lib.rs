// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shading network transfer for 3D scenes.
//!
//! This crate captures shading networks and the mesh surfaces they are
//! assigned to into a portable manifest, and rebuilds equivalent networks
//! in another scene:
//! - Breadth-first graph capture with cycle safety and stable node ids
//! - Per-face assignment capture with a whole-object shortcut
//! - A versioned manifest codec (RON or JSON)
//! - Reconstruction plans, executed live or rendered as a procedure
//!
//! ## Architecture
//!
//! Everything goes through the [`Scene`] trait, the host scene graph API.
//! [`MemoryScene`] is an in-memory implementation used by the command line
//! tool and the tests.

pub mod cancel;
pub mod capture;
pub mod codec;
pub mod config;
pub mod error;
pub mod faces;
pub mod manifest;
pub mod plan;
pub mod record;
pub mod report;
pub mod scene;
pub mod transfer;
pub mod value;

pub use cancel::CancelToken;
pub use capture::CaptureMode;
pub use codec::ManifestFormat;
pub use config::{CaptureOptions, ConflictPolicy, ImportOptions, ShaderIoConfig, Traversal};
pub use error::{DecodeError, ProcedureError, Result, TransferError, TransferWarning, UnresolvedReference};
pub use faces::FaceSet;
pub use manifest::{Manifest, FORMAT_VERSION};
pub use plan::{PlanOp, Planner, ReconstructionPlan};
pub use record::{AssignmentRecord, AssignmentTarget, ConnectionRecord, NodeId, NodeRecord};
pub use report::{ExportReport, ImportReport};
pub use scene::{MemoryScene, Scene, SceneError, SceneHandle};
pub use transfer::{
    export_manifest, export_to_file, generate_procedure, import_from_file, import_manifest, parent_dir,
    plan_import, run_procedure,
};
pub use value::{AttributeKind, AttributeValue};
