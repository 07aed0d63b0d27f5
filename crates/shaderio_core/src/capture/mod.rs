// SPDX-License-Identifier: MIT OR Apache-2.0
//! Capture of shading networks and their surface assignments.

pub mod assignment;
pub mod graph;

pub use assignment::{capture_assignments, CapturedAssignments};
pub use graph::{CapturedGraph, GraphCapture};

use serde::{Deserialize, Serialize};

/// What the export selection is interpreted as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CaptureMode {
    /// Meshes or mesh faces; networks and assignments are captured
    #[default]
    Mesh,
    /// Shading roots; only the networks are captured
    ShaderOnly,
}
