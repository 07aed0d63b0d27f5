// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed attribute values carried by captured nodes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of value an attribute holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeKind {
    /// Boolean value
    Bool,
    /// Integer value (also enums and shorts on most hosts)
    Int,
    /// Floating point value
    Float,
    /// Flat list of floats (colors, vectors, compound numerics)
    Vector,
    /// Plain string
    String,
    /// Reference to a file on disk (textures)
    FilePath,
}

impl AttributeKind {
    /// Check if a value of `other` kind can be stored in an attribute of this kind
    pub fn accepts(&self, other: AttributeKind) -> bool {
        if *self == other {
            return true;
        }

        match (self, other) {
            // Numeric conversions
            (Self::Float, Self::Int) | (Self::Int, Self::Bool) => true,
            // Paths are strings on every host we know of
            (Self::String, Self::FilePath) | (Self::FilePath, Self::String) => true,
            _ => false,
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Vector => "vector",
            Self::String => "string",
            Self::FilePath => "file",
        };
        f.write_str(name)
    }
}

/// Value of a single node attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Float
    Float(f64),
    /// Flat list of floats
    Vector(Vec<f64>),
    /// String
    String(String),
    /// File path, either absolute or relative to the manifest's directory
    FilePath(String),
}

impl AttributeValue {
    /// Get the kind of this value
    pub fn kind(&self) -> AttributeKind {
        match self {
            Self::Bool(_) => AttributeKind::Bool,
            Self::Int(_) => AttributeKind::Int,
            Self::Float(_) => AttributeKind::Float,
            Self::Vector(_) => AttributeKind::Vector,
            Self::String(_) => AttributeKind::String,
            Self::FilePath(_) => AttributeKind::FilePath,
        }
    }

    /// Convert this value so it can be stored in an attribute of `kind`.
    ///
    /// Returns `None` when the kinds are incompatible.
    pub fn coerce(self, kind: AttributeKind) -> Option<Self> {
        if !kind.accepts(self.kind()) {
            return None;
        }

        Some(match (kind, self) {
            (AttributeKind::Float, Self::Int(v)) => Self::Float(v as f64),
            (AttributeKind::Int, Self::Bool(v)) => Self::Int(i64::from(v)),
            (AttributeKind::String, Self::FilePath(p)) => Self::String(p),
            (AttributeKind::FilePath, Self::String(s)) => Self::FilePath(s),
            (_, value) => value,
        })
    }

    /// Get the file path if this is a file reference
    pub fn as_file_path(&self) -> Option<&str> {
        match self {
            Self::FilePath(path) => Some(path),
            _ => None,
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<[f64; 3]> for AttributeValue {
    fn from(v: [f64; 3]) -> Self {
        Self::Vector(v.to_vec())
    }
}
