// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node type schemas for [`MemoryScene`](super::MemoryScene).
//!
//! A schema lists the attributes a node type carries and their default
//! values. "Default" is what decides whether capture records an attribute.

use crate::value::{AttributeKind, AttributeValue};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Node type category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeCategory {
    /// Shading groups (network roots)
    ShadingGroup,
    /// Surface materials
    Surface,
    /// Texture nodes
    Texture,
    /// Utility nodes
    Utility,
    /// Geometry
    Geometry,
    /// Host housekeeping nodes
    System,
}

/// One attribute of a node type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDef {
    /// Attribute name
    pub name: String,
    /// Value a freshly created node holds
    pub default: AttributeValue,
}

impl AttributeDef {
    /// Create an attribute definition
    pub fn new(name: impl Into<String>, default: impl Into<AttributeValue>) -> Self {
        Self {
            name: name.into(),
            default: default.into(),
        }
    }

    /// Kind of value the attribute stores
    pub fn kind(&self) -> AttributeKind {
        self.default.kind()
    }
}

/// Node type definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSchema {
    /// Unique type identifier
    pub id: String,
    /// Category
    pub category: NodeCategory,
    /// Attributes with defaults
    pub attributes: Vec<AttributeDef>,
}

impl NodeSchema {
    /// Create a schema with no attributes
    pub fn new(id: impl Into<String>, category: NodeCategory) -> Self {
        Self {
            id: id.into(),
            category,
            attributes: Vec::new(),
        }
    }

    /// Add an attribute
    pub fn attr(mut self, name: &str, default: impl Into<AttributeValue>) -> Self {
        self.attributes.push(AttributeDef::new(name, default));
        self
    }

    /// Add several float-vector attributes sharing a default
    fn vectors(mut self, names: &[&str], default: [f64; 3]) -> Self {
        for name in names {
            self.attributes.push(AttributeDef::new(*name, default));
        }
        self
    }

    /// Copy the attributes of another schema under a new id
    fn derive(&self, id: &str) -> Self {
        Self {
            id: id.to_string(),
            category: self.category,
            attributes: self.attributes.clone(),
        }
    }

    /// Get an attribute definition by name
    pub fn attribute(&self, name: &str) -> Option<&AttributeDef> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

/// Registry of available node types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSchemaRegistry {
    /// Registered node types by ID
    types: IndexMap<String, NodeSchema>,
}

impl NodeSchemaRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            types: IndexMap::new(),
        }
    }

    /// Register a node type, replacing any type with the same id
    pub fn register(&mut self, schema: NodeSchema) {
        self.types.insert(schema.id.clone(), schema);
    }

    /// Get a node type by ID
    pub fn get(&self, id: &str) -> Option<&NodeSchema> {
        self.types.get(id)
    }

    /// Get all registered types
    pub fn types(&self) -> impl Iterator<Item = &NodeSchema> {
        self.types.values()
    }

    /// Get types by category
    pub fn types_in_category(&self, category: NodeCategory) -> impl Iterator<Item = &NodeSchema> {
        self.types.values().filter(move |t| t.category == category)
    }

    /// Registry with the common shading node types
    pub fn builtin() -> Self {
        let mut registry = Self::new();

        // ====================================================================
        // Shading groups and geometry
        // ====================================================================

        registry.register(
            NodeSchema::new("shadingEngine", NodeCategory::ShadingGroup)
                .vectors(&["surfaceShader", "volumeShader", "displacementShader"], [0.0; 3])
                .attr("aiSurfaceShader", [0.0; 3]),
        );

        registry.register(
            NodeSchema::new("mesh", NodeCategory::Geometry)
                .attr("instObjGroups", 0_i64)
                .attr("visibility", true),
        );

        registry.register(NodeSchema::new("transform", NodeCategory::Geometry).attr("visibility", true));

        registry.register(
            NodeSchema::new("materialInfo", NodeCategory::System)
                .attr("shadingGroup", 0_i64)
                .attr("texture", 0_i64),
        );

        // ====================================================================
        // Surface materials
        // ====================================================================

        let lambert = NodeSchema::new("lambert", NodeCategory::Surface)
            .attr("color", [0.5, 0.5, 0.5])
            .vectors(&["transparency", "ambientColor", "incandescence"], [0.0; 3])
            .attr("normalCamera", [1.0, 1.0, 1.0])
            .attr("diffuse", 0.8)
            .attr("translucence", 0.0)
            .vectors(&["outColor", "outTransparency"], [0.0; 3]);

        let blinn = lambert
            .derive("blinn")
            .attr("eccentricity", 0.3)
            .attr("specularRollOff", 0.7)
            .attr("specularColor", [0.5, 0.5, 0.5])
            .attr("reflectivity", 0.5)
            .attr("refractions", false)
            .attr("refractionLimit", 6_i64);

        let phong = lambert
            .derive("phong")
            .attr("cosinePower", 20.0)
            .attr("specularColor", [0.5, 0.5, 0.5])
            .attr("reflectivity", 0.5);

        registry.register(lambert);
        registry.register(blinn);
        registry.register(phong);

        registry.register(
            NodeSchema::new("aiStandardSurface", NodeCategory::Surface)
                .attr("base", 0.8)
                .attr("baseColor", [1.0, 1.0, 1.0])
                .attr("metalness", 0.0)
                .attr("specular", 1.0)
                .attr("specularRoughness", 0.2)
                .attr("specularIOR", 1.5)
                .attr("emission", 0.0)
                .attr("emissionColor", [1.0, 1.0, 1.0])
                .attr("thinWalled", false)
                .vectors(&["normalCamera", "outColor"], [0.0; 3])
                .attr("outAlpha", 0.0),
        );

        // ====================================================================
        // Textures and utilities
        // ====================================================================

        registry.register(
            NodeSchema::new("file", NodeCategory::Texture)
                .attr("fileTextureName", AttributeValue::FilePath(String::new()))
                .attr("colorSpace", "sRGB")
                .attr("filterType", 1_i64)
                .attr("alphaGain", 1.0)
                .attr("alphaIsLuminance", false)
                .attr("uvCoord", AttributeValue::Vector(vec![0.0, 0.0]))
                .attr("outColor", [0.0; 3])
                .attr("outAlpha", 0.0),
        );

        registry.register(
            NodeSchema::new("place2dTexture", NodeCategory::Utility)
                .attr("repeatUV", AttributeValue::Vector(vec![1.0, 1.0]))
                .attr("offset", AttributeValue::Vector(vec![0.0, 0.0]))
                .attr("rotateUV", 0.0)
                .attr("wrapU", true)
                .attr("wrapV", true)
                .attr("outUV", AttributeValue::Vector(vec![0.0, 0.0])),
        );

        registry.register(
            NodeSchema::new("bump2d", NodeCategory::Utility)
                .attr("bumpValue", 0.0)
                .attr("bumpDepth", 1.0)
                .attr("bumpInterp", 0_i64)
                .attr("outNormal", [0.0; 3]),
        );

        registry.register(
            NodeSchema::new("ramp", NodeCategory::Texture)
                .attr("type", 0_i64)
                .attr("interpolation", 1_i64)
                .attr("uvCoord", AttributeValue::Vector(vec![0.0, 0.0]))
                .attr("outColor", [0.0; 3])
                .attr("outAlpha", 0.0),
        );

        registry.register(
            NodeSchema::new("multiplyDivide", NodeCategory::Utility)
                .attr("operation", 1_i64)
                .vectors(&["input1", "input2"], [0.0; 3])
                .attr("output", [0.0; 3]),
        );

        registry
    }
}

impl Default for NodeSchemaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_types() {
        let registry = NodeSchemaRegistry::builtin();
        assert!(registry.get("shadingEngine").is_some());
        assert_eq!(registry.types_in_category(NodeCategory::ShadingGroup).count(), 1);

        let blinn = registry.get("blinn").unwrap();
        assert_eq!(blinn.attribute("color").unwrap().kind(), AttributeKind::Vector);
        assert_eq!(blinn.attribute("eccentricity").unwrap().default, AttributeValue::Float(0.3));
        assert_eq!(blinn.category, NodeCategory::Surface);
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = NodeSchemaRegistry::new();
        registry.register(NodeSchema::new("custom", NodeCategory::Utility).attr("a", 1.0));
        registry.register(NodeSchema::new("custom", NodeCategory::Utility).attr("b", 2.0));
        assert_eq!(registry.types().count(), 1);
        assert!(registry.get("custom").unwrap().attribute("a").is_none());
    }
}
