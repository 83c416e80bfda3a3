//! Declarations delivered by the C++ header parser.

use serde::{Deserialize, Serialize};

use crate::declarator::Declarator;

/// An annotation macro attached to a declaration, e.g. `PROPERTY(Serialize)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Macro name, e.g. `PROPERTY`.
    pub marker: String,
    /// Text between the macro's brackets.
    #[serde(default)]
    pub payload: String,
}

impl Annotation {
    pub fn new(marker: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            payload: payload.into(),
        }
    }
}

/// A function parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Declarator,
    /// Default argument as written in the header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: Declarator) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// One enumerator of an enum declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enumerator {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// A declaration in a parsed header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Declaration {
    Namespace {
        name: String,
        #[serde(default)]
        members: Vec<Declaration>,
    },

    /// `class` or `struct`.
    Class {
        name: String,
        #[serde(default)]
        annotation: Option<Annotation>,
        #[serde(default)]
        bases: Vec<String>,
        #[serde(default)]
        members: Vec<Declaration>,
    },

    Field {
        name: String,
        #[serde(rename = "type")]
        ty: Declarator,
        #[serde(default)]
        annotation: Option<Annotation>,
        #[serde(default)]
        is_static: bool,
    },

    /// Free function or member function.
    Function {
        name: String,
        result: Declarator,
        #[serde(default)]
        params: Vec<Parameter>,
        #[serde(default)]
        annotation: Option<Annotation>,
        #[serde(default)]
        is_static: bool,
        #[serde(default)]
        is_const: bool,
    },

    Enum {
        name: String,
        #[serde(default)]
        underlying: Option<Declarator>,
        #[serde(default)]
        enumerators: Vec<Enumerator>,
        #[serde(default)]
        annotation: Option<Annotation>,
    },
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Namespace { name, .. }
            | Declaration::Class { name, .. }
            | Declaration::Field { name, .. }
            | Declaration::Function { name, .. }
            | Declaration::Enum { name, .. } => name,
        }
    }

    pub fn annotation(&self) -> Option<&Annotation> {
        match self {
            Declaration::Namespace { .. } => None,
            Declaration::Class { annotation, .. }
            | Declaration::Field { annotation, .. }
            | Declaration::Function { annotation, .. }
            | Declaration::Enum { annotation, .. } => annotation.as_ref(),
        }
    }

    /// Nested declarations of namespaces and classes.
    pub fn members(&self) -> &[Declaration] {
        match self {
            Declaration::Namespace { members, .. } | Declaration::Class { members, .. } => members,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_class_with_members() {
        let json = r#"{
            "kind": "class",
            "name": "Player",
            "annotation": { "marker": "REFLECT", "payload": "Scriptable" },
            "bases": ["Node"],
            "members": [
                {
                    "kind": "field",
                    "name": "health",
                    "type": { "kind": "fundamental", "name": "float" },
                    "annotation": { "marker": "PROPERTY", "payload": "default = 100.0" }
                },
                {
                    "kind": "function",
                    "name": "respawn",
                    "result": { "kind": "fundamental", "name": "void" },
                    "params": [
                        { "name": "delay", "type": { "kind": "fundamental", "name": "float" }, "default": "0.0f" }
                    ]
                }
            ]
        }"#;

        let decl: Declaration = serde_json::from_str(json).unwrap();
        assert_eq!(decl.name(), "Player");
        assert_eq!(decl.annotation(), Some(&Annotation::new("REFLECT", "Scriptable")));
        assert_eq!(decl.members().len(), 2);

        match &decl.members()[1] {
            Declaration::Function { params, annotation, .. } => {
                assert!(annotation.is_none());
                assert_eq!(
                    params[0],
                    Parameter::new("delay", Declarator::fundamental("float")).with_default("0.0f")
                );
            }
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_leaf_declarations_have_no_members() {
        let field = Declaration::Field {
            name: "id".to_string(),
            ty: Declarator::named("ID"),
            annotation: None,
            is_static: false,
        };
        assert!(field.members().is_empty());
        assert!(field.annotation().is_none());
    }

    #[test]
    fn test_annotation_payload_defaults_to_empty() {
        let annotation: Annotation = serde_json::from_str(r#"{ "marker": "FUNCTION" }"#).unwrap();
        assert_eq!(annotation.payload, "");
    }
}
