//! Driver that turns annotated declarations into binding records.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::attributes::{AttributeKind, AttributeRecord, Attributes};
use crate::declaration::{Annotation, Declaration, Enumerator, Parameter};
use crate::declarator::Declarator;
use crate::extractor::has_marker;
use crate::mapper::TypeMapper;
use crate::registry::{MappedType, TypeRegistry};
use crate::Result;

/// Markers recognised when none are configured.
pub const DEFAULT_MARKERS: &[&str] = &["REFLECT", "PROPERTY", "FUNCTION", "ENUM"];

/// Attribute whose value becomes a field's initializer literal.
const DEFAULT_ATTRIBUTE: &str = "default";

/// Declaration kind of a [`BindingRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Class,
    Field,
    Function,
    Enum,
}

/// An attribute together with its rendered literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedAttribute {
    pub name: String,
    pub value: String,
    pub kind: AttributeKind,
    pub literal: String,
}

impl RenderedAttribute {
    fn render(record: &AttributeRecord) -> Result<Self> {
        Ok(Self {
            literal: record.literal()?,
            name: record.name.clone(),
            value: record.value.clone(),
            kind: record.kind,
        })
    }
}

/// A function parameter after type mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: MappedType,
    pub cpp_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// Everything the template emitter needs for one annotated declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingRecord {
    pub kind: RecordKind,
    pub name: String,

    /// `::`-joined path of enclosing namespaces and classes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    pub marker: String,
    pub attributes: Vec<RenderedAttribute>,

    /// Field type, function result or enum underlying type.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<MappedType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpp_type: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<MappedParameter>,

    /// Literal of a field's `default` attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_literal: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bases: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enumerators: Vec<Enumerator>,

    #[serde(default)]
    pub is_static: bool,

    #[serde(default)]
    pub is_const: bool,
}

impl BindingRecord {
    fn new(kind: RecordKind, name: &str, owner: &[String], marker: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            owner: (!owner.is_empty()).then(|| owner.join("::")),
            marker: marker.to_string(),
            attributes: Vec::new(),
            ty: None,
            cpp_type: None,
            params: Vec::new(),
            default_literal: None,
            bases: Vec::new(),
            enumerators: Vec::new(),
            is_static: false,
            is_const: false,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&RenderedAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Qualified name of the declaration itself.
    pub fn qualified_name(&self) -> String {
        match &self.owner {
            Some(owner) => format!("{}::{}", owner, self.name),
            None => self.name.clone(),
        }
    }
}

/// Collects parsed declarations and produces [`BindingRecord`]s for the
/// annotated ones.
#[derive(Debug)]
pub struct BindingGenerator {
    registry: TypeRegistry,

    /// Parsed declarations, in the order they were added.
    declarations: Vec<Declaration>,

    /// Annotation macro names that select a declaration.
    markers: Vec<String>,

    /// Reject malformed payloads instead of tokenizing them permissively.
    strict_attributes: bool,
}

impl Default for BindingGenerator {
    fn default() -> Self {
        Self {
            registry: TypeRegistry::with_builtins(),
            declarations: Vec::new(),
            markers: DEFAULT_MARKERS.iter().map(|m| m.to_string()).collect(),
            strict_attributes: false,
        }
    }
}

impl BindingGenerator {
    /// Create a generator with the built-in type registry and default markers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a generator that maps types with `registry`.
    pub fn with_registry(registry: TypeRegistry) -> Self {
        Self {
            registry,
            ..Self::default()
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Add an annotation macro name to recognise.
    ///
    /// ```
    /// use cppbind_codegen::BindingGenerator;
    ///
    /// let mut generator = BindingGenerator::new();
    /// generator.add_marker("SIGNAL");
    /// ```
    pub fn add_marker(&mut self, marker: impl Into<String>) -> &mut Self {
        self.markers.push(marker.into());
        self
    }

    /// Set the recognised annotation macro names, replacing the defaults.
    pub fn set_markers(&mut self, markers: &[impl AsRef<str>]) -> &mut Self {
        self.markers = markers.iter().map(|s| s.as_ref().to_string()).collect();
        self
    }

    /// Register or override a type mapping.
    ///
    /// ```
    /// use cppbind_codegen::{BindingGenerator, MappedType};
    ///
    /// let mut generator = BindingGenerator::new();
    /// generator.register_type("Vec3", MappedType::primitive("Vector3"));
    /// ```
    pub fn register_type(&mut self, name: impl Into<String>, mapped: MappedType) -> &mut Self {
        self.registry.register(name, mapped);
        self
    }

    pub fn unregister_type(&mut self, name: &str) -> &mut Self {
        self.registry.unregister(name);
        self
    }

    /// Treat `name<T>` as `T` when mapping.
    pub fn add_unwrappable(&mut self, name: impl Into<String>) -> &mut Self {
        self.registry.add_unwrappable(name);
        self
    }

    pub fn set_pointer_token(&mut self, token: impl Into<String>) -> &mut Self {
        self.registry.set_pointer_token(token);
        self
    }

    /// Merge a JSON type overlay file into the registry.
    pub fn load_type_overlay(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        self.registry.load_overlay(path)?;
        Ok(self)
    }

    pub fn set_strict_attributes(&mut self, strict: bool) -> &mut Self {
        self.strict_attributes = strict;
        self
    }

    pub fn add_declaration(&mut self, declaration: Declaration) -> &mut Self {
        self.declarations.push(declaration);
        self
    }

    pub fn add_declarations(
        &mut self,
        declarations: impl IntoIterator<Item = Declaration>,
    ) -> &mut Self {
        self.declarations.extend(declarations);
        self
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    /// Produce one record per annotated declaration, in declaration order.
    pub fn generate(&self) -> Result<Vec<BindingRecord>> {
        let mut records = Vec::new();
        let mut scope = Vec::new();
        for declaration in &self.declarations {
            self.visit(declaration, &mut scope, &mut records)?;
        }
        debug!(records = records.len(), "generated binding records");
        Ok(records)
    }

    /// Records as pretty-printed JSON for the template emitter.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.generate()?)?)
    }

    /// Write the JSON records to a file, creating parent directories.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, json + "\n")?;
        Ok(())
    }

    /// Write the JSON records to any writer.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        serde_json::to_writer_pretty(&mut writer, &self.generate()?)?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    fn visit(
        &self,
        declaration: &Declaration,
        scope: &mut Vec<String>,
        out: &mut Vec<BindingRecord>,
    ) -> Result<()> {
        let annotated = record_kind(declaration).zip(declaration.annotation());
        if let Some((kind, annotation)) = annotated {
            if has_marker(annotation, &self.markers) {
                out.push(self.record(kind, declaration, annotation, scope)?);
            } else {
                warn!(
                    declaration = declaration.name(),
                    marker = %annotation.marker,
                    "skipping declaration with unrecognised annotation marker"
                );
            }
        }

        let members = declaration.members();
        if members.is_empty() {
            return Ok(());
        }

        // Anonymous namespaces don't add a path component.
        let named = !declaration.name().is_empty();
        if named {
            scope.push(declaration.name().to_string());
        }
        for member in members {
            self.visit(member, scope, out)?;
        }
        if named {
            scope.pop();
        }
        Ok(())
    }

    fn record(
        &self,
        kind: RecordKind,
        declaration: &Declaration,
        annotation: &Annotation,
        scope: &[String],
    ) -> Result<BindingRecord> {
        debug!(
            declaration = declaration.name(),
            marker = %annotation.marker,
            "processing annotated declaration"
        );

        let attributes = if self.strict_attributes {
            Attributes::parse_strict(&annotation.payload)?
        } else {
            Attributes::parse(&annotation.payload)
        };
        let mapper = TypeMapper::new(&self.registry);

        let mut record = BindingRecord::new(kind, declaration.name(), scope, &annotation.marker);
        record.attributes = attributes
            .iter()
            .map(RenderedAttribute::render)
            .collect::<Result<_>>()?;

        match declaration {
            Declaration::Class { bases, .. } => {
                record.bases = bases.clone();
            }
            Declaration::Field { ty, is_static, .. } => {
                record.ty = Some(mapper.map(ty));
                record.cpp_type = Some(ty.to_string());
                record.is_static = *is_static;
                record.default_literal = attributes
                    .get(DEFAULT_ATTRIBUTE)
                    .map(AttributeRecord::literal)
                    .transpose()?;
            }
            Declaration::Function {
                result,
                params,
                is_static,
                is_const,
                ..
            } => {
                record.ty = Some(mapper.map(result));
                record.cpp_type = Some(result.to_string());
                record.is_static = *is_static;
                record.is_const = *is_const;
                record.params = params.iter().map(|p| map_parameter(&mapper, p)).collect();
            }
            Declaration::Enum {
                underlying,
                enumerators,
                ..
            } => {
                let underlying = underlying
                    .clone()
                    .unwrap_or_else(|| Declarator::fundamental("int"));
                record.ty = Some(mapper.map(&underlying));
                record.cpp_type = Some(underlying.to_string());
                record.enumerators = enumerators.clone();
            }
            Declaration::Namespace { .. } => {}
        }

        Ok(record)
    }
}

fn record_kind(declaration: &Declaration) -> Option<RecordKind> {
    match declaration {
        Declaration::Namespace { .. } => None,
        Declaration::Class { .. } => Some(RecordKind::Class),
        Declaration::Field { .. } => Some(RecordKind::Field),
        Declaration::Function { .. } => Some(RecordKind::Function),
        Declaration::Enum { .. } => Some(RecordKind::Enum),
    }
}

fn map_parameter(mapper: &TypeMapper<'_>, param: &Parameter) -> MappedParameter {
    MappedParameter {
        name: param.name.clone(),
        ty: mapper.map(&param.ty),
        cpp_type: param.ty.to_string(),
        default: param.default.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CodegenError;

    fn field(name: &str, ty: Declarator, annotation: Option<Annotation>) -> Declaration {
        Declaration::Field {
            name: name.to_string(),
            ty,
            annotation,
            is_static: false,
        }
    }

    #[test]
    fn test_generate_field_record() {
        let mut generator = BindingGenerator::new();
        generator.add_declaration(field(
            "speed",
            Declarator::fundamental("float"),
            Some(Annotation::new("PROPERTY", "Serialize, default = 2.5, tooltip=\"m/s\"")),
        ));

        let records = generator.generate().unwrap();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.kind, RecordKind::Field);
        assert_eq!(record.ty, Some(MappedType::primitive("float")));
        assert_eq!(record.default_literal.as_deref(), Some("2.5"));
        assert_eq!(record.attribute("Serialize").unwrap().literal, "true");
        assert_eq!(record.attribute("tooltip").unwrap().literal, "\"m/s\"");
        assert!(record.owner.is_none());
    }

    #[test]
    fn test_unannotated_declarations_are_skipped() {
        let mut generator = BindingGenerator::new();
        generator.add_declaration(field("hidden", Declarator::fundamental("int"), None));
        assert!(generator.generate().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_marker_is_skipped() {
        let mut generator = BindingGenerator::new();
        generator.add_declaration(field(
            "x",
            Declarator::fundamental("int"),
            Some(Annotation::new("DEPRECATED", "")),
        ));
        assert!(generator.generate().unwrap().is_empty());

        generator.add_marker("DEPRECATED");
        assert_eq!(generator.generate().unwrap().len(), 1);
    }

    #[test]
    fn test_set_markers_replaces_defaults() {
        let mut generator = BindingGenerator::new();
        generator.set_markers(&["PROP"]);
        generator.add_declarations([
            field("a", Declarator::fundamental("int"), Some(Annotation::new("PROP", ""))),
            field("b", Declarator::fundamental("int"), Some(Annotation::new("PROPERTY", ""))),
        ]);

        let records = generator.generate().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "a");
    }

    #[test]
    fn test_owner_path_and_order() {
        let mut generator = BindingGenerator::new();
        generator.add_declaration(Declaration::Namespace {
            name: "game".to_string(),
            members: vec![Declaration::Class {
                name: "Player".to_string(),
                annotation: Some(Annotation::new("REFLECT", "")),
                bases: vec!["Node".to_string()],
                members: vec![
                    field(
                        "target",
                        Declarator::pointer(Declarator::named("Node")),
                        Some(Annotation::new("PROPERTY", "")),
                    ),
                    Declaration::Function {
                        name: "jump".to_string(),
                        result: Declarator::fundamental("bool"),
                        params: vec![
                            Parameter::new("height", Declarator::fundamental("float"))
                                .with_default("1.0f"),
                            Parameter::new(
                                "buffer",
                                Declarator::reference(Declarator::named("ByteBuffer")),
                            ),
                        ],
                        annotation: Some(Annotation::new("FUNCTION", "Callable")),
                        is_static: false,
                        is_const: false,
                    },
                ],
            }],
        });

        let records = generator.generate().unwrap();
        let names: Vec<_> = records.iter().map(|r| r.qualified_name()).collect();
        assert_eq!(
            names,
            vec!["game::Player", "game::Player::target", "game::Player::jump"]
        );

        assert_eq!(records[0].bases, vec!["Node".to_string()]);
        assert_eq!(records[1].ty, Some(MappedType::managed("Node")));
        assert_eq!(records[1].cpp_type.as_deref(), Some("Node*"));

        let jump = &records[2];
        assert_eq!(jump.ty, Some(MappedType::primitive("bool")));
        assert_eq!(jump.params[0].ty, MappedType::primitive("float"));
        assert_eq!(jump.params[0].default.as_deref(), Some("1.0f"));
        assert_eq!(jump.params[1].ty, MappedType::managed("byte[]"));
        assert_eq!(jump.params[1].cpp_type, "ByteBuffer&");
    }

    #[test]
    fn test_members_of_unannotated_class_are_found() {
        let mut generator = BindingGenerator::new();
        generator.add_declaration(Declaration::Class {
            name: "Config".to_string(),
            annotation: None,
            bases: vec![],
            members: vec![field(
                "volume",
                Declarator::fundamental("double"),
                Some(Annotation::new("PROPERTY", "")),
            )],
        });

        let records = generator.generate().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].owner.as_deref(), Some("Config"));
    }

    #[test]
    fn test_anonymous_namespace_adds_no_scope() {
        let mut generator = BindingGenerator::new();
        generator.add_declaration(Declaration::Namespace {
            name: String::new(),
            members: vec![field(
                "counter",
                Declarator::fundamental("int"),
                Some(Annotation::new("PROPERTY", "")),
            )],
        });
        let records = generator.generate().unwrap();
        assert!(records[0].owner.is_none());
    }

    #[test]
    fn test_enum_record_defaults_to_int() {
        let mut generator = BindingGenerator::new();
        generator.add_declaration(Declaration::Enum {
            name: "Layer".to_string(),
            underlying: None,
            enumerators: vec![
                Enumerator {
                    name: "Default".to_string(),
                    value: Some("0".to_string()),
                },
                Enumerator {
                    name: "UI".to_string(),
                    value: None,
                },
            ],
            annotation: Some(Annotation::new("ENUM", "flags=false")),
        });

        let records = generator.generate().unwrap();
        assert_eq!(records[0].kind, RecordKind::Enum);
        assert_eq!(records[0].ty, Some(MappedType::primitive("int")));
        assert_eq!(records[0].enumerators.len(), 2);
        assert_eq!(records[0].attribute("flags").unwrap().literal, "false");
    }

    #[test]
    fn test_custom_types_and_unwrappables() {
        let mut generator = BindingGenerator::new();
        generator
            .register_type("Vec3", MappedType::primitive("Vector3"))
            .add_unwrappable("WeakRef")
            .add_declaration(field(
                "position",
                Declarator::template("WeakRef", vec![Declarator::named("math::Vec3")]),
                Some(Annotation::new("PROPERTY", "")),
            ));

        let records = generator.generate().unwrap();
        assert_eq!(records[0].ty, Some(MappedType::primitive("Vector3")));
    }

    #[test]
    fn test_strict_attributes_surface_errors() {
        let mut generator = BindingGenerator::new();
        generator.add_declaration(field(
            "name",
            Declarator::named("String"),
            Some(Annotation::new("PROPERTY", "default=\"unterminated")),
        ));

        assert!(generator.generate().is_ok());

        generator.set_strict_attributes(true);
        let err = generator.generate().unwrap_err();
        assert!(matches!(err, CodegenError::MalformedAttributes { .. }));
    }

    #[test]
    fn test_to_json_shape() {
        let mut generator = BindingGenerator::new();
        generator.add_declaration(field(
            "id",
            Declarator::named("ID"),
            Some(Annotation::new("PROPERTY", "ReadOnly")),
        ));

        let json: serde_json::Value = serde_json::from_str(&generator.to_json().unwrap()).unwrap();
        assert_eq!(json[0]["kind"], "field");
        assert_eq!(json[0]["type"]["target"], "ulong");
        assert_eq!(json[0]["type"]["primitive"], true);
        assert_eq!(json[0]["attributes"][0]["kind"], "bool");
        assert!(json[0].get("owner").is_none());
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/records.json");

        let mut generator = BindingGenerator::new();
        generator.add_declaration(field(
            "mass",
            Declarator::fundamental("float"),
            Some(Annotation::new("PROPERTY", "")),
        ));
        generator.write_to_file(&path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        let records: Vec<BindingRecord> = serde_json::from_str(&written).unwrap();
        assert_eq!(records, generator.generate().unwrap());
    }

    #[test]
    fn test_write_to_writer() {
        let mut generator = BindingGenerator::new();
        generator.add_declaration(field(
            "mass",
            Declarator::fundamental("float"),
            Some(Annotation::new("PROPERTY", "")),
        ));
        let mut buffer = Vec::new();
        generator.write_to(&mut buffer).unwrap();
        assert!(String::from_utf8(buffer).unwrap().ends_with("]\n"));
    }
}
