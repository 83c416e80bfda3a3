//! # cppbind-codegen
//!
//! Core of the engine's annotation-driven binding generator. It consumes C++
//! declarations produced by the header parser, tokenizes the payloads of
//! their annotation macros and maps their types to C# binding types. The
//! resulting records feed the template emitter that writes the actual source.
//!
//! ## Pipeline
//!
//! 1. [`parse_attributes`] turns `PROPERTY(Serialize, default = 3)` payloads
//!    into typed [`AttributeRecord`]s.
//! 2. [`Declarator::normalized`] looks through references and pointers to
//!    non-scalar types.
//! 3. [`TypeMapper`] resolves the normalized type through a [`TypeRegistry`],
//!    unwrapping `RC<T>`/`Handle<T>`.
//! 4. [`format_literal`] renders attribute values as C# literals.
//!
//! [`BindingGenerator`] drives all four over a parsed header.
//!
//! ## Quick Start
//!
//! ```rust
//! use cppbind_codegen::{Annotation, BindingGenerator, Declaration, Declarator, MappedType};
//!
//! let mut generator = BindingGenerator::new();
//! generator.add_declaration(Declaration::Field {
//!     name: "target".to_string(),
//!     ty: Declarator::pointer(Declarator::named("Node")),
//!     annotation: Some(Annotation::new("PROPERTY", "Serialize, tooltip = \"Follow target\"")),
//!     is_static: false,
//! });
//!
//! let records = generator.generate().unwrap();
//! assert_eq!(records[0].ty, Some(MappedType::managed("Node")));
//! assert_eq!(records[0].attributes[1].literal, "\"Follow target\"");
//! ```
//!
//! ## Reading parser output
//!
//! ```no_run
//! use cppbind_codegen::BindingGenerator;
//!
//! fn main() -> cppbind_codegen::Result<()> {
//!     BindingGenerator::new()
//!         .load_type_overlay("bindings/types.json")?
//!         .add_source_dir("build/ast")?
//!         .write_to_file("build/bindings/records.json")
//! }
//! ```

mod attributes;
mod declaration;
mod declarator;
mod extractor;
mod generator;
mod literal;
mod mapper;
pub mod registry;

pub use attributes::{
    AttributeKind, AttributeRecord, Attributes, parse_attributes, parse_attributes_strict,
    render_attributes,
};
pub use declaration::{Annotation, Declaration, Enumerator, Parameter};
pub use declarator::{Declarator, NameSegment, TemplateArgument, normalize};
pub use extractor::has_marker;
pub use generator::{
    BindingGenerator, BindingRecord, DEFAULT_MARKERS, MappedParameter, RecordKind,
    RenderedAttribute,
};
pub use literal::format_literal;
pub use mapper::{TypeMapper, map_type};
pub use registry::{MappedType, TypeRegistry};

use thiserror::Error;

/// Errors surfaced to the driver's caller.
#[derive(Error, Debug)]
pub enum CodegenError {
    /// A value without a kind was asked to render as a literal.
    #[error("cannot render attribute value `{value}` without a kind")]
    InvalidAttributeKind { value: String },

    /// Strict tokenization rejected a payload.
    #[error("malformed attributes `{payload}`: {reason}")]
    MalformedAttributes { payload: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for codegen operations.
pub type Result<T> = std::result::Result<T, CodegenError>;
