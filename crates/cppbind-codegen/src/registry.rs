//! Translation table from C++ type names to C# binding types.
//!
//! The registry is the one place the mapper learns about the host project's
//! vocabulary. [`TypeRegistry::with_builtins`] covers the C++ scalars and the
//! engine's common aliases; projects can extend it in code or with a JSON
//! overlay file.
//!
//! # Built-in mappings
//!
//! | C++ type | C# type | Primitive |
//! |----------|---------|-----------|
//! | `bool`, `char`, `int`, `float`, `double`, `void` | same name | yes |
//! | `unsigned char` / `short` / `unsigned short` | `byte` / `short` / `ushort` | yes |
//! | `long` / `unsigned long` | `int` / `uint` | yes |
//! | `long long` / `unsigned long long` | `long` / `ulong` | yes |
//! | `int8`..`int64`, `int8_t`..`int64_t` | `sbyte`, `short`, `int`, `long` | yes |
//! | `uint8`..`uint64`, `uint8_t`..`uint64_t` | `byte`, `ushort`, `uint`, `ulong` | yes |
//! | `size_t` | `ulong` | yes |
//! | `std::string`, `String`, `StringView` | `string` | yes |
//! | `ByteBuffer` | `byte[]` | no |
//! | `ID` | `ulong` | yes |
//! | `Node`, `Resource` | same name | no |
//!
//! `RC<T>` and `Handle<T>` are unwrapped to `T`. Pointers to scalars map to
//! `IntPtr`.
//!
//! # Overlay files
//!
//! ```json
//! {
//!   "pointer_token": "IntPtr",
//!   "types": { "Vec3": { "target": "Vector3", "primitive": true } },
//!   "unwrappable": ["WeakRef"]
//! }
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Result;

/// Default token for pointers that survive normalization.
pub const DEFAULT_POINTER_TOKEN: &str = "IntPtr";

/// A resolved target-language type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MappedType {
    /// Target-language spelling, e.g. `int` or `Node`.
    #[serde(rename = "target")]
    pub name: String,

    /// Whether the binding can pass the value directly. Non-primitive types go
    /// through the generic accessor path.
    #[serde(rename = "primitive")]
    pub is_primitive: bool,
}

impl MappedType {
    pub fn primitive(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_primitive: true,
        }
    }

    pub fn managed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_primitive: false,
        }
    }
}

/// Name-to-type table plus the set of transparently unwrapped templates.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    mappings: HashMap<String, MappedType>,
    unwrappable: BTreeSet<String>,
    pointer_token: String,
}

/// On-disk form of a registry overlay.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Overlay {
    pointer_token: Option<String>,
    types: HashMap<String, MappedType>,
    unwrappable: Vec<String>,
}

impl TypeRegistry {
    /// Create an empty registry: no mappings, nothing unwrappable.
    pub fn new() -> Self {
        Self {
            mappings: HashMap::new(),
            unwrappable: BTreeSet::new(),
            pointer_token: DEFAULT_POINTER_TOKEN.to_string(),
        }
    }

    /// Create a registry pre-populated with the built-in mappings.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_builtins();
        registry
    }

    /// Register all built-in mappings and unwrappable templates.
    pub fn register_builtins(&mut self) {
        let primitives: &[(&str, &str)] = &[
            ("bool", "bool"),
            ("char", "char"),
            ("unsigned char", "byte"),
            ("short", "short"),
            ("unsigned short", "ushort"),
            ("int", "int"),
            ("unsigned int", "uint"),
            ("unsigned", "uint"),
            ("long", "int"),
            ("unsigned long", "uint"),
            ("long long", "long"),
            ("unsigned long long", "ulong"),
            ("float", "float"),
            ("double", "double"),
            ("void", "void"),
            ("size_t", "ulong"),
            // Engine fixed-width aliases
            ("int8", "sbyte"),
            ("int16", "short"),
            ("int32", "int"),
            ("int64", "long"),
            ("uint8", "byte"),
            ("uint16", "ushort"),
            ("uint32", "uint"),
            ("uint64", "ulong"),
            // <cstdint>
            ("int8_t", "sbyte"),
            ("int16_t", "short"),
            ("int32_t", "int"),
            ("int64_t", "long"),
            ("uint8_t", "byte"),
            ("uint16_t", "ushort"),
            ("uint32_t", "uint"),
            ("uint64_t", "ulong"),
            // Strings
            ("std::string", "string"),
            ("String", "string"),
            ("StringView", "string"),
            // Object identifiers
            ("ID", "ulong"),
        ];
        for (cpp, target) in primitives {
            self.register(*cpp, MappedType::primitive(*target));
        }

        self.register("ByteBuffer", MappedType::managed("byte[]"));
        self.register("Node", MappedType::managed("Node"));
        self.register("Resource", MappedType::managed("Resource"));

        self.add_unwrappable("RC");
        self.add_unwrappable("Handle");
    }

    /// Register a mapping for a C++ name, replacing any existing one.
    ///
    /// The name is either a fully-qualified path (`std::string`) or a bare
    /// name matched against the last path segment (`ByteBuffer`).
    pub fn register(&mut self, name: impl Into<String>, mapped: MappedType) {
        self.mappings.insert(name.into(), mapped);
    }

    pub fn get(&self, name: &str) -> Option<&MappedType> {
        self.mappings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.mappings.contains_key(name)
    }

    pub fn unregister(&mut self, name: &str) -> Option<MappedType> {
        self.mappings.remove(name)
    }

    /// Mark a template as transparent: `name<T>` maps like `T`.
    pub fn add_unwrappable(&mut self, name: impl Into<String>) {
        self.unwrappable.insert(name.into());
    }

    pub fn is_unwrappable(&self, name: &str) -> bool {
        self.unwrappable.contains(name)
    }

    pub fn pointer_token(&self) -> &str {
        &self.pointer_token
    }

    pub fn set_pointer_token(&mut self, token: impl Into<String>) {
        self.pointer_token = token.into();
    }

    /// Merge a JSON overlay into this registry. Overlay entries win.
    pub fn apply_overlay_str(&mut self, json: &str) -> Result<()> {
        let overlay: Overlay = serde_json::from_str(json)?;
        debug!(
            types = overlay.types.len(),
            unwrappable = overlay.unwrappable.len(),
            "applying type registry overlay"
        );
        if let Some(token) = overlay.pointer_token {
            self.pointer_token = token;
        }
        self.mappings.extend(overlay.types);
        self.unwrappable.extend(overlay.unwrappable);
        Ok(())
    }

    /// Read a JSON overlay file and merge it into this registry.
    pub fn load_overlay(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let json = fs::read_to_string(path)?;
        self.apply_overlay_str(&json)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
