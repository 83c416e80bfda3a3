//! Mapping of C++ declarators to C# binding types.

use tracing::{debug, warn};

use crate::declarator::Declarator;
use crate::registry::{MappedType, TypeRegistry};

/// Resolves declarators against a [`TypeRegistry`].
///
/// The mapper only reads the registry, so one registry can back any number of
/// mappers.
#[derive(Debug, Clone, Copy)]
pub struct TypeMapper<'a> {
    registry: &'a TypeRegistry,
}

impl<'a> TypeMapper<'a> {
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'a TypeRegistry {
        self.registry
    }

    /// Map a declarator to its target-language type.
    ///
    /// - references and pointers to non-scalars are looked through
    /// - a remaining pointer becomes the opaque pointer token
    /// - a known name resolves through the registry
    /// - an unwrappable template (`RC<T>`) maps as its first type argument
    /// - anything else keeps its own name and is flagged non-primitive
    pub fn map(&self, ty: &Declarator) -> MappedType {
        let ty = ty.normalized();

        if ty.is_pointer() {
            return MappedType::primitive(self.registry.pointer_token());
        }

        match ty {
            Declarator::Fundamental { name } => self.lookup(name),
            Declarator::Named { segments } => {
                let Some(last) = segments.last() else {
                    warn!("named type without segments");
                    return MappedType::managed(String::new());
                };

                let qualified = ty.qualified_name().and_then(|q| self.registry.get(&q));
                if let Some(mapped) = qualified.or_else(|| self.registry.get(&last.name)) {
                    return mapped.clone();
                }

                if self.registry.is_unwrappable(&last.name)
                    && let Some(inner) = last.first_type_argument()
                {
                    return self.map(inner);
                }

                debug!(name = %last.name, "unknown type, using generic accessor");
                MappedType::managed(last.name.clone())
            }
            other => {
                warn!(declarator = %other, "declarator has no bindable name");
                MappedType::managed(other.to_string())
            }
        }
    }

    fn lookup(&self, name: &str) -> MappedType {
        match self.registry.get(name) {
            Some(mapped) => mapped.clone(),
            None => {
                debug!(name = %name, "unknown type, using generic accessor");
                MappedType::managed(name)
            }
        }
    }
}

/// Map `ty` with a registry in one call.
pub fn map_type(registry: &TypeRegistry, ty: &Declarator) -> MappedType {
    TypeMapper::new(registry).map(ty)
}
