//! Structured C++ type expressions as delivered by the header parser.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A C++ type expression for a variable, parameter, field or return type.
///
/// Parser output uses an internally tagged JSON form, e.g.
/// `{"kind": "pointer", "pointee": {"kind": "fundamental", "name": "int"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Declarator {
    /// Built-in scalar such as `int`, `unsigned long` or `void`.
    Fundamental { name: String },

    /// Possibly qualified name, each segment with optional template arguments.
    Named { segments: Vec<NameSegment> },

    Pointer { pointee: Box<Declarator> },

    /// `T&`
    Reference { referee: Box<Declarator> },

    /// `T&&`
    MoveReference { referee: Box<Declarator> },

    /// `T[N]`; the size is kept as written since it may be a constant expression.
    Array {
        element: Box<Declarator>,
        #[serde(default)]
        size: Option<String>,
    },

    /// Function type, e.g. the target of a function pointer.
    Function {
        result: Box<Declarator>,
        #[serde(default)]
        params: Vec<Declarator>,
    },
}

/// One `::`-separated component of a qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameSegment {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialization: Option<Vec<TemplateArgument>>,
}

/// A template argument is either a type or an unevaluated expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateArgument {
    Type(Declarator),
    Expr(String),
}

impl NameSegment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            specialization: None,
        }
    }

    pub fn specialized(name: impl Into<String>, args: Vec<TemplateArgument>) -> Self {
        Self {
            name: name.into(),
            specialization: Some(args),
        }
    }

    /// Type of the first template argument, if there is one and it is a type.
    pub fn first_type_argument(&self) -> Option<&Declarator> {
        match self.specialization.as_deref()?.first()? {
            TemplateArgument::Type(ty) => Some(ty),
            TemplateArgument::Expr(_) => None,
        }
    }
}

impl Declarator {
    pub fn fundamental(name: impl Into<String>) -> Self {
        Declarator::Fundamental { name: name.into() }
    }

    /// Named type from a `::`-separated path such as `std::string`.
    pub fn named(path: &str) -> Self {
        Declarator::Named {
            segments: path.split("::").map(NameSegment::new).collect(),
        }
    }

    /// Single-segment template specialization with type arguments, e.g. `RC<Foo>`.
    pub fn template(name: impl Into<String>, args: Vec<Declarator>) -> Self {
        Declarator::Named {
            segments: vec![NameSegment::specialized(
                name,
                args.into_iter().map(TemplateArgument::Type).collect(),
            )],
        }
    }

    pub fn pointer(pointee: Declarator) -> Self {
        Declarator::Pointer {
            pointee: Box::new(pointee),
        }
    }

    pub fn reference(referee: Declarator) -> Self {
        Declarator::Reference {
            referee: Box::new(referee),
        }
    }

    pub fn move_reference(referee: Declarator) -> Self {
        Declarator::MoveReference {
            referee: Box::new(referee),
        }
    }

    pub fn is_fundamental(&self) -> bool {
        matches!(self, Declarator::Fundamental { .. })
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Declarator::Pointer { .. })
    }

    /// Last segment of a named type.
    pub fn last_segment(&self) -> Option<&NameSegment> {
        match self {
            Declarator::Named { segments } => segments.last(),
            _ => None,
        }
    }

    /// `::`-joined name without template arguments, for fundamentals and named types.
    pub fn qualified_name(&self) -> Option<String> {
        match self {
            Declarator::Fundamental { name } => Some(name.clone()),
            Declarator::Named { segments } => Some(
                segments
                    .iter()
                    .map(|s| s.name.as_str())
                    .collect::<Vec<_>>()
                    .join("::"),
            ),
            _ => None,
        }
    }

    /// The type the binding layer actually sees.
    ///
    /// A reference is replaced by its referee, then a pointer to a non-fundamental
    /// type is replaced by its pointee. Each step runs once; `int*` survives.
    pub fn normalized(&self) -> &Declarator {
        let ty = match self {
            Declarator::Reference { referee } => referee.as_ref(),
            other => other,
        };
        match ty {
            Declarator::Pointer { pointee } if !pointee.is_fundamental() => pointee.as_ref(),
            other => other,
        }
    }
}

impl fmt::Display for Declarator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Declarator::Fundamental { name } => f.write_str(name),
            Declarator::Named { segments } => {
                for (i, segment) in segments.iter().enumerate() {
                    if i > 0 {
                        f.write_str("::")?;
                    }
                    write!(f, "{}", segment)?;
                }
                Ok(())
            }
            Declarator::Pointer { pointee } => write!(f, "{}*", pointee),
            Declarator::Reference { referee } => write!(f, "{}&", referee),
            Declarator::MoveReference { referee } => write!(f, "{}&&", referee),
            Declarator::Array { element, size } => {
                write!(f, "{}[{}]", element, size.as_deref().unwrap_or(""))
            }
            Declarator::Function { result, params } => {
                let params: Vec<_> = params.iter().map(|p| p.to_string()).collect();
                write!(f, "{}({})", result, params.join(", "))
            }
        }
    }
}

impl fmt::Display for NameSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(args) = &self.specialization {
            let args: Vec<_> = args
                .iter()
                .map(|a| match a {
                    TemplateArgument::Type(ty) => ty.to_string(),
                    TemplateArgument::Expr(expr) => expr.clone(),
                })
                .collect();
            write!(f, "<{}>", args.join(", "))?;
        }
        Ok(())
    }
}

/// Free-function form of [`Declarator::normalized`].
pub fn normalize(ty: &Declarator) -> &Declarator {
    ty.normalized()
}
