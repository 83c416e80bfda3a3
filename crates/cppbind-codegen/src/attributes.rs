//! Tokenizer for bracketed annotation payloads.
//!
//! A payload is the body of an annotation macro such as
//! `PROPERTY(Serialize, default = 3, tooltip = "Speed, in m/s")`. It is a
//! comma-separated list of `NAME` or `NAME = VALUE` items. Double quotes protect
//! commas and equals signs inside a value, and `\"` keeps a quote literal.
//!
//! Values are classified while they are scanned:
//!
//! | Payload              | Kind     | Value          |
//! |----------------------|----------|----------------|
//! | `flag`               | `Bool`   | `true`         |
//! | `ok = FALSE`         | `Bool`   | `FALSE`        |
//! | `count = 42`         | `Int`    | `42`           |
//! | `scale = 0.5`        | `Double` | `0.5`          |
//! | `label = "a, b"`     | `String` | `a, b`         |
//! | `category = Physics` | `String` | `Physics`      |

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{CodegenError, Result};

/// Lexical classification of an attribute value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    /// Not yet classified. Never present on a record returned by the tokenizer.
    #[default]
    Nil,
    String,
    Int,
    Double,
    Bool,
}

/// A single `NAME` / `NAME = VALUE` item of an annotation payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeRecord {
    pub name: String,
    /// Raw lexical content, without the surrounding quotes of a quoted value.
    pub value: String,
    pub kind: AttributeKind,
}

impl AttributeRecord {
    pub fn new(name: impl Into<String>, value: impl Into<String>, kind: AttributeKind) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            kind,
        }
    }

    /// Canonical payload spelling of this record.
    ///
    /// A named `Bool` record holding exactly `true` collapses to the bare tag
    /// form. Names containing `,`, `=` or `"` are quoted.
    pub fn to_payload(&self) -> String {
        let name = self.payload_name();
        match self.kind {
            AttributeKind::Bool if self.value == "true" && !self.name.is_empty() => {
                name.into_owned()
            }
            AttributeKind::String => format!("{} = \"{}\"", name, self.value),
            _ => format!("{} = {}", name, self.value),
        }
    }

    fn payload_name(&self) -> Cow<'_, str> {
        if self.name.contains(|c| matches!(c, ',' | '=' | '"')) {
            Cow::Owned(format!("\"{}\"", self.name))
        } else {
            Cow::Borrowed(&self.name)
        }
    }
}

impl fmt::Display for AttributeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_payload())
    }
}

/// Scanner state for one pass over a payload.
#[derive(Debug, Default)]
struct Tokenizer {
    in_string: bool,
    in_value: bool,
    prev_char: Option<char>,
    name: String,
    value: String,
    kind: AttributeKind,
    records: Vec<AttributeRecord>,
}

impl Tokenizer {
    fn feed(&mut self, c: char) {
        match c {
            '"' if self.prev_char != Some('\\') => {
                self.in_string = !self.in_string;
                if self.in_value {
                    self.kind = AttributeKind::String;
                }
            }
            ',' if !self.in_string => {
                self.finish();
                self.in_value = false;
            }
            '=' if !self.in_string && !self.in_value => {
                self.in_value = true;
            }
            _ if self.in_value => {
                self.value.push(c);
                self.promote(c);
            }
            _ => self.name.push(c),
        }
        self.prev_char = Some(c);
    }

    /// Per-character kind promotion for value content.
    ///
    /// Characters that are neither digits nor dots never demote a kind, so
    /// `10abc` stays `Int`.
    fn promote(&mut self, c: char) {
        use AttributeKind::*;

        let kind = self.kind;
        self.kind = if self.in_string {
            String
        } else if c.is_ascii_digit() {
            match kind {
                Nil | Int => Int,
                other => other,
            }
        } else if c == '.' {
            match kind {
                Nil | Int | Double => Double,
                other => other,
            }
        } else {
            kind
        };
    }

    fn finish(&mut self) {
        let name = self.name.trim().to_string();
        let mut value = self.value.trim().to_string();
        let mut kind = std::mem::take(&mut self.kind);

        self.name.clear();
        self.value.clear();

        if name.is_empty() && value.is_empty() {
            return;
        }

        if kind == AttributeKind::Nil {
            let lowered = value.to_ascii_lowercase();
            kind = if lowered == "true" || lowered == "false" {
                AttributeKind::Bool
            } else if value.is_empty() {
                value = "true".to_string();
                AttributeKind::Bool
            } else {
                AttributeKind::String
            };
        }

        self.records.push(AttributeRecord { name, value, kind });
    }
}

/// Tokenize an annotation payload into records, in source order.
///
/// This never fails. Unbalanced quotes simply keep the rest of the payload in
/// string mode. Only `\"` is treated as an escape; the backslash itself is kept
/// in the value and no other escape sequence is interpreted.
pub fn parse_attributes(payload: &str) -> Vec<AttributeRecord> {
    scan(payload).records
}

/// Like [`parse_attributes`], but rejects unbalanced quotes and unnamed items.
pub fn parse_attributes_strict(payload: &str) -> Result<Vec<AttributeRecord>> {
    let tokenizer = scan(payload);
    if tokenizer.in_string {
        return Err(CodegenError::MalformedAttributes {
            payload: payload.to_string(),
            reason: "unterminated string".to_string(),
        });
    }
    if let Some(record) = tokenizer.records.iter().find(|r| r.name.is_empty()) {
        return Err(CodegenError::MalformedAttributes {
            payload: payload.to_string(),
            reason: format!("value `{}` has no attribute name", record.value),
        });
    }
    Ok(tokenizer.records)
}

fn scan(payload: &str) -> Tokenizer {
    let mut tokenizer = Tokenizer::default();
    for c in payload.chars() {
        tokenizer.feed(c);
    }
    tokenizer.finish();
    tokenizer
}

/// Render records back into a payload that tokenizes to the same list.
pub fn render_attributes(records: &[AttributeRecord]) -> String {
    records
        .iter()
        .map(AttributeRecord::to_payload)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parsed attributes of a single annotation, with name lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes {
    records: Vec<AttributeRecord>,
}

impl Attributes {
    pub fn parse(payload: &str) -> Self {
        Self {
            records: parse_attributes(payload),
        }
    }

    pub fn parse_strict(payload: &str) -> Result<Self> {
        Ok(Self {
            records: parse_attributes_strict(payload)?,
        })
    }

    /// First record with the given name. Names compare case-sensitively.
    pub fn get(&self, name: &str) -> Option<&AttributeRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    /// Whether `name` is present as a truthy flag (`name` or `name = true`).
    pub fn flag(&self, name: &str) -> bool {
        self.get(name).is_some_and(|r| {
            r.kind == AttributeKind::Bool && r.value.eq_ignore_ascii_case("true")
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AttributeRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_vec(self) -> Vec<AttributeRecord> {
        self.records
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = &'a AttributeRecord;
    type IntoIter = std::slice::Iter<'a, AttributeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
