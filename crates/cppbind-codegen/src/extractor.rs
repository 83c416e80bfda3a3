//! Loading of header-parser output and annotation marker matching.
//!
//! The parser dumps each header as JSON, either as a bare array of
//! declarations or wrapped with the header path:
//!
//! ```json
//! { "path": "engine/scene/node.h", "declarations": [ ... ] }
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::declaration::{Annotation, Declaration};
use crate::generator::BindingGenerator;
use crate::Result;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ParserOutput {
    Header {
        #[serde(default)]
        path: Option<String>,
        declarations: Vec<Declaration>,
    },
    Declarations(Vec<Declaration>),
}

impl ParserOutput {
    fn into_declarations(self) -> Vec<Declaration> {
        match self {
            ParserOutput::Header { path, declarations } => {
                if let Some(path) = path {
                    debug!(header = %path, count = declarations.len(), "loaded header declarations");
                }
                declarations
            }
            ParserOutput::Declarations(declarations) => declarations,
        }
    }
}

/// Check whether an annotation uses one of the recognised marker macros.
///
/// Markers compare case-sensitively against the macro name, since C++ macro
/// names are case-sensitive.
pub fn has_marker(annotation: &Annotation, markers: &[String]) -> bool {
    markers.iter().any(|m| *m == annotation.marker)
}

impl BindingGenerator {
    /// Add declarations from a parser output JSON string.
    pub fn add_source_str(&mut self, json: &str) -> Result<&mut Self> {
        let output: ParserOutput = serde_json::from_str(json)?;
        Ok(self.add_declarations(output.into_declarations()))
    }

    /// Read a parser output JSON file and add its declarations.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use cppbind_codegen::BindingGenerator;
    ///
    /// let mut generator = BindingGenerator::new();
    /// generator.add_source_file("build/ast/node.json")?;
    /// generator.write_to_file("build/bindings/records.json")?;
    /// # Ok::<(), cppbind_codegen::CodegenError>(())
    /// ```
    pub fn add_source_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        let json = fs::read_to_string(path)?;
        self.add_source_str(&json)
    }

    /// Recursively scan a directory for `.json` parser output files.
    ///
    /// Files are visited in file-name order. A file that isn't valid parser
    /// output is skipped with a warning, and so is a directory entry that
    /// can't be walked (including a missing root). Read errors on a listed
    /// file abort the scan.
    pub fn add_source_dir(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "skipping unreadable directory entry");
                    continue;
                }
            };
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().map(|e| e != "json").unwrap_or(true)
            {
                continue;
            }

            let json = fs::read_to_string(path)?;
            match serde_json::from_str::<ParserOutput>(&json) {
                Ok(output) => {
                    self.add_declarations(output.into_declarations());
                }
                Err(err) => {
                    warn!(file = %path.display(), error = %err, "skipping unreadable parser output");
                }
            }
        }
        Ok(self)
    }
}
