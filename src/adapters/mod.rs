//! Language adapters.
//!
//! Each supported language has an adapter implementing
//! [`LanguageAdapter`]: a regex/string-based shallow parser plus the
//! language-specific knowledge the engine needs — prompt templates,
//! test file paths, and boilerplate headers. Adapters are looked up
//! through an explicit [`AdapterRegistry`] constructed at startup and
//! passed by reference; there is no hidden global registry.

mod golang;
mod java;
mod javascript;
mod python;
mod registry;
mod rust;

pub use golang::GoAdapter;
pub use java::JavaAdapter;
pub use javascript::JavaScriptAdapter;
pub use python::PythonAdapter;
pub use registry::AdapterRegistry;
pub use rust::RustAdapter;

use std::path::{Path, PathBuf};

use crate::types::{Ast, Definition, Language, TestType};
use crate::Result;

/// Language-specific behaviour for test generation.
///
/// Parsing is deliberately shallow: adapters recover callable
/// signatures and bodies with regexes, not a real grammar. A production
/// adapter for a new language should plug a proper parser behind this
/// same interface.
pub trait LanguageAdapter: Send + Sync {
    /// The language this adapter handles.
    fn language(&self) -> Language;

    /// Default test framework named in prompts.
    fn default_framework(&self) -> &'static str;

    /// Shallow-parse source text into package, imports, and definitions.
    fn parse_file(&self, content: &str) -> Result<Ast>;

    /// The testable definitions of a parsed file, in source order.
    fn extract_definitions(&self, ast: &Ast) -> Vec<Definition> {
        ast.definitions.clone()
    }

    /// Render the generation prompt for one definition.
    fn render_prompt(&self, test_type: TestType, def: &Definition, ast: &Ast) -> String;

    /// Where the generated test file belongs for a given source path.
    fn test_path(&self, source: &Path, output_dir: Option<&Path>) -> PathBuf;

    /// Prepend language-conventional boilerplate (package/module
    /// declaration, standard imports) unless the code already carries
    /// an equivalent declaration.
    fn prepend_boilerplate(&self, code: &str, ast: &Ast) -> String;

    /// Structurally validate generated tests.
    ///
    /// Failures are recorded on the result but never fail the run.
    fn validate_tests(&self, _code: &str, _path: &Path) -> Result<()> {
        Ok(())
    }
}

/// Find the byte offset of the brace closing the block opened at
/// `open`. Naive about braces inside strings and comments, which is
/// acceptable at regex-parser fidelity; callers skip definitions this
/// cannot balance.
pub(crate) fn find_block_end(src: &str, open: usize) -> Option<usize> {
    debug_assert_eq!(src.as_bytes().get(open), Some(&b'{'));
    let mut depth = 0usize;
    for (i, b) in src.bytes().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Per-test-type focus appended to every language's base prompt.
pub(crate) fn test_type_focus(test_type: TestType) -> &'static str {
    match test_type {
        TestType::Unit => "Focus on unit tests covering the happy path and representative inputs.",
        TestType::EdgeCases => {
            "Focus on edge cases: empty inputs, boundary values, overflow, and unusual but legal inputs."
        }
        TestType::Negative => {
            "Focus on negative tests: invalid inputs, error returns, and failure modes."
        }
        TestType::TableDriven => {
            "Focus on table-driven tests: a case table with name, input, expected output, and an error flag, one subtest per case."
        }
        TestType::Integration => {
            "Focus on integration tests exercising the function together with its collaborators."
        }
    }
}
