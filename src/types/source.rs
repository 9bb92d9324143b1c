//! Source-side data model: languages, files, parsed definitions.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Result, TestforgeError};

/// Languages testforge can generate tests for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Go,
    Python,
    JavaScript,
    TypeScript,
    Rust,
    Java,
}

impl Language {
    /// Detect the language from a file extension, if supported.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "go" => Some(Language::Go),
            "py" => Some(Language::Python),
            "js" | "jsx" => Some(Language::JavaScript),
            "ts" | "tsx" => Some(Language::TypeScript),
            "rs" => Some(Language::Rust),
            "java" => Some(Language::Java),
            _ => None,
        }
    }

    /// Canonical lowercase name, also the markdown fence tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Go => "go",
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Rust => "rust",
            Language::Java => "java",
        }
    }

    /// TypeScript shares the JavaScript adapter family.
    pub fn adapter_family(&self) -> Language {
        match self {
            Language::TypeScript => Language::JavaScript,
            other => *other,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = TestforgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "go" | "golang" => Ok(Language::Go),
            "python" | "py" => Ok(Language::Python),
            "javascript" | "js" => Ok(Language::JavaScript),
            "typescript" | "ts" => Ok(Language::TypeScript),
            "rust" | "rs" => Ok(Language::Rust),
            "java" => Ok(Language::Java),
            other => Err(TestforgeError::Configuration(format!(
                "unknown language: {other}"
            ))),
        }
    }
}

/// Kinds of tests the engine can be asked to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestType {
    Unit,
    EdgeCases,
    Negative,
    TableDriven,
    Integration,
}

impl TestType {
    /// Kebab-case name as used on the CLI and in prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            TestType::Unit => "unit",
            TestType::EdgeCases => "edge-cases",
            TestType::Negative => "negative",
            TestType::TableDriven => "table-driven",
            TestType::Integration => "integration",
        }
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestType {
    type Err = TestforgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "unit" => Ok(TestType::Unit),
            "edge-cases" | "edge_cases" => Ok(TestType::EdgeCases),
            "negative" => Ok(TestType::Negative),
            "table-driven" | "table_driven" => Ok(TestType::TableDriven),
            "integration" => Ok(TestType::Integration),
            other => Err(TestforgeError::Configuration(format!(
                "unknown test type: {other}"
            ))),
        }
    }
}

/// One candidate source file discovered by the scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: PathBuf,
    pub language: Language,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, language: Language) -> Self {
        Self {
            path: path.into(),
            language,
        }
    }
}

/// One function/method parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    /// Type text as written in the source; empty for untyped languages.
    pub type_name: String,
}

/// One testable unit (function or method) extracted by an adapter.
///
/// Read-only to the engine; lives for the span of one
/// [`Engine::generate`](crate::engine::Engine::generate) call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    pub name: String,
    /// Full signature text as written in the source.
    pub signature: String,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<String>,
    pub is_method: bool,
    /// Enclosing type name when `is_method` is set.
    pub class_name: Option<String>,
    /// Source body text, including the signature line.
    pub body: String,
    pub start_line: u32,
    pub end_line: u32,
    pub docstring: Option<String>,
}

/// Shallow parse result produced by a language adapter.
///
/// Not a real AST: adapters are regex/string based and only recover the
/// pieces the engine needs for prompting and boilerplate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ast {
    /// Package/module name, when the language has one.
    pub package: String,
    pub imports: Vec<String>,
    pub definitions: Vec<Definition>,
}
