//! Java language adapter.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use super::{LanguageAdapter, test_type_focus};
use crate::types::{Ast, Definition, Language, Parameter, TestType};
use crate::{Result, TestforgeError};

static PACKAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*package\s+([\w.]+)\s*;").expect("static regex"));

static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*import\s+(?:static\s+)?([\w.*]+)\s*;").expect("static regex")
});

static CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(?:public\s+)?(?:abstract\s+)?(?:final\s+)?class\s+(\w+)")
        .expect("static regex")
});

/// Method with an explicit return type; constructors have none and so
/// never match.
static METHOD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^\s*(?:(?:public|private|protected)\s+)?(static\s+)?(?:final\s+)?([\w<>\[\], .?]+?)\s+(\w+)\s*\(([^)]*)\)\s*(?:throws\s+[\w, .]+)?\s*\{",
    )
    .expect("static regex")
});

/// Adapter for Java source files.
pub struct JavaAdapter;

impl JavaAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JavaAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAdapter for JavaAdapter {
    fn language(&self) -> Language {
        Language::Java
    }

    fn default_framework(&self) -> &'static str {
        "junit5"
    }

    fn parse_file(&self, content: &str) -> Result<Ast> {
        // Empty for default-package files.
        let package = PACKAGE_RE
            .captures(content)
            .and_then(|c| c.get(1))
            .map_or(String::new(), |m| m.as_str().to_string());

        let imports: Vec<String> = IMPORT_RE
            .captures_iter(content)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .collect();

        let class_spans: Vec<(usize, String)> = CLASS_RE
            .captures_iter(content)
            .map(|c| {
                (
                    c.get(0).expect("capture 0 always present").start(),
                    c.get(1).map_or(String::new(), |m| m.as_str().to_string()),
                )
            })
            .collect();

        let mut definitions = Vec::new();
        for caps in METHOD_RE.captures_iter(content) {
            let whole = caps.get(0).expect("capture 0 always present");
            let is_static = caps.get(1).is_some();
            let return_type = caps.get(2).map_or("", |m| m.as_str()).trim().to_string();
            let name = caps.get(3).map_or("", |m| m.as_str());
            // Keywords the return-type group can swallow. A constructor
            // has no return type, so the modifier lands in that group.
            if [
                "new", "return", "class", "else", "public", "private", "protected",
            ]
            .contains(&return_type.as_str())
            {
                continue;
            }
            if name == "main" && is_static {
                continue;
            }

            let class_name = class_spans
                .iter()
                .rev()
                .find(|(start, _)| *start < whole.start())
                .map(|(_, class)| class.clone());
            // Constructor in the default visibility: name matches the
            // enclosing class.
            if class_name.as_deref() == Some(name) {
                continue;
            }

            let open = content[whole.range()]
                .rfind('{')
                .map(|i| whole.start() + i)
                .expect("method regex requires a brace");
            let Some(close) = super::find_block_end(content, open) else {
                continue; // unbalanced braces, skip rather than guess
            };

            let params = caps.get(4).map_or("", |m| m.as_str());
            definitions.push(Definition {
                name: name.to_string(),
                signature: format!("{return_type} {name}({params})"),
                parameters: parse_parameters(params),
                return_type: Some(return_type).filter(|t| t != "void"),
                is_method: true,
                class_name,
                body: content[whole.start()..=close].trim_start().to_string(),
                start_line: line_of(content, whole.start()),
                end_line: line_of(content, close),
                docstring: None,
            });
        }

        Ok(Ast {
            package,
            imports,
            definitions,
        })
    }

    fn render_prompt(&self, test_type: TestType, def: &Definition, ast: &Ast) -> String {
        format!(
            "Generate Java tests using JUnit 5 (Jupiter) for the following method.\n\n\
             Requirements:\n\
             - Annotate test methods with @Test and @DisplayName\n\
             - Use static Assertions imports (assertEquals, assertTrue, assertThrows)\n\
             - Use @BeforeEach for shared setup\n\
             - Use assertThrows for expected exceptions\n\
             - Name the test class {}Test and keep the source package\n\n\
             {}\n\n\
             Method to test:\n{}\n\nClass: {}\nPackage: {}\n",
            def.class_name.as_deref().unwrap_or("Generated"),
            test_type_focus(test_type),
            def.body,
            def.class_name.as_deref().unwrap_or(""),
            ast.package,
        )
    }

    fn test_path(&self, source: &Path, output_dir: Option<&Path>) -> PathBuf {
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Generated");
        let file = format!("{stem}Test.java");
        if let Some(dir) = output_dir {
            return dir.join(file);
        }
        let dir = source.parent().unwrap_or(Path::new("."));
        // Maven/Gradle convention: src/main/java mirrors src/test/java.
        maven_test_dir(dir).unwrap_or_else(|| dir.to_path_buf()).join(file)
    }

    fn prepend_boilerplate(&self, code: &str, ast: &Ast) -> String {
        if code.contains("package ") || code.contains("import org.junit") {
            return code.to_string();
        }
        let mut header = String::new();
        if !ast.package.is_empty() {
            header.push_str(&format!("package {};\n\n", ast.package));
        }
        header.push_str(
            "import org.junit.jupiter.api.*;\nimport static org.junit.jupiter.api.Assertions.*;\n\n",
        );
        format!("{header}{code}")
    }

    fn validate_tests(&self, code: &str, _path: &Path) -> Result<()> {
        if !code.contains("import org.junit") && !code.contains("import org.testng") {
            return Err(TestforgeError::ValidationFailed(
                "missing JUnit/TestNG imports".to_string(),
            ));
        }
        if !code.contains("@Test") {
            return Err(TestforgeError::ValidationFailed(
                "no @Test annotations found".to_string(),
            ));
        }
        if !code.contains("class ") {
            return Err(TestforgeError::ValidationFailed(
                "no class definition found".to_string(),
            ));
        }
        Ok(())
    }
}

/// Rewrite a `src/main/java` directory to its `src/test/java` mirror.
fn maven_test_dir(dir: &Path) -> Option<PathBuf> {
    let parts: Vec<&OsStr> = dir.iter().collect();
    let marker = parts.windows(3).position(|w| {
        w[0] == OsStr::new("src") && w[1] == OsStr::new("main") && w[2] == OsStr::new("java")
    })?;
    let mut out = PathBuf::new();
    for (i, part) in parts.iter().enumerate() {
        out.push(if i == marker + 1 {
            OsStr::new("test")
        } else {
            part
        });
    }
    Some(out)
}

/// Parse a Java parameter list, splitting on commas outside generics.
fn parse_parameters(params: &str) -> Vec<Parameter> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    let mut parts = Vec::new();
    for ch in params.chars() {
        match ch {
            '<' => {
                depth += 1;
                current.push(ch);
            }
            '>' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if depth == 0 => {
                parts.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current);
    }

    for part in parts {
        let part = part.trim();
        // Last token is the name, everything before it the type.
        if let Some((type_name, name)) = part.rsplit_once(char::is_whitespace) {
            out.push(Parameter {
                name: name.trim().to_string(),
                type_name: type_name.trim().to_string(),
            });
        }
    }
    out
}

fn line_of(content: &str, offset: usize) -> u32 {
    content[..offset.min(content.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count() as u32
        + 1
}
