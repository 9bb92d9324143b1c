//! Python language adapter.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use super::{LanguageAdapter, test_type_focus};
use crate::types::{Ast, Definition, Language, Parameter, TestType};
use crate::Result;

static IMPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(?:from\s+(\S+)\s+)?import\s+(.+)$").expect("static regex"));

static DEF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(\s*)def\s+(\w+)\s*\(([^)]*)\)\s*(?:->\s*([^:]+))?\s*:").expect("static regex")
});

static CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^class\s+(\w+)").expect("static regex"));

/// Adapter for Python source files.
pub struct PythonAdapter;

impl PythonAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PythonAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAdapter for PythonAdapter {
    fn language(&self) -> Language {
        Language::Python
    }

    fn default_framework(&self) -> &'static str {
        "pytest"
    }

    fn parse_file(&self, content: &str) -> Result<Ast> {
        let mut imports = Vec::new();
        for caps in IMPORT_RE.captures_iter(content) {
            match caps.get(1) {
                Some(module) => imports.push(module.as_str().to_string()),
                None => {
                    if let Some(names) = caps.get(2) {
                        imports.push(names.as_str().trim().to_string());
                    }
                }
            }
        }

        // Map each definition to its enclosing class, when indented
        // under one.
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
        for caps in DEF_RE.captures_iter(content) {
            let whole = caps.get(0).expect("capture 0 always present");
            let indent = caps.get(1).map_or("", |m| m.as_str());
            let name = caps.get(2).map_or("", |m| m.as_str()).to_string();
            if name.starts_with("test_") || name.starts_with("__") {
                continue;
            }

            let body_end = indented_block_end(content, whole.start(), indent.len());
            let body = content[whole.start()..body_end].trim_end().to_string();
            let is_method = !indent.is_empty();
            let class_name = if is_method {
                class_spans
                    .iter()
                    .rev()
                    .find(|(start, _)| *start < whole.start())
                    .map(|(_, name)| name.clone())
            } else {
                None
            };

            let signature = content[whole.range()].trim().trim_end_matches(':').to_string();
            definitions.push(Definition {
                name,
                signature,
                parameters: parse_parameters(caps.get(3).map_or("", |m| m.as_str())),
                return_type: caps.get(4).map(|m| m.as_str().trim().to_string()),
                is_method,
                class_name,
                body,
                start_line: line_of(content, whole.start()),
                end_line: line_of(content, body_end.saturating_sub(1)),
                docstring: None,
            });
        }

        // Python files have no package declaration; use the module stem
        // convention of leaving it empty and let boilerplate skip it.
        Ok(Ast {
            package: String::new(),
            imports,
            definitions,
        })
    }

    fn render_prompt(&self, test_type: TestType, def: &Definition, _ast: &Ast) -> String {
        format!(
            "Generate pytest tests for the following Python function.\n\n\
             Requirements:\n\
             - Use pytest conventions (plain asserts, fixtures where helpful)\n\
             - Use pytest.raises for expected exceptions\n\
             - Parametrize where multiple inputs share one shape\n\
             - Mock external dependencies with unittest.mock\n\n\
             {}\n\n\
             Function to test:\n{}\n",
            test_type_focus(test_type),
            def.body,
        )
    }

    fn test_path(&self, source: &Path, output_dir: Option<&Path>) -> PathBuf {
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("generated");
        let dir = output_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| source.parent().unwrap_or(Path::new(".")).to_path_buf());
        dir.join(format!("test_{stem}.py"))
    }

    fn prepend_boilerplate(&self, code: &str, _ast: &Ast) -> String {
        if code.contains("import pytest") {
            return code.to_string();
        }
        format!("import pytest\nfrom unittest.mock import Mock, patch\n\n{code}")
    }
}

/// End offset of an indentation-delimited block starting at `start`.
fn indented_block_end(content: &str, start: usize, def_indent: usize) -> usize {
    let mut end = content.len();
    let mut offset = start;
    let mut first = true;
    for line in content[start..].split_inclusive('\n') {
        if !first {
            let trimmed = line.trim_start();
            let indent = line.len() - trimmed.len();
            if !trimmed.is_empty() && indent <= def_indent {
                end = offset;
                break;
            }
        }
        first = false;
        offset += line.len();
    }
    end
}

fn parse_parameters(params: &str) -> Vec<Parameter> {
    params
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty() && *p != "self" && *p != "cls")
        .map(|p| {
            let (name, type_name) = match p.split_once(':') {
                Some((n, t)) => (n.trim(), t.split('=').next().unwrap_or(t).trim()),
                None => (p.split('=').next().unwrap_or(p).trim(), ""),
            };
            Parameter {
                name: name.to_string(),
                type_name: type_name.to_string(),
            }
        })
        .collect()
}

fn line_of(content: &str, offset: usize) -> u32 {
    content[..offset.min(content.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count() as u32
        + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"from math import sqrt
import os

def hypotenuse(a: float, b: float) -> float:
    """Length of the hypotenuse."""
    return sqrt(a * a + b * b)

class Greeter:
    def greet(self, name: str) -> str:
        return f"hello {name}"

def _private():
    pass
"#;

    #[test]
    fn extracts_functions_and_methods() {
        let ast = PythonAdapter::new().parse_file(SOURCE).unwrap();
        let names: Vec<_> = ast.definitions.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["hypotenuse", "greet", "_private"]);

        let greet = &ast.definitions[1];
        assert!(greet.is_method);
        assert_eq!(greet.class_name.as_deref(), Some("Greeter"));
        assert!(greet.body.contains("hello"));
        // self is not a parameter
        assert_eq!(greet.parameters.len(), 1);
        assert_eq!(greet.parameters[0].name, "name");
    }

    #[test]
    fn body_stops_at_dedent() {
        let ast = PythonAdapter::new().parse_file(SOURCE).unwrap();
        let hyp = &ast.definitions[0];
        assert!(hyp.body.contains("sqrt"));
        assert!(!hyp.body.contains("class Greeter"));
    }

    #[test]
    fn imports_collected() {
        let ast = PythonAdapter::new().parse_file(SOURCE).unwrap();
        assert_eq!(ast.imports, vec!["math", "os"]);
    }

    #[test]
    fn test_path_uses_pytest_convention() {
        let path = PythonAdapter::new().test_path(Path::new("pkg/util.py"), None);
        assert_eq!(path, PathBuf::from("pkg/test_util.py"));
    }

    #[test]
    fn typed_defaulted_parameters_parse() {
        let params = parse_parameters("a: int, b: str = \"x\", c=3");
        assert_eq!(params.len(), 3);
        assert_eq!(params[0].type_name, "int");
        assert_eq!(params[1].name, "b");
        assert_eq!(params[1].type_name, "str");
        assert_eq!(params[2].name, "c");
    }
}
