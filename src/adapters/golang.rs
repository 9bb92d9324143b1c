//! Go language adapter.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use super::{LanguageAdapter, test_type_focus};
use crate::types::{Ast, Definition, Language, Parameter, TestType};
use crate::{Result, TestforgeError};

static PACKAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^package\s+(\w+)").expect("static regex"));

static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^import\s+(?:\(\s*([\s\S]*?)\s*\)|"([^"]+)")"#).expect("static regex")
});

/// Matches a top-level func, optionally with a receiver:
/// `func (r *Recv) Name(params) ret {`.
static FUNC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^func\s+(?:\((\w+)\s+\*?(\w+)\)\s+)?(\w+)\s*\(([^)]*)\)\s*([^{\n]*)\{")
        .expect("static regex")
});

/// Adapter for Go source files.
pub struct GoAdapter;

impl GoAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GoAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAdapter for GoAdapter {
    fn language(&self) -> Language {
        Language::Go
    }

    fn default_framework(&self) -> &'static str {
        "testing"
    }

    fn parse_file(&self, content: &str) -> Result<Ast> {
        let package = PACKAGE_RE
            .captures(content)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| TestforgeError::Parse("no package declaration".to_string()))?;

        let mut imports = Vec::new();
        for caps in IMPORT_RE.captures_iter(content) {
            if let Some(block) = caps.get(1) {
                for line in block.as_str().lines() {
                    let import = line.trim().trim_matches('"');
                    if !import.is_empty() {
                        imports.push(import.to_string());
                    }
                }
            } else if let Some(single) = caps.get(2) {
                imports.push(single.as_str().to_string());
            }
        }

        let mut definitions = Vec::new();
        for caps in FUNC_RE.captures_iter(content) {
            let whole = caps.get(0).expect("capture 0 always present");
            let name = caps.get(3).map_or("", |m| m.as_str());
            // Skip entry points and existing tests.
            if name == "main" || name == "init" || name.starts_with("Test") {
                continue;
            }

            let open = content[whole.range()]
                .rfind('{')
                .map(|i| whole.start() + i)
                .expect("func regex requires a brace");
            let Some(close) = super::find_block_end(content, open) else {
                continue; // unbalanced braces, skip rather than guess
            };

            let receiver_type = caps.get(2).map(|m| m.as_str().to_string());
            let signature = content[whole.start()..open].trim_end().to_string();
            let body = content[whole.start()..=close].to_string();
            let start_line = line_of(content, whole.start());
            let end_line = line_of(content, close);

            definitions.push(Definition {
                name: name.to_string(),
                signature,
                parameters: parse_parameters(caps.get(4).map_or("", |m| m.as_str())),
                return_type: caps
                    .get(5)
                    .map(|m| m.as_str().trim().to_string())
                    .filter(|s| !s.is_empty()),
                is_method: receiver_type.is_some(),
                class_name: receiver_type,
                body,
                start_line,
                end_line,
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
            "Generate idiomatic Go tests for the following function.\n\n\
             Requirements:\n\
             - Use Go's testing package\n\
             - Use testify/assert for assertions\n\
             - Follow table-driven test pattern with t.Run() for subtests\n\
             - Cover happy path, edge cases, and error conditions\n\
             - Handle errors explicitly\n\n\
             {}\n\n\
             Function to test:\n{}\n\nPackage: {}\n",
            test_type_focus(test_type),
            def.body,
            ast.package,
        )
    }

    fn test_path(&self, source: &Path, output_dir: Option<&Path>) -> PathBuf {
        // Go tests live next to the source with a _test.go suffix.
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("generated");
        let dir = output_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| source.parent().unwrap_or(Path::new(".")).to_path_buf());
        dir.join(format!("{stem}_test.go"))
    }

    fn prepend_boilerplate(&self, code: &str, ast: &Ast) -> String {
        if code.contains("package ") {
            return code.to_string();
        }
        format!(
            "package {}_test\n\nimport (\n\t\"testing\"\n\n\t\"github.com/stretchr/testify/assert\"\n\t\"github.com/stretchr/testify/require\"\n)\n\n{}",
            ast.package, code
        )
    }

    fn validate_tests(&self, code: &str, _path: &Path) -> Result<()> {
        if !code.contains("func Test") {
            return Err(TestforgeError::ValidationFailed(
                "no test functions found".to_string(),
            ));
        }
        let opens = code.matches('{').count();
        let closes = code.matches('}').count();
        if opens != closes {
            return Err(TestforgeError::ValidationFailed(format!(
                "unbalanced braces: {opens} open, {closes} close"
            )));
        }
        Ok(())
    }
}

/// Parse a Go parameter list, handling grouped parameters (`a, b int`).
fn parse_parameters(params: &str) -> Vec<Parameter> {
    let mut out = Vec::new();
    for part in params.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match part.split_once(' ') {
            Some((name, type_name)) => out.push(Parameter {
                name: name.trim().to_string(),
                type_name: type_name.trim().to_string(),
            }),
            // Grouped parameter: the type comes with a later element.
            None => out.push(Parameter {
                name: part.to_string(),
                type_name: String::new(),
            }),
        }
    }

    // Backfill types for grouped parameters: `a, b int` leaves `a` bare.
    let mut last_type = String::new();
    for param in out.iter_mut().rev() {
        if param.type_name.is_empty() {
            param.type_name = last_type.clone();
        } else {
            last_type = param.type_name.clone();
        }
    }
    out
}

fn line_of(content: &str, offset: usize) -> u32 {
    content[..offset].bytes().filter(|&b| b == b'\n').count() as u32 + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"package calculator

import (
	"errors"
	"fmt"
)

// Add returns the sum of two integers.
func Add(a, b int) int {
	return a + b
}

func (c *Calculator) Divide(a, b float64) (float64, error) {
	if b == 0 {
		return 0, errors.New("division by zero")
	}
	return a / b, nil
}

func main() {
	fmt.Println(Add(1, 2))
}
"#;

    #[test]
    fn parses_package_and_imports() {
        let ast = GoAdapter::new().parse_file(SOURCE).unwrap();
        assert_eq!(ast.package, "calculator");
        assert_eq!(ast.imports, vec!["errors", "fmt"]);
    }

    #[test]
    fn extracts_functions_and_methods_skipping_main() {
        let ast = GoAdapter::new().parse_file(SOURCE).unwrap();
        let names: Vec<_> = ast.definitions.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Add", "Divide"]);

        let divide = &ast.definitions[1];
        assert!(divide.is_method);
        assert_eq!(divide.class_name.as_deref(), Some("Calculator"));
        assert!(divide.body.contains("division by zero"));
    }

    #[test]
    fn grouped_parameters_share_a_type() {
        let params = parse_parameters("a, b int");
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].type_name, "int");
        assert_eq!(params[1].type_name, "int");
    }

    #[test]
    fn missing_package_is_a_parse_error() {
        let result = GoAdapter::new().parse_file("func Foo() {}\n");
        assert!(matches!(result, Err(TestforgeError::Parse(_))));
    }

    #[test]
    fn test_path_sits_next_to_source() {
        let path = GoAdapter::new().test_path(Path::new("pkg/calc/calc.go"), None);
        assert_eq!(path, PathBuf::from("pkg/calc/calc_test.go"));
    }

    #[test]
    fn boilerplate_not_duplicated() {
        let adapter = GoAdapter::new();
        let ast = adapter.parse_file(SOURCE).unwrap();
        let with_pkg = "package calculator_test\n\nfunc TestAdd(t *testing.T) {}";
        assert_eq!(adapter.prepend_boilerplate(with_pkg, &ast), with_pkg);

        let bare = "func TestAdd(t *testing.T) {}";
        let result = adapter.prepend_boilerplate(bare, &ast);
        assert!(result.starts_with("package calculator_test"));
        assert!(result.contains("testify"));
    }
}
