//! JavaScript/TypeScript language adapter.
//!
//! One adapter serves both: TypeScript resolves here through the
//! registry's adapter-family mapping, and type annotations are handled
//! in the shared parameter parser.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use super::{LanguageAdapter, test_type_focus};
use crate::types::{Ast, Definition, Language, Parameter, TestType};
use crate::{Result, TestforgeError};

static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:import\s+.+?\s+from\s+['"]([^'"]+)['"]|require\s*\(\s*['"]([^'"]+)['"]\s*\))"#)
        .expect("static regex")
});

/// Standard declaration: `export async function name(params)`.
static FUNC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s+(\w+)\s*\(([^)]*)\)")
        .expect("static regex")
});

/// Arrow function bound to a top-level const/let/var.
static ARROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(?:export\s+)?(?:const|let|var)\s+(\w+)\s*=\s*(?:async\s+)?\(([^)]*)\)\s*=>")
        .expect("static regex")
});

/// Function expression bound to a top-level const/let/var.
static EXPR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(?:export\s+)?(?:const|let|var)\s+(\w+)\s*=\s*(?:async\s+)?function\s*\(([^)]*)\)")
        .expect("static regex")
});

static CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+(\w+)")
        .expect("static regex")
});

/// Indented class method, optionally with TS visibility and return type.
static METHOD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]+(?:(?:public|private|protected)\s+)?(?:static\s+)?(?:async\s+)?(\w+)\s*\(([^)]*)\)\s*(?::\s*[^{\n]+)?\{",
    )
    .expect("static regex")
});

/// Control-flow keywords the method regex cannot tell from a name.
const NON_METHOD_NAMES: &[&str] = &[
    "if",
    "for",
    "while",
    "switch",
    "catch",
    "return",
    "function",
    "constructor",
];

/// Adapter for JavaScript and TypeScript source files.
pub struct JavaScriptAdapter;

impl JavaScriptAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JavaScriptAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAdapter for JavaScriptAdapter {
    fn language(&self) -> Language {
        Language::JavaScript
    }

    fn default_framework(&self) -> &'static str {
        "jest"
    }

    fn parse_file(&self, content: &str) -> Result<Ast> {
        let mut imports = Vec::new();
        for caps in IMPORT_RE.captures_iter(content) {
            if let Some(module) = caps.get(1).or_else(|| caps.get(2)) {
                imports.push(module.as_str().to_string());
            }
        }

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
        for re in [&*FUNC_RE, &*ARROW_RE, &*EXPR_RE] {
            for caps in re.captures_iter(content) {
                push_definition(content, &caps, None, &mut definitions);
            }
        }
        for caps in METHOD_RE.captures_iter(content) {
            let whole = caps.get(0).expect("capture 0 always present");
            let name = caps.get(1).map_or("", |m| m.as_str());
            if NON_METHOD_NAMES.contains(&name) {
                continue;
            }
            // A method only counts inside a class; other indented
            // callables (object literals, callbacks) are skipped.
            let class_name = class_spans
                .iter()
                .rev()
                .find(|(start, _)| *start < whole.start())
                .map(|(_, class)| class.clone());
            if class_name.is_none() {
                continue;
            }
            push_definition(content, &caps, class_name, &mut definitions);
        }
        definitions.sort_by_key(|d| d.start_line);

        // No package concept; modules are file-scoped.
        Ok(Ast {
            package: String::new(),
            imports,
            definitions,
        })
    }

    fn render_prompt(&self, test_type: TestType, def: &Definition, _ast: &Ast) -> String {
        format!(
            "Generate JavaScript/TypeScript tests using Jest for the following function.\n\n\
             Requirements:\n\
             - Organize tests with describe/it blocks\n\
             - Use expect() assertions with meaningful descriptions\n\
             - Handle async functions with async/await\n\
             - Mock dependencies with jest.mock()\n\
             - Use it.each() for parameterized cases\n\n\
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
        // Keep the source extension so TypeScript tests stay TypeScript.
        let ext = source.extension().and_then(|e| e.to_str()).unwrap_or("js");
        let dir = output_dir.map(Path::to_path_buf).unwrap_or_else(|| {
            let parent = source.parent().unwrap_or(Path::new(".")).to_path_buf();
            let tests_dir = parent.join("__tests__");
            if tests_dir.is_dir() { tests_dir } else { parent }
        });
        dir.join(format!("{stem}.test.{ext}"))
    }

    fn prepend_boilerplate(&self, code: &str, _ast: &Ast) -> String {
        // Jest globals need no imports; generated suites are
        // self-contained.
        code.to_string()
    }

    fn validate_tests(&self, code: &str, _path: &Path) -> Result<()> {
        if !code.contains("it(") && !code.contains("test(") {
            return Err(TestforgeError::ValidationFailed(
                "no test cases found".to_string(),
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

fn push_definition(
    content: &str,
    caps: &regex::Captures<'_>,
    class_name: Option<String>,
    definitions: &mut Vec<Definition>,
) {
    let whole = caps.get(0).expect("capture 0 always present");
    let name = caps.get(1).map_or("", |m| m.as_str()).to_string();

    let (body_end, signature_end) = body_span(content, whole.start(), whole.end());
    let body = content[whole.start()..body_end].trim_end().to_string();
    let signature = content[whole.start()..signature_end].trim_end().to_string();

    definitions.push(Definition {
        name,
        signature,
        parameters: parse_parameters(caps.get(2).map_or("", |m| m.as_str())),
        return_type: None,
        is_method: class_name.is_some(),
        class_name,
        body,
        start_line: line_of(content, whole.start()),
        end_line: line_of(content, body_end.saturating_sub(1)),
        docstring: None,
    });
}

/// (body end, signature end) for a definition matched at `start`.
///
/// Brace-bodied definitions run to the balancing close; an
/// expression-bodied arrow takes just its own line.
fn body_span(content: &str, start: usize, match_end: usize) -> (usize, usize) {
    let line_end = content[match_end..]
        .find('\n')
        .map_or(content.len(), |i| match_end + i);
    match content[start..line_end].find('{') {
        Some(rel) => {
            let open = start + rel;
            match super::find_block_end(content, open) {
                Some(close) => (close + 1, open),
                None => (line_end, open),
            }
        }
        None => (line_end, line_end),
    }
}

fn parse_parameters(params: &str) -> Vec<Parameter> {
    params
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            // TypeScript annotation: `name?: Type = default`.
            let (name, type_name) = match p.split_once(':') {
                Some((n, t)) => (n.trim(), t.split('=').next().unwrap_or(t).trim()),
                None => (p.split('=').next().unwrap_or(p).trim(), ""),
            };
            Parameter {
                name: name.trim_end_matches('?').to_string(),
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
