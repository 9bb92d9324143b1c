//! Rust language adapter.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use super::{LanguageAdapter, test_type_focus};
use crate::types::{Ast, Definition, Language, Parameter, TestType};
use crate::Result;

static USE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^use\s+([^;]+);").expect("static regex"));

static FN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(\s*)(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?fn\s+(\w+)(?:<[^>]+>)?\s*\(([^)]*)\)(?:\s*->\s*([^\{]+))?\s*\{")
        .expect("static regex")
});

static IMPL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^impl(?:<[^>]+>)?\s+(?:(\w+)\s+for\s+)?(\w+)").expect("static regex")
});

/// Adapter for Rust source files.
pub struct RustAdapter;

impl RustAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAdapter for RustAdapter {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn default_framework(&self) -> &'static str {
        "cargo-test"
    }

    fn parse_file(&self, content: &str) -> Result<Ast> {
        let imports: Vec<String> = USE_RE
            .captures_iter(content)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .collect();

        let impl_spans: Vec<(usize, String)> = IMPL_RE
            .captures_iter(content)
            .filter_map(|c| {
                let start = c.get(0)?.start();
                let type_name = c.get(2)?.as_str().to_string();
                Some((start, type_name))
            })
            .collect();

        let mut definitions = Vec::new();
        for caps in FN_RE.captures_iter(content) {
            let whole = caps.get(0).expect("capture 0 always present");
            let indent = caps.get(1).map_or("", |m| m.as_str());
            let name = caps.get(2).map_or("", |m| m.as_str()).to_string();
            if name == "main" {
                continue;
            }

            let open = content[whole.range()]
                .rfind('{')
                .map(|i| whole.start() + i)
                .expect("fn regex requires a brace");
            let Some(close) = super::find_block_end(content, open) else {
                continue;
            };

            let params_text = caps.get(3).map_or("", |m| m.as_str());
            let is_method = params_text.trim_start().starts_with('&')
                || params_text.trim_start().starts_with("self")
                || params_text.trim_start().starts_with("mut self");
            let class_name = if !indent.is_empty() {
                impl_spans
                    .iter()
                    .rev()
                    .find(|(start, _)| *start < whole.start())
                    .map(|(_, name)| name.clone())
            } else {
                None
            };

            definitions.push(Definition {
                name,
                signature: content[whole.start()..open].trim().to_string(),
                parameters: parse_parameters(params_text),
                return_type: caps.get(4).map(|m| m.as_str().trim().to_string()),
                is_method: is_method && class_name.is_some(),
                class_name,
                body: content[whole.start()..=close].to_string(),
                start_line: line_of(content, whole.start()),
                end_line: line_of(content, close),
                docstring: None,
            });
        }

        Ok(Ast {
            package: String::new(),
            imports,
            definitions,
        })
    }

    fn render_prompt(&self, test_type: TestType, def: &Definition, _ast: &Ast) -> String {
        format!(
            "Generate Rust unit tests for the following function.\n\n\
             Requirements:\n\
             - Use the built-in test framework (#[test] functions)\n\
             - Use assert_eq!/assert! with descriptive messages\n\
             - Cover happy path, edge cases, and error conditions\n\
             - Test Result-returning functions for both Ok and Err\n\n\
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
        dir.join(format!("{stem}_test.rs"))
    }

    fn prepend_boilerplate(&self, code: &str, _ast: &Ast) -> String {
        if code.contains("#[cfg(test)]") || code.contains("mod tests") {
            return code.to_string();
        }
        format!("#[cfg(test)]\nmod tests {{\n    use super::*;\n\n{code}\n}}\n")
    }
}

fn parse_parameters(params: &str) -> Vec<Parameter> {
    params
        .split(',')
        .map(str::trim)
        .filter(|p| {
            !p.is_empty() && *p != "self" && *p != "&self" && *p != "&mut self" && *p != "mut self"
        })
        .filter_map(|p| {
            let (name, type_name) = p.split_once(':')?;
            Some(Parameter {
                name: name.trim().trim_start_matches("mut ").to_string(),
                type_name: type_name.trim().to_string(),
            })
        })
        .collect()
}

fn line_of(content: &str, offset: usize) -> u32 {
    content[..offset].bytes().filter(|&b| b == b'\n').count() as u32 + 1
}
