//! On-disk configuration.
//!
//! Loaded from `testforge.toml` in the working directory, then from the
//! user config directory (`~/.config/testforge/testforge.toml` on
//! Linux), then built-in defaults. Every field is optional in the file;
//! CLI flags override whatever was loaded.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::TestType;
use crate::{Result, TestforgeError};

const CONFIG_FILE: &str = "testforge.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub llm: LlmConfig,
    pub generation: GenerationConfig,
    pub output: OutputConfig,
}

/// Backend selection and request budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LlmConfig {
    /// Backend name: anthropic, openai, gemini, groq.
    pub provider: String,
    /// Model override; unset selects the backend default.
    pub model: Option<String>,
    /// API key override; unset consults the backend's env var.
    pub api_key: Option<String>,
    /// Max output tokens passed to the provider config (0 = backend default).
    pub max_tokens: u32,
    pub temperature: f32,
    /// Global request budget across all workers.
    pub requests_per_minute: u32,
    /// Per-request deadline in seconds.
    pub timeout_seconds: u64,
    /// Response cache capacity in entries (0 = default).
    pub cache_entries: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: None,
            api_key: None,
            max_tokens: 0,
            temperature: 0.0,
            requests_per_minute: 60,
            timeout_seconds: 120,
            cache_entries: 0,
        }
    }
}

/// Generation behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    /// Test kinds generated per definition.
    pub test_types: Vec<TestType>,
    /// Concurrent workers (0 = default).
    pub parallel: usize,
    /// Structurally validate written tests.
    pub validate: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            test_types: vec![TestType::Unit],
            parallel: 3,
            validate: false,
        }
    }
}

/// Where generated artifacts land.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Directory for generated tests; unset places them next to sources.
    pub dir: Option<PathBuf>,
    /// Directory for per-run metrics records.
    pub metrics_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: None,
            metrics_dir: PathBuf::from(".testforge/metrics"),
        }
    }
}

impl Config {
    /// Load configuration from the conventional locations.
    ///
    /// Working directory first, then the user config directory. Missing
    /// files fall through; a present but malformed file is an error.
    pub fn load() -> Result<Self> {
        for candidate in candidate_paths() {
            if candidate.is_file() {
                debug!(path = %candidate.display(), "loading config");
                return Self::from_file(&candidate);
            }
        }
        Ok(Self::default())
    }

    /// Parse a specific config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| {
            TestforgeError::Configuration(format!("{}: {e}", path.display()))
        })
    }
}

fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("testforge").join(CONFIG_FILE));
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_sensible() {
        let config = Config::default();
        assert_eq!(config.llm.provider, "anthropic");
        assert_eq!(config.llm.requests_per_minute, 60);
        assert_eq!(config.generation.test_types, vec![TestType::Unit]);
        assert_eq!(config.generation.parallel, 3);
        assert!(config.output.dir.is_none());
    }

    #[test]
    fn partial_file_fills_remaining_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        fs::write(
            &path,
            r#"
[llm]
provider = "groq"
requests_per_minute = 30

[generation]
test_types = ["unit", "edge-cases"]
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.llm.provider, "groq");
        assert_eq!(config.llm.requests_per_minute, 30);
        assert_eq!(config.llm.timeout_seconds, 120);
        assert_eq!(
            config.generation.test_types,
            vec![TestType::Unit, TestType::EdgeCases]
        );
        assert_eq!(config.generation.parallel, 3);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        fs::write(&path, "[llm]\nprovder = \"typo\"\n").unwrap();
        assert!(matches!(
            Config::from_file(&path),
            Err(TestforgeError::Configuration(_))
        ));
    }
}
