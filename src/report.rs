//! Per-run metrics record.
//!
//! One JSON document per run, written once at the end to
//! `<metrics_dir>/<run_id>.json`. The record is an audit trail for cost
//! and cache effectiveness, not a live metrics surface; live counters go
//! through the `metrics` facade.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cache::CacheStats;
use crate::types::{GenerationResult, UsageMetrics};
use crate::Result;

/// Summary of one generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    /// RFC 3339, UTC.
    pub timestamp: String,
    pub total_files: usize,
    pub tokens_input: u64,
    pub tokens_output: u64,
    pub cache_hit_rate: f64,
    pub total_cost_usd: f64,
    pub execution_time_seconds: f64,
    pub success_count: usize,
    pub error_count: usize,
}

impl RunReport {
    /// Assemble the record from the run's outcomes and counters.
    pub fn new(
        results: &[GenerationResult],
        usage: &UsageMetrics,
        cache: &CacheStats,
        elapsed: Duration,
    ) -> Self {
        let now: DateTime<Utc> = Utc::now();
        let success_count = results.iter().filter(|r| r.is_success()).count();
        Self {
            run_id: format!("run-{}", now.format("%Y%m%d-%H%M%S")),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Secs, true),
            total_files: results.len(),
            tokens_input: usage.total_tokens_in,
            tokens_output: usage.total_tokens_out,
            cache_hit_rate: cache.hit_rate,
            total_cost_usd: usage.estimated_cost_usd,
            execution_time_seconds: elapsed.as_secs_f64(),
            success_count,
            error_count: results.len() - success_count,
        }
    }

    /// Write the record under `metrics_dir`, creating it as needed.
    ///
    /// Returns the path written.
    pub fn write(&self, metrics_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(metrics_dir)?;
        let path = metrics_dir.join(format!("{}.json", self.run_id));
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        info!(path = %path.display(), "run report written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Language, SourceFile};

    fn results() -> Vec<GenerationResult> {
        let ok_file = SourceFile::new("a.go", Language::Go);
        let bad_file = SourceFile::new("b.go", Language::Go);
        vec![
            GenerationResult::for_file(&ok_file),
            GenerationResult::failed(&bad_file, "read failed"),
        ]
    }

    fn usage() -> UsageMetrics {
        let mut u = UsageMetrics::default();
        u.record(1000, 500, 0.0105);
        u
    }

    fn cache_stats() -> CacheStats {
        CacheStats {
            size: 1,
            hits: 3,
            misses: 1,
            hit_rate: 0.75,
        }
    }

    #[test]
    fn counts_successes_and_errors() {
        let report = RunReport::new(&results(), &usage(), &cache_stats(), Duration::from_secs(2));
        assert_eq!(report.total_files, 2);
        assert_eq!(report.success_count, 1);
        assert_eq!(report.error_count, 1);
        assert_eq!(report.tokens_input, 1000);
        assert!((report.cache_hit_rate - 0.75).abs() < 1e-9);
        assert!(report.run_id.starts_with("run-"));
    }

    #[test]
    fn writes_one_json_file_under_metrics_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let report = RunReport::new(&results(), &usage(), &cache_stats(), Duration::from_secs(1));

        let path = report.write(tmp.path()).unwrap();
        assert!(path.exists());

        let loaded: RunReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.run_id, report.run_id);
        assert_eq!(loaded.total_files, 2);
    }
}
