use crate::core::PipelineError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Immutable option set for one pipeline run. Built once, passed through the
/// orchestrator's constructor, never read from ambient state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    #[serde(default = "default_max_file_size_bytes")]
    pub max_file_size_bytes: u64,

    /// Extensions (without the dot) eligible for selection.
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,

    /// Glob patterns excluded from selection, matched against repo-relative paths.
    #[serde(default = "default_exclusion_patterns")]
    pub exclusion_patterns: Vec<String>,

    /// 0 means "let the thread pool size itself".
    #[serde(default)]
    pub static_worker_count: usize,

    #[serde(default = "default_ai_worker_count")]
    pub ai_worker_count: usize,

    /// Overall ceiling on the suspending (AI) phase of the run, in seconds.
    #[serde(default)]
    pub overall_run_timeout_secs: Option<u64>,

    #[serde(default)]
    pub ai: AiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_ai_enabled")]
    pub enabled: bool,

    #[serde(default = "default_model")]
    pub model: String,

    /// If not provided, the provider falls back to OPENAI_API_KEY.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Ceiling on provider calls across the whole run, retries included.
    #[serde(default = "default_call_budget")]
    pub call_budget: u32,

    /// Largest code excerpt shipped per request; longer files are truncated
    /// at a line boundary.
    #[serde(default = "default_max_excerpt_bytes")]
    pub max_excerpt_bytes: usize,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_max_files() -> usize {
    50
}
fn default_max_file_size_bytes() -> u64 {
    1024 * 1024
}
fn default_allowed_extensions() -> Vec<String> {
    ["py", "js", "ts", "java", "c", "cpp", "go", "cs", "rb", "php"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_exclusion_patterns() -> Vec<String> {
    [
        "**/node_modules/**",
        "**/target/**",
        "**/vendor/**",
        "**/__pycache__/**",
        "**/*.min.js",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_ai_worker_count() -> usize {
    4
}
fn default_ai_enabled() -> bool {
    true
}
fn default_model() -> String {
    "gpt-4o".to_string()
}
fn default_call_timeout_secs() -> u64 {
    60
}
fn default_max_retries() -> u32 {
    3
}
fn default_call_budget() -> u32 {
    10
}
fn default_max_excerpt_bytes() -> usize {
    24_000
}
fn default_temperature() -> f32 {
    0.2
}
fn default_max_tokens() -> u32 {
    4000
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
            max_file_size_bytes: default_max_file_size_bytes(),
            allowed_extensions: default_allowed_extensions(),
            exclusion_patterns: default_exclusion_patterns(),
            static_worker_count: 0,
            ai_worker_count: default_ai_worker_count(),
            overall_run_timeout_secs: None,
            ai: AiConfig::default(),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: default_ai_enabled(),
            model: default_model(),
            api_key: None,
            call_timeout_secs: default_call_timeout_secs(),
            max_retries: default_max_retries(),
            call_budget: default_call_budget(),
            max_excerpt_bytes: default_max_excerpt_bytes(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Environment overrides layered on top of an existing config.
    pub fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("KENSA_MAX_FILES") {
            if let Ok(n) = v.parse() {
                self.max_files = n;
            }
        }
        if let Ok(v) = std::env::var("KENSA_AI_ENABLED") {
            self.ai.enabled = v.eq_ignore_ascii_case("true") || v == "1";
        }
        if let Ok(v) = std::env::var("KENSA_AI_MODEL") {
            self.ai.model = v;
        }
        if let Ok(v) = std::env::var("KENSA_AI_CALL_BUDGET") {
            if let Ok(n) = v.parse() {
                self.ai.call_budget = n;
            }
        }
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.ai.call_timeout_secs)
    }

    pub fn overall_run_timeout(&self) -> Option<Duration> {
        self.overall_run_timeout_secs.map(Duration::from_secs)
    }

    /// Rejects configurations that cannot produce a meaningful run. Invalid
    /// configuration is fatal before any work starts.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.max_files == 0 {
            return Err(PipelineError::InvalidConfig(
                "max_files must be at least 1".into(),
            ));
        }
        if self.max_file_size_bytes == 0 {
            return Err(PipelineError::InvalidConfig(
                "max_file_size_bytes must be at least 1".into(),
            ));
        }
        if self.allowed_extensions.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "allowed_extensions must not be empty".into(),
            ));
        }
        if self.ai_worker_count == 0 {
            return Err(PipelineError::InvalidConfig(
                "ai_worker_count must be at least 1".into(),
            ));
        }
        if self.overall_run_timeout_secs == Some(0) {
            return Err(PipelineError::InvalidConfig(
                "overall_run_timeout_secs must be nonzero when set".into(),
            ));
        }
        Ok(())
    }
}
