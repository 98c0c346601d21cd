// Judge configuration: built-in defaults, optional JSON file, JUDGE_* env overrides
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_BUILD_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    /// Wall-clock limit applied to every test case
    pub timeout_ms: u64,
    pub build_timeout_ms: u64,
    /// Parent directory for workspaces; the system temp dir when unset
    pub workspace_root: Option<PathBuf>,
    /// 1 keeps the sequential reference behavior
    pub max_parallel_tests: usize,
    /// Per-stream capture limit for stdout and stderr
    pub max_output_bytes: usize,
    pub keep_workspace: bool,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            build_timeout_ms: DEFAULT_BUILD_TIMEOUT_MS,
            workspace_root: None,
            max_parallel_tests: 1,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            keep_workspace: false,
        }
    }
}

impl JudgeConfig {
    /// Load configuration from a JSON file. Missing fields take their defaults.
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            bail!("Judge config file not found: {}", config_path.display());
        }

        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: JudgeConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Apply `JUDGE_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("JUDGE_TIMEOUT_MS") {
            self.timeout_ms = parse_var("JUDGE_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = lookup("JUDGE_BUILD_TIMEOUT_MS") {
            self.build_timeout_ms = parse_var("JUDGE_BUILD_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = lookup("JUDGE_WORKSPACE_ROOT") {
            if !value.is_empty() {
                self.workspace_root = Some(PathBuf::from(value));
            }
        }
        if let Some(value) = lookup("JUDGE_MAX_PARALLEL_TESTS") {
            self.max_parallel_tests = parse_var("JUDGE_MAX_PARALLEL_TESTS", &value)?;
        }
        if let Some(value) = lookup("JUDGE_MAX_OUTPUT_BYTES") {
            self.max_output_bytes = parse_var("JUDGE_MAX_OUTPUT_BYTES", &value)?;
        }
        if let Some(value) = lookup("JUDGE_KEEP_WORKSPACE") {
            self.keep_workspace = matches!(value.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            bail!("timeout_ms must be greater than zero");
        }
        if self.build_timeout_ms == 0 {
            bail!("build_timeout_ms must be greater than zero");
        }
        if self.max_parallel_tests == 0 {
            bail!("max_parallel_tests must be at least 1");
        }
        if self.max_output_bytes == 0 {
            bail!("max_output_bytes must be greater than zero");
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid value for {}: {:?} ({})", name, value, e))
}
