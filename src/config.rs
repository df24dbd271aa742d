use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILENAME: &str = "divan-translator.toml";

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub pipeline: PipelineSection,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct ApiSection {
    /// Messages API endpoint base, for proxies and test servers.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Per-request timeout; expiry is a transport failure for that poem.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct PipelineSection {
    /// Fixed delay between stage calls, the corpus-level rate throttle.
    #[serde(default)]
    pub request_delay_ms: Option<u64>,
    #[serde(default)]
    pub trace_dir: Option<String>,
    /// Dump each stage's prompt and raw output under trace_dir.
    #[serde(default)]
    pub trace_prompts: Option<bool>,
}

pub fn find_file_upwards(start_dir: &Path, filename: &str, max_levels: usize) -> Option<PathBuf> {
    let mut dir = start_dir.to_path_buf();
    for _ in 0..=max_levels {
        let cand = dir.join(filename);
        if cand.is_file() {
            return Some(cand);
        }
        match dir.parent() {
            Some(p) => dir = p.to_path_buf(),
            None => break,
        }
    }
    None
}

pub fn find_default_config() -> Option<PathBuf> {
    if let Ok(cwd) = std::env::current_dir() {
        if let Some(p) = find_file_upwards(&cwd, DEFAULT_CONFIG_FILENAME, 8) {
            return Some(p);
        }
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            if let Some(p) = find_file_upwards(dir, DEFAULT_CONFIG_FILENAME, 8) {
                return Some(p);
            }
        }
    }
    None
}

pub fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read config: {}", path.display()))?;
    let cfg: AppConfig = toml::from_str(&text).context("parse config toml")?;
    Ok(cfg)
}

pub const DEFAULT_CONFIG_TEXT: &str = r#"# divan-translator configuration

[api]
# model = "claude-sonnet-4-20250514"
# max_tokens = 4000
# timeout_secs = 120
# base_url = "https://api.anthropic.com"

[pipeline]
# request_delay_ms = 0
# trace_dir = "trace"
# trace_prompts = false
"#;

/// Write a default config file, for `--init-config`.
pub fn init_default_config(dir: &Path, force: bool) -> anyhow::Result<PathBuf> {
    let path = dir.join(DEFAULT_CONFIG_FILENAME);
    if path.exists() && !force {
        anyhow::bail!("config already exists: {} (use --force)", path.display());
    }
    std::fs::create_dir_all(dir).with_context(|| format!("create dir: {}", dir.display()))?;
    std::fs::write(&path, DEFAULT_CONFIG_TEXT)
        .with_context(|| format!("write config: {}", path.display()))?;
    Ok(path)
}
