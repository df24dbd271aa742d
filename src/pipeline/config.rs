use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::AppConfig;
use crate::models::anthropic::{
    DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS,
};
use crate::models::AnthropicConfig;

pub const PIPELINE_VERSION: &str = "1.1";
pub const TRANSLATION_METHOD: &str = "Multi-pass LLM (Analyzer → Translator → Stylist → QA)";

pub const DEFAULT_TRACE_DIR: &str = "trace";

/// Resolved pipeline configuration, handed to the orchestrator at
/// construction. Config-file values first, CLI overrides on top; nothing is
/// read from ambient state after this point.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub model: String,
    pub max_tokens: u32,
    pub base_url: String,
    pub timeout: Duration,
    /// Fixed delay between stage calls (0 = no throttle).
    pub request_delay: Duration,
    pub trace_dir: PathBuf,
    pub trace_enabled: bool,
    pub verbose: bool,
}

impl PipelineConfig {
    #[must_use]
    pub fn resolve(
        app: &AppConfig,
        model_override: Option<&str>,
        trace_dir_override: Option<&Path>,
        quiet: bool,
    ) -> Self {
        let model = model_override
            .map(|s| s.to_string())
            .or_else(|| app.api.model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let trace_dir = trace_dir_override
            .map(|p| p.to_path_buf())
            .or_else(|| app.pipeline.trace_dir.clone().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TRACE_DIR));
        let trace_enabled =
            trace_dir_override.is_some() || app.pipeline.trace_prompts.unwrap_or(false);

        Self {
            model,
            max_tokens: app.api.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            base_url: app
                .api
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout: Duration::from_secs(app.api.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            request_delay: Duration::from_millis(app.pipeline.request_delay_ms.unwrap_or(0)),
            trace_dir,
            trace_enabled,
            verbose: !quiet,
        }
    }

    #[must_use]
    pub fn anthropic(&self, api_key: String) -> AnthropicConfig {
        AnthropicConfig {
            api_key,
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            base_url: self.base_url.clone(),
            timeout: self.timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_beat_config_values() {
        let app: AppConfig =
            toml::from_str("[api]\nmodel = \"from-config\"\nmax_tokens = 1000\n").expect("toml");
        let cfg = PipelineConfig::resolve(&app, Some("from-cli"), None, false);
        assert_eq!(cfg.model, "from-cli");
        assert_eq!(cfg.max_tokens, 1000);
        assert!(!cfg.trace_enabled);

        let cfg = PipelineConfig::resolve(&app, None, None, false);
        assert_eq!(cfg.model, "from-config");
    }

    #[test]
    fn trace_dir_override_enables_tracing() {
        let app = AppConfig::default();
        let cfg = PipelineConfig::resolve(&app, None, Some(Path::new("t")), true);
        assert!(cfg.trace_enabled);
        assert_eq!(cfg.trace_dir, PathBuf::from("t"));
        assert!(!cfg.verbose);
    }
}
