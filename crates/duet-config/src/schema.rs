// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::collections::BTreeMap;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// System prompt used for `chat` kind models.  Completion models receive the
/// raw buffer text and ignore it.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a professional writer. Continue the given \
story or writing based on the user prompt. Answer only with the continuation and nothing \
else. Do not repeat the user prompt. Do not include content such as \"sure, here is the \
story\" or any similar response. At every beginning of a paragraph, include a newline \
character.";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub transition: TransitionConfig,
}

/// How requests to the completion service are shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Raw text completion: the buffer prefix is sent as `prompt` to
    /// `/completions`.  Works with llama.cpp and instruct models.
    #[default]
    Completion,
    /// Chat completion: the buffer prefix is wrapped in a system + user
    /// message pair and sent to `/chat/completions`.
    Chat,
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelKind::Completion => write!(f, "completion"),
            ModelKind::Chat => write!(f, "chat"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Provider identifier: "openai" (any OpenAI-compatible server) or "mock"
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model name forwarded to the API.  Most local servers ignore it.
    #[serde(default = "default_model_name")]
    pub name: String,
    /// API base URL, ending before `/completions`.  `$VAR` references are
    /// expanded from the environment.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Explicit API key.  Can be left empty for most local servers.
    pub api_key: Option<String>,
    /// Environment variable that holds the API key (read at runtime)
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub kind: ModelKind,
    /// Upper bound on generated tokens per candidate.  Generation stops at
    /// the end of a paragraph anyway, so this rarely needs changing.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// System prompt for `chat` kind models
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    /// Sampling parameters.  Their effect depends on the provider; they are
    /// forwarded verbatim and never normalized.
    #[serde(default = "default_params")]
    pub params: BTreeMap<String, serde_json::Value>,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model_name() -> String {
    "llama3-70b-8192".into()
}
fn default_base_url() -> String {
    // Default for a local llama.cpp server.
    "http://localhost:8080/v1/".into()
}
fn default_max_tokens() -> u32 {
    500
}
fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.into()
}
fn default_params() -> BTreeMap<String, serde_json::Value> {
    BTreeMap::from([
        ("temperature".to_string(), serde_json::json!(1.0)),
        ("top_k".to_string(), serde_json::json!(0)),
        ("top_p".to_string(), serde_json::json!(1.0)),
        ("min_p".to_string(), serde_json::json!(0.02)),
        ("repeat_penalty".to_string(), serde_json::json!(1.0)),
    ])
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            name: default_model_name(),
            base_url: default_base_url(),
            api_key: None,
            api_key_env: None,
            kind: ModelKind::Completion,
            max_tokens: default_max_tokens(),
            system_prompt: default_system_prompt(),
            params: default_params(),
        }
    }
}

impl ModelConfig {
    /// `base_url` with environment references expanded.
    pub fn resolved_base_url(&self) -> anyhow::Result<String> {
        shellexpand::env(&self.base_url)
            .map(|s| s.into_owned())
            .with_context(|| format!("expanding base_url {:?}", self.base_url))
    }

    /// The API key, from `api_key` or else the `api_key_env` variable.
    /// Empty keys count as absent.
    pub fn resolved_api_key(&self) -> Option<String> {
        let key = match (&self.api_key, &self.api_key_env) {
            (Some(k), _) => Some(k.clone()),
            (None, Some(env)) => std::env::var(env).ok(),
            (None, None) => None,
        };
        key.filter(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Hint shown while the buffer is empty
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

fn default_placeholder() -> String {
    "Once upon a time...".into()
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self { placeholder: default_placeholder() }
    }
}

/// Durations of the two visual phases run after a candidate is chosen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionConfig {
    #[serde(default = "default_phase_ms")]
    pub fade_ms: u64,
    #[serde(default = "default_phase_ms")]
    pub resize_ms: u64,
}

fn default_phase_ms() -> u64 {
    250
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self { fade_ms: default_phase_ms(), resize_ms: default_phase_ms() }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Defaults ─────────────────────────────────────────────────────────────

    #[test]
    fn config_default_targets_local_llama_cpp() {
        let c = Config::default();
        assert_eq!(c.model.provider, "openai");
        assert_eq!(c.model.base_url, "http://localhost:8080/v1/");
        assert_eq!(c.model.kind, ModelKind::Completion);
    }

    #[test]
    fn config_default_max_tokens_is_500() {
        assert_eq!(Config::default().model.max_tokens, 500);
    }

    #[test]
    fn config_default_sampling_params() {
        let c = Config::default();
        assert_eq!(c.model.params.len(), 5);
        assert_eq!(c.model.params["min_p"], serde_json::json!(0.02));
        assert_eq!(c.model.params["top_k"], serde_json::json!(0));
    }

    #[test]
    fn config_default_transition_phases() {
        let c = Config::default();
        assert_eq!(c.transition.fade_ms, 250);
        assert_eq!(c.transition.resize_ms, 250);
    }

    // ── Parsing ──────────────────────────────────────────────────────────────

    #[test]
    fn partial_model_table_keeps_other_defaults() {
        let c: Config = toml::from_str(
            r#"[model]
kind = "chat"
name = "gpt-3.5-turbo-instruct""#,
        )
        .unwrap();
        assert_eq!(c.model.kind, ModelKind::Chat);
        assert_eq!(c.model.name, "gpt-3.5-turbo-instruct");
        assert_eq!(c.model.max_tokens, 500);
        assert!(c.model.system_prompt.starts_with("You are a professional writer"));
    }

    #[test]
    fn explicit_params_replace_defaults() {
        let c: Config = toml::from_str(
            r#"[model.params]
temperature = 0.7
mirostat = 2"#,
        )
        .unwrap();
        assert_eq!(c.model.params.len(), 2);
        assert_eq!(c.model.params["mirostat"], serde_json::json!(2));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let r: Result<Config, _> = toml::from_str("[model]\nkind = \"embedding\"");
        assert!(r.is_err());
    }

    // ── Resolution helpers ───────────────────────────────────────────────────

    #[test]
    fn api_key_prefers_explicit_value() {
        let m = ModelConfig {
            api_key: Some("sk-explicit".into()),
            api_key_env: Some("DUET_TEST_UNUSED_KEY".into()),
            ..ModelConfig::default()
        };
        assert_eq!(m.resolved_api_key().as_deref(), Some("sk-explicit"));
    }

    #[test]
    fn blank_api_key_counts_as_absent() {
        let m = ModelConfig { api_key: Some("  ".into()), ..ModelConfig::default() };
        assert!(m.resolved_api_key().is_none());
    }

    #[test]
    fn api_key_env_missing_variable_is_none() {
        let m = ModelConfig {
            api_key_env: Some("DUET_TEST_SURELY_UNSET_VARIABLE".into()),
            ..ModelConfig::default()
        };
        assert!(m.resolved_api_key().is_none());
    }

    #[test]
    fn base_url_without_references_is_unchanged() {
        let m = ModelConfig::default();
        assert_eq!(m.resolved_base_url().unwrap(), "http://localhost:8080/v1/");
    }

    #[test]
    fn base_url_with_unset_reference_is_an_error() {
        let m = ModelConfig {
            base_url: "http://$DUET_TEST_SURELY_UNSET_HOST/v1".into(),
            ..ModelConfig::default()
        };
        assert!(m.resolved_base_url().is_err());
    }

    #[test]
    fn model_kind_display_matches_serde_name() {
        assert_eq!(ModelKind::Chat.to_string(), "chat");
        assert_eq!(ModelKind::Completion.to_string(), "completion");
    }
}
