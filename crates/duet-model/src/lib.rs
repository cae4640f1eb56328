// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod types;
mod provider;
mod openai_compat;
mod mock;

pub use types::*;
pub use provider::{ModelProvider, ResponseStream};
pub use openai_compat::OpenAiCompatProvider;
pub use mock::{MockProvider, Script, ScriptStep, ScriptedMockProvider};

use std::sync::Arc;

use anyhow::bail;
use duet_config::ModelConfig;
use tracing::debug;

/// Construct a shared [`ModelProvider`] from configuration.
///
/// Provider selection:
/// - `"openai"` → [`OpenAiCompatProvider`] (any OpenAI-compatible server)
/// - `"mock"` → [`MockProvider`] (offline canned continuations)
pub fn from_config(cfg: &ModelConfig) -> anyhow::Result<Arc<dyn ModelProvider>> {
    match cfg.provider.as_str() {
        "openai" => {
            let base_url = cfg.resolved_base_url()?;
            let params = cfg.params.clone().into_iter().collect();
            debug!(base_url = %base_url, model = %cfg.name, kind = %cfg.kind, "configured provider");
            Ok(Arc::new(OpenAiCompatProvider::new(
                "openai",
                cfg.name.clone(),
                cfg.resolved_api_key(),
                &base_url,
                cfg.kind,
                cfg.max_tokens,
                cfg.system_prompt.clone(),
                params,
            )))
        }
        "mock" => Ok(Arc::new(MockProvider::default())),
        other => bail!("unknown model provider: {other}"),
    }
}
