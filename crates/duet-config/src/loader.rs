// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use crate::Config;

/// Ordered list of config file locations searched from lowest to highest priority.
/// Later files override earlier ones.
fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    // 1. System-wide default
    paths.push(PathBuf::from("/etc/duet/config.toml"));

    // 2. XDG / home
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".config/duet/config.toml"));
    }
    if let Some(cfg) = dirs::config_dir() {
        paths.push(cfg.join("duet/config.toml"));
    }

    // 3. Workspace-local
    paths.push(PathBuf::from(".duet/config.toml"));
    paths.push(PathBuf::from("duet.toml"));

    paths
}

/// Load configuration by merging all discovered TOML files.
/// The `extra` argument may provide an explicit path (e.g. `--config` CLI flag);
/// unlike discovered layers it must exist.
pub fn load(extra: Option<&Path>) -> anyhow::Result<Config> {
    let mut merged = toml::Value::Table(toml::map::Map::new());

    for path in config_search_paths() {
        if path.is_file() {
            debug!(path = %path.display(), "loading config layer");
            merge_toml(&mut merged, read_layer(&path)?);
        }
    }

    if let Some(p) = extra {
        debug!(path = %p.display(), "loading explicit config");
        merge_toml(&mut merged, read_layer(p)?);
    }

    let config: Config = merged.try_into().context("invalid configuration")?;
    Ok(config)
}

/// Render a configuration back to TOML (used by `duet show-config`).
pub fn to_toml_string(config: &Config) -> anyhow::Result<String> {
    toml::to_string_pretty(config).context("serializing configuration")
}

fn read_layer(path: &Path) -> anyhow::Result<toml::Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Deep-merge `src` into `dst`; src wins on scalar conflicts.
fn merge_toml(dst: &mut toml::Value, src: toml::Value) {
    match (dst, src) {
        (toml::Value::Table(d), toml::Value::Table(s)) => {
            for (k, v) in s {
                let entry = d.entry(k).or_insert(toml::Value::Table(toml::map::Map::new()));
                merge_toml(entry, v);
            }
        }
        (dst, src) => *dst = src,
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn val(s: &str) -> toml::Value {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn merge_scalar_src_wins() {
        let mut dst = val(r#"x = 1"#);
        let src = val(r#"x = 2"#);
        merge_toml(&mut dst, src);
        assert_eq!(dst["x"].as_integer(), Some(2));
    }

    #[test]
    fn merge_preserves_keys_not_in_src() {
        let mut dst = val(r#"a = 1
b = 2"#);
        let src = val(r#"b = 99"#);
        merge_toml(&mut dst, src);
        assert_eq!(dst["a"].as_integer(), Some(1));
        assert_eq!(dst["b"].as_integer(), Some(99));
    }

    #[test]
    fn merge_nested_tables() {
        let mut dst = val(r#"[model]
base_url = "http://localhost:8080/v1/"
kind = "completion""#);
        let src = val(r#"[model]
kind = "chat""#);
        merge_toml(&mut dst, src);
        assert_eq!(dst["model"]["base_url"].as_str(), Some("http://localhost:8080/v1/"));
        assert_eq!(dst["model"]["kind"].as_str(), Some("chat"));
    }

    #[test]
    fn merge_params_table_adds_keys() {
        let mut dst = val(r#"[model.params]
temperature = 1.0"#);
        let src = val(r#"[model.params]
min_p = 0.05"#);
        merge_toml(&mut dst, src);
        assert_eq!(dst["model"]["params"]["temperature"].as_float(), Some(1.0));
        assert_eq!(dst["model"]["params"]["min_p"].as_float(), Some(0.05));
    }

    #[test]
    fn load_returns_defaults_when_no_files_present() {
        // Pass a non-existent explicit path – load() must still succeed
        let result = load(Some(Path::new("/tmp/duet_nonexistent_config_xyz.toml")));
        // Error expected because the explicit path doesn't exist
        assert!(result.is_err());
    }

    #[test]
    fn load_with_no_extra_path_returns_defaults() {
        // No config files on disk in this environment → pure defaults
        let cfg = load(None).unwrap();
        assert_eq!(cfg.model.provider, "openai");
        assert_eq!(cfg.model.max_tokens, 500);
    }

    #[test]
    fn load_explicit_file_overrides_defaults() {
        use std::io::Write;
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, r#"[model]
provider = "mock"
name = "test-model"

[transition]
fade_ms = 40"#).unwrap();
        let cfg = load(Some(f.path())).unwrap();
        assert_eq!(cfg.model.provider, "mock");
        assert_eq!(cfg.model.name, "test-model");
        assert_eq!(cfg.transition.fade_ms, 40);
        assert_eq!(cfg.transition.resize_ms, 250);
    }

    #[test]
    fn show_config_output_parses_back() {
        let text = to_toml_string(&Config::default()).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.model.base_url, Config::default().model.base_url);
        assert_eq!(back.model.params.len(), 5);
    }

    #[test]
    fn load_rejects_ill_typed_values() {
        use std::io::Write;
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "[model]\nmax_tokens = \"lots\"").unwrap();
        assert!(load(Some(f.path())).is_err());
    }
}
