//! Text-service configuration from the environment. Recognized keys are
//! explicit, unknown keys are ignored, malformed values fall back to their
//! named defaults, and range-bounded values are clamped. None of this
//! affects simulation determinism.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
pub const DEFAULT_LLAMACPP_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";
pub const TIMEOUT_MS_RANGE: (u64, u64) = (1_000, 120_000);
pub const MIN_INTERVAL_MS_RANGE: (u64, u64) = (0, 60_000);
pub const CACHE_MAX_ENTRIES_RANGE: (usize, usize) = (16, 5_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Provider {
    #[default]
    Ollama,
    LlamaCpp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiConfig {
    pub provider: Provider,
    pub base_url: String,
    pub timeout_ms: u64,
    pub min_interval_ms: u64,
    pub cache_ttl_ms: u64,
    pub cache_max_entries: usize,
    pub streaming: bool,
    pub model: String,
    /// Per-scope model overrides from `AI_<SCOPE>_MODEL` keys, scope
    /// lowercased (e.g. `AI_SPECIES_MODEL` → `"species"`).
    pub scope_models: BTreeMap<String, String>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Ollama,
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            timeout_ms: 30_000,
            min_interval_ms: 250,
            cache_ttl_ms: 600_000,
            cache_max_entries: 512,
            streaming: false,
            model: DEFAULT_OLLAMA_MODEL.to_string(),
            scope_models: BTreeMap::new(),
        }
    }
}

impl AiConfig {
    /// Read from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Read from an explicit key/value iterator (testable seam).
    pub fn from_vars(vars: impl Iterator<Item = (String, String)>) -> Self {
        let mut cfg = Self::default();
        let vars: BTreeMap<String, String> = vars.collect();

        if let Some(v) = vars.get("AI_PROVIDER") {
            match v.as_str() {
                "ollama" => cfg.provider = Provider::Ollama,
                "llamaCpp" => {
                    cfg.provider = Provider::LlamaCpp;
                    cfg.base_url = DEFAULT_LLAMACPP_URL.to_string();
                }
                other => tracing::warn!(value = other, "unrecognized AI_PROVIDER, using default"),
            }
        }
        if let Some(v) = vars.get("AI_BASE_URL") {
            cfg.base_url = v.clone();
        }
        if let Some(v) = parse(&vars, "AI_TIMEOUT_MS") {
            cfg.timeout_ms = clamp_u64(v, TIMEOUT_MS_RANGE);
        }
        if let Some(v) = parse(&vars, "AI_MIN_INTERVAL_MS") {
            cfg.min_interval_ms = clamp_u64(v, MIN_INTERVAL_MS_RANGE);
        }
        if let Some(v) = parse(&vars, "AI_CACHE_TTL_MS") {
            cfg.cache_ttl_ms = v;
        }
        if let Some(v) = parse::<usize>(&vars, "AI_CACHE_MAX_ENTRIES") {
            cfg.cache_max_entries = v.clamp(CACHE_MAX_ENTRIES_RANGE.0, CACHE_MAX_ENTRIES_RANGE.1);
        }
        if let Some(v) = vars.get("AI_STREAMING") {
            match v.as_str() {
                "true" | "1" => cfg.streaming = true,
                "false" | "0" => cfg.streaming = false,
                other => tracing::warn!(value = other, "unrecognized AI_STREAMING, using default"),
            }
        }
        if let Some(v) = vars.get("AI_MODEL") {
            cfg.model = v.clone();
        }

        // Scope overrides: AI_<SCOPE>_MODEL, excluding the plain AI_MODEL.
        for (key, value) in &vars {
            if let Some(scope) = key
                .strip_prefix("AI_")
                .and_then(|rest| rest.strip_suffix("_MODEL"))
            {
                if !scope.is_empty() {
                    cfg.scope_models.insert(scope.to_lowercase(), value.clone());
                }
            }
        }

        cfg
    }

    /// Model for a scope (`creature`, `species`, `civ`), falling back to the
    /// default model.
    #[must_use]
    pub fn model_for(&self, scope: &str) -> &str {
        self.scope_models
            .get(scope)
            .map(String::as_str)
            .unwrap_or(&self.model)
    }
}

fn parse<T: std::str::FromStr>(vars: &BTreeMap<String, String>, key: &str) -> Option<T> {
    let raw = vars.get(key)?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "unparseable value, using default");
            None
        }
    }
}

fn clamp_u64(v: u64, range: (u64, u64)) -> u64 {
    v.clamp(range.0, range.1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Iterator<Item = (String, String)> + '_ {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = AiConfig::from_vars(vars(&[]));
        assert_eq!(cfg, AiConfig::default());
    }

    #[test]
    fn ranges_are_clamped() {
        let cfg = AiConfig::from_vars(vars(&[
            ("AI_TIMEOUT_MS", "50"),
            ("AI_MIN_INTERVAL_MS", "999999999"),
            ("AI_CACHE_MAX_ENTRIES", "2"),
        ]));
        assert_eq!(cfg.timeout_ms, TIMEOUT_MS_RANGE.0);
        assert_eq!(cfg.min_interval_ms, MIN_INTERVAL_MS_RANGE.1);
        assert_eq!(cfg.cache_max_entries, CACHE_MAX_ENTRIES_RANGE.0);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let cfg = AiConfig::from_vars(vars(&[("AI_FROBNICATE", "yes"), ("PATH", "/bin")]));
        assert_eq!(cfg, AiConfig::default());
    }

    #[test]
    fn malformed_values_fall_back_to_defaults() {
        let cfg = AiConfig::from_vars(vars(&[("AI_TIMEOUT_MS", "soon"), ("AI_STREAMING", "maybe")]));
        assert_eq!(cfg.timeout_ms, AiConfig::default().timeout_ms);
        assert!(!cfg.streaming);
    }

    #[test]
    fn scope_models_override_the_default() {
        let cfg = AiConfig::from_vars(vars(&[
            ("AI_MODEL", "base-model"),
            ("AI_SPECIES_MODEL", "species-model"),
        ]));
        assert_eq!(cfg.model_for("species"), "species-model");
        assert_eq!(cfg.model_for("creature"), "base-model");
    }

    #[test]
    fn llamacpp_provider_switches_default_url() {
        let cfg = AiConfig::from_vars(vars(&[("AI_PROVIDER", "llamaCpp")]));
        assert_eq!(cfg.provider, Provider::LlamaCpp);
        assert_eq!(cfg.base_url, DEFAULT_LLAMACPP_URL);
    }
}
