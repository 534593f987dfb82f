// Runtime configuration read from the environment (and an optional .env file).

use crate::core::ai::AiConfig;
use crate::core::moderation::DEFAULT_MODERATION_PROMPT;
use crate::infra::ai::DEFAULT_GEMINI_BASE_URL;
use anyhow::{Context, Result};
use std::time::Duration;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_DATABASE_PATH: &str = "data/campus.db";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: String,
    /// Only `classify` needs a key, so a missing one is reported lazily.
    pub gemini_api_key: Option<String>,
    pub gemini_api_base: String,
    pub gemini_model: String,
    pub temperature: f32,
    pub classifier_timeout: Option<Duration>,
    pub moderation_prompt: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let temperature = match var("MODERATION_TEMPERATURE") {
            Some(raw) => raw
                .trim()
                .parse::<f32>()
                .with_context(|| format!("MODERATION_TEMPERATURE is not a number: {raw}"))?,
            None => 0.0,
        };

        let classifier_timeout = match var("CLASSIFIER_TIMEOUT_SECS") {
            Some(raw) => Some(Duration::from_secs(
                raw.trim()
                    .parse::<u64>()
                    .with_context(|| format!("CLASSIFIER_TIMEOUT_SECS is not a whole number: {raw}"))?,
            )),
            None => None,
        };

        let moderation_prompt = match var("MODERATION_PROMPT_FILE") {
            Some(path) => std::fs::read_to_string(&path).unwrap_or_else(|e| {
                tracing::warn!("Failed to read moderation prompt file at {}: {}", path, e);
                DEFAULT_MODERATION_PROMPT.to_string()
            }),
            None => DEFAULT_MODERATION_PROMPT.to_string(),
        };

        Ok(Self {
            database_path: var("DATABASE_PATH").unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
            gemini_api_key: var("GEMINI_API_KEY"),
            gemini_api_base: var("GEMINI_API_BASE")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            gemini_model: var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            temperature,
            classifier_timeout,
            moderation_prompt,
        })
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.gemini_api_key.as_deref().context(
            "Missing GEMINI_API_KEY environment variable! Add it to your .env file to classify content.",
        )
    }

    /// Generation settings for classification calls. Always asks for JSON output.
    pub fn classifier_config(&self) -> AiConfig {
        AiConfig {
            model: self.gemini_model.clone(),
            temperature: self.temperature,
            max_tokens: None,
            top_p: None,
            json_output: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_any_variables() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.database_path, DEFAULT_DATABASE_PATH);
        assert_eq!(config.gemini_model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.gemini_api_base, DEFAULT_GEMINI_BASE_URL);
        assert_eq!(config.temperature, 0.0);
        assert!(config.classifier_timeout.is_none());
        assert_eq!(config.moderation_prompt, DEFAULT_MODERATION_PROMPT);
        assert!(config.require_api_key().is_err());
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = config_from(&[
            ("GEMINI_API_KEY", "secret"),
            ("GEMINI_MODEL", "gemini-1.5-pro"),
            ("MODERATION_TEMPERATURE", "0.2"),
            ("CLASSIFIER_TIMEOUT_SECS", "15"),
            ("DATABASE_PATH", "/tmp/campus.db"),
        ])
        .unwrap();

        assert_eq!(config.require_api_key().unwrap(), "secret");
        assert_eq!(config.classifier_timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.database_path, "/tmp/campus.db");

        let ai = config.classifier_config();
        assert_eq!(ai.model, "gemini-1.5-pro");
        assert_eq!(ai.temperature, 0.2);
        assert!(ai.json_output);
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let config = config_from(&[("GEMINI_API_KEY", "  ")]).unwrap();
        assert!(config.gemini_api_key.is_none());
    }

    #[test]
    fn test_bad_numbers_are_rejected() {
        assert!(config_from(&[("MODERATION_TEMPERATURE", "warm")]).is_err());
        assert!(config_from(&[("CLASSIFIER_TIMEOUT_SECS", "-3")]).is_err());
    }

    #[test]
    fn test_prompt_file_overrides_and_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompt.txt");
        std::fs::write(&path, "Only reject spam.").unwrap();

        let config = config_from(&[("MODERATION_PROMPT_FILE", path.to_str().unwrap())]).unwrap();
        assert_eq!(config.moderation_prompt, "Only reject spam.");

        let missing = dir.path().join("missing.txt");
        let config =
            config_from(&[("MODERATION_PROMPT_FILE", missing.to_str().unwrap())]).unwrap();
        assert_eq!(config.moderation_prompt, DEFAULT_MODERATION_PROMPT);
    }
}
