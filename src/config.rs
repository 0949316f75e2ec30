use crate::agents::replenishment::Volatility;
use crate::error::{RetailError, RetailResult};
use chrono::NaiveDate;
use std::path::PathBuf;

pub const DEFAULT_MODEL: &str = "meta-llama/llama-3.1-8b-instruct";
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    pub model: String,
    pub base_url: String,
    pub app_title: String,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            app_title: "RetailOps".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Runtime settings read from the environment (after `.env` is loaded).
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_key: Option<String>,
    pub llm: LlmSettings,
    pub data_dir: Option<PathBuf>,
    pub as_of: Option<NaiveDate>,
    pub default_volatility: Volatility,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            llm: LlmSettings::default(),
            data_dir: None,
            as_of: None,
            default_volatility: Volatility::Medium,
        }
    }
}

impl Settings {
    pub fn from_env() -> RetailResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> RetailResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut settings = Settings::default();

        settings.api_key = get("OPENROUTER_API_KEY");
        if let Some(model) = get("RETAIL_OPS_MODEL") {
            settings.llm.model = model;
        }
        if let Some(url) = get("RETAIL_OPS_BASE_URL") {
            settings.llm.base_url = url;
        }
        if let Some(secs) = get("RETAIL_OPS_LLM_TIMEOUT_SECS") {
            settings.llm.timeout_secs = secs.parse().map_err(|e| config_error("RETAIL_OPS_LLM_TIMEOUT_SECS", e))?;
        }
        settings.data_dir = get("RETAIL_OPS_DATA_DIR").map(PathBuf::from);
        if let Some(date) = get("RETAIL_OPS_AS_OF") {
            let parsed = NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|e| config_error("RETAIL_OPS_AS_OF", e))?;
            settings.as_of = Some(parsed);
        }
        if let Some(label) = get("RETAIL_OPS_DEFAULT_VOLATILITY") {
            settings.default_volatility = label.parse().map_err(|e| config_error("RETAIL_OPS_DEFAULT_VOLATILITY", e))?;
        }

        Ok(settings)
    }
}

fn config_error(field: &str, e: impl std::fmt::Display) -> RetailError {
    RetailError::Config {
        field: field.to_string(),
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn reads_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("OPENROUTER_API_KEY", "sk-test"),
            ("RETAIL_OPS_AS_OF", "2026-10-18"),
            ("RETAIL_OPS_DEFAULT_VOLATILITY", "high"),
            ("RETAIL_OPS_DATA_DIR", "/tmp/data"),
        ]))
        .unwrap();
        assert_eq!(settings.api_key.as_deref(), Some("sk-test"));
        assert_eq!(settings.as_of, NaiveDate::from_ymd_opt(2026, 10, 18));
        assert_eq!(settings.default_volatility, Volatility::High);
        assert_eq!(settings.data_dir, Some(PathBuf::from("/tmp/data")));
    }

    #[test]
    fn blank_api_key_is_unset() {
        let settings = Settings::from_lookup(lookup(&[("OPENROUTER_API_KEY", "  ")])).unwrap();
        assert!(settings.api_key.is_none());
    }

    #[test]
    fn bad_date_is_a_config_error() {
        let err = Settings::from_lookup(lookup(&[("RETAIL_OPS_AS_OF", "18/10/2026")])).unwrap_err();
        assert!(matches!(err, RetailError::Config { ref field, .. } if field == "RETAIL_OPS_AS_OF"));
    }
}
