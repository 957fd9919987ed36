use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Application settings loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub openai_api_key: String,
    pub openai_api_base: String,
    pub llm_model: String,
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,

    pub github_token: Option<String>,
    pub github_api_base: String,

    pub openweathermap_api_key: String,
    pub openweathermap_api_base: String,

    pub max_retries: u32,
    pub request_timeout_secs: u64,
    pub retry_backoff_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            openai_api_base: "https://api.openai.com/v1".to_string(),
            llm_model: "gpt-3.5-turbo".to_string(),
            llm_temperature: 0.1,
            llm_max_tokens: 2000,
            github_token: None,
            github_api_base: "https://api.github.com".to_string(),
            openweathermap_api_key: String::new(),
            openweathermap_api_base: "https://api.openweathermap.org/data/2.5".to_string(),
            max_retries: 3,
            request_timeout_secs: 30,
            retry_backoff_secs: 1,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Settings::default();
        Self {
            openai_api_key: env_or("OPENAI_API_KEY", defaults.openai_api_key),
            openai_api_base: env_or("OPENAI_API_BASE", defaults.openai_api_base),
            llm_model: env_or("LLM_MODEL", defaults.llm_model),
            llm_temperature: env_parse("LLM_TEMPERATURE", defaults.llm_temperature),
            llm_max_tokens: env_parse("LLM_MAX_TOKENS", defaults.llm_max_tokens),
            github_token: env::var("GITHUB_TOKEN").ok().filter(|v| !v.is_empty()),
            github_api_base: env_or("GITHUB_API_BASE", defaults.github_api_base),
            openweathermap_api_key: env_or(
                "OPENWEATHERMAP_API_KEY",
                defaults.openweathermap_api_key,
            ),
            openweathermap_api_base: env_or(
                "OPENWEATHERMAP_API_BASE",
                defaults.openweathermap_api_base,
            ),
            max_retries: env_parse("MAX_RETRIES", defaults.max_retries),
            request_timeout_secs: env_parse("REQUEST_TIMEOUT", defaults.request_timeout_secs),
            retry_backoff_secs: env_parse("RETRY_BACKOFF_SECS", defaults.retry_backoff_secs),
        }
    }

    /// Reports which external credentials are present.
    pub fn validate(&self) -> ConfigStatus {
        let openai_configured = !self.openai_api_key.is_empty();
        let github_configured = self.github_token.is_some();
        let weather_configured = !self.openweathermap_api_key.is_empty();
        ConfigStatus {
            openai_configured,
            github_configured,
            weather_configured,
            all_required_configured: openai_configured && weather_configured,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigStatus {
    pub openai_configured: bool,
    pub github_configured: bool,
    pub weather_configured: bool,
    pub all_required_configured: bool,
}

fn env_or(key: &str, default: String) -> String {
    env::var(key).ok().filter(|v| !v.is_empty()).unwrap_or(default)
}

fn env_parse<T: FromStr + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Invalid value for {key}: {raw:?}, using default");
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_values() {
        let s = Settings::default();
        assert_eq!(s.max_retries, 3);
        assert_eq!(s.request_timeout_secs, 30);
        assert_eq!(s.retry_backoff_secs, 1);
        assert_eq!(s.github_api_base, "https://api.github.com");
    }

    #[test]
    fn env_parse_falls_back_on_unset() {
        assert_eq!(env_parse("OPSAGENT_TEST_UNSET_VAR_XYZ", 7u32), 7);
    }

    #[test]
    fn validation_flags_missing_credentials() {
        let status = Settings::default().validate();
        assert!(!status.openai_configured);
        assert!(!status.all_required_configured);
    }
}
