//! Process-wide configuration, built once at startup and handed to each component.

use std::{env, time::Duration};

use crate::provider::Provider;

pub const DEFAULT_PROMPT: &str = "You are a YouTube video summarizer. Your task is to take the transcript text \
and summarize the entire video, providing the important points in under 500 words. Please \
provide the summary of the text given here:";

pub const DEFAULT_TRANSCRIPT_LANGUAGES: &[&str] = &["en"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Credential for the generative-language service. `None` makes every
    /// summarization fail while the rest of the process keeps working.
    pub credential: Option<String>,
    pub prompt_template: String,
    pub provider: Provider,
    /// Overrides the provider's default model
    pub model: Option<String>,
    /// Applied to every outgoing HTTP request; `None` keeps the client default
    pub request_timeout: Option<Duration>,
    /// Caption languages to look for, most preferred first
    pub transcript_languages: Vec<String>,
}

impl AppConfig {
    pub fn new(provider: Provider) -> Self {
        Self {
            credential: None,
            prompt_template: DEFAULT_PROMPT.to_string(),
            provider,
            model: None,
            request_timeout: None,
            transcript_languages: DEFAULT_TRANSCRIPT_LANGUAGES
                .iter()
                .map(|l| l.to_string())
                .collect(),
        }
    }

    /// Load configuration from `.env` and the process environment.
    pub fn from_env(provider: Provider) -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(provider, |key| env::var(key).ok())
    }

    pub fn from_lookup<F>(provider: Provider, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new(provider);

        config.credential = lookup(provider.config().env_var).filter(|v| !v.trim().is_empty());

        if let Some(prompt) = lookup("VIDNOTES_PROMPT").filter(|v| !v.trim().is_empty()) {
            config.prompt_template = prompt;
        }
        config.model = lookup("VIDNOTES_MODEL").filter(|v| !v.trim().is_empty());
        config.request_timeout = lookup("VIDNOTES_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        if let Some(langs) = lookup("VIDNOTES_TRANSCRIPT_LANGS") {
            let langs: Vec<String> = langs
                .split(',')
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .collect();
            if !langs.is_empty() {
                config.transcript_languages = langs;
            }
        }

        config
    }

    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.config().model)
    }

    /// Build an HTTP client honoring the configured timeout
    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = AppConfig::from_lookup(Provider::Gemini, lookup_from(&[]));
        assert!(config.credential.is_none());
        assert_eq!(config.prompt_template, DEFAULT_PROMPT);
        assert_eq!(config.model(), Provider::Gemini.config().model);
        assert!(config.request_timeout.is_none());
        assert_eq!(config.transcript_languages, vec!["en".to_string()]);
    }

    #[test]
    fn test_credential_comes_from_provider_variable() {
        let vars = [("GOOGLE_API_KEY", "g-key"), ("OPENAI_API_KEY", "o-key")];
        let gemini = AppConfig::from_lookup(Provider::Gemini, lookup_from(&vars));
        let openai = AppConfig::from_lookup(Provider::Openai, lookup_from(&vars));
        let grok = AppConfig::from_lookup(Provider::Grok, lookup_from(&vars));

        assert_eq!(gemini.credential.as_deref(), Some("g-key"));
        assert_eq!(openai.credential.as_deref(), Some("o-key"));
        assert!(grok.credential.is_none());
    }

    #[test]
    fn test_blank_credential_counts_as_missing() {
        let config =
            AppConfig::from_lookup(Provider::Gemini, lookup_from(&[("GOOGLE_API_KEY", "  ")]));
        assert!(config.credential.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(
            Provider::Openai,
            lookup_from(&[
                ("VIDNOTES_PROMPT", "Summarize:"),
                ("VIDNOTES_MODEL", "gpt-4o-mini"),
                ("VIDNOTES_TIMEOUT_SECS", "30"),
                ("VIDNOTES_TRANSCRIPT_LANGS", "de, en ,"),
            ]),
        );
        assert_eq!(config.prompt_template, "Summarize:");
        assert_eq!(config.model(), "gpt-4o-mini");
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.transcript_languages, vec!["de", "en"]);
    }

    #[test]
    fn test_invalid_timeout_is_ignored() {
        for value in ["abc", "0", "-5"] {
            let config = AppConfig::from_lookup(
                Provider::Gemini,
                lookup_from(&[("VIDNOTES_TIMEOUT_SECS", value)]),
            );
            assert!(config.request_timeout.is_none(), "value {value}");
        }
    }
}
