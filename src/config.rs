//! Settings for analysis, grammar checking and rewriting.
//!
//! Sources, lowest precedence first: built-in defaults, a YAML file
//! (`promptpolish.yaml` or `.promptpolish.yaml` in the working directory, or
//! an explicit path), then the environment. A `.env` file is loaded before
//! the environment is read.
//!
//! Every field has a default, so a partial file is valid.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::grammar::{
    CheckerKind, Dictionary, GrammarAggregator, LanguageToolClient, LocalChecker, ServiceConfig,
    SpellChecker,
};
use crate::metrics::Analyzer;
use crate::rewrite::{GenerationClient, GenerationConfig, RetryPolicy, RewriteCache, Rewriter};
use crate::text::{LinguisticAnalyzer, RuleAnalyzer};

/// File names looked up in the working directory.
pub const CONFIG_FILE_NAMES: &[&str] = &["promptpolish.yaml", ".promptpolish.yaml"];

pub const ENV_API_KEY: &str = "DEEPSEEK_API_KEY";
pub const ENV_API_URL: &str = "PROMPTPOLISH_API_URL";
pub const ENV_MODEL: &str = "PROMPTPOLISH_MODEL";

/// Errors loading or validating settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Top-level settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    /// Bearer credential for the generation service. Never serialized.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Input is truncated to this many characters.
    #[serde(default = "default_max_input_length")]
    pub max_input_length: usize,
    #[serde(default)]
    pub generation: GenerationSettings,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub grammar: GrammarSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            max_input_length: default_max_input_length(),
            generation: GenerationSettings::default(),
            retry: RetrySettings::default(),
            cache: CacheSettings::default(),
            grammar: GrammarSettings::default(),
        }
    }
}

fn default_max_input_length() -> usize {
    crate::sanitize::DEFAULT_MAX_INPUT_LENGTH
}

/// Generation service endpoint and sampling.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationSettings {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_api_timeout")]
    pub timeout_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_api_timeout(),
        }
    }
}

fn default_api_url() -> String {
    crate::rewrite::GenerationConfig::default().api_url
}

fn default_model() -> String {
    crate::rewrite::GenerationConfig::default().model
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_api_timeout() -> u64 {
    30
}

/// Retry schedule for the generation service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff() -> u64 {
    4_000
}

fn default_max_backoff() -> u64 {
    10_000
}

/// Rewrite cache bounds.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_size")]
    pub size: usize,
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            size: default_cache_size(),
            ttl_secs: default_cache_ttl(),
        }
    }
}

fn default_cache_size() -> usize {
    100
}

fn default_cache_ttl() -> u64 {
    3600
}

/// Grammar checkers and their collaborators.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GrammarSettings {
    /// Enabled checkers: `local`, `spelling`, `service`.
    #[serde(default = "default_checkers")]
    pub checkers: Vec<String>,
    #[serde(default)]
    pub dictionary: Option<PathBuf>,
    #[serde(default = "default_service_url")]
    pub service_url: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_grammar_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_grammar_max_chars")]
    pub max_chars: usize,
}

impl Default for GrammarSettings {
    fn default() -> Self {
        Self {
            checkers: default_checkers(),
            dictionary: None,
            service_url: default_service_url(),
            language: default_language(),
            timeout_secs: default_grammar_timeout(),
            max_chars: default_grammar_max_chars(),
        }
    }
}

fn default_checkers() -> Vec<String> {
    vec![CheckerKind::Local.as_str().to_string()]
}

fn default_service_url() -> String {
    ServiceConfig::default().url
}

fn default_language() -> String {
    ServiceConfig::default().language
}

fn default_grammar_timeout() -> u64 {
    10
}

fn default_grammar_max_chars() -> usize {
    ServiceConfig::default().max_chars
}

impl Settings {
    /// Parse a YAML settings file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse_str(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// First known config file name present in `dir`.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Load from an explicit file, or a discovered one, then the
    /// environment, and validate.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => std::env::current_dir()
                .ok()
                .and_then(|dir| Self::discover(&dir)),
        };

        let mut settings = match &path {
            Some(path) => {
                debug!(path = %path.display(), "loading settings file");
                Self::parse_file(path)?
            }
            None => Self::default(),
        };

        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                warn!(error = %e, "failed to load .env file");
            }
        }
        settings.apply_env(|name| std::env::var(name).ok());
        settings.validate()?;
        Ok(settings)
    }

    /// Override fields from environment variables, read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(ENV_API_KEY) {
            self.api_key = Some(key);
        }
        if let Some(url) = non_empty(ENV_API_URL) {
            self.generation.api_url = url;
        }
        if let Some(model) = non_empty(ENV_MODEL) {
            self.generation.model = model;
        }
    }

    /// Reject settings that cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_input_length == 0 {
            return Err(ConfigError::Invalid(
                "max_input_length must be greater than zero".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(ConfigError::Invalid(format!(
                "generation.temperature must be between 0 and 2, got {}",
                self.generation.temperature
            )));
        }
        if self.generation.timeout_secs == 0 || self.grammar.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        self.checker_kinds()?;
        Ok(())
    }

    /// Enabled checkers in invocation order, without duplicates.
    pub fn checker_kinds(&self) -> Result<Vec<CheckerKind>, ConfigError> {
        let mut kinds = self
            .grammar
            .checkers
            .iter()
            .map(|name| name.parse::<CheckerKind>().map_err(ConfigError::Invalid))
            .collect::<Result<Vec<_>, _>>()?;
        kinds.sort();
        kinds.dedup();
        Ok(kinds)
    }

    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            api_url: self.generation.api_url.clone(),
            api_key: self.api_key.clone(),
            model: self.generation.model.clone(),
            temperature: self.generation.temperature,
            max_tokens: self.generation.max_tokens,
            timeout: Duration::from_secs(self.generation.timeout_secs),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            initial_backoff: Duration::from_millis(self.retry.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.retry.max_backoff_ms),
        }
    }

    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            url: self.grammar.service_url.clone(),
            language: self.grammar.language.clone(),
            timeout: Duration::from_secs(self.grammar.timeout_secs),
            max_chars: self.grammar.max_chars,
        }
    }

    /// Grammar aggregator with the enabled checkers. A dictionary that
    /// cannot be loaded leaves the spelling checker unavailable.
    pub fn build_grammar(
        &self,
        linguistics: Arc<dyn LinguisticAnalyzer>,
    ) -> Result<GrammarAggregator, ConfigError> {
        let mut aggregator = GrammarAggregator::new();
        for kind in self.checker_kinds()? {
            match kind {
                CheckerKind::Local => {
                    aggregator.add(Box::new(LocalChecker::new(linguistics.clone())));
                }
                CheckerKind::Spelling => {
                    aggregator.add(Box::new(self.spell_checker()));
                }
                CheckerKind::Service => {
                    aggregator.add(Box::new(LanguageToolClient::new(self.service_config())));
                }
            }
        }
        Ok(aggregator)
    }

    fn spell_checker(&self) -> SpellChecker {
        let Some(path) = &self.grammar.dictionary else {
            warn!("spelling checker enabled without a dictionary");
            return SpellChecker::without_dictionary();
        };
        match Dictionary::load(path) {
            Ok(dictionary) => {
                debug!(path = %path.display(), words = dictionary.len(), "dictionary loaded");
                SpellChecker::new(Arc::new(dictionary))
            }
            Err(e) => {
                warn!(error = %e, "dictionary unavailable");
                SpellChecker::without_dictionary()
            }
        }
    }

    /// Analyzer with the bundled linguistic backend and enabled checkers.
    pub fn build_analyzer(&self) -> Result<Analyzer, ConfigError> {
        let linguistics: Arc<dyn LinguisticAnalyzer> = Arc::new(RuleAnalyzer::new());
        let grammar = self.build_grammar(linguistics.clone())?;
        Ok(Analyzer::new(linguistics, grammar).with_max_input_length(self.max_input_length))
    }

    pub fn build_rewriter(&self, analyzer: Arc<Analyzer>) -> Rewriter {
        Rewriter::new(analyzer, GenerationClient::new(self.generation_config()))
            .with_cache(RewriteCache::new(
                self.cache.size,
                Duration::from_secs(self.cache.ttl_secs),
            ))
            .with_retry_policy(self.retry_policy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.max_input_length, 10_000);
        assert_eq!(
            settings.generation.api_url,
            "https://api.deepseek.com/v1/chat/completions"
        );
        assert_eq!(settings.generation.model, "deepseek-chat");
        assert_eq!(settings.generation.temperature, 0.7);
        assert_eq!(settings.generation.max_tokens, 2000);
        assert_eq!(settings.retry_policy(), RetryPolicy::default());
        assert_eq!(settings.cache.size, 100);
        assert_eq!(settings.cache.ttl_secs, 3600);
        assert_eq!(settings.grammar.language, "it");
        assert_eq!(settings.checker_kinds().unwrap(), vec![CheckerKind::Local]);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml() {
        let settings = Settings::parse_str(
            r#"
max_input_length: 500
generation:
  model: deepseek-reasoner
grammar:
  checkers: [service, local]
"#,
        )
        .unwrap();
        assert_eq!(settings.max_input_length, 500);
        assert_eq!(settings.generation.model, "deepseek-reasoner");
        assert_eq!(settings.generation.max_tokens, 2000);
        assert_eq!(
            settings.checker_kinds().unwrap(),
            vec![CheckerKind::Local, CheckerKind::Service]
        );
    }

    #[test]
    fn test_empty_file_is_default() {
        let settings = Settings::parse_str("").unwrap();
        assert_eq!(settings.cache.size, 100);
    }

    #[test]
    fn test_parse_file_and_discover() {
        let temp = TempDir::new().unwrap();
        assert!(Settings::discover(temp.path()).is_none());

        let path = temp.path().join(".promptpolish.yaml");
        std::fs::write(&path, "cache:\n  size: 7\n").unwrap();
        assert_eq!(Settings::discover(temp.path()), Some(path.clone()));
        assert_eq!(Settings::parse_file(&path).unwrap().cache.size, 7);

        std::fs::write(&path, "cache: [not, a, map]\n").unwrap();
        assert!(matches!(
            Settings::parse_file(&path),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            Settings::parse_file(temp.path().join("missing.yaml")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_API_KEY, "sk-test"),
            (ENV_MODEL, "other-model"),
            (ENV_API_URL, ""),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings.apply_env(|name| env.get(name).map(|v| v.to_string()));
        assert_eq!(settings.api_key.as_deref(), Some("sk-test"));
        assert_eq!(settings.generation.model, "other-model");
        // empty values are ignored
        assert_eq!(settings.generation.api_url, default_api_url());
    }

    #[test]
    fn test_api_key_not_serialized() {
        let settings = Settings {
            api_key: Some("sk-secret".to_string()),
            ..Settings::default()
        };
        let yaml = serde_yaml::to_string(&settings).unwrap();
        assert!(!yaml.contains("sk-secret"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.retry.max_attempts = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.generation.temperature = 2.5;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.max_input_length = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.grammar.checkers = vec!["languagetool".to_string()];
        assert!(matches!(settings.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_build_analyzer_with_missing_dictionary() {
        let mut settings = Settings::default();
        settings.grammar.checkers = vec!["local".into(), "spelling".into()];
        settings.grammar.dictionary = Some(PathBuf::from("/nonexistent/words.txt"));

        let analyzer = settings.build_analyzer().unwrap();
        assert_eq!(
            analyzer.grammar().kinds(),
            vec![CheckerKind::Local, CheckerKind::Spelling]
        );
        assert_eq!(analyzer.max_input_length(), 10_000);
    }
}
