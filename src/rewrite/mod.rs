//! Rewrite orchestrator.
//!
//! Each request goes through:
//!
//! ```text
//! sanitize -> cache lookup -> hit: return
//!                          -> miss: build context -> call service (retry)
//!                                   -> parse -> merge suggestions -> store
//! ```
//!
//! Failures never escape as errors. They come back as a fixed
//! (message, suggestions, explanation) triple with [`RewriteStatus::Failed`]
//! and are never cached.

mod cache;
mod client;
mod retry;

pub use cache::{cache_key, CachedRewrite, RewriteCache};
pub use client::{
    parse_completion, strip_code_fence, GenerationClient, GenerationConfig, GenerationError,
    RewritePayload,
};
pub use retry::{retry, RetryPolicy, Retryable};

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::metrics::{AnalysisOutcome, Analyzer};

pub const DEFAULT_CACHE_SIZE: usize = 100;
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

const SYSTEM_PROMPT: &str = "\
You are a prompt engineering expert who helps improve prompts for language models.
For every prompt you receive you must:
1. Improve it in clarity, precision and structure
2. Give 3-5 specific suggestions to make the prompt even more effective
3. Briefly explain the main changes you made

Reply in JSON with these fields:
{
    \"rewritten_prompt\": \"the improved prompt\",
    \"suggestions\": [\"suggestion 1\", \"suggestion 2\", ...],
    \"explanation\": \"explanation of the changes\"
}

Principles to follow:
- Clarity: remove ambiguity and vagueness
- Completeness: make sure every necessary detail is included
- Structure: improve formatting and logical organisation
- Specificity: make requests and requirements more specific
- Goals: state the goals and expected results explicitly
- Context: add context where useful

Do not change the original language of the prompt and keep the same substance and request.";

/// Where a rewrite result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewriteStatus {
    /// Produced by the generation service on this call.
    Fresh,
    /// Served from the cache.
    Cached,
    /// A fixed error triple.
    Failed,
}

/// Result of a rewrite request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rewrite {
    pub status: RewriteStatus,
    /// The sanitized input the rewrite was produced for.
    pub original: String,
    pub rewritten: String,
    pub suggestions: Vec<String>,
    pub explanation: String,
}

impl Rewrite {
    fn from_cached(original: String, status: RewriteStatus, value: CachedRewrite) -> Self {
        Self {
            status,
            original,
            rewritten: value.rewritten,
            suggestions: value.suggestions,
            explanation: value.explanation,
        }
    }

    fn failed(original: String, message: &str, suggestions: &[&str], explanation: String) -> Self {
        Self {
            status: RewriteStatus::Failed,
            original,
            rewritten: message.to_string(),
            suggestions: suggestions.iter().map(|s| s.to_string()).collect(),
            explanation,
        }
    }

    fn empty_input() -> Self {
        Self::failed(
            String::new(),
            "The prompt is empty.",
            &["Enter a prompt to improve"],
            "Error: empty prompt.".to_string(),
        )
    }

    fn missing_credential(original: String) -> Self {
        Self::failed(
            original,
            "Unable to improve the prompt: generation service API key is missing.",
            &["Set DEEPSEEK_API_KEY in the environment or .env file"],
            "Error: missing API key.".to_string(),
        )
    }

    fn format_error(original: String, e: &GenerationError) -> Self {
        Self::failed(
            original,
            "The response from the generation service had an invalid format.",
            &["Try again with a different prompt"],
            format!("Format error: {}", e),
        )
    }

    fn generic_error(original: String, e: &GenerationError) -> Self {
        Self::failed(
            original,
            "An error occurred while processing the prompt.",
            &[
                "Try again with a different prompt",
                "Check your internet connection",
            ],
            format!("Error: {}", e),
        )
    }

    pub fn is_failed(&self) -> bool {
        self.status == RewriteStatus::Failed
    }
}

/// Append `extra` entries not already present, keeping order.
pub fn merge_suggestions(mut base: Vec<String>, extra: &[String]) -> Vec<String> {
    for suggestion in extra {
        if !base.contains(suggestion) {
            base.push(suggestion.clone());
        }
    }
    base
}

/// Compact summary of the analysis sent along with the prompt.
pub fn build_context(text: &str, outcome: &AnalysisOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Original prompt:\n{}\n", text);
    let _ = writeln!(out, "Prompt analysis:");

    match outcome.analysis() {
        Some(analysis) => {
            let _ = writeln!(
                out,
                "- Length: {} characters, {} words",
                analysis.char_count, analysis.word_count
            );
            let _ = writeln!(
                out,
                "- Complexity: {} ({})",
                analysis.complexity.level, analysis.complexity.score
            );
            let _ = writeln!(
                out,
                "- Clarity: {} ({}/10)",
                analysis.clarity.level, analysis.clarity.score
            );
            let _ = writeln!(
                out,
                "- Readability (Gulpease): {} - {}",
                analysis.readability.gulpease_index, analysis.readability.difficulty
            );
            if let Some(grammar) = analysis.grammar.as_ref().filter(|g| g.available) {
                let _ = writeln!(out, "- Grammar score: {}/100", grammar.score);
                let _ = writeln!(out, "- Grammar errors: {}", grammar.error_count);
            }
        }
        None => {
            let _ = writeln!(out, "- Length: {} characters", text.chars().count());
            if let Some(advisory) = outcome.advisory() {
                let _ = writeln!(out, "- Note: {}", advisory);
            }
        }
    }

    let _ = write!(
        out,
        "\nImprove this prompt following the stated principles and reply in JSON."
    );
    out
}

/// Orchestrates sanitizing, caching, analysis and the generation service.
pub struct Rewriter {
    analyzer: Arc<Analyzer>,
    client: GenerationClient,
    cache: RewriteCache,
    retry: RetryPolicy,
}

impl Rewriter {
    pub fn new(analyzer: Arc<Analyzer>, client: GenerationClient) -> Self {
        Self {
            analyzer,
            client,
            cache: RewriteCache::new(DEFAULT_CACHE_SIZE, DEFAULT_CACHE_TTL),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_cache(mut self, cache: RewriteCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    pub fn cache(&self) -> &RewriteCache {
        &self.cache
    }

    /// Rewrite raw input.
    pub async fn rewrite(&self, text: &str) -> Rewrite {
        let sanitized = self.analyzer.sanitize(text);
        if sanitized.trim().is_empty() {
            warn!("empty prompt, nothing to rewrite");
            return Rewrite::empty_input();
        }

        let key = cache_key(&sanitized);
        if let Some(hit) = self.cache.get(&key) {
            info!(input_len = sanitized.len(), "rewrite served from cache");
            return Rewrite::from_cached(sanitized, RewriteStatus::Cached, hit);
        }

        if !self.client.has_credential() {
            error!("generation service API key is missing");
            return Rewrite::missing_credential(sanitized);
        }

        let outcome = self.analyzer.analyze_sanitized(&sanitized).await;
        let context = build_context(&sanitized, &outcome);

        let client = &self.client;
        let context = context.as_str();
        let result = retry(&self.retry, move |attempt| {
            info!(attempt, "calling generation service");
            client.complete(SYSTEM_PROMPT, context)
        })
        .await;

        let payload = match result {
            Ok(payload) => payload,
            Err(e @ GenerationError::MalformedResponse(_)) => {
                error!(failure = %e, input_len = sanitized.len(), "generation response format error");
                return Rewrite::format_error(sanitized, &e);
            }
            Err(e) => {
                error!(failure = %e, input_len = sanitized.len(), "rewrite failed");
                return Rewrite::generic_error(sanitized, &e);
            }
        };

        let grammar_suggestions = outcome
            .analysis()
            .and_then(|a| a.grammar.as_ref())
            .filter(|g| g.available)
            .map(|g| g.suggestions.as_slice())
            .unwrap_or(&[]);

        let value = CachedRewrite {
            rewritten: payload.rewritten,
            suggestions: merge_suggestions(payload.suggestions, grammar_suggestions),
            explanation: payload.explanation,
        };
        self.cache.insert(key, value.clone());
        info!(
            input_len = sanitized.len(),
            output_len = value.rewritten.len(),
            "rewrite completed"
        );

        Rewrite::from_cached(sanitized, RewriteStatus::Fresh, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::GrammarAggregator;

    #[test]
    fn test_merge_suggestions_dedupes_exact() {
        let merged = merge_suggestions(
            vec!["a".into(), "b".into()],
            &["b".to_string(), "c".to_string(), "a ".to_string()],
        );
        assert_eq!(merged, vec!["a", "b", "c", "a "]);
    }

    #[test]
    fn test_build_context_complete() {
        let analyzer = Analyzer::default();
        let outcome = analyzer.measure("Fai qualcosa con questo.");
        let context = build_context("Fai qualcosa con questo.", &outcome);

        assert!(context.starts_with("Original prompt:\nFai qualcosa con questo.\n"));
        assert!(context.contains("- Length: 24 characters, 4 words"));
        assert!(context.contains("- Clarity: high (9/10)"));
        assert!(context.contains("Readability (Gulpease)"));
        assert!(!context.contains("Grammar score"));
        assert!(context.ends_with("reply in JSON."));
    }

    #[test]
    fn test_build_context_degraded() {
        let analyzer = Analyzer::without_linguistics(GrammarAggregator::new());
        let outcome = analyzer.measure("Testo.");
        let context = build_context("Testo.", &outcome);
        assert!(context.contains("- Length: 6 characters"));
        assert!(context.contains("- Note: Linguistic analysis unavailable."));
    }

    #[tokio::test]
    async fn test_empty_input_short_circuits() {
        let rewriter = Rewriter::new(
            Arc::new(Analyzer::default()),
            GenerationClient::new(GenerationConfig::default()),
        );
        let result = rewriter.rewrite("   ").await;
        assert!(result.is_failed());
        assert!(rewriter.cache().is_empty());
    }

    #[tokio::test]
    async fn test_missing_credential_triple() {
        let rewriter = Rewriter::new(
            Arc::new(Analyzer::default()),
            GenerationClient::new(GenerationConfig::default()),
        );
        let result = rewriter.rewrite("Scrivi una poesia.").await;
        assert_eq!(result.status, RewriteStatus::Failed);
        assert_eq!(
            result.rewritten,
            "Unable to improve the prompt: generation service API key is missing."
        );
        assert_eq!(result.explanation, "Error: missing API key.");
        assert!(rewriter.cache().is_empty());
    }
}
