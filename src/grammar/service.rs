//! LanguageTool grammar service client.
//!
//! The client owns an availability latch. Any non-2xx response, timeout or
//! connection failure marks the service unavailable, and every later call
//! returns an unavailable report without touching the network until
//! [`LanguageToolClient::reset`] is called.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, warn};

use super::{CheckerKind, GrammarChecker, GrammarReport, Issue, MAX_CORRECTIONS};
use crate::sanitize::truncate_chars;

pub const DEFAULT_SERVICE_URL: &str = "https://languagetool.org/api/v2/check";
pub const DEFAULT_LANGUAGE: &str = "it";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_CHARS: usize = 5000;

const POINTS_PER_MATCH: f64 = 5.0;
const OTHER_CATEGORY: &str = "Other";

/// Errors talking to the grammar service.
#[derive(Error, Debug)]
pub enum GrammarServiceError {
    #[error("grammar service request timed out")]
    Timeout,
    #[error("cannot connect to grammar service: {0}")]
    Network(#[source] reqwest::Error),
    #[error("grammar service returned HTTP {0}")]
    Status(u16),
    #[error("invalid grammar service response: {0}")]
    Decode(String),
}

impl GrammarServiceError {
    /// Whether this failure should latch the service as unavailable.
    pub fn latches(&self) -> bool {
        !matches!(self, GrammarServiceError::Decode(_))
    }
}

/// Connection settings for the grammar service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub url: String,
    pub language: String,
    pub timeout: Duration,
    pub max_chars: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SERVICE_URL.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_chars: DEFAULT_MAX_CHARS,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CheckResponse {
    #[serde(default)]
    matches: Vec<Match>,
}

#[derive(Debug, Deserialize)]
struct Match {
    #[serde(default)]
    message: String,
    #[serde(default)]
    context: Option<MatchContext>,
    #[serde(default)]
    offset: usize,
    #[serde(default)]
    length: usize,
    #[serde(default)]
    replacements: Vec<Replacement>,
    #[serde(default)]
    rule: Option<Rule>,
}

#[derive(Debug, Deserialize)]
struct MatchContext {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct Replacement {
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct Rule {
    #[serde(default)]
    category: Option<Category>,
}

#[derive(Debug, Deserialize)]
struct Category {
    #[serde(default)]
    name: Option<String>,
}

impl Match {
    fn category_name(&self) -> String {
        self.rule
            .as_ref()
            .and_then(|r| r.category.as_ref())
            .and_then(|c| c.name.clone())
            .unwrap_or_else(|| OTHER_CATEGORY.to_string())
    }

    fn into_issue(self) -> Issue {
        let category = self.category_name();
        Issue {
            kind: "Grammar".to_string(),
            message: self.message,
            offset: self.offset,
            length: self.length,
            suggested_corrections: self
                .replacements
                .into_iter()
                .take(MAX_CORRECTIONS)
                .map(|r| r.value)
                .collect(),
            category,
            context: self.context.map(|c| c.text),
        }
    }
}

/// Grammar checker backed by a LanguageTool-compatible HTTP service.
pub struct LanguageToolClient {
    http: reqwest::Client,
    config: ServiceConfig,
    available: AtomicBool,
}

impl LanguageToolClient {
    pub fn new(config: ServiceConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("promptpolish/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            http,
            config,
            available: AtomicBool::new(true),
        }
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Latch the service as down.
    pub fn mark_unavailable(&self) {
        if self.available.swap(false, Ordering::SeqCst) {
            warn!(url = %self.config.url, "grammar service marked unavailable");
        }
    }

    /// Re-arm the latch so the next call reaches the service again.
    pub fn reset(&self) {
        if !self.available.swap(true, Ordering::SeqCst) {
            info!("grammar service state reset");
        }
    }

    /// Check a text, honouring the latch.
    pub async fn check_text(&self, text: &str) -> GrammarReport {
        if !self.is_available() {
            warn!("grammar service unavailable, check skipped");
            return GrammarReport::unavailable("Grammar service unavailable. Try again later.");
        }

        let text = truncate_chars(text, self.config.max_chars);
        match self.request(text).await {
            Ok(response) => {
                info!(matches = response.matches.len(), "grammar service check completed");
                report_from_matches(response.matches)
            }
            Err(e) => {
                error!(error = %e, input_len = text.len(), "grammar service check failed");
                if e.latches() {
                    self.mark_unavailable();
                }
                GrammarReport::unavailable(format!("Grammar service error: {}", e))
            }
        }
    }

    async fn request(&self, text: &str) -> Result<CheckResponse, GrammarServiceError> {
        info!(input_len = text.len(), "sending grammar service request");

        let params = [
            ("text", text),
            ("language", self.config.language.as_str()),
            ("enabledOnly", "false"),
        ];
        let response = self
            .http
            .post(&self.config.url)
            .timeout(self.config.timeout)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GrammarServiceError::Timeout
                } else {
                    GrammarServiceError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GrammarServiceError::Status(status.as_u16()));
        }

        response.json::<CheckResponse>().await.map_err(|e| {
            if e.is_timeout() {
                GrammarServiceError::Timeout
            } else {
                GrammarServiceError::Decode(e.to_string())
            }
        })
    }
}

#[async_trait]
impl GrammarChecker for LanguageToolClient {
    fn kind(&self) -> CheckerKind {
        CheckerKind::Service
    }

    async fn check(&self, text: &str) -> GrammarReport {
        self.check_text(text).await
    }
}

fn report_from_matches(matches: Vec<Match>) -> GrammarReport {
    let score = 100.0 - POINTS_PER_MATCH * matches.len() as f64;
    let issues: Vec<Issue> = matches.into_iter().map(Match::into_issue).collect();
    let suggestions = derive_suggestions(&issues, score.clamp(0.0, 100.0));
    GrammarReport::new(issues, score, suggestions)
}

/// Hint for the most frequent category. Ties go to the category seen first.
fn category_hint(issues: &[Issue]) -> Option<&'static str> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for issue in issues {
        let count = counts.entry(issue.category.as_str()).or_insert(0);
        if *count == 0 {
            order.push(issue.category.as_str());
        }
        *count += 1;
    }

    let mut dominant: Option<(&str, usize)> = None;
    for category in order {
        let count = counts[category];
        if dominant.map(|(_, best)| count > best).unwrap_or(true) {
            dominant = Some((category, count));
        }
    }

    match dominant?.0.to_lowercase().as_str() {
        "punteggiatura" | "punctuation" => {
            Some("Review the punctuation of the text, there are several errors.")
        }
        "grammatica" | "grammar" => Some("Pay attention to grammar, there are several errors."),
        "stile" | "style" => Some("Consider improving the style of the text for greater clarity."),
        _ => None,
    }
}

/// Suggestions from category, the most frequent messages and the score band.
fn derive_suggestions(issues: &[Issue], score: f64) -> Vec<String> {
    let mut suggestions = Vec::new();

    if let Some(hint) = category_hint(issues) {
        suggestions.push(hint.to_string());
    }

    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for issue in issues {
        let count = counts.entry(issue.message.as_str()).or_insert(0);
        if *count == 0 {
            order.push(issue.message.as_str());
        }
        *count += 1;
    }
    // stable sort keeps first-seen order among equal counts
    order.sort_by(|a, b| counts[b].cmp(&counts[a]));
    for message in order.into_iter().take(2) {
        let count = counts[message];
        if count > 1 {
            suggestions.push(format!(
                "Fix repeated issue: {} ({} occurrences)",
                message, count
            ));
        } else {
            suggestions.push(format!("Suggested correction: {}", message));
        }
    }

    if score < 60.0 {
        suggestions.push(
            "The text contains many grammar errors that may affect its clarity.".to_string(),
        );
    } else if score < 80.0 {
        suggestions.push(
            "There are some grammar errors you could fix to improve the text.".to_string(),
        );
    }

    suggestions
}
