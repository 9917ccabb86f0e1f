//! Grammar and spelling checks.
//!
//! Each checker returns a [`GrammarReport`] with its own availability flag.
//! [`GrammarAggregator`] runs whichever checkers are configured, always in
//! the order local, spelling, service, and merges their partial reports:
//!
//! - issues and suggestions are concatenated in invocation order
//! - category counts are summed per key
//! - the score is the mean over the checkers that were available
//! - suggestions are capped at [`MAX_SUGGESTIONS`]

mod local;
mod service;
mod spelling;

pub use local::LocalChecker;
pub use service::{GrammarServiceError, LanguageToolClient, ServiceConfig};
pub use spelling::{Dictionary, SpellChecker};

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Suggestions exposed by a merged report.
pub const MAX_SUGGESTIONS: usize = 5;

/// Corrections kept per issue.
pub const MAX_CORRECTIONS: usize = 3;

/// Advisory used when no checker could run.
pub const UNAVAILABLE_ADVISORY: &str = "Advanced grammar analysis unavailable.";

/// A single problem found in the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: String,
    pub message: String,
    /// Character offset of the problem in the checked text.
    pub offset: usize,
    /// Length in characters.
    pub length: usize,
    pub suggested_corrections: Vec<String>,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Result of one checker, or of the aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrammarReport {
    pub available: bool,
    pub error_count: usize,
    /// Quality score in [0, 100]. Meaningless when `available` is false.
    pub score: f64,
    pub categories: BTreeMap<String, usize>,
    pub suggestions: Vec<String>,
    pub raw_issues: Vec<Issue>,
}

impl GrammarReport {
    /// Report from an available checker. Categories and error count are
    /// derived from `issues`.
    pub fn new(issues: Vec<Issue>, score: f64, suggestions: Vec<String>) -> Self {
        let mut categories = BTreeMap::new();
        for issue in &issues {
            *categories.entry(issue.category.clone()).or_insert(0) += 1;
        }
        Self {
            available: true,
            error_count: issues.len(),
            score: score.clamp(0.0, 100.0),
            categories,
            suggestions,
            raw_issues: issues,
        }
    }

    /// Report from a checker that could not run.
    pub fn unavailable(advisory: impl Into<String>) -> Self {
        Self {
            available: false,
            error_count: 0,
            score: 0.0,
            categories: BTreeMap::new(),
            suggestions: vec![advisory.into()],
            raw_issues: Vec::new(),
        }
    }
}

/// Identity of a checker. The derive order is the invocation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckerKind {
    Local,
    Spelling,
    Service,
}

impl CheckerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckerKind::Local => "local",
            CheckerKind::Spelling => "spelling",
            CheckerKind::Service => "service",
        }
    }
}

impl std::fmt::Display for CheckerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CheckerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(CheckerKind::Local),
            "spelling" => Ok(CheckerKind::Spelling),
            "service" => Ok(CheckerKind::Service),
            _ => Err(format!("unknown grammar checker: {}", s)),
        }
    }
}

/// A component that checks text and returns a partial report.
#[async_trait]
pub trait GrammarChecker: Send + Sync {
    fn kind(&self) -> CheckerKind;

    async fn check(&self, text: &str) -> GrammarReport;
}

/// Runs the configured checkers and merges their reports.
#[derive(Default)]
pub struct GrammarAggregator {
    checkers: Vec<Box<dyn GrammarChecker>>,
}

impl GrammarAggregator {
    /// An aggregator with no checkers. Its reports are always unavailable.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a checker, keeping invocation order by kind.
    pub fn with_checker<C: GrammarChecker + 'static>(mut self, checker: C) -> Self {
        self.add(Box::new(checker));
        self
    }

    pub fn add(&mut self, checker: Box<dyn GrammarChecker>) {
        self.checkers.push(checker);
        self.checkers.sort_by_key(|c| c.kind());
    }

    pub fn kinds(&self) -> Vec<CheckerKind> {
        self.checkers.iter().map(|c| c.kind()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.checkers.is_empty()
    }

    /// Run every checker in order and merge the results.
    pub async fn check(&self, text: &str) -> GrammarReport {
        let mut partials = Vec::with_capacity(self.checkers.len());
        for checker in &self.checkers {
            let report = checker.check(text).await;
            debug!(
                checker = %checker.kind(),
                available = report.available,
                issues = report.raw_issues.len(),
                "grammar checker finished"
            );
            partials.push(report);
        }
        merge(partials)
    }
}

/// Merge partial reports in the order given.
pub fn merge(partials: Vec<GrammarReport>) -> GrammarReport {
    let mut raw_issues = Vec::new();
    let mut suggestions = Vec::new();
    let mut categories: BTreeMap<String, usize> = BTreeMap::new();
    let mut available_scores = Vec::new();

    for partial in partials {
        if partial.available {
            available_scores.push(partial.score);
        }
        for (category, count) in partial.categories {
            *categories.entry(category).or_insert(0) += count;
        }
        raw_issues.extend(partial.raw_issues);
        suggestions.extend(partial.suggestions);
    }

    let available = !available_scores.is_empty();
    let score = if available {
        available_scores.iter().sum::<f64>() / available_scores.len() as f64
    } else {
        warn!("no grammar checker available");
        suggestions.insert(0, UNAVAILABLE_ADVISORY.to_string());
        0.0
    };

    suggestions.truncate(MAX_SUGGESTIONS);

    GrammarReport {
        available,
        error_count: raw_issues.len(),
        score,
        categories,
        suggestions,
        raw_issues,
    }
}

/// Convert a byte offset in `text` to a character offset.
pub(crate) fn char_offset(text: &str, byte_offset: usize) -> usize {
    text.get(..byte_offset)
        .map(|prefix| prefix.chars().count())
        .unwrap_or_else(|| text.chars().count())
}
