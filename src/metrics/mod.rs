//! Metrics engine.
//!
//! Four independent measurements over a prompt:
//!
//! - `complexity`: average token and sentence length
//! - `clarity`: ambiguous words, long sentences and vague phrases
//! - `structure`: lists, numbering, paragraphs and markdown markers
//! - `readability`: the Gulpease index
//!
//! [`Analyzer`] ties them to a linguistic backend and a grammar aggregator
//! and produces an [`AnalysisOutcome`]. A missing backend degrades the
//! outcome instead of failing it.

mod clarity;
mod complexity;
mod readability;
mod structure;

pub use clarity::{clarity, clarity_score, Clarity};
pub use complexity::{complexity, Complexity};
pub use readability::{gulpease, readability, Difficulty, Readability};
pub use structure::{
    has_bullet_list, has_markdown_formatting, has_numbered_list, has_paragraphs, structure,
    Structure,
};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::grammar::{GrammarAggregator, GrammarReport};
use crate::sanitize::{sanitize, DEFAULT_MAX_INPUT_LENGTH};
use crate::text::{LinguisticAnalyzer, RuleAnalyzer};

pub const EMPTY_ADVISORY: &str = "The prompt is empty.";
pub const DEGRADED_ADVISORY: &str = "Linguistic analysis unavailable.";

/// Three-step level shared by complexity and clarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Low => "low",
            Level::Medium => "medium",
            Level::High => "high",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Round to two decimals.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Full analysis of one text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub char_count: usize,
    pub word_count: usize,
    pub sentence_count: usize,
    /// (text, label) pairs in document order.
    pub entities: Vec<(String, String)>,
    pub complexity: Complexity,
    pub clarity: Clarity,
    pub structure: Structure,
    pub readability: Readability,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grammar: Option<GrammarReport>,
}

/// What an analysis call produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AnalysisOutcome {
    /// Nothing to analyze.
    Empty { advisory: String },
    /// The linguistic backend could not run.
    Degraded { advisory: String },
    Complete(Box<Analysis>),
}

impl AnalysisOutcome {
    pub fn analysis(&self) -> Option<&Analysis> {
        match self {
            AnalysisOutcome::Complete(analysis) => Some(analysis),
            _ => None,
        }
    }

    pub fn into_analysis(self) -> Option<Analysis> {
        match self {
            AnalysisOutcome::Complete(analysis) => Some(*analysis),
            _ => None,
        }
    }

    pub fn advisory(&self) -> Option<&str> {
        match self {
            AnalysisOutcome::Empty { advisory } | AnalysisOutcome::Degraded { advisory } => {
                Some(advisory)
            }
            AnalysisOutcome::Complete(_) => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, AnalysisOutcome::Complete(_))
    }
}

/// Runs the metrics engine and the grammar aggregator over a text.
pub struct Analyzer {
    linguistics: Option<Arc<dyn LinguisticAnalyzer>>,
    grammar: GrammarAggregator,
    max_input_length: usize,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(Arc::new(RuleAnalyzer::new()), GrammarAggregator::new())
    }
}

impl Analyzer {
    pub fn new(linguistics: Arc<dyn LinguisticAnalyzer>, grammar: GrammarAggregator) -> Self {
        Self {
            linguistics: Some(linguistics),
            grammar,
            max_input_length: DEFAULT_MAX_INPUT_LENGTH,
        }
    }

    /// An analyzer with no linguistic backend. Every non-empty text degrades.
    pub fn without_linguistics(grammar: GrammarAggregator) -> Self {
        Self {
            linguistics: None,
            grammar,
            max_input_length: DEFAULT_MAX_INPUT_LENGTH,
        }
    }

    pub fn with_max_input_length(mut self, max_chars: usize) -> Self {
        self.max_input_length = max_chars;
        self
    }

    pub fn has_linguistics(&self) -> bool {
        self.linguistics.is_some()
    }

    pub fn max_input_length(&self) -> usize {
        self.max_input_length
    }

    pub fn grammar(&self) -> &GrammarAggregator {
        &self.grammar
    }

    /// Apply the input policy: truncate and escape markup.
    pub fn sanitize(&self, text: &str) -> String {
        sanitize(text, self.max_input_length)
    }

    /// Metrics only, on text taken as-is. No grammar checks, no I/O.
    pub fn measure(&self, text: &str) -> AnalysisOutcome {
        if text.trim().is_empty() {
            return AnalysisOutcome::Empty {
                advisory: EMPTY_ADVISORY.to_string(),
            };
        }

        let Some(linguistics) = &self.linguistics else {
            return AnalysisOutcome::Degraded {
                advisory: DEGRADED_ADVISORY.to_string(),
            };
        };

        let doc = match linguistics.analyze(text) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(backend = linguistics.name(), error = %e, input_len = text.len(), "linguistic analysis failed");
                return AnalysisOutcome::Degraded {
                    advisory: DEGRADED_ADVISORY.to_string(),
                };
            }
        };

        let analysis = Analysis {
            char_count: text.chars().count(),
            word_count: text.split_whitespace().count(),
            sentence_count: doc.sentences.len(),
            entities: doc
                .entities
                .iter()
                .map(|e| (e.text.clone(), e.label.clone()))
                .collect(),
            complexity: complexity(&doc),
            clarity: clarity(text),
            structure: structure(text),
            readability: readability(&doc),
            grammar: None,
        };

        debug!(
            input_len = text.len(),
            words = analysis.word_count,
            sentences = analysis.sentence_count,
            "metrics computed"
        );
        AnalysisOutcome::Complete(Box::new(analysis))
    }

    /// Sanitize, measure and run the grammar checks.
    pub async fn analyze(&self, text: &str) -> AnalysisOutcome {
        let sanitized = self.sanitize(text);
        self.analyze_sanitized(&sanitized).await
    }

    /// Measure and grammar-check text that is already sanitized.
    pub async fn analyze_sanitized(&self, text: &str) -> AnalysisOutcome {
        match self.measure(text) {
            AnalysisOutcome::Complete(mut analysis) => {
                analysis.grammar = Some(self.grammar.check(text).await);
                AnalysisOutcome::Complete(analysis)
            }
            other => other,
        }
    }

    /// Grammar checks alone on sanitized input.
    pub async fn check_grammar(&self, text: &str) -> GrammarReport {
        let sanitized = self.sanitize(text);
        self.grammar.check(&sanitized).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::LocalChecker;
    use pretty_assertions::assert_eq;

    fn analyzer() -> Analyzer {
        let linguistics: Arc<dyn LinguisticAnalyzer> = Arc::new(RuleAnalyzer::new());
        let grammar = GrammarAggregator::new().with_checker(LocalChecker::new(linguistics.clone()));
        Analyzer::new(linguistics, grammar)
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(3.14159), 3.14);
        assert_eq!(round2(-0.005), -0.01);
        assert_eq!(round2(7.0), 7.0);
    }

    #[test]
    fn test_level_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Level::Medium).unwrap(), "\"medium\"");
    }

    #[test]
    fn test_empty_and_whitespace_are_empty() {
        let analyzer = analyzer();
        assert_eq!(
            analyzer.measure(""),
            AnalysisOutcome::Empty {
                advisory: EMPTY_ADVISORY.to_string()
            }
        );
        assert!(matches!(analyzer.measure("  \n\t "), AnalysisOutcome::Empty { .. }));
    }

    #[test]
    fn test_without_linguistics_degrades() {
        let analyzer = Analyzer::without_linguistics(GrammarAggregator::new());
        let outcome = analyzer.measure("Scrivi una poesia.");
        assert_eq!(outcome.advisory(), Some(DEGRADED_ADVISORY));
        assert!(outcome.analysis().is_none());
    }

    #[test]
    fn test_measure_counts() {
        let outcome = analyzer().measure("Scrivi una poesia. Parla del mare!");
        let analysis = outcome.analysis().unwrap();
        assert_eq!(analysis.char_count, 34);
        assert_eq!(analysis.word_count, 6);
        assert_eq!(analysis.sentence_count, 2);
        assert!(analysis.grammar.is_none());
    }

    #[tokio::test]
    async fn test_analyze_attaches_grammar() {
        let outcome = analyzer().analyze("Fai qualcosa con questo.").await;
        let analysis = outcome.into_analysis().unwrap();
        let grammar = analysis.grammar.unwrap();
        assert!(grammar.available);
        assert_eq!(grammar.score, 100.0);
    }

    #[tokio::test]
    async fn test_analyze_without_checkers_carries_unavailable_report() {
        let analyzer = Analyzer::new(Arc::new(RuleAnalyzer::new()), GrammarAggregator::new());
        let outcome = analyzer.analyze("Testo breve.").await;
        let grammar = outcome.analysis().unwrap().grammar.clone().unwrap();
        assert!(!grammar.available);
    }

    #[tokio::test]
    async fn test_analyze_sanitizes_input() {
        let analyzer = analyzer().with_max_input_length(5);
        let outcome = analyzer.analyze("<b>ciao mondo</b>").await;
        // "<b>ci" escaped
        assert_eq!(outcome.analysis().unwrap().char_count, "&lt;b&gt;ci".chars().count());
    }

    #[tokio::test]
    async fn test_check_grammar_alone() {
        let report = analyzer().check_grammar("Scrivi una poesia").await;
        assert!(report.available);
        assert_eq!(report.error_count, 1);
        assert_eq!(report.raw_issues[0].kind, "Punctuation");
        assert_eq!(report.score, 90.0);
    }
}
