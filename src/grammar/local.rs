//! Rule-based grammar checks that need no network.
//!
//! Three rules, each issue costing 10 points off a base of 100:
//! - sentences longer than [`MAX_SENTENCE_TOKENS`] tokens
//! - content words (longer than 3 characters, not stop words) used more
//!   than [`MAX_WORD_REPEATS`] times
//! - text that does not end with `.`, `!` or `?`

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::{char_offset, CheckerKind, GrammarChecker, GrammarReport, Issue};
use crate::text::LinguisticAnalyzer;

pub const MAX_SENTENCE_TOKENS: usize = 40;
pub const MAX_WORD_REPEATS: usize = 3;
const MIN_CONTENT_WORD_CHARS: usize = 4;
const POINTS_PER_ISSUE: f64 = 10.0;

const KIND_LONG_SENTENCE: &str = "Long sentence";
const KIND_REPETITION: &str = "Repetition";
const KIND_PUNCTUATION: &str = "Punctuation";

/// Local checker backed by the linguistic collaborator.
pub struct LocalChecker {
    linguistics: Arc<dyn LinguisticAnalyzer>,
}

impl LocalChecker {
    pub fn new(linguistics: Arc<dyn LinguisticAnalyzer>) -> Self {
        Self { linguistics }
    }

    /// Run the rules synchronously.
    pub fn check_text(&self, text: &str) -> GrammarReport {
        let doc = match self.linguistics.analyze(text) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(backend = self.linguistics.name(), error = %e, "local grammar check skipped");
                return GrammarReport::unavailable(
                    "Grammar analysis unavailable due to an error.",
                );
            }
        };

        // (issue, suggestion) pairs; the suggestion falls back to the message
        let mut findings: Vec<(Issue, Option<&'static str>)> = Vec::new();

        for (i, sentence) in doc.sentences.iter().enumerate() {
            let tokens = sentence.token_count();
            if tokens > MAX_SENTENCE_TOKENS {
                let offset = char_offset(text, sentence.start);
                let end = char_offset(text, sentence.end);
                findings.push((
                    Issue {
                        kind: KIND_LONG_SENTENCE.to_string(),
                        message: format!(
                            "Sentence {} is very long ({} tokens), consider splitting it.",
                            i + 1,
                            tokens
                        ),
                        offset,
                        length: end - offset,
                        suggested_corrections: Vec::new(),
                        category: KIND_LONG_SENTENCE.to_string(),
                        context: None,
                    },
                    None,
                ));
            }
        }

        // Count content words, remembering first occurrence for stable order
        let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
        let mut order: Vec<String> = Vec::new();
        for token in doc.tokens.iter().filter(|t| t.is_word() && !t.is_stop) {
            let word = token.text.to_lowercase();
            if word.chars().count() < MIN_CONTENT_WORD_CHARS {
                continue;
            }
            let entry = counts.entry(word.clone()).or_insert_with(|| {
                order.push(word.clone());
                (0, token.start)
            });
            entry.0 += 1;
        }
        for word in order {
            let (count, first_byte) = counts[&word];
            if count > MAX_WORD_REPEATS {
                findings.push((
                    Issue {
                        kind: KIND_REPETITION.to_string(),
                        message: format!("The word '{}' appears too often in the text.", word),
                        offset: char_offset(text, first_byte),
                        length: word.chars().count(),
                        suggested_corrections: Vec::new(),
                        category: KIND_REPETITION.to_string(),
                        context: None,
                    },
                    Some("Use synonyms to make the text more varied."),
                ));
            }
        }

        let trimmed = text.trim();
        if let Some(last) = trimmed.chars().last() {
            if !matches!(last, '.' | '!' | '?') {
                findings.push((
                    Issue {
                        kind: KIND_PUNCTUATION.to_string(),
                        message: "The text does not end with a punctuation mark.".to_string(),
                        offset: text.trim_end().chars().count(),
                        length: 0,
                        suggested_corrections: Vec::new(),
                        category: KIND_PUNCTUATION.to_string(),
                        context: None,
                    },
                    Some("Add a period, an exclamation mark or a question mark at the end."),
                ));
            }
        }

        let score = 100.0 - POINTS_PER_ISSUE * findings.len() as f64;
        let suggestions = findings
            .iter()
            .map(|(issue, hint)| hint.map(str::to_string).unwrap_or_else(|| issue.message.clone()))
            .collect();
        let issues = findings.into_iter().map(|(issue, _)| issue).collect();

        GrammarReport::new(issues, score, suggestions)
    }
}

#[async_trait]
impl GrammarChecker for LocalChecker {
    fn kind(&self) -> CheckerKind {
        CheckerKind::Local
    }

    async fn check(&self, text: &str) -> GrammarReport {
        self.check_text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::{Doc, LinguisticError, RuleAnalyzer};

    fn checker() -> LocalChecker {
        LocalChecker::new(Arc::new(RuleAnalyzer::new()))
    }

    struct Broken;

    impl LinguisticAnalyzer for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn analyze(&self, _text: &str) -> Result<Doc, LinguisticError> {
            Err(LinguisticError::Unavailable("model not loaded".into()))
        }
    }

    #[test]
    fn test_clean_text_scores_100() {
        let report = checker().check_text("Scrivi una breve poesia sul mare.");
        assert!(report.available);
        assert_eq!(report.error_count, 0);
        assert_eq!(report.score, 100.0);
        assert!(report.suggestions.is_empty());
    }

    #[test]
    fn test_missing_terminal_punctuation() {
        let report = checker().check_text("Scrivi una breve poesia sul mare");
        assert_eq!(report.error_count, 1);
        assert_eq!(report.score, 90.0);
        assert_eq!(report.raw_issues[0].kind, KIND_PUNCTUATION);
        assert_eq!(report.raw_issues[0].offset, 32);
        assert_eq!(
            report.suggestions,
            vec!["Add a period, an exclamation mark or a question mark at the end."]
        );
    }

    #[test]
    fn test_overused_word() {
        let report = checker()
            .check_text("Prompt chiaro. Prompt breve. Prompt utile. Prompt finale.");
        assert_eq!(report.error_count, 1);
        let issue = &report.raw_issues[0];
        assert_eq!(issue.kind, KIND_REPETITION);
        assert!(issue.message.contains("'prompt'"));
        assert_eq!(issue.offset, 0);
        assert_eq!(report.categories.get(KIND_REPETITION), Some(&1));
    }

    #[test]
    fn test_short_words_and_stop_words_not_counted() {
        // "sono" is a stop word, "mai" is too short
        let report =
            checker().check_text("Sono qui. Sono qui. Sono qui. Sono qui. Mai mai mai mai.");
        assert_eq!(report.error_count, 0);
    }

    #[test]
    fn test_long_sentence() {
        let sentence = format!("{}.", vec!["parola"; 41].join(" "));
        let report = checker().check_text(&sentence);
        let long: Vec<_> = report
            .raw_issues
            .iter()
            .filter(|i| i.kind == KIND_LONG_SENTENCE)
            .collect();
        assert_eq!(long.len(), 1);
        assert_eq!(long[0].offset, 0);
        assert_eq!(long[0].length, sentence.chars().count());
        // 41 repeats of "parola" also trip the repetition rule
        assert_eq!(report.error_count, 2);
        assert_eq!(report.score, 80.0);
        assert!(report.suggestions[0].starts_with("Sentence 1 is very long"));
    }

    #[test]
    fn test_backend_failure_is_unavailable() {
        let report = LocalChecker::new(Arc::new(Broken)).check_text("Testo.");
        assert!(!report.available);
        assert_eq!(report.suggestions.len(), 1);
    }
}
