//! Dictionary-based spell checking.
//!
//! Tokens are whitespace-delimited. A token is unknown when its lower-cased
//! form, stripped of surrounding punctuation, is not in the dictionary.
//! Each distinct unknown word yields one issue whose offset is the first
//! position of the raw token in the text, even when the word occurs again
//! later.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{CheckerKind, GrammarChecker, GrammarReport, Issue, MAX_CORRECTIONS};
use crate::sanitize::restore_apostrophes;

const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyzàèéìíòóùú";

/// Words longer than this only get distance-1 candidates.
const MAX_DISTANCE_TWO_LEN: usize = 8;

/// Spelling suggestions listed individually.
const MAX_LISTED_CORRECTIONS: usize = 3;

/// A word list with optional frequencies.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    words: HashMap<String, u64>,
}

impl Dictionary {
    /// Build from bare words, each with frequency 1.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| (w.as_ref().to_lowercase(), 1))
            .collect();
        Self { words }
    }

    /// Parse a word list: one `word` or `word frequency` per line.
    /// Blank lines and lines starting with `#` are skipped.
    pub fn parse(content: &str) -> Self {
        let mut words = HashMap::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.split_whitespace();
            if let Some(word) = parts.next() {
                let freq = parts.next().and_then(|f| f.parse().ok()).unwrap_or(1);
                *words.entry(word.to_lowercase()).or_insert(0) += freq;
            }
        }
        Self { words }
    }

    /// Load a word list from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading dictionary {}: {}", path.display(), e))?;
        Ok(Self::parse(&content))
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains_key(word)
    }

    /// Known words at edit distance 1, or 2 when none are at 1, ranked by
    /// frequency then alphabetically.
    pub fn candidates(&self, word: &str) -> Vec<String> {
        let first = edits1(word);
        let mut known: Vec<&String> = first.iter().filter(|w| self.contains(w)).collect();

        let second;
        if known.is_empty() && word.chars().count() <= MAX_DISTANCE_TWO_LEN {
            second = first
                .iter()
                .flat_map(|w| edits1(w))
                .filter(|w| self.contains(w))
                .collect::<HashSet<_>>();
            known = second.iter().collect();
        }

        known.sort_by(|a, b| self.words[*b].cmp(&self.words[*a]).then_with(|| a.cmp(b)));
        known.into_iter().cloned().collect()
    }

    /// Best correction, or the word itself when nothing is close.
    pub fn correction(&self, word: &str) -> String {
        self.candidates(word)
            .into_iter()
            .next()
            .unwrap_or_else(|| word.to_string())
    }
}

/// All strings one deletion, transposition, replacement or insertion away.
fn edits1(word: &str) -> HashSet<String> {
    let chars: Vec<char> = word.chars().collect();
    let mut out = HashSet::new();

    for i in 0..=chars.len() {
        let (left, right) = chars.split_at(i);
        let left: String = left.iter().collect();

        if !right.is_empty() {
            out.insert(format!("{}{}", left, right[1..].iter().collect::<String>()));
        }
        if right.len() > 1 {
            out.insert(format!(
                "{}{}{}{}",
                left,
                right[1],
                right[0],
                right[2..].iter().collect::<String>()
            ));
        }
        for c in ALPHABET.chars() {
            if !right.is_empty() {
                out.insert(format!("{}{}{}", left, c, right[1..].iter().collect::<String>()));
            }
            out.insert(format!("{}{}{}", left, c, right.iter().collect::<String>()));
        }
    }

    out.remove(word);
    out
}

/// Lower-cased token without surrounding punctuation.
fn normalize(token: &str) -> String {
    restore_apostrophes(token)
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

/// Spell checker over an optional dictionary.
pub struct SpellChecker {
    dictionary: Option<Arc<Dictionary>>,
}

impl SpellChecker {
    pub fn new(dictionary: Arc<Dictionary>) -> Self {
        Self {
            dictionary: Some(dictionary),
        }
    }

    /// A checker whose dictionary could not be loaded.
    pub fn without_dictionary() -> Self {
        Self { dictionary: None }
    }

    pub fn check_text(&self, text: &str) -> GrammarReport {
        let Some(dictionary) = &self.dictionary else {
            return GrammarReport {
                score: 100.0,
                ..GrammarReport::unavailable("Spell checking unavailable: no dictionary loaded.")
            };
        };

        let tokens: Vec<&str> = text.split_whitespace().collect();

        let mut seen = HashSet::new();
        let mut issues = Vec::new();
        let mut corrections = Vec::new();
        for raw in &tokens {
            let word = normalize(raw);
            if word.is_empty()
                || word.chars().all(|c| c.is_numeric())
                || dictionary.contains(&word)
                || !seen.insert(word.clone())
            {
                continue;
            }

            let candidates = dictionary.candidates(&word);
            let correction = candidates.first().cloned().unwrap_or_else(|| word.clone());
            // Repeated misspellings share the first occurrence's offset.
            let offset = text
                .find(raw)
                .map(|b| super::char_offset(text, b))
                .unwrap_or(0);

            issues.push(Issue {
                kind: "Spelling".to_string(),
                message: format!("'{}' may be misspelled.", raw),
                offset,
                length: raw.chars().count(),
                suggested_corrections: candidates.into_iter().take(MAX_CORRECTIONS).collect(),
                category: "Spelling".to_string(),
                context: None,
            });
            corrections.push((raw.to_string(), correction));
        }

        let score = if tokens.is_empty() {
            100.0
        } else {
            100.0 * (tokens.len() - issues.len()) as f64 / tokens.len() as f64
        };

        let mut suggestions = Vec::new();
        if !issues.is_empty() {
            suggestions.push(format!("The text contains {} spelling errors.", issues.len()));
            for (raw, correction) in corrections.iter().take(MAX_LISTED_CORRECTIONS) {
                suggestions.push(format!("'{}' could be corrected as '{}'.", raw, correction));
            }
        }

        debug!(tokens = tokens.len(), unknown = issues.len(), "spell check done");
        GrammarReport::new(issues, score, suggestions)
    }
}

#[async_trait]
impl GrammarChecker for SpellChecker {
    fn kind(&self) -> CheckerKind {
        CheckerKind::Spelling
    }

    async fn check(&self, text: &str) -> GrammarReport {
        self.check_text(text)
    }
}
