//! Clarity scoring from ambiguous words, long sentences and vague phrases.

use lazy_static::lazy_static;
use phf::phf_set;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{round2, Level};
use crate::sanitize::restore_apostrophes;

/// Words that make a request underspecified.
static AMBIGUOUS_WORDS: phf::Set<&'static str> = phf_set! {
    "questo", "quello", "cosa", "fare", "forse", "potrebbe", "magari",
    "alcuni", "qualcosa", "tipo", "etc", "eccetera", "ecc", "circa",
    "praticamente", "quasi", "probabilmente",
};

/// Hedging expressions, matched as lower-case substrings. Each one counts
/// once however often it appears.
const VAGUE_EXPRESSIONS: &[&str] = &[
    "in qualche modo",
    "più o meno",
    "abbastanza",
    "una sorta di",
    "grossomodo",
    "all'incirca",
    "si suppone",
    "generalmente",
    "tendenzialmente",
    "in linea di massima",
    "per così dire",
    "diciamo che",
    "si dice che",
];

/// Sentences with more whitespace-delimited words than this are long.
pub const LONG_SENTENCE_WORDS: usize = 25;

const BASE_SCORE: f64 = 10.0;
const AMBIGUOUS_PENALTY: f64 = 0.5;
const LONG_SENTENCE_PENALTY: f64 = 1.0;
const VAGUE_PENALTY: f64 = 0.7;

lazy_static! {
    static ref SENTENCE_SPLIT: Regex = Regex::new(r"[.!?]").unwrap();
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clarity {
    /// Score in [1, 10].
    pub score: f64,
    pub level: Level,
    pub ambiguous_word_count: usize,
    pub long_sentence_count: usize,
    pub vague_expression_count: usize,
}

impl Level {
    /// Clarity level for a score: >= 8 high, >= 6 medium.
    pub fn for_clarity(score: f64) -> Level {
        if score >= 8.0 {
            Level::High
        } else if score >= 6.0 {
            Level::Medium
        } else {
            Level::Low
        }
    }
}

/// Strip leading and trailing punctuation so "questo." matches "questo".
fn bare_word(token: &str) -> &str {
    token.trim_matches(|c: char| !c.is_alphanumeric())
}

fn count_ambiguous(lower: &str) -> usize {
    lower
        .split_whitespace()
        .filter(|w| AMBIGUOUS_WORDS.contains(bare_word(w)))
        .count()
}

fn count_long_sentences(text: &str) -> usize {
    SENTENCE_SPLIT
        .split(text)
        .filter(|s| s.split_whitespace().count() > LONG_SENTENCE_WORDS)
        .count()
}

fn count_vague(lower: &str) -> usize {
    VAGUE_EXPRESSIONS
        .iter()
        .filter(|expr| lower.contains(*expr))
        .count()
}

/// Score a clarity value from raw problem counts.
pub fn clarity_score(ambiguous: usize, long_sentences: usize, vague: usize) -> f64 {
    let score = BASE_SCORE
        - ambiguous as f64 * AMBIGUOUS_PENALTY
        - long_sentences as f64 * LONG_SENTENCE_PENALTY
        - vague as f64 * VAGUE_PENALTY;
    round2(score.clamp(1.0, 10.0))
}

/// Evaluate clarity of a text.
pub fn clarity(text: &str) -> Clarity {
    let lower = restore_apostrophes(text).to_lowercase();

    let ambiguous_word_count = count_ambiguous(&lower);
    let long_sentence_count = count_long_sentences(&lower);
    let vague_expression_count = count_vague(&lower);

    let score = clarity_score(ambiguous_word_count, long_sentence_count, vague_expression_count);

    Clarity {
        score,
        level: Level::for_clarity(score),
        ambiguous_word_count,
        long_sentence_count,
        vague_expression_count,
    }
}
