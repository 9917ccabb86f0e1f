//! Lexical complexity from average token and sentence length.

use serde::{Deserialize, Serialize};

use super::{round2, Level};
use crate::text::Doc;

/// Score above which complexity is high.
pub const HIGH_THRESHOLD: f64 = 12.0;
/// Score above which complexity is medium.
pub const MEDIUM_THRESHOLD: f64 = 8.0;

const WORD_LENGTH_WEIGHT: f64 = 0.5;
const SENTENCE_LENGTH_WEIGHT: f64 = 0.3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Complexity {
    pub score: f64,
    pub level: Level,
    pub avg_word_length: f64,
    pub avg_sentence_length: f64,
}

impl Level {
    /// Complexity level for a score. Strict comparisons on both thresholds.
    pub fn for_complexity(score: f64) -> Level {
        if score > HIGH_THRESHOLD {
            Level::High
        } else if score > MEDIUM_THRESHOLD {
            Level::Medium
        } else {
            Level::Low
        }
    }
}

/// Compute complexity over every token, punctuation and whitespace included.
pub fn complexity(doc: &Doc) -> Complexity {
    let avg_word_length = if doc.tokens.is_empty() {
        0.0
    } else {
        let total: usize = doc.tokens.iter().map(|t| t.char_len()).sum();
        total as f64 / doc.tokens.len() as f64
    };

    let avg_sentence_length = if doc.sentences.is_empty() {
        0.0
    } else {
        let total: usize = doc.sentences.iter().map(|s| s.token_count()).sum();
        total as f64 / doc.sentences.len() as f64
    };

    let score = round2(
        avg_word_length * WORD_LENGTH_WEIGHT + avg_sentence_length * SENTENCE_LENGTH_WEIGHT,
    );

    Complexity {
        score,
        level: Level::for_complexity(score),
        avg_word_length: round2(avg_word_length),
        avg_sentence_length: round2(avg_sentence_length),
    }
}
