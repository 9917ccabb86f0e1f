//! Gulpease readability index for Italian text.
//!
//! `89 + (300 * sentences - 10 * letters) / words`, clamped to [0, 100].
//! Higher is easier. Texts without words score 0.

use serde::{Deserialize, Serialize};

use super::round2;
use crate::text::Doc;

/// Difficulty bands of the Gulpease index.
///
/// Everything at or below 40 is a single "very hard" band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    VeryHard,
    Medium,
    Easy,
    VeryEasy,
}

impl Difficulty {
    /// Bucket an index. All comparisons are strict.
    pub fn from_gulpease(index: f64) -> Self {
        if index > 80.0 {
            Difficulty::VeryEasy
        } else if index > 60.0 {
            Difficulty::Easy
        } else if index > 40.0 {
            Difficulty::Medium
        } else {
            Difficulty::VeryHard
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::VeryHard => "very hard",
            Difficulty::Medium => "medium",
            Difficulty::Easy => "easy",
            Difficulty::VeryEasy => "very easy",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Readability {
    pub gulpease_index: f64,
    pub difficulty: Difficulty,
    pub sentence_count: usize,
    pub word_count: usize,
    pub letter_count: usize,
}

/// Raw Gulpease index, clamped.
pub fn gulpease(sentences: usize, words: usize, letters: usize) -> f64 {
    if words == 0 {
        return 0.0;
    }
    let raw = 89.0 + (300.0 * sentences as f64 - 10.0 * letters as f64) / words as f64;
    raw.clamp(0.0, 100.0)
}

/// Compute readability from an analyzed document.
pub fn readability(doc: &Doc) -> Readability {
    let sentence_count = doc.sentences.len();
    let word_count = doc.words().count();
    let letter_count = doc.words().map(|t| t.char_len()).sum();

    let gulpease_index = round2(gulpease(sentence_count, word_count, letter_count));

    Readability {
        gulpease_index,
        difficulty: Difficulty::from_gulpease(gulpease_index),
        sentence_count,
        word_count,
        letter_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::{LinguisticAnalyzer, RuleAnalyzer};

    #[test]
    fn test_gulpease_simple_sentence() {
        // 1 sentence, 4 words, 20 letters: 89 + (300 - 200) / 4 = 114 -> 100
        let doc = RuleAnalyzer.analyze("Fai qualcosa con questo.").unwrap();
        let r = readability(&doc);
        assert_eq!(r.sentence_count, 1);
        assert_eq!(r.word_count, 4);
        assert_eq!(r.letter_count, 20);
        assert_eq!(r.gulpease_index, 100.0);
        assert_eq!(r.difficulty, Difficulty::VeryEasy);
    }

    #[test]
    fn test_gulpease_formula() {
        // 89 + (300 * 2 - 10 * 60) / 10 = 89
        assert_eq!(gulpease(2, 10, 60), 89.0);
        // 89 + (300 - 10 * 100) / 10 = 19
        assert_eq!(gulpease(1, 10, 100), 19.0);
        // clamped at zero
        assert_eq!(gulpease(1, 2, 100), 0.0);
    }

    #[test]
    fn test_no_words_scores_zero() {
        let doc = RuleAnalyzer.analyze("... !!! ?").unwrap();
        let r = readability(&doc);
        assert_eq!(r.word_count, 0);
        assert_eq!(r.gulpease_index, 0.0);
        assert_eq!(r.difficulty, Difficulty::VeryHard);

        let r = readability(&Doc::default());
        assert_eq!(r.gulpease_index, 0.0);
    }

    #[test]
    fn test_difficulty_boundaries() {
        assert_eq!(Difficulty::from_gulpease(80.01), Difficulty::VeryEasy);
        assert_eq!(Difficulty::from_gulpease(80.0), Difficulty::Easy);
        assert_eq!(Difficulty::from_gulpease(79.99), Difficulty::Easy);
        assert_eq!(Difficulty::from_gulpease(60.0), Difficulty::Medium);
        assert_eq!(Difficulty::from_gulpease(40.01), Difficulty::Medium);
        assert_eq!(Difficulty::from_gulpease(40.0), Difficulty::VeryHard);
        assert_eq!(Difficulty::from_gulpease(0.0), Difficulty::VeryHard);
    }
}
