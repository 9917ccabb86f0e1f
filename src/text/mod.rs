//! Linguistic collaborator contract.
//!
//! The metrics engine never tokenizes text itself. It consumes a [`Doc`]
//! produced by a [`LinguisticAnalyzer`]: token spans with punctuation,
//! whitespace and stop-word flags, sentence spans, and labelled entities.
//!
//! [`RuleAnalyzer`] is the bundled rule-based implementation for Italian
//! text. Other backends (an NLP service, a model runtime) plug in by
//! implementing the trait.

mod rules;
mod stopwords;

pub use rules::RuleAnalyzer;
pub use stopwords::is_stop_word;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by a linguistic backend.
#[derive(Error, Debug)]
pub enum LinguisticError {
    #[error("linguistic model unavailable: {0}")]
    Unavailable(String),
    #[error("linguistic analysis failed: {0}")]
    Failed(String),
}

/// A single token. Offsets are byte offsets into the analyzed text; `text`
/// spells an escaped apostrophe (`&#x27;`) as `'`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub is_punct: bool,
    pub is_space: bool,
    pub is_stop: bool,
}

impl Token {
    /// Length in characters, not bytes.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// True for tokens that count as words (neither punctuation nor whitespace).
    pub fn is_word(&self) -> bool {
        !self.is_punct && !self.is_space
    }
}

/// A sentence as a half-open range of token indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub start_token: usize,
    pub end_token: usize,
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
}

impl Sentence {
    pub fn token_count(&self) -> usize {
        self.end_token - self.start_token
    }
}

/// A named entity with its label (e.g. `PER`, `MISC`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub label: String,
    pub start: usize,
    pub end: usize,
}

/// Output of a linguistic backend for one text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doc {
    pub tokens: Vec<Token>,
    pub sentences: Vec<Sentence>,
    pub entities: Vec<Entity>,
}

impl Doc {
    /// Tokens belonging to a sentence.
    pub fn sentence_tokens(&self, sentence: &Sentence) -> &[Token] {
        &self.tokens[sentence.start_token..sentence.end_token]
    }

    /// Tokens that are neither punctuation nor whitespace.
    pub fn words(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter().filter(|t| t.is_word())
    }
}

/// A backend that splits text into tokens, sentences and entities.
///
/// Implementations must be thread-safe: a single analyzer is shared by
/// every request the process handles.
pub trait LinguisticAnalyzer: Send + Sync {
    /// Backend identifier used in logs.
    fn name(&self) -> &'static str;

    /// Analyze a text.
    fn analyze(&self, text: &str) -> Result<Doc, LinguisticError>;
}
