//! Promptpolish - prompt quality analysis and rewriting.
//!
//! Promptpolish measures how well a prompt for a language model is written
//! and rewrites it through a chat-completion service. It reports lexical
//! complexity, clarity, structure, Gulpease readability and grammar issues,
//! and scores a rewrite against its original.
//!
//! # Architecture
//!
//! - `text`: linguistic backend contract and the bundled rule-based backend
//! - `metrics`: complexity, clarity, structure and readability, plus `Analyzer`
//! - `grammar`: local rules, spelling and the grammar service, merged by
//!   `GrammarAggregator`
//! - `score`: quality-delta score between a prompt and its rewrite
//! - `rewrite`: cache, retry and generation client behind `Rewriter`
//! - `sanitize`: input truncation and markup escaping
//! - `config`: settings from YAML, `.env` and the environment
//! - `report`: output formatting (pretty, JSON)
//!
//! # Adding a Grammar Checker
//!
//! Implement `GrammarChecker` and add it to a `GrammarAggregator`. The
//! aggregator orders checkers by `CheckerKind`.

pub mod cli;
pub mod config;
pub mod grammar;
pub mod metrics;
pub mod report;
pub mod rewrite;
pub mod sanitize;
pub mod score;
pub mod text;

pub use config::Settings;
pub use grammar::{GrammarAggregator, GrammarChecker, GrammarReport, Issue};
pub use metrics::{Analysis, AnalysisOutcome, Analyzer};
pub use rewrite::{Rewrite, RewriteStatus, Rewriter};
pub use score::{quality_score, QualityScore};
pub use text::{Doc, LinguisticAnalyzer, RuleAnalyzer};
