//! Quality-delta scoring between a prompt and its rewrite.
//!
//! A heuristic, not a ground-truth quality metric. The score starts from a
//! neutral 60 and moves with the change in readability, clarity and
//! structure:
//!
//! ```text
//! 60 + clamp(Δgulpease% * 0.4, ±20)
//!    + clamp(Δclarity% * 3, ±15)
//!    + clamp(Δstructure * 2.5, ±5)
//! ```
//!
//! clamped to [1, 100] and rounded. Without a linguistic backend the score
//! falls back to the length ratio of the two texts. Scoring never fails:
//! anything unexpected yields [`NEUTRAL_SCORE`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::metrics::{has_bullet_list, Analysis, AnalysisOutcome, Analyzer};
use crate::rewrite::Rewrite;

/// Score of two texts that are identical as far as the metrics can tell.
pub const BASE_SCORE: f64 = 60.0;

/// Score returned when scoring itself cannot be carried out.
pub const NEUTRAL_SCORE: i32 = 75;

/// Weights and bounds of each component.
pub mod weights {
    pub const READABILITY: f64 = 0.4;
    pub const READABILITY_CAP: f64 = 20.0;
    pub const CLARITY: f64 = 3.0;
    pub const CLARITY_CAP: f64 = 15.0;
    pub const STRUCTURE: f64 = 2.5;
    pub const STRUCTURE_CAP: f64 = 5.0;

    pub const LENGTH_BASE: f64 = 50.0;
    pub const LENGTH_RATIO: f64 = 30.0;
    pub const NEW_LIST_BONUS: f64 = 15.0;
}

/// How a score was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMethod {
    /// Full metrics on both texts.
    Metrics,
    /// Length ratio, used when no linguistic backend is available.
    LengthRatio,
    /// Fixed neutral value.
    Neutral,
    /// One of the texts was empty.
    EmptyInput,
}

impl ScoringMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringMethod::Metrics => "metrics",
            ScoringMethod::LengthRatio => "length ratio",
            ScoringMethod::Neutral => "neutral",
            ScoringMethod::EmptyInput => "empty input",
        }
    }
}

/// The calculated quality score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    /// Score from 1-100, or 0 when an input is empty.
    pub score: i32,
    pub method: ScoringMethod,
    /// Points contributed by each component.
    pub breakdown: BTreeMap<String, f64>,
}

impl QualityScore {
    fn fixed(score: i32, method: ScoringMethod) -> Self {
        Self {
            score,
            method,
            breakdown: BTreeMap::new(),
        }
    }
}

/// Score `rewritten` against `original`.
///
/// Both texts are measured as given; callers sanitize beforehand when the
/// input comes from outside.
pub fn quality_score(analyzer: &Analyzer, original: &str, rewritten: &str) -> QualityScore {
    if original.is_empty() || rewritten.is_empty() {
        return QualityScore::fixed(0, ScoringMethod::EmptyInput);
    }

    if !analyzer.has_linguistics() {
        return length_ratio_score(original, rewritten);
    }

    match (analyzer.measure(original), analyzer.measure(rewritten)) {
        (AnalysisOutcome::Complete(old), AnalysisOutcome::Complete(new)) => {
            delta_score(&old, &new)
        }
        (AnalysisOutcome::Degraded { .. }, _) | (_, AnalysisOutcome::Degraded { .. }) => {
            warn!("linguistic analysis failed during scoring, using length ratio");
            length_ratio_score(original, rewritten)
        }
        _ => {
            warn!(
                original_len = original.len(),
                rewritten_len = rewritten.len(),
                "quality score unavailable, using neutral value"
            );
            QualityScore::fixed(NEUTRAL_SCORE, ScoringMethod::Neutral)
        }
    }
}

/// Percentage change relative to `old`, guarding small denominators.
fn percent_change(old: f64, new: f64) -> f64 {
    (new - old) / old.max(1.0) * 100.0
}

/// Score from two complete analyses.
pub fn delta_score(old: &Analysis, new: &Analysis) -> QualityScore {
    let gulpease = percent_change(old.readability.gulpease_index, new.readability.gulpease_index);
    let clarity = percent_change(old.clarity.score, new.clarity.score);
    let structure = new.structure.signal_count() as f64 - old.structure.signal_count() as f64;

    let readability_points = (gulpease * weights::READABILITY)
        .clamp(-weights::READABILITY_CAP, weights::READABILITY_CAP);
    let clarity_points =
        (clarity * weights::CLARITY).clamp(-weights::CLARITY_CAP, weights::CLARITY_CAP);
    let structure_points =
        (structure * weights::STRUCTURE).clamp(-weights::STRUCTURE_CAP, weights::STRUCTURE_CAP);

    let total = BASE_SCORE + readability_points + clarity_points + structure_points;
    let score = total.clamp(1.0, 100.0).round() as i32;

    debug!(
        readability_points,
        clarity_points, structure_points, score, "quality score computed"
    );

    let mut breakdown = BTreeMap::new();
    breakdown.insert("readability".to_string(), readability_points);
    breakdown.insert("clarity".to_string(), clarity_points);
    breakdown.insert("structure".to_string(), structure_points);

    QualityScore {
        score,
        method: ScoringMethod::Metrics,
        breakdown,
    }
}

/// Score a rewrite against the input it was produced for. `rewrite.original`
/// is already sanitized, so the rewritten text goes through the same
/// sanitizer before both are measured. Failed rewrites have no score.
pub fn rewrite_quality(analyzer: &Analyzer, rewrite: &Rewrite) -> Option<QualityScore> {
    if rewrite.is_failed() {
        return None;
    }
    let rewritten = analyzer.sanitize(&rewrite.rewritten);
    Some(quality_score(analyzer, &rewrite.original, &rewritten))
}

/// Fallback score from the length ratio, with a bonus for a newly added
/// bullet list.
pub fn length_ratio_score(original: &str, rewritten: &str) -> QualityScore {
    let old_len = original.chars().count() as f64;
    let new_len = rewritten.chars().count() as f64;

    let ratio = new_len / old_len.max(1.0);
    let length_points =
        (weights::LENGTH_BASE + (ratio - 1.0) * weights::LENGTH_RATIO).clamp(0.0, 100.0);
    let list_points = if has_bullet_list(rewritten) && !has_bullet_list(original) {
        weights::NEW_LIST_BONUS
    } else {
        0.0
    };

    let score = (length_points + list_points).clamp(1.0, 100.0).round() as i32;

    let mut breakdown = BTreeMap::new();
    breakdown.insert("length".to_string(), length_points);
    breakdown.insert("new_list".to_string(), list_points);

    QualityScore {
        score,
        method: ScoringMethod::LengthRatio,
        breakdown,
    }
}
