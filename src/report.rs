//! Output formatting for promptpolish results.
//!
//! Supports two output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption

use colored::*;
use serde::{Deserialize, Serialize};

use crate::grammar::GrammarReport;
use crate::metrics::{Analysis, AnalysisOutcome, Difficulty, Level};
use crate::rewrite::{Rewrite, RewriteStatus};
use crate::score::QualityScore;

// =============================================================================
// JSON Format
// =============================================================================

/// Envelope shared by every JSON report.
#[derive(Serialize, Deserialize)]
pub struct JsonReport<T> {
    pub version: String,
    pub source: String,
    pub command: String,
    pub result: T,
}

impl<T: Serialize> JsonReport<T> {
    pub fn new(command: &str, source: &str, result: T) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            source: source.to_string(),
            command: command.to_string(),
            result,
        }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn print(&self) -> anyhow::Result<()> {
        println!("{}", self.to_json()?);
        Ok(())
    }
}

/// Rewrite result together with its quality score.
#[derive(Serialize, Deserialize)]
pub struct JsonRewrite {
    #[serde(flatten)]
    pub rewrite: Rewrite,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<QualityScore>,
}

pub fn write_analysis_json(source: &str, outcome: &AnalysisOutcome) -> anyhow::Result<()> {
    JsonReport::new("analyze", source, outcome).print()
}

pub fn write_grammar_json(source: &str, report: &GrammarReport) -> anyhow::Result<()> {
    JsonReport::new("grammar", source, report).print()
}

pub fn write_rewrite_json(
    source: &str,
    rewrite: &Rewrite,
    quality: Option<&QualityScore>,
) -> anyhow::Result<()> {
    let result = JsonRewrite {
        rewrite: rewrite.clone(),
        quality: quality.cloned(),
    };
    JsonReport::new("rewrite", source, result).print()
}

pub fn write_score_json(source: &str, score: &QualityScore) -> anyhow::Result<()> {
    JsonReport::new("score", source, score).print()
}

// =============================================================================
// Pretty Format
// =============================================================================

fn write_header(source: &str) {
    println!();
    print!("  ");
    print!("{}", "promptpolish".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();
    print!("  {}", "Input: ".dimmed());
    println!("{}", source);
    println!();
}

/// Write an analysis in pretty format.
pub fn write_analysis_pretty(source: &str, outcome: &AnalysisOutcome) {
    write_header(source);

    match outcome {
        AnalysisOutcome::Complete(analysis) => write_analysis_body(analysis),
        AnalysisOutcome::Empty { advisory } | AnalysisOutcome::Degraded { advisory } => {
            println!("  {} {}", "!".yellow(), advisory);
        }
    }
    println!();
}

fn write_analysis_body(analysis: &Analysis) {
    println!(
        "  {} {} characters, {} words, {} sentences",
        "Length:     ".dimmed(),
        analysis.char_count,
        analysis.word_count,
        analysis.sentence_count
    );
    print!("  {} ", "Complexity: ".dimmed());
    write_colored_level(analysis.complexity.level, true);
    println!(
        " ({:.2})  {}",
        analysis.complexity.score,
        format!(
            "avg word {:.2}, avg sentence {:.2}",
            analysis.complexity.avg_word_length, analysis.complexity.avg_sentence_length
        )
        .dimmed()
    );
    print!("  {} ", "Clarity:    ".dimmed());
    write_colored_level(analysis.clarity.level, false);
    println!(
        " ({:.2}/10)  {}",
        analysis.clarity.score,
        format!(
            "{} ambiguous, {} long sentences, {} vague",
            analysis.clarity.ambiguous_word_count,
            analysis.clarity.long_sentence_count,
            analysis.clarity.vague_expression_count
        )
        .dimmed()
    );
    print!("  {} ", "Readability:".dimmed());
    write_colored_gulpease(analysis.readability.gulpease_index);
    println!(" Gulpease ({})", analysis.readability.difficulty);

    let s = &analysis.structure;
    println!(
        "  {} lists {}  numbering {}  paragraphs {}  markdown {}",
        "Structure:  ".dimmed(),
        check_mark(s.has_lists),
        check_mark(s.has_numbering),
        check_mark(s.has_paragraphs),
        check_mark(s.has_markdown_formatting)
    );

    if !analysis.entities.is_empty() {
        let entities: Vec<String> = analysis
            .entities
            .iter()
            .map(|(text, label)| format!("{} ({})", text, label))
            .collect();
        println!("  {} {}", "Entities:   ".dimmed(), entities.join(", "));
    }

    if let Some(grammar) = &analysis.grammar {
        println!();
        write_grammar_body(grammar);
    }
}

/// Write a grammar report in pretty format.
pub fn write_grammar_pretty(source: &str, report: &GrammarReport) {
    write_header(source);
    write_grammar_body(report);
    println!();
}

fn write_grammar_body(report: &GrammarReport) {
    if report.available {
        print!("  {} ", "Grammar:    ".dimmed());
        write_colored_score(report.score.round() as i32);
        println!("/100  ({} issues)", report.error_count);
    } else {
        println!("  {} {}", "Grammar:    ".dimmed(), "unavailable".yellow());
    }

    if !report.categories.is_empty() {
        let categories: Vec<String> = report
            .categories
            .iter()
            .map(|(name, count)| format!("{} {}", name, count))
            .collect();
        println!("  {} {}", "Categories: ".dimmed(), categories.join(", "));
    }

    if !report.raw_issues.is_empty() {
        println!();
        println!("  {} ({}):", "Issues".bold(), report.raw_issues.len());
        for issue in &report.raw_issues {
            print!("    {:<16}", issue.kind.yellow());
            print!("{}", format!("@{}+{}", issue.offset, issue.length).dimmed());
            println!("  {}", issue.message);
            if !issue.suggested_corrections.is_empty() {
                println!(
                    "                    {}",
                    format!("-> {}", issue.suggested_corrections.join(", ")).dimmed()
                );
            }
        }
    }

    write_suggestions(&report.suggestions);
}

fn write_suggestions(suggestions: &[String]) {
    if suggestions.is_empty() {
        return;
    }
    println!();
    println!("  {}", "Suggestions:".bold());
    for s in suggestions {
        println!("    - {}", s);
    }
}

/// Write a rewrite result in pretty format.
pub fn write_rewrite_pretty(source: &str, rewrite: &Rewrite, quality: Option<&QualityScore>) {
    write_header(source);

    match rewrite.status {
        RewriteStatus::Fresh => println!("  {}", "✓ REWRITTEN".green()),
        RewriteStatus::Cached => println!("  {} {}", "✓ REWRITTEN".green(), "(cached)".dimmed()),
        RewriteStatus::Failed => println!("  {}", "✗ FAILED".red()),
    }
    println!();

    for line in rewrite.rewritten.lines() {
        println!("    {}", line);
    }

    write_suggestions(&rewrite.suggestions);

    if !rewrite.explanation.is_empty() {
        println!();
        println!("  {}", "Explanation:".bold());
        println!("    {}", rewrite.explanation);
    }

    if let Some(quality) = quality {
        println!();
        write_quality_line(quality);
    }
    println!();
}

/// Write a quality score in pretty format.
pub fn write_score_pretty(source: &str, score: &QualityScore) {
    write_header(source);
    write_quality_line(score);

    if !score.breakdown.is_empty() {
        println!();
        println!("  {}", "Breakdown:".bold());
        for (component, points) in &score.breakdown {
            println!("    {:<14} {:>+7.2} pts", component, points);
        }
    }
    println!();
}

fn write_quality_line(score: &QualityScore) {
    print!("  Quality: ");
    write_colored_score(score.score);
    println!("/100  {}", format!("({})", score.method.as_str()).dimmed());
}

fn write_colored_score(s: i32) {
    match s {
        s if s >= 80 => print!("{}", s.to_string().green().bold()),
        s if s >= 60 => print!("{}", s.to_string().green()),
        s if s >= 40 => print!("{}", s.to_string().yellow()),
        _ => print!("{}", s.to_string().red()),
    }
}

/// `high_is_bad` flips the colors for complexity.
fn write_colored_level(level: Level, high_is_bad: bool) {
    let text = level.as_str();
    match (level, high_is_bad) {
        (Level::Medium, _) => print!("{}", text.yellow()),
        (Level::High, false) | (Level::Low, true) => print!("{}", text.green()),
        _ => print!("{}", text.red()),
    }
}

fn write_colored_gulpease(index: f64) {
    let text = format!("{:.2}", index);
    match Difficulty::from_gulpease(index) {
        Difficulty::VeryEasy | Difficulty::Easy => print!("{}", text.green()),
        Difficulty::Medium => print!("{}", text.yellow()),
        Difficulty::VeryHard => print!("{}", text.red()),
    }
}

fn check_mark(value: bool) -> ColoredString {
    if value {
        "yes".green()
    } else {
        "no".dimmed()
    }
}
