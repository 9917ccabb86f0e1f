//! Integration tests for the analysis pipeline: settings, metrics, grammar
//! aggregation and scoring, run against the testdata fixtures.

use std::path::PathBuf;

use promptpolish::config::Settings;
use promptpolish::grammar::GrammarAggregator;
use promptpolish::metrics::{AnalysisOutcome, Analyzer, Level};
use promptpolish::score::{quality_score, ScoringMethod};

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn read_prompt(name: &str) -> String {
    std::fs::read_to_string(testdata_path().join("prompts").join(name))
        .expect("should read prompt fixture")
}

/// Settings from the fixture file, with the fixture dictionary.
fn settings() -> Settings {
    let mut settings =
        Settings::parse_file(testdata_path().join("promptpolish.yaml")).expect("should parse settings");
    settings.grammar.dictionary = Some(testdata_path().join("it.txt"));
    settings.validate().expect("settings should be valid");
    settings
}

#[test]
fn test_fixture_settings() {
    let settings = settings();
    assert_eq!(settings.max_input_length, 10_000);
    assert_eq!(settings.grammar.checkers, vec!["local", "spelling"]);
    assert_eq!(settings.retry.max_attempts, 3);
    assert!(settings.api_key.is_none());
}

#[tokio::test]
async fn test_vague_prompt_metrics() {
    let analyzer = settings().build_analyzer().unwrap();
    let text = read_prompt("vague.txt");

    let outcome = analyzer.analyze(&text).await;
    let analysis = outcome.analysis().expect("analysis should complete");

    assert_eq!(analysis.word_count, 4);
    assert_eq!(analysis.sentence_count, 1);
    assert!(analysis.clarity.ambiguous_word_count >= 2);
    assert_eq!(analysis.clarity.level, Level::High);
    assert!(!analysis.structure.has_lists);
    assert!(!analysis.structure.has_numbering);
    assert!(!analysis.structure.has_paragraphs);
    assert!(!analysis.structure.has_markdown_formatting);

    let grammar = analysis.grammar.as_ref().expect("grammar should run");
    assert!(grammar.available);
    assert!(!grammar.categories.contains_key("Spelling"));
}

#[tokio::test]
async fn test_structured_prompt_signals() {
    let analyzer = settings().build_analyzer().unwrap();
    let outcome = analyzer.analyze(&read_prompt("structured.txt")).await;
    let analysis = outcome.into_analysis().expect("analysis should complete");

    assert!(analysis.structure.has_lists);
    assert!(analysis.structure.has_numbering);
    assert!(analysis.structure.has_paragraphs);
    assert!(analysis.structure.has_markdown_formatting);
    assert_eq!(analysis.structure.signal_count(), 4);
}

#[tokio::test]
async fn test_spelling_issue_with_correction() {
    let analyzer = settings().build_analyzer().unwrap();
    let outcome = analyzer.analyze("Scrivi una poessia sul mare.").await;
    let grammar = outcome
        .analysis()
        .and_then(|a| a.grammar.clone())
        .expect("grammar should run");

    assert_eq!(grammar.categories.get("Spelling"), Some(&1));
    let issue = grammar
        .raw_issues
        .iter()
        .find(|i| i.kind == "Spelling")
        .expect("spelling issue");
    assert_eq!(issue.offset, 11);
    assert_eq!(issue.suggested_corrections.first().map(String::as_str), Some("poesia"));
}

#[tokio::test]
async fn test_markup_is_escaped_before_analysis() {
    let analyzer = settings().build_analyzer().unwrap();
    let outcome = analyzer.analyze("Scrivi <b>una</b> poesia.").await;
    let analysis = outcome.analysis().unwrap();
    assert_eq!(analysis.char_count, "Scrivi &lt;b&gt;una&lt;/b&gt; poesia.".chars().count());
}

#[tokio::test]
async fn test_empty_and_whitespace_inputs() {
    let analyzer = settings().build_analyzer().unwrap();
    for text in ["", "   ", "\n\t\n"] {
        match analyzer.analyze(text).await {
            AnalysisOutcome::Empty { advisory } => assert_eq!(advisory, "The prompt is empty."),
            other => panic!("expected empty outcome, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_zero_checkers_report_unavailable() {
    let analyzer = Analyzer::default();
    let outcome = analyzer.analyze("Scrivi una poesia sul mare.").await;
    let grammar = outcome.analysis().and_then(|a| a.grammar.as_ref()).unwrap();
    assert!(!grammar.available);
    assert_eq!(
        grammar.suggestions,
        vec!["Advanced grammar analysis unavailable."]
    );
}

#[test]
fn test_score_against_itself_is_base() {
    let analyzer = settings().build_analyzer().unwrap();
    let text = read_prompt("vague.txt");
    let score = quality_score(&analyzer, &text, &text);
    assert_eq!(score.score, 60);
    assert_eq!(score.method, ScoringMethod::Metrics);
}

#[test]
fn test_structured_rewrite_gains_structure_points() {
    let analyzer = settings().build_analyzer().unwrap();
    let original = read_prompt("vague.txt");
    let rewritten = read_prompt("structured.txt");

    let score = quality_score(&analyzer, &original, &rewritten);
    assert_eq!(score.breakdown["structure"], 5.0);
}

#[test]
fn test_degraded_analyzer_uses_length_ratio() {
    let analyzer = Analyzer::without_linguistics(GrammarAggregator::new());
    assert!(matches!(
        analyzer.measure("Scrivi una poesia."),
        AnalysisOutcome::Degraded { .. }
    ));
    let score = quality_score(&analyzer, "Scrivi una poesia.", "Scrivi una poesia.");
    assert_eq!(score.method, ScoringMethod::LengthRatio);
}
