//! Command-line interface for promptpolish.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Settings;
use crate::grammar::GrammarReport;
use crate::metrics::{AnalysisOutcome, Analyzer, EMPTY_ADVISORY};
use crate::report;
use crate::sanitize::sanitize_bytes;
use crate::score::{quality_score, rewrite_quality};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

const FORMATS: &[&str] = &["pretty", "json"];

/// Prompt quality analysis and rewriting.
///
/// Measures complexity, clarity, structure and Gulpease readability of a
/// prompt, checks its grammar, and rewrites it through a chat-completion
/// service.
#[derive(Parser)]
#[command(name = "promptpolish")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by every command.
#[derive(Args, Clone)]
pub struct GlobalArgs {
    /// Path to settings YAML file (default: auto-discover)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format: pretty or json
    #[arg(short, long, global = true, default_value = "pretty")]
    pub format: String,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Grammar checkers to run, comma-separated: local, spelling, service
    #[arg(long, global = true, value_delimiter = ',')]
    pub checkers: Vec<String>,

    /// Word list for the spelling checker
    #[arg(long, global = true)]
    pub dictionary: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute quality metrics and grammar checks for a prompt
    Analyze(InputArgs),
    /// Run the grammar checkers only
    Grammar(InputArgs),
    /// Rewrite a prompt through the generation service
    #[command(visible_alias = "improve")]
    Rewrite(InputArgs),
    /// Score a rewrite against its original
    Score(ScoreArgs),
}

/// A single input text.
#[derive(Args)]
pub struct InputArgs {
    /// File to read (stdin when omitted or "-")
    pub file: Option<PathBuf>,
}

/// Arguments for the score command.
#[derive(Args)]
pub struct ScoreArgs {
    /// File holding the original prompt
    pub original: PathBuf,
    /// File holding the rewritten prompt
    pub rewritten: PathBuf,
}

/// Install the stderr log subscriber. `RUST_LOG` wins unless `verbose`.
pub fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("promptpolish=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("promptpolish=info"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Read a file, or stdin for `None` and `-`. Returns a display label too.
fn read_input(path: Option<&Path>) -> anyhow::Result<(String, Vec<u8>)> {
    match path {
        Some(p) if p != Path::new("-") => {
            let bytes =
                std::fs::read(p).with_context(|| format!("cannot read {}", p.display()))?;
            Ok((p.display().to_string(), bytes))
        }
        _ => {
            let mut bytes = Vec::new();
            std::io::stdin()
                .read_to_end(&mut bytes)
                .context("cannot read stdin")?;
            Ok(("stdin".to_string(), bytes))
        }
    }
}

/// Decode input as UTF-8. Anything else is treated as empty.
fn decode_text(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).unwrap_or_else(|e| {
        warn!(input_bytes = e.as_bytes().len(), "input is not valid UTF-8, discarded");
        String::new()
    })
}

/// Validate the format and load settings with command-line overrides.
fn prepare(global: &GlobalArgs) -> anyhow::Result<Option<Settings>> {
    if !FORMATS.contains(&global.format.as_str()) {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty' or 'json'",
            global.format
        );
        return Ok(None);
    }

    let mut settings = match Settings::load(global.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(None);
        }
    };

    if !global.checkers.is_empty() {
        settings.grammar.checkers = global.checkers.clone();
    }
    if let Some(dictionary) = &global.dictionary {
        settings.grammar.dictionary = Some(dictionary.clone());
    }
    if let Err(e) = settings.validate() {
        eprintln!("Error: {}", e);
        return Ok(None);
    }

    debug!(checkers = ?settings.grammar.checkers, "settings loaded");
    Ok(Some(settings))
}

fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("cannot start async runtime")
}

/// Run the analyze command.
pub fn run_analyze(global: &GlobalArgs, args: &InputArgs) -> anyhow::Result<i32> {
    let Some(settings) = prepare(global)? else {
        return Ok(EXIT_ERROR);
    };
    let analyzer = settings.build_analyzer()?;
    let (source, bytes) = read_input(args.file.as_deref())?;
    let text = sanitize_bytes(&bytes, analyzer.max_input_length());

    let outcome = runtime()?.block_on(analyzer.analyze_sanitized(&text));

    if global.format == "json" {
        report::write_analysis_json(&source, &outcome)?;
    } else {
        report::write_analysis_pretty(&source, &outcome);
    }

    Ok(match outcome {
        AnalysisOutcome::Complete(_) => EXIT_SUCCESS,
        _ => EXIT_FAILED,
    })
}

/// Run the grammar command.
pub fn run_grammar(global: &GlobalArgs, args: &InputArgs) -> anyhow::Result<i32> {
    let Some(settings) = prepare(global)? else {
        return Ok(EXIT_ERROR);
    };
    let analyzer = settings.build_analyzer()?;
    let (source, bytes) = read_input(args.file.as_deref())?;
    let text = decode_text(bytes);

    let grammar: GrammarReport = if text.trim().is_empty() {
        GrammarReport::unavailable(EMPTY_ADVISORY)
    } else {
        runtime()?.block_on(analyzer.check_grammar(&text))
    };

    if global.format == "json" {
        report::write_grammar_json(&source, &grammar)?;
    } else {
        report::write_grammar_pretty(&source, &grammar);
    }

    Ok(if grammar.available {
        EXIT_SUCCESS
    } else {
        EXIT_FAILED
    })
}

/// Run the rewrite command.
pub fn run_rewrite(global: &GlobalArgs, args: &InputArgs) -> anyhow::Result<i32> {
    let Some(settings) = prepare(global)? else {
        return Ok(EXIT_ERROR);
    };
    let analyzer = Arc::new(settings.build_analyzer()?);
    let rewriter = settings.build_rewriter(analyzer.clone());
    let (source, bytes) = read_input(args.file.as_deref())?;
    let text = decode_text(bytes);

    let rewrite = runtime()?.block_on(rewriter.rewrite(&text));
    let quality = rewrite_quality(&analyzer, &rewrite);

    if global.format == "json" {
        report::write_rewrite_json(&source, &rewrite, quality.as_ref())?;
    } else {
        report::write_rewrite_pretty(&source, &rewrite, quality.as_ref());
    }

    Ok(if rewrite.is_failed() {
        EXIT_FAILED
    } else {
        EXIT_SUCCESS
    })
}

/// Run the score command.
pub fn run_score(global: &GlobalArgs, args: &ScoreArgs) -> anyhow::Result<i32> {
    let Some(settings) = prepare(global)? else {
        return Ok(EXIT_ERROR);
    };
    let analyzer: Analyzer = settings.build_analyzer()?;

    let (original_source, original) = read_input(Some(&args.original))?;
    let (rewritten_source, rewritten) = read_input(Some(&args.rewritten))?;
    let original = sanitize_bytes(&original, analyzer.max_input_length());
    let rewritten = sanitize_bytes(&rewritten, analyzer.max_input_length());

    let score = quality_score(&analyzer, &original, &rewritten);
    let source = format!("{} -> {}", original_source, rewritten_source);

    if global.format == "json" {
        report::write_score_json(&source, &score)?;
    } else {
        report::write_score_pretty(&source, &score);
    }

    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "promptpolish",
            "analyze",
            "prompt.txt",
            "--format",
            "json",
            "--checkers",
            "local,spelling",
        ])
        .unwrap();
        assert_eq!(cli.global.format, "json");
        assert_eq!(cli.global.checkers, vec!["local", "spelling"]);
        match cli.command {
            Commands::Analyze(args) => assert_eq!(args.file, Some(PathBuf::from("prompt.txt"))),
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_score_requires_two_files() {
        assert!(Cli::try_parse_from(["promptpolish", "score", "a.txt"]).is_err());
        assert!(Cli::try_parse_from(["promptpolish", "score", "a.txt", "b.txt"]).is_ok());
    }

    #[test]
    fn test_decode_text_rejects_binary() {
        assert_eq!(decode_text(vec![0xff, 0xfe]), "");
        assert_eq!(decode_text(b"ciao".to_vec()), "ciao");
    }

    #[test]
    fn test_invalid_format_is_usage_error() {
        let global = GlobalArgs {
            config: None,
            format: "sarif".to_string(),
            verbose: false,
            checkers: Vec::new(),
            dictionary: None,
        };
        let args = InputArgs { file: None };
        assert_eq!(run_analyze(&global, &args).unwrap(), EXIT_ERROR);
    }
}
