//! promptpolish CLI entry point.

use clap::Parser;
use promptpolish::cli::{self, Cli, Commands, EXIT_ERROR};

fn main() {
    let cli = Cli::parse();
    cli::init_logging(cli.global.verbose);

    let result = match &cli.command {
        Commands::Analyze(args) => cli::run_analyze(&cli.global, args),
        Commands::Grammar(args) => cli::run_grammar(&cli.global, args),
        Commands::Rewrite(args) => cli::run_rewrite(&cli.global, args),
        Commands::Score(args) => cli::run_score(&cli.global, args),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}
