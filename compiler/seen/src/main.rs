// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Seen front end CLI.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "seen")]
#[command(author, version, about = "Seen: a multilingual programming language")]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    keywords: KeywordArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options selecting the keyword table.
#[derive(Args, Debug, Clone)]
pub struct KeywordArgs {
    /// Keyword language (en, ar, ...)
    #[arg(long = "lang", global = true, default_value = "en")]
    pub language: String,

    /// Directory holding `<lang>.toml` keyword files
    #[arg(long, global = true, value_name = "DIR")]
    pub languages_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Lex and parse a file, stopping at the first failing phase
    Build {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Report every lexical and syntax error in a file
    Check {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Print the token stream of a file
    Tokens {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Include whitespace, newline and comment tokens
        #[arg(long)]
        trivia: bool,
    },

    /// Run the language server on stdio
    Lsp,
}

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input } => {
            commands::build(&input, &cli.keywords)?;
        }
        Commands::Check { input } => {
            commands::check(&input, &cli.keywords)?;
        }
        Commands::Tokens { input, trivia } => {
            commands::tokens(&input, &cli.keywords, trivia)?;
        }
        Commands::Lsp => {
            commands::lsp(&cli.keywords)?;
        }
    }

    Ok(())
}
