// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Command implementations for the Seen CLI.

use crate::KeywordArgs;
use miette::{Context, IntoDiagnostic};
use seen_ast::span::Range;
use seen_lexer::{tokenize, KeywordTable, Token};
use seen_parser::{parse, SyntaxError};
use seen_lsp::ServerConfig;
use std::path::Path;

/// Keyword table selected on the command line.
///
/// An explicit `--languages-dir` must contain the language; otherwise the
/// usual search applies and a missing file falls back to no keywords.
fn load_keywords(args: &KeywordArgs) -> miette::Result<KeywordTable> {
    let table = match &args.languages_dir {
        Some(dir) => KeywordTable::load_from_dir(dir, &args.language)
            .into_diagnostic()
            .wrap_err_with(|| {
                format!(
                    "Failed to load keywords for '{}' from {}",
                    args.language,
                    dir.display()
                )
            })?,
        None => KeywordTable::load(&args.language),
    };
    tracing::debug!("{} keywords for language '{}'", table.len(), args.language);
    Ok(table)
}

fn read_source(input: &Path) -> miette::Result<String> {
    std::fs::read_to_string(input)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read {}", input.display()))
}

/// `file:line:col` with one-based coordinates.
fn location(input: &Path, range: Range) -> String {
    format!(
        "{}:{}:{}",
        input.display(),
        range.start.line + 1,
        range.start.column + 1
    )
}

/// One line per error, plus an indented hint where the parser has one.
fn render_error(input: &Path, error: &SyntaxError) -> String {
    let mut line = format!("{}: {}", location(input, error.range()), error);
    if let SyntaxError::Parse(err) = error {
        if let Some(hint) = err.hint() {
            line.push_str(&format!("\n  hint: {}", hint));
        }
    }
    line
}

fn report<E: Into<SyntaxError> + Clone>(input: &Path, errors: &[E]) {
    for err in errors {
        eprintln!("{}", render_error(input, &err.clone().into()));
    }
}

/// Lex, then parse. Each phase runs only if the previous one succeeded.
pub fn build(input: &Path, args: &KeywordArgs) -> miette::Result<()> {
    let source = read_source(input)?;
    let keywords = load_keywords(args)?;

    let lexed = tokenize(&source, &keywords);
    if lexed.has_errors() {
        report(input, &lexed.errors);
        return Err(miette::miette!(
            "Lexing failed with {} errors",
            lexed.errors.len()
        ));
    }

    let parsed = parse(&lexed.tokens, &keywords);
    if !parsed.is_ok() {
        report(input, &parsed.errors);
        return Err(miette::miette!(
            "Parsing failed with {} errors",
            parsed.errors.len()
        ));
    }

    let statements = parsed.file.as_ref().map_or(0, |file| file.body.len());
    println!("✓ Build successful: parsing completed");
    println!("  {} tokens", lexed.tokens.len());
    println!("  {} top-level statements", statements);

    Ok(())
}

/// Report lexical and syntax errors.
pub fn check(input: &Path, args: &KeywordArgs) -> miette::Result<()> {
    let source = read_source(input)?;
    let keywords = load_keywords(args)?;

    let parsed = seen_parser::parse_source(&source, &keywords);
    if !parsed.errors.is_empty() {
        report(input, &parsed.errors);
        return Err(miette::miette!(
            "Found {} errors in {}",
            parsed.errors.len(),
            input.display()
        ));
    }

    println!("✓ No errors found");
    Ok(())
}

fn describe_token(token: &Token) -> String {
    format!(
        "{}:{}\t{:?}\t{:?}",
        token.range.start.line + 1,
        token.range.start.column + 1,
        token.kind,
        token.lexeme.as_str()
    )
}

/// Dump the token stream.
pub fn tokens(input: &Path, args: &KeywordArgs, trivia: bool) -> miette::Result<()> {
    let source = read_source(input)?;
    let keywords = load_keywords(args)?;

    let lexed = tokenize(&source, &keywords);
    for token in lexed.tokens.iter().filter(|t| trivia || !t.is_trivia()) {
        println!("{}", describe_token(token));
    }

    if lexed.has_errors() {
        report(input, &lexed.errors);
        return Err(miette::miette!(
            "Lexing failed with {} errors",
            lexed.errors.len()
        ));
    }
    Ok(())
}

/// Serve LSP on stdin/stdout.
pub fn lsp(args: &KeywordArgs) -> miette::Result<()> {
    let config = ServerConfig {
        language: args.language.clone(),
        languages_dir: args.languages_dir.clone(),
    };
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    seen_lsp::run(stdin.lock(), stdout.lock(), config)
        .into_diagnostic()
        .wrap_err("Language server stopped")
}

#[cfg(test)]
mod tests {
    use super::*;
    use seen_parser::parse_source;

    fn english() -> KeywordTable {
        KeywordTable::bundled("en").unwrap()
    }

    #[test]
    fn test_errors_render_with_one_based_location() {
        let parsed = parse_source("fun f() {\n  let = 1\n}", &english());
        let rendered = render_error(Path::new("main.seen"), &parsed.errors[0]);
        assert!(
            rendered.starts_with("main.seen:2:7: "),
            "unexpected rendering: {}",
            rendered
        );
    }

    #[test]
    fn test_lex_errors_render_message() {
        let parsed = parse_source("let s = \"open", &english());
        let rendered = render_error(Path::new("a.seen"), &parsed.errors[0]);
        assert_eq!(rendered, "a.seen:1:9: unterminated string literal");
    }

    #[test]
    fn test_token_description() {
        let lexed = tokenize("let x", &english());
        let described: Vec<String> = lexed
            .tokens
            .iter()
            .filter(|t| !t.is_trivia())
            .map(describe_token)
            .collect();
        assert_eq!(described[0], "1:1\tLet\t\"let\"");
        assert_eq!(described[1], "1:5\tIdentifier\t\"x\"");
    }

    #[test]
    fn test_missing_languages_dir_entry_is_an_error() {
        let args = KeywordArgs {
            language: "xx".to_string(),
            languages_dir: Some(std::env::temp_dir()),
        };
        assert!(load_keywords(&args).is_err());
    }

    #[test]
    fn test_unknown_language_without_dir_is_soft() {
        let args = KeywordArgs {
            language: "zz".to_string(),
            languages_dir: None,
        };
        assert!(load_keywords(&args).unwrap().is_empty());
    }
}
