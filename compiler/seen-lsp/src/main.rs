// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Seen Language Server

use miette::{IntoDiagnostic, WrapErr};
use seen_lsp::ServerConfig;
use tracing_subscriber::EnvFilter;

fn main() -> miette::Result<()> {
    // stdout carries the protocol
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    seen_lsp::run(stdin.lock(), stdout.lock(), ServerConfig::from_env())
        .into_diagnostic()
        .wrap_err("language server stopped")
}
