// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Parser error types.

use seen_ast::span::Range;
use seen_lexer::{Token, TokenKind};
use thiserror::Error;

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// A syntax error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("unexpected {}, expected {expected}", found.describe())]
    UnexpectedToken {
        range: Range,
        found: TokenKind,
        expected: String,
        hint: Option<String>,
    },

    #[error("expected {}, found {}", expected.describe(), found.describe())]
    ExpectedToken {
        range: Range,
        expected: TokenKind,
        found: TokenKind,
        hint: Option<String>,
    },

    #[error("expected {what}, found {}", found.describe())]
    ExpectedIdentifier {
        range: Range,
        what: &'static str,
        found: TokenKind,
        hint: Option<String>,
    },

    #[error("unexpected end of file")]
    UnexpectedEof { range: Range, hint: Option<String> },

    #[error("invalid literal '{lexeme}'")]
    InvalidLiteral {
        range: Range,
        lexeme: String,
        hint: Option<String>,
    },

    #[error("unexpected {} after end of input", found.describe())]
    TrailingTokens { range: Range, found: TokenKind },

    #[error("{message}")]
    Custom {
        range: Range,
        message: String,
        hint: Option<String>,
    },
}

impl ParseError {
    /// Create an unexpected token error.
    pub fn unexpected_token(token: &Token, expected: &str) -> Self {
        if token.kind == TokenKind::Eof {
            return Self::UnexpectedEof {
                range: token.range,
                hint: Some(format!("expected {} before end of file", expected)),
            };
        }
        Self::UnexpectedToken {
            range: token.range,
            found: token.kind,
            expected: expected.to_string(),
            hint: unexpected_token_hint(token.kind, expected),
        }
    }

    /// Create an expected token error.
    pub fn expected_token(expected: TokenKind, found: &Token) -> Self {
        Self::ExpectedToken {
            range: found.range,
            expected,
            found: found.kind,
            hint: expected_token_hint(expected, found.kind),
        }
    }

    /// Create an expected identifier error; `what` names the missing thing.
    pub fn expected_identifier(found: &Token, what: &'static str) -> Self {
        let hint = match found.kind {
            TokenKind::IntLiteral | TokenKind::FloatLiteral => {
                Some("names cannot start with a digit".to_string())
            }
            TokenKind::StringLiteral => {
                Some("string literals cannot be used as names".to_string())
            }
            kind if kind.is_keyword() => Some(format!(
                "'{}' is a keyword and cannot be used as a name",
                found.lexeme
            )),
            _ => None,
        };
        Self::ExpectedIdentifier {
            range: found.range,
            what,
            found: found.kind,
            hint,
        }
    }

    /// Create an invalid literal error.
    pub fn invalid_literal(token: &Token) -> Self {
        let hint = match token.kind {
            TokenKind::IntLiteral => Some("integer literal is out of range".to_string()),
            _ => None,
        };
        Self::InvalidLiteral {
            range: token.range,
            lexeme: token.lexeme.to_string(),
            hint,
        }
    }

    /// Create a custom error.
    pub fn custom(range: Range, message: impl Into<String>) -> Self {
        Self::Custom {
            range,
            message: message.into(),
            hint: None,
        }
    }

    /// Create a custom error with a hint.
    pub fn custom_with_hint(range: Range, message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::Custom {
            range,
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    /// Get the range of this error.
    pub fn range(&self) -> Range {
        match self {
            Self::UnexpectedToken { range, .. } => *range,
            Self::ExpectedToken { range, .. } => *range,
            Self::ExpectedIdentifier { range, .. } => *range,
            Self::UnexpectedEof { range, .. } => *range,
            Self::InvalidLiteral { range, .. } => *range,
            Self::TrailingTokens { range, .. } => *range,
            Self::Custom { range, .. } => *range,
        }
    }

    /// Get the hint for this error, if any.
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::UnexpectedToken { hint, .. } => hint.as_deref(),
            Self::ExpectedToken { hint, .. } => hint.as_deref(),
            Self::ExpectedIdentifier { hint, .. } => hint.as_deref(),
            Self::UnexpectedEof { hint, .. } => hint.as_deref(),
            Self::InvalidLiteral { hint, .. } => hint.as_deref(),
            Self::TrailingTokens { .. } => None,
            Self::Custom { hint, .. } => hint.as_deref(),
        }
    }

    /// Format as `line:col: message` with one-based coordinates.
    pub fn format_location(&self) -> String {
        let start = self.range().start;
        let mut output = format!("{}:{}: {}", start.line + 1, start.column + 1, self);
        if let Some(hint) = self.hint() {
            output.push_str(&format!("\n  hint: {}", hint));
        }
        output
    }
}

fn unexpected_token_hint(found: TokenKind, expected: &str) -> Option<String> {
    match found {
        TokenKind::Invalid => Some("remove the unrecognized character".to_string()),
        _ if expected == "expression" => Some("check the syntax of your expression".to_string()),
        _ => None,
    }
}

fn expected_token_hint(expected: TokenKind, found: TokenKind) -> Option<String> {
    match (expected, found) {
        (_, TokenKind::Eof) => {
            Some("unexpected end of file - check for unclosed delimiters".to_string())
        }
        (TokenKind::RBrace, _) => Some("a block must be closed with '}'".to_string()),
        (TokenKind::RParen, _) => Some("check for a missing ')' or ','".to_string()),
        _ => None,
    }
}
