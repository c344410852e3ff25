// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Per-language keyword tables.
//!
//! A language file maps each canonical keyword to the spelling used in
//! source text:
//!
//! ```toml
//! [language]
//! code = "en"
//! name = "English"
//!
//! [keywords]
//! fun = "fun"
//! let = "let"
//! ```
//!
//! Lookups go by the localized spelling, but the token kind handed to the
//! parser is always the canonical one. Source written in any language
//! therefore parses with the same grammar.

use crate::TokenKind;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use smol_str::SmolStr;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming a directory of `<lang>.toml` keyword files.
pub const LANGUAGES_DIR_ENV: &str = "SEEN_LANGUAGES_DIR";

/// Language files compiled into the crate.
const BUNDLED: &[(&str, &str)] = &[
    ("en", include_str!("../languages/en.toml")),
    ("ar", include_str!("../languages/ar.toml")),
];

/// Errors raised while loading a keyword file.
#[derive(Debug, Error)]
pub enum KeywordError {
    #[error("failed to read keyword file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid keyword file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("no keyword file for language '{0}'")]
    NotFound(String),
}

/// Metadata from the optional `[language]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LanguageInfo {
    pub code: String,
    pub name: String,
    #[serde(default = "default_direction")]
    pub direction: String,
}

fn default_direction() -> String {
    "ltr".to_string()
}

/// On-disk layout of a language file.
#[derive(Debug, Deserialize)]
struct KeywordFile {
    language: Option<LanguageInfo>,
    #[serde(default)]
    keywords: BTreeMap<String, String>,
}

/// Mapping from localized keyword spellings to canonical token kinds.
#[derive(Debug, Clone, Default)]
pub struct KeywordTable {
    language: Option<LanguageInfo>,
    by_spelling: FxHashMap<SmolStr, TokenKind>,
    /// Spellings of `true` and `false`
    bools: FxHashMap<SmolStr, bool>,
}

impl KeywordTable {
    /// A table with no keywords; every word lexes as an identifier.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the keyword table for a language.
    ///
    /// Looks in `$SEEN_LANGUAGES_DIR` first, then in the bundled files.
    /// Never fails: a missing or broken file yields an empty table.
    pub fn load(language_id: &str) -> Self {
        if let Some(dir) = std::env::var_os(LANGUAGES_DIR_ENV) {
            match Self::load_from_dir(Path::new(&dir), language_id) {
                Ok(table) => return table,
                Err(KeywordError::NotFound(_)) => {}
                Err(err) => {
                    tracing::warn!("{}; falling back to bundled keywords", err);
                }
            }
        }

        match Self::bundled(language_id) {
            Ok(table) => table,
            Err(err) => {
                tracing::warn!("{}; all words will lex as identifiers", err);
                Self::empty()
            }
        }
    }

    /// Load `<dir>/<language_id>.toml`.
    pub fn load_from_dir(dir: &Path, language_id: &str) -> Result<Self, KeywordError> {
        if !is_valid_language_id(language_id) {
            return Err(KeywordError::NotFound(language_id.to_string()));
        }
        let path = dir.join(format!("{}.toml", language_id));
        if !path.is_file() {
            return Err(KeywordError::NotFound(language_id.to_string()));
        }
        Self::load_from_path(&path)
    }

    /// Load a keyword file from an explicit path.
    pub fn load_from_path(path: &Path) -> Result<Self, KeywordError> {
        let contents = std::fs::read_to_string(path).map_err(|source| KeywordError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_toml_str(&contents)?;
        tracing::debug!(
            "loaded {} keywords from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    /// Load one of the language files compiled into the crate.
    pub fn bundled(language_id: &str) -> Result<Self, KeywordError> {
        BUNDLED
            .iter()
            .find(|(code, _)| *code == language_id)
            .ok_or_else(|| KeywordError::NotFound(language_id.to_string()))
            .and_then(|(_, contents)| Self::from_toml_str(contents))
    }

    /// Parse a language file.
    pub fn from_toml_str(contents: &str) -> Result<Self, KeywordError> {
        let file: KeywordFile = toml::from_str(contents)?;
        let mut by_spelling = FxHashMap::default();
        let mut bools = FxHashMap::default();

        for (canonical, spelling) in &file.keywords {
            let Some(kind) = TokenKind::from_canonical(canonical) else {
                tracing::warn!("ignoring unknown keyword '{}'", canonical);
                continue;
            };
            let spelling = spelling.trim();
            if spelling.is_empty() {
                continue;
            }
            if kind == TokenKind::BoolLiteral {
                bools.insert(SmolStr::new(spelling), canonical == "true");
            }
            if let Some(previous) = by_spelling.insert(SmolStr::new(spelling), kind) {
                if previous != kind {
                    tracing::warn!(
                        "spelling '{}' is used for both {:?} and {:?}",
                        spelling,
                        previous,
                        kind
                    );
                }
            }
        }

        Ok(Self {
            language: file.language,
            by_spelling,
            bools,
        })
    }

    /// Classify a scanned word.
    pub fn classify(&self, word: &str) -> TokenKind {
        self.by_spelling
            .get(word)
            .copied()
            .unwrap_or(TokenKind::Identifier)
    }

    /// The value of a boolean literal spelling.
    pub fn bool_value(&self, spelling: &str) -> Option<bool> {
        self.bools.get(spelling).copied()
    }

    /// Language metadata, if the file declared any.
    pub fn language(&self) -> Option<&LanguageInfo> {
        self.language.as_ref()
    }

    pub fn len(&self) -> usize {
        self.by_spelling.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_spelling.is_empty()
    }
}

/// Language ids name files, so only plain tags are accepted.
fn is_valid_language_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
