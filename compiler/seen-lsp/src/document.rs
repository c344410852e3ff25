// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Open documents and their analysis results.

use crate::symbols::SymbolTable;
use lsp_types::Url;
use rustc_hash::FxHashMap;
use seen_ast::span::SourceId;
use seen_ast::SourceFile;
use seen_lexer::KeywordTable;
use seen_parser::{parse_source_with_id, SyntaxError};
use std::rc::Rc;

/// Document state stored in memory.
#[derive(Debug)]
pub struct Document {
    pub uri: Url,
    /// Tag carried by every position of this document
    pub source_id: SourceId,
    pub text: String,
    pub version: i32,
    /// Syntax tree; `None` unless the text has no errors
    pub ast: Option<SourceFile>,
    /// Symbols; present exactly when `ast` is
    pub symbols: Option<SymbolTable>,
    /// Lexical and syntax errors from the last analysis
    pub errors: Vec<SyntaxError>,
}

impl Document {
    /// Lex, parse and index `text`.
    pub fn analyze(
        uri: Url,
        source_id: SourceId,
        text: String,
        version: i32,
        keywords: &KeywordTable,
        builtins: &Rc<SymbolTable>,
    ) -> Self {
        let parsed = parse_source_with_id(&text, keywords, source_id);

        let (ast, symbols) = match parsed.file {
            Some(file) if parsed.errors.is_empty() => {
                let symbols = SymbolTable::build(&file, uri.as_str(), Some(Rc::clone(builtins)));
                (Some(file), Some(symbols))
            }
            _ => (None, None),
        };

        tracing::debug!(
            "analyzed {} (version {}): {} errors, {} symbols",
            uri,
            version,
            parsed.errors.len(),
            symbols.as_ref().map_or(0, |s| s.symbols().len())
        );

        Self {
            uri,
            source_id,
            text,
            version,
            ast,
            symbols,
            errors: parsed.errors,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.ast.is_some()
    }
}

/// In-memory document storage keyed by URI.
///
/// Each URI is given a [`SourceId`] the first time it is seen and keeps it
/// for the life of the store, across edits, closes and reopens. Ids start
/// at 1; `SourceId(0)` is left to text that no store owns.
#[derive(Debug)]
pub struct DocumentStore {
    documents: FxHashMap<Url, Document>,
    source_ids: FxHashMap<Url, SourceId>,
    next_source_id: u32,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self {
            documents: FxHashMap::default(),
            source_ids: FxHashMap::default(),
            next_source_id: 1,
        }
    }
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The id of `uri`, assigning a fresh one on first use.
    pub fn source_id(&mut self, uri: &Url) -> SourceId {
        if let Some(&id) = self.source_ids.get(uri) {
            return id;
        }
        let id = SourceId(self.next_source_id);
        self.next_source_id += 1;
        self.source_ids.insert(uri.clone(), id);
        id
    }

    /// Analyze `text` as the new content of `uri`, replacing any previous
    /// version, and return the stored entry.
    pub fn open(
        &mut self,
        uri: Url,
        text: String,
        version: i32,
        keywords: &KeywordTable,
        builtins: &Rc<SymbolTable>,
    ) -> &Document {
        let source_id = self.source_id(&uri);
        let document = Document::analyze(uri.clone(), source_id, text, version, keywords, builtins);
        self.documents.insert(uri.clone(), document);
        &self.documents[&uri]
    }

    pub fn get(&self, uri: &Url) -> Option<&Document> {
        self.documents.get(uri)
    }

    pub fn remove(&mut self, uri: &Url) -> Option<Document> {
        self.documents.remove(uri)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Re-run analysis of every document, e.g. after the keyword language
    /// changed.
    pub fn reanalyze_all(&mut self, keywords: &KeywordTable, builtins: &Rc<SymbolTable>) {
        for document in self.documents.values_mut() {
            let uri = document.uri.clone();
            let text = std::mem::take(&mut document.text);
            *document = Document::analyze(
                uri,
                document.source_id,
                text,
                document.version,
                keywords,
                builtins,
            );
        }
    }
}
