// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Parser for the Seen programming language.
//!
//! This crate provides a hand-written recursive descent parser for Seen.
//! The parser is designed for:
//!
//! - Good error messages with recovery
//! - Keyword-language independence (it only sees canonical token kinds)
//! - Full source range preservation for editor queries

mod error;
mod expr;

use seen_ast::span::{Position, Range, SourceId};
use seen_ast::*;
use seen_lexer::{tokenize_with_id, KeywordTable, LexError, Token, TokenKind};
use thiserror::Error;

pub use error::{ParseError, ParseResult};
pub use expr::Precedence;

/// Deepest nesting of expressions, blocks and types the parser accepts.
pub const MAX_NESTING_DEPTH: usize = 128;

/// A significant token with the trivia facts the grammar cares about.
#[derive(Debug, Clone)]
struct Lookahead {
    token: Token,
    /// A line break occurred between the previous significant token and this one
    newline_before: bool,
    /// Doc comments written directly above this token
    doc: Option<String>,
}

/// Parser for Seen token streams.
pub struct Parser<'a> {
    tokens: Vec<Lookahead>,
    pos: usize,
    keywords: &'a KeywordTable,
    errors: Vec<ParseError>,
    depth: usize,
    /// The nesting limit was hit; parsing gives up on the file
    too_deep: bool,
}

impl<'a> Parser<'a> {
    /// Create a parser over a lexed token stream.
    ///
    /// Trivia is filtered out here. `keywords` resolves boolean literal
    /// spellings.
    pub fn new(tokens: &[Token], keywords: &'a KeywordTable) -> Self {
        let mut significant = Vec::new();
        let mut errors = Vec::new();
        let mut docs: Vec<String> = Vec::new();
        let mut newline_before = false;
        let mut newlines_since_doc = 0usize;
        let mut reached_eof = false;

        for token in tokens {
            if reached_eof {
                if !token.is_trivia() && token.kind != TokenKind::Eof {
                    errors.push(ParseError::TrailingTokens {
                        range: token.range,
                        found: token.kind,
                    });
                    break;
                }
                continue;
            }
            match token.kind {
                TokenKind::Whitespace => {}
                TokenKind::Newline => {
                    newline_before = true;
                    newlines_since_doc += 1;
                    // A blank line detaches earlier doc comments
                    if newlines_since_doc > 1 {
                        docs.clear();
                    }
                }
                TokenKind::DocComment => {
                    docs.push(clean_doc_comment(&token.lexeme));
                    newlines_since_doc = 0;
                    if token.lexeme.contains('\n') {
                        newline_before = true;
                    }
                }
                TokenKind::Comment => {
                    docs.clear();
                    if token.lexeme.contains('\n') {
                        newline_before = true;
                    }
                }
                _ => {
                    reached_eof = token.kind == TokenKind::Eof;
                    let doc = if docs.is_empty() {
                        None
                    } else {
                        Some(std::mem::take(&mut docs).join("\n"))
                    };
                    significant.push(Lookahead {
                        token: token.clone(),
                        newline_before,
                        doc,
                    });
                    newline_before = false;
                    newlines_since_doc = 0;
                }
            }
        }

        if !reached_eof {
            let end = significant
                .last()
                .map(|la| la.token.range.end)
                .unwrap_or_default();
            significant.push(Lookahead {
                token: Token::new(TokenKind::Eof, "", Range::empty(end)),
                newline_before,
                doc: None,
            });
        }

        Self {
            tokens: significant,
            pos: 0,
            keywords,
            errors,
            depth: 0,
            too_deep: false,
        }
    }

    /// Parse a complete source file.
    pub fn parse_file(&mut self) -> (SourceFile, Vec<ParseError>) {
        let mut file = SourceFile::new();

        while !self.is_eof() {
            let before = self.pos;
            match self.parse_stmt(&mut file) {
                Ok(stmt) => file.body.push(stmt),
                Err(e) => {
                    self.errors.push(e);
                    if self.too_deep {
                        self.pos = self.tokens.len() - 1;
                        break;
                    }
                    self.synchronize(before);
                }
            }
        }

        let end = self.peek().range.end;
        let start = Position {
            source: end.source,
            ..Position::default()
        };
        file.range = Range::new(start, end);
        (file, std::mem::take(&mut self.errors))
    }

    // === Statements ===

    /// Parse a statement, consuming one optional trailing `;`.
    fn parse_stmt(&mut self, file: &mut SourceFile) -> ParseResult<StmtId> {
        let stmt = self.parse_stmt_inner(file)?;
        if self.check(TokenKind::Semicolon) {
            self.advance();
        }
        Ok(file.stmts.alloc(stmt))
    }

    fn parse_stmt_inner(&mut self, file: &mut SourceFile) -> ParseResult<Stmt> {
        let start = self.peek().range;

        let kind = match self.peek().kind {
            TokenKind::Let | TokenKind::Var => StmtKind::Variable(self.parse_variable(file)?),
            TokenKind::Const => StmtKind::Const(self.parse_const(file)?),
            TokenKind::Fun => StmtKind::Function(self.parse_function(file)?),
            TokenKind::Struct => StmtKind::Struct(self.parse_struct(file)?),
            TokenKind::Import => StmtKind::Import(self.parse_import()?),
            TokenKind::If => StmtKind::If(self.parse_if(file)?),
            TokenKind::While => {
                self.advance();
                let condition = self.parse_expr(file)?;
                let body = self.parse_block(file)?;
                StmtKind::While { condition, body }
            }
            TokenKind::For => {
                self.advance();
                let binding = self.expect_name("loop variable")?;
                self.expect(TokenKind::In)?;
                let iterable = self.parse_expr(file)?;
                let body = self.parse_block(file)?;
                StmtKind::For {
                    binding,
                    iterable,
                    body,
                }
            }
            TokenKind::Loop => {
                self.advance();
                StmtKind::Loop {
                    body: self.parse_block(file)?,
                }
            }
            TokenKind::Return => {
                self.advance();
                if self.at_statement_end() {
                    StmtKind::Return(None)
                } else {
                    StmtKind::Return(Some(self.parse_expr(file)?))
                }
            }
            TokenKind::Break => {
                self.advance();
                StmtKind::Break
            }
            TokenKind::Continue => {
                self.advance();
                StmtKind::Continue
            }
            TokenKind::LBrace => StmtKind::Block(self.parse_block(file)?),
            _ => StmtKind::Expr(self.parse_expr(file)?),
        };

        Ok(Stmt {
            range: start.merge(self.previous_range()),
            kind,
        })
    }

    /// Nothing more belongs to the current statement.
    fn at_statement_end(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
        ) || self.newline_before()
    }

    /// Parse a braced block of statements.
    fn parse_block(&mut self, file: &mut SourceFile) -> ParseResult<Block> {
        self.nested("block", |p| p.parse_block_body(file))
    }

    fn parse_block_body(&mut self, file: &mut SourceFile) -> ParseResult<Block> {
        let start = self.expect(TokenKind::LBrace)?;
        let mut stmts = Vec::new();

        while !self.check(TokenKind::RBrace) && !self.is_eof() {
            let before = self.pos;
            match self.parse_stmt(file) {
                Ok(stmt) => stmts.push(stmt),
                Err(e) if self.too_deep => return Err(e),
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize(before);
                }
            }
        }

        let end = self.expect(TokenKind::RBrace)?;
        Ok(Block {
            range: start.merge(end),
            stmts,
        })
    }

    /// Parse `let`/`var name [: Type] [= init]`.
    fn parse_variable(&mut self, file: &mut SourceFile) -> ParseResult<VariableDecl> {
        let doc = self.peek_doc();
        let mutable = self.advance().kind == TokenKind::Var;
        let name = self.expect_name("variable name")?;

        let ty = if self.check(TokenKind::Colon) {
            self.advance();
            Some(self.parse_type(file)?)
        } else {
            None
        };

        let init = if self.check(TokenKind::Eq) {
            self.advance();
            Some(self.parse_expr(file)?)
        } else {
            None
        };

        Ok(VariableDecl {
            visibility: Visibility::of(&name.text),
            name,
            mutable,
            ty,
            init,
            doc,
        })
    }

    /// Parse `const NAME [: Type] = value`.
    fn parse_const(&mut self, file: &mut SourceFile) -> ParseResult<ConstDecl> {
        let doc = self.peek_doc();
        self.expect(TokenKind::Const)?;
        let name = self.expect_name("constant name")?;

        let ty = if self.check(TokenKind::Colon) {
            self.advance();
            Some(self.parse_type(file)?)
        } else {
            None
        };

        if !self.check(TokenKind::Eq) {
            let found = self.peek().clone();
            return Err(ParseError::UnexpectedToken {
                range: found.range,
                found: found.kind,
                expected: "`=` after constant name".to_string(),
                hint: Some("constants must be initialized".to_string()),
            });
        }
        self.advance();
        let value = self.parse_expr(file)?;

        Ok(ConstDecl {
            visibility: Visibility::of(&name.text),
            name,
            ty,
            value,
            doc,
        })
    }

    /// Parse `fun [(receiver: Type)] name(params) [-> Type | : Type] { body }`.
    fn parse_function(&mut self, file: &mut SourceFile) -> ParseResult<Function> {
        let doc = self.peek_doc();
        self.expect(TokenKind::Fun)?;

        let receiver = if self.check(TokenKind::LParen) {
            match self.try_parse_receiver(file) {
                Some(receiver) => Some(receiver),
                None => {
                    return Err(ParseError::expected_identifier(
                        self.peek(),
                        "function name",
                    ))
                }
            }
        } else {
            None
        };
        let is_method = receiver.is_some();

        let name = self.expect_name("function name")?;
        let mut params: Vec<Param> = receiver.into_iter().collect();
        params.extend(self.parse_params(file)?);

        let return_type = if self.check(TokenKind::Arrow) || self.check(TokenKind::Colon) {
            self.advance();
            Some(self.parse_type(file)?)
        } else {
            None
        };

        let body = self.parse_block(file)?;

        Ok(Function {
            visibility: Visibility::of(&name.text),
            name,
            params,
            return_type,
            body,
            is_method,
            doc,
        })
    }

    /// Try to read `(receiver: Type)` followed by a function name.
    ///
    /// On failure the cursor and error list are restored to where they
    /// were before the attempt.
    fn try_parse_receiver(&mut self, file: &mut SourceFile) -> Option<Param> {
        let checkpoint = self.pos;
        let error_count = self.errors.len();

        match self.parse_params(file) {
            Ok(mut params) if params.len() == 1 && self.check(TokenKind::Identifier) => {
                params.pop()
            }
            _ => {
                self.pos = checkpoint;
                self.errors.truncate(error_count);
                self.too_deep = false;
                None
            }
        }
    }

    /// Parse a parenthesized parameter list.
    fn parse_params(&mut self, file: &mut SourceFile) -> ParseResult<Vec<Param>> {
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();

        while !self.check(TokenKind::RParen) && !self.is_eof() {
            params.push(self.parse_param(file)?);
            if !self.check(TokenKind::Comma) {
                break;
            }
            self.advance();
        }

        self.expect(TokenKind::RParen)?;
        Ok(params)
    }

    /// Parse `name: Type [= default]`.
    fn parse_param(&mut self, file: &mut SourceFile) -> ParseResult<Param> {
        let name = self.expect_name("parameter name")?;
        self.expect(TokenKind::Colon)?;
        let ty = self.parse_type(file)?;

        let default = if self.check(TokenKind::Eq) {
            self.advance();
            Some(self.parse_expr(file)?)
        } else {
            None
        };

        Ok(Param {
            range: name.range.merge(self.previous_range()),
            name,
            ty,
            default,
        })
    }

    /// Parse `struct Name { field: Type, ... }`.
    fn parse_struct(&mut self, file: &mut SourceFile) -> ParseResult<StructDef> {
        let doc = self.peek_doc();
        self.expect(TokenKind::Struct)?;
        let name = self.expect_name("struct name")?;
        self.expect(TokenKind::LBrace)?;

        let mut fields = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_eof() {
            let field_name = self.expect_name("field name")?;
            self.expect(TokenKind::Colon)?;
            let ty = self.parse_type(file)?;
            fields.push(Field {
                range: field_name.range.merge(self.previous_range()),
                visibility: Visibility::of(&field_name.text),
                name: field_name,
                ty,
            });
            // Fields may be separated by commas, semicolons or line breaks
            if self.check(TokenKind::Comma) || self.check(TokenKind::Semicolon) {
                self.advance();
            } else if !self.check(TokenKind::RBrace) && !self.newline_before() {
                return Err(ParseError::expected_token(TokenKind::Comma, self.peek()));
            }
        }
        self.expect(TokenKind::RBrace)?;

        Ok(StructDef {
            visibility: Visibility::of(&name.text),
            name,
            fields,
            doc,
        })
    }

    /// Parse `import a.b.c`.
    fn parse_import(&mut self) -> ParseResult<Import> {
        self.expect(TokenKind::Import)?;
        let mut path = vec![self.expect_name("module name")?];
        while self.check(TokenKind::Dot) {
            self.advance();
            path.push(self.expect_name("module name")?);
        }
        Ok(Import { path })
    }

    /// Parse `if cond { } [else if ... | else { }]`.
    fn parse_if(&mut self, file: &mut SourceFile) -> ParseResult<IfStmt> {
        self.expect(TokenKind::If)?;
        let condition = self.parse_expr(file)?;
        let then_branch = self.parse_block(file)?;

        let else_branch = if self.check(TokenKind::Else) {
            self.advance();
            if self.check(TokenKind::If) {
                let start = self.peek().range;
                let nested = self.nested("if statement", |p| p.parse_if(file))?;
                let stmt = file.stmts.alloc(Stmt {
                    range: start.merge(self.previous_range()),
                    kind: StmtKind::If(nested),
                });
                Some(ElseBranch::If(stmt))
            } else {
                Some(ElseBranch::Block(self.parse_block(file)?))
            }
        } else {
            None
        };

        Ok(IfStmt {
            condition,
            then_branch,
            else_branch,
        })
    }

    // === Types ===

    /// Parse `Name [<T, ...>] [?]`.
    fn parse_type(&mut self, file: &mut SourceFile) -> ParseResult<TypeId> {
        let name = self.expect_name("type name")?;

        let mut ty = if self.check(TokenKind::Lt) {
            self.advance();
            let mut args = vec![self.nested("type", |p| p.parse_type(file))?];
            while self.check(TokenKind::Comma) {
                self.advance();
                args.push(self.nested("type", |p| p.parse_type(file))?);
            }
            self.expect(TokenKind::Gt)?;
            file.types.alloc(Type {
                range: name.range.merge(self.previous_range()),
                kind: TypeKind::Generic {
                    name: name.text,
                    args,
                },
            })
        } else {
            file.types.alloc(Type {
                range: name.range,
                kind: TypeKind::Named(name.text),
            })
        };

        if self.check(TokenKind::Question) {
            let end = self.advance().range;
            ty = file.types.alloc(Type {
                range: file.types[ty].range.merge(end),
                kind: TypeKind::Nullable(ty),
            });
        }

        Ok(ty)
    }

    // === Helpers ===

    /// Run `parse` one level deeper, failing once [`MAX_NESTING_DEPTH`]
    /// levels are open.
    fn nested<T>(
        &mut self,
        what: &str,
        parse: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            self.too_deep = true;
            return Err(ParseError::custom_with_hint(
                self.peek().range,
                format!("{} nested too deeply", what),
                format!("at most {} levels of nesting are supported", MAX_NESTING_DEPTH),
            ));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn peek(&self) -> &Token {
        &self.current().token
    }

    fn current(&self) -> &Lookahead {
        // The stream always ends with EOF and the cursor never passes it
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_doc(&self) -> Option<String> {
        self.current().doc.clone()
    }

    fn newline_before(&self) -> bool {
        self.current().newline_before
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn is_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Range> {
        if self.check(kind) {
            Ok(self.advance().range)
        } else {
            Err(ParseError::expected_token(kind, self.peek()))
        }
    }

    fn expect_name(&mut self, what: &'static str) -> ParseResult<Name> {
        if self.check(TokenKind::Identifier) {
            let token = self.advance();
            Ok(Name {
                text: token.lexeme,
                range: token.range,
            })
        } else {
            Err(ParseError::expected_identifier(self.peek(), what))
        }
    }

    fn previous_range(&self) -> Range {
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(la) => la.token.range,
            None => self.peek().range,
        }
    }

    /// Skip to a plausible statement boundary after an error.
    ///
    /// Stops before `{`, `}`, a statement keyword or EOF, and after `;`.
    /// If the failed rule consumed nothing, one token is skipped first so
    /// the caller always makes progress.
    fn synchronize(&mut self, started_at: usize) {
        if self.pos == started_at && !self.is_eof() {
            let skipped = self.advance();
            if skipped.kind == TokenKind::Semicolon {
                return;
            }
        }

        while !self.is_eof() {
            match self.peek().kind {
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::LBrace | TokenKind::RBrace => return,
                kind if kind.starts_statement() => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}

/// Strip comment markers from a doc comment.
fn clean_doc_comment(lexeme: &str) -> String {
    if let Some(line) = lexeme.strip_prefix("///") {
        return line.strip_prefix(' ').unwrap_or(line).trim_end().to_string();
    }

    let body = lexeme.strip_prefix("/**").unwrap_or(lexeme);
    let body = body.strip_suffix("*/").unwrap_or(body);
    let lines: Vec<&str> = body
        .lines()
        .map(|line| {
            let line = line.trim();
            let line = line.strip_prefix('*').unwrap_or(line);
            line.strip_prefix(' ').unwrap_or(line).trim_end()
        })
        .collect();

    let first = lines.iter().position(|l| !l.is_empty()).unwrap_or(lines.len());
    let last = lines.iter().rposition(|l| !l.is_empty()).map_or(first, |i| i + 1);
    lines[first..last].join("\n")
}

/// The result of parsing a token stream.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutput {
    /// The tree, possibly partial when errors were recovered from
    pub file: Option<SourceFile>,
    /// Syntax errors in source order
    pub errors: Vec<ParseError>,
}

impl ParseOutput {
    /// A tree was produced without any syntax error.
    pub fn is_ok(&self) -> bool {
        self.file.is_some() && self.errors.is_empty()
    }
}

/// Parse a lexed token stream.
pub fn parse(tokens: &[Token], keywords: &KeywordTable) -> ParseOutput {
    let mut parser = Parser::new(tokens, keywords);
    let (file, errors) = parser.parse_file();
    ParseOutput {
        file: Some(file),
        errors,
    }
}

/// A lexical or syntax error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyntaxError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl SyntaxError {
    pub fn range(&self) -> Range {
        match self {
            SyntaxError::Lex(e) => e.range(),
            SyntaxError::Parse(e) => e.range(),
        }
    }
}

/// The result of lexing and parsing a document.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSource {
    /// Every token, trivia included
    pub tokens: Vec<Token>,
    /// `None` when lexing failed, since parsing is then skipped
    pub file: Option<SourceFile>,
    pub errors: Vec<SyntaxError>,
}

impl ParsedSource {
    pub fn is_ok(&self) -> bool {
        self.file.is_some() && self.errors.is_empty()
    }

    /// The tree, only if the document had no errors at all.
    pub fn clean_file(&self) -> Option<&SourceFile> {
        if self.errors.is_empty() {
            self.file.as_ref()
        } else {
            None
        }
    }
}

/// Lex and parse source text. Lexical errors stop before parsing.
pub fn parse_source(source: &str, keywords: &KeywordTable) -> ParsedSource {
    parse_source_with_id(source, keywords, SourceId::default())
}

/// Like [`parse_source`], tagging every position with `source_id`.
pub fn parse_source_with_id(
    source: &str,
    keywords: &KeywordTable,
    source_id: SourceId,
) -> ParsedSource {
    let lexed = tokenize_with_id(source, keywords, source_id);
    if lexed.has_errors() {
        return ParsedSource {
            tokens: lexed.tokens,
            file: None,
            errors: lexed.errors.into_iter().map(SyntaxError::from).collect(),
        };
    }

    let output = parse(&lexed.tokens, keywords);
    ParsedSource {
        tokens: lexed.tokens,
        file: output.file,
        errors: output.errors.into_iter().map(SyntaxError::from).collect(),
    }
}
