// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Lexer for the Seen programming language.
//!
//! This crate provides lexical analysis for Seen source code,
//! converting a string of characters into a stream of tokens.
//! The lexer handles:
//!
//! - Keywords, looked up in a per-language [`KeywordTable`]
//! - Numeric literals with type suffixes (e.g., `10u`, `3L`, `2.5f`)
//! - String literals (including `"""` multi-line strings) and character literals
//! - Operators and punctuation, longest match first
//! - Comments, doc comments, whitespace and newlines
//!
//! Nothing is skipped: concatenating the lexemes of all tokens yields the
//! original source. Errors are collected while scanning carries on.

pub mod keywords;

pub use keywords::{KeywordError, KeywordTable, LanguageInfo};

use seen_ast::span::{Position, Range, SourceId};
use seen_ast::Literal;
use smol_str::SmolStr;
use thiserror::Error;

/// A token with its lexeme and range in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of this token.
    pub kind: TokenKind,
    /// The exact source text of this token.
    pub lexeme: SmolStr,
    /// The source range of this token.
    pub range: Range,
}

impl Token {
    /// Create a new token.
    pub fn new(kind: TokenKind, lexeme: impl Into<SmolStr>, range: Range) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            range,
        }
    }

    /// Whitespace, newlines and comments.
    pub fn is_trivia(&self) -> bool {
        self.kind.is_trivia()
    }
}

/// Token kinds produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // === Keywords ===
    /// `let`
    Let,
    /// `var`
    Var,
    /// `const`
    Const,
    /// `fun`
    Fun,
    /// `struct`
    Struct,
    /// `class`
    Class,
    /// `interface`
    Interface,
    /// `enum`
    Enum,
    /// `if`
    If,
    /// `else`
    Else,
    /// `match`
    Match,
    /// `for`
    For,
    /// `while`
    While,
    /// `loop`
    Loop,
    /// `break`
    Break,
    /// `continue`
    Continue,
    /// `return`
    Return,
    /// `and`
    And,
    /// `or`
    Or,
    /// `not`
    Not,
    /// `is`
    Is,
    /// `in`
    In,
    /// `as`
    As,
    /// `try`
    Try,
    /// `catch`
    Catch,
    /// `throw`
    Throw,
    /// `async`
    Async,
    /// `await`
    Await,
    /// `yield`
    Yield,
    /// `import`
    Import,
    /// `export`
    Export,
    /// `module`
    Module,
    /// `use`
    Use,
    /// `move`
    Move,
    /// `borrow`
    Borrow,
    /// `mut`
    Mut,
    /// `comptime`
    Comptime,
    /// `effect`
    Effect,
    /// `react`
    React,
    /// `observe`
    Observe,
    /// `subscribe`
    Subscribe,

    // === Literals ===
    /// Integer literal, optionally suffixed with `u`, `uL` or `L`
    IntLiteral,
    /// Floating-point literal
    FloatLiteral,
    /// String literal
    StringLiteral,
    /// Character literal
    CharLiteral,
    /// `true` or `false`, in the active language
    BoolLiteral,
    /// `null`, in the active language
    NullLiteral,

    /// Identifier
    Identifier,

    // === Arithmetic ===
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `**`
    StarStar,
    /// `++`
    PlusPlus,
    /// `--`
    MinusMinus,

    // === Assignment ===
    /// `=`
    Eq,
    /// `+=`
    PlusEq,
    /// `-=`
    MinusEq,
    /// `*=`
    StarEq,
    /// `/=`
    SlashEq,
    /// `%=`
    PercentEq,

    // === Comparison ===
    /// `==`
    EqEq,
    /// `!=`
    BangEq,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<=>`
    Spaceship,

    // === Nullability and ranges ===
    /// `?`
    Question,
    /// `?.`
    QuestionDot,
    /// `?:`
    Elvis,
    /// `!`
    Bang,
    /// `!!`
    BangBang,
    /// `..`
    DotDot,
    /// `..<`
    DotDotLt,

    // === Arrows and paths ===
    /// `|>`
    PipeGt,
    /// `->`
    Arrow,
    /// `=>`
    FatArrow,
    /// `::`
    ColonColon,

    // === Punctuation ===
    /// `.`
    Dot,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `:`
    Colon,
    /// `@`
    At,
    /// `#`
    Hash,
    /// `$`
    Dollar,

    // === Delimiters ===
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,

    // === Trivia ===
    /// `// ...` or `/* ... */`
    Comment,
    /// `/// ...` or `/** ... */`
    DocComment,
    /// A single `\n`
    Newline,
    /// Spaces, tabs, carriage returns
    Whitespace,

    // === Special ===
    /// End of file
    Eof,

    /// A character no rule accepts
    Invalid,
}

impl TokenKind {
    /// Every keyword kind, in declaration order.
    pub const KEYWORDS: &'static [TokenKind] = &[
        TokenKind::Let,
        TokenKind::Var,
        TokenKind::Const,
        TokenKind::Fun,
        TokenKind::Struct,
        TokenKind::Class,
        TokenKind::Interface,
        TokenKind::Enum,
        TokenKind::If,
        TokenKind::Else,
        TokenKind::Match,
        TokenKind::For,
        TokenKind::While,
        TokenKind::Loop,
        TokenKind::Break,
        TokenKind::Continue,
        TokenKind::Return,
        TokenKind::And,
        TokenKind::Or,
        TokenKind::Not,
        TokenKind::Is,
        TokenKind::In,
        TokenKind::As,
        TokenKind::Try,
        TokenKind::Catch,
        TokenKind::Throw,
        TokenKind::Async,
        TokenKind::Await,
        TokenKind::Yield,
        TokenKind::Import,
        TokenKind::Export,
        TokenKind::Module,
        TokenKind::Use,
        TokenKind::Move,
        TokenKind::Borrow,
        TokenKind::Mut,
        TokenKind::Comptime,
        TokenKind::Effect,
        TokenKind::React,
        TokenKind::Observe,
        TokenKind::Subscribe,
    ];

    /// Resolve a canonical keyword name as used on the left-hand side of
    /// a language file.
    pub fn from_canonical(name: &str) -> Option<TokenKind> {
        match name {
            "true" | "false" => Some(TokenKind::BoolLiteral),
            "null" => Some(TokenKind::NullLiteral),
            _ => Self::KEYWORDS
                .iter()
                .copied()
                .find(|kind| kind.canonical_name() == Some(name)),
        }
    }

    /// The canonical (English) name of a keyword kind.
    pub fn canonical_name(self) -> Option<&'static str> {
        let name = match self {
            TokenKind::Let => "let",
            TokenKind::Var => "var",
            TokenKind::Const => "const",
            TokenKind::Fun => "fun",
            TokenKind::Struct => "struct",
            TokenKind::Class => "class",
            TokenKind::Interface => "interface",
            TokenKind::Enum => "enum",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::Match => "match",
            TokenKind::For => "for",
            TokenKind::While => "while",
            TokenKind::Loop => "loop",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::Return => "return",
            TokenKind::And => "and",
            TokenKind::Or => "or",
            TokenKind::Not => "not",
            TokenKind::Is => "is",
            TokenKind::In => "in",
            TokenKind::As => "as",
            TokenKind::Try => "try",
            TokenKind::Catch => "catch",
            TokenKind::Throw => "throw",
            TokenKind::Async => "async",
            TokenKind::Await => "await",
            TokenKind::Yield => "yield",
            TokenKind::Import => "import",
            TokenKind::Export => "export",
            TokenKind::Module => "module",
            TokenKind::Use => "use",
            TokenKind::Move => "move",
            TokenKind::Borrow => "borrow",
            TokenKind::Mut => "mut",
            TokenKind::Comptime => "comptime",
            TokenKind::Effect => "effect",
            TokenKind::React => "react",
            TokenKind::Observe => "observe",
            TokenKind::Subscribe => "subscribe",
            _ => return None,
        };
        Some(name)
    }

    pub fn is_keyword(self) -> bool {
        self.canonical_name().is_some()
    }

    /// Tokens the parser never sees.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::Newline | TokenKind::Comment | TokenKind::DocComment
        )
    }

    /// Keywords that begin a statement; used as recovery points.
    pub fn starts_statement(self) -> bool {
        matches!(
            self,
            TokenKind::Let
                | TokenKind::Var
                | TokenKind::Const
                | TokenKind::Fun
                | TokenKind::Struct
                | TokenKind::If
                | TokenKind::While
                | TokenKind::For
                | TokenKind::Loop
                | TokenKind::Return
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Import
        )
    }

    /// Short human-readable description for diagnostics.
    pub fn describe(self) -> &'static str {
        if let Some(name) = self.canonical_name() {
            return name;
        }
        match self {
            TokenKind::IntLiteral => "integer literal",
            TokenKind::FloatLiteral => "float literal",
            TokenKind::StringLiteral => "string literal",
            TokenKind::CharLiteral => "character literal",
            TokenKind::BoolLiteral => "boolean literal",
            TokenKind::NullLiteral => "null",
            TokenKind::Identifier => "identifier",
            TokenKind::Plus => "`+`",
            TokenKind::Minus => "`-`",
            TokenKind::Star => "`*`",
            TokenKind::Slash => "`/`",
            TokenKind::Percent => "`%`",
            TokenKind::StarStar => "`**`",
            TokenKind::PlusPlus => "`++`",
            TokenKind::MinusMinus => "`--`",
            TokenKind::Eq => "`=`",
            TokenKind::PlusEq => "`+=`",
            TokenKind::MinusEq => "`-=`",
            TokenKind::StarEq => "`*=`",
            TokenKind::SlashEq => "`/=`",
            TokenKind::PercentEq => "`%=`",
            TokenKind::EqEq => "`==`",
            TokenKind::BangEq => "`!=`",
            TokenKind::Lt => "`<`",
            TokenKind::Le => "`<=`",
            TokenKind::Gt => "`>`",
            TokenKind::Ge => "`>=`",
            TokenKind::Spaceship => "`<=>`",
            TokenKind::Question => "`?`",
            TokenKind::QuestionDot => "`?.`",
            TokenKind::Elvis => "`?:`",
            TokenKind::Bang => "`!`",
            TokenKind::BangBang => "`!!`",
            TokenKind::DotDot => "`..`",
            TokenKind::DotDotLt => "`..<`",
            TokenKind::PipeGt => "`|>`",
            TokenKind::Arrow => "`->`",
            TokenKind::FatArrow => "`=>`",
            TokenKind::ColonColon => "`::`",
            TokenKind::Dot => "`.`",
            TokenKind::Comma => "`,`",
            TokenKind::Semicolon => "`;`",
            TokenKind::Colon => "`:`",
            TokenKind::At => "`@`",
            TokenKind::Hash => "`#`",
            TokenKind::Dollar => "`$`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::Comment => "comment",
            TokenKind::DocComment => "doc comment",
            TokenKind::Newline => "newline",
            TokenKind::Whitespace => "whitespace",
            TokenKind::Eof => "end of file",
            _ => "invalid token",
        }
    }
}

/// Lexical errors. Each is recorded and scanning continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unexpected character '{ch}'")]
    UnexpectedChar { ch: char, range: Range },

    #[error("unterminated string literal")]
    UnterminatedString { range: Range },

    #[error("unterminated character literal")]
    UnterminatedChar { range: Range },

    #[error("unterminated block comment")]
    UnterminatedComment { range: Range },
}

impl LexError {
    /// Get the source range of this error.
    pub fn range(&self) -> Range {
        match self {
            LexError::UnexpectedChar { range, .. }
            | LexError::UnterminatedString { range }
            | LexError::UnterminatedChar { range }
            | LexError::UnterminatedComment { range } => *range,
        }
    }
}

/// A hand-written lexer over Seen source text.
pub struct Lexer<'src> {
    source: &'src str,
    keywords: &'src KeywordTable,
    offset: usize,
    line: u32,
    column: u32,
    source_id: SourceId,
    errors: Vec<LexError>,
    finished: bool,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source code.
    pub fn new(source: &'src str, keywords: &'src KeywordTable) -> Self {
        Self {
            source,
            keywords,
            offset: 0,
            line: 0,
            column: 0,
            source_id: SourceId::default(),
            errors: Vec::new(),
            finished: false,
        }
    }

    /// Tag every produced position with a document id.
    pub fn with_source_id(mut self, source_id: SourceId) -> Self {
        self.source_id = source_id;
        self
    }

    /// Errors found so far.
    pub fn errors(&self) -> &[LexError] {
        &self.errors
    }

    /// Consume the lexer, returning its errors.
    pub fn into_errors(self) -> Vec<LexError> {
        self.errors
    }

    /// Scan the next token. After the input is exhausted this keeps
    /// returning an empty EOF token.
    pub fn next_token(&mut self) -> Token {
        let start = self.here();
        let Some(c) = self.peek() else {
            self.finished = true;
            return Token::new(TokenKind::Eof, "", Range::empty(start));
        };

        let kind = match c {
            '\n' => {
                self.bump();
                TokenKind::Newline
            }
            c if c.is_whitespace() => {
                self.eat_while(|c| c.is_whitespace() && c != '\n');
                TokenKind::Whitespace
            }
            c if c.is_alphabetic() || c == '_' => self.identifier(),
            c if c.is_ascii_digit() => self.number(),
            '.' if self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) => self.number(),
            '"' => self.string(start),
            '\'' => self.quote(start),
            '/' if matches!(self.peek_nth(1), Some('/') | Some('*')) => self.comment(start),
            c => self.operator(c, start),
        };

        let end = self.here();
        Token::new(kind, &self.source[start.offset as usize..end.offset as usize], Range::new(start, end))
    }

    fn here(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
            offset: self.offset as u32,
            source: self.source_id,
        }
    }

    fn rest(&self) -> &'src str {
        &self.source[self.offset..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += c.len_utf16() as u32;
        }
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn eat_while(&mut self, mut pred: impl FnMut(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.bump();
        }
    }

    fn error_since(&mut self, start: Position, make: impl FnOnce(Range) -> LexError) {
        let range = Range::new(start, self.here());
        self.errors.push(make(range));
    }

    fn identifier(&mut self) -> TokenKind {
        let begin = self.offset;
        self.eat_while(|c| c.is_alphanumeric() || c == '_');
        self.keywords.classify(&self.source[begin..self.offset])
    }

    fn number(&mut self) -> TokenKind {
        let mut is_float = false;

        if self.eat('.') {
            is_float = true;
        }
        self.eat_digits();

        if !is_float
            && self.peek() == Some('.')
            && self.peek_nth(1).is_some_and(|c| c.is_ascii_digit())
        {
            self.bump();
            self.eat_digits();
            is_float = true;
        }

        if matches!(self.peek(), Some('e') | Some('E')) {
            let digit_follows = match self.peek_nth(1) {
                Some('+') | Some('-') => self.peek_nth(2).is_some_and(|c| c.is_ascii_digit()),
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            if digit_follows {
                self.bump();
                if matches!(self.peek(), Some('+') | Some('-')) {
                    self.bump();
                }
                self.eat_digits();
                is_float = true;
            }
        }

        match self.peek() {
            Some('u') | Some('U') => {
                self.bump();
                if matches!(self.peek(), Some('L') | Some('l')) {
                    self.bump();
                }
            }
            Some('L') | Some('l') => {
                self.bump();
            }
            Some('f') | Some('F') => {
                self.bump();
                is_float = true;
            }
            _ => {}
        }

        if is_float {
            TokenKind::FloatLiteral
        } else {
            TokenKind::IntLiteral
        }
    }

    fn eat_digits(&mut self) {
        self.eat_while(|c| c.is_ascii_digit() || c == '_');
    }

    fn string(&mut self, start: Position) -> TokenKind {
        if self.rest().starts_with("\"\"\"") {
            for _ in 0..3 {
                self.bump();
            }
            loop {
                if self.rest().starts_with("\"\"\"") {
                    for _ in 0..3 {
                        self.bump();
                    }
                    return TokenKind::StringLiteral;
                }
                match self.bump() {
                    Some('\\') => {
                        self.bump();
                    }
                    Some(_) => {}
                    None => {
                        self.error_since(start, |range| LexError::UnterminatedString { range });
                        return TokenKind::StringLiteral;
                    }
                }
            }
        }

        self.bump();
        self.quoted_body(start, '"')
    }

    /// Scan up to and including the closing `quote`.
    fn quoted_body(&mut self, start: Position, quote: char) -> TokenKind {
        loop {
            match self.bump() {
                Some('\\') => {
                    self.bump();
                }
                Some(c) if c == quote => return TokenKind::StringLiteral,
                Some(_) => {}
                None => {
                    self.error_since(start, |range| LexError::UnterminatedString { range });
                    return TokenKind::StringLiteral;
                }
            }
        }
    }

    /// A `'` starts a character literal when one (possibly escaped)
    /// character and a closing quote follow; otherwise it starts a
    /// single-quoted string if the line contains a closing quote.
    fn quote(&mut self, start: Position) -> TokenKind {
        let rest = self.rest();
        let mut chars = rest.chars().skip(1);
        let is_char = match chars.next() {
            Some('\\') => chars.nth(1) == Some('\''),
            Some('\'') | Some('\n') | None => false,
            Some(_) => chars.next() == Some('\''),
        };

        if is_char {
            self.bump();
            if self.bump() == Some('\\') {
                self.bump();
            }
            self.bump();
            return TokenKind::CharLiteral;
        }

        let line = rest[1..].split('\n').next().unwrap_or("");
        if has_unescaped(line, '\'') {
            self.bump();
            return self.quoted_body(start, '\'');
        }

        self.bump();
        match self.peek() {
            Some('\\') => {
                self.bump();
                if self.peek().is_some_and(|c| c != '\n') {
                    self.bump();
                }
            }
            Some(c) if c != '\n' => {
                self.bump();
            }
            _ => {}
        }
        self.error_since(start, |range| LexError::UnterminatedChar { range });
        TokenKind::CharLiteral
    }

    fn comment(&mut self, start: Position) -> TokenKind {
        let rest = self.rest();
        if rest.starts_with("//") {
            let is_doc = rest.starts_with("///") && !rest.starts_with("////");
            self.eat_while(|c| c != '\n');
            return if is_doc {
                TokenKind::DocComment
            } else {
                TokenKind::Comment
            };
        }

        let is_doc = rest.starts_with("/**") && !rest.starts_with("/**/");
        self.bump();
        self.bump();
        loop {
            if self.rest().starts_with("*/") {
                self.bump();
                self.bump();
                break;
            }
            if self.bump().is_none() {
                self.error_since(start, |range| LexError::UnterminatedComment { range });
                break;
            }
        }
        if is_doc {
            TokenKind::DocComment
        } else {
            TokenKind::Comment
        }
    }

    fn operator(&mut self, c: char, start: Position) -> TokenKind {
        self.bump();
        match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '@' => TokenKind::At,
            '#' => TokenKind::Hash,
            '$' => TokenKind::Dollar,
            '+' => {
                if self.eat('+') {
                    TokenKind::PlusPlus
                } else if self.eat('=') {
                    TokenKind::PlusEq
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.eat('-') {
                    TokenKind::MinusMinus
                } else if self.eat('=') {
                    TokenKind::MinusEq
                } else if self.eat('>') {
                    TokenKind::Arrow
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                if self.eat('*') {
                    TokenKind::StarStar
                } else if self.eat('=') {
                    TokenKind::StarEq
                } else {
                    TokenKind::Star
                }
            }
            '/' => {
                if self.eat('=') {
                    TokenKind::SlashEq
                } else {
                    TokenKind::Slash
                }
            }
            '%' => {
                if self.eat('=') {
                    TokenKind::PercentEq
                } else {
                    TokenKind::Percent
                }
            }
            '=' => {
                if self.eat('=') {
                    TokenKind::EqEq
                } else if self.eat('>') {
                    TokenKind::FatArrow
                } else {
                    TokenKind::Eq
                }
            }
            '!' => {
                if self.eat('!') {
                    TokenKind::BangBang
                } else if self.eat('=') {
                    TokenKind::BangEq
                } else {
                    TokenKind::Bang
                }
            }
            '<' => {
                if self.eat('=') {
                    if self.eat('>') {
                        TokenKind::Spaceship
                    } else {
                        TokenKind::Le
                    }
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.eat('=') {
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            '?' => {
                if self.eat('.') {
                    TokenKind::QuestionDot
                } else if self.eat(':') {
                    TokenKind::Elvis
                } else {
                    TokenKind::Question
                }
            }
            ':' => {
                if self.eat(':') {
                    TokenKind::ColonColon
                } else {
                    TokenKind::Colon
                }
            }
            '.' => {
                if self.eat('.') {
                    if self.eat('<') {
                        TokenKind::DotDotLt
                    } else {
                        TokenKind::DotDot
                    }
                } else {
                    TokenKind::Dot
                }
            }
            '|' => {
                if self.eat('>') {
                    TokenKind::PipeGt
                } else {
                    self.invalid(c, start)
                }
            }
            other => self.invalid(other, start),
        }
    }
}

impl Lexer<'_> {
    fn invalid(&mut self, ch: char, start: Position) -> TokenKind {
        self.error_since(start, |range| LexError::UnexpectedChar { ch, range });
        TokenKind::Invalid
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        if matches!(token.kind, TokenKind::Eof) {
            None
        } else {
            Some(token)
        }
    }
}

fn has_unescaped(text: &str, quote: char) -> bool {
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            chars.next();
        } else if c == quote {
            return true;
        }
    }
    false
}

/// The result of lexing a whole document.
#[derive(Debug, Clone, PartialEq)]
pub struct LexOutput {
    /// All tokens, trivia included, ending with [`TokenKind::Eof`].
    pub tokens: Vec<Token>,
    /// Errors in source order.
    pub errors: Vec<LexError>,
}

impl LexOutput {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Tokenize a source string into a vector of tokens terminated by EOF.
pub fn tokenize(source: &str, keywords: &KeywordTable) -> LexOutput {
    tokenize_with_id(source, keywords, SourceId::default())
}

/// Like [`tokenize`], tagging positions with `source_id`.
pub fn tokenize_with_id(source: &str, keywords: &KeywordTable, source_id: SourceId) -> LexOutput {
    let mut lexer = Lexer::new(source, keywords).with_source_id(source_id);
    let mut tokens = Vec::new();

    loop {
        let token = lexer.next_token();
        let is_eof = matches!(token.kind, TokenKind::Eof);
        tokens.push(token);
        if is_eof {
            break;
        }
    }

    LexOutput {
        tokens,
        errors: lexer.into_errors(),
    }
}

/// Decode the value of a literal token.
///
/// Returns `None` for non-literal tokens and for integers that do not fit
/// their type. Boolean spellings are resolved through `keywords`.
pub fn literal_value(token: &Token, keywords: &KeywordTable) -> Option<Literal> {
    let text = token.lexeme.as_str();
    match token.kind {
        TokenKind::IntLiteral => parse_int(text),
        TokenKind::FloatLiteral => parse_float(text).map(Literal::Float),
        TokenKind::StringLiteral => Some(Literal::String(parse_string(text))),
        TokenKind::CharLiteral => parse_char(text).map(Literal::Char),
        TokenKind::BoolLiteral => keywords.bool_value(text).map(Literal::Bool),
        TokenKind::NullLiteral => Some(Literal::Null),
        _ => None,
    }
}

/// Parses an integer literal, removing underscores and the type suffix.
fn parse_int(s: &str) -> Option<Literal> {
    let digits: String = s.chars().filter(|c| *c != '_').collect();
    let lower = digits.to_ascii_lowercase();
    if let Some(body) = lower.strip_suffix("ul").or_else(|| lower.strip_suffix('u')) {
        return body.parse().ok().map(Literal::UInt);
    }
    let body = lower.strip_suffix('l').unwrap_or(&lower);
    body.parse().ok().map(Literal::Int)
}

/// Parses a floating-point literal, removing underscores and the `f` suffix.
fn parse_float(s: &str) -> Option<f64> {
    let digits: String = s.chars().filter(|c| *c != '_').collect();
    let body = digits.strip_suffix(['f', 'F']).unwrap_or(&digits);
    body.parse().ok()
}

/// Parses a string literal, processing escape sequences. Unknown escapes
/// keep both characters. An unterminated literal decodes to the end.
fn parse_string(s: &str) -> SmolStr {
    let (body, close) = if let Some(body) = s.strip_prefix("\"\"\"") {
        (body, "\"\"\"")
    } else if let Some(body) = s.strip_prefix('\'') {
        (body, "'")
    } else {
        (s.strip_prefix('"').unwrap_or(s), "\"")
    };

    let mut result = String::with_capacity(body.len());
    let mut chars = body.char_indices();

    while let Some((i, c)) = chars.next() {
        if body[i..].starts_with(close) {
            break;
        }
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next().map(|(_, c)| c) {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            Some('\'') => result.push('\''),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }

    SmolStr::new(&result)
}

/// Parses a character literal, processing escape sequences.
fn parse_char(s: &str) -> Option<char> {
    let mut chars = s.strip_prefix('\'')?.chars();
    match chars.next()? {
        '\\' => Some(match chars.next()? {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            other => other,
        }),
        c => Some(c),
    }
}
