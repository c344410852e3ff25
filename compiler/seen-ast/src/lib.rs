// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Abstract Syntax Tree definitions for the Seen programming language.
//!
//! Nodes live in per-file arenas and refer to each other through typed
//! indices, so a [`SourceFile`] exclusively owns its whole tree. Every
//! node carries the [`Range`] of the tokens it was parsed from, which the
//! language server uses to answer position queries.
//!
//! The tree covers:
//!
//! - Functions (including receiver methods), structs, imports
//! - `let`/`var` variables and `const` declarations
//! - Blocks and control flow (`if`, `while`, `for`, `loop`, `return`, ...)
//! - Expressions with member access, safe navigation, indexing and calls

pub mod span;

use la_arena::{Arena, Idx};
use smol_str::SmolStr;
use span::Range;

/// Interned string type for identifiers
pub type Ident = SmolStr;

/// Index into an expression arena
pub type ExprId = Idx<Expr>;

/// Index into a statement arena
pub type StmtId = Idx<Stmt>;

/// Index into a type arena
pub type TypeId = Idx<Type>;

/// A complete Seen source file
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    /// Range of the whole document
    pub range: Range,
    /// Top-level statements in source order
    pub body: Vec<StmtId>,
    /// Expression arena for this file
    pub exprs: Arena<Expr>,
    /// Statement arena
    pub stmts: Arena<Stmt>,
    /// Type arena
    pub types: Arena<Type>,
}

impl SourceFile {
    pub fn new() -> Self {
        Self {
            range: Range::default(),
            body: Vec::new(),
            exprs: Arena::new(),
            stmts: Arena::new(),
            types: Arena::new(),
        }
    }

    /// Render a type annotation back to source form.
    pub fn display_type(&self, ty: TypeId) -> String {
        match &self.types[ty].kind {
            TypeKind::Named(name) => name.to_string(),
            TypeKind::Nullable(inner) => format!("{}?", self.display_type(*inner)),
            TypeKind::Generic { name, args } => {
                let args: Vec<String> = args.iter().map(|a| self.display_type(*a)).collect();
                format!("{}<{}>", name, args.join(", "))
            }
        }
    }
}

impl Default for SourceFile {
    fn default() -> Self {
        Self::new()
    }
}

// === Visibility ===

/// Visibility of a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    /// Names starting with an uppercase letter are exported.
    pub fn of(name: &str) -> Self {
        match name.chars().next() {
            Some(c) if c.is_uppercase() => Visibility::Public,
            _ => Visibility::Private,
        }
    }

    pub fn is_public(self) -> bool {
        self == Visibility::Public
    }
}

/// An identifier together with the range it was written at.
#[derive(Debug, Clone, PartialEq)]
pub struct Name {
    pub text: Ident,
    pub range: Range,
}

// === Statements ===

/// A statement
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub range: Range,
    pub kind: StmtKind,
}

/// Statement kinds
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// Function declaration
    Function(Function),
    /// Struct declaration
    Struct(StructDef),
    /// `let` or `var` declaration
    Variable(VariableDecl),
    /// `const` declaration
    Const(ConstDecl),
    /// `import a.b.c`
    Import(Import),
    /// Nested block
    Block(Block),
    /// `if cond { } else { }`
    If(IfStmt),
    /// `while cond { }`
    While { condition: ExprId, body: Block },
    /// `for name in iterable { }`
    For {
        binding: Name,
        iterable: ExprId,
        body: Block,
    },
    /// `loop { }`
    Loop { body: Block },
    /// `return [value]`
    Return(Option<ExprId>),
    Break,
    Continue,
    /// Expression evaluated for its effect
    Expr(ExprId),
}

/// A function definition
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: Name,
    pub visibility: Visibility,
    /// Formal parameters; for methods the receiver comes first
    pub params: Vec<Param>,
    pub return_type: Option<TypeId>,
    pub body: Block,
    /// Declared with a `(receiver: Type)` prefix
    pub is_method: bool,
    pub doc: Option<String>,
}

/// A function parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub range: Range,
    pub name: Name,
    pub ty: TypeId,
    pub default: Option<ExprId>,
}

/// A struct definition
#[derive(Debug, Clone, PartialEq)]
pub struct StructDef {
    pub name: Name,
    pub visibility: Visibility,
    pub fields: Vec<Field>,
    pub doc: Option<String>,
}

/// A struct field
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub range: Range,
    pub name: Name,
    pub visibility: Visibility,
    pub ty: TypeId,
}

/// A `let` or `var` declaration
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    pub name: Name,
    pub visibility: Visibility,
    /// `var` bindings may be reassigned
    pub mutable: bool,
    pub ty: Option<TypeId>,
    pub init: Option<ExprId>,
    pub doc: Option<String>,
}

/// A `const` declaration
#[derive(Debug, Clone, PartialEq)]
pub struct ConstDecl {
    pub name: Name,
    pub visibility: Visibility,
    pub ty: Option<TypeId>,
    pub value: ExprId,
    pub doc: Option<String>,
}

/// An import path
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub path: Vec<Name>,
}

/// A braced sequence of statements
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub range: Range,
    pub stmts: Vec<StmtId>,
}

/// An `if` statement
#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: ExprId,
    pub then_branch: Block,
    pub else_branch: Option<ElseBranch>,
}

/// The `else` part of an `if`
#[derive(Debug, Clone, PartialEq)]
pub enum ElseBranch {
    /// `else if ...`, stored as a nested `If` statement
    If(StmtId),
    Block(Block),
}

// === Expressions ===

/// An expression
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub range: Range,
    pub kind: ExprKind,
}

/// Expression kinds
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    Ident(Ident),
    Binary {
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },
    /// `target op= value`
    Assign {
        op: AssignOp,
        target: ExprId,
        value: ExprId,
    },
    Call {
        callee: ExprId,
        args: Vec<ExprId>,
    },
    /// `object.member` or `object?.member`
    Member {
        object: ExprId,
        member: Name,
        safe: bool,
    },
    Index {
        object: ExprId,
        index: ExprId,
    },
    /// `expr!!`
    NotNull(ExprId),
    Array(Vec<ExprId>),
    /// `start..end` or `start..<end`
    Range {
        start: ExprId,
        end: ExprId,
        inclusive: bool,
    },
}

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    UInt(u64),
    Float(f64),
    String(SmolStr),
    Char(char),
    Bool(bool),
    Null,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// `<=>`
    Cmp,
    And,
    Or,
    /// `?:`
    Elvis,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Pow => "**",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Cmp => "<=>",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Elvis => "?:",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `!x` or `not x`
    Not,
    Neg,
    Plus,
}

/// Assignment operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

// === Types ===

/// A type annotation
#[derive(Debug, Clone, PartialEq)]
pub struct Type {
    pub range: Range,
    pub kind: TypeKind,
}

/// Type annotation kinds
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    /// `Int`, `String`, `Point`
    Named(Ident),
    /// `T?`
    Nullable(TypeId),
    /// `List<T>`
    Generic { name: Ident, args: Vec<TypeId> },
}
