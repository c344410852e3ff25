// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Symbol collection and position queries for LSP features.
//!
//! Each document gets one flat [`SymbolTable`]. Its parent is the shared
//! table of built-ins, so name lookups fall back to `Int`, `print` and the
//! other predefined names.

use seen_ast::span::{Position, Range};
use seen_ast::{
    Block, ElseBranch, ExprId, ExprKind, Ident, SourceFile, StmtId, StmtKind, TypeId, TypeKind,
};
use smol_str::SmolStr;
use std::rc::Rc;

/// Module name given to predefined symbols.
pub const BUILTIN_MODULE: &str = "builtin";

/// Documentation shown when a symbol has none.
pub const NO_DOCUMENTATION: &str = "No documentation available.";

/// A named declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: Ident,
    pub kind: SymbolKind,
    /// Range of the whole declaration
    pub range: Range,
    /// Range of the declared name
    pub name_range: Range,
    /// Statement that declares the symbol; `None` for built-ins
    pub definition: Option<StmtId>,
    /// Doc comment text
    pub documentation: Option<String>,
    /// Short type description shown in hovers and completions
    pub type_name: String,
    pub is_public: bool,
    /// Table the symbol was collected into
    pub module: SmolStr,
}

impl Symbol {
    pub fn is_builtin(&self) -> bool {
        self.definition.is_none()
    }

    /// Documentation text, or the fallback when there is none.
    pub fn documentation_or_default(&self) -> &str {
        self.documentation.as_deref().unwrap_or(NO_DOCUMENTATION)
    }
}

/// Kind of symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Function,
    Variable,
    Constant,
    Struct,
    Parameter,
    Field,
    BuiltinType,
}

/// An identifier found under a cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierHit {
    pub name: Ident,
    pub range: Range,
}

/// Symbols declared in one scope, with an optional enclosing table.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    scope_name: SmolStr,
    symbols: Vec<Symbol>,
    parent: Option<Rc<SymbolTable>>,
}

impl SymbolTable {
    /// Create an empty table.
    pub fn new(scope_name: impl Into<SmolStr>, parent: Option<Rc<SymbolTable>>) -> Self {
        Self {
            scope_name: scope_name.into(),
            symbols: Vec::new(),
            parent,
        }
    }

    /// The global table of predefined types and functions.
    pub fn builtins() -> Self {
        let mut table = Self::new(BUILTIN_MODULE, None);

        let types = [
            ("Int", "Signed 64-bit integer."),
            ("String", "Immutable UTF-8 text."),
            ("Bool", "Either `true` or `false`."),
            ("Float", "64-bit floating point number."),
        ];
        for (name, doc) in types {
            table.define_builtin(name, SymbolKind::BuiltinType, name, doc);
        }

        table.define_builtin(
            "print",
            SymbolKind::Function,
            "Void",
            "Writes a value to standard output.",
        );
        table.define_builtin(
            "println",
            SymbolKind::Function,
            "Void",
            "Writes a value to standard output, followed by a newline.",
        );

        table
    }

    fn define_builtin(&mut self, name: &str, kind: SymbolKind, type_name: &str, doc: &str) {
        let symbol = Symbol {
            name: SmolStr::new(name),
            kind,
            range: Range::default(),
            name_range: Range::default(),
            definition: None,
            documentation: Some(doc.to_string()),
            type_name: type_name.to_string(),
            is_public: true,
            module: self.scope_name.clone(),
        };
        self.define_symbol(symbol);
    }

    /// Collect every declaration in a source file.
    pub fn build(file: &SourceFile, scope_name: &str, parent: Option<Rc<SymbolTable>>) -> Self {
        let mut table = Self::new(scope_name, parent);
        for &stmt in &file.body {
            table.collect_stmt(file, stmt);
        }
        table
    }

    /// Add a symbol to this table.
    pub fn define_symbol(&mut self, symbol: Symbol) {
        self.symbols.push(symbol);
    }

    /// A symbol declared at `name`; callers fill in the descriptive fields.
    fn declared(
        &self,
        name: &seen_ast::Name,
        kind: SymbolKind,
        range: Range,
        definition: StmtId,
    ) -> Symbol {
        Symbol {
            name: name.text.clone(),
            kind,
            range,
            name_range: name.range,
            definition: Some(definition),
            documentation: None,
            type_name: String::new(),
            is_public: false,
            module: self.scope_name.clone(),
        }
    }

    fn collect_stmt(&mut self, file: &SourceFile, id: StmtId) {
        let stmt = &file.stmts[id];

        match &stmt.kind {
            StmtKind::Function(func) => {
                let type_name = match func.return_type {
                    Some(ty) => match &file.types[ty].kind {
                        TypeKind::Named(name) => name.to_string(),
                        _ => "Complex Type".to_string(),
                    },
                    None => "Void".to_string(),
                };
                let symbol = Symbol {
                    type_name,
                    is_public: func.visibility.is_public(),
                    documentation: func.doc.clone(),
                    ..self.declared(&func.name, SymbolKind::Function, stmt.range, id)
                };
                self.define_symbol(symbol);

                for param in &func.params {
                    let type_name = match &file.types[param.ty].kind {
                        TypeKind::Named(name) => name.to_string(),
                        _ => "Unknown".to_string(),
                    };
                    let symbol = Symbol {
                        type_name,
                        ..self.declared(&param.name, SymbolKind::Parameter, param.range, id)
                    };
                    self.define_symbol(symbol);
                }

                self.collect_block(file, &func.body);
            }
            StmtKind::Struct(def) => {
                let symbol = Symbol {
                    type_name: "struct".to_string(),
                    is_public: def.visibility.is_public(),
                    documentation: def.doc.clone(),
                    ..self.declared(&def.name, SymbolKind::Struct, stmt.range, id)
                };
                self.define_symbol(symbol);

                for field in &def.fields {
                    let symbol = Symbol {
                        type_name: file.display_type(field.ty),
                        is_public: field.visibility.is_public(),
                        ..self.declared(&field.name, SymbolKind::Field, field.range, id)
                    };
                    self.define_symbol(symbol);
                }
            }
            StmtKind::Variable(var) => {
                let type_name = match var.ty {
                    Some(ty) => variable_type_name(file, ty),
                    None => "Inferred".to_string(),
                };
                let symbol = Symbol {
                    type_name,
                    is_public: var.visibility.is_public(),
                    documentation: var.doc.clone(),
                    ..self.declared(&var.name, SymbolKind::Variable, stmt.range, id)
                };
                self.define_symbol(symbol);
            }
            StmtKind::Const(decl) => {
                let symbol = Symbol {
                    type_name: "Const".to_string(),
                    is_public: decl.visibility.is_public(),
                    documentation: decl.doc.clone(),
                    ..self.declared(&decl.name, SymbolKind::Constant, stmt.range, id)
                };
                self.define_symbol(symbol);
            }
            StmtKind::Block(block) => self.collect_block(file, block),
            StmtKind::If(if_stmt) => {
                self.collect_block(file, &if_stmt.then_branch);
                match &if_stmt.else_branch {
                    Some(ElseBranch::If(nested)) => self.collect_stmt(file, *nested),
                    Some(ElseBranch::Block(block)) => self.collect_block(file, block),
                    None => {}
                }
            }
            StmtKind::While { body, .. } | StmtKind::Loop { body } => {
                self.collect_block(file, body)
            }
            StmtKind::For { binding, body, .. } => {
                let symbol = Symbol {
                    type_name: "Inferred".to_string(),
                    ..self.declared(binding, SymbolKind::Variable, binding.range, id)
                };
                self.define_symbol(symbol);
                self.collect_block(file, body);
            }
            StmtKind::Import(_)
            | StmtKind::Return(_)
            | StmtKind::Break
            | StmtKind::Continue
            | StmtKind::Expr(_) => {}
        }
    }

    fn collect_block(&mut self, file: &SourceFile, block: &Block) {
        for &stmt in &block.stmts {
            self.collect_stmt(file, stmt);
        }
    }

    /// Name of the scope this table covers.
    pub fn scope_name(&self) -> &str {
        &self.scope_name
    }

    /// Symbols of this table, in declaration order.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn parent(&self) -> Option<&SymbolTable> {
        self.parent.as_deref()
    }

    /// Find a symbol declared in this table.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.name == name)
    }

    /// Find a symbol in this table or any enclosing one.
    pub fn lookup_global(&self, name: &str) -> Option<&Symbol> {
        self.lookup(name)
            .or_else(|| self.parent().and_then(|p| p.lookup_global(name)))
    }

    /// Find the symbol whose declaration covers `pos`.
    ///
    /// A symbol whose name is under the cursor wins; otherwise the
    /// narrowest enclosing declaration does. Built-ins have no location
    /// and never match.
    pub fn find_symbol_at_position(&self, pos: Position) -> Option<&Symbol> {
        let located = || self.symbols.iter().filter(|s| !s.is_builtin());

        located()
            .find(|s| s.name_range.contains(pos))
            .or_else(|| {
                located()
                    .filter(|s| s.range.contains(pos))
                    .min_by_key(|s| range_size(s.range))
            })
            .or_else(|| self.parent().and_then(|p| p.find_symbol_at_position(pos)))
    }

    /// Resolve an identifier to its symbol.
    ///
    /// A declaration name resolves to the symbol it declares; any other
    /// use resolves by name through the table chain.
    pub fn resolve(&self, hit: &IdentifierHit) -> Option<&Symbol> {
        self.symbols
            .iter()
            .find(|s| s.name_range == hit.range && s.name == hit.name)
            .or_else(|| self.lookup_global(&hit.name))
    }

    /// Symbols to offer for completion: everything in this table plus the
    /// public symbols of each enclosing table.
    pub fn completions(&self) -> Vec<&Symbol> {
        let mut items: Vec<&Symbol> = self.symbols.iter().collect();
        let mut ancestor = self.parent();
        while let Some(table) = ancestor {
            items.extend(table.symbols.iter().filter(|s| s.is_public));
            ancestor = table.parent();
        }
        items
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new("", None)
    }
}

fn variable_type_name(file: &SourceFile, ty: TypeId) -> String {
    match &file.types[ty].kind {
        TypeKind::Named(name) => name.to_string(),
        TypeKind::Nullable(inner) => match &file.types[*inner].kind {
            TypeKind::Named(name) => format!("{}?", name),
            _ => "Unknown?".to_string(),
        },
        TypeKind::Generic { .. } => "Inferred".to_string(),
    }
}

/// Ordering key for picking the narrowest of nested ranges.
fn range_size(range: Range) -> (u32, u32) {
    (
        range.end.line - range.start.line,
        range.end.offset.saturating_sub(range.start.offset),
    )
}

/// Find the identifier under `pos`, if any.
///
/// Uses of names, member names and declaration names all count, as do
/// the names in type annotations.
pub fn find_identifier_at_position(file: &SourceFile, pos: Position) -> Option<IdentifierHit> {
    file.body.iter().find_map(|&stmt| stmt_hit(file, stmt, pos))
}

fn name_hit(name: &seen_ast::Name, pos: Position) -> Option<IdentifierHit> {
    name.range.contains(pos).then(|| IdentifierHit {
        name: name.text.clone(),
        range: name.range,
    })
}

fn stmt_hit(file: &SourceFile, id: StmtId, pos: Position) -> Option<IdentifierHit> {
    let stmt = &file.stmts[id];
    if !stmt.range.contains(pos) {
        return None;
    }

    match &stmt.kind {
        StmtKind::Function(func) => name_hit(&func.name, pos)
            .or_else(|| {
                func.params.iter().find_map(|param| {
                    name_hit(&param.name, pos)
                        .or_else(|| type_hit(file, param.ty, pos))
                        .or_else(|| param.default.and_then(|e| expr_hit(file, e, pos)))
                })
            })
            .or_else(|| func.return_type.and_then(|ty| type_hit(file, ty, pos)))
            .or_else(|| block_hit(file, &func.body, pos)),
        StmtKind::Struct(def) => name_hit(&def.name, pos).or_else(|| {
            def.fields
                .iter()
                .find_map(|field| name_hit(&field.name, pos).or_else(|| type_hit(file, field.ty, pos)))
        }),
        StmtKind::Variable(var) => name_hit(&var.name, pos)
            .or_else(|| var.ty.and_then(|ty| type_hit(file, ty, pos)))
            .or_else(|| var.init.and_then(|e| expr_hit(file, e, pos))),
        StmtKind::Const(decl) => name_hit(&decl.name, pos)
            .or_else(|| decl.ty.and_then(|ty| type_hit(file, ty, pos)))
            .or_else(|| expr_hit(file, decl.value, pos)),
        StmtKind::Import(import) => import.path.iter().find_map(|name| name_hit(name, pos)),
        StmtKind::Block(block) => block_hit(file, block, pos),
        StmtKind::If(if_stmt) => expr_hit(file, if_stmt.condition, pos)
            .or_else(|| block_hit(file, &if_stmt.then_branch, pos))
            .or_else(|| match &if_stmt.else_branch {
                Some(ElseBranch::If(nested)) => stmt_hit(file, *nested, pos),
                Some(ElseBranch::Block(block)) => block_hit(file, block, pos),
                None => None,
            }),
        StmtKind::While { condition, body } => {
            expr_hit(file, *condition, pos).or_else(|| block_hit(file, body, pos))
        }
        StmtKind::For {
            binding,
            iterable,
            body,
        } => name_hit(binding, pos)
            .or_else(|| expr_hit(file, *iterable, pos))
            .or_else(|| block_hit(file, body, pos)),
        StmtKind::Loop { body } => block_hit(file, body, pos),
        StmtKind::Return(Some(value)) | StmtKind::Expr(value) => expr_hit(file, *value, pos),
        StmtKind::Return(None) | StmtKind::Break | StmtKind::Continue => None,
    }
}

fn block_hit(file: &SourceFile, block: &Block, pos: Position) -> Option<IdentifierHit> {
    if !block.range.contains(pos) {
        return None;
    }
    block.stmts.iter().find_map(|&stmt| stmt_hit(file, stmt, pos))
}

fn type_hit(file: &SourceFile, ty: TypeId, pos: Position) -> Option<IdentifierHit> {
    let node = &file.types[ty];
    if !node.range.contains(pos) {
        return None;
    }
    match &node.kind {
        TypeKind::Named(name) => Some(IdentifierHit {
            name: name.clone(),
            range: node.range,
        }),
        TypeKind::Nullable(inner) => type_hit(file, *inner, pos),
        TypeKind::Generic { name, args } => args
            .iter()
            .find_map(|arg| type_hit(file, *arg, pos))
            .or_else(|| {
                // The base name is the first token of the node
                let mut end = node.range.start;
                end.column += name.chars().map(char::len_utf16).sum::<usize>() as u32;
                end.offset += name.len() as u32;
                let range = Range::new(node.range.start, end);
                range.contains(pos).then(|| IdentifierHit {
                    name: name.clone(),
                    range,
                })
            }),
    }
}

fn expr_hit(file: &SourceFile, id: ExprId, pos: Position) -> Option<IdentifierHit> {
    let expr = &file.exprs[id];
    if !expr.range.contains(pos) {
        return None;
    }

    match &expr.kind {
        ExprKind::Literal(_) => None,
        ExprKind::Ident(name) => Some(IdentifierHit {
            name: name.clone(),
            range: expr.range,
        }),
        ExprKind::Member { object, member, .. } => {
            name_hit(member, pos).or_else(|| expr_hit(file, *object, pos))
        }
        ExprKind::Binary { lhs, rhs, .. } => {
            expr_hit(file, *lhs, pos).or_else(|| expr_hit(file, *rhs, pos))
        }
        ExprKind::Unary { operand, .. } => expr_hit(file, *operand, pos),
        ExprKind::Assign { target, value, .. } => {
            expr_hit(file, *target, pos).or_else(|| expr_hit(file, *value, pos))
        }
        ExprKind::Call { callee, args } => expr_hit(file, *callee, pos)
            .or_else(|| args.iter().find_map(|arg| expr_hit(file, *arg, pos))),
        ExprKind::Index { object, index } => {
            expr_hit(file, *object, pos).or_else(|| expr_hit(file, *index, pos))
        }
        ExprKind::NotNull(inner) => expr_hit(file, *inner, pos),
        ExprKind::Array(items) => items.iter().find_map(|item| expr_hit(file, *item, pos)),
        ExprKind::Range { start, end, .. } => {
            expr_hit(file, *start, pos).or_else(|| expr_hit(file, *end, pos))
        }
    }
}

/// Markdown shown when hovering a symbol.
pub fn hover_markdown(symbol: &Symbol) -> String {
    let visibility = if symbol.is_public { "Public" } else { "Private" };
    let name = &symbol.name;
    let doc = symbol.documentation_or_default();

    match symbol.kind {
        SymbolKind::Function => format!(
            "**{} Function** {}\n\n```seen\nfun {}(): {}\n```\n\n{}",
            visibility, name, name, symbol.type_name, doc
        ),
        SymbolKind::Variable => format!(
            "**{} Variable** {}\n\n```seen\nlet {}: {}\n```\n\n{}",
            visibility, name, name, symbol.type_name, doc
        ),
        SymbolKind::Constant => format!(
            "**{} Constant** {}\n\n```seen\nconst {}\n```\n\n{}",
            visibility, name, name, doc
        ),
        SymbolKind::Struct => format!(
            "**{} Struct** {}\n\n```seen\nstruct {}\n```\n\n{}",
            visibility, name, name, doc
        ),
        SymbolKind::Parameter => format!(
            "**Parameter** {}\n\n```seen\n{}: {}\n```",
            name, name, symbol.type_name
        ),
        SymbolKind::Field => format!(
            "**Field** {}\n\n```seen\n{}: {}\n```",
            name, name, symbol.type_name
        ),
        SymbolKind::BuiltinType => format!("**{}**\n\nType: {}", name, symbol.type_name),
    }
}
