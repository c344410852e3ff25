// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Expression parsing using Pratt parsing for operators.

use seen_ast::span::Range;
use seen_ast::*;
use seen_lexer::{literal_value, TokenKind};

use crate::{ParseError, ParseResult, Parser};

/// Operator precedence levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Precedence {
    None = 0,
    Assignment = 1, // = += -= *= /= %=
    Elvis = 2,      // ?:
    Or = 3,         // or
    And = 4,        // and
    Equality = 5,   // == !=
    Comparison = 6, // < <= > >= <=>
    Range = 7,      // .. ..<
    Term = 8,       // + -
    Factor = 9,     // * / % **
    Unary = 10,     // ! not - +
    Postfix = 11,   // . ?. [] () !!
    Primary = 12,
}

impl<'a> Parser<'a> {
    /// Parse an expression.
    pub fn parse_expr(&mut self, file: &mut SourceFile) -> ParseResult<ExprId> {
        self.parse_expr_prec(file, Precedence::None)
    }

    /// Parse an expression with a minimum precedence.
    fn parse_expr_prec(&mut self, file: &mut SourceFile, min_prec: Precedence) -> ParseResult<ExprId> {
        self.nested("expression", |p| p.parse_operators(file, min_prec))
    }

    /// Parse a prefix expression and the infix operators binding tighter
    /// than `min_prec`.
    fn parse_operators(&mut self, file: &mut SourceFile, min_prec: Precedence) -> ParseResult<ExprId> {
        let mut lhs = self.parse_prefix(file)?;

        loop {
            let prec = self.current_precedence();
            if prec <= min_prec {
                break;
            }

            lhs = self.parse_infix(file, lhs, prec)?;
        }

        Ok(lhs)
    }

    /// Precedence of the current token as an infix operator.
    fn current_precedence(&self) -> Precedence {
        let kind = self.peek().kind;

        // `+`/`-` at the start of a line begin a new statement
        if self.newline_before() && matches!(kind, TokenKind::Plus | TokenKind::Minus) {
            return Precedence::None;
        }

        match kind {
            TokenKind::Eq
            | TokenKind::PlusEq
            | TokenKind::MinusEq
            | TokenKind::StarEq
            | TokenKind::SlashEq
            | TokenKind::PercentEq => Precedence::Assignment,
            TokenKind::Elvis => Precedence::Elvis,
            TokenKind::Or => Precedence::Or,
            TokenKind::And => Precedence::And,
            TokenKind::EqEq | TokenKind::BangEq => Precedence::Equality,
            TokenKind::Lt
            | TokenKind::Le
            | TokenKind::Gt
            | TokenKind::Ge
            | TokenKind::Spaceship => Precedence::Comparison,
            TokenKind::DotDot | TokenKind::DotDotLt => Precedence::Range,
            TokenKind::Plus | TokenKind::Minus => Precedence::Term,
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent | TokenKind::StarStar => {
                Precedence::Factor
            }
            _ => Precedence::None,
        }
    }

    /// Parse the operator at the cursor and its right operand.
    fn parse_infix(
        &mut self,
        file: &mut SourceFile,
        lhs: ExprId,
        prec: Precedence,
    ) -> ParseResult<ExprId> {
        let op_token = self.advance();
        let lhs_range = file.exprs[lhs].range;

        match prec {
            Precedence::Assignment => {
                if !is_assignable(&file.exprs[lhs].kind) {
                    return Err(ParseError::custom_with_hint(
                        lhs_range,
                        "invalid assignment target",
                        "only names, members and index expressions can be assigned",
                    ));
                }
                let op = match op_token.kind {
                    TokenKind::PlusEq => AssignOp::Add,
                    TokenKind::MinusEq => AssignOp::Sub,
                    TokenKind::StarEq => AssignOp::Mul,
                    TokenKind::SlashEq => AssignOp::Div,
                    TokenKind::PercentEq => AssignOp::Rem,
                    _ => AssignOp::Assign,
                };
                // Right-associative
                let value = self.parse_expr_prec(file, Precedence::None)?;
                let range = lhs_range.merge(file.exprs[value].range);
                Ok(alloc(file, range, ExprKind::Assign {
                    op,
                    target: lhs,
                    value,
                }))
            }

            Precedence::Elvis => {
                // Right-associative
                let rhs = self.parse_expr_prec(file, Precedence::Assignment)?;
                Ok(binary(file, BinaryOp::Elvis, lhs, rhs))
            }

            Precedence::Range => {
                let end = self.parse_expr_prec(file, Precedence::Range)?;
                if self.current_precedence() == Precedence::Range {
                    return Err(ParseError::custom_with_hint(
                        self.peek().range,
                        "range operators cannot be chained",
                        "wrap one of the ranges in parentheses",
                    ));
                }
                let range = lhs_range.merge(file.exprs[end].range);
                Ok(alloc(file, range, ExprKind::Range {
                    start: lhs,
                    end,
                    inclusive: op_token.kind == TokenKind::DotDot,
                }))
            }

            _ => {
                let op = binary_op(op_token.kind)
                    .ok_or_else(|| ParseError::unexpected_token(&op_token, "binary operator"))?;
                let rhs = self.parse_expr_prec(file, prec)?;
                Ok(binary(file, op, lhs, rhs))
            }
        }
    }

    /// Parse a prefix expression (primary or unary).
    fn parse_prefix(&mut self, file: &mut SourceFile) -> ParseResult<ExprId> {
        let op = match self.peek().kind {
            TokenKind::Bang | TokenKind::Not => Some(UnaryOp::Not),
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Plus => Some(UnaryOp::Plus),
            _ => None,
        };

        match op {
            Some(op) => {
                let start = self.advance().range;
                let operand = self.nested("expression", |p| p.parse_prefix(file))?;
                let range = start.merge(file.exprs[operand].range);
                Ok(alloc(file, range, ExprKind::Unary { op, operand }))
            }
            None => {
                let expr = self.parse_primary(file)?;
                self.parse_postfix(file, expr)
            }
        }
    }

    /// Parse a primary expression.
    fn parse_primary(&mut self, file: &mut SourceFile) -> ParseResult<ExprId> {
        let token = self.peek().clone();

        match token.kind {
            TokenKind::Identifier => {
                self.advance();
                Ok(alloc(file, token.range, ExprKind::Ident(token.lexeme.clone())))
            }

            TokenKind::IntLiteral
            | TokenKind::FloatLiteral
            | TokenKind::StringLiteral
            | TokenKind::CharLiteral
            | TokenKind::BoolLiteral
            | TokenKind::NullLiteral => {
                self.advance();
                let value = literal_value(&token, self.keywords)
                    .ok_or_else(|| ParseError::invalid_literal(&token))?;
                Ok(alloc(file, token.range, ExprKind::Literal(value)))
            }

            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr(file)?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }

            TokenKind::LBracket => {
                self.advance();
                let elements = self.parse_args(file, TokenKind::RBracket)?;
                let end = self.expect(TokenKind::RBracket)?;
                Ok(alloc(file, token.range.merge(end), ExprKind::Array(elements)))
            }

            _ => Err(ParseError::unexpected_token(&token, "expression")),
        }
    }

    /// Parse postfix operators: member access, calls, indexing, `!!`.
    fn parse_postfix(&mut self, file: &mut SourceFile, mut expr: ExprId) -> ParseResult<ExprId> {
        loop {
            let start = file.exprs[expr].range;

            expr = match self.peek().kind {
                // A call or index on the next line is a new statement
                TokenKind::LParen if !self.newline_before() => {
                    self.advance();
                    let args = self.parse_args(file, TokenKind::RParen)?;
                    let end = self.expect(TokenKind::RParen)?;
                    alloc(file, start.merge(end), ExprKind::Call { callee: expr, args })
                }

                TokenKind::LBracket if !self.newline_before() => {
                    self.advance();
                    let index = self.parse_expr(file)?;
                    let end = self.expect(TokenKind::RBracket)?;
                    alloc(file, start.merge(end), ExprKind::Index { object: expr, index })
                }

                TokenKind::Dot | TokenKind::QuestionDot => {
                    let safe = self.advance().kind == TokenKind::QuestionDot;
                    let member = self.expect_name("member name")?;
                    alloc(file, start.merge(member.range), ExprKind::Member {
                        object: expr,
                        member,
                        safe,
                    })
                }

                TokenKind::BangBang => {
                    let end = self.advance().range;
                    alloc(file, start.merge(end), ExprKind::NotNull(expr))
                }

                _ => break,
            };
        }

        Ok(expr)
    }

    /// Parse comma-separated expressions up to (not including) `close`.
    /// A trailing comma is allowed.
    fn parse_args(&mut self, file: &mut SourceFile, close: TokenKind) -> ParseResult<Vec<ExprId>> {
        let mut args = Vec::new();
        while !self.check(close) && !self.is_eof() {
            args.push(self.parse_expr(file)?);
            if !self.check(TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        Ok(args)
    }
}

fn alloc(file: &mut SourceFile, range: Range, kind: ExprKind) -> ExprId {
    file.exprs.alloc(Expr { range, kind })
}

fn binary(file: &mut SourceFile, op: BinaryOp, lhs: ExprId, rhs: ExprId) -> ExprId {
    let range = file.exprs[lhs].range.merge(file.exprs[rhs].range);
    alloc(file, range, ExprKind::Binary { op, lhs, rhs })
}

fn is_assignable(kind: &ExprKind) -> bool {
    matches!(
        kind,
        ExprKind::Ident(_) | ExprKind::Member { .. } | ExprKind::Index { .. }
    )
}

fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    Some(match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Rem,
        TokenKind::StarStar => BinaryOp::Pow,
        TokenKind::EqEq => BinaryOp::Eq,
        TokenKind::BangEq => BinaryOp::Ne,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::Le => BinaryOp::Le,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::Ge => BinaryOp::Ge,
        TokenKind::Spaceship => BinaryOp::Cmp,
        TokenKind::And => BinaryOp::And,
        TokenKind::Or => BinaryOp::Or,
        TokenKind::Elvis => BinaryOp::Elvis,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use crate::{parse_source, SyntaxError};
    use seen_ast::*;
    use seen_lexer::KeywordTable;

    /// Render an expression as a fully parenthesized string.
    fn render(file: &SourceFile, id: ExprId) -> String {
        match &file.exprs[id].kind {
            ExprKind::Literal(Literal::Int(n)) => n.to_string(),
            ExprKind::Literal(Literal::Bool(b)) => b.to_string(),
            ExprKind::Literal(Literal::Null) => "null".to_string(),
            ExprKind::Literal(Literal::String(s)) => format!("{:?}", s.as_str()),
            ExprKind::Literal(other) => format!("{:?}", other),
            ExprKind::Ident(name) => name.to_string(),
            ExprKind::Binary { op, lhs, rhs } => {
                format!("({} {} {})", render(file, *lhs), op.as_str(), render(file, *rhs))
            }
            ExprKind::Unary { op, operand } => {
                let op = match op {
                    UnaryOp::Not => "!",
                    UnaryOp::Neg => "-",
                    UnaryOp::Plus => "+",
                };
                format!("({}{})", op, render(file, *operand))
            }
            ExprKind::Assign { op, target, value } => {
                format!("({} {:?}= {})", render(file, *target), op, render(file, *value))
            }
            ExprKind::Call { callee, args } => {
                let args: Vec<String> = args.iter().map(|a| render(file, *a)).collect();
                format!("{}({})", render(file, *callee), args.join(", "))
            }
            ExprKind::Member {
                object,
                member,
                safe,
            } => format!(
                "{}{}{}",
                render(file, *object),
                if *safe { "?." } else { "." },
                member.text
            ),
            ExprKind::Index { object, index } => {
                format!("{}[{}]", render(file, *object), render(file, *index))
            }
            ExprKind::NotNull(inner) => format!("{}!!", render(file, *inner)),
            ExprKind::Array(items) => {
                let items: Vec<String> = items.iter().map(|a| render(file, *a)).collect();
                format!("[{}]", items.join(", "))
            }
            ExprKind::Range {
                start,
                end,
                inclusive,
            } => format!(
                "({}{}{})",
                render(file, *start),
                if *inclusive { ".." } else { "..<" },
                render(file, *end)
            ),
        }
    }

    fn parse_expr_str(source: &str) -> String {
        let keywords = KeywordTable::bundled("en").unwrap();
        let parsed = parse_source(source, &keywords);
        assert!(parsed.is_ok(), "Parse errors for {:?}: {:?}", source, parsed.errors);
        let file = parsed.file.unwrap();
        assert_eq!(file.body.len(), 1, "expected a single statement in {:?}", source);
        match &file.stmts[file.body[0]].kind {
            StmtKind::Expr(id) => render(&file, *id),
            other => panic!("Expected expression statement, got {:?}", other),
        }
    }

    fn parse_errors(source: &str) -> Vec<SyntaxError> {
        let keywords = KeywordTable::bundled("en").unwrap();
        parse_source(source, &keywords).errors
    }

    #[test]
    fn test_arithmetic_precedence() {
        assert_eq!(parse_expr_str("1 + 2 * 3"), "(1 + (2 * 3))");
        assert_eq!(parse_expr_str("1 - 2 - 3"), "((1 - 2) - 3)");
        assert_eq!(parse_expr_str("(1 + 2) * 3"), "((1 + 2) * 3)");
        assert_eq!(parse_expr_str("a % b ** c"), "((a % b) ** c)");
    }

    #[test]
    fn test_logical_and_comparison() {
        assert_eq!(parse_expr_str("a or b and c"), "(a or (b and c))");
        assert_eq!(parse_expr_str("a < b == c >= d"), "((a < b) == (c >= d))");
        assert_eq!(parse_expr_str("a <=> b"), "(a <=> b)");
        assert_eq!(parse_expr_str("not a == b"), "((!a) == b)");
    }

    #[test]
    fn test_assignment_is_right_associative() {
        assert_eq!(parse_expr_str("a = b = 1"), "(a Assign= (b Assign= 1))");
        assert_eq!(parse_expr_str("p.x += 2"), "(p.x Add= 2)");
        assert_eq!(parse_expr_str("xs[0] = a or b"), "(xs[0] Assign= (a or b))");
    }

    #[test]
    fn test_invalid_assignment_target() {
        let errors = parse_errors("a + b = 1");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "invalid assignment target");
    }

    #[test]
    fn test_elvis_is_right_associative() {
        assert_eq!(parse_expr_str("a ?: b ?: c"), "(a ?: (b ?: c))");
        assert_eq!(parse_expr_str("a ?: b or c"), "(a ?: (b or c))");
    }

    #[test]
    fn test_ranges() {
        assert_eq!(parse_expr_str("0..n + 1"), "(0..(n + 1))");
        assert_eq!(parse_expr_str("0..<len"), "(0..<len)");
        assert!(!parse_errors("1..2..3").is_empty());
    }

    #[test]
    fn test_postfix_chain() {
        assert_eq!(parse_expr_str("a.b?.c!!"), "a.b?.c!!");
        assert_eq!(parse_expr_str("f(1, x)(2)[0]"), "f(1, x)(2)[0]");
        assert_eq!(parse_expr_str("obj.method(1,)"), "obj.method(1)");
        assert_eq!(parse_expr_str("-x.y"), "(-x.y)");
    }

    #[test]
    fn test_literals_and_arrays() {
        assert_eq!(parse_expr_str("[1, true, null, \"s\"]"), "[1, true, null, \"s\"]");
        assert_eq!(parse_expr_str("[]"), "[]");
    }

    #[test]
    fn test_newline_ends_expression() {
        let keywords = KeywordTable::bundled("en").unwrap();
        let parsed = parse_source("a\n(b)\nc\n-1", &keywords);
        assert!(parsed.is_ok(), "{:?}", parsed.errors);
        assert_eq!(parsed.file.unwrap().body.len(), 4);
    }

    #[test]
    fn test_c_style_logical_operators_are_rejected() {
        assert!(!parse_errors("a && b").is_empty());
        assert!(!parse_errors("a || b").is_empty());
    }

    #[test]
    fn test_integer_overflow_is_invalid_literal() {
        let errors = parse_errors("99999999999999999999999");
        assert!(errors[0].to_string().starts_with("invalid literal"));
    }

    #[test]
    fn test_expression_ranges() {
        let keywords = KeywordTable::bundled("en").unwrap();
        let file = parse_source("foo.bar(1)", &keywords).file.unwrap();
        let StmtKind::Expr(id) = file.stmts[file.body[0]].kind else {
            panic!("Expected expression");
        };
        let range = file.exprs[id].range;
        assert_eq!((range.start.column, range.end.column), (0, 10));
        let ExprKind::Call { callee, .. } = &file.exprs[id].kind else {
            panic!("Expected call");
        };
        let ExprKind::Member { member, .. } = &file.exprs[*callee].kind else {
            panic!("Expected member");
        };
        assert_eq!((member.range.start.column, member.range.end.column), (4, 7));
    }
}
