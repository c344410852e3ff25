// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Integration tests for the Seen parser.

use seen_ast::*;
use seen_lexer::{tokenize, KeywordTable};
use seen_parser::{parse, parse_source, ParseError, SyntaxError};

fn english() -> KeywordTable {
    KeywordTable::bundled("en").unwrap()
}

#[test]
fn test_add_function_structure() {
    let parsed = parse_source("fun add(a: Int, b: Int) -> Int { return a + b }", &english());
    assert!(parsed.is_ok(), "Parse errors: {:?}", parsed.errors);
    let file = parsed.file.unwrap();
    assert_eq!(file.body.len(), 1);

    let StmtKind::Function(func) = &file.stmts[file.body[0]].kind else {
        panic!("Expected function declaration");
    };
    assert_eq!(func.name.text, "add");
    assert_eq!(func.params.len(), 2);
    for (param, name) in func.params.iter().zip(["a", "b"]) {
        assert_eq!(param.name.text, name);
        assert_eq!(file.types[param.ty].kind, TypeKind::Named("Int".into()));
    }
    assert_eq!(file.display_type(func.return_type.unwrap()), "Int");

    assert_eq!(func.body.stmts.len(), 1);
    let StmtKind::Return(Some(value)) = file.stmts[func.body.stmts[0]].kind else {
        panic!("Expected return with a value");
    };
    let ExprKind::Binary { op, lhs, rhs } = &file.exprs[value].kind else {
        panic!("Expected binary expression");
    };
    assert_eq!(*op, BinaryOp::Add);
    assert_eq!(file.exprs[*lhs].kind, ExprKind::Ident("a".into()));
    assert_eq!(file.exprs[*rhs].kind, ExprKind::Ident("b".into()));
}

#[test]
fn test_declaration_ranges() {
    let source = "fun add(a: Int, b: Int) -> Int {\n    return a + b\n}\n";
    let file = parse_source(source, &english()).file.unwrap();
    let stmt = &file.stmts[file.body[0]];
    assert_eq!((stmt.range.start.line, stmt.range.start.column), (0, 0));
    assert_eq!((stmt.range.end.line, stmt.range.end.column), (2, 1));

    let StmtKind::Function(func) = &stmt.kind else {
        panic!("Expected function declaration");
    };
    assert_eq!((func.name.range.start.column, func.name.range.end.column), (4, 7));
    assert_eq!(&source[func.name.range.as_byte_range()], "add");
}

#[test]
fn test_localized_keywords_parse_identically() {
    let arabic = KeywordTable::bundled("ar").unwrap();
    let parsed = parse_source("دالة جمع(a: Int, b: Int): Int { ارجع a + b }", &arabic);
    assert!(parsed.is_ok(), "Parse errors: {:?}", parsed.errors);
    let file = parsed.file.unwrap();
    let StmtKind::Function(func) = &file.stmts[file.body[0]].kind else {
        panic!("Expected function declaration");
    };
    assert_eq!(func.name.text, "جمع");
    // Arabic letters have no case, so the name is private
    assert_eq!(func.visibility, Visibility::Private);
}

#[test]
fn test_keywords_come_from_the_table() {
    let parsed = parse_source("fun add() { }", &KeywordTable::empty());
    // Without a table `fun` is a plain name, followed by a call and a block
    assert!(parsed.is_ok(), "{:?}", parsed.errors);
    let file = parsed.file.unwrap();
    assert_eq!(file.body.len(), 3);
    assert!(!file
        .body
        .iter()
        .any(|&id| matches!(file.stmts[id].kind, StmtKind::Function(_))));
}

#[test]
fn test_parse_consumes_every_token() {
    let source = r#"
        import std.io

        /// Origin of the plane.
        const Origin = 0

        struct Point { x: Float; y: Float }

        fun (p: Point) Norm(): Float {
            var total = p.x * p.x + p.y * p.y;
            total **= 1
            return total
        }

        fun main() {
            let points = [1, 2, 3]
            for p in points {
                if p?.x ?: 0 > 1 and not done { println(p) }
            }
        }
    "#;
    let parsed = parse_source(source, &english());
    // `**=` is not an operator, so exactly the statement holding it fails
    assert_eq!(parsed.errors.len(), 1, "{:?}", parsed.errors);
    let file = parsed.file.unwrap();
    assert_eq!(file.body.len(), 5);
}

#[test]
fn test_multiple_errors_are_collected_in_order() {
    let source = "let = 1\nfun f( { }\nlet ok = 2\nconst\n";
    let parsed = parse_source(source, &english());
    assert!(parsed.errors.len() >= 3, "{:?}", parsed.errors);
    let lines: Vec<u32> = parsed.errors.iter().map(|e| e.range().start.line).collect();
    let mut sorted = lines.clone();
    sorted.sort_unstable();
    assert_eq!(lines, sorted);

    let file = parsed.file.unwrap();
    assert!(file.body.iter().any(|&id| matches!(
        &file.stmts[id].kind,
        StmtKind::Variable(v) if v.name.text == "ok"
    )));
}

#[test]
fn test_parse_accepts_raw_token_stream() {
    let keywords = english();
    let lexed = tokenize("let a = 1 // trailing\n", &keywords);
    let output = parse(&lexed.tokens, &keywords);
    assert!(output.is_ok(), "{:?}", output.errors);
}

#[test]
fn test_unicode_columns_are_utf16() {
    let source = "let s = \"😀\"; let t = 1";
    let file = parse_source(source, &english()).file.unwrap();
    let StmtKind::Variable(t) = &file.stmts[file.body[1]].kind else {
        panic!("Expected variable");
    };
    // The emoji is one char but two UTF-16 code units
    assert_eq!(t.name.range.start.column, 18);
}

#[test]
fn test_syntax_error_display() {
    let parsed = parse_source("let x = (1 + 2", &english());
    let [SyntaxError::Parse(err)] = parsed.errors.as_slice() else {
        panic!("Expected one parse error, got {:?}", parsed.errors);
    };
    assert!(matches!(err, ParseError::ExpectedToken { .. }));
    assert_eq!(err.format_location().lines().next(), Some("1:15: expected `)`, found end of file"));
}
