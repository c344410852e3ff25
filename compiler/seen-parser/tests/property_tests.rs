// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Property-based tests for the parser.

use proptest::prelude::*;
use seen_lexer::KeywordTable;
use seen_parser::parse_source;

/// Token soup built from grammar fragments, so that many inputs are close
/// to valid programs.
fn program_text() -> impl Strategy<Value = String> {
    let fragment = prop_oneof![
        Just("fun ".to_string()),
        Just("let ".to_string()),
        Just("var ".to_string()),
        Just("const ".to_string()),
        Just("struct ".to_string()),
        Just("if ".to_string()),
        Just("else ".to_string()),
        Just("return".to_string()),
        Just("(".to_string()),
        Just(")".to_string()),
        Just("{".to_string()),
        Just("}".to_string()),
        Just("[".to_string()),
        Just("]".to_string()),
        Just(": Int".to_string()),
        Just(" = ".to_string()),
        Just(" + ".to_string()),
        Just(" ?: ".to_string()),
        Just("..".to_string()),
        Just(";".to_string()),
        Just(",".to_string()),
        Just("\n".to_string()),
        "[a-zA-Z][a-z0-9]{0,4}",
        "[0-9]{1,3}",
    ];
    prop::collection::vec(fragment, 0..40).prop_map(|parts| parts.concat())
}

proptest! {
    #[test]
    fn prop_parse_terminates_and_is_deterministic(source in program_text()) {
        let table = KeywordTable::bundled("en").unwrap();
        let first = parse_source(&source, &table);
        let second = parse_source(&source, &table);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_error_free_parse_yields_tree(source in program_text()) {
        let table = KeywordTable::bundled("en").unwrap();
        let parsed = parse_source(&source, &table);
        if parsed.errors.is_empty() {
            prop_assert!(parsed.file.is_some());
        }
    }

    #[test]
    fn prop_statement_ranges_stay_in_document(source in program_text()) {
        let table = KeywordTable::bundled("en").unwrap();
        let parsed = parse_source(&source, &table);
        if let Some(file) = parsed.file {
            for &id in &file.body {
                let range = file.stmts[id].range;
                prop_assert!(range.start.offset <= range.end.offset);
                prop_assert!(range.end.offset as usize <= source.len());
            }
        }
    }
}
