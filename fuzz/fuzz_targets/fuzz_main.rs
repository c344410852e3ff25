#![no_main]
use libfuzzer_sys::fuzz_target;
use seen_lexer::KeywordTable;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() || data.len() > 100000 {
        return;
    }

    // Framed input for the LSP transport; must never panic
    let mut reader = std::io::Cursor::new(data);
    while let Ok(Some(_)) = seen_lsp::transport::read_message(&mut reader) {}

    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // Lossless lexing and crash-free parsing of arbitrary source
    let keywords = KeywordTable::load("en");
    let parsed = seen_parser::parse_source(text, &keywords);
    let rebuilt: String = parsed.tokens.iter().map(|t| t.lexeme.as_str()).collect();
    assert_eq!(rebuilt, text);
});
