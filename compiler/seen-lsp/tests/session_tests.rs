// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! End-to-end tests driving the server through framed stdio.

use serde_json::{json, Value};
use seen_lsp::protocol::{Message, RequestId, Response};
use seen_lsp::transport::read_message;
use seen_lsp::{run, ServerConfig, Session};
use std::io::Cursor;

const URI: &str = "file:///workspace/add.seen";

fn frame(message: &Value) -> String {
    let body = message.to_string();
    format!("Content-Length: {}\r\n\r\n{}", body.len(), body)
}

/// Run the server over `messages` and decode everything it wrote.
fn serve(messages: &[Value]) -> Vec<Message> {
    let input: String = messages.iter().map(frame).collect();
    let mut output = Vec::new();
    run(Cursor::new(input.into_bytes()), &mut output, ServerConfig::default()).unwrap();

    let mut reader = Cursor::new(output);
    let mut replies = Vec::new();
    while let Some(message) = read_message(&mut reader).unwrap() {
        replies.push(message);
    }
    replies
}

fn did_open(text: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": "textDocument/didOpen",
        "params": {
            "textDocument": {"uri": URI, "languageId": "seen", "version": 1, "text": text}
        }
    })
}

fn request(id: i64, method: &str, line: u32, character: u32) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": {
            "textDocument": {"uri": URI},
            "position": {"line": line, "character": character}
        }
    })
}

fn responses(messages: &[Message]) -> Vec<&Response> {
    messages
        .iter()
        .filter_map(|m| match m {
            Message::Response(r) => Some(r),
            _ => None,
        })
        .collect()
}

#[test]
fn test_initialize_response_echoes_id() {
    let replies = serve(&[json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {"processId": null, "rootUri": null, "capabilities": {}}
    })]);

    let [Message::Response(response)] = replies.as_slice() else {
        panic!("expected a single response, got {:?}", replies);
    };
    assert_eq!(response.id, RequestId::Number(1));
    let result = response.result.as_ref().unwrap();
    assert!(result["capabilities"].is_object());
    assert_eq!(result["capabilities"]["hoverProvider"], json!(true));
}

#[test]
fn test_initialize_wire_layout() {
    let body = json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}});
    let input = frame(&body);
    let mut output = Vec::new();
    run(Cursor::new(input.into_bytes()), &mut output, ServerConfig::default()).unwrap();

    let text = String::from_utf8(output).unwrap();
    let (header, body) = text.split_once("\r\n\r\n").unwrap();
    assert_eq!(header, format!("Content-Length: {}", body.len()));
    assert!(body.starts_with(r#"{"jsonrpc":"2.0","id":1,"result":{"capabilities":{"#));
}

#[test]
fn test_hover_on_function_name() {
    let replies = serve(&[
        did_open("fun add(a: Int, b: Int) -> Int { return a + b }"),
        request(2, "textDocument/hover", 0, 5),
    ]);

    let hover = responses(&replies)[0].result.as_ref().unwrap();
    let markdown = hover["contents"]["value"].as_str().unwrap();
    assert!(markdown.contains("Function"));
    assert!(markdown.contains("Int"));
    assert_eq!(
        hover["range"],
        json!({"start": {"line": 0, "character": 4}, "end": {"line": 0, "character": 7}})
    );
}

#[test]
fn test_invalid_document_hover_is_null() {
    let replies = serve(&[
        did_open("fun add(a: Int, b: Int -> Int { return a + }"),
        request(3, "textDocument/hover", 0, 5),
        request(4, "textDocument/definition", 0, 5),
    ]);

    let diagnostics = match &replies[0] {
        Message::Notification(note) => note.params["diagnostics"].as_array().unwrap().clone(),
        other => panic!("expected diagnostics first, got {:?}", other),
    };
    assert!(!diagnostics.is_empty());
    assert!(diagnostics.iter().all(|d| d["source"] == json!("seen")));

    let answers = responses(&replies);
    assert_eq!(answers.len(), 2);
    assert_eq!(answers[0].result, Some(Value::Null));
    assert!(answers[0].error.is_none());
    assert_eq!(answers[1].result, Some(json!([])));
}

#[test]
fn test_empty_document_completion_offers_builtins() {
    let replies = serve(&[did_open(""), request(5, "textDocument/completion", 0, 0)]);

    let list = responses(&replies)[0].result.as_ref().unwrap();
    let labels: Vec<&str> = list["items"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|item| item["label"].as_str())
        .collect();
    for builtin in ["Int", "String", "Bool", "Float", "print", "println"] {
        assert!(labels.contains(&builtin), "missing {}", builtin);
    }
}

#[test]
fn test_definition_round_trip() {
    let source = "struct Point { x: Int }\nfun origin(): Point { }\n";
    let replies = serve(&[did_open(source), request(6, "textDocument/definition", 1, 15)]);

    let locations = responses(&replies)[0].result.as_ref().unwrap();
    assert_eq!(locations[0]["uri"], json!(URI));
    assert_eq!(locations[0]["range"]["start"], json!({"line": 0, "character": 0}));
}

#[test]
fn test_malformed_frames_are_skipped() {
    let good = frame(&json!({"jsonrpc": "2.0", "id": 7, "method": "shutdown"}));
    let input = format!("Content-Length: 9\r\n\r\n{{garbage}}{}", good);
    let mut output = Vec::new();
    run(Cursor::new(input.into_bytes()), &mut output, ServerConfig::default()).unwrap();

    let reply = read_message(&mut Cursor::new(output)).unwrap().unwrap();
    assert_eq!(reply, Message::from(Response::ok(RequestId::Number(7), Value::Null)));
}

#[test]
fn test_oversized_frame_does_not_end_session() {
    let good = frame(&json!({"jsonrpc": "2.0", "id": 12, "method": "shutdown"}));
    let input = format!("Content-Length: 18446744073709551615\r\n\r\n{}", good);
    let mut output = Vec::new();
    run(Cursor::new(input.into_bytes()), &mut output, ServerConfig::default()).unwrap();

    let reply = read_message(&mut Cursor::new(output)).unwrap().unwrap();
    assert_eq!(reply, Message::from(Response::ok(RequestId::Number(12), Value::Null)));
}

#[test]
fn test_non_utf8_header_does_not_end_session() {
    let mut input = b"X-Junk: \xff\xfe\r\n".to_vec();
    let shutdown = frame(&json!({"jsonrpc": "2.0", "id": 13, "method": "shutdown"}));
    input.extend_from_slice(shutdown.as_bytes());
    let mut output = Vec::new();
    run(Cursor::new(input), &mut output, ServerConfig::default()).unwrap();

    let reply = read_message(&mut Cursor::new(output)).unwrap().unwrap();
    assert_eq!(reply, Message::from(Response::ok(RequestId::Number(13), Value::Null)));
}

#[test]
fn test_loop_stops_after_shutdown() {
    let replies = serve(&[
        json!({"jsonrpc": "2.0", "id": 8, "method": "shutdown"}),
        request(9, "textDocument/completion", 0, 0),
    ]);
    assert_eq!(responses(&replies).len(), 1);
}

#[test]
fn test_unknown_request_gets_no_reply() {
    let replies = serve(&[
        json!({"jsonrpc": "2.0", "id": 10, "method": "textDocument/formatting", "params": {}}),
        json!({"jsonrpc": "2.0", "method": "exit"}),
    ]);
    assert!(replies.is_empty());
}

#[test]
fn test_session_handles_messages_without_transport() {
    let mut session = Session::new(ServerConfig {
        language: "ar".to_string(),
        ..ServerConfig::default()
    });
    let open = Message::notification(
        "textDocument/didOpen",
        json!({
            "textDocument": {
                "uri": URI,
                "languageId": "seen",
                "version": 1,
                "text": "دالة جمع(أ: Int): Int { ارجع أ }"
            }
        }),
    );
    session.handle(open);
    let hover = session.handle(Message::request(
        11,
        "textDocument/hover",
        json!({"textDocument": {"uri": URI}, "position": {"line": 0, "character": 6}}),
    ));
    let [Message::Response(response)] = hover.as_slice() else {
        panic!("expected a response");
    };
    let markdown = response.result.as_ref().unwrap()["contents"]["value"].as_str().unwrap();
    assert!(markdown.starts_with("**Private Function** جمع"));
}
