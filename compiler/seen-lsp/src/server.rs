// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! LSP session for Seen.
//!
//! The session is synchronous: [`run`] reads one frame, hands it to
//! [`Session::handle`], writes whatever comes back, and repeats.

use crate::document::DocumentStore;
use crate::protocol::{error_codes, Message, Notification, Request, RequestId, Response};
use crate::symbols::{find_identifier_at_position, hover_markdown, Symbol, SymbolKind, SymbolTable};
use crate::transport::{read_message, write_message, TransportError};
use lsp_types::{
    CompletionItem, CompletionItemKind, CompletionList, CompletionOptions, CompletionParams,
    Diagnostic, DiagnosticSeverity, DidChangeTextDocumentParams, DidCloseTextDocumentParams,
    DidOpenTextDocumentParams, Documentation, GotoDefinitionParams, Hover, HoverContents,
    HoverParams, HoverProviderCapability, InitializeResult, Location, MarkupContent, MarkupKind,
    OneOf, PublishDiagnosticsParams, ServerCapabilities, ServerInfo, TextDocumentSyncCapability,
    TextDocumentSyncKind, Url,
};
use seen_ast::span::{Position, Range};
use seen_lexer::KeywordTable;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::rc::Rc;

/// Name reported in `serverInfo`.
pub const SERVER_NAME: &str = "seen-lsp";

/// Source attached to published diagnostics.
pub const DIAGNOSTIC_SOURCE: &str = "seen";

/// Environment variable selecting the keyword language of the binary.
pub const LANGUAGE_ENV: &str = "SEEN_LANG";

/// Session settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Keyword language id, e.g. `en` or `ar`
    pub language: String,
    /// Directory searched for keyword files before the default locations
    pub languages_dir: Option<PathBuf>,
}

impl ServerConfig {
    /// Configuration from `SEEN_LANG`, falling back to the default.
    pub fn from_env() -> Self {
        match std::env::var(LANGUAGE_ENV) {
            Ok(language) if !language.is_empty() => Self {
                language,
                ..Self::default()
            },
            _ => Self::default(),
        }
    }

    /// Keyword table for the configured language.
    pub fn keywords(&self) -> KeywordTable {
        if let Some(dir) = &self.languages_dir {
            match KeywordTable::load_from_dir(dir, &self.language) {
                Ok(table) => return table,
                Err(err) => tracing::warn!("{}; using the default search path", err),
            }
        }
        KeywordTable::load(&self.language)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            languages_dir: None,
        }
    }
}

/// State of one client connection.
pub struct Session {
    config: ServerConfig,
    keywords: KeywordTable,
    builtins: Rc<SymbolTable>,
    documents: DocumentStore,
    shut_down: bool,
    exit: bool,
}

impl Session {
    pub fn new(config: ServerConfig) -> Self {
        let keywords = config.keywords();
        Self {
            config,
            keywords,
            builtins: Rc::new(SymbolTable::builtins()),
            documents: DocumentStore::new(),
            shut_down: false,
            exit: false,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    /// Whether `shutdown` has been answered.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Whether the client sent `exit`.
    pub fn should_exit(&self) -> bool {
        self.exit
    }

    /// Process one incoming message and return the messages to send back.
    pub fn handle(&mut self, message: Message) -> Vec<Message> {
        match message {
            Message::Request(request) => self
                .handle_request(request)
                .map(Message::from)
                .into_iter()
                .collect(),
            Message::Notification(notification) => self.handle_notification(notification),
            Message::Response(response) => {
                tracing::debug!("ignoring response to request {}", response.id);
                Vec::new()
            }
        }
    }

    fn handle_request(&mut self, request: Request) -> Option<Response> {
        let Request { id, method, params } = request;
        tracing::debug!("request {}: {}", id, method);

        if self.shut_down {
            tracing::warn!("request {} ({}) received after shutdown", id, method);
            return Some(Response::error(
                id,
                error_codes::INVALID_REQUEST,
                "server is shutting down",
            ));
        }

        let response = match method.as_str() {
            "initialize" => {
                let result = self.initialize(&params);
                respond(id, result)
            }
            "textDocument/hover" => self.query(id, params, Self::hover),
            "textDocument/definition" => self.query(id, params, Self::definition),
            "textDocument/completion" => self.query(id, params, Self::completion),
            "shutdown" => {
                tracing::info!("shutdown requested");
                self.shut_down = true;
                Response::ok(id, Value::Null)
            }
            _ => {
                tracing::debug!("ignoring unsupported request {}", method);
                return None;
            }
        };
        Some(response)
    }

    fn handle_notification(&mut self, notification: Notification) -> Vec<Message> {
        let Notification { method, params } = notification;
        tracing::debug!("notification: {}", method);

        match method.as_str() {
            "initialized" => Vec::new(),
            "textDocument/didOpen" => match decode::<DidOpenTextDocumentParams>(&method, params) {
                Some(params) => {
                    let item = params.text_document;
                    self.open(item.uri, item.text, item.version)
                }
                None => Vec::new(),
            },
            "textDocument/didChange" => {
                match decode::<DidChangeTextDocumentParams>(&method, params) {
                    // Full sync: the last change carries the whole text
                    Some(mut params) => match params.content_changes.pop() {
                        Some(change) => self.open(
                            params.text_document.uri,
                            change.text,
                            params.text_document.version,
                        ),
                        None => Vec::new(),
                    },
                    None => Vec::new(),
                }
            }
            "textDocument/didClose" => match decode::<DidCloseTextDocumentParams>(&method, params) {
                Some(params) => {
                    let uri = params.text_document.uri;
                    self.documents.remove(&uri);
                    publish_diagnostics(uri, Vec::new(), None).into_iter().collect()
                }
                None => Vec::new(),
            },
            "exit" => {
                self.exit = true;
                Vec::new()
            }
            _ => {
                tracing::debug!("ignoring unsupported notification {}", method);
                Vec::new()
            }
        }
    }

    /// Decode request params, run `handler` and wrap its result.
    fn query<P, R>(&self, id: RequestId, params: Value, handler: impl FnOnce(&Self, P) -> R) -> Response
    where
        P: DeserializeOwned,
        R: Serialize,
    {
        match serde_json::from_value(params) {
            Ok(params) => respond(id, handler(self, params)),
            Err(err) => {
                tracing::warn!("invalid params for request {}: {}", id, err);
                Response::error(id, error_codes::INVALID_PARAMS, format!("invalid params: {}", err))
            }
        }
    }

    fn initialize(&mut self, params: &Value) -> InitializeResult {
        let requested = params
            .pointer("/initializationOptions/language")
            .and_then(Value::as_str);
        if let Some(language) = requested {
            if language != self.config.language {
                self.set_language(language);
            }
        }

        InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                completion_provider: Some(CompletionOptions {
                    resolve_provider: Some(false),
                    trigger_characters: Some(vec![".".to_string()]),
                    ..Default::default()
                }),
                definition_provider: Some(OneOf::Left(true)),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: SERVER_NAME.to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        }
    }

    fn set_language(&mut self, language: &str) {
        tracing::info!("switching keyword language to {}", language);
        self.config.language = language.to_string();
        self.keywords = self.config.keywords();
        self.documents.reanalyze_all(&self.keywords, &self.builtins);
    }

    /// Analyze a document, store it and return its diagnostics.
    fn open(&mut self, uri: Url, text: String, version: i32) -> Vec<Message> {
        let document = self
            .documents
            .open(uri, text, version, &self.keywords, &self.builtins);
        let diagnostics = document.errors.iter().map(|err| Diagnostic {
            range: to_lsp_range(err.range()),
            severity: Some(DiagnosticSeverity::ERROR),
            source: Some(DIAGNOSTIC_SOURCE.to_string()),
            message: err.to_string(),
            ..Default::default()
        });
        publish_diagnostics(document.uri.clone(), diagnostics.collect(), Some(version))
            .into_iter()
            .collect()
    }

    /// The symbol named at a position of a successfully parsed document.
    fn symbol_at(&self, uri: &Url, position: lsp_types::Position) -> Option<(&Symbol, Range)> {
        let document = self.documents.get(uri)?;
        let (ast, symbols) = (document.ast.as_ref()?, document.symbols.as_ref()?);
        let hit = find_identifier_at_position(ast, from_lsp_position(position))?;
        let symbol = symbols.resolve(&hit)?;
        Some((symbol, hit.range))
    }

    fn hover(&self, params: HoverParams) -> Option<Hover> {
        let position = params.text_document_position_params;
        let (symbol, range) = self.symbol_at(&position.text_document.uri, position.position)?;
        Some(Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value: hover_markdown(symbol),
            }),
            range: Some(to_lsp_range(range)),
        })
    }

    fn definition(&self, params: GotoDefinitionParams) -> Vec<Location> {
        let position = params.text_document_position_params;
        let uri = position.text_document.uri;
        match self.symbol_at(&uri, position.position) {
            Some((symbol, _)) if !symbol.is_builtin() => vec![Location {
                uri,
                range: to_lsp_range(symbol.range),
            }],
            _ => Vec::new(),
        }
    }

    fn completion(&self, params: CompletionParams) -> CompletionList {
        let uri = params.text_document_position.text_document.uri;
        let symbols = match self.documents.get(&uri) {
            // A document that failed to parse still offers the built-ins
            Some(document) => document
                .symbols
                .as_ref()
                .map_or_else(|| self.builtins.completions(), SymbolTable::completions),
            None => Vec::new(),
        };

        CompletionList {
            is_incomplete: false,
            items: symbols.into_iter().map(completion_item).collect(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}

fn respond(id: RequestId, result: impl Serialize) -> Response {
    match serde_json::to_value(result) {
        Ok(value) => Response::ok(id, value),
        Err(err) => {
            tracing::error!("failed to encode result of request {}: {}", id, err);
            Response::error(id, error_codes::INTERNAL_ERROR, err.to_string())
        }
    }
}

fn decode<P: DeserializeOwned>(method: &str, params: Value) -> Option<P> {
    serde_json::from_value(params)
        .map_err(|err| tracing::warn!("invalid params for {}: {}", method, err))
        .ok()
}

fn publish_diagnostics(
    uri: Url,
    diagnostics: Vec<Diagnostic>,
    version: Option<i32>,
) -> Option<Message> {
    let params = PublishDiagnosticsParams::new(uri, diagnostics, version);
    match serde_json::to_value(params) {
        Ok(params) => Some(Message::notification(
            "textDocument/publishDiagnostics",
            params,
        )),
        Err(err) => {
            tracing::error!("failed to encode diagnostics: {}", err);
            None
        }
    }
}

fn completion_item(symbol: &Symbol) -> CompletionItem {
    let kind = match symbol.kind {
        SymbolKind::Function => CompletionItemKind::FUNCTION,
        SymbolKind::Struct | SymbolKind::BuiltinType => CompletionItemKind::CLASS,
        SymbolKind::Constant => CompletionItemKind::CONSTANT,
        SymbolKind::Variable | SymbolKind::Parameter | SymbolKind::Field => {
            CompletionItemKind::VARIABLE
        }
    };

    CompletionItem {
        label: symbol.name.to_string(),
        kind: Some(kind),
        detail: Some(symbol.type_name.clone()),
        documentation: Some(Documentation::String(
            symbol.documentation_or_default().to_string(),
        )),
        ..Default::default()
    }
}

fn from_lsp_position(position: lsp_types::Position) -> Position {
    Position::at(position.line, position.character)
}

fn to_lsp_range(range: Range) -> lsp_types::Range {
    lsp_types::Range {
        start: lsp_types::Position::new(range.start.line, range.start.column),
        end: lsp_types::Position::new(range.end.line, range.end.column),
    }
}

/// Serve one client until `shutdown`, `exit` or end of input.
///
/// The session is configured from `config` up front, so traffic sent
/// before `initialize` is answered; `initialize` may then switch the
/// keyword language. Frames that cannot be decoded are logged and skipped;
/// only I/O errors end the loop early.
pub fn run<R: BufRead, W: Write>(
    mut reader: R,
    mut writer: W,
    config: ServerConfig,
) -> Result<(), TransportError> {
    let mut session = Session::new(config);
    tracing::info!(
        "{} {} started (language {})",
        SERVER_NAME,
        env!("CARGO_PKG_VERSION"),
        session.config().language
    );

    loop {
        let message = match read_message(&mut reader) {
            Ok(Some(message)) => message,
            Ok(None) => {
                tracing::info!("input closed");
                break;
            }
            Err(err) if err.is_recoverable() => {
                tracing::warn!("skipping malformed message: {}", err);
                continue;
            }
            Err(err) => return Err(err),
        };

        for outgoing in session.handle(message) {
            write_message(&mut writer, &outgoing)?;
        }

        if session.is_shut_down() || session.should_exit() {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const URI: &str = "file:///tmp/main.seen";

    fn open(session: &mut Session, text: &str) -> Vec<Message> {
        session.handle(Message::notification(
            "textDocument/didOpen",
            json!({
                "textDocument": {"uri": URI, "languageId": "seen", "version": 1, "text": text}
            }),
        ))
    }

    fn position_params(line: u32, character: u32) -> Value {
        json!({"textDocument": {"uri": URI}, "position": {"line": line, "character": character}})
    }

    fn result(messages: Vec<Message>) -> Value {
        match messages.as_slice() {
            [Message::Response(Response { result: Some(value), error: None, .. })] => value.clone(),
            other => panic!("expected one successful response, got {:?}", other),
        }
    }

    #[test]
    fn test_initialize_reports_capabilities() {
        let mut session = Session::default();
        let value = result(session.handle(Message::request(1, "initialize", json!({}))));
        let caps = &value["capabilities"];
        assert_eq!(caps["textDocumentSync"], json!(1));
        assert_eq!(caps["hoverProvider"], json!(true));
        assert_eq!(caps["definitionProvider"], json!(true));
        assert_eq!(caps["completionProvider"]["triggerCharacters"], json!(["."]));
        assert_eq!(value["serverInfo"]["name"], json!("seen-lsp"));
    }

    #[test]
    fn test_initialization_options_select_language() {
        let mut session = Session::default();
        open(&mut session, "دالة f() { }");
        session.handle(Message::request(
            1,
            "initialize",
            json!({"initializationOptions": {"language": "ar"}}),
        ));
        assert_eq!(session.config().language, "ar");
        let uri = Url::parse(URI).unwrap();
        let document = session.documents().get(&uri).unwrap();
        assert!(document.symbols.as_ref().unwrap().lookup("f").is_some());
    }

    #[test]
    fn test_did_open_publishes_diagnostics() {
        let mut session = Session::default();
        let messages = open(&mut session, "let = 1");
        let [Message::Notification(note)] = messages.as_slice() else {
            panic!("expected one notification, got {:?}", messages);
        };
        assert_eq!(note.method, "textDocument/publishDiagnostics");
        let diagnostics = note.params["diagnostics"].as_array().unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0]["severity"], json!(1));
        assert_eq!(diagnostics[0]["source"], json!("seen"));
        assert_eq!(diagnostics[0]["range"]["start"], json!({"line": 0, "character": 4}));
    }

    #[test]
    fn test_clean_document_publishes_no_diagnostics() {
        let mut session = Session::default();
        let messages = open(&mut session, "let x = 1");
        let [Message::Notification(note)] = messages.as_slice() else {
            panic!("expected one notification");
        };
        assert_eq!(note.params["diagnostics"], json!([]));
        assert_eq!(note.params["version"], json!(1));
    }

    #[test]
    fn test_did_change_replaces_document() {
        let mut session = Session::default();
        open(&mut session, "let old = 1");
        session.handle(Message::notification(
            "textDocument/didChange",
            json!({
                "textDocument": {"uri": URI, "version": 2},
                "contentChanges": [{"text": "let new = 2"}]
            }),
        ));
        let uri = Url::parse(URI).unwrap();
        let document = session.documents().get(&uri).unwrap();
        assert_eq!(document.version, 2);
        let symbols = document.symbols.as_ref().unwrap();
        assert!(symbols.lookup("old").is_none());
        assert!(symbols.lookup("new").is_some());
    }

    #[test]
    fn test_did_close_removes_document_and_clears_diagnostics() {
        let mut session = Session::default();
        open(&mut session, "let x = 1");
        let messages = session.handle(Message::notification(
            "textDocument/didClose",
            json!({"textDocument": {"uri": URI}}),
        ));
        assert!(session.documents().is_empty());
        let [Message::Notification(note)] = messages.as_slice() else {
            panic!("expected one notification");
        };
        assert_eq!(note.params["diagnostics"], json!([]));
    }

    #[test]
    fn test_hover_on_parameter_use() {
        let mut session = Session::default();
        open(&mut session, "fun add(a: Int, b: Int): Int { return a + b }");
        let value = result(session.handle(Message::request(
            2,
            "textDocument/hover",
            position_params(0, 38),
        )));
        assert_eq!(value["contents"]["kind"], json!("markdown"));
        assert_eq!(
            value["contents"]["value"],
            json!("**Parameter** a\n\n```seen\na: Int\n```")
        );
        assert_eq!(
            value["range"],
            json!({"start": {"line": 0, "character": 38}, "end": {"line": 0, "character": 39}})
        );
    }

    #[test]
    fn test_hover_on_whitespace_is_null() {
        let mut session = Session::default();
        open(&mut session, "let x = 1\n\n");
        let value = result(session.handle(Message::request(
            2,
            "textDocument/hover",
            position_params(1, 0),
        )));
        assert!(value.is_null());
    }

    #[test]
    fn test_definition_of_use_points_at_declaration() {
        let mut session = Session::default();
        open(&mut session, "let count = 1\nlet twice = count * 2");
        let value = result(session.handle(Message::request(
            3,
            "textDocument/definition",
            position_params(1, 14),
        )));
        assert_eq!(
            value,
            json!([{
                "uri": URI,
                "range": {"start": {"line": 0, "character": 0}, "end": {"line": 0, "character": 13}}
            }])
        );
    }

    #[test]
    fn test_definition_of_builtin_is_empty() {
        let mut session = Session::default();
        open(&mut session, "let x: Int = 1");
        let value = result(session.handle(Message::request(
            3,
            "textDocument/definition",
            position_params(0, 8),
        )));
        assert_eq!(value, json!([]));
    }

    #[test]
    fn test_completion_items() {
        let mut session = Session::default();
        open(&mut session, "/// The answer.\nconst Answer = 42\nfun run() { }");
        let value = result(session.handle(Message::request(
            4,
            "textDocument/completion",
            position_params(2, 0),
        )));
        assert_eq!(value["isIncomplete"], json!(false));
        let items = value["items"].as_array().unwrap();
        assert_eq!(items[0]["label"], json!("Answer"));
        assert_eq!(items[0]["kind"], json!(21));
        assert_eq!(items[0]["detail"], json!("Const"));
        assert_eq!(items[0]["documentation"], json!("The answer."));
        assert_eq!(items[1]["label"], json!("run"));
        assert_eq!(items[1]["kind"], json!(3));
        let int = items.iter().find(|i| i["label"] == json!("Int")).unwrap();
        assert_eq!(int["kind"], json!(7));
    }

    #[test]
    fn test_completion_for_unknown_document_is_empty() {
        let mut session = Session::default();
        let value = result(session.handle(Message::request(
            4,
            "textDocument/completion",
            position_params(0, 0),
        )));
        assert_eq!(value["items"], json!([]));
    }

    #[test]
    fn test_completion_for_broken_document_offers_builtins() {
        let mut session = Session::default();
        open(&mut session, "fun (");
        let value = result(session.handle(Message::request(
            4,
            "textDocument/completion",
            position_params(0, 0),
        )));
        assert_eq!(value["items"].as_array().unwrap().len(), 6);
    }

    #[test]
    fn test_invalid_request_params_get_error_response() {
        let mut session = Session::default();
        let messages = session.handle(Message::request(5, "textDocument/hover", json!({"x": 1})));
        let [Message::Response(response)] = messages.as_slice() else {
            panic!("expected one response");
        };
        assert_eq!(response.error.as_ref().unwrap().code, error_codes::INVALID_PARAMS);
        assert!(response.result.is_none());
    }

    #[test]
    fn test_unknown_methods_are_ignored() {
        let mut session = Session::default();
        assert!(session
            .handle(Message::request(6, "workspace/symbol", json!({})))
            .is_empty());
        assert!(session
            .handle(Message::notification("$/cancelRequest", json!({"id": 1})))
            .is_empty());
    }

    #[test]
    fn test_shutdown_and_exit() {
        let mut session = Session::default();
        let value = result(session.handle(Message::request(7, "shutdown", Value::Null)));
        assert!(value.is_null());
        assert!(session.is_shut_down());
        assert!(!session.should_exit());
        session.handle(Message::notification("exit", Value::Null));
        assert!(session.should_exit());
    }

    #[test]
    fn test_requests_after_shutdown_are_invalid() {
        let mut session = Session::default();
        open(&mut session, "let x = 1");
        session.handle(Message::request(7, "shutdown", Value::Null));
        let messages =
            session.handle(Message::request(8, "textDocument/hover", position_params(0, 4)));
        let [Message::Response(response)] = messages.as_slice() else {
            panic!("expected one response, got {:?}", messages);
        };
        assert_eq!(response.id, RequestId::Number(8));
        assert!(response.result.is_none());
        assert_eq!(response.error.as_ref().unwrap().code, error_codes::INVALID_REQUEST);
    }

    #[test]
    fn test_requests_before_initialize_are_served() {
        let mut session = Session::default();
        open(&mut session, "let x = 1");
        let value = result(session.handle(Message::request(
            1,
            "textDocument/hover",
            position_params(0, 4),
        )));
        let markdown = value["contents"]["value"].as_str().unwrap();
        assert!(markdown.starts_with("**Private Variable** x"), "{}", markdown);
    }
}
