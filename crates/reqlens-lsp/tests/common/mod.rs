//! Common test utilities for integration tests.
//!
//! Provides `LspClient`, which drives the `reqlens-lsp` binary over stdio.

use serde_json::{Value, json};
use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Child, Command, Stdio};

/// LSP test client for communicating with the server binary.
pub(crate) struct LspClient {
    process: Child,
    /// Methods of server-to-client requests seen so far.
    server_requests: Vec<String>,
    reader: BufReader<std::process::ChildStdout>,
}

impl LspClient {
    /// Spawn the reqlens-lsp binary against the public index.
    pub(crate) fn spawn() -> Self {
        Self::spawn_with_env(&[])
    }

    /// Spawn the reqlens-lsp binary with extra environment variables.
    pub(crate) fn spawn_with_env(env: &[(&str, &str)]) -> Self {
        let mut command = Command::new(env!("CARGO_BIN_EXE_reqlens-lsp"));
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        for (key, value) in env {
            command.env(key, value);
        }

        let mut process = command.spawn().expect("Failed to spawn reqlens-lsp binary");
        let stdout = process.stdout.take().expect("Failed to capture stdout");

        Self {
            process,
            server_requests: Vec::new(),
            reader: BufReader::new(stdout),
        }
    }

    /// Methods of requests the server has sent to the client.
    #[allow(dead_code)] // Not used in all tests
    pub(crate) fn server_requests(&self) -> &[String] {
        &self.server_requests
    }

    /// Send a JSON-RPC message to the server.
    pub(crate) fn send(&mut self, message: &Value) {
        let body = serde_json::to_string(message).unwrap();
        let header = format!("Content-Length: {}\r\n\r\n", body.len());

        let stdin = self.process.stdin.as_mut().expect("stdin not captured");
        stdin.write_all(header.as_bytes()).unwrap();
        stdin.write_all(body.as_bytes()).unwrap();
        stdin.flush().unwrap();
    }

    fn read_message(&mut self) -> Value {
        let mut content_length = 0;
        loop {
            let mut line = String::new();
            let bytes_read = self
                .reader
                .read_line(&mut line)
                .expect("Failed to read header");

            assert!(bytes_read != 0, "Server closed connection unexpectedly");

            if line == "\r\n" || line == "\n" {
                if content_length > 0 {
                    break;
                }
                continue;
            }

            if line.to_lowercase().starts_with("content-length:") {
                content_length = line
                    .split(':')
                    .nth(1)
                    .unwrap()
                    .trim()
                    .parse()
                    .expect("Invalid content length");
            }
        }

        let mut body = vec![0u8; content_length];
        self.reader.read_exact(&mut body).expect("Failed to read body");

        serde_json::from_slice(&body).unwrap_or_else(|e| {
            panic!("Invalid JSON: {e} in: {:?}", String::from_utf8_lossy(&body))
        })
    }

    /// Read the response with the given id.
    ///
    /// Notifications are skipped. Server-to-client requests (such as
    /// `workspace/inlayHint/refresh`) are acknowledged with a null result.
    pub(crate) fn read_response(&mut self, expected_id: i64) -> Value {
        loop {
            let message = self.read_message();

            let Some(id) = message.get("id").cloned() else {
                continue;
            };

            if let Some(method) = message.get("method").and_then(Value::as_str) {
                self.server_requests.push(method.to_string());
                self.send(&json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "result": null
                }));
                continue;
            }

            if id == json!(expected_id) {
                return message;
            }
        }
    }

    /// Initialize the LSP session.
    pub(crate) fn initialize(&mut self) -> Value {
        self.initialize_with_options(Value::Null)
    }

    /// Initialize the LSP session with `initializationOptions`.
    pub(crate) fn initialize_with_options(&mut self, options: Value) -> Value {
        self.send(&json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "processId": null,
                "capabilities": {
                    "workspace": {
                        "inlayHint": {
                            "refreshSupport": true
                        },
                        "codeLens": {
                            "refreshSupport": true
                        }
                    },
                    "textDocument": {
                        "hover": {
                            "contentFormat": ["markdown", "plaintext"]
                        }
                    }
                },
                "initializationOptions": options,
                "rootUri": "file:///tmp",
                "workspaceFolders": null
            }
        }));

        let response = self.read_response(1);

        self.send(&json!({
            "jsonrpc": "2.0",
            "method": "initialized",
            "params": {}
        }));

        response
    }

    /// Open a text document.
    pub(crate) fn did_open(&mut self, uri: &str, language_id: &str, text: &str) {
        self.send(&json!({
            "jsonrpc": "2.0",
            "method": "textDocument/didOpen",
            "params": {
                "textDocument": {
                    "uri": uri,
                    "languageId": language_id,
                    "version": 1,
                    "text": text
                }
            }
        }));
    }

    /// Replace the full text of an open document.
    #[allow(dead_code)] // Not used in all tests
    pub(crate) fn did_change(&mut self, uri: &str, version: i32, text: &str) {
        self.send(&json!({
            "jsonrpc": "2.0",
            "method": "textDocument/didChange",
            "params": {
                "textDocument": {"uri": uri, "version": version},
                "contentChanges": [{"text": text}]
            }
        }));
    }

    /// Close a text document.
    #[allow(dead_code)] // Not used in all tests
    pub(crate) fn did_close(&mut self, uri: &str) {
        self.send(&json!({
            "jsonrpc": "2.0",
            "method": "textDocument/didClose",
            "params": {
                "textDocument": {"uri": uri}
            }
        }));
    }

    /// Request hover information.
    #[allow(dead_code)] // Not used in all tests
    pub(crate) fn hover(&mut self, id: i64, uri: &str, line: u32, character: u32) -> Value {
        self.send(&json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "textDocument/hover",
            "params": {
                "textDocument": {"uri": uri},
                "position": {"line": line, "character": character}
            }
        }));
        self.read_response(id)
    }

    /// Request inlay hints.
    #[allow(dead_code)] // Not used in all tests
    pub(crate) fn inlay_hints(&mut self, id: i64, uri: &str) -> Value {
        self.send(&json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "textDocument/inlayHint",
            "params": {
                "textDocument": {"uri": uri},
                "range": {
                    "start": {"line": 0, "character": 0},
                    "end": {"line": 100, "character": 0}
                }
            }
        }));
        self.read_response(id)
    }

    /// Request code lenses.
    #[allow(dead_code)] // Not used in all tests
    pub(crate) fn code_lens(&mut self, id: i64, uri: &str) -> Value {
        self.send(&json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "textDocument/codeLens",
            "params": {
                "textDocument": {"uri": uri}
            }
        }));
        self.read_response(id)
    }

    /// Resolve a code lens returned by [`Self::code_lens`].
    #[allow(dead_code)] // Not used in all tests
    pub(crate) fn code_lens_resolve(&mut self, id: i64, lens: &Value) -> Value {
        self.send(&json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "codeLens/resolve",
            "params": lens
        }));
        self.read_response(id)
    }

    /// Execute a workspace command.
    #[allow(dead_code)] // Not used in all tests
    pub(crate) fn execute_command(&mut self, id: i64, command: &str) -> Value {
        self.send(&json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "workspace/executeCommand",
            "params": {
                "command": command,
                "arguments": []
            }
        }));
        self.read_response(id)
    }

    /// Shutdown the server.
    pub(crate) fn shutdown(&mut self) -> Value {
        self.send(&json!({
            "jsonrpc": "2.0",
            "id": 999,
            "method": "shutdown"
        }));
        self.read_response(999)
    }
}

impl Drop for LspClient {
    fn drop(&mut self) {
        let _ = self.process.kill();
    }
}
