// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process fakes for [`crate::Coordinator`] tests, standing in for
//! `flotilla-transport`'s HTTP+SSE client and `flotilla-worktree`'s git
//! shelling so tests exercise the coordinator's logic without touching a
//! real network or filesystem.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use flotilla_core::envelope::{Envelope, JsonRpcError};
use flotilla_transport::{ErrorHandler, HandlerResult, MessageHandler, RequestHandler, TransportClient, TransportError};
use flotilla_worktree::{WorkingCopy, WorkingCopyProvider};

/// A [`TransportClient`] driven entirely by the test: canned responses for
/// `send_request`, and helpers to push inbound notifications or invoke a
/// registered request handler as if the remote had called it.
pub struct FakeTransport {
    connected: AtomicBool,
    session_id: String,
    responses: Mutex<HashMap<String, Value>>,
    fail_connect: AtomicBool,
    fail_next_send: AtomicBool,
    sent: Mutex<Vec<(String, Value)>>,
    handlers: Mutex<HashMap<String, RequestHandler>>,
    message_handlers: Mutex<Vec<MessageHandler>>,
    error_handlers: Mutex<Vec<ErrorHandler>>,
}

impl FakeTransport {
    pub fn new(session_id: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            connected: AtomicBool::new(false),
            session_id: session_id.into(),
            responses: Mutex::new(HashMap::new()),
            fail_connect: AtomicBool::new(false),
            fail_next_send: AtomicBool::new(false),
            sent: Mutex::new(Vec::new()),
            handlers: Mutex::new(HashMap::new()),
            message_handlers: Mutex::new(Vec::new()),
            error_handlers: Mutex::new(Vec::new()),
        })
    }

    pub fn fail_to_connect(self: &Arc<Self>) {
        self.fail_connect.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_send(self: &Arc<Self>) {
        self.fail_next_send.store(true, Ordering::SeqCst);
    }

    pub fn set_response(&self, method: &str, value: Value) {
        self.responses.lock().insert(method.to_string(), value);
    }

    pub fn sent_requests(&self) -> Vec<(String, Value)> {
        self.sent.lock().clone()
    }

    /// Simulates the remote pushing a `session/update` (or any) envelope
    /// down the stream.
    pub fn push_message(&self, envelope: Envelope) {
        for handler in self.message_handlers.lock().iter() {
            handler(envelope.clone());
        }
    }

    /// Simulates the remote issuing a peer-initiated request, e.g.
    /// `request_permission`, and returns whatever the registered handler
    /// resolves to.
    pub async fn invoke_handler(&self, method: &str, request_id: flotilla_core::envelope::RequestId, params: Value) -> HandlerResult {
        let handler = self.handlers.lock().get(method).cloned();
        match handler {
            Some(handler) => handler(request_id, params).await,
            None => Err(JsonRpcError::new(JsonRpcError::HANDLER_FAILED, format!("no handler registered for {method}"))),
        }
    }

    pub fn fire_error(&self, message: impl Into<String>) {
        let message = message.into();
        for handler in self.error_handlers.lock().iter() {
            handler(message.clone());
        }
    }
}

#[async_trait]
impl TransportClient for FakeTransport {
    async fn connect(&self) -> Result<String, TransportError> {
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(TransportError::Http { status: 503, body: "unavailable".to_string() });
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(self.session_id.clone())
    }

    async fn send_request(&self, method: &str, params: Value) -> Result<Value, TransportError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(TransportError::NotConnected);
        }
        if self.fail_next_send.swap(false, Ordering::SeqCst) {
            return Err(TransportError::Rpc("simulated failure".to_string()));
        }
        self.sent.lock().push((method.to_string(), params));
        Ok(self.responses.lock().get(method).cloned().unwrap_or(Value::Object(Default::default())))
    }

    async fn send_notification(&self, method: &str, params: Value) -> Result<(), TransportError> {
        self.sent.lock().push((method.to_string(), params));
        Ok(())
    }

    fn register_request_handler(&self, method: &str, handler: RequestHandler) {
        self.handlers.lock().insert(method.to_string(), handler);
    }

    fn on_message(&self, handler: MessageHandler) {
        self.message_handlers.lock().push(handler);
    }

    fn on_error(&self, handler: ErrorHandler) {
        self.error_handlers.lock().push(handler);
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}

/// A [`WorkingCopyProvider`] that never touches git or the filesystem.
pub struct FakeWorktreeProvider {
    pub available: bool,
    pub created: Mutex<Vec<String>>,
    pub removed: Mutex<Vec<String>>,
}

impl FakeWorktreeProvider {
    pub fn new(available: bool) -> Arc<Self> {
        Arc::new(Self { available, created: Mutex::new(Vec::new()), removed: Mutex::new(Vec::new()) })
    }
}

#[async_trait]
impl WorkingCopyProvider for FakeWorktreeProvider {
    async fn is_available(&self) -> bool {
        self.available
    }

    async fn ensure(&self) {}

    async fn create(&self, name: &str, _base_branch: Option<&str>) -> Option<WorkingCopy> {
        self.created.lock().push(name.to_string());
        Some(WorkingCopy {
            path: PathBuf::from(format!("/tmp/fake-worktrees/{name}")),
            branch: format!("goose/{name}"),
            commit: "deadbeef".to_string(),
        })
    }

    async fn remove(&self, name: &str) {
        self.removed.lock().push(name.to_string());
    }

    async fn list(&self) -> Vec<WorkingCopy> {
        Vec::new()
    }

    async fn diff(&self, _path: &Path) -> String {
        String::new()
    }

    async fn status(&self, _path: &Path) -> String {
        String::new()
    }

    async fn commit(&self, _path: &Path, _message: &str) -> bool {
        true
    }
}
