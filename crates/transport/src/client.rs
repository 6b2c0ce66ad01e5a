// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The transport client (C1): one per workstream. Opens a
//! session against the remote, pumps an inbound SSE event stream, sends
//! outbound requests/notifications over HTTP POST, matches responses to
//! callers, and dispatches peer-initiated requests to registered handlers.
//!
//! Built on `reqwest` + `eventsource-stream`: a background task pumps
//! decoded SSE frames into the registered message/error handlers and
//! resolves whichever pending request they answer, the same shape a
//! WebSocket-backed remote client would use with an `mpsc` channel in
//! place of the event stream.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;

use flotilla_core::envelope::{Envelope, JsonRpcError, RequestId};

use crate::error::TransportError;

pub type HandlerResult = Result<Value, JsonRpcError>;
/// Registered per-method on [`TransportClient::register_request_handler`].
/// Receives the peer's request id alongside its params so the handler can
/// thread it into whatever it hands back to the caller (e.g. a pending
/// permission record that must echo the id it was asked under).
pub type RequestHandler =
    Arc<dyn Fn(RequestId, Value) -> Pin<Box<dyn Future<Output = HandlerResult> + Send>> + Send + Sync>;
pub type MessageHandler = Arc<dyn Fn(Envelope) + Send + Sync>;
pub type ErrorHandler = Arc<dyn Fn(String) + Send + Sync>;

#[async_trait]
pub trait TransportClient: Send + Sync {
    async fn connect(&self) -> Result<String, TransportError>;
    async fn send_request(&self, method: &str, params: Value) -> Result<Value, TransportError>;
    async fn send_notification(&self, method: &str, params: Value) -> Result<(), TransportError>;
    fn register_request_handler(&self, method: &str, handler: RequestHandler);
    fn on_message(&self, handler: MessageHandler);
    fn on_error(&self, handler: ErrorHandler);
    async fn disconnect(&self);
}

struct Pending {
    map: Mutex<HashMap<RequestId, oneshot::Sender<Result<Value, String>>>>,
    counter: AtomicI64,
}

impl Pending {
    fn new() -> Self {
        Self { map: Mutex::new(HashMap::new()), counter: AtomicI64::new(1) }
    }

    fn next_id(&self) -> RequestId {
        RequestId::Number(self.counter.fetch_add(1, Ordering::SeqCst))
    }
}

/// HTTP + SSE implementation of [`TransportClient`].
pub struct HttpSseTransport {
    http: reqwest::Client,
    base_url: String,
    session_id: Mutex<Option<String>>,
    pending: Arc<Pending>,
    handlers: Arc<Mutex<HashMap<String, RequestHandler>>>,
    message_handlers: Arc<Mutex<Vec<MessageHandler>>>,
    error_handlers: Arc<Mutex<Vec<ErrorHandler>>>,
    pump: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl HttpSseTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            session_id: Mutex::new(None),
            pending: Arc::new(Pending::new()),
            handlers: Arc::new(Mutex::new(HashMap::new())),
            message_handlers: Arc::new(Mutex::new(Vec::new())),
            error_handlers: Arc::new(Mutex::new(Vec::new())),
            pump: Mutex::new(None),
        }
    }

    fn session_id_or_not_connected(&self) -> Result<String, TransportError> {
        self.session_id.lock().clone().ok_or(TransportError::NotConnected)
    }

    fn message_url(&self, session_id: &str) -> String {
        format!("{}/acp/session/{session_id}/message", self.base_url)
    }

    fn stream_url(&self, session_id: &str) -> String {
        format!("{}/acp/session/{session_id}/stream", self.base_url)
    }

    async fn post_envelope(&self, session_id: &str, envelope: &Envelope) -> Result<(), TransportError> {
        let resp = self.http.post(self.message_url(session_id)).json(envelope).send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Http { status, body });
        }
        Ok(())
    }

    fn spawn_inbound_pump(&self, session_id: String) {
        let http = self.http.clone();
        let url = self.stream_url(&session_id);
        let pending = Arc::clone(&self.pending);
        let handlers = Arc::clone(&self.handlers);
        let message_handlers = Arc::clone(&self.message_handlers);
        let error_handlers = Arc::clone(&self.error_handlers);
        let session_for_responses = session_id.clone();
        let post_url = format!("{}/acp/session/{session_for_responses}/message", self.base_url);
        let post_client = self.http.clone();

        let join = tokio::spawn(async move {
            let response = match http.get(&url).header(reqwest::header::ACCEPT, "text/event-stream").send().await {
                Ok(r) => r,
                Err(e) => {
                    for handler in error_handlers.lock().iter() {
                        handler(format!("failed to open SSE stream: {e}"));
                    }
                    return;
                }
            };
            if !response.status().is_success() {
                let status = response.status();
                for handler in error_handlers.lock().iter() {
                    handler(format!("SSE stream returned {status}"));
                }
                return;
            }

            let mut events = response.bytes_stream().eventsource();
            while let Some(event) = events.next().await {
                let event = match event {
                    Ok(e) => e,
                    Err(e) => {
                        for handler in error_handlers.lock().iter() {
                            handler(format!("SSE stream error: {e}"));
                        }
                        continue;
                    }
                };
                if event.data.trim().is_empty() {
                    continue;
                }
                let envelope: Envelope = match serde_json::from_str(&event.data) {
                    Ok(env) => env,
                    Err(e) => {
                        for handler in error_handlers.lock().iter() {
                            handler(format!("failed to decode envelope: {e}"));
                        }
                        continue;
                    }
                };
                dispatch(
                    envelope,
                    &pending,
                    &handlers,
                    &message_handlers,
                    &post_client,
                    &post_url,
                )
                .await;
            }
        });

        *self.pump.lock() = Some(join);
    }
}

async fn dispatch(
    envelope: Envelope,
    pending: &Arc<Pending>,
    handlers: &Arc<Mutex<HashMap<String, RequestHandler>>>,
    message_handlers: &Arc<Mutex<Vec<MessageHandler>>>,
    post_client: &reqwest::Client,
    post_url: &str,
) {
    if envelope.is_response() {
        // Safety: `is_response` guarantees `id` is present.
        let Some(id) = envelope.id.clone() else { return };
        let resolver = pending.map.lock().remove(&id);
        if let Some(resolver) = resolver {
            let outcome = match envelope.error {
                Some(err) => Err(err.message),
                None => Ok(envelope.result.unwrap_or(Value::Null)),
            };
            let _ = resolver.send(outcome);
        }
        return;
    }

    if envelope.is_peer_request() {
        let Some(id) = envelope.id.clone() else { return };
        let method = envelope.method.clone().unwrap_or_default();
        let handler = handlers.lock().get(&method).cloned();
        match handler {
            Some(handler) => {
                let params = envelope.params.clone().unwrap_or(Value::Null);
                let post_client = post_client.clone();
                let post_url = post_url.to_string();
                let handler_id = id.clone();
                tokio::spawn(async move {
                    let response_envelope = match handler(handler_id, params).await {
                        Ok(result) => Envelope::response(id, result),
                        Err(error) => Envelope::error_response(id, error),
                    };
                    let _ = post_client.post(&post_url).json(&response_envelope).send().await;
                });
            }
            None => {
                for handler in message_handlers.lock().iter() {
                    handler(envelope.clone());
                }
            }
        }
        return;
    }

    // Notification.
    for handler in message_handlers.lock().iter() {
        handler(envelope.clone());
    }
}

#[async_trait]
impl TransportClient for HttpSseTransport {
    async fn connect(&self) -> Result<String, TransportError> {
        #[derive(serde::Deserialize)]
        struct SessionResponse {
            session_id: String,
        }
        let resp = self.http.post(format!("{}/acp/session", self.base_url)).send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Http { status, body });
        }
        let body: SessionResponse = resp.json().await?;
        *self.session_id.lock() = Some(body.session_id.clone());
        self.spawn_inbound_pump(body.session_id.clone());
        Ok(body.session_id)
    }

    async fn send_request(&self, method: &str, params: Value) -> Result<Value, TransportError> {
        let session_id = self.session_id_or_not_connected()?;
        let id = self.pending.next_id();
        let (tx, rx) = oneshot::channel();
        self.pending.map.lock().insert(id.clone(), tx);

        let envelope = Envelope::request(id.clone(), method, params);
        if let Err(e) = self.post_envelope(&session_id, &envelope).await {
            self.pending.map.lock().remove(&id);
            return Err(e);
        }

        match rx.await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(message)) => Err(TransportError::Rpc(message)),
            Err(_) => Err(TransportError::NotConnected),
        }
    }

    async fn send_notification(&self, method: &str, params: Value) -> Result<(), TransportError> {
        let session_id = self.session_id_or_not_connected()?;
        let envelope = Envelope::notification(method, params);
        self.post_envelope(&session_id, &envelope).await
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
        if let Some(join) = self.pump.lock().take() {
            join.abort();
        }
        // Pending calls are simply abandoned --
        // dropping their senders fails the awaiting `rx.await` with RecvError.
        self.pending.map.lock().clear();
        *self.session_id.lock() = None;
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
