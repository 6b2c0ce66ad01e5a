// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The workstream coordinator (C4) and the observer read-model it exposes
//! (C5).
//!
//! One `parking_lot::Mutex`-guarded table owned by a long-lived struct,
//! with `tracing` spans around every state-changing operation and a
//! `thiserror` enum for everything that can go wrong. Rather than
//! dispatching queued work to workers over a channel, the analogous
//! "worker" here is a per-workstream [`TransportClient`], and dispatch is
//! driven by inbound protocol events rather than a poll loop.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::oneshot;

use flotilla_core::envelope::{Envelope, JsonRpcError, RequestId};
use flotilla_core::event::CoordinatorEvent;
use flotilla_core::notification::{Notification, NotificationKind};
use flotilla_core::permission::{PendingPermission, PermissionOutcome};
use flotilla_core::state::WorkstreamState;
use flotilla_core::tool_call::{ToolCall, ToolStatus};
use flotilla_core::workstream::{Workstream, WorkstreamId};
use flotilla_core::{Clock, SystemClock};
use flotilla_transport::{Classification, HandlerResult, TransportClient};
use flotilla_worktree::WorkingCopyProvider;

use crate::error::CoordinatorError;
use crate::observer::{Observer, ObserverRegistry, SubscriptionHandle};

/// How the coordinator reaches the remote and the local checkout.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub server_base_url: String,
    pub repo_path: PathBuf,
    pub use_worktrees: bool,
}

struct State {
    workstreams: HashMap<WorkstreamId, Workstream>,
    transports: HashMap<WorkstreamId, Arc<dyn TransportClient>>,
    /// Invariant P1: at most one entry per workstream, kept in lockstep
    /// with `workstreams[w].pending_permission`.
    permission_resolvers: HashMap<WorkstreamId, flotilla_core::permission::PermissionResolver>,
}

/// Mints and drives every workstream's transport client, working copy, and
/// lifecycle state, and fans protocol-derived events out to observers.
pub struct Coordinator<C: Clock = SystemClock> {
    config: CoordinatorConfig,
    clock: C,
    worktree: Arc<dyn WorkingCopyProvider>,
    transport_factory: Box<dyn Fn() -> Arc<dyn TransportClient> + Send + Sync>,
    state: Mutex<State>,
    observers: Arc<ObserverRegistry>,
}

impl Coordinator<SystemClock> {
    pub fn new(
        config: CoordinatorConfig,
        worktree: Arc<dyn WorkingCopyProvider>,
        transport_factory: impl Fn() -> Arc<dyn TransportClient> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Self::with_clock(config, worktree, transport_factory, SystemClock)
    }
}

impl<C: Clock + 'static> Coordinator<C> {
    pub fn with_clock(
        config: CoordinatorConfig,
        worktree: Arc<dyn WorkingCopyProvider>,
        transport_factory: impl Fn() -> Arc<dyn TransportClient> + Send + Sync + 'static,
        clock: C,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            clock,
            worktree,
            transport_factory: Box::new(transport_factory),
            state: Mutex::new(State {
                workstreams: HashMap::new(),
                transports: HashMap::new(),
                permission_resolvers: HashMap::new(),
            }),
            observers: Arc::new(ObserverRegistry::new()),
        })
    }

    // ---- mutating operations -------------------------------------------

    #[tracing::instrument(skip(self, task))]
    pub async fn create_workstream(
        self: &Arc<Self>,
        name: &str,
        task: &str,
    ) -> Result<WorkstreamId, CoordinatorError> {
        let id = WorkstreamId::new();
        let sanitized_name = {
            let mut state = self.state.lock();
            let workstream = Workstream::new(id, name, task, &self.clock);
            let sanitized = workstream.name.clone();
            state.workstreams.insert(id, workstream);
            sanitized
        };

        if self.config.use_worktrees && self.worktree.is_available().await {
            self.worktree.ensure().await;
            match self.worktree.create(&sanitized_name, None).await {
                Some(wc) => {
                    let mut state = self.state.lock();
                    if let Some(workstream) = state.workstreams.get_mut(&id) {
                        workstream.worktree_path = Some(wc.path);
                        workstream.branch_name = Some(wc.branch);
                    }
                }
                None => self.note_worktree_unavailable(id),
            }
        }

        if let Err(e) = self.connect_workstream(id).await {
            self.fail_workstream(id, e.to_string());
            return Err(e);
        }

        Ok(id)
    }

    fn note_worktree_unavailable(&self, id: WorkstreamId) {
        let now = self.clock.epoch_ms();
        let notification = Notification::new(
            NotificationKind::Error,
            "Working copy unavailable",
            "continuing in the shared checkout",
            now,
            id,
        );
        {
            let mut state = self.state.lock();
            if let Some(workstream) = state.workstreams.get_mut(&id) {
                workstream.push_notification(notification.clone());
            }
        }
        self.observers.emit(id, CoordinatorEvent::Notification { notification });
    }

    async fn connect_workstream(self: &Arc<Self>, id: WorkstreamId) -> Result<(), CoordinatorError> {
        let transport: Arc<dyn TransportClient> = (self.transport_factory)();

        {
            let coordinator = Arc::clone(self);
            transport.on_error(Arc::new(move |message: String| coordinator.fail_workstream(id, message)));
        }
        {
            let coordinator = Arc::clone(self);
            transport.on_message(Arc::new(move |envelope: Envelope| coordinator.handle_protocol(id, envelope)));
        }
        {
            let coordinator = Arc::clone(self);
            transport.register_request_handler(
                "request_permission",
                Arc::new(move |request_id: RequestId, params: Value| {
                    let coordinator = Arc::clone(&coordinator);
                    Box::pin(async move { coordinator.handle_permission_request(id, request_id, params).await })
                }),
            );
        }

        transport.connect().await.map_err(CoordinatorError::HandshakeFailed)?;
        transport
            .send_request(
                "initialize",
                json!({
                    "protocolVersion": "2025-01-01",
                    "clientInfo": { "name": "flotilla", "version": env!("CARGO_PKG_VERSION") },
                }),
            )
            .await
            .map_err(CoordinatorError::HandshakeFailed)?;
        let cwd = self.session_cwd(id);
        let session = transport
            .send_request("session/new", json!({ "cwd": cwd, "mcpServers": [] }))
            .await
            .map_err(CoordinatorError::HandshakeFailed)?;
        let session_id = session.get("sessionId").and_then(Value::as_str).unwrap_or_default().to_string();

        let now = self.clock.epoch_ms();
        {
            let mut state = self.state.lock();
            state.transports.insert(id, transport);
            if let Some(workstream) = state.workstreams.get_mut(&id) {
                workstream.session_id = Some(session_id);
                workstream.state = WorkstreamState::Running;
                workstream.activity = "Idle - awaiting next instruction".to_string();
                workstream.last_activity_ms = now;
            }
        }
        self.emit_state_changed(id);
        Ok(())
    }

    fn session_cwd(&self, id: WorkstreamId) -> String {
        let worktree_path = self.state.lock().workstreams.get(&id).and_then(|w| w.worktree_path.clone());
        worktree_path.unwrap_or_else(|| self.config.repo_path.clone()).display().to_string()
    }

    pub async fn send_prompt(self: &Arc<Self>, id: WorkstreamId, text: &str) -> Result<(), CoordinatorError> {
        let (transport, session_id) = {
            let mut state = self.state.lock();
            let now = self.clock.epoch_ms();
            {
                let workstream =
                    state.workstreams.get_mut(&id).ok_or(CoordinatorError::UnknownWorkstream(id))?;
                workstream.append_operator_message(text, now);
                workstream.state = WorkstreamState::Running;
                workstream.activity = "Processing...".to_string();
            }
            let transport = state.transports.get(&id).cloned();
            let session_id = state.workstreams.get(&id).and_then(|w| w.session_id.clone());
            (transport, session_id)
        };
        self.emit_state_changed(id);

        let (Some(transport), Some(session_id)) = (transport, session_id) else {
            return Err(CoordinatorError::UnknownWorkstream(id));
        };

        let result = transport
            .send_request(
                "session/prompt",
                json!({ "sessionId": session_id, "prompt": [{ "type": "text", "text": text }] }),
            )
            .await;

        match result {
            Ok(_) => {
                let now = self.clock.epoch_ms();
                {
                    let mut state = self.state.lock();
                    if let Some(workstream) = state.workstreams.get_mut(&id) {
                        if workstream.state == WorkstreamState::Running {
                            workstream.activity = "Idle - awaiting next instruction".to_string();
                            workstream.last_activity_ms = now;
                        }
                    }
                }
                self.emit_state_changed(id);
                Ok(())
            }
            Err(e) => {
                self.fail_workstream(id, e.to_string());
                Err(CoordinatorError::Transport(e))
            }
        }
    }

    /// Convenience wrapper: if a working copy was provisioned, frames the
    /// task with its location before handing it to [`Self::send_prompt`].
    pub async fn start_task(self: &Arc<Self>, id: WorkstreamId) -> Result<(), CoordinatorError> {
        let prompt = {
            let state = self.state.lock();
            let workstream = state.workstreams.get(&id).ok_or(CoordinatorError::UnknownWorkstream(id))?;
            match (&workstream.worktree_path, &workstream.branch_name) {
                (Some(path), Some(branch)) => format!(
                    "You are working in a git worktree at: {} on branch {}.\n\n{}",
                    path.display(),
                    branch,
                    workstream.task
                ),
                _ => workstream.task.clone(),
            }
        };
        self.send_prompt(id, &prompt).await
    }

    pub fn respond_to_permission(&self, id: WorkstreamId, option_id: &str) -> Result<(), CoordinatorError> {
        let resolver = self.state.lock().permission_resolvers.remove(&id);
        let resolver = resolver.ok_or(CoordinatorError::NoPendingPermission(id))?;
        let _ = resolver.send(PermissionOutcome::selected(option_id));

        let now = self.clock.epoch_ms();
        {
            let mut state = self.state.lock();
            if let Some(workstream) = state.workstreams.get_mut(&id) {
                workstream.pending_permission = None;
                workstream.state = WorkstreamState::Running;
                workstream.activity = "Idle - awaiting next instruction".to_string();
                workstream.last_activity_ms = now;
            }
        }
        self.emit_state_changed(id);
        Ok(())
    }

    pub fn pause_workstream(&self, id: WorkstreamId) -> Result<(), CoordinatorError> {
        self.transition(id, WorkstreamState::Running, WorkstreamState::Paused)
    }

    pub fn resume_workstream(&self, id: WorkstreamId) -> Result<(), CoordinatorError> {
        self.transition(id, WorkstreamState::Paused, WorkstreamState::Running)
    }

    fn transition(&self, id: WorkstreamId, from: WorkstreamState, to: WorkstreamState) -> Result<(), CoordinatorError> {
        let now = self.clock.epoch_ms();
        {
            let mut state = self.state.lock();
            let workstream = state.workstreams.get_mut(&id).ok_or(CoordinatorError::UnknownWorkstream(id))?;
            if workstream.state != from {
                return Ok(());
            }
            workstream.state = to;
            workstream.last_activity_ms = now;
        }
        self.emit_state_changed(id);
        Ok(())
    }

    /// Disconnects the transport and drops the record. Calling this twice
    /// for the same id, or for an id that never existed, is a silent no-op.
    pub async fn stop_workstream(&self, id: WorkstreamId, cleanup: bool) {
        let (transport, worktree_name) = {
            let mut state = self.state.lock();
            state.permission_resolvers.remove(&id);
            let transport = state.transports.remove(&id);
            let name = state.workstreams.remove(&id).map(|w| w.name);
            (transport, name)
        };
        if let Some(transport) = transport {
            transport.disconnect().await;
        }
        if cleanup {
            if let Some(name) = worktree_name {
                self.worktree.remove(&name).await;
            }
        }
    }

    // ---- inbound protocol handling ---------------------------------------

    fn handle_protocol(&self, id: WorkstreamId, envelope: Envelope) {
        let classification = flotilla_transport::classify(&envelope);
        let now = self.clock.epoch_ms();
        match classification {
            Classification::Text { text } => self.handle_text_chunk(id, &text, now),
            Classification::Thought { text } => self.handle_thought_chunk(id, &text, now),
            Classification::ToolCall { id: tool_id, title, status: _ } => {
                self.handle_tool_call(id, tool_id, title, now)
            }
            Classification::ToolUpdate { id: tool_id, status, .. } => {
                self.handle_tool_update(id, tool_id, &status, now)
            }
            Classification::PermissionRequest { .. } => {
                // Always intercepted by the registered `request_permission`
                // handler (dispatch routes peer requests there directly,
                // never through `on_message`) -- reaching this arm means a
                // handler registration is missing.
                tracing::warn!(workstream = %id, "permission_request reached the fallback message path");
            }
            Classification::Unknown => {}
        }
    }

    fn handle_text_chunk(&self, id: WorkstreamId, text: &str, now: u64) {
        let (is_new, message) = {
            let mut state = self.state.lock();
            let Some(workstream) = state.workstreams.get_mut(&id) else { return };
            let is_new = workstream.append_agent_chunk(text, now);
            let tail = workstream.message_history.last().map(|m| m.content.clone()).unwrap_or_default();
            workstream.activity = flotilla_core::short(&tail, 100).to_string();
            let message = if is_new { workstream.message_history.last().cloned() } else { None };
            (is_new, message)
        };
        if is_new {
            if let Some(message) = message {
                self.observers.emit(id, CoordinatorEvent::Message { message });
            }
        }
    }

    fn handle_thought_chunk(&self, id: WorkstreamId, text: &str, now: u64) {
        let snapshot = {
            let mut state = self.state.lock();
            let Some(workstream) = state.workstreams.get_mut(&id) else { return };
            workstream.last_activity_ms = now;
            workstream.activity = flotilla_core::short(text, 100).to_string();
            (workstream.state.clone(), workstream.activity.clone())
        };
        self.observers.emit(id, CoordinatorEvent::StateChanged { state: snapshot.0, activity: snapshot.1 });
    }

    fn handle_tool_call(&self, id: WorkstreamId, tool_id: String, title: String, now: u64) {
        let tool = ToolCall::new(tool_id, title.clone());
        {
            let mut state = self.state.lock();
            let Some(workstream) = state.workstreams.get_mut(&id) else { return };
            workstream.upsert_tool_call(tool.clone(), now);
            workstream.activity = format!("Running: {title}");
        }
        self.observers.emit(id, CoordinatorEvent::ToolCall { tool });
    }

    fn handle_tool_update(&self, id: WorkstreamId, tool_id: String, status: &str, now: u64) {
        let Some(status) = parse_tool_status(status) else {
            tracing::warn!(workstream = %id, tool_id, status, "unknown tool status, ignoring");
            return;
        };
        let tool = {
            let mut state = self.state.lock();
            let Some(workstream) = state.workstreams.get_mut(&id) else { return };
            workstream.update_tool_status(&tool_id, status, now)
        };
        let Some(tool) = tool else {
            tracing::warn!(workstream = %id, tool_id, "tool update for unknown id, ignoring");
            return;
        };
        self.observers.emit(id, CoordinatorEvent::ToolUpdate { tool, removed: status.is_terminal() });
    }

    async fn handle_permission_request(
        self: &Arc<Self>,
        id: WorkstreamId,
        request_id: RequestId,
        params: Value,
    ) -> HandlerResult {
        let probe = Envelope {
            jsonrpc: None,
            id: None,
            method: Some("request_permission".to_string()),
            params: Some(params),
            result: None,
            error: None,
        };
        let (tool_title, tool_input, options) = match flotilla_transport::classify(&probe) {
            Classification::PermissionRequest { tool_title, tool_input, options } => (tool_title, tool_input, options),
            _ => {
                return Err(JsonRpcError::new(JsonRpcError::HANDLER_FAILED, "malformed request_permission payload"))
            }
        };

        let now = self.clock.epoch_ms();
        let (rx, state_snapshot, notification) = {
            let mut state = self.state.lock();
            if state.permission_resolvers.contains_key(&id) {
                // Resolved open question: reject rather than
                // queue or silently overwrite the pending request.
                return Err(JsonRpcError::new(
                    JsonRpcError::PERMISSION_ALREADY_PENDING,
                    "permission already pending for this workstream",
                ));
            }
            let Some(workstream) = state.workstreams.get_mut(&id) else {
                return Err(JsonRpcError::new(JsonRpcError::HANDLER_FAILED, "unknown workstream"));
            };
            workstream.state = WorkstreamState::Waiting;
            workstream.activity = format!("Permission needed: {tool_title}");
            workstream.last_activity_ms = now;
            workstream.pending_permission = Some(PendingPermission {
                request_id: request_id.clone(),
                workstream_id: id,
                tool_title: tool_title.clone(),
                tool_input: tool_input.clone(),
                options: options.clone(),
            });
            let notification = Notification::new(
                NotificationKind::ActionRequired,
                "Permission needed",
                tool_title.clone(),
                now,
                id,
            );
            workstream.push_notification(notification.clone());
            let snapshot = (workstream.state.clone(), workstream.activity.clone());

            let (tx, rx) = oneshot::channel();
            state.permission_resolvers.insert(id, tx);
            (rx, snapshot, notification)
        };

        self.observers.emit(id, CoordinatorEvent::StateChanged { state: state_snapshot.0, activity: state_snapshot.1 });
        self.observers.emit(id, CoordinatorEvent::Notification { notification });
        self.observers.emit(
            id,
            CoordinatorEvent::PermissionRequest { request_id, tool_title, tool_input, options },
        );

        match rx.await {
            Ok(outcome) => serde_json::to_value(outcome)
                .map_err(|e| JsonRpcError::new(JsonRpcError::HANDLER_FAILED, e.to_string())),
            Err(_) => Err(JsonRpcError::new(JsonRpcError::HANDLER_FAILED, "permission request abandoned")),
        }
    }

    fn fail_workstream(&self, id: WorkstreamId, message: String) {
        let now = self.clock.epoch_ms();
        {
            let mut state = self.state.lock();
            if let Some(workstream) = state.workstreams.get_mut(&id) {
                workstream.state = WorkstreamState::Error(message.clone());
                workstream.last_activity_ms = now;
            }
        }
        self.observers.emit(id, CoordinatorEvent::Error { message });
    }

    fn emit_state_changed(&self, id: WorkstreamId) {
        let snapshot = self.state.lock().workstreams.get(&id).map(|w| (w.state.clone(), w.activity.clone()));
        if let Some((state, activity)) = snapshot {
            self.observers.emit(id, CoordinatorEvent::StateChanged { state, activity });
        }
    }

    // ---- observer interface (C5) -----------------------------------------

    pub fn subscribe(self: &Arc<Self>, observer: Observer) -> SubscriptionHandle {
        let id = self.observers.register(observer);
        SubscriptionHandle { id, registry: Arc::downgrade(&self.observers) }
    }

    pub fn get_workstream(&self, id: WorkstreamId) -> Option<Workstream> {
        self.state.lock().workstreams.get(&id).cloned()
    }

    pub fn get_all_workstreams(&self) -> Vec<Workstream> {
        self.state.lock().workstreams.values().cloned().collect()
    }

    pub fn get_active_tools(&self, id: WorkstreamId) -> Vec<ToolCall> {
        self.state
            .lock()
            .workstreams
            .get(&id)
            .map(|w| w.active_tools.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn get_unread_notifications(&self, id: WorkstreamId) -> Vec<Notification> {
        self.state
            .lock()
            .workstreams
            .get(&id)
            .map(|w| w.notifications.iter().filter(|n| !n.read).cloned().collect())
            .unwrap_or_default()
    }

    pub fn get_pending_permission(&self, id: WorkstreamId) -> Option<PendingPermission> {
        self.state.lock().workstreams.get(&id).and_then(|w| w.pending_permission.clone())
    }

    pub async fn get_workstream_diff(&self, id: WorkstreamId) -> String {
        match self.worktree_path_of(id) {
            Some(path) => self.worktree.diff(&path).await,
            None => String::new(),
        }
    }

    pub async fn get_workstream_status(&self, id: WorkstreamId) -> String {
        match self.worktree_path_of(id) {
            Some(path) => self.worktree.status(&path).await,
            None => String::new(),
        }
    }

    pub async fn commit_workstream_changes(&self, id: WorkstreamId, message: &str) -> bool {
        match self.worktree_path_of(id) {
            Some(path) => self.worktree.commit(&path, message).await,
            None => false,
        }
    }

    fn worktree_path_of(&self, id: WorkstreamId) -> Option<PathBuf> {
        self.state.lock().workstreams.get(&id).and_then(|w| w.worktree_path.clone())
    }
}

fn parse_tool_status(raw: &str) -> Option<ToolStatus> {
    match raw {
        "pending" => Some(ToolStatus::Pending),
        "completed" => Some(ToolStatus::Completed),
        "failed" => Some(ToolStatus::Failed),
        _ => None,
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
