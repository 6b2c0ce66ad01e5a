// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinator-level error taxonomy.

use flotilla_core::workstream::WorkstreamId;
use flotilla_transport::TransportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("no workstream with id {0}")]
    UnknownWorkstream(WorkstreamId),

    #[error("no pending permission request for workstream {0}")]
    NoPendingPermission(WorkstreamId),

    #[error("handshake with remote failed: {0}")]
    HandshakeFailed(#[source] TransportError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
