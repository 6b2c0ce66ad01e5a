// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transport-level error taxonomy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("not connected")]
    NotConnected,

    #[error("http {status}: {body}")]
    Http { status: u16, body: String },

    #[error("{0}")]
    Rpc(String),

    #[error("failed to decode envelope: {0}")]
    Decode(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}
