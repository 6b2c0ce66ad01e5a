// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The observer interface (C5): subscribe a callback, get a
//! handle back whose `Drop` deregisters it.
//!
//! Holding only a [`Weak`] reference back to the coordinator here, rather
//! than an `Arc`, is deliberate: `Coordinator` -> transport message handler
//! -> `Coordinator` is already a closure-captured cycle broken by id lookup
//! (see `coordinator.rs`); a `SubscriptionHandle` living past its
//! coordinator must not be the thing keeping that coordinator alive.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use flotilla_core::event::CoordinatorEvent;
use flotilla_core::workstream::WorkstreamId;

/// A subscriber callback: `(workstream, event)`, invoked synchronously and
/// in delivery order. Must not block or panic.
pub type Observer = Arc<dyn Fn(WorkstreamId, CoordinatorEvent) + Send + Sync>;

pub(crate) struct ObserverRegistry {
    next_id: AtomicU64,
    observers: parking_lot::Mutex<Vec<(u64, Observer)>>,
}

impl ObserverRegistry {
    pub(crate) fn new() -> Self {
        Self { next_id: AtomicU64::new(1), observers: parking_lot::Mutex::new(Vec::new()) }
    }

    pub(crate) fn register(&self, observer: Observer) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.observers.lock().push((id, observer));
        id
    }

    pub(crate) fn deregister(&self, id: u64) {
        self.observers.lock().retain(|(existing, _)| *existing != id);
    }

    pub(crate) fn emit(&self, workstream_id: WorkstreamId, event: CoordinatorEvent) {
        let snapshot: Vec<Observer> = self.observers.lock().iter().map(|(_, o)| o.clone()).collect();
        for observer in snapshot {
            observer(workstream_id, event.clone());
        }
    }
}

/// Returned by [`crate::Coordinator::subscribe`]. Dropping it deregisters
/// the callback; it can also be deregistered explicitly via
/// [`SubscriptionHandle::unsubscribe`].
pub struct SubscriptionHandle {
    pub(crate) id: u64,
    pub(crate) registry: Weak<ObserverRegistry>,
}

impl SubscriptionHandle {
    pub fn unsubscribe(self) {
        // Drop does the work; naming it explicitly just documents intent.
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.deregister(self.id);
        }
    }
}
