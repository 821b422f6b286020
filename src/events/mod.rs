//! Event bus: named-topic publish/subscribe with discriminated payloads.
//!
//! Gameplay systems publish through the bus so that producers (enemy kill,
//! player hit, match controller) never hold references to their consumers
//! (HUD, score tracking). The bus is an injected [`Resource`], not an ambient
//! singleton: every test constructs its own instance.
//!
//! # Dispatch policy
//! `publish` is synchronous, on the calling thread, in registration order.
//! The handler list is snapshotted (taken out of the map) for the duration of
//! the invocation, so handlers may subscribe, unsubscribe or publish again
//! through the [`Deferred`] queue without corrupting the in-flight pass.
//! Deferred operations, including nested publishes, are drained fully
//! before the outer `publish` call returns.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use bevy::prelude::*;

/// Topic names. A publish with no registered handlers is a silent no-op.
pub mod topics {
    pub const LIVES_CHANGED: &str = "LivesChanged";
    pub const GAME_OVER: &str = "GameOver";
    pub const SCORE_RAISED: &str = "ScoreRaised";
    pub const WIN_GAME: &str = "WinGame";
}

/// Discriminated payload: type-erased at the bus boundary, matched at the
/// handler. Handlers registered for a topic know which variant to expect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Payload {
    Empty,
    Count(i32),
}

impl Payload {
    pub fn count(&self) -> Option<i32> {
        match self {
            Payload::Count(n) => Some(*n),
            Payload::Empty => None,
        }
    }
}

/// Identity of a registration. Subscribing twice with the same id on the
/// same topic is a silent no-op; unsubscribing removes exactly this one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandlerId(pub &'static str);

pub type Handler = Box<dyn FnMut(&Payload, &mut Deferred) + Send + Sync>;

enum Op {
    Subscribe { topic: &'static str, id: HandlerId, handler: Handler },
    Unsubscribe { topic: &'static str, id: HandlerId },
    Publish { topic: &'static str, payload: Payload },
}

/// Bus mutations requested from inside a running publish. Applied after the
/// in-flight snapshot has been fully invoked.
#[derive(Default)]
pub struct Deferred {
    ops: Vec<Op>,
}

impl Deferred {
    pub fn subscribe(&mut self, topic: &'static str, id: HandlerId, handler: Handler) {
        self.ops.push(Op::Subscribe { topic, id, handler });
    }

    pub fn unsubscribe(&mut self, topic: &'static str, id: HandlerId) {
        self.ops.push(Op::Unsubscribe { topic, id });
    }

    pub fn publish(&mut self, topic: &'static str, payload: Payload) {
        self.ops.push(Op::Publish { topic, payload });
    }
}

#[derive(Resource, Default)]
pub struct EventBus {
    topics: HashMap<&'static str, Vec<(HandlerId, Handler)>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `topic`. Idempotent per (topic, id).
    pub fn subscribe(&mut self, topic: &'static str, id: HandlerId, handler: Handler) {
        let list = self.topics.entry(topic).or_default();
        if list.iter().any(|(existing, _)| *existing == id) {
            return;
        }
        list.push((id, handler));
    }

    /// Remove one registration. Dropping the last handler for a topic drops
    /// the topic entry entirely.
    pub fn unsubscribe(&mut self, topic: &'static str, id: HandlerId) {
        if let Some(list) = self.topics.get_mut(topic) {
            list.retain(|(existing, _)| *existing != id);
            if list.is_empty() {
                self.topics.remove(topic);
            }
        }
    }

    /// Invoke every currently registered handler for `topic`, then drain any
    /// operations the handlers deferred, including nested publishes.
    pub fn publish(&mut self, topic: &'static str, payload: Payload) {
        let mut deferred = Deferred::default();
        self.dispatch(topic, &payload, &mut deferred);

        while !deferred.ops.is_empty() {
            for op in std::mem::take(&mut deferred.ops) {
                match op {
                    Op::Subscribe { topic, id, handler } => self.subscribe(topic, id, handler),
                    Op::Unsubscribe { topic, id } => self.unsubscribe(topic, id),
                    Op::Publish { topic, payload } => self.dispatch(topic, &payload, &mut deferred),
                }
            }
        }
    }

    fn dispatch(&mut self, topic: &'static str, payload: &Payload, deferred: &mut Deferred) {
        // Snapshot-then-invoke: the list is out of the map while it runs.
        let Some(mut list) = self.topics.remove(topic) else {
            return;
        };
        for (_, handler) in list.iter_mut() {
            handler(payload, deferred);
        }
        self.topics.insert(topic, list);
    }

    /// Drop every registration. The bus afterwards behaves as fresh.
    pub fn cleanup(&mut self) {
        self.topics.clear();
    }

    pub fn handler_count(&self, topic: &str) -> usize {
        self.topics.get(topic).map_or(0, Vec::len)
    }

    pub fn has_topic(&self, topic: &str) -> bool {
        self.topics.contains_key(topic)
    }
}

/// Shared integer cell. Bus handlers are boxed closures owned by the bus, so
/// they hand values back to ECS systems through one of these.
#[derive(Clone, Default, Debug)]
pub struct Counter(Arc<AtomicI32>);

impl Counter {
    pub fn add(&self, n: i32) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn set(&self, n: i32) {
        self.0.store(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> i32 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Shared latch, raised by a handler and observed by a system.
#[derive(Clone, Default, Debug)]
pub struct Flag(Arc<AtomicBool>);

impl Flag {
    pub fn raise(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests;
