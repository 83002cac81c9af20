// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Forge Contributors

//! Topic-based publish/subscribe event bus.
//!
//! The bus is the only coordination channel between forge components:
//! the updater tells the watcher to pause, the ingress connector asks
//! for updates, and the logger observes everything, all without direct
//! references to one another.
//!
//! Delivery is synchronous, in subscription order, to subscribers
//! registered at publish time. There is no queueing, persistence, or
//! replay: an event published with no matching subscriber is dropped.
//! The bus is an explicitly constructed value passed to each component
//! at construction time, so tests get a fresh bus per case.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::event::{Event, Payload};

type Handler = Arc<dyn Fn(&Event) + Send + Sync>;

/// Token returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

/// A compiled topic pattern.
///
/// Patterns are dot-separated segments. A literal segment matches
/// itself. `*` matches exactly one segment in interior position; as
/// the final segment it matches one or more trailing segments, so
/// `forge.*` receives anything published under the `forge` channel.
/// `#` matches any remainder, including the empty one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicPattern {
    segments: Vec<String>,
}

impl TopicPattern {
    pub fn new(pattern: &str) -> Self {
        Self { segments: pattern.split('.').map(str::to_string).collect() }
    }

    pub fn matches(&self, topic: &str) -> bool {
        let topic: Vec<&str> = topic.split('.').collect();
        Self::match_from(&self.segments, &topic)
    }

    fn match_from(pattern: &[String], topic: &[&str]) -> bool {
        match pattern.split_first() {
            None => topic.is_empty(),
            Some((seg, rest)) if seg == "#" => {
                if rest.is_empty() {
                    return true;
                }
                (0..=topic.len()).any(|n| Self::match_from(rest, &topic[n..]))
            }
            Some((seg, rest)) if seg == "*" => {
                if rest.is_empty() {
                    // Trailing `*` swallows the rest of the topic.
                    return !topic.is_empty();
                }
                !topic.is_empty() && Self::match_from(rest, &topic[1..])
            }
            Some((seg, rest)) => {
                topic.first() == Some(&seg.as_str()) && Self::match_from(rest, &topic[1..])
            }
        }
    }
}

struct Subscription {
    token: SubscriptionToken,
    pattern: TopicPattern,
    handler: Handler,
}

struct BusInner {
    next_token: AtomicU64,
    subscriptions: RwLock<Vec<Subscription>>,
}

/// In-process, best-effort publish/subscribe bus. Cheap to clone.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                next_token: AtomicU64::new(1),
                subscriptions: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Register `handler` for every topic matching `pattern`.
    pub fn subscribe(
        &self,
        pattern: &str,
        handler: impl Fn(&Event) + Send + Sync + 'static,
    ) -> SubscriptionToken {
        let token = SubscriptionToken(self.inner.next_token.fetch_add(1, Ordering::Relaxed));
        self.inner.subscriptions.write().push(Subscription {
            token,
            pattern: TopicPattern::new(pattern),
            handler: Arc::new(handler),
        });
        token
    }

    /// Remove a subscription. Returns false if the token was unknown.
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        let mut subs = self.inner.subscriptions.write();
        let before = subs.len();
        subs.retain(|s| s.token != token);
        subs.len() != before
    }

    /// Publish `payload` on `topic` to every currently matching
    /// subscriber, in subscription order.
    pub fn publish(&self, topic: &str, payload: Payload) {
        self.publish_event(Event::new(topic, payload));
    }

    pub fn publish_event(&self, event: Event) {
        // Collect matching handlers under the lock, invoke after it is
        // released so a handler may publish or subscribe re-entrantly.
        let handlers: Vec<Handler> = {
            let subs = self.inner.subscriptions.read();
            subs.iter()
                .filter(|s| s.pattern.matches(&event.topic))
                .map(|s| Arc::clone(&s.handler))
                .collect()
        };
        for handler in handlers {
            handler(&event);
        }
    }

    /// Number of live subscriptions (diagnostics and tests).
    pub fn subscription_count(&self) -> usize {
        self.inner.subscriptions.read().len()
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
