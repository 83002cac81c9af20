// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Forge Contributors

use super::*;
use crate::event::{topics, Payload};
use parking_lot::Mutex;
use std::sync::Arc;
use yare::parameterized;

fn collector(bus: &EventBus, pattern: &str) -> Arc<Mutex<Vec<String>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    bus.subscribe(pattern, move |event| sink.lock().push(event.topic.clone()));
    seen
}

#[parameterized(
    exact = { "forge.start", "forge.start", true },
    channel_wildcard_one_level = { "forge.*", "forge.start", true },
    channel_wildcard_deep = { "forge.*", "forge.update.start", true },
    channel_wildcard_other_channel = { "forge.*", "application.output", false },
    channel_wildcard_bare_channel = { "forge.*", "forge", false },
    interior_wildcard = { "forge.*.start", "forge.update.start", true },
    interior_wildcard_too_deep = { "forge.*.start", "forge.a.b.start", false },
    hash_matches_remainder = { "forge.#", "forge.update.end", true },
    hash_matches_empty_remainder = { "forge.#", "forge", true },
    hash_interior = { "forge.#.end", "forge.update.end", true },
    literal_mismatch = { "forge.exit", "forge.start", false },
)]
fn pattern_matching(pattern: &str, topic: &str, expected: bool) {
    assert_eq!(TopicPattern::new(pattern).matches(topic), expected);
}

#[test]
fn publish_delivers_to_matching_subscribers() {
    let bus = EventBus::new();
    let forge_events = collector(&bus, "forge.*");
    let app_events = collector(&bus, "application.*");

    bus.publish(topics::FORGE_START, Payload::Empty);
    bus.publish(topics::APP_OUTPUT, Payload::message("line"));

    assert_eq!(*forge_events.lock(), vec!["forge.start"]);
    assert_eq!(*app_events.lock(), vec!["application.output"]);
}

#[test]
fn publish_with_no_subscriber_is_dropped() {
    let bus = EventBus::new();
    // Nothing to assert beyond "does not panic": best-effort delivery.
    bus.publish(topics::FORGE_EXIT, Payload::Empty);
}

#[test]
fn delivery_is_in_subscription_order() {
    let bus = EventBus::new();
    let order = Arc::new(Mutex::new(Vec::new()));
    for label in ["first", "second", "third"] {
        let sink = Arc::clone(&order);
        bus.subscribe("forge.start", move |_| sink.lock().push(label));
    }

    bus.publish(topics::FORGE_START, Payload::Empty);
    assert_eq!(*order.lock(), vec!["first", "second", "third"]);
}

#[test]
fn unsubscribe_stops_delivery() {
    let bus = EventBus::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let token = bus.subscribe("forge.start", move |e| sink.lock().push(e.topic.clone()));

    bus.publish(topics::FORGE_START, Payload::Empty);
    assert!(bus.unsubscribe(token));
    bus.publish(topics::FORGE_START, Payload::Empty);

    assert_eq!(seen.lock().len(), 1);
    assert!(!bus.unsubscribe(token), "second unsubscribe is a no-op");
}

#[test]
fn handler_may_publish_reentrantly() {
    let bus = EventBus::new();
    let seen = collector(&bus, "forge.exit");

    let inner_bus = bus.clone();
    bus.subscribe("forge.start", move |_| {
        inner_bus.publish(topics::FORGE_EXIT, Payload::Empty);
    });

    bus.publish(topics::FORGE_START, Payload::Empty);
    assert_eq!(*seen.lock(), vec!["forge.exit"]);
}

#[test]
fn clones_share_subscriptions() {
    let bus = EventBus::new();
    let clone = bus.clone();
    let seen = collector(&bus, "forge.*");

    clone.publish(topics::FORGE_START, Payload::Empty);
    assert_eq!(seen.lock().len(), 1);
    assert_eq!(bus.subscription_count(), 1);
}
