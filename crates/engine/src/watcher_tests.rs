// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Forge Contributors

use super::*;
use forge_core::Event;
use std::sync::mpsc;
use std::time::Duration;
use tempfile::tempdir;

fn watch_config(exclude: &[&str], path: Option<&str>) -> WatchConfig {
    WatchConfig {
        on: true,
        exclude: exclude.iter().map(|s| s.to_string()).collect(),
        path: path.map(PathBuf::from),
    }
}

#[test]
fn init_merges_configured_excludes_with_defaults() {
    let dir = tempdir().unwrap();
    let bus = EventBus::new();
    let watcher = Watcher::init(bus, dir.path(), &watch_config(&["logs", "node_modules"], None));

    let exclude = watcher.exclude();
    assert!(exclude.contains(&".git".to_string()));
    assert!(exclude.contains(&"logs".to_string()));
    assert_eq!(exclude.iter().filter(|e| *e == "node_modules").count(), 1);
}

#[test]
fn init_resolves_the_watch_root_under_the_app_directory() {
    let dir = tempdir().unwrap();
    let bus = EventBus::new();

    let whole = Watcher::init(bus.clone(), dir.path(), &watch_config(&[], None));
    assert_eq!(whole.root(), dir.path());

    let sub = Watcher::init(bus, dir.path(), &watch_config(&[], Some("src")));
    assert_eq!(sub.root(), dir.path().join("src"));
}

#[test]
fn start_and_stop_are_idempotent() {
    let dir = tempdir().unwrap();
    let bus = EventBus::new();
    let watcher = Watcher::init(bus, dir.path(), &watch_config(&[], None));

    assert!(!watcher.is_watching());
    watcher.start();
    assert!(watcher.is_watching());
    watcher.start();
    assert!(watcher.is_watching());

    watcher.stop();
    assert!(!watcher.is_watching());
    watcher.stop();
    assert!(!watcher.is_watching());
}

#[test]
fn changes_publish_restart_signals() {
    let dir = tempdir().unwrap();
    let bus = EventBus::new();
    let (tx, rx) = mpsc::channel();
    bus.subscribe(topics::APP_SIGNAL_RESTART, move |event: &Event| {
        let _ = tx.send(event.clone());
    });

    let watcher = Watcher::init(bus, dir.path(), &watch_config(&[], None));
    watcher.start();

    std::fs::write(dir.path().join("app.txt"), "changed").unwrap();

    let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    match event.payload {
        Payload::Changed { path } => assert!(path.ends_with("app.txt")),
        other => panic!("expected changed payload, got {:?}", other),
    }
    watcher.stop();
}

#[test]
fn excluded_paths_do_not_signal() {
    let dir = tempdir().unwrap();
    std::fs::create_dir(dir.path().join(".git")).unwrap();
    let bus = EventBus::new();
    let (tx, rx) = mpsc::channel();
    bus.subscribe(topics::APP_SIGNAL_RESTART, move |event: &Event| {
        let _ = tx.send(event.clone());
    });

    let watcher = Watcher::init(bus, dir.path(), &watch_config(&[], None));
    watcher.start();

    std::fs::write(dir.path().join(".git").join("index"), "x").unwrap();
    assert!(rx.recv_timeout(Duration::from_millis(500)).is_err());

    std::fs::write(dir.path().join("kept.txt"), "y").unwrap();
    assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
    watcher.stop();
}

#[test]
fn update_window_pauses_and_resumes_watching() {
    let dir = tempdir().unwrap();
    let bus = EventBus::new();
    let watcher = Watcher::init(bus.clone(), dir.path(), &watch_config(&[], None));
    watcher.start();

    bus.publish(topics::FORGE_UPDATE_START, Payload::Empty);
    assert!(!watcher.is_watching());

    bus.publish(topics::FORGE_UPDATE_END, Payload::Empty);
    assert!(watcher.is_watching());
    watcher.stop();
}

#[test]
fn changes_during_an_update_window_do_not_signal() {
    let dir = tempdir().unwrap();
    let bus = EventBus::new();
    let (tx, rx) = mpsc::channel();
    bus.subscribe(topics::APP_SIGNAL_RESTART, move |event: &Event| {
        let _ = tx.send(event.clone());
    });

    let watcher = Watcher::init(bus.clone(), dir.path(), &watch_config(&[], None));
    watcher.start();

    bus.publish(topics::FORGE_UPDATE_START, Payload::Empty);
    std::fs::write(dir.path().join("pulled.txt"), "rewritten mid-update").unwrap();
    assert!(rx.recv_timeout(Duration::from_millis(500)).is_err());

    bus.publish(topics::FORGE_UPDATE_END, Payload::Empty);
    std::fs::write(dir.path().join("settled.txt"), "after the window").unwrap();
    assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
    watcher.stop();
}

#[test]
fn exclusion_matches_path_components() {
    let exclude = vec!["node_modules".to_string(), "logs$".to_string()];
    assert!(is_excluded(Path::new("/app/node_modules/pkg/index.js"), &exclude));
    assert!(is_excluded(Path::new("/app/logs/out.log"), &exclude));
    assert!(!is_excluded(Path::new("/app/src/logstash.rs"), &exclude));
    assert!(!is_excluded(Path::new("/app/src/main.rs"), &exclude));
}
