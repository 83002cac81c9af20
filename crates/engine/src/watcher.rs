// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Forge Contributors

//! Filesystem watcher: translates changes under the application's
//! source tree into restart signals.
//!
//! The watcher subscribes to the update machine's start/end topics and
//! pauses itself for the full duration of every update attempt: an
//! update rewrites the very files being watched, which would otherwise
//! cascade into spurious restarts.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use forge_core::{topics, EventBus, Payload, WatchConfig};
use notify::{RecommendedWatcher, RecursiveMode, Watcher as _};
use parking_lot::Mutex;
use tracing::{info, warn};

/// Directories never worth restarting over: version-control metadata
/// and dependency-install trees.
const DEFAULT_EXCLUDE: &[&str] = &[".git", ".svn", ".hg", ".idea", "node_modules", "target"];

struct WatcherInner {
    bus: EventBus,
    root: PathBuf,
    exclude: Vec<String>,
    active: Mutex<Option<RecommendedWatcher>>,
}

/// Recursive watcher over the supervised source tree.
#[derive(Clone)]
pub struct Watcher {
    inner: Arc<WatcherInner>,
}

impl Watcher {
    /// Compute the effective exclude list and watch root, and wire the
    /// update-start/update-end subscriptions that pause and resume the
    /// watcher. Does not start observing; call [`Watcher::start`].
    pub fn init(bus: EventBus, directory: &Path, config: &WatchConfig) -> Self {
        let mut exclude: Vec<String> = DEFAULT_EXCLUDE.iter().map(|s| s.to_string()).collect();
        for entry in &config.exclude {
            if !exclude.contains(entry) {
                exclude.push(entry.clone());
            }
        }

        let root = match &config.path {
            Some(sub) => directory.join(sub),
            None => directory.to_path_buf(),
        };

        let watcher =
            Self { inner: Arc::new(WatcherInner { bus: bus.clone(), root, exclude, active: Mutex::new(None) }) };

        let paused = watcher.clone();
        bus.subscribe(topics::FORGE_UPDATE_START, move |_| paused.stop());
        let resumed = watcher.clone();
        bus.subscribe(topics::FORGE_UPDATE_END, move |_| resumed.start());

        watcher
    }

    /// Begin recursive observation. No-op when already watching.
    pub fn start(&self) {
        let mut guard = self.inner.active.lock();
        if guard.is_some() {
            return;
        }

        let bus = self.inner.bus.clone();
        let exclude = self.inner.exclude.clone();
        let watcher = notify::recommended_watcher(move |result: notify::Result<notify::Event>| {
            match result {
                Ok(event) => {
                    for path in event.paths {
                        if is_excluded(&path, &exclude) {
                            continue;
                        }
                        info!(path = %path.display(), "file changed");
                        bus.publish(topics::APP_SIGNAL_RESTART, Payload::Changed { path });
                    }
                }
                Err(e) => warn!(error = %e, "watch error"),
            }
        });

        match watcher {
            Ok(mut watcher) => {
                if let Err(e) = watcher.watch(&self.inner.root, RecursiveMode::Recursive) {
                    warn!(root = %self.inner.root.display(), error = %e, "could not watch directory");
                    return;
                }
                info!(root = %self.inner.root.display(), "forge is watching for changes");
                *guard = Some(watcher);
            }
            Err(e) => warn!(error = %e, "could not create filesystem watcher"),
        }
    }

    /// End observation. Safe to call when not started.
    pub fn stop(&self) {
        let mut guard = self.inner.active.lock();
        if guard.take().is_some() {
            info!("forge is stopping directory watching");
        }
    }

    /// Whether observation is currently active.
    pub fn is_watching(&self) -> bool {
        self.inner.active.lock().is_some()
    }

    /// Effective exclude list (defaults unioned with configured
    /// entries, de-duplicated).
    pub fn exclude(&self) -> &[String] {
        &self.inner.exclude
    }

    pub fn root(&self) -> &Path {
        &self.inner.root
    }
}

/// A path is excluded when any component matches an exclude entry.
/// A trailing `$` on an entry is tolerated for compatibility with
/// regex-flavored exclude lists.
fn is_excluded(path: &Path, exclude: &[String]) -> bool {
    path.components().any(|component| {
        let name = component.as_os_str().to_string_lossy();
        exclude.iter().any(|entry| entry.trim_end_matches('$') == name)
    })
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
