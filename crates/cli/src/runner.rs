// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Forge Contributors

//! Foreground runner: wires the bus, supervisor, watcher, and ingress
//! together and drives them until the process is told to exit.
//!
//! Components never call each other directly. Signals raised on the
//! bus (`application.signal.restart`, `application.signal.update`) are
//! funneled into a command channel consumed by this loop, which is the
//! only caller of supervisor actions.

use anyhow::Result;
use forge_core::{topics, EventBus};
use forge_engine::{
    Ingress, Supervisor, SupervisorSpec, UpdateSpec, Watcher, DEFAULT_MAX_RESTARTS,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::commands::Loaded;
use crate::logging;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunnerCommand {
    Restart,
    Update,
}

pub(crate) fn update_spec(loaded: &Loaded) -> UpdateSpec {
    UpdateSpec {
        remote: loaded.config.git.remote.clone(),
        revision: loaded.config.git.revision.clone(),
        directory: loaded.target.directory.clone(),
        script: loaded.config.scripts.update.clone(),
    }
}

fn supervisor_spec(loaded: &Loaded) -> SupervisorSpec {
    SupervisorSpec {
        executable: loaded.target.executable.clone(),
        args: loaded.target.args.clone(),
        directory: loaded.target.directory.clone(),
        execute: loaded.config.execute.as_ref().map(PathBuf::from),
        max_restarts: DEFAULT_MAX_RESTARTS,
        update: update_spec(loaded),
    }
}

/// Run the supervisor in the foreground until SIGINT or SIGTERM.
pub async fn run(loaded: Loaded) -> Result<()> {
    let bus = EventBus::new();
    logging::attach(&bus);

    let supervisor = Supervisor::new(bus.clone(), supervisor_spec(&loaded));

    let (tx, mut rx) = mpsc::unbounded_channel();
    let restart_tx = tx.clone();
    bus.subscribe(topics::APP_SIGNAL_RESTART, move |_| {
        let _ = restart_tx.send(RunnerCommand::Restart);
    });
    let update_tx = tx.clone();
    bus.subscribe(topics::APP_SIGNAL_UPDATE, move |_| {
        let _ = update_tx.send(RunnerCommand::Update);
    });

    let _watcher = if loaded.config.watch.on {
        let watcher = Watcher::init(bus.clone(), &loaded.target.directory, &loaded.config.watch);
        watcher.start();
        Some(watcher)
    } else {
        None
    };

    if let Some(ingress) = Ingress::from_config(&loaded.config.connections) {
        let ingress_bus = bus.clone();
        tokio::spawn(async move {
            if let Err(e) = ingress.start(ingress_bus).await {
                error!(error = %e, "ingress connector failed");
            }
        });
    }

    supervisor.start();
    if loaded.config.update_on_start {
        let _ = tx.send(RunnerCommand::Update);
    }

    // Updates run detached so a second request arriving mid-attempt is
    // dropped instead of queued behind it.
    let updating = Arc::new(AtomicBool::new(false));

    let mut sigterm = signal(SignalKind::terminate())?;
    loop {
        tokio::select! {
            command = rx.recv() => match command {
                Some(RunnerCommand::Restart) => supervisor.restart().await,
                Some(RunnerCommand::Update) => {
                    if updating
                        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                        .is_ok()
                    {
                        let supervisor = supervisor.clone();
                        let flag = Arc::clone(&updating);
                        tokio::spawn(async move {
                            let _ = supervisor.update().await;
                            flag.store(false, Ordering::SeqCst);
                        });
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received, stopping");
                supervisor.stop(false, None).await;
                break;
            }
            _ = sigterm.recv() => {
                info!("termination requested, stopping");
                supervisor.stop(false, None).await;
                break;
            }
        }
    }
    Ok(())
}
