// src/watch/watcher.rs

use std::path::PathBuf;

use anyhow::Result;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::watch::scope::WatchScope;

/// Relevant paths from one filesystem notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeBatch {
    pub paths: Vec<PathBuf>,
}

/// Handle for the filesystem watcher.
///
/// Dropping this handle stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Watch `root` and any inputs outside it, forwarding changes accepted by
/// `scope` to `tx`.
///
/// Access-only events are dropped; so are batches with no relevant path.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    scope: WatchScope,
    tx: mpsc::Sender<ChangeBatch>,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or_else(|_| root.clone());

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    eprintln!("resflow: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("resflow: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;
    for target in scope.watch_targets(&root).into_iter().skip(1) {
        let mode = if target.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        // Inputs outside the project may not exist yet; the root watch stands.
        match watcher.watch(&target.path, mode) {
            Ok(()) => debug!(path = ?target.path, recursive = target.recursive, "watching outside input"),
            Err(err) => warn!(path = ?target.path, error = %err, "cannot watch input outside the project"),
        }
    }

    info!("file watcher started on {:?}", root);

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if event.kind.is_access() {
                continue;
            }
            let paths: Vec<PathBuf> = event
                .paths
                .into_iter()
                .filter(|p| scope.is_relevant(p))
                .collect();
            if paths.is_empty() {
                continue;
            }
            debug!(?paths, "relevant change");
            if tx.send(ChangeBatch { paths }).await.is_err() {
                break;
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}
