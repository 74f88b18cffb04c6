// src/watch/watcher.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::RuntimeEvent;
use crate::watch::patterns::{ClassWatchProfile, rel_string};

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive. Dropping this handle
/// stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
    root: PathBuf,
}

impl WatcherHandle {
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("root", &self.root)
            .finish()
    }
}

/// Spawn a filesystem watcher that observes `root` recursively and sends
/// `RuntimeEvent::SourceChanged` for every asset class whose globs match a
/// changed path.
///
/// - `root` is the project root against which all glob patterns are evaluated.
/// - `profiles` is the compiled per-class pattern set.
/// - `runtime_tx` is the channel into the main runtime.
///
/// Must be called from within a tokio runtime.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    profiles: Vec<ClassWatchProfile>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or(root);
    let profiles = Arc::new(profiles);

    // notify calls back on its own thread; hop into async land.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    eprintln!("assetpipe: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("assetpipe: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;

    info!("file watcher started on {:?}", root);

    let async_root = root.clone();
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if event.kind.is_access() {
                continue;
            }
            debug!(?event, "received notify event");

            for path in event.paths.iter() {
                let Some(rel) = relative_str(&async_root, path) else {
                    continue;
                };

                for profile in profiles.iter().filter(|p| p.matches(&rel)) {
                    debug!(class = %profile.class(), path = %rel, "source changed");
                    let msg = RuntimeEvent::SourceChanged {
                        class: profile.class(),
                        path: rel.clone(),
                    };
                    if runtime_tx.send(msg).await.is_err() {
                        warn!("runtime channel closed; stopping watcher loop");
                        return;
                    }
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle {
        _inner: watcher,
        root,
    })
}

/// Relative, forward-slash form of an event path.
///
/// Falls back to canonicalizing the event path when the direct prefix strip
/// fails (symlinked temp dirs on macOS report `/private/var/...`). Removed
/// files cannot be canonicalized; their parent directory is tried instead.
fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Some(rel) = rel_string(root, path) {
        return Some(rel);
    }

    if let Ok(canon) = path.canonicalize() {
        return rel_string(root, &canon);
    }

    let parent = path.parent()?.canonicalize().ok()?;
    let name = path.file_name()?;
    rel_string(root, &parent.join(name))
}
