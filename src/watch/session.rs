// src/watch/session.rs

//! Process-scoped resources of the watch phase.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::ServeSection;
use crate::engine::{ReloadSignal, RuntimeEvent};
use crate::serve::{DevServer, ReloadHub, ReloadMessage};
use crate::watch::patterns::ClassWatchProfile;
use crate::watch::watcher::{WatcherHandle, spawn_watcher};

/// Everything the watch node starts: the file watcher, and (when serving is
/// enabled) the dev server with its reload hub. Lives until process exit.
#[derive(Debug)]
pub struct WatchSession {
    _watcher: WatcherHandle,
    hub: Option<ReloadHub>,
    server: Option<DevServer>,
    serve_root: PathBuf,
}

impl WatchSession {
    pub fn start(
        root: &Path,
        dest_root: &Path,
        profiles: Vec<ClassWatchProfile>,
        serve: &ServeSection,
        runtime_tx: mpsc::Sender<RuntimeEvent>,
    ) -> Result<Self> {
        let watcher = spawn_watcher(root, profiles, runtime_tx)?;
        let serve_root = root.join(dest_root);

        let (hub, server) = if serve.enabled {
            let hub = ReloadHub::start(serve.host, serve.reload_port)?;
            let server = DevServer::start(
                serve_root.clone(),
                serve.host,
                serve.port,
                Some(hub.addr().port()),
            )?;
            (Some(hub), Some(server))
        } else {
            info!("dev server disabled");
            (None, None)
        };

        Ok(Self {
            _watcher: watcher,
            hub,
            server,
            serve_root,
        })
    }

    pub fn server(&self) -> Option<&DevServer> {
        self.server.as_ref()
    }

    pub fn hub(&self) -> Option<&ReloadHub> {
        self.hub.as_ref()
    }

    /// Queue a reload signal for every connected browser session. Returns
    /// false when there is nothing to send.
    pub fn broadcast(&self, signal: &ReloadSignal) -> bool {
        let Some(hub) = &self.hub else {
            return false;
        };
        let Some(msg) = ReloadMessage::from_signal(signal, &self.serve_root) else {
            return false;
        };
        debug!(class = %signal.class, "reload queued");
        hub.enqueue(msg);
        true
    }
}
