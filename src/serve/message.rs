// src/serve/message.rs

//! JSON messages pushed to browser sessions over WebSocket.

use std::path::Path;

use serde::Serialize;

use crate::engine::ReloadSignal;
use crate::types::ReloadPolicy;
use crate::watch::patterns::rel_string;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReloadMessage {
    /// Reload the whole page.
    Reload {
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    /// Re-fetch these stylesheets (URL paths) without reloading.
    Css { paths: Vec<String> },
    /// Sent once after the handshake.
    Connected { version: String },
}

impl ReloadMessage {
    pub fn connected() -> Self {
        ReloadMessage::Connected {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Message for a reload signal, with destination paths turned into URL
    /// paths below `serve_root`. `None` for classes that reload nothing.
    pub fn from_signal(signal: &ReloadSignal, serve_root: &Path) -> Option<Self> {
        match signal.policy {
            ReloadPolicy::Never => None,
            ReloadPolicy::Full => Some(ReloadMessage::Reload {
                reason: Some(format!("{} rebuilt", signal.class)),
            }),
            ReloadPolicy::Inject => Some(ReloadMessage::Css {
                paths: signal
                    .paths
                    .iter()
                    .filter_map(|p| rel_string(serve_root, p))
                    .map(|rel| format!("/{rel}"))
                    .collect(),
            }),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reload"}"#.to_string())
    }
}
