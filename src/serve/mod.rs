// src/serve/mod.rs

//! Development server: static files from the destination root over HTTP,
//! plus a WebSocket hub that pushes reload messages to open pages.

pub mod hub;
pub mod message;
pub mod mime;

use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result, anyhow};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use tracing::{debug, info, warn};

pub use hub::ReloadHub;
pub use message::ReloadMessage;

/// Ports tried after the configured one is taken.
pub(crate) const MAX_PORT_RETRIES: u16 = 10;

/// Static file server running on its own thread.
pub struct DevServer {
    server: Arc<Server>,
    addr: SocketAddr,
}

impl std::fmt::Debug for DevServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevServer").field("addr", &self.addr).finish()
    }
}

impl DevServer {
    /// Serve `root` on `host:port`. HTML responses get a small client script
    /// that connects to the reload hub on `reload_port`, if given.
    pub fn start(
        root: impl Into<PathBuf>,
        host: IpAddr,
        port: u16,
        reload_port: Option<u16>,
    ) -> Result<Self> {
        let root = root.into();
        let (server, addr) = bind_with_retry(host, port)?;
        let server = Arc::new(server);

        let worker = Arc::clone(&server);
        thread::Builder::new()
            .name("assetpipe-serve".into())
            .spawn(move || {
                for request in worker.incoming_requests() {
                    let url = request.url().to_string();
                    if let Err(e) = handle_request(request, &root, reload_port) {
                        warn!(url = %url, error = %format!("{e:#}"), "request failed");
                    }
                }
            })?;

        info!("serving on http://{addr}");
        Ok(Self { server, addr })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for DevServer {
    fn drop(&mut self) {
        self.server.unblock();
    }
}

fn bind_with_retry(host: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;

    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        match Server::http(SocketAddr::new(host, port)) {
            Ok(server) => {
                let addr = server
                    .server_addr()
                    .to_ip()
                    .unwrap_or_else(|| SocketAddr::new(host, port));
                if offset > 0 {
                    info!(base_port, port = addr.port(), "port in use; using next free port");
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow!(
        "failed to bind dev server after {} attempts (ports {}-{}): {}",
        MAX_PORT_RETRIES,
        base_port,
        base_port.saturating_add(MAX_PORT_RETRIES - 1),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

fn handle_request(request: Request, root: &Path, reload_port: Option<u16>) -> Result<()> {
    if !matches!(request.method(), Method::Get | Method::Head) {
        return respond(request, 405, mime::PLAIN, b"405 Method Not Allowed".to_vec());
    }

    let Some(path) = resolve(root, request.url()) else {
        debug!(url = %request.url(), "not found");
        return respond(request, 404, mime::PLAIN, b"404 Not Found".to_vec());
    };

    let content_type = mime::from_path(&path);
    let body = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
    let body = match reload_port {
        Some(port) if content_type == mime::HTML => inject_reload_client(body, port),
        _ => body,
    };

    respond(request, 200, content_type, body)
}

/// Map a request URL to a file below `root`. Directories resolve to their
/// `index.html`; anything escaping the root is rejected.
fn resolve(root: &Path, url: &str) -> Option<PathBuf> {
    let path = url.split(['?', '#']).next().unwrap_or("/");
    let rel = Path::new(path.trim_start_matches('/'));
    if rel
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return None;
    }

    let mut full = root.join(rel);
    if full.is_dir() {
        full.push("index.html");
    }
    full.is_file().then_some(full)
}

/// Insert the reload client before `</body>`, or append it.
pub fn inject_reload_client(body: Vec<u8>, port: u16) -> Vec<u8> {
    let script = format!(
        r#"<script>(function(){{var ws=new WebSocket("ws://"+location.hostname+":{port}");ws.onmessage=function(e){{var m=JSON.parse(e.data);if(m.type==="reload"){{location.reload();}}else if(m.type==="css"){{document.querySelectorAll('link[rel="stylesheet"]').forEach(function(l){{var u=new URL(l.href);if(m.paths.length===0||m.paths.indexOf(u.pathname)!==-1){{u.searchParams.set("v",Date.now());l.href=u.toString();}}}});}}}};}})();</script>"#
    );

    let Ok(mut html) = String::from_utf8(body) else {
        return script.into_bytes();
    };
    match html.rfind("</body>") {
        Some(idx) => html.insert_str(idx, &script),
        None => html.push_str(&script),
    }
    html.into_bytes()
}

fn respond(request: Request, status: u16, content_type: &str, body: Vec<u8>) -> Result<()> {
    let header = Header::from_bytes("Content-Type", content_type)
        .map_err(|_| anyhow!("invalid content type header"))?;

    if request.method() == &Method::Head {
        let response = Response::empty(StatusCode(status)).with_header(header);
        request.respond(response)?;
        return Ok(());
    }

    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(header);
    request.respond(response)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_rejects_parent_components() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<p>hi</p>").unwrap();

        assert_eq!(resolve(dir.path(), "/"), Some(dir.path().join("index.html")));
        assert_eq!(
            resolve(dir.path(), "/index.html?x=1"),
            Some(dir.path().join("index.html"))
        );
        assert_eq!(resolve(dir.path(), "/../secret"), None);
        assert_eq!(resolve(dir.path(), "/missing.css"), None);
    }

    #[test]
    fn injects_before_closing_body() {
        let out = inject_reload_client(b"<html><body><p>x</p></body></html>".to_vec(), 35729);
        let html = String::from_utf8(out).unwrap();
        let script_at = html.find("<script>").unwrap();
        assert!(script_at < html.find("</body>").unwrap());
        assert!(html.contains(":35729"));
    }
}
