// src/serve/hub.rs

//! WebSocket session registry for live reload.

use std::net::{IpAddr, SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use anyhow::{Result, anyhow};
use tracing::{debug, info, warn};
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use crate::serve::MAX_PORT_RETRIES;
use crate::serve::message::ReloadMessage;

/// A client gets this long to complete the WebSocket handshake.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);
/// A session that cannot take a message within this window is dropped.
const SEND_TIMEOUT: Duration = Duration::from_secs(2);

type Sessions = Arc<Mutex<Vec<WebSocket<TcpStream>>>>;

/// Accepts browser sessions on its own thread and fans reload messages out
/// to all of them.
#[derive(Clone)]
pub struct ReloadHub {
    sessions: Sessions,
    outbox: mpsc::Sender<ReloadMessage>,
    addr: SocketAddr,
}

impl std::fmt::Debug for ReloadHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReloadHub")
            .field("addr", &self.addr)
            .field("sessions", &self.session_count())
            .finish()
    }
}

impl ReloadHub {
    /// Bind (retrying on the next ports if taken) and start accepting.
    pub fn start(host: IpAddr, base_port: u16) -> Result<Self> {
        let (listener, addr) = bind_with_retry(host, base_port)?;
        let sessions: Sessions = Arc::new(Mutex::new(Vec::new()));

        let accept_sessions = Arc::clone(&sessions);
        thread::Builder::new()
            .name("assetpipe-reload".into())
            .spawn(move || accept_loop(listener, accept_sessions))?;

        let (outbox, inbox) = mpsc::channel::<ReloadMessage>();
        let send_sessions = Arc::clone(&sessions);
        thread::Builder::new()
            .name("assetpipe-reload-send".into())
            .spawn(move || {
                for msg in inbox {
                    deliver(&send_sessions, &msg);
                }
            })?;

        info!(%addr, "reload hub listening");
        Ok(Self {
            sessions,
            outbox,
            addr,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn session_count(&self) -> usize {
        self.sessions
            .lock()
            .map(|s| s.len())
            .unwrap_or_default()
    }

    /// Send a message to every session on the calling thread; sessions that
    /// fail are dropped. Returns how many sessions received it.
    pub fn broadcast(&self, msg: &ReloadMessage) -> usize {
        deliver(&self.sessions, msg)
    }

    /// Queue a message for the delivery thread and return immediately.
    /// Messages go out in the order they were queued.
    pub fn enqueue(&self, msg: ReloadMessage) {
        if self.outbox.send(msg).is_err() {
            warn!("reload delivery thread is gone; dropping message");
        }
    }
}

fn deliver(sessions: &Sessions, msg: &ReloadMessage) -> usize {
    let json = msg.to_json();
    let mut sessions = sessions.lock().unwrap_or_else(|e| e.into_inner());

    if sessions.is_empty() {
        debug!("no reload sessions connected");
        return 0;
    }

    sessions.retain_mut(|ws| match ws.send(Message::Text(json.clone().into())) {
        Ok(()) => true,
        Err(e) => {
            debug!(error = %e, "reload session disconnected");
            false
        }
    });
    debug!(sessions = sessions.len(), "reload broadcast");
    sessions.len()
}

fn accept_loop(listener: TcpListener, sessions: Sessions) {
    for stream in listener.incoming() {
        let stream = match stream {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "reload hub accept error");
                continue;
            }
        };

        // Handshake off the accept thread so a silent client cannot hold up
        // the ones behind it.
        let sessions = Arc::clone(&sessions);
        let spawned = thread::Builder::new()
            .name("assetpipe-reload-handshake".into())
            .spawn(move || register(stream, &sessions));
        if let Err(e) = spawned {
            warn!(error = %e, "failed to spawn reload handshake thread");
        }
    }
}

fn register(stream: TcpStream, sessions: &Sessions) {
    if let Err(e) = stream
        .set_read_timeout(Some(HANDSHAKE_TIMEOUT))
        .and_then(|()| stream.set_write_timeout(Some(HANDSHAKE_TIMEOUT)))
    {
        debug!(error = %e, "failed to configure reload socket");
        return;
    }

    let mut ws = match tungstenite::accept(stream) {
        Ok(ws) => ws,
        Err(e) => {
            debug!(error = %e, "websocket handshake failed");
            return;
        }
    };

    let hello = ReloadMessage::connected().to_json();
    if let Err(e) = ws.send(Message::Text(hello.into())) {
        debug!(error = %e, "failed to greet reload session");
        return;
    }
    if let Err(e) = ws.get_ref().set_write_timeout(Some(SEND_TIMEOUT)) {
        debug!(error = %e, "failed to set reload send timeout");
        return;
    }

    let mut guard = sessions.lock().unwrap_or_else(|e| e.into_inner());
    guard.push(ws);
    debug!(sessions = guard.len(), "reload session connected");
}

fn bind_with_retry(host: IpAddr, base_port: u16) -> Result<(TcpListener, SocketAddr)> {
    let mut last_error = None;

    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(SocketAddr::new(host, port)) {
            Ok(listener) => {
                let addr = listener.local_addr()?;
                if offset > 0 {
                    info!(base_port, port = addr.port(), "reload port in use; using next free port");
                }
                return Ok((listener, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow!(
        "failed to bind reload hub after {} attempts: {}",
        MAX_PORT_RETRIES,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::time::{Duration, Instant};

    #[test]
    fn delivers_to_connected_sessions() {
        let hub = ReloadHub::start(IpAddr::V4(Ipv4Addr::LOCALHOST), 0).unwrap();
        let url = format!("ws://{}", hub.addr());
        let (mut client, _) = tungstenite::connect(url).unwrap();

        let hello = client.read().unwrap();
        assert!(hello.to_text().unwrap().contains("connected"));

        let deadline = Instant::now() + Duration::from_secs(5);
        while hub.session_count() == 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }

        let sent = hub.broadcast(&ReloadMessage::Reload { reason: None });
        assert_eq!(sent, 1);
        let msg = client.read().unwrap();
        assert_eq!(msg.to_text().unwrap(), r#"{"type":"reload"}"#);
    }

    fn wait_for_sessions(hub: &ReloadHub, n: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while hub.session_count() < n && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn silent_connection_does_not_block_later_sessions() {
        let hub = ReloadHub::start(IpAddr::V4(Ipv4Addr::LOCALHOST), 0).unwrap();

        // Connects but never sends a handshake.
        let _idle = TcpStream::connect(hub.addr()).unwrap();

        let (mut client, _) = tungstenite::connect(format!("ws://{}", hub.addr())).unwrap();
        let hello = client.read().unwrap();
        assert!(hello.to_text().unwrap().contains("connected"));

        wait_for_sessions(&hub, 1);
        assert_eq!(hub.session_count(), 1);
    }

    #[test]
    fn enqueued_messages_arrive_in_order() {
        let hub = ReloadHub::start(IpAddr::V4(Ipv4Addr::LOCALHOST), 0).unwrap();
        let (mut client, _) = tungstenite::connect(format!("ws://{}", hub.addr())).unwrap();
        client.read().unwrap();
        wait_for_sessions(&hub, 1);

        hub.enqueue(ReloadMessage::Css {
            paths: vec!["/css/main.min.css".to_string()],
        });
        hub.enqueue(ReloadMessage::Reload { reason: None });

        assert_eq!(
            client.read().unwrap().to_text().unwrap(),
            r#"{"type":"css","paths":["/css/main.min.css"]}"#
        );
        assert_eq!(
            client.read().unwrap().to_text().unwrap(),
            r#"{"type":"reload"}"#
        );
    }
}
