//! Connection id -> session registry
//!
//! Constructed once at startup and shared behind an `Arc`; `shutdown`
//! stops every loop and empties the map. A session whose viewer stops
//! accepting events is removed on its own, which drops its outbound sender
//! and ends the viewer's receive stream.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ahash::AHashMap;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::config::{DuelConfig, ServerConfig};
use crate::core::types::ConnectionId;
use crate::opponent::RandomSelector;
use crate::render::PngFrameEncoder;
use crate::session::handle::{LoopTiming, Session};
use crate::session::protocol::{ClientMessage, ServerMessage};
use crate::session::state::SessionCore;
use crate::simulation::engine::Engine;

/// Builds the core for a new session; the second argument is the session ordinal
pub type CoreFactory = Arc<dyn Fn(&DuelConfig, u64) -> SessionCore + Send + Sync>;

/// PNG frames and a random opponent, seeded from the config when it has a seed
pub fn default_core(config: &DuelConfig, ordinal: u64) -> SessionCore {
    let selector = match config.seed {
        Some(seed) => RandomSelector::new(config, seed.wrapping_add(ordinal)),
        None => RandomSelector::from_entropy(config),
    };
    let engine = Engine::new(config.clone(), Box::new(selector));
    let encoder = PngFrameEncoder::new(config.frame_width, config.frame_height);
    SessionCore::new(engine, Box::new(encoder))
}

pub struct SessionManager {
    config: DuelConfig,
    server: ServerConfig,
    factory: CoreFactory,
    sessions: Arc<RwLock<AHashMap<ConnectionId, Arc<Session>>>>,
    created: AtomicU64,
}

impl SessionManager {
    pub fn new(config: DuelConfig, server: ServerConfig) -> Self {
        Self::with_factory(config, server, Arc::new(default_core))
    }

    pub fn with_factory(config: DuelConfig, server: ServerConfig, factory: CoreFactory) -> Self {
        Self {
            config,
            server,
            factory,
            sessions: Arc::new(RwLock::new(AHashMap::new())),
            created: AtomicU64::new(0),
        }
    }

    /// Register a new viewer. The session is created but not started.
    pub async fn connect(&self) -> (ConnectionId, mpsc::Receiver<ServerMessage>) {
        let id = ConnectionId::new();
        let ordinal = self.created.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.server.outbound_queue);

        let timing = LoopTiming {
            tick_interval: self.config.tick_interval(),
            send_timeout: self.server.send_timeout(),
        };
        let core = (self.factory)(&self.config, ordinal);
        let session = Arc::new(Session::new(id, core, tx, timing));

        let detached = session.detached();
        self.sessions.write().await.insert(id, session);
        self.reap_on_detach(id, detached);
        info!(session = %id, "Viewer connected");
        (id, rx)
    }

    fn reap_on_detach(&self, id: ConnectionId, detached: CancellationToken) {
        let sessions = Arc::clone(&self.sessions);
        tokio::spawn(async move {
            detached.cancelled().await;
            let removed = sessions.write().await.remove(&id);
            if let Some(session) = removed {
                session.shutdown().await;
                warn!(session = %id, "Viewer detached, session removed");
            }
        });
    }

    pub async fn get(&self, id: ConnectionId) -> Option<Arc<Session>> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Route a message to its session. Unknown ids are ignored.
    pub async fn dispatch(&self, id: ConnectionId, message: ClientMessage) {
        let Some(session) = self.get(id).await else {
            debug!(session = %id, "Message for unknown session ignored");
            return;
        };

        match message {
            ClientMessage::Start => session.start().await,
            ClientMessage::Pause => session.pause().await,
            ClientMessage::Reset => session.reset().await,
            ClientMessage::KeyEvent { key, pressed } => session.handle_input(&key, pressed).await,
        }
    }

    /// Parse and route a raw text message; malformed input is dropped
    pub async fn dispatch_text(&self, id: ConnectionId, text: &str) {
        match ClientMessage::parse(text) {
            Some(message) => self.dispatch(id, message).await,
            None => debug!(session = %id, "Malformed message ignored: {}", text),
        }
    }

    /// Remove and stop a session. Returns false if it was already gone.
    pub async fn disconnect(&self, id: ConnectionId) -> bool {
        let removed = self.sessions.write().await.remove(&id);
        match removed {
            Some(session) => {
                session.shutdown().await;
                info!(session = %id, "Viewer disconnected");
                true
            }
            None => false,
        }
    }

    /// Stop every session and clear the registry
    pub async fn shutdown(&self) {
        let sessions: Vec<_> = self.sessions.write().await.drain().collect();
        for (_, session) in &sessions {
            session.shutdown().await;
        }
        info!(count = sessions.len(), "All sessions stopped");
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    pub fn config(&self) -> &DuelConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::engine::SessionState;

    fn manager() -> SessionManager {
        let config = DuelConfig {
            seed: Some(1),
            frame_width: 32,
            frame_height: 24,
            ..DuelConfig::default()
        };
        SessionManager::new(config, ServerConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_does_not_start() {
        let manager = manager();
        let (id, _rx) = manager.connect().await;

        let session = manager.get(id).await.unwrap();
        assert_eq!(session.state().await, SessionState::Idle);
        assert!(!session.is_looping().await);
        assert_eq!(manager.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_start_produces_frames() {
        let manager = manager();
        let (id, mut rx) = manager.connect().await;

        manager.dispatch_text(id, r#"{"type":"START"}"#).await;
        let msg = rx.recv().await.unwrap();
        assert!(matches!(msg, ServerMessage::Frame { ref frame } if frame.width == 32));
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_and_unknown_are_ignored() {
        let manager = manager();
        let (id, _rx) = manager.connect().await;

        manager.dispatch_text(id, "{").await;
        manager.dispatch_text(id, r#"{"type":"WARP"}"#).await;
        manager.dispatch(ConnectionId::new(), ClientMessage::Start).await;

        let session = manager.get(id).await.unwrap();
        assert_eq!(session.state().await, SessionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_removes_session() {
        let manager = manager();
        let (id, _rx) = manager.connect().await;
        manager.dispatch(id, ClientMessage::Start).await;

        let session = manager.get(id).await.unwrap();
        assert!(manager.disconnect(id).await);
        assert!(!manager.disconnect(id).await);
        assert!(manager.is_empty().await);
        assert!(!session.is_looping().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sessions_are_isolated() {
        let manager = manager();
        let (a, _rx_a) = manager.connect().await;
        let (b, _rx_b) = manager.connect().await;

        manager.dispatch(a, ClientMessage::Start).await;
        let a_session = manager.get(a).await.unwrap();
        let b_session = manager.get(b).await.unwrap();

        assert_eq!(a_session.state().await, SessionState::CountingDown);
        assert_eq!(b_session.state().await, SessionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_clears_everything() {
        let manager = manager();
        for _ in 0..3 {
            let (id, _rx) = manager.connect().await;
            manager.dispatch(id, ClientMessage::Start).await;
        }
        manager.shutdown().await;
        assert!(manager.is_empty().await);
    }
}
