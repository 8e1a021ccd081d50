//! A running session: the fixed-tick loop and its control surface
//!
//! Control messages and ticks both go through the same mutex, so a control
//! message is never applied in the middle of a tick. Each loop owns a
//! cancellation token; pausing or disconnecting cancels it and the loop
//! exits before its next tick.
//!
//! A viewer that cannot take an event within the send timeout is treated
//! like a closed connection: the loop stops and the session's `detached`
//! token fires so the owner can tear it down.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::Mutex;
use tokio::task;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::types::ConnectionId;
use crate::session::protocol::ServerMessage;
use crate::session::state::SessionCore;
use crate::simulation::engine::SessionState;

/// Handle to the active tick loop
struct Ticker {
    token: CancellationToken,
    generation: u64,
}

struct Inner {
    core: SessionCore,
    ticker: Option<Ticker>,
    generations: u64,
}

impl Inner {
    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.token.cancel();
        }
    }

    /// Drop the ticker only if it still belongs to the given loop
    fn release(&mut self, generation: u64) {
        if self.ticker.as_ref().map(|t| t.generation) == Some(generation) {
            self.stop_ticker();
        }
    }
}

/// Timing knobs for the tick loop
#[derive(Debug, Clone, Copy)]
pub struct LoopTiming {
    pub tick_interval: Duration,
    pub send_timeout: Duration,
}

pub struct Session {
    id: ConnectionId,
    inner: Arc<Mutex<Inner>>,
    outbound: mpsc::Sender<ServerMessage>,
    timing: LoopTiming,
    detached: CancellationToken,
}

impl Session {
    pub fn new(
        id: ConnectionId,
        core: SessionCore,
        outbound: mpsc::Sender<ServerMessage>,
        timing: LoopTiming,
    ) -> Self {
        Self {
            id,
            inner: Arc::new(Mutex::new(Inner {
                core,
                ticker: None,
                generations: 0,
            })),
            outbound,
            timing,
            detached: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Begin or resume, starting the tick loop if it is not already running
    pub async fn start(&self) {
        let mut inner = self.inner.lock().await;
        if inner.core.start() {
            self.ensure_ticker(&mut inner);
            info!(session = %self.id, state = ?inner.core.state(), "Session started");
        } else {
            debug!(session = %self.id, state = ?inner.core.state(), "Start ignored");
        }
    }

    /// Stop ticking; all state is kept
    pub async fn pause(&self) {
        let mut inner = self.inner.lock().await;
        inner.core.pause();
        inner.stop_ticker();
        info!(session = %self.id, "Session paused");
    }

    /// Discard all state and start again from round 1
    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        if inner.core.reset() {
            self.ensure_ticker(&mut inner);
        } else {
            inner.stop_ticker();
        }
        info!(session = %self.id, "Session reset");
    }

    pub async fn handle_input(&self, key: &str, pressed: bool) {
        let mut inner = self.inner.lock().await;
        if inner.core.handle_input(key, pressed) {
            debug!(session = %self.id, key, "Speed input applied");
        }
    }

    /// Stop the loop for good; used on disconnect and server shutdown
    pub async fn shutdown(&self) {
        let mut inner = self.inner.lock().await;
        inner.core.pause();
        inner.stop_ticker();
        self.detached.cancel();
    }

    /// Fires once the viewer is gone or too slow to take an event
    pub fn detached(&self) -> CancellationToken {
        self.detached.clone()
    }

    pub fn is_detached(&self) -> bool {
        self.detached.is_cancelled()
    }

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.core.state()
    }

    /// Whether a tick loop is currently scheduled
    pub async fn is_looping(&self) -> bool {
        self.inner.lock().await.ticker.is_some()
    }

    /// Read session internals under the session lock
    pub async fn inspect<R>(&self, f: impl FnOnce(&SessionCore) -> R) -> R {
        let inner = self.inner.lock().await;
        f(&inner.core)
    }

    fn ensure_ticker(&self, inner: &mut Inner) {
        if inner
            .ticker
            .as_ref()
            .is_some_and(|t| !t.token.is_cancelled())
        {
            return;
        }

        inner.generations += 1;
        let generation = inner.generations;
        let token = CancellationToken::new();
        inner.ticker = Some(Ticker {
            token: token.clone(),
            generation,
        });

        tokio::spawn(run_loop(
            self.id,
            Arc::clone(&self.inner),
            self.outbound.clone(),
            token,
            self.detached.clone(),
            generation,
            self.timing,
        ));
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // Loops hold their own Arc to the state; make sure they stop too
        if let Ok(mut inner) = self.inner.try_lock() {
            inner.stop_ticker();
        }
    }
}

/// Run CPU-heavy work without stalling the other tasks on this worker
fn off_worker<R>(f: impl FnOnce() -> R) -> R {
    match Handle::try_current().map(|h| h.runtime_flavor()) {
        Ok(RuntimeFlavor::MultiThread) => task::block_in_place(f),
        _ => f(),
    }
}

async fn run_loop(
    id: ConnectionId,
    inner: Arc<Mutex<Inner>>,
    outbound: mpsc::Sender<ServerMessage>,
    token: CancellationToken,
    detached: CancellationToken,
    generation: u64,
    timing: LoopTiming,
) {
    let mut interval = time::interval(timing.tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick of an interval fires immediately
    interval.tick().await;

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = interval.tick() => {}
        }

        let output = {
            let mut guard = inner.lock().await;
            if token.is_cancelled() {
                break;
            }
            let output = off_worker(|| guard.core.step());
            if !output.keep_running {
                guard.release(generation);
            }
            output
        };

        let mut lost = false;
        for message in output.messages {
            if let ServerMessage::Frame { .. } = message {
                match outbound.try_send(message) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        debug!(session = %id, "Outbound queue full, frame dropped");
                    }
                    Err(TrySendError::Closed(_)) => {
                        warn!(session = %id, "Viewer channel closed, stopping tick loop");
                        lost = true;
                        break;
                    }
                }
            } else {
                let kind = message.kind();
                match time::timeout(timing.send_timeout, outbound.send(message)).await {
                    Ok(Ok(())) => debug!(session = %id, kind, "Event sent"),
                    Ok(Err(_)) => {
                        warn!(session = %id, kind, "Viewer channel closed before event");
                        lost = true;
                        break;
                    }
                    Err(_) => {
                        warn!(session = %id, kind, "Timed out sending event, detaching viewer");
                        lost = true;
                        break;
                    }
                }
            }
        }

        if lost {
            let mut guard = inner.lock().await;
            guard.core.pause();
            guard.release(generation);
            detached.cancel();
            break;
        }

        if !output.keep_running {
            break;
        }
    }

    debug!(session = %id, generation, "Tick loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DuelConfig;
    use crate::core::error::Result;
    use crate::opponent::ScriptedSelector;
    use crate::render::{Frame, FrameEncoder, RenderSnapshot};
    use crate::simulation::engine::Engine;

    struct BlankEncoder;

    impl FrameEncoder for BlankEncoder {
        fn encode(&mut self, _snapshot: &RenderSnapshot) -> Result<Frame> {
            Ok(Frame {
                width: 1,
                height: 1,
                data: vec![0],
            })
        }
    }

    fn session(queue: usize) -> (Session, mpsc::Receiver<ServerMessage>) {
        let config = DuelConfig::default();
        let timing = LoopTiming {
            tick_interval: config.tick_interval(),
            send_timeout: Duration::from_millis(250),
        };
        let engine = Engine::new(config, Box::new(ScriptedSelector::constant(50.0)));
        let core = SessionCore::new(engine, Box::new(BlankEncoder));
        let (tx, rx) = mpsc::channel(queue);
        (Session::new(ConnectionId::new(), core, tx, timing), rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_emits_frames() {
        let (session, mut rx) = session(64);
        session.start().await;

        for _ in 0..5 {
            let msg = rx.recv().await.unwrap();
            assert_eq!(msg.kind(), "FRAME");
        }
        assert_eq!(session.state().await, SessionState::CountingDown);
        assert!(session.is_looping().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_stops_frames() {
        let (session, mut rx) = session(64);
        session.start().await;
        rx.recv().await.unwrap();

        session.pause().await;
        assert!(!session.is_looping().await);
        let tick = session.inspect(|core| core.engine().current_tick()).await;

        time::sleep(Duration::from_secs(1)).await;
        while rx.try_recv().is_ok() {}
        assert_eq!(
            session.inspect(|core| core.engine().current_tick()).await,
            tick
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_start_keeps_one_loop() {
        let (session, mut rx) = session(256);
        session.start().await;
        session.start().await;

        time::sleep(Duration::from_millis(1000)).await;
        let ticks = session.inspect(|core| core.engine().current_tick()).await;
        // One loop at 30 ticks per second
        assert!((29..=31).contains(&ticks), "ticks = {ticks}");
        while rx.try_recv().is_ok() {}
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_queue_drops_frames_without_stalling() {
        let (session, _rx) = session(1);
        session.start().await;

        time::sleep(Duration::from_millis(500)).await;
        let ticks = session.inspect(|core| core.engine().current_tick()).await;
        assert!(ticks >= 14, "ticks = {ticks}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_channel_stops_loop() {
        let (session, rx) = session(8);
        drop(rx);
        session.start().await;

        time::sleep(Duration::from_millis(200)).await;
        assert!(!session.is_looping().await);
        assert!(!session.inspect(|core| core.is_running()).await);
        assert!(session.is_detached());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_does_not_detach() {
        let (session, _rx) = session(8);
        session.start().await;
        session.pause().await;
        assert!(!session.is_detached());

        session.shutdown().await;
        assert!(session.is_detached());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_ticks_on_multi_thread_runtime() {
        let (session, mut rx) = session(64);
        session.start().await;

        for _ in 0..3 {
            let msg = time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(msg.kind(), "FRAME");
        }
        session.shutdown().await;
    }

    #[test]
    fn test_off_worker_outside_runtime() {
        assert_eq!(off_worker(|| 2 + 2), 4);
    }
}
