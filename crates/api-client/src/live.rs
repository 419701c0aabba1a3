//! Receive-only live connection to a running pipeline.
//!
//! [`LiveHandle`] owns a task that holds at most one socket. Frames are decoded
//! with [`InboundFrame`]; the accumulated event list and connection status are
//! published on a `watch` channel, and each change is also broadcast as a
//! [`LiveUpdate`] for callers that react to individual events.

use std::future::Future;
use std::time::Duration;

use futures::StreamExt;
use futures::stream::BoxStream;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use pipeline_ui_core::PipelineEvent;
use pipeline_ui_core::frame::InboundFrame;

use crate::client::ApiClient;
use crate::error::ApiError;

pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(5);
/// A handshake still pending after this long counts as a failed connect.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const UPDATE_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum LiveError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("handshake timed out after {0:?}")]
    Timeout(Duration),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Text frames from one open connection. The stream ends when the peer closes.
pub type FrameStream = BoxStream<'static, Result<String, LiveError>>;

pub trait LiveTransport: Send + Sync + 'static {
    fn connect(&self, url: &str) -> impl Future<Output = Result<FrameStream, LiveError>> + Send;
}

/// WebSocket transport backed by tokio-tungstenite.
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteTransport;

impl LiveTransport for TungsteniteTransport {
    async fn connect(&self, url: &str) -> Result<FrameStream, LiveError> {
        let (ws, _response) = tokio_tungstenite::connect_async(url).await?;
        let frames = ws.filter_map(|msg| async move {
            match msg {
                Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                Ok(Message::Binary(bytes)) => Some(Ok(String::from_utf8_lossy(&bytes).into_owned())),
                Ok(_) => None,
                Err(e) => Some(Err(LiveError::from(e))),
            }
        });
        Ok(frames.boxed())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    #[default]
    Disconnected,
    Error,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveState {
    pub target: Option<String>,
    pub status: ConnectionStatus,
    pub events: Vec<PipelineEvent>,
    /// Last pipeline status string pushed by the server.
    pub pipeline_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiveUpdate {
    Status(ConnectionStatus),
    Event(PipelineEvent),
    Backlog(Vec<PipelineEvent>),
    PipelineStatus(String),
}

#[derive(Debug, Clone)]
pub struct LiveOptions {
    pub auto_reconnect: bool,
    pub reconnect_interval: Duration,
}

impl Default for LiveOptions {
    fn default() -> Self {
        Self {
            auto_reconnect: false,
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
        }
    }
}

#[derive(Debug)]
enum LiveCommand {
    Connect,
    Disconnect,
    ClearEvents,
    SetTarget(Option<String>),
}

/// Owns the live connection task. Dropping the handle closes the socket.
pub struct LiveHandle {
    state: watch::Receiver<LiveState>,
    updates: broadcast::Sender<LiveUpdate>,
    commands: mpsc::UnboundedSender<LiveCommand>,
    task: JoinHandle<()>,
}

impl LiveHandle {
    /// Spawn the task. A `Some` target connects right away.
    pub fn spawn<T, U>(transport: T, url_for: U, target: Option<String>, options: LiveOptions) -> Self
    where
        T: LiveTransport,
        U: Fn(&str) -> Result<String, ApiError> + Send + Sync + 'static,
    {
        let (state_tx, state) = watch::channel(LiveState {
            target: target.clone(),
            ..LiveState::default()
        });
        let (updates, _) = broadcast::channel(UPDATE_CAPACITY);
        let (commands, command_rx) = mpsc::unbounded_channel();
        let live = LiveTask {
            transport,
            url_for,
            options,
            target,
            state: state_tx,
            updates: updates.clone(),
            socket: None,
            reconnect_at: None,
        };
        let task = tokio::spawn(live.run(command_rx));
        Self {
            state,
            updates,
            commands,
            task,
        }
    }

    /// WebSocket connection whose URL comes from [`ApiClient::websocket_url`].
    pub fn for_client(client: ApiClient, target: Option<String>, options: LiveOptions) -> Self {
        Self::spawn(
            TungsteniteTransport,
            move |id: &str| client.websocket_url(id),
            target,
            options,
        )
    }

    pub fn subscribe(&self) -> watch::Receiver<LiveState> {
        self.state.clone()
    }

    pub fn snapshot(&self) -> LiveState {
        self.state.borrow().clone()
    }

    /// Per-change notifications. Only updates sent after this call are seen.
    pub fn updates(&self) -> broadcast::Receiver<LiveUpdate> {
        self.updates.subscribe()
    }

    /// Open the socket unless one is already open. Cancels a pending reconnect.
    pub fn connect(&self) {
        let _ = self.commands.send(LiveCommand::Connect);
    }

    pub fn disconnect(&self) {
        let _ = self.commands.send(LiveCommand::Disconnect);
    }

    pub fn clear_events(&self) {
        let _ = self.commands.send(LiveCommand::ClearEvents);
    }

    /// Tear down the current socket and follow another pipeline.
    pub fn set_target(&self, target: Option<String>) {
        let _ = self.commands.send(LiveCommand::SetTarget(target));
    }
}

impl Drop for LiveHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

enum Wake {
    Command(Option<LiveCommand>),
    Frame(Option<Result<String, LiveError>>),
    Reconnect,
}

struct LiveTask<T, U> {
    transport: T,
    url_for: U,
    options: LiveOptions,
    target: Option<String>,
    state: watch::Sender<LiveState>,
    updates: broadcast::Sender<LiveUpdate>,
    socket: Option<FrameStream>,
    reconnect_at: Option<Instant>,
}

impl<T, U> LiveTask<T, U>
where
    T: LiveTransport,
    U: Fn(&str) -> Result<String, ApiError> + Send + Sync + 'static,
{
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<LiveCommand>) {
        // A command that arrived mid-handshake, handled before waiting again.
        let mut interrupted = None;
        if self.target.is_some() {
            interrupted = self.connect(&mut commands).await;
        }
        loop {
            let wake = match interrupted.take() {
                Some(cmd) => Wake::Command(cmd),
                None => {
                    let deadline = self.reconnect_at;
                    tokio::select! {
                        cmd = commands.recv() => Wake::Command(cmd),
                        frame = next_frame(&mut self.socket), if self.socket.is_some() => Wake::Frame(frame),
                        () = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => Wake::Reconnect,
                    }
                }
            };

            match wake {
                Wake::Command(None) => break,
                Wake::Command(Some(LiveCommand::Connect)) => {
                    interrupted = self.connect(&mut commands).await;
                }
                Wake::Command(Some(LiveCommand::Disconnect)) => self.disconnect(),
                Wake::Command(Some(LiveCommand::ClearEvents)) => self.clear_events(),
                Wake::Command(Some(LiveCommand::SetTarget(target))) => {
                    self.disconnect();
                    self.target = target;
                    let target = self.target.clone();
                    self.state.send_modify(|s| {
                        s.target = target;
                        s.events.clear();
                        s.pipeline_status = None;
                    });
                    if self.target.is_some() {
                        interrupted = self.connect(&mut commands).await;
                    }
                }
                Wake::Frame(Some(Ok(text))) => self.handle_frame(&text),
                Wake::Frame(Some(Err(e))) => {
                    warn!("live connection error: {e}");
                    self.set_status(ConnectionStatus::Error);
                    self.on_closed();
                }
                Wake::Frame(None) => {
                    debug!("live connection closed by peer");
                    self.on_closed();
                }
                Wake::Reconnect => {
                    self.reconnect_at = None;
                    debug!("reconnecting live connection");
                    interrupted = self.connect(&mut commands).await;
                }
            }
        }
    }

    /// Open the socket for the current target. The handshake keeps listening
    /// for commands: `connect` and `clear_events` are applied in place, any
    /// other command abandons the attempt and is returned for the caller to
    /// handle.
    async fn connect(
        &mut self,
        commands: &mut mpsc::UnboundedReceiver<LiveCommand>,
    ) -> Option<Option<LiveCommand>> {
        if self.socket.is_some() {
            return None;
        }
        self.reconnect_at = None;
        let target = self.target.clone()?;
        let url = match (self.url_for)(&target) {
            Ok(url) => url,
            Err(e) => {
                warn!(pipeline_id = %target, "cannot build live url: {e}");
                self.set_status(ConnectionStatus::Error);
                return None;
            }
        };

        self.set_status(ConnectionStatus::Connecting);
        let outcome = {
            let attempt = tokio::time::timeout(CONNECT_TIMEOUT, self.transport.connect(&url));
            tokio::pin!(attempt);
            loop {
                tokio::select! {
                    result = &mut attempt => {
                        break Ok(result.unwrap_or(Err(LiveError::Timeout(CONNECT_TIMEOUT))));
                    }
                    cmd = commands.recv() => match cmd {
                        Some(LiveCommand::Connect) => {}
                        Some(LiveCommand::ClearEvents) => self.clear_events(),
                        other => break Err(other),
                    },
                }
            }
        };

        let result = match outcome {
            Ok(result) => result,
            Err(cmd) => {
                debug!(%url, "live handshake abandoned");
                self.set_status(ConnectionStatus::Disconnected);
                return Some(cmd);
            }
        };
        match result {
            Ok(stream) => {
                info!(%url, "live connection open");
                self.socket = Some(stream);
                self.set_status(ConnectionStatus::Connected);
            }
            Err(e) => {
                warn!(%url, "live connection failed: {e}");
                self.set_status(ConnectionStatus::Error);
                self.on_closed();
            }
        }
        None
    }

    /// Manual close. Never schedules a reconnect.
    fn disconnect(&mut self) {
        self.reconnect_at = None;
        if self.socket.take().is_some() {
            self.set_status(ConnectionStatus::Disconnected);
        }
    }

    fn on_closed(&mut self) {
        self.socket = None;
        self.set_status(ConnectionStatus::Disconnected);
        if self.options.auto_reconnect && self.target.is_some() && self.reconnect_at.is_none() {
            self.reconnect_at = Some(Instant::now() + self.options.reconnect_interval);
            debug!(
                delay_ms = self.options.reconnect_interval.as_millis() as u64,
                "live reconnect scheduled"
            );
        }
    }

    fn clear_events(&self) {
        self.state.send_if_modified(|s| {
            let had_events = !s.events.is_empty();
            s.events.clear();
            had_events
        });
    }

    fn set_status(&self, status: ConnectionStatus) {
        let changed = self
            .state
            .send_if_modified(|s| std::mem::replace(&mut s.status, status) != status);
        if changed {
            let _ = self.updates.send(LiveUpdate::Status(status));
        }
    }

    fn handle_frame(&self, text: &str) {
        let frame = match InboundFrame::parse(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("dropping malformed live frame: {e}");
                return;
            }
        };

        for reason in &frame.skipped {
            warn!("skipping undecodable part of live frame: {reason}");
        }

        // Event first: a backlog in the same frame replaces the list wholesale.
        if let Some(event) = frame.event {
            let appended = event.clone();
            self.state.send_modify(|s| s.events.push(appended));
            let _ = self.updates.send(LiveUpdate::Event(event));
        }
        if let Some(backlog) = frame.backlog {
            let events = backlog.clone();
            self.state.send_modify(|s| s.events = events);
            let _ = self.updates.send(LiveUpdate::Backlog(backlog));
        }
        if let Some(status) = frame.status {
            let latest = status.clone();
            self.state.send_modify(|s| s.pipeline_status = Some(latest));
            let _ = self.updates.send(LiveUpdate::PipelineStatus(status));
        }
    }
}

async fn next_frame(socket: &mut Option<FrameStream>) -> Option<Result<String, LiveError>> {
    match socket {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}
