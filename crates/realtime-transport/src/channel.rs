//! Channel lifecycle: socket first, polling fallback.

use crate::{
    resolve_socket_url, HttpPollSource, PollSource, SocketConnector, SocketIo, TransportError,
    TransportResult, TungsteniteConnector,
};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};
use url::Url;

/// Default interval between fallback polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Capacity of the event queue between the driver task and the consumer.
const EVENT_QUEUE_CAPACITY: usize = 256;

/// Capacity of the outbound socket queue.
const OUTBOUND_CAPACITY: usize = 100;

/// Upper bound on the close handshake.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Concrete delivery mechanism under a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Socket,
    Poll,
}

/// Channel lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Closed,
}

/// Active transport and its state, read atomically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelStatus {
    pub kind: TransportKind,
    pub state: ChannelState,
}

/// Inbound payload: raw frame text from a socket, decoded JSON from a poll.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Text(String),
    Json(Value),
}

/// Events delivered to the channel consumer, in transport order.
#[derive(Debug)]
pub enum ChannelEvent {
    /// A transport became active.
    Opened(TransportKind),
    /// An inbound payload.
    Message(Inbound),
    /// A transport-level failure. The channel may still be alive.
    Error(TransportError),
}

/// Options for [`TransportManager::open`].
#[derive(Debug, Clone)]
pub struct ChannelOptions {
    /// Fallback endpoint. Without it a failed socket closes the channel.
    pub poll_url: Option<Url>,
    pub poll_interval: Duration,
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self {
            poll_url: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl ChannelOptions {
    pub fn with_poll_url(mut self, url: Url) -> Self {
        self.poll_url = Some(url);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Opens channels against one origin.
pub struct TransportManager {
    origin: Url,
    connector: Option<Arc<dyn SocketConnector>>,
    poller: Arc<dyn PollSource>,
}

impl TransportManager {
    /// Create a manager without socket support; every channel polls.
    pub fn new(origin: Url, poller: Arc<dyn PollSource>) -> Self {
        Self {
            origin,
            connector: None,
            poller,
        }
    }

    /// Enable sockets through the given connector.
    pub fn with_socket(mut self, connector: Arc<dyn SocketConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Manager using WebSockets and authenticated HTTP polling.
    pub fn http(
        origin: Url,
        request_timeout: Duration,
        auth_token: Option<String>,
    ) -> TransportResult<Self> {
        let poller = HttpPollSource::new(request_timeout, auth_token)?;
        Ok(Self::new(origin, Arc::new(poller)).with_socket(Arc::new(TungsteniteConnector)))
    }

    pub fn supports_sockets(&self) -> bool {
        self.connector.is_some()
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Open a channel to `target`.
    ///
    /// The socket target is resolved and checked synchronously. If that fails
    /// the error is returned when no poll URL is configured; otherwise an
    /// error event is queued and polling starts without touching the socket.
    /// Must be called from within a Tokio runtime.
    pub fn open(
        &self,
        target: &str,
        options: ChannelOptions,
    ) -> TransportResult<(Channel, ChannelEvents)> {
        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);

        let socket = match &self.connector {
            Some(connector) => match self.prepare_socket(connector.as_ref(), target) {
                Ok(url) => Some((connector.clone(), url)),
                Err(e) => {
                    if options.poll_url.is_none() {
                        return Err(e);
                    }
                    warn!(endpoint = %target, error = %e, "Socket unavailable, polling instead");
                    let _ = event_tx.try_send(ChannelEvent::Error(e));
                    None
                }
            },
            None => {
                if options.poll_url.is_none() {
                    return Err(TransportError::NoTransport);
                }
                debug!("Socket support disabled, polling");
                None
            }
        };

        let (kind, url) = match (&socket, &options.poll_url) {
            (Some((_, url)), _) => (TransportKind::Socket, url.clone()),
            (None, Some(poll_url)) => (TransportKind::Poll, poll_url.clone()),
            (None, None) => return Err(TransportError::NoTransport),
        };

        let (status, _) = watch::channel(ChannelStatus {
            kind,
            state: ChannelState::Connecting,
        });
        let shared = Arc::new(Shared {
            status,
            outbound: Mutex::new(None),
            closed_by_caller: AtomicBool::new(false),
        });

        let driver = Driver {
            shared: shared.clone(),
            events: event_tx,
            poller: self.poller.clone(),
            poll_url: options.poll_url,
            poll_interval: options.poll_interval,
        };
        tokio::spawn(driver.run(socket));

        info!(url = %url, kind = ?kind, "Channel opening");

        let channel = Channel {
            shared: shared.clone(),
            url,
        };
        let events = ChannelEvents {
            shared,
            rx: event_rx,
        };
        Ok((channel, events))
    }

    fn prepare_socket(&self, connector: &dyn SocketConnector, target: &str) -> TransportResult<Url> {
        let url = resolve_socket_url(target, &self.origin)?;
        connector.check(&url)?;
        Ok(url)
    }
}

struct Shared {
    status: watch::Sender<ChannelStatus>,
    outbound: Mutex<Option<mpsc::Sender<String>>>,
    closed_by_caller: AtomicBool,
}

impl Shared {
    fn status(&self) -> ChannelStatus {
        *self.status.borrow()
    }

    fn is_closed(&self) -> bool {
        self.status().state == ChannelState::Closed
    }

    /// Move to `kind`/`state` unless already closed.
    fn transition(&self, kind: TransportKind, state: ChannelState) -> bool {
        self.status.send_if_modified(|status| {
            if status.state == ChannelState::Closed {
                return false;
            }
            status.kind = kind;
            status.state = state;
            true
        })
    }

    fn mark_closed(&self) -> bool {
        self.outbound.lock().take();
        self.status.send_if_modified(|status| {
            if status.state == ChannelState::Closed {
                return false;
            }
            status.state = ChannelState::Closed;
            true
        })
    }
}

async fn wait_closed(rx: &mut watch::Receiver<ChannelStatus>) {
    let _ = rx.wait_for(|status| status.state == ChannelState::Closed).await;
}

/// Handle to an open channel. Dropping it closes the channel.
pub struct Channel {
    shared: Arc<Shared>,
    url: Url,
}

impl Channel {
    /// Queue `data` on the socket. Returns false, without error, under
    /// polling or while the socket is not open.
    pub fn send(&self, data: impl Into<String>) -> bool {
        let status = self.shared.status();
        if status.kind != TransportKind::Socket || status.state != ChannelState::Open {
            return false;
        }

        match self.shared.outbound.lock().as_ref() {
            Some(sender) => sender.try_send(data.into()).is_ok(),
            None => false,
        }
    }

    /// Close the active transport. Idempotent; no events are delivered afterwards.
    pub fn close(&self) {
        self.shared.closed_by_caller.store(true, Ordering::SeqCst);
        if self.shared.mark_closed() {
            info!(url = %self.url, "Channel closed");
        }
    }

    pub fn status(&self) -> ChannelStatus {
        self.shared.status()
    }

    pub fn kind(&self) -> TransportKind {
        self.shared.status().kind
    }

    pub fn state(&self) -> ChannelState {
        self.shared.status().state
    }

    /// Socket URL, or the poll URL when the channel started on polling.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Subscribe to status changes.
    pub fn watch_status(&self) -> watch::Receiver<ChannelStatus> {
        self.shared.status.subscribe()
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        self.close();
    }
}

/// Ordered channel events.
pub struct ChannelEvents {
    shared: Arc<Shared>,
    rx: mpsc::Receiver<ChannelEvent>,
}

impl ChannelEvents {
    /// Next event, or `None` once the channel is closed by the caller or has
    /// failed without a fallback.
    pub async fn recv(&mut self) -> Option<ChannelEvent> {
        if self.shared.closed_by_caller.load(Ordering::SeqCst) {
            return None;
        }
        let event = self.rx.recv().await?;
        if self.shared.closed_by_caller.load(Ordering::SeqCst) {
            return None;
        }
        Some(event)
    }
}

enum SocketExit {
    ClosedByCaller,
    Dropped,
}

struct Driver {
    shared: Arc<Shared>,
    events: mpsc::Sender<ChannelEvent>,
    poller: Arc<dyn PollSource>,
    poll_url: Option<Url>,
    poll_interval: Duration,
}

impl Driver {
    async fn run(self, socket: Option<(Arc<dyn SocketConnector>, Url)>) {
        if let Some((connector, url)) = socket {
            if let SocketExit::ClosedByCaller = self.run_socket(connector.as_ref(), &url).await {
                return;
            }
            if self.shared.is_closed() {
                return;
            }
            self.emit(ChannelEvent::Error(TransportError::SocketClosed)).await;
        }

        match self.poll_url.clone() {
            Some(poll_url) => {
                self.run_poll(&poll_url).await;
            }
            None => {
                info!("Socket gone and no poll URL, closing channel");
            }
        }

        self.shared.mark_closed();
    }

    /// Deliver an event unless the channel closes first.
    async fn emit(&self, event: ChannelEvent) {
        if self.shared.is_closed() {
            return;
        }
        let mut closed = self.shared.status.subscribe();
        tokio::select! {
            biased;
            _ = wait_closed(&mut closed) => {}
            result = self.events.send(event) => {
                if result.is_err() {
                    debug!("Channel consumer dropped");
                }
            }
        }
    }

    async fn run_socket(&self, connector: &dyn SocketConnector, url: &Url) -> SocketExit {
        let mut closed = self.shared.status.subscribe();

        let connected = tokio::select! {
            biased;
            _ = wait_closed(&mut closed) => return SocketExit::ClosedByCaller,
            result = connector.connect(url) => result,
        };

        let SocketIo {
            mut frames,
            mut sink,
        } = match connected {
            Ok(io) => io,
            Err(e) => {
                warn!(url = %url, error = %e, "Socket connect failed");
                self.emit(ChannelEvent::Error(e)).await;
                return SocketExit::Dropped;
            }
        };

        let (outbound_tx, mut outbound_rx) = mpsc::channel::<String>(OUTBOUND_CAPACITY);
        *self.shared.outbound.lock() = Some(outbound_tx);

        if !self.shared.transition(TransportKind::Socket, ChannelState::Open) {
            let _ = tokio::time::timeout(CLOSE_TIMEOUT, sink.close()).await;
            return SocketExit::ClosedByCaller;
        }
        info!(url = %url, "Socket open");
        self.emit(ChannelEvent::Opened(TransportKind::Socket)).await;

        let exit = loop {
            tokio::select! {
                biased;
                _ = wait_closed(&mut closed) => {
                    let _ = tokio::time::timeout(CLOSE_TIMEOUT, sink.close()).await;
                    break SocketExit::ClosedByCaller;
                }
                Some(data) = outbound_rx.recv() => {
                    if let Err(e) = sink.send(data).await {
                        warn!(url = %url, error = %e, "Socket send failed");
                        self.emit(ChannelEvent::Error(e)).await;
                        break SocketExit::Dropped;
                    }
                }
                frame = frames.next() => match frame {
                    Some(Ok(text)) => {
                        self.emit(ChannelEvent::Message(Inbound::Text(text))).await;
                    }
                    Some(Err(e)) => {
                        warn!(url = %url, error = %e, "Socket error");
                        self.emit(ChannelEvent::Error(e)).await;
                        break SocketExit::Dropped;
                    }
                    None => {
                        info!(url = %url, "Socket closed by server");
                        break SocketExit::Dropped;
                    }
                },
            }
        };

        self.shared.outbound.lock().take();
        exit
    }

    async fn run_poll(&self, url: &Url) {
        if !self.shared.transition(TransportKind::Poll, ChannelState::Open) {
            return;
        }
        info!(
            url = %url,
            interval_ms = self.poll_interval.as_millis() as u64,
            "Polling started"
        );
        self.emit(ChannelEvent::Opened(TransportKind::Poll)).await;

        let mut closed = self.shared.status.subscribe();
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = wait_closed(&mut closed) => break,
                _ = ticker.tick() => {}
            }

            let result = tokio::select! {
                biased;
                _ = wait_closed(&mut closed) => break,
                result = self.poller.fetch(url) => result,
            };

            match result {
                Ok(Some(body)) => self.emit(ChannelEvent::Message(Inbound::Json(body))).await,
                Ok(None) => {}
                Err(e) => {
                    warn!(url = %url, error = %e, "Poll failed");
                    self.emit(ChannelEvent::Error(e)).await;
                }
            }
        }

        debug!(url = %url, "Polling stopped");
    }
}
