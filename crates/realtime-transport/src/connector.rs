//! Socket connectors.

use crate::{TransportError, TransportResult};
use async_trait::async_trait;
use futures_util::{future, Sink, SinkExt, Stream, StreamExt};
use std::pin::Pin;
use tokio_tungstenite::{connect_async, tungstenite, tungstenite::Message};
use tracing::debug;
use url::Url;

/// Inbound socket frames as text. The stream ends when the socket closes.
pub type FrameStream = Pin<Box<dyn Stream<Item = TransportResult<String>> + Send>>;

/// Outbound side of a connected socket.
pub type FrameSink = Pin<Box<dyn Sink<String, Error = TransportError> + Send>>;

/// A connected socket split into its two halves.
pub struct SocketIo {
    pub frames: FrameStream,
    pub sink: FrameSink,
}

/// Establishes socket connections for a channel.
///
/// `check` runs synchronously inside `open()` and models socket construction:
/// an error there either propagates to the caller or triggers immediate
/// polling. `connect` performs the handshake; its failure is treated like
/// the socket closing.
#[async_trait]
pub trait SocketConnector: Send + Sync {
    fn check(&self, url: &Url) -> TransportResult<()> {
        match url.scheme() {
            "ws" | "wss" => Ok(()),
            other => Err(TransportError::UnsupportedScheme(other.to_string())),
        }
    }

    async fn connect(&self, url: &Url) -> TransportResult<SocketIo>;
}

/// WebSocket connector backed by `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

#[async_trait]
impl SocketConnector for TungsteniteConnector {
    async fn connect(&self, url: &Url) -> TransportResult<SocketIo> {
        let (ws_stream, _) = connect_async(url.as_str()).await?;
        debug!(url = %url, "WebSocket handshake complete");

        let (write, read) = ws_stream.split();

        let sink = write
            .with(|text: String| {
                future::ready(Ok::<Message, tungstenite::Error>(Message::Text(text.into())))
            })
            .sink_map_err(TransportError::from);

        let frames = read.filter_map(|frame| {
            future::ready(match frame {
                Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                Ok(Message::Binary(data)) => Some(Ok(String::from_utf8_lossy(&data).into_owned())),
                Ok(_) => None,
                Err(e) => Some(Err(TransportError::from(e))),
            })
        });

        Ok(SocketIo {
            frames: Box::pin(frames),
            sink: Box::pin(sink),
        })
    }
}
