//! Realtime channel for the sim console client.
//!
//! This crate provides:
//! - [`TransportManager`]: opens a [`Channel`] to a server endpoint, preferring a
//!   WebSocket and degrading to timed polling when sockets are unavailable or drop
//! - [`Channel`]: uniform `send`/`close` handle regardless of the active transport
//! - [`ChannelEvents`]: ordered stream of lifecycle and message events
//!
//! Exactly one transport is active per channel at any instant. Once a channel
//! has fallen back to polling it does not return to the socket.

mod channel;
mod connector;
mod endpoint;
mod error;
mod poll;

pub use channel::{
    Channel, ChannelEvent, ChannelEvents, ChannelOptions, ChannelState, ChannelStatus, Inbound,
    TransportKind, TransportManager, DEFAULT_POLL_INTERVAL,
};
pub use connector::{FrameSink, FrameStream, SocketConnector, SocketIo, TungsteniteConnector};
pub use endpoint::resolve_socket_url;
pub use error::{TransportError, TransportResult};
pub use poll::{HttpPollSource, PollSource};
