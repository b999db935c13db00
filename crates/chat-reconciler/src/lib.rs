//! Client-side source of truth for conversations and notifications.
//!
//! The [`Reconciler`] merges three data sources into one view:
//! - a persisted local snapshot ([`SnapshotStore`]) read once at startup
//! - bulk fetches over HTTP ([`ChatApi`])
//! - live payloads from a realtime channel, decoded once at the boundary
//!   ([`LiveEvent`])
//!
//! All network operations are fire-and-forget from the caller's point of
//! view: failures are logged and leave already-rendered state untouched.

mod api;
mod conversations;
mod envelope;
mod error;
mod model;
mod notifications;
mod reconciler;
mod snapshot;
mod surface;

pub use api::{ChatApi, HistoryResponse, HttpChatApi, NotificationFeed, SendRequest};
pub use conversations::ConversationStore;
pub use envelope::{decode_payload, Envelope, LiveEvent};
pub use error::{ApiError, ApiResult, ReconcileError, ReconcileResult};
pub use model::{
    Conversation, ConversationKey, ConversationKind, ConversationMap, ConversationSummary,
    Destination, EntityId, Message, Notification,
};
pub use notifications::NotificationCenter;
pub use reconciler::Reconciler;
pub use snapshot::{SnapshotStore, HISTORY_KEY};
pub use surface::{NullSurface, RecordingSurface, RenderSurface, SurfaceEvent};
