//! Conversation, message and notification records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Identifier as the backend sends it: a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Int(i64),
    Text(String),
}

impl EntityId {
    /// Ids compare by their rendered form, so `2` and `"2"` are the same peer.
    pub fn same_as(&self, other: &EntityId) -> bool {
        match (self, other) {
            (EntityId::Int(a), EntityId::Int(b)) => a == b,
            _ => self.to_string() == other.to_string(),
        }
    }

    /// `0` and `""` carry no identity.
    pub fn is_blank(&self) -> bool {
        match self {
            EntityId::Int(n) => *n == 0,
            EntityId::Text(s) => s.is_empty(),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Int(n) => write!(f, "{n}"),
            EntityId::Text(s) => f.write_str(s),
        }
    }
}

/// Canonical integers parse as numbers, anything else stays text.
impl FromStr for EntityId {
    type Err = Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Ok(match raw.parse::<i64>() {
            Ok(n) if n.to_string() == raw => EntityId::Int(n),
            _ => EntityId::Text(raw.to_string()),
        })
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        EntityId::Int(value)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        EntityId::Text(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        EntityId::Text(value)
    }
}

/// One chat message. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub sender_id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<EntityId>,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Fields the client does not interpret, kept for round-tripping.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Message {
    /// Group id, if this message targets a group.
    pub fn group(&self) -> Option<&EntityId> {
        self.group_id.as_ref().filter(|id| !id.is_blank())
    }

    /// Bucket for a live message: its group, else a direct thread with the sender.
    pub fn live_destination(&self) -> Destination {
        match self.group() {
            Some(group) => Destination::Group(group.clone()),
            None => Destination::Direct(self.sender_id.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    Direct,
    Group,
}

/// Conversation key: `u:<peer>` for direct threads, `g:<group>` for groups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationKey(String);

impl ConversationKey {
    pub fn direct(peer: &EntityId) -> Self {
        Self(format!("u:{peer}"))
    }

    pub fn group(group: &EntityId) -> Self {
        Self(format!("g:{group}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where an outgoing message goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Direct(EntityId),
    Group(EntityId),
}

impl Destination {
    pub fn key(&self) -> ConversationKey {
        match self {
            Destination::Direct(peer) => ConversationKey::direct(peer),
            Destination::Group(group) => ConversationKey::group(group),
        }
    }

    pub fn kind(&self) -> ConversationKind {
        match self {
            Destination::Direct(_) => ConversationKind::Direct,
            Destination::Group(_) => ConversationKind::Group,
        }
    }

    pub fn id(&self) -> &EntityId {
        match self {
            Destination::Direct(id) | Destination::Group(id) => id,
        }
    }
}

/// An append-only message thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(rename = "type")]
    pub kind: ConversationKind,
    pub id: EntityId,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Conversation {
    pub fn new(kind: ConversationKind, id: EntityId) -> Self {
        Self {
            kind,
            id,
            messages: Vec::new(),
        }
    }

    pub fn destination(&self) -> Destination {
        match self.kind {
            ConversationKind::Direct => Destination::Direct(self.id.clone()),
            ConversationKind::Group => Destination::Group(self.id.clone()),
        }
    }

    /// List label, e.g. `User 2` or `Group 7`.
    pub fn label(&self) -> String {
        match self.kind {
            ConversationKind::Direct => format!("User {}", self.id),
            ConversationKind::Group => format!("Group {}", self.id),
        }
    }
}

/// All conversations, keyed. This is also the persisted snapshot shape.
pub type ConversationMap = BTreeMap<ConversationKey, Conversation>;

/// Row of the conversation list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSummary {
    pub key: ConversationKey,
    pub label: String,
    pub message_count: usize,
}

/// A user-facing notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: EntityId,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, alias = "severity", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<String>,
    /// Some backends send a boolean instead of a read timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Notification {
    pub fn is_unread(&self) -> bool {
        self.read_at.is_none() && self.read != Some(true)
    }

    /// Flip to read. An existing read stamp is kept; read never reverts.
    pub fn mark_read(&mut self, at: &str) {
        if self.read_at.is_none() {
            self.read_at = Some(at.to_string());
        }
        if self.read.is_some() {
            self.read = Some(true);
        }
    }
}
