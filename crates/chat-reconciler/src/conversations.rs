//! Conversation buckets and their merge rules.

use crate::{
    ChatApi, Conversation, ConversationKey, ConversationMap, ConversationSummary, Destination,
    EntityId, HistoryResponse, Message, RenderSurface, SendRequest, SnapshotStore,
};
use serde_json::Map;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Owns every conversation the client knows about.
///
/// Buckets are created lazily and only ever appended to. Every mutation is
/// followed by a snapshot write and a re-render.
pub struct ConversationStore {
    user_id: EntityId,
    conversations: ConversationMap,
    current: Option<ConversationKey>,
    api: Arc<dyn ChatApi>,
    snapshots: SnapshotStore,
    surface: Arc<dyn RenderSurface>,
}

impl ConversationStore {
    pub fn new(
        user_id: EntityId,
        api: Arc<dyn ChatApi>,
        snapshots: SnapshotStore,
        surface: Arc<dyn RenderSurface>,
    ) -> Self {
        Self {
            user_id,
            conversations: ConversationMap::new(),
            current: None,
            api,
            snapshots,
            surface,
        }
    }

    pub fn user_id(&self) -> &EntityId {
        &self.user_id
    }

    /// Replace in-memory state with the persisted snapshot.
    ///
    /// Returns the number of conversations loaded. A corrupt snapshot loads
    /// as empty.
    pub fn load_local(&mut self) -> usize {
        self.conversations = self.snapshots.load();
        self.render_list();
        self.conversations.len()
    }

    /// Fetch history and append it. Returns the number of messages merged,
    /// zero when the request failed.
    pub async fn fetch_history(&mut self) -> usize {
        match self.api.fetch_history(&self.user_id).await {
            Ok(history) => self.merge_history(history),
            Err(e) => {
                warn!(user_id = %self.user_id, error = %e, "History fetch failed");
                0
            }
        }
    }

    /// Partition a history response into buckets and append.
    ///
    /// History is additive; nothing already held is replaced or deduplicated.
    pub fn merge_history(&mut self, history: HistoryResponse) -> usize {
        let mut merged = 0;

        for message in history.direct_messages {
            let peer = self.direct_peer(&message);
            self.append(Destination::Direct(peer), message);
            merged += 1;
        }

        for (group, messages) in history.group_chats {
            // Object keys are strings; keep numeric group ids numeric.
            let group = group.parse::<EntityId>().unwrap_or(EntityId::Text(group));
            for message in messages {
                self.append(Destination::Group(group.clone()), message);
                merged += 1;
            }
        }

        info!(
            messages = merged,
            conversations = self.conversations.len(),
            "Merged chat history"
        );
        self.persist();
        self.render_list();
        if let Some(key) = self.current.clone() {
            self.render_thread(&key);
        }
        merged
    }

    /// Send `text` to `destination`.
    ///
    /// Blank text is not sent. On success the echoed message, or a local
    /// stand-in stamped with the current time, is appended. On failure
    /// nothing changes. Returns whether the message was appended.
    pub async fn send_message(&mut self, destination: &Destination, text: &str) -> bool {
        let content = text.trim();
        if content.is_empty() {
            debug!("Ignoring blank message");
            return false;
        }

        let request = match destination {
            Destination::Direct(peer) => SendRequest {
                sender_id: self.user_id.clone(),
                recipient_id: Some(peer.clone()),
                group_id: None,
                content: content.to_string(),
            },
            Destination::Group(group) => SendRequest {
                sender_id: self.user_id.clone(),
                recipient_id: None,
                group_id: Some(group.clone()),
                content: content.to_string(),
            },
        };

        let message = match self.api.send_message(&request).await {
            Ok(Some(echoed)) => echoed,
            Ok(None) => local_message(request),
            Err(e) => {
                warn!(destination = %destination.key(), error = %e, "Send failed");
                return false;
            }
        };

        let key = self.append(destination.clone(), message);
        self.persist();
        self.render_list();
        self.render_thread(&key);
        true
    }

    /// Send to the selected conversation. False when nothing is selected.
    pub async fn send_to_current(&mut self, text: &str) -> bool {
        let Some(destination) = self
            .current
            .as_ref()
            .and_then(|key| self.conversations.get(key))
            .map(Conversation::destination)
        else {
            debug!("No conversation selected");
            return false;
        };
        self.send_message(&destination, text).await
    }

    /// Append one live chat message.
    pub fn apply_message(&mut self, message: Message) -> ConversationKey {
        let key = self.append(message.live_destination(), message);
        debug!(conversation = %key, "Applied live message");

        self.persist();
        self.render_list();
        if self.current.as_ref() == Some(&key) {
            self.render_thread(&key);
        }
        key
    }

    /// Open a conversation. Returns false for an unknown key.
    pub fn select_conversation(&mut self, key: &ConversationKey) -> bool {
        if !self.conversations.contains_key(key) {
            return false;
        }
        self.current = Some(key.clone());
        self.render_thread(key);
        true
    }

    pub fn current(&self) -> Option<&ConversationKey> {
        self.current.as_ref()
    }

    pub fn conversations(&self) -> &ConversationMap {
        &self.conversations
    }

    pub fn conversation(&self, key: &ConversationKey) -> Option<&Conversation> {
        self.conversations.get(key)
    }

    pub fn summaries(&self) -> Vec<ConversationSummary> {
        self.conversations
            .iter()
            .map(|(key, conversation)| ConversationSummary {
                key: key.clone(),
                label: conversation.label(),
                message_count: conversation.messages.len(),
            })
            .collect()
    }

    /// Whether the local user wrote `message`.
    pub fn is_own(&self, message: &Message) -> bool {
        message.sender_id.same_as(&self.user_id)
    }

    fn direct_peer(&self, message: &Message) -> EntityId {
        match &message.recipient_id {
            Some(recipient) if self.is_own(message) => recipient.clone(),
            _ => message.sender_id.clone(),
        }
    }

    fn append(&mut self, destination: Destination, message: Message) -> ConversationKey {
        let key = destination.key();
        self.conversations
            .entry(key.clone())
            .or_insert_with(|| Conversation::new(destination.kind(), destination.id().clone()))
            .messages
            .push(message);
        key
    }

    fn persist(&self) {
        self.snapshots.save(&self.conversations);
    }

    fn render_list(&self) {
        self.surface.render_conversation_list(&self.summaries());
    }

    fn render_thread(&self, key: &ConversationKey) {
        if let Some(conversation) = self.conversations.get(key) {
            self.surface.render_thread(key, &conversation.messages);
        }
    }
}

fn local_message(request: SendRequest) -> Message {
    Message {
        sender_id: request.sender_id,
        recipient_id: request.recipient_id,
        group_id: request.group_id,
        content: request.content,
        timestamp: Some(chrono::Utc::now().to_rfc3339()),
        extra: Map::new(),
    }
}
