//! Front door: bulk loads, sends and live dispatch.

use crate::{
    decode_payload, ChatApi, ConversationKey, ConversationStore, ConversationSummary, Destination,
    EntityId, LiveEvent, NotificationCenter, RenderSurface, SnapshotStore,
};
use realtime_transport::{ChannelEvent, ChannelEvents, Inbound};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Single owner of client-side chat and notification state.
pub struct Reconciler {
    conversations: ConversationStore,
    notifications: NotificationCenter,
}

impl Reconciler {
    pub fn new(
        user_id: EntityId,
        api: Arc<dyn ChatApi>,
        snapshots: SnapshotStore,
        surface: Arc<dyn RenderSurface>,
    ) -> Self {
        Self {
            conversations: ConversationStore::new(user_id, api.clone(), snapshots, surface.clone()),
            notifications: NotificationCenter::new(api, surface),
        }
    }

    pub fn load_local(&mut self) -> usize {
        self.conversations.load_local()
    }

    pub async fn fetch_history(&mut self) -> usize {
        self.conversations.fetch_history().await
    }

    pub async fn fetch_notifications(&mut self) -> bool {
        self.notifications.fetch().await
    }

    pub async fn send_message(&mut self, destination: &Destination, text: &str) -> bool {
        self.conversations.send_message(destination, text).await
    }

    pub async fn send_to_current(&mut self, text: &str) -> bool {
        self.conversations.send_to_current(text).await
    }

    pub fn select_conversation(&mut self, key: &ConversationKey) -> bool {
        self.conversations.select_conversation(key)
    }

    pub async fn mark_notification_read(&mut self, id: &EntityId) -> bool {
        self.notifications.mark_read(id).await
    }

    /// Decode one live payload and route it.
    ///
    /// Returns how many records were applied. Undecodable payloads are
    /// logged and dropped.
    pub fn apply_live_payload(&mut self, inbound: &Inbound) -> usize {
        let events = match decode_payload(inbound) {
            Ok(events) => events,
            Err(e) => {
                warn!(error = %e, "Dropping malformed live payload");
                return 0;
            }
        };

        let mut applied = 0;
        for event in events {
            match event {
                LiveEvent::Chat(message) => {
                    self.conversations.apply_message(message);
                    applied += 1;
                }
                LiveEvent::Notification(notification) => {
                    if self.notifications.apply_live(notification) {
                        applied += 1;
                    }
                }
                LiveEvent::Ignored(_) => {}
            }
        }
        applied
    }

    /// React to one channel event.
    pub fn handle_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Opened(kind) => info!(transport = ?kind, "Realtime channel open"),
            ChannelEvent::Message(inbound) => {
                self.apply_live_payload(&inbound);
            }
            ChannelEvent::Error(e) => warn!(error = %e, "Realtime channel error"),
        }
    }

    /// Apply channel events until the channel ends.
    pub async fn run(&mut self, mut events: ChannelEvents) {
        while let Some(event) = events.recv().await {
            self.handle_event(event);
        }
        debug!("Realtime channel ended");
    }

    pub fn conversation_list(&self) -> Vec<ConversationSummary> {
        self.conversations.summaries()
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.unread()
    }

    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }
}
