//! Presentation seam.
//!
//! The reconciler never draws anything itself; it tells a [`RenderSurface`]
//! what changed and the host decides how to show it.

use crate::{ConversationKey, ConversationSummary, Message, Notification};
use parking_lot::Mutex;

/// Receives re-render requests from the reconciler.
pub trait RenderSurface: Send + Sync {
    fn render_conversation_list(&self, conversations: &[ConversationSummary]);

    /// Only called for the currently selected conversation.
    fn render_thread(&self, key: &ConversationKey, messages: &[Message]);

    fn render_notifications(&self, notifications: &[Notification], unread: usize);

    /// Transient alert for a newly arrived notification.
    fn show_notification(&self, title: &str);
}

/// Surface that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSurface;

impl RenderSurface for NullSurface {
    fn render_conversation_list(&self, _conversations: &[ConversationSummary]) {}
    fn render_thread(&self, _key: &ConversationKey, _messages: &[Message]) {}
    fn render_notifications(&self, _notifications: &[Notification], _unread: usize) {}
    fn show_notification(&self, _title: &str) {}
}

/// A recorded render request.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    ConversationList(Vec<ConversationSummary>),
    Thread {
        key: ConversationKey,
        messages: Vec<Message>,
    },
    Notifications {
        notifications: Vec<Notification>,
        unread: usize,
    },
    Toast(String),
}

/// Surface that records every request, for tests.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    events: Mutex<Vec<SurfaceEvent>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Most recent thread render, if any.
    pub fn last_thread(&self) -> Option<(ConversationKey, Vec<Message>)> {
        self.events.lock().iter().rev().find_map(|event| match event {
            SurfaceEvent::Thread { key, messages } => Some((key.clone(), messages.clone())),
            _ => None,
        })
    }

    pub fn toasts(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                SurfaceEvent::Toast(title) => Some(title.clone()),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: SurfaceEvent) {
        self.events.lock().push(event);
    }
}

impl RenderSurface for RecordingSurface {
    fn render_conversation_list(&self, conversations: &[ConversationSummary]) {
        self.push(SurfaceEvent::ConversationList(conversations.to_vec()));
    }

    fn render_thread(&self, key: &ConversationKey, messages: &[Message]) {
        self.push(SurfaceEvent::Thread {
            key: key.clone(),
            messages: messages.to_vec(),
        });
    }

    fn render_notifications(&self, notifications: &[Notification], unread: usize) {
        self.push(SurfaceEvent::Notifications {
            notifications: notifications.to_vec(),
            unread,
        });
    }

    fn show_notification(&self, title: &str) {
        self.push(SurfaceEvent::Toast(title.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EntityId;

    #[test]
    fn recording_surface_records_in_order() {
        let surface = RecordingSurface::new();
        assert!(surface.is_empty());

        let key = ConversationKey::group(&EntityId::Int(7));
        surface.render_conversation_list(&[]);
        surface.render_thread(&key, &[]);
        surface.show_notification("Level up");

        assert_eq!(surface.len(), 3);
        assert_eq!(surface.events()[0], SurfaceEvent::ConversationList(vec![]));
        assert_eq!(surface.last_thread(), Some((key, vec![])));
        assert_eq!(surface.toasts(), vec!["Level up".to_string()]);

        surface.clear();
        assert!(surface.is_empty());
    }
}
