//! Flat notification list with a derived unread count.

use crate::{ChatApi, EntityId, Notification, NotificationFeed, RenderSurface};
use std::sync::Arc;
use tracing::{debug, warn};

/// Newest-first notification list.
///
/// The unread count is always recomputed from the list after a mutation, so
/// it cannot drift or go negative.
pub struct NotificationCenter {
    notifications: Vec<Notification>,
    unread: usize,
    api: Arc<dyn ChatApi>,
    surface: Arc<dyn RenderSurface>,
}

impl NotificationCenter {
    pub fn new(api: Arc<dyn ChatApi>, surface: Arc<dyn RenderSurface>) -> Self {
        Self {
            notifications: Vec::new(),
            unread: 0,
            api,
            surface,
        }
    }

    /// Bulk fetch. On failure the current list is kept. Returns whether the
    /// list was replaced.
    pub async fn fetch(&mut self) -> bool {
        match self.api.fetch_notifications().await {
            Ok(feed) => {
                self.seed(feed);
                true
            }
            Err(e) => {
                warn!(error = %e, "Notification fetch failed");
                false
            }
        }
    }

    /// Replace the list with a fetched feed.
    pub fn seed(&mut self, feed: NotificationFeed) {
        self.notifications = feed.notifications;
        self.recount();
        if feed.unread != self.unread as i64 {
            debug!(
                server = feed.unread,
                derived = self.unread,
                "Server unread count differs from list"
            );
        }
        self.render();
    }

    /// Prepend a pushed notification. A repeat of an id already held is
    /// dropped. Returns whether it was added.
    pub fn apply_live(&mut self, notification: Notification) -> bool {
        if self.contains(&notification.id) {
            debug!(id = %notification.id, "Ignoring duplicate notification");
            return false;
        }

        self.surface.show_notification(&notification.title);
        self.notifications.insert(0, notification);
        self.recount();
        self.render();
        true
    }

    /// Mark one notification read on the server, then locally.
    ///
    /// Local state changes only after the request succeeds.
    pub async fn mark_read(&mut self, id: &EntityId) -> bool {
        if let Err(e) = self.api.mark_notification_read(id).await {
            warn!(id = %id, error = %e, "Mark-read failed");
            return false;
        }

        let now = chrono::Utc::now().to_rfc3339();
        let mut found = false;
        for notification in self.notifications.iter_mut().filter(|n| n.id.same_as(id)) {
            notification.mark_read(&now);
            found = true;
        }
        self.recount();
        self.render();
        found
    }

    pub fn unread(&self) -> usize {
        self.unread
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    fn contains(&self, id: &EntityId) -> bool {
        self.notifications.iter().any(|n| n.id.same_as(id))
    }

    fn recount(&mut self) {
        self.unread = self.notifications.iter().filter(|n| n.is_unread()).count();
    }

    fn render(&self) {
        self.surface
            .render_notifications(&self.notifications, self.unread);
    }
}
