//! Plain-text rendering to stdout.

use std::collections::HashMap;

use chat_reconciler::{
    ConversationKey, ConversationStore, ConversationSummary, Message, Notification,
    NotificationCenter, RenderSurface,
};
use parking_lot::Mutex;

/// Prints what changed since the previous render.
#[derive(Default)]
pub struct TerminalSurface {
    counts: Mutex<HashMap<ConversationKey, usize>>,
    unread: Mutex<Option<usize>>,
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderSurface for TerminalSurface {
    fn render_conversation_list(&self, conversations: &[ConversationSummary]) {
        let mut counts = self.counts.lock();
        for row in conversations {
            let seen = counts.insert(row.key.clone(), row.message_count);
            if seen != Some(row.message_count) {
                println!("{} ({} messages)", row.label, row.message_count);
            }
        }
    }

    fn render_thread(&self, key: &ConversationKey, messages: &[Message]) {
        if let Some(last) = messages.last() {
            println!("[{key}] {}", format_message(last, None));
        }
    }

    fn render_notifications(&self, _notifications: &[Notification], unread: usize) {
        let mut previous = self.unread.lock();
        if *previous != Some(unread) {
            println!("Unread notifications: {unread}");
            *previous = Some(unread);
        }
    }

    fn show_notification(&self, title: &str) {
        println!("* {title}");
    }
}

pub fn print_conversations(store: &ConversationStore) {
    if store.conversations().is_empty() {
        println!("No conversations");
        return;
    }

    for (key, conversation) in store.conversations() {
        println!("== {} [{key}]", conversation.label());
        for message in &conversation.messages {
            let own = store.is_own(message);
            println!("  {}", format_message(message, Some(own)));
        }
    }
}

pub fn print_notifications(center: &NotificationCenter) {
    println!("Unread: {}", center.unread());
    for notification in center.notifications() {
        let marker = if notification.is_unread() { "*" } else { " " };
        match &notification.message {
            Some(body) => println!("{marker} {} {}: {body}", notification.id, notification.title),
            None => println!("{marker} {} {}", notification.id, notification.title),
        }
    }
}

fn format_message(message: &Message, own: Option<bool>) -> String {
    let who = match own {
        Some(true) => "you".to_string(),
        _ => message.sender_id.to_string(),
    };
    match &message.timestamp {
        Some(at) => format!("{at} {who}: {}", message.content),
        None => format!("{who}: {}", message.content),
    }
}
