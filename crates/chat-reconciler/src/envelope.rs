//! Live payload decoding.
//!
//! Socket frames and poll bodies arrive either wrapped (`{type, data}`) or as
//! a bare record. The shape is resolved once here so nothing downstream
//! re-checks it.

use crate::{Message, Notification, ReconcileResult};
use realtime_transport::Inbound;
use serde_json::Value;
use tracing::{debug, warn};

const NOTIFICATION_TYPE: &str = "notification";

/// Outer payload shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// `{type, data}` with a non-empty `data`.
    Wrapped { kind: Option<String>, data: Value },
    /// Anything else, taken as the record itself.
    Bare(Value),
}

impl Envelope {
    pub fn from_inbound(inbound: &Inbound) -> ReconcileResult<Self> {
        let value = match inbound {
            Inbound::Text(text) => serde_json::from_str(text)?,
            Inbound::Json(value) => value.clone(),
        };
        Ok(Self::from_value(value))
    }

    pub fn from_value(value: Value) -> Self {
        if let Value::Object(map) = &value {
            if let Some(data) = map.get("data").filter(|data| is_truthy(data)) {
                return Envelope::Wrapped {
                    kind: map.get("type").and_then(Value::as_str).map(str::to_string),
                    data: data.clone(),
                };
            }
        }
        Envelope::Bare(value)
    }

    /// Declared type: the envelope's, else the bare record's `type` field.
    pub fn kind(&self) -> Option<&str> {
        match self {
            Envelope::Wrapped { kind, .. } => kind.as_deref(),
            Envelope::Bare(value) => value.get("type").and_then(Value::as_str),
        }
    }

    pub fn record(&self) -> &Value {
        match self {
            Envelope::Wrapped { data, .. } => data,
            Envelope::Bare(value) => value,
        }
    }
}

/// A decoded live update.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent {
    Chat(Message),
    Notification(Notification),
    /// Recognised as JSON but neither a chat message nor a notification.
    Ignored(Option<String>),
}

/// Decode one inbound payload into zero or more live events.
///
/// Arrays are decoded element by element; an element that fails to decode
/// is logged and dropped without losing its siblings. A notification feed body
/// (`{notifications: [...]}`, as returned by the poll endpoint) yields one
/// event per item, oldest first, so that prepending them in order keeps the
/// feed's newest-first order.
pub fn decode_payload(inbound: &Inbound) -> ReconcileResult<Vec<LiveEvent>> {
    let envelope = Envelope::from_inbound(inbound)?;

    if let Envelope::Bare(Value::Array(items)) = &envelope {
        return Ok(items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                keep_decoded(index, decode_envelope(&Envelope::from_value(item.clone())))
            })
            .collect());
    }

    if let Some(Value::Array(items)) = envelope.record().get("notifications") {
        return Ok(items
            .iter()
            .enumerate()
            .rev()
            .filter_map(|(index, item)| {
                let decoded = serde_json::from_value(item.clone())
                    .map(LiveEvent::Notification)
                    .map_err(Into::into);
                keep_decoded(index, decoded)
            })
            .collect());
    }

    Ok(vec![decode_envelope(&envelope)?])
}

fn decode_envelope(envelope: &Envelope) -> ReconcileResult<LiveEvent> {
    let kind = envelope.kind();
    let record = envelope.record();

    if kind == Some(NOTIFICATION_TYPE) {
        return Ok(LiveEvent::Notification(serde_json::from_value(record.clone())?));
    }

    if record.get("sender_id").is_some() || record.get("group_id").is_some() {
        return Ok(LiveEvent::Chat(serde_json::from_value(record.clone())?));
    }

    debug!(kind = ?kind, "Ignoring live payload with no chat or notification shape");
    Ok(LiveEvent::Ignored(kind.map(str::to_string)))
}

fn keep_decoded(index: usize, decoded: ReconcileResult<LiveEvent>) -> Option<LiveEvent> {
    match decoded {
        Ok(event) => Some(event),
        Err(e) => {
            warn!(index = index, error = %e, "Dropping undecodable item from live batch");
            None
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EntityId;
    use serde_json::json;

    fn text(value: Value) -> Inbound {
        Inbound::Text(value.to_string())
    }

    #[test]
    fn wrapped_and_bare_chat_decode_the_same() {
        let record = json!({ "sender_id": 3, "content": "hey" });
        let wrapped = decode_payload(&text(json!({ "type": "chat", "data": record }))).unwrap();
        let bare = decode_payload(&Inbound::Json(record)).unwrap();

        assert_eq!(wrapped, bare);
        match &bare[0] {
            LiveEvent::Chat(msg) => {
                assert_eq!(msg.sender_id, EntityId::Int(3));
                assert_eq!(msg.content, "hey");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn empty_data_falls_back_to_bare() {
        let envelope = Envelope::from_value(json!({ "type": "chat", "data": null, "sender_id": 1 }));
        assert!(matches!(envelope, Envelope::Bare(_)));
        assert_eq!(envelope.kind(), Some("chat"));

        let envelope = Envelope::from_value(json!({ "data": "" }));
        assert!(matches!(envelope, Envelope::Bare(_)));
    }

    #[test]
    fn bare_notification_record() {
        let events =
            decode_payload(&text(json!({ "type": "notification", "id": 5, "title": "Level up" })))
                .unwrap();
        match &events[..] {
            [LiveEvent::Notification(n)] => {
                assert_eq!(n.id, EntityId::Int(5));
                assert_eq!(n.title, "Level up");
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[test]
    fn wrapped_notification_record() {
        let events = decode_payload(&text(json!({
            "type": "notification",
            "data": { "id": 8, "title": "Tour booked" }
        })))
        .unwrap();
        assert!(matches!(&events[..], [LiveEvent::Notification(n)] if n.title == "Tour booked"));
    }

    #[test]
    fn notification_feed_yields_oldest_first() {
        let events = decode_payload(&Inbound::Json(json!({
            "notifications": [
                { "id": 3, "title": "newest" },
                { "id": 2, "title": "older" }
            ],
            "unread": 2
        })))
        .unwrap();

        let ids: Vec<_> = events
            .iter()
            .map(|e| match e {
                LiveEvent::Notification(n) => n.id.clone(),
                other => panic!("unexpected event: {other:?}"),
            })
            .collect();
        assert_eq!(ids, vec![EntityId::Int(2), EntityId::Int(3)]);
    }

    #[test]
    fn array_of_records() {
        let events = decode_payload(&Inbound::Json(json!([
            { "sender_id": 1, "content": "a" },
            { "type": "presence", "user": 1 }
        ])))
        .unwrap();
        assert!(matches!(events[0], LiveEvent::Chat(_)));
        assert_eq!(events[1], LiveEvent::Ignored(Some("presence".into())));
    }

    #[test]
    fn unrelated_payload_is_ignored() {
        let events = decode_payload(&text(json!({ "type": "leaderboard", "votes": {} }))).unwrap();
        assert_eq!(events, vec![LiveEvent::Ignored(Some("leaderboard".into()))]);
    }

    #[test]
    fn malformed_text_is_decode_error() {
        assert!(decode_payload(&Inbound::Text("{not json".into())).is_err());
    }

    #[test]
    fn chat_record_missing_sender_is_decode_error() {
        let result = decode_payload(&text(json!({ "group_id": 4, "content": "orphan" })));
        assert!(result.is_err());
    }

    #[test]
    fn feed_item_without_id_is_dropped() {
        let events = decode_payload(&Inbound::Json(json!([
            { "type": "notification", "id": 1, "title": "first" },
            { "type": "notification", "title": "no id" },
            { "type": "notification", "id": 3, "title": "third" }
        ])))
        .unwrap();
        assert_eq!(events.len(), 2);

        let events = decode_payload(&Inbound::Json(json!({
            "notifications": [{ "id": 1 }, { "title": "no id" }, { "id": 3 }]
        })))
        .unwrap();
        let ids: Vec<_> = events
            .iter()
            .map(|e| match e {
                LiveEvent::Notification(n) => n.id.clone(),
                other => panic!("unexpected event: {other:?}"),
            })
            .collect();
        assert_eq!(ids, vec![EntityId::Int(3), EntityId::Int(1)]);
    }

    #[test]
    fn array_keeps_chat_records_around_a_bad_one() {
        let events = decode_payload(&Inbound::Json(json!([
            { "sender_id": 1, "content": "kept" },
            { "group_id": 4, "content": "orphan" }
        ])))
        .unwrap();
        match &events[..] {
            [LiveEvent::Chat(msg)] => assert_eq!(msg.content, "kept"),
            other => panic!("unexpected events: {other:?}"),
        }
    }
}
