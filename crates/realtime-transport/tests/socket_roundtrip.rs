//! End-to-end channel tests against a local WebSocket server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use realtime_transport::{
    ChannelEvent, ChannelEvents, ChannelOptions, ChannelState, Inbound, PollSource, TransportKind,
    TransportManager, TransportResult, TungsteniteConnector,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use url::Url;

#[derive(Default)]
struct CountingPoll {
    calls: AtomicUsize,
}

#[async_trait]
impl PollSource for CountingPoll {
    async fn fetch(&self, _url: &Url) -> TransportResult<Option<Value>> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(json!({ "type": "notification", "id": n, "title": "polled" })))
    }
}

/// Serve one connection: greet, echo `n` frames back prefixed, then close.
async fn spawn_server(echoes: usize) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.send(Message::Text("welcome".into())).await.unwrap();

        let mut echoed = 0;
        while echoed < echoes {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    let reply = format!("echo:{}", text.as_str());
                    ws.send(Message::Text(reply.into())).await.unwrap();
                    echoed += 1;
                }
                Some(Ok(_)) => {}
                _ => return,
            }
        }
        let _ = ws.close(None).await;
    });

    Url::parse(&format!("http://{addr}")).unwrap()
}

async fn next(events: &mut ChannelEvents) -> ChannelEvent {
    tokio::time::timeout(Duration::from_secs(10), events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("channel ended")
}

fn expect_text(event: ChannelEvent) -> String {
    match event {
        ChannelEvent::Message(Inbound::Text(text)) => text,
        other => panic!("expected text frame, got {other:?}"),
    }
}

#[tokio::test]
async fn socket_delivers_frames_and_sends() {
    let origin = spawn_server(1).await;
    let manager = TransportManager::new(origin, Arc::new(CountingPoll::default()))
        .with_socket(Arc::new(TungsteniteConnector));

    let (channel, mut events) = manager.open("/realtime/ws", ChannelOptions::default()).unwrap();
    assert_eq!(channel.url().scheme(), "ws");

    assert!(matches!(next(&mut events).await, ChannelEvent::Opened(TransportKind::Socket)));
    assert_eq!(expect_text(next(&mut events).await), "welcome");

    assert!(channel.send("ping"));
    assert_eq!(expect_text(next(&mut events).await), "echo:ping");

    channel.close();
    channel.close();
    assert!(events.recv().await.is_none());
    assert_eq!(channel.state(), ChannelState::Closed);
}

#[tokio::test]
async fn server_close_falls_back_to_polling() {
    let origin = spawn_server(0).await;
    let poll = Arc::new(CountingPoll::default());
    let manager =
        TransportManager::new(origin.clone(), poll.clone()).with_socket(Arc::new(TungsteniteConnector));

    let options = ChannelOptions::default()
        .with_poll_url(origin.join("/notifications").unwrap())
        .with_poll_interval(Duration::from_millis(50));
    let (channel, mut events) = manager.open("/realtime/ws", options).unwrap();

    assert!(matches!(next(&mut events).await, ChannelEvent::Opened(TransportKind::Socket)));
    assert_eq!(expect_text(next(&mut events).await), "welcome");

    // Server closes right after greeting; any socket error precedes ws_closed.
    loop {
        match next(&mut events).await {
            ChannelEvent::Opened(TransportKind::Poll) => break,
            ChannelEvent::Error(_) => continue,
            other => panic!("unexpected event during fallback: {other:?}"),
        }
    }

    match next(&mut events).await {
        ChannelEvent::Message(Inbound::Json(body)) => assert_eq!(body["title"], "polled"),
        other => panic!("expected poll body, got {other:?}"),
    }
    assert_eq!(channel.kind(), TransportKind::Poll);
    assert!(!channel.send("not while polling"));

    channel.close();
    let calls = poll.calls.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(poll.calls.load(Ordering::SeqCst) <= calls + 1);
    assert!(events.recv().await.is_none());
}

#[tokio::test]
async fn unreachable_socket_without_fallback_ends_channel() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let origin = Url::parse(&format!("http://{}", listener.local_addr().unwrap())).unwrap();
    drop(listener);

    let manager = TransportManager::new(origin, Arc::new(CountingPoll::default()))
        .with_socket(Arc::new(TungsteniteConnector));
    let (channel, mut events) = manager.open("/realtime/ws", ChannelOptions::default()).unwrap();

    assert!(matches!(next(&mut events).await, ChannelEvent::Error(_)));
    assert!(matches!(next(&mut events).await, ChannelEvent::Error(_)));
    assert!(tokio::time::timeout(Duration::from_secs(10), events.recv())
        .await
        .unwrap()
        .is_none());
    assert_eq!(channel.state(), ChannelState::Closed);
}
