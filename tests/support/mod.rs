// Shared primitives for one-time server bootstrapping and WebSocket clients across integration
// tests.
#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

// Host and port published once the server has bound its listener.
static SERVER_ADDR: OnceLock<String> = OnceLock::new();
// One-time guard that ensures the server bootstrap path runs only once.
static SERVER_READY: OnceLock<()> = OnceLock::new();

const RECV_TIMEOUT: Duration = Duration::from_secs(3);

// Ensure the test server is running and return its WebSocket endpoint.
pub fn ensure_server() -> String {
    SERVER_READY.get_or_init(|| {
        let published_addr = Arc::new(OnceLock::<String>::new());
        let published_addr_thread = Arc::clone(&published_addr);
        // Spawn an OS thread so the server outlives individual `#[tokio::test]` runtimes.
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                // Bind to an ephemeral port to avoid collisions with local services.
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral test port");
                let addr = listener.local_addr().expect("get local addr");
                let _ = published_addr_thread.set(addr.to_string());
                arena_server::run(listener).await.expect("server failed");
            });
        });
        wait_for_server_readiness(published_addr);
    });

    let addr = SERVER_ADDR.get().expect("server addr should be initialized");
    format!("ws://{addr}/ws")
}

fn wait_for_server_readiness(published_addr: Arc<OnceLock<String>>) {
    let addr = loop {
        if let Some(addr) = published_addr.get() {
            break addr.clone();
        }
        std::thread::sleep(Duration::from_millis(10));
    };

    let _ = SERVER_ADDR.set(addr.clone());

    for _ in 0..100 {
        if std::net::TcpStream::connect(&addr).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    panic!("server did not become ready in time");
}

/// A connected arena client that already consumed its identity and initial snapshot.
pub struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    pub id: String,
    pub initial_players: Value,
}

impl TestClient {
    pub async fn connect() -> Self {
        let url = ensure_server();
        let (ws, _response) = connect_async(url.as_str())
            .await
            .expect("websocket handshake should succeed");
        let mut client = Self {
            ws,
            id: String::new(),
            initial_players: Value::Null,
        };

        let identity = client.next_of("identity").await;
        client.id = identity["data"]["id"]
            .as_str()
            .expect("identity should carry an id")
            .to_string();
        client.initial_players = client.next_of("currentPlayers").await["data"].clone();
        client
    }

    pub async fn send(&mut self, msg: Value) {
        self.ws
            .send(Message::text(msg.to_string()))
            .await
            .expect("send should succeed");
    }

    pub async fn send_raw(&mut self, msg: Message) {
        self.ws.send(msg).await.expect("send should succeed");
    }

    /// Next frame of any kind, or None when the stream ended.
    pub async fn next_frame(&mut self) -> Option<Message> {
        tokio::time::timeout(RECV_TIMEOUT, self.ws.next())
            .await
            .expect("timed out waiting for a frame")
            .map(|frame| frame.expect("websocket error"))
    }

    /// Next message of type `ty`; other traffic from concurrently running tests is skipped.
    pub async fn next_of(&mut self, ty: &str) -> Value {
        self.next_matching(ty, |_| true).await
    }

    pub async fn next_matching(&mut self, ty: &str, pred: impl Fn(&Value) -> bool) -> Value {
        loop {
            let frame = self
                .next_frame()
                .await
                .unwrap_or_else(|| panic!("stream closed while waiting for {ty}"));
            let Message::Text(text) = frame else {
                continue;
            };
            let value: Value = serde_json::from_str(text.as_str()).expect("server sends json");
            if value["type"] == ty && pred(&value) {
                return value;
            }
        }
    }

    pub async fn close(mut self) {
        let _ = self.ws.close(None).await;
    }
}
