use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use ogre_abilities::config::AbilityConfig;
use ogre_core::net::messages::{ClientMessage, JoinAcceptedMsg, JoinMsg, ServerMessage};
use ogre_core::net::protocol::{PROTOCOL_VERSION, decode_server_message, encode_client_message};

use ogre_server::build_app;
use ogre_server::config::ServerConfig;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct TestServer {
    pub addr: SocketAddr,
    _shutdown: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn new() -> Self {
        Self::from_config(ServerConfig::default()).await
    }

    pub async fn from_config(config: ServerConfig) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (app, _state) = build_app(config, AbilityConfig::default());

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the server a moment to start accepting
        tokio::time::sleep(Duration::from_millis(20)).await;

        Self {
            addr,
            _shutdown: handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

/// Connect a WebSocket client to the given URL.
pub async fn ws_connect(url: &str) -> WsStream {
    let (stream, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    stream
}

pub async fn ws_send_client_msg(stream: &mut WsStream, msg: &ClientMessage) {
    let encoded = encode_client_message(msg).unwrap();
    stream.send(Message::Binary(encoded.into())).await.unwrap();
}

/// Send a Join and return the server's first reply.
pub async fn ws_send_join(
    stream: &mut WsStream,
    name: &str,
    protocol_version: u8,
) -> ServerMessage {
    ws_send_client_msg(
        stream,
        &ClientMessage::Join(JoinMsg {
            player_name: name.to_string(),
            protocol_version,
        }),
    )
    .await;
    ws_read_server_msg(stream).await
}

/// Connect and join, asserting success.
pub async fn ws_join(server: &TestServer, name: &str) -> (WsStream, JoinAcceptedMsg) {
    let mut stream = ws_connect(&server.ws_url()).await;
    match ws_send_join(&mut stream, name, PROTOCOL_VERSION).await {
        ServerMessage::JoinAccepted(accepted) => (stream, accepted),
        other => panic!("Expected JoinAccepted, got: {other:?}"),
    }
}

/// Read raw binary data from a WebSocket stream (5s timeout).
pub async fn ws_read_raw(stream: &mut WsStream) -> Vec<u8> {
    let deadline = Duration::from_secs(5);
    tokio::time::timeout(deadline, async {
        loop {
            match stream.next().await {
                Some(Ok(Message::Binary(data))) => return data.to_vec(),
                Some(Ok(Message::Close(_))) => panic!("WebSocket closed unexpectedly"),
                Some(Err(e)) => panic!("WebSocket error: {e}"),
                None => panic!("WebSocket stream ended"),
                _ => continue,
            }
        }
    })
    .await
    .expect("Timed out waiting for WebSocket message")
}

pub async fn ws_read_server_msg(stream: &mut WsStream) -> ServerMessage {
    let data = ws_read_raw(stream).await;
    decode_server_message(&data).unwrap()
}

/// Read messages until one matches `pred`, discarding the rest.
pub async fn ws_read_until(
    stream: &mut WsStream,
    pred: impl Fn(&ServerMessage) -> bool,
) -> ServerMessage {
    loop {
        let msg = ws_read_server_msg(stream).await;
        if pred(&msg) {
            return msg;
        }
    }
}

/// Collect every message that arrives within `timeout_ms`.
pub async fn ws_drain(stream: &mut WsStream, timeout_ms: u64) -> Vec<ServerMessage> {
    let mut out = Vec::new();
    let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
    while let Ok(Some(Ok(msg))) = tokio::time::timeout_at(deadline, stream.next()).await {
        if let Message::Binary(data) = msg
            && let Ok(decoded) = decode_server_message(&data)
        {
            out.push(decoded);
        }
    }
    out
}

/// Wait for the server to close the socket (5s timeout). Returns true if it did.
pub async fn ws_expect_close(stream: &mut WsStream) -> bool {
    let deadline = Duration::from_secs(5);
    tokio::time::timeout(deadline, async {
        loop {
            match stream.next().await {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return true,
                _ => continue,
            }
        }
    })
    .await
    .unwrap_or(false)
}
