// realtime_ws_utils/src/server/transport.rs

//! 包含服务端 WebSocket 监听、接受连接和通信逻辑。
//!
//! `start_server` 负责 TCP 监听与 WebSocket 握手；每个成功建立的连接都会在
//! 独立的 Tokio 任务中调用调用方提供的 `on_connect` 回调，并把发送端封装为
//! `ConnectionHandler`、接收端作为 `SplitStream` 一并交给回调处理。

use crate::error::WsError;
use crate::message::WsMessage;
use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use log::{debug, error, info};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{
    accept_async,
    tungstenite::protocol::Message,
    tungstenite::Error as TungsteniteError,
    WebSocketStream,
};

/// `ServerWsStream` 是一个类型别名，代表经过 WebSocket 握手后的服务端 TCP 流。
pub type ServerWsStream = WebSocketStream<TcpStream>;

/// `ConnectionHandler` 封装了单个客户端连接的发送端。
///
/// 它在 `on_connect` 回调中交给上层逻辑，用于向该客户端异步发送 `WsMessage`。
pub struct ConnectionHandler {
    /// 连接方的套接字地址。
    pub peer_addr: SocketAddr,
    /// 用于向该客户端发送消息的 `Sink`（发送端）。
    pub ws_sender: SplitSink<ServerWsStream, Message>,
}

impl ConnectionHandler {
    /// 异步向该客户端发送一个 `WsMessage`。
    ///
    /// # Arguments
    /// * `message` - 对要发送的 `WsMessage` 实例的引用。
    ///
    /// # Returns
    /// * `Result<(), WsError>` - 序列化并发送成功时返回 `Ok(())`，否则返回相应的 `WsError`。
    pub async fn send_message(&mut self, message: &WsMessage) -> Result<(), WsError> {
        let msg_json = serde_json::to_string(message)
            .map_err(|e| WsError::SerializationError(format!("消息序列化为JSON失败: {}", e)))?;
        debug!("服务端：准备向 {} 发送消息: {}", self.peer_addr, msg_json);
        self.ws_sender.send(Message::Text(msg_json)).await?;
        Ok(())
    }
}

/// 启动 WebSocket 服务器并开始监听指定的地址。
///
/// 对于每一个成功建立的 WebSocket 连接，都会在新的 Tokio 任务中调用 `on_connect`
/// 回调进行处理。这个服务器会持续运行，直到发生不可恢复的错误（例如 TCP 监听器
/// 绑定失败）或其所在任务被中止。
///
/// # Arguments
/// * `addr`: 服务器监听的地址字符串（例如 "127.0.0.1:8080"）。
/// * `on_connect`: 新连接建立时被调用的回调函数，接收该连接的
///   `ConnectionHandler`（发送端）和 `SplitStream`（接收端）。
///   回调必须是 `async` 的，并且 `Send + Sync + Clone + 'static`，
///   因为它会在新的 Tokio 任务中为每个连接执行。
///
/// # Returns
/// * `Result<(), WsError>`: 监听器启动失败时返回错误；否则此函数将无限期运行。
pub async fn start_server<F, Fut>(addr: String, on_connect: F) -> Result<(), WsError>
where
    F: Fn(ConnectionHandler, SplitStream<ServerWsStream>) -> Fut + Send + Sync + Clone + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(&addr).await?;
    info!("WebSocket 服务器正在监听地址: {}", addr);

    loop {
        match listener.accept().await {
            Ok((tcp_stream, peer_addr)) => {
                info!("从 {} 接受了新的 TCP 连接", peer_addr);

                let on_connect_callback = on_connect.clone();

                // 为每个连接创建一个新的 Tokio 任务来处理握手和后续逻辑
                tokio::spawn(async move {
                    match accept_async(tcp_stream).await {
                        Ok(ws_stream) => {
                            info!("与 {} 的 WebSocket 握手成功", peer_addr);
                            let (ws_sender, ws_receiver) = ws_stream.split();
                            let handler = ConnectionHandler { peer_addr, ws_sender };
                            on_connect_callback(handler, ws_receiver).await;
                        }
                        Err(e) => {
                            // 握手失败只影响此特定连接，记录并终止该任务
                            error!("与 {} 的 WebSocket 握手失败: {}", peer_addr, e);
                        }
                    }
                });
            }
            Err(e) => {
                error!("接受 TCP 连接失败: {}。服务器将继续运行。", e);
            }
        }
    }
}

/// 从给定的服务端 WebSocket 接收流中异步接收并尝试解析一个 `WsMessage`。
///
/// 与客户端的同名函数对称：跳过控制帧，文本帧反序列化为 `WsMessage`，
/// 连接关闭时返回 `None`。
///
/// # Arguments
/// * `ws_receiver` - 对该连接接收端的可变引用。
///
/// # Returns
/// * `Option<Result<WsMessage, WsError>>` - 含义与
///   [`crate::client::transport::receive_message`] 相同。
pub async fn receive_message(
    ws_receiver: &mut SplitStream<ServerWsStream>,
) -> Option<Result<WsMessage, WsError>> {
    loop {
        match ws_receiver.next().await {
            Some(msg_result) => match msg_result {
                Ok(msg) => match msg {
                    Message::Text(text) => {
                        debug!("服务端：收到原始文本消息，内容: '{}'", text);
                        break Some(serde_json::from_str::<WsMessage>(&text).map_err(|e| {
                            WsError::DeserializationError(format!(
                                "收到的文本消息反序列化为 WsMessage 失败: {}, 原始文本: '{}'",
                                e, text
                            ))
                        }));
                    }
                    Message::Binary(bin) => {
                        debug!("服务端：收到原始二进制消息，长度: {} 字节", bin.len());
                        break Some(Err(WsError::Message(
                            "服务端收到了非预期的 WebSocket 二进制消息".to_string(),
                        )));
                    }
                    Message::Ping(ping_data) => {
                        debug!("服务端：收到 Ping 控制帧，数据: {:?}", ping_data);
                    }
                    Message::Pong(pong_data) => {
                        debug!("服务端：收到 Pong 控制帧，数据: {:?}", pong_data);
                    }
                    Message::Close(close_frame) => {
                        debug!("服务端：收到 Close 控制帧，详细信息: {:?}", close_frame);
                        break None;
                    }
                    Message::Frame(_) => {
                        debug!("服务端：收到一个非预期的底层原始 Frame 类型消息，正在跳过。");
                    }
                },
                Err(e) => match e {
                    TungsteniteError::ConnectionClosed | TungsteniteError::AlreadyClosed => {
                        debug!("服务端：连接已关闭 (在 ws_receiver.next() 期间检测到)。");
                        break None;
                    }
                    _ => {
                        error!("服务端：从 WebSocket 流接收消息时发生底层错误: {}", e);
                        break Some(Err(WsError::WebSocketProtocolError(e)));
                    }
                },
            },
            None => {
                debug!("服务端：WebSocket 接收流已结束 (ws_receiver.next() 返回 None)。");
                break None;
            }
        }
    }
}
