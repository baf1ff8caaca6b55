// realtime_ws_utils/src/client/transport.rs

//! 客户端 WebSocket 传输层核心逻辑。
//!
//! 本模块提供了 `realtime_ws_utils` 库中用于客户端 WebSocket 通信的主要功能：
//! 建立与服务器的连接、发送和接收结构化的 `WsMessage`，以及对底层连接事件的抽象。
//! 一个 `ClientConnection` 对应一个物理套接字；上层的连接状态机负责决定
//! 何时创建、何时放弃它。

use crate::error::WsError;
use crate::message::WsMessage;
use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use log::{debug, error, info};
use tokio_tungstenite::{
    connect_async,
    tungstenite::protocol::Message,
    tungstenite::Error as TungsteniteError,
    WebSocketStream,
};
use url::Url;

/// `ClientWsStream` 类型别名，代表一个可能经过 TLS 加密的 TCP WebSocket 流。
/// 这是 `tokio-tungstenite` 库在客户端连接成功后返回的典型流类型。
pub type ClientWsStream = WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// `ClientConnection` 结构体代表一个活动的客户端 WebSocket 连接。
///
/// 它封装了与服务器进行通信所需的发送端 (`SplitSink`) 和接收端 (`SplitStream`)。
/// 实例在成功连接到服务器后创建。
pub struct ClientConnection {
    /// 用于向 WebSocket 服务器异步发送消息的发送端。
    /// 消息类型为 `tungstenite::protocol::Message`，通常是 `Message::Text`。
    pub ws_sender: SplitSink<ClientWsStream, Message>,
    /// 用于从 WebSocket 服务器异步接收消息的接收端。
    pub ws_receiver: SplitStream<ClientWsStream>,
}

impl ClientConnection {
    /// 异步向 WebSocket 服务器发送一个 `WsMessage`。
    ///
    /// 该方法首先将 `WsMessage` 序列化为 JSON 字符串，然后作为文本帧发送出去。
    ///
    /// # Arguments
    /// * `message` - 对要发送的 `WsMessage` 实例的引用。
    ///
    /// # Returns
    /// * `Result<(), WsError>` - 序列化并发送成功时返回 `Ok(())`，
    ///   序列化失败或发送过程中发生网络错误时返回相应的 `WsError`。
    pub async fn send_message(&mut self, message: &WsMessage) -> Result<(), WsError> {
        let msg_json = serde_json::to_string(message)
            .map_err(|e| WsError::SerializationError(format!("消息序列化为JSON失败: {}", e)))?;
        debug!("客户端：准备发送消息: {}", msg_json);
        self.ws_sender.send(Message::Text(msg_json)).await?;
        debug!("客户端：消息已成功发送 (类型: {}, ID: {})", message.message_type, message.message_id);
        Ok(())
    }
}

/// 异步连接到指定的 WebSocket 服务器。
///
/// 此函数尝试解析给定的 URL 字符串，然后使用 `tokio-tungstenite` 的 `connect_async`
/// 建立与服务器的 WebSocket 连接。如果连接和握手成功，它会将返回的流分割成
/// 发送端和接收端，并封装在 `ClientConnection` 中返回。
///
/// # Arguments
/// * `url_str` - WebSocket 服务器的完整 URL 字符串
///   (例如 "ws://127.0.0.1:8080/realtime" 或 "wss://example.com/realtime?token=...")。
///
/// # Returns
/// * `Result<ClientConnection, WsError>` - 连接成功时返回 `ClientConnection` 实例；
///   URL 解析失败、连接失败或握手出错时返回相应的 `WsError`。
pub async fn connect_client(url_str: String) -> Result<ClientConnection, WsError> {
    info!("客户端：开始尝试连接到 WebSocket 服务器，URL: {}", url_str);
    let parsed_url = Url::parse(&url_str)
        .map_err(|e| WsError::InvalidUrl(format!("无效的 WebSocket URL '{}': {}", url_str, e)))?;

    match connect_async(parsed_url.as_str()).await {
        Ok((ws_stream, response)) => {
            info!("客户端：已成功连接到 {} (HTTP 状态码: {})", url_str, response.status());
            let (ws_sender, ws_receiver) = ws_stream.split();
            Ok(ClientConnection { ws_sender, ws_receiver })
        }
        Err(e) => {
            error!("客户端：连接到 {} 失败，错误: {}", url_str, e);
            Err(WsError::WebSocketProtocolError(e))
        }
    }
}

/// 从给定的 WebSocket 接收流中异步接收并尝试解析一个 `WsMessage`。
///
/// 此函数处理单个传入的 WebSocket 消息事件，会跳过非业务相关的控制帧
/// (Ping/Pong 由底层库自动处理)。收到文本消息时尝试反序列化为 `WsMessage`；
/// 收到二进制消息视为错误；连接关闭时返回 `None`。
///
/// 在一个持续的客户端会话中，调用方需要在循环中重复调用此函数来处理所有传入消息。
///
/// # Arguments
/// * `ws_receiver` - 对 WebSocket 连接接收端的可变引用。
///
/// # Returns
/// * `Option<Result<WsMessage, WsError>>`:
///     - `Some(Ok(ws_message))`：成功接收并解析了一个 `WsMessage`。
///     - `Some(Err(ws_error))`：接收或解析过程中发生错误。
///     - `None`：WebSocket 连接已关闭（收到 Close 帧或流已结束）。
pub async fn receive_message(
    ws_receiver: &mut SplitStream<ClientWsStream>,
) -> Option<Result<WsMessage, WsError>> {
    // 内部循环用于跳过那些不映射到应用层 WsMessage 的底层控制帧。
    loop {
        match ws_receiver.next().await {
            Some(msg_result) => match msg_result {
                Ok(msg) => match msg {
                    Message::Text(text) => {
                        debug!("客户端：收到原始文本消息，内容: '{}'", text);
                        break Some(serde_json::from_str::<WsMessage>(&text).map_err(|e| {
                            WsError::DeserializationError(format!(
                                "收到的文本消息反序列化为 WsMessage 失败: {}, 原始文本: '{}'",
                                e, text
                            ))
                        }));
                    }
                    Message::Binary(bin) => {
                        debug!("客户端：收到原始二进制消息，长度: {} 字节", bin.len());
                        // 协议约定只使用文本帧，二进制消息视为错误
                        break Some(Err(WsError::Message(
                            "客户端收到了非预期的 WebSocket 二进制消息".to_string(),
                        )));
                    }
                    Message::Ping(ping_data) => {
                        // Ping 帧由 tokio-tungstenite 自动响应 Pong，应用层无需处理
                        debug!("客户端：收到 Ping 控制帧，数据: {:?}", ping_data);
                    }
                    Message::Pong(pong_data) => {
                        debug!("客户端：收到 Pong 控制帧，数据: {:?}", pong_data);
                    }
                    Message::Close(close_frame) => {
                        debug!("客户端：收到 Close 控制帧，详细信息: {:?}", close_frame);
                        break None;
                    }
                    Message::Frame(_) => {
                        debug!("客户端：收到一个非预期的底层原始 Frame 类型消息，正在跳过。");
                    }
                },
                Err(e) => match e {
                    TungsteniteError::ConnectionClosed | TungsteniteError::AlreadyClosed => {
                        debug!("客户端：连接已关闭 (在 ws_receiver.next() 期间检测到)。");
                        break None;
                    }
                    _ => {
                        error!("客户端：从 WebSocket 流接收消息时发生底层错误: {}", e);
                        break Some(Err(WsError::WebSocketProtocolError(e)));
                    }
                },
            },
            None => {
                debug!("客户端：WebSocket 接收流已结束 (ws_receiver.next() 返回 None)。");
                break None;
            }
        }
    }
}
