// realtime_ws_utils/src/message.rs

//! 定义 WebSocket 通信中使用的核心消息信封结构。
//!
//! 本模块主要包含 `WsMessage` 结构体的定义及其相关实现。
//! `WsMessage` 作为客户端与服务端之间所有 WebSocket 消息交换的标准格式：
//! 每个传输层文本帧承载一条逻辑消息，帧的业务标签放在 `message_type` 字段，
//! 标签对应的字段则序列化为 JSON 字符串放在 `payload` 字段中。

use crate::error::WsError;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `WsMessage` 代表在客户端与 WebSocket 服务器之间进行交换的标准消息结构。
///
/// 此结构体封装了消息的基本元数据以及实际的业务数据负载。
///
/// # 字段
/// - `message_id`: 通过 UUID v4 生成的唯一字符串标识符，用于追踪和区分每一条消息。
/// - `message_type`: 业务帧标签字符串（例如 `"channel:subscribe"`、`"message:new"`），
///   接收方根据此标签决定如何解释和处理 `payload` 字段。
/// - `payload`: 消息的实际数据负载，表示为一个 JSON 格式的字符串，
///   其内部结构由 `message_type` 决定。
/// - `timestamp`: 消息创建时的 UTC 时间戳（自 Unix 纪元以来的毫秒数）。
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct WsMessage {
    /// 为此消息实例生成的唯一标识符（UUID v4 格式的字符串）。
    pub message_id: String,

    /// 描述消息业务类型的帧标签字符串。
    /// 此字段是路由和处理消息的关键。
    pub message_type: String,

    /// 消息的实际数据负载，以 JSON 字符串的形式存储。
    pub payload: String,

    /// 消息创建时的时间戳，自 Unix 纪元以来的毫秒数（UTC 时间）。
    pub timestamp: i64,
}

impl WsMessage {
    /// 创建一个新的 `WsMessage` 实例。
    ///
    /// 此构造函数会自动生成唯一的 `message_id`（UUID v4）和当前的 UTC 时间戳。
    /// 提供的 `payload_data` 会被序列化为 JSON 字符串并存储在 `payload` 字段中。
    ///
    /// # Arguments
    /// * `message_type` - 此消息的业务帧标签。
    /// * `payload_data` - 实现了 `serde::Serialize` 的负载数据结构引用。
    ///
    /// # Returns
    /// * `Result<WsMessage, WsError>` - 序列化成功时返回新的 `WsMessage`，
    ///   失败时返回 `WsError::SerializationError`。
    pub fn new<T: Serialize>(message_type: String, payload_data: &T) -> Result<WsMessage, WsError> {
        let payload_str = serde_json::to_string(payload_data)
            .map_err(|e| WsError::SerializationError(format!("创建 WsMessage 时序列化载荷失败: {}", e)))?;
        Ok(WsMessage {
            message_id: Uuid::new_v4().to_string(),
            message_type,
            payload: payload_str,
            timestamp: Utc::now().timestamp_millis(),
        })
    }

    /// 将内部存储的 JSON 字符串载荷反序列化为指定的目标类型 `T`。
    ///
    /// # Returns
    /// * `Result<T, WsError>` - 成功时返回目标类型的实例，
    ///   失败时返回 `WsError::DeserializationError`（例如 JSON 结构与 `T` 不匹配）。
    pub fn deserialize_payload<T: for<'de> Deserialize<'de>>(&self) -> Result<T, WsError> {
        serde_json::from_str(&self.payload).map_err(|e| {
            WsError::DeserializationError(format!(
                "WsMessage 载荷反序列化为目标类型失败: {}, 原始载荷: '{}'",
                e, self.payload
            ))
        })
    }
}
