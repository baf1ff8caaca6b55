// realtime_models/src/ws_payloads.rs

//! 包含实时通道 WebSocket 通信中使用的各种 Payload 结构体定义。
//!
//! 每一种线帧标签 (wire frame tag) 对应一个消息类型常量和一个 Payload 结构体。
//! 消息类型常量作为 `WsMessage.message_type` 字段的取值；Payload 结构体序列化为
//! JSON 字符串后作为 `WsMessage.payload` 字段的内容。
//!
//! 标签一览：
//! - 出站（客户端 → 服务端）: `channel:subscribe`、`channel:unsubscribe`、
//!   `typing:start`、`typing:stop`、`read:mark`、`system:ping`。
//! - 入站（服务端 → 客户端）: `message:new`、`message:update`、`message:delete`、
//!   `typing:update`、`read:update`、`pong` / `system:pong`、
//!   `channel:subscribed`、`channel:unsubscribed`、`error`。
//!
//! 所有共享模型都派生 `Serialize`, `Deserialize`, `Debug`, `Clone`，
//! 并在测试需要比较时额外派生 `PartialEq`。

use serde::{Deserialize, Serialize};
use serde_json::Value;

// --- 出站消息类型常量（客户端 → 服务端） ---

/// 消息类型：订阅一组频道。
pub const SUBSCRIBE_MESSAGE_TYPE: &str = "channel:subscribe";
/// 消息类型：退订一组频道。
pub const UNSUBSCRIBE_MESSAGE_TYPE: &str = "channel:unsubscribe";
/// 消息类型：开始输入信号。
pub const TYPING_START_MESSAGE_TYPE: &str = "typing:start";
/// 消息类型：停止输入信号。
pub const TYPING_STOP_MESSAGE_TYPE: &str = "typing:stop";
/// 消息类型：标记某条消息已读。
pub const READ_MARK_MESSAGE_TYPE: &str = "read:mark";
/// 消息类型：心跳 Ping。
pub const PING_MESSAGE_TYPE: &str = "system:ping";

// --- 入站消息类型常量（服务端 → 客户端） ---

/// 消息类型：频道内有新消息。
pub const MESSAGE_NEW_MESSAGE_TYPE: &str = "message:new";
/// 消息类型：频道内某条消息被更新。
pub const MESSAGE_UPDATE_MESSAGE_TYPE: &str = "message:update";
/// 消息类型：频道内某条消息被删除。
pub const MESSAGE_DELETE_MESSAGE_TYPE: &str = "message:delete";
/// 消息类型：频道内某用户的输入状态发生变化。
pub const TYPING_UPDATE_MESSAGE_TYPE: &str = "typing:update";
/// 消息类型：频道内某条消息的已读状态更新。
pub const READ_UPDATE_MESSAGE_TYPE: &str = "read:update";
/// 消息类型：心跳 Pong（简短形式，服务端旧版本使用）。
pub const PONG_MESSAGE_TYPE: &str = "pong";
/// 消息类型：心跳 Pong（带时间戳的完整形式）。
pub const SYSTEM_PONG_MESSAGE_TYPE: &str = "system:pong";
/// 消息类型：服务端对订阅请求的确认。
pub const SUBSCRIBED_ACK_MESSAGE_TYPE: &str = "channel:subscribed";
/// 消息类型：服务端对退订请求的确认。
pub const UNSUBSCRIBED_ACK_MESSAGE_TYPE: &str = "channel:unsubscribed";
/// 消息类型：服务端错误通告。
pub const ERROR_MESSAGE_TYPE: &str = "error";

// --- 出站 Payload 结构体 ---

/// `channel:subscribe` 的负载：请求订阅的频道列表。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SubscribePayload {
    /// 要订阅的频道标识列表。
    pub channels: Vec<String>,
}

/// `channel:unsubscribe` 的负载：请求退订的频道列表。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UnsubscribePayload {
    /// 要退订的频道标识列表。
    pub channels: Vec<String>,
}

/// `typing:start` 的负载。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TypingStartPayload {
    /// 正在输入的频道。
    pub channel: String,
}

/// `typing:stop` 的负载。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TypingStopPayload {
    /// 停止输入的频道。
    pub channel: String,
}

/// `read:mark` 的负载：把某频道内的一条消息标记为已读。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReadMarkPayload {
    /// 消息所在的频道。
    pub channel: String,
    /// 被标记为已读的消息标识。
    pub message_id: String,
}

/// `system:ping` 的负载。当前为空结构体，保留以便未来扩展。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PingPayload {}

// --- 入站 Payload 结构体 ---

/// `message:new` 的负载：频道内新发布的一条消息。
///
/// `data` 是非透明的消息体 JSON，核心客户端不解释其内部结构，
/// 原样交给订阅方的回调。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MessageNewPayload {
    /// 消息所属的频道。
    pub channel: String,
    /// 消息体（非透明 JSON）。
    pub data: Value,
}

/// `message:update` 的负载：频道内某条既有消息的新内容。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MessageUpdatePayload {
    /// 消息所属的频道。
    pub channel: String,
    /// 被更新的消息标识。
    pub message_id: String,
    /// 更新后的消息体（非透明 JSON）。
    pub data: Value,
}

/// `message:delete` 的负载。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MessageDeletePayload {
    /// 消息所属的频道。
    pub channel: String,
    /// 被删除的消息标识。
    pub message_id: String,
}

/// `typing:update` 的负载：频道内某用户输入状态的变化。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TypingUpdatePayload {
    /// 状态变化所在的频道。
    pub channel: String,
    /// 用户标识。
    pub user_id: String,
    /// 用户显示名。
    pub user_name: String,
    /// `true` 表示正在输入，`false` 表示已停止。
    pub is_typing: bool,
}

/// `read:update` 的负载：频道内某条消息被某用户标记为已读。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReadUpdatePayload {
    /// 消息所在的频道。
    pub channel: String,
    /// 被读的消息标识。
    pub message_id: String,
    /// 读取该消息的用户标识。
    pub user_id: String,
}

/// `pong` / `system:pong` 的负载。
///
/// 旧形式 `pong` 不携带任何字段，完整形式 `system:pong` 携带服务端时间戳，
/// 因此 `timestamp` 为可选字段并在缺失时取默认值。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PongPayload {
    /// 服务端发出 Pong 时的毫秒级时间戳（可能缺失）。
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// `channel:subscribed` / `channel:unsubscribed` 确认帧的负载。
///
/// 客户端仅记录日志，不依据确认帧调整本地订阅簿记。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChannelAckPayload {
    /// 服务端确认生效的频道列表。
    pub channels: Vec<String>,
}

/// `error` 帧的负载：服务端错误通告。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorPayload {
    /// 人类可读的错误描述。
    pub message: String,
}
