// realtime_client/src/callbacks.rs

//! 订阅方回调束定义。
//!
//! 每个订阅方（逻辑上的处理器）以一个非透明的 `HandlerId` 标识自身，
//! 并携带一束可选的回调槽位。分发时缺失的槽位会被直接跳过，不视为错误。
//! 回调在事件循环的分发阶段同步调用，实现方不应在回调中长时间阻塞。

use serde_json::Value;
use std::sync::Arc;

/// 订阅方处理器的非透明标识。
///
/// 仅要求相等比较；由调用方自行保证唯一性（重复注册会覆盖既有注册）。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandlerId(String);

impl HandlerId {
    /// 用任意字符串创建处理器标识。
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// 以字符串形式读取标识。
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HandlerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for HandlerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// 各槽位的回调类型别名。参数约定见 `ChannelEventCallbacks` 各字段文档。
pub type MessageNewCallback = Arc<dyn Fn(&str, &Value) + Send + Sync>;
pub type MessageUpdateCallback = Arc<dyn Fn(&str, &str, &Value) + Send + Sync>;
pub type MessageDeleteCallback = Arc<dyn Fn(&str, &str) + Send + Sync>;
pub type TypingUpdateCallback = Arc<dyn Fn(&str, &str, &str, bool) + Send + Sync>;
pub type ReadUpdateCallback = Arc<dyn Fn(&str, &str, &str) + Send + Sync>;
pub type ConnectionCallback = Arc<dyn Fn() + Send + Sync>;
pub type ErrorCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// 一个订阅方的可选回调槽位束。
///
/// 所有槽位均为可选；订阅方只填写自己关心的事件。
#[derive(Clone, Default)]
pub struct ChannelEventCallbacks {
    /// 频道内有新消息：`(channel, data)`。
    pub on_message_new: Option<MessageNewCallback>,
    /// 频道内消息被更新：`(channel, message_id, data)`。
    pub on_message_update: Option<MessageUpdateCallback>,
    /// 频道内消息被删除：`(channel, message_id)`。
    pub on_message_delete: Option<MessageDeleteCallback>,
    /// 频道内输入状态变化：`(channel, user_id, user_name, is_typing)`。
    pub on_typing_update: Option<TypingUpdateCallback>,
    /// 频道内已读状态更新：`(channel, message_id, user_id)`。
    pub on_read_update: Option<ReadUpdateCallback>,
    /// 连接建立（每次成功连接都会触发，包括重连后）。
    pub on_connected: Option<ConnectionCallback>,
    /// 连接断开。
    pub on_disconnected: Option<ConnectionCallback>,
    /// 服务端错误通告或传输层错误（广播给所有在册订阅方，不按频道过滤）：`(message)`。
    pub on_error: Option<ErrorCallback>,
}

impl std::fmt::Debug for ChannelEventCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // 函数对象无法派生 Debug，这里输出各槽位是否已填写
        f.debug_struct("ChannelEventCallbacks")
            .field("on_message_new", &self.on_message_new.is_some())
            .field("on_message_update", &self.on_message_update.is_some())
            .field("on_message_delete", &self.on_message_delete.is_some())
            .field("on_typing_update", &self.on_typing_update.is_some())
            .field("on_read_update", &self.on_read_update.is_some())
            .field("on_connected", &self.on_connected.is_some())
            .field("on_disconnected", &self.on_disconnected.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}
