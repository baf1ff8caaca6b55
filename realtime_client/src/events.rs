// realtime_client/src/events.rs

//! 连接状态定义与状态变化通知接口。
//!
//! `ConnectionState` 由连接状态机独占持有；任何时刻恰好处于四个状态之一，
//! 仅在传输层事件或控制动作（连接/断开/重连）时被修改。
//! UI 状态指示器等协作者通过注入的 `ConnectionStatusSink` 接收状态变化通知
//! （纯展示用途，核心不关心接收方如何处理）。

use serde::Serialize;

/// WebSocket 连接状态机的状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionState {
    /// 未连接，且当前没有进行中的连接尝试。
    Disconnected,
    /// 连接尝试（含握手）进行中。
    Connecting,
    /// 连接已建立，可以收发消息。
    Connected,
    /// 连接已丢失，退避定时器已装配，等待下一次重连尝试。
    Reconnecting,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// 连接状态变化通知的负载。
///
/// `reconnect_attempts` 是当前的重连尝试计数，便于 UI 渲染
/// "正在重连 (n/max)" 之类的提示。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    /// 变化后的连接状态。
    pub state: ConnectionState,
    /// 当前的重连尝试计数（成功连接或手动重连时归零）。
    pub reconnect_attempts: u32,
}

/// UI 状态接收器协作接口。
///
/// 每次连接状态发生变化时被调用一次；实现方通常把状态转发给
/// 状态栏指示器或通知系统。核心对接收方的行为没有任何依赖。
pub trait ConnectionStatusSink: Send + Sync {
    /// 连接状态发生变化时的回调。
    fn on_status_changed(&self, status: ConnectionStatus);
}

/// 不做任何事的状态接收器，供不关心连接状态展示的宿主使用。
pub struct NoopStatusSink;

impl ConnectionStatusSink for NoopStatusSink {
    fn on_status_changed(&self, _status: ConnectionStatus) {}
}
