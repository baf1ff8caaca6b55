// realtime_ws_utils/src/client/mod.rs

//! WebSocket 客户端传输模块。
//!
//! 本模块 (`client`) 及其子模块（`transport`）构成了 `realtime_ws_utils` 库中
//! 用于实现 WebSocket 客户端功能的核心组件。
//!
//! 主要职责包括：
//! - **连接建立**: 提供连接到远程 WebSocket 服务器的机制。
//! - **消息传输**: 管理通过 WebSocket 连接发送和接收 `WsMessage` 的逻辑。
//! - **传输层抽象**: 封装底层 WebSocket 库（`tokio-tungstenite`）的细节，
//!   向上层（`realtime_client` 中的连接状态机）提供"打开/关闭、收发不透明文本帧"
//!   这一最小接口。

pub mod transport;
