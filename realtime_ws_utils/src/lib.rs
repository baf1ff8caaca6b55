//! `realtime_ws_utils` 是一个提供 WebSocket 通信实用功能的 Rust Crate。
//! 它负责实时通道子系统中"一次只拥有一个物理套接字"的传输层封装，
//! 与 `realtime_models` 一起使用时简化消息的序列化/反序列化处理。
//!
//! 主要模块包括：
//! - `message`: 定义核心消息信封结构 `WsMessage`。
//! - `error`: 定义库中使用的统一错误类型 `WsError`。
//! - `client`: 提供 WebSocket 客户端传输层（连接、收发不透明文本帧）。
//! - `server`: 提供 WebSocket 服务端传输层，主要供本仓库的集成测试
//!   搭建本地测试服务器使用（真实服务端是外部系统）。

pub mod client;
pub mod error;
pub mod message;
pub mod server;
