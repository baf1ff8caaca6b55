// realtime_ws_utils/src/server/mod.rs

//! WebSocket 服务端传输模块。
//!
//! 本模块 (`server`) 及其子模块（`transport`）提供 WebSocket 服务器端的
//! 监听、握手与消息收发能力。
//!
//! 实时通道子系统的真实服务端是外部系统；此模块的主要消费者是本仓库的
//! 集成测试，它们用 `start_server` 在本地搭建可记录、可广播的测试服务器，
//! 以便在不依赖外部环境的情况下端到端地验证客户端行为。

pub mod transport;
