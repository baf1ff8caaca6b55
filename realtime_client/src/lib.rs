//! `realtime_client` 实时通道客户端 crate。
//!
//! 课程平台编辑器插件的实时通信核心：一条长生命周期的 WebSocket 连接，
//! 在网络抖动下自我修复（握手超时、指数退避、尝试上限），把多个独立的
//! 逻辑订阅方复用到一组共享的服务端频道上，在空闲期以心跳维持连接，
//! 并把类型化的事件帧扇出给正确的订阅方集合。
//!
//! # 内部分层
//! - [`service`]: 连接状态机——传输生命周期、重连/退避/心跳/超时策略的唯一属主。
//! - [`subscription_registry`]: 订阅注册表——按频道引用计数，计算最小的订阅/退订增量。
//! - [`message_router`]: 消息路由——按帧标签解码入站消息并扇出给注册的回调集合。
//! - [`timers`]: 定时器句柄表——按用途索引，所有退出路径共用同一个"全部取消"。
//! - [`auth`] / [`events`]: 凭据、端点与 UI 状态接收器的协作接口（依赖注入）。
//!
//! # 使用方式
//! 顶层组装点构造一个 [`RealtimeClientService`] 并注入各协作者，
//! 随后克隆分发给需要订阅实时事件的模块。订阅方通过
//! [`RealtimeClientService::subscribe`] 注册频道集合与回调束，
//! 生命周期完全由自己驱动，与连接状态无关。

pub mod auth;
pub mod callbacks;
pub mod config;
pub mod error;
pub mod events;
pub mod message_router;
pub mod service;
pub mod subscription_registry;
pub mod timers;

pub use auth::{AccessTokenProvider, EndpointProvider};
pub use callbacks::{ChannelEventCallbacks, HandlerId};
pub use config::ClientConfig;
pub use error::ClientError;
pub use events::{ConnectionState, ConnectionStatus, ConnectionStatusSink, NoopStatusSink};
pub use service::RealtimeClientService;

// 频道标识构造是公开契约的一部分，从模型 crate 重新导出
pub use realtime_models::build_channel;
