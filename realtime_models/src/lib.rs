//! `realtime_models` 实时通信模型库 crate。
//!
//! 本 crate 集中定义了课程平台编辑器插件的实时通道子系统在客户端与服务端之间
//! 交换数据时所使用的共享数据结构：
//! - **WebSocket 消息负载 (`ws_payloads`)**: 每一种业务帧标签对应一个 Payload 结构体，
//!   以及与之配套的消息类型字符串常量（例如 `channel:subscribe`、`message:new`）。
//! - **频道工具 (`channel`)**: 构造 `"{scope}:{id}"` 形式频道标识字符串的纯函数。
//!
//! 设计原则：
//! - **共享性**: 此处的模型同时被传输层 (`realtime_ws_utils`)、核心客户端
//!   (`realtime_client`) 以及集成测试中的本地测试服务端使用。
//! - **序列化/反序列化**: 所有模型都派生 `serde::Serialize` 和 `serde::Deserialize`，
//!   以便在 JSON 线格式之间转换。
//! - **可调试性与克隆**: 所有模型都派生 `Debug` 和 `Clone`，便于日志输出和创建副本。

pub mod channel;        // 频道标识字符串的构造与工具函数
pub mod ws_payloads;    // WebSocket 通信中使用的各种消息负载结构体

pub use channel::build_channel;
