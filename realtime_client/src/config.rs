// realtime_client/src/config.rs

//! 实时通道客户端配置模块。
//!
//! 本模块定义客户端运行所需的各项策略参数 (`ClientConfig` 结构体)：
//! 心跳间隔、握手超时、重连退避基数与次数上限、输入状态到期窗口。
//! 配置实例由顶层组装点构造并注入客户端（依赖注入，而非全局单例），
//! 派生 `Serialize`/`Deserialize` 以便宿主应用从其配置文件加载。

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 实时通道客户端的策略配置。
///
/// 所有时间参数均为原始整数（秒或毫秒），便于序列化；
/// 代码中通过相应的访问器方法取得 `Duration`。
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ClientConfig {
    /// 心跳发送间隔，单位：秒。仅在连接状态下发送。
    pub heartbeat_interval_seconds: u64,

    /// 连接握手超时，单位：秒。
    /// 在此窗口内未收到传输层的打开事件，则视为一次失败的连接尝试。
    pub handshake_timeout_seconds: u64,

    /// 重连退避的基础延迟，单位：毫秒。
    /// 第 n 次重连的延迟为 `base * 2^(n-1)`（指数退避）。
    pub reconnect_base_delay_ms: u64,

    /// 自动重连的最大尝试次数。达到上限后停留在断开状态，
    /// 直到调用方手动发起重连（手动重连会无条件重置计数）。
    pub max_reconnect_attempts: u32,

    /// 输入状态的自动到期窗口，单位：毫秒。
    /// 在窗口内未收到后续的"仍在输入"信号时，自动发送停止输入帧。
    pub typing_expiry_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_seconds: 25, // 默认心跳间隔 25 秒
            handshake_timeout_seconds: 10,  // 默认握手超时 10 秒
            reconnect_base_delay_ms: 1000,  // 默认退避基数 1 秒
            max_reconnect_attempts: 5,      // 默认最多自动重连 5 次
            typing_expiry_ms: 5000,         // 默认输入状态 5 秒后到期
        }
    }
}

impl ClientConfig {
    /// 心跳间隔。
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_seconds)
    }

    /// 握手超时窗口。
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_seconds)
    }

    /// 重连退避基础延迟。
    pub fn reconnect_base_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_base_delay_ms)
    }

    /// 输入状态到期窗口。
    pub fn typing_expiry(&self) -> Duration {
        Duration::from_millis(self.typing_expiry_ms)
    }
}
