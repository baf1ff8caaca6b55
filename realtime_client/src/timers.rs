// realtime_client/src/timers.rs

//! 定时器句柄表。
//!
//! 客户端的全部延迟回调（握手超时、重连退避、心跳循环、各频道的输入到期）
//! 都以 Tokio 任务的形式运行，其 `JoinHandle` 统一登记在这张按用途索引的
//! 表里。正常的状态迁移和客户端释放共用同一个 `cancel_all` 路径，
//! 保证任何退出路径都不会泄漏定时器。

use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::task::JoinHandle;

/// 定时器用途，作为句柄表的键。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimerPurpose {
    /// 连接握手超时（仅在连接建立阶段存活）。
    Handshake,
    /// 重连退避定时器（一次性；任意时刻最多一个在飞）。
    Reconnect,
    /// 心跳循环（仅在连接状态下存活）。
    Heartbeat,
    /// 某频道的输入状态到期定时器。
    TypingExpiry(String),
}

/// 按用途索引的定时器句柄表。
#[derive(Debug, Default)]
pub struct TimerTable {
    handles: Mutex<HashMap<TimerPurpose, JoinHandle<()>>>,
}

impl TimerTable {
    /// 创建一张空表。
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个定时器任务。同一用途的既有任务会先被中止再替换
    /// （输入到期定时器的"重置"就是这样实现的）。
    pub fn arm(&self, purpose: TimerPurpose, handle: JoinHandle<()>) {
        let mut handles = self.handles.lock();
        if let Some(previous) = handles.insert(purpose.clone(), handle) {
            previous.abort();
            debug!("[定时器表] 用途 {:?} 的既有定时器已被替换", purpose);
        }
    }

    /// 中止并移除某个用途的定时器。不存在时为无操作。
    pub fn cancel(&self, purpose: &TimerPurpose) {
        if let Some(handle) = self.handles.lock().remove(purpose) {
            handle.abort();
            debug!("[定时器表] 用途 {:?} 的定时器已取消", purpose);
        }
    }

    /// 仅移除登记项而不中止任务。
    ///
    /// 供定时器任务在自然触发后做自清理：此时任务正在运行，
    /// 对自身调用 `abort` 会把触发逻辑的剩余部分一并取消。
    pub fn discard(&self, purpose: &TimerPurpose) {
        self.handles.lock().remove(purpose);
    }

    /// 某用途的定时器当前是否在飞（已登记且尚未结束）。
    pub fn is_armed(&self, purpose: &TimerPurpose) -> bool {
        self.handles
            .lock()
            .get(purpose)
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// 当前登记且尚未结束的定时器数量（诊断与测试用）。
    pub fn active_count(&self) -> usize {
        self.handles.lock().values().filter(|h| !h.is_finished()).count()
    }

    /// 中止并移除全部定时器。
    ///
    /// 状态迁移和客户端释放统一走这条路径；重复调用是安全的。
    pub fn cancel_all(&self) {
        let mut handles = self.handles.lock();
        let count = handles.len();
        for (_, handle) in handles.drain() {
            handle.abort();
        }
        if count > 0 {
            debug!("[定时器表] 已取消全部 {} 个定时器", count);
        }
    }
}

impl Drop for TimerTable {
    fn drop(&mut self) {
        // 兜底：句柄表被丢弃时中止所有仍在飞的定时器
        for (_, handle) in self.handles.lock().drain() {
            handle.abort();
        }
    }
}
