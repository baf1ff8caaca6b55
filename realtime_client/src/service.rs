// realtime_client/src/service.rs

//! 实时通道客户端服务模块。
//!
//! `RealtimeClientService` 是整个子系统的核心：它独占持有传输层句柄与
//! 连接状态，驱动连接生命周期（建立、握手超时、断开、指数退避重连）、
//! 心跳维持、订阅集合的服务端同步、入站消息的解码与扇出分发，
//! 以及各频道输入状态的去抖。
//!
//! 服务由顶层组装点构造一次，并以引用的方式传递给所有需要它的协作者
//! （依赖注入，不提供全局单例访问器）。订阅注册表与消息路由只读连接状态，
//! 从不直接发起连接或关闭；这两类动作是状态机的专属职责。

use crate::auth::{self, AccessTokenProvider, EndpointProvider};
use crate::callbacks::{ChannelEventCallbacks, ConnectionCallback, ErrorCallback, HandlerId};
use crate::config::ClientConfig;
use crate::events::{ConnectionState, ConnectionStatus, ConnectionStatusSink};
use crate::message_router::{self, InboundEvent};
use crate::subscription_registry::SubscriptionRegistry;
use crate::timers::{TimerPurpose, TimerTable};
use chrono::{DateTime, Utc};
use futures_util::stream::SplitSink;
use futures_util::SinkExt;
use log::{debug, error, info, warn};
use parking_lot::{Mutex, RwLock};
use realtime_models::ws_payloads::{
    PingPayload, ReadMarkPayload, SubscribePayload, TypingStartPayload, TypingStopPayload,
    UnsubscribePayload, PING_MESSAGE_TYPE, READ_MARK_MESSAGE_TYPE, SUBSCRIBE_MESSAGE_TYPE,
    TYPING_START_MESSAGE_TYPE, TYPING_STOP_MESSAGE_TYPE, UNSUBSCRIBE_MESSAGE_TYPE,
};
use realtime_ws_utils::client::transport::{self, ClientWsStream};
use realtime_ws_utils::error::WsError;
use realtime_ws_utils::message::WsMessage;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex as TokioMutex;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::{
    frame::coding::CloseCode, CloseFrame, Message as TungsteniteMessage,
};

/// 指数退避延迟：第 `attempt + 1` 次重连前等待 `base * 2^attempt`。
pub(crate) fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * 2u32.saturating_pow(attempt)
}

/// 实时通道客户端服务。
///
/// 封装了与课程平台实时服务交互的所有逻辑：连接管理、订阅同步、
/// 消息收发与分发、心跳维持以及输入状态去抖。克隆代价低廉
/// （内部为 `Arc`），可以在组装点克隆后分发给各协作者。
#[derive(Clone)]
pub struct RealtimeClientService {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    /// 策略配置（心跳间隔、握手超时、退避参数、输入到期窗口）。
    config: ClientConfig,
    /// 凭据提供者。没有令牌时连接请求安静地失败。
    token_provider: Arc<dyn AccessTokenProvider>,
    /// 实时端点提供者。
    endpoint_provider: Arc<dyn EndpointProvider>,
    /// UI 状态接收器，纯展示用途。
    status_sink: Arc<dyn ConnectionStatusSink>,
    /// 连接状态。由状态机独占修改，其余模块只读。
    state: RwLock<ConnectionState>,
    /// 重连尝试计数。成功连接或手动重连时归零。
    reconnect_attempts: RwLock<u32>,
    /// 本端主动断开标志。关闭处理据此决定是否安排重连。
    intentional_disconnect: AtomicBool,
    /// WebSocket 消息发送端。`None` 表示连接尚未建立或已断开。
    ws_sender: TokioMutex<Option<SplitSink<ClientWsStream, TungsteniteMessage>>>,
    /// 连接处理任务（持有接收循环）的句柄。
    connection_task: Mutex<Option<JoinHandle<()>>>,
    /// 按用途索引的定时器句柄表。
    timers: TimerTable,
    /// 频道订阅注册表。
    registry: Mutex<SubscriptionRegistry>,
    /// 最后一次收到 Pong 的时间戳。仅作诊断簿记，不用于主动断连。
    last_pong_at: RwLock<Option<DateTime<Utc>>>,
}

impl RealtimeClientService {
    /// 创建 `RealtimeClientService` 的新实例。
    ///
    /// # 参数
    /// * `config` - 策略配置。
    /// * `token_provider` - 凭据提供者协作接口。
    /// * `endpoint_provider` - 端点提供者协作接口。
    /// * `status_sink` - 连接状态展示接收器（不关心时可传入 [`crate::events::NoopStatusSink`]）。
    pub fn new(
        config: ClientConfig,
        token_provider: Arc<dyn AccessTokenProvider>,
        endpoint_provider: Arc<dyn EndpointProvider>,
        status_sink: Arc<dyn ConnectionStatusSink>,
    ) -> Self {
        info!("[实时客户端] 正在初始化...");
        Self {
            inner: Arc::new(ClientInner {
                config,
                token_provider,
                endpoint_provider,
                status_sink,
                state: RwLock::new(ConnectionState::Disconnected),
                reconnect_attempts: RwLock::new(0),
                intentional_disconnect: AtomicBool::new(false),
                ws_sender: TokioMutex::new(None),
                connection_task: Mutex::new(None),
                timers: TimerTable::new(),
                registry: Mutex::new(SubscriptionRegistry::new()),
                last_pong_at: RwLock::new(None),
            }),
        }
    }

    /// 发起连接。
    ///
    /// 仅在断开状态下生效；没有可用凭据时这是一次有意的软失败
    /// （记录警告、不向调用方抛出错误），UI 代码可以投机性地调用本方法，
    /// 之后通过 [`Self::is_connected`] / [`Self::connection_state`] 轮询结果。
    /// 实际的连接结果通过状态接收器与各注册的连接回调异步通知。
    pub async fn connect(&self) {
        match self.inner.connection_state() {
            ConnectionState::Disconnected => {}
            other => {
                warn!("[实时客户端] 当前状态为 {}，忽略重复的连接请求", other);
                return;
            }
        }
        self.inner.clone().begin_connect();
    }

    /// 主动断开当前连接。
    ///
    /// 取消全部定时器，用本端保留的正常关闭码关闭传输，不安排重连。
    /// 订阅注册表保持不变，下一次连接会重新下发完整订阅集合。
    pub async fn disconnect(&self) {
        info!("[实时客户端] 主动断开连接请求");
        self.inner.teardown_connection().await;
    }

    /// 手动重连。
    ///
    /// 无条件把重连尝试计数重置为 0（即使失败原因尚未消除），
    /// 强制执行一次完整断开（清空全部定时器；订阅注册表保留），
    /// 然后重新发起连接。这是重连次数达到上限后的唯一恢复手段。
    pub async fn reconnect(&self) {
        info!("[实时客户端] 手动重连请求：重置重连计数并重建连接");
        self.inner.teardown_connection().await;
        *self.inner.reconnect_attempts.write() = 0;
        self.inner.clone().begin_connect();
    }

    /// 当前是否处于连接状态。
    pub fn is_connected(&self) -> bool {
        self.inner.connection_state() == ConnectionState::Connected
    }

    /// 读取当前连接状态。
    pub fn connection_state(&self) -> ConnectionState {
        self.inner.connection_state()
    }

    /// 当前的重连尝试计数。
    pub fn reconnect_attempts(&self) -> u32 {
        *self.inner.reconnect_attempts.read()
    }

    /// 最后一次收到 Pong 的时间戳（诊断用途）。
    pub fn last_pong_at(&self) -> Option<DateTime<Utc>> {
        *self.inner.last_pong_at.read()
    }

    /// 注册（或覆盖）一个订阅：`handler_id` 关注 `channels`，事件经 `callbacks` 投递。
    ///
    /// 已连接时只把引用计数从 0 变 1 的频道放进单个订阅帧下发
    /// （已被其他处理器订阅的频道不会重复下发）；未连接时仅更新本地簿记，
    /// 下一次连接成功后统一重发完整集合。注册的生命周期完全由调用方驱动，
    /// 与连接生命周期无关。
    pub async fn subscribe(
        &self,
        channels: Vec<String>,
        handler_id: HandlerId,
        callbacks: ChannelEventCallbacks,
    ) {
        let delta = self
            .inner
            .registry
            .lock()
            .register(handler_id.clone(), channels, callbacks);
        info!(
            "[实时客户端] 处理器 '{}' 完成订阅注册，新增 {:?}，释放 {:?}",
            handler_id, delta.to_subscribe, delta.to_unsubscribe
        );
        self.inner.flush_delta(delta.to_subscribe, delta.to_unsubscribe).await;
    }

    /// 移除 `handler_id` 的整个订阅注册。
    ///
    /// 与来源行为一致，移除的是整个注册而非 `channels` 列出的部分频道
    /// （参数仅用于日志）；退订帧只包含不再被任何在册处理器需要的频道。
    pub async fn unsubscribe(&self, channels: Vec<String>, handler_id: &HandlerId) {
        debug!(
            "[实时客户端] 处理器 '{}' 请求退订 {:?}（注册将被整体移除）",
            handler_id, channels
        );
        let to_unsubscribe = self.inner.registry.lock().unregister(handler_id);
        self.inner.flush_delta(Vec::new(), to_unsubscribe).await;
    }

    /// 发送"开始输入"信号并（重新）装配该频道的自动到期定时器。
    ///
    /// 到期窗口内没有后续的 `start_typing` 或显式的 [`Self::stop_typing`] 时，
    /// 自动发送一帧停止信号。未连接时整个调用是记录警告的无操作。
    pub async fn start_typing(&self, channel: &str) {
        if !self.is_connected() {
            warn!("[实时客户端] 未连接，频道 '{}' 的输入信号被忽略", channel);
            return;
        }
        self.inner
            .send_frame(
                TYPING_START_MESSAGE_TYPE,
                &TypingStartPayload { channel: channel.to_string() },
            )
            .await;

        let expiry_inner = self.inner.clone();
        let expiry_channel = channel.to_string();
        let expiry = self.inner.config.typing_expiry();
        self.inner.timers.arm(
            TimerPurpose::TypingExpiry(channel.to_string()),
            tokio::spawn(async move {
                tokio::time::sleep(expiry).await;
                expiry_inner
                    .timers
                    .discard(&TimerPurpose::TypingExpiry(expiry_channel.clone()));
                debug!(
                    "[实时客户端] 频道 '{}' 的输入状态到期，自动发送停止帧",
                    expiry_channel
                );
                expiry_inner
                    .send_frame(
                        TYPING_STOP_MESSAGE_TYPE,
                        &TypingStopPayload { channel: expiry_channel.clone() },
                    )
                    .await;
            }),
        );
    }

    /// 取消该频道的输入到期定时器；已连接时立即发送停止帧，
    /// 未连接时仅清理本地定时器状态，不发送任何帧。
    pub async fn stop_typing(&self, channel: &str) {
        self.inner
            .timers
            .cancel(&TimerPurpose::TypingExpiry(channel.to_string()));
        if self.is_connected() {
            self.inner
                .send_frame(
                    TYPING_STOP_MESSAGE_TYPE,
                    &TypingStopPayload { channel: channel.to_string() },
                )
                .await;
        } else {
            debug!("[实时客户端] 未连接，频道 '{}' 仅清理本地输入定时器状态", channel);
        }
    }

    /// 把某频道的一条消息标记为已读（即发即忘；未连接时是记录警告的无操作）。
    pub async fn mark_read(&self, channel: &str, message_id: &str) {
        self.inner
            .send_frame(
                READ_MARK_MESSAGE_TYPE,
                &ReadMarkPayload {
                    channel: channel.to_string(),
                    message_id: message_id.to_string(),
                },
            )
            .await;
    }

    /// 释放客户端。
    ///
    /// 所有退出路径共用定时器表的"全部取消"：握手超时、退避、心跳、
    /// 每个频道的输入定时器一个不漏；传输以本端的正常关闭码关闭，
    /// 订阅注册表被清空。释放后不会再有任何帧发出或回调触发。
    pub async fn shutdown(&self) {
        info!("[实时客户端] 正在释放客户端资源...");
        self.inner.teardown_connection().await;
        self.inner.registry.lock().clear();
        info!("[实时客户端] 客户端已释放");
    }
}

impl ClientInner {
    fn connection_state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// 修改连接状态并在发生变化时通知状态接收器。
    fn set_state(&self, new_state: ConnectionState) {
        let changed = {
            let mut state = self.state.write();
            if *state == new_state {
                false
            } else {
                *state = new_state;
                true
            }
        };
        if changed {
            let status = ConnectionStatus {
                state: new_state,
                reconnect_attempts: *self.reconnect_attempts.read(),
            };
            info!(
                "[实时客户端] 连接状态变更为 {}（重连尝试 {} 次）",
                status.state, status.reconnect_attempts
            );
            self.status_sink.on_status_changed(status);
        }
    }

    /// 发起一次连接尝试：取凭据、解析端点、装配握手超时、派生连接任务。
    ///
    /// 由公开的 `connect`、手动重连和退避定时器触发共用。
    fn begin_connect(self: Arc<Self>) {
        let token = match self.token_provider.access_token() {
            Some(token) => token,
            None => {
                // 凭据缺失是有意的软失败，调用方通过状态轮询感知
                warn!("[实时客户端] 没有可用的访问令牌，连接请求被忽略");
                self.set_state(ConnectionState::Disconnected);
                return;
            }
        };
        let url = match auth::resolve_realtime_url(&self.endpoint_provider.base_url(), &token) {
            Ok(url) => url,
            Err(e) => {
                error!("[实时客户端] 端点地址解析失败，无法发起连接: {}", e);
                self.set_state(ConnectionState::Disconnected);
                return;
            }
        };

        self.intentional_disconnect.store(false, Ordering::SeqCst);
        self.set_state(ConnectionState::Connecting);

        // 握手超时：窗口内未完成打开按一次失败的连接尝试处理
        let timeout_inner = self.clone();
        let handshake_timeout = self.config.handshake_timeout();
        self.timers.arm(
            TimerPurpose::Handshake,
            tokio::spawn(async move {
                tokio::time::sleep(handshake_timeout).await;
                timeout_inner.on_handshake_timeout();
            }),
        );

        let connection_inner = self.clone();
        let connection_task = tokio::spawn(async move {
            connection_inner.run_connection(url).await;
        });
        if let Some(previous) = self.connection_task.lock().replace(connection_task) {
            previous.abort();
        }
    }

    /// 连接任务主体：建立连接、处理打开事件、运行接收循环、处理关闭。
    async fn run_connection(self: Arc<Self>, url: String) {
        match transport::connect_client(url).await {
            Ok(connection) => {
                self.timers.cancel(&TimerPurpose::Handshake);
                if self.intentional_disconnect.load(Ordering::SeqCst) {
                    debug!("[实时客户端] 连接建立时已收到主动断开请求，放弃该连接");
                    return;
                }
                self.clone().on_transport_open(connection.ws_sender).await;

                let mut receiver = connection.ws_receiver;
                loop {
                    match transport::receive_message(&mut receiver).await {
                        Some(Ok(message)) => self.handle_inbound(message).await,
                        Some(Err(e)) => match e {
                            // 入站帧格式错误在解码边界被捕获并丢弃，绝不致命
                            WsError::DeserializationError(detail) => {
                                warn!("[实时客户端] 入站帧格式错误，已丢弃: {}", detail);
                            }
                            // 传输层错误本身不改变连接状态，仅广播给错误回调；
                            // 若错误是致命的，随后的关闭事件会驱动状态迁移
                            other => {
                                error!("[实时客户端] 传输层错误: {}", other);
                                self.broadcast_error(&other.to_string());
                            }
                        },
                        None => break,
                    }
                }
                self.on_transport_closed().await;
            }
            Err(e) => {
                self.timers.cancel(&TimerPurpose::Handshake);
                error!("[实时客户端] 连接到实时服务失败: {}", e);
                self.on_connect_failed();
            }
        }
    }

    /// 传输层打开事件：清零重连计数、启动心跳、重新下发订阅、通知连接回调。
    async fn on_transport_open(
        self: Arc<Self>,
        sender: SplitSink<ClientWsStream, TungsteniteMessage>,
    ) {
        *self.ws_sender.lock().await = Some(sender);
        *self.reconnect_attempts.write() = 0;
        *self.last_pong_at.write() = Some(Utc::now());
        self.set_state(ConnectionState::Connected);

        let heartbeat_inner = self.clone();
        self.timers.arm(
            TimerPurpose::Heartbeat,
            tokio::spawn(async move {
                heartbeat_inner.run_heartbeat_loop().await;
            }),
        );

        // 重新下发完整的有效订阅集合（幂等；服务端状态假定随新连接重置）
        let channels = self.registry.lock().effective_channels();
        if channels.is_empty() {
            debug!("[实时客户端] 有效订阅集合为空，连接建立后无需下发订阅帧");
        } else {
            info!("[实时客户端] 连接已建立，重新下发 {} 个频道的订阅", channels.len());
            self.send_frame(SUBSCRIBE_MESSAGE_TYPE, &SubscribePayload { channels })
                .await;
        }

        let callbacks: Vec<ConnectionCallback> = self
            .registry
            .lock()
            .registrations()
            .values()
            .filter_map(|r| r.callbacks.on_connected.clone())
            .collect();
        for callback in callbacks {
            callback();
        }
    }

    /// 传输层关闭事件（接收循环结束）。
    ///
    /// 主动断开会直接中止连接任务，因此这条路径实际只处理对端或网络
    /// 引起的关闭；`intentional_disconnect` 标志覆盖"本端发出关闭帧后
    /// 对端先行关闭"的窗口。
    async fn on_transport_closed(self: Arc<Self>) {
        let intentional = self.intentional_disconnect.load(Ordering::SeqCst);
        self.timers.cancel(&TimerPurpose::Heartbeat);
        *self.ws_sender.lock().await = None;
        self.set_state(ConnectionState::Disconnected);

        let callbacks: Vec<ConnectionCallback> = self
            .registry
            .lock()
            .registrations()
            .values()
            .filter_map(|r| r.callbacks.on_disconnected.clone())
            .collect();
        for callback in callbacks {
            callback();
        }

        if intentional {
            info!("[实时客户端] 连接按本端请求正常关闭，不安排重连");
        } else {
            warn!("[实时客户端] 连接意外断开，准备安排重连");
            self.schedule_reconnect();
        }
    }

    /// 连接尝试失败（握手阶段出错）：与握手超时同样处理，进入退避。
    fn on_connect_failed(self: Arc<Self>) {
        self.set_state(ConnectionState::Disconnected);
        if !self.intentional_disconnect.load(Ordering::SeqCst) {
            self.schedule_reconnect();
        }
    }

    /// 握手超时触发：强制关闭传输并安排重连。
    fn on_handshake_timeout(self: Arc<Self>) {
        self.timers.discard(&TimerPurpose::Handshake);
        if self.connection_state() != ConnectionState::Connecting {
            return;
        }
        warn!(
            "[实时客户端] 连接握手超时（{} 秒内未完成打开），强制关闭并进入退避",
            self.config.handshake_timeout_seconds
        );
        if let Some(handle) = self.connection_task.lock().take() {
            handle.abort();
        }
        self.set_state(ConnectionState::Disconnected);
        self.schedule_reconnect();
    }

    /// 安排一次重连。
    ///
    /// 幂等：已有在飞的退避定时器时忽略；达到尝试上限时不再装配定时器，
    /// 状态停留在断开（终态，直到手动重连重置计数）。
    fn schedule_reconnect(self: Arc<Self>) {
        if self.timers.is_armed(&TimerPurpose::Reconnect) {
            debug!("[实时客户端] 已有重连定时器在飞，忽略重复的安排请求");
            return;
        }
        let attempt = *self.reconnect_attempts.read();
        if attempt >= self.config.max_reconnect_attempts {
            warn!(
                "[实时客户端] 重连尝试已达上限（{} 次），停留在断开状态，等待手动重连",
                attempt
            );
            return;
        }

        let delay = backoff_delay(self.config.reconnect_base_delay(), attempt);
        *self.reconnect_attempts.write() = attempt + 1;
        self.set_state(ConnectionState::Reconnecting);
        info!("[实时客户端] 第 {} 次重连将在 {:?} 后发起", attempt + 1, delay);

        let reconnect_inner = self.clone();
        self.timers.arm(
            TimerPurpose::Reconnect,
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                reconnect_inner.timers.discard(&TimerPurpose::Reconnect);
                reconnect_inner.begin_connect();
            }),
        );
    }

    /// 心跳循环：固定间隔发送 Ping，仅在连接状态下存活。
    async fn run_heartbeat_loop(self: Arc<Self>) {
        info!(
            "[实时客户端] (心跳任务) 已启动，间隔 {} 秒",
            self.config.heartbeat_interval_seconds
        );
        let mut ticker = tokio::time::interval(self.config.heartbeat_interval());
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await; // interval 的第一个 tick 立即完成，跳过
        loop {
            ticker.tick().await;
            // 发送前再次确认连接状态，防止定时器在关闭后竞态触发
            if self.connection_state() != ConnectionState::Connected {
                info!("[实时客户端] (心跳任务) 连接已不在连接状态，心跳循环终止");
                break;
            }
            debug!("[实时客户端] (心跳任务) 发送 Ping");
            self.send_frame(PING_MESSAGE_TYPE, &PingPayload {}).await;
        }
    }

    /// 处理一条入站消息：解码后按事件类型消费或扇出分发。
    /// 每条消息处理完毕后才会处理下一条（接收循环串行驱动）。
    async fn handle_inbound(&self, message: WsMessage) {
        debug!("[实时客户端] 收到消息，类型: '{}'", message.message_type);
        let event = match message_router::decode_frame(&message) {
            Some(event) => event,
            None => return, // 解码失败或未知标签，已在路由层记录
        };
        match event {
            InboundEvent::Pong(pong) => {
                *self.last_pong_at.write() = Some(Utc::now());
                debug!("[实时客户端] 收到 Pong（服务端时间戳: {:?}）", pong.timestamp);
            }
            InboundEvent::SubscribedAck(ack) => {
                // 确认帧仅记录；注册表不据此调整本地簿记
                info!("[实时客户端] 服务端确认订阅频道 {:?}", ack.channels);
            }
            InboundEvent::UnsubscribedAck(ack) => {
                info!("[实时客户端] 服务端确认退订频道 {:?}", ack.channels);
            }
            other => {
                // 规划阶段持有注册表锁，执行阶段不持有，回调里可以安全地
                // 回调进客户端的公开接口
                let invocations = {
                    let registry = self.registry.lock();
                    message_router::plan_dispatch(&other, registry.registrations())
                };
                for invocation in invocations {
                    invocation();
                }
            }
        }
    }

    /// 把传输层错误广播给所有在册注册的错误回调。
    fn broadcast_error(&self, message: &str) {
        let callbacks: Vec<ErrorCallback> = self
            .registry
            .lock()
            .registrations()
            .values()
            .filter_map(|r| r.callbacks.on_error.clone())
            .collect();
        for callback in callbacks {
            callback(message);
        }
    }

    /// 已连接时把订阅增量下发为至多两帧（订阅帧 + 退订帧）；
    /// 未连接时丢弃增量，依赖下次连接成功后的整体重发。
    async fn flush_delta(&self, to_subscribe: Vec<String>, to_unsubscribe: Vec<String>) {
        if self.connection_state() != ConnectionState::Connected {
            debug!("[实时客户端] 未连接，订阅变更仅更新本地簿记，下次连接时统一下发");
            return;
        }
        if !to_subscribe.is_empty() {
            self.send_frame(
                SUBSCRIBE_MESSAGE_TYPE,
                &SubscribePayload { channels: to_subscribe },
            )
            .await;
        }
        if !to_unsubscribe.is_empty() {
            self.send_frame(
                UNSUBSCRIBE_MESSAGE_TYPE,
                &UnsubscribePayload { channels: to_unsubscribe },
            )
            .await;
        }
    }

    /// 构造并发送一帧出站消息。
    ///
    /// 未连接时是记录警告的无操作（不排队、不重试、不抛错）。
    async fn send_frame<T: Serialize>(&self, message_type: &str, payload: &T) {
        if self.connection_state() != ConnectionState::Connected {
            warn!("[实时客户端] 未连接，类型为 '{}' 的出站消息被丢弃", message_type);
            return;
        }
        let message = match WsMessage::new(message_type.to_string(), payload) {
            Ok(message) => message,
            Err(e) => {
                error!("[实时客户端] 构造类型为 '{}' 的 WsMessage 失败: {}", message_type, e);
                return;
            }
        };
        let json = match serde_json::to_string(&message) {
            Ok(json) => json,
            Err(e) => {
                error!("[实时客户端] 序列化类型为 '{}' 的 WsMessage 失败: {}", message_type, e);
                return;
            }
        };
        let mut sender_guard = self.ws_sender.lock().await;
        match sender_guard.as_mut() {
            Some(sender) => {
                if let Err(e) = sender.send(TungsteniteMessage::Text(json)).await {
                    // 发送失败通常意味着连接已断开，随后的关闭事件会驱动状态迁移
                    error!("[实时客户端] 发送类型为 '{}' 的消息失败: {}", message_type, e);
                } else {
                    debug!(
                        "[实时客户端] 类型为 '{}' 的消息已发送 (ID: {})",
                        message_type, message.message_id
                    );
                }
            }
            None => {
                warn!("[实时客户端] 发送通道不可用，类型为 '{}' 的消息被丢弃", message_type);
            }
        }
    }

    /// 完整断开：设置主动断开标志、取消全部定时器、优雅关闭传输、
    /// 中止连接任务、迁移到断开状态并通知断开回调。
    ///
    /// 主动断开、手动重连与释放共用这条路径。
    async fn teardown_connection(&self) {
        self.intentional_disconnect.store(true, Ordering::SeqCst);
        self.timers.cancel_all();

        // 以本端保留的正常关闭码关闭发送端，使关闭处理能把这次关闭
        // 识别为主动断开而不安排重连
        let mut sender_guard = self.ws_sender.lock().await;
        if let Some(mut sender) = sender_guard.take() {
            let close_frame = CloseFrame {
                code: CloseCode::Normal,
                reason: "客户端主动断开".into(),
            };
            if let Err(e) = sender.send(TungsteniteMessage::Close(Some(close_frame))).await {
                warn!("[实时客户端] 发送关闭帧失败: {}", e);
            }
        }
        drop(sender_guard);

        if let Some(handle) = self.connection_task.lock().take() {
            handle.abort();
        }

        let was_connected = self.connection_state() == ConnectionState::Connected;
        self.set_state(ConnectionState::Disconnected);
        if was_connected {
            let callbacks: Vec<ConnectionCallback> = self
                .registry
                .lock()
                .registrations()
                .values()
                .filter_map(|r| r.callbacks.on_disconnected.clone())
                .collect();
            for callback in callbacks {
                callback();
            }
        }
    }
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        // 定时器表自身的 Drop 负责中止全部定时器；这里兜底中止连接任务
        if let Some(handle) = self.connection_task.lock().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NoopStatusSink;

    struct NoTokenProvider;
    impl AccessTokenProvider for NoTokenProvider {
        fn access_token(&self) -> Option<String> {
            None
        }
    }

    struct FixedEndpoint(&'static str);
    impl EndpointProvider for FixedEndpoint {
        fn base_url(&self) -> String {
            self.0.to_string()
        }
    }

    #[test]
    /// 性质：第 n 次重连的退避延迟为 `base * 2^(n-1)`（attempt 从 0 起）。
    fn test_backoff_delay_is_exponential() {
        let base = Duration::from_millis(1000);
        assert_eq!(backoff_delay(base, 0), Duration::from_millis(1000));
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(2000));
        assert_eq!(backoff_delay(base, 2), Duration::from_millis(4000));
        assert_eq!(backoff_delay(base, 3), Duration::from_millis(8000));
    }

    #[tokio::test]
    /// 测试没有可用凭据时 `connect` 是软失败：状态保持断开，不装配任何定时器。
    async fn test_connect_without_credential_is_soft_noop() {
        let service = RealtimeClientService::new(
            ClientConfig::default(),
            Arc::new(NoTokenProvider),
            Arc::new(FixedEndpoint("http://127.0.0.1:1")),
            Arc::new(NoopStatusSink),
        );
        service.connect().await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(service.connection_state(), ConnectionState::Disconnected);
        assert_eq!(service.reconnect_attempts(), 0);
        assert!(!service.is_connected());
    }

    #[tokio::test]
    /// 测试未连接时的即发即忘操作都是无操作，不会崩溃也不会改变状态。
    async fn test_fire_and_forget_ops_while_disconnected() {
        let service = RealtimeClientService::new(
            ClientConfig::default(),
            Arc::new(NoTokenProvider),
            Arc::new(FixedEndpoint("http://127.0.0.1:1")),
            Arc::new(NoopStatusSink),
        );
        service.start_typing("course:1").await;
        service.stop_typing("course:1").await;
        service.mark_read("course:1", "m1").await;
        assert_eq!(service.connection_state(), ConnectionState::Disconnected);
    }
}
