// realtime_client/src/message_router.rs

//! 入站消息路由模块。
//!
//! 负责两件事：
//! 1. **解码** (`decode_frame`): 把入站的 `WsMessage` 按帧标签解码为类型化的
//!    `InboundEvent`。负载格式错误在此边界被捕获、记录并丢弃，永远不会
//!    传播到订阅方回调，也不会使客户端崩溃；未知标签同样记录后丢弃。
//! 2. **分发规划** (`plan_dispatch`): 纯函数，把一个事件和当前的注册表
//!    映射为一组待执行的回调调用。频道事件只投递给频道集合包含该频道的
//!    注册；服务端错误广播给所有注册；注册中缺失的回调槽位被直接跳过。
//!
//! 规划与执行分离，使得分发逻辑可以在没有任何传输层的情况下被单元测试，
//! 也保证了回调执行时不持有注册表锁。

use crate::callbacks::HandlerId;
use crate::subscription_registry::Registration;
use log::{debug, warn};
use realtime_models::ws_payloads::{
    ChannelAckPayload, ErrorPayload, MessageDeletePayload, MessageNewPayload,
    MessageUpdatePayload, PongPayload, ReadUpdatePayload, TypingUpdatePayload,
    ERROR_MESSAGE_TYPE, MESSAGE_DELETE_MESSAGE_TYPE, MESSAGE_NEW_MESSAGE_TYPE,
    MESSAGE_UPDATE_MESSAGE_TYPE, PONG_MESSAGE_TYPE, READ_UPDATE_MESSAGE_TYPE,
    SUBSCRIBED_ACK_MESSAGE_TYPE, SYSTEM_PONG_MESSAGE_TYPE, TYPING_UPDATE_MESSAGE_TYPE,
    UNSUBSCRIBED_ACK_MESSAGE_TYPE,
};
use realtime_ws_utils::message::WsMessage;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// 解码后的入站事件。
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// 频道内有新消息。
    MessageNew(MessageNewPayload),
    /// 频道内消息被更新。
    MessageUpdate(MessageUpdatePayload),
    /// 频道内消息被删除。
    MessageDelete(MessageDeletePayload),
    /// 频道内输入状态变化。
    TypingUpdate(TypingUpdatePayload),
    /// 频道内已读状态更新。
    ReadUpdate(ReadUpdatePayload),
    /// 心跳 Pong（内部消费，确认连接存活，无回调）。
    Pong(PongPayload),
    /// 服务端对订阅请求的确认（仅记录，注册表不据此调整簿记）。
    SubscribedAck(ChannelAckPayload),
    /// 服务端对退订请求的确认（仅记录）。
    UnsubscribedAck(ChannelAckPayload),
    /// 服务端错误通告（广播给所有注册，不按频道过滤）。
    ServerError(ErrorPayload),
}

/// 辅助函数：解析某个帧标签的负载，失败时记录警告并返回 `None`。
fn parse_payload<T: DeserializeOwned>(message: &WsMessage) -> Option<T> {
    match message.deserialize_payload::<T>() {
        Ok(payload) => Some(payload),
        Err(e) => {
            warn!(
                "[消息路由] 类型为 '{}' 的消息负载解析失败，该消息被丢弃: {}",
                message.message_type, e
            );
            None
        }
    }
}

/// 把入站 `WsMessage` 按帧标签解码为 `InboundEvent`。
///
/// 负载格式错误或标签未知时返回 `None`（已记录日志），调用方直接跳过该帧。
pub fn decode_frame(message: &WsMessage) -> Option<InboundEvent> {
    match message.message_type.as_str() {
        MESSAGE_NEW_MESSAGE_TYPE => parse_payload(message).map(InboundEvent::MessageNew),
        MESSAGE_UPDATE_MESSAGE_TYPE => parse_payload(message).map(InboundEvent::MessageUpdate),
        MESSAGE_DELETE_MESSAGE_TYPE => parse_payload(message).map(InboundEvent::MessageDelete),
        TYPING_UPDATE_MESSAGE_TYPE => parse_payload(message).map(InboundEvent::TypingUpdate),
        READ_UPDATE_MESSAGE_TYPE => parse_payload(message).map(InboundEvent::ReadUpdate),
        // 旧式 `pong` 帧不带负载，完整形式 `system:pong` 带时间戳，统一解码
        PONG_MESSAGE_TYPE | SYSTEM_PONG_MESSAGE_TYPE => {
            parse_payload(message).map(InboundEvent::Pong)
        }
        SUBSCRIBED_ACK_MESSAGE_TYPE => parse_payload(message).map(InboundEvent::SubscribedAck),
        UNSUBSCRIBED_ACK_MESSAGE_TYPE => parse_payload(message).map(InboundEvent::UnsubscribedAck),
        ERROR_MESSAGE_TYPE => parse_payload(message).map(InboundEvent::ServerError),
        unknown_type => {
            warn!(
                "[消息路由] 收到未知类型的 WebSocket 消息: '{}'，忽略此消息。负载: {}",
                unknown_type, message.payload
            );
            None
        }
    }
}

/// 一次待执行的回调调用。
pub type DispatchInvocation = Box<dyn FnOnce() + Send>;

/// 分发规划：把事件和注册表映射为待执行的回调调用列表。
///
/// 纯函数（除克隆回调句柄外不产生副作用）：
/// - 频道事件扇出给所有频道集合包含该频道的注册；
/// - `ServerError` 广播给所有注册；
/// - `Pong` 与订阅确认事件由状态机内部消费，这里返回空列表；
/// - 注册中缺失的回调槽位被跳过。
///
/// 返回的闭包在调用方释放注册表锁之后执行。
pub fn plan_dispatch(
    event: &InboundEvent,
    registrations: &HashMap<HandlerId, Registration>,
) -> Vec<DispatchInvocation> {
    let mut invocations: Vec<DispatchInvocation> = Vec::new();

    match event {
        InboundEvent::MessageNew(payload) => {
            for registration in channel_targets(registrations, &payload.channel) {
                if let Some(cb) = registration.callbacks.on_message_new.clone() {
                    let p = payload.clone();
                    invocations.push(Box::new(move || cb(&p.channel, &p.data)));
                }
            }
        }
        InboundEvent::MessageUpdate(payload) => {
            for registration in channel_targets(registrations, &payload.channel) {
                if let Some(cb) = registration.callbacks.on_message_update.clone() {
                    let p = payload.clone();
                    invocations.push(Box::new(move || cb(&p.channel, &p.message_id, &p.data)));
                }
            }
        }
        InboundEvent::MessageDelete(payload) => {
            for registration in channel_targets(registrations, &payload.channel) {
                if let Some(cb) = registration.callbacks.on_message_delete.clone() {
                    let p = payload.clone();
                    invocations.push(Box::new(move || cb(&p.channel, &p.message_id)));
                }
            }
        }
        InboundEvent::TypingUpdate(payload) => {
            for registration in channel_targets(registrations, &payload.channel) {
                if let Some(cb) = registration.callbacks.on_typing_update.clone() {
                    let p = payload.clone();
                    invocations.push(Box::new(move || {
                        cb(&p.channel, &p.user_id, &p.user_name, p.is_typing)
                    }));
                }
            }
        }
        InboundEvent::ReadUpdate(payload) => {
            for registration in channel_targets(registrations, &payload.channel) {
                if let Some(cb) = registration.callbacks.on_read_update.clone() {
                    let p = payload.clone();
                    invocations.push(Box::new(move || cb(&p.channel, &p.message_id, &p.user_id)));
                }
            }
        }
        InboundEvent::ServerError(payload) => {
            // 服务端错误广播给所有在册注册，不做频道过滤
            for registration in registrations.values() {
                if let Some(cb) = registration.callbacks.on_error.clone() {
                    let message = payload.message.clone();
                    invocations.push(Box::new(move || cb(&message)));
                }
            }
        }
        InboundEvent::Pong(_) | InboundEvent::SubscribedAck(_) | InboundEvent::UnsubscribedAck(_) => {
            // 状态机内部消费，这里没有可规划的回调
            debug!("[消息路由] 事件 {:?} 由状态机内部消费，无需分发", event);
        }
    }

    invocations
}

/// 频道事件的目标注册：频道集合包含 `channel` 的所有注册。
fn channel_targets<'a>(
    registrations: &'a HashMap<HandlerId, Registration>,
    channel: &'a str,
) -> impl Iterator<Item = &'a Registration> {
    registrations
        .values()
        .filter(move |r| r.channels.contains(channel))
}
