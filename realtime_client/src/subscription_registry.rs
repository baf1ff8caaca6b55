// realtime_client/src/subscription_registry.rs

//! 频道订阅注册表。
//!
//! 注册表维护两份簿记：
//! - `registrations`: 以 `HandlerId` 为键的订阅注册（频道集合 + 回调束）。
//! - `channel_refs`: 频道到"请求该频道的注册数"的引用计数映射。
//!
//! 引用计数是订阅/退订帧最小化的依据：只有当某频道的计数从 0 变为 1 时
//! 才需要向服务端订阅它；只有当计数回落到 0 时才需要退订。
//! 由此保证不变量：在连接状态下稳定后，服务端可见的订阅集合等于
//! 所有在册注册的频道集合之并集——不多也不少。
//!
//! 注册表只做本地簿记与增量计算，从不直接触碰连接状态或发送帧；
//! 帧的发送时机由客户端服务决定（未连接时增量被丢弃，下次连接时
//! 统一重发完整集合）。

use crate::callbacks::{ChannelEventCallbacks, HandlerId};
use log::debug;
use std::collections::{HashMap, HashSet};

/// 一个订阅方的注册记录：请求的频道集合与回调束。
#[derive(Debug, Clone)]
pub struct Registration {
    /// 该订阅方请求的频道集合。
    pub channels: HashSet<String>,
    /// 该订阅方的回调束。
    pub callbacks: ChannelEventCallbacks,
}

/// 一次注册变更产生的服务端可见增量。
///
/// 两个列表都已排序，便于测试断言与日志输出的确定性。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionDelta {
    /// 引用计数从 0 变为 1、需要向服务端订阅的频道。
    pub to_subscribe: Vec<String>,
    /// 引用计数回落到 0、需要向服务端退订的频道。
    pub to_unsubscribe: Vec<String>,
}

impl SubscriptionDelta {
    /// 增量是否为空（无需发送任何帧）。
    pub fn is_empty(&self) -> bool {
        self.to_subscribe.is_empty() && self.to_unsubscribe.is_empty()
    }
}

/// 频道订阅注册表。
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    registrations: HashMap<HandlerId, Registration>,
    channel_refs: HashMap<String, usize>,
}

impl SubscriptionRegistry {
    /// 创建一个空的注册表。
    pub fn new() -> Self {
        Self::default()
    }

    /// 存储（或覆盖）`handler_id` 的注册，并返回服务端可见的订阅增量。
    ///
    /// 覆盖语义：同名处理器的既有注册会先被整体移除（其旧频道按退订处理），
    /// 再写入新的频道集合与回调束。新旧集合中同时出现的频道相互抵消，
    /// 不会产生多余的退订再订阅。
    pub fn register(
        &mut self,
        handler_id: HandlerId,
        channels: Vec<String>,
        callbacks: ChannelEventCallbacks,
    ) -> SubscriptionDelta {
        // 覆盖：先释放旧注册占用的频道引用
        let mut to_unsubscribe = match self.registrations.remove(&handler_id) {
            Some(old) => self.release_channels(&old.channels),
            None => Vec::new(),
        };

        let channel_set: HashSet<String> = channels.into_iter().collect();
        let mut to_subscribe = Vec::new();
        for channel in &channel_set {
            let count = self.channel_refs.entry(channel.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                to_subscribe.push(channel.clone());
            }
        }

        // 新旧集合的交集在两个方向上相互抵消
        let overlap: HashSet<String> = to_subscribe
            .iter()
            .filter(|c| to_unsubscribe.contains(c))
            .cloned()
            .collect();
        to_subscribe.retain(|c| !overlap.contains(c));
        to_unsubscribe.retain(|c| !overlap.contains(c));

        to_subscribe.sort();
        to_unsubscribe.sort();

        debug!(
            "[订阅注册表] 处理器 '{}' 注册 {} 个频道，新增订阅 {:?}，释放订阅 {:?}",
            handler_id,
            channel_set.len(),
            to_subscribe,
            to_unsubscribe
        );

        self.registrations.insert(
            handler_id,
            Registration {
                channels: channel_set,
                callbacks,
            },
        );

        SubscriptionDelta {
            to_subscribe,
            to_unsubscribe,
        }
    }

    /// 整体移除 `handler_id` 的注册，返回因此需要向服务端退订的频道列表。
    ///
    /// 与来源行为一致：退订移除的是整个注册，而不是其中列出的部分频道；
    /// 但退订帧只包含引用计数真正回落到 0 的频道，其他在册处理器仍然
    /// 需要的频道不会被退订。
    pub fn unregister(&mut self, handler_id: &HandlerId) -> Vec<String> {
        match self.registrations.remove(handler_id) {
            Some(old) => {
                let mut released = self.release_channels(&old.channels);
                released.sort();
                debug!(
                    "[订阅注册表] 处理器 '{}' 已移除，释放订阅 {:?}",
                    handler_id, released
                );
                released
            }
            None => {
                debug!("[订阅注册表] 处理器 '{}' 不存在，移除请求被忽略", handler_id);
                Vec::new()
            }
        }
    }

    /// 递减一组频道的引用计数，返回计数回落到 0 的频道。
    fn release_channels(&mut self, channels: &HashSet<String>) -> Vec<String> {
        let mut zeroed = Vec::new();
        for channel in channels {
            if let Some(count) = self.channel_refs.get_mut(channel) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    self.channel_refs.remove(channel);
                    zeroed.push(channel.clone());
                }
            }
        }
        zeroed
    }

    /// 有效订阅集合：所有在册注册的频道之并集（已排序）。
    ///
    /// 每次（重新）连接成功时，此集合会作为单个订阅帧整体下发，
    /// 服务端状态假定在每个新连接上重置。
    pub fn effective_channels(&self) -> Vec<String> {
        let mut channels: Vec<String> = self.channel_refs.keys().cloned().collect();
        channels.sort();
        channels
    }

    /// 某频道当前的引用计数（不存在时为 0）。
    pub fn channel_ref_count(&self, channel: &str) -> usize {
        self.channel_refs.get(channel).copied().unwrap_or(0)
    }

    /// 所有在册注册（供分发器只读遍历）。
    pub fn registrations(&self) -> &HashMap<HandlerId, Registration> {
        &self.registrations
    }

    /// 在册注册的数量。
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// 注册表是否为空。
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// 清空全部注册与引用计数（客户端释放时调用）。
    pub fn clear(&mut self) {
        self.registrations.clear();
        self.channel_refs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reg(registry: &mut SubscriptionRegistry, id: &str, channels: &[&str]) -> SubscriptionDelta {
        registry.register(
            HandlerId::from(id),
            channels.iter().map(|c| c.to_string()).collect(),
            ChannelEventCallbacks::default(),
        )
    }

    #[test]
    /// 测试首次注册时所有频道都出现在订阅增量里。
    fn test_first_registration_subscribes_all() {
        let mut registry = SubscriptionRegistry::new();
        let delta = reg(&mut registry, "h1", &["course:1", "course:2"]);
        assert_eq!(delta.to_subscribe, vec!["course:1", "course:2"]);
        assert!(delta.to_unsubscribe.is_empty());
        assert_eq!(registry.effective_channels(), vec!["course:1", "course:2"]);
    }

    #[test]
    /// 测试已被其他处理器订阅的频道不会重复出现在订阅增量里。
    fn test_shared_channel_not_resubscribed() {
        let mut registry = SubscriptionRegistry::new();
        reg(&mut registry, "h1", &["course:1", "course:2"]);
        let delta = reg(&mut registry, "h2", &["course:2", "course:3"]);
        assert_eq!(delta.to_subscribe, vec!["course:3"], "course:2 已被 h1 订阅，不应重复下发");
        assert_eq!(registry.channel_ref_count("course:2"), 2);
    }

    #[test]
    /// 测试退订只释放引用计数回落到 0 的频道：
    /// 其他在册处理器仍然需要的频道必须保留。
    fn test_unregister_keeps_channels_wanted_by_others() {
        let mut registry = SubscriptionRegistry::new();
        reg(&mut registry, "h1", &["course:1", "course:2"]);
        reg(&mut registry, "h2", &["course:2", "course:3"]);

        let released = registry.unregister(&HandlerId::from("h2"));
        assert_eq!(released, vec!["course:3"], "course:2 仍被 h1 需要，不应退订");
        assert_eq!(registry.effective_channels(), vec!["course:1", "course:2"]);
    }

    #[test]
    /// 不变量：任意一串注册/移除操作后，有效订阅集合恒等于
    /// 所有在册注册的频道之并集。
    fn test_effective_set_equals_union_invariant() {
        let mut registry = SubscriptionRegistry::new();
        reg(&mut registry, "a", &["course:1", "course:2"]);
        reg(&mut registry, "b", &["course:2", "course:3"]);
        reg(&mut registry, "c", &["assignment:9"]);
        registry.unregister(&HandlerId::from("a"));
        reg(&mut registry, "b", &["course:3"]); // 覆盖 b，缩小其频道集合
        registry.unregister(&HandlerId::from("missing")); // 不存在的处理器

        let mut union: Vec<String> = registry
            .registrations()
            .values()
            .flat_map(|r| r.channels.iter().cloned())
            .collect::<HashSet<String>>()
            .into_iter()
            .collect();
        union.sort();
        assert_eq!(registry.effective_channels(), union);
        assert_eq!(union, vec!["assignment:9", "course:3"]);
    }

    #[test]
    /// 测试覆盖注册：旧频道被释放、新频道被订阅，交集不产生任何帧。
    fn test_overwrite_registration_delta() {
        let mut registry = SubscriptionRegistry::new();
        reg(&mut registry, "h1", &["course:1", "course:2"]);
        let delta = reg(&mut registry, "h1", &["course:2", "course:3"]);
        assert_eq!(delta.to_subscribe, vec!["course:3"]);
        assert_eq!(delta.to_unsubscribe, vec!["course:1"]);
        assert_eq!(registry.channel_ref_count("course:2"), 1, "交集频道的计数不应变化");
    }

    #[test]
    /// 测试移除最后一个处理器后注册表与引用计数彻底归零。
    fn test_unregister_last_handler_empties_registry() {
        let mut registry = SubscriptionRegistry::new();
        reg(&mut registry, "h1", &["course:1"]);
        let released = registry.unregister(&HandlerId::from("h1"));
        assert_eq!(released, vec!["course:1"]);
        assert!(registry.is_empty());
        assert!(registry.effective_channels().is_empty());
        assert_eq!(registry.channel_ref_count("course:1"), 0);
    }

    #[test]
    /// 测试 `clear` 清空所有簿记。
    fn test_clear() {
        let mut registry = SubscriptionRegistry::new();
        reg(&mut registry, "h1", &["course:1"]);
        reg(&mut registry, "h2", &["course:2"]);
        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.effective_channels().is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    /// 测试同一处理器重复请求同一频道（注册内重复项）只计一次引用。
    fn test_duplicate_channels_in_one_registration_counted_once() {
        let mut registry = SubscriptionRegistry::new();
        let delta = reg(&mut registry, "h1", &["course:1", "course:1"]);
        assert_eq!(delta.to_subscribe, vec!["course:1"]);
        assert_eq!(registry.channel_ref_count("course:1"), 1);
    }
}
