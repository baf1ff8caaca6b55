// realtime_models/src/channel.rs

//! 频道标识字符串工具。
//!
//! 频道 (Channel) 是服务端主题的非透明字符串标识，形式为 `"{scope}:{id}"`
//! (例如 `course:123`、`assignment:42`)。客户端不维护合法频道的静态枚举，
//! 只负责原样转发调用方请求的主题字符串，因此这里仅提供构造辅助函数，
//! 不做任何校验或解析。

/// 构造 `"{scope}:{id}"` 形式的频道标识字符串。
///
/// 纯函数，不做任何合法性检查；`scope` 与 `id` 的含义完全由服务端协议约定
/// (例如 `build_channel("course", "123")` 产生 `"course:123"`)。
///
/// # 参数
/// * `scope` - 频道的作用域前缀，例如 `"course"`。
/// * `id` - 作用域内的标识，例如课程编号。
///
/// # 返回
/// 拼接后的频道标识字符串。
pub fn build_channel(scope: &str, id: &str) -> String {
    format!("{}:{}", scope, id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// 测试 `build_channel` 是否按 `"{scope}:{id}"` 格式拼接。
    fn test_build_channel_format() {
        assert_eq!(build_channel("course", "123"), "course:123");
        assert_eq!(build_channel("assignment", "42"), "assignment:42");
    }

    #[test]
    /// 测试空的 scope 或 id 也会被原样拼接（频道字符串是非透明的，不做校验）。
    fn test_build_channel_no_validation() {
        assert_eq!(build_channel("", "1"), ":1");
        assert_eq!(build_channel("course", ""), "course:");
    }
}
