// realtime_client/src/auth.rs

//! 凭据与端点提供者协作接口。
//!
//! 实时通道客户端自身不实现认证：它从注入的 `AccessTokenProvider` 取得
//! 持有者令牌，没有令牌时连接请求安静地失败（fail closed，仅记录警告）。
//! 端点地址同样由协作者提供，客户端负责把 REST 方案 (`http`/`https`)
//! 翻译为实时传输方案 (`ws`/`wss`) 并把令牌嵌入查询参数。

use crate::error::ClientError;
use url::Url;

/// 访问令牌提供者。
///
/// 由宿主（编辑器插件的登录/会话模块）实现并注入。
pub trait AccessTokenProvider: Send + Sync {
    /// 返回当前可用的访问令牌；没有可用凭据时返回 `None`。
    fn access_token(&self) -> Option<String>;
}

/// 实时端点提供者。
///
/// 返回实时通道服务的基础地址（REST 方案，
/// 例如 `"https://learn.example.com/realtime"`）。
pub trait EndpointProvider: Send + Sync {
    /// 返回实时端点的基础地址字符串。
    fn base_url(&self) -> String;
}

/// 把基础地址解析为带令牌的实时传输 URL。
///
/// 方案翻译规则：`http` → `ws`，`https` → `wss`；已经是 `ws`/`wss` 的地址保持不变。
/// 令牌以 `token` 查询参数的形式附加在 URL 末尾。
///
/// # 参数
/// * `base_url` - 端点提供者给出的基础地址。
/// * `token` - 凭据提供者给出的访问令牌。
///
/// # 返回
/// * `Result<String, ClientError>` - 成功时返回完整的实时传输 URL；
///   地址无法解析或方案不受支持时返回 `ClientError::InvalidEndpoint`。
pub fn resolve_realtime_url(base_url: &str, token: &str) -> Result<String, ClientError> {
    let parsed = Url::parse(base_url)
        .map_err(|e| ClientError::InvalidEndpoint(format!("'{}' 解析失败: {}", base_url, e)))?;

    let realtime_scheme = match parsed.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(ClientError::InvalidEndpoint(format!(
                "不支持的端点方案 '{}' (地址: '{}')",
                other, base_url
            )))
        }
    };

    // url crate 对特殊方案之间的原地转换有限制，这里直接重组字符串再解析一次
    let rest = base_url
        .split_once("://")
        .map(|(_, rest)| rest)
        .ok_or_else(|| ClientError::InvalidEndpoint(format!("'{}' 缺少方案分隔符", base_url)))?;
    let mut realtime_url = Url::parse(&format!("{}://{}", realtime_scheme, rest))
        .map_err(|e| ClientError::InvalidEndpoint(format!("重组实时地址失败: {}", e)))?;

    realtime_url.query_pairs_mut().append_pair("token", token);
    Ok(realtime_url.to_string())
}
