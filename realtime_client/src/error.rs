// realtime_client/src/error.rs

//! 定义实时通道客户端相关的错误类型。
//!
//! 客户端的公共接口在绝大多数失败场景下选择"记录日志后软失败"
//! (参见各方法文档)，因此 `ClientError` 主要用于内部传播以及
//! 宿主代码需要显式处理的少数场景（例如端点地址解析）。

use realtime_ws_utils::error::WsError;
use thiserror::Error;

/// 实时通道客户端的统一错误类型。
#[derive(Error, Debug)]
pub enum ClientError {
    /// 凭据提供者当前没有可用的访问令牌。
    #[error("缺少访问令牌")]
    MissingCredential,

    /// 端点地址无法解析为实时传输 URL。
    #[error("无效的端点地址: {0}")]
    InvalidEndpoint(String),

    /// 底层传输层错误。
    #[error("传输层错误: {0}")]
    Transport(#[from] WsError),
}
