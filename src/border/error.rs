//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载加边流水线中的所有错误来源，避免字符串拼接式错误处理。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! ## 实现思路
//!
//! - `code()`：稳定的机器可读错误码，供边界层序列化。
//! - `stage()`：失败所在阶段，便于日志定位。
//! - `status()`：映射为 HTTP 风格状态码（客户端错误 4xx / 服务端错误 5xx）。

/// 加边处理统一错误类型。
///
/// 所有错误对产生它的请求都是终结性的：要么返回完整图片，要么返回错误，不会两者兼有。
#[derive(Debug, thiserror::Error)]
pub enum BorderError {
    /// 缺少上传、上传超过体积上限、百分比参数非法。
    #[error("参数校验失败：{0}")]
    Validation(String),

    /// 字节内容不是可识别或完整的图片。
    #[error("解码错误：{0}")]
    Decode(String),

    /// 合成画布或重新编码失败。
    #[error("编码错误：{0}")]
    Encode(String),

    /// 解码后像素数或内存估算超过上限。
    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    /// 锁中毒、后台任务异常退出等内部故障。
    #[error("内部错误：{0}")]
    Internal(String),
}

impl BorderError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E_VALIDATION",
            Self::Decode(_) => "E_DECODE",
            Self::Encode(_) => "E_ENCODE",
            Self::ResourceLimit(_) => "E_RESOURCE_LIMIT",
            Self::FileSystem(_) => "E_FILE_SYSTEM",
            Self::Internal(_) => "E_INTERNAL",
        }
    }

    pub fn stage(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validate",
            Self::FileSystem(_) => "ingest",
            Self::Decode(_) | Self::ResourceLimit(_) => "decode",
            Self::Encode(_) => "encode",
            Self::Internal(_) => "service",
        }
    }

    /// HTTP 风格状态码。
    ///
    /// 校验与解码错误属于客户端错误，编码与内部错误属于服务端错误。
    pub fn status(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::Decode(_) => 400,
            Self::ResourceLimit(_) => 413,
            Self::FileSystem(_) => 404,
            Self::Encode(_) | Self::Internal(_) => 500,
        }
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status())
    }
}

impl From<BorderError> for String {
    /// 兼容部分仍使用字符串错误的调用点。
    fn from(error: BorderError) -> Self {
        error.to_string()
    }
}
