//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义应用级统一的 `AppError` 枚举，替代命令行入口与设置加载中分散的
//! `.map_err(|e| e.to_string())`、`format!(...)`、`expect()` 等不一致模式。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `BorderError` 与 `std::io::Error` 提供 `From` 转换，无需手动 map。
//! - 实现 `Serialize` 将错误序列化为字符串，便于宿主直接输出 JSON。

use serde::Serialize;

use crate::border::BorderError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 加边流水线错误（校验 / 解码 / 编码）
    #[error("{0}")]
    Border(#[from] BorderError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 设置文件解析或取值错误
    #[error("设置错误: {0}")]
    Settings(String),

    /// 批处理中有文件失败
    #[error("批处理失败: {failed} / {total} 个文件处理失败")]
    Batch { failed: usize, total: usize },

    /// 命令行参数错误
    #[error("参数错误: {0}")]
    Usage(String),
}

impl AppError {
    /// 进程退出码：参数错误为 2，其余为 1。
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => 2,
            _ => 1,
        }
    }
}

/// 将错误序列化为人类可读的字符串。
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
