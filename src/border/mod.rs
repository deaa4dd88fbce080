//! # 加边处理模块（border）
//!
//! ## 设计思路
//!
//! 该模块将“上传校验 → 元数据读取 → 边框几何 → 画布合成 → 原格式编码”
//! 按职责拆分为多个子模块，各阶段之间只通过普通数据（`ImageMetadata`、`BorderPixels`）连接，
//! 每个阶段都可以单独测试。
//!
//! - `commands`：请求/响应适配（薄封装）
//! - `service`：承载可注入状态（`BorderServiceState`）与并发上限
//! - `handler`：编排整条处理流水线
//! - `loader`：负责字节/Base64/文件加载与体积校验
//! - `metadata`：负责格式识别、尺寸读取、解码限制与完整解码
//! - `geometry`：负责百分比解析与像素边框换算
//! - `compositor`：负责画布合成与按原格式编码
//! - `config/error/source`：配置、错误、中间数据模型
//!
//! ## 新同事快速上手
//!
//! 可以按下面顺序理解调用链：
//!
//! ```text
//! 宿主（HTTP / CLI）
//!    ↓
//! commands.rs（参数适配 + 错误载荷）
//!    ↓
//! service.rs（并发许可 + spawn_blocking）
//!    ↓
//! handler.rs（统一编排 + 阶段耗时日志）
//!    ├─ loader.rs（来源加载 + 体积校验）
//!    ├─ metadata.rs（格式 + 尺寸 + 解码限制）
//!    ├─ geometry.rs（百分比 → 像素）
//!    └─ compositor.rs（画布 + 编码）
//!    ↓
//! 返回 BorderedImage 或 BorderError
//! ```

pub mod commands;
pub mod compositor;
mod config;
mod error;
pub mod geometry;
mod handler;
pub mod loader;
pub mod metadata;
mod service;
mod source;

pub use commands::{ConvertErrorPayload, ConvertRequest, ConvertResponse};
pub use config::{
    BorderConfig, DEFAULT_BACKGROUND, DEFAULT_BORDER_PERCENT, DEFAULT_MAX_UPLOAD_BYTES,
    EncodeProfile, PercentParsePolicy,
};
pub use error::BorderError;
pub use handler::BorderHandler;
pub use service::BorderServiceState;
pub use source::{
    BorderPixels, BorderSpec, BorderedImage, ImageMetadata, ImageSource, ImageUpload,
    SupportedFormat,
};
