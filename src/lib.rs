//! # 图片加边工具 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │              宿主 (HTTP 表单 / 命令行)                    │
//! │   image 文件字段 + 可选 x / y 百分比                      │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↕ ConvertRequest / ConvertResponse / ConvertErrorPayload
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕            核心 (Rust)                           │
//! │                                                          │
//! │  ┌─ error ────── AppError (应用级统一错误类型)             │
//! │  │                                                       │
//! │  ├─ settings ─── JSON 设置文件 → BorderConfig            │
//! │  │                                                       │
//! │  └─ border ───── 加边流水线                               │
//! │      ├─ loader      上传/Base64/文件 + 体积校验           │
//! │      ├─ metadata    格式识别 + 尺寸 + 解码                │
//! │      ├─ geometry    百分比 → 像素边框                     │
//! │      └─ compositor  画布合成 + 原格式编码                 │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，命令行入口与设置加载的返回类型 |
//! | [`settings`] | 读取可选的 JSON 设置文件并生成 `BorderConfig` |
//! | [`border`] | 校验上传、读取尺寸、计算边框、合成画布并按原格式编码 |

pub mod border;
pub mod error;
pub mod settings;
