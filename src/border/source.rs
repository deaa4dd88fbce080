//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”和“流水线中间结果”解耦，各阶段之间只通过普通数据连接：
//! - `ImageSource` 表示外部来源语义
//! - `ImageUpload` 表示已加载、已通过体积校验但未解码的字节
//! - `ImageMetadata` 表示从头信息读出的宽高与格式
//! - `BorderSpec` / `BorderPixels` 表示百分比与换算后的像素边框
//! - `BorderedImage` 表示最终编码结果

use base64::{Engine as _, engine::general_purpose};
use image::{ColorType, ImageFormat};

/// 图片输入来源。
pub enum ImageSource {
    /// 已在内存中的上传字节（例如 multipart 表单字段）。
    Bytes(Vec<u8>),
    /// Base64（支持 Data URL 与纯 Base64 字符串）。
    Base64(String),
    /// 本地文件路径来源。
    FilePath(String),
}

/// 加载阶段输出：原始编码字节与来源标识。
///
/// 构造时已保证体积不超过配置上限，之后不再修改。
#[derive(Debug)]
pub struct ImageUpload {
    bytes: Vec<u8>,
    source_hint: &'static str,
}

impl ImageUpload {
    pub(crate) fn new(bytes: Vec<u8>, source_hint: &'static str) -> Self {
        Self { bytes, source_hint }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// 来源提示（用于日志与诊断）。
    pub fn source_hint(&self) -> &'static str {
        self.source_hint
    }
}

/// 可读取且可重新编码的栅格格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupportedFormat {
    Png,
    Jpeg,
    Gif,
    WebP,
    Bmp,
    Tiff,
    Tga,
    Qoi,
}

impl SupportedFormat {
    /// 将 `image` 猜测出的格式映射为受支持格式；无法重新编码的格式返回 `None`。
    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Gif => Some(Self::Gif),
            ImageFormat::WebP => Some(Self::WebP),
            ImageFormat::Bmp => Some(Self::Bmp),
            ImageFormat::Tiff => Some(Self::Tiff),
            ImageFormat::Tga => Some(Self::Tga),
            ImageFormat::Qoi => Some(Self::Qoi),
            _ => None,
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Gif => ImageFormat::Gif,
            Self::WebP => ImageFormat::WebP,
            Self::Bmp => ImageFormat::Bmp,
            Self::Tiff => ImageFormat::Tiff,
            Self::Tga => ImageFormat::Tga,
            Self::Qoi => ImageFormat::Qoi,
        }
    }

    /// 响应头中的内容类型，与检测到的输入格式保持一致。
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::WebP => "image/webp",
            Self::Bmp => "image/bmp",
            Self::Tiff => "image/tiff",
            Self::Tga => "image/x-tga",
            Self::Qoi => "image/qoi",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
            Self::WebP => "webp",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
            Self::Tga => "tga",
            Self::Qoi => "qoi",
        }
    }

    /// 有损格式的重新编码会引入压缩误差。
    pub fn is_lossy(self) -> bool {
        matches!(self, Self::Jpeg)
    }
}

/// 解码阶段输出：宽高（均为正整数）、检测到的格式与解码后的像素布局。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    pub format: SupportedFormat,
    pub color: ColorType,
}

impl ImageMetadata {
    /// 解码后每像素占用的字节数（RGBA16 为 8，RGBA32F 为 16）。
    pub fn bytes_per_pixel(&self) -> u64 {
        self.color.bytes_per_pixel() as u64
    }
}

/// 两个方向独立的边框百分比（相对原图对应边长，不封顶 100）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderSpec {
    pub x_percent: f64,
    pub y_percent: f64,
}

impl BorderSpec {
    pub fn new(x_percent: f64, y_percent: f64) -> Self {
        Self { x_percent, y_percent }
    }
}

/// 换算后的像素边框：`horizontal` 加在左右两侧，`vertical` 加在上下两侧。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorderPixels {
    pub horizontal: u32,
    pub vertical: u32,
}

/// 最终输出：完整编码的图片字节与格式。
#[derive(Debug, Clone)]
pub struct BorderedImage {
    pub bytes: Vec<u8>,
    pub format: SupportedFormat,
    pub width: u32,
    pub height: u32,
}

impl BorderedImage {
    pub fn content_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// 输出为 Data URL，供无法直接消费二进制的客户端内联展示。
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.content_type(),
            general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}
