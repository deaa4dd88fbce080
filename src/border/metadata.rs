//! # 解码与元数据模块
//!
//! ## 设计思路
//!
//! 将“字节 → 元数据 → 像素”的过程集中管理，并在关键节点增加资源上限控制。
//! 优先只读 header 获取宽高与格式，再进行完整解码，降低恶意输入触发高内存开销的风险。
//!
//! ## 实现思路
//!
//! 1. 猜测格式并读取 header 尺寸
//! 2. 确认格式可被重新编码
//! 3. 按像素上限与内存估算快速拒绝
//! 4. 按已确认的格式完整解码，并核对尺寸一致

use image::{DynamicImage, GenericImageView, ImageDecoder, ImageFormat, ImageReader};
use std::io::Cursor;

use super::source::{ImageMetadata, ImageUpload, SupportedFormat};
use super::{BorderConfig, BorderError};

/// 仅通过内存中的图片头信息读取宽高、格式与像素布局。
///
/// 纯函数：不修改上传内容，也没有任何外部 I/O。
pub fn read_metadata(upload: &ImageUpload) -> Result<ImageMetadata, BorderError> {
    if upload.is_empty() {
        return Err(BorderError::Decode("图片内容为空".to_string()));
    }

    let reader = ImageReader::new(Cursor::new(upload.bytes()))
        .with_guessed_format()
        .map_err(|e| BorderError::Decode(format!("无法识别图片格式：{}", e)))?;

    // TGA 没有魔数，猜测失败时按 TGA 再读一次 header
    let detected = match reader.format() {
        Some(format) => format,
        None if may_be_tga(upload.bytes()) => ImageFormat::Tga,
        None => return Err(BorderError::Decode("无法识别图片格式".to_string())),
    };
    let format = SupportedFormat::from_image_format(detected).ok_or_else(|| {
        BorderError::Decode(format!("不支持的图片格式：{:?}", detected))
    })?;

    let decoder = ImageReader::with_format(Cursor::new(upload.bytes()), detected)
        .into_decoder()
        .map_err(|e| match format {
            SupportedFormat::Tga => BorderError::Decode(format!("无法识别图片格式：{}", e)),
            _ => BorderError::Decode(format!("无法读取图片头信息：{}", e)),
        })?;
    let (width, height) = decoder.dimensions();
    let color = decoder.color_type();

    if width == 0 || height == 0 {
        return Err(BorderError::Decode(format!("图片尺寸无效：{}x{}", width, height)));
    }

    Ok(ImageMetadata { width, height, format, color })
}

fn may_be_tga(bytes: &[u8]) -> bool {
    infer::get(bytes).is_none_or(|kind| kind.matcher_type() == infer::MatcherType::Image)
}

/// 校验像素数量与解码内存估算是否超过配置上限。
///
/// 内存按解码后的像素布局估算：`width * height * bytes_per_pixel`。
pub fn validate_decode_limits(
    metadata: &ImageMetadata,
    config: &BorderConfig,
) -> Result<(), BorderError> {
    let pixels = (metadata.width as u64)
        .checked_mul(metadata.height as u64)
        .ok_or_else(|| BorderError::ResourceLimit("图片像素数溢出".to_string()))?;

    if pixels > config.max_decoded_pixels {
        return Err(BorderError::ResourceLimit(format!(
            "图片像素过大：{} 像素（限制：{} 像素）",
            pixels, config.max_decoded_pixels
        )));
    }

    let estimated = pixels
        .checked_mul(metadata.bytes_per_pixel())
        .ok_or_else(|| BorderError::ResourceLimit("图片解码内存估算溢出".to_string()))?;

    if estimated > config.max_decoded_bytes {
        return Err(BorderError::ResourceLimit(format!(
            "图片解码预计内存过大：{:.2} MB（{:?}，限制：{:.2} MB）",
            estimated as f64 / 1024.0 / 1024.0,
            metadata.color,
            config.max_decoded_bytes as f64 / 1024.0 / 1024.0
        )));
    }

    Ok(())
}

/// 按已检测的格式完整解码。
///
/// 多帧格式只取第一帧。
pub fn decode_image(
    upload: &ImageUpload,
    metadata: &ImageMetadata,
) -> Result<DynamicImage, BorderError> {
    let decoded = image::load_from_memory_with_format(upload.bytes(), metadata.format.image_format())
        .map_err(|e| BorderError::Decode(format!("图片解码失败：{}", e)))?;

    let (width, height) = decoded.dimensions();
    if (width, height) != (metadata.width, metadata.height) {
        return Err(BorderError::Decode(format!(
            "解码尺寸与头信息不一致：{}x{}（头信息：{}x{}）",
            width, height, metadata.width, metadata.height
        )));
    }

    Ok(decoded)
}
