//! # 加载与校验模块
//!
//! ## 设计思路
//!
//! 统一处理不同来源（内存字节 / Base64 / 本地文件）的原始字节加载，
//! 并在“尽可能早”的阶段执行体积校验：超过上限的输入在任何解码尝试之前被拒绝。
//!
//! ## 实现思路
//!
//! - 内存字节：直接比较长度。
//! - Base64：先按长度估算解码后体积，再真正解码。
//! - 文件：存在性 + metadata 体积限制 + 读取。
//! - 最后做一次魔数签名探测：能识别且明确不是图片的内容直接拒绝。

use base64::{Engine as _, engine::general_purpose};
use std::path::Path;

use super::source::{ImageSource, ImageUpload};
use super::{BorderConfig, BorderError};

/// 按来源加载原始字节，返回已通过体积校验的上传对象。
pub fn load_source(source: ImageSource, config: &BorderConfig) -> Result<ImageUpload, BorderError> {
    match source {
        ImageSource::Bytes(bytes) => load_from_bytes(bytes, config),
        ImageSource::Base64(data) => load_from_base64(&data, config),
        ImageSource::FilePath(path) => load_from_file(&path, config),
    }
}

/// 从内存字节构建上传对象。
pub fn load_from_bytes(bytes: Vec<u8>, config: &BorderConfig) -> Result<ImageUpload, BorderError> {
    log::debug!("📥 接收上传字节 - 大小: {} bytes", bytes.len());

    ensure_within_upload_limit(bytes.len() as u64, config.max_upload_bytes, "上传内容")?;
    validate_image_signature(&bytes)?;

    Ok(ImageUpload::new(bytes, "upload"))
}

/// 从 Base64 字符串加载图片原始字节。
pub fn load_from_base64(data: &str, config: &BorderConfig) -> Result<ImageUpload, BorderError> {
    log::debug!("📝 开始处理 base64 图片");

    let bytes = parse_base64_with_limit(data, config.max_upload_bytes)?;
    ensure_within_upload_limit(bytes.len() as u64, config.max_upload_bytes, "Base64 解码后内容")?;
    validate_image_signature(&bytes)?;

    Ok(ImageUpload::new(bytes, "base64"))
}

/// 从本地路径加载图片原始字节。
pub fn load_from_file(path: &str, config: &BorderConfig) -> Result<ImageUpload, BorderError> {
    log::debug!("📁 开始读取本地图片 - 路径: {}", path);

    let file_path = Path::new(path);
    if !file_path.exists() {
        return Err(BorderError::FileSystem(format!("文件不存在：{}", path)));
    }

    let metadata = std::fs::metadata(file_path)
        .map_err(|e| BorderError::FileSystem(format!("无法读取文件信息：{}", e)))?;
    ensure_within_upload_limit(metadata.len(), config.max_upload_bytes, "文件")?;

    let bytes = std::fs::read(file_path)
        .map_err(|e| BorderError::FileSystem(format!("无法读取图片文件：{}", e)))?;
    ensure_within_upload_limit(bytes.len() as u64, config.max_upload_bytes, "文件")?;
    validate_image_signature(&bytes)?;

    Ok(ImageUpload::new(bytes, "file"))
}

fn ensure_within_upload_limit(len: u64, limit: u64, what: &str) -> Result<(), BorderError> {
    if len > limit {
        return Err(BorderError::Validation(format!(
            "{}过大：{:.2} MB（限制：{:.2} MB）",
            what,
            len as f64 / 1024.0 / 1024.0,
            limit as f64 / 1024.0 / 1024.0
        )));
    }
    Ok(())
}

fn estimate_base64_decoded_upper_bound_len(base64_data: &str) -> Result<u64, BorderError> {
    let len = base64_data.trim().len() as u64;
    let groups = len
        .checked_add(3)
        .ok_or_else(|| BorderError::Validation("Base64 输入长度溢出".to_string()))?
        / 4;

    groups
        .checked_mul(3)
        .ok_or_else(|| BorderError::Validation("Base64 解码体积估算溢出".to_string()))
}

fn parse_base64_with_limit(data: &str, max_upload_bytes: u64) -> Result<Vec<u8>, BorderError> {
    let normalized = data.trim();

    let payload = if normalized.starts_with("data:") {
        let base64_start = normalized
            .find(";base64,")
            .ok_or_else(|| BorderError::Decode("缺少 base64 标记".to_string()))?;
        &normalized[base64_start + 8..]
    } else {
        normalized
    };

    let estimated_len = estimate_base64_decoded_upper_bound_len(payload)?;
    // 估算值最多比真实值多 2 字节
    if estimated_len > max_upload_bytes.saturating_add(2) {
        return Err(BorderError::Validation(format!(
            "Base64 预计解码体积过大：{:.2} MB（限制：{:.2} MB）",
            estimated_len as f64 / 1024.0 / 1024.0,
            max_upload_bytes as f64 / 1024.0 / 1024.0
        )));
    }

    general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| BorderError::Decode(format!("Base64 解码失败：{}", e)))
}

/// 魔数签名探测。
///
/// `infer` 不认识的签名（如 TGA）交给解码阶段判断；能识别但不是图片的直接拒绝。
fn validate_image_signature(bytes: &[u8]) -> Result<(), BorderError> {
    if bytes.is_empty() {
        return Err(BorderError::Decode("图片内容为空".to_string()));
    }

    if let Some(kind) = infer::get(bytes) {
        if kind.matcher_type() != infer::MatcherType::Image {
            return Err(BorderError::Decode(format!(
                "文件签名不是图片类型：{}",
                kind.mime_type()
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};
    use std::io::Cursor;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn create_png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 0, 255]));
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut cursor, ImageFormat::Png)
            .expect("failed to encode test image");
        cursor.into_inner()
    }

    fn unique_temp_dir() -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock error")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("image-border-loader-test-{nanos}"));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn oversized_upload_is_validation_error() {
        let mut config = BorderConfig::default();
        config.max_upload_bytes = 16;

        // 超限内容本身不是图片，校验必须先于签名与解码
        let result = load_from_bytes(vec![0u8; 17], &config);
        assert!(matches!(result, Err(BorderError::Validation(_))));
    }

    #[test]
    fn upload_exactly_at_limit_is_accepted() {
        let png = create_png_bytes(4, 4);
        let mut config = BorderConfig::default();
        config.max_upload_bytes = png.len() as u64;

        let upload = load_from_bytes(png, &config).expect("upload at limit should pass");
        assert_eq!(upload.source_hint(), "upload");
    }

    #[test]
    fn empty_upload_is_decode_error() {
        let result = load_from_bytes(Vec::new(), &BorderConfig::default());
        assert!(matches!(result, Err(BorderError::Decode(_))));
    }

    #[test]
    fn non_image_signature_is_rejected() {
        let pdf = b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n1 0 obj".to_vec();
        let result = load_from_bytes(pdf, &BorderConfig::default());
        assert!(matches!(result, Err(BorderError::Decode(_))));
    }

    #[test]
    fn base64_data_url_is_decoded() {
        let png = create_png_bytes(3, 2);
        let data_url = format!("data:image/png;base64,{}", general_purpose::STANDARD.encode(&png));

        let upload = load_from_base64(&data_url, &BorderConfig::default()).expect("data url should load");
        assert_eq!(upload.bytes(), png.as_slice());
        assert_eq!(upload.source_hint(), "base64");
    }

    #[test]
    fn base64_rejects_large_payload_before_decode() {
        let huge = "A".repeat(1024 * 1024);
        let result = parse_base64_with_limit(&huge, 32);

        assert!(matches!(result, Err(BorderError::Validation(_))));
    }

    #[test]
    fn base64_rejects_garbage() {
        let result = load_from_base64("not base64 at all!", &BorderConfig::default());
        assert!(matches!(result, Err(BorderError::Decode(_))));
    }

    #[test]
    fn file_source_checks_existence_and_size() {
        let dir = unique_temp_dir();
        let missing = dir.join("missing.png");
        let result = load_from_file(&missing.to_string_lossy(), &BorderConfig::default());
        assert!(matches!(result, Err(BorderError::FileSystem(_))));

        let path = dir.join("small.png");
        std::fs::write(&path, create_png_bytes(5, 5)).expect("write png");

        let upload = load_source(
            ImageSource::FilePath(path.to_string_lossy().to_string()),
            &BorderConfig::default(),
        )
        .expect("file should load");
        assert_eq!(upload.source_hint(), "file");

        let mut config = BorderConfig::default();
        config.max_upload_bytes = 8;
        let result = load_from_file(&path.to_string_lossy(), &config);
        assert!(matches!(result, Err(BorderError::Validation(_))));

        let _ = std::fs::remove_dir_all(dir);
    }
}
