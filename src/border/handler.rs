//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `BorderHandler` 只负责流程编排与配置管理，不绑定任何传输层。
//! 处理链路固定且严格线性：
//! 1. 读取配置快照
//! 2. 按来源加载原始字节（体积校验先于解码）
//! 3. 读取元数据并做解码限制检查
//! 4. 计算像素边框
//! 5. 完整解码、合成画布、按原格式编码
//!
//! 任一阶段失败立即中止后续阶段，不会带着部分结果继续。
//!
//! ## 实现思路
//!
//! - 配置作为显式值在构造时传入，通过 `Arc<RwLock<BorderConfig>>` 支持运行时切换编码档位。
//! - 单次请求内使用“同一配置快照”，避免处理中途配置漂移。
//! - 记录 `load/decode/geometry/composite/total` 阶段耗时，便于性能诊断。

use std::sync::{Arc, RwLock};
use std::time::Instant;

use super::source::{BorderSpec, BorderedImage, ImageSource};
use super::{BorderConfig, BorderError, EncodeProfile, compositor, geometry, loader, metadata};

/// 加边处理器。
///
/// 不持有任何跨请求的可变数据，多个请求可并行调用同一实例。
pub struct BorderHandler {
    pub(super) config: Arc<RwLock<BorderConfig>>,
}

impl BorderHandler {
    /// 根据初始配置创建处理器。
    ///
    /// # 示例
    /// ```rust
    /// use image_border::border::{BorderConfig, BorderHandler};
    ///
    /// let handler = BorderHandler::new(BorderConfig::default())?;
    /// # Ok::<(), image_border::border::BorderError>(())
    /// ```
    pub fn new(config: BorderConfig) -> Result<Self, BorderError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(RwLock::new(config)),
        })
    }

    /// 获取配置快照。
    ///
    /// 作用：保证单次请求链路使用一致参数。
    pub fn config_snapshot(&self) -> Result<BorderConfig, BorderError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| BorderError::Internal("配置读取锁已中毒".to_string()))
    }

    /// 设置编码档位。
    pub fn set_encode_profile(&self, profile: EncodeProfile) -> Result<(), BorderError> {
        let mut config = self
            .config
            .write()
            .map_err(|_| BorderError::Internal("配置写入锁已中毒".to_string()))?;
        config.apply_encode_profile(profile);

        log::info!(
            "⚙️ 已切换编码档位：{:?}（jpeg_quality={}, png_compression={:?}）",
            profile,
            config.jpeg_quality,
            config.png_compression
        );

        Ok(())
    }

    /// 获取当前生效档位。
    pub fn get_encode_profile(&self) -> Result<EncodeProfile, BorderError> {
        let config = self
            .config
            .read()
            .map_err(|_| BorderError::Internal("配置读取锁已中毒".to_string()))?;
        Ok(config.infer_encode_profile())
    }

    /// 处理主入口：加载任意来源的图片并按原始参数字符串加边。
    ///
    /// 百分比参数的缺省与非法值处理取决于配置中的解析策略。
    pub fn process_with_params(
        &self,
        source: ImageSource,
        x: Option<&str>,
        y: Option<&str>,
    ) -> Result<BorderedImage, BorderError> {
        let config = self.config_snapshot()?;
        let spec = geometry::border_spec_from_params(x, y, &config)?;
        self.run(source, &spec, &config)
    }

    /// 使用已解析的百分比加边。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use image_border::border::{BorderConfig, BorderHandler, BorderSpec, ImageSource};
    ///
    /// let handler = BorderHandler::new(BorderConfig::default())?;
    /// let output = handler.process(
    ///     ImageSource::FilePath("/tmp/photo.png".into()),
    ///     &BorderSpec::new(10.0, 20.0),
    /// )?;
    /// println!("{} bytes of {}", output.bytes.len(), output.content_type());
    /// # Ok::<(), image_border::border::BorderError>(())
    /// ```
    pub fn process(
        &self,
        source: ImageSource,
        spec: &BorderSpec,
    ) -> Result<BorderedImage, BorderError> {
        let config = self.config_snapshot()?;
        self.run(source, spec, &config)
    }

    fn run(
        &self,
        source: ImageSource,
        spec: &BorderSpec,
        config: &BorderConfig,
    ) -> Result<BorderedImage, BorderError> {
        let total_start = Instant::now();

        let load_start = Instant::now();
        let upload = loader::load_source(source, config)?;
        let load_elapsed = load_start.elapsed();

        let decode_start = Instant::now();
        let meta = metadata::read_metadata(&upload)?;
        metadata::validate_decode_limits(&meta, config)?;
        let decode_header_elapsed = decode_start.elapsed();

        let geometry_start = Instant::now();
        let pixels = geometry::compute_border_pixels(&meta, spec)?;
        compositor::canvas_dimensions(meta.width, meta.height, meta.bytes_per_pixel(), pixels, config)?;
        let geometry_elapsed = geometry_start.elapsed();

        let decode_start = Instant::now();
        let decoded = metadata::decode_image(&upload, &meta)?;
        let decode_elapsed = decode_header_elapsed + decode_start.elapsed();

        let composite_start = Instant::now();
        let output = compositor::composite_and_encode(&decoded, &meta, pixels, config)?;
        let composite_elapsed = composite_start.elapsed();

        log::info!(
            "✅ 加边完成 - 来源: {} 格式: {:?} 原始尺寸: {}x{} 边框: {}/{} 输出尺寸: {}x{} 输出大小: {}KB",
            upload.source_hint(),
            meta.format,
            meta.width,
            meta.height,
            pixels.horizontal,
            pixels.vertical,
            output.width,
            output.height,
            output.bytes.len() / 1024
        );
        log::info!(
            "⏱️ 阶段耗时 - load={}ms decode={}ms geometry={}ms composite={}ms total={}ms",
            load_elapsed.as_millis(),
            decode_elapsed.as_millis(),
            geometry_elapsed.as_millis(),
            composite_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::border::SupportedFormat;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};
    use std::io::Cursor;

    fn create_png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            let r = (x % 255) as u8;
            let g = (y % 255) as u8;
            let b = ((x + y) % 255) as u8;
            Rgba([r, g, b, 255])
        });

        let dyn_img = DynamicImage::ImageRgba8(img);
        let mut cursor = Cursor::new(Vec::new());
        dyn_img
            .write_to(&mut cursor, ImageFormat::Png)
            .expect("failed to encode test image");
        cursor.into_inner()
    }

    #[test]
    fn default_params_on_200x100_yield_240x120() {
        let handler = BorderHandler::new(BorderConfig::default()).expect("handler init failed");

        let output = handler
            .process_with_params(ImageSource::Bytes(create_png_bytes(200, 100)), None, None)
            .expect("pipeline should succeed");

        assert_eq!((output.width, output.height), (240, 120));
        assert_eq!(output.format, SupportedFormat::Png);
    }

    #[test]
    fn oversized_upload_fails_before_decode() {
        let mut config = BorderConfig::default();
        config.max_upload_bytes = 64;
        let handler = BorderHandler::new(config).expect("handler init failed");

        let result = handler.process(
            ImageSource::Bytes(create_png_bytes(64, 64)),
            &BorderSpec::new(10.0, 10.0),
        );
        assert!(matches!(result, Err(BorderError::Validation(_))));
    }

    #[test]
    fn stress_rejects_too_many_pixels() {
        let mut config = BorderConfig::default();
        config.max_decoded_pixels = 1_000_000;
        let handler = BorderHandler::new(config).expect("handler init failed");

        let result = handler.process(
            ImageSource::Bytes(create_png_bytes(2000, 2000)),
            &BorderSpec::new(10.0, 10.0),
        );
        assert!(matches!(result, Err(BorderError::ResourceLimit(_))));
    }

    #[test]
    fn huge_border_fails_before_full_decode() {
        let mut config = BorderConfig::default();
        config.max_canvas_pixels = 10_000;
        let handler = BorderHandler::new(config).expect("handler init failed");

        let result = handler.process(
            ImageSource::Bytes(create_png_bytes(50, 50)),
            &BorderSpec::new(1000.0, 1000.0),
        );
        assert!(matches!(result, Err(BorderError::Encode(_))));
    }

    #[test]
    fn handler_rejects_invalid_config() {
        let mut config = BorderConfig::default();
        config.max_concurrent_jobs = 0;
        assert!(matches!(BorderHandler::new(config), Err(BorderError::Validation(_))));
    }

    #[test]
    fn profile_switch_is_visible_in_snapshot() {
        let handler = BorderHandler::new(BorderConfig::default()).expect("handler init failed");
        handler
            .set_encode_profile(EncodeProfile::Speed)
            .expect("set profile should succeed");

        assert_eq!(handler.get_encode_profile().expect("get profile"), EncodeProfile::Speed);
        assert_eq!(handler.config_snapshot().expect("snapshot").jpeg_quality, 80);
    }
}
