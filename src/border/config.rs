//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `BorderConfig`，作为显式值传入流水线入口，
//! 不依赖任何进程级全局状态（上传体积上限等也在这里）。
//! 编码档位（quality / balanced / speed）作为高层语义，映射到底层编码参数组合。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用的平衡配置。
//! - `EncodeProfile` 负责档位字符串解析与反向输出。
//! - `apply_encode_profile` 将档位转换为具体编码参数。
//! - `infer_encode_profile` 用于从当前配置反推档位。
//! - `PercentParsePolicy` 决定“存在但非法”的百分比参数如何处理。

use image::codecs::png::CompressionType;

use super::BorderError;

/// 单次上传允许的最大体积（20 MiB）。
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;
/// 百分比参数缺省值。
pub const DEFAULT_BORDER_PERCENT: f64 = 10.0;
/// 不透明白色背景。
pub const DEFAULT_BACKGROUND: [u8; 4] = [255, 255, 255, 255];

/// 百分比参数解析策略。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PercentParsePolicy {
    /// 缺省、空串、无法解析、非有限值一律回退到默认百分比。
    Lenient,
    /// 仅缺省与空串回退默认值；存在但非法的值返回校验错误。
    Strict,
}

impl PercentParsePolicy {
    pub fn from_str(policy: &str) -> Result<Self, BorderError> {
        match policy.trim().to_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(BorderError::Validation(format!(
                "未知百分比解析策略：{}（可选：lenient / strict）",
                other
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lenient => "lenient",
            Self::Strict => "strict",
        }
    }
}

/// 加边处理配置。
///
/// 字段覆盖了上传校验、解码限制、画布合成与编码四个阶段。
#[derive(Debug, Clone)]
pub struct BorderConfig {
    /// 上传原始字节允许的最大体积（字节），解码前校验。
    pub max_upload_bytes: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 解码阶段允许的预计内存上限（按解码后的像素布局估算，字节）。
    pub max_decoded_bytes: u64,
    /// 输出画布的像素上限，超过视为编码阶段资源耗尽。
    pub max_canvas_pixels: u64,
    /// 输出画布的内存上限（按源像素布局估算，字节）。
    pub max_canvas_bytes: u64,
    /// 水平方向默认百分比。
    pub default_x_percent: f64,
    /// 垂直方向默认百分比。
    pub default_y_percent: f64,
    /// 百分比参数解析策略。
    pub percent_policy: PercentParsePolicy,
    /// 画布背景色（RGBA）。
    pub background: [u8; 4],
    /// JPEG 编码质量（1~100）。
    pub jpeg_quality: u8,
    /// PNG 压缩级别。
    pub png_compression: CompressionType,
    /// 服务层允许同时处理的请求数。
    pub max_concurrent_jobs: usize,
}

impl Default for BorderConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_decoded_pixels: 40_000_000,
            max_decoded_bytes: 160 * 1024 * 1024,
            max_canvas_pixels: 100_000_000,
            max_canvas_bytes: 400 * 1024 * 1024,
            default_x_percent: DEFAULT_BORDER_PERCENT,
            default_y_percent: DEFAULT_BORDER_PERCENT,
            percent_policy: PercentParsePolicy::Lenient,
            background: DEFAULT_BACKGROUND,
            jpeg_quality: 90,
            png_compression: CompressionType::Default,
            max_concurrent_jobs: 4,
        }
    }
}

/// 编码档位（面向产品/用户语义）。
///
/// - `Quality`：尽量保真
/// - `Balanced`：质量与体积平衡
/// - `Speed`：优先编码速度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeProfile {
    Quality,
    Balanced,
    Speed,
}

impl EncodeProfile {
    /// 从外部字符串解析档位。
    ///
    /// # 示例
    /// ```rust
    /// use image_border::border::EncodeProfile;
    ///
    /// let p = EncodeProfile::from_str("balanced")?;
    /// assert_eq!(p.as_str(), "balanced");
    /// # Ok::<(), image_border::border::BorderError>(())
    /// ```
    pub fn from_str(profile: &str) -> Result<Self, BorderError> {
        match profile.trim().to_lowercase().as_str() {
            "quality" => Ok(Self::Quality),
            "balanced" => Ok(Self::Balanced),
            "speed" => Ok(Self::Speed),
            other => Err(BorderError::Validation(format!(
                "未知编码档位：{}（可选：quality / balanced / speed）",
                other
            ))),
        }
    }

    /// 将档位输出为稳定字符串。
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quality => "quality",
            Self::Balanced => "balanced",
            Self::Speed => "speed",
        }
    }
}

impl BorderConfig {
    /// 基于当前参数反推编码档位。
    pub fn infer_encode_profile(&self) -> EncodeProfile {
        if self.jpeg_quality >= 95 && matches!(self.png_compression, CompressionType::Best) {
            return EncodeProfile::Quality;
        }

        if self.jpeg_quality <= 80 || matches!(self.png_compression, CompressionType::Fast) {
            return EncodeProfile::Speed;
        }

        EncodeProfile::Balanced
    }

    /// 应用指定编码档位到实际参数。
    pub fn apply_encode_profile(&mut self, profile: EncodeProfile) {
        match profile {
            EncodeProfile::Quality => {
                self.jpeg_quality = 95;
                self.png_compression = CompressionType::Best;
            }
            EncodeProfile::Balanced => {
                self.jpeg_quality = 90;
                self.png_compression = CompressionType::Default;
            }
            EncodeProfile::Speed => {
                self.jpeg_quality = 80;
                self.png_compression = CompressionType::Fast;
            }
        }
    }

    /// 校验配置取值是否合法。
    ///
    /// 用于设置文件加载后、构建处理器之前。
    pub fn validate(&self) -> Result<(), BorderError> {
        if self.max_upload_bytes == 0 {
            return Err(BorderError::Validation("max_upload_bytes 不能为 0".to_string()));
        }
        if self.max_decoded_pixels == 0 || self.max_decoded_bytes == 0
            || self.max_canvas_pixels == 0
            || self.max_canvas_bytes == 0
        {
            return Err(BorderError::Validation("像素与内存上限不能为 0".to_string()));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(BorderError::Validation("jpeg_quality 必须在 1~100 之间".to_string()));
        }
        if self.max_concurrent_jobs == 0 {
            return Err(BorderError::Validation("max_concurrent_jobs 不能为 0".to_string()));
        }
        for (name, value) in [
            ("default_x_percent", self.default_x_percent),
            ("default_y_percent", self.default_y_percent),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(BorderError::Validation(format!(
                    "{} 必须为非负有限数：{}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}
