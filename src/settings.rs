//! 设置文件加载
//!
//! 设置文件为 JSON，所有字段可选，缺省字段沿用 `BorderConfig::default()`。
//! 文件不存在视为未配置；内容无法解析或取值非法则报错，不静默回退。

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::border::{BorderConfig, EncodeProfile, PercentParsePolicy};
use crate::error::AppError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BorderSettings {
    pub max_upload_bytes: Option<u64>,
    pub max_decoded_pixels: Option<u64>,
    pub max_decoded_bytes: Option<u64>,
    pub max_canvas_pixels: Option<u64>,
    pub max_canvas_bytes: Option<u64>,
    pub default_x_percent: Option<f64>,
    pub default_y_percent: Option<f64>,
    pub percent_policy: Option<String>,
    pub background: Option<[u8; 4]>,
    pub profile: Option<String>,
    pub jpeg_quality: Option<u8>,
    pub max_concurrent_jobs: Option<usize>,
}

impl BorderSettings {
    /// 在默认配置之上叠加设置项。
    ///
    /// `profile` 先于 `jpeg_quality` 生效，便于“选档位再微调质量”。
    pub fn apply_to(&self, mut config: BorderConfig) -> Result<BorderConfig, AppError> {
        if let Some(value) = self.max_upload_bytes {
            config.max_upload_bytes = value;
        }
        if let Some(value) = self.max_decoded_pixels {
            config.max_decoded_pixels = value;
        }
        if let Some(value) = self.max_decoded_bytes {
            config.max_decoded_bytes = value;
        }
        if let Some(value) = self.max_canvas_pixels {
            config.max_canvas_pixels = value;
        }
        if let Some(value) = self.max_canvas_bytes {
            config.max_canvas_bytes = value;
        }
        if let Some(value) = self.default_x_percent {
            config.default_x_percent = value;
        }
        if let Some(value) = self.default_y_percent {
            config.default_y_percent = value;
        }
        if let Some(policy) = &self.percent_policy {
            config.percent_policy = PercentParsePolicy::from_str(policy)
                .map_err(|e| AppError::Settings(e.to_string()))?;
        }
        if let Some(background) = self.background {
            config.background = background;
        }
        if let Some(profile) = &self.profile {
            let profile = EncodeProfile::from_str(profile)
                .map_err(|e| AppError::Settings(e.to_string()))?;
            config.apply_encode_profile(profile);
        }
        if let Some(value) = self.jpeg_quality {
            config.jpeg_quality = value;
        }
        if let Some(value) = self.max_concurrent_jobs {
            config.max_concurrent_jobs = value;
        }

        config
            .validate()
            .map_err(|e| AppError::Settings(e.to_string()))?;
        Ok(config)
    }
}

pub fn load_settings_from_path(path: &Path) -> Result<Option<BorderSettings>, AppError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)?;
    let parsed = serde_json::from_str::<BorderSettings>(&content)
        .map_err(|e| AppError::Settings(format!("解析设置文件失败: {}", e)))?;

    Ok(Some(parsed))
}

/// 读取设置文件并生成最终配置；未提供路径或文件不存在时返回默认配置。
pub fn load_config(path: Option<&Path>) -> Result<BorderConfig, AppError> {
    let settings = match path {
        Some(path) => {
            let loaded = load_settings_from_path(path)?;
            if loaded.is_none() {
                log::warn!("设置文件不存在，使用默认配置: {}", path.display());
            }
            loaded.unwrap_or_default()
        }
        None => BorderSettings::default(),
    };

    settings.apply_to(BorderConfig::default())
}
