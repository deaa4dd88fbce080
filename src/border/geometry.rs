//! # 边框几何计算模块
//!
//! ## 设计思路
//!
//! 把“百分比 → 像素”的换算做成无副作用的纯函数，两个方向各自独立计算，互不耦合。
//!
//! ## 实现思路
//!
//! - `parse_percent`：按配置的解析策略处理请求中的原始字符串。
//! - `compute_border_pixels`：`round(边长 × 百分比 / 100)`，四舍五入采用远离零取整（`f64::round`）。
//! - 负数百分比一律拒绝，不产生未定义的负边框。

use super::config::PercentParsePolicy;
use super::source::{BorderPixels, BorderSpec, ImageMetadata};
use super::{BorderConfig, BorderError};

/// 从请求参数构建边框规格。
///
/// 两个参数各自独立回退到配置中的默认百分比。
pub fn border_spec_from_params(
    x: Option<&str>,
    y: Option<&str>,
    config: &BorderConfig,
) -> Result<BorderSpec, BorderError> {
    let x_percent = parse_percent("x", x, config.default_x_percent, config.percent_policy)?;
    let y_percent = parse_percent("y", y, config.default_y_percent, config.percent_policy)?;
    Ok(BorderSpec::new(x_percent, y_percent))
}

/// 解析单个百分比参数。
///
/// 缺省或空串始终回退默认值；`Lenient` 下无法解析或非有限值同样回退，
/// `Strict` 下返回校验错误。负数在两种策略下都会被拒绝。
pub fn parse_percent(
    name: &str,
    raw: Option<&str>,
    default: f64,
    policy: PercentParsePolicy,
) -> Result<f64, BorderError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(default);
    };

    let parsed = raw.parse::<f64>().ok().filter(|v| v.is_finite());
    let value = match (parsed, policy) {
        (Some(value), _) => value,
        (None, PercentParsePolicy::Lenient) => {
            log::debug!("百分比参数 {}={:?} 无法解析，回退默认值 {}", name, raw, default);
            return Ok(default);
        }
        (None, PercentParsePolicy::Strict) => {
            return Err(BorderError::Validation(format!(
                "百分比参数 {} 不是有效数字：{:?}",
                name, raw
            )));
        }
    };

    if value < 0.0 {
        return Err(BorderError::Validation(format!(
            "百分比参数 {} 不能为负数：{}",
            name, value
        )));
    }

    Ok(value)
}

/// 计算左右与上下的像素边框。
pub fn compute_border_pixels(
    metadata: &ImageMetadata,
    spec: &BorderSpec,
) -> Result<BorderPixels, BorderError> {
    Ok(BorderPixels {
        horizontal: axis_border("x", metadata.width, spec.x_percent)?,
        vertical: axis_border("y", metadata.height, spec.y_percent)?,
    })
}

fn axis_border(name: &str, length: u32, percent: f64) -> Result<u32, BorderError> {
    if !percent.is_finite() || percent < 0.0 {
        return Err(BorderError::Validation(format!(
            "百分比参数 {} 必须为非负有限数：{}",
            name, percent
        )));
    }

    let pixels = (length as f64 * percent / 100.0).round();
    if pixels > u32::MAX as f64 {
        return Err(BorderError::Validation(format!(
            "百分比参数 {}={} 导致边框超出范围",
            name, percent
        )));
    }

    Ok(pixels as u32)
}
