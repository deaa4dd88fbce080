//! # 边界适配层
//!
//! ## 设计思路
//!
//! 适配层只做“请求 → 流水线 → 响应”的参数接收与结果返回，不承载业务逻辑。
//! HTTP 路由、multipart 解析属于外部宿主，这里只约定它们交进来的数据形状：
//! 一个名为 `image` 的文件字段（已读入内存）与两个可选的查询参数 `x`、`y`。
//!
//! 成功时返回完整图片字节、与输入格式一致的内容类型以及 `inline` 展示方式；
//! 失败时返回结构化错误载荷，绝不附带部分图片字节。

use super::{BorderError, BorderServiceState, ImageSource};

/// 上传字段名。
pub const IMAGE_FIELD: &str = "image";

/// 宿主交给核心的请求。
#[derive(Debug, Default, Clone)]
pub struct ConvertRequest {
    /// `image` 字段的原始字节；缺失表示未上传文件。
    pub file: Option<Vec<u8>>,
    pub x: Option<String>,
    pub y: Option<String>,
}

/// 成功响应。
#[derive(Debug, Clone)]
pub struct ConvertResponse {
    pub body: Vec<u8>,
    pub content_type: &'static str,
    pub content_disposition: &'static str,
    pub width: u32,
    pub height: u32,
}

/// 失败响应载荷。
#[derive(Debug, Clone, serde::Serialize)]
pub struct ConvertErrorPayload {
    #[serde(skip)]
    pub status: u16,
    pub code: &'static str,
    pub stage: &'static str,
    #[serde(rename = "error")]
    pub message: String,
}

impl From<BorderError> for ConvertErrorPayload {
    fn from(error: BorderError) -> Self {
        Self {
            status: error.status(),
            code: error.code(),
            stage: error.stage(),
            message: error.to_string(),
        }
    }
}

impl ConvertErrorPayload {
    /// 序列化为 JSON 响应体。
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":"{}","error":"处理图片时出错"}}"#, self.code)
        })
    }
}

/// 处理一次加边请求。
pub async fn convert(
    state: &BorderServiceState,
    request: ConvertRequest,
) -> Result<ConvertResponse, ConvertErrorPayload> {
    let Some(file) = request.file else {
        return Err(BorderError::Validation(format!("未提供图片文件（字段：{}）", IMAGE_FIELD)).into());
    };

    let output = state
        .process_params(ImageSource::Bytes(file), request.x, request.y)
        .await
        .map_err(ConvertErrorPayload::from)?;

    Ok(ConvertResponse {
        content_type: output.content_type(),
        content_disposition: "inline",
        width: output.width,
        height: output.height,
        body: output.bytes,
    })
}
