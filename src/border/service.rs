//! # 服务层（可注入状态）
//!
//! ## 设计思路
//!
//! 使用 `BorderServiceState` 作为宿主注入状态，替代全局单例函数。
//! 好处：
//! 1. 生命周期清晰（由宿主统一创建）
//! 2. 测试可创建独立实例，减少共享状态副作用
//! 3. 并发上限随实例配置，而非进程级全局设置
//!
//! ## 实现思路
//!
//! - 流水线是 CPU 密集的同步代码，放到 `spawn_blocking` 中执行，不阻塞异步运行时。
//! - 用 `Semaphore` 限制同时在途的请求数，约束大图并发时的内存峰值。
//! - 请求之间没有共享的可变数据；信号量是唯一的共享资源。

use std::sync::Arc;

use tokio::sync::Semaphore;

use super::source::{BorderSpec, BorderedImage, ImageSource};
use super::{BorderConfig, BorderError, BorderHandler, EncodeProfile};

/// 加边服务状态。
pub struct BorderServiceState {
    handler: Arc<BorderHandler>,
    permits: Arc<Semaphore>,
}

impl BorderServiceState {
    /// 使用默认配置创建服务状态。
    ///
    /// # 示例
    /// ```rust
    /// use image_border::border::BorderServiceState;
    ///
    /// let service = BorderServiceState::new()?;
    /// # Ok::<(), image_border::border::BorderError>(())
    /// ```
    pub fn new() -> Result<Self, BorderError> {
        Self::with_config(BorderConfig::default())
    }

    /// 使用自定义配置创建服务状态。
    pub fn with_config(config: BorderConfig) -> Result<Self, BorderError> {
        let max_jobs = config.max_concurrent_jobs;
        let handler = BorderHandler::new(config)?;
        Ok(Self {
            handler: Arc::new(handler),
            permits: Arc::new(Semaphore::new(max_jobs)),
        })
    }

    /// 执行完整处理流程：加载 → 解码 → 几何计算 → 合成编码。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use image_border::border::{BorderServiceState, ImageSource};
    ///
    /// # async fn demo() -> Result<(), image_border::border::BorderError> {
    /// let service = BorderServiceState::new()?;
    /// let output = service
    ///     .process_params(ImageSource::FilePath("/tmp/a.png".into()), Some("10".into()), None)
    ///     .await?;
    /// assert_eq!(output.content_type(), "image/png");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn process_params(
        &self,
        source: ImageSource,
        x: Option<String>,
        y: Option<String>,
    ) -> Result<BorderedImage, BorderError> {
        self.run_blocking(move |handler| {
            handler.process_with_params(source, x.as_deref(), y.as_deref())
        })
        .await
    }

    pub async fn process(
        &self,
        source: ImageSource,
        spec: BorderSpec,
    ) -> Result<BorderedImage, BorderError> {
        self.run_blocking(move |handler| handler.process(source, &spec)).await
    }

    async fn run_blocking<F>(&self, job: F) -> Result<BorderedImage, BorderError>
    where
        F: FnOnce(&BorderHandler) -> Result<BorderedImage, BorderError> + Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| BorderError::Internal("并发许可已关闭".to_string()))?;

        let handler = Arc::clone(&self.handler);
        let result = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job(handler.as_ref())
        })
        .await
        .map_err(|e| BorderError::Internal(format!("后台处理任务异常退出：{}", e)))?;

        if let Err(err) = &result {
            if err.is_client_error() {
                log::warn!("⚠️ 请求被拒绝 [{}] {}", err.code(), err);
            } else {
                log::error!("❌ 处理失败 [{}] {}", err.code(), err);
            }
        }

        result
    }

    /// 当前可用的并发许可数。
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// 设置编码档位。
    ///
    /// # 示例
    /// ```rust
    /// use image_border::border::BorderServiceState;
    ///
    /// let service = BorderServiceState::new()?;
    /// service.set_encode_profile("speed")?;
    /// assert_eq!(service.get_encode_profile()?, "speed");
    /// # Ok::<(), image_border::border::BorderError>(())
    /// ```
    pub fn set_encode_profile(&self, profile: &str) -> Result<(), BorderError> {
        let profile = EncodeProfile::from_str(profile)?;
        self.handler.set_encode_profile(profile)
    }

    /// 获取当前生效编码档位（字符串）。
    pub fn get_encode_profile(&self) -> Result<String, BorderError> {
        let profile = self.handler.get_encode_profile()?;
        Ok(profile.as_str().to_string())
    }

    pub fn config_snapshot(&self) -> Result<BorderConfig, BorderError> {
        self.handler.config_snapshot()
    }
}
