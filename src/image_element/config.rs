//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `ImageConfig`，保证加载行为可观测、可调整、可测试。
//! 浏览器语义本身不受配置影响，配置只约束资源上限与网络参数。
//!
//! ## 实现思路
//!
//! - `Default` 提供可直接使用的配置。
//! - `validate` 对外部传入的参数做范围校验。
//! - 支持从 JSON 读取（字段缺省时回落到默认值）。

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ImageError;

/// 发起网络请求时使用的固定标识头。
pub const DEFAULT_USER_AGENT: &str = concat!("headless-image/", env!("CARGO_PKG_VERSION"));

/// 图片加载配置。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// 任意来源读取原始字节时允许的最大体积（字节）。
    pub max_file_size: u64,
    /// 网络下载超时时间（秒）。
    pub download_timeout: u64,
    /// 建立连接（TCP/TLS）超时时间（秒）。
    pub connect_timeout: u64,
    /// 最大重定向次数。
    pub max_redirects: usize,
    /// 解码后的像素上限（`width * height`），在完整解码前按头信息检查。
    pub max_decoded_pixels: u64,
    /// 请求头 `User-Agent`。
    pub user_agent: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            download_timeout: 30,
            connect_timeout: 8,
            max_redirects: 10,
            max_decoded_pixels: 40_000_000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ImageConfig {
    /// 校验参数范围。
    pub fn validate(&self) -> Result<(), ImageError> {
        if self.max_file_size == 0 {
            return Err(ImageError::InvalidConfig("max_file_size 不能为 0".to_string()));
        }
        if !(1..=600).contains(&self.download_timeout) {
            return Err(ImageError::InvalidConfig(
                "download_timeout 必须在 1~600 秒之间".to_string(),
            ));
        }
        if !(1..=120).contains(&self.connect_timeout) {
            return Err(ImageError::InvalidConfig(
                "connect_timeout 必须在 1~120 秒之间".to_string(),
            ));
        }
        if self.connect_timeout > self.download_timeout {
            return Err(ImageError::InvalidConfig(
                "connect_timeout 不能大于 download_timeout".to_string(),
            ));
        }
        if self.max_redirects > 32 {
            return Err(ImageError::InvalidConfig("max_redirects 不能超过 32".to_string()));
        }
        if self.max_decoded_pixels == 0 {
            return Err(ImageError::InvalidConfig(
                "max_decoded_pixels 不能为 0".to_string(),
            ));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ImageError::InvalidConfig("user_agent 不能为空".to_string()));
        }

        Ok(())
    }

    /// 从 JSON 字符串解析并校验配置。
    ///
    /// # 示例
    /// ```rust
    /// use headless_image::image_element::ImageConfig;
    ///
    /// let config = ImageConfig::from_json_str(r#"{ "max_redirects": 3 }"#)?;
    /// assert_eq!(config.max_redirects, 3);
    /// assert_eq!(config.download_timeout, ImageConfig::default().download_timeout);
    /// # Ok::<(), headless_image::image_element::ImageError>(())
    /// ```
    pub fn from_json_str(content: &str) -> Result<Self, ImageError> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| ImageError::InvalidConfig(format!("解析配置失败：{}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// 从 JSON 文件读取配置。
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ImageError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ImageError::FileSystem(format!("无法读取配置文件 {}：{}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }
}
