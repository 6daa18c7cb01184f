//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“来源语义”和“流水线中间结果”解耦：
//! - `ImageSource` 表示来源字符串被分类后的取数策略
//! - `RawImageData` 表示已取到但未解码的字节
//! - `DecodedImage` 表示解码完成的 RGBA 像素数据

use std::path::PathBuf;

use bytes::Bytes;

use super::ImageError;
use super::loader::redact_url_for_log;

/// 来源字符串的取数策略。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// 内嵌数据（`data:` URL），保存完整的原始字符串。
    DataUrl(String),
    /// 网络地址（`http:` / `https:`）。
    Remote(String),
    /// 本地文件，已去掉查询串与 `file://` 前缀。
    File(PathBuf),
}

impl ImageSource {
    /// 按前缀对来源字符串分类。
    ///
    /// 规则依次为：`data:` → 内嵌数据；`http:` / `https:` → 网络；其余一律视为本地文件。
    /// 本地文件会先去掉 `?` 之后的查询串，再去掉开头的 `file://`。
    ///
    /// # 示例
    /// ```rust
    /// use headless_image::image_element::ImageSource;
    /// use std::path::PathBuf;
    ///
    /// assert_eq!(
    ///     ImageSource::classify("file:///tmp/a.png?v=1"),
    ///     ImageSource::File(PathBuf::from("/tmp/a.png")),
    /// );
    /// ```
    pub fn classify(src: &str) -> Self {
        if src.starts_with("data:") {
            return Self::DataUrl(src.to_string());
        }

        if src.starts_with("http:") || src.starts_with("https:") {
            return Self::Remote(src.to_string());
        }

        let without_query = match src.find('?') {
            Some(index) => &src[..index],
            None => src,
        };
        let path = without_query.strip_prefix("file://").unwrap_or(without_query);

        Self::File(PathBuf::from(path))
    }

    /// 日志用描述：data URL 只记录长度，网络地址去掉查询串。
    pub(crate) fn log_label(&self) -> String {
        match self {
            Self::DataUrl(url) => format!("data URL（{} 字符）", url.len()),
            Self::Remote(url) => redact_url_for_log(url),
            Self::File(path) => path.display().to_string(),
        }
    }

    /// 来源提示（用于日志与诊断）。
    pub fn hint(&self) -> &'static str {
        match self {
            Self::DataUrl(_) => "data-url",
            Self::Remote(_) => "url",
            Self::File(_) => "file",
        }
    }
}

/// 加载阶段输出：原始字节与来源标识。
#[derive(Debug, Clone)]
pub(crate) struct RawImageData {
    pub(crate) bytes: Bytes,
    pub(crate) source_hint: &'static str,
}

/// 解码结果：宽高与 RGBA8 像素（行优先、无填充）。
///
/// 一经创建便不再修改；`Image` 在每次成功解码时整体替换它。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl DecodedImage {
    /// 由宽高与 RGBA 字节构建，校验字节长度为 `width * height * 4`。
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, ImageError> {
        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or_else(|| ImageError::ResourceLimit("图片尺寸导致内存溢出风险".to_string()))?;

        if data.len() != expected_len {
            return Err(ImageError::Decode(format!(
                "像素数据长度异常：{}（期望：{}）",
                data.len(),
                expected_len
            )));
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGBA 字节数组。
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }
}
