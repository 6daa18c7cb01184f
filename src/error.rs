//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 命令行工具需要把参数、配置、图片错误与未处理的加载失败统一输出，
//! 因此在库错误 `ImageError` 之上再包一层 `AppError`。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `ImageError` 提供 `From` 转换，`?` 即可向上传递。
//! - 实现 `Serialize`，将错误序列化为字符串，便于输出 JSON 报告。

use serde::Serialize;

use crate::image_element::ImageError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 图片加载 / 解码错误
    #[error("{0}")]
    Image(#[from] ImageError),

    /// 命令行参数或配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 加载任务异常终止
    #[error("未处理的错误: {0}")]
    Unhandled(String),
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_error_converts_and_serializes_as_string() {
        let err: AppError = ImageError::Network("HTTP 500: 服务器错误".to_string()).into();
        let json = serde_json::to_string(&err).expect("serialize");

        assert_eq!(json, "\"网络错误：HTTP 500: 服务器错误\"");
    }
}
