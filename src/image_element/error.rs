//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载“取字节 → 识别格式 → 解码”整条链路中的所有失败来源，
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! 加载器内部的失败不会从 `Image::set_src` 抛出，而是转换为 `error` 事件；
//! 只有在没有安装 `onerror` 时才升级为 [`UnhandledImageError`]，并终止进程。

use std::fmt;

use super::ImageSource;

/// 图片加载统一错误类型。
#[derive(Debug, Clone, thiserror::Error)]
pub enum ImageError {
    /// 没有任何文件签名匹配。
    #[error("无法识别的图片格式：{0}")]
    UnrecognizedFormat(String),

    /// 签名匹配但内容损坏，由具体编解码器报告。
    #[error("解码错误：{0}")]
    Decode(String),

    /// 内嵌数据（data URL）语法不合法。
    #[error("来源格式错误：{0}")]
    InvalidSource(String),

    #[error("网络错误：{0}")]
    Network(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("超时错误：{0}")]
    Timeout(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("配置错误：{0}")]
    InvalidConfig(String),
}

/// 未安装 `onerror` 时的加载失败。
///
/// 这是不可恢复的错误：加载任务记录它（`log::error!` 与 stderr）后调用
/// `std::process::abort`，进程不会继续运行。
#[derive(Debug, Clone)]
pub struct UnhandledImageError {
    /// 触发失败的来源字符串。
    pub src: String,
    /// 原始错误。
    pub error: ImageError,
}

impl fmt::Display for UnhandledImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "未处理的图片加载错误（来源：{}）：{}",
            ImageSource::classify(&self.src).log_label(),
            self.error
        )
    }
}

impl std::error::Error for UnhandledImageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unhandled_error_display_does_not_dump_inline_payload() {
        let unhandled = UnhandledImageError {
            src: format!("data:image/png;base64,{}", "A".repeat(4096)),
            error: ImageError::UnrecognizedFormat("图片内容为空".to_string()),
        };

        let message = unhandled.to_string();

        assert!(!message.contains("AAAA"));
        assert!(message.contains("data URL"));
        assert!(message.contains("图片内容为空"));
    }
}
