//! # 加载模块
//!
//! ## 设计思路
//!
//! 统一处理三种来源（data URL / 网络 / 本地文件）的原始字节加载，并在“尽可能早”的阶段执行输入校验。
//! 加载只负责取字节，格式识别与解码交给 `pipeline`。
//!
//! ## 实现思路
//!
//! - data URL：只接受 `data:<媒体类型>;base64,<数据>` 形式，解码前先估算体积。
//! - 网络：固定 `User-Agent` 的 GET 请求，非 2xx 一律失败，分块读取并限制体积。
//! - 文件：metadata 体积限制 + 读取。
//! - 所有错误统一映射到 `ImageError`，便于上层转换为 `error` 事件。

use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use bytes::{Bytes, BytesMut};
use once_cell::sync::Lazy;
use regex::Regex;

use super::source::{ImageSource, RawImageData};
use super::{ImageConfig, ImageError};

const BUFFER_INITIAL_CAPACITY: usize = 16 * 1024;

/// `data:` 前缀、媒体类型与可选的 `;base64` 标记。
static DATA_URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^data:([^;,]*)(;base64)?,").expect("data URL 正则无效"));

/// data URL 的负载常常省略末尾的 `=`，解码时不强制填充。
const DATA_URL_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// 按来源分类取字节。
pub(crate) async fn load_source(
    source: &ImageSource,
    config: &ImageConfig,
) -> Result<RawImageData, ImageError> {
    let bytes = match source {
        ImageSource::DataUrl(url) => load_from_data_url(url, config)?,
        ImageSource::Remote(url) => load_from_url(url, config).await?,
        ImageSource::File(path) => load_from_file(path, config).await?,
    };

    Ok(RawImageData {
        bytes,
        source_hint: source.hint(),
    })
}

/// 从 data URL 解出原始字节。不会访问网络或磁盘。
pub(crate) fn load_from_data_url(url: &str, config: &ImageConfig) -> Result<Bytes, ImageError> {
    let captures = DATA_URL_PATTERN
        .captures(url)
        .filter(|captures| captures.get(2).is_some())
        .ok_or_else(|| {
            ImageError::InvalidSource("无效的 data URL（仅支持 base64 形式）".to_string())
        })?;

    let media_type = captures.get(1).map_or("", |m| m.as_str());
    let prefix_len = captures.get(0).map_or(0, |m| m.end());
    let payload = &url[prefix_len..];

    let estimated_len = estimate_base64_decoded_upper_bound_len(payload);
    if estimated_len > config.max_file_size {
        return Err(ImageError::ResourceLimit(format!(
            "Base64 预计解码体积过大：{:.2} MB（限制：{:.2} MB）",
            estimated_len as f64 / 1024.0 / 1024.0,
            config.max_file_size as f64 / 1024.0 / 1024.0
        )));
    }

    let bytes = DATA_URL_ENGINE
        .decode(payload)
        .map_err(|e| ImageError::InvalidSource(format!("Base64 解码失败：{}", e)))?;

    log::info!(
        "📝 data URL 解码完成 - 媒体类型: {} 字节: {}",
        if media_type.is_empty() { "<空>" } else { media_type },
        bytes.len()
    );

    Ok(Bytes::from(bytes))
}

/// 下载网络图片的完整响应体。
pub(crate) async fn load_from_url(url: &str, config: &ImageConfig) -> Result<Bytes, ImageError> {
    log::info!("🌐 开始下载图片 - URL: {}", redact_url_for_log(url));

    let client = build_http_client(config)?;
    let mut response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, config.user_agent.as_str())
        .send()
        .await
        .map_err(|e| map_reqwest_error(e, url, config))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ImageError::Network(format!(
            "HTTP {}: {}",
            status.as_u16(),
            status_message(status.as_u16())
        )));
    }

    let total_len = response.content_length();
    if let Some(size) = total_len {
        if size > config.max_file_size {
            return Err(ImageError::ResourceLimit(format!(
                "文件过大：{:.2} MB（限制：{:.2} MB）",
                size as f64 / 1024.0 / 1024.0,
                config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }
    }

    let initial_capacity = total_len
        .map(|len| len.min(config.max_file_size) as usize)
        .filter(|len| *len > 0)
        .unwrap_or(BUFFER_INITIAL_CAPACITY);
    let mut buffer = BytesMut::with_capacity(initial_capacity);

    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| map_reqwest_error(e, url, config))?
    {
        if (buffer.len() + chunk.len()) as u64 > config.max_file_size {
            return Err(ImageError::ResourceLimit("下载后文件超过大小限制".to_string()));
        }
        buffer.extend_from_slice(&chunk);
    }

    log::debug!("✅ 下载完成 - {} bytes", buffer.len());

    Ok(buffer.freeze())
}

/// 读取本地文件的全部内容。
pub(crate) async fn load_from_file(path: &Path, config: &ImageConfig) -> Result<Bytes, ImageError> {
    log::info!("📁 开始读取本地图片 - 路径: {}", path.display());

    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| map_io_error(e, path))?;

    if metadata.len() > config.max_file_size {
        return Err(ImageError::ResourceLimit(format!(
            "文件过大：{:.2} MB（限制：{:.2} MB）",
            metadata.len() as f64 / 1024.0 / 1024.0,
            config.max_file_size as f64 / 1024.0 / 1024.0
        )));
    }

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| map_io_error(e, path))?;

    Ok(Bytes::from(bytes))
}

fn build_http_client(config: &ImageConfig) -> Result<reqwest::Client, ImageError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.download_timeout))
        .connect_timeout(Duration::from_secs(config.connect_timeout))
        .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
        .build()
        .map_err(|e| ImageError::Network(format!("无法创建 HTTP 客户端：{}", e)))
}

fn estimate_base64_decoded_upper_bound_len(payload: &str) -> u64 {
    (payload.len() as u64).div_ceil(4).saturating_mul(3)
}

/// 统一映射 reqwest 错误到业务错误。
fn map_reqwest_error(e: reqwest::Error, url: &str, config: &ImageConfig) -> ImageError {
    let err_msg = e.to_string().replace(url, &redact_url_for_log(url));

    if e.is_timeout() {
        ImageError::Timeout(format!("下载超时（{}秒）", config.download_timeout))
    } else if e.is_connect() {
        ImageError::Network(format!("无法连接：{}", err_msg))
    } else if e.is_redirect() {
        ImageError::Network(format!("重定向次数过多：{}", err_msg))
    } else {
        ImageError::Network(format!("请求失败：{}", err_msg))
    }
}

fn map_io_error(e: std::io::Error, path: &Path) -> ImageError {
    match e.kind() {
        ErrorKind::NotFound => ImageError::FileSystem(format!("文件不存在：{}", path.display())),
        ErrorKind::PermissionDenied => {
            ImageError::FileSystem(format!("没有读取权限：{}", path.display()))
        }
        _ => ImageError::FileSystem(format!("无法读取图片文件 {}：{}", path.display(), e)),
    }
}

/// 常见 HTTP 状态码本地化文案。
fn status_message(code: u16) -> &'static str {
    match code {
        404 => "未找到",
        403 => "访问被拒绝",
        500..=599 => "服务器错误",
        _ => "请求失败",
    }
}

/// 日志中只保留协议、主机、端口与路径，去掉查询串与片段。
pub(crate) fn redact_url_for_log(url: &str) -> String {
    let Ok(parsed) = reqwest::Url::parse(url) else {
        return "<invalid-url>".to_string();
    };

    let host = parsed.host_str().unwrap_or("<unknown-host>");
    let port = parsed.port().map(|p| format!(":{}", p)).unwrap_or_default();

    format!("{}://{}{}{}", parsed.scheme(), host, port, parsed.path())
}
