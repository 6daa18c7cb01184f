//! # 解码流水线模块
//!
//! ## 设计思路
//!
//! 将“字节 → 格式识别 → 图像 → RGBA”的过程集中管理，并在关键节点增加资源上限控制。
//! 具体像素解码全部交给 `image` crate 的各格式编解码器，这里只负责调度。
//!
//! ## 实现思路
//!
//! 1. 按文件签名识别格式（ICO 需先挑选最佳条目）
//! 2. 读取 header 尺寸，按像素上限快速拒绝
//! 3. 完整解码并转换为 RGBA8
//! 4. 解码在阻塞线程池中执行，不占用调度线程

use std::io::Cursor;
use std::sync::Arc;

use image::{ImageFormat, ImageReader};

use super::ico::{IconDirectory, IconPayload};
use super::sniff::{ImageKind, sniff_format};
use super::source::{DecodedImage, RawImageData};
use super::{ImageConfig, ImageError};

/// 将原始字节解码为 RGBA 数据。
pub(crate) fn decode_image(
    raw: &RawImageData,
    config: &ImageConfig,
) -> Result<DecodedImage, ImageError> {
    let kind = sniff_format(&raw.bytes)?;

    let decoded = match kind {
        ImageKind::Ico => decode_icon(&raw.bytes, config)?,
        other => decode_with_format(&raw.bytes, other.image_format(), config)?,
    };

    log::info!(
        "✅ 图片解码成功 - 来源: {} 格式: {} 尺寸: {}x{}",
        raw.source_hint,
        kind.as_str(),
        decoded.width(),
        decoded.height()
    );

    Ok(decoded)
}

/// 在阻塞线程池中解码，避免大图阻塞调度线程。
pub(crate) async fn decode_off_thread(
    raw: RawImageData,
    config: Arc<ImageConfig>,
) -> Result<DecodedImage, ImageError> {
    tokio::task::spawn_blocking(move || decode_image(&raw, &config))
        .await
        .map_err(|e| ImageError::Decode(format!("解码任务异常终止：{}", e)))?
}

fn decode_icon(bytes: &[u8], config: &ImageConfig) -> Result<DecodedImage, ImageError> {
    let directory = IconDirectory::parse(bytes)?;
    let best = directory.best_entry();

    log::debug!(
        "🗂️ ICO 共 {} 项，选中 {}x{} {}bit",
        directory.entries().len(),
        best.width,
        best.height,
        best.bit_count
    );

    match directory.payload(&best)? {
        IconPayload::Png(png) => decode_with_format(png, ImageFormat::Png, config),
        IconPayload::Bitmap(ico) => decode_with_format(&ico, ImageFormat::Ico, config),
    }
}

fn decode_with_format(
    bytes: &[u8],
    format: ImageFormat,
    config: &ImageConfig,
) -> Result<DecodedImage, ImageError> {
    let (header_width, header_height) = ImageReader::with_format(Cursor::new(bytes), format)
        .into_dimensions()
        .map_err(|e| map_codec_error(e, "无法读取图片尺寸"))?;
    validate_pixel_limits(config, header_width, header_height)?;

    let decoded = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| map_codec_error(e, "图片解码失败"))?;

    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    validate_pixel_limits(config, width, height)?;

    DecodedImage::new(width, height, rgba.into_raw())
}

/// 校验像素数量是否超过配置上限。
fn validate_pixel_limits(config: &ImageConfig, width: u32, height: u32) -> Result<(), ImageError> {
    let pixels = u64::from(width) * u64::from(height);

    if pixels > config.max_decoded_pixels {
        return Err(ImageError::ResourceLimit(format!(
            "图片像素过大：{} 像素（限制：{} 像素）",
            pixels, config.max_decoded_pixels
        )));
    }

    Ok(())
}

fn map_codec_error(error: image::ImageError, context: &str) -> ImageError {
    match error {
        image::ImageError::Limits(e) => ImageError::ResourceLimit(format!("{}：{}", context, e)),
        other => ImageError::Decode(format!("{}：{}", context, other)),
    }
}
