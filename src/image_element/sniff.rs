//! # 格式识别模块
//!
//! 按固定顺序比对文件签名（magic bytes），决定交给哪个解码器。
//! 签名表的顺序即优先级，先命中者胜出；长度不足的缓冲区不会命中对应签名。

use image::ImageFormat;

use super::ImageError;

/// 可识别的图片格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    Webp,
    Bmp,
    /// ICO 容器，内含多张不同尺寸 / 位深的图片。
    Ico,
}

struct Signature {
    offset: usize,
    magic: &'static [u8],
    kind: ImageKind,
}

const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

const SIGNATURES: &[Signature] = &[
    Signature { offset: 0, magic: &[0xFF, 0xD8, 0xFF], kind: ImageKind::Jpeg },
    Signature { offset: 0, magic: PNG_MAGIC, kind: ImageKind::Png },
    Signature { offset: 0, magic: b"GIF", kind: ImageKind::Gif },
    Signature { offset: 8, magic: b"WEBP", kind: ImageKind::Webp },
    Signature { offset: 0, magic: b"BM", kind: ImageKind::Bmp },
    Signature { offset: 0, magic: &[0x00, 0x00, 0x01, 0x00], kind: ImageKind::Ico },
];

impl ImageKind {
    /// 对应的 `image` crate 编解码格式。
    pub fn image_format(self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
            Self::Gif => ImageFormat::Gif,
            Self::Webp => ImageFormat::WebP,
            Self::Bmp => ImageFormat::Bmp,
            Self::Ico => ImageFormat::Ico,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Webp => "webp",
            Self::Bmp => "bmp",
            Self::Ico => "ico",
        }
    }
}

/// 根据文件签名识别图片格式。
///
/// # 示例
/// ```rust
/// use headless_image::image_element::{sniff_format, ImageKind};
///
/// assert_eq!(sniff_format(b"GIF87a")?, ImageKind::Gif);
/// assert!(sniff_format(&[]).is_err());
/// # Ok::<(), headless_image::image_element::ImageError>(())
/// ```
pub fn sniff_format(bytes: &[u8]) -> Result<ImageKind, ImageError> {
    SIGNATURES
        .iter()
        .find(|signature| {
            bytes
                .get(signature.offset..signature.offset + signature.magic.len())
                .is_some_and(|window| window == signature.magic)
        })
        .map(|signature| signature.kind)
        .ok_or_else(|| ImageError::UnrecognizedFormat(describe_unrecognized(bytes)))
}

/// 判断字节是否以 PNG 签名开头（ICO 条目的 PNG 标记同样用它判断）。
pub(crate) fn is_png(bytes: &[u8]) -> bool {
    bytes.starts_with(PNG_MAGIC)
}

/// 为无法识别的内容生成诊断文案，尽量说明它实际是什么。
fn describe_unrecognized(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return "图片内容为空".to_string();
    }

    match infer::get(bytes) {
        Some(kind) => format!("文件签名不受支持：{}", kind.mime_type()),
        None => format!("未知文件签名（{} 字节）", bytes.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_each_signature() {
        let mut webp = b"RIFF\x00\x00\x00\x00WEBPVP8 ".to_vec();
        webp.extend_from_slice(&[0; 8]);

        let cases: [(&[u8], ImageKind); 6] = [
            (&[0xFF, 0xD8, 0xFF, 0xE0], ImageKind::Jpeg),
            (&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00], ImageKind::Png),
            (b"GIF89a", ImageKind::Gif),
            (&webp, ImageKind::Webp),
            (b"BM\x00\x00", ImageKind::Bmp),
            (&[0x00, 0x00, 0x01, 0x00, 0x01, 0x00], ImageKind::Ico),
        ];

        for (bytes, expected) in cases {
            assert_eq!(sniff_format(bytes).expect("signature should match"), expected);
        }
    }

    #[test]
    fn truncated_png_signature_does_not_match() {
        let result = sniff_format(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A]);

        assert!(matches!(result, Err(ImageError::UnrecognizedFormat(_))));
    }

    #[test]
    fn webp_is_checked_at_fixed_offset() {
        assert!(sniff_format(b"WEBP").is_err());
        assert!(sniff_format(b"RIFF\x00\x00\x00\x00WEB").is_err());
        assert_eq!(
            sniff_format(b"XXXXXXXXWEBP").expect("offset match"),
            ImageKind::Webp
        );
    }

    #[test]
    fn earlier_signature_wins() {
        // 以 "BM" 开头，同时在偏移 8 处含有 "WEBP"：WEBP 排在 BMP 之前。
        assert_eq!(
            sniff_format(b"BM\x00\x00\x00\x00\x00\x00WEBP").expect("match"),
            ImageKind::Webp
        );
    }

    #[test]
    fn empty_buffer_is_unrecognized() {
        let err = sniff_format(&[]).expect_err("empty buffer must fail");

        assert!(matches!(err, ImageError::UnrecognizedFormat(ref msg) if msg.contains("为空")));
    }

    #[test]
    fn non_image_payload_names_detected_mime() {
        let zip = [0x50, 0x4B, 0x03, 0x04, 0x14, 0x00, 0x00, 0x00];
        let err = sniff_format(&zip).expect_err("zip is not an image");

        assert!(matches!(err, ImageError::UnrecognizedFormat(ref msg) if msg.contains("zip")));
    }
}
