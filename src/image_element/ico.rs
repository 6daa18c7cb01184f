//! # ICO 容器模块
//!
//! ## 设计思路
//!
//! ICO 文件是多张图片的容器（不同尺寸、不同位深）。元素只展示其中一张，
//! 因此先解析目录、挑选“最佳”条目，再把该条目交给对应解码器。
//!
//! ## 实现思路
//!
//! - 目录：6 字节文件头 + 每条 16 字节的目录项。
//! - 选择：从第一项开始，后续条目只有在位深不低于当前最佳 **且** 面积不小于当前最佳时才替换它
//!   （两者都相等时偏向后出现的条目）。
//! - 条目内容以 PNG 签名开头时按 PNG 解码；否则是未压缩的位图条目，
//!   重新包装成只含一项的 ICO 交给 ICO 解码器。

use super::ImageError;
use super::sniff::is_png;

const HEADER_LEN: usize = 6;
const ENTRY_LEN: usize = 16;

/// ICO 目录项。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconEntry {
    pub width: u32,
    pub height: u32,
    pub color_count: u8,
    pub planes: u16,
    pub bit_count: u16,
    pub size: u32,
    pub offset: u32,
}

impl IconEntry {
    pub fn pixel_area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    fn parse(raw: &[u8]) -> Self {
        // 宽高字段为 0 表示 256。
        let dimension = |byte: u8| if byte == 0 { 256 } else { u32::from(byte) };

        Self {
            width: dimension(raw[0]),
            height: dimension(raw[1]),
            color_count: raw[2],
            planes: u16::from_le_bytes([raw[4], raw[5]]),
            bit_count: u16::from_le_bytes([raw[6], raw[7]]),
            size: u32::from_le_bytes([raw[8], raw[9], raw[10], raw[11]]),
            offset: u32::from_le_bytes([raw[12], raw[13], raw[14], raw[15]]),
        }
    }
}

/// 选中条目的内容。
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum IconPayload<'a> {
    /// 内嵌 PNG，可直接交给 PNG 解码器。
    Png(&'a [u8]),
    /// 重新包装后的单条目 ICO（位图条目）。
    Bitmap(Vec<u8>),
}

/// 已解析的 ICO 目录。
#[derive(Debug)]
pub struct IconDirectory<'a> {
    bytes: &'a [u8],
    entries: Vec<IconEntry>,
}

impl<'a> IconDirectory<'a> {
    /// 解析文件头与目录项。
    pub fn parse(bytes: &'a [u8]) -> Result<Self, ImageError> {
        let header = bytes
            .get(..HEADER_LEN)
            .ok_or_else(|| ImageError::Decode("ICO 文件头不完整".to_string()))?;

        if header[..4] != [0x00, 0x00, 0x01, 0x00] {
            return Err(ImageError::Decode("ICO 文件头无效".to_string()));
        }

        let count = usize::from(u16::from_le_bytes([header[4], header[5]]));
        if count == 0 {
            return Err(ImageError::Decode("ICO 不包含任何图片".to_string()));
        }

        let directory_end = HEADER_LEN + count * ENTRY_LEN;
        let directory = bytes
            .get(HEADER_LEN..directory_end)
            .ok_or_else(|| ImageError::Decode(format!("ICO 目录被截断（声明 {} 项）", count)))?;

        let entries = directory.chunks_exact(ENTRY_LEN).map(IconEntry::parse).collect();

        Ok(Self { bytes, entries })
    }

    pub fn entries(&self) -> &[IconEntry] {
        &self.entries
    }

    /// 挑选最佳条目。`parse` 保证目录非空。
    pub fn best_entry(&self) -> IconEntry {
        let mut best = self.entries[0];
        for entry in &self.entries[1..] {
            if entry.bit_count >= best.bit_count && entry.pixel_area() >= best.pixel_area() {
                best = *entry;
            }
        }
        best
    }

    /// 取出条目内容，并判断它是 PNG 还是位图。
    pub(crate) fn payload(&self, entry: &IconEntry) -> Result<IconPayload<'a>, ImageError> {
        let start = entry.offset as usize;
        let data = start
            .checked_add(entry.size as usize)
            .and_then(|end| self.bytes.get(start..end))
            .ok_or_else(|| {
                ImageError::Decode(format!(
                    "ICO 条目越界：offset={} size={} total={}",
                    entry.offset,
                    entry.size,
                    self.bytes.len()
                ))
            })?;

        if is_png(data) {
            return Ok(IconPayload::Png(data));
        }

        Ok(IconPayload::Bitmap(rewrap_single_entry(entry, data)))
    }
}

/// 把一个位图条目重新包装成只有一项的 ICO 文件。
fn rewrap_single_entry(entry: &IconEntry, data: &[u8]) -> Vec<u8> {
    let dimension_byte = |value: u32| if value >= 256 { 0 } else { value as u8 };
    let data_offset = (HEADER_LEN + ENTRY_LEN) as u32;

    let mut out = Vec::with_capacity(HEADER_LEN + ENTRY_LEN + data.len());
    out.extend_from_slice(&[0x00, 0x00, 0x01, 0x00, 0x01, 0x00]);
    out.push(dimension_byte(entry.width));
    out.push(dimension_byte(entry.height));
    out.push(entry.color_count);
    out.push(0);
    out.extend_from_slice(&entry.planes.to_le_bytes());
    out.extend_from_slice(&entry.bit_count.to_le_bytes());
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(&data_offset.to_le_bytes());
    out.extend_from_slice(data);
    out
}
