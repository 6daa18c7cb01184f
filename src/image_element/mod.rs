//! # 图片元素模块（image_element）
//!
//! ## 设计思路
//!
//! 该模块在非浏览器环境中模拟 `<img>`：“来源分类 → 取字节 → 签名识别 → 解码 → 状态更新 → 延迟回调”
//! 按职责拆分为多个子模块，避免单文件膨胀与耦合。
//!
//! - `element`：`Image` 状态机与对外函数（`image_data` / `image_from_buffer` / `image_from_image_data`）
//! - `source`：来源分类与中间数据模型
//! - `loader`：data URL / 网络 / 文件三种取字节策略
//! - `sniff`：文件签名识别
//! - `ico`：ICO 目录解析与最佳条目选择
//! - `pipeline`：按格式调度解码器，并执行像素上限校验
//! - `dimension`：`width` / `height` 的数值换算规则
//! - `event`：`load` / `error` 事件快照
//! - `config/error`：配置与错误
//!
//! ## 新同事快速上手
//!
//! ```text
//! Image::set_src
//!    ↓（同步：清空旧图片、complete = false）
//! spawn_local 派发加载任务
//!    ├─ source.rs（分类：data URL / 网络 / 文件）
//!    ├─ loader.rs（取字节 + 体积限制）
//!    └─ pipeline.rs（sniff.rs 识别 → ico.rs 选条目 → image crate 解码）
//!    ↓
//! element.rs 写入状态 → yield_now → onload / onerror
//! ```
//!
//! 所有 `Image` 操作都必须在 `tokio::task::LocalSet` 中进行。

mod config;
mod dimension;
mod element;
mod error;
mod event;
mod ico;
mod loader;
mod pipeline;
mod sniff;
mod source;

pub use config::{DEFAULT_USER_AGENT, ImageConfig};
pub use dimension::{DimensionValue, MAX_DIMENSION, coerce_dimension};
pub use element::{Image, image_data, image_from_buffer, image_from_image_data};
pub use error::{ImageError, UnhandledImageError};
pub use event::{AT_TARGET, EventHandler, EventKind, ImageEvent};
pub use ico::{IconDirectory, IconEntry};
pub use sniff::{ImageKind, sniff_format};
pub use source::{DecodedImage, ImageSource};
