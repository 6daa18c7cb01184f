//! # headless-image：库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                调用方（运行在 LocalSet 中）                │
//! │                                                          │
//! │   Image::set_src / set_width / set_onload / ...          │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↓
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↓           image_element                          │
//! │                                                          │
//! │  ┌─ element ──── 状态机（complete / 尺寸 / 回调）          │
//! │  ├─ source ───── 来源分类 data: / http(s): / 文件          │
//! │  ├─ loader ───── base64 解码 · reqwest 下载 · tokio::fs    │
//! │  ├─ sniff ────── 文件签名识别                             │
//! │  ├─ ico ──────── ICO 最佳条目选择                         │
//! │  └─ pipeline ─── image crate 解码 → RGBA8                 │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 应用级错误 `AppError`（命令行工具使用） |
//! | [`image_element`] | `Image` 元素、加载器、格式识别与解码调度 |

pub mod error;
pub mod image_element;
