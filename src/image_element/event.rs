//! # 事件模型
//!
//! `load` / `error` 事件是不可变快照。`bubbles`、`cancelable` 等字段只为接口兼容而保留，
//! 不影响任何行为。

use std::fmt;
use std::rc::Rc;
use std::time::Instant;

use once_cell::sync::Lazy;

use super::{Image, ImageError};

/// 时间原点：首次读取时确定，`time_stamp` 相对它计算。
static TIME_ORIGIN: Lazy<Instant> = Lazy::new(Instant::now);

/// `Event.AT_TARGET`
pub const AT_TARGET: u16 = 2;

/// 单槽回调（对应 `onload` / `onerror` 属性，不是监听器列表）。
pub type EventHandler = Rc<dyn Fn(&ImageEvent)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Load,
    Error,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Error => "error",
        }
    }
}

/// 传给回调的事件快照。
#[derive(Clone)]
pub struct ImageEvent {
    kind: EventKind,
    target: Image,
    time_stamp: f64,
    error: Option<ImageError>,
}

impl ImageEvent {
    pub(crate) fn load(target: Image) -> Self {
        Self::new(EventKind::Load, target, None)
    }

    pub(crate) fn error(target: Image, error: ImageError) -> Self {
        Self::new(EventKind::Error, target, Some(error))
    }

    fn new(kind: EventKind, target: Image, error: Option<ImageError>) -> Self {
        Self {
            kind,
            target,
            time_stamp: TIME_ORIGIN.elapsed().as_secs_f64() * 1000.0,
            error,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// 事件类型字符串：`"load"` 或 `"error"`。
    pub fn event_type(&self) -> &'static str {
        self.kind.as_str()
    }

    pub fn target(&self) -> &Image {
        &self.target
    }

    pub fn current_target(&self) -> &Image {
        &self.target
    }

    /// 单调时间戳（毫秒，相对进程内时间原点）。
    pub fn time_stamp(&self) -> f64 {
        self.time_stamp
    }

    /// 导致 `error` 事件的错误；`load` 事件为 `None`。
    pub fn error_detail(&self) -> Option<&ImageError> {
        self.error.as_ref()
    }

    pub fn bubbles(&self) -> bool {
        false
    }

    pub fn cancelable(&self) -> bool {
        false
    }

    pub fn default_prevented(&self) -> bool {
        false
    }

    pub fn event_phase(&self) -> u16 {
        AT_TARGET
    }
}

impl fmt::Debug for ImageEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageEvent")
            .field("type", &self.event_type())
            .field("target", &self.target)
            .field("time_stamp", &self.time_stamp)
            .field("error", &self.error)
            .finish()
    }
}
