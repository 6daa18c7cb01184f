//! # 图片元素（核心状态机）
//!
//! ## 设计思路
//!
//! `Image` 对应浏览器的 `HTMLImageElement`：设置 `src` 后异步取字节、识别格式、解码，
//! 并在下一个调度轮次触发 `onload` / `onerror`。
//!
//! 状态只有两种：空闲（`complete == true`）与加载中（`complete == false`）。
//!
//! ```text
//! set_src ──▶ 加载中 ──成功──▶ 空闲（持有新的 DecodedImage）──下一轮──▶ onload
//!               │
//!               └──失败──▶ 空闲（无图片）──下一轮──▶ onerror（未安装则终止进程）
//! ```
//!
//! ## 实现思路
//!
//! - 单线程协作式调度：`Rc<RefCell<_>>` 持有状态，加载任务用 `tokio::task::spawn_local`
//!   派发，因此必须在 `tokio::task::LocalSet` 内使用。
//! - `set_src` 同步清空旧图片并置 `complete = false`，随后才派发加载任务，调用方永远不会被阻塞。
//! - 终态回调前固定 `yield_now` 一次：同一轮次内先赋值 `src`、后安装回调也一定能收到事件。
//! - 加载不可取消：先发起的慢加载完成时仍会写入结果并触发回调，可能覆盖后发起的加载结果。
//!   这与浏览器早期实现保持一致，没有引入代次计数。

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use bytes::Bytes;
use tokio::task::JoinHandle;

use super::dimension::{DimensionValue, coerce_dimension};
use super::event::{EventHandler, ImageEvent};
use super::source::{DecodedImage, ImageSource, RawImageData};
use super::{ImageConfig, ImageError, UnhandledImageError, loader, pipeline};

/// 图片元素句柄。
///
/// `Clone` 只复制句柄，所有克隆共享同一份状态（相当于同一个 DOM 节点的多个引用）。
#[derive(Clone)]
pub struct Image {
    inner: Rc<RefCell<ImageState>>,
}

struct ImageState {
    complete: bool,
    src: String,
    width: Option<u32>,
    height: Option<u32>,
    decoded: Option<Rc<DecodedImage>>,
    onload: Option<EventHandler>,
    onerror: Option<EventHandler>,
    config: Arc<ImageConfig>,
}

impl Image {
    pub fn new() -> Self {
        Self::from_config(Arc::new(ImageConfig::default()))
    }

    /// 对应 `new Image(width, height)`，两个值都按属性规则换算。
    pub fn with_size(width: impl DimensionValue, height: impl DimensionValue) -> Self {
        let image = Self::new();
        image.set_width(width);
        image.set_height(height);
        image
    }

    /// 对应 `new Image(width)`：只设置显式宽度，高度仍跟随自然高度。
    pub fn with_width(width: impl DimensionValue) -> Self {
        let image = Self::new();
        image.set_width(width);
        image
    }

    /// 只设置显式高度，宽度仍跟随自然宽度。
    pub fn with_height(height: impl DimensionValue) -> Self {
        let image = Self::new();
        image.set_height(height);
        image
    }

    /// 使用自定义加载配置创建元素，配置先经过 [`ImageConfig::validate`]。
    pub fn with_config(config: ImageConfig) -> Result<Self, ImageError> {
        config.validate()?;
        Ok(Self::from_config(Arc::new(config)))
    }

    fn from_config(config: Arc<ImageConfig>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ImageState {
                complete: true,
                src: String::new(),
                width: None,
                height: None,
                decoded: None,
                onload: None,
                onerror: None,
                config,
            })),
        }
    }

    /// 当前没有进行中的加载时为 `true`。
    pub fn complete(&self) -> bool {
        self.inner.borrow().complete
    }

    pub fn src(&self) -> String {
        self.inner.borrow().src.clone()
    }

    /// 设置来源并派发加载任务。
    ///
    /// 返回加载任务的 `JoinHandle`；丢弃它不会取消加载。
    /// 未安装 `onerror` 时加载失败是致命错误：记录 [`UnhandledImageError`] 后调用
    /// `std::process::abort` 终止进程，与句柄是否被等待无关。
    ///
    /// # Panics
    ///
    /// 不在 `tokio::task::LocalSet` 内调用时 panic。
    ///
    /// # 示例
    /// ```rust,ignore
    /// use headless_image::image_element::Image;
    ///
    /// let local = tokio::task::LocalSet::new();
    /// local.run_until(async {
    ///     let image = Image::new();
    ///     let pending = image.set_src("fixtures/2x1.png");
    ///     image.set_onload(|event| println!("{} loaded", event.target().src()));
    ///     pending.await.expect("load task failed");
    /// }).await;
    /// ```
    pub fn set_src(&self, src: impl Into<String>) -> JoinHandle<()> {
        let src = src.into();
        let config = {
            let mut state = self.inner.borrow_mut();
            state.complete = false;
            state.decoded = None;
            state.src.clone_from(&src);
            Arc::clone(&state.config)
        };

        let source = ImageSource::classify(&src);
        let image = self.clone();

        tokio::task::spawn_local(async move {
            log::info!("🖼️ 开始加载图片 - 来源: {}", source.log_label());

            let result = match loader::load_source(&source, &config).await {
                Ok(raw) => pipeline::decode_off_thread(raw, config).await,
                Err(error) => Err(error),
            };

            match result {
                Ok(decoded) => image.fire_load(decoded).await,
                Err(error) => {
                    log::warn!(
                        "⚠️ 图片加载失败 - 来源: {} 错误: {}",
                        source.log_label(),
                        error
                    );
                    image.fire_error(src, error).await;
                }
            }
        })
    }

    /// 显式宽度优先，否则为自然宽度。
    pub fn width(&self) -> u32 {
        let state = self.inner.borrow();
        state.width.unwrap_or_else(|| natural(&state.decoded, DecodedImage::width))
    }

    pub fn set_width(&self, value: impl DimensionValue) {
        self.inner.borrow_mut().width = Some(coerce_dimension(value));
    }

    /// 显式高度优先，否则为自然高度。
    pub fn height(&self) -> u32 {
        let state = self.inner.borrow();
        state.height.unwrap_or_else(|| natural(&state.decoded, DecodedImage::height))
    }

    pub fn set_height(&self, value: impl DimensionValue) {
        self.inner.borrow_mut().height = Some(coerce_dimension(value));
    }

    /// 最近一次完成的解码结果的宽度，没有则为 0。
    pub fn natural_width(&self) -> u32 {
        natural(&self.inner.borrow().decoded, DecodedImage::width)
    }

    pub fn natural_height(&self) -> u32 {
        natural(&self.inner.borrow().decoded, DecodedImage::height)
    }

    pub fn onload(&self) -> Option<EventHandler> {
        self.inner.borrow().onload.clone()
    }

    /// 安装 `onload`，替换之前的回调。
    pub fn set_onload<F>(&self, handler: F)
    where
        F: Fn(&ImageEvent) + 'static,
    {
        self.inner.borrow_mut().onload = Some(Rc::new(handler));
    }

    pub fn clear_onload(&self) {
        self.inner.borrow_mut().onload = None;
    }

    pub fn onerror(&self) -> Option<EventHandler> {
        self.inner.borrow().onerror.clone()
    }

    /// 安装 `onerror`，替换之前的回调。
    pub fn set_onerror<F>(&self, handler: F)
    where
        F: Fn(&ImageEvent) + 'static,
    {
        self.inner.borrow_mut().onerror = Some(Rc::new(handler));
    }

    pub fn clear_onerror(&self) {
        self.inner.borrow_mut().onerror = None;
    }

    /// 两个句柄是否指向同一个元素。
    pub fn ptr_eq(&self, other: &Image) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// 写入解码结果并标记完成（不触发回调）。
    fn store_decoded(&self, decoded: DecodedImage) {
        let mut state = self.inner.borrow_mut();
        state.decoded = Some(Rc::new(decoded));
        state.complete = true;
    }

    async fn fire_load(&self, decoded: DecodedImage) {
        self.store_decoded(decoded);

        tokio::task::yield_now().await;

        // 回调可能再次访问本元素，调用前必须释放借用。
        let handler = self.onload();
        if let Some(handler) = handler {
            handler(&ImageEvent::load(self.clone()));
        }
    }

    async fn fire_error(&self, src: String, error: ImageError) {
        self.inner.borrow_mut().complete = true;

        tokio::task::yield_now().await;

        let handler = self.onerror();
        match handler {
            Some(handler) => handler(&ImageEvent::error(self.clone(), error)),
            None => {
                let unhandled = UnhandledImageError { src, error };
                log::error!("❌ 图片加载失败且未安装 onerror，进程终止：{}", unhandled);
                // 日志可能尚未初始化，致命信息必须落到 stderr。
                eprintln!("{}", unhandled);
                std::process::abort();
            }
        }
    }
}

impl Default for Image {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Ok(state) = self.inner.try_borrow() else {
            return f.write_str("Image { <borrowed> }");
        };

        f.debug_struct("Image")
            .field("src", &ImageSource::classify(&state.src).log_label())
            .field("complete", &state.complete)
            .field("width", &state.width)
            .field("height", &state.height)
            .field("natural_width", &natural(&state.decoded, DecodedImage::width))
            .field("natural_height", &natural(&state.decoded, DecodedImage::height))
            .finish()
    }
}

fn natural(decoded: &Option<Rc<DecodedImage>>, dimension: fn(&DecodedImage) -> u32) -> u32 {
    decoded.as_deref().map_or(0, dimension)
}

/// 读取元素当前的解码结果。
pub fn image_data(image: &Image) -> Option<Rc<DecodedImage>> {
    image.inner.borrow().decoded.clone()
}

/// 直接解码内存中的字节（不经过来源分类），得到已完成的元素。
///
/// # 示例
/// ```rust,ignore
/// let image = headless_image::image_element::image_from_buffer(&gif_bytes).await?;
/// assert!(image.complete());
/// ```
pub async fn image_from_buffer(buffer: &[u8]) -> Result<Image, ImageError> {
    let raw = RawImageData {
        bytes: Bytes::copy_from_slice(buffer),
        source_hint: "buffer",
    };
    let decoded = pipeline::decode_off_thread(raw, Arc::new(ImageConfig::default())).await?;

    Ok(image_from_image_data(decoded).await)
}

/// 把已解码的图片包装成已完成的元素。
pub async fn image_from_image_data(decoded: DecodedImage) -> Image {
    let image = Image::new();
    image.store_decoded(decoded);
    image
}
