//! # headless-image：命令行探测工具
//!
//! 用法：`headless-image <src> [config.json]`
//!
//! 通过 `Image` 元素加载任意来源（data URL / http(s) / 本地文件），
//! 等待 `load` 或 `error` 事件后输出 JSON 报告。

use std::cell::RefCell;
use std::process::ExitCode;
use std::rc::Rc;

use headless_image::error::AppError;
use headless_image::image_element::{EventKind, Image, ImageConfig, ImageError};
use serde::Serialize;
use tokio::task::{JoinError, LocalSet};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoadReport {
    src: String,
    event: Option<&'static str>,
    complete: bool,
    width: u32,
    height: u32,
    natural_width: u32,
    natural_height: u32,
    error: Option<AppError>,
}

type Outcome = Rc<RefCell<Option<(EventKind, Option<ImageError>)>>>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let local = LocalSet::new();

    match local.run_until(run(args)).await {
        Ok(report) => {
            let failed = report.error.is_some();
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{}", json),
                Err(err) => {
                    log::error!("序列化报告失败: {}", err);
                    return ExitCode::from(2);
                }
            }
            if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
        }
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::from(2)
        }
    }
}

async fn run(args: Vec<String>) -> Result<LoadReport, AppError> {
    let mut args = args.into_iter();
    let src = args
        .next()
        .ok_or_else(|| AppError::Config("用法：headless-image <src> [config.json]".to_string()))?;

    let config = match args.next() {
        Some(path) => ImageConfig::load(path)?,
        None => ImageConfig::default(),
    };

    let image = Image::with_config(config)?;
    let pending = image.set_src(src.clone());

    // 赋值之后再安装回调：事件总在下一轮次触发，不会错过。
    let outcome: Outcome = Rc::new(RefCell::new(None));
    let on_load = Rc::clone(&outcome);
    image.set_onload(move |event| {
        *on_load.borrow_mut() = Some((event.kind(), None));
    });
    let on_error = Rc::clone(&outcome);
    image.set_onerror(move |event| {
        *on_error.borrow_mut() = Some((event.kind(), event.error_detail().cloned()));
    });

    pending.await.map_err(join_error_to_app_error)?;

    let (event, error) = match outcome.borrow_mut().take() {
        Some((kind, error)) => (Some(kind.as_str()), error.map(AppError::from)),
        None => (None, None),
    };

    Ok(LoadReport {
        src,
        event,
        complete: image.complete(),
        width: image.width(),
        height: image.height(),
        natural_width: image.natural_width(),
        natural_height: image.natural_height(),
        error,
    })
}

fn join_error_to_app_error(err: JoinError) -> AppError {
    if err.is_cancelled() {
        AppError::Unhandled("加载任务被取消".to_string())
    } else {
        AppError::Unhandled(format!("加载任务异常终止：{}", err))
    }
}
