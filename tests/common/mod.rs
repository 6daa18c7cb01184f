#![allow(dead_code)]

use std::cell::RefCell;
use std::future::Future;
use std::io::{Cursor, Read, Write};
use std::net::TcpListener;
use std::path::PathBuf;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use headless_image::image_element::ImageEvent;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use tokio::task::LocalSet;

pub const BLACK_WHITE_PNG_2X1: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAIAAAABAQAAAADcWUInAAAACklEQVR4AWNwAAAAQgBBEu1RhgAAAABJRU5ErkJggg==";
pub const BROKEN_IMAGE: &str = "data:image/png;base64,";
pub const INVALID_DATA_URL: &str = "data:foobar";

pub const GIF_2X1: [u8; 35] = [
    71, 73, 70, 56, 55, 97, 2, 0, 1, 0, 240, 0, 0, 0, 0, 0, 255, 255, 255, 44, 0, 0, 0, 0, 2, 0,
    1, 0, 0, 2, 2, 68, 10, 0, 59,
];

/// 在 `LocalSet` 中运行测试主体。
pub async fn local<F: Future>(future: F) -> F::Output {
    LocalSet::new().run_until(future).await
}

/// 记录回调收到的事件。
pub type Events = Rc<RefCell<Vec<ImageEvent>>>;

pub fn recorder() -> (Events, impl Fn(&ImageEvent) + 'static) {
    let events: Events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    (events, move |event: &ImageEvent| sink.borrow_mut().push(event.clone()))
}

pub fn encode_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x * 40 % 255) as u8, (y * 40 % 255) as u8, 128])
    });

    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut cursor, format)
        .expect("failed to encode test image");
    cursor.into_inner()
}

/// 在临时目录写入测试文件，文件名带进程号避免并发冲突。
pub fn write_fixture(name: &str, bytes: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("headless-image-{}-{}", std::process::id(), name));
    std::fs::write(&path, bytes).expect("write fixture failed");
    path
}

/// 单连接 HTTP 测试服务器，可选延迟后响应。
pub fn serve_once(status: &str, body: Vec<u8>, delay: Duration) -> (String, thread::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server failed");
    let addr = listener.local_addr().expect("read local addr failed");
    let status = status.to_string();

    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept failed");

        let mut req_buf = [0u8; 2048];
        let _ = stream.read(&mut req_buf);

        thread::sleep(delay);

        let head = format!(
            "HTTP/1.1 {}\r\nContent-Type: image/png\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status,
            body.len()
        );
        stream.write_all(head.as_bytes()).expect("write headers failed");
        stream.write_all(&body).expect("write body failed");
        stream.flush().expect("flush failed");
    });

    (format!("http://127.0.0.1:{}", addr.port()), server)
}

/// 2×1、32 位深的 ICO 位图条目（BITMAPINFOHEADER + BGRA 像素 + AND 掩码）。
pub fn dib_2x1() -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&40u32.to_le_bytes());
    out.extend_from_slice(&2i32.to_le_bytes());
    out.extend_from_slice(&2i32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&32u16.to_le_bytes());
    out.extend_from_slice(&[0u8; 24]);
    out.extend_from_slice(&[0, 0, 0, 255, 255, 255, 255, 255]);
    out.extend_from_slice(&[0, 0, 0, 0]);
    out
}

/// 组装 ICO：每项 `(宽, 高, 位深, 内容)`。
pub fn build_ico(entries: &[(u32, u32, u16, Vec<u8>)]) -> Vec<u8> {
    let mut out = vec![0x00, 0x00, 0x01, 0x00];
    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());

    let mut offset = (6 + 16 * entries.len()) as u32;
    for (width, height, bit_count, data) in entries {
        out.extend_from_slice(&[(*width % 256) as u8, (*height % 256) as u8, 0, 0]);
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&bit_count.to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&offset.to_le_bytes());
        offset += data.len() as u32;
    }
    for (_, _, _, data) in entries {
        out.extend_from_slice(data);
    }
    out
}
