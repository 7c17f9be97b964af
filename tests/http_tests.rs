// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the HTTP control client and the MJPEG feed,
//! served from a local listener

use camera_panel::backends::camera::{CameraControl, HttpCameraClient};
use camera_panel::backends::stream::{EventSink, FrameSource, HttpFrameSource, StreamEvent};
use camera_panel::errors::{CameraError, StreamError};
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

const TIMEOUT: Duration = Duration::from_secs(5);

/// Answer one connection per canned response, in order, recording the
/// request line of each
async fn serve(responses: Vec<Vec<u8>>) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));

    let seen = requests.clone();
    tokio::spawn(async move {
        for response in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            let line = String::from_utf8_lossy(&head)
                .lines()
                .next()
                .unwrap_or_default()
                .to_string();
            seen.lock().unwrap().push(line);

            socket.write_all(&response).await.unwrap();
            let _ = socket.shutdown().await;
        }
    });

    (format!("http://{}", addr), requests)
}

fn response(status: &str, headers: &[(&str, &str)], body: &[u8]) -> Vec<u8> {
    let mut out = format!("HTTP/1.1 {}\r\nConnection: close\r\n", status).into_bytes();
    for (name, value) in headers {
        out.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
    }
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(body);
    out
}

fn empty(status: &str) -> Vec<u8> {
    response(status, &[("Content-Length", "0")], b"")
}

fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbImage::from_pixel(width, height, image::Rgb([10, 200, 30]));
    let mut out = Vec::new();
    image::DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Jpeg)
        .unwrap();
    out
}

fn multipart_body(parts: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    for part in parts {
        out.extend_from_slice(b"--frame\r\nContent-Type: image/jpeg\r\n");
        out.extend_from_slice(format!("Content-Length: {}\r\n\r\n", part.len()).as_bytes());
        out.extend_from_slice(part);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"--frame--\r\n");
    out
}

fn client(base_url: &str) -> HttpCameraClient {
    HttpCameraClient::new(base_url, Duration::from_secs(2)).unwrap()
}

/// Connect through `HttpFrameSource` and collect events up to the failure
async fn feed_events(url: &str, generation: u64) -> Vec<StreamEvent> {
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let sink: EventSink = Arc::new(move |event| {
        let _ = sender.send(event);
    });
    let source = HttpFrameSource::new(Duration::from_secs(2)).unwrap();
    let _connection = source.connect(url, generation, sink);

    let mut events = Vec::new();
    loop {
        let event = tokio::time::timeout(TIMEOUT, receiver.recv())
            .await
            .expect("feed produced no event")
            .expect("sink dropped");
        let done = matches!(event, StreamEvent::Failed { .. });
        events.push(event);
        if done {
            return events;
        }
    }
}

#[tokio::test]
async fn test_focus_success_on_any_2xx() {
    let (url, requests) = serve(vec![empty("200 OK"), empty("204 No Content")]).await;
    let camera = client(&url);

    camera.set_focus(42).await.unwrap();
    camera.set_focus(0).await.unwrap();

    assert_eq!(
        *requests.lock().unwrap(),
        vec!["GET /set_focus/42 HTTP/1.1", "GET /set_focus/0 HTTP/1.1"]
    );
}

#[tokio::test]
async fn test_focus_non_2xx_is_status_error() {
    let (url, _) = serve(vec![empty("500 Internal Server Error")]).await;

    let result = client(&url).set_focus(42).await;
    assert_eq!(result, Err(CameraError::Status(500)));
}

#[tokio::test]
async fn test_focus_out_of_range_sends_nothing() {
    let (url, requests) = serve(Vec::new()).await;

    let result = client(&url).set_focus(101).await;
    assert_eq!(result, Err(CameraError::InvalidFocus(101)));
    assert!(requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_backlight_paths_and_status() {
    let status = response(
        "200 OK",
        &[("Content-Type", "application/json"), ("Content-Length", "26")],
        br#"{"backlight_enabled":true}"#,
    );
    let (url, requests) = serve(vec![
        empty("200 OK"),
        empty("404 Not Found"),
        status,
    ])
    .await;
    let camera = client(&url);

    camera.set_backlight(true).await.unwrap();
    assert_eq!(
        camera.set_backlight(false).await,
        Err(CameraError::Status(404))
    );
    assert!(camera.backlight_status().await.unwrap().backlight_enabled);

    assert_eq!(
        *requests.lock().unwrap(),
        vec![
            "GET /set_backlight/1 HTTP/1.1",
            "GET /set_backlight/0 HTTP/1.1",
            "GET /get_backlight HTTP/1.1",
        ]
    );
}

#[tokio::test]
async fn test_unreachable_camera_is_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = client(&format!("http://{}", addr)).set_focus(10).await;
    assert!(matches!(result, Err(CameraError::Network(_))));
}

#[tokio::test]
async fn test_feed_parts_become_loaded_frames() {
    let body = multipart_body(&[jpeg(4, 2), jpeg(4, 2)]);
    let feed = response(
        "200 OK",
        &[("Content-Type", "multipart/x-mixed-replace; boundary=frame")],
        &body,
    );
    let (url, requests) = serve(vec![feed]).await;

    let events = feed_events(&format!("{}/video_feed", url), 7).await;

    assert_eq!(events.len(), 3);
    for event in &events[..2] {
        let StreamEvent::Loaded { generation, frame } = event else {
            panic!("expected a frame, got {:?}", event);
        };
        assert_eq!(*generation, 7);
        assert_eq!((frame.width, frame.height), (4, 2));
    }
    assert!(matches!(
        events[2],
        StreamEvent::Failed {
            generation: 7,
            error: StreamError::Ended
        }
    ));
    assert_eq!(
        *requests.lock().unwrap(),
        vec!["GET /video_feed HTTP/1.1"]
    );
}

#[tokio::test]
async fn test_non_multipart_feed_rejected() {
    let body = jpeg(4, 2);
    let length = body.len().to_string();
    let feed = response(
        "200 OK",
        &[("Content-Type", "image/jpeg"), ("Content-Length", length.as_str())],
        &body,
    );
    let (url, _) = serve(vec![feed]).await;

    let events = feed_events(&format!("{}/video_feed", url), 1).await;

    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        StreamEvent::Failed {
            error: StreamError::NotMultipart(content_type),
            ..
        } if content_type == "image/jpeg"
    ));
}

#[tokio::test]
async fn test_feed_status_error() {
    let (url, _) = serve(vec![empty("503 Service Unavailable")]).await;

    let events = feed_events(&format!("{}/video_feed", url), 2).await;

    assert!(matches!(
        events.as_slice(),
        [StreamEvent::Failed {
            generation: 2,
            error: StreamError::Status(503)
        }]
    ));
}
