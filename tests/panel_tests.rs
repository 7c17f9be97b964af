// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the panel: stream reloads and camera settings

mod common;

use camera_panel::app::{ControlEvent, Message, StreamDisplay};
use camera_panel::backends::stream::{EventSink, StreamEvent};
use camera_panel::constants::{DEFAULT_FOCUS, STREAM_ERROR_BANNER};
use camera_panel::errors::StreamError;
use common::{Call, Harness, MockEncoders, MockFrames, test_frame};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;

fn failed(generation: u64) -> Message {
    Message::Stream(StreamEvent::Failed {
        generation,
        error: StreamError::Network("connection refused".into()),
    })
}

fn loaded(generation: u64) -> Message {
    Message::Stream(StreamEvent::Loaded {
        generation,
        frame: test_frame(8, 6),
    })
}

#[tokio::test(start_paused = true)]
async fn test_mount_connects_to_feed() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = Harness::new(dir.path(), MockEncoders::default());

    assert_eq!(h.panel.stream().source(), None);
    h.panel.mount();

    assert_eq!(h.frames.connect_count(), 1);
    assert_eq!(
        h.panel.stream().source(),
        Some("http://10.0.0.2:5000/video_feed")
    );
    assert!(!h.panel.stream().is_complete());

    h.panel.update(loaded(h.frames.last_generation()));
    assert!(h.panel.stream().is_complete());
    assert_eq!(h.panel.stream().current_frame().unwrap().width, 8);
}

#[tokio::test(start_paused = true)]
async fn test_failed_load_retries_after_one_second() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = Harness::new(dir.path(), MockEncoders::default());
    h.panel.mount();

    h.panel.update(failed(h.frames.last_generation()));
    assert_eq!(h.panel.stream().error(), Some(STREAM_ERROR_BANNER));
    assert!(!h.panel.stream().is_complete());
    assert_eq!(h.panel.stream().pending_retries(), 1);

    sleep(Duration::from_millis(900)).await;
    h.drain();
    assert_eq!(h.frames.connect_count(), 1);

    sleep(Duration::from_millis(200)).await;
    h.drain();
    assert_eq!(h.frames.connect_count(), 2);
    assert_eq!(
        h.panel.stream().source(),
        Some("http://10.0.0.2:5000/video_feed")
    );
    // Banner stays up until a load succeeds
    assert_eq!(h.panel.stream().error(), Some(STREAM_ERROR_BANNER));

    h.panel.update(loaded(h.frames.last_generation()));
    assert_eq!(h.panel.stream().error(), None);
    assert!(h.panel.stream().is_complete());
}

#[tokio::test(start_paused = true)]
async fn test_recovery_before_retry_adds_no_reload() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = Harness::new(dir.path(), MockEncoders::default());
    h.panel.mount();

    let generation = h.frames.last_generation();
    h.panel.update(failed(generation));
    sleep(Duration::from_millis(300)).await;
    h.drain();

    h.panel.update(loaded(generation));
    assert_eq!(h.panel.stream().error(), None);
    assert!(h.panel.stream().is_complete());
    assert_eq!(h.panel.stream().pending_retries(), 1);

    // Only the reload scheduled by the error runs
    sleep(Duration::from_millis(1100)).await;
    h.drain();
    assert_eq!(h.frames.connect_count(), 2);
    assert_eq!(h.panel.stream().pending_retries(), 0);

    sleep(Duration::from_secs(2)).await;
    h.drain();
    assert_eq!(h.frames.connect_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_errors_each_reload() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = Harness::new(dir.path(), MockEncoders::default());
    h.panel.mount();

    let generation = h.frames.last_generation();
    h.panel.update(failed(generation));
    h.panel.update(failed(generation));
    assert_eq!(h.panel.stream().pending_retries(), 2);

    sleep(Duration::from_millis(1100)).await;
    h.drain();
    assert_eq!(h.frames.connect_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_stale_connection_events_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = Harness::new(dir.path(), MockEncoders::default());
    h.panel.mount();

    let first = h.frames.last_generation();
    h.panel.update(failed(first));
    sleep(Duration::from_millis(1100)).await;
    h.drain();
    assert_eq!(h.frames.connect_count(), 2);

    // A frame from the replaced connection does not clear the banner
    h.panel.update(loaded(first));
    assert_eq!(h.panel.stream().error(), Some(STREAM_ERROR_BANNER));
    assert!(!h.panel.stream().is_complete());

    // Nor does a late failure schedule another reload
    h.panel.update(failed(first));
    assert_eq!(h.panel.stream().pending_retries(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unmount_cancels_pending_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = Harness::new(dir.path(), MockEncoders::default());
    h.panel.mount();

    h.panel.update(failed(h.frames.last_generation()));
    h.panel.unmount();
    assert_eq!(h.panel.stream().source(), None);

    sleep(Duration::from_secs(3)).await;
    h.drain();
    assert_eq!(h.frames.connect_count(), 1);
    assert!(!h.panel.stream().is_mounted());
}

#[tokio::test(start_paused = true)]
async fn test_url_change_replaces_connection() {
    let frames = Arc::new(MockFrames::default());
    let (sender, mut events) = mpsc::unbounded_channel();
    let sink: EventSink = Arc::new(move |event| {
        let _ = sender.send(event);
    });
    let mut display = StreamDisplay::new("http://a/video_feed", frames.clone(), sink);
    display.mount();

    display.handle(StreamEvent::Failed {
        generation: frames.last_generation(),
        error: StreamError::Ended,
    });
    display.set_url("http://b/video_feed");
    assert_eq!(display.source(), Some("http://b/video_feed"));
    assert_eq!(frames.connect_count(), 2);

    // The retry scheduled for the old URL never fires
    sleep(Duration::from_secs(2)).await;
    while let Ok(event) = events.try_recv() {
        display.handle(event);
    }
    assert_eq!(frames.connect_count(), 2);

    display.set_url("http://b/video_feed");
    assert_eq!(frames.connect_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_clock_ticks_while_mounted() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = Harness::new(dir.path(), MockEncoders::default());
    h.panel.mount();
    assert!(!h.panel.timestamp().is_empty());

    sleep(Duration::from_millis(2500)).await;
    let mut ticks = 0;
    while let Ok(message) = h.messages.try_recv() {
        if matches!(message, Message::Tick) {
            ticks += 1;
        }
        h.panel.update(message);
    }
    assert_eq!(ticks, 2);

    h.panel.unmount();
    sleep(Duration::from_secs(2)).await;
    assert!(h.messages.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_focus_applies_after_confirmation() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = Harness::new(dir.path(), MockEncoders::default());

    h.panel.set_focus(55);
    assert_eq!(h.panel.settings().focus, DEFAULT_FOCUS);

    let message = h.next().await;
    assert!(message.starts_with("FocusResult"));
    assert_eq!(h.panel.settings().focus, 55);
    assert_eq!(h.camera.calls(), vec![Call::Focus(55)]);
    assert!(h.panel.notice().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_failed_focus_keeps_previous_value() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = Harness::new(dir.path(), MockEncoders::default());
    h.camera.set_failing(true);

    h.panel.set_focus(80);
    h.next().await;

    assert_eq!(h.panel.settings().focus, DEFAULT_FOCUS);
    assert_eq!(h.camera.calls(), vec![Call::Focus(80)]);
    assert!(h.panel.notice().unwrap().starts_with("Focus not set"));
}

#[tokio::test(start_paused = true)]
async fn test_backlight_toggle() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = Harness::new(dir.path(), MockEncoders::default());
    assert!(h.panel.settings().backlight_enabled);

    h.panel.handle_control(ControlEvent::BacklightToggled(false));
    h.next().await;
    assert!(!h.panel.settings().backlight_enabled);

    h.camera.set_failing(true);
    h.panel.handle_control(ControlEvent::BacklightToggled(true));
    h.next().await;
    assert!(!h.panel.settings().backlight_enabled);
    assert_eq!(
        h.camera.calls(),
        vec![Call::Backlight(false), Call::Backlight(true)]
    );
}
