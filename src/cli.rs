// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for camera operations
//!
//! This module provides command-line functionality for:
//! - Changing focus and backlight
//! - Querying the backlight state
//! - Recording the video feed without the terminal UI

use camera_panel::app::{Message, Panel, Services};
use camera_panel::backends::camera::{CameraControl, HttpCameraClient};
use camera_panel::config::Config;
use camera_panel::constants::{ANIMATION_FRAME_INTERVAL, FOCUS_MAX};
use camera_panel::media::encoders::log_available_encoders;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// How long `record` waits for the first frame
const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(10);

fn client(config: &Config) -> Result<HttpCameraClient, Box<dyn std::error::Error>> {
    Ok(HttpCameraClient::new(
        &config.camera_url,
        config.request_timeout(),
    )?)
}

/// Set the focus level once
pub fn set_focus(config: &Config, value: u8) -> Result<(), Box<dyn std::error::Error>> {
    if value > FOCUS_MAX {
        return Err(format!("Focus must be between 0 and {}", FOCUS_MAX).into());
    }

    let client = client(config)?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(client.set_focus(value))?;

    println!("Focus set to {}", value);
    Ok(())
}

/// Switch backlight compensation once
pub fn set_backlight(config: &Config, enabled: bool) -> Result<(), Box<dyn std::error::Error>> {
    let client = client(config)?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(client.set_backlight(enabled))?;

    println!("Backlight {}", if enabled { "on" } else { "off" });
    Ok(())
}

/// Print the backlight state reported by the camera
pub fn show_status(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let client = client(config)?;
    let rt = tokio::runtime::Runtime::new()?;
    let status = rt.block_on(client.backlight_status())?;

    println!("Camera: {}", client.base_url());
    println!(
        "Backlight: {}",
        if status.backlight_enabled { "on" } else { "off" }
    );
    Ok(())
}

/// Record the video feed for `duration` seconds
pub fn record(
    mut config: Config,
    duration: u64,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize GStreamer
    gstreamer::init()?;
    log_available_encoders();

    if let Some(dir) = output {
        config.recordings_dir = Some(dir);
    }
    println!("Camera: {}", config.camera_url);
    println!("Output: {}", config.recordings_dir().display());
    println!("Duration: {} seconds", duration);

    let services = Services::production(&config)?;

    // Set up Ctrl+C handler
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let (mut panel, mut messages) = Panel::new(config, services);
        panel.mount();

        // Wait for the feed before starting
        println!("Connecting...");
        let start = Instant::now();
        while !panel.stream().is_complete() {
            if start.elapsed() > FIRST_FRAME_TIMEOUT || stop_flag.load(Ordering::SeqCst) {
                panel.unmount();
                return Err::<(), Box<dyn std::error::Error>>(
                    "No frame received from the video feed".into(),
                );
            }
            while let Ok(message) = messages.try_recv() {
                panel.update(message);
            }
            tokio::time::sleep(ANIMATION_FRAME_INTERVAL).await;
        }

        panel.start_recording();
        if let Some(alert) = panel.alert() {
            let alert = alert.to_string();
            panel.unmount();
            return Err(alert.into());
        }

        println!();
        println!("Recording... (press Ctrl+C to stop early)");

        let start = Instant::now();
        let target_duration = Duration::from_secs(duration);
        while start.elapsed() < target_duration && panel.is_recording() {
            if stop_flag.load(Ordering::SeqCst) {
                println!();
                println!("Stopping early...");
                break;
            }

            while let Ok(message) = messages.try_recv() {
                panel.update(message);
            }
            panel.animation_frame(Instant::now());

            // Print progress
            let elapsed = start.elapsed().as_secs();
            print!("\rRecording: {:02}:{:02}", elapsed / 60, elapsed % 60);
            std::io::Write::flush(&mut std::io::stdout())?;

            tokio::time::sleep(ANIMATION_FRAME_INTERVAL).await;
        }
        println!();

        if let Some(notice) = panel.notice()
            && !panel.is_recording()
        {
            // The encoder failed mid-recording
            let notice = notice.to_string();
            panel.unmount();
            return Err(notice.into());
        }

        // Stop recording and wait for the file
        panel.unmount();
        for handle in panel.take_pending_saves() {
            handle.await?;
        }

        while let Ok(message) = messages.try_recv() {
            match message {
                Message::RecordingSaved(path) => println!("Video saved: {}", path.display()),
                Message::RecordingFailed(e) => return Err(e.into()),
                _ => {}
            }
        }
        Ok(())
    })
}
