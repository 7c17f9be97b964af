// SPDX-License-Identifier: GPL-3.0-only

//! Terminal control panel
//!
//! Renders the camera feed to the terminal using Unicode half-block
//! characters for improved vertical resolution, with the focus/backlight
//! controls, the clock and the recording indicator around it.

use crate::app::controls::{self, ControlsView};
use crate::app::{Panel, Services};
use crate::backends::camera::CameraFrame;
use crate::config::Config;
use crate::constants::ANIMATION_FRAME_INTERVAL;
use crate::media::encoders::log_available_encoders;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use std::io::{self, stdout};
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Run the terminal panel until the user quits
pub fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize GStreamer
    gstreamer::init()?;
    log_available_encoders();

    let runtime = tokio::runtime::Runtime::new()?;
    let services = Services::production(&config)?;

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let result = {
        let _guard = runtime.enter();
        run_app(&mut terminal, config, services)
    };

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    let pending_saves = result?;
    if !pending_saves.is_empty() {
        println!("Saving recording...");
    }
    for handle in pending_saves {
        if let Err(e) = runtime.block_on(handle) {
            error!(error = %e, "Recording save task failed");
        }
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: Config,
    services: Services,
) -> Result<Vec<JoinHandle<()>>, Box<dyn std::error::Error>> {
    let (mut panel, mut messages) = Panel::new(config, services);
    panel.mount();
    info!(url = %panel.stream().url(), "Terminal panel started");

    let mut show_help = false;

    loop {
        // Drain everything background work reported since the last frame
        while let Ok(message) = messages.try_recv() {
            panel.update(message);
        }

        panel.animation_frame(Instant::now());

        terminal.draw(|f| draw(f, &panel, show_help))?;

        // Handle input with timeout for frame updates
        if event::poll(ANIMATION_FRAME_INTERVAL)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            // Any key dismisses an alert
            if panel.alert().is_some() {
                panel.dismiss_alert();
                continue;
            }

            // Ctrl+C to quit
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                break;
            }

            match key.code {
                KeyCode::Char('q') => break,
                KeyCode::Char('r') => {
                    show_help = false;
                    panel.toggle_recording();
                }
                KeyCode::Char('h') => show_help = !show_help,
                code => {
                    if let Some(event) = controls::on_key(panel.settings(), code) {
                        panel.handle_control(event);
                    }
                }
            }
        }
    }

    panel.unmount();
    Ok(panel.take_pending_saves())
}

fn draw(f: &mut Frame, panel: &Panel, show_help: bool) {
    let area = f.area();

    // Bottom line for status, one above it for the controls
    let video_area = Rect {
        height: area.height.saturating_sub(2),
        ..area
    };
    let controls_area = Rect {
        y: area.y + area.height.saturating_sub(2),
        height: 1.min(area.height),
        ..area
    };
    let status_area = Rect {
        y: area.y + area.height.saturating_sub(1),
        height: 1.min(area.height),
        ..area
    };

    f.render_widget(
        FrameWidget {
            frame: panel.stream().current_frame().map(|frame| &**frame),
        },
        video_area,
    );

    if let Some(banner) = panel.stream().error() {
        let banner_area = Rect {
            height: 1.min(video_area.height),
            ..video_area
        };
        f.render_widget(
            Paragraph::new(banner)
                .style(Style::default().fg(Color::White).bg(Color::Red))
                .centered(),
            banner_area,
        );
    }

    render_overlay_labels(f.buffer_mut(), video_area, panel);

    f.render_widget(
        ControlsView {
            settings: panel.settings(),
        },
        controls_area,
    );

    let message = match panel.notice() {
        Some(notice) => notice.to_string(),
        None if show_help => build_help_message(),
        None => build_status_message(panel.recording_indicator()),
    };
    f.render_widget(StatusBar { message: &message }, status_area);

    if let Some(alert) = panel.alert() {
        render_alert(f, area, alert);
    }
}

/// Clock in the bottom-right corner and recording indicator top-left
fn render_overlay_labels(buf: &mut Buffer, area: Rect, panel: &Panel) {
    if area.height == 0 {
        return;
    }

    let timestamp = panel.timestamp();
    let width = timestamp.chars().count() as u16;
    if width + 2 <= area.width {
        buf.set_string(
            area.x + area.width - width - 1,
            area.y + area.height - 1,
            timestamp,
            Style::default().fg(Color::White).bg(Color::Black),
        );
    }

    if panel.recording_indicator() && area.height > 1 {
        buf.set_string(
            area.x + 1,
            area.y + 1,
            "● REC",
            Style::default()
                .fg(Color::Red)
                .bg(Color::Black)
                .add_modifier(Modifier::BOLD),
        );
    }
}

fn render_alert(f: &mut Frame, area: Rect, message: &str) {
    let width = (message.len() as u16 + 4).clamp(20, area.width.max(20)).min(area.width);
    let height = 5.min(area.height);
    let popup = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };

    f.render_widget(Clear, popup);
    f.render_widget(
        Paragraph::new(vec![
            Line::from(message),
            Line::from(""),
            Line::from("Press any key"),
        ])
        .wrap(Wrap { trim: true })
        .centered()
        .block(Block::default().borders(Borders::ALL).title("Alert")),
        popup,
    );
}

fn build_status_message(recording: bool) -> String {
    let record = if recording { "'r' stop" } else { "'r' record" };
    format!("←/→ focus | 'b' backlight | {} | 'h' help | 'q' quit", record)
}

fn build_help_message() -> String {
    "←/→ or -/+: Focus | b: Toggle backlight | r: Start/stop recording | h: Toggle help | q/Ctrl+C: Quit"
        .to_string()
}

/// Widget that renders a camera frame using half-block characters
struct FrameWidget<'a> {
    frame: Option<&'a CameraFrame>,
}

impl Widget for FrameWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = self.frame.filter(|f| f.width > 0 && f.height > 0) else {
            // No frame yet - show placeholder
            let msg = "Connecting to camera...";
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, Style::default());
            }
            return;
        };

        // Calculate display dimensions maintaining aspect ratio
        // Each terminal cell displays 2 vertical pixels using half-block characters
        let frame_aspect = frame.width as f64 / frame.height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            // Terminal is wider - fit to height
            let h = term_height;
            let w = h * frame_aspect;
            (w as u16, (h / 2.0) as u16)
        } else {
            // Terminal is taller - fit to width
            let w = term_width;
            let h = w / frame_aspect;
            (w as u16, (h / 2.0) as u16)
        };
        if display_width == 0 || display_height == 0 {
            return;
        }

        // Center the image
        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = frame.width as f64 / display_width as f64;
        let y_scale = frame.height as f64 / (display_height * 2) as f64;

        // Upper half (▀) colored with fg, lower half with bg
        for ty in 0..display_height {
            for tx in 0..display_width {
                let term_x = x_offset + tx;
                let term_y = y_offset + ty;

                if term_x >= area.x + area.width || term_y >= area.y + area.height {
                    continue;
                }

                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                let top_color = sample_pixel(frame, src_x, src_y_top);
                let bottom_color = sample_pixel(frame, src_x, src_y_bottom);

                if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                    cell.set_char('▀');
                    cell.set_fg(top_color);
                    cell.set_bg(bottom_color);
                }
            }
        }
    }
}

fn sample_pixel(frame: &CameraFrame, x: u32, y: u32) -> Color {
    let (r, g, b) = frame.pixel_rgb(x, y);
    Color::Rgb(r, g, b)
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        buf.set_stringn(
            area.x,
            area.y,
            self.message,
            area.width as usize,
            Style::default().fg(Color::White).bg(Color::DarkGray),
        );
    }
}
