// SPDX-License-Identifier: GPL-3.0-only

//! Focus slider and backlight toggle
//!
//! Stateless: the view renders the settings it is given and key presses are
//! translated into [`ControlEvent`]s for the panel to act on.

use crate::backends::camera::{CameraSettings, clamp_focus};
use crate::constants::{FOCUS_MAX, FOCUS_STEP};
use crossterm::event::KeyCode;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    widgets::{Gauge, Widget},
};

/// A user change to one of the controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    FocusChanged(u8),
    BacklightToggled(bool),
}

/// Map a key press onto a control change
///
/// Focus moves one step and stays within range; a press that would not
/// change the value produces nothing.
pub fn on_key(settings: &CameraSettings, key: KeyCode) -> Option<ControlEvent> {
    let step = FOCUS_STEP as i32;
    let focus = match key {
        KeyCode::Left | KeyCode::Char('-') => clamp_focus(settings.focus as i32 - step),
        KeyCode::Right | KeyCode::Char('+') | KeyCode::Char('=') => {
            clamp_focus(settings.focus as i32 + step)
        }
        KeyCode::Char('b') => {
            return Some(ControlEvent::BacklightToggled(!settings.backlight_enabled));
        }
        _ => return None,
    };

    (focus != settings.focus).then_some(ControlEvent::FocusChanged(focus))
}

pub fn backlight_label(enabled: bool) -> &'static str {
    if enabled { "Backlight On" } else { "Backlight Off" }
}

/// One-line rendering of both controls
pub struct ControlsView<'a> {
    pub settings: &'a CameraSettings,
}

impl Widget for ControlsView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [focus_area, toggle_area] =
            Layout::horizontal([Constraint::Min(20), Constraint::Length(17)]).areas(area);

        let focus = self.settings.focus;
        Gauge::default()
            .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
            .ratio(focus as f64 / FOCUS_MAX as f64)
            .label(format!("Focus {}", focus))
            .render(focus_area, buf);

        let enabled = self.settings.backlight_enabled;
        let style = if enabled {
            Style::default().fg(Color::Black).bg(Color::Yellow)
        } else {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        };
        buf.set_style(toggle_area, style);
        buf.set_string(toggle_area.x + 1, toggle_area.y, backlight_label(enabled), style);
    }
}
