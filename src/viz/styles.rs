use super::{VisualSettings, VisualSize};
use crate::canvas::Canvas;
use std::f32::consts::PI;

const IDLE_ALPHA: f32 = 0.3;

/// Fixed substitutes drawn while idle so the shape stays visible without
/// freezing on the last live frame.
const IDLE_BAR_VALUE: u8 = 10;
const IDLE_SPOKE_VALUE: u8 = 20;

/// Bars keep a visible floor even over silence.
const BAR_FLOOR_PX: f32 = 4.0;

/// Equal slots across the width, each sampling one frequency byte; bar
/// opacity rises with bar height while active.
pub fn draw_bars(freq: &[u8], playing: bool, settings: VisualSettings, canvas: &mut Canvas) {
    canvas.clear();
    if freq.is_empty() {
        return;
    }
    let w = canvas.width() as f32;
    let h = canvas.height() as f32;
    let bar_count = match settings.size {
        VisualSize::Small => 16usize,
        VisualSize::Large => 32usize,
    };
    let bar_width = w / bar_count as f32 - 2.0;
    if bar_width <= 0.0 {
        return;
    }
    for i in 0..bar_count {
        let idx = i * freq.len() / bar_count;
        let value = if playing { freq[idx] } else { IDLE_BAR_VALUE };
        let bar_height = (value as f32 / 255.0 * h).max(BAR_FLOOR_PX);
        let x = i as f32 * (bar_width + 2.0);
        let y = h - bar_height;
        let alpha = if playing {
            0.5 + (bar_height / h) * 0.5
        } else {
            IDLE_ALPHA
        };
        canvas.fill_rect(x, y, bar_width, bar_height, settings.color, alpha);
    }
}

/// Time-domain polyline across the full width; bytes centered at 128 map
/// onto the vertical midline, so silence draws a flat horizontal line.
pub fn draw_wave(time: &[u8], playing: bool, settings: VisualSettings, canvas: &mut Canvas) {
    canvas.clear();
    if time.is_empty() {
        return;
    }
    let w = canvas.width() as f32;
    let h = canvas.height() as f32;
    let line_width = match settings.size {
        VisualSize::Small => 2.0,
        VisualSize::Large => 3.0,
    };
    let alpha = if playing { 1.0 } else { IDLE_ALPHA };
    let slice = w / time.len() as f32;

    let mut points = Vec::with_capacity(time.len() + 1);
    for (i, &byte) in time.iter().enumerate() {
        let v = byte as f32 / 128.0;
        points.push((i as f32 * slice, v * h / 2.0));
    }
    points.push((w, h / 2.0));
    canvas.stroke_polyline(&points, line_width, settings.color, alpha);
}

/// Frequency bytes as radial spokes growing outward from a base ring;
/// spoke opacity rises with spoke length while active.
pub fn draw_circle(freq: &[u8], playing: bool, settings: VisualSettings, canvas: &mut Canvas) {
    canvas.clear();
    if freq.is_empty() {
        return;
    }
    let cx = canvas.width() as f32 / 2.0;
    let cy = canvas.height() as f32 / 2.0;
    let (base_radius, extra, spokes, line_width) = match settings.size {
        VisualSize::Small => (10.0f32, 12.0f32, 32usize, 2.0f32),
        VisualSize::Large => (60.0, 40.0, 64, 3.0),
    };
    for i in 0..spokes {
        let idx = i * freq.len() / spokes;
        let value = if playing { freq[idx] } else { IDLE_SPOKE_VALUE };
        let len = value as f32 / 255.0 * extra;
        let angle = i as f32 / spokes as f32 * 2.0 * PI;
        let x1 = cx + angle.cos() * base_radius;
        let y1 = cy + angle.sin() * base_radius;
        let x2 = cx + angle.cos() * (base_radius + len);
        let y2 = cy + angle.sin() * (base_radius + len);
        let alpha = if playing {
            0.5 + (len / extra) * 0.5
        } else {
            IDLE_ALPHA
        };
        canvas.stroke_line(x1, y1, x2, y2, line_width, settings.color, alpha);
    }
}
