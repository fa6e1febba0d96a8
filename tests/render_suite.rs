use trackviz::render::{AsciiRenderer, BrailleRenderer, Frame, HalfBlockRenderer, Renderer};

/// Build a solid-color RGBA canvas buffer.
fn solid_pixels(w: usize, h: usize, r: u8, g: u8, b: u8) -> Vec<u8> {
    let mut buf = vec![0u8; w * h * 4];
    for px in buf.chunks_exact_mut(4) {
        px[0] = r;
        px[1] = g;
        px[2] = b;
        px[3] = 255;
    }
    buf
}

fn make_frame<'a>(
    cols: u16,
    rows: u16,
    canvas_w: usize,
    canvas_h: usize,
    pixels: &'a [u8],
    sync: bool,
) -> Frame<'a> {
    Frame {
        term_cols: cols,
        term_rows: rows,
        canvas_width: canvas_w,
        canvas_height: canvas_h,
        pixels_rgba: pixels,
        hud: "Track: demo | FPS 60",
        hud_rows: 1,
        overlay: None,
        sync_updates: sync,
    }
}

// ── ASCII renderer ──────────────────────────────────────────────────────────

#[test]
fn ascii_renders_solid_canvas() {
    let pixels = solid_pixels(10, 5, 200, 200, 200);
    let frame = make_frame(20, 8, 10, 5, &pixels, false);
    let mut out = Vec::new();
    let mut renderer = AsciiRenderer::new();
    renderer.render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(s.contains("\x1b[H"), "missing home cursor");
    assert!(s.contains("\x1b[?7l"), "missing autowrap-off");
    assert!(s.contains("\x1b[?7h"), "missing autowrap-on");
    assert!(s.contains("38;2;200;200;200"), "missing FG color");
    assert!(s.contains("Track: demo"), "HUD text missing");
}

#[test]
fn ascii_centers_the_canvas() {
    let pixels = solid_pixels(4, 2, 250, 250, 250);
    let mut frame = make_frame(10, 5, 4, 2, &pixels, false);
    frame.hud_rows = 0;
    let mut out = Vec::new();
    AsciiRenderer::new().render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    // 4 cells in 10 columns -> origin column 4 (1-based), rows 2..=3 of 5.
    assert!(s.contains("\x1b[2;4H"), "canvas should start centered");
}

#[test]
fn ascii_name() {
    assert_eq!(AsciiRenderer::new().name(), "ascii");
}

#[test]
fn ascii_skips_zero_size() {
    let pixels = solid_pixels(1, 1, 0, 0, 0);
    let frame = make_frame(0, 0, 0, 0, &pixels, false);
    let mut out = Vec::new();
    AsciiRenderer::new().render(&frame, &mut out).unwrap();
    assert!(out.is_empty(), "expected empty output for zero-size frame");
}

#[test]
fn ascii_skips_undersized_pixel_buffer() {
    let pixels = solid_pixels(2, 2, 90, 90, 90);
    let frame = make_frame(20, 8, 10, 10, &pixels, false);
    let mut out = Vec::new();
    AsciiRenderer::new().render(&frame, &mut out).unwrap();
    assert!(out.is_empty(), "expected empty output for short buffer");
}

#[test]
fn ascii_clips_in_a_tiny_terminal() {
    let pixels = solid_pixels(160, 32, 120, 60, 200);
    let frame = make_frame(10, 5, 160, 32, &pixels, false);
    let mut out = Vec::new();
    AsciiRenderer::new().render(&frame, &mut out).unwrap();
    assert!(!out.is_empty(), "clipped canvas should still render");
}

// ── Half-block renderer ─────────────────────────────────────────────────────

#[test]
fn halfblock_renders_with_fg_and_bg() {
    let pixels = solid_pixels(8, 8, 10, 200, 30);
    let frame = make_frame(20, 10, 8, 8, &pixels, true);
    let mut out = Vec::new();
    let mut renderer = HalfBlockRenderer::new();
    renderer.render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(s.contains("\x1b[?2026h"), "missing sync-begin");
    assert!(s.contains("\x1b[?2026l"), "missing sync-end");
    assert!(s.contains("\u{2580}"), "missing half-block char");
    assert!(s.contains("38;2;10;200;30"), "missing FG escape");
    assert!(s.contains("48;2;10;200;30"), "missing BG escape");
}

#[test]
fn halfblock_name() {
    assert_eq!(HalfBlockRenderer::new().name(), "halfblock");
}

#[test]
fn halfblock_emits_new_colors_each_frame() {
    let pixels1 = solid_pixels(4, 4, 255, 0, 0);
    let pixels2 = solid_pixels(4, 4, 0, 0, 255);
    let mut renderer = HalfBlockRenderer::new();

    let frame1 = make_frame(8, 4, 4, 4, &pixels1, false);
    let mut out1 = Vec::new();
    renderer.render(&frame1, &mut out1).unwrap();
    assert!(String::from_utf8_lossy(&out1).contains("38;2;255;0;0"));

    let frame2 = make_frame(8, 4, 4, 4, &pixels2, false);
    let mut out2 = Vec::new();
    renderer.render(&frame2, &mut out2).unwrap();
    assert!(
        String::from_utf8_lossy(&out2).contains("38;2;0;0;255"),
        "color run cache must reset between frames"
    );
}

// ── Braille renderer ────────────────────────────────────────────────────────

#[test]
fn braille_renders_dots_for_bright_pixels() {
    let pixels = solid_pixels(8, 8, 200, 200, 200);
    let frame = make_frame(20, 10, 8, 8, &pixels, false);
    let mut out = Vec::new();
    let mut renderer = BrailleRenderer::new();
    renderer.render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(
        s.chars().any(|c| ('\u{2801}'..='\u{28FF}').contains(&c)),
        "bright cells should produce lit braille dots"
    );
    assert!(s.contains("Track: demo"), "HUD text missing");
}

#[test]
fn braille_leaves_dark_cells_blank() {
    let pixels = solid_pixels(8, 8, 0, 0, 0);
    let frame = make_frame(20, 10, 8, 8, &pixels, false);
    let mut out = Vec::new();
    BrailleRenderer::new().render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(
        !s.chars().any(|c| ('\u{2801}'..='\u{28FF}').contains(&c)),
        "an all-dark canvas should light no dots"
    );
}

#[test]
fn braille_name() {
    assert_eq!(BrailleRenderer::new().name(), "braille");
}

// ── Overlay ─────────────────────────────────────────────────────────────────

#[test]
fn overlay_popup_appears_over_the_frame() {
    let pixels = solid_pixels(10, 5, 50, 50, 50);
    let mut frame = make_frame(40, 20, 10, 5, &pixels, false);
    frame.overlay = Some("Test Overlay\nSecond line");
    let mut out = Vec::new();
    AsciiRenderer::new().render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(s.contains("Test Overlay"), "overlay text missing");
    assert!(s.contains("Second line"), "overlay body missing");
}
