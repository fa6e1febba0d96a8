mod ascii;
mod braille;
mod halfblock;

pub use ascii::AsciiRenderer;
pub use braille::BrailleRenderer;
pub use halfblock::HalfBlockRenderer;

use std::io::Write;

/// One presented frame: the visualizer surface plus the HUD text, laid out
/// by the renderer inside the terminal cell grid.
pub struct Frame<'a> {
    pub term_cols: u16,
    pub term_rows: u16,
    pub canvas_width: usize,
    pub canvas_height: usize,
    pub pixels_rgba: &'a [u8],
    pub hud: &'a str,
    pub hud_rows: u16,
    pub overlay: Option<&'a str>,
    pub sync_updates: bool,
}

pub trait Renderer {
    fn name(&self) -> &'static str;
    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()>;
}

/// Where the canvas lands in the cell grid for a renderer packing
/// `px_x` x `px_y` canvas pixels per terminal cell. The canvas is centered
/// in the visual area; a terminal too small to hold it clips symmetrically
/// instead of failing.
pub(crate) struct Placement {
    pub cols: usize,
    pub visual_rows: usize,
    pub cell_w: usize,
    pub cell_h: usize,
    pub origin_col: usize,
    pub origin_row: usize,
    pub skip_x: usize,
    pub skip_y: usize,
    pub px_x: usize,
    pub px_y: usize,
}

pub(crate) fn place(frame: &Frame<'_>, px_x: usize, px_y: usize) -> Option<Placement> {
    let cols = frame.term_cols as usize;
    let visual_rows = frame.term_rows.saturating_sub(frame.hud_rows) as usize;
    if cols == 0 || visual_rows == 0 || frame.canvas_width == 0 || frame.canvas_height == 0 {
        return None;
    }
    let need = frame
        .canvas_width
        .saturating_mul(frame.canvas_height)
        .saturating_mul(4);
    if frame.pixels_rgba.len() < need {
        // Internal mismatch; skip the frame rather than index out of bounds.
        return None;
    }

    let want_w = frame.canvas_width.div_ceil(px_x);
    let want_h = frame.canvas_height.div_ceil(px_y);
    let cell_w = want_w.min(cols);
    let cell_h = want_h.min(visual_rows);
    Some(Placement {
        cols,
        visual_rows,
        cell_w,
        cell_h,
        origin_col: (cols - cell_w) / 2,
        origin_row: (visual_rows - cell_h) / 2,
        skip_x: (want_w - cell_w) / 2,
        skip_y: (want_h - cell_h) / 2,
        px_x,
        px_y,
    })
}

impl Placement {
    /// Canvas pixel backing a cell-relative position; off-canvas reads black.
    pub(crate) fn sample(
        &self,
        frame: &Frame<'_>,
        cell_x: usize,
        cell_y: usize,
        dx: usize,
        dy: usize,
    ) -> (u8, u8, u8) {
        let px = (self.skip_x + cell_x) * self.px_x + dx;
        let py = (self.skip_y + cell_y) * self.px_y + dy;
        if px >= frame.canvas_width || py >= frame.canvas_height {
            return (0, 0, 0);
        }
        let i = (py * frame.canvas_width + px) * 4;
        (
            frame.pixels_rgba[i],
            frame.pixels_rgba[i + 1],
            frame.pixels_rgba[i + 2],
        )
    }
}

pub(crate) fn frame_begin(frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
    if frame.sync_updates {
        out.write_all(b"\x1b[?2026h")?;
    }
    // Home, reset, and autowrap off: painting the last column must not wrap.
    out.write_all(b"\x1b[H\x1b[0m\x1b[?7l")?;
    Ok(())
}

pub(crate) fn frame_end(
    frame: &Frame<'_>,
    placement: &Placement,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let mut hud_lines = frame.hud.lines();
    for i in 0..(frame.hud_rows as usize) {
        write!(out, "\x1b[{};1H\x1b[0m\x1b[2K", placement.visual_rows + i + 1)?;
        if let Some(mut line) = hud_lines.next() {
            if let Some((idx, _)) = line.char_indices().nth(placement.cols) {
                line = &line[..idx];
            }
            write!(out, "{line}")?;
        }
    }

    if let Some(text) = frame.overlay {
        draw_overlay_popup(out, frame.term_cols, frame.term_rows, text)?;
    }

    out.write_all(b"\x1b[?7h")?;
    if frame.sync_updates {
        out.write_all(b"\x1b[?2026l")?;
    }
    out.flush()?;
    Ok(())
}

/// Erases one visual row and leaves the cursor at the canvas origin column.
/// Resets attributes, so renderers must drop their color run cache per row.
pub(crate) fn row_begin(out: &mut dyn Write, row: usize, origin_col: usize) -> anyhow::Result<()> {
    write!(
        out,
        "\x1b[{};1H\x1b[0m\x1b[2K\x1b[{};{}H",
        row + 1,
        row + 1,
        origin_col + 1
    )?;
    Ok(())
}

pub(crate) fn write_fg_rgb(out: &mut dyn Write, r: u8, g: u8, b: u8) -> anyhow::Result<()> {
    write!(out, "\x1b[38;2;{r};{g};{b}m")?;
    Ok(())
}

pub(crate) fn write_bg_rgb(out: &mut dyn Write, r: u8, g: u8, b: u8) -> anyhow::Result<()> {
    write!(out, "\x1b[48;2;{r};{g};{b}m")?;
    Ok(())
}

#[inline]
pub(crate) fn luma_u8(r: u8, g: u8, b: u8) -> u8 {
    // Approx Rec.709 luma using integer math (0..255).
    ((r as u32 * 54 + g as u32 * 183 + b as u32 * 19) >> 8) as u8
}

/// Centered bordered popup (help screen). First line rendered as a title.
pub fn draw_overlay_popup(
    out: &mut dyn Write,
    term_cols: u16,
    term_rows: u16,
    text: &str,
) -> anyhow::Result<()> {
    if text.trim().is_empty() {
        return Ok(());
    }

    let cols = term_cols as usize;
    let rows = term_rows as usize;
    if cols < 8 || rows < 4 {
        return Ok(());
    }

    let max_inner_w = cols.saturating_sub(6).max(1);
    let mut lines: Vec<&str> = Vec::new();
    for raw in text.lines() {
        // Hard-clip rather than wrap: help text is authored narrow.
        let end = raw
            .char_indices()
            .nth(max_inner_w)
            .map(|(i, _)| i)
            .unwrap_or(raw.len());
        lines.push(&raw[..end]);
    }
    if lines.is_empty() {
        return Ok(());
    }

    let inner_w = lines
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0)
        .clamp(1, max_inner_w);
    let box_w = (inner_w + 4).min(cols.saturating_sub(2)).max(4);
    let inner_w = box_w.saturating_sub(4);
    let body_h = lines.len().min(rows.saturating_sub(3).max(1));
    let box_h = (body_h + 2).min(rows.saturating_sub(1)).max(3);

    let start_col = (cols.saturating_sub(box_w)) / 2 + 1;
    let start_row = (rows.saturating_sub(box_h)) / 2 + 1;

    let horiz = "-".repeat(box_w.saturating_sub(2));
    let blank = " ".repeat(inner_w);

    out.write_all(b"\x1b[0m\x1b[38;2;236;242;255m\x1b[48;2;10;14;24m")?;
    write!(out, "\x1b[{start_row};{start_col}H+{horiz}+")?;
    for (i, line) in lines.iter().take(body_h).enumerate() {
        let row = start_row + 1 + i;
        write!(out, "\x1b[{row};{start_col}H| {blank} |")?;
        if i == 0 {
            write!(
                out,
                "\x1b[{};{}H\x1b[1m\x1b[38;2;255;236;160m{}\x1b[22m\x1b[38;2;236;242;255m",
                row,
                start_col + 2,
                line
            )?;
        } else {
            write!(out, "\x1b[{};{}H{}", row, start_col + 2, line)?;
        }
    }
    write!(out, "\x1b[{};{}H+{}+", start_row + box_h - 1, start_col, horiz)?;
    out.write_all(b"\x1b[0m")?;
    Ok(())
}
