use crate::render::{frame_begin, frame_end, luma_u8, place, row_begin, write_fg_rgb, Frame, Renderer};
use std::io::Write;

pub struct AsciiRenderer {
    last_fg: Option<(u8, u8, u8)>,
}

impl AsciiRenderer {
    pub fn new() -> Self {
        Self { last_fg: None }
    }
}

impl Default for AsciiRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for AsciiRenderer {
    fn name(&self) -> &'static str {
        "ascii"
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let Some(p) = place(frame, 1, 1) else {
            return Ok(());
        };

        // Dark -> bright ramp. ASCII-safe and compact.
        const RAMP: &[u8] = b" .,:;irsXA253hMHGS#9B&@";

        frame_begin(frame, out)?;
        for row in 0..p.visual_rows {
            let in_band = row >= p.origin_row && row < p.origin_row + p.cell_h;
            row_begin(out, row, p.origin_col)?;
            self.last_fg = None;
            if !in_band {
                continue;
            }
            let cy = row - p.origin_row;
            for cx in 0..p.cell_w {
                let (r, g, b) = p.sample(frame, cx, cy, 0, 0);
                let l = luma_u8(r, g, b) as usize;
                let ch = RAMP[l * (RAMP.len() - 1) / 255] as char;
                if self.last_fg != Some((r, g, b)) {
                    write_fg_rgb(out, r, g, b)?;
                    self.last_fg = Some((r, g, b));
                }
                write!(out, "{ch}")?;
            }
        }
        frame_end(frame, &p, out)
    }
}
