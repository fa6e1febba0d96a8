use crate::render::{
    frame_begin, frame_end, luma_u8, place, row_begin, write_bg_rgb, write_fg_rgb, Frame, Renderer,
};
use std::io::Write;

/// Luma above this counts as a lit dot; the surface is a dark background
/// with one accent color, so a fixed cutoff beats per-cell adaptation.
const DOT_LUMA: u8 = 16;

pub struct BrailleRenderer {
    last_fg: Option<(u8, u8, u8)>,
}

impl BrailleRenderer {
    pub fn new() -> Self {
        Self { last_fg: None }
    }
}

impl Default for BrailleRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for BrailleRenderer {
    fn name(&self) -> &'static str {
        "braille"
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let Some(p) = place(frame, 2, 4) else {
            return Ok(());
        };

        // Unicode braille dot order within a 2x4 cell.
        const DOT_BITS: [u8; 8] = [0x01, 0x08, 0x02, 0x10, 0x04, 0x20, 0x40, 0x80];

        frame_begin(frame, out)?;
        for row in 0..p.visual_rows {
            let in_band = row >= p.origin_row && row < p.origin_row + p.cell_h;
            row_begin(out, row, p.origin_col)?;
            self.last_fg = None;
            if !in_band {
                continue;
            }
            write_bg_rgb(out, 0, 0, 0)?;
            let cy = row - p.origin_row;
            for cx in 0..p.cell_w {
                let mut bits = 0u8;
                let mut acc = (0u32, 0u32, 0u32);
                let mut lit = 0u32;
                for dy in 0..4usize {
                    for dx in 0..2usize {
                        let (r, g, b) = p.sample(frame, cx, cy, dx, dy);
                        if luma_u8(r, g, b) > DOT_LUMA {
                            bits |= DOT_BITS[dy * 2 + dx];
                            acc.0 += r as u32;
                            acc.1 += g as u32;
                            acc.2 += b as u32;
                            lit += 1;
                        }
                    }
                }

                if bits == 0 {
                    write!(out, " ")?;
                    continue;
                }
                let fg = (
                    (acc.0 / lit) as u8,
                    (acc.1 / lit) as u8,
                    (acc.2 / lit) as u8,
                );
                if self.last_fg != Some(fg) {
                    write_fg_rgb(out, fg.0, fg.1, fg.2)?;
                    self.last_fg = Some(fg);
                }
                let ch = char::from_u32(0x2800 + bits as u32).unwrap_or(' ');
                write!(out, "{ch}")?;
            }
        }
        frame_end(frame, &p, out)
    }
}
