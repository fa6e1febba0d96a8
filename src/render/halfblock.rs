use crate::render::{
    frame_begin, frame_end, place, row_begin, write_bg_rgb, write_fg_rgb, Frame, Renderer,
};
use std::io::Write;

pub struct HalfBlockRenderer {
    last_fg: Option<(u8, u8, u8)>,
    last_bg: Option<(u8, u8, u8)>,
}

impl HalfBlockRenderer {
    pub fn new() -> Self {
        Self {
            last_fg: None,
            last_bg: None,
        }
    }
}

impl Default for HalfBlockRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for HalfBlockRenderer {
    fn name(&self) -> &'static str {
        "halfblock"
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let Some(p) = place(frame, 1, 2) else {
            return Ok(());
        };

        const HALF_BLOCK: char = '\u{2580}';

        frame_begin(frame, out)?;
        for row in 0..p.visual_rows {
            let in_band = row >= p.origin_row && row < p.origin_row + p.cell_h;
            row_begin(out, row, p.origin_col)?;
            self.last_fg = None;
            self.last_bg = None;
            if !in_band {
                continue;
            }
            let cy = row - p.origin_row;
            for cx in 0..p.cell_w {
                let top = p.sample(frame, cx, cy, 0, 0);
                let bot = p.sample(frame, cx, cy, 0, 1);
                if self.last_fg != Some(top) {
                    write_fg_rgb(out, top.0, top.1, top.2)?;
                    self.last_fg = Some(top);
                }
                if self.last_bg != Some(bot) {
                    write_bg_rgb(out, bot.0, bot.1, bot.2)?;
                    self.last_bg = Some(bot);
                }
                write!(out, "{HALF_BLOCK}")?;
            }
        }
        frame_end(frame, &p, out)
    }
}
