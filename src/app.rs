use crate::audio::{AudioClip, AudioSource};
use crate::binding::BindingCache;
use crate::canvas::{Canvas, Rgb};
use crate::config::{Config, RendererMode, SourceMode};
use crate::prefs::{prefs_storage_path, AppPrefs};
use crate::render::{AsciiRenderer, BrailleRenderer, Frame, HalfBlockRenderer, Renderer};
use crate::terminal::TerminalGuard;
use crate::viz::{FrameClock, FrameHandle, VisualSettings, Visualizer, DEFAULT_COLOR};
use anyhow::Context;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::io::BufWriter;
use std::time::{Duration, Instant};

/// FrameClock over the app's display ticks: at most one armed frame,
/// delivered at the next tick unless cancelled first.
struct TickClock {
    next_handle: FrameHandle,
    armed: Option<FrameHandle>,
}

impl TickClock {
    fn new() -> Self {
        Self {
            next_handle: 0,
            armed: None,
        }
    }

    fn take_due(&mut self) -> Option<FrameHandle> {
        self.armed.take()
    }
}

impl FrameClock for TickClock {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_handle += 1;
        self.armed = Some(self.next_handle);
        self.next_handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.armed == Some(handle) {
            self.armed = None;
        }
    }
}

const COLOR_PALETTE: [Rgb; 5] = [
    DEFAULT_COLOR,
    Rgb::new(0x22, 0xd3, 0xee),
    Rgb::new(0xf5, 0x9e, 0x0b),
    Rgb::new(0x34, 0xd3, 0x99),
    Rgb::new(0xf4, 0x72, 0xb6),
];

fn next_color(current: Rgb) -> Rgb {
    let idx = COLOR_PALETTE.iter().position(|&c| c == current);
    match idx {
        Some(i) => COLOR_PALETTE[(i + 1) % COLOR_PALETTE.len()],
        None => COLOR_PALETTE[0],
    }
}

enum KeyAction {
    None,
    Quit,
    TogglePlay,
    CycleStyle,
    ToggleSize,
    CycleColor,
}

pub fn run(cfg: Config) -> anyhow::Result<()> {
    // CLI flags override stored prefs; unreadable prefs fall back to defaults.
    let prefs_path = prefs_storage_path();
    let stored = AppPrefs::load(prefs_path.as_deref()).unwrap_or_default();
    let mut settings = stored.settings();
    if let Some(style) = cfg.style {
        settings.style = style.into_style();
    }
    if let Some(size) = cfg.size {
        settings.size = size.into_size();
    }
    if let Some(color) = cfg.color {
        settings.color = color;
    }

    // Build the source before touching the terminal so load errors print cleanly.
    let source = match cfg.source {
        SourceMode::Track => {
            let path = cfg.track.as_deref().ok_or_else(|| {
                anyhow::anyhow!("--track <wav> is required with --source track")
            })?;
            let clip = AudioClip::load_wav(path)?;
            let label = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "track".to_string());
            AudioSource::clip(label, clip)
        }
        SourceMode::Mic => AudioSource::mic(cfg.device.clone()),
    };
    let source_id = source.id();

    let mut cache = BindingCache::new();
    // First acquire fixes the analysis resolution for this source.
    let bind_fault = match cache.acquire(&source, settings.style.fft_size()) {
        Ok(_) => None,
        Err(err) => Some(err.to_string()),
    };

    let _term = TerminalGuard::new()?;
    let mut out = BufWriter::new(TerminalGuard::stdout());

    let mut renderer: Box<dyn Renderer> = match cfg.renderer {
        RendererMode::Ascii => Box::new(AsciiRenderer::new()),
        RendererMode::HalfBlock => Box::new(HalfBlockRenderer::new()),
        RendererMode::Braille => Box::new(BrailleRenderer::new()),
    };

    let mut canvas = Canvas::new(settings.size.canvas_width(), settings.size.canvas_height());
    let mut clock = TickClock::new();
    let mut viz = Visualizer::new(settings);
    let mut playing = cfg.autoplay;

    let mut show_hud = true;
    let mut show_help = false;
    let mut fps = FpsCounter::new();

    viz.restart(playing, cache.get_mut(source_id), Some(&mut canvas), &mut clock);

    loop {
        let now = Instant::now();

        let mut quit = false;
        let mut settings_changed = false;
        let mut play_toggled = false;
        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(k) if k.kind != KeyEventKind::Release => {
                    match handle_key(k.code, k.modifiers, &mut show_hud, &mut show_help) {
                        KeyAction::Quit => quit = true,
                        KeyAction::TogglePlay => play_toggled = true,
                        KeyAction::CycleStyle => {
                            settings.style = settings.style.next();
                            settings_changed = true;
                        }
                        KeyAction::ToggleSize => {
                            settings.size = settings.size.toggle();
                            settings_changed = true;
                        }
                        KeyAction::CycleColor => {
                            settings.color = next_color(settings.color);
                            settings_changed = true;
                        }
                        KeyAction::None => {}
                    }
                }
                // Resize needs no bookkeeping: placement is derived from the
                // live terminal size every frame.
                _ => {}
            }
        }
        if quit {
            break;
        }

        if play_toggled {
            playing = !playing;
            if !playing {
                // Pausing is the player's duty; the visualizer only resumes.
                if let Some(binding) = cache.get_mut(source_id) {
                    let _ = binding.graph_mut().suspend();
                }
            }
            viz.restart(playing, cache.get_mut(source_id), Some(&mut canvas), &mut clock);
        }

        if settings_changed {
            if settings.size != viz.settings().size {
                canvas = Canvas::new(settings.size.canvas_width(), settings.size.canvas_height());
            }
            viz.apply_settings(
                settings,
                playing,
                cache.get_mut(source_id),
                Some(&mut canvas),
                &mut clock,
            );
            let _ = AppPrefs::from_settings(settings).save(prefs_path.as_deref());
        }

        // Deliver the scheduled frame for this display tick, if any.
        if let Some(handle) = clock.take_due() {
            viz.on_frame(
                handle,
                playing,
                cache.get_mut(source_id),
                Some(&mut canvas),
                &mut clock,
            );
        }

        let (term_cols, term_rows) = crossterm::terminal::size().context("get terminal size")?;
        let level = cache
            .get_mut(source_id)
            .map(|b| b.analyser().level())
            .unwrap_or(0.0);
        let viz_note = bind_fault
            .clone()
            .or_else(|| viz.fault().map(|e| e.to_string()));

        let hud = if show_hud {
            build_wrapped_hud(
                term_cols as usize,
                source.label(),
                viz.settings(),
                playing,
                renderer.name(),
                fps.fps(),
                level,
                viz_note.as_deref(),
            )
        } else {
            String::new()
        };
        let hud_rows = hud_rows_for_text(term_rows, show_hud, &hud);

        let frame = Frame {
            term_cols,
            term_rows,
            canvas_width: canvas.width(),
            canvas_height: canvas.height(),
            pixels_rgba: canvas.pixels_rgba(),
            hud: &hud,
            hud_rows,
            overlay: show_help.then(help_popup_text),
            sync_updates: cfg.sync_updates,
        };
        renderer.render(&frame, &mut out)?;

        fps.tick();

        // Frame pacing.
        let target = Duration::from_secs_f32(1.0 / cfg.fps.max(1) as f32);
        let elapsed = now.elapsed();
        if elapsed < target {
            std::thread::sleep(target - elapsed);
        }
    }

    // Unmount: no dangling schedule, and the source's binding goes with it.
    viz.unmount(&mut clock);
    cache.release(source_id);
    Ok(())
}

fn handle_key(
    code: KeyCode,
    mods: KeyModifiers,
    show_hud: &mut bool,
    show_help: &mut bool,
) -> KeyAction {
    if mods.contains(KeyModifiers::CONTROL) && matches!(code, KeyCode::Char('c')) {
        return KeyAction::Quit;
    }

    match code {
        KeyCode::Esc => KeyAction::Quit,
        KeyCode::Char('q') | KeyCode::Char('Q') => KeyAction::Quit,
        KeyCode::Char(' ') => KeyAction::TogglePlay,
        KeyCode::Char('s') | KeyCode::Char('S') => KeyAction::CycleStyle,
        KeyCode::Char('g') | KeyCode::Char('G') => KeyAction::ToggleSize,
        KeyCode::Char('c') | KeyCode::Char('C') => KeyAction::CycleColor,
        KeyCode::Char('i') | KeyCode::Char('I') => {
            *show_hud = !*show_hud;
            KeyAction::None
        }
        KeyCode::Char('?') | KeyCode::Char('/') | KeyCode::Char('h') | KeyCode::Char('H')
        | KeyCode::F(1) => {
            *show_help = !*show_help;
            KeyAction::None
        }
        _ => KeyAction::None,
    }
}

fn build_wrapped_hud(
    cols: usize,
    track: &str,
    settings: VisualSettings,
    playing: bool,
    renderer_name: &str,
    fps: f32,
    level: f32,
    viz_note: Option<&str>,
) -> String {
    let mut logical_lines = vec![
        format!(
            "Track: {} | Style: {} | Size: {} | Color: {} | Playing: {} | Level: {:>4.2} | FPS: {:>4.1} | Renderer: {}",
            track,
            settings.style.label(),
            settings.size.label(),
            settings.color.hex(),
            if playing { "yes" } else { "no" },
            level,
            fps,
            renderer_name,
        ),
        "Keys: space play/pause | s style | g size | c color | i HUD | ?/h/F1 help | q quit"
            .to_string(),
    ];
    if let Some(note) = viz_note {
        logical_lines.push(format!("Visualizer off: {note}"));
    }

    wrap_hud_lines(cols, &logical_lines).join("\n")
}

fn hud_rows_for_text(term_rows: u16, show_hud: bool, hud: &str) -> u16 {
    if !show_hud {
        return 0;
    }
    let max_rows = term_rows.saturating_sub(1);
    let wanted = hud.lines().count() as u16;
    wanted.min(max_rows)
}

fn wrap_hud_lines(cols: usize, lines: &[String]) -> Vec<String> {
    let width = cols.max(1);
    let mut out = Vec::new();
    for line in lines {
        out.extend(hard_wrap_line(line, width));
    }
    out
}

fn hard_wrap_line(line: &str, width: usize) -> Vec<String> {
    if line.is_empty() {
        return vec![String::new()];
    }

    let mut out = Vec::new();
    let mut cur = String::new();
    let mut cur_len = 0usize;
    for ch in line.chars() {
        cur.push(ch);
        cur_len += 1;
        if cur_len >= width {
            out.push(cur);
            cur = String::new();
            cur_len = 0;
        }
    }
    if !cur.is_empty() {
        out.push(cur);
    }
    if out.is_empty() {
        out.push(String::new());
    }
    out
}

fn help_popup_text() -> &'static str {
    "trackviz hotkeys\n\
space  play/pause\n\
s  cycle style: bars/wave/circle\n\
g  toggle size: small/large\n\
c  cycle accent color\n\
i  show/hide HUD\n\
? or / or h or F1  toggle this help\n\
q or esc  quit"
}

struct FpsCounter {
    last: Instant,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            last: Instant::now(),
            frames: 0,
            fps: 0.0,
        }
    }

    fn tick(&mut self) {
        self.frames += 1;
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        if dt >= 0.5 {
            self.fps = (self.frames as f32) / dt;
            self.frames = 0;
            self.last = now;
        }
    }

    fn fps(&self) -> f32 {
        self.fps
    }
}
