mod styles;

pub use styles::{draw_bars, draw_circle, draw_wave};

use crate::audio::{GraphError, GraphState};
use crate::binding::AnalysisBinding;
use crate::canvas::{Canvas, Rgb};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualStyle {
    Bars,
    Wave,
    Circle,
}

impl VisualStyle {
    pub const fn all() -> [Self; 3] {
        [Self::Bars, Self::Wave, Self::Circle]
    }

    pub fn next(self) -> Self {
        let all = Self::all();
        let mut idx = 0usize;
        while idx < all.len() {
            if all[idx] == self {
                return all[(idx + 1) % all.len()];
            }
            idx += 1;
        }
        Self::Bars
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Bars => "bars",
            Self::Wave => "wave",
            Self::Circle => "circle",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "bars" => Some(Self::Bars),
            "wave" => Some(Self::Wave),
            "circle" => Some(Self::Circle),
            _ => None,
        }
    }

    /// Analysis resolution for the style: waveform sampling wants more
    /// time-domain points than magnitude sampling needs bins.
    pub fn fft_size(self) -> usize {
        match self {
            Self::Wave => 256,
            Self::Bars | Self::Circle => 64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualSize {
    Small,
    Large,
}

impl VisualSize {
    pub fn toggle(self) -> Self {
        match self {
            Self::Small => Self::Large,
            Self::Large => Self::Small,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Large => "large",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "small" => Some(Self::Small),
            "large" => Some(Self::Large),
            _ => None,
        }
    }

    pub const fn canvas_width(self) -> usize {
        match self {
            Self::Small => 160,
            Self::Large => 400,
        }
    }

    pub const fn canvas_height(self) -> usize {
        match self {
            Self::Small => 32,
            Self::Large => 200,
        }
    }
}

pub const DEFAULT_COLOR: Rgb = Rgb::new(0x8b, 0x5c, 0xf6);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisualSettings {
    pub style: VisualStyle,
    pub size: VisualSize,
    pub color: Rgb,
}

impl Default for VisualSettings {
    fn default() -> Self {
        Self {
            style: VisualStyle::Bars,
            size: VisualSize::Small,
            color: DEFAULT_COLOR,
        }
    }
}

pub type FrameHandle = u64;

/// The host's per-display-frame callback mechanism. Every schedule is
/// revocable by the owner that requested it.
pub trait FrameClock {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Idle/Active render loop over one acquired binding.
///
/// Active keeps exactly one frame pending at a time: each completed draw
/// schedules the next, and every lifecycle boundary (unmount, settings
/// change, Idle transition) cancels the pending frame before anything
/// else runs. Idle issues a single static draw and schedules nothing.
/// A binding that cannot be resumed leaves the surface dark instead of
/// failing the host; the visualizer is an enhancement, never a
/// requirement.
pub struct Visualizer {
    settings: VisualSettings,
    pending: Option<FrameHandle>,
    fault: Option<GraphError>,
    data: Vec<u8>,
}

impl Visualizer {
    pub fn new(settings: VisualSettings) -> Self {
        Self {
            settings,
            pending: None,
            fault: None,
            data: Vec::new(),
        }
    }

    pub fn settings(&self) -> VisualSettings {
        self.settings
    }

    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    pub fn fault(&self) -> Option<&GraphError> {
        self.fault.as_ref()
    }

    /// (Re)enters the loop for the current playback state: cancels any
    /// pending frame, resumes a suspended graph when entering Active,
    /// draws once, and schedules the follow-up only while Active.
    pub fn restart(
        &mut self,
        playing: bool,
        binding: Option<&mut AnalysisBinding>,
        surface: Option<&mut Canvas>,
        clock: &mut dyn FrameClock,
    ) {
        self.cancel_pending(clock);
        let Some(binding) = binding else {
            if let Some(canvas) = surface {
                canvas.clear();
            }
            return;
        };
        if playing && binding.graph().state() == GraphState::Suspended {
            if let Err(err) = binding.graph_mut().resume() {
                // Playback elsewhere is unaffected; the visualizer goes dark.
                self.fault = Some(err);
                if let Some(canvas) = surface {
                    canvas.clear();
                }
                return;
            }
        }
        self.fault = None;
        if let Some(canvas) = surface {
            self.draw(playing, binding, canvas);
        }
        if playing {
            self.pending = Some(clock.request_frame());
        }
    }

    /// Swaps style/size/color and restarts the loop. The cancel must land
    /// before the new loop starts or stacked loops draw redundantly.
    pub fn apply_settings(
        &mut self,
        settings: VisualSettings,
        playing: bool,
        binding: Option<&mut AnalysisBinding>,
        surface: Option<&mut Canvas>,
        clock: &mut dyn FrameClock,
    ) {
        self.settings = settings;
        self.restart(playing, binding, surface, clock);
    }

    /// Host delivery of a scheduled frame. Stale or cancelled handles are
    /// ignored; a missing surface skips the paint but keeps the schedule
    /// alive so the draw retries next frame.
    pub fn on_frame(
        &mut self,
        handle: FrameHandle,
        playing: bool,
        binding: Option<&mut AnalysisBinding>,
        surface: Option<&mut Canvas>,
        clock: &mut dyn FrameClock,
    ) {
        if self.pending != Some(handle) {
            return;
        }
        self.pending = None;
        let Some(binding) = binding else {
            if let Some(canvas) = surface {
                canvas.clear();
            }
            return;
        };
        if let Some(canvas) = surface {
            self.draw(playing, binding, canvas);
        }
        if playing {
            self.pending = Some(clock.request_frame());
        }
    }

    pub fn unmount(&mut self, clock: &mut dyn FrameClock) {
        self.cancel_pending(clock);
    }

    fn cancel_pending(&mut self, clock: &mut dyn FrameClock) {
        if let Some(handle) = self.pending.take() {
            clock.cancel_frame(handle);
        }
    }

    fn draw(&mut self, playing: bool, binding: &mut AnalysisBinding, canvas: &mut Canvas) {
        if canvas.width() == 0 || canvas.height() == 0 {
            return;
        }
        binding.pump();
        let bins = binding.analyser().frequency_bin_count();
        self.data.resize(bins, 0);
        match self.settings.style {
            VisualStyle::Bars => {
                binding.analyser_mut().byte_frequency_data(&mut self.data);
                styles::draw_bars(&self.data, playing, self.settings, canvas);
            }
            VisualStyle::Wave => {
                binding.analyser().byte_time_domain_data(&mut self.data);
                styles::draw_wave(&self.data, playing, self.settings, canvas);
            }
            VisualStyle::Circle => {
                binding.analyser_mut().byte_frequency_data(&mut self.data);
                styles::draw_circle(&self.data, playing, self.settings, canvas);
            }
        }
    }
}
