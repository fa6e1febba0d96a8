use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample};
use ringbuf::traits::Producer as _;
use ringbuf::HeapProd;
use std::fmt;
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Stable identity of a playable source. The binding cache keys on this,
/// never on the source value itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(u64);

static NEXT_SOURCE_ID: AtomicU64 = AtomicU64::new(1);

impl SourceId {
    fn next() -> Self {
        Self(NEXT_SOURCE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "src#{}", self.0)
    }
}

/// Decoded track, mono f32.
#[derive(Clone)]
pub struct AudioClip {
    samples: Arc<Vec<f32>>,
    sample_rate: u32,
}

impl AudioClip {
    pub fn from_samples(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples: Arc::new(samples),
            sample_rate,
        }
    }

    /// Decodes a WAV file and downmixes interleaved frames to mono.
    pub fn load_wav(path: &Path) -> anyhow::Result<Self> {
        let mut reader =
            hound::WavReader::open(path).with_context(|| format!("open {}", path.display()))?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let mut mono = Vec::with_capacity(reader.len() as usize / channels);
        let mut acc = 0.0f32;
        let mut ch = 0usize;
        let mut push = |v: f32, mono: &mut Vec<f32>| {
            acc += v;
            ch += 1;
            if ch == channels {
                mono.push(acc / channels as f32);
                acc = 0.0;
                ch = 0;
            }
        };

        match spec.sample_format {
            hound::SampleFormat::Float => {
                for s in reader.samples::<f32>() {
                    push(s.context("decode samples")?, &mut mono);
                }
            }
            hound::SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
                for s in reader.samples::<i32>() {
                    push(s.context("decode samples")? as f32 / scale, &mut mono);
                }
            }
        }

        Ok(Self::from_samples(mono, spec.sample_rate))
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate.max(1) as f32
    }

    fn samples_arc(&self) -> Arc<Vec<f32>> {
        Arc::clone(&self.samples)
    }
}

pub enum SourceKind {
    Clip(AudioClip),
    Mic { device: Option<String> },
}

/// Opaque handle to a signal producer. Owned by the playback side; the
/// visualizer only ever sees the binding acquired for it.
pub struct AudioSource {
    id: SourceId,
    kind: SourceKind,
    label: String,
}

impl AudioSource {
    pub fn clip(label: impl Into<String>, clip: AudioClip) -> Self {
        Self {
            id: SourceId::next(),
            kind: SourceKind::Clip(clip),
            label: label.into(),
        }
    }

    pub fn mic(device: Option<String>) -> Self {
        let label = device.clone().unwrap_or_else(|| "mic".to_string());
        Self {
            id: SourceId::next(),
            kind: SourceKind::Mic { device },
            label,
        }
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn as_clip(&self) -> Option<&AudioClip> {
        match &self.kind {
            SourceKind::Clip(c) => Some(c),
            SourceKind::Mic { .. } => None,
        }
    }

    pub fn kind(&self) -> &SourceKind {
        &self.kind
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphState {
    Suspended,
    Running,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    NoDevice(String),
    UnsupportedFormat(String),
    Stream(String),
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDevice(which) => write!(f, "no {which} device"),
            Self::UnsupportedFormat(sf) => write!(f, "unsupported sample format: {sf}"),
            Self::Stream(msg) => write!(f, "audio stream: {msg}"),
        }
    }
}

impl std::error::Error for GraphError {}

/// The audio-graph seam the visualizer drives: it resumes a suspended graph
/// on the Active transition and otherwise leaves playback control to the
/// owner. Device-free implementations stand in during tests.
pub trait AudioGraph {
    fn state(&self) -> GraphState;
    fn resume(&mut self) -> Result<(), GraphError>;
    fn suspend(&mut self) -> Result<(), GraphError>;
}

enum Route {
    Clip(AudioClip),
    Mic { device: Option<String> },
}

/// cpal-backed graph. Starts Suspended and builds its device stream lazily
/// on first resume; the tap producer moves into the stream callback then.
///
/// Clip route: source -> every output channel, with each pulled sample
/// copied into the tap (the analysis node never alters the signal). Mic
/// route: capture only; input is never monitored back to an output.
pub struct DeviceGraph {
    route: Route,
    state: GraphState,
    stream: Option<cpal::Stream>,
    tap: Option<HeapProd<f32>>,
}

impl DeviceGraph {
    pub fn new(source: &AudioSource, tap: HeapProd<f32>) -> Self {
        let route = match source.kind() {
            SourceKind::Clip(clip) => Route::Clip(clip.clone()),
            SourceKind::Mic { device } => Route::Mic {
                device: device.clone(),
            },
        };
        Self {
            route,
            state: GraphState::Suspended,
            stream: None,
            tap: Some(tap),
        }
    }
}

impl AudioGraph for DeviceGraph {
    fn state(&self) -> GraphState {
        self.state
    }

    fn resume(&mut self) -> Result<(), GraphError> {
        if self.state == GraphState::Running {
            return Ok(());
        }
        if self.stream.is_none() {
            let Some(tap) = self.tap.take() else {
                return Err(GraphError::Stream(
                    "graph construction previously failed".to_string(),
                ));
            };
            let stream = match &self.route {
                Route::Clip(clip) => build_clip_stream(clip, tap)?,
                Route::Mic { device } => build_mic_stream(device.as_deref(), tap)?,
            };
            self.stream = Some(stream);
        }
        if let Some(stream) = &self.stream {
            stream
                .play()
                .map_err(|e| GraphError::Stream(e.to_string()))?;
        }
        self.state = GraphState::Running;
        Ok(())
    }

    fn suspend(&mut self) -> Result<(), GraphError> {
        if self.state == GraphState::Suspended {
            return Ok(());
        }
        if let Some(stream) = &self.stream {
            stream
                .pause()
                .map_err(|e| GraphError::Stream(e.to_string()))?;
        }
        self.state = GraphState::Suspended;
        Ok(())
    }
}

fn build_clip_stream(clip: &AudioClip, tap: HeapProd<f32>) -> Result<cpal::Stream, GraphError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| GraphError::NoDevice("output".to_string()))?;
    let supported = device
        .default_output_config()
        .map_err(|e| GraphError::Stream(e.to_string()))?;
    let config: cpal::StreamConfig = supported.clone().into();
    let step = clip.sample_rate() as f64 / config.sample_rate.0.max(1) as f64;
    let samples = clip.samples_arc();
    if samples.is_empty() {
        return Err(GraphError::Stream("clip has no samples".to_string()));
    }

    match supported.sample_format() {
        SampleFormat::F32 => clip_stream::<f32>(&device, &config, samples, step, tap),
        SampleFormat::I16 => clip_stream::<i16>(&device, &config, samples, step, tap),
        SampleFormat::U16 => clip_stream::<u16>(&device, &config, samples, step, tap),
        other => Err(GraphError::UnsupportedFormat(format!("{other:?}"))),
    }
}

fn clip_stream<T: SizedSample + FromSample<f32>>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    samples: Arc<Vec<f32>>,
    step: f64,
    mut tap: HeapProd<f32>,
) -> Result<cpal::Stream, GraphError> {
    let channels = (config.channels as usize).max(1);
    let mut pos = 0.0f64;
    let err_fn = |err| eprintln!("audio stream error: {err}");

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _| {
                for frame in data.chunks_mut(channels) {
                    // Nearest-sample rate conversion; the clip loops.
                    let s = samples[pos as usize % samples.len()];
                    pos += step;
                    if pos >= samples.len() as f64 {
                        pos -= samples.len() as f64;
                    }
                    let v = T::from_sample(s);
                    for slot in frame.iter_mut() {
                        *slot = v;
                    }
                    let _ = tap.try_push(s);
                }
            },
            err_fn,
            None,
        )
        .map_err(|e| GraphError::Stream(e.to_string()))
}

fn build_mic_stream(
    device_query: Option<&str>,
    mut tap: HeapProd<f32>,
) -> Result<cpal::Stream, GraphError> {
    let host = cpal::default_host();
    let device = select_input_device(&host, device_query)?;
    let supported = device
        .default_input_config()
        .map_err(|e| GraphError::Stream(e.to_string()))?;
    let channels = supported.channels().max(1) as usize;
    let config: cpal::StreamConfig = supported.clone().into();
    let err_fn = |err| eprintln!("audio stream error: {err}");

    match supported.sample_format() {
        SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _| push_interleaved(data, channels, &mut tap),
            err_fn,
            None,
        ),
        SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _| push_interleaved(data, channels, &mut tap),
            err_fn,
            None,
        ),
        SampleFormat::U16 => device.build_input_stream(
            &config,
            move |data: &[u16], _| push_interleaved(data, channels, &mut tap),
            err_fn,
            None,
        ),
        other => return Err(GraphError::UnsupportedFormat(format!("{other:?}"))),
    }
    .map_err(|e| GraphError::Stream(e.to_string()))
}

fn select_input_device(
    host: &cpal::Host,
    device_query: Option<&str>,
) -> Result<cpal::Device, GraphError> {
    let devices = host
        .input_devices()
        .map_err(|e| GraphError::Stream(e.to_string()))?
        .collect::<Vec<_>>();

    if let Some(want) = device_query.map(|s| s.to_lowercase()) {
        return devices
            .into_iter()
            .find(|d| {
                d.name()
                    .map(|n| n.to_lowercase().contains(&want))
                    .unwrap_or(false)
            })
            .ok_or(GraphError::NoDevice(format!("input matching '{want}'")));
    }

    host.default_input_device()
        .ok_or_else(|| GraphError::NoDevice("input".to_string()))
}

fn push_interleaved<T: Sample<Float = f32> + Copy>(
    data: &[T],
    channels: usize,
    tap: &mut HeapProd<f32>,
) {
    for frame in data.chunks(channels) {
        let mut acc = 0.0f32;
        for s in frame {
            acc += (*s).to_float_sample();
        }
        let _ = tap.try_push(acc / channels as f32);
    }
}

pub fn list_input_devices() -> anyhow::Result<()> {
    let host = cpal::default_host();
    let devices = host.input_devices().context("enumerate input devices")?;

    let mut out = io::stdout();
    writeln!(out, "Input devices:")?;
    for dev in devices {
        let name = dev.name().unwrap_or_else(|_| "<unknown>".to_string());
        writeln!(out, "  - {name}")?;
    }
    Ok(())
}
