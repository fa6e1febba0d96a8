use crate::analyser::Analyser;
use crate::audio::{AudioGraph, AudioSource, DeviceGraph, SourceId};
use ringbuf::traits::{Consumer as _, Split as _};
use ringbuf::{HeapCons, HeapRb};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free lane between the device callback and the render thread.
const TAP_CAPACITY: usize = 1 << 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    InvalidFftSize(usize),
    EmptyClip,
}

impl fmt::Display for BindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFftSize(n) => write!(
                f,
                "invalid analysis resolution: {n} (expected a power of two in 32..=32768)"
            ),
            Self::EmptyClip => write!(f, "source clip has no samples"),
        }
    }
}

impl std::error::Error for BindingError {}

static NEXT_BINDING_ID: AtomicU64 = AtomicU64::new(1);

/// The tap connecting one source into one analysis node: audio graph,
/// analyser, and the ring-buffer lane between them. Created at most once
/// per source (see [`BindingCache`]); an audio platform forbids routing
/// one element into two analysis graphs.
pub struct AnalysisBinding {
    id: u64,
    source_id: SourceId,
    graph: Box<dyn AudioGraph>,
    analyser: Analyser,
    tap: HeapCons<f32>,
    scratch: Vec<f32>,
}

impl std::fmt::Debug for AnalysisBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisBinding")
            .field("id", &self.id)
            .field("source_id", &self.source_id)
            .finish_non_exhaustive()
    }
}

impl AnalysisBinding {
    /// Builds the device-backed graph for `source` and wires the tap.
    pub fn connect(source: &AudioSource, fft_size: usize) -> Result<Self, BindingError> {
        if let Some(clip) = source.as_clip() {
            if clip.is_empty() {
                return Err(BindingError::EmptyClip);
            }
        }
        let rb = HeapRb::<f32>::new(TAP_CAPACITY);
        let (prod, cons) = rb.split();
        let graph = Box::new(DeviceGraph::new(source, prod));
        Self::from_graph(source.id(), graph, cons, fft_size)
    }

    /// Assembles a binding over an existing graph and tap consumer. The
    /// public seam for offline rendering and for test stand-ins.
    pub fn from_graph(
        source_id: SourceId,
        graph: Box<dyn AudioGraph>,
        tap: HeapCons<f32>,
        fft_size: usize,
    ) -> Result<Self, BindingError> {
        if !Analyser::is_valid_fft_size(fft_size) {
            return Err(BindingError::InvalidFftSize(fft_size));
        }
        Ok(Self {
            id: NEXT_BINDING_ID.fetch_add(1, Ordering::Relaxed),
            source_id,
            graph,
            analyser: Analyser::new(fft_size),
            tap,
            scratch: vec![0.0; 512],
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn source_id(&self) -> SourceId {
        self.source_id
    }

    pub fn analyser(&self) -> &Analyser {
        &self.analyser
    }

    pub fn analyser_mut(&mut self) -> &mut Analyser {
        &mut self.analyser
    }

    pub fn graph(&self) -> &dyn AudioGraph {
        &*self.graph
    }

    pub fn graph_mut(&mut self) -> &mut dyn AudioGraph {
        &mut *self.graph
    }

    /// Drains the tap into the analyser. Called on the render thread at
    /// the top of every draw; device callbacks never touch the analyser.
    pub fn pump(&mut self) {
        loop {
            let mut n = 0usize;
            while n < self.scratch.len() {
                match self.tap.try_pop() {
                    Some(s) => {
                        self.scratch[n] = s;
                        n += 1;
                    }
                    None => break,
                }
            }
            if n == 0 {
                break;
            }
            self.analyser.push_samples(&self.scratch[..n]);
            if n < self.scratch.len() {
                break;
            }
        }
    }
}

/// Process-wide source-to-binding map guaranteeing a 1:1 mapping that
/// survives visualizer remounts.
///
/// Write-once-per-key: the first acquirer constructs the binding and fixes
/// its analysis resolution; later acquirers get the same entry back
/// unchanged. Membership is checked synchronously before any construction
/// work begins, so no locking is needed under cooperative scheduling.
/// Entries live until [`release`] — the explicit lifecycle hook replacing
/// collector-driven cleanup — removes them.
///
/// [`release`]: BindingCache::release
pub struct BindingCache {
    entries: HashMap<SourceId, AnalysisBinding>,
}

impl BindingCache {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn acquire(
        &mut self,
        source: &AudioSource,
        fft_size: usize,
    ) -> Result<&mut AnalysisBinding, BindingError> {
        match self.entries.entry(source.id()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(slot) => Ok(slot.insert(AnalysisBinding::connect(source, fft_size)?)),
        }
    }

    pub fn get_mut(&mut self, id: SourceId) -> Option<&mut AnalysisBinding> {
        self.entries.get_mut(&id)
    }

    pub fn contains(&self, id: SourceId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Disposes the binding for `id`. The owning playback component calls
    /// this when it drops the source; a later acquire builds afresh.
    pub fn release(&mut self, id: SourceId) -> bool {
        match self.entries.remove(&id) {
            Some(mut binding) => {
                let _ = binding.graph_mut().suspend();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for BindingCache {
    fn default() -> Self {
        Self::new()
    }
}
