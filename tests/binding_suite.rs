use ringbuf::traits::{Producer as _, Split as _};
use ringbuf::HeapRb;
use trackviz::audio::{AudioClip, AudioGraph, AudioSource, GraphError, GraphState};
use trackviz::binding::{AnalysisBinding, BindingCache, BindingError};

fn clip_source(label: &str) -> AudioSource {
    AudioSource::clip(label, AudioClip::from_samples(vec![0.0; 4800], 48_000))
}

struct StubGraph;

impl AudioGraph for StubGraph {
    fn state(&self) -> GraphState {
        GraphState::Suspended
    }

    fn resume(&mut self) -> Result<(), GraphError> {
        Ok(())
    }

    fn suspend(&mut self) -> Result<(), GraphError> {
        Ok(())
    }
}

// ── Cache semantics ─────────────────────────────────────────────────────────

#[test]
fn acquire_is_idempotent_per_source() {
    let source = clip_source("one");
    let mut cache = BindingCache::new();

    let first_id = cache.acquire(&source, 64).expect("first acquire").id();
    // Second acquire asks for a different resolution; first acquirer wins.
    let binding = cache.acquire(&source, 256).expect("second acquire");
    assert_eq!(binding.id(), first_id, "same source, same binding");
    assert_eq!(binding.analyser().fft_size(), 64);
    assert_eq!(cache.len(), 1);
}

#[test]
fn distinct_sources_get_distinct_bindings() {
    let a = clip_source("a");
    let b = clip_source("b");
    assert_ne!(a.id(), b.id(), "source ids are process-unique");

    let mut cache = BindingCache::new();
    let id_a = cache.acquire(&a, 64).expect("bind a").id();
    let id_b = cache.acquire(&b, 64).expect("bind b").id();
    assert_ne!(id_a, id_b);
    assert_eq!(cache.len(), 2);
}

#[test]
fn release_disposes_and_allows_fresh_binding() {
    let source = clip_source("one");
    let mut cache = BindingCache::new();

    let old_id = cache.acquire(&source, 64).expect("bind").id();
    assert!(cache.release(source.id()));
    assert!(!cache.contains(source.id()));
    assert!(cache.is_empty());

    let new_id = cache.acquire(&source, 256).expect("rebind").id();
    assert_ne!(old_id, new_id, "release must not resurrect the old binding");
    // The fresh binding takes the freshly requested resolution.
    assert_eq!(
        cache.get_mut(source.id()).expect("entry").analyser().fft_size(),
        256
    );
}

#[test]
fn release_of_unknown_source_is_a_noop() {
    let source = clip_source("one");
    let mut cache = BindingCache::new();
    assert!(!cache.release(source.id()));
}

// ── Construction errors ─────────────────────────────────────────────────────

#[test]
fn empty_clip_is_rejected() {
    let source = AudioSource::clip("empty", AudioClip::from_samples(Vec::new(), 48_000));
    let mut cache = BindingCache::new();
    let err = cache.acquire(&source, 64).expect_err("empty clip must fail");
    assert!(matches!(err, BindingError::EmptyClip));
    assert!(cache.is_empty(), "failed construction leaves no entry");
}

#[test]
fn invalid_fft_size_is_rejected() {
    let source = AudioSource::mic(None);
    for bad in [0usize, 100, 16, 65536] {
        let rb = HeapRb::<f32>::new(64);
        let (_prod, cons) = rb.split();
        let err = AnalysisBinding::from_graph(source.id(), Box::new(StubGraph), cons, bad)
            .expect_err("invalid resolution must fail");
        assert!(matches!(err, BindingError::InvalidFftSize(n) if n == bad));
    }
}

// ── Tap plumbing ────────────────────────────────────────────────────────────

#[test]
fn pump_drains_tap_into_analyser() {
    let source = AudioSource::mic(None);
    let rb = HeapRb::<f32>::new(1 << 12);
    let (mut prod, cons) = rb.split();
    let mut binding = AnalysisBinding::from_graph(source.id(), Box::new(StubGraph), cons, 64)
        .expect("binding should build");

    for _ in 0..64 {
        prod.try_push(0.5).expect("tap has room");
    }
    binding.pump();

    let mut out = [0u8; 32];
    binding.analyser().byte_time_domain_data(&mut out);
    assert!(out.iter().all(|&b| b == 192), "0.5 reads as byte 192");
}

#[test]
fn clip_metadata_survives_decode_helpers() {
    let clip = AudioClip::from_samples(vec![0.25; 96_000], 48_000);
    assert_eq!(clip.sample_rate(), 48_000);
    assert_eq!(clip.len(), 96_000);
    assert!(!clip.is_empty());
    assert!((clip.duration_secs() - 2.0).abs() < 1e-6);
}
