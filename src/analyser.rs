use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

pub const MIN_FFT_SIZE: usize = 32;
pub const MAX_FFT_SIZE: usize = 32768;

/// Exponential smoothing applied to the linear magnitudes between
/// successive frequency reads.
pub const DEFAULT_SMOOTHING: f32 = 0.8;

/// dB range mapped linearly onto the 0..=255 byte scale.
pub const MIN_DECIBELS: f32 = -100.0;
pub const MAX_DECIBELS: f32 = -30.0;

/// Passive frequency/waveform analysis node.
///
/// Keeps the most recent `fft_size` mono samples in a ring and serves two
/// read-outs over them: windowed, smoothed spectral magnitudes on a dB byte
/// scale, and raw time-domain bytes centered at 128. It never touches the
/// signal path; the owning binding copies samples in via [`push_samples`]
/// on the render thread.
///
/// [`push_samples`]: Analyser::push_samples
pub struct Analyser {
    fft_size: usize,
    smoothing: f32,
    ring: Vec<f32>,
    write_pos: usize,
    hann: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
    fft_buf: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
}

impl Analyser {
    pub fn is_valid_fft_size(n: usize) -> bool {
        n.is_power_of_two() && (MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&n)
    }

    /// `fft_size` must satisfy [`Analyser::is_valid_fft_size`]; callers
    /// constructing from external input validate first (see `binding`).
    pub fn new(fft_size: usize) -> Self {
        debug_assert!(Self::is_valid_fft_size(fft_size));
        let hann = (0..fft_size)
            .map(|i| 0.5 - 0.5 * ((2.0 * PI * i as f32) / (fft_size as f32)).cos())
            .collect::<Vec<_>>();
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(fft_size);
        Self {
            fft_size,
            smoothing: DEFAULT_SMOOTHING,
            ring: vec![0.0; fft_size],
            write_pos: 0,
            hann,
            fft,
            fft_buf: vec![Complex { re: 0.0, im: 0.0 }; fft_size],
            smoothed: vec![0.0; fft_size / 2],
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn frequency_bin_count(&self) -> usize {
        self.fft_size / 2
    }

    pub fn push_samples(&mut self, samples: &[f32]) {
        for &s in samples {
            self.ring[self.write_pos] = s;
            self.write_pos = (self.write_pos + 1) % self.fft_size;
        }
    }

    /// Most recent samples as bytes centered at 128: silence reads exactly
    /// 128, full scale clamps to 0/255. Fills up to `out.len()` values in
    /// chronological order; slices longer than `fft_size` are zero-padded
    /// at the tail.
    pub fn byte_time_domain_data(&self, out: &mut [u8]) {
        let take = out.len().min(self.fft_size);
        let start = self.write_pos + self.fft_size - take;
        for (i, slot) in out.iter_mut().take(take).enumerate() {
            let s = self.ring[(start + i) % self.fft_size].clamp(-1.0, 1.0);
            *slot = ((1.0 + s) * 128.0).round().min(255.0) as u8;
        }
        for slot in out.iter_mut().skip(take) {
            *slot = 0;
        }
    }

    /// Windowed spectral magnitudes mapped from [-100, -30] dB onto
    /// 0..=255. Each call advances the smoothing state; silence decays
    /// toward 0 rather than snapping.
    pub fn byte_frequency_data(&mut self, out: &mut [u8]) {
        let n = self.fft_size;
        for i in 0..n {
            let s = self.ring[(self.write_pos + i) % n];
            self.fft_buf[i] = Complex {
                re: s * self.hann[i],
                im: 0.0,
            };
        }
        self.fft.process(&mut self.fft_buf);

        let half = n / 2;
        for i in 0..half {
            let c = self.fft_buf[i];
            let mag = (c.re * c.re + c.im * c.im).sqrt() / n as f32;
            self.smoothed[i] = self.smoothing * self.smoothed[i] + (1.0 - self.smoothing) * mag;
        }

        let take = out.len().min(half);
        for (i, slot) in out.iter_mut().take(take).enumerate() {
            let sm = self.smoothed[i];
            let db = if sm > 0.0 { 20.0 * sm.log10() } else { f32::NEG_INFINITY };
            let t = (db - MIN_DECIBELS) / (MAX_DECIBELS - MIN_DECIBELS);
            *slot = (t.clamp(0.0, 1.0) * 255.0).round() as u8;
        }
        for slot in out.iter_mut().skip(take) {
            *slot = 0;
        }
    }

    /// RMS over the current ring; HUD-level metering only.
    pub fn level(&self) -> f32 {
        let acc: f32 = self.ring.iter().map(|s| s * s).sum();
        (acc / self.fft_size as f32).sqrt().clamp(0.0, 1.0)
    }
}
