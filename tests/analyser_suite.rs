use std::f32::consts::PI;
use trackviz::analyser::Analyser;

fn sine(cycles: usize, n: usize, amplitude: f32) -> Vec<f32> {
    (0..n)
        .map(|i| (2.0 * PI * cycles as f32 * i as f32 / n as f32).sin() * amplitude)
        .collect()
}

// ── Time-domain bytes ───────────────────────────────────────────────────────

#[test]
fn silence_reads_exactly_128() {
    let analyser = Analyser::new(256);
    let mut out = [0u8; 128];
    analyser.byte_time_domain_data(&mut out);
    assert!(out.iter().all(|&b| b == 128));
}

#[test]
fn half_scale_maps_to_192() {
    let mut analyser = Analyser::new(64);
    analyser.push_samples(&[0.5]);
    let mut out = [0u8; 64];
    analyser.byte_time_domain_data(&mut out);
    assert_eq!(out[63], 192, "newest sample lands at the tail");
}

#[test]
fn full_scale_clamps_to_byte_range() {
    let mut analyser = Analyser::new(64);
    analyser.push_samples(&[2.0, -2.0]);
    let mut out = [0u8; 64];
    analyser.byte_time_domain_data(&mut out);
    assert_eq!(out[62], 255);
    assert_eq!(out[63], 0);
}

#[test]
fn time_domain_keeps_chronological_order() {
    let mut analyser = Analyser::new(32);
    // Overfill the ring so wraparound ordering is exercised.
    for i in 0..40 {
        analyser.push_samples(&[i as f32 / 100.0]);
    }
    let mut out = [0u8; 32];
    analyser.byte_time_domain_data(&mut out);
    let mut last = 0u8;
    for &b in &out {
        assert!(b >= last, "samples must read oldest to newest");
        last = b;
    }
}

// ── Frequency bytes ─────────────────────────────────────────────────────────

#[test]
fn silence_spectrum_reads_zero() {
    let mut analyser = Analyser::new(256);
    let mut out = [0u8; 128];
    analyser.byte_frequency_data(&mut out);
    assert!(out.iter().all(|&b| b == 0));
}

#[test]
fn sine_peaks_at_its_bin() {
    let mut analyser = Analyser::new(256);
    analyser.push_samples(&sine(8, 256, 0.5));

    let mut out = [0u8; 128];
    analyser.byte_frequency_data(&mut out);

    let peak = out
        .iter()
        .enumerate()
        .max_by_key(|&(_, &v)| v)
        .map(|(i, _)| i)
        .unwrap();
    assert_eq!(peak, 8, "energy should land in the sine's bin");
    assert!(out[8] > 0);
    assert!(out[100] < out[8], "far bins stay well below the peak");
}

#[test]
fn smoothing_rises_toward_steady_state() {
    let mut analyser = Analyser::new(256);
    analyser.push_samples(&sine(8, 256, 0.5));

    let mut first = [0u8; 128];
    analyser.byte_frequency_data(&mut first);
    let mut second = [0u8; 128];
    analyser.byte_frequency_data(&mut second);

    assert!(
        second[8] > first[8],
        "repeated reads over the same signal approach full magnitude"
    );
}

#[test]
fn bin_count_is_half_fft_size() {
    assert_eq!(Analyser::new(256).frequency_bin_count(), 128);
    assert_eq!(Analyser::new(64).frequency_bin_count(), 32);
}

#[test]
fn output_slices_of_any_length_are_safe() {
    let mut analyser = Analyser::new(64);
    analyser.push_samples(&sine(4, 64, 0.5));

    let mut short = [0u8; 10];
    analyser.byte_frequency_data(&mut short);

    let mut long = [7u8; 300];
    analyser.byte_frequency_data(&mut long);
    assert!(long[32..].iter().all(|&b| b == 0), "tail is zero-padded");

    let mut long_time = [7u8; 300];
    analyser.byte_time_domain_data(&mut long_time);
    assert!(long_time[64..].iter().all(|&b| b == 0));
}

#[test]
fn level_is_zero_for_silence_and_positive_for_signal() {
    let mut analyser = Analyser::new(64);
    assert_eq!(analyser.level(), 0.0);
    analyser.push_samples(&sine(4, 64, 0.5));
    assert!(analyser.level() > 0.2);
}
