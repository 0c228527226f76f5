//! Frequency- and level-domain checks of the stretchers and shifters.
//!
//! Spectra are measured with rustfft rather than the crate's own FFT so the
//! two implementations cross-check each other.

#[path = "helpers/mod.rs"]
mod helpers;

use helpers::tolerances::*;
use helpers::*;
use warble::prelude::*;
use warble::shift::{FormantShifterConfig, PitchShifterConfig};
use warble::stretch::PhaseVocoderConfig;

// =============================================================================
// Time stretching keeps pitch
// =============================================================================

#[test]
fn test_phase_vocoder_stretch_keeps_440hz() {
    let input = generate_sine(440.0, TEST_SAMPLE_RATE, 2048);
    let input_bin = dominant_bin(&input);
    assert_eq!(input_bin, frequency_bin(440.0, TEST_SAMPLE_RATE, 2048));

    let mut cache = FftCache::new();
    let mut pv = PhaseVocoder::new(PhaseVocoderConfig::default(), &mut cache).unwrap();
    pv.set_stretch_factor(2.0);
    pv.push_signal(&input);

    let mut out = vec![0.0; 4096];
    let produced = pv.pop_transformed_signal(&mut out);

    // More than the input length came out of 2048 samples, and the zero tail
    // is all that is missing.
    assert!(produced > 2560, "only {} samples", produced);
    assert_silence(&out[produced..], 0.0);

    let output_bin = dominant_bin(&out[512..2560]);
    assert!(
        output_bin.abs_diff(input_bin) <= 1,
        "dominant bin moved from {} to {}",
        input_bin,
        output_bin
    );
}

#[test]
fn test_every_stretcher_keeps_pitch_of_a_tone() {
    let input = generate_sine(440.0, TEST_SAMPLE_RATE, 32_768);
    let expected = frequency_bin(440.0, TEST_SAMPLE_RATE, 4096);

    for algorithm in [
        StretchAlgorithm::Ola,
        StretchAlgorithm::Wsola,
        StretchAlgorithm::PhaseVocoder,
        StretchAlgorithm::PhaseVocoderDoneRight,
    ] {
        for factor in [0.75, 1.5] {
            let mut cache = FftCache::new();
            let mut stretcher = algorithm.build(&mut cache, TEST_SAMPLE_RATE).unwrap();
            stretcher.set_stretch_factor(factor);
            stretcher.push_signal(&input);
            let out = drain(stretcher.as_mut(), TEST_BUFFER_SIZE);

            assert!(out.len() > 12_288, "{} at {}: {} samples", algorithm.name(), factor, out.len());
            assert_finite(&out);
            let bin = dominant_bin(&out[8192..12_288]);
            assert!(
                bin.abs_diff(expected) <= 1,
                "{} at {}: dominant bin {} (expected {})",
                algorithm.name(),
                factor,
                bin,
                expected
            );
        }
    }
}

// =============================================================================
// Pitch shifting moves pitch
// =============================================================================

#[test]
fn test_pitch_shifter_moves_dominant_frequency() {
    let input = generate_sine(440.0, TEST_SAMPLE_RATE, 65_536);

    for factor in [0.75f32, 1.5] {
        let mut cache = FftCache::new();
        let pv = PhaseVocoder::new(PhaseVocoderConfig::default(), &mut cache).unwrap();
        let mut shifter = ResamplingPitchShifter::new(Box::new(pv), PitchShifterConfig::default()).unwrap();
        shifter.set_shift_factor(factor);

        let out = stream(&mut shifter, &input, TEST_BUFFER_SIZE);
        assert!(out.len() > 24_576, "at {}: {} samples", factor, out.len());

        let expected = frequency_bin(440.0 * factor, TEST_SAMPLE_RATE, 4096);
        let bin = dominant_bin(&out[16_384..20_480]);
        assert!(
            bin.abs_diff(expected) <= 2,
            "at {}: dominant bin {} (expected {})",
            factor,
            bin,
            expected
        );
    }
}

#[test]
fn test_pitch_shifter_keeps_duration() {
    let input = generate_vowel(150.0, TEST_SAMPLE_RATE, 44_100);

    for factor in [0.6f32, 1.4] {
        let mut cache = FftCache::new();
        let stretcher = StretchAlgorithm::Wsola
            .build(&mut cache, TEST_SAMPLE_RATE)
            .unwrap();
        let mut shifter = ResamplingPitchShifter::new(stretcher, PitchShifterConfig::default()).unwrap();
        shifter.set_shift_factor(factor);

        let out = stream(&mut shifter, &input, TEST_BUFFER_SIZE);
        let ratio = out.len() as f32 / input.len() as f32;
        assert!(
            (0.85..=1.0).contains(&ratio),
            "at {}: {} of {} samples",
            factor,
            out.len(),
            input.len()
        );
    }
}

// =============================================================================
// Formant shifting keeps loudness
// =============================================================================

#[test]
fn test_formant_window_loudness_matches_input() {
    let mut cache = FftCache::new();
    let mut shifter = LpcFormantShifter::new(FormantShifterConfig::default(), &mut cache).unwrap();
    let size = shifter.window_size();

    let signals = [
        generate_vowel(140.0, TEST_SAMPLE_RATE, size),
        generate_vowel(260.0, TEST_SAMPLE_RATE, size),
        generate_noise(size, 17),
    ];

    for factor in [0.5f32, 0.8, 1.25, 2.0] {
        shifter.set_shift_factor(factor);
        for (i, signal) in signals.iter().enumerate() {
            let mut out = vec![0.0; size];
            shifter.shift_window(signal, &mut out).unwrap();

            let (before, after) = (rms(signal), rms(&out));
            assert!(
                ((after - before) / before).abs() < 1e-3,
                "signal {} at {}: rms {} became {}",
                i,
                factor,
                before,
                after
            );
        }
    }
}

#[test]
fn test_formant_stream_loudness_is_stable() {
    let input = generate_vowel(200.0, TEST_SAMPLE_RATE, 32_768);

    for factor in [0.7f32, 1.4] {
        let mut cache = FftCache::new();
        let mut shifter = LpcFormantShifter::new(FormantShifterConfig::default(), &mut cache).unwrap();
        shifter.set_shift_factor(factor);

        let out = stream(&mut shifter, &input, TEST_BUFFER_SIZE);
        assert!(out.len() > 24_576, "at {}: {} samples", factor, out.len());
        assert_finite(&out);

        let (before, after) = (rms(&input[4096..24_576]), rms(&out[4096..24_576]));
        assert!(
            ((after - before) / before).abs() < LOUDNESS_TOLERANCE,
            "at {}: rms {} became {}",
            factor,
            before,
            after
        );
    }
}

#[test]
fn test_formant_shift_keeps_pitch() {
    let input = generate_vowel(220.0, TEST_SAMPLE_RATE, 32_768);
    let expected = dominant_bin(&input[8192..16_384]);

    let mut cache = FftCache::new();
    let mut shifter = LpcFormantShifter::new(FormantShifterConfig::default(), &mut cache).unwrap();
    shifter.set_shift_factor(1.3);

    let out = stream(&mut shifter, &input, TEST_BUFFER_SIZE);
    let bin = dominant_bin(&out[8192..16_384]);

    // The envelope moves, the harmonics do not: whatever harmonic dominates
    // must still sit on the input's harmonic grid.
    let fundamental = 220.0 * 8192.0 / TEST_SAMPLE_RATE;
    let harmonic = (bin as f32 / fundamental).round();
    assert!(harmonic >= 1.0, "dominant bin {} below the fundamental", bin);
    assert!(
        (bin as f32 - harmonic * fundamental).abs() <= 3.0,
        "dominant bin {} is off the harmonic grid (input dominant {})",
        bin,
        expected
    );
}

#[test]
fn test_silence_stays_silent() {
    let input = generate_silence(8192);
    let mut cache = FftCache::new();

    let mut formant = LpcFormantShifter::new(FormantShifterConfig::default(), &mut cache).unwrap();
    formant.set_shift_factor(1.5);
    assert_silence(&stream(&mut formant, &input, TEST_BUFFER_SIZE), SILENCE_THRESHOLD);

    let pv = PhaseVocoder::done_right(PhaseVocoderConfig::default(), &mut cache).unwrap();
    let mut pitch = ResamplingPitchShifter::new(Box::new(pv), PitchShifterConfig::default()).unwrap();
    pitch.set_shift_factor(0.8);
    assert_silence(&stream(&mut pitch, &input, TEST_BUFFER_SIZE), SILENCE_THRESHOLD);
}
