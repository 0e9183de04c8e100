//! End-to-end properties of the conditioning pipeline, driven through the
//! public API with a deterministic scripted speech model.

use std::f32::consts::TAU;

use praevox_core::{
    InputPcm, ModelHandle, Pipeline, PipelineConfig, Result, SpeechProbabilityModel,
};

/// Replays a fixed per-frame probability script; frames past the script end
/// score as silence.
struct ScriptedModel {
    window: usize,
    probs: Vec<f32>,
    idx: usize,
}

impl ScriptedModel {
    fn new(window: usize, probs: Vec<f32>) -> Self {
        Self {
            window,
            probs,
            idx: 0,
        }
    }

    /// Probability 0.9 for frames whose start lies inside `speech_samples`,
    /// 0.05 afterwards, for a buffer of `total_samples`.
    fn speech_then_silence(window: usize, speech_samples: usize, total_samples: usize) -> Self {
        let frames = total_samples / window;
        let probs = (0..frames)
            .map(|i| if i * window < speech_samples { 0.9 } else { 0.05 })
            .collect();
        Self::new(window, probs)
    }
}

impl SpeechProbabilityModel for ScriptedModel {
    fn window_size(&self) -> usize {
        self.window
    }

    fn predict(&mut self, _frame: &[f32]) -> Result<f32> {
        let p = self.probs.get(self.idx).copied().unwrap_or(0.0);
        self.idx += 1;
        Ok(p)
    }

    fn reset(&mut self) {
        self.idx = 0;
    }
}

fn tone(freq: f32, rate: u32, n: usize, amplitude: f32) -> Vec<f32> {
    (0..n)
        .map(|i| (TAU * freq * i as f32 / rate as f32).sin() * amplitude)
        .collect()
}

/// ±amplitude square wave — constant magnitude, zero mean, immune to trim.
fn square(n: usize, amplitude: f32) -> Vec<f32> {
    (0..n)
        .map(|i| if i % 2 == 0 { amplitude } else { -amplitude })
        .collect()
}

/// Config with every numeric stage that changes sample values disabled, so
/// duration arithmetic is exact.
fn duration_only_config() -> PipelineConfig {
    PipelineConfig {
        hp_cutoff_hz: None,
        lp_cutoff_hz: None,
        normalize_enabled: false,
        noise_enabled: false,
        speech_pad_ms: 0,
        ..Default::default()
    }
}

#[test]
fn gap_over_threshold_compresses_to_exactly_twice_keep_ms() {
    const RATE: u32 = 16_000;
    const WINDOW: usize = 160; // 10 ms frames for clean boundary math

    // 1 s speech, 700 ms silence, 1 s speech
    let mut samples = square(16_000, 0.5);
    samples.extend(square(11_200, 0.02));
    samples.extend(square(16_000, 0.5));
    let total = samples.len();

    let mut probs = vec![0.9f32; 100];
    probs.extend(vec![0.05f32; 70]);
    probs.extend(vec![0.9f32; 100]);

    let pipeline = Pipeline::with_model(
        duration_only_config(),
        ModelHandle::new(ScriptedModel::new(WINDOW, probs)),
    )
    .unwrap();
    let out = pipeline.process(InputPcm::mono(samples, RATE)).unwrap();

    // 700 ms gap > 600 ms threshold → 150 ms kept at each edge
    assert_eq!(out.stats.speech_segment_count, 2);
    assert_eq!(out.stats.silence_removed_ms, 400);
    assert_eq!(out.samples.len(), total - 6_400);
}

#[test]
fn gap_under_threshold_is_retained_in_full() {
    const RATE: u32 = 16_000;
    const WINDOW: usize = 160;

    // 1 s speech, 500 ms silence, 1 s speech
    let mut samples = square(16_000, 0.5);
    samples.extend(square(8_000, 0.02));
    samples.extend(square(16_000, 0.5));
    let total = samples.len();

    let mut probs = vec![0.9f32; 100];
    probs.extend(vec![0.05f32; 50]);
    probs.extend(vec![0.9f32; 100]);

    let pipeline = Pipeline::with_model(
        duration_only_config(),
        ModelHandle::new(ScriptedModel::new(WINDOW, probs)),
    )
    .unwrap();
    let out = pipeline.process(InputPcm::mono(samples, RATE)).unwrap();

    assert_eq!(out.stats.speech_segment_count, 2);
    assert_eq!(out.stats.silence_removed_ms, 0);
    assert_eq!(out.samples.len(), total);
}

#[test]
fn sixty_second_recording_with_ten_seconds_of_speech() {
    const RATE: u32 = 16_000;
    const WINDOW: usize = 512;
    let speech_samples = 10 * RATE as usize;
    let total_samples = 60 * RATE as usize;

    // 10 s of 440 Hz "speech", then 50 s of quiet 220 Hz room tone that
    // stays above the trim threshold so duration arithmetic is observable.
    let mut samples = tone(440.0, RATE, speech_samples, 0.5);
    samples.extend(tone(220.0, RATE, total_samples - speech_samples, 0.1));

    let model = ScriptedModel::speech_then_silence(WINDOW, speech_samples, total_samples);
    let pipeline =
        Pipeline::with_model(PipelineConfig::default(), ModelHandle::new(model)).unwrap();
    let out = pipeline.process(InputPcm::mono(samples, RATE)).unwrap();

    assert_eq!(out.stats.original_duration_ms, 60_000);
    assert_eq!(out.stats.speech_segment_count, 1);
    // ≈ 10 s of speech + 2 × 150 ms retained silence (plus the ~30 ms
    // default speech pad and the 32 ms frame quantization)
    assert!(
        (10_200..=10_450).contains(&out.stats.final_duration_ms),
        "final duration {} ms",
        out.stats.final_duration_ms
    );
    let ratio = out.stats.compression_ratio;
    assert!(
        (0.820..=0.835).contains(&ratio),
        "compression ratio {ratio}"
    );
}

#[test]
fn compression_never_expands_and_ratio_is_bounded() {
    const RATE: u32 = 16_000;
    const WINDOW: usize = 160;

    let cases: Vec<(Vec<f32>, Vec<f32>)> = vec![
        // All speech
        (square(32_000, 0.5), vec![0.9; 200]),
        // All silence
        (square(32_000, 0.02), vec![0.05; 200]),
        // Alternating second-long spans
        (
            {
                let mut v = square(16_000, 0.5);
                v.extend(square(16_000, 0.02));
                v.extend(square(16_000, 0.5));
                v
            },
            {
                let mut p = vec![0.9f32; 100];
                p.extend(vec![0.05f32; 100]);
                p.extend(vec![0.9f32; 100]);
                p
            },
        ),
    ];

    for (samples, probs) in cases {
        let original_ms = samples.len() as u64 * 1000 / RATE as u64;
        let pipeline = Pipeline::with_model(
            duration_only_config(),
            ModelHandle::new(ScriptedModel::new(WINDOW, probs)),
        )
        .unwrap();
        let out = pipeline.process(InputPcm::mono(samples, RATE)).unwrap();
        assert!(out.stats.final_duration_ms <= original_ms);
        assert!((0.0..=1.0).contains(&out.stats.compression_ratio));
    }
}

#[test]
fn dc_offset_is_removed_even_with_other_stages_disabled() {
    const RATE: u32 = 16_000;
    let samples: Vec<f32> = tone(440.0, RATE, 32_000, 0.4)
        .into_iter()
        .map(|s| s + 0.3)
        .collect();

    let config = PipelineConfig {
        hp_cutoff_hz: None,
        lp_cutoff_hz: None,
        normalize_enabled: false,
        noise_enabled: false,
        vad_enabled: false,
        silence_enabled: false,
        ..Default::default()
    };
    let pipeline = Pipeline::new(config).unwrap();
    let out = pipeline.process(InputPcm::mono(samples, RATE)).unwrap();

    let mean =
        out.samples.iter().map(|s| *s as f64).sum::<f64>() / out.samples.len() as f64;
    // 0.3 offset would be ≈ 9830 in i16 units; removal leaves it near zero
    assert!(mean.abs() < 50.0, "residual DC mean {mean}");
}

#[test]
fn out_of_range_samples_are_clipped_to_valid_pcm() {
    const RATE: u32 = 16_000;
    // Amplitude 3.0 — far outside [-1, 1]
    let samples = tone(440.0, RATE, 16_000, 3.0);

    let config = PipelineConfig {
        hp_cutoff_hz: None,
        lp_cutoff_hz: None,
        normalize_enabled: false,
        noise_enabled: false,
        vad_enabled: false,
        silence_enabled: false,
        ..Default::default()
    };
    let pipeline = Pipeline::new(config).unwrap();
    let out = pipeline.process(InputPcm::mono(samples, RATE)).unwrap();

    // Saturation engaged, but never wrapped
    assert!(out.samples.iter().any(|s| *s == 32_767 || *s == -32_767));
    assert!(out.samples.iter().all(|s| (-32_767..=32_767).contains(s)));
}

#[test]
fn forty_four_one_stereo_input_lands_at_sixteen_k_mono() {
    const WINDOW: usize = 512;
    let frames = 44_100; // 1 s
    let mut samples = Vec::with_capacity(frames * 2);
    for i in 0..frames {
        let v = (TAU * 500.0 * i as f32 / 44_100.0).sin() * 0.4;
        samples.push(v * 0.8);
        samples.push(v * 1.2);
    }
    let input = InputPcm {
        samples,
        sample_rate: 44_100,
        channels: 2,
    };

    let model = ScriptedModel::new(WINDOW, vec![0.9; 64]);
    let config = PipelineConfig {
        speech_pad_ms: 0,
        ..Default::default()
    };
    let pipeline = Pipeline::with_model(config, ModelHandle::new(model)).unwrap();
    let out = pipeline.process(input).unwrap();

    assert_eq!(out.sample_rate, 16_000);
    assert_eq!(out.stats.original_sample_rate, 44_100);
    assert_eq!(out.stats.original_channels, 2);
    assert_eq!(out.stats.original_duration_ms, 1_000);
    assert!(out.stats.final_duration_ms >= 950);
}
