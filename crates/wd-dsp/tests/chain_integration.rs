//! Effects chain integration tests
//!
//! Verifies:
//! - Full signal path integrity (no NaN/Inf, bounded output)
//! - Stage order (gate before EQ before compressor)
//! - Output independent of the order settings were applied in
//! - Per-render reset determinism

use wd_core::{db_to_gain, CompressorSettings, EqSettings, GateSettings};
use wd_dsp::dynamics::{Compressor, NoiseGate};
use wd_dsp::{ChainSettings, EffectsChain, EqSimulator, MonoProcessor, Processor};

const SAMPLE_RATE: f64 = 48000.0;

/// Rectified sine, the magnitude sequence the renderer feeds the chain
fn generate_sine_gain(samples: usize, freq: f64, amplitude: f64) -> Vec<f64> {
    (0..samples)
        .map(|i| {
            let t = i as f64 / SAMPLE_RATE;
            (amplitude * (2.0 * std::f64::consts::PI * freq * t).sin()).abs()
        })
        .collect()
}

fn is_valid_signal(signal: &[f64]) -> bool {
    signal.iter().all(|&x| x.is_finite())
}

fn all_enabled() -> ChainSettings {
    ChainSettings::default()
        .with_normalize(-3.0)
        .with_fades(100.0, 100.0)
        .with_gate(GateSettings {
            enabled: true,
            threshold_db: -40.0,
            ..GateSettings::default()
        })
        .with_eq(EqSettings { enabled: true, ..EqSettings::default() })
        .with_compressor(CompressorSettings {
            enabled: true,
            threshold_db: -12.0,
            ..CompressorSettings::default()
        })
}

fn run(chain: &mut EffectsChain, input: &[f64]) -> Vec<f64> {
    let end_ms = input.len() as f64 * 1000.0 / SAMPLE_RATE;
    input
        .iter()
        .enumerate()
        .map(|(i, &g)| chain.process(g, i as f64 * 1000.0 / SAMPLE_RATE, 0.0, end_ms))
        .collect()
}

#[test]
fn test_full_chain_output_is_bounded() {
    let input = generate_sine_gain(48000, 440.0, 1.0);
    let mut chain = EffectsChain::new(all_enabled(), SAMPLE_RATE);
    let output = run(&mut chain, &input);

    assert!(is_valid_signal(&output));
    assert!(output.iter().all(|&x| (0.001..=3.0).contains(&x)));
}

#[test]
fn test_stage_order_matches_manual_composition() {
    let settings = ChainSettings::default()
        .with_normalize(-3.0)
        .with_fades(50.0, 50.0)
        .with_gate(GateSettings {
            enabled: true,
            threshold_db: -30.0,
            ..GateSettings::default()
        })
        .with_eq(EqSettings { enabled: true, ..EqSettings::default() })
        .with_compressor(CompressorSettings {
            enabled: true,
            threshold_db: -10.0,
            ..CompressorSettings::default()
        });

    let input = generate_sine_gain(9600, 220.0, 0.8);
    let end_ms = input.len() as f64 * 1000.0 / SAMPLE_RATE;
    let mut chain = EffectsChain::new(settings, SAMPLE_RATE);

    let mut gate = NoiseGate::new(settings.gate, SAMPLE_RATE);
    let mut eq = EqSimulator::new(settings.eq);
    let mut comp = Compressor::new(settings.compressor, SAMPLE_RATE);
    let normalize = db_to_gain(-3.0);
    let mut previous = 0.0;

    for (i, &g) in input.iter().enumerate() {
        let t = i as f64 * 1000.0 / SAMPLE_RATE;
        let mut expected = g * normalize;
        expected *= (t / 50.0).clamp(0.0, 1.0);
        expected *= ((end_ms - t) / 50.0).clamp(0.0, 1.0);
        expected = gate.process_sample(expected);
        eq.update_content(previous);
        expected = eq.process(expected);
        expected = comp.process_sample(expected);
        expected = expected.clamp(0.001, 3.0);
        previous = expected;

        let actual = chain.process(g, t, 0.0, end_ms);
        assert_eq!(actual, expected, "diverged at sample {}", i);
    }
}

#[test]
fn test_settings_order_does_not_change_output() {
    let gate = GateSettings {
        enabled: true,
        threshold_db: -35.0,
        ..GateSettings::default()
    };
    let mut eq = EqSettings { enabled: true, ..EqSettings::default() };
    eq.low.gain_db = 4.0;
    eq.high.gain_db = -3.0;
    let compressor = CompressorSettings {
        enabled: true,
        threshold_db: -15.0,
        ratio: 3.0,
        ..CompressorSettings::default()
    };

    let forward = ChainSettings::default()
        .with_normalize(-2.0)
        .with_fades(40.0, 60.0)
        .with_gate(gate)
        .with_eq(eq)
        .with_compressor(compressor);
    let reverse = ChainSettings::default()
        .with_compressor(compressor)
        .with_eq(eq)
        .with_gate(gate)
        .with_fades(40.0, 60.0)
        .with_normalize(-2.0);
    // Stages switched off and on again along the way
    let toggled = ChainSettings::default()
        .with_eq(eq)
        .with_compressor(CompressorSettings::default())
        .with_gate(gate)
        .with_eq(EqSettings::default())
        .with_normalize(-2.0)
        .with_compressor(compressor)
        .with_fades(40.0, 60.0)
        .with_eq(eq);
    assert_eq!(forward, reverse);
    assert_eq!(forward, toggled);

    // Amplitude steps so the gate, EQ heuristic and compressor all move
    let input: Vec<f64> = generate_sine_gain(9600, 330.0, 0.9)
        .into_iter()
        .enumerate()
        .map(|(i, g)| if (i / 1200) % 2 == 0 { g } else { g * 0.005 })
        .collect();

    let expected = run(&mut EffectsChain::new(forward, SAMPLE_RATE), &input);
    for settings in [reverse, toggled] {
        let actual = run(&mut EffectsChain::new(settings, SAMPLE_RATE), &input);
        assert_eq!(actual, expected);
    }
}

#[test]
fn test_reset_between_renders() {
    let input = generate_sine_gain(4800, 1000.0, 0.5);
    // Tilted EQ so drifted content weights change the output
    let mut eq = EqSettings { enabled: true, ..EqSettings::default() };
    eq.low.gain_db = 6.0;
    eq.high.gain_db = -6.0;
    let mut chain = EffectsChain::new(all_enabled().with_eq(eq), SAMPLE_RATE);

    let first = run(&mut chain, &input);
    let dirty = run(&mut chain, &input);
    chain.reset();
    let second = run(&mut chain, &input);

    assert_eq!(first, second);
    assert_ne!(first, dirty);
}

#[test]
fn test_chains_are_independent() {
    let loud = generate_sine_gain(4800, 1000.0, 1.0);
    let quiet = generate_sine_gain(4800, 1000.0, 0.01);

    let mut reference = EffectsChain::new(all_enabled(), SAMPLE_RATE);
    let expected = run(&mut reference, &quiet);

    let mut a = EffectsChain::new(all_enabled(), SAMPLE_RATE);
    let mut b = EffectsChain::new(all_enabled(), SAMPLE_RATE);
    run(&mut a, &loud);
    let actual = run(&mut b, &quiet);

    assert_eq!(actual, expected);
}
