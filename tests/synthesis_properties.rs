//! Property tests for wave function collapse terrain synthesis.

use proptest::prelude::*;
use tactica::{
    generation::utils, Generator, SynthesisConfig, TacticaError, TerrainType, WfcSynthesizer,
};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_output_blocks_come_from_sample(
        seed in any::<u64>(),
        width in 2usize..12,
        height in 2usize..12,
    ) {
        let synthesizer = WfcSynthesizer::new();
        let config = SynthesisConfig::new(seed).with_output_size(width, height);

        match synthesizer.generate(&config, &mut utils::create_rng(&config)) {
            Ok(terrain) => {
                prop_assert_eq!(terrain.width(), width);
                prop_assert_eq!(terrain.height(), height);
                prop_assert!(synthesizer.validate(&terrain, &config).is_ok());
            }
            Err(TacticaError::GenerationContradiction { x, y }) => {
                prop_assert!(x < width - 1 && y < height - 1);
            }
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }

    #[test]
    fn prop_uniform_sample_gives_uniform_output(
        seed in any::<u64>(),
        code in 0u8..3,
        width in 2usize..10,
        height in 2usize..10,
    ) {
        let synthesizer = WfcSynthesizer::from_codes(&vec![vec![code; 3]; 2]).unwrap();
        let config = SynthesisConfig::new(seed).with_output_size(width, height);
        let terrain = synthesizer.generate(&config, &mut utils::create_rng(&config)).unwrap();

        prop_assert!(terrain.is_uniform());
        prop_assert_eq!(terrain.get(width - 1, height - 1), TerrainType::from_code(code));
    }

    #[test]
    fn prop_unknown_codes_rejected(code in 3u8..=u8::MAX) {
        prop_assert!(matches!(
            WfcSynthesizer::from_codes(&[vec![0, code], vec![0, 0]]),
            Err(TacticaError::InvalidSeed(_))
        ));
    }
}

#[test]
fn test_retries_are_opt_in() {
    let synthesizer = WfcSynthesizer::from_codes(&[vec![0, 1], vec![0, 1]]).unwrap();
    let config = SynthesisConfig::new(4)
        .with_output_size(5, 2)
        .with_max_attempts(3);

    // A sample that can never tile wider than itself fails on every attempt
    assert!(matches!(
        synthesizer.generate(&config, &mut utils::create_rng(&config)),
        Err(TacticaError::GenerationContradiction { .. })
    ));
}

#[test]
fn test_retry_recovers_from_contradiction() {
    // Diagonal bands: roughly one random stream in four runs into a contradiction
    let synthesizer = WfcSynthesizer::from_codes(&[
        vec![0, 0, 1, 0],
        vec![0, 1, 1, 0],
        vec![1, 1, 0, 0],
        vec![0, 0, 0, 1],
    ])
    .unwrap();

    let recovered = (0..200u64).find_map(|seed| {
        let single = SynthesisConfig::for_testing(seed);
        let first = synthesizer.generate(&single, &mut utils::create_rng(&single));
        if !matches!(first, Err(TacticaError::GenerationContradiction { .. })) {
            return None;
        }
        let retried = single.with_max_attempts(20);
        synthesizer
            .generate(&retried, &mut utils::create_rng(&retried))
            .ok()
            .map(|terrain| (retried, terrain))
    });

    let (config, terrain) = recovered.expect("no seed needed a retry to succeed");
    assert_eq!((terrain.width(), terrain.height()), (6, 6));
    synthesizer.validate(&terrain, &config).unwrap();

    // The retry streams derive from the seed, so the recovery is reproducible
    let again = synthesizer
        .generate(&config, &mut utils::create_rng(&config))
        .unwrap();
    assert_eq!(again, terrain);
}
