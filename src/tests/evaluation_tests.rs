use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::evaluation::features::{encode_state, NUM_FEATURES};
use crate::evaluation::network::NetworkError;
use crate::evaluation::{Evaluator, MaterialEvaluator, Network};
use crate::position::{Team, UnitKind};
use crate::tests::{place, plain_simulation};
use crate::tune::play_match::MatchSetup;

#[test]
fn features_are_finite_and_team_dependent() {
    for seed in 0..10 {
        let sim = MatchSetup::default().with_seed(seed).build();
        let one = encode_state(&sim.snapshot(), Team::One);
        let two = encode_state(&sim.snapshot(), Team::Two);
        assert_eq!(one.len(), NUM_FEATURES);
        assert!(one.iter().chain(two.iter()).all(|value| value.is_finite()));
        assert_eq!(one[0], 1.0);
        assert_eq!(two[0], 2.0);
        assert_eq!(one[1], two[2]);
    }
}

#[test]
fn features_of_lone_team() {
    let mut sim = plain_simulation(5, 5);
    place(&mut sim, UnitKind::Horseman, Team::One, 2, 2);
    let features = encode_state(&sim.snapshot(), Team::One);
    assert!(features.iter().all(|value| value.is_finite()));
    assert_eq!(features[1], 1.0);
    assert_eq!(features[2], 0.0);
}

#[test]
fn material_prefers_damaged_enemies() {
    let mut sim = plain_simulation(5, 5);
    place(&mut sim, UnitKind::Swordsman, Team::One, 0, 0);
    let enemy = place(&mut sim, UnitKind::Swordsman, Team::Two, 4, 4);
    let evaluator = MaterialEvaluator::default();
    let even = evaluator.score(&sim.snapshot(), Team::One);

    sim.set_health(enemy, 50);
    let ahead = evaluator.score(&sim.snapshot(), Team::One);
    assert!(ahead > even);
    assert!(evaluator.score(&sim.snapshot(), Team::Two) < ahead);
}

#[test]
fn network_output_is_bounded() {
    let mut rng = StdRng::seed_from_u64(0);
    let network = Network::for_features(&[16, 8], &mut rng);
    assert_eq!(network.num_inputs(), NUM_FEATURES);
    assert_eq!(network.num_outputs(), 1);
    assert_eq!(
        network.num_parameters(),
        NUM_FEATURES * 16 + 16 + 16 * 8 + 8 + 8 + 1
    );

    let sim = MatchSetup::default().build();
    let score = network.score(&sim.snapshot(), Team::One);
    assert!((-1.0..=1.0).contains(&score));
}

#[test]
fn network_blob_restores_same_evaluation() {
    let mut rng = StdRng::seed_from_u64(1);
    let network = Network::for_features(&[8], &mut rng);
    let restored = Network::from_bytes(&network.to_bytes().unwrap()).unwrap();
    assert_eq!(restored, network);

    let sim = MatchSetup::default().with_seed(4).build();
    assert_eq!(
        restored.score(&sim.snapshot(), Team::Two),
        network.score(&sim.snapshot(), Team::Two)
    );
}

#[test]
fn malformed_blobs_are_rejected() {
    assert!(matches!(
        Network::from_bytes(b"not a network"),
        Err(NetworkError::Malformed(_))
    ));
    assert!(matches!(
        Network::from_bytes(br#"{"layers":[]}"#),
        Err(NetworkError::Empty(0))
    ));
    let truncated = br#"{"layers":[{"inputs":2,"outputs":1,"weights":[0.5],"biases":[0.0]}]}"#;
    assert!(matches!(
        Network::from_bytes(truncated),
        Err(NetworkError::Shape { layer: 0, .. })
    ));
    let mismatched = br#"{"layers":[
        {"inputs":1,"outputs":2,"weights":[0.5,0.5],"biases":[0.0,0.0]},
        {"inputs":3,"outputs":1,"weights":[0.5,0.5,0.5],"biases":[0.0]}]}"#;
    assert!(matches!(
        Network::from_bytes(mismatched),
        Err(NetworkError::Mismatch { layer: 1, .. })
    ));
}

#[test]
fn mutation_rate_controls_changes() {
    let mut rng = StdRng::seed_from_u64(2);
    let network = Network::for_features(&[8], &mut rng);

    let mut unchanged = network.clone();
    unchanged.mutate(0.5, 0.0, &mut rng);
    assert_eq!(unchanged, network);

    let mut changed = network.clone();
    changed.mutate(0.5, 1.0, &mut rng);
    assert_ne!(changed, network);
    assert!(Network::from_bytes(&changed.to_bytes().unwrap()).is_ok());
}

#[test]
fn invalid_mutation_settings_leave_network_unchanged() {
    let mut rng = StdRng::seed_from_u64(4);
    let network = Network::for_features(&[8], &mut rng);

    let mut mutated = network.clone();
    mutated.mutate(0.5, f64::NAN, &mut rng);
    mutated.mutate(-1.0, 1.0, &mut rng);
    mutated.mutate(f32::NAN, 1.0, &mut rng);
    assert_eq!(mutated, network);
}
