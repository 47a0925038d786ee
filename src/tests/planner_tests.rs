use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::evaluation::MaterialEvaluator;
use crate::planner::{rank_sequences, BeamPlanner, DfsPlanner, Planner};
use crate::position::{Action, Simulation, Team, UnitKind};
use crate::tests::{finishing_blow_simulation, place, plain_simulation};
use crate::tune::play_match::MatchSetup;

fn assert_complete_turns(sim: &Simulation, team: Team, sequences: &[Vec<Action>]) {
    for sequence in sequences {
        let mut replay = sim.clone();
        let applied = replay.apply_sequence(sequence);
        assert_eq!(&applied, sequence, "Sequence was not fully legal on\n{}", sim);
        assert!(replay.is_turn_over(team) || replay.is_game_over());
    }
}

#[test]
fn dfs_plans_complete_turns() {
    let sim = MatchSetup::default().with_seed(5).build();
    let planner = DfsPlanner::new(100, 8);
    let mut rng = SmallRng::seed_from_u64(0);
    for team in Team::BOTH {
        let sequences = planner.plan_sequences(&sim, team, &mut rng);
        assert!(!sequences.is_empty());
        assert!(sequences.len() <= 100);
        assert_complete_turns(&sim, team, &sequences);
    }
}

#[test]
fn dfs_respects_max_sets() {
    let sim = MatchSetup::default().with_seed(2).build();
    let mut rng = SmallRng::seed_from_u64(0);
    let sequences = DfsPlanner::new(5, 14).plan_sequences(&sim, Team::One, &mut rng);
    assert_eq!(sequences.len(), 5);
}

#[test]
fn dfs_without_actions_plans_empty_turn() {
    let mut sim = plain_simulation(4, 4);
    let archer = place(&mut sim, UnitKind::Archer, Team::One, 0, 0);
    place(&mut sim, UnitKind::Swordsman, Team::Two, 3, 3);
    assert!(sim.apply(Action::Wait { unit: archer }));

    let mut rng = SmallRng::seed_from_u64(0);
    let sequences = DfsPlanner::default().plan_sequences(&sim, Team::One, &mut rng);
    assert_eq!(sequences, vec![vec![]]);
}

#[test]
fn beam_plans_complete_turns() {
    let sim = MatchSetup::default().with_seed(8).build();
    let planner = BeamPlanner::new(6, 8);
    let mut rng = SmallRng::seed_from_u64(0);
    let evaluator = MaterialEvaluator::default();
    for team in Team::BOTH {
        let sequences = planner.plan_sequences(&sim, team, &evaluator, &mut rng);
        assert!(!sequences.is_empty());
        assert_complete_turns(&sim, team, &sequences);
    }
}

#[test]
fn planners_find_finishing_blow() {
    let (sim, archer, swordsman) = finishing_blow_simulation();
    let evaluator = MaterialEvaluator::default();
    let kill = Action::Attack {
        unit: archer,
        target: swordsman,
    };

    for planner in [
        Planner::Dfs(DfsPlanner::new(10_000, 64)),
        Planner::Beam(BeamPlanner::default()),
    ] {
        let mut rng = SmallRng::seed_from_u64(0);
        let sequence = planner.plan(&sim, Team::One, &evaluator, &mut rng);
        assert!(
            sequence.contains(&kill),
            "{:?} played {:?} instead of killing",
            planner,
            sequence
        );
    }
}

#[test]
fn ranking_is_stable_and_best_first() {
    let (sim, archer, swordsman) = finishing_blow_simulation();
    let evaluator = MaterialEvaluator::default();
    let sequences = vec![
        vec![Action::Wait { unit: archer }],
        vec![
            Action::Move {
                unit: archer,
                x: 1,
                y: 1,
            },
            Action::Attack {
                unit: archer,
                target: swordsman,
            },
        ],
        vec![Action::Wait { unit: archer }],
    ];
    let ranked = rank_sequences(&sim, Team::One, sequences.clone(), &evaluator);
    assert_eq!(ranked[0].0, sequences[1]);
    assert_eq!(ranked[1].1, ranked[2].1);
    assert!(ranked[0].1 > ranked[1].1);
}

#[test]
fn full_exploration_still_plays_a_candidate() {
    let sim = MatchSetup::default().with_seed(4).build();
    let planner = Planner::Dfs(DfsPlanner::new(20, 6)).with_exploration_rate(1.0);
    assert_eq!(planner.exploration_rate(), 1.0);
    let mut rng = SmallRng::seed_from_u64(0);
    let sequence = planner.plan(&sim, Team::Two, &MaterialEvaluator::default(), &mut rng);
    let mut replay = sim.clone();
    assert_eq!(replay.apply_sequence(&sequence), sequence);
}
