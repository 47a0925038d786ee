use std::sync::Arc;

use crate::evaluation::{Evaluator, MaterialEvaluator};
use crate::planner::{DfsPlanner, Planner};
use crate::position::{Action, Sequence, Simulation, Team, UnitKind};
use crate::search::{Agent, AgentError, MinimaxAgent, MinimaxSettings};
use crate::tests::{finishing_blow_simulation, place, plain_simulation};
use crate::tune::play_match::MatchSetup;

fn settings() -> MinimaxSettings {
    MinimaxSettings::default()
        .add_planner(Planner::Dfs(DfsPlanner::new(30, 6)))
        .add_depth(2)
        .add_child_limit(3)
}

#[test]
fn alpha_beta_agrees_with_plain_minimax() {
    let mut sim = plain_simulation(3, 3);
    place(&mut sim, UnitKind::Swordsman, Team::One, 0, 0);
    place(&mut sim, UnitKind::Swordsman, Team::Two, 2, 2);

    for seed in 0..5 {
        let mut pruning = MinimaxAgent::new(settings(), seed)
            .with_evaluator(Arc::new(MaterialEvaluator::default()));
        let mut plain = MinimaxAgent::new(settings().add_alpha_beta(false), seed)
            .with_evaluator(Arc::new(MaterialEvaluator::default()));

        let pruned_result = pruning.search(&sim, Team::One).unwrap();
        let plain_result = plain.search(&sim, Team::One).unwrap();
        assert!(pruned_result.is_some());
        assert_eq!(pruned_result, plain_result);
    }
}

/// Every complete turn of `team`, found by applying and undoing each legal action
fn all_turns(sim: &mut Simulation, team: Team, current: &mut Sequence, turns: &mut Vec<Sequence>) {
    if sim.is_turn_over(team) || sim.is_game_over() {
        turns.push(current.clone());
        return;
    }
    let actions = sim.legal_actions(team);
    if actions.is_empty() {
        turns.push(current.clone());
        return;
    }
    for action in actions {
        let patch = sim.do_action(action).unwrap();
        current.push(action);
        all_turns(sim, team, current, turns);
        current.pop();
        sim.undo(patch);
    }
}

fn exhaustive_turns(sim: &Simulation, team: Team) -> Vec<Sequence> {
    let mut scratch = sim.clone();
    let mut turns = vec![];
    all_turns(&mut scratch, team, &mut vec![], &mut turns);
    assert_eq!(&scratch, sim);
    turns
}

/// Value of the reply `team`'s opponent chooses after `team` plays `sequence`
fn exhaustive_reply_value(
    sim: &Simulation,
    team: Team,
    sequence: &[Action],
    evaluator: &dyn Evaluator,
) -> f32 {
    let mut after_turn = sim.clone();
    assert_eq!(after_turn.apply_sequence(sequence), sequence);
    if after_turn.is_game_over() {
        return evaluator.score(&after_turn.snapshot(), team);
    }
    after_turn.turn_begin_reset(!team);
    exhaustive_turns(&after_turn, !team)
        .iter()
        .map(|reply| {
            let mut after_reply = after_turn.clone();
            after_reply.apply_sequence(reply);
            evaluator.score(&after_reply.snapshot(), team)
        })
        .fold(f32::INFINITY, f32::min)
}

#[test]
fn exhaustive_settings_match_two_ply_search() {
    let mut sim = plain_simulation(3, 3);
    place(&mut sim, UnitKind::Swordsman, Team::One, 0, 0);
    place(&mut sim, UnitKind::Swordsman, Team::Two, 2, 2);
    let evaluator = MaterialEvaluator::default();

    let root_turns = exhaustive_turns(&sim, Team::One);
    assert!(root_turns.len() > 1);
    let expected = root_turns
        .iter()
        .map(|sequence| exhaustive_reply_value(&sim, Team::One, sequence, &evaluator))
        .fold(f32::NEG_INFINITY, f32::max);

    for alpha_beta in [true, false] {
        let settings = MinimaxSettings::default()
            .add_planner(Planner::Dfs(DfsPlanner::new(usize::MAX, usize::MAX)))
            .add_depth(2)
            .add_child_limit(usize::MAX)
            .add_alpha_beta(alpha_beta);
        let mut agent = MinimaxAgent::new(settings, 0).with_evaluator(Arc::new(evaluator));

        let (sequence, value) = agent.search(&sim, Team::One).unwrap().unwrap();
        assert!((value - expected).abs() < 1e-5, "{} != {}", value, expected);
        let chosen = exhaustive_reply_value(&sim, Team::One, &sequence, &evaluator);
        assert!((chosen - expected).abs() < 1e-5, "{:?} is worth {}", sequence, chosen);
    }
}

#[test]
fn alpha_beta_agrees_on_real_positions() {
    for seed in 0..3 {
        let sim = MatchSetup::default().with_seed(seed).build();
        let mut pruning = MinimaxAgent::new(settings(), seed)
            .with_evaluator(Arc::new(MaterialEvaluator::default()));
        let mut plain = MinimaxAgent::new(settings().add_alpha_beta(false), seed)
            .with_evaluator(Arc::new(MaterialEvaluator::default()));
        assert_eq!(
            pruning.search(&sim, Team::Two).unwrap(),
            plain.search(&sim, Team::Two).unwrap()
        );
    }
}

#[test]
fn minimax_plays_finishing_blow() {
    let (mut sim, archer, swordsman) = finishing_blow_simulation();
    let settings = MinimaxSettings::default()
        .add_planner(Planner::Dfs(DfsPlanner::new(10_000, 64)))
        .add_child_limit(4);
    let mut agent =
        MinimaxAgent::new(settings, 0).with_evaluator(Arc::new(MaterialEvaluator::default()));

    let played = agent.play_turn(&mut sim, Team::One).unwrap();
    assert!(played.contains(&Action::Attack {
        unit: archer,
        target: swordsman
    }));
    assert!(sim.is_game_over());
}

#[test]
fn search_does_not_modify_position() {
    let sim = MatchSetup::default().with_seed(9).build();
    let before = sim.clone();
    let mut agent =
        MinimaxAgent::new(settings(), 0).with_evaluator(Arc::new(MaterialEvaluator::default()));
    agent.search(&sim, Team::One).unwrap();
    assert_eq!(sim, before);
}

#[test]
fn refuses_to_play_without_evaluator() {
    let mut sim = MatchSetup::default().build();
    let mut agent = MinimaxAgent::new(settings(), 0);
    assert_eq!(
        agent.play_turn(&mut sim, Team::Two),
        Err(AgentError::NoEvaluator("Minimax"))
    );
}
