use std::sync::Arc;
use std::time::Duration;

use crate::evaluation::MaterialEvaluator;
use crate::planner::{DfsPlanner, Planner};
use crate::position::{Action, Team};
use crate::search::mcts::best_arm;
use crate::search::{Agent, AgentError, MctsAgent, MctsSettings, RootArm};
use crate::tests::finishing_blow_simulation;
use crate::tune::play_match::MatchSetup;

fn small_settings() -> MctsSettings {
    MctsSettings::default()
        .add_planner(Planner::Dfs(DfsPlanner::new(40, 8)))
        .add_root_children(5)
        .add_iterations(30)
        .add_rollout_turns(1)
}

#[test]
fn visits_add_up_to_iterations() {
    let sim = MatchSetup::default().with_seed(1).build();
    let mut agent =
        MctsAgent::new(small_settings(), 0).with_evaluator(Arc::new(MaterialEvaluator::default()));
    let arms = agent.search(&sim, Team::One).unwrap();

    assert!(!arms.is_empty());
    assert!(arms.len() <= 5);
    assert_eq!(arms.iter().map(|arm| arm.visits).sum::<u32>(), 30);
    assert!(arms.iter().all(|arm| arm.visits > 0));
}

#[test]
fn arms_are_ordered_by_prior() {
    let sim = MatchSetup::default().with_seed(2).build();
    let mut agent =
        MctsAgent::new(small_settings(), 0).with_evaluator(Arc::new(MaterialEvaluator::default()));
    let arms = agent.search(&sim, Team::Two).unwrap();
    for pair in arms.windows(2) {
        assert!(pair[0].prior >= pair[1].prior);
    }
}

#[test]
fn search_does_not_modify_position() {
    let sim = MatchSetup::default().with_seed(3).build();
    let before = sim.clone();
    let mut agent =
        MctsAgent::new(small_settings(), 0).with_evaluator(Arc::new(MaterialEvaluator::default()));
    agent.search(&sim, Team::One).unwrap();
    assert_eq!(sim, before);
}

#[test]
fn mcts_plays_finishing_blow() {
    let (mut sim, archer, swordsman) = finishing_blow_simulation();
    let settings = MctsSettings::default().add_planner(Planner::Dfs(DfsPlanner::new(10_000, 64)));
    let mut agent = MctsAgent::new(settings, 0).with_evaluator(Arc::new(MaterialEvaluator::default()));

    let played = agent.play_turn(&mut sim, Team::One).unwrap();
    assert!(played.contains(&Action::Attack {
        unit: archer,
        target: swordsman
    }));
    assert!(sim.is_game_over());
}

#[test]
fn time_limit_stops_search_early() {
    let sim = MatchSetup::default().with_seed(6).build();
    let settings = small_settings()
        .add_iterations(1_000_000)
        .add_time_limit(Duration::from_millis(50));
    let mut agent = MctsAgent::new(settings, 0).with_evaluator(Arc::new(MaterialEvaluator::default()));
    let arms = agent.search(&sim, Team::One).unwrap();
    let visits: u32 = arms.iter().map(|arm| arm.visits).sum();
    assert!(visits > 0 && visits < 1_000_000);
}

#[test]
fn refuses_to_play_without_evaluator() {
    let mut sim = MatchSetup::default().build();
    let before = sim.clone();
    let mut agent = MctsAgent::new(small_settings(), 0);
    assert_eq!(
        agent.play_turn(&mut sim, Team::One),
        Err(AgentError::NoEvaluator("MCTS"))
    );
    assert_eq!(sim, before);
}

#[test]
fn best_arm_prefers_visits_then_value() {
    let arm = |visits, value_sum| RootArm {
        sequence: vec![],
        prior: 0.0,
        visits,
        value_sum,
    };
    let arms = [arm(3, 0.3), arm(5, 0.5), arm(5, 2.0), arm(5, 2.0)];
    let best = best_arm(&arms).unwrap();
    assert!(std::ptr::eq(best, &arms[2]));
    assert!(best_arm(&[]).is_none());
}
