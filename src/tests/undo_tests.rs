use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::position::{Action, Simulation, Team, UnitKind};
use crate::tests::{place, plain_simulation};
use crate::tune::play_match::MatchSetup;

fn undo_property(mut sim: Simulation, team: Team, rng: &mut SmallRng) {
    let mut history = vec![];
    for _ in 0..40 {
        if sim.is_turn_over(team) || sim.is_game_over() {
            break;
        }
        let actions = sim.legal_actions(team);
        let Some(action) = actions.choose(rng) else {
            break;
        };
        let before = sim.clone();
        let patch = sim
            .do_action(*action)
            .unwrap_or_else(|| panic!("Legal action {} failed on\n{}", action, before));
        history.push((before, patch));
    }
    while let Some((before, patch)) = history.pop() {
        sim.undo(patch);
        assert_eq!(sim, before);
    }
}

#[test]
fn undo_restores_random_turns() {
    let mut rng = SmallRng::seed_from_u64(42);
    for seed in 0..20 {
        let sim = MatchSetup::default().with_seed(seed).build();
        for team in Team::BOTH {
            undo_property(sim.clone(), team, &mut rng);
        }
    }
}

#[test]
fn undo_restores_crowded_skirmish() {
    let mut rng = SmallRng::seed_from_u64(1);
    for _ in 0..20 {
        let mut sim = plain_simulation(4, 4);
        for x in 0..4 {
            place(&mut sim, UnitKind::Swordsman, Team::One, x, 1);
            place(&mut sim, UnitKind::Archer, Team::Two, x, 2);
        }
        for unit in sim.units().to_vec() {
            sim.set_health(unit.id, 4);
        }
        undo_property(sim, Team::One, &mut rng);
    }
}

#[test]
fn undo_revives_killed_defender() {
    let mut sim = plain_simulation(4, 4);
    let attacker = place(&mut sim, UnitKind::Swordsman, Team::One, 1, 1);
    place(&mut sim, UnitKind::Archer, Team::Two, 3, 3);
    let defender = place(&mut sim, UnitKind::Swordsman, Team::Two, 2, 1);
    place(&mut sim, UnitKind::Spearman, Team::One, 0, 0);
    sim.set_health(defender, 5);
    let before = sim.clone();

    let patch = sim
        .do_action(Action::Attack {
            unit: attacker,
            target: defender,
        })
        .unwrap();
    assert_eq!(patch.casualties(), 1);
    assert_eq!(sim.units().len(), 3);
    assert!(sim.unit(defender).is_none());

    sim.undo(patch);
    assert_eq!(sim.units().len(), 4);
    assert_eq!(sim, before);
}

#[test]
fn undo_revives_attacker_killed_by_retaliation() {
    let mut sim = plain_simulation(4, 4);
    let defender = place(&mut sim, UnitKind::Spearman, Team::Two, 1, 2);
    let attacker = place(&mut sim, UnitKind::Horseman, Team::One, 1, 1);
    sim.set_health(attacker, 3);
    let before = sim.clone();

    let patch = sim
        .do_action(Action::Attack {
            unit: attacker,
            target: defender,
        })
        .unwrap();
    assert_eq!(patch.casualties(), 1);
    assert!(sim.is_game_over());

    sim.undo(patch);
    assert_eq!(sim, before);
}

#[test]
fn illegal_action_produces_no_patch() {
    let mut sim = plain_simulation(4, 4);
    let swordsman = place(&mut sim, UnitKind::Swordsman, Team::One, 0, 0);
    let archer = place(&mut sim, UnitKind::Archer, Team::Two, 3, 3);
    let before = sim.clone();

    assert!(sim
        .do_action(Action::Attack {
            unit: swordsman,
            target: archer
        })
        .is_none());
    assert_eq!(sim, before);
}
