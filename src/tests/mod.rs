#[cfg(test)]
mod benchmark_tests;
#[cfg(test)]
mod evaluation_tests;
#[cfg(test)]
mod mcts_tests;
#[cfg(test)]
mod minmax_tests;
#[cfg(test)]
mod planner_tests;
#[cfg(test)]
mod undo_tests;

#[cfg(test)]
use crate::position::{Board, Simulation, Team, UnitId, UnitKind};

#[cfg(test)]
fn plain_simulation(width: usize, height: usize) -> Simulation {
    Simulation::new(Board::new(width, height))
}

#[cfg(test)]
fn place(sim: &mut Simulation, kind: UnitKind, team: Team, x: i32, y: i32) -> UnitId {
    sim.add_unit(kind, team, x, y)
        .unwrap_or_else(|| panic!("Could not place {} at ({}, {})\n{}", kind, x, y, sim))
}

/// A 3x3 board with a team one archer in one corner, and an almost dead team two swordsman in the other
#[cfg(test)]
fn finishing_blow_simulation() -> (Simulation, UnitId, UnitId) {
    let mut sim = plain_simulation(3, 3);
    let archer = place(&mut sim, UnitKind::Archer, Team::One, 0, 0);
    let swordsman = place(&mut sim, UnitKind::Swordsman, Team::Two, 2, 2);
    sim.set_health(swordsman, 5);
    (sim, archer, swordsman)
}
