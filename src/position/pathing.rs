//! Uniform-cost search over the 8-neighbourhood of a tile.
//!
//! Entering a tile costs that tile's terrain cost, scaled by √2 on diagonal steps.
//! Mountains and tiles holding any unit are never entered, with the exception of an explicit target tile.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::f64::consts::SQRT_2;

use crate::position::terrain::Board;
use crate::position::unit::MovePoints;
use crate::position::Simulation;

pub const DIRECTIONS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

pub fn step_cost(board: &Board, x: i32, y: i32, diagonal: bool) -> Option<MovePoints> {
    let cost = board.get(x, y)?.move_cost()?;
    if diagonal {
        Some((cost as f64 * SQRT_2).round() as MovePoints)
    } else {
        Some(cost)
    }
}

/// All empty tiles reachable from `from` within `budget`, together with their cheapest cost.
/// The starting tile itself is not included.
pub fn reachable_tiles(
    sim: &Simulation,
    from: (i32, i32),
    budget: MovePoints,
) -> Vec<(i32, i32, MovePoints)> {
    let board = sim.board();
    let costs = cheapest_costs(sim, from, budget, None);
    costs
        .iter()
        .enumerate()
        .filter(|(_, cost)| **cost != MovePoints::MAX)
        .map(|(i, cost)| {
            (
                (i % board.width()) as i32,
                (i / board.width()) as i32,
                *cost,
            )
        })
        .filter(|(x, y, _)| (*x, *y) != from)
        .collect()
}

/// Cheapest cost of walking from `from` to `to`, or `None` if no path exists.
pub fn path_cost(sim: &Simulation, from: (i32, i32), to: (i32, i32)) -> Option<MovePoints> {
    let board = sim.board();
    if !board.in_bounds(to.0, to.1) {
        return None;
    }
    let costs = cheapest_costs(sim, from, MovePoints::MAX, Some(to));
    let cost = costs[board.index(to.0, to.1)];
    if cost == MovePoints::MAX {
        None
    } else {
        Some(cost)
    }
}

fn cheapest_costs(
    sim: &Simulation,
    from: (i32, i32),
    budget: MovePoints,
    target: Option<(i32, i32)>,
) -> Vec<MovePoints> {
    let board = sim.board();
    let mut occupied = vec![false; board.width() * board.height()];
    for unit in sim.units() {
        occupied[board.index(unit.x, unit.y)] = true;
    }

    let mut costs = vec![MovePoints::MAX; board.width() * board.height()];
    let mut queue = BinaryHeap::new();
    costs[board.index(from.0, from.1)] = 0;
    queue.push(Reverse((0, from.0, from.1)));

    while let Some(Reverse((cost, x, y))) = queue.pop() {
        if cost > costs[board.index(x, y)] {
            continue;
        }
        if Some((x, y)) == target {
            break;
        }
        for (dx, dy) in DIRECTIONS {
            let (nx, ny) = (x + dx, y + dy);
            let Some(step) = step_cost(board, nx, ny, dx != 0 && dy != 0) else {
                continue;
            };
            let index = board.index(nx, ny);
            if occupied[index] && Some((nx, ny)) != target {
                continue;
            }
            let next_cost = cost.saturating_add(step);
            if next_cost <= budget && next_cost < costs[index] {
                costs[index] = next_cost;
                queue.push(Reverse((next_cost, nx, ny)));
            }
        }
    }
    costs
}
