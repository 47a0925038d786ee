//! Fixed-length feature vector describing a snapshot from one team's point of view.

use crate::position::unit::{UnitKind, ALL_KINDS, MOVE_POINT_SCALE};
use crate::position::{Snapshot, Team, Unit};

pub const NUM_FEATURES: usize = 38;

const DENSITY_RADIUS: f32 = 3.0;
const MAX_TERRAIN_COST: f32 = 2.0;

fn mean(values: impl Iterator<Item = f32>) -> f32 {
    let (sum, count) = values.fold((0.0, 0), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f32
    }
}

fn ratio(a: f32, b: f32) -> f32 {
    if b > 0.0 {
        a / b
    } else {
        0.0
    }
}

fn distance(a: &Unit, b: &Unit) -> f32 {
    ((a.x - b.x) as f32).hypot((a.y - b.y) as f32)
}

pub fn encode_state(snapshot: &Snapshot, team: Team) -> [f32; NUM_FEATURES] {
    let ally_units: Vec<&Unit> = snapshot.allies(team).collect();
    let enemy_units: Vec<&Unit> = snapshot.enemies(team).collect();
    let allies = &ally_units[..];
    let enemies = &enemy_units[..];
    let max_dim = snapshot.board.width().max(snapshot.board.height()) as f32;

    let health_pct = |group: &[&Unit]| {
        ratio(
            group.iter().map(|unit| unit.health as f32).sum(),
            group.iter().map(|unit| unit.max_health as f32).sum(),
        )
    };
    let ally_health_pct = health_pct(allies);
    let enemy_health_pct = health_pct(enemies);

    let composition = |group: &[&Unit], kind: UnitKind| {
        ratio(
            group.iter().filter(|unit| unit.kind == kind).count() as f32,
            group.len() as f32,
        )
    };

    let move_points = |group: &[&Unit]| {
        mean(
            group
                .iter()
                .map(|unit| unit.move_points as f32 / MOVE_POINT_SCALE as f32),
        ) / 10.0
    };
    let can_attack = |group: &[&Unit]| {
        mean(
            group
                .iter()
                .map(|unit| if unit.has_attacked { 0.0 } else { 1.0 }),
        )
    };

    let closest_enemy = closest_enemy_info(allies, enemies, max_dim);

    let density = |group: &[&Unit]| {
        mean(allies.iter().map(|ally| {
            group
                .iter()
                .filter(|other| other.id != ally.id && distance(ally, other) <= DENSITY_RADIUS)
                .count() as f32
        })) / 10.0
    };

    let local_move_cost = |group: &[&Unit]| {
        let mut costs = vec![];
        for unit in group {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    if let Some(cost) = snapshot
                        .board
                        .get(unit.x + dx, unit.y + dy)
                        .and_then(|terrain| terrain.move_cost())
                    {
                        costs.push(cost as f32 / MOVE_POINT_SCALE as f32);
                    }
                }
            }
        }
        mean(costs.into_iter()) / MAX_TERRAIN_COST
    };
    let defense_bonus = |group: &[&Unit]| {
        mean(
            group
                .iter()
                .map(|unit| snapshot.board.terrain(unit.x, unit.y).defense_bonus() as f32),
        )
    };

    let center = |group: &[&Unit]| {
        (
            mean(group.iter().map(|unit| unit.x as f32)) / max_dim,
            mean(group.iter().map(|unit| unit.y as f32)) / max_dim,
        )
    };
    let (ally_cx, ally_cy) = center(allies);
    let (enemy_cx, enemy_cy) = center(enemies);
    let dispersion = |group: &[&Unit], cx: f32, cy: f32| {
        mean(
            group
                .iter()
                .map(|unit| (unit.x as f32 / max_dim - cx).hypot(unit.y as f32 / max_dim - cy)),
        )
    };

    let best_attack = best_attack_opportunity(allies, enemies, max_dim);

    let mut features = [0.0; NUM_FEATURES];
    let values = [
        team.id() as f32,
        ally_health_pct,
        enemy_health_pct,
        ally_health_pct - enemy_health_pct,
    ]
    .into_iter()
    .chain(ALL_KINDS.iter().map(|kind| composition(allies, *kind)))
    .chain(ALL_KINDS.iter().map(|kind| composition(enemies, *kind)))
    .chain([
        move_points(allies),
        move_points(enemies),
        can_attack(allies),
        can_attack(enemies),
    ])
    .chain(closest_enemy)
    .chain([
        density(allies),
        density(enemies),
        local_move_cost(allies),
        local_move_cost(enemies),
        defense_bonus(allies),
        defense_bonus(enemies),
        ally_cx,
        ally_cy,
        enemy_cx,
        enemy_cy,
        (ally_cx - enemy_cx).hypot(ally_cy - enemy_cy),
        dispersion(allies, ally_cx, ally_cy),
        dispersion(enemies, enemy_cx, enemy_cy),
    ])
    .chain(best_attack);
    for (feature, value) in features.iter_mut().zip(values) {
        *feature = value;
    }
    features
}

/// Averaged over allies: distance to the closest enemy, its health and armor,
/// whether it is in range, and whether any enemy threatens the ally.
fn closest_enemy_info(allies: &[&Unit], enemies: &[&Unit], max_dim: f32) -> [f32; 5] {
    if allies.is_empty() {
        return [0.0; 5];
    }
    let mut sums = [0.0; 5];
    for ally in allies {
        let info = match enemies
            .iter()
            .min_by(|a, b| distance(ally, a).total_cmp(&distance(ally, b)))
        {
            None => [1.0, 0.0, 0.0, 0.0, 0.0],
            Some(closest) => {
                let d = distance(ally, closest);
                let threatened = enemies
                    .iter()
                    .any(|enemy| distance(ally, enemy) <= enemy.attack_range as f32);
                [
                    d / max_dim,
                    ratio(closest.health as f32, closest.max_health as f32),
                    closest.armor as f32 / 100.0,
                    if d <= ally.attack_range as f32 { 1.0 } else { 0.0 },
                    if threatened { 1.0 } else { 0.0 },
                ]
            }
        };
        for (sum, value) in sums.iter_mut().zip(info) {
            *sum += value;
        }
    }
    sums.map(|sum| sum / allies.len() as f32)
}

/// Rough damage estimate of the strongest available attack, the target's health and distance,
/// and whether it would kill.
fn best_attack_opportunity(allies: &[&Unit], enemies: &[&Unit], max_dim: f32) -> [f32; 4] {
    let mut best_damage = 0.0;
    let mut best_target_health = 0.0;
    let mut best_target_distance = max_dim;
    let mut can_kill = 0.0;
    for ally in allies {
        for enemy in enemies {
            let estimate = ally.attack_power as f32 - enemy.armor as f32 * 0.3;
            if estimate > best_damage {
                best_damage = estimate;
                best_target_health = enemy.health as f32;
                best_target_distance = distance(ally, enemy);
                can_kill = if estimate >= enemy.health as f32 { 1.0 } else { 0.0 };
            }
        }
    }
    [
        best_damage / 100.0,
        best_target_health / 150.0,
        ratio(best_target_distance, max_dim),
        can_kill,
    ]
}
