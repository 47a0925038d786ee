use crate::evaluation::Evaluator;
use crate::position::{Snapshot, Team, Unit};

/// Scripted evaluation: health balance and unit counts, with a small bonus for closing in on the enemy.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct MaterialEvaluator {
    pub unit_weight: f32,
    pub proximity_weight: f32,
}

impl Default for MaterialEvaluator {
    fn default() -> Self {
        MaterialEvaluator {
            unit_weight: 0.1,
            proximity_weight: 0.01,
        }
    }
}

fn health_totals<'a>(units: impl Iterator<Item = &'a Unit>) -> (i32, i32, usize) {
    units.fold((0, 0, 0), |(health, max, count), unit| {
        (health + unit.health, max + unit.max_health, count + 1)
    })
}

impl Evaluator for MaterialEvaluator {
    fn score(&self, snapshot: &Snapshot, team: Team) -> f32 {
        let (own_health, own_max, own_count) = health_totals(snapshot.allies(team));
        let (enemy_health, enemy_max, enemy_count) = health_totals(snapshot.enemies(team));
        let health_balance = (own_health - enemy_health) as f32 / (own_max + enemy_max).max(1) as f32;

        let mut closest_distances = 0;
        for ally in snapshot.allies(team) {
            if let Some(distance) = snapshot
                .enemies(team)
                .map(|enemy| ally.distance_to(enemy))
                .min()
            {
                closest_distances += distance;
            }
        }

        health_balance + self.unit_weight * (own_count as f32 - enemy_count as f32)
            - self.proximity_weight * closest_distances as f32 / own_count.max(1) as f32
    }
}
