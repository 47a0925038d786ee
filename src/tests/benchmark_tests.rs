use std::sync::Arc;

use crate::evaluation::MaterialEvaluator;
use crate::planner::{DfsPlanner, Planner};
use crate::position::Team;
use crate::search::{AgentConfig, MinimaxSettings};
use crate::tune::benchmark::{round_robin, summarize, write_csv, BenchmarkOptions, BenchmarkRow, CSV_HEADER};
use crate::tune::play_match::{MatchRecord, MatchSetup, TeamStats};
use crate::tune::presets::{default_presets, load_presets, save_presets, Preset};

fn cheap_presets() -> Vec<Preset> {
    let planner = Planner::Dfs(DfsPlanner::new(10, 4));
    vec![
        Preset::new("greedy", AgentConfig::Greedy(planner.clone())),
        Preset::new(
            "minimax",
            AgentConfig::Minimax(
                MinimaxSettings::default()
                    .add_planner(planner)
                    .add_depth(1)
                    .add_child_limit(1),
            ),
        ),
    ]
}

fn row(agent_a: &str, agent_b: &str, winner: Option<Team>) -> BenchmarkRow {
    let stats = TeamStats {
        initial_units: 3,
        alive: 2,
        max_health: 300,
        health: 150,
    };
    BenchmarkRow {
        agent_a: agent_a.to_string(),
        agent_b: agent_b.to_string(),
        record: MatchRecord {
            result: winner.map(crate::position::GameResult::Win),
            turns: 12,
            stats: [stats, stats],
            aborted: false,
        },
    }
}

#[test]
fn round_robin_plays_every_ordered_pair() {
    let options = BenchmarkOptions {
        games_per_pair: 2,
        setup: MatchSetup {
            max_turns: 2,
            ..MatchSetup::default()
        },
        workers: 2,
        seed: 3,
    };
    let rows = round_robin(
        &cheap_presets(),
        Arc::new(MaterialEvaluator::default()),
        &options,
    )
    .unwrap();

    assert_eq!(rows.len(), 4);
    let pairs: Vec<(&str, &str)> = rows
        .iter()
        .map(|row| (row.agent_a.as_str(), row.agent_b.as_str()))
        .collect();
    assert_eq!(
        pairs.iter().filter(|pair| **pair == ("greedy", "minimax")).count(),
        2
    );
    assert_eq!(
        pairs.iter().filter(|pair| **pair == ("minimax", "greedy")).count(),
        2
    );
    assert!(rows.iter().all(|row| !row.record.aborted && row.record.turns <= 2));

    let summary = summarize(&rows);
    assert_eq!(summary.len(), 2);
    assert!(summary.values().all(|agent| agent.games == 4));
}

#[test]
fn csv_has_one_line_per_game() {
    let rows = [
        row("MCTS_fast", "Greedy", Some(Team::One)),
        row("Greedy", "MCTS_fast", None),
    ];
    let mut out = vec![];
    write_csv(&rows, &mut out).unwrap();
    let csv = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], CSV_HEADER);
    assert_eq!(lines[1], "MCTS_fast,Greedy,MCTS_fast,12,3,3,2,2,300,300,150,150");
    assert_eq!(lines[2], "Greedy,MCTS_fast,draw,12,3,3,2,2,300,300,150,150");
    assert!(lines
        .iter()
        .all(|line| line.split(',').count() == CSV_HEADER.split(',').count()));
}

#[test]
fn summary_counts_wins_from_both_seats() {
    let rows = [
        row("a", "b", Some(Team::One)),
        row("b", "a", Some(Team::Two)),
        row("a", "b", Some(Team::Two)),
        row("b", "a", None),
    ];
    let summary = summarize(&rows);
    assert_eq!(summary["a"].games, 4);
    assert_eq!(summary["a"].wins, 2);
    assert_eq!(summary["a"].losses, 1);
    assert_eq!(summary["a"].draws, 1);
    assert_eq!(summary["a"].win_rate(), 0.5);
    assert_eq!(summary["b"].win_rate(), 0.25);
}

#[test]
fn default_presets_have_unique_names() {
    let presets = default_presets();
    assert_eq!(presets.len(), 7);
    for (i, preset) in presets.iter().enumerate() {
        assert!(presets[i + 1..].iter().all(|other| other.name != preset.name));
    }
}

#[test]
fn presets_can_be_loaded_from_file() {
    let path = std::env::temp_dir().join(format!("skirmish_presets_{}.json", std::process::id()));
    let presets = cheap_presets();
    save_presets(&presets, &path).unwrap();
    let loaded = load_presets(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(loaded, presets);
}
