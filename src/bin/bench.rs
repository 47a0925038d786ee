use std::fs;
use std::io::BufWriter;
use std::sync::Arc;

use clap::{Arg, Command};
use log::info;

use skirmish::cli::{self, DynError};
use skirmish::evaluation::{Evaluator, MaterialEvaluator, Network};
use skirmish::tune::benchmark::{round_robin, summarize, write_csv, BenchmarkOptions};
use skirmish::tune::presets::{default_presets, load_presets};

pub fn main() -> Result<(), DynError> {
    let app = Command::new("Skirmish benchmark")
        .version("0.1")
        .about("Plays a round-robin tournament between agent presets")
        .arg(
            Arg::new("gamesPerPair")
                .short('g')
                .long("games-per-pair")
                .env("GAMES_PER_PAIR")
                .help("Games played for each ordered pair of presets")
                .num_args(1)
                .default_value("2")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("workers")
                .short('w')
                .long("workers")
                .env("WORKERS")
                .help("Number of games played in parallel")
                .num_args(1)
                .default_value("4")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("presets")
                .long("presets")
                .env("PRESETS")
                .help("JSON file of agent presets, replacing the built-in ones")
                .num_args(1),
        )
        .arg(
            Arg::new("only")
                .long("only")
                .env("ONLY")
                .help("Comma-separated names of the presets to include")
                .num_args(1),
        )
        .arg(
            Arg::new("genome")
                .long("genome")
                .env("GENOME")
                .help("Trained network shared by all agents. Without it, a scripted evaluation is used")
                .num_args(1),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .env("OUTPUT")
                .help("CSV file to write one row per game to")
                .num_args(1)
                .default_value("benchmark_results.csv"),
        );
    let matches = cli::with_match_args(app).get_matches();
    cli::setup_logging(&matches, log::LevelFilter::Warn)?;

    let setup = cli::match_setup(&matches)?;
    let mut presets = match matches.get_one::<String>("presets") {
        Some(path) => load_presets(path)?,
        None => default_presets(),
    };
    if let Some(only) = matches.get_one::<String>("only") {
        let names: Vec<&str> = only.split(',').map(str::trim).collect();
        presets.retain(|preset| names.contains(&preset.name.as_str()));
    }
    if presets.len() < 2 {
        return Err("At least two presets are needed for a benchmark".into());
    }

    let evaluator: Arc<dyn Evaluator> = match matches.get_one::<String>("genome") {
        Some(path) => Arc::new(Network::load(path)?),
        None => Arc::new(MaterialEvaluator::default()),
    };
    let options = BenchmarkOptions {
        games_per_pair: *matches.get_one::<u64>("gamesPerPair").unwrap_or(&2) as usize,
        workers: *matches.get_one::<u64>("workers").unwrap_or(&4) as usize,
        seed: setup.seed,
        setup,
    };

    let rows = round_robin(&presets, evaluator, &options)?;
    let output = matches
        .get_one::<String>("output")
        .map(String::as_str)
        .unwrap_or("benchmark_results.csv");
    write_csv(&rows, BufWriter::new(fs::File::create(output)?))?;
    info!("Wrote {} games to {}", rows.len(), output);

    println!("{:<20} {:>6} {:>6} {:>6} {:>6} {:>9}", "agent", "games", "wins", "draws", "losses", "win rate");
    for (name, summary) in summarize(&rows) {
        println!(
            "{:<20} {:>6} {:>6} {:>6} {:>6} {:>8.1}%",
            name,
            summary.games,
            summary.wins,
            summary.draws,
            summary.losses,
            summary.win_rate() * 100.0
        );
    }
    Ok(())
}
