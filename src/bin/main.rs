use std::sync::Arc;

use clap::{Arg, Command};
use log::info;

use skirmish::cli::{self, DynError};
use skirmish::evaluation::{Evaluator, MaterialEvaluator, Network};
use skirmish::position::Team;
use skirmish::search::Agent;
use skirmish::tune::play_match::play_match;
use skirmish::tune::presets::{default_presets, load_presets, Preset};

fn find_preset(presets: &[Preset], name: &str) -> Result<Preset, DynError> {
    presets
        .iter()
        .find(|preset| preset.name == name)
        .cloned()
        .ok_or_else(|| {
            let names: Vec<&str> = presets.iter().map(|preset| preset.name.as_str()).collect();
            format!("Unknown preset \"{}\", expected one of {:?}", name, names).into()
        })
}

pub fn main() -> Result<(), DynError> {
    let app = Command::new("Skirmish match viewer")
        .version("0.1")
        .about("Plays a single match between two agent presets, and prints it")
        .arg(
            Arg::new("teamOne")
                .long("team-one")
                .env("TEAM_ONE")
                .help("Preset playing team one")
                .num_args(1)
                .default_value("MCTS_fast"),
        )
        .arg(
            Arg::new("teamTwo")
                .long("team-two")
                .env("TEAM_TWO")
                .help("Preset playing team two")
                .num_args(1)
                .default_value("Minimax_default"),
        )
        .arg(
            Arg::new("presets")
                .long("presets")
                .env("PRESETS")
                .help("JSON file of agent presets, replacing the built-in ones")
                .num_args(1),
        )
        .arg(
            Arg::new("genome")
                .long("genome")
                .env("GENOME")
                .help("Trained network to evaluate positions with. Without it, a scripted evaluation is used")
                .num_args(1),
        );
    let matches = cli::with_match_args(app).get_matches();
    cli::setup_logging(&matches, log::LevelFilter::Info)?;

    let setup = cli::match_setup(&matches)?;
    let presets = match matches.get_one::<String>("presets") {
        Some(path) => load_presets(path)?,
        None => default_presets(),
    };
    let evaluator: Arc<dyn Evaluator> = match matches.get_one::<String>("genome") {
        Some(path) => Arc::new(Network::load(path)?),
        None => Arc::new(MaterialEvaluator::default()),
    };

    let build_agent = |arg: &str, seed: u64| -> Result<(String, Box<dyn Agent>), DynError> {
        let name = matches.get_one::<String>(arg).map(String::as_str).unwrap_or_default();
        let preset = find_preset(&presets, name)?;
        let agent = preset.config.build(Some(evaluator.clone()), seed);
        Ok((preset.name, agent))
    };
    let (name_one, mut team_one) = build_agent("teamOne", setup.seed)?;
    let (name_two, mut team_two) = build_agent("teamTwo", setup.seed.wrapping_add(1))?;

    let sim = setup.build();
    println!("{}", sim);
    info!("{} ({}) vs {} ({})", name_one, Team::One, name_two, Team::Two);

    let record = play_match(sim, &mut *team_one, &mut *team_two, setup.max_turns)?;
    match record.winner() {
        Some(Team::One) => println!("{} wins ({})", name_one, record),
        Some(Team::Two) => println!("{} wins ({})", name_two, record),
        None => println!("Draw ({})", record),
    }
    Ok(())
}
