use std::fs;
use std::path::Path;

use clap::{Arg, Command};
use log::{info, warn};

use skirmish::cli::{self, DynError};
use skirmish::evaluation::features::NUM_FEATURES;
use skirmish::evaluation::Network;
use skirmish::tune::presets::{default_presets, load_presets};
use skirmish::tune::selfplay::{Trainer, TrainingOptions};

pub fn main() -> Result<(), DynError> {
    let app = Command::new("Skirmish trainer")
        .version("0.1")
        .about("Trains a network evaluator through population-based self-play")
        .arg(
            Arg::new("population")
                .long("population")
                .env("POPULATION")
                .help("Number of genomes in each generation")
                .num_args(1)
                .default_value("10")
                .value_parser(clap::value_parser!(u64).range(2..)),
        )
        .arg(
            Arg::new("generations")
                .long("generations")
                .env("GENERATIONS")
                .help("Number of generations to train for")
                .num_args(1)
                .default_value("15")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("opponents")
                .long("opponents")
                .env("OPPONENTS")
                .help("Opponents sampled from the population for each genome, each played from both sides")
                .num_args(1)
                .default_value("5")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("elites")
                .long("elites")
                .env("ELITES")
                .help("Opponents sampled from the pool of earlier generations' best genomes")
                .num_args(1)
                .default_value("2")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("workers")
                .short('w')
                .long("workers")
                .env("WORKERS")
                .help("Number of matches played in parallel")
                .num_args(1)
                .default_value("4")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("hidden")
                .long("hidden")
                .env("HIDDEN")
                .help("Comma-separated widths of the network's hidden layers")
                .num_args(1)
                .default_value("16"),
        )
        .arg(
            Arg::new("mutationSigma")
                .long("mutation-sigma")
                .env("MUTATION_SIGMA")
                .help("Standard deviation of the noise added to mutated weights")
                .num_args(1)
                .default_value("0.1")
                .value_parser(clap::value_parser!(f32)),
        )
        .arg(
            Arg::new("mutationRate")
                .long("mutation-rate")
                .env("MUTATION_RATE")
                .help("Probability of each weight being mutated")
                .num_args(1)
                .default_value("0.2")
                .value_parser(clap::value_parser!(f64)),
        )
        .arg(
            Arg::new("exploration")
                .long("exploration")
                .env("EXPLORATION")
                .help("Probability of a greedy agent playing a random candidate turn during self-play")
                .num_args(1)
                .default_value("0.05")
                .value_parser(clap::value_parser!(f32)),
        )
        .arg(
            Arg::new("agent")
                .long("agent")
                .env("AGENT")
                .help("Preset used by both sides in self-play")
                .num_args(1)
                .default_value("Greedy"),
        )
        .arg(
            Arg::new("presets")
                .long("presets")
                .env("PRESETS")
                .help("JSON file of agent presets, replacing the built-in ones")
                .num_args(1),
        )
        .arg(
            Arg::new("resume")
                .long("resume")
                .env("RESUME")
                .help("Seed the population with a previously trained genome")
                .num_args(1),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .env("OUTPUT")
                .help("Directory to write trained genomes to")
                .num_args(1)
                .default_value("."),
        );
    let matches = cli::with_match_args(app).get_matches();
    cli::setup_logging(&matches, log::LevelFilter::Info)?;

    let setup = cli::match_setup(&matches)?;
    let hidden_layers = matches
        .get_one::<String>("hidden")
        .map(String::as_str)
        .unwrap_or("16")
        .split(',')
        .filter(|width| !width.trim().is_empty())
        .map(|width| width.trim().parse::<usize>())
        .collect::<Result<Vec<usize>, _>>()?;
    if hidden_layers.contains(&0) {
        return Err("Hidden layers must have at least one neuron".into());
    }

    let agent_name = matches.get_one::<String>("agent").map(String::as_str).unwrap_or("Greedy");
    let presets = match matches.get_one::<String>("presets") {
        Some(path) => load_presets(path)?,
        None => default_presets(),
    };
    let agent = presets
        .into_iter()
        .find(|preset| preset.name == agent_name)
        .ok_or_else(|| format!("Unknown preset \"{}\"", agent_name))?
        .config;

    let options = TrainingOptions {
        population_size: *matches.get_one::<u64>("population").unwrap_or(&10) as usize,
        generations: *matches.get_one::<u64>("generations").unwrap_or(&15) as usize,
        opponents_per_genome: *matches.get_one::<u64>("opponents").unwrap_or(&5) as usize,
        elites_per_genome: *matches.get_one::<u64>("elites").unwrap_or(&2) as usize,
        mutation_sigma: *matches.get_one::<f32>("mutationSigma").unwrap_or(&0.1),
        mutation_rate: *matches.get_one::<f64>("mutationRate").unwrap_or(&0.2),
        exploration_rate: *matches.get_one::<f32>("exploration").unwrap_or(&0.05),
        workers: *matches.get_one::<u64>("workers").unwrap_or(&4) as usize,
        hidden_layers,
        seed: setup.seed,
        setup,
        agent,
        ..TrainingOptions::default()
    };
    info!("Training with {:?}", options);

    let mut trainer = match matches.get_one::<String>("resume") {
        Some(path) => {
            let network = Network::load(path)?;
            if network.num_inputs() != NUM_FEATURES {
                warn!(
                    "Resumed genome takes {} inputs, but positions are encoded with {} features",
                    network.num_inputs(),
                    NUM_FEATURES
                );
            }
            Trainer::from_networks(options.clone(), vec![network])?
        }
        None => Trainer::new(options.clone())?,
    };
    let best = trainer.run()?;
    info!("Best genome {} with fitness {:.4}", best.id, best.fitness);

    let output = Path::new(
        matches
            .get_one::<String>("output")
            .map(String::as_str)
            .unwrap_or("."),
    );
    fs::create_dir_all(output)?;
    let latest = output.join("best_genome.json");
    best.network.save(&latest)?;

    let stamp = chrono::Local::now().format("%Y%m%d_%H%M");
    let archived = output.join(format!(
        "best_genome_G{}_P{}_O{}_{}.json",
        options.generations, options.population_size, options.opponents_per_genome, stamp
    ));
    best.network.save(&archived)?;
    println!(
        "Saved best genome to {} and {}",
        latest.display(),
        archived.display()
    );
    Ok(())
}
