//! Population-based self-play training of the network evaluator.
//!
//! Every generation, each genome plays both sides against a sample of the current population
//! and of the elite pool. Matches run on a fixed-size worker pool, and only exchange plain data with it:
//! a `MatchJob` going in, a `MatchRecord` coming out.

use std::collections::{HashMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::{IteratorRandom, SliceRandom};
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::evaluation::network::NetworkError;
use crate::evaluation::{Evaluator, Network};
use crate::planner::{DfsPlanner, Planner};
use crate::position::Team;
use crate::search::{Agent, AgentConfig, AgentError};
use crate::tune::play_match::{play_match, GameStats, MatchRecord, MatchSetup};

/// Genomes of the current population have non-negative ids.
/// Elite copies kept from earlier generations get negative ids, and never accumulate fitness.
pub type GenomeId = i64;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("could not restore genome {id}: {source}")]
    Network {
        id: GenomeId,
        #[source]
        source: NetworkError,
    },
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error("match panicked: {0}")]
    Panic(String),
}

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error("population must contain at least two genomes")]
    PopulationTooSmall,
    #[error("invalid mutation settings: sigma {sigma} must be finite and non-negative, rate {rate} must be within [0, 1]")]
    InvalidMutation { sigma: f32, rate: f64 },
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct TrainingOptions {
    pub population_size: usize,
    pub generations: usize,
    pub opponents_per_genome: usize,
    pub elites_per_genome: usize,
    pub elite_pool_size: usize,
    /// Fraction of each generation kept as parents of the next
    pub survival_fraction: f32,
    pub mutation_sigma: f32,
    pub mutation_rate: f64,
    pub exploration_rate: f32,
    pub hidden_layers: Vec<usize>,
    pub workers: usize,
    pub setup: MatchSetup,
    pub agent: AgentConfig,
    pub seed: u64,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        TrainingOptions {
            population_size: 10,
            generations: 15,
            opponents_per_genome: 5,
            elites_per_genome: 2,
            elite_pool_size: 8,
            survival_fraction: 0.3,
            mutation_sigma: 0.1,
            mutation_rate: 0.2,
            exploration_rate: 0.05,
            hidden_layers: vec![16],
            workers: 4,
            setup: MatchSetup::default(),
            agent: AgentConfig::Greedy(Planner::Dfs(DfsPlanner::default())),
            seed: 0,
        }
    }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Genome {
    pub id: GenomeId,
    pub network: Network,
    pub fitness: f32,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Contender {
    pub id: GenomeId,
    pub blob: Vec<u8>,
}

/// A self-contained description of one match, from which a worker can rebuild everything it needs
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct MatchJob {
    pub setup: MatchSetup,
    pub agent: AgentConfig,
    pub team_one: Contender,
    pub team_two: Contender,
}

impl MatchJob {
    pub fn contender(&self, team: Team) -> &Contender {
        match team {
            Team::One => &self.team_one,
            Team::Two => &self.team_two,
        }
    }

    fn build_agent(&self, team: Team) -> Result<Box<dyn Agent>, MatchError> {
        let contender = self.contender(team);
        let network = Network::from_bytes(&contender.blob).map_err(|source| MatchError::Network {
            id: contender.id,
            source,
        })?;
        let evaluator: Arc<dyn Evaluator> = Arc::new(network);
        Ok(self.agent.build(
            Some(evaluator),
            self.setup.seed.wrapping_add(team.index() as u64),
        ))
    }
}

pub fn run_job(job: &MatchJob) -> Result<MatchRecord, MatchError> {
    let mut team_one = job.build_agent(Team::One)?;
    let mut team_two = job.build_agent(Team::Two)?;
    let record = play_match(
        job.setup.build(),
        &mut *team_one,
        &mut *team_two,
        job.setup.max_turns,
    )?;
    Ok(record)
}

/// Runs a job, retrying once if it fails or panics. A job that fails twice is recorded as an aborted draw.
pub fn run_job_guarded(job: &MatchJob) -> MatchRecord {
    for attempt in 1..=2 {
        let result = panic::catch_unwind(AssertUnwindSafe(|| run_job(job)))
            .unwrap_or_else(|payload| Err(MatchError::Panic(panic_message(payload.as_ref()))));
        match result {
            Ok(record) => return record,
            Err(err) => warn!(
                "Match between genome {} and {} failed on attempt {}: {}",
                job.team_one.id, job.team_two.id, attempt, err
            ),
        }
    }
    MatchRecord::aborted()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

pub fn softplus(x: f32) -> f32 {
    if x > 20.0 {
        x
    } else {
        x.exp().ln_1p()
    }
}

/// Fitness earned by `team` in one match: health kept, units kept and damage inflicted, squashed by softplus.
pub fn match_fitness(record: &MatchRecord, team: Team) -> f32 {
    if record.aborted {
        return softplus(0.0);
    }
    let own = record.stats(team);
    let opponent = record.stats(!team);
    let damage_dealt = 1.0 - opponent.health_ratio();
    softplus(own.health_ratio() + own.survival_ratio() + damage_dealt - 1.5)
}

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct FitnessTally {
    pub total: f32,
    pub matches: u32,
}

impl FitnessTally {
    /// Average over the matches actually played
    pub fn fitness(&self) -> f32 {
        if self.matches == 0 {
            0.0
        } else {
            self.total / self.matches as f32
        }
    }
}

pub fn accumulate_fitness(
    jobs: &[MatchJob],
    records: &[MatchRecord],
) -> HashMap<GenomeId, FitnessTally> {
    let mut tallies: HashMap<GenomeId, FitnessTally> = HashMap::new();
    for (job, record) in jobs.iter().zip(records) {
        for team in Team::BOTH {
            let id = job.contender(team).id;
            if id < 0 {
                continue;
            }
            let tally = tallies.entry(id).or_default();
            tally.total += match_fitness(record, team);
            tally.matches += 1;
        }
    }
    tallies
}

#[derive(Clone, PartialEq, Debug)]
pub struct GenerationSummary {
    pub generation: usize,
    pub matches: usize,
    pub game_stats: GameStats,
    pub best_fitness: f32,
    pub mean_fitness: f32,
}

pub struct Trainer {
    options: TrainingOptions,
    population: Vec<Genome>,
    elites: VecDeque<Genome>,
    next_id: GenomeId,
    next_elite_id: GenomeId,
    generation: usize,
    best: Option<Genome>,
    rng: StdRng,
    pool: rayon::ThreadPool,
}

impl TrainingOptions {
    pub fn validate(&self) -> Result<(), TrainingError> {
        if self.population_size < 2 {
            return Err(TrainingError::PopulationTooSmall);
        }
        let sigma_ok = self.mutation_sigma.is_finite() && self.mutation_sigma >= 0.0;
        if !sigma_ok || !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(TrainingError::InvalidMutation {
                sigma: self.mutation_sigma,
                rate: self.mutation_rate,
            });
        }
        Ok(())
    }
}

impl Trainer {
    pub fn new(options: TrainingOptions) -> Result<Self, TrainingError> {
        options.validate()?;
        let mut rng = StdRng::seed_from_u64(options.seed);
        let population = (0..options.population_size)
            .map(|i| Genome {
                id: i as GenomeId,
                network: Network::for_features(&options.hidden_layers, &mut rng),
                fitness: 0.0,
            })
            .collect();
        Self::from_population(options, population, rng)
    }

    /// Continues training from existing networks, for instance a previously saved best genome.
    /// The population is filled up with mutated copies.
    pub fn from_networks(
        options: TrainingOptions,
        networks: Vec<Network>,
    ) -> Result<Self, TrainingError> {
        options.validate()?;
        let mut rng = StdRng::seed_from_u64(options.seed);
        if networks.is_empty() {
            return Self::new(options);
        }
        let mut population: Vec<Genome> = networks
            .into_iter()
            .take(options.population_size)
            .enumerate()
            .map(|(i, network)| Genome {
                id: i as GenomeId,
                network,
                fitness: 0.0,
            })
            .collect();
        while population.len() < options.population_size {
            let parent = &population[rng.gen_range(0..population.len())];
            let mut network = parent.network.clone();
            network.mutate(options.mutation_sigma, options.mutation_rate, &mut rng);
            population.push(Genome {
                id: population.len() as GenomeId,
                network,
                fitness: 0.0,
            });
        }
        Self::from_population(options, population, rng)
    }

    fn from_population(
        options: TrainingOptions,
        population: Vec<Genome>,
        rng: StdRng,
    ) -> Result<Self, TrainingError> {
        if population.len() < 2 {
            return Err(TrainingError::PopulationTooSmall);
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.workers.max(1))
            .build()?;
        Ok(Trainer {
            next_id: population.len() as GenomeId,
            options,
            population,
            elites: VecDeque::new(),
            next_elite_id: -1,
            generation: 0,
            best: None,
            rng,
            pool,
        })
    }

    pub fn options(&self) -> &TrainingOptions {
        &self.options
    }

    pub fn population(&self) -> &[Genome] {
        &self.population
    }

    pub fn elites(&self) -> impl Iterator<Item = &Genome> {
        self.elites.iter()
    }

    /// The fittest genome seen so far
    pub fn best(&self) -> Option<&Genome> {
        self.best.as_ref()
    }

    /// Builds the jobs of the current generation: both assignments against sampled population members and elites.
    pub fn schedule(&mut self) -> Result<Vec<MatchJob>, NetworkError> {
        let agent = self
            .options
            .agent
            .clone()
            .with_exploration_rate(self.options.exploration_rate);

        let mut blobs: HashMap<GenomeId, Vec<u8>> = HashMap::new();
        for genome in self.population.iter().chain(self.elites.iter()) {
            blobs.insert(genome.id, genome.network.to_bytes()?);
        }
        let contender = |id: GenomeId| Contender {
            id,
            blob: blobs[&id].clone(),
        };

        let mut jobs = vec![];
        for genome in self.population.iter() {
            let opponents = self
                .population
                .iter()
                .filter(|other| other.id != genome.id)
                .map(|other| other.id)
                .choose_multiple(&mut self.rng, self.options.opponents_per_genome);
            let elites: Vec<GenomeId> = self
                .elites
                .iter()
                .map(|elite| elite.id)
                .collect::<Vec<_>>()
                .choose_multiple(&mut self.rng, self.options.elites_per_genome)
                .copied()
                .collect();

            for opponent in opponents.into_iter().chain(elites) {
                let setup = self.options.setup.with_seed(self.rng.gen());
                jobs.push(MatchJob {
                    setup: setup.clone(),
                    agent: agent.clone(),
                    team_one: contender(genome.id),
                    team_two: contender(opponent),
                });
                jobs.push(MatchJob {
                    setup,
                    agent: agent.clone(),
                    team_one: contender(opponent),
                    team_two: contender(genome.id),
                });
            }
        }
        Ok(jobs)
    }

    /// Plays every match of the current generation on the worker pool, and assigns each genome its fitness.
    pub fn evaluate_generation(&mut self) -> Result<GenerationSummary, TrainingError> {
        let start_time = Instant::now();
        let jobs = self.schedule()?;
        let records: Vec<MatchRecord> = self
            .pool
            .install(|| jobs.par_iter().map(run_job_guarded).collect());

        let tallies = accumulate_fitness(&jobs, &records);
        for genome in self.population.iter_mut() {
            genome.fitness = tallies
                .get(&genome.id)
                .map(FitnessTally::fitness)
                .unwrap_or(0.0);
        }

        let fitnesses: Vec<f32> = self.population.iter().map(|genome| genome.fitness).collect();
        let summary = GenerationSummary {
            generation: self.generation,
            matches: jobs.len(),
            game_stats: GameStats::from_records(&records),
            best_fitness: fitnesses.iter().copied().fold(f32::NEG_INFINITY, f32::max),
            mean_fitness: fitnesses.iter().sum::<f32>() / fitnesses.len().max(1) as f32,
        };
        info!(
            "Generation {}: {} matches in {:.1}s, {:?}, best fitness {:.4}, mean fitness {:.4}",
            summary.generation,
            summary.matches,
            start_time.elapsed().as_secs_f64(),
            summary.game_stats,
            summary.best_fitness,
            summary.mean_fitness
        );
        Ok(summary)
    }

    /// Moves on to the next generation: the fittest genome joins the elite pool,
    /// the top fraction survives, and mutated copies of survivors fill the rest.
    pub fn evolve(&mut self) {
        self.population
            .sort_by(|a, b| b.fitness.total_cmp(&a.fitness));

        let fittest = &self.population[0];
        if self
            .best
            .as_ref()
            .map_or(true, |best| fittest.fitness > best.fitness)
        {
            self.best = Some(fittest.clone());
        }

        if self.options.elite_pool_size > 0 {
            let mut elite = fittest.clone();
            elite.id = self.next_elite_id;
            self.next_elite_id -= 1;
            self.elites.push_back(elite);
            while self.elites.len() > self.options.elite_pool_size {
                self.elites.pop_front();
            }
        }

        let population_size = self.options.population_size;
        let survivors = ((population_size as f32 * self.options.survival_fraction).ceil() as usize)
            .clamp(1, population_size);
        self.population.truncate(survivors);
        for genome in self.population.iter_mut() {
            genome.fitness = 0.0;
        }
        while self.population.len() < population_size {
            let parent = &self.population[self.rng.gen_range(0..survivors)];
            let mut network = parent.network.clone();
            network.mutate(
                self.options.mutation_sigma,
                self.options.mutation_rate,
                &mut self.rng,
            );
            self.population.push(Genome {
                id: self.next_id,
                network,
                fitness: 0.0,
            });
            self.next_id += 1;
        }
        self.generation += 1;
    }

    /// Runs all configured generations and returns the fittest genome seen.
    pub fn run(&mut self) -> Result<Genome, TrainingError> {
        for _ in 0..self.options.generations {
            self.evaluate_generation()?;
            self.evolve();
        }
        match &self.best {
            Some(best) => Ok(best.clone()),
            None => Ok(self.population[0].clone()),
        }
    }
}
