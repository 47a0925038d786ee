//! Arguments and logging setup shared by the binaries.

use std::error;
use std::io;

use clap::{Arg, ArgMatches, Command};

use crate::position::MapKind;
use crate::tune::play_match::MatchSetup;

pub type DynError = Box<dyn error::Error + Send + Sync>;

/// Adds the arguments describing the match setup, and the log file
pub fn with_match_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("width")
                .long("width")
                .env("BOARD_WIDTH")
                .help("Board width")
                .num_args(1)
                .default_value("8")
                .value_parser(clap::value_parser!(u64).range(4..=32)),
        )
        .arg(
            Arg::new("height")
                .long("height")
                .env("BOARD_HEIGHT")
                .help("Board height")
                .num_args(1)
                .default_value("8")
                .value_parser(clap::value_parser!(u64).range(4..=32)),
        )
        .arg(
            Arg::new("map")
                .long("map")
                .env("MAP")
                .help("Kind of map to generate for each match")
                .num_args(1)
                .value_parser([
                    "plains",
                    "default",
                    "hilly",
                    "watery",
                    "mountainous",
                    "mixed",
                    "random",
                ])
                .default_value("random"),
        )
        .arg(
            Arg::new("funds")
                .long("funds")
                .env("FUNDS")
                .help("Money available to each team when drafting its army")
                .num_args(1)
                .default_value("100")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("maxTurns")
                .long("max-turns")
                .env("MAX_TURNS")
                .help("Number of rounds after which a match is declared a draw")
                .num_args(1)
                .default_value("30")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .env("SEED")
                .help("Seed for map generation, drafting and the agents")
                .num_args(1)
                .default_value("0")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("logfile")
                .short('l')
                .long("logfile")
                .env("LOGFILE")
                .value_name("skirmish.log")
                .help("Name of debug logfile")
                .num_args(1),
        )
}

pub fn match_setup(matches: &ArgMatches) -> Result<MatchSetup, DynError> {
    let map: MapKind = matches
        .get_one::<String>("map")
        .map(String::as_str)
        .unwrap_or("random")
        .parse()?;
    Ok(MatchSetup {
        width: matches.get_one::<u64>("width").copied().unwrap_or(8) as usize,
        height: matches.get_one::<u64>("height").copied().unwrap_or(8) as usize,
        map,
        funds: matches.get_one::<u32>("funds").copied().unwrap_or(100),
        max_turns: matches.get_one::<u32>("maxTurns").copied().unwrap_or(30),
        seed: matches.get_one::<u64>("seed").copied().unwrap_or(0),
    })
}

/// Logs everything to the log file if one was given, and `stderr_level` and above to stderr
pub fn setup_logging(matches: &ArgMatches, stderr_level: log::LevelFilter) -> Result<(), DynError> {
    let log_dispatcher = fern::Dispatch::new().format(|out, message, record| {
        out.finish(format_args!(
            "{}[{}][{}] {}",
            chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
            record.target(),
            record.level(),
            message
        ))
    });

    if let Some(log_file) = matches.get_one::<String>("logfile") {
        log_dispatcher
            .chain(
                fern::Dispatch::new()
                    .level(log::LevelFilter::Debug)
                    .chain(fern::log_file(log_file)?),
            )
            .chain(
                fern::Dispatch::new()
                    .level(stderr_level)
                    .chain(io::stderr()),
            )
            .apply()?
    } else {
        log_dispatcher
            .level(stderr_level)
            .chain(io::stderr())
            .apply()?
    }
    Ok(())
}
