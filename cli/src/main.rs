//! Headless driver for the construction kanban engine
//!
//! Every command works against a JSON save file, so a game can be played a
//! few days at a time:
//!
//! ```text
//! kanban-sim new --seed 7
//! kanban-sim play --days 5 --auto
//! kanban-sim show
//! ```

use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use kanban_sim_core_rs::{catalog, Channel, FileStore, GameConfig, GameEngine, GameError, SubStage};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "kanban-sim")]
#[command(about = "Turn-based construction kanban simulator")]
struct Cli {
    /// Save file holding the game
    #[arg(long, global = true, default_value = "kanban-game.json")]
    state: PathBuf,

    /// JSON file with a game config (missing fields keep their defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Seed for the random source (overrides the config file)
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a new game, overwriting the save file
    New,

    /// Advance the game
    Play {
        /// Number of days to play
        #[arg(long, default_value_t = 1)]
        days: u32,

        /// Auto-distribute capacity before each day
        #[arg(long)]
        auto: bool,
    },

    /// Print the current board
    Show,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<GameConfig, Box<dyn Error>> {
    let mut config = match &cli.config {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => GameConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.rng_seed = seed;
    }
    Ok(config)
}

/// `new` starts over from the requested seed; every other command resumes
/// the save file
fn open_engine(cli: &Cli, config: GameConfig) -> Result<GameEngine, GameError> {
    let store = Box::new(FileStore::new(&cli.state));
    match cli.command {
        Command::New => GameEngine::create(config, store),
        _ => GameEngine::restore(config, store),
    }
}

fn print_board(engine: &GameEngine) {
    let state = engine.state();
    let pool = state.capacity();

    println!(
        "Day {}  money {}  profit {}{}",
        state.day(),
        state.money(),
        engine.profit(),
        if state.game_won() {
            "  (won)"
        } else if state.game_over() {
            "  (game over)"
        } else {
            ""
        }
    );
    println!(
        "Capacity  {}",
        Channel::ALL
            .iter()
            .map(|c| format!("{}={}", c, pool.get(*c)))
            .collect::<Vec<_>>()
            .join(" ")
    );

    let mut columns = catalog::STAGES.to_vec();
    columns.sort_by_key(|spec| spec.order);

    for column in columns {
        let tasks: Vec<String> = state
            .tasks()
            .iter()
            .filter(|t| t.stage() == column.stage)
            .map(|t| {
                let mut label = t.id().to_string();
                if t.stage().is_work_stage() && t.sub_stage() == SubStage::Doing {
                    label.push_str(&format!(" [doing, {} left]", t.active_remaining().unwrap_or(0)));
                }
                if let Some(block) = t.block_type() {
                    label.push_str(&format!(" [blocked: {:?}]", block));
                }
                if t.is_curing() {
                    label.push_str(&format!(" [curing {}d]", t.curing_days().unwrap_or(0)));
                }
                label
            })
            .collect();
        if !tasks.is_empty() {
            println!("  {:<28} {}", column.name, tasks.join(", "));
        }
    }

    if let Some(event) = state.events().last() {
        println!("Last event (day {}): {}", event.day, event.description);
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logging();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let mut engine = open_engine(&cli, config)?;

    match cli.command {
        Command::New => {
            info!(path = %cli.state.display(), "new game saved");
            print_board(&engine);
        }
        Command::Play { days, auto } => {
            for _ in 0..days {
                if auto {
                    engine.auto_distribute_capacity();
                }
                let Some(result) = engine.next_day() else {
                    info!("game already concluded");
                    break;
                };
                println!(
                    "Day {:>3}: money {:>7} (+{} -{}){}",
                    result.day,
                    result.money,
                    result.revenue,
                    result.costs,
                    result
                        .event
                        .map(|e| format!("  event: {}", e.name()))
                        .unwrap_or_default()
                );
                for id in &result.curing_started {
                    println!("         {} started curing", id);
                }
                for id in &result.completed {
                    println!("         {} done", id);
                }
            }
            print_board(&engine);
        }
        Command::Show => print_board(&engine),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("kanban-cli-{}", std::process::id()))
            .join(name)
    }

    fn run(args: &[&str]) -> GameEngine {
        let cli = Cli::parse_from(args);
        let config = load_config(&cli).unwrap();
        let mut engine = open_engine(&cli, config).unwrap();
        if let Command::Play { days, auto } = cli.command {
            for _ in 0..days {
                if auto {
                    engine.auto_distribute_capacity();
                }
                engine.next_day();
            }
        }
        engine
    }

    #[test]
    fn test_new_uses_requested_seed_over_existing_save() {
        let first = scratch("first.json");
        let second = scratch("second.json");
        let first_arg = first.to_string_lossy().to_string();
        let second_arg = second.to_string_lossy().to_string();

        run(&["kanban-sim", "--state", &first_arg, "--seed", "3", "play", "--days", "6", "--auto"]);
        run(&["kanban-sim", "--state", &second_arg, "--seed", "99", "play", "--days", "2"]);

        let a = run(&["kanban-sim", "--state", &first_arg, "--seed", "7", "new"]);
        let b = run(&["kanban-sim", "--state", &second_arg, "--seed", "7", "new"]);
        assert_eq!(a.state(), b.state());
        assert_eq!(a.state().day(), 0);

        let resumed = run(&["kanban-sim", "--state", &first_arg, "show"]);
        assert_eq!(resumed.state(), a.state());

        let _ = fs::remove_dir_all(first.parent().unwrap());
    }
}
