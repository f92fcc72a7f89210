use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use clap::Parser;
use log::info;

pub use utils::Pos;
mod utils;

pub use world::{Cell, Generation, Grid, GridError, Mode, Rgb};
pub mod world;

pub use engine::StepEngine;
mod engine;

pub use sim::{Schedule, Sim, SimError, SimHandle, State, Status};
mod sim;

mod pattern;

pub use view::View;
mod view;

/// Conway's game of life on a bounded grid, in the terminal.
#[derive(Debug, Parser)]
#[command(name = "golgrid", version)]
struct Args {
    /// text layout to start from, `#` marks a live cell
    pattern: Option<PathBuf>,
    /// grid height in cells
    #[arg(long, default_value_t = 50)]
    rows: i32,
    /// grid width in cells
    #[arg(long, default_value_t = 50)]
    cols: i32,
    /// milliseconds per generation
    #[arg(long, default_value_t = 100)]
    interval: u64,
    /// color every cell and blend survivors with their neighbors
    #[arg(long)]
    blend: bool,
    /// seed for randomizing and for the colors of dying cells
    #[arg(long)]
    seed: Option<u64>,
    /// start from a random grid
    #[arg(long)]
    random: bool,
    /// start running right away
    #[arg(long)]
    start: bool,
    /// where log output goes, the terminal itself is busy
    #[arg(long, default_value = "/tmp/golgrid.log")]
    log_file: PathBuf,
}

fn init_logging(path: &Path) -> anyhow::Result<()> {
    let log_file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .with_context(|| format!("could not open log file {}", path.display()))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();
    Ok(())
}

fn build_state(args: &Args) -> anyhow::Result<State> {
    let mode = if args.blend { Mode::Blend } else { Mode::Classic };
    let mut engine = match args.seed {
        Some(seed) => StepEngine::seeded(seed),
        None => StepEngine::from_entropy(),
    };

    let actives = match &args.pattern {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("could not read pattern {}", path.display()))?;
            pattern::deserialize(&content)
        }
        None => vec![],
    };

    let mut grid = Grid::new(args.rows, args.cols, mode).context("invalid grid size")?;
    // a layout bigger than the requested grid grows it
    let (min_rows, min_cols) = pattern::extent(&actives);
    if min_rows > args.rows || min_cols > args.cols {
        grid.resize(args.rows.max(min_rows), args.cols.max(min_cols))?;
    }
    if args.random {
        engine.randomize(&mut grid);
    }
    pattern::stamp(&mut grid, &actives, pos!(0, 0)).context("could not place pattern")?;

    let schedule = Schedule::new(Duration::from_millis(args.interval));
    Ok(State::new(grid, engine, schedule))
}

pub fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.log_file)?;
    info!("starting golgrid with {args:?}");

    let state = build_state(&args)?;
    let simulation = Sim::spawn(state);
    let handle = simulation.handle();
    if args.start {
        handle.start(None)?;
    }

    let view = View::spawn(handle);
    let result = view.join();

    simulation.shutdown();
    info!("bye");
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("golgrid-{}-{name}.txt", std::process::id()));
        fs::write(&path, content).unwrap();
        path
    }

    fn args(extra: &[&str]) -> Args {
        Args::parse_from(std::iter::once("golgrid").chain(extra.iter().copied()))
    }

    #[test]
    fn non_positive_size_is_rejected_even_with_a_pattern() {
        let path = pattern_file("negative", "###\n");
        let args = args(&[path.to_str().unwrap(), "--rows=-5", "--cols", "4"]);

        let err = build_state(&args).unwrap_err();
        assert_eq!(
            err.downcast_ref::<GridError>(),
            Some(&GridError::InvalidDimension { rows: -5, cols: 4 })
        );
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn pattern_grows_a_small_grid() {
        let path = pattern_file("grow", "#....#\n\n..#\n");
        let args = args(&[path.to_str().unwrap(), "--rows", "2", "--cols", "3", "--seed", "1"]);

        let status = build_state(&args).unwrap().status();
        assert_eq!((status.rows, status.cols), (3, 6));
        assert_eq!(status.population, 3);
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn defaults_without_a_pattern() {
        let status = build_state(&args(&["--seed", "3"])).unwrap().status();
        assert_eq!((status.rows, status.cols), (50, 50));
        assert_eq!(status.mode, Mode::Classic);
        assert_eq!(status.interval, Duration::from_millis(100));
        assert!(!status.running);
    }
}
