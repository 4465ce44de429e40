//! Demo binary: floods every core with restart-equipped searches over a
//! generated instance or a piece file, keeps the fullest assembly seen
//! and writes near-complete boards to the documents folder.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use thousands::Separable;

use edgematch::{
    config, export, generate, Board, FieldSelector, PieceSet, RestartPolicy, SearchController,
    Snapshot, SolverError, StallRestart,
};

fn env_parse<T: FromStr>(name: &str, default: T) -> T
where
    T::Err: std::fmt::Debug,
{
    match env::var(name) {
        Ok(value) => value.parse::<T>().unwrap(),
        Err(_e) => default,
    }
}

fn load_pieces(
    width: usize,
    height: usize,
    seed: u64,
) -> edgematch::Result<(PieceSet, String)> {
    if let Ok(path) = env::var("PIECES") {
        let text = fs::read_to_string(&path).map_err(|source| SolverError::Io {
            path: PathBuf::from(&path),
            source,
        })?;
        let set = PieceSet::parse(&text)?;
        let name = Path::new(&path)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("pieces")
            .to_string();
        return Ok((set, name));
    }

    let colors = env_parse("COLORS", config::DEMO_COLORS);
    let set = if width == config::DEMO_WIDTH
        && height == config::DEMO_HEIGHT
        && colors == config::DEMO_COLORS
        && seed == config::DEMO_SEED
    {
        generate::DEMO.set.clone()
    } else {
        generate::generate(width, height, colors, seed).set
    };
    Ok((set, format!("random_{seed}")))
}

#[derive(Default)]
struct Totals {
    nodes: u64,
    solutions: u64,
    restarts: u64,
    max_depth: usize,
    depth_visits: Vec<u64>,
}

impl Totals {
    fn merge(&mut self, outcome: &edgematch::SearchOutcome) {
        self.nodes += outcome.nodes;
        self.solutions += outcome.solutions;
        self.restarts += outcome.restarts;
        if outcome.max_depth > self.max_depth {
            self.max_depth = outcome.max_depth;
        }
        if self.depth_visits.len() < outcome.depth_visits.len() {
            self.depth_visits.resize(outcome.depth_visits.len(), 0);
        }
        for (slot, count) in outcome.depth_visits.iter().enumerate() {
            self.depth_visits[slot] += count;
        }
    }
}

fn main() -> edgematch::Result<()> {
    env_logger::init();

    let cores = env_parse("CORES", num_cpus::get());
    let runs = env_parse("RUNS", 5usize);
    let width = env_parse("WIDTH", config::DEMO_WIDTH);
    let height = env_parse("HEIGHT", config::DEMO_HEIGHT);
    let base_seed = env_parse("SEED", config::DEMO_SEED);
    let node_budget = env_parse("NODES", config::DEFAULT_NODE_BUDGET);
    let time_budget = match env::var("SECONDS") {
        Ok(value) => Some(Duration::from_secs(value.parse::<u64>().unwrap())),
        Err(_e) => None,
    };

    let (pieces, puzzle_name) = load_pieces(width, height, base_seed)?;
    // Surface bad dimensions or an unusable catalogue before the workers spawn.
    Board::new(&pieces, width, height, pieces.clues())?;
    println!(
        "Solving {puzzle_name} ({width}x{height}, {} pieces) with {cores} cores...",
        pieces.len()
    );

    let overall_stopwatch = Instant::now();
    let area = width * height;
    let best: Arc<Mutex<Option<Snapshot>>> = Arc::new(Mutex::new(None));
    let totals: Arc<Mutex<Totals>> = Arc::new(Mutex::new(Totals::default()));

    (0..cores).into_par_iter().for_each(|core| {
        let best = Arc::clone(&best);
        let totals = Arc::clone(&totals);

        let mut board = match Board::new(&pieces, width, height, pieces.clues()) {
            Ok(board) => board,
            Err(_e) => return,
        };

        for repeat in 1..=runs {
            let run_seed = base_seed.wrapping_add(core as u64 * 1_000 + repeat as u64);
            let stopwatch = Instant::now();

            let policy = RestartPolicy {
                node_budget: Some(node_budget),
                time_budget,
                ..RestartPolicy::default()
            };
            let selector = FieldSelector::most_constrained(run_seed).with_candidate_shuffle();
            let controller =
                SearchController::new(&mut board, selector, StallRestart::new(policy));
            let outcome = controller.run();

            println!(
                "Core {core}: finish repeat {repeat} in {} seconds, {} nodes, best {}/{area}",
                stopwatch.elapsed().as_secs(),
                outcome.nodes.separate_with_commas(),
                outcome.best.filled(),
            );

            if outcome.best.filled() + config::SAVE_MARGIN >= area {
                if let Some(dir) = export::solutions_dir() {
                    match export::write_solution(&dir, &outcome.best, &pieces, &puzzle_name) {
                        Ok(path) => log::info!("saved {}", path.display()),
                        Err(err) => log::warn!("could not save solution: {err}"),
                    }
                }
            }

            {
                let mut best = best.lock().unwrap();
                let better = match best.as_ref() {
                    Some(kept) => outcome.best.filled() > kept.filled(),
                    None => true,
                };
                if better {
                    *best = Some(outcome.best.clone());
                }
            }
            totals.lock().unwrap().merge(&outcome);
        }
    });

    let totals = totals.lock().unwrap();
    for (depth, count) in totals.depth_visits.iter().enumerate() {
        if *count != 0 {
            println!("{depth} {}", count.separate_with_commas());
        }
    }

    let elapsed_seconds = overall_stopwatch.elapsed().as_secs().max(1);
    println!(
        "Total {} nodes in {elapsed_seconds} seconds, {} per second, max depth {}, {} restarts",
        totals.nodes.separate_with_commas(),
        (totals.nodes / elapsed_seconds).separate_with_commas(),
        totals.max_depth,
        totals.restarts.separate_with_commas(),
    );
    if totals.solutions > 0 {
        println!(
            "{} complete assemblies found",
            totals.solutions.separate_with_commas()
        );
    }

    if let Some(best) = best.lock().unwrap().as_ref() {
        println!("Best assembly: {}/{area} cells", best.filled());
        println!("{}", export::bucas_url(best, &pieces, &puzzle_name));
    }

    Ok(())
}
