use std::time::{Duration, Instant};

use log::{debug, info};

use crate::board::{Board, Snapshot};
use crate::config;
use crate::walker::FieldSelector;

/// What the strategy wants the search to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchCommand {
    /// Keep descending.
    Continue,
    /// Unwind to the given depth and resume from there with the next
    /// candidate. Targets at or above the current depth do nothing.
    Restart(usize),
    /// Unwind everything and stop.
    Quit,
}

/// Live telemetry handed to the strategy on every node entry.
#[derive(Debug, Clone, Copy)]
pub struct Progress {
    /// Placements beyond the clues on the board right now.
    pub depth: usize,
    /// Deepest depth reached so far in this run.
    pub best_depth: usize,
    /// Filled cells of the best assembly kept so far, clues included.
    pub best_filled: usize,
    pub nodes: u64,
    pub solutions: u64,
    pub restarts: u64,
    pub elapsed: Duration,
}

/// Decides when to keep going, rewind, or stop, and what to do with
/// completed assemblies.
pub trait Strategy {
    fn assess(&mut self, progress: &Progress) -> SearchCommand;

    /// Called once per completed assembly. Return true to keep
    /// searching for more solutions, false to stop.
    fn on_solution(&mut self, snapshot: &Snapshot) -> bool {
        let _ = snapshot;
        false
    }
}

/// Tunables for [`StallRestart`]. A cell of the search is considered
/// stalled once the time spent at its depth exceeds
/// `patience + depth_scale * depth`; the restart then rewinds at most
/// `max_backtrack` levels. Budgets, when set, quit the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPolicy {
    pub patience: Duration,
    pub depth_scale: Duration,
    pub max_backtrack: usize,
    pub node_budget: Option<u64>,
    pub time_budget: Option<Duration>,
}

impl Default for RestartPolicy {
    fn default() -> RestartPolicy {
        RestartPolicy {
            patience: Duration::from_millis(config::DEFAULT_PATIENCE_MS),
            depth_scale: Duration::from_millis(config::DEFAULT_DEPTH_SCALE_MS),
            max_backtrack: config::DEFAULT_MAX_BACKTRACK,
            node_budget: None,
            time_budget: None,
        }
    }
}

/// The stock strategy: quit on budget exhaustion, otherwise rewind a
/// bounded number of levels whenever the search dwells too long at one
/// depth. Stops at the first complete assembly.
///
/// Dwell at a depth is measured from the moment that depth was first
/// created and survives sibling retries below it; issuing a restart
/// resets the timers of everything beyond the restart target.
pub struct StallRestart {
    policy: RestartPolicy,
    entered: Vec<Instant>,
}

impl StallRestart {
    pub fn new(policy: RestartPolicy) -> StallRestart {
        StallRestart {
            policy,
            entered: Vec::new(),
        }
    }

    #[cfg(test)]
    fn backdate(&mut self, depth: usize, by: Duration) {
        let stamp = Instant::now()
            .checked_sub(by)
            .expect("test backdate within the clock range");
        while self.entered.len() <= depth {
            self.entered.push(stamp);
        }
        self.entered[depth] = stamp;
    }
}

impl Strategy for StallRestart {
    fn assess(&mut self, progress: &Progress) -> SearchCommand {
        if let Some(budget) = self.policy.node_budget {
            if progress.nodes >= budget {
                return SearchCommand::Quit;
            }
        }
        if let Some(budget) = self.policy.time_budget {
            if progress.elapsed >= budget {
                return SearchCommand::Quit;
            }
        }
        let now = Instant::now();
        let depth = progress.depth;
        if self.entered.len() > depth + 1 {
            self.entered.truncate(depth + 1);
        }
        while self.entered.len() <= depth {
            self.entered.push(now);
        }
        let dwell = now.duration_since(self.entered[depth]);
        let allowance = self.policy.patience + self.policy.depth_scale * depth as u32;
        if dwell > allowance && depth > 0 {
            let target = depth.saturating_sub(self.policy.max_backtrack);
            self.entered.truncate(target + 1);
            return SearchCommand::Restart(target);
        }
        SearchCommand::Continue
    }
}

/// Final report of one search run.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// The fullest assembly seen, complete or not.
    pub best: Snapshot,
    pub nodes: u64,
    pub solutions: u64,
    pub restarts: u64,
    pub max_depth: usize,
    /// Node visits per depth, index 0 being the clue-only root.
    pub depth_visits: Vec<u64>,
    pub elapsed: Duration,
}

enum Flow {
    Continue,
    Unwind(usize),
    Quit,
}

/// Depth-first search over one board. Each level picks the walker's
/// best cell, tries its candidates in order, and undoes its own
/// placement on the way out, so the board always returns to the
/// clue-only state when `run` finishes.
pub struct SearchController<'c, 'p, S: Strategy> {
    board: &'c mut Board<'p>,
    selector: FieldSelector,
    strategy: S,
    best: Snapshot,
    nodes: u64,
    solutions: u64,
    restarts: u64,
    max_depth: usize,
    depth_visits: Vec<u64>,
    started: Instant,
}

impl<'c, 'p, S: Strategy> SearchController<'c, 'p, S> {
    pub fn new(board: &'c mut Board<'p>, selector: FieldSelector, strategy: S) -> Self {
        let best = Snapshot::of(board);
        let depth_visits = vec![0; board.free_count() + 1];
        SearchController {
            board,
            selector,
            strategy,
            best,
            nodes: 0,
            solutions: 0,
            restarts: 0,
            max_depth: 0,
            depth_visits,
            started: Instant::now(),
        }
    }

    pub fn run(mut self) -> SearchOutcome {
        self.started = Instant::now();
        self.dive(0);
        info!(
            "search finished: {} nodes, {} solutions, best {}/{} cells",
            self.nodes,
            self.solutions,
            self.best.filled(),
            self.board.width() * self.board.height(),
        );
        SearchOutcome {
            best: self.best,
            nodes: self.nodes,
            solutions: self.solutions,
            restarts: self.restarts,
            max_depth: self.max_depth,
            depth_visits: self.depth_visits,
            elapsed: self.started.elapsed(),
        }
    }

    fn dive(&mut self, depth: usize) -> Flow {
        self.nodes += 1;
        if depth >= self.depth_visits.len() {
            self.depth_visits.resize(depth + 1, 0);
        }
        self.depth_visits[depth] += 1;
        if depth > self.max_depth {
            self.max_depth = depth;
            debug!("deepest so far: {depth} ({} filled)", self.board.filled_count());
        }

        if self.board.free_count() == 0 {
            self.solutions += 1;
            let snapshot = Snapshot::of(self.board);
            if snapshot.filled() > self.best.filled() {
                self.best = snapshot.clone();
            }
            info!("complete assembly after {} nodes", self.nodes);
            return if self.strategy.on_solution(&snapshot) {
                Flow::Continue
            } else {
                Flow::Quit
            };
        }

        match self.strategy.assess(&self.progress(depth)) {
            SearchCommand::Quit => return Flow::Quit,
            SearchCommand::Restart(target) if target < depth => {
                self.restarts += 1;
                debug!("restart from depth {depth} to {target}");
                return Flow::Unwind(target);
            }
            SearchCommand::Restart(_) | SearchCommand::Continue => {}
        }

        let Some(choice) = self.selector.select_best(self.board) else {
            return Flow::Continue;
        };
        for candidate in &choice.candidates {
            if !self
                .board
                .place(choice.x, choice.y, candidate.piece, candidate.rotation)
            {
                continue;
            }
            if self.board.filled_count() > self.best.filled() {
                self.best = Snapshot::of(self.board);
            }
            let flow = self.dive(depth + 1);
            self.board.remove(choice.x, choice.y);
            match flow {
                Flow::Continue => {}
                Flow::Quit => return Flow::Quit,
                Flow::Unwind(target) => {
                    if target < depth {
                        return Flow::Unwind(target);
                    }
                    // This frame is the restart target: resume with the
                    // next candidate.
                }
            }
        }
        Flow::Continue
    }

    fn progress(&self, depth: usize) -> Progress {
        Progress {
            depth,
            best_depth: self.max_depth,
            best_filled: self.best.filled(),
            nodes: self.nodes,
            solutions: self.solutions,
            restarts: self.restarts,
            elapsed: self.started.elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::HashSet;
    use std::rc::Rc;

    use crate::generate::generate;
    use crate::piece::{Clue, Piece, PieceId, PieceSet, Placement};

    fn set(edge_lists: &[[u8; 4]]) -> PieceSet {
        let pieces = edge_lists
            .iter()
            .enumerate()
            .map(|(id, &edges)| Piece {
                id: id as PieceId,
                edges,
            })
            .collect();
        PieceSet::new(pieces, Vec::new()).unwrap()
    }

    fn two_by_two() -> PieceSet {
        set(&[
            [0, 1, 1, 0],
            [0, 0, 2, 1],
            [1, 2, 0, 0],
            [2, 0, 0, 2],
        ])
    }

    /// Accepts every completion and never interferes.
    struct ExhaustAll;

    impl Strategy for ExhaustAll {
        fn assess(&mut self, _progress: &Progress) -> SearchCommand {
            SearchCommand::Continue
        }

        fn on_solution(&mut self, _snapshot: &Snapshot) -> bool {
            true
        }
    }

    #[test]
    fn finds_the_unique_assembly() {
        let pieces = two_by_two();
        let mut board = Board::new(&pieces, 2, 2, &[]).unwrap();
        let controller = SearchController::new(
            &mut board,
            FieldSelector::most_constrained(1),
            StallRestart::new(RestartPolicy::default()),
        );
        let outcome = controller.run();

        assert_eq!(outcome.solutions, 1);
        assert!(outcome.best.is_complete());
        for (cell, piece) in [(0usize, 0u16), (1, 1), (2, 2), (3, 3)] {
            let (x, y) = (cell % 2, cell / 2);
            assert_eq!(
                outcome.best.cell_at(x, y),
                Some(Placement {
                    piece,
                    rotation: 0
                })
            );
        }
        // The board itself is back to the clue-only state.
        assert_eq!(board.free_count(), 4);
        assert_eq!(board.filled_count(), 0);
    }

    #[test]
    fn exhaustive_run_counts_every_assembly() {
        // Four identical corners: any of the 4! piece-to-cell
        // assignments completes, each with a forced rotation.
        let pieces = set(&[
            [0, 1, 1, 0],
            [0, 1, 1, 0],
            [0, 1, 1, 0],
            [0, 1, 1, 0],
        ]);
        let mut board = Board::new(&pieces, 2, 2, &[]).unwrap();
        let controller =
            SearchController::new(&mut board, FieldSelector::scanline(0), ExhaustAll);
        let outcome = controller.run();

        assert_eq!(outcome.solutions, 24);
        assert_eq!(outcome.max_depth, 4);
        // 1 root, 4 first placements, then 12, 24 and 24 leaves.
        assert_eq!(outcome.depth_visits, vec![1, 4, 12, 24, 24]);
        assert_eq!(outcome.nodes, 65);
        assert_eq!(board.filled_count(), 0);
    }

    #[test]
    fn node_budget_quits_immediately() {
        let pieces = two_by_two();
        let mut board = Board::new(&pieces, 2, 2, &[]).unwrap();
        let policy = RestartPolicy {
            node_budget: Some(1),
            ..RestartPolicy::default()
        };
        let controller = SearchController::new(
            &mut board,
            FieldSelector::most_constrained(1),
            StallRestart::new(policy),
        );
        let outcome = controller.run();

        assert_eq!(outcome.nodes, 1);
        assert_eq!(outcome.solutions, 0);
        assert_eq!(outcome.best.filled(), 0);
        assert_eq!(board.free_count(), 4);
    }

    #[test]
    fn stall_restart_rewinds_a_bounded_number_of_levels() {
        let policy = RestartPolicy {
            patience: Duration::from_millis(50),
            depth_scale: Duration::ZERO,
            max_backtrack: 4,
            node_budget: None,
            time_budget: None,
        };
        let mut strategy = StallRestart::new(policy);
        let progress = |depth: usize| Progress {
            depth,
            best_depth: depth,
            best_filled: depth,
            nodes: 10,
            solutions: 0,
            restarts: 0,
            elapsed: Duration::ZERO,
        };

        // Fresh depths never stall.
        assert_eq!(strategy.assess(&progress(9)), SearchCommand::Continue);

        strategy.backdate(9, Duration::from_secs(5));
        assert_eq!(strategy.assess(&progress(9)), SearchCommand::Restart(5));

        // Timers beyond the target were reset, so the rewound subtree
        // starts calm.
        assert_eq!(strategy.assess(&progress(6)), SearchCommand::Continue);

        // Depth zero has nothing to rewind, however stale.
        strategy.backdate(0, Duration::from_secs(60));
        assert_eq!(strategy.assess(&progress(0)), SearchCommand::Continue);
    }

    #[test]
    fn budgets_quit_the_run() {
        let policy = RestartPolicy {
            node_budget: Some(5),
            time_budget: Some(Duration::from_secs(1)),
            ..RestartPolicy::default()
        };
        let mut strategy = StallRestart::new(policy);
        let mut progress = Progress {
            depth: 3,
            best_depth: 3,
            best_filled: 3,
            nodes: 4,
            solutions: 0,
            restarts: 0,
            elapsed: Duration::ZERO,
        };
        assert_eq!(strategy.assess(&progress), SearchCommand::Continue);

        progress.nodes = 5;
        assert_eq!(strategy.assess(&progress), SearchCommand::Quit);

        progress.nodes = 4;
        progress.elapsed = Duration::from_secs(2);
        assert_eq!(strategy.assess(&progress), SearchCommand::Quit);
    }

    /// Fires one scripted restart, then quits on the following assess.
    struct ScriptedRestart {
        fire_at: usize,
        target: usize,
        fired: Rc<Cell<bool>>,
        halt_next: bool,
    }

    impl Strategy for ScriptedRestart {
        fn assess(&mut self, progress: &Progress) -> SearchCommand {
            if self.halt_next {
                return SearchCommand::Quit;
            }
            if !self.fired.get() && progress.depth == self.fire_at {
                self.fired.set(true);
                self.halt_next = true;
                return SearchCommand::Restart(self.target);
            }
            SearchCommand::Continue
        }
    }

    #[test]
    fn restart_removes_exactly_depth_minus_target_placements() {
        // Loose palette: plenty of candidates everywhere, so the resume
        // frame immediately places again and freezes the counter.
        let puzzle = generate(6, 6, 3, 1234);
        let mut board = Board::new(&puzzle.set, 6, 6, &[]).unwrap();

        let fired = Rc::new(Cell::new(false));
        let unwind_removes = Rc::new(Cell::new(0u64));
        let frozen = Rc::new(Cell::new(false));

        let armed = Rc::clone(&fired);
        let counter = Rc::clone(&unwind_removes);
        let freeze = Rc::clone(&frozen);
        let mut filled: HashSet<(usize, usize)> = HashSet::new();
        board.set_change_listener(move |x, y| {
            if filled.insert((x, y)) {
                // A placement: the unwind is over once something new
                // lands.
                if armed.get() {
                    freeze.set(true);
                }
            } else {
                filled.remove(&(x, y));
                if armed.get() && !freeze.get() {
                    counter.set(counter.get() + 1);
                }
            }
        });

        let strategy = ScriptedRestart {
            fire_at: 10,
            target: 2,
            fired: Rc::clone(&fired),
            halt_next: false,
        };
        let controller =
            SearchController::new(&mut board, FieldSelector::scanline(5), strategy);
        let outcome = controller.run();

        assert!(fired.get(), "search never reached depth 10");
        assert_eq!(unwind_removes.get(), 8);
        assert_eq!(outcome.restarts, 1);
        // The quit unwound the rest; nothing stays behind.
        assert_eq!(board.filled_count(), 0);
    }

    #[test]
    fn budgeted_search_never_claims_an_impossible_assembly() {
        // Doctor one interior edge of a solvable instance: the color
        // counts turn odd, so no complete assembly can exist, while the
        // border structure stays intact.
        let puzzle = generate(8, 8, 5, 77);
        let mut pieces: Vec<Piece> = puzzle.set.pieces().to_vec();
        let corner_clue = Clue {
            x: 0,
            y: 0,
            placement: puzzle.solution[0],
        };
        let victim = pieces
            .iter()
            .position(|p| p.border_edges() == 0)
            .expect("an 8x8 set has middle pieces");
        let old = pieces[victim].edges[0];
        pieces[victim].edges[0] = if old == 1 { 2 } else { 1 };
        let doctored = PieceSet::new(pieces, Vec::new()).unwrap();

        let mut board = Board::new(&doctored, 8, 8, &[corner_clue]).unwrap();
        let policy = RestartPolicy {
            node_budget: Some(20_000),
            patience: Duration::from_secs(3600),
            ..RestartPolicy::default()
        };
        let controller = SearchController::new(
            &mut board,
            FieldSelector::most_constrained(9),
            StallRestart::new(policy),
        );
        let outcome = controller.run();

        assert_eq!(outcome.solutions, 0);
        assert!(outcome.best.filled() < 64);
        assert!(!outcome.best.is_complete());
        assert!(outcome.nodes <= 20_000);
        // Only the clue remains pinned.
        assert_eq!(board.filled_count(), 1);
        assert_eq!(board.free_count(), 63);
    }

    #[test]
    fn equal_seeds_reproduce_the_same_run() {
        let puzzle = generate(4, 4, 4, 7);
        let run = || {
            let mut board = Board::new(&puzzle.set, 4, 4, &[]).unwrap();
            let policy = RestartPolicy {
                node_budget: Some(2_000),
                ..RestartPolicy::default()
            };
            let controller = SearchController::new(
                &mut board,
                FieldSelector::most_constrained(21).with_candidate_shuffle(),
                StallRestart::new(policy),
            );
            controller.run()
        };
        let a = run();
        let b = run();
        assert_eq!(a.nodes, b.nodes);
        assert_eq!(a.solutions, b.solutions);
        assert_eq!(a.max_depth, b.max_depth);
        assert_eq!(a.depth_visits, b.depth_visits);
        assert_eq!(a.best, b.best);
    }

    #[test]
    fn solves_a_generated_instance() {
        let puzzle = generate(4, 4, 6, 3);
        let mut board = Board::new(&puzzle.set, 4, 4, &[]).unwrap();
        let controller = SearchController::new(
            &mut board,
            FieldSelector::most_constrained(2),
            StallRestart::new(RestartPolicy::default()),
        );
        let outcome = controller.run();
        assert_eq!(outcome.solutions, 1);
        assert!(outcome.best.is_complete());
        assert_eq!(outcome.best.filled(), 16);
    }
}
