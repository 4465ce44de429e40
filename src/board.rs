use crate::bits::PieceBits;
use crate::candidates::CandidateIndex;
use crate::error::{Result, SolverError};
use crate::piece::{
    Clue, Color, Direction, Piece, PieceId, PieceSet, Placement, BORDER, DIRECTIONS,
};
use crate::sig;
use crate::tracker::SignatureTracker;

/// What one cell knows: the placement sitting on it, if any, and the
/// edge colors its surroundings require per direction. A direction is
/// defined when the neighbor there is placed or off the board; border
/// directions always require [`BORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellState {
    placed: Option<Placement>,
    required: [Color; 4],
    defined: u8,
}

impl CellState {
    pub fn placement(&self) -> Option<Placement> {
        self.placed
    }

    pub fn is_empty(&self) -> bool {
        self.placed.is_none()
    }

    /// Required color towards `dir`, or `None` while that side is
    /// unconstrained.
    #[inline(always)]
    pub fn required(&self, dir: Direction) -> Option<Color> {
        if self.defined & (1 << dir.index()) != 0 {
            Some(self.required[dir.index()])
        } else {
            None
        }
    }

    pub fn defined_mask(&self) -> u8 {
        self.defined
    }

    pub fn defined_count(&self) -> u32 {
        self.defined.count_ones()
    }

    pub(crate) fn required_colors(&self) -> [Option<Color>; 4] {
        [
            self.required(Direction::North),
            self.required(Direction::East),
            self.required(Direction::South),
            self.required(Direction::West),
        ]
    }
}

pub type ChangeListener = Box<dyn FnMut(usize, usize)>;

/// The mutable assembly: a rectangular grid of cells plus the free bag,
/// with the signature tracker and candidate index kept in lockstep.
///
/// `place` is all or nothing. It refuses a piece that mismatches a
/// defined direction or would point a border edge into the board, and
/// it reverts itself completely when the feasibility counters report
/// that some signature went negative. `remove` must mirror placements
/// in reverse order; the depth-first search guarantees that by undoing
/// on its way out of each frame.
pub struct Board<'a> {
    pieces: &'a PieceSet,
    width: usize,
    height: usize,
    cells: Vec<CellState>,
    tracker: SignatureTracker,
    index: CandidateIndex,
    free: PieceBits,
    free_count: usize,
    filled_count: usize,
    on_change: Option<ChangeListener>,
}

impl<'a> Board<'a> {
    /// Builds an empty board, seeds border demands and the full supply,
    /// then pins the clues. Fails when the piece count cannot fill the
    /// grid, when the border demand already exceeds supply, or when a
    /// clue does not fit.
    pub fn new(
        pieces: &'a PieceSet,
        width: usize,
        height: usize,
        clues: &[Clue],
    ) -> Result<Board<'a>> {
        if width == 0 || height == 0 {
            return Err(SolverError::InvalidPieceSet {
                reason: format!("degenerate {width}x{height} board"),
            });
        }
        if pieces.len() != width * height {
            return Err(SolverError::InvalidPieceSet {
                reason: format!(
                    "{} pieces cannot fill a {width}x{height} board",
                    pieces.len()
                ),
            });
        }
        let mut board = Board {
            pieces,
            width,
            height,
            cells: vec![CellState::default(); width * height],
            tracker: SignatureTracker::new(),
            index: CandidateIndex::new(pieces.len()),
            free: PieceBits::with_capacity(pieces.len()),
            free_count: pieces.len(),
            filled_count: 0,
            on_change: None,
        };
        for piece in pieces.pieces() {
            board.tracker.add_supply(piece.edges);
            board.index.insert(piece);
            board.free.insert(piece.id as usize);
        }
        let mut starved = false;
        for y in 0..height {
            for x in 0..width {
                let i = board.cell_index(x, y);
                let (required, defined) = board.derive_required(x, y);
                board.cells[i].required = required;
                board.cells[i].defined = defined;
                let colors = board.cells[i].required_colors();
                starved |= board.tracker.add_demand(colors);
            }
        }
        if starved {
            return Err(SolverError::InvalidPieceSet {
                reason: "border demand exceeds the supply of border edges".to_string(),
            });
        }
        for clue in clues {
            board.apply_clue(clue)?;
        }
        Ok(board)
    }

    fn apply_clue(&mut self, clue: &Clue) -> Result<()> {
        let reject = |reason: String| SolverError::BadClue {
            x: clue.x,
            y: clue.y,
            reason,
        };
        if clue.x >= self.width || clue.y >= self.height {
            return Err(reject(format!(
                "outside the {}x{} board",
                self.width, self.height
            )));
        }
        if clue.placement.piece as usize >= self.pieces.len() {
            return Err(reject(format!("unknown piece {}", clue.placement.piece)));
        }
        let i = self.cell_index(clue.x, clue.y);
        if self.cells[i].placed.is_some() {
            return Err(reject("cell already clued".to_string()));
        }
        if !self.free.contains(clue.placement.piece as usize) {
            return Err(reject(format!(
                "piece {} already used by an earlier clue",
                clue.placement.piece
            )));
        }
        if !self.place(clue.x, clue.y, clue.placement.piece, clue.placement.rotation) {
            return Err(reject(format!(
                "piece {} rotation {} does not fit there",
                clue.placement.piece, clue.placement.rotation
            )));
        }
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn piece_set(&self) -> &'a PieceSet {
        self.pieces
    }

    pub fn free_count(&self) -> usize {
        self.free_count
    }

    pub fn filled_count(&self) -> usize {
        self.filled_count
    }

    pub fn cell(&self, x: usize, y: usize) -> &CellState {
        &self.cells[self.cell_index(x, y)]
    }

    pub fn cell_at(&self, x: usize, y: usize) -> Option<Placement> {
        self.cells[self.cell_index(x, y)].placed
    }

    /// Shown edge colors of the placement at `(x, y)`, if any.
    pub fn rotated_edges(&self, x: usize, y: usize) -> Option<[Color; 4]> {
        self.cells[self.cell_index(x, y)]
            .placed
            .map(|p| self.pieces.piece(p.piece).rotated_edges(p.rotation))
    }

    pub fn is_border(&self, x: usize, y: usize) -> bool {
        self.border_distance(x, y) == 0
    }

    pub fn is_corner(&self, x: usize, y: usize) -> bool {
        self.corner_distance(x, y) == 0
    }

    /// Steps from the nearest board edge; 0 on the rim.
    pub fn border_distance(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        x.min(y)
            .min(self.width - 1 - x)
            .min(self.height - 1 - y)
    }

    /// Chebyshev steps from the nearest corner.
    pub fn corner_distance(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        let dx = x.min(self.width - 1 - x);
        let dy = y.min(self.height - 1 - y);
        dx.max(dy)
    }

    /// The listener fires after every committed place or remove with the
    /// affected coordinates. Rejected placements never fire it.
    pub fn set_change_listener(&mut self, listener: impl FnMut(usize, usize) + 'static) {
        self.on_change = Some(Box::new(listener));
    }

    pub fn clear_change_listener(&mut self) {
        self.on_change = None;
    }

    /// Attempts to put `piece` on the empty cell `(x, y)`. Returns false
    /// and leaves every structure untouched when the piece mismatches a
    /// defined direction, would aim a border edge into the board, or
    /// would starve some signature of supply.
    ///
    /// Placing onto an occupied cell or placing a piece that is not free
    /// is a caller bug and panics.
    pub fn place(&mut self, x: usize, y: usize, piece: PieceId, rotation: u8) -> bool {
        let i = self.cell_index(x, y);
        assert!(
            self.cells[i].placed.is_none(),
            "place on occupied cell ({x}, {y})"
        );
        assert!(
            self.free.contains(piece as usize),
            "piece {piece} is not in the free bag"
        );
        let rotation = rotation & 3;
        let tile = self.pieces.piece(piece);
        if !self.fits(i, tile.rotated_edges(rotation)) {
            return false;
        }

        let before = self.cells[i];
        self.tracker.remove_demand(before.required_colors());
        let mut starved = self.tracker.remove_supply(tile.edges);
        self.index.remove(tile);
        self.free.remove(piece as usize);
        self.free_count -= 1;
        self.cells[i].placed = Some(Placement { piece, rotation });
        self.filled_count += 1;
        starved |= self.refresh_neighbor_demands(x, y);

        if starved {
            // Undo in reverse order; the board must read as if nothing
            // happened.
            self.cells[i] = before;
            self.filled_count -= 1;
            self.refresh_neighbor_demands(x, y);
            self.free.insert(piece as usize);
            self.free_count += 1;
            self.index.insert(tile);
            self.tracker.add_supply(tile.edges);
            self.tracker.add_demand(before.required_colors());
            return false;
        }
        self.notify(x, y);
        true
    }

    /// Takes the placement off `(x, y)` and returns the piece to the
    /// free bag. Removing from an empty cell is a caller bug and panics.
    pub fn remove(&mut self, x: usize, y: usize) {
        let i = self.cell_index(x, y);
        let placement = match self.cells[i].placed {
            Some(placement) => placement,
            None => panic!("remove on empty cell ({x}, {y})"),
        };
        let tile = self.pieces.piece(placement.piece);
        self.cells[i].placed = None;
        self.filled_count -= 1;
        let (required, defined) = self.derive_required(x, y);
        self.cells[i].required = required;
        self.cells[i].defined = defined;
        self.tracker.add_supply(tile.edges);
        self.index.insert(tile);
        self.free.insert(placement.piece as usize);
        self.free_count += 1;
        let colors = self.cells[i].required_colors();
        let starved = self.tracker.add_demand(colors);
        debug_assert!(!starved, "removal relaxes constraints");
        self.refresh_neighbor_demands(x, y);
        self.notify(x, y);
    }

    /// Every free piece and rotation that would pass `place` on the
    /// empty cell `(x, y)`, in ascending piece id and rotation order.
    /// Rotations showing the same four colors are reported once.
    /// Occupied cells have no candidates.
    pub fn candidates_at(&self, x: usize, y: usize) -> Vec<Placement> {
        let i = self.cell_index(x, y);
        if self.cells[i].placed.is_some() {
            return Vec::new();
        }
        let colors = self.cells[i].required_colors();
        let mut found = Vec::new();
        match sig::most_specific_key(colors) {
            Some(key) => {
                if let Some(bucket) = self.index.bucket_by_key(key) {
                    for id in bucket.iter() {
                        self.collect_rotations(i, id as PieceId, &mut found);
                    }
                }
            }
            // A fully unconstrained cell can only fall back to the bag.
            None => {
                for id in self.free.iter() {
                    self.collect_rotations(i, id as PieceId, &mut found);
                }
            }
        }
        found
    }

    fn collect_rotations(&self, i: usize, id: PieceId, found: &mut Vec<Placement>) {
        let tile = self.pieces.piece(id);
        let mut seen = [[0 as Color; 4]; 4];
        let mut seen_count = 0;
        for rotation in 0..4u8 {
            let shown = tile.rotated_edges(rotation);
            if seen[..seen_count].contains(&shown) {
                continue;
            }
            seen[seen_count] = shown;
            seen_count += 1;
            if self.fits(i, shown) {
                found.push(Placement {
                    piece: id,
                    rotation,
                });
            }
        }
    }

    /// Local compatibility: defined directions must match exactly and a
    /// border edge may only face off the board.
    fn fits(&self, i: usize, shown: [Color; 4]) -> bool {
        let cell = &self.cells[i];
        for dir in DIRECTIONS {
            let color = shown[dir.index()];
            match cell.required(dir) {
                Some(required) => {
                    if color != required {
                        return false;
                    }
                }
                None => {
                    if color == BORDER {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Recomputes the demand of every empty neighbor of `(x, y)` from
    /// scratch. Returns true when some signature went negative.
    fn refresh_neighbor_demands(&mut self, x: usize, y: usize) -> bool {
        let mut starved = false;
        for dir in DIRECTIONS {
            let Some((nx, ny)) = self.neighbor(x, y, dir) else {
                continue;
            };
            let ni = self.cell_index(nx, ny);
            if self.cells[ni].placed.is_some() {
                continue;
            }
            let old = self.cells[ni].required_colors();
            self.tracker.remove_demand(old);
            let (required, defined) = self.derive_required(nx, ny);
            self.cells[ni].required = required;
            self.cells[ni].defined = defined;
            let new = self.cells[ni].required_colors();
            starved |= self.tracker.add_demand(new);
        }
        starved
    }

    /// Required colors of `(x, y)` read fresh from its surroundings:
    /// border color off the board, the facing edge of any placed
    /// neighbor, undefined otherwise.
    fn derive_required(&self, x: usize, y: usize) -> ([Color; 4], u8) {
        let mut required = [BORDER; 4];
        let mut defined = 0u8;
        for dir in DIRECTIONS {
            match self.neighbor(x, y, dir) {
                None => {
                    defined |= 1 << dir.index();
                }
                Some((nx, ny)) => {
                    let cell = &self.cells[self.cell_index(nx, ny)];
                    if let Some(placement) = cell.placed {
                        let piece = self.pieces.piece(placement.piece);
                        required[dir.index()] =
                            piece.edge_at(dir.opposite(), placement.rotation);
                        defined |= 1 << dir.index();
                    }
                }
            }
        }
        (required, defined)
    }

    fn neighbor(&self, x: usize, y: usize, dir: Direction) -> Option<(usize, usize)> {
        let (dx, dy) = dir.step();
        let nx = x as isize + dx;
        let ny = y as isize + dy;
        if nx < 0 || ny < 0 || nx >= self.width as isize || ny >= self.height as isize {
            None
        } else {
            Some((nx as usize, ny as usize))
        }
    }

    #[inline(always)]
    fn cell_index(&self, x: usize, y: usize) -> usize {
        assert!(
            x < self.width && y < self.height,
            "cell ({x}, {y}) outside the {}x{} board",
            self.width,
            self.height
        );
        y * self.width + x
    }

    fn notify(&mut self, x: usize, y: usize) {
        if let Some(listener) = self.on_change.as_mut() {
            listener(x, y);
        }
    }
}

/// Cheap copy of the placements alone, for keeping the best partial
/// assembly or a finished solution after the board has moved on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    width: usize,
    height: usize,
    cells: Vec<Option<Placement>>,
    filled: usize,
}

impl Snapshot {
    pub fn of(board: &Board<'_>) -> Snapshot {
        Snapshot {
            width: board.width,
            height: board.height,
            cells: board.cells.iter().map(|c| c.placed).collect(),
            filled: board.filled_count,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn filled(&self) -> usize {
        self.filled
    }

    pub fn is_complete(&self) -> bool {
        self.filled == self.cells.len()
    }

    pub fn cell_at(&self, x: usize, y: usize) -> Option<Placement> {
        assert!(x < self.width && y < self.height);
        self.cells[y * self.width + x]
    }
}
