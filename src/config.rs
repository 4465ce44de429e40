//! Tuning knobs shared by the restart policy defaults and the demo binary.

pub const DEFAULT_PATIENCE_MS: u64 = 2_000;
pub const DEFAULT_DEPTH_SCALE_MS: u64 = 50;
pub const DEFAULT_MAX_BACKTRACK: usize = 8;

// pub const DEFAULT_NODE_BUDGET: u64 = 50_000_000_000;
pub const DEFAULT_NODE_BUDGET: u64 = 500_000_000;

/// Assemblies within this many tiles of full are worth writing out.
pub const SAVE_MARGIN: usize = 4;

pub const DEMO_WIDTH: usize = 16;
pub const DEMO_HEIGHT: usize = 16;
pub const DEMO_COLORS: u8 = 22;
pub const DEMO_SEED: u64 = 20_240_216;
