//! # Tile cache and load scheduler
//!
//! Maps grid cells to their pipeline state and decides which missing tiles
//! to request. Decode and label work is rate-limited to one tile per tick
//! so a burst of completed fetches never stalls a frame.

use std::collections::HashMap;

use itertools::Itertools;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use slippy_mvt::{StyleConfig, Tile, decode_tile};
use tracing::{debug, trace, warn};

use crate::fetch::FetchResult;
use crate::grid::{GridBounds, GridPoint};
use crate::label::{self, FontMetrics, LabelConfig, PlacedFootprints, TileWithLabels};

/// The low-detail layer that is always kept cached as a backdrop while
/// higher-zoom tiles load.
pub const FALLBACK_ZOOM: u8 = 6;

/// Maximum number of cached tiles that are neither fallback nor currently
/// visible. Tiles beyond the cap are evicted by seeded random sampling.
pub const OTHER_TILE_CAP: usize = 100;

/// Lifecycle state of one cached tile.
///
/// `Loading` → `LoadedRaw`/`Error` on fetch completion; `LoadedRaw` →
/// `Decoded`/`Error` on decode; `Decoded` → `Decorated` once a font is
/// available. An errored tile stays errored until evicted.
#[derive(Debug, Clone, PartialEq)]
pub enum TileState {
    Loading,
    LoadedRaw(Vec<u8>),
    Decoded(Box<Tile>),
    Decorated(Box<TileWithLabels>),
    Error,
}

/// The grid-keyed tile store. Owned exclusively by one viewer; every
/// mutation flows through these operations.
#[derive(Debug, Default)]
pub struct TileCache {
    tiles: HashMap<GridPoint, TileState>,
}

impl TileCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, grid: GridPoint) -> Option<&TileState> {
        self.tiles.get(&grid)
    }

    /// Seeds a cache entry directly. Normal operation only inserts through
    /// [`TileCache::schedule`]; this exists for hosts restoring state.
    pub fn insert(&mut self, grid: GridPoint, state: TileState) {
        self.tiles.insert(grid, state);
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Marks every missing cell of `bounds` `Loading` and returns the cells
    /// to fetch, in dispatch order. Run [`TileCache::evict_beyond_cap`] once
    /// per scheduling pass first; `schedule` itself never evicts, so a pass
    /// may schedule several layers without re-partitioning the cache.
    ///
    /// The list is sorted by Manhattan distance from the bounds midpoint,
    /// farthest first: the nearest tiles are dispatched last and so win any
    /// fetch-concurrency race downstream. Callers must preserve the order.
    pub fn schedule(&mut self, bounds: GridBounds) -> Vec<GridPoint> {
        let (mid_x, mid_y) = bounds.midpoint();
        let center_distance = |cell: &GridPoint| {
            (f64::from(cell.x) - mid_x).abs() + (f64::from(cell.y) - mid_y).abs()
        };
        let missing: Vec<GridPoint> = bounds
            .cells()
            .filter(|cell| !self.tiles.contains_key(cell))
            .sorted_by(|a, b| {
                center_distance(b)
                    .total_cmp(&center_distance(a))
                    .then_with(|| a.cmp(b))
            })
            .collect();

        for cell in &missing {
            self.tiles.insert(*cell, TileState::Loading);
        }
        if !missing.is_empty() {
            debug!(count = missing.len(), zoom = bounds.zoom(), "dispatching tile fetches");
        }
        missing
    }

    /// Partitions cached tiles into priority (fallback layer, or inside
    /// `bounds` — the visible box at the exact target zoom) and other, and
    /// samples the other bucket down to the cap. The seed derives from the
    /// view corner, so a static viewport evicts reproducibly.
    pub fn evict_beyond_cap(&mut self, bounds: GridBounds) {
        let mut other: Vec<GridPoint> = self
            .tiles
            .keys()
            .copied()
            .filter(|grid| grid.zoom != FALLBACK_ZOOM && !bounds.contains(*grid))
            .sorted()
            .collect();
        if other.len() <= OTHER_TILE_CAP {
            return;
        }

        let seed = u64::from(bounds.top_left.x.unsigned_abs());
        let mut rng = StdRng::seed_from_u64(seed);
        other.shuffle(&mut rng);
        for evicted in other.drain(OTHER_TILE_CAP..) {
            self.tiles.remove(&evicted);
        }
        trace!(retained = OTHER_TILE_CAP, "capped off-screen tile cache");
    }

    /// Routes a fetch outcome to its tile. Completions for tiles that are
    /// not waiting (evicted, or already past `Loading`) are ignored.
    pub fn fetch_completed(&mut self, grid: GridPoint, result: FetchResult) {
        match self.tiles.get_mut(&grid) {
            Some(state @ TileState::Loading) => {
                *state = match result {
                    Ok(bytes) => TileState::LoadedRaw(bytes),
                    Err(error) => {
                        warn!(tile = %grid, %error, "tile fetch failed");
                        TileState::Error
                    }
                };
            }
            Some(_) => debug!(tile = %grid, "ignoring stale fetch completion"),
            None => debug!(tile = %grid, "ignoring fetch completion for evicted tile"),
        }
    }

    /// Decodes at most one raw tile, chosen arbitrarily among those ready.
    /// Returns whether any work was done.
    pub fn decode_one(&mut self, style: &StyleConfig) -> bool {
        let Some(grid) = self
            .tiles
            .iter()
            .find_map(|(grid, state)| matches!(state, TileState::LoadedRaw(_)).then_some(*grid))
        else {
            return false;
        };
        let Some(TileState::LoadedRaw(bytes)) = self.tiles.remove(&grid) else {
            return false;
        };
        let state = match decode_tile(&bytes, grid.zoom, style) {
            Ok(tile) => TileState::Decoded(Box::new(tile)),
            Err(error) => {
                warn!(tile = %grid, %error, "tile decode failed");
                TileState::Error
            }
        };
        self.tiles.insert(grid, state);
        true
    }

    /// Promotes at most one decoded tile to decorated, using the footprints
    /// of already-decorated neighbors as obstacles. Returns whether any work
    /// was done.
    pub fn decorate_one(&mut self, font: &FontMetrics, config: &LabelConfig) -> bool {
        let Some(grid) = self
            .tiles
            .iter()
            .find_map(|(grid, state)| matches!(state, TileState::Decoded(_)).then_some(*grid))
        else {
            return false;
        };

        let neighbor_footprints: Vec<PlacedFootprints> = grid
            .neighbors()
            .iter()
            .filter_map(|n| match self.tiles.get(n) {
                Some(TileState::Decorated(t)) => Some(t.footprints.clone()),
                _ => None,
            })
            .collect();
        let obstacle_refs: Vec<&PlacedFootprints> = neighbor_footprints.iter().collect();

        let Some(TileState::Decoded(tile)) = self.tiles.remove(&grid) else {
            return false;
        };
        let decorated = label::decorate(*tile, grid, &obstacle_refs, font, config);
        self.tiles
            .insert(grid, TileState::Decorated(Box::new(decorated)));
        true
    }
}
