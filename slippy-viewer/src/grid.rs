//! # Tile grid addressing
//!
//! The world is a unit square tiled by a power-of-two pyramid: zoom `z` has
//! `2^z × 2^z` tiles and `(0, 0)` is the north-west corner. A [`GridPoint`]
//! is one cell of that pyramid and doubles as the cache key.

use std::fmt;

use geo::{Coord, Rect};

/// Integer tile address in the tile pyramid.
///
/// Off-range coordinates are legal as transient computation artifacts (the
/// viewport math can land outside the pyramid before clamping); only clamped
/// points are ever fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridPoint {
    pub x: i32,
    pub y: i32,
    pub zoom: u8,
}

impl GridPoint {
    pub const fn new(x: i32, y: i32, zoom: u8) -> Self {
        Self { x, y, zoom }
    }

    /// The tile's world-space rectangle; `(0, 0, z)` maps to `[0, 2⁻ᶻ]²`.
    pub fn world_rect(self) -> Rect<f64> {
        let span = 0.5f64.powi(i32::from(self.zoom));
        let min = Coord {
            x: f64::from(self.x) * span,
            y: f64::from(self.y) * span,
        };
        let max = Coord {
            x: f64::from(self.x + 1) * span,
            y: f64::from(self.y + 1) * span,
        };
        Rect::new(min, max)
    }

    /// The tile containing a world-space position at the given zoom.
    pub fn from_world(position: Coord<f64>, zoom: u8) -> Self {
        let scale = f64::from(1u32 << zoom.min(22));
        #[expect(clippy::cast_possible_truncation)]
        Self {
            x: (position.x * scale).floor() as i32,
            y: (position.y * scale).floor() as i32,
            zoom,
        }
    }

    /// Clamps the coordinates into the pyramid, `[0, 2ᶻ - 1]`.
    pub fn clamped(self) -> Self {
        #[expect(clippy::cast_possible_wrap)]
        let max = (1u32 << u32::from(self.zoom.min(22))) as i32 - 1;
        Self {
            x: self.x.clamp(0, max),
            y: self.y.clamp(0, max),
            zoom: self.zoom,
        }
    }

    /// The 8 surrounding cells at the same zoom, unclamped. Cells outside
    /// the pyramid simply never have cache entries.
    pub fn neighbors(self) -> [GridPoint; 8] {
        let Self { x, y, zoom } = self;
        [
            Self::new(x - 1, y - 1, zoom),
            Self::new(x, y - 1, zoom),
            Self::new(x + 1, y - 1, zoom),
            Self::new(x - 1, y, zoom),
            Self::new(x + 1, y, zoom),
            Self::new(x - 1, y + 1, zoom),
            Self::new(x, y + 1, zoom),
            Self::new(x + 1, y + 1, zoom),
        ]
    }
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// An inclusive axis-aligned range of grid cells at one zoom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridBounds {
    pub top_left: GridPoint,
    pub bottom_right: GridPoint,
}

impl GridBounds {
    /// The cells covering a world-space rectangle at `zoom`, clamped to the
    /// pyramid.
    pub fn covering(world: Rect<f64>, zoom: u8) -> Self {
        let top_left = GridPoint::from_world(world.min(), zoom).clamped();
        let bottom_right = GridPoint::from_world(world.max(), zoom).clamped();
        Self {
            top_left,
            bottom_right,
        }
    }

    pub fn zoom(&self) -> u8 {
        self.top_left.zoom
    }

    pub fn contains(&self, point: GridPoint) -> bool {
        point.zoom == self.zoom()
            && (self.top_left.x..=self.bottom_right.x).contains(&point.x)
            && (self.top_left.y..=self.bottom_right.y).contains(&point.y)
    }

    /// Center of the bounds in (fractional) grid coordinates.
    pub fn midpoint(&self) -> (f64, f64) {
        (
            f64::midpoint(f64::from(self.top_left.x), f64::from(self.bottom_right.x)),
            f64::midpoint(f64::from(self.top_left.y), f64::from(self.bottom_right.y)),
        )
    }

    /// Iterates every cell in the bounds, row-major.
    pub fn cells(&self) -> impl Iterator<Item = GridPoint> + use<> {
        let zoom = self.zoom();
        let xs = self.top_left.x..=self.bottom_right.x;
        let ys = self.top_left.y..=self.bottom_right.y;
        ys.flat_map(move |y| xs.clone().map(move |x| GridPoint::new(x, y, zoom)))
    }
}
