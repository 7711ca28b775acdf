//! # Zoom level representation
//!
//! Zoom is stored in log2 space, where +1 doubles the apparent scale.
//! Animation interpolates in log space (constant visual speed); tile-size
//! math exponentiates into linear space. The level is clamped to
//! [`MIN_ZOOM`, `MAX_ZOOM`] at construction, so a `ZoomLevel` is always in
//! range by construction.

pub const MIN_ZOOM: f64 = 2.0;
pub const MAX_ZOOM: f64 = 22.0;

/// A camera zoom level in log2 space, clamped to `[MIN_ZOOM, MAX_ZOOM]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ZoomLevel(f64);

impl ZoomLevel {
    pub fn new(log_zoom: f64) -> Self {
        Self(log_zoom.clamp(MIN_ZOOM, MAX_ZOOM))
    }

    pub fn from_linear(linear: f64) -> Self {
        Self::new(linear.log2())
    }

    pub const fn to_log(self) -> f64 {
        self.0
    }

    pub fn to_linear(self) -> f64 {
        self.0.exp2()
    }

    /// The integer pyramid zoom whose tiles this level displays.
    pub fn tile_zoom(self) -> u8 {
        // In range by construction; the floor of [2, 22] fits u8.
        #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            self.0.floor() as u8
        }
    }

    /// This level shifted by `delta` log units, clamped.
    pub fn offset(self, delta: f64) -> Self {
        Self::new(self.0 + delta)
    }
}

impl Default for ZoomLevel {
    fn default() -> Self {
        Self(MIN_ZOOM)
    }
}
