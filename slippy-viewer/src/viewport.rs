//! # Viewport and zoom state machine
//!
//! Owns the camera: a view-center position in the Web-Mercator unit square,
//! a [`ZoomLevel`], at most one in-flight zoom animation, and the pointer
//! tracking that turns drags and pinches into camera motion.
//!
//! Time is the host's animation clock in seconds; every transition happens
//! inside [`Viewport::tick`] or a gesture call, never spontaneously.

use std::collections::HashMap;

use geo::{Coord, Rect};
use tracing::trace;

use crate::zoom::ZoomLevel;

/// Logical pixel size of one rendered tile.
pub const TILE_LOGICAL_SIZE: f64 = 512.0;

/// Positions clamp just short of 1.0 so tile addressing never wraps at the
/// antimeridian or poles.
pub const MAX_POSITION: f64 = 0.99999;

/// Per-frame geometric step of the snap-zoom animation.
const ZOOM_STEP_RATIO: f64 = 1.1;

/// Shortest pan-and-zoom animation; short hops still ease visibly.
const MIN_ANIMATION_SECS: f64 = 0.5;

const PAN_SECS_PER_WORLD_UNIT: f64 = 3.0;
const ZOOM_SECS_PER_LOG_UNIT: f64 = 0.25;

/// Canvas dimensions in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

/// An in-flight zoom animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoomAnimation {
    /// Snap zoom toward a fixed world-space anchor (wheel or double-tap).
    ZoomInOrOut {
        anchor: Coord<f64>,
        target: ZoomLevel,
    },
    /// Combined pan and zoom to a destination (fit-bounds flight).
    ///
    /// `start_time` stays unset until the first tick, so elapsed-time math
    /// is frame-relative rather than wall-clock-from-call.
    PanAndZoom {
        position_start: Coord<f64>,
        position_end: Coord<f64>,
        zoom_start: ZoomLevel,
        zoom_end: ZoomLevel,
        start_time: Option<f64>,
        duration: f64,
    },
}

/// The camera state machine.
#[derive(Debug, Clone)]
pub struct Viewport {
    position: Coord<f64>,
    zoom: ZoomLevel,
    animation: Option<ZoomAnimation>,
    /// Pointer id → last canvas position, for drag and pinch deltas.
    pointers: HashMap<u64, Coord<f64>>,
    canvas: CanvasSize,
    device_pixel_ratio: f64,
}

impl Viewport {
    pub fn new(canvas: CanvasSize, device_pixel_ratio: f64) -> Self {
        Self {
            position: Coord { x: 0.5, y: 0.5 },
            zoom: ZoomLevel::default(),
            animation: None,
            pointers: HashMap::new(),
            canvas,
            device_pixel_ratio,
        }
    }

    pub fn position(&self) -> Coord<f64> {
        self.position
    }

    pub fn zoom(&self) -> ZoomLevel {
        self.zoom
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    pub fn set_canvas_size(&mut self, canvas: CanvasSize) {
        self.canvas = canvas;
    }

    /// World units per logical pixel at a given zoom.
    fn world_per_pixel(zoom: ZoomLevel) -> f64 {
        1.0 / (TILE_LOGICAL_SIZE * zoom.to_linear())
    }

    /// Converts a canvas position (logical px) to world space.
    pub fn screen_to_world(&self, canvas_pos: Coord<f64>) -> Coord<f64> {
        let wpp = Self::world_per_pixel(self.zoom);
        Coord {
            x: self.position.x + (canvas_pos.x - self.canvas.width / 2.0) * wpp,
            y: self.position.y + (canvas_pos.y - self.canvas.height / 2.0) * wpp,
        }
    }

    /// The world rectangle visible for a hypothetical camera. Used both for
    /// the live view and for an animation's destination.
    pub fn visible_world_rect_at(&self, position: Coord<f64>, zoom: ZoomLevel) -> Rect<f64> {
        let wpp = Self::world_per_pixel(zoom);
        let half_w = self.canvas.width / 2.0 * wpp;
        let half_h = self.canvas.height / 2.0 * wpp;
        Rect::new(
            Coord {
                x: position.x - half_w,
                y: position.y - half_h,
            },
            Coord {
                x: position.x + half_w,
                y: position.y + half_h,
            },
        )
    }

    pub fn visible_world_rect(&self) -> Rect<f64> {
        self.visible_world_rect_at(self.position, self.zoom)
    }

    /// Where the camera is heading: the animation destination if one is in
    /// flight, the live camera otherwise. Tile scheduling targets this, so
    /// tiles are fetched for where the view will settle.
    pub fn scheduling_target(&self) -> (Coord<f64>, ZoomLevel) {
        match self.animation {
            None => (self.position, self.zoom),
            Some(ZoomAnimation::ZoomInOrOut { anchor, target }) => {
                let ratio = target.to_linear() / self.zoom.to_linear();
                (reanchor(self.position, anchor, ratio), target)
            }
            Some(ZoomAnimation::PanAndZoom {
                position_end,
                zoom_end,
                ..
            }) => (position_end, zoom_end),
        }
    }

    /// Jumps the camera immediately, cancelling any animation.
    pub fn with_position_and_zoom(&mut self, position: Coord<f64>, zoom: ZoomLevel) {
        self.animation = None;
        self.position = clamp_position(position);
        self.zoom = zoom;
    }

    /// Starts a snap zoom by `delta` log units, anchored at the view center.
    pub fn animate_zoom(&mut self, delta: f64) {
        self.animate_zoom_at(self.position, delta);
    }

    /// Starts a snap zoom by `delta` log units toward a world-space anchor.
    /// A second call retargets from the current zoom, so repeated wheel
    /// events accumulate.
    pub fn animate_zoom_at(&mut self, anchor: Coord<f64>, delta: f64) {
        let target = self.zoom.offset(delta);
        self.animation = Some(ZoomAnimation::ZoomInOrOut { anchor, target });
    }

    /// Starts a pan-and-zoom flight fitting both points on the canvas with
    /// `padding_px` margin; the more constraining axis picks the zoom.
    pub fn animate_view_bounds(&mut self, padding_px: f64, a: Coord<f64>, b: Coord<f64>) {
        let center = Coord {
            x: f64::midpoint(a.x, b.x),
            y: f64::midpoint(a.y, b.y),
        };
        let span_x = (a.x - b.x).abs().max(f64::EPSILON);
        let span_y = (a.y - b.y).abs().max(f64::EPSILON);
        let avail_w = (self.canvas.width - 2.0 * padding_px).max(1.0);
        let avail_h = (self.canvas.height - 2.0 * padding_px).max(1.0);
        let fit_x = avail_w / (TILE_LOGICAL_SIZE * span_x);
        let fit_y = avail_h / (TILE_LOGICAL_SIZE * span_y);
        let zoom_end = ZoomLevel::from_linear(fit_x.min(fit_y));

        let position_end = clamp_position(center);
        let pan_secs = distance(self.position, position_end) * PAN_SECS_PER_WORLD_UNIT;
        let zoom_secs = (zoom_end.to_log() - self.zoom.to_log()).abs() * ZOOM_SECS_PER_LOG_UNIT;
        let duration = pan_secs.max(zoom_secs).max(MIN_ANIMATION_SECS);

        trace!(?position_end, zoom = zoom_end.to_log(), duration, "fit-bounds flight");
        self.animation = Some(ZoomAnimation::PanAndZoom {
            position_start: self.position,
            position_end,
            zoom_start: self.zoom,
            zoom_end,
            start_time: None,
            duration,
        });
    }

    /// Advances the animation one frame. Returns whether the camera moved.
    pub fn tick(&mut self, now: f64) -> bool {
        let Some(animation) = self.animation else {
            return false;
        };
        match animation {
            ZoomAnimation::ZoomInOrOut { anchor, target } => {
                let current = self.zoom.to_linear();
                let target_lin = target.to_linear();
                let (next_lin, done) = if target_lin > current {
                    let next = current * ZOOM_STEP_RATIO;
                    if next >= target_lin {
                        (target_lin, true)
                    } else {
                        (next, false)
                    }
                } else {
                    let next = current / ZOOM_STEP_RATIO;
                    if next <= target_lin {
                        (target_lin, true)
                    } else {
                        (next, false)
                    }
                };
                self.position = clamp_position(reanchor(self.position, anchor, next_lin / current));
                self.zoom = ZoomLevel::from_linear(next_lin);
                if done {
                    self.animation = None;
                }
            }
            ZoomAnimation::PanAndZoom {
                position_start,
                position_end,
                zoom_start,
                zoom_end,
                start_time,
                duration,
            } => {
                let start = start_time.unwrap_or(now);
                let t = if duration <= 0.0 {
                    1.0
                } else {
                    ((now - start) / duration).clamp(0.0, 1.0)
                };
                let z0 = zoom_start.to_log();
                let z1 = zoom_end.to_log();
                self.zoom = ZoomLevel::new(z0 + (z1 - z0) * t);
                // Eased pan fraction: moves fastest while still zoomed out
                // and settles exactly at the destination.
                let t2 = 1.0 - ((z0 - z1) * t).exp2() * (1.0 - t);
                self.position = clamp_position(Coord {
                    x: position_start.x + (position_end.x - position_start.x) * t2,
                    y: position_start.y + (position_end.y - position_start.y) * t2,
                });
                if t >= 1.0 {
                    self.position = clamp_position(position_end);
                    self.zoom = zoom_end;
                    self.animation = None;
                } else {
                    self.animation = Some(ZoomAnimation::PanAndZoom {
                        position_start,
                        position_end,
                        zoom_start,
                        zoom_end,
                        start_time: Some(start),
                        duration,
                    });
                }
            }
        }
        true
    }

    pub fn pointer_down(&mut self, id: u64, canvas_pos: Coord<f64>) {
        self.pointers.insert(id, canvas_pos);
    }

    pub fn pointer_up(&mut self, id: u64) {
        self.pointers.remove(&id);
    }

    /// Applies a pointer movement: a single pointer drags the map, two
    /// pointers pinch-zoom. Returns whether the camera moved.
    pub fn pointer_move(&mut self, id: u64, canvas_pos: Coord<f64>) -> bool {
        let Some(prev) = self.pointers.get(&id).copied() else {
            return false;
        };
        let moved = match self.pointers.len() {
            1 => {
                self.animation = None;
                let wpp = Self::world_per_pixel(self.zoom);
                self.position = clamp_position(Coord {
                    x: self.position.x - (canvas_pos.x - prev.x) * wpp,
                    y: self.position.y - (canvas_pos.y - prev.y) * wpp,
                });
                true
            }
            2 => {
                let other = self
                    .pointers
                    .iter()
                    .find_map(|(k, v)| (*k != id).then_some(*v));
                match other {
                    Some(other) => {
                        self.apply_pinch(prev, canvas_pos, other);
                        true
                    }
                    None => false,
                }
            }
            _ => false,
        };
        self.pointers.insert(id, canvas_pos);
        moved
    }

    /// Pinch algebra: the centroid shift pans, the distance ratio feeds the
    /// same anchored-zoom math as wheel zoom.
    fn apply_pinch(&mut self, prev: Coord<f64>, current: Coord<f64>, other: Coord<f64>) {
        self.animation = None;
        let old_dist = distance(prev, other).max(f64::EPSILON);
        let new_dist = distance(current, other).max(f64::EPSILON);

        let wpp = Self::world_per_pixel(self.zoom);
        let centroid_dx = f64::midpoint(current.x, other.x) - f64::midpoint(prev.x, other.x);
        let centroid_dy = f64::midpoint(current.y, other.y) - f64::midpoint(prev.y, other.y);
        self.position = clamp_position(Coord {
            x: self.position.x - centroid_dx * wpp,
            y: self.position.y - centroid_dy * wpp,
        });

        let centroid = Coord {
            x: f64::midpoint(current.x, other.x),
            y: f64::midpoint(current.y, other.y),
        };
        let anchor = self.screen_to_world(centroid);
        self.zoom_by_at(anchor, (new_dist / old_dist).log2());
    }

    /// Immediate anchored zoom (no animation); used by pinch.
    fn zoom_by_at(&mut self, anchor: Coord<f64>, delta_log: f64) {
        let old_linear = self.zoom.to_linear();
        self.zoom = self.zoom.offset(delta_log);
        let ratio = self.zoom.to_linear() / old_linear;
        self.position = clamp_position(reanchor(self.position, anchor, ratio));
    }
}

/// The zoom-toward-cursor algebra: scaling the view by `ratio` about
/// `anchor` moves the camera center toward (or away from) the anchor.
fn reanchor(position: Coord<f64>, anchor: Coord<f64>, ratio: f64) -> Coord<f64> {
    Coord {
        x: anchor.x + (position.x - anchor.x) / ratio,
        y: anchor.y + (position.y - anchor.y) / ratio,
    }
}

fn clamp_position(position: Coord<f64>) -> Coord<f64> {
    Coord {
        x: position.x.clamp(0.0, MAX_POSITION),
        y: position.y.clamp(0.0, MAX_POSITION),
    }
}

fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}
