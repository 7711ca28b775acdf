//! # slippy-viewer
//!
//! The interactive core of a slippy-map viewer: tile addressing and
//! caching, fetch scheduling, the viewport/zoom state machine, and label
//! placement, composed into a [`Viewer`] the host drives one frame at a
//! time.
//!
//! The viewer performs no I/O and owns no clock. Each [`Viewer::tick`]
//! returns [`Effect`]s for the host to execute (start a tile transfer,
//! schedule a delayed callback); fetch outcomes and timer firings come back
//! through [`Viewer::fetch_completed`] and [`Viewer::debounce_fired`]. All
//! state transitions happen inside these calls, so the viewer is
//! single-threaded by construction.

pub mod cache;
pub mod fetch;
pub mod grid;
pub mod label;
pub mod viewport;
pub mod zoom;

pub use cache::{FALLBACK_ZOOM, TileCache, TileState};
pub use fetch::{FetchError, FetchResult};
pub use grid::{GridBounds, GridPoint};
pub use label::{FontMetrics, GlyphMetrics, LabelConfig, TileWithLabels};
pub use viewport::{CanvasSize, Viewport, ZoomAnimation};
pub use zoom::ZoomLevel;

use geo::Coord;
use slippy_mvt::StyleConfig;
use tracing::debug;

/// Quiescence window after the last viewport gesture before a scheduling
/// pass runs, in seconds.
pub const DEBOUNCE_DELAY: f64 = 0.3;

/// Work the host must perform on the viewer's behalf.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    /// Start a tile transfer; route the outcome back through
    /// [`Viewer::fetch_completed`] with the same grid point.
    Fetch(GridPoint),
    /// Call [`Viewer::debounce_fired`] with this token after `delay`
    /// seconds. Superseded tokens are no-ops.
    ScheduleDebounce { token: u64, delay: f64 },
}

/// The composed viewer: viewport, tile cache, and label engine.
#[derive(Debug)]
pub struct Viewer {
    viewport: Viewport,
    cache: TileCache,
    style: StyleConfig,
    label_config: LabelConfig,
    font: Option<FontMetrics>,
    debounce_counter: u64,
    scheduling_pending: bool,
    needs_render: bool,
}

impl Viewer {
    pub fn new(
        canvas: CanvasSize,
        device_pixel_ratio: f64,
        style: StyleConfig,
        label_config: LabelConfig,
    ) -> Self {
        Self {
            viewport: Viewport::new(canvas, device_pixel_ratio),
            cache: TileCache::new(),
            style,
            label_config,
            font: None,
            debounce_counter: 0,
            // The first tick schedules without waiting for a gesture.
            scheduling_pending: true,
            needs_render: true,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    /// Whether a scheduling pass will run on the next tick.
    pub fn scheduling_pending(&self) -> bool {
        self.scheduling_pending
    }

    /// Installs the glyph table. Until this is called, decoded tiles wait
    /// un-decorated; afterwards they are promoted one per tick.
    pub fn set_font(&mut self, font: FontMetrics) {
        self.font = Some(font);
        self.needs_render = true;
    }

    /// Advances the pipeline one frame: animation step, at most one pending
    /// scheduling pass, one tile decode, and one label promotion.
    pub fn tick(&mut self, now: f64) -> Vec<Effect> {
        let mut effects = Vec::new();

        if self.viewport.tick(now) {
            self.needs_render = true;
        }

        if self.scheduling_pending {
            self.scheduling_pending = false;
            self.run_scheduling_pass(&mut effects);
        }

        if self.cache.decode_one(&self.style) {
            self.needs_render = true;
        }
        if let Some(font) = &self.font
            && self.cache.decorate_one(font, &self.label_config)
        {
            self.needs_render = true;
        }

        effects
    }

    /// One pass of the load scheduler, targeted at where the camera is
    /// heading. The low-detail fallback layer is kept populated underneath
    /// the target zoom.
    fn run_scheduling_pass(&mut self, effects: &mut Vec<Effect>) {
        let (position, zoom) = self.viewport.scheduling_target();
        let world = self.viewport.visible_world_rect_at(position, zoom);
        let tile_zoom = zoom.tile_zoom();
        let bounds = GridBounds::covering(world, tile_zoom);

        // One eviction per pass, with the target-zoom bounds as the priority
        // box; scheduling the fallback layer must not demote visible tiles.
        self.cache.evict_beyond_cap(bounds);

        if tile_zoom > FALLBACK_ZOOM {
            let fallback = GridBounds::covering(world, FALLBACK_ZOOM);
            effects.extend(self.cache.schedule(fallback).into_iter().map(Effect::Fetch));
        }
        effects.extend(self.cache.schedule(bounds).into_iter().map(Effect::Fetch));
    }

    /// Routes a completed tile transfer into the cache.
    pub fn fetch_completed(&mut self, grid: GridPoint, result: FetchResult) {
        self.cache.fetch_completed(grid, result);
        self.needs_render = true;
    }

    /// A debounce timer fired. Only the most recently scheduled token
    /// triggers a scheduling pass; earlier ones were superseded by later
    /// gestures.
    pub fn debounce_fired(&mut self, token: u64) {
        if token == self.debounce_counter {
            self.scheduling_pending = true;
        } else {
            debug!(token, latest = self.debounce_counter, "superseded debounce ignored");
        }
    }

    fn bump_debounce(&mut self) -> Effect {
        self.debounce_counter += 1;
        Effect::ScheduleDebounce {
            token: self.debounce_counter,
            delay: DEBOUNCE_DELAY,
        }
    }

    /// True once since the last call if anything visible changed.
    pub fn take_needs_render(&mut self) -> bool {
        std::mem::take(&mut self.needs_render)
    }

    pub fn pointer_down(&mut self, id: u64, canvas_pos: Coord<f64>) {
        self.viewport.pointer_down(id, canvas_pos);
    }

    pub fn pointer_up(&mut self, id: u64) {
        self.viewport.pointer_up(id);
    }

    /// Drag or pinch movement. Returns a debounce effect when the camera
    /// moved.
    pub fn pointer_move(&mut self, id: u64, canvas_pos: Coord<f64>) -> Option<Effect> {
        if self.viewport.pointer_move(id, canvas_pos) {
            self.needs_render = true;
            Some(self.bump_debounce())
        } else {
            None
        }
    }

    /// Wheel zoom toward the cursor.
    pub fn wheel_zoom(&mut self, cursor_px: Coord<f64>, delta: f64) -> Effect {
        let anchor = self.viewport.screen_to_world(cursor_px);
        self.viewport.animate_zoom_at(anchor, delta);
        self.needs_render = true;
        self.bump_debounce()
    }

    /// Snap zoom centered on the view.
    pub fn animate_zoom(&mut self, delta: f64) -> Effect {
        self.viewport.animate_zoom(delta);
        self.needs_render = true;
        self.bump_debounce()
    }

    /// Flight that fits both world points on screen.
    pub fn animate_view_bounds(&mut self, padding_px: f64, a: Coord<f64>, b: Coord<f64>) -> Effect {
        self.viewport.animate_view_bounds(padding_px, a, b);
        self.needs_render = true;
        self.bump_debounce()
    }

    /// Immediate jump, cancelling any animation.
    pub fn jump_to(&mut self, position: Coord<f64>, zoom: ZoomLevel) -> Effect {
        self.viewport.with_position_and_zoom(position, zoom);
        self.needs_render = true;
        self.bump_debounce()
    }

    pub fn set_canvas_size(&mut self, canvas: CanvasSize) -> Effect {
        self.viewport.set_canvas_size(canvas);
        self.needs_render = true;
        self.bump_debounce()
    }

    /// The render list for the current frame: fallback-layer tiles first
    /// (drawn underneath), then the tiles of the current zoom, each in its
    /// most advanced renderable state.
    pub fn visible_tiles(&self) -> Vec<(GridPoint, &TileState)> {
        let world = self.viewport.visible_world_rect();
        let tile_zoom = self.viewport.zoom().tile_zoom();

        let mut out = Vec::new();
        if tile_zoom != FALLBACK_ZOOM {
            self.collect_renderable(GridBounds::covering(world, FALLBACK_ZOOM), &mut out);
        }
        self.collect_renderable(GridBounds::covering(world, tile_zoom), &mut out);
        out
    }

    fn collect_renderable<'a>(
        &'a self,
        bounds: GridBounds,
        out: &mut Vec<(GridPoint, &'a TileState)>,
    ) {
        for cell in bounds.cells() {
            if let Some(state) = self.cache.get(cell)
                && matches!(state, TileState::Decoded(_) | TileState::Decorated(_))
            {
                out.push((cell, state));
            }
        }
    }
}
