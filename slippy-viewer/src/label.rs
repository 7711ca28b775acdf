//! # Label placement and collision
//!
//! Lays point labels at their anchors and road labels along road polylines,
//! rejecting road placements that would overlap glyphs already placed in
//! this tile or in decorated neighbor tiles. Rejection is silent: a label
//! that does not fit is simply absent.
//!
//! All placement math happens in grid units (one tile at the tile's zoom is
//! 1.0), with positions offset by the tile's grid coordinates so footprints
//! from neighboring tiles share one coordinate space. `f64` keeps that space
//! precise at deep zooms, where a tile spans ~2.4e-7 of the world.

use std::collections::HashMap;

use geo::Coord;
use slippy_mvt::style::{MarkerGlyph, PlaceClass, TextAnchor};
use slippy_mvt::tile::{PlaceLabel, Road, Tile};
use tracing::trace;

use crate::grid::GridPoint;
use crate::viewport::TILE_LOGICAL_SIZE;

/// Road labels are only attempted at this zoom or deeper, unless the road
/// is flagged always-label.
pub const ROAD_LABEL_MIN_ZOOM: u8 = 14;

/// cos 45°; a glyph whose local tangent deviates more than this from the
/// label's overall direction folds the text back on itself.
const MAX_TANGENT_DEVIATION_COS: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// Metrics for one character, in em units (1.0 = the font size).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphMetrics {
    pub advance: f32,
    /// Texture coordinates in the host's glyph atlas, passed through opaquely.
    pub uv: [f32; 4],
}

/// The glyph table supplied by the host's font collaborator.
///
/// A viewer without a font is valid: decoded tiles simply wait for one
/// before label decoration.
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    /// Cap height in em units; the basis for road glyph collision radii.
    pub cap_height: f32,
    glyphs: HashMap<char, GlyphMetrics>,
}

impl FontMetrics {
    pub fn new(cap_height: f32) -> Self {
        Self {
            cap_height,
            glyphs: HashMap::new(),
        }
    }

    pub fn insert(&mut self, ch: char, metrics: GlyphMetrics) {
        self.glyphs.insert(ch, metrics);
    }

    pub fn glyph(&self, ch: char) -> Option<&GlyphMetrics> {
        self.glyphs.get(&ch)
    }

    /// Total advance of a string in em units. Characters missing from the
    /// table contribute nothing (they are not rendered either).
    pub fn advance_of(&self, text: &str) -> f64 {
        text.chars()
            .filter_map(|ch| self.glyphs.get(&ch))
            .map(|g| f64::from(g.advance))
            .sum()
    }
}

/// One positioned glyph; the renderer rasterizes it from the atlas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphQuad {
    /// Glyph center in grid units.
    pub center: Coord<f64>,
    /// Rotation in radians; 0 is left-to-right horizontal.
    pub rotation: f64,
    /// Font size in logical pixels.
    pub size_px: f64,
    pub uv: [f32; 4],
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlyphMesh {
    pub quads: Vec<GlyphQuad>,
}

impl GlyphMesh {
    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }
}

/// Marker drawn at a place label's anchor point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedMarker {
    pub position: Coord<f64>,
    pub glyph: MarkerGlyph,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleFootprint {
    pub center: Coord<f64>,
    pub radius: f64,
}

/// The collision shapes a decorated tile's labels occupy: one point per
/// placed road glyph (shared radius) and one disk per place label.
///
/// Computed once per tile and never mutated afterwards; neighbor tiles read
/// these lists as pre-existing obstacles.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedFootprints {
    /// Collision radius of every road glyph point, in grid units.
    pub glyph_radius: f64,
    pub points: Vec<Coord<f64>>,
    pub circles: Vec<CircleFootprint>,
}

impl PlacedFootprints {
    fn new(glyph_radius: f64) -> Self {
        Self {
            glyph_radius,
            points: Vec::new(),
            circles: Vec::new(),
        }
    }

    /// Whether a prospective road glyph at `center` with `radius` overlaps
    /// anything already placed here.
    pub fn blocks_point(&self, center: Coord<f64>, radius: f64) -> bool {
        self.points
            .iter()
            .any(|p| distance(*p, center) < self.glyph_radius + radius)
            || self
                .circles
                .iter()
                .any(|c| distance(c.center, center) < c.radius + radius)
    }
}

/// A decoded tile plus its placed labels and their footprints.
#[derive(Debug, Clone, PartialEq)]
pub struct TileWithLabels {
    pub tile: Tile,
    pub road_text: GlyphMesh,
    pub place_text: GlyphMesh,
    pub markers: Vec<PlacedMarker>,
    pub footprints: PlacedFootprints,
}

/// Sizing knobs for label layout. Pixel values are logical pixels; layout
/// converts them to grid units through the fixed 512 px tile size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelConfig {
    pub place_font_px: f64,
    pub road_font_px: f64,
    pub road_label_min_zoom: u8,
    /// Base place-label footprint radius in pixels, scaled per class.
    pub place_radius_px: f64,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            place_font_px: 16.0,
            road_font_px: 13.0,
            road_label_min_zoom: ROAD_LABEL_MIN_ZOOM,
            place_radius_px: 14.0,
        }
    }
}

impl LabelConfig {
    /// Footprint radius for a place label, in grid units. More prominent
    /// classes reserve more space.
    fn place_footprint_radius(&self, class: PlaceClass) -> f64 {
        let scale = match class {
            PlaceClass::Country => 2.5,
            PlaceClass::State => 2.0,
            PlaceClass::Settlement => 1.5,
            PlaceClass::SettlementSubdivision => 1.0,
        };
        self.place_radius_px * scale / TILE_LOGICAL_SIZE
    }
}

/// Decorates a decoded tile with placed labels.
///
/// `neighbors` are the footprint lists of the up-to-8 already-decorated
/// neighbor tiles at the same zoom; their glyphs are treated as obstacles
/// so labels never overlap across tile seams.
pub fn decorate(
    tile: Tile,
    grid: GridPoint,
    neighbors: &[&PlacedFootprints],
    font: &FontMetrics,
    config: &LabelConfig,
) -> TileWithLabels {
    let glyph_radius = f64::from(font.cap_height) * config.road_font_px / TILE_LOGICAL_SIZE;
    let mut placed = PlacedFootprints::new(glyph_radius);
    let mut place_text = GlyphMesh::default();
    let mut road_text = GlyphMesh::default();
    let mut markers = Vec::new();
    let origin = Coord {
        x: f64::from(grid.x),
        y: f64::from(grid.y),
    };

    // Point labels first: always placed, and their disks become obstacles
    // for the road pass.
    for label in &tile.place_labels {
        place_point_label(
            label,
            origin,
            font,
            config,
            &mut place_text,
            &mut markers,
            &mut placed,
        );
    }

    let roads_wanted = grid.zoom >= config.road_label_min_zoom;
    for road in &tile.road_labels {
        if roads_wanted || road.always_label {
            place_road_label(road, origin, font, config, neighbors, &mut placed, &mut road_text);
        }
    }

    trace!(
        tile = %grid,
        road_glyphs = road_text.quads.len(),
        place_glyphs = place_text.quads.len(),
        "decorated tile"
    );

    TileWithLabels {
        tile,
        road_text,
        place_text,
        markers,
        footprints: placed,
    }
}

fn place_point_label(
    label: &PlaceLabel,
    origin: Coord<f64>,
    font: &FontMetrics,
    config: &LabelConfig,
    mesh: &mut GlyphMesh,
    markers: &mut Vec<PlacedMarker>,
    placed: &mut PlacedFootprints,
) {
    let em = config.place_font_px / TILE_LOGICAL_SIZE;
    let width = font.advance_of(&label.text) * em;
    let anchor_pos = Coord {
        x: origin.x + f64::from(label.position.x),
        y: origin.y + f64::from(label.position.y),
    };
    let (dx, dy) = block_offset(label.anchor, width, em);

    let mut pen_x = anchor_pos.x + dx;
    let line_y = anchor_pos.y + dy;
    for ch in label.text.chars() {
        let Some(glyph) = font.glyph(ch) else { continue };
        let advance = f64::from(glyph.advance) * em;
        mesh.quads.push(GlyphQuad {
            center: Coord {
                x: pen_x + advance / 2.0,
                y: line_y,
            },
            rotation: 0.0,
            size_px: config.place_font_px,
            uv: glyph.uv,
        });
        pen_x += advance;
    }

    markers.push(PlacedMarker {
        position: anchor_pos,
        glyph: MarkerGlyph::for_place(label.class, label.is_capital),
    });
    placed.circles.push(CircleFootprint {
        center: anchor_pos,
        radius: config.place_footprint_radius(label.class),
    });
}

/// Offset of the text run (start x, centerline y) relative to the anchor
/// point, for a run of width `w` and line height `h`. The y axis points
/// down, matching tile space.
fn block_offset(anchor: TextAnchor, w: f64, h: f64) -> (f64, f64) {
    let x = match anchor {
        TextAnchor::Left | TextAnchor::TopLeft | TextAnchor::BottomLeft => 0.0,
        TextAnchor::Right | TextAnchor::TopRight | TextAnchor::BottomRight => -w,
        _ => -w / 2.0,
    };
    let y = match anchor {
        TextAnchor::Top | TextAnchor::TopLeft | TextAnchor::TopRight => h / 2.0,
        TextAnchor::Bottom | TextAnchor::BottomLeft | TextAnchor::BottomRight => -h / 2.0,
        _ => 0.0,
    };
    (x, y)
}

fn place_road_label(
    road: &Road,
    origin: Coord<f64>,
    font: &FontMetrics,
    config: &LabelConfig,
    neighbors: &[&PlacedFootprints],
    placed: &mut PlacedFootprints,
    mesh: &mut GlyphMesh,
) {
    let em = config.road_font_px / TILE_LOGICAL_SIZE;
    let width = font.advance_of(&road.name) * em;
    let mut walker = PathWalker::new(&road.path, origin);

    // A path shorter than the rendered text cannot carry the label.
    if walker.total_len() < width || width <= 0.0 {
        return;
    }

    // Center the text on the path, then flip the path if the local travel
    // direction would make the text read right-to-left.
    let start = (walker.total_len() - width) / 2.0;
    let (_, mid_dir) = walker.sample(start + width / 2.0);
    if mid_dir.x < 0.0 {
        walker.reverse();
    }
    let (_, overall) = walker.sample(start + width / 2.0);

    let radius = placed.glyph_radius;
    let mut quads = Vec::new();
    let mut points = Vec::new();
    let mut arc = start;
    for ch in road.name.chars() {
        let Some(glyph) = font.glyph(ch) else { continue };
        let advance = f64::from(glyph.advance) * em;
        let (pos, dir) = walker.sample(arc + advance / 2.0);
        arc += advance;

        if dir.x * overall.x + dir.y * overall.y < MAX_TANGENT_DEVIATION_COS {
            trace!(name = %road.name, "road label rejected: too curvy");
            return;
        }
        let blocked = placed.blocks_point(pos, radius)
            || neighbors.iter().any(|n| n.blocks_point(pos, radius));
        if blocked {
            trace!(name = %road.name, "road label rejected: collision");
            return;
        }

        quads.push(GlyphQuad {
            center: pos,
            rotation: dir.y.atan2(dir.x),
            size_px: config.road_font_px,
            uv: glyph.uv,
        });
        points.push(pos);
    }

    if quads.is_empty() {
        return;
    }
    mesh.quads.extend(quads);
    placed.points.extend(points);
}

fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx.hypot(dy)
}

/// Arc-length parameterization of a road polyline, in grid units.
struct PathWalker {
    points: Vec<Coord<f64>>,
    cumulative: Vec<f64>,
}

impl PathWalker {
    fn new(path: &[Coord<f32>], origin: Coord<f64>) -> Self {
        let mut points: Vec<Coord<f64>> = Vec::with_capacity(path.len());
        for p in path {
            let p = Coord {
                x: origin.x + f64::from(p.x),
                y: origin.y + f64::from(p.y),
            };
            // Collapse repeated points so every segment has a tangent.
            if points.last().is_none_or(|last| distance(*last, p) > 0.0) {
                points.push(p);
            }
        }
        let mut cumulative = Vec::with_capacity(points.len());
        let mut total = 0.0;
        cumulative.push(0.0);
        for pair in points.windows(2) {
            total += distance(pair[0], pair[1]);
            cumulative.push(total);
        }
        Self { points, cumulative }
    }

    fn total_len(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    fn reverse(&mut self) {
        self.points.reverse();
        let total = self.total_len();
        self.cumulative = std::iter::once(0.0)
            .chain(self.cumulative.iter().rev().skip(1).map(|c| total - c))
            .collect();
    }

    /// Position and unit tangent at arc length `s`, clamped to the path.
    fn sample(&self, s: f64) -> (Coord<f64>, Coord<f64>) {
        if self.points.len() < 2 {
            let p = self.points.first().copied().unwrap_or(Coord { x: 0.0, y: 0.0 });
            return (p, Coord { x: 1.0, y: 0.0 });
        }
        let s = s.clamp(0.0, self.total_len());
        let seg = self
            .cumulative
            .partition_point(|c| *c <= s)
            .clamp(1, self.points.len() - 1);
        let (a, b) = (self.points[seg - 1], self.points[seg]);
        let seg_len = distance(a, b);
        let t = (s - self.cumulative[seg - 1]) / seg_len;
        let position = Coord {
            x: a.x + (b.x - a.x) * t,
            y: a.y + (b.y - a.y) * t,
        };
        let tangent = Coord {
            x: (b.x - a.x) / seg_len,
            y: (b.y - a.y) / seg_len,
        };
        (position, tangent)
    }
}
