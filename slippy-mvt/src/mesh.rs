//! # Geometry buffers handed to the renderer
//!
//! The decoder produces two buffer shapes: fill geometry as ring point lists
//! (the renderer triangulates or stencil-fills them), and stroke geometry as
//! an indexed triangle mesh of ribbon quads. Both are immutable once built.

use geo::Coord;

/// Fill geometry: rings stored as a flat point array plus ring start offsets.
///
/// Ring `i` spans `points[starts[i]..starts[i + 1]]` (or to the end for the
/// last ring). Rings are not explicitly closed; the final segment back to the
/// ring's first point is implied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FillGeometry {
    pub starts: Vec<u32>,
    pub points: Vec<Coord<f32>>,
}

impl FillGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn ring_count(&self) -> usize {
        self.starts.len()
    }

    /// Appends a ring. Rings with fewer than 3 points cannot enclose area
    /// and are dropped.
    pub fn push_ring(&mut self, ring: &[Coord<f32>]) {
        if ring.len() < 3 {
            return;
        }
        #[expect(clippy::cast_possible_truncation)]
        self.starts.push(self.points.len() as u32);
        self.points.extend_from_slice(ring);
    }

    /// Iterates over the rings as sub-slices.
    pub fn rings(&self) -> impl Iterator<Item = &[Coord<f32>]> {
        self.starts.iter().enumerate().map(|(i, &start)| {
            let end = self
                .starts
                .get(i + 1)
                .map_or(self.points.len(), |&next| next as usize);
            &self.points[start as usize..end]
        })
    }
}

/// Stroke geometry: an indexed triangle mesh of quads offset perpendicular
/// to the path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrokeMesh {
    pub positions: Vec<Coord<f32>>,
    pub indices: Vec<u32>,
}

impl StrokeMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Appends a ribbon along `path`, offset by `half_width` to each side.
    ///
    /// Each segment contributes 4 vertices and 6 indices. The normal is
    /// recomputed per segment, so the winding of every quad follows the
    /// segment's own direction and stays consistent through turns; joints
    /// are butt joints (the stroke widths in use are too thin for visible
    /// gaps at tile resolution).
    pub fn add_path(&mut self, path: &[Coord<f32>], half_width: f32) {
        for segment in path.windows(2) {
            let (a, b) = (segment[0], segment[1]);
            let dx = b.x - a.x;
            let dy = b.y - a.y;
            let len = (dx * dx + dy * dy).sqrt();
            if len <= f32::EPSILON {
                continue;
            }
            let normal = Coord {
                x: -dy / len,
                y: dx / len,
            };

            #[expect(clippy::cast_possible_truncation)]
            let base = self.positions.len() as u32;
            self.positions.push(offset(a, normal, half_width));
            self.positions.push(offset(a, normal, -half_width));
            self.positions.push(offset(b, normal, half_width));
            self.positions.push(offset(b, normal, -half_width));
            self.indices
                .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 1, base + 3]);
        }
    }
}

#[inline]
fn offset(point: Coord<f32>, normal: Coord<f32>, distance: f32) -> Coord<f32> {
    Coord {
        x: point.x + normal.x * distance,
        y: point.y + normal.y * distance,
    }
}

#[cfg(test)]
#[allow(clippy::cast_possible_truncation)]
mod tests {
    use super::*;

    fn c(x: f32, y: f32) -> Coord<f32> {
        Coord { x, y }
    }

    #[test]
    fn fill_rings_round_trip() {
        let mut fill = FillGeometry::new();
        fill.push_ring(&[c(0.0, 0.0), c(1.0, 0.0), c(1.0, 1.0)]);
        fill.push_ring(&[c(0.2, 0.2), c(0.4, 0.2), c(0.4, 0.4), c(0.2, 0.4)]);

        let rings: Vec<_> = fill.rings().collect();
        assert_eq!(rings.len(), 2);
        assert_eq!(rings[0].len(), 3);
        assert_eq!(rings[1].len(), 4);
    }

    #[test]
    fn degenerate_rings_dropped() {
        let mut fill = FillGeometry::new();
        fill.push_ring(&[c(0.0, 0.0), c(1.0, 0.0)]);
        assert!(fill.is_empty());
        assert_eq!(fill.ring_count(), 0);
    }

    #[test]
    fn ribbon_counts_per_segment() {
        let mut mesh = StrokeMesh::new();
        mesh.add_path(&[c(0.0, 0.0), c(0.5, 0.0), c(0.5, 0.5)], 0.01);
        // Two segments: 4 vertices and 6 indices each.
        assert_eq!(mesh.positions.len(), 8);
        assert_eq!(mesh.indices.len(), 12);
    }

    #[test]
    fn ribbon_winding_is_consistent() {
        let mut mesh = StrokeMesh::new();
        mesh.add_path(&[c(0.0, 0.0), c(1.0, 0.0), c(1.0, 1.0)], 0.1);

        // Signed area of each triangle must share a sign.
        let mut signs = Vec::new();
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [
                mesh.positions[tri[0] as usize],
                mesh.positions[tri[1] as usize],
                mesh.positions[tri[2] as usize],
            ];
            let cross = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
            signs.push(cross > 0.0);
        }
        assert!(signs.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn ribbon_offsets_perpendicular_to_segment() {
        let mut mesh = StrokeMesh::new();
        mesh.add_path(&[c(0.0, 0.0), c(1.0, 0.0)], 0.1);
        // Horizontal segment: offsets are vertical.
        assert!((mesh.positions[0].y - 0.1).abs() < 1e-6);
        assert!((mesh.positions[1].y + 0.1).abs() < 1e-6);
        assert!((mesh.positions[0].x).abs() < 1e-6);
    }

    #[test]
    fn zero_length_segments_skipped() {
        let mut mesh = StrokeMesh::new();
        mesh.add_path(&[c(0.0, 0.0), c(0.0, 0.0), c(1.0, 0.0)], 0.1);
        assert_eq!(mesh.positions.len(), 4);
        assert_eq!(mesh.indices.len(), 6);
    }
}
