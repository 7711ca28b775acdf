//! # Vector tile decoding
//!
//! Turns one tile's worth of bytes into typed, renderer-ready layers. The
//! wire layout is the Mapbox vector tile schema: the outer container holds
//! `Layer` messages in field 3; each layer carries parallel `keys`/`values`
//! dictionaries and a list of features whose `tags` index into them.
//!
//! The layer names carry the real protocol semantics; see [`decode_tile`].

use std::collections::HashMap;

use geo::Coord;
use tracing::trace;

use crate::geometry::{self, DEFAULT_EXTENT, GeomType};
use crate::mesh::{FillGeometry, StrokeMesh};
use crate::pbuf::{DecodeError, Reader, WireType};
use crate::style::{PlaceClass, StyleConfig, TextAnchor};

/// The minimum zoom at which tiles carry a road layer.
pub const ROAD_MIN_ZOOM: u8 = 7;

/// A road label candidate: the polyline to lay text along, the text itself,
/// and whether labeling is forced regardless of zoom.
#[derive(Debug, Clone, PartialEq)]
pub struct Road {
    pub path: Vec<Coord<f32>>,
    pub name: String,
    pub always_label: bool,
}

/// A point label for a populated place or region.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceLabel {
    pub text: String,
    /// Tile-local position in `[0, 1]²`.
    pub position: Coord<f32>,
    pub class: PlaceClass,
    pub anchor: TextAnchor,
    /// Prominence rank; smaller is more prominent. Gates visibility by zoom.
    pub symbol_rank: u8,
    pub is_capital: bool,
}

/// One decoded tile: four geometry buffers plus label inputs.
///
/// All buffers are immutable once the decode returns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tile {
    pub water: FillGeometry,
    pub nature: FillGeometry,
    pub buildings: FillGeometry,
    pub roads: StrokeMesh,
    pub road_labels: Vec<Road>,
    pub place_labels: Vec<PlaceLabel>,
}

/// A decoded `Value` message (the layer dictionary oneof).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Float(f32),
    Double(f64),
    Int(i64),
    Uint(u64),
    Sint(i64),
    Bool(bool),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric coercion for tags like `symbolrank` which encoders variously
    /// write as int, uint, or sint.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Uint(v) => Some(*v),
            Value::Int(v) | Value::Sint(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Boolean coercion; accepts 0/1 integers, which some encoders emit for
    /// flags like `capital`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Uint(v) => Some(*v != 0),
            Value::Int(v) | Value::Sint(v) => Some(*v != 0),
            _ => None,
        }
    }
}

/// Decodes one tile.
///
/// `zoom` is the tile's own zoom level; it gates the road layer (absent below
/// zoom 7) and place label visibility. Layer semantics:
///
/// - `water`: first feature only (tile convention: one feature covers the
///   tile); a missing layer just leaves the buffer empty.
/// - `landcover`: only features tagged `class = "grass"` reach the nature
///   buffer.
/// - `building`: every feature's rings, merged into one buffer.
/// - `road`: style table lookup by the `type` tag; unrecognized types are
///   dropped. Features with a `name` longer than one character also become
///   road label candidates.
/// - `place_label`: requires `name`, a recognized `class`, and `symbolrank`;
///   dropped when outside the tile square or not yet deserved at this zoom.
/// - anything else: ignored.
///
/// # Errors
///
/// Any wire-level malformation (truncation, unknown wire type or geometry
/// command, bad tag indices) fails the whole tile; the caller marks the
/// tile errored and the viewer keeps running.
pub fn decode_tile(bytes: &[u8], zoom: u8, style: &StyleConfig) -> Result<Tile, DecodeError> {
    let mut tile = Tile::default();
    let mut reader = Reader::new(bytes);

    while !reader.is_empty() {
        let tag = reader.tag()?;
        match (tag.field, tag.wire_type) {
            (3, WireType::Len) => {
                let mut layer_reader = reader.message()?;
                let layer = RawLayer::read(&mut layer_reader)?;
                trace!(layer = layer.name, features = layer.features.len(), "decoded layer");
                dispatch_layer(&layer, zoom, style, &mut tile)?;
            }
            (_, wire_type) => reader.skip(wire_type)?,
        }
    }

    Ok(tile)
}

fn dispatch_layer(
    layer: &RawLayer<'_>,
    zoom: u8,
    style: &StyleConfig,
    tile: &mut Tile,
) -> Result<(), DecodeError> {
    match layer.name {
        "water" => {
            // Tile convention: a single feature covers the tile.
            if let Some(feature) = layer.features.first() {
                push_rings(feature.geometry, layer.extent, &mut tile.water)?;
            }
        }
        "building" => {
            for feature in &layer.features {
                push_rings(feature.geometry, layer.extent, &mut tile.buildings)?;
            }
        }
        "landcover" => {
            for feature in &layer.features {
                let tags = layer.feature_tags(feature)?;
                if tags.get("class").and_then(|v| v.as_str()) == Some("grass") {
                    push_rings(feature.geometry, layer.extent, &mut tile.nature)?;
                }
            }
        }
        "road" => {
            // No road layer exists at low zoom.
            if zoom >= ROAD_MIN_ZOOM {
                for feature in &layer.features {
                    decode_road(layer, feature, style, tile)?;
                }
            }
        }
        "place_label" => {
            for feature in &layer.features {
                if let Some(label) = decode_place_label(layer, feature, zoom)? {
                    tile.place_labels.push(label);
                }
            }
        }
        _ => {}
    }
    Ok(())
}

fn push_rings(
    geometry: &[u8],
    extent: u32,
    fill: &mut FillGeometry,
) -> Result<(), DecodeError> {
    for ring in geometry::decode_paths(geometry, extent)? {
        fill.push_ring(&ring);
    }
    Ok(())
}

fn decode_road(
    layer: &RawLayer<'_>,
    feature: &RawFeature<'_>,
    style: &StyleConfig,
    tile: &mut Tile,
) -> Result<(), DecodeError> {
    let tags = layer.feature_tags(feature)?;
    let Some(road_style) = tags
        .get("type")
        .and_then(|v| v.as_str())
        .and_then(|kind| style.road_style(kind))
    else {
        // Unrecognized type: the feature contributes no geometry.
        return Ok(());
    };

    let name = tags.get("name").and_then(|v| v.as_str());
    let labelworthy = name.is_some_and(|n| n.chars().count() > 1);

    for path in geometry::decode_paths(feature.geometry, layer.extent)? {
        tile.roads.add_path(&path, road_style.half_width);
        if labelworthy && path.len() >= 2 {
            tile.road_labels.push(Road {
                path,
                name: name.unwrap_or_default().to_string(),
                always_label: road_style.always_label,
            });
        }
    }
    Ok(())
}

fn decode_place_label(
    layer: &RawLayer<'_>,
    feature: &RawFeature<'_>,
    zoom: u8,
) -> Result<Option<PlaceLabel>, DecodeError> {
    let tags = layer.feature_tags(feature)?;

    let Some(text) = tags.get("name").and_then(|v| v.as_str()) else {
        return Ok(None);
    };
    let Some(class) = tags
        .get("class")
        .and_then(|v| v.as_str())
        .and_then(PlaceClass::from_tag)
    else {
        return Ok(None);
    };
    let Some(symbol_rank) = tags.get("symbolrank").and_then(|v| v.as_u64()) else {
        return Ok(None);
    };
    let symbol_rank = u8::try_from(symbol_rank).unwrap_or(u8::MAX);

    // The label only appears once the zoom is high enough to deserve it.
    if symbol_rank.saturating_sub(3) > zoom {
        return Ok(None);
    }

    let points = geometry::decode_points(feature.geometry, layer.extent)?;
    let Some(position) = points.first().copied() else {
        return Ok(None);
    };
    // Points in the overlap margin belong to a neighboring tile.
    if !(0.0..=1.0).contains(&position.x) || !(0.0..=1.0).contains(&position.y) {
        return Ok(None);
    }

    let anchor = tags
        .get("text_anchor")
        .and_then(|v| v.as_str())
        .map(TextAnchor::from_tag)
        .unwrap_or_default();
    let is_capital = tags
        .get("capital")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    Ok(Some(PlaceLabel {
        text: text.to_string(),
        position,
        class,
        anchor,
        symbol_rank,
        is_capital,
    }))
}

/// A layer read into borrowed pieces before dispatch.
struct RawLayer<'a> {
    name: &'a str,
    extent: u32,
    #[expect(dead_code)]
    version: u64,
    keys: Vec<&'a str>,
    values: Vec<Value>,
    features: Vec<RawFeature<'a>>,
}

struct RawFeature<'a> {
    #[expect(dead_code)]
    id: u64,
    tags: Vec<u64>,
    #[expect(dead_code)]
    geom_type: GeomType,
    geometry: &'a [u8],
}

impl<'a> RawLayer<'a> {
    fn read(reader: &mut Reader<'a>) -> Result<Self, DecodeError> {
        let mut layer = RawLayer {
            name: "",
            extent: DEFAULT_EXTENT,
            version: 1,
            keys: Vec::new(),
            values: Vec::new(),
            features: Vec::new(),
        };

        while !reader.is_empty() {
            let tag = reader.tag()?;
            match (tag.field, tag.wire_type) {
                (1, WireType::Len) => layer.name = reader.string()?,
                (2, WireType::Len) => {
                    let mut feature_reader = reader.message()?;
                    layer.features.push(RawFeature::read(&mut feature_reader)?);
                }
                (3, WireType::Len) => layer.keys.push(reader.string()?),
                (4, WireType::Len) => {
                    let mut value_reader = reader.message()?;
                    layer.values.push(read_value(&mut value_reader)?);
                }
                (5, WireType::Varint) => {
                    let extent = reader.varint()?;
                    layer.extent = u32::try_from(extent).unwrap_or(DEFAULT_EXTENT);
                }
                (15, WireType::Varint) => layer.version = reader.varint()?,
                (_, wire_type) => reader.skip(wire_type)?,
            }
        }

        Ok(layer)
    }

    /// Resolves a feature's flat tag-index pairs into a key → value lookup.
    fn feature_tags<'f>(
        &'f self,
        feature: &RawFeature<'a>,
    ) -> Result<HashMap<&'a str, &'f Value>, DecodeError> {
        if feature.tags.len() % 2 != 0 {
            return Err(DecodeError::DanglingTagPair);
        }
        let mut tags = HashMap::with_capacity(feature.tags.len() / 2);
        for pair in feature.tags.chunks_exact(2) {
            let key_index =
                usize::try_from(pair[0]).map_err(|_| DecodeError::TagIndexOutOfRange {
                    index: usize::MAX,
                })?;
            let value_index =
                usize::try_from(pair[1]).map_err(|_| DecodeError::TagIndexOutOfRange {
                    index: usize::MAX,
                })?;
            let key = self
                .keys
                .get(key_index)
                .ok_or(DecodeError::TagIndexOutOfRange { index: key_index })?;
            let value = self
                .values
                .get(value_index)
                .ok_or(DecodeError::TagIndexOutOfRange { index: value_index })?;
            tags.insert(*key, value);
        }
        Ok(tags)
    }
}

impl<'a> RawFeature<'a> {
    fn read(reader: &mut Reader<'a>) -> Result<Self, DecodeError> {
        let mut feature = RawFeature {
            id: 0,
            tags: Vec::new(),
            geom_type: GeomType::Unknown,
            geometry: &[],
        };

        while !reader.is_empty() {
            let tag = reader.tag()?;
            match (tag.field, tag.wire_type) {
                (1, WireType::Varint) => feature.id = reader.varint()?,
                (2, WireType::Len) => {
                    for value in reader.packed_varints()? {
                        feature.tags.push(value?);
                    }
                }
                (3, WireType::Varint) => {
                    let raw = reader.varint()?;
                    feature.geom_type = u8::try_from(raw)
                        .ok()
                        .and_then(|v| GeomType::try_from(v).ok())
                        .unwrap_or(GeomType::Unknown);
                }
                (4, WireType::Len) => feature.geometry = reader.bytes()?,
                (_, wire_type) => reader.skip(wire_type)?,
            }
        }

        Ok(feature)
    }
}

fn read_value(reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
    // Exactly one field should be present; last wins if an encoder misbehaves.
    let mut value = Value::String(String::new());
    while !reader.is_empty() {
        let tag = reader.tag()?;
        value = match (tag.field, tag.wire_type) {
            (1, WireType::Len) => Value::String(reader.string()?.to_string()),
            (2, WireType::Fixed32) => Value::Float(reader.fixed32()?),
            (3, WireType::Fixed64) => Value::Double(reader.fixed64()?),
            #[expect(clippy::cast_possible_wrap)]
            (4, WireType::Varint) => Value::Int(reader.varint()? as i64),
            (5, WireType::Varint) => Value::Uint(reader.varint()?),
            (6, WireType::Varint) => Value::Sint(reader.zigzag()?),
            (7, WireType::Varint) => Value::Bool(reader.varint()? != 0),
            (_, wire_type) => {
                reader.skip(wire_type)?;
                continue;
            }
        };
    }
    Ok(value)
}

#[cfg(test)]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
mod tests {
    use super::*;

    /// Hand-rolled tile encoder covering exactly the wire constructs the
    /// decoder reads. Tests build tiles from this rather than fixtures.
    mod wire {
        pub fn varint(mut value: u64, out: &mut Vec<u8>) {
            loop {
                let byte = (value & 0x7f) as u8;
                value >>= 7;
                if value == 0 {
                    out.push(byte);
                    break;
                }
                out.push(byte | 0x80);
            }
        }

        pub fn zigzag(value: i64) -> u64 {
            ((value << 1) ^ (value >> 63)) as u64
        }

        pub fn field_varint(field: u64, value: u64, out: &mut Vec<u8>) {
            varint(field << 3, out);
            varint(value, out);
        }

        pub fn field_bytes(field: u64, bytes: &[u8], out: &mut Vec<u8>) {
            varint((field << 3) | 2, out);
            varint(bytes.len() as u64, out);
            out.extend_from_slice(bytes);
        }

        pub fn string_value(s: &str) -> Vec<u8> {
            let mut out = Vec::new();
            field_bytes(1, s.as_bytes(), &mut out);
            out
        }

        pub fn uint_value(v: u64) -> Vec<u8> {
            let mut out = Vec::new();
            field_varint(5, v, &mut out);
            out
        }

        pub fn bool_value(v: bool) -> Vec<u8> {
            let mut out = Vec::new();
            field_varint(7, u64::from(v), &mut out);
            out
        }

        pub fn command(opcode: u64, count: u64, out: &mut Vec<u8>) {
            varint(opcode | (count << 3), out);
        }

        pub fn deltas(pairs: &[(i64, i64)], out: &mut Vec<u8>) {
            for (dx, dy) in pairs {
                varint(zigzag(*dx), out);
                varint(zigzag(*dy), out);
            }
        }

        /// A polygon ring as a command stream, from absolute coordinates.
        pub fn ring(points: &[(i64, i64)]) -> Vec<u8> {
            let mut out = Vec::new();
            command(1, 1, &mut out);
            deltas(&points[..1], &mut out);
            command(2, (points.len() - 1) as u64, &mut out);
            let mut rel = Vec::new();
            for pair in points.windows(2) {
                rel.push((pair[1].0 - pair[0].0, pair[1].1 - pair[0].1));
            }
            deltas(&rel, &mut out);
            command(7, 1, &mut out);
            out
        }

        /// A polyline command stream from absolute coordinates.
        pub fn line(points: &[(i64, i64)]) -> Vec<u8> {
            let mut out = Vec::new();
            command(1, 1, &mut out);
            deltas(&points[..1], &mut out);
            command(2, (points.len() - 1) as u64, &mut out);
            let mut rel = Vec::new();
            for pair in points.windows(2) {
                rel.push((pair[1].0 - pair[0].0, pair[1].1 - pair[0].1));
            }
            deltas(&rel, &mut out);
            out
        }

        /// A single point command stream.
        pub fn point(x: i64, y: i64) -> Vec<u8> {
            let mut out = Vec::new();
            command(1, 1, &mut out);
            deltas(&[(x, y)], &mut out);
            out
        }

        pub struct Layer {
            body: Vec<u8>,
        }

        impl Layer {
            pub fn new(name: &str) -> Self {
                let mut body = Vec::new();
                field_bytes(1, name.as_bytes(), &mut body);
                field_varint(15, 2, &mut body);
                Self { body }
            }

            pub fn key(mut self, key: &str) -> Self {
                field_bytes(3, key.as_bytes(), &mut self.body);
                self
            }

            pub fn value(mut self, value: &[u8]) -> Self {
                field_bytes(4, value, &mut self.body);
                self
            }

            pub fn feature(mut self, tags: &[u64], geom_type: u64, geometry: &[u8]) -> Self {
                let mut feature = Vec::new();
                let mut packed = Vec::new();
                for tag in tags {
                    varint(*tag, &mut packed);
                }
                field_bytes(2, &packed, &mut feature);
                field_varint(3, geom_type, &mut feature);
                field_bytes(4, geometry, &mut feature);
                field_bytes(2, &feature, &mut self.body);
                self
            }

            pub fn build(self) -> Vec<u8> {
                self.body
            }
        }

        pub fn tile(layers: &[Vec<u8>]) -> Vec<u8> {
            let mut out = Vec::new();
            for layer in layers {
                field_bytes(3, layer, &mut out);
            }
            out
        }
    }

    fn square() -> Vec<u8> {
        wire::ring(&[(0, 0), (100, 0), (100, 100), (0, 100)])
    }

    #[test]
    fn water_uses_first_feature_only() {
        let layer = wire::Layer::new("water")
            .feature(&[], 3, &square())
            .feature(&[], 3, &wire::ring(&[(200, 200), (300, 200), (300, 300)]))
            .build();
        let tile = decode_tile(&wire::tile(&[layer]), 10, &StyleConfig::default()).unwrap();
        assert_eq!(tile.water.ring_count(), 1);
        assert_eq!(tile.water.points.len(), 4);
    }

    #[test]
    fn buildings_merge_all_features() {
        let layer = wire::Layer::new("building")
            .feature(&[], 3, &square())
            .feature(&[], 3, &wire::ring(&[(200, 200), (300, 200), (300, 300)]))
            .build();
        let tile = decode_tile(&wire::tile(&[layer]), 15, &StyleConfig::default()).unwrap();
        assert_eq!(tile.buildings.ring_count(), 2);
    }

    #[test]
    fn landcover_keeps_grass_only() {
        let layer = wire::Layer::new("landcover")
            .key("class")
            .value(&wire::string_value("grass"))
            .value(&wire::string_value("sand"))
            .feature(&[0, 0], 3, &square())
            .feature(&[0, 1], 3, &wire::ring(&[(200, 200), (300, 200), (300, 300)]))
            .build();
        let tile = decode_tile(&wire::tile(&[layer]), 10, &StyleConfig::default()).unwrap();
        assert_eq!(tile.nature.ring_count(), 1);
    }

    fn road_layer(kind: &str, name: &str) -> Vec<u8> {
        wire::Layer::new("road")
            .key("type")
            .key("name")
            .value(&wire::string_value(kind))
            .value(&wire::string_value(name))
            .feature(&[0, 0, 1, 1], 2, &wire::line(&[(0, 0), (1000, 0), (1000, 1000)]))
            .build()
    }

    #[test]
    fn roads_absent_below_min_zoom() {
        let bytes = wire::tile(&[road_layer("motorway", "A1")]);
        let tile = decode_tile(&bytes, 6, &StyleConfig::default()).unwrap();
        assert!(tile.roads.is_empty());
        assert!(tile.road_labels.is_empty());

        let tile = decode_tile(&bytes, 7, &StyleConfig::default()).unwrap();
        assert!(!tile.roads.is_empty());
    }

    #[test]
    fn road_ribbon_geometry_counts() {
        let bytes = wire::tile(&[road_layer("primary", "Elm Street")]);
        let tile = decode_tile(&bytes, 14, &StyleConfig::default()).unwrap();
        // Two segments: 4 vertices and 6 indices each.
        assert_eq!(tile.roads.positions.len(), 8);
        assert_eq!(tile.roads.indices.len(), 12);
    }

    #[test]
    fn unrecognized_road_type_dropped() {
        let bytes = wire::tile(&[road_layer("goat_track", "Ziegenweg")]);
        let tile = decode_tile(&bytes, 14, &StyleConfig::default()).unwrap();
        assert!(tile.roads.is_empty());
        assert!(tile.road_labels.is_empty());
    }

    #[test]
    fn road_label_requires_multi_char_name() {
        let named = decode_tile(
            &wire::tile(&[road_layer("motorway", "A1")]),
            14,
            &StyleConfig::default(),
        )
        .unwrap();
        assert_eq!(named.road_labels.len(), 1);
        assert_eq!(named.road_labels[0].name, "A1");
        assert!(named.road_labels[0].always_label);

        let short = decode_tile(
            &wire::tile(&[road_layer("motorway", "A")]),
            14,
            &StyleConfig::default(),
        )
        .unwrap();
        assert!(short.road_labels.is_empty());
        // The geometry still renders.
        assert!(!short.roads.is_empty());
    }

    fn place_layer(feature_tags: &[u64], geometry: &[u8]) -> Vec<u8> {
        wire::Layer::new("place_label")
            .key("name")
            .key("class")
            .key("symbolrank")
            .key("capital")
            .key("text_anchor")
            .value(&wire::string_value("Springfield"))
            .value(&wire::string_value("settlement"))
            .value(&wire::uint_value(8))
            .value(&wire::bool_value(true))
            .value(&wire::string_value("top-left"))
            .feature(feature_tags, 1, geometry)
            .build()
    }

    #[test]
    fn place_label_full_decode() {
        let layer = place_layer(&[0, 0, 1, 1, 2, 2, 3, 3, 4, 4], &wire::point(2048, 2048));
        let tile = decode_tile(&wire::tile(&[layer]), 10, &StyleConfig::default()).unwrap();
        assert_eq!(tile.place_labels.len(), 1);
        let label = &tile.place_labels[0];
        assert_eq!(label.text, "Springfield");
        assert_eq!(label.class, PlaceClass::Settlement);
        assert_eq!(label.symbol_rank, 8);
        assert!(label.is_capital);
        assert_eq!(label.anchor, TextAnchor::TopLeft);
        assert_eq!(label.position, Coord { x: 0.5, y: 0.5 });
    }

    #[test]
    fn place_label_requires_name_class_and_rank() {
        // Missing symbolrank.
        let layer = place_layer(&[0, 0, 1, 1], &wire::point(2048, 2048));
        let tile = decode_tile(&wire::tile(&[layer]), 10, &StyleConfig::default()).unwrap();
        assert!(tile.place_labels.is_empty());

        // Unrecognized class.
        let layer = wire::Layer::new("place_label")
            .key("name")
            .key("class")
            .key("symbolrank")
            .value(&wire::string_value("Springfield"))
            .value(&wire::string_value("hamlet"))
            .value(&wire::uint_value(8))
            .feature(&[0, 0, 1, 1, 2, 2], 1, &wire::point(2048, 2048))
            .build();
        let tile = decode_tile(&wire::tile(&[layer]), 10, &StyleConfig::default()).unwrap();
        assert!(tile.place_labels.is_empty());
    }

    #[test]
    fn place_label_outside_tile_dropped() {
        // The overlap margin extends past the extent; such points belong to
        // the neighboring tile.
        let layer = place_layer(&[0, 0, 1, 1, 2, 2], &wire::point(5000, 2048));
        let tile = decode_tile(&wire::tile(&[layer]), 10, &StyleConfig::default()).unwrap();
        assert!(tile.place_labels.is_empty());

        let layer = place_layer(&[0, 0, 1, 1, 2, 2], &wire::point(-10, 2048));
        let tile = decode_tile(&wire::tile(&[layer]), 10, &StyleConfig::default()).unwrap();
        assert!(tile.place_labels.is_empty());
    }

    #[test]
    fn place_label_rank_gated_by_zoom() {
        // Rank 8 needs zoom >= 5.
        let layer = place_layer(&[0, 0, 1, 1, 2, 2], &wire::point(2048, 2048));
        let bytes = wire::tile(&[layer]);
        let tile = decode_tile(&bytes, 4, &StyleConfig::default()).unwrap();
        assert!(tile.place_labels.is_empty());
        let tile = decode_tile(&bytes, 5, &StyleConfig::default()).unwrap();
        assert_eq!(tile.place_labels.len(), 1);
    }

    #[test]
    fn unknown_layers_ignored() {
        let layer = wire::Layer::new("poi_label")
            .feature(&[], 1, &wire::point(100, 100))
            .build();
        let tile = decode_tile(&wire::tile(&[layer]), 10, &StyleConfig::default()).unwrap();
        assert_eq!(tile, Tile::default());
    }

    #[test]
    fn decode_is_deterministic() {
        let layers = [
            wire::Layer::new("water").feature(&[], 3, &square()).build(),
            road_layer("motorway", "A1"),
            place_layer(&[0, 0, 1, 1, 2, 2], &wire::point(2048, 2048)),
        ];
        let bytes = wire::tile(&layers);
        let first = decode_tile(&bytes, 12, &StyleConfig::default()).unwrap();
        let second = decode_tile(&bytes, 12, &StyleConfig::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn bad_tag_index_fails_the_tile() {
        let layer = wire::Layer::new("landcover")
            .key("class")
            .value(&wire::string_value("grass"))
            .feature(&[0, 9], 3, &square())
            .build();
        assert_eq!(
            decode_tile(&wire::tile(&[layer]), 10, &StyleConfig::default()),
            Err(DecodeError::TagIndexOutOfRange { index: 9 })
        );
    }

    #[test]
    fn odd_tag_list_fails_the_tile() {
        let layer = wire::Layer::new("landcover")
            .key("class")
            .value(&wire::string_value("grass"))
            .feature(&[0], 3, &square())
            .build();
        assert_eq!(
            decode_tile(&wire::tile(&[layer]), 10, &StyleConfig::default()),
            Err(DecodeError::DanglingTagPair)
        );
    }

    #[test]
    fn truncated_tile_fails() {
        let layer = wire::Layer::new("water").feature(&[], 3, &square()).build();
        let bytes = wire::tile(&[layer]);
        assert!(decode_tile(&bytes[..bytes.len() - 3], 10, &StyleConfig::default()).is_err());
    }

    #[test]
    fn non_default_extent_scales_coordinates() {
        let mut layer = wire::Layer::new("water").feature(&[], 3, &square()).build();
        wire::field_varint(5, 256, &mut layer);
        let tile = decode_tile(&wire::tile(&[layer]), 10, &StyleConfig::default()).unwrap();
        let first = tile.water.points[1];
        assert!((first.x - 100.0 / 256.0).abs() < 1e-6);
    }
}
