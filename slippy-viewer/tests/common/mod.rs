#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
//! Shared fixtures: a minimal tile wire encoder and a synthetic font.
//!
//! Tiles are built in memory rather than loaded from fixture files, so the
//! tests document the wire layout they exercise.

use slippy_viewer::{FontMetrics, GlyphMetrics};

fn varint(mut value: u64, out: &mut Vec<u8>) {
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

fn zigzag(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

fn field_varint(field: u64, value: u64, out: &mut Vec<u8>) {
    varint(field << 3, out);
    varint(value, out);
}

fn field_bytes(field: u64, bytes: &[u8], out: &mut Vec<u8>) {
    varint((field << 3) | 2, out);
    varint(bytes.len() as u64, out);
    out.extend_from_slice(bytes);
}

fn string_value(s: &str) -> Vec<u8> {
    let mut out = Vec::new();
    field_bytes(1, s.as_bytes(), &mut out);
    out
}

fn uint_value(v: u64) -> Vec<u8> {
    let mut out = Vec::new();
    field_varint(5, v, &mut out);
    out
}

fn command(opcode: u64, count: u64, out: &mut Vec<u8>) {
    varint(opcode | (count << 3), out);
}

fn deltas(pairs: &[(i64, i64)], out: &mut Vec<u8>) {
    for (dx, dy) in pairs {
        varint(zigzag(*dx), out);
        varint(zigzag(*dy), out);
    }
}

struct Layer {
    body: Vec<u8>,
}

impl Layer {
    fn new(name: &str) -> Self {
        let mut body = Vec::new();
        field_bytes(1, name.as_bytes(), &mut body);
        field_varint(15, 2, &mut body);
        Self { body }
    }

    fn key(mut self, key: &str) -> Self {
        field_bytes(3, key.as_bytes(), &mut self.body);
        self
    }

    fn value(mut self, value: &[u8]) -> Self {
        field_bytes(4, value, &mut self.body);
        self
    }

    fn feature(mut self, tags: &[u64], geom_type: u64, geometry: &[u8]) -> Self {
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

    fn build(self) -> Vec<u8> {
        self.body
    }
}

fn tile(layers: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    for layer in layers {
        field_bytes(3, layer, &mut out);
    }
    out
}

/// A tile with a water polygon, a named motorway, and one place label.
pub fn sample_tile() -> Vec<u8> {
    let mut water = Vec::new();
    command(1, 1, &mut water);
    deltas(&[(100, 100)], &mut water);
    command(2, 3, &mut water);
    deltas(&[(800, 0), (0, 800), (-800, 0)], &mut water);
    command(7, 1, &mut water);

    let mut road = Vec::new();
    command(1, 1, &mut road);
    deltas(&[(400, 2000)], &mut road);
    command(2, 1, &mut road);
    deltas(&[(3200, 0)], &mut road);

    let mut point = Vec::new();
    command(1, 1, &mut point);
    deltas(&[(2048, 1024)], &mut point);

    tile(&[
        Layer::new("water").feature(&[], 3, &water).build(),
        Layer::new("road")
            .key("type")
            .key("name")
            .value(&string_value("motorway"))
            .value(&string_value("A1"))
            .feature(&[0, 0, 1, 1], 2, &road)
            .build(),
        Layer::new("place_label")
            .key("name")
            .key("class")
            .key("symbolrank")
            .value(&string_value("Springfield"))
            .value(&string_value("settlement"))
            .value(&uint_value(8))
            .feature(&[0, 0, 1, 1, 2, 2], 1, &point)
            .build(),
    ])
}

/// A uniform-metric ASCII font.
pub fn test_font() -> FontMetrics {
    let mut font = FontMetrics::new(0.7);
    for ch in ('!'..='~').chain(std::iter::once(' ')) {
        font.insert(
            ch,
            GlyphMetrics {
                advance: 0.6,
                uv: [0.0, 0.0, 1.0, 1.0],
            },
        );
    }
    font
}
