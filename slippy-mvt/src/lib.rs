//! # slippy-mvt
//!
//! Decoding for Mapbox-style vector tiles, restricted to the subset of the
//! format a basemap renderer actually consumes. The crate turns raw tile
//! bytes into typed geometry buffers and label inputs; it performs no I/O
//! and holds no global state, so decoding is deterministic and the same
//! bytes always produce the same [`tile::Tile`].
//!
//! The layers recognized and their semantics are documented on
//! [`tile::decode_tile`]; styling is supplied by the caller as a
//! [`style::StyleConfig`].

pub mod geometry;
pub mod mesh;
pub mod pbuf;
pub mod style;
pub mod tile;

pub use pbuf::DecodeError;
pub use style::StyleConfig;
pub use tile::{PlaceLabel, Road, Tile, decode_tile};
