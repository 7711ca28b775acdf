//! # Geometry command stream decoding
//!
//! Each feature's geometry is a varint stream of commands. A command packs an
//! opcode in its low 3 bits (MoveTo = 1, LineTo = 2, ClosePath = 7) and a
//! repeat count in the high bits. MoveTo and LineTo are followed by `count`
//! pairs of zigzag-coded deltas that accumulate onto a running pen position.
//!
//! Coordinates are integers in tile-local space, `[0, extent)`; decoding
//! normalizes them to `[0, 1]` by dividing by the layer extent.

use geo::Coord;
use num_enum::TryFromPrimitive;

use crate::pbuf::{DecodeError, Reader};

/// The default tile-local coordinate space width.
pub const DEFAULT_EXTENT: u32 = 4096;

const CMD_MOVE_TO: u8 = 1;
const CMD_LINE_TO: u8 = 2;
const CMD_CLOSE_PATH: u8 = 7;

/// Feature geometry type (field 3 of a feature message).
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum GeomType {
    Unknown = 0,
    Point = 1,
    LineString = 2,
    Polygon = 3,
}

/// Decodes a command stream into paths (polylines or polygon rings).
///
/// Each MoveTo starts a new path; LineTo extends the current one. ClosePath
/// adds no point (the renderer closes rings implicitly) but is consumed.
/// The pen position persists across paths, per the wire format.
///
/// # Errors
///
/// Fails on an opcode outside {1, 2, 7}, on a LineTo/ClosePath before any
/// MoveTo, or when fewer parameter bytes remain than the command declares.
pub fn decode_paths(geometry: &[u8], extent: u32) -> Result<Vec<Vec<Coord<f32>>>, DecodeError> {
    let mut decoder = CommandDecoder::new(geometry, extent);
    let mut paths: Vec<Vec<Coord<f32>>> = Vec::new();

    while let Some(command) = decoder.next_command()? {
        match command.opcode {
            CMD_MOVE_TO => {
                for _ in 0..command.count {
                    let point = decoder.step()?;
                    paths.push(vec![point]);
                }
            }
            CMD_LINE_TO => {
                let path = paths
                    .last_mut()
                    .ok_or(DecodeError::UnknownGeometryCommand(CMD_LINE_TO))?;
                for _ in 0..command.count {
                    path.push(decoder.step()?);
                }
            }
            CMD_CLOSE_PATH => {
                if paths.is_empty() {
                    return Err(DecodeError::UnknownGeometryCommand(CMD_CLOSE_PATH));
                }
                // No parameters; the point list is unchanged.
            }
            other => return Err(DecodeError::UnknownGeometryCommand(other)),
        }
    }

    Ok(paths)
}

/// Decodes a point-geometry command stream into bare points.
///
/// Point features consist of MoveTo commands only.
///
/// # Errors
///
/// Fails on any opcode other than MoveTo, or on truncated parameters.
pub fn decode_points(geometry: &[u8], extent: u32) -> Result<Vec<Coord<f32>>, DecodeError> {
    let mut decoder = CommandDecoder::new(geometry, extent);
    let mut points = Vec::new();

    while let Some(command) = decoder.next_command()? {
        if command.opcode != CMD_MOVE_TO {
            return Err(DecodeError::UnknownGeometryCommand(command.opcode));
        }
        for _ in 0..command.count {
            points.push(decoder.step()?);
        }
    }

    Ok(points)
}

struct Command {
    opcode: u8,
    count: u64,
}

/// Shared cursor state for the two decode entry points.
struct CommandDecoder<'a> {
    reader: Reader<'a>,
    scale: f32,
    pen_x: i64,
    pen_y: i64,
}

impl<'a> CommandDecoder<'a> {
    fn new(geometry: &'a [u8], extent: u32) -> Self {
        #[expect(clippy::cast_precision_loss)]
        let scale = 1.0 / extent.max(1) as f32;
        Self {
            reader: Reader::new(geometry),
            scale,
            pen_x: 0,
            pen_y: 0,
        }
    }

    fn next_command(&mut self) -> Result<Option<Command>, DecodeError> {
        if self.reader.is_empty() {
            return Ok(None);
        }
        let word = self.reader.varint()?;
        #[expect(clippy::cast_possible_truncation)]
        let opcode = (word & 0x7) as u8;
        Ok(Some(Command {
            opcode,
            count: word >> 3,
        }))
    }

    /// Reads one zigzag delta pair and advances the pen.
    fn step(&mut self) -> Result<Coord<f32>, DecodeError> {
        let dx = self
            .reader
            .zigzag()
            .map_err(|_| DecodeError::TruncatedGeometry)?;
        let dy = self
            .reader
            .zigzag()
            .map_err(|_| DecodeError::TruncatedGeometry)?;
        self.pen_x = self.pen_x.wrapping_add(dx);
        self.pen_y = self.pen_y.wrapping_add(dy);
        #[expect(clippy::cast_precision_loss)]
        Ok(Coord {
            x: self.pen_x as f32 * self.scale,
            y: self.pen_y as f32 * self.scale,
        })
    }
}
