//! # Style configuration
//!
//! The decoder and label engine take an explicit, immutable [`StyleConfig`]
//! at construction time; there is no process-wide style state. The renderer
//! treats colors as opaque values.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An RGBA color, linear components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

/// Rendering parameters for one recognized road `type` value.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RoadStyle {
    pub color: Color,
    pub outline: Option<Color>,
    /// Half the stroke width, in tile-local units.
    pub half_width: f32,
    /// Roads of this class get a label even below the usual label zoom.
    pub always_label: bool,
}

/// The recognized place label classes, most to least prominent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PlaceClass {
    Country,
    State,
    Settlement,
    SettlementSubdivision,
}

impl PlaceClass {
    /// Maps the wire-format `class` tag value. Unrecognized classes drop the
    /// feature.
    pub fn from_tag(value: &str) -> Option<Self> {
        match value {
            "country" => Some(Self::Country),
            "state" => Some(Self::State),
            "settlement" => Some(Self::Settlement),
            "settlement_subdivision" => Some(Self::SettlementSubdivision),
            _ => None,
        }
    }
}

/// The nine anchor positions a place label's text block can hang from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TextAnchor {
    #[default]
    Center,
    Left,
    Right,
    Top,
    Bottom,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl TextAnchor {
    /// Maps the wire-format `text_anchor` tag value; anything unrecognized
    /// (including a missing tag) anchors at the center.
    pub fn from_tag(value: &str) -> Self {
        match value {
            "left" => Self::Left,
            "right" => Self::Right,
            "top" => Self::Top,
            "bottom" => Self::Bottom,
            "top-left" => Self::TopLeft,
            "top-right" => Self::TopRight,
            "bottom-left" => Self::BottomLeft,
            "bottom-right" => Self::BottomRight,
            _ => Self::Center,
        }
    }
}

/// Marker drawn next to a place label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MarkerGlyph {
    None,
    Dot,
    Ring,
    Star,
}

impl MarkerGlyph {
    /// Marker selection: capitals get a star, settlements a ring, smaller
    /// places a dot; country and state labels are text-only.
    pub fn for_place(class: PlaceClass, is_capital: bool) -> Self {
        if is_capital {
            return Self::Star;
        }
        match class {
            PlaceClass::Country | PlaceClass::State => Self::None,
            PlaceClass::Settlement => Self::Ring,
            PlaceClass::SettlementSubdivision => Self::Dot,
        }
    }
}

/// The immutable style table the tile decoder consults.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StyleConfig {
    /// Road `type` tag value → style. Roads with an unrecognized type
    /// contribute no geometry.
    pub roads: HashMap<String, RoadStyle>,
    pub water_color: Color,
    pub nature_color: Color,
    pub building_color: Color,
}

impl StyleConfig {
    pub fn road_style(&self, kind: &str) -> Option<&RoadStyle> {
        self.roads.get(kind)
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        // Widths are in tile-local units: 2 units of a 4096 extent is about
        // a quarter pixel at a 512 px tile, scaling up as you zoom in.
        let roads = HashMap::from([
            (
                "motorway".to_string(),
                RoadStyle {
                    color: Color::rgb(0.95, 0.70, 0.28),
                    outline: Some(Color::rgb(0.85, 0.55, 0.15)),
                    half_width: 3.0 / 4096.0,
                    always_label: true,
                },
            ),
            (
                "trunk".to_string(),
                RoadStyle {
                    color: Color::rgb(0.96, 0.80, 0.44),
                    outline: Some(Color::rgb(0.85, 0.63, 0.26)),
                    half_width: 2.5 / 4096.0,
                    always_label: true,
                },
            ),
            (
                "primary".to_string(),
                RoadStyle {
                    color: Color::rgb(0.99, 0.91, 0.64),
                    outline: Some(Color::rgb(0.80, 0.72, 0.48)),
                    half_width: 2.0 / 4096.0,
                    always_label: false,
                },
            ),
            (
                "secondary".to_string(),
                RoadStyle {
                    color: Color::rgb(1.0, 1.0, 1.0),
                    outline: Some(Color::rgb(0.78, 0.78, 0.78)),
                    half_width: 1.6 / 4096.0,
                    always_label: false,
                },
            ),
            (
                "street".to_string(),
                RoadStyle {
                    color: Color::rgb(1.0, 1.0, 1.0),
                    outline: None,
                    half_width: 1.2 / 4096.0,
                    always_label: false,
                },
            ),
            (
                "pedestrian".to_string(),
                RoadStyle {
                    color: Color::rgb(0.93, 0.93, 0.91),
                    outline: None,
                    half_width: 0.8 / 4096.0,
                    always_label: false,
                },
            ),
            (
                "rail".to_string(),
                RoadStyle {
                    color: Color::rgb(0.73, 0.73, 0.73),
                    outline: None,
                    half_width: 0.8 / 4096.0,
                    always_label: false,
                },
            ),
        ]);

        Self {
            roads,
            water_color: Color::rgb(0.67, 0.83, 0.94),
            nature_color: Color::rgb(0.80, 0.92, 0.75),
            building_color: Color::rgb(0.85, 0.83, 0.80),
        }
    }
}
