use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    geom::Bounds,
};

/// Default guard on the number of recompute passes one update may run.
pub const DEFAULT_MAX_UPDATE_PASSES: usize = 64;

/// Units canvas coordinates are measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Device pixels.
    #[default]
    Pixel,
    /// Typographic points, 72 to the inch.
    Points,
    /// Inches.
    Inch,
    /// Millimetres.
    Mm,
}

impl Units {
    /// Device pixels per unit at scale 1.0, given a resolution in pixels per
    /// inch.
    pub fn pixels_per_unit(self, resolution: f64) -> f64 {
        match self {
            Self::Pixel => 1.0,
            Self::Points => resolution / 72.0,
            Self::Inch => resolution,
            Self::Mm => resolution / 25.4,
        }
    }

    /// Line width used when no style sets one. Roughly two points in every
    /// unit system.
    pub fn default_line_width(self) -> f64 {
        match self {
            Self::Pixel | Self::Points => 2.0,
            Self::Inch => 2.0 / 72.0,
            Self::Mm => 0.7,
        }
    }
}

/// Where a canvas smaller than its viewport is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    /// Top left.
    #[default]
    NorthWest,
    /// Top centre.
    North,
    /// Top right.
    NorthEast,
    /// Middle left.
    West,
    /// Centre.
    Center,
    /// Middle right.
    East,
    /// Bottom left.
    SouthWest,
    /// Bottom centre.
    South,
    /// Bottom right.
    SouthEast,
}

/// Placement along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    /// Left or top.
    Start,
    /// Centred.
    Center,
    /// Right or bottom.
    End,
}

impl Align {
    /// Offset of a span of `size` inside `available`.
    pub fn offset(self, size: i32, available: i32) -> i32 {
        match self {
            Self::Start => 0,
            Self::Center => (available - size) / 2,
            Self::End => available - size,
        }
    }
}

impl Anchor {
    /// Horizontal placement.
    pub fn horizontal(self) -> Align {
        match self {
            Self::NorthWest | Self::West | Self::SouthWest => Align::Start,
            Self::North | Self::Center | Self::South => Align::Center,
            Self::NorthEast | Self::East | Self::SouthEast => Align::End,
        }
    }

    /// Vertical placement.
    pub fn vertical(self) -> Align {
        match self {
            Self::NorthWest | Self::North | Self::NorthEast => Align::Start,
            Self::West | Self::Center | Self::East => Align::Center,
            Self::SouthWest | Self::South | Self::SouthEast => Align::End,
        }
    }
}

/// Reading direction, used by tab focus navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    /// Left to right.
    #[default]
    Ltr,
    /// Right to left.
    Rtl,
}

/// Size of the viewport the host gives the canvas, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Allocation {
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl Allocation {
    /// A viewport allocation.
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Canvas configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// The canvas extent, in canvas units.
    pub bounds: Bounds,
    /// Zoom factor.
    pub scale: f64,
    /// Units of canvas coordinates.
    pub units: Units,
    /// Horizontal resolution in pixels per inch.
    pub resolution_x: f64,
    /// Vertical resolution in pixels per inch.
    pub resolution_y: f64,
    /// Placement when the canvas is smaller than the viewport.
    pub anchor: Anchor,
    /// Viewport size.
    pub allocation: Allocation,
    /// Reading direction.
    pub text_direction: TextDirection,
    /// Can the canvas take keyboard focus?
    pub can_focus: bool,
    /// Guard against update cascades that never settle.
    pub max_update_passes: usize,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            bounds: Bounds::new(0.0, 0.0, 1000.0, 1000.0),
            scale: 1.0,
            units: Units::Pixel,
            resolution_x: 96.0,
            resolution_y: 96.0,
            anchor: Anchor::NorthWest,
            allocation: Allocation::default(),
            text_direction: TextDirection::Ltr,
            can_focus: true,
            max_update_passes: DEFAULT_MAX_UPDATE_PASSES,
        }
    }
}

impl CanvasConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the canvas cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(Error::Config(format!("scale must be positive, got {}", self.scale)));
        }
        if !(self.resolution_x > 0.0 && self.resolution_y > 0.0) {
            return Err(Error::Config("resolution must be positive".into()));
        }
        if self.max_update_passes == 0 {
            return Err(Error::Config("max_update_passes must be at least 1".into()));
        }
        Ok(())
    }

    /// Pixels per canvas unit along x and y, including the zoom factor.
    pub fn scales(&self) -> (f64, f64) {
        (
            self.scale * self.units.pixels_per_unit(self.resolution_x),
            self.scale * self.units.pixels_per_unit(self.resolution_y),
        )
    }
}
