/// Color values.
mod color;

use std::sync::Arc;

use kurbo::{Cap, Join, Stroke};
use serde::{Deserialize, Serialize};

pub use color::Color;

/// How a region is painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Paint {
    /// Explicitly paint nothing. Distinct from leaving the paint unset.
    None,
    /// A solid color.
    Solid(Color),
}

impl From<Color> for Paint {
    fn from(c: Color) -> Self {
        Self::Solid(c)
    }
}

/// Rule deciding which points are inside a self-intersecting path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FillRule {
    /// Inside when the winding number is non-zero.
    #[default]
    NonZero,
    /// Inside when the winding number is odd.
    EvenOdd,
}

impl FillRule {
    /// Interpret a winding number under this rule.
    pub fn is_inside(self, winding: i32) -> bool {
        match self {
            Self::NonZero => winding != 0,
            Self::EvenOdd => winding % 2 != 0,
        }
    }
}

/// Compositing operator applied when painting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Operator {
    /// Draw source over destination.
    #[default]
    Over,
    /// Replace destination with source.
    Source,
    /// Clear the destination.
    Clear,
    /// Add source to destination.
    Add,
    /// Multiply source and destination.
    Multiply,
    /// Exclusive or.
    Xor,
}

/// Antialiasing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Antialias {
    /// Backend default.
    #[default]
    Default,
    /// No antialiasing.
    None,
    /// Greyscale antialiasing.
    Gray,
    /// Subpixel antialiasing.
    Subpixel,
}

/// Shape of stroke endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineCap {
    /// Stop exactly at the endpoint.
    #[default]
    Butt,
    /// Round cap centred on the endpoint.
    Round,
    /// Square cap extending past the endpoint.
    Square,
}

/// Shape of stroke corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineJoin {
    /// Sharp corner, limited by the miter limit.
    #[default]
    Miter,
    /// Rounded corner.
    Round,
    /// Cut-off corner.
    Bevel,
}

/// Font metric hinting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HintMetrics {
    /// Backend default.
    #[default]
    Default,
    /// Do not hint metrics.
    Off,
    /// Hint metrics.
    On,
}

/// A dash pattern.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LineDash {
    /// Alternating on/off lengths.
    pub dashes: Vec<f64>,
    /// Offset into the pattern at the start of the stroke.
    pub offset: f64,
}

/// Cascading paint, line and font attributes.
///
/// Every property is optional. Unset properties are looked up along the
/// parent chain, so a style only needs to carry what it overrides. The parent
/// link is runtime state and is not serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    /// Stroke paint. Unset strokes in black.
    pub stroke: Option<Paint>,
    /// Fill paint. Unset does not fill.
    pub fill: Option<Paint>,
    /// Fill rule for fills and fill hit-testing.
    pub fill_rule: Option<FillRule>,
    /// Compositing operator.
    pub operator: Option<Operator>,
    /// Antialiasing mode.
    pub antialias: Option<Antialias>,
    /// Stroke width. Unset uses the canvas default for its units.
    pub line_width: Option<f64>,
    /// Stroke endpoint style.
    pub line_cap: Option<LineCap>,
    /// Stroke corner style.
    pub line_join: Option<LineJoin>,
    /// Miter length limit, relative to the line width.
    pub miter_limit: Option<f64>,
    /// Dash pattern.
    pub line_dash: Option<LineDash>,
    /// Font description string, passed through to text items.
    pub font: Option<String>,
    /// Font metric hinting.
    pub hint_metrics: Option<HintMetrics>,
    /// Style consulted for unset properties.
    #[serde(skip)]
    parent: Option<Arc<Self>>,
}

/// Resolved fill attributes for one paint call.
#[derive(Debug, Clone, PartialEq)]
pub struct FillOptions {
    /// Fill color.
    pub color: Color,
    /// Fill rule.
    pub rule: FillRule,
    /// Compositing operator.
    pub operator: Operator,
    /// Antialiasing mode.
    pub antialias: Antialias,
}

/// Resolved stroke attributes for one paint call.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeOptions {
    /// Stroke color.
    pub color: Color,
    /// Geometric stroke parameters.
    pub stroke: Stroke,
    /// Compositing operator.
    pub operator: Operator,
    /// Antialiasing mode.
    pub antialias: Antialias,
}

/// Miter limit used when no style sets one.
const DEFAULT_MITER_LIMIT: f64 = 10.0;

impl Style {
    /// An empty style.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fill paint.
    pub fn with_fill(mut self, paint: impl Into<Paint>) -> Self {
        self.fill = Some(paint.into());
        self
    }

    /// Set the stroke paint.
    pub fn with_stroke(mut self, paint: impl Into<Paint>) -> Self {
        self.stroke = Some(paint.into());
        self
    }

    /// Set the line width.
    pub fn with_line_width(mut self, width: f64) -> Self {
        self.line_width = Some(width);
        self
    }

    /// Set the fill rule.
    pub fn with_fill_rule(mut self, rule: FillRule) -> Self {
        self.fill_rule = Some(rule);
        self
    }

    /// A copy of this style that inherits unset properties from `parent`.
    pub fn with_parent(&self, parent: Option<Arc<Self>>) -> Self {
        Self {
            parent,
            ..self.clone()
        }
    }

    /// The style unset properties are inherited from.
    pub fn parent(&self) -> Option<&Arc<Self>> {
        self.parent.as_ref()
    }

    /// Find the first value of a property along the parent chain.
    pub fn lookup<T: Clone>(&self, get: impl Fn(&Self) -> Option<&T>) -> Option<T> {
        let mut cur = Some(self);
        while let Some(s) = cur {
            if let Some(v) = get(s) {
                return Some(v.clone());
            }
            cur = s.parent.as_deref();
        }
        None
    }

    /// The fill rule in effect.
    pub fn effective_fill_rule(&self) -> FillRule {
        self.lookup(|s| s.fill_rule.as_ref()).unwrap_or_default()
    }

    /// Stroke geometry in effect, whether or not the stroke is painted.
    pub fn stroke_geometry(&self, default_line_width: f64) -> Stroke {
        let width = self
            .lookup(|s| s.line_width.as_ref())
            .unwrap_or(default_line_width);
        let cap = match self.lookup(|s| s.line_cap.as_ref()).unwrap_or_default() {
            LineCap::Butt => Cap::Butt,
            LineCap::Round => Cap::Round,
            LineCap::Square => Cap::Square,
        };
        let join = match self.lookup(|s| s.line_join.as_ref()).unwrap_or_default() {
            LineJoin::Miter => Join::Miter,
            LineJoin::Round => Join::Round,
            LineJoin::Bevel => Join::Bevel,
        };
        let mut stroke = Stroke::new(width)
            .with_caps(cap)
            .with_join(join)
            .with_miter_limit(
                self.lookup(|s| s.miter_limit.as_ref())
                    .unwrap_or(DEFAULT_MITER_LIMIT),
            );
        if let Some(dash) = self.lookup(|s| s.line_dash.as_ref())
            && !dash.dashes.is_empty()
        {
            stroke = stroke.with_dashes(dash.offset, dash.dashes);
        }
        stroke
    }

    /// Fill attributes, or `None` when nothing is filled.
    pub fn fill_options(&self) -> Option<FillOptions> {
        match self.lookup(|s| s.fill.as_ref())? {
            Paint::None => None,
            Paint::Solid(color) => Some(FillOptions {
                color,
                rule: self.effective_fill_rule(),
                operator: self.lookup(|s| s.operator.as_ref()).unwrap_or_default(),
                antialias: self.lookup(|s| s.antialias.as_ref()).unwrap_or_default(),
            }),
        }
    }

    /// Stroke attributes, or `None` when the stroke is explicitly disabled.
    pub fn stroke_options(&self, default_line_width: f64) -> Option<StrokeOptions> {
        let color = match self.lookup(|s| s.stroke.as_ref()) {
            None => Color::BLACK,
            Some(Paint::None) => return None,
            Some(Paint::Solid(c)) => c,
        };
        Some(StrokeOptions {
            color,
            stroke: self.stroke_geometry(default_line_width),
            operator: self.lookup(|s| s.operator.as_ref()).unwrap_or_default(),
            antialias: self.lookup(|s| s.antialias.as_ref()).unwrap_or_default(),
        })
    }

    /// Is a fill paint set anywhere along the chain?
    pub fn has_fill(&self) -> bool {
        self.fill_options().is_some()
    }

    /// Would a stroke be painted?
    pub fn has_stroke(&self) -> bool {
        !matches!(self.lookup(|s| s.stroke.as_ref()), Some(Paint::None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inherits_from_parent() {
        let parent = Arc::new(Style::new().with_fill(Color::RED).with_line_width(4.0));
        let child = Style::new().with_line_width(1.0).with_parent(Some(parent));

        let fill = child.fill_options().map(|f| f.color);
        assert_eq!(fill, Some(Color::RED));
        assert_eq!(child.stroke_geometry(2.0).width, 1.0);
    }

    #[test]
    fn stroke_defaults() {
        let s = Style::new();
        let opts = s.stroke_options(2.0);
        assert_eq!(opts.as_ref().map(|o| o.color), Some(Color::BLACK));
        assert_eq!(opts.map(|o| o.stroke.width), Some(2.0));
        assert!(s.fill_options().is_none());

        let none = Style::new().with_stroke(Paint::None);
        assert!(none.stroke_options(2.0).is_none());
        assert!(!none.has_stroke());
    }

    #[test]
    fn explicit_none_overrides_parent_fill() {
        let parent = Arc::new(Style::new().with_fill(Color::BLUE));
        let child = Style::new().with_fill(Paint::None).with_parent(Some(parent));
        assert!(!child.has_fill());
    }

    #[test]
    fn fill_rules() {
        assert!(FillRule::NonZero.is_inside(2));
        assert!(!FillRule::EvenOdd.is_inside(2));
        assert!(FillRule::EvenOdd.is_inside(-1));
    }

    #[test]
    fn parent_is_not_serialized() -> crate::Result<()> {
        let parent = Arc::new(Style::new().with_fill(Color::RED));
        let s = Style::new().with_line_width(3.0).with_parent(Some(parent));
        let json = serde_json::to_string(&s)?;
        let back: Style = serde_json::from_str(&json)?;
        assert_eq!(back.line_width, Some(3.0));
        assert!(back.parent().is_none());
        Ok(())
    }
}
