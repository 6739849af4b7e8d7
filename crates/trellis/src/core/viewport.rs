use super::config::{Allocation, Anchor};
use crate::geom::Bounds;

/// A scroll range along one axis, in pixels.
///
/// `value` is the position of the visible page within `[lower, upper]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Adjustment {
    /// Scroll position.
    pub value: f64,
    /// Lowest scroll position.
    pub lower: f64,
    /// Extent of the scrollable content.
    pub upper: f64,
    /// Size of the visible page.
    pub page_size: f64,
    /// Small scroll step.
    pub step_increment: f64,
    /// Large scroll step.
    pub page_increment: f64,
}

impl Adjustment {
    /// Largest valid scroll position.
    pub fn max_value(&self) -> f64 {
        (self.upper - self.page_size).max(self.lower)
    }

    /// Set the content extent and page size, pulling the value back into
    /// range if it now overshoots. Returns true if the value moved.
    pub fn configure(&mut self, upper: f64, page_size: f64) -> bool {
        self.upper = upper;
        self.page_size = page_size;
        self.page_increment = page_size * 0.9;
        self.step_increment = page_size * 0.1;
        let max = (self.upper - self.page_size).max(0.0);
        if self.value > max {
            self.value = max;
            return true;
        }
        false
    }

    /// Scroll to `value`, clamped to the valid range. Returns true if the
    /// value moved.
    pub fn set_value(&mut self, value: f64) -> bool {
        let v = value.clamp(self.lower, self.max_value());
        let moved = v != self.value;
        self.value = v;
        moved
    }

    /// Scroll the minimum amount needed to show `[lower, upper]`, preferring
    /// the start of the range if it does not fit.
    pub fn clamp_page(&mut self, lower: f64, upper: f64) -> bool {
        let lower = lower.clamp(self.lower, self.upper);
        let upper = upper.clamp(self.lower, self.upper);
        let old = self.value;
        if self.value + self.page_size < upper {
            self.value = upper - self.page_size;
        }
        if self.value > lower {
            self.value = lower;
        }
        self.value != old
    }

    /// Scroll by `delta`, clamped.
    pub fn scroll_by(&mut self, delta: f64) -> bool {
        self.set_value(self.value + delta)
    }
}

/// The canvas window inside the host viewport.
///
/// The canvas is laid out as a window at least as large as the viewport. When
/// the canvas content is smaller than the viewport it is placed according to
/// the anchor, recorded as pixel offsets.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Viewport {
    /// Horizontal scroll range.
    pub hadjustment: Adjustment,
    /// Vertical scroll range.
    pub vadjustment: Adjustment,
    /// Horizontal offset of the content within the canvas window.
    pub x_offset: i32,
    /// Vertical offset of the content within the canvas window.
    pub y_offset: i32,
    /// Width of the canvas window.
    pub window_width: i32,
    /// Height of the canvas window.
    pub window_height: i32,
    /// Size of the host viewport.
    pub allocation: Allocation,
}

impl Viewport {
    /// Lay the canvas window out for the given content bounds and scales.
    /// Returns true if the content offsets changed.
    pub fn reconfigure(
        &mut self,
        bounds: &Bounds,
        scale_x: f64,
        scale_y: f64,
        anchor: Anchor,
    ) -> bool {
        let width_pixels = ((bounds.x2 - bounds.x1) * scale_x + 1.0) as i32;
        let height_pixels = ((bounds.y2 - bounds.y1) * scale_y + 1.0) as i32;
        let alloc = self.allocation;

        self.window_width = width_pixels.max(alloc.width);
        self.window_height = height_pixels.max(alloc.height);

        let x_offset = if width_pixels < alloc.width {
            anchor.horizontal().offset(width_pixels, alloc.width)
        } else {
            0
        };
        let y_offset = if height_pixels < alloc.height {
            anchor.vertical().offset(height_pixels, alloc.height)
        } else {
            0
        };

        self.hadjustment
            .configure(f64::from(self.window_width), f64::from(alloc.width));
        self.vadjustment
            .configure(f64::from(self.window_height), f64::from(alloc.height));

        let changed = x_offset != self.x_offset || y_offset != self.y_offset;
        self.x_offset = x_offset;
        self.y_offset = y_offset;
        changed
    }
}
