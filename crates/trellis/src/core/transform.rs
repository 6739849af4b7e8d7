//! Transform composition helpers.
//!
//! The incremental helpers (`translate`, `scale`, `rotate`, `skew_x`,
//! `skew_y`) post-multiply: the new operation is applied in the item's own
//! space, before the existing transform. This matches how drawing APIs
//! compose `translate`/`rotate` calls onto the current matrix.

use kurbo::{Affine, Vec2};

use super::canvas::Canvas;
use crate::{
    ItemId,
    error::{Error, Result},
    geom::invert,
};

/// Build a transform from an origin, uniform scale and rotation in degrees.
pub fn simple(x: f64, y: f64, scale: f64, rotation_degrees: f64) -> Affine {
    Affine::translate((x, y)) * Affine::scale(scale) * Affine::rotate(rotation_degrees.to_radians())
}

/// Append a translation.
pub fn translate(base: Affine, tx: f64, ty: f64) -> Affine {
    base * Affine::translate((tx, ty))
}

/// Append a scale.
pub fn scale(base: Affine, sx: f64, sy: f64) -> Affine {
    base * Affine::scale_non_uniform(sx, sy)
}

/// Append a rotation of `degrees` about `(cx, cy)`.
pub fn rotate(base: Affine, degrees: f64, cx: f64, cy: f64) -> Affine {
    about(base, cx, cy, Affine::rotate(degrees.to_radians()))
}

/// Append a horizontal skew of `degrees` about `(cx, cy)`.
pub fn skew_x(base: Affine, degrees: f64, cx: f64, cy: f64) -> Affine {
    about(base, cx, cy, Affine::skew(degrees.to_radians().tan(), 0.0))
}

/// Append a vertical skew of `degrees` about `(cx, cy)`.
pub fn skew_y(base: Affine, degrees: f64, cx: f64, cy: f64) -> Affine {
    about(base, cx, cy, Affine::skew(0.0, degrees.to_radians().tan()))
}

/// Apply `op` centred on `(cx, cy)`.
fn about(base: Affine, cx: f64, cy: f64, op: Affine) -> Affine {
    let c = Vec2::new(cx, cy);
    base * Affine::translate(c) * op * Affine::translate(-c)
}

/// The chain of items from the root down to `item`, inclusive.
pub(crate) fn ancestry(canvas: &Canvas, item: ItemId) -> Result<Vec<ItemId>> {
    let mut chain = Vec::new();
    let mut cur = Some(item);
    while let Some(id) = cur {
        let node = canvas.items.get(id).ok_or(Error::ItemNotFound(id))?;
        chain.push(id);
        cur = node.parent;
    }
    chain.reverse();
    Ok(chain)
}

/// The per-level transforms from the root down to `item`.
///
/// Each ancestor contributes its own transform combined with any extra
/// transform it applies to the next item down the chain. The item itself
/// contributes only its own transform.
fn steps(canvas: &Canvas, item: ItemId) -> Result<Vec<Affine>> {
    let chain = ancestry(canvas, item)?;
    let mut out = Vec::with_capacity(chain.len());
    for (i, id) in chain.iter().enumerate() {
        let node = canvas.items.get(*id).ok_or(Error::ItemNotFound(*id))?;
        let own = node.props.transform_or_identity();
        let step = match chain.get(i + 1) {
            Some(next) => match node.item.child_transform(*next) {
                Some(extra) => own * extra,
                None => own,
            },
            None => own,
        };
        out.push(step);
    }
    Ok(out)
}

/// The transform mapping `item`'s local space into canvas space.
pub(crate) fn item_to_canvas(canvas: &Canvas, item: ItemId) -> Result<Affine> {
    Ok(steps(canvas, item)?
        .into_iter()
        .fold(Affine::IDENTITY, |acc, step| acc * step))
}

/// The transform mapping canvas space into `item`'s local space.
pub(crate) fn canvas_to_item(canvas: &Canvas, item: ItemId) -> Result<Affine> {
    let mut acc = Affine::IDENTITY;
    for step in steps(canvas, item)? {
        acc = invert(step).ok_or(Error::NotInvertible)? * acc;
    }
    Ok(acc)
}
