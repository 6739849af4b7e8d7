use anyhow::bail;
use trellis::{
    Canvas, ItemId, Result,
    event::{Event, EventOutcome, Key, KeyCode, Modifiers},
    style::{Color, Paint, Style},
};

use crate::shapes::TileItem;

/// Fill for tiles without focus.
pub const IDLE: Color = Color::rgb(200, 200, 200);
/// Fill for the focused tile.
pub const FOCUSED: Color = Color::rgb(255, 160, 0);

/// Tile edge length.
const TILE: f64 = 50.0;
/// Distance between tile origins.
const PITCH: f64 = 60.0;
/// Tile corner radius.
const RADIUS: f64 = 6.0;

/// Lay out a `cols` by `rows` grid of focusable tiles in reading order.
/// Tiles restyle themselves as focus comes and goes.
pub fn build(canvas: &mut Canvas, cols: usize, rows: usize) -> Result<Vec<ItemId>> {
    let root = canvas.root();
    let mut tiles = Vec::with_capacity(cols * rows);
    for row in 0..rows {
        for col in 0..cols {
            let id = canvas.add(
                root,
                TileItem::new(col as f64 * PITCH, row as f64 * PITCH, TILE, TILE).with_radius(RADIUS),
            )?;
            canvas.set_can_focus(id, true)?;
            canvas.set_style(id, Some(Style::new().with_fill(IDLE).with_line_width(1.0)))?;
            canvas.connect(id, |canvas, cx, event| {
                let fill = match event {
                    Event::FocusIn => FOCUSED,
                    Event::FocusOut => IDLE,
                    _ => return Ok(EventOutcome::Ignore),
                };
                canvas.update_style(cx.current, |s| s.fill = Some(Paint::Solid(fill)))?;
                Ok(EventOutcome::Ignore)
            })?;
            tiles.push(id);
        }
    }
    Ok(tiles)
}

/// Parse a whitespace separated navigation script such as
/// `"tab tab right down shift-tab"`.
pub fn parse_keys(script: &str) -> anyhow::Result<Vec<Key>> {
    script
        .split_whitespace()
        .map(|word| {
            Ok(match word.to_ascii_lowercase().as_str() {
                "tab" => KeyCode::Tab.into(),
                "shift-tab" | "backtab" => Modifiers::SHIFT + KeyCode::Tab,
                "left" => KeyCode::Left.into(),
                "right" => KeyCode::Right.into(),
                "up" => KeyCode::Up.into(),
                "down" => KeyCode::Down.into(),
                other => bail!("unknown key {other:?}"),
            })
        })
        .collect()
}
