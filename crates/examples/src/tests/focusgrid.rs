use trellis::{
    Canvas, ItemId, Result,
    event::{KeyCode, Modifiers},
    style::Paint,
};

use crate::focusgrid::{FOCUSED, IDLE, build, parse_keys};

fn fill(canvas: &Canvas, item: ItemId) -> Option<Paint> {
    canvas.style(item).ok().flatten().and_then(|s| s.fill)
}

#[test]
fn keys_walk_the_grid_and_restyle_tiles() -> Result<()> {
    let mut canvas = Canvas::new();
    let tiles = build(&mut canvas, 3, 2)?;
    assert_eq!(tiles.len(), 6);

    assert!(canvas.key_press(KeyCode::Tab.into(), 0)?);
    assert_eq!(canvas.focused_item(), Some(tiles[0]));
    assert_eq!(fill(&canvas, tiles[0]), Some(Paint::Solid(FOCUSED)));

    assert!(canvas.key_press(KeyCode::Right.into(), 0)?);
    assert!(canvas.key_press(KeyCode::Down.into(), 0)?);
    assert_eq!(canvas.focused_item(), Some(tiles[4]));
    assert_eq!(fill(&canvas, tiles[0]), Some(Paint::Solid(IDLE)));
    assert_eq!(fill(&canvas, tiles[1]), Some(Paint::Solid(IDLE)));
    assert_eq!(fill(&canvas, tiles[4]), Some(Paint::Solid(FOCUSED)));
    Ok(())
}

#[test]
fn scripts_parse_to_keys() {
    let keys = parse_keys("tab  Right shift-tab").unwrap();
    assert_eq!(
        keys,
        vec![
            KeyCode::Tab.into(),
            KeyCode::Right.into(),
            Modifiers::SHIFT + KeyCode::Tab,
        ]
    );
    assert!(parse_keys("tab jump").is_err());
    assert!(parse_keys("").unwrap().is_empty());
}
