use trellis::{
    Canvas, Result,
    geom::Bounds,
    model::ModelTree,
    style::{Color, Style},
};

use crate::shapes::{TileItem, TileModel};

#[test]
fn rounded_tiles_miss_their_corners() -> Result<()> {
    let mut canvas = Canvas::new();
    let root = canvas.root();
    let square = canvas.add(root, TileItem::new(0.0, 0.0, 40.0, 40.0))?;
    let rounded = canvas.add(root, TileItem::new(100.0, 0.0, 40.0, 40.0).with_radius(10.0))?;
    let fill = Style::new().with_fill(Color::BLUE).with_line_width(0.0);
    canvas.set_style(square, Some(fill.clone()))?;
    canvas.set_style(rounded, Some(fill))?;

    assert_eq!(canvas.bounds(rounded)?, Bounds::new(100.0, 0.0, 140.0, 40.0));
    assert_eq!(canvas.get_item_at(1.0, 1.0, true)?, Some(square));
    assert_eq!(canvas.get_item_at(101.0, 1.0, true)?, None);
    assert_eq!(canvas.get_item_at(120.0, 20.0, true)?, Some(rounded));
    Ok(())
}

#[test]
fn tile_models_materialize_as_tiles() -> Result<()> {
    let mut tree = ModelTree::new();
    let root = tree.create_group();
    let tile = tree.create(TileModel(TileItem::new(5.0, 5.0, 10.0, 10.0)));
    tree.add_child(root, tile, None)?;

    let mut canvas = Canvas::new();
    canvas.set_root_item_model(tree.shared(), root)?;
    let item = canvas.item_for_model(tile);
    assert!(item.is_some_and(|id| canvas.item::<TileItem>(id).is_some()));
    Ok(())
}
