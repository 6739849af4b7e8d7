use trellis::{Canvas, Result};

use crate::modelview::Board;

#[test]
fn hops_keep_the_item_and_reach_every_canvas() -> Result<()> {
    let board = Board::new(2, 3)?;
    let mut one = Canvas::new();
    let mut two = Canvas::new();
    let root = one.set_root_item_model(board.tree.clone(), board.root)?;
    two.set_root_item_model(board.tree.clone(), board.root)?;
    assert_eq!(one.children(root).len(), 2);

    let first = board.edit(|t| Ok(t.children(board.rows[0])[0]))?;
    let before = one.item_for_model(first);
    assert_eq!(board.hop(0, 1)?, Some(first));
    one.update()?;
    two.update()?;

    let row0 = one.item_for_model(board.rows[0]).unwrap();
    let row1 = one.item_for_model(board.rows[1]).unwrap();
    assert_eq!(one.children(row0).len(), 2);
    assert_eq!(one.children(row1).len(), 4);
    assert_eq!(one.item_for_model(first), before);

    // Fourth slot of the second row.
    let moved = one.bounds(one.item_for_model(first).unwrap())?;
    assert!(moved.x1 > 88.0 && moved.y1 > 28.0, "{moved:?}");
    let in_two = two.bounds(two.item_for_model(first).unwrap())?;
    assert_eq!(moved, in_two);

    assert_eq!(board.hop(0, 5)?, None);
    Ok(())
}

#[test]
fn rotating_rows_restacks_the_groups() -> Result<()> {
    let board = Board::new(3, 1)?;
    let mut canvas = Canvas::new();
    let root = canvas.set_root_item_model(board.tree.clone(), board.root)?;
    board.rotate_rows()?;
    canvas.update()?;
    let order: Vec<_> = canvas
        .children(root)
        .iter()
        .map(|i| canvas.model_for_item(*i))
        .collect();
    assert_eq!(
        order,
        vec![Some(board.rows[2]), Some(board.rows[0]), Some(board.rows[1])]
    );
    Ok(())
}
