use std::sync::PoisonError;

use tracing::debug;
use trellis::{
    ModelId, Result,
    model::{ModelTree, SharedModel},
    style::{Color, Style},
};

use crate::shapes::{TileItem, TileModel};

/// Palette cycled across rows.
const PALETTE: [Color; 3] = [Color::RED, Color::GREEN, Color::BLUE];

/// A shared model of rows of rectangles, one group per row.
pub struct Board {
    /// The shared tree.
    pub tree: SharedModel,
    /// Root group.
    pub root: ModelId,
    /// Row groups, top to bottom as built.
    pub rows: Vec<ModelId>,
}

impl Board {
    /// Build `rows` rows of `cols` rectangles.
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        let mut tree = ModelTree::new();
        let root = tree.create_group();
        let mut groups = Vec::with_capacity(rows);
        for r in 0..rows {
            let group = tree.create_group();
            tree.add_child(root, group, None)?;
            tree.translate(group, 0.0, r as f64 * 30.0)?;
            tree.set_style(
                group,
                Some(Style::new().with_fill(PALETTE[r % PALETTE.len()]).with_line_width(0.0)),
            )?;
            for c in 0..cols {
                let rect = tree.create(TileModel(TileItem::new(c as f64 * 30.0, 0.0, 25.0, 25.0)));
                tree.add_child(group, rect, None)?;
            }
            groups.push(group);
        }
        Ok(Self {
            tree: tree.shared(),
            root,
            rows: groups,
        })
    }

    /// Run `f` against the tree under its write lock.
    pub fn edit<R>(&self, f: impl FnOnce(&mut ModelTree) -> Result<R>) -> Result<R> {
        let mut tree = self.tree.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut tree)
    }

    /// Move the first rectangle of row `from` to the end of row `to`.
    /// Returns the moved model, if row `from` had any.
    pub fn hop(&self, from: usize, to: usize) -> Result<Option<ModelId>> {
        let (Some(&src), Some(&dst)) = (self.rows.get(from), self.rows.get(to)) else {
            return Ok(None);
        };
        self.edit(|tree| {
            let Some(&first) = tree.children(src).first() else {
                return Ok(None);
            };
            tree.remove(first)?;
            let len = tree.children(dst).len();
            tree.add_child(dst, first, None)?;
            tree.update_data::<TileModel>(first, |m| {
                m.0.rect = m.0.rect.with_origin((len as f64 * 30.0, 0.0));
            })?;
            debug!(from, to, "hop");
            Ok(Some(first))
        })
    }

    /// Restack the rows so the last one comes first. Row positions are
    /// carried by their transforms, so only the paint order changes.
    pub fn rotate_rows(&self) -> Result<()> {
        self.edit(|tree| {
            let n = tree.children(self.root).len();
            if n > 1 {
                tree.move_child(self.root, n - 1, 0)?;
            }
            Ok(())
        })
    }
}
