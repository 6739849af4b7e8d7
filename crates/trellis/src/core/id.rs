use slotmap::new_key_type;

new_key_type! {
    /// Opaque, generation-checked identifier for an item in a canvas arena.
    ///
    /// A stale identifier (one whose item has been removed) never aliases a
    /// newer item, so holding one past the item's removal is always safe.
    pub struct ItemId;
}

new_key_type! {
    /// Opaque, generation-checked identifier for a node in a model tree.
    pub struct ModelId;
}
