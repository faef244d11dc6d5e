use gr_core::{ItemId, TilePos};

use crate::changes::ItemFields;
use crate::context::SimContext;
use crate::error::SimResult;
use crate::system::System;

/// An item lying on a tile.
#[derive(Debug, Clone)]
pub struct WorldItem {
    id: ItemId,
    item_type: u32,
    amount: u32,
    position: TilePos,
    deleted: bool,
    despawn_ticks: Option<u32>,
    changed: ItemFields,
}

impl WorldItem {
    /// A new ground item. `despawn_ticks` of `None` keeps it forever.
    pub fn new(item_type: u32, amount: u32, position: TilePos, despawn_ticks: Option<u32>) -> Self {
        Self {
            id: ItemId::new(),
            item_type,
            amount: amount.max(1),
            position,
            deleted: false,
            despawn_ticks,
            changed: ItemFields::all(),
        }
    }

    /// Ground item id.
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Item type.
    pub fn item_type(&self) -> u32 {
        self.item_type
    }

    /// Quantity.
    pub fn amount(&self) -> u32 {
        self.amount
    }

    /// Tile.
    pub fn position(&self) -> TilePos {
        self.position
    }

    /// Picked up or despawned; broadcast once more, then purged.
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Ticks left before despawning.
    pub fn despawn_ticks(&self) -> Option<u32> {
        self.despawn_ticks
    }

    /// Fields changed since the last broadcast.
    pub fn changed(&self) -> ItemFields {
        self.changed
    }

    /// Forget recorded changes.
    pub fn clear_changes(&mut self) {
        self.changed = ItemFields::empty();
    }

    /// Remove the item from play.
    pub fn delete(&mut self) {
        if !self.deleted {
            self.deleted = true;
            self.changed.insert(ItemFields::DELETED);
        }
    }

    /// Count down the despawn timer; deletes the item when it runs out.
    pub fn tick_despawn(&mut self) {
        if self.deleted {
            return;
        }
        if let Some(ticks) = self.despawn_ticks.as_mut() {
            *ticks = ticks.saturating_sub(1);
            if *ticks == 0 {
                self.delete();
            }
        }
    }
}

/// Counts down ground item despawn timers.
#[derive(Debug, Default)]
pub struct ItemSystem;

impl ItemSystem {
    /// Create the system.
    pub fn new() -> Self {
        Self
    }
}

impl System for ItemSystem {
    fn name(&self) -> &str {
        "items"
    }

    fn tick(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()> {
        for item in ctx.world.items_mut() {
            item.tick_despawn();
        }
        Ok(())
    }
}
