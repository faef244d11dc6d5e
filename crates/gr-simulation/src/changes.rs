//! Per-entity change sets.
//!
//! Every field that appears on the wire has one bit. Mutations go through the
//! owning type's setters, which mark the bit when the value actually changes;
//! the delta encoder reads the bits and the scheduler clears them once per
//! tick after every connection has been served.

use bitflags::bitflags;

bitflags! {
    /// Changed wire fields of an actor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ActorFields: u32 {
        /// Username (players) or species index (NPCs).
        const IDENTITY = 1 << 0;
        /// Current and previous tile.
        const POSITION = 1 << 1;
        /// Facing direction.
        const FACING = 1 << 2;
        /// Direction of the next queued step.
        const NEXT_DIRECTION = 1 << 3;
        /// Dying flag.
        const DYING = 1 << 4;
        /// Current hitpoints.
        const HITPOINTS = 1 << 5;
        /// In-combat flag.
        const IN_COMBAT = 1 << 6;
        /// Last damage taken (hit splat).
        const LAST_DAMAGE = 1 << 7;
        /// Weapon slot reference.
        const WEAPON = 1 << 8;
        /// Shield slot reference.
        const SHIELD = 1 << 9;
        /// Attack style.
        const ATTACK_STYLE = 1 << 10;
        /// Skill experience.
        const SKILLS = 1 << 11;
        /// Inventory contents.
        const INVENTORY = 1 << 12;
        /// Quest progress.
        const QUEST_PROGRESS = 1 << 13;
        /// Influence points.
        const INFLUENCE = 1 << 14;
        /// Appearance colours.
        const APPEARANCE = 1 << 15;
        /// Hidden while waiting to respawn.
        const RESPAWNING = 1 << 16;
    }
}

bitflags! {
    /// Changed wire fields of a ground item.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ItemFields: u8 {
        /// Item type.
        const ITEM_TYPE = 1 << 0;
        /// Quantity.
        const AMOUNT = 1 << 1;
        /// Tile.
        const POSITION = 1 << 2;
        /// Deleted flag.
        const DELETED = 1 << 3;
    }
}

/// Assign `value` to `slot`, marking `field` in `changed` only if it differs.
pub(crate) fn assign<T: PartialEq>(
    changed: &mut ActorFields,
    field: ActorFields,
    slot: &mut T,
    value: T,
) {
    if *slot != value {
        *slot = value;
        changed.insert(field);
    }
}
