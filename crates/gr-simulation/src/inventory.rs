use gr_core::content::ItemData;
use serde::{Deserialize, Serialize};

/// Number of inventory slots a player carries.
pub const INVENTORY_SIZE: usize = 12;

/// One inventory slot. Item id 0 means empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    /// Item type, 0 when empty.
    #[serde(rename = "itemID")]
    pub item_id: u32,
    /// Quantity; always 1 for non-stackables.
    pub amount: u32,
}

impl Slot {
    /// The empty slot.
    pub const EMPTY: Slot = Slot {
        item_id: 0,
        amount: 0,
    };

    /// True when nothing is stored here.
    pub fn is_empty(&self) -> bool {
        self.item_id == 0
    }
}

/// Inventory failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InventoryError {
    /// No free slot.
    #[error("inventory is full")]
    Full,

    /// Slot index outside the inventory.
    #[error("slot {0} is out of range")]
    SlotOutOfRange(usize),

    /// The slot holds nothing.
    #[error("slot {0} is empty")]
    EmptySlot(usize),

    /// More than one unit of a non-stackable item.
    #[error("item {0} is not stackable")]
    NotStackable(u32),

    /// Adding would overflow the stack.
    #[error("stack of item {0} would overflow")]
    StackOverflow(u32),

    /// The item is not carried.
    #[error("item {0} is not carried")]
    NotCarried(u32),
}

/// Fixed-size player inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    slots: Vec<Slot>,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

impl Inventory {
    /// An empty inventory.
    pub fn new() -> Self {
        Self {
            slots: vec![Slot::EMPTY; INVENTORY_SIZE],
        }
    }

    /// Restore from stored slots, padding or truncating to the fixed size.
    pub fn from_slots(mut slots: Vec<Slot>) -> Self {
        slots.resize(INVENTORY_SIZE, Slot::EMPTY);
        Self { slots }
    }

    /// All slots in order.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Slot contents, failing on an out-of-range index.
    pub fn get(&self, index: usize) -> Result<Slot, InventoryError> {
        self.slots
            .get(index)
            .copied()
            .ok_or(InventoryError::SlotOutOfRange(index))
    }

    /// Slot contents, failing when out of range or empty.
    pub fn occupied(&self, index: usize) -> Result<Slot, InventoryError> {
        let slot = self.get(index)?;
        if slot.is_empty() {
            return Err(InventoryError::EmptySlot(index));
        }
        Ok(slot)
    }

    /// True when one more unit of `item` would fit.
    pub fn has_room_for(&self, item: &ItemData) -> bool {
        (item.is_stackable && self.find(item.item_id).is_some()) || self.first_empty().is_some()
    }

    /// Add `quantity` (0 counts as 1) of `item`. Returns the slot used.
    pub fn add(&mut self, item: &ItemData, quantity: u32) -> Result<usize, InventoryError> {
        let quantity = quantity.max(1);
        if item.is_stackable {
            if let Some(index) = self.find(item.item_id) {
                let slot = &mut self.slots[index];
                slot.amount = slot
                    .amount
                    .checked_add(quantity)
                    .ok_or(InventoryError::StackOverflow(item.item_id))?;
                return Ok(index);
            }
        } else if quantity > 1 {
            return Err(InventoryError::NotStackable(item.item_id));
        }

        let index = self.first_empty().ok_or(InventoryError::Full)?;
        self.slots[index] = Slot {
            item_id: item.item_id,
            amount: quantity,
        };
        Ok(index)
    }

    /// Empty a slot and return what was in it.
    pub fn take_slot(&mut self, index: usize) -> Result<Slot, InventoryError> {
        let slot = self.occupied(index)?;
        self.slots[index] = Slot::EMPTY;
        Ok(slot)
    }

    /// Consume one unit from a slot. Returns what remains in it.
    pub fn consume_one(&mut self, index: usize) -> Result<Slot, InventoryError> {
        let mut slot = self.occupied(index)?;
        slot.amount = slot.amount.saturating_sub(1);
        if slot.amount == 0 {
            slot = Slot::EMPTY;
        }
        self.slots[index] = slot;
        Ok(slot)
    }

    /// Remove `amount` of an item from the first slot holding it; 0 removes
    /// the whole stack.
    pub fn remove_item(&mut self, item_id: u32, amount: u32) -> Result<usize, InventoryError> {
        let index = self.find(item_id).ok_or(InventoryError::NotCarried(item_id))?;
        let slot = &mut self.slots[index];
        if amount == 0 || amount >= slot.amount {
            *slot = Slot::EMPTY;
        } else {
            slot.amount -= amount;
        }
        Ok(index)
    }

    /// Swap two slots.
    pub fn swap(&mut self, a: usize, b: usize) -> Result<(), InventoryError> {
        self.get(a)?;
        self.get(b)?;
        self.slots.swap(a, b);
        Ok(())
    }

    /// Empty every slot, returning the non-empty ones.
    pub fn drain(&mut self) -> Vec<Slot> {
        let taken = self.slots.iter().copied().filter(|s| !s.is_empty()).collect();
        self.slots.fill(Slot::EMPTY);
        taken
    }

    /// Total quantity of an item across slots.
    pub fn count(&self, item_id: u32) -> u32 {
        self.slots
            .iter()
            .filter(|s| s.item_id == item_id)
            .map(|s| s.amount)
            .sum()
    }

    /// Item ids in slot order (wire `inventory`).
    pub fn item_ids(&self) -> Vec<u32> {
        self.slots.iter().map(|s| s.item_id).collect()
    }

    /// Amounts in slot order (wire `inventoryAmounts`).
    pub fn amounts(&self) -> Vec<u32> {
        self.slots.iter().map(|s| s.amount).collect()
    }

    fn find(&self, item_id: u32) -> Option<usize> {
        self.slots.iter().position(|s| s.item_id == item_id)
    }

    fn first_empty(&self) -> Option<usize> {
        self.slots.iter().position(Slot::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(item_id: u32, is_stackable: bool) -> ItemData {
        ItemData {
            item_id,
            name: format!("item {item_id}"),
            examine: String::new(),
            is_stackable,
            value: 0,
            wieldable: None,
            heal_amount: None,
        }
    }

    #[test]
    fn stackables_merge() {
        let coins = item(102, true);
        let mut inv = Inventory::new();
        assert_eq!(inv.add(&coins, 5).unwrap(), 0);
        assert_eq!(inv.add(&coins, 7).unwrap(), 0);
        assert_eq!(inv.count(102), 12);
        assert_eq!(inv.slots()[1], Slot::EMPTY);
    }

    #[test]
    fn stack_overflow_is_rejected() {
        let coins = item(102, true);
        let mut inv = Inventory::new();
        inv.add(&coins, u32::MAX).unwrap();
        assert_eq!(inv.add(&coins, 1), Err(InventoryError::StackOverflow(102)));
        assert_eq!(inv.count(102), u32::MAX);
    }

    #[test]
    fn full_inventory_rejects() {
        let sword = item(100, false);
        let mut inv = Inventory::new();
        for _ in 0..INVENTORY_SIZE {
            inv.add(&sword, 1).unwrap();
        }
        assert!(!inv.has_room_for(&sword));
        assert_eq!(inv.add(&sword, 1), Err(InventoryError::Full));
    }

    #[test]
    fn non_stackable_quantity_rejected() {
        let sword = item(100, false);
        let mut inv = Inventory::new();
        assert_eq!(inv.add(&sword, 2), Err(InventoryError::NotStackable(100)));
        assert_eq!(inv.add(&sword, 0), Ok(0));
        assert_eq!(inv.slots()[0].amount, 1);
    }

    #[test]
    fn slot_operations_check_bounds() {
        let mut inv = Inventory::new();
        assert_eq!(inv.take_slot(3), Err(InventoryError::EmptySlot(3)));
        assert_eq!(inv.take_slot(99), Err(InventoryError::SlotOutOfRange(99)));
        assert_eq!(inv.swap(0, 12), Err(InventoryError::SlotOutOfRange(12)));
    }

    #[test]
    fn consume_and_remove() {
        let coins = item(102, true);
        let mut inv = Inventory::new();
        inv.add(&coins, 3).unwrap();
        assert_eq!(inv.consume_one(0).unwrap().amount, 2);
        inv.remove_item(102, 1).unwrap();
        assert_eq!(inv.count(102), 1);
        inv.remove_item(102, 0).unwrap();
        assert!(inv.slots()[0].is_empty());
        assert_eq!(inv.remove_item(102, 1), Err(InventoryError::NotCarried(102)));
    }

    #[test]
    fn from_slots_pads_and_drains() {
        let mut inv = Inventory::from_slots(vec![Slot {
            item_id: 5,
            amount: 1,
        }]);
        assert_eq!(inv.slots().len(), INVENTORY_SIZE);
        assert_eq!(inv.drain().len(), 1);
        assert!(inv.slots().iter().all(Slot::is_empty));
    }
}
