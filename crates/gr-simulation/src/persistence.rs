//! The persistence boundary.
//!
//! The simulation never waits on storage: saves are issued as mutations happen
//! and a failed save is logged, never retried and never surfaced to the tick.
//! Only the load on connect is allowed to fail a join.

use std::collections::HashMap;

use gr_core::content::QUEST_SLOTS;
use gr_core::{Skill, Skills, TilePos};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::actor::Appearance;
use crate::inventory::{INVENTORY_SIZE, Slot};

/// Storage failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record for the account.
    #[error("no character for account {0}")]
    Missing(i64),

    /// The backing store could not be read or written.
    #[error("storage I/O: {0}")]
    Io(#[from] std::io::Error),

    /// A stored record could not be decoded.
    #[error("corrupt character record: {0}")]
    Corrupt(String),
}

/// Everything stored about a character between sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterRecord {
    /// Account key.
    pub account_id: i64,
    /// Display name.
    pub username: String,
    /// Last saved tile.
    pub position: TilePos,
    /// Skill experience.
    pub skills: Skills,
    /// Inventory slots.
    pub inventory: Vec<Slot>,
    /// Inventory slot holding the weapon.
    pub weapon: Option<usize>,
    /// Inventory slot holding the shield.
    pub shield: Option<usize>,
    /// Appearance colours.
    pub appearance: Appearance,
    /// Progress per quest slot.
    pub quest_progress: Vec<i32>,
}

impl CharacterRecord {
    /// A fresh character standing on `spawn`.
    pub fn new_character(account_id: i64, username: &str, spawn: TilePos) -> Self {
        Self {
            account_id,
            username: username.to_string(),
            position: spawn,
            skills: Skills::default(),
            inventory: vec![Slot::EMPTY; INVENTORY_SIZE],
            weapon: None,
            shield: None,
            appearance: Appearance::default(),
            quest_progress: vec![0; QUEST_SLOTS],
        }
    }
}

/// Character storage. Implementations must be cheap to call from the tick
/// thread; slow backends should queue internally.
pub trait CharacterStore: Send + Sync {
    /// Load a character; `Ok(None)` for an account that never played.
    fn load(&self, account_id: i64) -> Result<Option<CharacterRecord>, StoreError>;

    /// Persist a brand-new character.
    fn create(&self, record: &CharacterRecord) -> Result<(), StoreError>;

    /// Save the current tile.
    fn save_position(&self, account_id: i64, position: TilePos) -> Result<(), StoreError>;

    /// Save all inventory slots.
    fn save_inventory(&self, account_id: i64, slots: &[Slot]) -> Result<(), StoreError>;

    /// Save one skill's experience.
    fn save_skill(&self, account_id: i64, skill: Skill, xp: u32) -> Result<(), StoreError>;

    /// Save the wielded slot references.
    fn save_wieldables(
        &self,
        account_id: i64,
        weapon: Option<usize>,
        shield: Option<usize>,
    ) -> Result<(), StoreError>;

    /// Save appearance colours.
    fn save_appearance(&self, account_id: i64, appearance: Appearance) -> Result<(), StoreError>;

    /// Save quest progress.
    fn save_quest_progress(&self, account_id: i64, progress: &[i32]) -> Result<(), StoreError>;
}

/// In-process store, used by tests and the headless simulate command.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<i64, CharacterRecord>>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a stored record.
    pub fn get(&self, account_id: i64) -> Option<CharacterRecord> {
        self.records.lock().get(&account_id).cloned()
    }

    /// Insert or replace a record.
    pub fn insert(&self, record: CharacterRecord) {
        self.records.lock().insert(record.account_id, record);
    }

    fn update(
        &self,
        account_id: i64,
        f: impl FnOnce(&mut CharacterRecord),
    ) -> Result<(), StoreError> {
        let mut records = self.records.lock();
        let record = records
            .get_mut(&account_id)
            .ok_or(StoreError::Missing(account_id))?;
        f(record);
        Ok(())
    }
}

impl CharacterStore for MemoryStore {
    fn load(&self, account_id: i64) -> Result<Option<CharacterRecord>, StoreError> {
        Ok(self.get(account_id))
    }

    fn create(&self, record: &CharacterRecord) -> Result<(), StoreError> {
        self.insert(record.clone());
        Ok(())
    }

    fn save_position(&self, account_id: i64, position: TilePos) -> Result<(), StoreError> {
        self.update(account_id, |r| r.position = position)
    }

    fn save_inventory(&self, account_id: i64, slots: &[Slot]) -> Result<(), StoreError> {
        self.update(account_id, |r| r.inventory = slots.to_vec())
    }

    fn save_skill(&self, account_id: i64, skill: Skill, xp: u32) -> Result<(), StoreError> {
        self.update(account_id, |r| {
            let mut all = r.skills.as_array();
            all[skill.index()] = xp;
            r.skills = Skills::from_xp(all);
        })
    }

    fn save_wieldables(
        &self,
        account_id: i64,
        weapon: Option<usize>,
        shield: Option<usize>,
    ) -> Result<(), StoreError> {
        self.update(account_id, |r| {
            r.weapon = weapon;
            r.shield = shield;
        })
    }

    fn save_appearance(&self, account_id: i64, appearance: Appearance) -> Result<(), StoreError> {
        self.update(account_id, |r| r.appearance = appearance)
    }

    fn save_quest_progress(&self, account_id: i64, progress: &[i32]) -> Result<(), StoreError> {
        self.update(account_id, |r| r.quest_progress = progress.to_vec())
    }
}
