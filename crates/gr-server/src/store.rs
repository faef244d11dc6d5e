//! Characters on disk: one pretty-printed JSON file per account.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use gr_core::{Skill, Skills, TilePos};
use gr_simulation::actor::Appearance;
use gr_simulation::inventory::Slot;
use gr_simulation::{CharacterRecord, CharacterStore, StoreError};
use parking_lot::Mutex;
use tracing::debug;

/// Write-through store keeping every loaded record cached in memory.
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    cache: Mutex<HashMap<i64, CharacterRecord>>,
}

impl JsonFileStore {
    /// Open (and create if needed) the directory `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            cache: Mutex::new(HashMap::new()),
        })
    }

    fn path_for(&self, account_id: i64) -> PathBuf {
        self.dir.join(format!("{account_id}.json"))
    }

    fn read(&self, account_id: i64) -> Result<Option<CharacterRecord>, StoreError> {
        let path = self.path_for(account_id);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)?;
        let record = serde_json::from_str(&text)
            .map_err(|e| StoreError::Corrupt(format!("{}: {e}", path.display())))?;
        Ok(Some(record))
    }

    fn write(&self, record: &CharacterRecord) -> Result<(), StoreError> {
        let text = serde_json::to_string_pretty(record)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        fs::write(self.path_for(record.account_id), text)?;
        debug!(account = record.account_id, "character saved");
        Ok(())
    }

    fn update(
        &self,
        account_id: i64,
        f: impl FnOnce(&mut CharacterRecord),
    ) -> Result<(), StoreError> {
        let mut cache = self.cache.lock();
        if !cache.contains_key(&account_id) {
            let record = self.read(account_id)?.ok_or(StoreError::Missing(account_id))?;
            cache.insert(account_id, record);
        }
        let record = cache
            .get_mut(&account_id)
            .ok_or(StoreError::Missing(account_id))?;
        f(record);
        self.write(record)
    }
}

impl CharacterStore for JsonFileStore {
    fn load(&self, account_id: i64) -> Result<Option<CharacterRecord>, StoreError> {
        if let Some(record) = self.cache.lock().get(&account_id) {
            return Ok(Some(record.clone()));
        }
        let record = self.read(account_id)?;
        if let Some(record) = &record {
            self.cache.lock().insert(account_id, record.clone());
        }
        Ok(record)
    }

    fn create(&self, record: &CharacterRecord) -> Result<(), StoreError> {
        self.write(record)?;
        self.cache.lock().insert(record.account_id, record.clone());
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
