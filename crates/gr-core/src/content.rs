use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::drop_table::{DropEntry, DropTable};
use crate::error::{CoreError, CoreResult};
use crate::geometry::TilePos;
use crate::skills::{Skill, Skills};

/// Number of quest progress slots every player carries.
pub const QUEST_SLOTS: usize = 10;
/// Progress value that marks a quest as complete.
pub const QUEST_COMPLETE: i32 = 100;
/// Attack speed in ticks when nothing is wielded.
pub const DEFAULT_ATTACK_SPEED: u32 = 4;

/// Which hand a wieldable goes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WieldSlot {
    /// Main hand.
    Weapon,
    /// Off hand.
    Shield,
}

/// Combat stats of a wieldable item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wieldable {
    /// Slot this item occupies.
    pub slot: WieldSlot,
    /// Ticks between attacks.
    #[serde(default = "default_attack_speed")]
    pub attack_speed: u32,
    /// Added to the attacker's accuracy roll.
    #[serde(default)]
    pub accuracy_bonus: u32,
    /// Added to the attacker's strength for the max hit.
    #[serde(default)]
    pub strength_bonus: u32,
}

fn default_attack_speed() -> u32 {
    DEFAULT_ATTACK_SPEED
}

/// Static definition of an item type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemData {
    /// Item type id. 0 is reserved for "empty slot".
    #[serde(rename = "itemID")]
    pub item_id: u32,
    /// Display name.
    pub name: String,
    /// Examine text.
    #[serde(default)]
    pub examine: String,
    /// Stackable items share one inventory slot.
    #[serde(default)]
    pub is_stackable: bool,
    /// Shop value.
    #[serde(default)]
    pub value: u32,
    /// Present when the item can be wielded.
    #[serde(default)]
    pub wieldable: Option<Wieldable>,
    /// Hitpoints restored when eaten; present when the item is edible.
    #[serde(default)]
    pub heal_amount: Option<u32>,
}

/// A quest advanced when a player kills a species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestStep {
    /// Quest slot.
    #[serde(rename = "questID")]
    pub quest_id: usize,
    /// Progress to set.
    pub progress: i32,
}

/// Static definition of an NPC species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesData {
    /// Species index sent to clients as `npcIndex`.
    pub entity_index: u32,
    /// Display name.
    pub name: String,
    /// Examine text.
    #[serde(default)]
    pub examine: String,
    /// Ticks spent hidden before respawning.
    pub respawn_time: u32,
    /// Experience per skill.
    pub skills: Skills,
    /// Players can talk to it.
    #[serde(default)]
    pub is_talkable: bool,
    /// Players can attack it.
    #[serde(default = "yes")]
    pub is_attackable: bool,
    /// Loot rolled on death.
    #[serde(default)]
    pub drop_table: DropTable,
    /// Quest progress granted to the killer.
    #[serde(default)]
    pub kill_quest: Option<QuestStep>,
}

fn yes() -> bool {
    true
}

/// Experience granted by a quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillReward {
    /// Skill trained.
    pub skill: Skill,
    /// Experience added.
    pub xp: u32,
}

/// An item granted by a quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemReward {
    /// Item type.
    #[serde(rename = "itemID")]
    pub item_id: u32,
    /// Quantity.
    pub amount: u32,
}

/// Everything granted on quest completion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestReward {
    /// Influence points.
    #[serde(default)]
    pub influence: i32,
    /// Experience grants.
    #[serde(default)]
    pub experience: Vec<SkillReward>,
    /// Item grants.
    #[serde(default)]
    pub items: Vec<ItemReward>,
}

/// Static definition of a quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestData {
    /// Quest slot in the player's progress array.
    #[serde(rename = "questID")]
    pub quest_id: usize,
    /// Display name.
    pub name: String,
    /// Completion reward.
    #[serde(default)]
    pub reward: QuestReward,
}

/// An NPC placed at world start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NpcSpawn {
    /// Species to spawn.
    pub entity_index: u32,
    /// Spawn tile; also the centre of the wander area.
    pub position: TilePos,
    /// Half-width of the square wander area around the spawn tile.
    #[serde(default)]
    pub wander_range: i32,
}

/// A ground item placed at world start. These never despawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSpawn {
    /// Item type.
    #[serde(rename = "itemID")]
    pub item_id: u32,
    /// Tile.
    pub position: TilePos,
    /// Quantity.
    #[serde(default = "one")]
    pub amount: u32,
}

fn one() -> u32 {
    1
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentFile {
    #[serde(default)]
    items: Vec<ItemData>,
    #[serde(default)]
    species: Vec<SpeciesData>,
    #[serde(default)]
    quests: Vec<QuestData>,
    #[serde(default)]
    npc_spawns: Vec<NpcSpawn>,
    #[serde(default)]
    item_spawns: Vec<ItemSpawn>,
}

/// Read-only lookup of all static content.
#[derive(Debug, Clone, Default)]
pub struct ContentRegistry {
    items: HashMap<u32, ItemData>,
    species: HashMap<u32, SpeciesData>,
    quests: HashMap<usize, QuestData>,
    npc_spawns: Vec<NpcSpawn>,
    item_spawns: Vec<ItemSpawn>,
}

impl ContentRegistry {
    /// Parse and validate a content JSON document.
    pub fn from_json(text: &str) -> CoreResult<Self> {
        let file: ContentFile = serde_json::from_str(text)?;
        Self::from_parts(
            file.items,
            file.species,
            file.quests,
            file.npc_spawns,
            file.item_spawns,
        )
    }

    /// Build a registry from tables, checking cross references.
    pub fn from_parts(
        items: Vec<ItemData>,
        species: Vec<SpeciesData>,
        quests: Vec<QuestData>,
        npc_spawns: Vec<NpcSpawn>,
        item_spawns: Vec<ItemSpawn>,
    ) -> CoreResult<Self> {
        let mut registry = Self::default();

        for item in items {
            if item.item_id == 0 {
                return Err(CoreError::Content(format!(
                    "item '{}' uses reserved id 0",
                    item.name
                )));
            }
            if let Some(prev) = registry.items.insert(item.item_id, item) {
                return Err(CoreError::Content(format!("duplicate item id {}", prev.item_id)));
            }
        }
        for quest in quests {
            if quest.quest_id >= QUEST_SLOTS {
                return Err(CoreError::Content(format!(
                    "quest id {} exceeds {QUEST_SLOTS} slots",
                    quest.quest_id
                )));
            }
            for reward in &quest.reward.items {
                registry.check_item(reward.item_id, &quest.name)?;
            }
            if let Some(prev) = registry.quests.insert(quest.quest_id, quest) {
                return Err(CoreError::Content(format!("duplicate quest id {}", prev.quest_id)));
            }
        }
        for s in species {
            for DropEntry { item_id, .. } in &s.drop_table.0 {
                registry.check_item(*item_id, &s.name)?;
            }
            if s.drop_table.total_chance() > 1.0 + f64::EPSILON {
                return Err(CoreError::Content(format!(
                    "drop chances of '{}' add up to more than 1",
                    s.name
                )));
            }
            if let Some(step) = s.kill_quest
                && !registry.quests.contains_key(&step.quest_id)
            {
                return Err(CoreError::Content(format!(
                    "'{}' advances unknown quest {}",
                    s.name, step.quest_id
                )));
            }
            if let Some(prev) = registry.species.insert(s.entity_index, s) {
                return Err(CoreError::Content(format!(
                    "duplicate species index {}",
                    prev.entity_index
                )));
            }
        }
        for spawn in &npc_spawns {
            if !registry.species.contains_key(&spawn.entity_index) {
                return Err(CoreError::Content(format!(
                    "spawn references unknown species {}",
                    spawn.entity_index
                )));
            }
        }
        for spawn in &item_spawns {
            registry.check_item(spawn.item_id, "item spawn")?;
        }

        registry.npc_spawns = npc_spawns;
        registry.item_spawns = item_spawns;
        Ok(registry)
    }

    fn check_item(&self, item_id: u32, owner: &str) -> CoreResult<()> {
        if self.items.contains_key(&item_id) {
            Ok(())
        } else {
            Err(CoreError::Content(format!(
                "'{owner}' references unknown item {item_id}"
            )))
        }
    }

    /// The content shipped with the server: a town with a guide, a few men
    /// wandering a field, and starter equipment on the ground.
    pub fn builtin() -> Self {
        let items = vec![
            ItemData {
                item_id: 100,
                name: "Bronze sword".to_string(),
                examine: "A short bronze blade.".to_string(),
                is_stackable: false,
                value: 20,
                wieldable: Some(Wieldable {
                    slot: WieldSlot::Weapon,
                    attack_speed: 4,
                    accuracy_bonus: 4,
                    strength_bonus: 3,
                }),
                heal_amount: None,
            },
            ItemData {
                item_id: 101,
                name: "Wooden shield".to_string(),
                examine: "Better than nothing.".to_string(),
                is_stackable: false,
                value: 15,
                wieldable: Some(Wieldable {
                    slot: WieldSlot::Shield,
                    attack_speed: DEFAULT_ATTACK_SPEED,
                    accuracy_bonus: 0,
                    strength_bonus: 0,
                }),
                heal_amount: None,
            },
            ItemData {
                item_id: 102,
                name: "Coins".to_string(),
                examine: "Lovely money!".to_string(),
                is_stackable: true,
                value: 1,
                wieldable: None,
                heal_amount: None,
            },
            ItemData {
                item_id: 103,
                name: "Bread".to_string(),
                examine: "Freshly baked.".to_string(),
                is_stackable: false,
                value: 4,
                wieldable: None,
                heal_amount: Some(3),
            },
            ItemData {
                item_id: 104,
                name: "Bones".to_string(),
                examine: "Someone's leftovers.".to_string(),
                is_stackable: false,
                value: 1,
                wieldable: None,
                heal_amount: None,
            },
        ];
        let quests = vec![QuestData {
            quest_id: 0,
            name: "Pest Control".to_string(),
            reward: QuestReward {
                influence: 1,
                experience: vec![SkillReward {
                    skill: Skill::Attack,
                    xp: 500,
                }],
                items: vec![ItemReward {
                    item_id: 102,
                    amount: 25,
                }],
            },
        }];
        let species = vec![
            SpeciesData {
                entity_index: 0,
                name: "Man".to_string(),
                examine: "One of the locals.".to_string(),
                respawn_time: 20,
                skills: Skills::from_levels(2, 2, 2, 7),
                is_talkable: true,
                is_attackable: true,
                drop_table: DropTable::new(vec![
                    DropEntry {
                        item_id: 102,
                        drop_chance: 0.5,
                        amount: 5,
                    },
                    DropEntry {
                        item_id: 104,
                        drop_chance: 0.3,
                        amount: 0,
                    },
                ]),
                kill_quest: Some(QuestStep {
                    quest_id: 0,
                    progress: 50,
                }),
            },
            SpeciesData {
                entity_index: 1,
                name: "Guide".to_string(),
                examine: "Knows the way around.".to_string(),
                respawn_time: 10,
                skills: Skills::from_levels(1, 1, 1, 10),
                is_talkable: true,
                is_attackable: false,
                drop_table: DropTable::default(),
                kill_quest: None,
            },
        ];
        let npc_spawns = vec![
            NpcSpawn {
                entity_index: 0,
                position: TilePos::new(5, 17),
                wander_range: 7,
            },
            NpcSpawn {
                entity_index: 0,
                position: TilePos::new(5, 17),
                wander_range: 7,
            },
            NpcSpawn {
                entity_index: 0,
                position: TilePos::new(5, 17),
                wander_range: 7,
            },
            NpcSpawn {
                entity_index: 1,
                position: TilePos::new(3, 3),
                wander_range: 0,
            },
        ];
        let item_spawns = vec![
            ItemSpawn {
                item_id: 100,
                position: TilePos::new(0, 0),
                amount: 1,
            },
            ItemSpawn {
                item_id: 101,
                position: TilePos::new(1, 1),
                amount: 1,
            },
        ];

        let mut registry = Self::default();
        registry.items = items.into_iter().map(|i| (i.item_id, i)).collect();
        registry.quests = quests.into_iter().map(|q| (q.quest_id, q)).collect();
        registry.species = species.into_iter().map(|s| (s.entity_index, s)).collect();
        registry.npc_spawns = npc_spawns;
        registry.item_spawns = item_spawns;
        registry
    }

    /// Item definition by type id.
    pub fn item(&self, item_id: u32) -> Option<&ItemData> {
        self.items.get(&item_id)
    }

    /// Species definition by index.
    pub fn species(&self, entity_index: u32) -> Option<&SpeciesData> {
        self.species.get(&entity_index)
    }

    /// Quest definition by slot.
    pub fn quest(&self, quest_id: usize) -> Option<&QuestData> {
        self.quests.get(&quest_id)
    }

    /// NPCs placed at world start.
    pub fn npc_spawns(&self) -> &[NpcSpawn] {
        &self.npc_spawns
    }

    /// Ground items placed at world start.
    pub fn item_spawns(&self) -> &[ItemSpawn] {
        &self.item_spawns
    }

    /// Number of item, species, and quest definitions.
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.items.len(), self.species.len(), self.quests.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_is_consistent() {
        let content = ContentRegistry::builtin();
        assert_eq!(content.counts(), (5, 2, 1));
        assert!(content.item(102).unwrap().is_stackable);
        assert_eq!(content.species(0).unwrap().skills.max_hitpoints(), 7);
        assert_eq!(content.npc_spawns().len(), 4);
        assert_eq!(content.item_spawns()[0].position, TilePos::new(0, 0));
    }

    #[test]
    fn parses_json_with_defaults() {
        let json = r#"{
            "items": [
                { "itemID": 5, "name": "Rock" },
                { "itemID": 6, "name": "Club",
                  "wieldable": { "slot": "weapon", "strengthBonus": 2 } }
            ],
            "species": [
                { "entityIndex": 3, "name": "Goblin", "respawnTime": 8,
                  "skills": [0, 0, 0, 1154],
                  "dropTable": [ { "itemID": 5, "dropChance": 0.4 } ] }
            ],
            "npcSpawns": [ { "entityIndex": 3, "position": { "x": 1, "y": 2 }, "wanderRange": 2 } ],
            "itemSpawns": [ { "itemID": 6, "position": { "x": 0, "y": 0 } } ]
        }"#;
        let content = ContentRegistry::from_json(json).unwrap();
        let club = content.item(6).unwrap().wieldable.unwrap();
        assert_eq!(club.attack_speed, DEFAULT_ATTACK_SPEED);
        assert_eq!(club.accuracy_bonus, 0);
        let goblin = content.species(3).unwrap();
        assert!(goblin.is_attackable);
        assert!(!goblin.is_talkable);
        assert_eq!(goblin.skills.max_hitpoints(), 10);
        assert_eq!(content.item_spawns()[0].amount, 1);
    }

    #[test]
    fn rejects_dangling_references() {
        let json = r#"{ "items": [], "itemSpawns": [ { "itemID": 9, "position": { "x": 0, "y": 0 } } ] }"#;
        assert!(matches!(
            ContentRegistry::from_json(json),
            Err(CoreError::Content(_))
        ));

        let json = r#"{ "npcSpawns": [ { "entityIndex": 1, "position": { "x": 0, "y": 0 } } ] }"#;
        assert!(matches!(
            ContentRegistry::from_json(json),
            Err(CoreError::Content(_))
        ));
    }

    #[test]
    fn rejects_duplicates_and_reserved_ids() {
        let json = r#"{ "items": [ { "itemID": 1, "name": "A" }, { "itemID": 1, "name": "B" } ] }"#;
        assert!(ContentRegistry::from_json(json).is_err());
        let json = r#"{ "items": [ { "itemID": 0, "name": "Nothing" } ] }"#;
        assert!(ContentRegistry::from_json(json).is_err());
    }

    #[test]
    fn rejects_overfull_drop_table() {
        let json = r#"{
            "items": [ { "itemID": 1, "name": "A" } ],
            "species": [ { "entityIndex": 0, "name": "X", "respawnTime": 1, "skills": [0,0,0,0],
                "dropTable": [ { "itemID": 1, "dropChance": 0.8 }, { "itemID": 1, "dropChance": 0.8 } ] } ]
        }"#;
        assert!(ContentRegistry::from_json(json).is_err());
    }

    #[test]
    fn malformed_json_is_reported() {
        assert!(matches!(
            ContentRegistry::from_json("{ not json"),
            Err(CoreError::ContentJson(_))
        ));
    }
}
