use gr_core::ActorId;
use serde::Serialize;

/// One melee swing, hit or miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttackEvent {
    /// Who swung.
    #[serde(rename = "attackerID")]
    pub attacker: ActorId,
    /// Who was swung at.
    #[serde(rename = "targetID")]
    pub target: ActorId,
}

/// A player opened a conversation with an NPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TalkEvent {
    /// The player.
    #[serde(rename = "talkerID")]
    pub talker: ActorId,
    /// The NPC.
    #[serde(rename = "targetID")]
    pub target: ActorId,
    /// The NPC's species index, selecting the dialogue.
    pub target_index: u32,
}

/// A player opened a trade with an NPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeEvent {
    /// The player.
    #[serde(rename = "traderID")]
    pub trader: ActorId,
    /// The NPC.
    #[serde(rename = "targetID")]
    pub target: ActorId,
    /// The NPC's species index, selecting the shop.
    pub target_index: u32,
}

/// A sound cue for clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundEvent {
    /// Sound asset name.
    pub sound_name: String,
    /// Effect (true) or music (false).
    pub is_sfx: bool,
    /// Cut off whatever is playing.
    pub should_interrupt: bool,
    /// Player the sound belongs to.
    #[serde(rename = "entityID")]
    pub entity: ActorId,
    /// Heard by every connection, not just `entity`'s.
    pub is_global: bool,
}

impl SoundEvent {
    /// An effect everyone hears.
    pub fn global(sound_name: &str, entity: ActorId) -> Self {
        Self {
            sound_name: sound_name.to_string(),
            is_sfx: true,
            should_interrupt: false,
            entity,
            is_global: true,
        }
    }

    /// An effect only `entity`'s connection hears.
    pub fn private(sound_name: &str, entity: ActorId) -> Self {
        Self {
            is_global: false,
            ..Self::global(sound_name, entity)
        }
    }

    /// True when `viewer` should hear it.
    pub fn audible_to(&self, viewer: ActorId) -> bool {
        self.is_global || self.entity == viewer
    }
}

/// Sound asset names.
pub mod sounds {
    /// Unarmed hit.
    pub const PUNCH: &str = "punch.ogg";
    /// Armed hit.
    pub const SWORD_SLASH: &str = "sword_slash.ogg";
    /// A player took damage.
    pub const PLAYER_HIT: &str = "player_hit.ogg";
    /// An NPC died.
    pub const NPC_DEATH: &str = "man_death.ogg";
    /// A player died.
    pub const PLAYER_DEATH: &str = "death.ogg";
    /// Picked up an item.
    pub const PICK_UP: &str = "pick_up.ogg";
    /// Dropped an item.
    pub const DROP: &str = "drop.ogg";
    /// Ate something.
    pub const EAT: &str = "eat.ogg";
    /// Finished a quest.
    pub const QUEST_COMPLETE: &str = "quest_complete.ogg";
    /// Gained a level.
    pub const LEVEL_UP: &str = "level_up.ogg";
}

/// Events produced during one tick, broadcast with its snapshot and then
/// cleared.
#[derive(Debug, Clone, Default)]
pub struct TickEvents {
    /// Melee swings.
    pub attacks: Vec<AttackEvent>,
    /// Conversations opened.
    pub talks: Vec<TalkEvent>,
    /// Trades opened.
    pub trades: Vec<TradeEvent>,
    /// Sound cues.
    pub sounds: Vec<SoundEvent>,
}

impl TickEvents {
    /// True when nothing happened.
    pub fn is_empty(&self) -> bool {
        self.attacks.is_empty()
            && self.talks.is_empty()
            && self.trades.is_empty()
            && self.sounds.is_empty()
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.attacks.clear();
        self.talks.clear();
        self.trades.clear();
        self.sounds.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_sounds_reach_only_their_owner() {
        let me = ActorId::new();
        let other = ActorId::new();
        assert!(SoundEvent::private(sounds::EAT, me).audible_to(me));
        assert!(!SoundEvent::private(sounds::EAT, me).audible_to(other));
        assert!(SoundEvent::global(sounds::PUNCH, me).audible_to(other));
    }

    #[test]
    fn wire_field_names() {
        let a = ActorId::new();
        let b = ActorId::new();
        let json = serde_json::to_value(TalkEvent {
            talker: a,
            target: b,
            target_index: 3,
        })
        .unwrap();
        assert_eq!(json["talkerID"], a.0.to_string());
        assert_eq!(json["targetIndex"], 3);

        let json = serde_json::to_value(SoundEvent::global("x.ogg", a)).unwrap();
        assert_eq!(json["soundName"], "x.ogg");
        assert_eq!(json["isSfx"], true);
        assert_eq!(json["entityID"], a.0.to_string());
    }

    #[test]
    fn clear_empties_all_lists() {
        let a = ActorId::new();
        let mut events = TickEvents::default();
        events.attacks.push(AttackEvent { attacker: a, target: a });
        events.sounds.push(SoundEvent::global("x", a));
        assert!(!events.is_empty());
        events.clear();
        assert!(events.is_empty());
    }
}
