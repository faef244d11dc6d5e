use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// Highest attainable level.
pub const MAX_LEVEL: u32 = 99;
/// Experience cap per skill.
pub const MAX_XP: u32 = 200_000_000;

/// `LEVEL_XP[i]` is the experience needed for level `i + 2`.
static LEVEL_XP: LazyLock<[u32; 99]> = LazyLock::new(|| {
    let mut table = [0u32; 99];
    let mut points = 0.0f64;
    for (i, slot) in table.iter_mut().enumerate() {
        let level = (i + 1) as f64;
        points += (level + 300.0 * 2f64.powf(level / 7.0)).floor();
        *slot = (points / 4.0).floor() as u32;
    }
    table
});

/// Level reached with `xp` experience, between 1 and [`MAX_LEVEL`].
pub fn level_for_xp(xp: u32) -> u32 {
    for i in (0..LEVEL_XP.len()).rev() {
        if xp >= LEVEL_XP[i] {
            return (i as u32 + 2).min(MAX_LEVEL);
        }
    }
    1
}

/// Minimum experience for `level`.
pub fn xp_for_level(level: u32) -> u32 {
    match level {
        0 | 1 => 0,
        l => LEVEL_XP[(l.min(MAX_LEVEL) - 2) as usize],
    }
}

/// A trained skill. Indexes into [`Skills`] in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Skill {
    /// Accuracy in melee.
    Attack,
    /// Maximum melee hit.
    Strength,
    /// Chance to avoid hits.
    Defence,
    /// Health pool.
    Hitpoints,
}

impl Skill {
    /// All skills in wire order.
    pub const ALL: [Skill; 4] = [Skill::Attack, Skill::Strength, Skill::Defence, Skill::Hitpoints];

    /// Position in the wire-order skill array.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Lowercase display name.
    pub fn name(self) -> &'static str {
        match self {
            Skill::Attack => "attack",
            Skill::Strength => "strength",
            Skill::Defence => "defence",
            Skill::Hitpoints => "hitpoints",
        }
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Experience per skill. Serialized as a plain array in [`Skill::ALL`] order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Skills([u32; 4]);

impl Default for Skills {
    /// Fresh characters start at level 1 everywhere except hitpoints 10.
    fn default() -> Self {
        Self([0, 0, 0, xp_for_level(10)])
    }
}

impl Skills {
    /// Build from raw experience values in wire order.
    pub fn from_xp(xp: [u32; 4]) -> Self {
        Self(xp.map(|v| v.min(MAX_XP)))
    }

    /// Build with every skill at the given levels.
    pub fn from_levels(attack: u32, strength: u32, defence: u32, hitpoints: u32) -> Self {
        Self([
            xp_for_level(attack),
            xp_for_level(strength),
            xp_for_level(defence),
            xp_for_level(hitpoints),
        ])
    }

    /// Experience in `skill`.
    pub fn xp(&self, skill: Skill) -> u32 {
        self.0[skill.index()]
    }

    /// Current level of `skill`.
    pub fn level(&self, skill: Skill) -> u32 {
        level_for_xp(self.xp(skill))
    }

    /// Add experience, saturating at [`MAX_XP`]. Returns the new level when it
    /// went up.
    pub fn add_xp(&mut self, skill: Skill, amount: u32) -> Option<u32> {
        let before = self.level(skill);
        let slot = &mut self.0[skill.index()];
        *slot = slot.saturating_add(amount).min(MAX_XP);
        let after = self.level(skill);
        (after > before).then_some(after)
    }

    /// Max hitpoints: the hitpoints level.
    pub fn max_hitpoints(&self) -> u32 {
        self.level(Skill::Hitpoints)
    }

    /// Combat level from the four melee skills.
    pub fn combat_level(&self) -> u32 {
        let att = self.level(Skill::Attack) as f64;
        let stren = self.level(Skill::Strength) as f64;
        let def = self.level(Skill::Defence) as f64;
        let hp = self.level(Skill::Hitpoints) as f64;
        (0.25 * (def + hp) + 0.325 * (att + stren)).floor() as u32
    }

    /// Raw experience values in wire order.
    pub fn as_array(&self) -> [u32; 4] {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_landmarks() {
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(82), 1);
        assert_eq!(level_for_xp(83), 2);
        assert_eq!(xp_for_level(2), 83);
        assert_eq!(xp_for_level(10), 1154);
        assert_eq!(level_for_xp(1154), 10);
        assert_eq!(level_for_xp(1153), 9);
        assert_eq!(level_for_xp(MAX_XP), MAX_LEVEL);
    }

    #[test]
    fn level_and_xp_agree() {
        for level in 1..=MAX_LEVEL {
            assert_eq!(level_for_xp(xp_for_level(level)), level);
        }
    }

    #[test]
    fn add_xp_reports_level_ups_and_caps() {
        let mut skills = Skills::default();
        assert_eq!(skills.add_xp(Skill::Attack, 10), None);
        assert_eq!(skills.add_xp(Skill::Attack, 100), Some(2));
        skills.add_xp(Skill::Strength, u32::MAX);
        assert_eq!(skills.xp(Skill::Strength), MAX_XP);
    }

    #[test]
    fn default_character_has_ten_hitpoints() {
        let skills = Skills::default();
        assert_eq!(skills.max_hitpoints(), 10);
        assert_eq!(skills.combat_level(), 3);
    }

    #[test]
    fn serializes_as_array() {
        let skills = Skills::from_xp([1, 2, 3, 4]);
        assert_eq!(serde_json::to_string(&skills).unwrap(), "[1,2,3,4]");
    }
}
