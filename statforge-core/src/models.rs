//! Structured records produced by the parsers.
//!
//! Serialized field names are the persisted JSON schema and must not change.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One parsed spell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellRecord {
    pub name: String,
    pub level: u8, // 0 = cantrip
    pub school: String,
    pub casting_time: String,
    pub range: String,
    pub components: String,
    pub duration: String,
    pub concentration: bool,
    pub attack_save: String,
    pub damage_effect: String,
    pub description: String,
    pub footnotes: Vec<String>,
}

/// A spell segment recovered from a bulk paste.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedSpellBlock {
    pub name: String,
    pub key: String,
    pub data: SpellRecord,
    pub warnings: Vec<String>,
    pub is_legacy: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmorClass {
    pub value: i32,
    pub source: Option<String>,
}

impl Default for ArmorClass {
    fn default() -> Self {
        Self { value: 10, source: None }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitPoints {
    pub average: i32,
    pub dice: Option<String>,
}

/// Movement speeds in feet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Speed {
    pub walk: Option<i32>,
    pub fly: Option<i32>,
    pub swim: Option<i32>,
    pub climb: Option<i32>,
    pub burrow: Option<i32>,
}

/// Abbreviations of the six abilities, in statblock order.
pub const ABILITY_NAMES: [&str; 6] = ["str", "dex", "con", "int", "wis", "cha"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    #[serde(rename = "str")]
    pub strength: i32,
    #[serde(rename = "dex")]
    pub dexterity: i32,
    #[serde(rename = "con")]
    pub constitution: i32,
    #[serde(rename = "int")]
    pub intelligence: i32,
    #[serde(rename = "wis")]
    pub wisdom: i32,
    #[serde(rename = "cha")]
    pub charisma: i32,
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self {
            strength: 10,
            dexterity: 10,
            constitution: 10,
            intelligence: 10,
            wisdom: 10,
            charisma: 10,
        }
    }
}

impl AbilityScores {
    /// Look up a score by its three-letter abbreviation (case-insensitive).
    pub fn get(&self, ability: &str) -> Option<i32> {
        match ability.to_lowercase().as_str() {
            "str" => Some(self.strength),
            "dex" => Some(self.dexterity),
            "con" => Some(self.constitution),
            "int" => Some(self.intelligence),
            "wis" => Some(self.wisdom),
            "cha" => Some(self.charisma),
            _ => None,
        }
    }

    /// Set a score by abbreviation. Returns false for an unknown ability.
    pub fn set(&mut self, ability: &str, score: i32) -> bool {
        let slot = match ability.to_lowercase().as_str() {
            "str" => &mut self.strength,
            "dex" => &mut self.dexterity,
            "con" => &mut self.constitution,
            "int" => &mut self.intelligence,
            "wis" => &mut self.wisdom,
            "cha" => &mut self.charisma,
            _ => return false,
        };
        *slot = score;
        true
    }

    pub fn values(&self) -> [i32; 6] {
        [
            self.strength,
            self.dexterity,
            self.constitution,
            self.intelligence,
            self.wisdom,
            self.charisma,
        ]
    }

    /// Raw modifier for an ability score, rounded down.
    pub fn modifier(score: i32) -> i32 {
        (score - 10).div_euclid(2)
    }
}

/// A named trait, action, bonus action or reaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    pub description: String,
}

/// A legendary or mythic action with its action cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostedEntry {
    pub name: String,
    pub cost: u32,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LairAction {
    pub description: String,
}

/// Structured form of a "Spellcasting" trait.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellcastingBlock {
    pub ability: Option<String>,
    pub save_dc: Option<i32>,
    pub attack_bonus: Option<i32>,
    /// Slot count keyed by spell level ("1".."9").
    pub slots: BTreeMap<String, i32>,
    /// Spell names keyed by "cantrips" or spell level.
    pub spells_by_level: BTreeMap<String, Vec<String>>,
    /// Spell names keyed by "at_will" or "<N>_per_day".
    pub innate: BTreeMap<String, Vec<String>>,
}

/// One parsed creature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatblockRecord {
    pub name: String,
    pub size: String,
    #[serde(rename = "type")]
    pub creature_type: String,
    pub alignment: String,
    pub armor_class: Vec<ArmorClass>,
    pub hit_points: HitPoints,
    pub speed: Speed,
    pub initiative_bonus: Option<i32>,
    pub ability_scores: AbilityScores,
    /// Proficient saves only.
    pub saving_throws: BTreeMap<String, i32>,
    pub skills: BTreeMap<String, i32>,
    pub damage_vulnerabilities: Vec<String>,
    pub damage_resistances: Vec<String>,
    pub damage_immunities: Vec<String>,
    pub condition_immunities: Vec<String>,
    pub senses: BTreeMap<String, i32>,
    pub languages: Vec<String>,
    pub challenge_rating: String,
    pub xp: i64,
    pub proficiency_bonus: i32,
    pub special_traits: Vec<Entry>,
    pub actions: Vec<Entry>,
    pub bonus_actions: Vec<Entry>,
    pub reactions: Vec<Entry>,
    pub legendary_actions: Option<Vec<CostedEntry>>,
    pub legendary_action_count: Option<u32>,
    pub mythic_actions: Option<Vec<CostedEntry>>,
    pub lair_actions: Option<Vec<LairAction>>,
    pub spellcasting: Option<SpellcastingBlock>,
}

impl Default for StatblockRecord {
    fn default() -> Self {
        Self {
            name: String::new(),
            size: String::new(),
            creature_type: String::new(),
            alignment: String::new(),
            armor_class: vec![ArmorClass::default()],
            hit_points: HitPoints::default(),
            speed: Speed {
                walk: Some(30),
                ..Speed::default()
            },
            initiative_bonus: None,
            ability_scores: AbilityScores::default(),
            saving_throws: BTreeMap::new(),
            skills: BTreeMap::new(),
            damage_vulnerabilities: Vec::new(),
            damage_resistances: Vec::new(),
            damage_immunities: Vec::new(),
            condition_immunities: Vec::new(),
            senses: BTreeMap::new(),
            languages: Vec::new(),
            challenge_rating: "0".to_string(),
            xp: 0,
            proficiency_bonus: 2,
            special_traits: Vec::new(),
            actions: Vec::new(),
            bonus_actions: Vec::new(),
            reactions: Vec::new(),
            legendary_actions: None,
            legendary_action_count: None,
            mythic_actions: None,
            lair_actions: None,
            spellcasting: None,
        }
    }
}
