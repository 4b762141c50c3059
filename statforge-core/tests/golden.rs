use statforge_core::models::{ArmorClass, StatblockRecord};
use statforge_core::{parse_statblock, statblock_key, validate_statblock};

const GOBLIN_2014: &str = include_str!("fixtures/goblin_2014.txt");
const GOBLIN_2024: &str = include_str!("fixtures/goblin_2024.txt");
const MAGE_2014: &str = include_str!("fixtures/mage_2014.txt");
const ADULT_RED_DRAGON_2014: &str = include_str!("fixtures/adult_red_dragon_2014.txt");

fn entry_names(entries: &[statforge_core::models::Entry]) -> Vec<&str> {
    entries.iter().map(|entry| entry.name.as_str()).collect()
}

#[test]
fn test_goblin_2014() {
    let goblin = parse_statblock(GOBLIN_2014);

    assert_eq!(goblin.name, "Goblin");
    assert_eq!(goblin.size, "Small");
    assert_eq!(goblin.creature_type, "Humanoid (Goblinoid)");
    assert_eq!(goblin.alignment, "Neutral Evil");
    assert_eq!(goblin.armor_class[0].value, 15);
    assert_eq!(goblin.hit_points.average, 7);
    assert_eq!(goblin.hit_points.dice.as_deref(), Some("2d6"));
    assert_eq!(goblin.initiative_bonus, Some(2));
    assert_eq!(goblin.ability_scores.values(), [8, 14, 10, 10, 8, 8]);
    assert_eq!(goblin.skills["stealth"], 6);
    assert_eq!(goblin.senses["darkvision"], 60);
    assert_eq!(goblin.challenge_rating, "1/4");
    assert_eq!(goblin.xp, 50);
    assert_eq!(entry_names(&goblin.special_traits), vec!["Nimble Escape"]);
    assert_eq!(entry_names(&goblin.actions), vec!["Scimitar", "Shortbow"]);
    assert!(validate_statblock(&goblin).is_empty());
}

#[test]
fn test_goblin_2024() {
    let goblin = parse_statblock(GOBLIN_2024);

    assert_eq!(goblin.name, "Goblin Warrior");
    assert_eq!(goblin.size, "Small");
    assert_eq!(goblin.creature_type, "Fey (Goblinoid)");
    assert_eq!(goblin.armor_class, vec![ArmorClass { value: 15, source: None }]);
    assert_eq!(goblin.initiative_bonus, Some(2));
    assert_eq!(goblin.hit_points.average, 10);
    assert_eq!(goblin.ability_scores.values(), [8, 15, 10, 10, 8, 8]);
    // Every save equals its modifier, so none are proficient.
    assert!(goblin.saving_throws.is_empty());
    assert_eq!(goblin.senses["passive_perception"], 9);
    assert_eq!(goblin.challenge_rating, "1/4");
    assert_eq!(goblin.xp, 50);
    assert_eq!(goblin.proficiency_bonus, 2);
    assert_eq!(entry_names(&goblin.actions), vec!["Scimitar", "Shortbow"]);
    assert_eq!(entry_names(&goblin.bonus_actions), vec!["Nimble Escape"]);
    assert!(validate_statblock(&goblin).is_empty());
}

#[test]
fn test_mage_2014_spellcasting() {
    let mage = parse_statblock(MAGE_2014);

    assert_eq!(mage.armor_class[0].source.as_deref(), Some("15 with mage armor"));
    assert_eq!(mage.saving_throws["int"], 6);
    assert_eq!(mage.saving_throws["wis"], 4);
    assert_eq!(mage.xp, 2300);
    assert_eq!(mage.proficiency_bonus, 3);

    // The trait moves into the structured block.
    assert!(mage.special_traits.is_empty());
    assert_eq!(entry_names(&mage.actions), vec!["Dagger"]);

    let spellcasting = mage.spellcasting.expect("spellcasting block");
    assert_eq!(spellcasting.ability.as_deref(), Some("Intelligence"));
    assert_eq!(spellcasting.save_dc, Some(14));
    assert_eq!(spellcasting.attack_bonus, Some(6));
    assert_eq!(spellcasting.slots.len(), 5);
    assert_eq!(spellcasting.slots["4"], 3);
    assert_eq!(spellcasting.spells_by_level["cantrips"].len(), 4);
    assert_eq!(spellcasting.spells_by_level["5"], vec!["cone of cold"]);
}

#[test]
fn test_adult_red_dragon_2014() {
    let dragon = parse_statblock(ADULT_RED_DRAGON_2014);

    assert_eq!(dragon.size, "Huge");
    assert_eq!(dragon.hit_points.dice.as_deref(), Some("19d12 + 133"));
    assert_eq!(dragon.speed.walk, Some(40));
    assert_eq!(dragon.speed.climb, Some(40));
    assert_eq!(dragon.speed.fly, Some(80));
    assert_eq!(dragon.ability_scores.strength, 27);
    assert_eq!(dragon.saving_throws.len(), 4);
    assert_eq!(dragon.saving_throws["con"], 13);
    assert_eq!(dragon.damage_immunities, vec!["Fire"]);
    assert_eq!(dragon.senses["blindsight"], 60);
    assert_eq!(dragon.senses["passive_perception"], 23);
    assert_eq!(dragon.challenge_rating, "17");
    assert_eq!(dragon.xp, 18000);

    assert_eq!(entry_names(&dragon.special_traits), vec!["Legendary Resistance (3/Day)"]);
    assert_eq!(
        entry_names(&dragon.actions),
        vec!["Multiattack", "Bite", "Claw", "Fire Breath (Recharge 5-6)"]
    );

    let legendary = dragon.legendary_actions.as_ref().expect("legendary actions");
    let costs: Vec<_> = legendary.iter().map(|a| (a.name.as_str(), a.cost)).collect();
    assert_eq!(costs, vec![("Detect", 1), ("Tail Attack", 1), ("Wing Attack", 2)]);
    assert_eq!(dragon.legendary_action_count, Some(3));
    assert!(dragon.mythic_actions.is_none());
    assert!(dragon.lair_actions.is_none());
}

#[test]
fn test_numbered_instances_share_key() {
    let second = GOBLIN_2014.replacen("Goblin\n", "Goblin #2\n", 1);
    let record = parse_statblock(&second);
    assert_eq!(record.name, "Goblin #2");
    assert_eq!(statblock_key(&record.name), "goblin.json");
}

#[test]
fn test_json_round_trip() {
    for text in [GOBLIN_2014, GOBLIN_2024, MAGE_2014, ADULT_RED_DRAGON_2014] {
        let record = parse_statblock(text);
        let json = serde_json::to_string(&record).unwrap();
        let restored: StatblockRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, record);
    }
}

#[test]
fn test_json_uses_persisted_field_names() {
    let dragon = parse_statblock(ADULT_RED_DRAGON_2014);
    let json = serde_json::to_value(&dragon).unwrap();

    assert_eq!(json["type"], "Dragon");
    assert_eq!(json["ability_scores"]["cha"], 21);
    assert_eq!(json["armor_class"][0]["source"], "Natural Armor");
    assert_eq!(json["legendary_actions"][2]["cost"], 2);
    assert!(json["spellcasting"].is_null());
}
