//! Statblock parser for pasted 2014 and 2024 D&D Beyond creature text.
//!
//! Each field family is found by its own scan over the whole line list, so
//! lines may appear in any order and any of them may be missing.

use crate::format::{StatblockFormat, detect_statblock_format};
use crate::models::{
    ABILITY_NAMES, AbilityScores, ArmorClass, CostedEntry, Entry, HitPoints, LairAction, Speed,
    StatblockRecord,
};
use crate::normalize::{capitalize, normalize};
use crate::spellcasting::parse_spellcasting_block;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Lines at least this long are never treated as a repeated entry name.
const STANDALONE_NAME_MAX: usize = 80;
const DEFAULT_LEGENDARY_ACTIONS: u32 = 3;

const CONDITION_NAMES: &[&str] = &[
    "blinded",
    "charmed",
    "deafened",
    "exhaustion",
    "frightened",
    "grappled",
    "incapacitated",
    "invisible",
    "paralyzed",
    "petrified",
    "poisoned",
    "prone",
    "restrained",
    "stunned",
    "unconscious",
];

lazy_static! {
    static ref HEADER_RE: Regex = Regex::new(
        r"(?i)^((?:Tiny|Small|Medium|Large|Huge|Gargantuan)(?:\s+or\s+(?:Tiny|Small|Medium|Large|Huge|Gargantuan))?)\s+(.+?),\s*(.+)"
    )
    .unwrap();

    // Core stat lines
    static ref AC_SHORT_RE: Regex = Regex::new(r"(?i)^ac\s+\d").unwrap();
    static ref HP_SHORT_RE: Regex = Regex::new(r"(?i)^hp\s+\d").unwrap();
    static ref AC_PREFIX_RE: Regex = Regex::new(r"(?i)^(?:armor class|ac)\s*:?\s*").unwrap();
    static ref HP_PREFIX_RE: Regex = Regex::new(r"(?i)^(?:hit points|hp)\s*:?\s*").unwrap();
    static ref SPEED_PREFIX_RE: Regex = Regex::new(r"(?i)^speed\s*:?\s*").unwrap();
    static ref INITIATIVE_SUFFIX_RE: Regex = Regex::new(r"\s{2,}Initiative|\tInitiative").unwrap();
    static ref INITIATIVE_RE: Regex = Regex::new(r"(?i)Initiative\s+([+-]\d+)").unwrap();
    static ref SIGNED_RE: Regex = Regex::new(r"([+-]\d+)").unwrap();
    static ref OR_RE: Regex = Regex::new(r"\sor\s").unwrap();
    static ref VALUE_SOURCE_RE: Regex = Regex::new(r"^(\d+)\s*(?:\(([^)]+)\))?").unwrap();
    static ref WALK_RE: Regex = Regex::new(r"^(\d+)\s*ft").unwrap();
    static ref MOVEMENT_RES: Vec<(&'static str, Regex)> = ["fly", "swim", "climb", "burrow"]
        .iter()
        .map(|mode| (*mode, Regex::new(&format!(r"(?i){}\s+(\d+)\s*ft", mode)).unwrap()))
        .collect();

    // Ability scores
    static ref LEADING_SCORE_RE: Regex = Regex::new(r"^(\d{1,2})").unwrap();
    static ref ABILITY_LINE_RE: Regex = Regex::new(
        r"(?i)^(STR|DEX|CON|INT|WIS|CHA)\s+(\d+)(?:\s+([+-]\d+)(?:\s+([+-]\d+))?)?"
    )
    .unwrap();
    static ref BARE_SIGNED_RE: Regex = Regex::new(r"^[+-]\d+$").unwrap();

    // Optional stat lines
    static ref LIST_SPLIT_RE: Regex = Regex::new(r"[;,]").unwrap();
    static ref KV_RE: Regex = Regex::new(r"^\s*(\w[\w\s]*?)\s*([+-]\d+)").unwrap();
    static ref PASSIVE_RE: Regex = Regex::new(r"(?i)^passive\s+Perception\s+(\d+)").unwrap();
    static ref SENSE_RE: Regex = Regex::new(r"^([\w\s]+?)\s+(\d+)\s*ft").unwrap();
    static ref CR_SHORT_RE: Regex = Regex::new(r"(?i)^cr\s+[\d/]").unwrap();
    static ref CHALLENGE_RE: Regex = Regex::new(r"(?i)Challenge\s+([\d/]+)").unwrap();
    static ref XP_AFTER_RE: Regex = Regex::new(r"([\d,]+)\s*XP").unwrap();
    static ref PB_LONG_RE: Regex = Regex::new(r"(?i)Proficiency Bonus\s*\+(\d+)").unwrap();
    static ref CR_RE: Regex = Regex::new(r"CR\s+([\d/]+)").unwrap();
    static ref XP_BEFORE_RE: Regex = Regex::new(r"XP\s+([\d,]+)").unwrap();
    static ref PB_SHORT_RE: Regex = Regex::new(r"PB\s*\+(\d+)").unwrap();
    static ref PLUS_INT_RE: Regex = Regex::new(r"\+(\d+)").unwrap();

    // Entries
    static ref ENTRY_PERIOD_RE: Regex =
        Regex::new(r"^([\w\s,'\-/()\u{2013}\u{2014}]+?)\.\s+(.+)$").unwrap();
    static ref ENTRY_COLON_RE: Regex =
        Regex::new(r"^([\w\s,'\-/()\u{2013}\u{2014}]+?):\s+(.+)$").unwrap();
    static ref SPELL_LIST_LINE_RE: Regex =
        Regex::new(r"(?i)^(?:Cantrips?|[1-9](?:st|nd|rd|th)\s+level|At will|\d+/day)").unwrap();
    static ref COST_RE: Regex = Regex::new(r"(?i)\s*\(Costs?\s+(\d+)\s+Actions?\)").unwrap();
    static ref LEGENDARY_COUNT_RE: Regex = Regex::new(r"(?i)take (\d+) legendary actions").unwrap();
    static ref LEGENDARY_USES_RE: Regex = Regex::new(r"(?i)legendary action uses:?\s*(\d+)").unwrap();
}

/// Parse a pasted statblock. Never fails: anything not recognized keeps
/// its default value, and empty input yields `StatblockRecord::default()`.
pub fn parse_statblock(text: &str) -> StatblockRecord {
    let normalized = normalize(text);
    let all_lines: Vec<&str> = normalized.trim().lines().map(str::trim).collect();
    let lines: Vec<&str> = all_lines.iter().copied().filter(|line| !line.is_empty()).collect();

    let mut record = StatblockRecord::default();
    let Some(name) = lines.first() else {
        return record;
    };
    record.name = name.to_string();

    let format = detect_statblock_format(&lines);
    tracing::debug!("Parsing statblock {:?} as {} dialect", record.name, format);

    if let Some(header) = lines.get(1) {
        parse_header_line(header, &mut record);
    }

    scan_core_stats(&lines, &mut record);

    let (scores, saves) = match format {
        StatblockFormat::Legacy => (parse_legacy_ability_scores(&all_lines), BTreeMap::new()),
        StatblockFormat::Current => parse_current_ability_scores(&all_lines),
    };
    record.ability_scores = scores;
    if !saves.is_empty() {
        record.saving_throws = saves;
    }

    scan_optional_stats(&lines, &mut record);

    let sections = split_sections(&lines);
    apply_sections(&sections, &mut record);

    extract_spellcasting(&mut record);

    record
}

/// "Small Humanoid (Goblinoid), Neutral Evil". When the size pattern does
/// not match, the whole line is kept as the type.
fn parse_header_line(line: &str, record: &mut StatblockRecord) {
    let Some(caps) = HEADER_RE.captures(line) else {
        record.creature_type = line.to_string();
        return;
    };

    record.size = caps[1]
        .split_whitespace()
        .map(|word| {
            if word.eq_ignore_ascii_case("or") {
                "or".to_string()
            } else {
                capitalize(word)
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    record.creature_type = caps[2].trim().to_string();
    record.alignment = caps[3].trim().to_string();
}

fn scan_core_stats(lines: &[&str], record: &mut StatblockRecord) {
    for &line in lines {
        let low = line.to_lowercase();

        if low.starts_with("armor class ") || AC_SHORT_RE.is_match(&low) {
            record.armor_class = parse_armor_class(line);
            if let Some(bonus) = capture_int(&INITIATIVE_RE, line) {
                record.initiative_bonus = Some(bonus);
            }
        } else if low.starts_with("hit points ") || HP_SHORT_RE.is_match(&low) {
            record.hit_points = parse_hit_points(line);
        } else if low.starts_with("speed") {
            record.speed = parse_speed(line);
        } else if low.starts_with("roll initiative") || low.starts_with("initiative") {
            if let Some(bonus) = capture_int(&SIGNED_RE, line) {
                record.initiative_bonus = Some(bonus);
            }
        }
    }
}

fn capture_int(re: &Regex, text: &str) -> Option<i32> {
    re.captures(text).and_then(|caps| caps[1].parse().ok())
}

/// "Armor Class 15 (natural armor) or 18 (with mage armor)". Anything after
/// a 2024 "Initiative" column is ignored.
fn parse_armor_class(line: &str) -> Vec<ArmorClass> {
    let before_initiative = INITIATIVE_SUFFIX_RE.split(line).next().unwrap_or(line);
    let value = AC_PREFIX_RE.replace(before_initiative, "");

    let values: Vec<ArmorClass> = OR_RE
        .split(&value)
        .filter_map(|part| VALUE_SOURCE_RE.captures(part.trim()))
        .filter_map(|caps| {
            let value = caps[1].parse().ok()?;
            Some(ArmorClass {
                value,
                source: caps.get(2).map(|m| m.as_str().to_string()),
            })
        })
        .collect();

    if values.is_empty() {
        vec![ArmorClass::default()]
    } else {
        values
    }
}

fn parse_hit_points(line: &str) -> HitPoints {
    let value = HP_PREFIX_RE.replace(line, "");
    VALUE_SOURCE_RE
        .captures(value.trim())
        .and_then(|caps| {
            Some(HitPoints {
                average: caps[1].parse().ok()?,
                dice: caps.get(2).map(|m| m.as_str().trim().to_string()),
            })
        })
        .unwrap_or_default()
}

/// "Speed 40 ft., climb 30 ft., fly 80 ft." The walking speed is the bare
/// leading number.
fn parse_speed(line: &str) -> Speed {
    let value = SPEED_PREFIX_RE.replace(line, "");
    let mut speed = Speed {
        walk: capture_int(&WALK_RE, &value),
        ..Speed::default()
    };

    for (mode, re) in MOVEMENT_RES.iter() {
        let feet = capture_int(re, &value);
        match *mode {
            "fly" => speed.fly = feet,
            "swim" => speed.swim = feet,
            "climb" => speed.climb = feet,
            _ => speed.burrow = feet,
        }
    }

    speed
}

/// 2014 layout: the ability name alone on a line, the score at the start of
/// one of the next two lines ("8 (-1)").
fn parse_legacy_ability_scores(lines: &[&str]) -> AbilityScores {
    let mut scores = AbilityScores::default();
    let mut i = 0;

    while i < lines.len() {
        let ability = lines[i].to_lowercase();
        if ABILITY_NAMES.contains(&ability.as_str()) {
            let window_end = (i + 3).min(lines.len());
            for j in (i + 1)..window_end {
                let score = LEADING_SCORE_RE
                    .captures(lines[j])
                    .and_then(|caps| caps[1].parse().ok());
                if let Some(score) = score {
                    scores.set(&ability, score);
                    i = j;
                    break;
                }
            }
        }
        i += 1;
    }

    scores
}

/// 2024 layout: "STR 18 +4" with the save either on the same line or as a
/// later bare "+7" line. Only saves that differ from the raw modifier are
/// returned, i.e. the proficient ones.
fn parse_current_ability_scores(lines: &[&str]) -> (AbilityScores, BTreeMap<String, i32>) {
    let mut scores = AbilityScores::default();
    let mut observed: BTreeMap<String, i32> = BTreeMap::new();
    let mut pending: Option<String> = None;

    for line in lines.iter().map(|line| line.trim()).filter(|line| !line.is_empty()) {
        if let Some(caps) = ABILITY_LINE_RE.captures(line) {
            let ability = caps[1].to_lowercase();
            pending = None;
            let Ok(score) = caps[2].parse::<i32>() else {
                continue;
            };
            scores.set(&ability, score);
            match caps.get(4).and_then(|m| m.as_str().parse().ok()) {
                Some(save) => {
                    observed.insert(ability, save);
                }
                None => pending = Some(ability),
            }
            continue;
        }

        if pending.is_some() && BARE_SIGNED_RE.is_match(line) {
            if let (Some(ability), Ok(save)) = (pending.take(), line.parse::<i32>()) {
                observed.insert(ability, save);
            }
            continue;
        }

        // Column headers sit between an ability and its save.
        if !matches!(line.to_lowercase().as_str(), "mod" | "save") {
            pending = None;
        }
    }

    let saves = observed
        .into_iter()
        .filter(|(ability, save)| {
            let score = scores.get(ability).unwrap_or(10);
            *save != AbilityScores::modifier(score)
        })
        .collect();

    (scores, saves)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatLine {
    SavingThrows,
    Skills,
    DamageVulnerabilities,
    DamageResistances,
    DamageImmunities,
    MixedImmunities,
    ConditionImmunities,
    Senses,
    Languages,
    Challenge,
    ChallengeRating,
    ProficiencyBonus,
}

/// Checked in order; the longer "damage ..." labels come before the bare
/// 2024 labels they start with.
const STAT_LABELS: &[(&str, StatLine)] = &[
    ("saving throws", StatLine::SavingThrows),
    ("skills", StatLine::Skills),
    ("damage vulnerabilities", StatLine::DamageVulnerabilities),
    ("vulnerabilities", StatLine::DamageVulnerabilities),
    ("damage resistances", StatLine::DamageResistances),
    ("resistances", StatLine::DamageResistances),
    ("damage immunities", StatLine::DamageImmunities),
    ("immunities", StatLine::MixedImmunities),
    ("condition immunities", StatLine::ConditionImmunities),
    ("senses", StatLine::Senses),
    ("languages", StatLine::Languages),
    ("challenge", StatLine::Challenge),
    ("proficiency bonus", StatLine::ProficiencyBonus),
];

/// Text after `label`, a following colon and whitespace, when the line
/// starts with `label` (case-insensitive).
fn label_value<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let head = line.get(..label.len())?;
    if !head.eq_ignore_ascii_case(label) {
        return None;
    }
    let rest = line[label.len()..].trim_start();
    Some(rest.strip_prefix(':').unwrap_or(rest).trim())
}

fn classify_stat_line(line: &str) -> Option<(StatLine, &str)> {
    STAT_LABELS
        .iter()
        .find_map(|(label, kind)| label_value(line, label).map(|value| (*kind, value)))
        .or_else(|| CR_SHORT_RE.is_match(line).then_some((StatLine::ChallengeRating, line)))
}

fn scan_optional_stats(lines: &[&str], record: &mut StatblockRecord) {
    for &line in lines {
        let Some((kind, value)) = classify_stat_line(line) else {
            continue;
        };

        match kind {
            StatLine::SavingThrows => record.saving_throws = parse_modifier_list(value),
            StatLine::Skills => record.skills = parse_modifier_list(value),
            StatLine::DamageVulnerabilities => record.damage_vulnerabilities = parse_list(value),
            StatLine::DamageResistances => record.damage_resistances = parse_list(value),
            StatLine::DamageImmunities => record.damage_immunities = parse_list(value),
            StatLine::MixedImmunities => {
                let (damage, conditions) = classify_immunities(value);
                record.damage_immunities.extend(damage);
                record.condition_immunities.extend(conditions);
            }
            StatLine::ConditionImmunities => record.condition_immunities = parse_list(value),
            StatLine::Senses => record.senses = parse_senses(value),
            StatLine::Languages => record.languages = parse_list(value),
            StatLine::Challenge => {
                if let Some(caps) = CHALLENGE_RE.captures(line) {
                    record.challenge_rating = caps[1].to_string();
                }
                record.xp = parse_xp(&XP_AFTER_RE, line);
                if let Some(pb) = capture_int(&PB_LONG_RE, line) {
                    record.proficiency_bonus = pb;
                }
            }
            StatLine::ChallengeRating => {
                record.challenge_rating = CR_RE
                    .captures(line)
                    .map(|caps| caps[1].to_string())
                    .unwrap_or_else(|| "0".to_string());
                record.xp = parse_xp(&XP_BEFORE_RE, line);
                record.proficiency_bonus = capture_int(&PB_SHORT_RE, line).unwrap_or(2);
            }
            StatLine::ProficiencyBonus => {
                if let Some(pb) = capture_int(&PLUS_INT_RE, line) {
                    record.proficiency_bonus = pb;
                }
            }
        }
    }
}

fn parse_xp(re: &Regex, line: &str) -> i64 {
    re.captures(line)
        .and_then(|caps| caps[1].replace(',', "").parse().ok())
        .unwrap_or(0)
}

fn is_none_marker(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "" | "none" | "-" | "--")
}

/// Comma or semicolon separated list; "none" and dashes mean empty.
fn parse_list(value: &str) -> Vec<String> {
    if is_none_marker(value.trim()) {
        return Vec::new();
    }
    LIST_SPLIT_RE
        .split(value)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// "Dex +4, Con +6" -> {"dex": 4, "con": 6}
fn parse_modifier_list(value: &str) -> BTreeMap<String, i32> {
    LIST_SPLIT_RE
        .split(value)
        .filter_map(|part| KV_RE.captures(part.trim()))
        .filter_map(|caps| {
            let bonus = caps[2].parse().ok()?;
            Some((caps[1].trim().to_lowercase(), bonus))
        })
        .collect()
}

/// Split a 2024 "Immunities" line, which mixes damage types and conditions,
/// into (damage, conditions).
fn classify_immunities(value: &str) -> (Vec<String>, Vec<String>) {
    LIST_SPLIT_RE
        .split(value)
        .map(str::trim)
        .filter(|part| !is_none_marker(part))
        .map(str::to_string)
        .partition(|part| !CONDITION_NAMES.contains(&part.to_lowercase().as_str()))
}

fn parse_senses(value: &str) -> BTreeMap<String, i32> {
    let mut senses = BTreeMap::new();

    for part in LIST_SPLIT_RE.split(value).map(str::trim).filter(|part| !part.is_empty()) {
        if let Some(range) = capture_int(&PASSIVE_RE, part) {
            senses.insert("passive_perception".to_string(), range);
            continue;
        }
        if let Some(caps) = SENSE_RE.captures(part) {
            if let Ok(range) = caps[2].parse() {
                let key = caps[1].trim().to_lowercase().replace(' ', "_");
                senses.insert(key, range);
            }
        }
    }

    senses
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Section {
    Traits,
    Features,
    Actions,
    BonusActions,
    Reactions,
    LegendaryActions,
    LairActions,
    MythicActions,
}

impl Section {
    fn from_header(line: &str) -> Option<Self> {
        let header = line.trim().trim_end_matches('.').to_lowercase();
        match header.as_str() {
            "traits" => Some(Section::Traits),
            "features" => Some(Section::Features),
            "actions" => Some(Section::Actions),
            "bonus actions" => Some(Section::BonusActions),
            "reactions" => Some(Section::Reactions),
            "legendary actions" => Some(Section::LegendaryActions),
            "lair actions" => Some(Section::LairActions),
            "mythic actions" => Some(Section::MythicActions),
            _ => None,
        }
    }
}

/// Group lines under the most recent section header. Lines before the first
/// header belong to no section; a repeated header starts its section over.
fn split_sections<'a>(lines: &[&'a str]) -> HashMap<Section, Vec<&'a str>> {
    let mut sections: HashMap<Section, Vec<&'a str>> = HashMap::new();
    let mut current: Option<Section> = None;

    for &line in lines {
        if let Some(section) = Section::from_header(line) {
            sections.insert(section, Vec::new());
            current = Some(section);
            continue;
        }
        if let Some(section) = current {
            sections.entry(section).or_default().push(line);
        }
    }

    sections
}

fn apply_sections(sections: &HashMap<Section, Vec<&str>>, record: &mut StatblockRecord) {
    let traits = sections
        .get(&Section::Traits)
        .or_else(|| sections.get(&Section::Features));
    if let Some(lines) = traits {
        record.special_traits = parse_entries(lines);
    }
    if let Some(lines) = sections.get(&Section::Actions) {
        record.actions = parse_entries(lines);
    }
    if let Some(lines) = sections.get(&Section::BonusActions) {
        record.bonus_actions = parse_entries(lines);
    }
    if let Some(lines) = sections.get(&Section::Reactions) {
        record.reactions = parse_entries(lines);
    }
    if let Some(lines) = sections.get(&Section::LegendaryActions) {
        record.legendary_actions = Some(parse_costed_entries(lines));
        record.legendary_action_count = Some(legendary_action_count(lines));
    }
    if let Some(lines) = sections.get(&Section::MythicActions) {
        record.mythic_actions = Some(parse_costed_entries(lines));
    }
    if let Some(lines) = sections.get(&Section::LairActions) {
        record.lair_actions = Some(
            parse_entries(lines)
                .into_iter()
                .map(|entry| LairAction {
                    description: entry.description,
                })
                .collect(),
        );
    }
}

/// Short lines that repeat the name of a "Name. Description" line in the
/// same section. D&D Beyond pastes every entry name twice.
fn known_name_lines<'a>(lines: &[&'a str]) -> HashSet<&'a str> {
    lines
        .iter()
        .copied()
        .filter(|line| {
            line.chars().count() < STANDALONE_NAME_MAX && !line.contains(". ") && !line.contains(": ")
        })
        .filter(|name| {
            let with_period = format!("{}.", name);
            let with_colon = format!("{}:", name);
            lines.iter().any(|other| {
                other != name && (other.starts_with(&with_period) || other.starts_with(&with_colon))
            })
        })
        .collect()
}

fn is_spell_list_line(current_name: &str, line: &str) -> bool {
    current_name.to_lowercase().contains("spellcasting") && SPELL_LIST_LINE_RE.is_match(line)
}

fn parse_entries(lines: &[&str]) -> Vec<Entry> {
    let known_names = known_name_lines(lines);
    let mut entries = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for &line in lines {
        if known_names.contains(line) {
            continue;
        }

        // Spell lists stay in the spellcasting description for the sub-parser.
        if let Some((name, parts)) = current.as_mut() {
            if is_spell_list_line(name, line) {
                parts.push(line);
                continue;
            }
        }

        let start = ENTRY_PERIOD_RE
            .captures(line)
            .or_else(|| ENTRY_COLON_RE.captures(line));

        if let Some(caps) = start {
            if let Some((name, parts)) = current.take() {
                entries.push(Entry {
                    name,
                    description: parts.join("\n"),
                });
            }
            let description = caps.get(2).map_or("", |m| m.as_str().trim());
            current = Some((caps[1].trim().to_string(), vec![description]));
        } else if let Some((_, parts)) = current.as_mut() {
            parts.push(line);
        }
    }

    if let Some((name, parts)) = current {
        entries.push(Entry {
            name,
            description: parts.join("\n"),
        });
    }

    entries
}

/// Legendary or mythic entries. The rules preamble is dropped and a
/// "(Costs N Actions)" suffix becomes the cost.
fn parse_costed_entries(lines: &[&str]) -> Vec<CostedEntry> {
    parse_entries(lines)
        .into_iter()
        .filter(|entry| !entry.name.to_lowercase().contains("legendary action"))
        .map(|entry| {
            let cost = COST_RE
                .captures(&entry.name)
                .and_then(|caps| caps[1].parse().ok())
                .unwrap_or(1);
            CostedEntry {
                name: COST_RE.replace_all(&entry.name, "").trim().to_string(),
                cost,
                description: entry.description,
            }
        })
        .collect()
}

fn legendary_action_count(lines: &[&str]) -> u32 {
    let text = lines.join(" ");
    LEGENDARY_COUNT_RE
        .captures(&text)
        .or_else(|| LEGENDARY_USES_RE.captures(&text))
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(DEFAULT_LEGENDARY_ACTIONS)
}

/// Move the first "Spellcasting" trait or action into the structured block.
fn extract_spellcasting(record: &mut StatblockRecord) {
    for list in [&mut record.special_traits, &mut record.actions] {
        let found = list
            .iter()
            .position(|entry| entry.name.to_lowercase().contains("spellcasting"));
        if let Some(index) = found {
            let entry = list.remove(index);
            tracing::debug!("Extracted spellcasting block from {:?}", entry.name);
            record.spellcasting = Some(parse_spellcasting_block(&entry.description));
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOBLIN_2014: &str = "Goblin
Small Humanoid (Goblinoid), Neutral Evil
Armor Class 15 (Leather Armor, Shield)
Hit Points 7 (2d6)
Speed 30 ft.
Roll Initiative! +2
STR
8 (-1)

DEX
14 (+2)

CON
10 (+0)

INT
10 (+0)

WIS
8 (-1)

CHA
8 (-1)
Skills Stealth +6
Senses Darkvision 60 ft., Passive Perception 9
Languages Common, Goblin
Challenge 1/4 (50 XP)
Proficiency Bonus +2
Traits
Nimble Escape
Nimble Escape. The goblin can take the Disengage or Hide action as a bonus action on each of its turns.
Actions
Scimitar
Scimitar. Melee Weapon Attack: +4 to hit, reach 5 ft., one target. Hit: 5 (1d6 + 2) slashing damage.
Shortbow
Shortbow. Ranged Weapon Attack: +4 to hit, range 80/320 ft., one target. Hit: 5 (1d6 + 2) piercing damage.";

    const MAGE_2024: &str = "Mage
Medium or Small Humanoid (Wizard), Neutral
AC 15    Initiative +2 (12)
HP 81 (18d8)
Speed 30 ft.
Mod Save
STR 9 -1 -1
DEX 14 +2 +2
CON 11 +0 +0
INT 17 +3 +6
WIS 12 +1 +4
CHA 11 +0 +0
Skills Arcana +6, History +6, Perception +4
Senses Passive Perception 14
Languages Any four languages
CR 6 (XP 2,300; PB +3)
Actions
Multiattack
Multiattack. The mage makes three Arcane Burst attacks.
Arcane Burst
Arcane Burst. Melee or Ranged Attack Roll: +6, reach 5 ft. or range 120 ft. Hit: 16 (3d8 + 3) Force damage.
Spellcasting
Spellcasting. The mage casts one of the following spells, using Intelligence as the spellcasting ability (spell save DC 14):
At Will: Detect Magic, Light, Mage Hand, Prestidigitation
2/Day Each: Fireball (level 4 version), Invisibility
1/Day Each: Cone of Cold, Fly
Bonus Actions
Misty Step
Misty Step. The mage casts Misty Step, using the same spellcasting ability as Spellcasting.";

    #[test]
    fn test_empty_input_is_default() {
        assert_eq!(parse_statblock(""), StatblockRecord::default());
        assert_eq!(parse_statblock("  \n\n\t\n"), StatblockRecord::default());
    }

    #[test]
    fn test_goblin_2014() {
        let record = parse_statblock(GOBLIN_2014);
        assert_eq!(record.name, "Goblin");
        assert_eq!(record.size, "Small");
        assert_eq!(record.creature_type, "Humanoid (Goblinoid)");
        assert_eq!(record.alignment, "Neutral Evil");
        assert_eq!(
            record.armor_class,
            vec![ArmorClass {
                value: 15,
                source: Some("Leather Armor, Shield".to_string()),
            }]
        );
        assert_eq!(record.hit_points.average, 7);
        assert_eq!(record.hit_points.dice.as_deref(), Some("2d6"));
        assert_eq!(record.speed.walk, Some(30));
        assert_eq!(record.ability_scores.values(), [8, 14, 10, 10, 8, 8]);
        assert!(record.saving_throws.is_empty());
        assert_eq!(record.skills["stealth"], 6);
        assert_eq!(record.senses["darkvision"], 60);
        assert_eq!(record.senses["passive_perception"], 9);
        assert_eq!(record.languages, vec!["Common", "Goblin"]);
        assert_eq!(record.challenge_rating, "1/4");
        assert_eq!(record.xp, 50);
        assert_eq!(record.proficiency_bonus, 2);
        assert_eq!(record.initiative_bonus, Some(2));

        let traits: Vec<_> = record.special_traits.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(traits, vec!["Nimble Escape"]);
        assert!(record.special_traits[0].description.starts_with("The goblin can take"));

        let names: Vec<_> = record.actions.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Scimitar", "Shortbow"]);
        assert!(record.actions[0].description.starts_with("Melee Weapon Attack"));
        assert!(record.legendary_actions.is_none());
        assert!(record.spellcasting.is_none());
    }

    #[test]
    fn test_mage_2024() {
        let record = parse_statblock(MAGE_2024);
        assert_eq!(record.size, "Medium or Small");
        assert_eq!(record.creature_type, "Humanoid (Wizard)");
        assert_eq!(record.armor_class, vec![ArmorClass { value: 15, source: None }]);
        assert_eq!(record.initiative_bonus, Some(2));
        assert_eq!(record.hit_points.average, 81);
        assert_eq!(record.ability_scores.values(), [9, 14, 11, 17, 12, 11]);
        assert_eq!(record.saving_throws.len(), 2);
        assert_eq!(record.saving_throws["int"], 6);
        assert_eq!(record.saving_throws["wis"], 4);
        assert_eq!(record.skills["perception"], 4);
        assert_eq!(record.challenge_rating, "6");
        assert_eq!(record.xp, 2300);
        assert_eq!(record.proficiency_bonus, 3);
    }

    #[test]
    fn test_spellcasting_action_is_extracted() {
        let record = parse_statblock(MAGE_2024);
        let names: Vec<_> = record.actions.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Multiattack", "Arcane Burst"]);

        let spellcasting = record.spellcasting.expect("spellcasting block");
        assert_eq!(spellcasting.ability.as_deref(), Some("Intelligence"));
        assert_eq!(spellcasting.save_dc, Some(14));
        assert_eq!(spellcasting.innate["1_per_day"], vec!["cone of cold", "fly"]);
        assert_eq!(spellcasting.innate["2_per_day"].len(), 2);

        // Only the first match moves; other lists are untouched.
        assert_eq!(record.bonus_actions.len(), 1);
        assert_eq!(record.bonus_actions[0].name, "Misty Step");
    }

    #[test]
    fn test_ac_line_with_initiative() {
        let record = parse_statblock("Scout\nMedium Humanoid, Neutral\nAC 12    Initiative +2 (12)");
        assert_eq!(record.armor_class, vec![ArmorClass { value: 12, source: None }]);
        assert_eq!(record.initiative_bonus, Some(2));
    }

    #[test]
    fn test_current_save_equal_to_modifier_is_dropped() {
        let record = parse_statblock("Brute\nLarge Giant, Chaotic Evil\nCR 2\nSTR 18 +4\n\n+4\n");
        assert_eq!(record.ability_scores.strength, 18);
        assert!(!record.saving_throws.contains_key("str"));
    }

    #[test]
    fn test_current_proficient_save_on_later_line() {
        let record =
            parse_statblock("Brute\nLarge Giant, Chaotic Evil\nCR 2\nSTR 18 +4\nMod\nSave\n\n+7\n");
        assert_eq!(record.saving_throws["str"], 7);
    }

    #[test]
    fn test_current_save_pending_reset_by_other_text() {
        let record = parse_statblock("Brute\nLarge Giant, Chaotic Evil\nCR 2\nSTR 18 +4\nSkills Athletics +6\n+7");
        assert!(record.saving_throws.is_empty());
    }

    #[test]
    fn test_explicit_saving_throws_override() {
        let text = "Brute\nLarge Giant, Chaotic Evil\nCR 2\nSTR 18 +4 +7\nSaving Throws Con +5, Wis +2";
        let record = parse_statblock(text);
        assert_eq!(record.saving_throws.len(), 2);
        assert_eq!(record.saving_throws["con"], 5);
        assert_eq!(record.saving_throws["wis"], 2);
    }

    #[test]
    fn test_header_without_size() {
        let record = parse_statblock("Swarm of Bats\nswarm of Tiny beasts, unaligned");
        assert_eq!(record.size, "");
        assert_eq!(record.creature_type, "swarm of Tiny beasts, unaligned");
        assert_eq!(record.alignment, "");
    }

    #[test]
    fn test_defaults_when_lines_missing() {
        let record = parse_statblock("Mystery\nHuge Construct, Unaligned");
        assert_eq!(record.size, "Huge");
        assert_eq!(record.armor_class, vec![ArmorClass::default()]);
        assert_eq!(record.speed.walk, Some(30));
        assert_eq!(record.challenge_rating, "0");
        assert_eq!(record.proficiency_bonus, 2);
        assert_eq!(record.ability_scores, AbilityScores::default());
    }

    #[test]
    fn test_armor_class_alternatives() {
        let values = parse_armor_class("Armor Class 12 (15 with mage armor) or 17 (natural armor)");
        assert_eq!(values.len(), 2);
        assert_eq!(values[0].value, 12);
        assert_eq!(values[0].source.as_deref(), Some("15 with mage armor"));
        assert_eq!(values[1].value, 17);
        assert_eq!(parse_armor_class("Armor Class varies"), vec![ArmorClass::default()]);
    }

    #[test]
    fn test_speed_modes() {
        let speed = parse_speed("Speed 40 ft., climb 40 ft., fly 80 ft.");
        assert_eq!(speed.walk, Some(40));
        assert_eq!(speed.climb, Some(40));
        assert_eq!(speed.fly, Some(80));
        assert_eq!(speed.swim, None);

        let hover = parse_speed("Speed: fly 30 ft. (hover)");
        assert_eq!(hover.walk, None);
        assert_eq!(hover.fly, Some(30));
    }

    #[test]
    fn test_roll_initiative_line() {
        let record = parse_statblock("Goblin\nSmall Humanoid, Neutral Evil\nRoll Initiative! +2");
        assert_eq!(record.initiative_bonus, Some(2));
    }

    #[test]
    fn test_mixed_immunities_are_classified() {
        let text = "Wight\nMedium Undead, Neutral Evil\nCR 3\nImmunities Poison; Exhaustion, Poisoned\nResistances Necrotic\nVulnerabilities None";
        let record = parse_statblock(text);
        assert_eq!(record.damage_immunities, vec!["Poison"]);
        assert_eq!(record.condition_immunities, vec!["Exhaustion", "Poisoned"]);
        assert_eq!(record.damage_resistances, vec!["Necrotic"]);
        assert!(record.damage_vulnerabilities.is_empty());
    }

    #[test]
    fn test_explicit_condition_immunities() {
        let text = "Golem\nLarge Construct, Unaligned\nDamage Immunities fire, poison\nCondition Immunities charmed, poisoned";
        let record = parse_statblock(text);
        assert_eq!(record.damage_immunities, vec!["fire", "poison"]);
        assert_eq!(record.condition_immunities, vec!["charmed", "poisoned"]);
    }

    #[test]
    fn test_senses_semicolons() {
        let senses = parse_senses("Blindsight 10 ft.; Darkvision 120 ft.; Passive Perception 21");
        assert_eq!(senses["blindsight"], 10);
        assert_eq!(senses["darkvision"], 120);
        assert_eq!(senses["passive_perception"], 21);
        assert_eq!(parse_senses("Tremor Sense 30 ft.")["tremor_sense"], 30);
    }

    #[test]
    fn test_legendary_actions() {
        let text = "Dragon
Huge Dragon, Chaotic Evil
Legendary Actions
The dragon can take 3 legendary actions, choosing from the options below. Only one legendary action option can be used at a time.
Detect
Detect. The dragon makes a Wisdom (Perception) check.
Wing Attack (Costs 2 Actions)
Wing Attack (Costs 2 Actions). The dragon beats its wings.";
        let record = parse_statblock(text);
        let legendary = record.legendary_actions.expect("legendary actions");
        assert_eq!(legendary.len(), 2);
        assert_eq!(legendary[0].name, "Detect");
        assert_eq!(legendary[0].cost, 1);
        assert_eq!(legendary[1].name, "Wing Attack");
        assert_eq!(legendary[1].cost, 2);
        assert_eq!(record.legendary_action_count, Some(3));
    }

    #[test]
    fn test_legendary_action_uses_2024() {
        let lines = [
            "Legendary Action Uses: 4 (5 in Lair). Immediately after another creature's turn, the dragon can expend a use.",
            "Pounce. The dragon moves up to half its Speed.",
        ];
        assert_eq!(legendary_action_count(&lines), 4);
        let entries = parse_costed_entries(&lines);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Pounce");
        assert_eq!(legendary_action_count(&["Pounce. The dragon moves."]), 3);
    }

    #[test]
    fn test_lair_and_mythic_sections() {
        let text = "Tarrasque
Gargantuan Monstrosity (Titan), Unaligned
Mythic Actions
Roar. The tarrasque roars.
Lair Actions
Quake. The ground shakes.";
        let record = parse_statblock(text);
        assert_eq!(record.mythic_actions.as_ref().map(Vec::len), Some(1));
        assert_eq!(
            record.lair_actions,
            Some(vec![LairAction {
                description: "The ground shakes.".to_string(),
            }])
        );
        assert!(record.legendary_actions.is_none());
    }

    #[test]
    fn test_known_name_lines() {
        let lines = ["Bite", "Bite. Melee Weapon Attack.", "Claw", "Lonely line"];
        let known = known_name_lines(&lines);
        assert!(known.contains("Bite"));
        assert!(!known.contains("Claw"));
        assert!(!known.contains("Lonely line"));
    }

    #[test]
    fn test_entries_continuation_lines() {
        let lines = [
            "Bite. Melee Weapon Attack: +5 to hit.",
            "The target is grappled",
            "Hit Points restored",
        ];
        let entries = parse_entries(&lines);
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].description,
            "Melee Weapon Attack: +5 to hit.\nThe target is grappled\nHit Points restored"
        );
    }

    #[test]
    fn test_spell_list_lines_stay_in_spellcasting() {
        let lines = [
            "Spellcasting. The priest is a 5th-level spellcaster.",
            "Cantrips (at will): light, thaumaturgy",
            "1st level (4 slots): bless, cure wounds",
            "Divine Eminence. As a bonus action, the priest can expend a spell slot.",
        ];
        let entries = parse_entries(&lines);
        assert_eq!(entries.len(), 2);
        assert!(entries[0].description.contains("1st level (4 slots)"));
        assert_eq!(entries[1].name, "Divine Eminence");
    }

    #[test]
    fn test_traits_section_and_first_spellcasting_only() {
        let text = "Priest
Medium Humanoid, Any Alignment
Traits
Spellcasting. The priest's spellcasting ability is Wisdom (spell save DC 13).
Cantrips (at will): light
Actions
Spellcasting. Unused duplicate.";
        let record = parse_statblock(text);
        assert!(record.special_traits.is_empty());
        assert_eq!(record.actions.len(), 1);
        let block = record.spellcasting.expect("spellcasting");
        assert_eq!(block.ability.as_deref(), Some("Wisdom"));
        assert_eq!(block.spells_by_level["cantrips"], vec!["light"]);
    }

    #[test]
    fn test_repeated_header_resets_section() {
        let sections = split_sections(&["Before", "Actions", "Bite. One.", "Actions.", "Claw. Two."]);
        assert_eq!(sections[&Section::Actions], vec!["Claw. Two."]);
        assert_eq!(sections.len(), 1);
    }

    #[test]
    fn test_features_used_without_traits_header() {
        let record = parse_statblock("Ooze\nLarge Ooze, Unaligned\nFeatures\nAmorphous. The ooze can squeeze.");
        assert_eq!(record.special_traits.len(), 1);
        assert_eq!(record.special_traits[0].name, "Amorphous");
    }
}
