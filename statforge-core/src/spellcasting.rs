//! Extraction of a structured spellcasting block from a trait description.
//!
//! This works on the whole description as one string rather than line by
//! line: each field is a free search for its labelled fragment.

use crate::models::SpellcastingBlock;
use crate::normalize::capitalize;
use lazy_static::lazy_static;
use regex::Regex;

const LEVEL_WORDS: [(&str, &str); 9] = [
    ("1st", "1"),
    ("2nd", "2"),
    ("3rd", "3"),
    ("4th", "4"),
    ("5th", "5"),
    ("6th", "6"),
    ("7th", "7"),
    ("8th", "8"),
    ("9th", "9"),
];

lazy_static! {
    static ref ABILITY_2014_RE: Regex = Regex::new(r"(?i)spellcasting ability is (\w+)").unwrap();
    static ref ABILITY_2024_RE: Regex = Regex::new(r"(?i)using (\w+) as the spellcasting ability").unwrap();
    static ref SAVE_DC_RE: Regex = Regex::new(r"(?i)spell save DC (\d+)").unwrap();
    static ref ATTACK_BONUS_RE: Regex = Regex::new(r"(?i)\+(\d+) to hit with spell attacks").unwrap();
    static ref CANTRIPS_RE: Regex =
        Regex::new(r"(?i)cantrips?\s*(?:\(at will\))?[ \t]*:[ \t]*([^\n]+)").unwrap();
    static ref AT_WILL_RE: Regex = Regex::new(r"(?i)at will[ \t]*:[ \t]*([^\n]+)").unwrap();
    static ref PER_DAY_RE: Regex =
        Regex::new(r"(?i)(\d+)/day(?:\s+each)?[ \t]*:[ \t]*([^\n]+)").unwrap();
    static ref SLOT_LEVEL_RES: Vec<(&'static str, Regex)> = LEVEL_WORDS
        .iter()
        .map(|(word, level)| {
            let pattern = format!(r"(?i){}\s+level\s*\((\d+)\s+slots?\)[ \t]*:[ \t]*([^\n]+)", word);
            (*level, Regex::new(&pattern).unwrap())
        })
        .collect();
    static ref TRAILING_MARKERS_RE: Regex = Regex::new(r"[*\u{2020}]+$").unwrap();
}

fn first_int(re: &Regex, text: &str) -> Option<i32> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Parse a spellcasting trait description. Absent fragments leave the
/// corresponding field empty.
pub fn parse_spellcasting_block(description: &str) -> SpellcastingBlock {
    let mut block = SpellcastingBlock::default();

    block.ability = ABILITY_2014_RE
        .captures(description)
        .or_else(|| ABILITY_2024_RE.captures(description))
        .map(|caps| capitalize(&caps[1]));

    block.save_dc = first_int(&SAVE_DC_RE, description);
    block.attack_bonus = first_int(&ATTACK_BONUS_RE, description);

    if let Some(caps) = CANTRIPS_RE.captures(description) {
        block
            .spells_by_level
            .insert("cantrips".to_string(), split_spell_list(&caps[1]));
    }

    for (level, re) in SLOT_LEVEL_RES.iter() {
        let Some(caps) = re.captures(description) else {
            continue;
        };
        if let Ok(slots) = caps[1].parse() {
            block.slots.insert(level.to_string(), slots);
        }
        block
            .spells_by_level
            .insert(level.to_string(), split_spell_list(&caps[2]));
    }

    if let Some(caps) = AT_WILL_RE.captures(description) {
        block
            .innate
            .insert("at_will".to_string(), split_spell_list(&caps[1]));
    }

    for caps in PER_DAY_RE.captures_iter(description) {
        block
            .innate
            .insert(format!("{}_per_day", &caps[1]), split_spell_list(&caps[2]));
    }

    block
}

fn clean_spell_name(raw: &str) -> Option<String> {
    let part = raw.trim().trim_end_matches('.');
    let part = TRAILING_MARKERS_RE.replace(part, "");
    let part = part.trim();
    if part.is_empty() {
        None
    } else {
        Some(part.to_lowercase())
    }
}

/// Split a comma-separated spell list. Commas inside parentheses do not
/// split, so "fireball (level 4, cold)" stays one entry.
pub fn split_spell_list(text: &str) -> Vec<String> {
    let mut spells = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for ch in text.chars() {
        match ch {
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if depth == 0 => {
                spells.extend(clean_spell_name(&current));
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    spells.extend(clean_spell_name(&current));

    spells
}
