//! Spell text parser.
//!
//! Handles the two paste layouts:
//! ```text
//! Card                        Inline
//! ----                        ------
//! Calm Emotions               Fireball
//! Level                       3rd-level evocation
//! 2nd                         Casting Time: 1 action
//! Casting Time                Range: 150 feet
//! 1 Action                    ...
//! ...
//! ```

use crate::error::{Result, StatforgeError};
use crate::format::{DISPLAY_CARD_RE, SpellFormat, detect_spell_format};
use crate::models::SpellRecord;
use crate::normalize::{capitalize, non_blank_lines};
use lazy_static::lazy_static;
use regex::Regex;

/// Field a card-format label assigns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpellField {
    Level,
    CastingTime,
    Range,
    Components,
    Duration,
    School,
    AttackSave,
    DamageEffect,
}

fn card_label_field(label: &str) -> Option<SpellField> {
    let field = match label {
        "level" => SpellField::Level,
        "casting time" => SpellField::CastingTime,
        "range/area" | "range" => SpellField::Range,
        "components" => SpellField::Components,
        "duration" => SpellField::Duration,
        "school" => SpellField::School,
        "attack/save" => SpellField::AttackSave,
        "damage/effect" | "damage/type" => SpellField::DamageEffect,
        _ => return None,
    };
    Some(field)
}

enum LevelLine {
    LevelSchool,
    SchoolCantrip,
    Cantrip,
}

lazy_static! {
    static ref LEADING_INT_RE: Regex = Regex::new(r"^(\d+)").unwrap();
    static ref FOOTNOTE_RE: Regex = Regex::new(r"^\*\s*\(").unwrap();
    static ref CONCENTRATION_RE: Regex = Regex::new(r"(?i)^concentration\b").unwrap();
    static ref CONCENTRATION_PREFIX_RE: Regex =
        Regex::new(r"(?i)^concentration(?:[,\s]+|$)").unwrap();
    static ref PROPERTY_HEADER_RE: Regex = Regex::new(r"^[A-Z][A-Za-z /]+:\s*\S").unwrap();

    static ref LEVEL_LINE_PATTERNS: Vec<(Regex, LevelLine)> = vec![
        (Regex::new(r"(?i)^level\s+(\d+)\s+(\w+)").unwrap(), LevelLine::LevelSchool),
        (Regex::new(r"(?i)^(\d+)\s+level\s+(\w+)").unwrap(), LevelLine::LevelSchool),
        (Regex::new(r"(?i)^(\d+)(?:st|nd|rd|th)[- ]level\s+(\w+)").unwrap(), LevelLine::LevelSchool),
        (Regex::new(r"(?i)^(\w+)\s+cantrip").unwrap(), LevelLine::SchoolCantrip),
        (Regex::new(r"(?i)^cantrip$").unwrap(), LevelLine::Cantrip),
    ];

    // Tried in order; first match wins.
    static ref INLINE_LABEL_PATTERNS: Vec<(Regex, SpellField)> = vec![
        (Regex::new(r"(?i)^casting\s*time\s*(?::|\s-\s)\s*(.+)$").unwrap(), SpellField::CastingTime),
        (Regex::new(r"(?i)^range(?:/area)?\s*(?::|\s-\s)\s*(.+)$").unwrap(), SpellField::Range),
        (Regex::new(r"(?i)^components?\s*(?::|\s-\s)\s*(.+)$").unwrap(), SpellField::Components),
        (Regex::new(r"(?i)^duration\s*(?::|\s-\s)\s*(.+)$").unwrap(), SpellField::Duration),
        (Regex::new(r"(?i)^school\s*(?::|\s-\s)\s*(.+)$").unwrap(), SpellField::School),
        (Regex::new(r"(?i)^attack/save\s*(?::|\s-\s)\s*(.+)$").unwrap(), SpellField::AttackSave),
        (Regex::new(r"(?i)^damage(?:/effect|/type)?\s*(?::|\s-\s)\s*(.+)$").unwrap(), SpellField::DamageEffect),
    ];
}

/// Parse one spell (card or inline layout).
///
/// Fails only when the text has no non-blank lines; every other gap is
/// left at the field's default.
pub fn parse_spell(text: &str) -> Result<SpellRecord> {
    let lines = non_blank_lines(text);
    if lines.is_empty() {
        return Err(StatforgeError::EmptyInput);
    }

    let format = detect_spell_format(&lines);
    tracing::debug!("Parsing spell {:?} as {} format", lines[0], format);

    let record = match format {
        SpellFormat::Card => parse_card_format(&lines),
        SpellFormat::Inline => parse_inline_format(&lines),
    };
    Ok(record)
}

/// "Cantrip" -> 0, "3rd" -> 3, "3" -> 3.
fn parse_level_value(value: &str) -> u8 {
    let value = value.trim().to_lowercase();
    if value == "cantrip" || value == "0" {
        return 0;
    }
    LEADING_INT_RE
        .captures(&value)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

fn assign(record: &mut SpellRecord, field: SpellField, value: &str) {
    let value = value.trim().to_string();
    match field {
        SpellField::Level => record.level = parse_level_value(&value),
        SpellField::CastingTime => record.casting_time = value,
        SpellField::Range => record.range = value,
        SpellField::Components => record.components = value,
        SpellField::Duration => record.duration = value,
        SpellField::School => record.school = value,
        SpellField::AttackSave => record.attack_save = value,
        SpellField::DamageEffect => record.damage_effect = value,
    }
}

/// Join description lines, collapsing blank-line separated runs into
/// trimmed paragraphs separated by a single blank line.
fn join_paragraphs<S: AsRef<str>>(lines: &[S]) -> String {
    let joined = lines
        .iter()
        .map(|line| line.as_ref())
        .collect::<Vec<_>>()
        .join("\n");
    joined
        .split("\n\n")
        .map(str::trim)
        .filter(|para| !para.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Move a leading "Concentration" out of the duration into the flag.
fn extract_concentration(record: &mut SpellRecord) {
    if CONCENTRATION_RE.is_match(&record.duration) {
        record.concentration = true;
        record.duration = CONCENTRATION_PREFIX_RE
            .replace(&record.duration, "")
            .trim()
            .to_string();
    }
}

fn parse_card_format<S: AsRef<str>>(lines: &[S]) -> SpellRecord {
    let mut record = SpellRecord {
        name: lines[0].as_ref().trim().to_string(),
        ..SpellRecord::default()
    };
    let line_at = move |idx: usize| lines[idx].as_ref().trim();

    let mut idx = 1;
    while idx < lines.len() && DISPLAY_CARD_RE.is_match(line_at(idx)) {
        idx += 1;
    }

    if idx < lines.len() && line_at(idx).eq_ignore_ascii_case("concentration") {
        record.concentration = true;
        idx += 1;
    }

    while idx + 1 < lines.len() {
        let label = line_at(idx).to_lowercase();
        let Some(field) = card_label_field(&label) else {
            break;
        };
        assign(&mut record, field, line_at(idx + 1));
        idx += 2;
    }

    let mut description = Vec::new();
    for line in &lines[idx..] {
        let line = line.as_ref().trim();
        if FOOTNOTE_RE.is_match(line) {
            record.footnotes.push(line.to_string());
        } else {
            description.push(line);
        }
    }
    record.description = join_paragraphs(&description);

    extract_concentration(&mut record);
    record
}

fn parse_inline_format<S: AsRef<str>>(lines: &[S]) -> SpellRecord {
    let mut record = SpellRecord {
        name: lines[0].as_ref().trim().to_string(),
        ..SpellRecord::default()
    };

    let mut idx = 1;
    if idx >= lines.len() {
        return record;
    }

    let level_line = lines[idx].as_ref();
    for (pattern, kind) in LEVEL_LINE_PATTERNS.iter() {
        let Some(caps) = pattern.captures(level_line) else {
            continue;
        };
        match kind {
            LevelLine::LevelSchool => {
                record.level = caps[1].parse().unwrap_or(0);
                record.school = capitalize(&caps[2]);
            }
            LevelLine::SchoolCantrip => record.school = capitalize(&caps[1]),
            LevelLine::Cantrip => {}
        }
        idx += 1;
        break;
    }

    let mut description: Vec<&str> = Vec::new();
    let mut in_description = false;

    for line in &lines[idx..] {
        let line = line.as_ref();
        if in_description {
            description.push(line);
            continue;
        }

        let matched = INLINE_LABEL_PATTERNS
            .iter()
            .find_map(|(pattern, field)| pattern.captures(line).map(|caps| (*field, caps)));

        match matched {
            // A school from the level line takes precedence.
            Some((SpellField::School, _)) if !record.school.is_empty() => {}
            Some((field, caps)) => assign(&mut record, field, &caps[1]),
            None if PROPERTY_HEADER_RE.is_match(line) && description.is_empty() => {}
            None => {
                in_description = true;
                description.push(line);
            }
        }
    }
    record.description = join_paragraphs(&description);

    extract_concentration(&mut record);
    record
}
