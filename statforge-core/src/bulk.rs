//! Splitting of one large paste holding many spells.
//!
//! D&D Beyond spell listings have no delimiters. Each spell shows a level
//! token, the name, a short preview, then the structured label block:
//! ```text
//! 2nd              <- level token, segment starts here
//! Calm Emotions    <- name
//! Concentration
//! Enchantment • V, S
//! ...
//! Level            <- structured block fed to the spell parser
//! 2nd
//! Casting Time
//! ...
//! View Details Page
//! ```

use crate::keys::spell_key;
use crate::models::ParsedSpellBlock;
use crate::normalize::non_blank_lines;
use crate::spell_parser::parse_spell;
use crate::validation::{MISSING_DESCRIPTION, validate_spell};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

/// Lines that can follow a level token without being a spell name.
const RESERVED_LABELS: &[&str] = &[
    "level",
    "casting time",
    "range/area",
    "components",
    "duration",
    "school",
    "attack/save",
    "damage/effect",
];

/// Page chrome that ends a structured block.
const BLOCK_BREAK_MARKERS: &[&str] = &["view details page", "tags:", "available for:"];

/// How many leading segment lines may carry the "Legacy" badge.
const LEGACY_SCAN_LINES: usize = 8;

lazy_static! {
    static ref LEVEL_TOKEN_RE: Regex = Regex::new(r"(?i)^(?:cantrip|[1-9](?:st|nd|rd|th))$").unwrap();
}

fn looks_like_spell_name(line: &str) -> bool {
    if line.is_empty() {
        return false;
    }
    let lower = line.to_lowercase();
    !RESERVED_LABELS.contains(&lower.as_str()) && !line.ends_with(':')
}

fn find_spell_starts(lines: &[String]) -> Vec<usize> {
    lines
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| LEVEL_TOKEN_RE.is_match(&pair[0]) && looks_like_spell_name(&pair[1]))
        .map(|(idx, _)| idx)
        .collect()
}

fn cut_block_metadata(block: &[String]) -> &[String] {
    let end = block
        .iter()
        .position(|line| BLOCK_BREAK_MARKERS.contains(&line.trim().to_lowercase().as_str()))
        .unwrap_or(block.len());
    &block[..end]
}

/// Rebuild `name + structured block` for one segment. Returns `None` when
/// the segment has no "Level" line to anchor on.
fn extract_parseable_spell_text(segment: &[String]) -> Option<(String, bool)> {
    if segment.len() < 3 {
        return None;
    }

    let name = segment[1].trim();
    let is_legacy = segment
        .iter()
        .take(LEGACY_SCAN_LINES)
        .any(|line| line.trim().eq_ignore_ascii_case("legacy"));

    let level_idx = segment
        .iter()
        .position(|line| line.trim().eq_ignore_ascii_case("level"))?;

    let block = cut_block_metadata(&segment[level_idx..]);
    let mut parts = Vec::with_capacity(block.len() + 1);
    parts.push(name);
    parts.extend(block.iter().map(String::as_str));
    Some((parts.join("\n"), is_legacy))
}

/// Split a multi-spell paste into parsed spells.
///
/// Segments that cannot be parsed, or that yield no name, are dropped.
/// Legacy spells are dropped unless `include_legacy` is set.
pub fn parse_bulk_spells(text: &str, include_legacy: bool) -> Vec<ParsedSpellBlock> {
    let lines = non_blank_lines(text);
    let starts = find_spell_starts(&lines);
    if starts.is_empty() {
        return Vec::new();
    }

    let mut boundaries = starts;
    boundaries.push(lines.len());

    let mut parsed = Vec::new();
    for bounds in boundaries.windows(2) {
        let segment = &lines[bounds[0]..bounds[1]];
        let Some((parse_text, is_legacy)) = extract_parseable_spell_text(segment) else {
            tracing::debug!("Skipping segment at line {}: no structured block", bounds[0]);
            continue;
        };

        if is_legacy && !include_legacy {
            tracing::debug!("Skipping legacy spell {:?}", segment[1]);
            continue;
        }

        let data = match parse_spell(&parse_text) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Failed to parse spell segment at line {}: {}", bounds[0], e);
                continue;
            }
        };

        let name = data.name.trim().to_string();
        if name.is_empty() {
            continue;
        }

        parsed.push(ParsedSpellBlock {
            key: spell_key(&name),
            warnings: validate_spell(&data),
            name,
            data,
            is_legacy,
        });
    }

    parsed
}

/// Keep one spell per key, in first-seen order. A non-legacy spell always
/// replaces a legacy one with the same key; otherwise the first wins.
pub fn dedupe_prefer_non_legacy<I>(spells: I) -> Vec<ParsedSpellBlock>
where
    I: IntoIterator<Item = ParsedSpellBlock>,
{
    let mut kept: Vec<ParsedSpellBlock> = Vec::new();
    let mut index_by_key: HashMap<String, usize> = HashMap::new();

    for spell in spells {
        match index_by_key.get(&spell.key) {
            None => {
                index_by_key.insert(spell.key.clone(), kept.len());
                kept.push(spell);
            }
            Some(&idx) => {
                if kept[idx].is_legacy && !spell.is_legacy {
                    kept[idx] = spell;
                }
            }
        }
    }

    kept
}

/// Import-time filtering of bulk results.
///
/// Without `include_legacy`, legacy spells survive only when no non-legacy
/// spell shares their key. With it, deduping is opt-in via `dedupe`.
/// `skip_incomplete` drops entries with no description (locked previews).
pub fn filter_for_import(
    spells: Vec<ParsedSpellBlock>,
    include_legacy: bool,
    dedupe: bool,
    skip_incomplete: bool,
) -> Vec<ParsedSpellBlock> {
    let filtered = if !include_legacy || dedupe {
        dedupe_prefer_non_legacy(spells)
    } else {
        spells
    };

    if !skip_incomplete {
        return filtered;
    }

    filtered
        .into_iter()
        .filter(|spell| !spell.warnings.iter().any(|w| w == MISSING_DESCRIPTION))
        .collect()
}
