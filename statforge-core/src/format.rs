//! Dialect detection for pasted spell and statblock text.
//!
//! Detection is heuristic: when no signal is found the older dialect is
//! assumed (`Inline` for spells, `Legacy` for statblocks).

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Labels that sit on their own line in the card paste format.
pub const CARD_LABELS: &[&str] = &[
    "level",
    "casting time",
    "range/area",
    "range",
    "components",
    "duration",
    "school",
    "attack/save",
    "damage/effect",
    "damage/type",
];

/// Number of leading lines inspected for card labels.
const CARD_SCAN_LINES: usize = 10;

lazy_static! {
    pub(crate) static ref DISPLAY_CARD_RE: Regex = Regex::new(r"(?i)^display\s+spell\s+card").unwrap();
    static ref CR_LINE_RE: Regex = Regex::new(r"^CR\s+[\d/]").unwrap();
    static ref AC_INITIATIVE_RE: Regex = Regex::new(r"^AC\s+\d+.*Initiative").unwrap();
    static ref MOD_SAVE_RE: Regex = Regex::new(r"^Mod\s+Save").unwrap();
}

/// Layout of a pasted spell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpellFormat {
    /// Label and value on separate lines.
    Card,
    /// `Label: value` on one line.
    Inline,
}

/// Rules edition a pasted statblock was written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatblockFormat {
    #[serde(rename = "2014")]
    Legacy,
    #[serde(rename = "2024")]
    Current,
}

impl fmt::Display for SpellFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpellFormat::Card => write!(f, "card"),
            SpellFormat::Inline => write!(f, "inline"),
        }
    }
}

impl fmt::Display for StatblockFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatblockFormat::Legacy => write!(f, "2014"),
            StatblockFormat::Current => write!(f, "2024"),
        }
    }
}

/// Classify non-blank, trimmed spell lines. The first line is the name and
/// is never inspected.
pub fn detect_spell_format<S: AsRef<str>>(lines: &[S]) -> SpellFormat {
    let is_card = lines
        .iter()
        .skip(1)
        .take(CARD_SCAN_LINES - 1)
        .map(|line| line.as_ref().trim().to_lowercase())
        .any(|line| CARD_LABELS.contains(&line.as_str()) || DISPLAY_CARD_RE.is_match(&line));

    if is_card { SpellFormat::Card } else { SpellFormat::Inline }
}

/// Classify statblock lines. Any 2024 signal wins; otherwise 2014.
pub fn detect_statblock_format<S: AsRef<str>>(lines: &[S]) -> StatblockFormat {
    let is_current = lines.iter().map(|line| line.as_ref().trim()).any(|line| {
        CR_LINE_RE.is_match(line) || AC_INITIATIVE_RE.is_match(line) || MOD_SAVE_RE.is_match(line)
    });

    if is_current {
        StatblockFormat::Current
    } else {
        StatblockFormat::Legacy
    }
}
