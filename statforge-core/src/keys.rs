//! Storage key derivation from display names.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NON_ALNUM_RE: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
    static ref HASH_SUFFIX_RE: Regex = Regex::new(r"\s*#\d+$").unwrap();
    static ref NUMBER_SUFFIX_RE: Regex = Regex::new(r"\s+\d+$").unwrap();
    static ref LEGACY_SUFFIX_RE: Regex = Regex::new(r"(?:_|\(|\[)?legacy(?:\)|\])?$").unwrap();
    static ref LEGACY_WORD_RE: Regex = Regex::new(r"(?i)\blegacy\b").unwrap();
}

fn slug(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    let collapsed = NON_ALNUM_RE.replace_all(&lower, "_");
    collapsed.trim_matches('_').to_string()
}

/// Convert a spell name to its storage key.
///
/// `"Magic Missile"` becomes `"magic_missile.json"`.
pub fn spell_key(name: &str) -> String {
    format!("{}.json", slug(name))
}

/// Convert a creature name to its storage key, collapsing numbered
/// instances: `"Goblin #2"` and `"Goblin 3"` both become `"goblin.json"`.
pub fn statblock_key(name: &str) -> String {
    let trimmed = name.trim();
    let without_hash = HASH_SUFFIX_RE.replace(trimmed, "");
    let base = NUMBER_SUFFIX_RE.replace(&without_hash, "");
    format!("{}.json", slug(&base))
}

/// Key with any trailing legacy marker removed, so that
/// `charm_person_legacy.json` and `charm_person.json` compare equal.
pub fn canonical_spell_key(key: &str) -> String {
    let lower = key.trim().to_lowercase();
    let stem = lower.strip_suffix(".json").unwrap_or(&lower);
    let stem = LEGACY_SUFFIX_RE.replace(stem, "");
    let stem = stem.trim_matches(|c| c == '_' || c == ' ');
    if stem.is_empty() {
        key.to_string()
    } else {
        format!("{}.json", stem)
    }
}

/// True when the word "legacy" appears in a key (underscores read as spaces).
pub fn is_legacy_key(key: &str) -> bool {
    LEGACY_WORD_RE.is_match(&key.replace('_', " "))
}
