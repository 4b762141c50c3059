//! Advisory completeness checks for parsed records.
//!
//! Warnings never block anything; callers decide whether to show them.

use crate::models::{SpellRecord, StatblockRecord};

pub const MISSING_DESCRIPTION: &str = "Missing description";

/// Warnings for missing spell fields.
pub fn validate_spell(data: &SpellRecord) -> Vec<String> {
    let mut warnings = Vec::new();
    if data.name.is_empty() {
        warnings.push("Missing spell name".to_string());
    }
    if data.casting_time.is_empty() {
        warnings.push("Missing casting time".to_string());
    }
    if data.duration.is_empty() {
        warnings.push("Missing duration".to_string());
    }
    if data.description.is_empty() {
        warnings.push(MISSING_DESCRIPTION.to_string());
    }
    warnings
}

/// Warnings for missing required statblock fields and values that usually
/// mean a line was not recognized.
pub fn validate_statblock(data: &StatblockRecord) -> Vec<String> {
    let mut warnings = Vec::new();

    let missing = [
        ("name", data.name.is_empty()),
        ("size", data.size.is_empty()),
        ("type", data.creature_type.is_empty()),
        ("armor_class", data.armor_class.is_empty()),
    ];
    for (field, is_missing) in missing {
        if is_missing {
            warnings.push(format!("Missing required field: {}", field));
        }
    }

    if data.name.is_empty() {
        warnings.push("Name is empty".to_string());
    }
    if data.size.is_empty() {
        warnings.push("Size is empty - check that the size/type/alignment line was parsed".to_string());
    }
    if data.hit_points.average == 0 {
        warnings.push("Hit points average is 0 - may indicate a parsing error".to_string());
    }
    if data.armor_class.first().is_some_and(|ac| ac.value == 0) {
        warnings.push("AC value is 0 - may indicate a parsing error".to_string());
    }
    if data.ability_scores.values().iter().all(|&score| score == 10) {
        warnings.push("All ability scores are 10 - may indicate parsing failed".to_string());
    }

    warnings
}
