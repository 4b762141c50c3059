//! Core library for turning pasted D&D Beyond spell and statblock text into
//! structured records.

pub mod bulk;
pub mod config;
pub mod error;
pub mod file_utils;
pub mod format;
pub mod keys;
pub mod models;
pub mod normalize;
pub mod spell_parser;
pub mod spellcasting;
pub mod statblock;
pub mod validation;

pub use bulk::{dedupe_prefer_non_legacy, filter_for_import, parse_bulk_spells};
pub use config::ImportConfig;
pub use error::{Result, StatforgeError};
pub use keys::{canonical_spell_key, is_legacy_key, spell_key, statblock_key};
pub use models::{ParsedSpellBlock, SpellRecord, StatblockRecord};
pub use spell_parser::parse_spell;
pub use spellcasting::parse_spellcasting_block;
pub use statblock::parse_statblock;
pub use validation::{validate_spell, validate_statblock};
