//! Unicode cleanup applied to pasted text before any pattern matching.

/// Replacement table. Every replacement is pure ASCII, so running the
/// table twice is the same as running it once.
const REPLACEMENTS: &[(char, &str)] = &[
    ('\u{fb01}', "fi"),
    ('\u{fb02}', "fl"),
    ('\u{fb03}', "ffi"),
    ('\u{fb04}', "ffl"),
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201c}', "\""),
    ('\u{201d}', "\""),
    ('\u{2013}', "-"),
    ('\u{2014}', "-"),
    ('\u{2212}', "-"),
    ('\u{00a0}', " "),
];

/// Replace ligatures, smart quotes, dashes and non-breaking spaces with
/// their ASCII equivalents.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match REPLACEMENTS.iter().find(|(from, _)| *from == ch) {
            Some((_, to)) => out.push_str(to),
            None => out.push(ch),
        }
    }
    out
}

/// Normalize, trim every line, and drop blank lines.
pub fn non_blank_lines(text: &str) -> Vec<String> {
    normalize(text)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// "enchantment" -> "Enchantment", "INTELLIGENCE" -> "Intelligence".
pub(crate) fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
    }
}
