//! Name canonicalization
//!
//! Both query and candidate names go through the same pipeline before any
//! comparison: Unicode decomposition with diacritics stripped, apostrophe
//! variants folded, punctuation removed, whitespace collapsed, lower-cased.
//! Organization names additionally get a legal-suffix-stripped form; both
//! forms are valid match targets.

use regex::Regex;
use std::sync::OnceLock;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Legal-entity suffixes stripped from the tail of organization names
const LEGAL_SUFFIXES: &[&str] = &[
    "inc",
    "incorporated",
    "ltd",
    "limited",
    "corp",
    "corporation",
    "co",
    "company",
    "llc",
    "llp",
    "gmbh",
    "ag",
    "sa",
    "plc",
    "pte",
    "pty",
    "bv",
    "nv",
    "srl",
    "sarl",
    "oy",
    "ab",
];

/// Apostrophe code points folded to ASCII before punctuation stripping
const APOSTROPHES: &[char] = &['\u{2018}', '\u{2019}', '\u{02BC}', '\u{02BB}', '`', '\u{00B4}'];

fn punct_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s]").unwrap())
}

/// Decompose and drop combining marks: "Müller" -> "Muller"
pub fn strip_diacritics(name: &str) -> String {
    name.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Canonical comparison form: diacritics stripped, apostrophes folded,
/// punctuation removed, whitespace collapsed, lower-cased.
pub fn canonicalize(name: &str) -> String {
    let folded: String = strip_diacritics(name)
        .chars()
        .map(|c| if APOSTROPHES.contains(&c) { '\'' } else { c })
        .collect();
    let cleaned = punct_re().replace_all(&folded, "");
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_lowercase()
}

/// Drop trailing legal-entity suffix tokens from an already-canonical name:
/// "acme holdings ltd" -> "acme holdings". Never strips down to nothing.
pub fn strip_legal_suffixes(canonical: &str) -> String {
    let mut tokens: Vec<&str> = canonical.split_whitespace().collect();
    while tokens.len() > 1 {
        let last = tokens[tokens.len() - 1];
        if LEGAL_SUFFIXES.contains(&last) {
            tokens.pop();
        } else {
            break;
        }
    }
    tokens.join(" ")
}

/// The canonical match targets derived from one name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalName {
    /// Full canonical form
    pub full: String,
    /// Canonical form with legal suffixes stripped
    pub stripped: String,
}

/// Compute both match targets for a name
pub fn canonical_targets(name: &str) -> CanonicalName {
    let full = canonicalize(name);
    let stripped = strip_legal_suffixes(&full);
    CanonicalName { full, stripped }
}
