//! Entity resolver
//!
//! Expands a raw subject name into a ranked, bounded list of comparison
//! variants. Fixed spellings under-recall transliterated and prefixed names
//! while unranked expansion over-generates noise, so the resolver produces a
//! small priority-ordered set with the original input always first.

use crate::types::{NameVariant, Subject, SubjectKind};
use tracing::debug;

/// Honorifics stripped from the front of individual names
const HONORIFICS: &[&str] = &[
    "mr", "mrs", "ms", "miss", "dr", "prof", "sir", "lord", "sheikh", "hon", "honorable",
];

/// Name prefixes that transliterated sources spell inconsistently
const SCRIPT_PREFIXES: &[&str] = &["al", "el"];

/// Maximum number of variants returned per subject
const MAX_VARIANTS: usize = 5;

/// Expands subject names into screening variants
#[derive(Debug, Clone)]
pub struct EntityResolver {
    max_variants: usize,
}

impl EntityResolver {
    /// Create a resolver with the default variant cap
    pub fn new() -> Self {
        Self {
            max_variants: MAX_VARIANTS,
        }
    }

    /// Produce the ranked variant list for a subject.
    ///
    /// Organization names are never expanded: the canonical/suffix-stripped
    /// handling in the match engine covers their spelling variance. Single
    /// token individual names are too ambiguous to expand safely and come
    /// back as just the original.
    pub fn resolve(&self, subject: &Subject) -> Vec<NameVariant> {
        let original = subject.name.trim();

        if subject.kind == SubjectKind::Organization {
            return vec![NameVariant::new(original, 0)];
        }

        let stripped = strip_honorifics(original);
        let tokens: Vec<&str> = stripped.split_whitespace().collect();

        if tokens.len() < 2 {
            return vec![NameVariant::new(original, 0)];
        }

        let mut candidates: Vec<String> = vec![original.to_string()];

        let first = tokens[0];
        let last = tokens[tokens.len() - 1];

        // (a) first + middle + last
        if tokens.len() >= 3 {
            candidates.push(format!("{} {} {}", first, tokens[1], last));
        }

        // (b) first + last
        candidates.push(format!("{} {}", first, last));

        // (c) prefix collapsed to canonical spacing, and prefix removed
        if let Some((collapsed, removed)) = expand_prefix(&tokens) {
            candidates.push(collapsed);
            candidates.push(removed);
        }

        // (d) family-name-first for sources indexed that way
        candidates.push(format!("{} {}", last, first));

        let variants = dedup_and_rank(candidates, self.max_variants);
        debug!(
            "Resolved '{}' into {} variants",
            subject.name,
            variants.len()
        );
        variants
    }
}

impl Default for EntityResolver {
    fn default() -> Self {
        Self::new()
    }
}

// Strip leading honorifics, repeating in case of stacked titles.
fn strip_honorifics(name: &str) -> String {
    let mut tokens: Vec<&str> = name.split_whitespace().collect();

    loop {
        // "His Excellency" / "Her Excellency" come as a pair
        if tokens.len() > 2
            && matches!(tokens[0].to_lowercase().as_str(), "his" | "her")
            && tokens[1].to_lowercase().trim_end_matches('.') == "excellency"
        {
            tokens.drain(..2);
            continue;
        }

        match tokens.first() {
            Some(head) if tokens.len() > 1 => {
                let bare = head.to_lowercase();
                let bare = bare.trim_end_matches('.');
                if HONORIFICS.contains(&bare) {
                    tokens.remove(0);
                    continue;
                }
            }
            _ => {}
        }
        break;
    }

    tokens.join(" ")
}

// For the first token carrying a script prefix ("Al-Otaibi", "Al Otaibi"),
// build one form with the prefix at canonical spacing and one without it.
fn expand_prefix(tokens: &[&str]) -> Option<(String, String)> {
    for (i, token) in tokens.iter().enumerate() {
        let lower = token.to_lowercase();

        // hyphenated prefix inside one token
        for prefix in SCRIPT_PREFIXES {
            let hyphenated = format!("{}-", prefix);
            if lower.starts_with(&hyphenated) && lower.len() > hyphenated.len() {
                let rest = &token[hyphenated.len()..];
                let collapsed = rebuild(tokens, i, &format!("{} {}", &token[..prefix.len()], rest));
                let removed = rebuild(tokens, i, rest);
                return Some((collapsed, removed));
            }
        }

        // free-standing prefix token followed by the family name
        if SCRIPT_PREFIXES.contains(&lower.as_str()) && i + 1 < tokens.len() {
            let pair = format!("{} {}", token, tokens[i + 1]);
            let collapsed = rebuild_pair(tokens, i, &pair);
            let removed = rebuild_pair(tokens, i, tokens[i + 1]);
            return Some((collapsed, removed));
        }
    }
    None
}

// Replace tokens[i] with `replacement` and re-join.
fn rebuild(tokens: &[&str], i: usize, replacement: &str) -> String {
    let mut out: Vec<&str> = tokens.to_vec();
    out[i] = replacement;
    out.join(" ")
}

// Replace tokens[i] and tokens[i + 1] with `replacement` and re-join.
fn rebuild_pair(tokens: &[&str], i: usize, replacement: &str) -> String {
    let mut out: Vec<&str> = Vec::with_capacity(tokens.len());
    out.extend_from_slice(&tokens[..i]);
    out.push(replacement);
    out.extend_from_slice(&tokens[i + 2..]);
    out.join(" ")
}

// Case-insensitive dedup preserving first occurrence, then cap and rank.
fn dedup_and_rank(candidates: Vec<String>, cap: usize) -> Vec<NameVariant> {
    let mut seen: Vec<String> = Vec::new();
    let mut variants = Vec::new();

    for candidate in candidates {
        let trimmed = candidate.trim();
        if trimmed.is_empty() {
            continue;
        }
        let key = trimmed.to_lowercase();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        variants.push(NameVariant::new(trimmed, variants.len()));
        if variants.len() >= cap {
            break;
        }
    }

    variants
}
