//! Text normalization for address search.
//!
//! Provides a deterministic normalization pipeline applied both to
//! type-ahead input and to submitted addresses, so that "Hauptstraße 5"
//! and "Hauptstr. 5" produce the same query.
//!
//! The pipeline:
//! 1. Compose to Unicode NFC, so decomposed umlauts fold like typed ones
//! 2. Fold diacritics ([`synonyms::DIACRITICS`])
//! 3. Abbreviate street suffixes ([`synonyms::STREET_SUFFIXES`])
//! 4. Collapse whitespace and trim
//!
//! The result is idempotent: normalizing a normalized string returns it
//! unchanged. Token order, digits and hyphens are always preserved.

use std::borrow::Cow;

use unicode_normalization::UnicodeNormalization;

use crate::synonyms::{self, STREET_SUFFIXES};

/// Normalizes address text for searching.
#[must_use]
pub fn normalize(input: &str) -> String {
    let composed: String = input.nfc().collect();
    let folded = fold_diacritics(&composed);

    let tokens: Vec<Cow<'_, str>> = folded.split_whitespace().map(abbreviate_token).collect();

    tokens.join(" ")
}

/// Number of characters in the normalized form of `input`.
#[must_use]
pub fn normalized_len(input: &str) -> usize {
    normalize(input).chars().count()
}

fn fold_diacritics(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match synonyms::fold_char(c) {
            Some(replacement) => out.push_str(replacement),
            None => out.push(c),
        }
    }
    out
}

fn abbreviate_token(token: &str) -> Cow<'_, str> {
    let mut token = Cow::Borrowed(token);

    for (long, short) in STREET_SUFFIXES {
        if let Some(rewritten) = drop_abbreviation_dots(&token, short) {
            token = Cow::Owned(rewritten);
        }
        if let Some(rewritten) = abbreviate_suffix(&token, long, short) {
            token = Cow::Owned(rewritten);
        }
    }

    token
}

/// Removes the dots after every `short` that is not followed by a letter.
///
/// `"Hauptstr.5"` becomes `"Hauptstr5"`; `"str.asse"` is left alone.
fn drop_abbreviation_dots(token: &str, short: &str) -> Option<String> {
    let lower = token.to_ascii_lowercase();
    let mut out = String::with_capacity(token.len());
    let mut copied = 0;
    let mut from = 0;

    while let Some(found) = lower[from..].find(short) {
        let dots_start = from + found + short.len();
        let rest = &token[dots_start..];
        let dots_end = dots_start + rest.len() - rest.trim_start_matches('.').len();
        from = dots_end;

        if dots_end > dots_start && !token[dots_end..].starts_with(char::is_alphabetic) {
            out.push_str(&token[copied..dots_start]);
            copied = dots_end;
        }
    }

    if copied == 0 {
        return None;
    }
    out.push_str(&token[copied..]);
    Some(out)
}

/// Rewrites a long-form street suffix at the end of `token`.
///
/// Trailing punctuation is kept, except abbreviation dots directly after
/// the suffix (`"Hauptstrasse.,"` becomes `"Hauptstr,"`).
fn abbreviate_suffix(token: &str, long: &str, short: &str) -> Option<String> {
    let head_len = token
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .len();
    let (head, tail) = token.split_at(head_len);

    let stem = strip_suffix_ignore_case(head, long)?;
    let suffix = &head[stem.len()..];
    Some(format!(
        "{stem}{}{}",
        match_case(suffix, short),
        tail.trim_start_matches('.')
    ))
}

fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let idx = s.len().checked_sub(suffix.len())?;
    if !s.is_char_boundary(idx) || !s[idx..].eq_ignore_ascii_case(suffix) {
        return None;
    }
    Some(&s[..idx])
}

/// Applies the capitalisation of `original` to the ASCII `replacement`.
fn match_case(original: &str, replacement: &str) -> String {
    let letters = || original.chars().filter(char::is_ascii_alphabetic);

    if letters().count() > 1 && letters().all(|c| c.is_ascii_uppercase()) {
        return replacement.to_ascii_uppercase();
    }

    if original.starts_with(|c: char| c.is_ascii_uppercase()) {
        let mut chars = replacement.chars();
        return chars.next().map_or_else(String::new, |first| {
            first.to_ascii_uppercase().to_string() + chars.as_str()
        });
    }

    replacement.to_ascii_lowercase()
}
