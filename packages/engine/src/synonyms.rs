//! Substitution tables used by the text normalizer.
//!
//! Both tables are fixed and documented entry by entry. Nothing is
//! inferred from Unicode decomposition: only the characters listed here
//! are folded, everything else passes through untouched.

/// Diacritic folding, one entry per character.
pub const DIACRITICS: &[(char, &str)] = &[
    // LATIN SMALL LETTER SHARP S
    ('ß', "ss"),
    // LATIN CAPITAL LETTER SHARP S
    ('ẞ', "SS"),
    // LATIN CAPITAL LETTER A WITH DIAERESIS
    ('Ä', "A"),
    // LATIN SMALL LETTER A WITH DIAERESIS
    ('ä', "a"),
    // LATIN CAPITAL LETTER O WITH DIAERESIS
    ('Ö', "O"),
    // LATIN SMALL LETTER O WITH DIAERESIS
    ('ö', "o"),
    // LATIN CAPITAL LETTER U WITH DIAERESIS
    ('Ü', "U"),
    // LATIN SMALL LETTER U WITH DIAERESIS
    ('ü', "u"),
];

/// Long-form street suffixes and their canonical abbreviation.
///
/// Matched case-insensitively at the end of a word, after diacritic
/// folding (so `straße` is covered by `strasse`). A word already ending
/// in the abbreviation loses any trailing abbreviation dots.
pub const STREET_SUFFIXES: &[(&str, &str)] = &[("strasse", "str")];

/// Returns the folded replacement for `c`, if it has one.
#[must_use]
pub fn fold_char(c: char) -> Option<&'static str> {
    DIACRITICS
        .iter()
        .find_map(|(from, to)| (*from == c).then_some(*to))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_every_listed_character() {
        for (from, to) in DIACRITICS {
            assert_eq!(fold_char(*from), Some(*to));
        }
    }

    #[test]
    fn leaves_unlisted_characters_alone() {
        assert_eq!(fold_char('é'), None);
        assert_eq!(fold_char('a'), None);
        assert_eq!(fold_char('-'), None);
    }

    #[test]
    fn replacements_are_ascii() {
        for (_, to) in DIACRITICS {
            assert!(to.is_ascii());
        }
        for (long, short) in STREET_SUFFIXES {
            assert!(long.is_ascii() && short.is_ascii());
            assert!(long.starts_with(short));
        }
    }
}
