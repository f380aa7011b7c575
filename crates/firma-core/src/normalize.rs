//! Text canonicalization used for every identity comparison.

use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref SIGNER_PREFIX: Regex = Regex::new(r"(?i)^(?:Fdo\.?|Firmado)\s*:\s*").unwrap();
}

/// Strip diacritics, uppercase and trim.
///
/// "José Pérez" becomes "JOSE PEREZ". Applying it twice yields the same result.
pub fn normalize(text: &str) -> String {
    let stripped: String = text.nfd().filter(|c| !is_combining_mark(*c)).collect();
    // Uppercasing can reintroduce decomposable forms (e.g. 'ǰ' -> 'J' + caron),
    // so strip marks a second time.
    let upper: String = stripped
        .to_uppercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();
    upper.trim().to_string()
}

/// Remove a leading "Fdo:", "Fdo.:" or "Firmado:" label, then normalize.
pub fn clean_identity_label(text: &str) -> String {
    let trimmed = text.trim_start();
    let without_prefix = SIGNER_PREFIX.replace(trimmed, "");
    normalize(&without_prefix)
}

/// All ASCII digits of `text`, concatenated.
pub fn digits_only(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// True when `token` is non-empty and made only of ASCII digits.
pub fn is_all_digits(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: normalize is idempotent
        #[test]
        fn normalize_is_idempotent(s in "\\PC{0,40}") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }

        /// Property: accented Latin letters come out as plain uppercase ASCII
        #[test]
        fn normalize_removes_latin_diacritics(s in "[a-zA-ZáéíóúÁÉÍÓÚàèìòùäëïöüñÑçÇ ]{0,30}") {
            let out = normalize(&s);
            prop_assert!(out.chars().all(|c| c.is_ascii_uppercase() || c == ' '));
        }

        /// Property: no combining mark survives normalization
        #[test]
        fn normalize_has_no_combining_marks(s in "\\PC{0,40}") {
            prop_assert!(!normalize(&s).chars().any(is_combining_mark));
        }
    }
}
