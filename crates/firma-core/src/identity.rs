//! Identity lookup
//!
//! Maps phone digits and normalized name variants to signature image paths.
//! Both maps keep roster insertion order: partial matches are first-hit-wins,
//! so the order decides which entry a generic token resolves to.

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::normalize::is_all_digits;
use crate::roster::RosterEntry;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Phones with fewer digits are never indexed nor looked up.
pub const MIN_PHONE_DIGITS: usize = 9;

/// How a token was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchMethod {
    Phone,
    ExactName,
    /// Token and indexed name contain one another.
    Containment,
    /// First two words are equal.
    NameAndSurname,
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MatchMethod::Phone => "phone",
            MatchMethod::ExactName => "exact name",
            MatchMethod::Containment => "partial name",
            MatchMethod::NameAndSurname => "name and first surname",
        };
        f.write_str(label)
    }
}

/// Outcome of a successful lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub path: PathBuf,
    pub method: MatchMethod,
    /// The index key that matched (phone digits or name variant).
    pub matched: String,
}

#[derive(Debug, Clone, Default)]
pub struct IdentityIndex {
    by_phone: IndexMap<String, PathBuf>,
    by_name: IndexMap<String, PathBuf>,
}

impl IdentityIndex {
    /// Register every entry: phone (when long enough), full name, and the
    /// short name when it differs from the full one. Later entries overwrite
    /// earlier ones on key collisions.
    pub fn build(entries: &[RosterEntry]) -> Self {
        let mut index = Self::default();
        for entry in entries {
            if let Some(phone) = entry.phone_digits.as_deref() {
                if phone.len() >= MIN_PHONE_DIGITS {
                    index
                        .by_phone
                        .insert(phone.to_string(), entry.signature_path.clone());
                }
            }
            index
                .by_name
                .insert(entry.full_name.clone(), entry.signature_path.clone());
            if entry.short_name != entry.full_name {
                index
                    .by_name
                    .insert(entry.short_name.clone(), entry.signature_path.clone());
            }
        }
        index
    }

    /// Build and report the index summary to `sink`.
    pub fn build_reported(entries: &[RosterEntry], sink: &mut dyn DiagnosticSink) -> Self {
        let index = Self::build(entries);
        sink.record(Diagnostic::IndexBuilt {
            phones: index.phone_count(),
            names: index.name_count(),
            signatures: index.signature_count(),
        });
        index
    }

    pub fn phone_count(&self) -> usize {
        self.by_phone.len()
    }

    pub fn name_count(&self) -> usize {
        self.by_name.len()
    }

    /// Distinct signature paths reachable through a name.
    pub fn signature_count(&self) -> usize {
        self.by_name.values().collect::<HashSet<_>>().len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_phone.is_empty() && self.by_name.is_empty()
    }

    /// Indexed name variants in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    pub fn has_phone(&self, digits: &str) -> bool {
        digits.len() >= MIN_PHONE_DIGITS && self.by_phone.contains_key(digits)
    }

    /// Exact or containment match of `text` against the indexed names.
    ///
    /// Returns the first indexed name (in insertion order) that equals,
    /// contains, or is contained in `text`.
    pub fn find_partial(&self, text: &str) -> Option<&str> {
        if text.is_empty() {
            return None;
        }
        self.by_name
            .keys()
            .find(|name| contains_either_way(text, name))
            .map(String::as_str)
    }

    /// Resolve a normalized name or digit token to a signature path.
    ///
    /// Lookup order: phone, exact name, containment, first-two-words.
    pub fn resolve(&self, token: &str) -> Option<Resolution> {
        if is_all_digits(token) && token.len() >= MIN_PHONE_DIGITS {
            if let Some(path) = self.by_phone.get(token) {
                return Some(self.resolution(path, MatchMethod::Phone, token));
            }
            tracing::debug!("phone {} is not in the roster", token);
        }

        if let Some(path) = self.by_name.get(token) {
            return Some(self.resolution(path, MatchMethod::ExactName, token));
        }

        if !token.is_empty() {
            if let Some((name, path)) = self
                .by_name
                .iter()
                .find(|(name, _)| contains_either_way(token, name))
            {
                return Some(self.resolution(path, MatchMethod::Containment, name));
            }
        }

        let token_words: Vec<&str> = token.split_whitespace().collect();
        if token_words.len() >= 2 {
            if let Some((name, path)) = self.by_name.iter().find(|(name, _)| {
                let mut words = name.split_whitespace();
                words.next() == Some(token_words[0]) && words.next() == Some(token_words[1])
            }) {
                return Some(self.resolution(path, MatchMethod::NameAndSurname, name));
            }
        }

        None
    }

    /// [`resolve`](Self::resolve), reporting the outcome to `sink`.
    pub fn resolve_reported(
        &self,
        token: &str,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<Resolution> {
        let resolution = self.resolve(token);
        match &resolution {
            Some(r) => sink.record(Diagnostic::IdentityResolved {
                token: token.to_string(),
                method: r.method,
                matched: r.matched.clone(),
                path: r.path.clone(),
            }),
            None => sink.record(Diagnostic::IdentityUnresolved {
                token: token.to_string(),
                known_names: self.names().map(str::to_string).collect(),
            }),
        }
        resolution
    }

    fn resolution(&self, path: &Path, method: MatchMethod, matched: &str) -> Resolution {
        Resolution {
            path: path.to_path_buf(),
            method,
            matched: matched.to_string(),
        }
    }
}

fn contains_either_way(text: &str, name: &str) -> bool {
    text == name || text.contains(name) || name.contains(text)
}
