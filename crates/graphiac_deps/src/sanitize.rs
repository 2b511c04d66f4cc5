//! Identifier sanitization shared with the code emitter.
//!
//! `depends_on` entries and emitted resource names are both produced by
//! [`sanitize_identifier`]. Any divergence between the two leaves dangling
//! references in generated code, so the rules below are fixed constants.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

/// Maximum length of a sanitized identifier.
pub const MAX_IDENTIFIER_LEN: usize = 64;
/// Prefix for identifiers that would otherwise start with a digit.
pub const DIGIT_PREFIX: &str = "r_";
/// Name used when the input is empty.
pub const FALLBACK_IDENTIFIER: &str = "unnamed_resource";
/// Hex characters of the hash suffix appended on truncation.
const HASH_SUFFIX_LEN: usize = 8;

/// Turn an arbitrary name into a code identifier.
///
/// Characters outside `[A-Za-z0-9_]` become `_`, a leading digit gets
/// [`DIGIT_PREFIX`], and names longer than [`MAX_IDENTIFIER_LEN`] are cut
/// and suffixed with a hash of the original name. Applying it twice gives
/// the same result as applying it once.
pub fn sanitize_identifier(name: &str) -> String {
    if name.is_empty() {
        return FALLBACK_IDENTIFIER.to_string();
    }

    let mut identifier: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if identifier.starts_with(|c: char| c.is_ascii_digit()) {
        identifier.insert_str(0, DIGIT_PREFIX);
    }

    if identifier.len() > MAX_IDENTIFIER_LEN {
        // Output is pure ASCII at this point, so byte truncation is safe.
        identifier.truncate(MAX_IDENTIFIER_LEN - HASH_SUFFIX_LEN - 1);
        identifier.push('_');
        identifier.push_str(&short_hash(name));
    }

    identifier
}

fn short_hash(name: &str) -> String {
    let digest = Sha256::digest(name.as_bytes());
    hex::encode(&digest[..HASH_SUFFIX_LEN / 2])
}

/// Memoizes [`sanitize_identifier`] for the duration of one analysis call.
#[derive(Debug, Default)]
pub struct IdentifierCache {
    entries: HashMap<String, String>,
}

impl IdentifierCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sanitized form of `name`, computed at most once per cache.
    pub fn get(&mut self, name: &str) -> String {
        if let Some(identifier) = self.entries.get(name) {
            return identifier.clone();
        }
        let identifier = sanitize_identifier(name);
        self.entries.insert(name.to_string(), identifier.clone());
        identifier
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
