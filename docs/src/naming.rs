//! Derives stable, collision-resistant document filenames.
//!
//! A filename is `<cleaned-label>_<hash>.<ext>`, where `<hash>` is the first
//! eight hex digits of the SHA-256 of the entity identifier. The hash keys the
//! name to identity: the same identifier always maps to the same suffix, and
//! two entities whose labels clean to the same text still get distinct names.

use sha2::{Digest, Sha256};

/// Number of hex characters taken from the identifier hash.
pub const HASH_LEN: usize = 8;

/// Label stem used when cleaning leaves nothing.
const EMPTY_STEM: &str = "entity";

/// Returns the filename for `identifier`, whose canonical label is `label`.
///
/// `max_label_chars` bounds the label stem; the hash suffix and extension
/// are always appended in full.
#[must_use]
pub fn file_name(
    identifier: &str,
    label: &str,
    max_label_chars: usize,
    extension: &str,
) -> String {
    format!(
        "{}{}",
        clean_label(label, max_label_chars),
        identity_suffix(identifier, extension)
    )
}

/// The identity part of a filename: `_<hash>.<ext>`.
///
/// Every file ever written for `identifier` in `extension` ends with this,
/// whatever its label stem was at the time.
#[must_use]
pub fn identity_suffix(identifier: &str, extension: &str) -> String {
    format!("_{}.{}", identity_hash(identifier), extension)
}

/// Returns the `_<hash>.<ext>` suffix of a generated document name, or `None`
/// if `name` was not produced by [`file_name`] (wrong hash shape, unknown
/// extension, or an empty stem).
#[must_use]
pub fn generated_suffix(name: &str) -> Option<&str> {
    let (stem_and_hash, extension) = name.rsplit_once('.')?;
    if extension != "md" && extension != "html" {
        return None;
    }
    let (stem, hash) = stem_and_hash.rsplit_once('_')?;
    let is_hash = hash.len() == HASH_LEN
        && hash
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase());
    if stem.is_empty() || !is_hash {
        return None;
    }
    Some(&name[stem.len()..])
}

/// First [`HASH_LEN`] hex digits of the SHA-256 of `identifier`.
#[must_use]
pub fn identity_hash(identifier: &str) -> String {
    let digest = Sha256::digest(identifier.as_bytes());
    let mut hash = hex::encode(digest);
    hash.truncate(HASH_LEN);
    hash
}

/// Keeps letters and digits, turns each run of whitespace (and of other
/// separators between words) into a single `_`, and caps the length.
#[must_use]
pub fn clean_label(label: &str, max_chars: usize) -> String {
    let mut stem = String::with_capacity(label.len());
    let mut pending_sep = false;
    for ch in label.chars() {
        if ch.is_alphanumeric() {
            if pending_sep && !stem.is_empty() {
                stem.push('_');
            }
            pending_sep = false;
            stem.push(ch);
        } else if ch.is_whitespace() {
            pending_sep = true;
        }
    }

    let stem: String = stem.chars().take(max_chars).collect();
    let stem = stem.trim_end_matches('_');
    if stem.is_empty() {
        EMPTY_STEM.to_string()
    } else {
        stem.to_string()
    }
}
