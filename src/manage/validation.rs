//! Validated inputs for management actions.
//!
//! Values of these types can only be built through their checks, so
//! anything reaching the storage gateway has already been validated.

use std::fmt;
use unicode_normalization::UnicodeNormalization;

use crate::errors::ApiError;

/// Longest key S3 accepts, in bytes.
pub const MAX_KEY_BYTES: usize = 1024;

/// Name of the zero-byte object that materializes a folder.
pub const FOLDER_PLACEHOLDER: &str = ".gitkeep";

/// An object key safe to hand to the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Validate `raw` as the value of request field `field`.
    ///
    /// Rejects empty keys, keys over [`MAX_KEY_BYTES`], keys holding a `..`
    /// segment (split on `/` or `\`), and keys with control characters.
    pub fn parse(field: &str, raw: &str) -> Result<Self, ApiError> {
        if raw.is_empty() {
            return Err(ApiError::invalid(format!("{field} is required")));
        }
        if raw.len() > MAX_KEY_BYTES {
            return Err(ApiError::invalid(format!(
                "{field} is longer than {MAX_KEY_BYTES} bytes"
            )));
        }
        if raw.split(['/', '\\']).any(|segment| segment == "..") {
            return Err(ApiError::invalid(format!(
                "{field} must not contain `..` segments"
            )));
        }
        if raw.chars().any(|c| c.is_control()) {
            return Err(ApiError::invalid(format!(
                "{field} must not contain control characters"
            )));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A sanitized top-level folder name: `[a-z0-9_-]+`, no leading or
/// trailing `-`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderName(String);

impl FolderName {
    /// Sanitize a user-supplied folder name.
    ///
    /// Diacritics are stripped, anything outside `[A-Za-z0-9_-]` becomes
    /// `-`, runs of `-` collapse, edge dashes are trimmed, and the result is
    /// lower-cased.  Fails when nothing is left.
    pub fn sanitize(raw: &str) -> Result<Self, ApiError> {
        let mut out = String::with_capacity(raw.len());
        for c in raw.nfd().filter(|c| !is_combining_diacritic(*c)) {
            let c = if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '-'
            };
            if c == '-' && out.ends_with('-') {
                continue;
            }
            out.push(c);
        }

        let trimmed = out.trim_matches('-');
        if trimmed.is_empty() {
            return Err(ApiError::invalid(format!(
                "folderName `{raw}` has no usable characters"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefix the folder materializes, with the trailing delimiter.
    pub fn prefix(&self) -> String {
        format!("{}/", self.0)
    }

    /// Key of the folder's placeholder object.
    pub fn placeholder_key(&self) -> String {
        format!("{}/{}", self.0, FOLDER_PLACEHOLDER)
    }
}

fn is_combining_diacritic(c: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&c)
}
