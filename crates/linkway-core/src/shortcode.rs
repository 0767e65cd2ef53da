use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MIN_LENGTH: usize = 3;
pub const MAX_LENGTH: usize = 32;

/// Top-level paths served by something other than the redirect route.
pub const RESERVED: &[&str] = &["api", "readyz"];

/// The path segment a link is served under, e.g. `Xk9_a-2` in
/// `https://lnk.way/Xk9_a-2`.
///
/// Only URL-safe characters are allowed (`A-Z a-z 0-9 - _`), so a code can be
/// placed in a path without escaping.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShortCode(String);

fn is_code_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_')
}

impl ShortCode {
    /// Parses `code`, rejecting anything outside `MIN_LENGTH..=MAX_LENGTH`
    /// or containing a non URL-safe character.
    pub fn new(code: impl Into<String>) -> Result<Self, CoreError> {
        let code = code.into();

        if !(MIN_LENGTH..=MAX_LENGTH).contains(&code.len()) {
            return Err(CoreError::InvalidShortCode(format!(
                "{code:?} has {} bytes, expected {MIN_LENGTH}..={MAX_LENGTH}",
                code.len()
            )));
        }
        if let Some(bad) = code.chars().find(|&c| !is_code_char(c)) {
            return Err(CoreError::InvalidShortCode(format!(
                "{code:?} contains {bad:?}, which is not URL-safe"
            )));
        }

        Ok(Self(code))
    }

    /// Wraps `code` as is. Generators use this for output they already
    /// know to be well formed.
    pub fn new_unchecked(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Joins the code onto `base_url` with exactly one `/` in between.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `/{code}` would be shadowed by another route.
    pub fn is_reserved(&self) -> bool {
        RESERVED.contains(&self.0.as_str())
    }
}

impl fmt::Display for ShortCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ShortCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ShortCode {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ShortCode> for String {
    fn from(code: ShortCode) -> Self {
        code.0
    }
}
