use crate::error::GeneratorError;
use crate::Generator;
use linkway_core::shortcode::{self, ShortCode};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters are zero-padded to at least this many digits.
const MIN_DIGITS: usize = 6;

/// Room for every `u64` in decimal.
const MAX_DIGITS: usize = 20;

/// Longest prefix that still leaves room for any counter value.
pub const MAX_PREFIX_LENGTH: usize = shortcode::MAX_LENGTH - MAX_DIGITS;

/// Issues `prefix` followed by a zero-padded counter: `lw000000`,
/// `lw000001`, ... `lw1000000`.
///
/// The counter lives in memory only. A process that restarts against a
/// persistent store has to pick up where the previous one stopped, see
/// [`SeqGenerator::resume_after`], otherwise every request walks into
/// codes that are already taken.
#[derive(Debug)]
pub struct SeqGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SeqGenerator {
    /// Starts the sequence at zero.
    pub fn with_prefix(prefix: impl Into<String>) -> Result<Self, GeneratorError> {
        Self::with_offset(prefix, 0)
    }

    /// Starts the sequence at `offset`, e.g. to give nodes disjoint ranges.
    pub fn with_offset(prefix: impl Into<String>, offset: u64) -> Result<Self, GeneratorError> {
        let prefix = prefix.into();
        check_prefix(&prefix)?;
        Ok(Self {
            prefix,
            next: AtomicU64::new(offset),
        })
    }

    /// Continues the sequence right after `last`, the highest code a previous
    /// run of this sequence issued.
    pub fn resume_after(
        prefix: impl Into<String>,
        last: &ShortCode,
    ) -> Result<Self, GeneratorError> {
        let prefix = prefix.into();
        let next = last
            .as_str()
            .strip_prefix(prefix.as_str())
            .filter(|digits| {
                digits.len() >= MIN_DIGITS && digits.bytes().all(|b| b.is_ascii_digit())
            })
            .and_then(|digits| digits.parse::<u64>().ok())
            .and_then(|n| n.checked_add(1))
            .ok_or_else(|| GeneratorError::NotInSequence {
                code: last.to_string(),
                prefix: prefix.clone(),
            })?;

        Self::with_offset(prefix, next)
    }
}

fn check_prefix(prefix: &str) -> Result<(), GeneratorError> {
    let invalid = |reason: String| GeneratorError::InvalidPrefix {
        prefix: prefix.to_owned(),
        reason,
    };

    if prefix.len() > MAX_PREFIX_LENGTH {
        return Err(invalid(format!(
            "{} characters, at most {} allowed",
            prefix.len(),
            MAX_PREFIX_LENGTH
        )));
    }
    // The first code is the shortest one, so it also covers the minimum length.
    ShortCode::new(format!("{prefix}{:0width$}", 0, width = MIN_DIGITS))
        .map(|_| ())
        .map_err(|e| invalid(e.to_string()))
}

impl Generator for SeqGenerator {
    type Output = ShortCode;

    fn generate(&self) -> ShortCode {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        ShortCode::new_unchecked(format!("{}{:0width$}", self.prefix, n, width = MIN_DIGITS))
    }
}
