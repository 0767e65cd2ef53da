use crate::error::GeneratorError;
use crate::Generator;
use linkway_core::ShortCode;
use rand::Rng;

/// URL-safe alphabet: 64 symbols, so every character carries 6 bits.
const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

pub const MIN_LENGTH: usize = 6;
pub const MAX_LENGTH: usize = 8;
pub const DEFAULT_LENGTH: usize = 7;

/// Generates uniformly random short codes of a fixed length.
///
/// With the default length of 7 there are 64^7 (about 4.4e12) possible codes,
/// so collisions stay rare even with millions of stored links. The rare
/// collision is resolved by the caller asking for another code.
#[derive(Debug, Clone, Copy)]
pub struct RandomGenerator {
    length: usize,
}

impl RandomGenerator {
    /// Creates a generator producing codes of `length` characters.
    pub fn new(length: usize) -> Result<Self, GeneratorError> {
        if !(MIN_LENGTH..=MAX_LENGTH).contains(&length) {
            return Err(GeneratorError::InvalidLength {
                length,
                min: MIN_LENGTH,
                max: MAX_LENGTH,
            });
        }
        Ok(Self { length })
    }

    fn generate_with<R: Rng>(&self, rng: &mut R) -> ShortCode {
        let code: String = (0..self.length)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
            .collect();
        ShortCode::new_unchecked(code)
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH,
        }
    }
}

impl Generator for RandomGenerator {
    type Output = ShortCode;

    fn generate(&self) -> ShortCode {
        self.generate_with(&mut rand::rng())
    }
}
