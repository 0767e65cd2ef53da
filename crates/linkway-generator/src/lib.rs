pub mod error;
pub mod random;
pub mod seq;

pub use error::GeneratorError;
pub use random::RandomGenerator;
pub use seq::SeqGenerator;

use linkway_core::ShortCode;

/// Trait for generating short codes.
///
/// Implementations are pure generators that don't interact with storage.
/// Uniqueness is enforced by the store: a caller that hits a collision
/// simply asks for another code.
pub trait Generator: Send + Sync + 'static {
    type Output: Into<ShortCode>;

    /// Generates a value that can be converted into a short code.
    fn generate(&self) -> Self::Output;
}

impl<G: Generator> Generator for std::sync::Arc<G> {
    type Output = G::Output;

    fn generate(&self) -> Self::Output {
        (**self).generate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn arc_forwards_to_inner_generator() {
        let generator = Arc::new(SeqGenerator::with_prefix("lw").unwrap());
        let shared = Arc::clone(&generator);

        assert_eq!(generator.generate().as_str(), "lw000000");
        assert_eq!(shared.generate().as_str(), "lw000001");
    }
}
