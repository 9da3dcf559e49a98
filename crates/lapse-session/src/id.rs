//! Session identifier generation.
//!
//! The store never invents identifiers itself; it asks an [`IdGenerator`]
//! and surfaces the generator's failure unchanged.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::TryRngCore;
use rand::rngs::OsRng;

use crate::error::IdGenerationError;

/// Number of random bytes in a generated session ID.
const ID_BYTES: usize = 32;

/// Source of collision-resistant session identifiers.
///
/// Implementations should return cryptographically random strings. Any
/// `Fn() -> Result<String, IdGenerationError>` closure is a generator too.
pub trait IdGenerator: Send + Sync + 'static {
    /// Produce a fresh identifier.
    fn generate(&self) -> Result<String, IdGenerationError>;
}

impl<F> IdGenerator for F
where
    F: Fn() -> Result<String, IdGenerationError> + Send + Sync + 'static,
{
    fn generate(&self) -> Result<String, IdGenerationError> {
        self()
    }
}

/// Default generator: 32 bytes from the OS RNG, URL-safe base64.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn generate(&self) -> Result<String, IdGenerationError> {
        let mut bytes = [0u8; ID_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| IdGenerationError::new(format!("OS random source failed: {e}")))?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_random_ids_are_url_safe() {
        let id = RandomIdGenerator.generate().unwrap();
        // 32 bytes -> 43 base64 chars without padding
        assert_eq!(id.len(), 43);
        assert!(
            id.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_random_ids_do_not_repeat() {
        let ids: HashSet<String> = (0..1000)
            .map(|_| RandomIdGenerator.generate().unwrap())
            .collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_closure_generator() {
        let generator = || Ok::<_, IdGenerationError>("fixed".to_string());
        assert_eq!(generator.generate().unwrap(), "fixed");

        let failing = || Err::<String, _>(IdGenerationError::new("entropy exhausted"));
        let err = failing.generate().unwrap_err();
        assert_eq!(err.message(), "entropy exhausted");
    }
}
