//! Randomness for mask keys and handshake nonces.
//!
//! The encoder and the handshake never reach for a process-wide generator;
//! they are handed an [`Entropy`] source so tests can make both deterministic.

use crate::error::Result;

/// A source of random bytes.
pub trait Entropy {
    /// Fill `dest` entirely with random bytes.
    ///
    /// # Errors
    ///
    /// Returns `Error::Entropy` if the source is unavailable.
    fn fill(&mut self, dest: &mut [u8]) -> Result<()>;

    /// Draw a 4-byte masking key.
    fn mask_key(&mut self) -> Result<[u8; 4]> {
        let mut key = [0u8; 4];
        self.fill(&mut key)?;
        Ok(key)
    }
}

impl<E: Entropy + ?Sized> Entropy for &mut E {
    fn fill(&mut self, dest: &mut [u8]) -> Result<()> {
        (**self).fill(dest)
    }
}

impl<E: Entropy + ?Sized> Entropy for Box<E> {
    fn fill(&mut self, dest: &mut [u8]) -> Result<()> {
        (**self).fill(dest)
    }
}

/// Operating system randomness via `getrandom`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEntropy;

impl Entropy for SystemEntropy {
    fn fill(&mut self, dest: &mut [u8]) -> Result<()> {
        getrandom::getrandom(dest)?;
        Ok(())
    }
}

/// Deterministic source that cycles through a fixed byte pattern.
///
/// An empty pattern yields zeros, which makes masking a no-op.
#[derive(Debug, Clone, Default)]
pub struct FixedEntropy {
    pattern: Vec<u8>,
    pos: usize,
}

impl FixedEntropy {
    /// Create a source repeating `pattern` forever.
    #[must_use]
    pub fn new(pattern: impl Into<Vec<u8>>) -> Self {
        Self {
            pattern: pattern.into(),
            pos: 0,
        }
    }
}

impl Entropy for FixedEntropy {
    fn fill(&mut self, dest: &mut [u8]) -> Result<()> {
        if self.pattern.is_empty() {
            dest.fill(0);
            return Ok(());
        }
        for byte in dest.iter_mut() {
            *byte = self.pattern[self.pos];
            self.pos = (self.pos + 1) % self.pattern.len();
        }
        Ok(())
    }
}
