//! Deterministic fallback vectors for degraded mode.
//!
//! When the embedding provider is unconfigured (or a call fails past its
//! retries on a serve path), the gateway still has to hand back a vector of
//! the right dimension so downstream matching keeps functioning. The
//! fallback is derived from SHA-256 of the input text: same text, same
//! vector, every time. It carries no real semantics and callers must not
//! assume it does.

use sha2::{Digest, Sha256};

/// Build a deterministic unit-length vector of `dimension` floats from `text`.
///
/// Hash blocks are `SHA-256(text || block_index)`; each pair of bytes becomes
/// one component in `[-1, 1]`, and the result is normalised so cosine
/// similarity stays well-behaved.
#[must_use]
pub fn fallback_vector(text: &str, dimension: usize) -> Vec<f32> {
    let mut components = Vec::with_capacity(dimension);
    let mut block: u32 = 0;

    while components.len() < dimension {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        hasher.update(block.to_be_bytes());
        let hash = hasher.finalize();

        for pair in hash.chunks_exact(2) {
            if components.len() == dimension {
                break;
            }
            let combined = u16::from_be_bytes([pair[0], pair[1]]);
            let unit = f32::from(combined) / f32::from(u16::MAX);
            components.push(unit * 2.0 - 1.0);
        }
        block += 1;
    }

    let magnitude = components.iter().map(|c| c * c).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for c in &mut components {
            *c /= magnitude;
        }
    }
    components
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_has_requested_dimension() {
        assert_eq!(fallback_vector("hello", 1536).len(), 1536);
        assert_eq!(fallback_vector("hello", 7).len(), 7);
    }

    #[test]
    fn fallback_is_deterministic() {
        assert_eq!(fallback_vector("cloud tools", 64), fallback_vector("cloud tools", 64));
    }

    #[test]
    fn different_texts_produce_different_vectors() {
        assert_ne!(fallback_vector("a", 64), fallback_vector("b", 64));
    }

    #[test]
    fn fallback_is_unit_length() {
        let v = fallback_vector("normalise me", 128);
        let magnitude: f32 = v.iter().map(|c| c * c).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 1e-5);
    }
}
