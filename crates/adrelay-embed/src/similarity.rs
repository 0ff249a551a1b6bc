//! Cosine similarity over embedding vectors.

use crate::error::EmbedError;

/// Cosine similarity between two vectors, in `[-1, 1]`.
///
/// Zero-magnitude inputs yield `0.0` rather than NaN.
///
/// # Errors
///
/// Returns [`EmbedError::DimensionMismatch`] if the vectors differ in
/// length. This is a hard failure, never silently coerced.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, EmbedError> {
    if a.len() != b.len() {
        return Err(EmbedError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let mut dot = 0.0f32;
    let mut mag_a = 0.0f32;
    let mut mag_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        mag_a += x * x;
        mag_b += y * y;
    }

    let denom = mag_a.sqrt() * mag_b.sqrt();
    if denom == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / denom)
}
