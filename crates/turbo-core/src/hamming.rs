use crate::errors::{KernelError, KernelResult};

/// Number of positions at which two equal-length sequences differ.
///
/// Fails on empty sequences or sequences of mismatched length.
pub fn hamming_distance(a: &[u8], b: &[u8]) -> KernelResult<usize> {
    if a.is_empty() || b.is_empty() {
        return Err(KernelError::EmptySequence);
    }
    if a.len() != b.len() {
        return Err(KernelError::FrameLengthMismatch {
            expected: a.len(),
            found: b.len(),
        });
    }

    Ok(a.iter().zip(b.iter()).filter(|(x, y)| x != y).count())
}
