use std::fmt;

/// Errors raised by the coding kernel (trellis, encoder, interleaver, BCJR, turbo codec).
///
/// All variants are input-shape or domain errors. None are retryable: the kernel
/// never catches its own errors, it only raises them to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum KernelError {
    /// The trellis table passed to `Trellis::new` failed a construction invariant.
    InvalidTrellis { reason: &'static str },
    /// A permutation passed to `Interleaver::new` is not a bijection of `0..len`.
    InvalidPermutation { len: usize },
    /// A sequence did not match the frame length (or block size) it was checked against.
    FrameLengthMismatch { expected: usize, found: usize },
    /// Hamming distance (or another paired operation) was asked to operate on an empty sequence.
    EmptySequence,
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::InvalidTrellis { reason } => {
                write!(f, "invalid trellis: {reason}")
            }
            KernelError::InvalidPermutation { len } => {
                write!(f, "not a permutation of 0..{len}")
            }
            KernelError::FrameLengthMismatch { expected, found } => {
                write!(f, "frame length mismatch: expected {expected}, found {found}")
            }
            KernelError::EmptySequence => write!(f, "empty sequence"),
        }
    }
}

impl std::error::Error for KernelError {}

pub type KernelResult<T> = Result<T, KernelError>;
