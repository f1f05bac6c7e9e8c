//! Core utilities shared by the turbo coding kernel and its simulation harness.
//!
//! This crate holds the pieces with no trellis-shaped opinions of their own:
//! modulation conventions, Hamming distance, the kernel error taxonomy and
//! the workspace's logging setup.

pub const STACK_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod debug;
pub mod errors;
pub mod hamming;
pub mod modulation;

pub use errors::{KernelError, KernelResult};
pub use hamming::hamming_distance;
pub use modulation::{binary_decision_seq, demodulate, hard, modulate, modulate_seq};
