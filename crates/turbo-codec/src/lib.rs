//! The turbo coding kernel: trellis model, convolutional encoder, interleaver,
//! BCJR MAP decoder and the turbo encoder/decoder built on top of them.
//!
//! Everything here is synchronous and single-threaded; concurrency, if any,
//! belongs to the caller driving many independent frames in parallel.

pub mod bcjr;
pub mod convenc;
pub mod harness;
pub mod interleaver;
pub mod trellis;
pub mod turbo;

pub use bcjr::{binary_map, map_decode, DegenerateReport, LMAX};
pub use convenc::{ConvEncoder, Termination};
pub use harness::{HarnessError, RepeatCount, Specimen, SpecimenResult};
pub use interleaver::Interleaver;
pub use trellis::{Trellis, TrellisRow};
pub use turbo::{TurboDecoder, TurboEncoder};
