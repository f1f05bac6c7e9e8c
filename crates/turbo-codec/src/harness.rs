//! The simulation harness: drives one or many configured specimens across a
//! sweep of Eb/N0 points, accumulating bit error rate, optionally across a
//! fixed-size worker-thread pool.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rand::Rng;

use turbo_core::hamming_distance;

/// How a specimen's per-point repeat count is specified.
#[derive(Clone, Debug, PartialEq)]
pub enum RepeatCount {
    /// The same repeat count applies to every Eb/N0 point in the sweep.
    Single(usize),
    /// One repeat count per Eb/N0 point; length must match the sweep.
    PerPoint(Vec<usize>),
}

impl RepeatCount {
    fn resolve(&self, sweep_len: usize) -> Result<Vec<usize>, HarnessError> {
        match self {
            RepeatCount::Single(n) => Ok(vec![*n; sweep_len]),
            RepeatCount::PerPoint(v) => {
                if v.len() != sweep_len {
                    return Err(HarnessError::RepeatCountMismatch { expected: sweep_len, found: v.len() });
                }
                Ok(v.clone())
            }
        }
    }
}

/// Errors raised while configuring or running a specimen. These are all
/// config-shape errors, checked once before any worker is spawned.
#[derive(Debug, Clone, PartialEq)]
pub enum HarnessError {
    /// `repeat_count` was a per-point list whose length didn't match `ebn0_db`.
    RepeatCountMismatch { expected: usize, found: usize },
    /// `frame_length` was zero.
    ZeroFrameLength,
    /// `ebn0_db` was empty: nothing to sweep.
    EmptySweep,
}

impl std::fmt::Display for HarnessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HarnessError::RepeatCountMismatch { expected, found } => {
                write!(f, "repeat_count length {found} does not match ebn0_db length {expected}")
            }
            HarnessError::ZeroFrameLength => write!(f, "frame_length must be greater than zero"),
            HarnessError::EmptySweep => write!(f, "ebn0_db sweep must not be empty"),
        }
    }
}

impl std::error::Error for HarnessError {}

/// Result of running one specimen across its full Eb/N0 sweep, shaped to match
/// the persisted result document's per-specimen record exactly: parallel
/// `ebn0s`/`bers` arrays alongside the specimen's own configuration, mirroring
/// `SampleResult` from the reference simulation driver rather than a list of
/// per-point structs.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct SpecimenResult {
    pub ebn0s: Vec<f64>,
    pub bers: Vec<f64>,
    pub description: String,
    pub frame_length: usize,
    pub repeat_count: Vec<usize>,
}

/// A named simulation run: frame length, an encode/channel/decode pipeline
/// expressed as closures, and the Eb/N0 sweep with its repeat counts.
///
/// The channel closure takes `(modulated, ebn0_db, code_rate)`. Keeping it a
/// closure (rather than a dependency on the channel crate) lets this crate
/// stay decoupled from any one channel model; the binary wiring the harness
/// together supplies the real AWGN implementation.
pub struct Specimen {
    pub description: String,
    pub frame_length: usize,
    pub code_rate: f64,
    pub ebn0_db: Vec<f64>,
    pub repeat_count: RepeatCount,
    pub encode: Box<dyn Fn(&[u8]) -> Vec<u8> + Send + Sync>,
    pub channel: Box<dyn Fn(&[f64], f64, f64) -> Vec<f64> + Send + Sync>,
    pub decode: Box<dyn Fn(&[f64], f64) -> Vec<u8> + Send + Sync>,
}

impl Specimen {
    /// Runs the full Eb/N0 sweep, generating fresh random frames at every
    /// repeat. `shutdown` is polled between repeats so a long sweep can be
    /// interrupted without corrupting an in-flight point's accumulation.
    pub fn run(&self, shutdown: &AtomicBool) -> Result<SpecimenResult, HarnessError> {
        if self.frame_length == 0 {
            return Err(HarnessError::ZeroFrameLength);
        }
        if self.ebn0_db.is_empty() {
            return Err(HarnessError::EmptySweep);
        }
        let repeats = self.repeat_count.resolve(self.ebn0_db.len())?;

        let mut rng = rand::rng();
        let mut bers = Vec::with_capacity(self.ebn0_db.len());

        for (&ebn0_db, &repeat) in self.ebn0_db.iter().zip(repeats.iter()) {
            let mut bit_errors = 0usize;
            let mut bits_tested = 0usize;

            for _ in 0..repeat {
                if shutdown.load(Ordering::Relaxed) {
                    break;
                }

                let frame: Vec<u8> = (0..self.frame_length).map(|_| rng.random_range(0u8..=1)).collect();
                let coded = (self.encode)(&frame);
                let modulated = turbo_core::modulate_seq(&coded);
                let noisy = (self.channel)(&modulated, ebn0_db, self.code_rate);
                let decoded = (self.decode)(&noisy, ebn0_db);

                let errors = hamming_distance(&frame, &decoded[..frame.len()])
                    .expect("frame_length > 0 is validated above");
                bit_errors += errors;
                bits_tested += self.frame_length;

                tracing::trace!(ebn0_db, errors, "specimen repeat decoded");
            }

            let ber = if bits_tested == 0 { 0.0 } else { bit_errors as f64 / bits_tested as f64 };
            bers.push(ber);
            tracing::info!(specimen = %self.description, ebn0_db, ber, "point complete");
        }

        Ok(SpecimenResult {
            ebn0s: self.ebn0_db.clone(),
            bers,
            description: self.description.clone(),
            frame_length: self.frame_length,
            repeat_count: repeats,
        })
    }
}

/// Runs every specimen across a fixed-size worker-thread pool, matching the
/// reference workspace's own threaded-worker idiom (`std::thread` feeding off
/// a `crossbeam_channel`). Specimens are independent; workers share nothing
/// but the shutdown flag.
pub fn run_all(specimens: Vec<Specimen>, workers: usize, shutdown: Arc<AtomicBool>) -> Vec<Result<SpecimenResult, HarnessError>> {
    let workers = workers.max(1);
    let (job_tx, job_rx) = crossbeam_channel::unbounded::<(usize, Specimen)>();
    let (result_tx, result_rx) = crossbeam_channel::unbounded::<(usize, Result<SpecimenResult, HarnessError>)>();

    let total = specimens.len();
    for (idx, specimen) in specimens.into_iter().enumerate() {
        job_tx.send((idx, specimen)).expect("job channel receiver outlives this loop");
    }
    drop(job_tx);

    let mut handles = Vec::with_capacity(workers);
    for worker_id in 0..workers {
        let job_rx = job_rx.clone();
        let result_tx = result_tx.clone();
        let shutdown = Arc::clone(&shutdown);
        let handle = std::thread::Builder::new()
            .name(format!("turbo-sim-worker-{worker_id}"))
            .spawn(move || {
                while let Ok((idx, specimen)) = job_rx.recv() {
                    tracing::debug!(worker_id, specimen = %specimen.description, "picked up specimen");
                    let result = specimen.run(&shutdown);
                    if result_tx.send((idx, result)).is_err() {
                        break;
                    }
                }
            })
            .expect("failed to spawn turbo-sim worker thread");
        handles.push(handle);
    }
    drop(result_tx);

    let mut ordered: Vec<Option<Result<SpecimenResult, HarnessError>>> = (0..total).map(|_| None).collect();
    while let Ok((idx, result)) = result_rx.recv() {
        ordered[idx] = Some(result);
    }

    for handle in handles {
        let _ = handle.join();
    }

    ordered.into_iter().map(|r| r.expect("every specimen index is filled exactly once")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passthrough_specimen(description: &str, frame_length: usize) -> Specimen {
        Specimen {
            description: description.to_string(),
            frame_length,
            code_rate: 1.0,
            ebn0_db: vec![10.0],
            repeat_count: RepeatCount::Single(3),
            encode: Box::new(|bits: &[u8]| bits.to_vec()),
            channel: Box::new(|modulated: &[f64], _ebn0_db: f64, _code_rate: f64| modulated.to_vec()),
            decode: Box::new(|y: &[f64], _ebn0_db: f64| y.iter().map(|&v| turbo_core::demodulate(turbo_core::hard(v))).collect()),
        }
    }

    #[test]
    fn noiseless_passthrough_has_zero_ber() {
        let specimen = passthrough_specimen("passthrough", 16);
        let shutdown = AtomicBool::new(false);
        let result = specimen.run(&shutdown).unwrap();
        assert_eq!(result.bers.len(), 1);
        assert_eq!(result.bers[0], 0.0);
        assert_eq!(result.repeat_count, vec![3]);
    }

    #[test]
    fn rejects_zero_frame_length() {
        let specimen = passthrough_specimen("bad", 0);
        let shutdown = AtomicBool::new(false);
        assert_eq!(specimen.run(&shutdown), Err(HarnessError::ZeroFrameLength));
    }

    #[test]
    fn rejects_repeat_count_mismatch() {
        let mut specimen = passthrough_specimen("bad", 8);
        specimen.ebn0_db = vec![0.0, 1.0, 2.0];
        specimen.repeat_count = RepeatCount::PerPoint(vec![1, 1]);
        let shutdown = AtomicBool::new(false);
        assert!(matches!(specimen.run(&shutdown), Err(HarnessError::RepeatCountMismatch { .. })));
    }

    #[test]
    fn run_all_collects_every_specimen_in_order() {
        let specimens = vec![
            passthrough_specimen("a", 8),
            passthrough_specimen("b", 16),
            passthrough_specimen("c", 32),
        ];
        let shutdown = Arc::new(AtomicBool::new(false));
        let results = run_all(specimens, 2, shutdown);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().description, "a");
        assert_eq!(results[1].as_ref().unwrap().description, "b");
        assert_eq!(results[2].as_ref().unwrap().description, "c");
    }

    #[test]
    fn shutdown_flag_stops_further_repeats() {
        let specimen = passthrough_specimen("interruptible", 8);
        let shutdown = AtomicBool::new(true);
        let result = specimen.run(&shutdown).unwrap();
        assert_eq!(result.bers[0], 0.0);
    }
}
