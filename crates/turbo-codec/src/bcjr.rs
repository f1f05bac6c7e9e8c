//! The BCJR (Bahl-Cocke-Jelinek-Raviv) symbol-wise MAP decoder: the soft-input
//! soft-output building block the turbo decoder iterates over.

use turbo_core::errors::{KernelError, KernelResult};
use turbo_core::modulation::{demodulate, hard, modulate};

use crate::trellis::Trellis;

/// A large finite LLR magnitude used as a sentinel when one side of the
/// likelihood ratio collapses to zero. Large enough to saturate any
/// downstream hard decision, small enough to never itself become NaN/inf
/// once added to other LLR terms.
pub const LMAX: f64 = 30.0;

/// Tracks whether the degenerate-sum LLR sentinel has fired during a decode,
/// so the caller can log it once instead of once per trellis step.
#[derive(Default, Clone, Copy, Debug)]
pub struct DegenerateReport {
    pub fired: bool,
    pub count: usize,
}

/// Runs one BCJR MAP decode pass over `y` (length `trellis.states()`-agnostic,
/// but must be `frame_len * trellis.output_width()` samples long), given the
/// channel reliability `lc` and an optional extrinsic prior `le` (zero-padded
/// if shorter than `frame_len`). Returns the per-step LLR vector of length
/// `frame_len`, plus a report of whether the degenerate-sum sentinel fired.
pub fn map_decode(
    trellis: &Trellis,
    y: &[f64],
    lc: f64,
    le: &[f64],
    frame_len: usize,
) -> KernelResult<(Vec<f64>, DegenerateReport)> {
    let n = trellis.output_width();
    if y.len() != frame_len * n {
        return Err(KernelError::FrameLengthMismatch { expected: frame_len * n, found: y.len() });
    }
    let s = trellis.states();
    let t = frame_len;

    // gamma[k][state][input] — only two transitions exist per state, so this is
    // stored keyed by input bit rather than by next-state (O(T*S) not O(T*S^2)).
    let mut gamma: Vec<Vec<[f64; 2]>> = vec![vec![[0.0; 2]; s]; t];

    for k in 0..t {
        let yk = &y[k * n..(k + 1) * n];
        let le_k = le.get(k).copied().unwrap_or(0.0);
        for state in 0..s {
            for input in [0u8, 1u8] {
                let c = trellis.modulated_output(state, input);
                let channel_term: f64 = c.iter().zip(yk.iter()).map(|(&cj, &yj)| cj * yj).sum();
                let x = modulate(input);
                let value = ((lc / 2.0) * channel_term).exp() * ((x * le_k) / 2.0).exp();
                gamma[k][state][input as usize] = value;
            }
        }
    }

    let mut alpha = vec![vec![0.0f64; s]; t + 1];
    alpha[0][0] = 1.0;
    for k in 0..t {
        let mut next = vec![0.0f64; s];
        for state in 0..s {
            let a = alpha[k][state];
            if a == 0.0 {
                continue;
            }
            for input in [0u8, 1u8] {
                let (_, ns) = trellis.transition(state, input);
                next[ns] += a * gamma[k][state][input as usize];
            }
        }
        renormalize(&mut next);
        alpha[k + 1] = next;
    }

    let mut beta = vec![vec![0.0f64; s]; t + 1];
    beta[t][0] = 1.0;
    for k in (0..t).rev() {
        let mut cur = vec![0.0f64; s];
        for state in 0..s {
            let mut acc = 0.0;
            for input in [0u8, 1u8] {
                let (_, ns) = trellis.transition(state, input);
                acc += gamma[k][state][input as usize] * beta[k + 1][ns];
            }
            cur[state] = acc;
        }
        renormalize(&mut cur);
        beta[k] = cur;
    }

    let mut llr = vec![0.0f64; t];
    let mut report = DegenerateReport::default();

    for k in 0..t {
        let mut num = 0.0f64;
        let mut den = 0.0f64;
        for state in 0..s {
            let a = alpha[k][state];
            if a == 0.0 {
                continue;
            }
            let (_, n1) = trellis.transition(state, 1);
            let (_, n0) = trellis.transition(state, 0);
            num += a * gamma[k][state][1] * beta[k + 1][n1];
            den += a * gamma[k][state][0] * beta[k + 1][n0];
        }

        llr[k] = if num == 0.0 && den == 0.0 {
            report.fired = true;
            report.count += 1;
            0.0
        } else if num == 0.0 {
            report.fired = true;
            report.count += 1;
            -LMAX
        } else if den == 0.0 {
            report.fired = true;
            report.count += 1;
            LMAX
        } else {
            (num / den).ln()
        };
    }

    Ok((llr, report))
}

/// Divides every entry by the total mass, leaving the vector unchanged (as all
/// zeros) if the total mass has already underflowed to zero.
fn renormalize(v: &mut [f64]) {
    let total: f64 = v.iter().sum();
    if total > 0.0 {
        for x in v.iter_mut() {
            *x /= total;
        }
    }
}

/// Hard-decision MAP decode: `demodulate(hard(map_decode(...)))` for every step.
pub fn binary_map(trellis: &Trellis, y: &[f64], lc: f64, frame_len: usize) -> KernelResult<Vec<u8>> {
    let (llr, _) = map_decode(trellis, y, lc, &[], frame_len)?;
    Ok(llr.into_iter().map(|l| demodulate(hard(l))).collect())
}
