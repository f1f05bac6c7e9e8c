//! The trellis model: an immutable description of a rate-1/n convolutional code.

use std::collections::VecDeque;

use turbo_core::errors::{KernelError, KernelResult};
use turbo_core::modulation::modulate;

/// Maximum code output width `n` supported by a single trellis.
/// All trellises this crate ships use rate 1/2 (`n == 2`); the cap leaves
/// headroom without forcing a heap allocation per transition.
pub const MAX_OUTPUT_WIDTH: usize = 8;

/// One transition out of a trellis state for a single input bit.
#[derive(Clone, Copy, Debug, Default)]
pub struct Transition {
    /// The first `n` entries hold the output bits; the rest are unused padding.
    pub output: [u8; MAX_OUTPUT_WIDTH],
    pub next_state: u32,
}

/// A single row of the raw construction table: `state -> (out0, next0, out1, next1)`.
#[derive(Clone, Debug)]
pub struct TrellisRow {
    pub output0: Vec<u8>,
    pub next0: usize,
    pub output1: Vec<u8>,
    pub next1: usize,
}

/// Immutable rate-1/n convolutional code description, plus its precomputed
/// modulated view and inverted (predecessor) table.
pub struct Trellis {
    n: usize,
    /// `table[state][input]`
    table: Vec<[Transition; 2]>,
    /// `modulated[state][input]`, outputs pre-mapped to {-1, +1}.
    modulated: Vec<[[f64; MAX_OUTPUT_WIDTH]; 2]>,
    /// `predecessors[state]` = every `s` such that some input from `s` lands on `state`.
    predecessors: Vec<Vec<u32>>,
}

impl Trellis {
    /// Builds and validates a trellis from the raw per-state transition rows.
    ///
    /// Row `i` describes state `i`; states are therefore `0..rows.len()`, and state 0
    /// is the canonical zero state.
    pub fn from_table(rows: &[TrellisRow]) -> KernelResult<Self> {
        let states = rows.len();
        if states == 0 {
            return Err(KernelError::InvalidTrellis { reason: "empty table" });
        }

        let n = rows[0].output0.len();
        if n == 0 || n > MAX_OUTPUT_WIDTH {
            return Err(KernelError::InvalidTrellis {
                reason: "output width must be 1..=MAX_OUTPUT_WIDTH",
            });
        }

        let mut table = Vec::with_capacity(states);
        for row in rows {
            if row.output0.len() != n || row.output1.len() != n {
                return Err(KernelError::InvalidTrellis {
                    reason: "inconsistent output width across states",
                });
            }
            if row.next0 >= states || row.next1 >= states {
                return Err(KernelError::InvalidTrellis {
                    reason: "next_state out of range",
                });
            }
            for &bit in row.output0.iter().chain(row.output1.iter()) {
                if bit > 1 {
                    return Err(KernelError::InvalidTrellis {
                        reason: "output bits must be 0 or 1",
                    });
                }
            }

            let mut t0 = Transition { output: [0; MAX_OUTPUT_WIDTH], next_state: row.next0 as u32 };
            t0.output[..n].copy_from_slice(&row.output0);
            let mut t1 = Transition { output: [0; MAX_OUTPUT_WIDTH], next_state: row.next1 as u32 };
            t1.output[..n].copy_from_slice(&row.output1);
            table.push([t0, t1]);
        }

        // Reachability from state 0, following either input.
        let mut seen = vec![false; states];
        seen[0] = true;
        let mut queue = VecDeque::from([0usize]);
        while let Some(s) = queue.pop_front() {
            for t in &table[s] {
                let ns = t.next_state as usize;
                if !seen[ns] {
                    seen[ns] = true;
                    queue.push_back(ns);
                }
            }
        }
        if seen.iter().any(|&r| !r) {
            return Err(KernelError::InvalidTrellis {
                reason: "not every state is reachable from state 0",
            });
        }

        let mut modulated = vec![[[0.0; MAX_OUTPUT_WIDTH]; 2]; states];
        for (s, row) in table.iter().enumerate() {
            for (i, t) in row.iter().enumerate() {
                for j in 0..n {
                    modulated[s][i][j] = modulate(t.output[j]);
                }
            }
        }

        let mut predecessors = vec![Vec::new(); states];
        for (s, row) in table.iter().enumerate() {
            for t in row {
                predecessors[t.next_state as usize].push(s as u32);
            }
        }

        Ok(Trellis { n, table, modulated, predecessors })
    }

    #[inline]
    pub fn states(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub fn output_width(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn code_rate(&self) -> f64 {
        1.0 / self.n as f64
    }

    #[inline]
    pub fn transition(&self, state: usize, input: u8) -> (&[u8], usize) {
        let t = &self.table[state][input as usize];
        (&t.output[..self.n], t.next_state as usize)
    }

    #[inline]
    pub fn modulated_output(&self, state: usize, input: u8) -> &[f64] {
        &self.modulated[state][input as usize][..self.n]
    }

    #[inline]
    pub fn predecessors(&self, state: usize) -> &[u32] {
        &self.predecessors[state]
    }

    /// Builds a recursive systematic (RSC) trellis from a feedback and a feedforward
    /// polynomial, each given as `mem` tap booleans on the register bits `d_1..d_mem`
    /// (newest first). The systematic output is the raw input bit; the second output
    /// is the parity bit. Both polynomials implicitly include an always-on tap on the
    /// feedback-modified bit itself (the conventional `g_0 = 1` leading term).
    pub fn rsc(mem: usize, fb_taps: &[bool], ff_taps: &[bool]) -> KernelResult<Self> {
        if fb_taps.len() != mem || ff_taps.len() != mem {
            return Err(KernelError::InvalidTrellis {
                reason: "tap count must equal register length",
            });
        }

        let states = 1usize << mem;
        let mut rows = Vec::with_capacity(states);
        for code in 0..states {
            let d = register_bits(code, mem);
            let mut row_for = |b: u8| -> (Vec<u8>, usize) {
                let fb_sum = xor_taps(&d, fb_taps);
                let a = b ^ fb_sum;
                let parity = a ^ xor_taps(&d, ff_taps);
                let next = shift_in(&d, a);
                (vec![b, parity], encode_register(&next))
            };
            let (out0, next0) = row_for(0);
            let (out1, next1) = row_for(1);
            rows.push(TrellisRow { output0: out0, next0, output1: out1, next1 });
        }

        Self::from_table(&rows)
    }

    /// Builds a non-recursive (feed-forward) convolutional trellis: the register holds
    /// the raw input history, the systematic output is the current input bit, and the
    /// parity bit is an XOR of taps over the register including the current input.
    pub fn conv(mem: usize, ff_taps: &[bool]) -> KernelResult<Self> {
        if ff_taps.len() != mem + 1 {
            return Err(KernelError::InvalidTrellis {
                reason: "feed-forward tap count must be mem + 1 (includes current input)",
            });
        }

        let states = 1usize << mem;
        let mut rows = Vec::with_capacity(states);
        for code in 0..states {
            let d = register_bits(code, mem);
            let mut row_for = |b: u8| -> (Vec<u8>, usize) {
                let mut all = vec![b];
                all.extend_from_slice(&d);
                let parity = all.iter().zip(ff_taps.iter()).fold(0u8, |acc, (&bit, &tap)| {
                    acc ^ if tap { bit } else { 0 }
                });
                let next = shift_in(&d, b);
                (vec![b, parity], encode_register(&next))
            };
            let (out0, next0) = row_for(0);
            let (out1, next1) = row_for(1);
            rows.push(TrellisRow { output0: out0, next0, output1: out1, next1 });
        }

        Self::from_table(&rows)
    }

    /// The 4-state rate-1/2 RSC trellis `(1, 5/7)` in octal: feedback `111`, feedforward `101`.
    /// This is the exact trellis used in the worked encode/decode examples.
    pub fn rsc4() -> Self {
        Self::rsc(2, &[true, true], &[false, true]).expect("rsc4 is a valid trellis by construction")
    }

    /// An 8-state rate-1/2 RSC trellis with a deeper register, for frames that benefit
    /// from a stronger constituent code.
    pub fn rsc8() -> Self {
        Self::rsc(3, &[true, false, true], &[true, true, true])
            .expect("rsc8 is a valid trellis by construction")
    }

    /// A trivial single-state, rate-1 trellis where the output is the input bit
    /// unchanged. Plugged into the turbo codec as a baseline: with `n == 1` the
    /// multiplexed block width collapses to 1 (systematic only, no parity), so
    /// encode/decode reduce to passing bits straight through the channel.
    pub fn pass1() -> Self {
        let rows = vec![TrellisRow { output0: vec![0], next0: 0, output1: vec![1], next1: 0 }];
        Self::from_table(&rows).expect("pass1 is a valid trellis by construction")
    }
}

/// Decodes an integer state code into its `mem` register bits, newest first (`d[0]` = `d_1`).
fn register_bits(code: usize, mem: usize) -> Vec<u8> {
    (0..mem).map(|i| ((code >> (mem - 1 - i)) & 1) as u8).collect()
}

/// Re-encodes register bits (newest first) back into the integer state code.
fn encode_register(d: &[u8]) -> usize {
    d.iter().fold(0usize, |acc, &bit| (acc << 1) | bit as usize)
}

/// Shifts `new_bit` into the front of the register, dropping the oldest bit.
fn shift_in(d: &[u8], new_bit: u8) -> Vec<u8> {
    let mut next = vec![new_bit];
    next.extend_from_slice(&d[..d.len() - 1]);
    next
}

fn xor_taps(d: &[u8], taps: &[bool]) -> u8 {
    d.iter().zip(taps.iter()).fold(0u8, |acc, (&bit, &tap)| acc ^ if tap { bit } else { 0 })
}
