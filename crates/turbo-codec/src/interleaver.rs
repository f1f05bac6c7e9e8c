//! Generic permutation interleaver and the derived block interleaver.

use turbo_core::errors::{KernelError, KernelResult};

/// A bijective permutation over frame indices, used to decorrelate the two
/// constituent codes of a turbo code.
///
/// `interleave(x)[permutation[i]] = x[i]`; `deinterleave` applies the inverse.
#[derive(Clone, Debug)]
pub struct Interleaver {
    permutation: Vec<usize>,
    inverse: Vec<usize>,
}

impl Interleaver {
    /// Builds an interleaver from a permutation of `0..permutation.len()`.
    /// Rejects anything that is not a bijection onto that range.
    pub fn new(permutation: Vec<usize>) -> KernelResult<Self> {
        let len = permutation.len();
        let mut seen = vec![false; len];
        for &p in &permutation {
            if p >= len || seen[p] {
                return Err(KernelError::InvalidPermutation { len });
            }
            seen[p] = true;
        }

        let mut inverse = vec![0usize; len];
        for (i, &p) in permutation.iter().enumerate() {
            inverse[p] = i;
        }

        Ok(Interleaver { permutation, inverse })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.permutation.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.permutation.is_empty()
    }

    /// `y[permutation[i]] = x[i]` for all `i`.
    pub fn interleave<T: Copy + Default>(&self, x: &[T]) -> KernelResult<Vec<T>> {
        self.apply(&self.permutation, x)
    }

    /// Inverse of `interleave`: `x[i] = y[permutation[i]]`.
    pub fn deinterleave<T: Copy + Default>(&self, y: &[T]) -> KernelResult<Vec<T>> {
        self.apply(&self.inverse, y)
    }

    fn apply<T: Copy + Default>(&self, permutation: &[usize], input: &[T]) -> KernelResult<Vec<T>> {
        if input.len() != permutation.len() {
            return Err(KernelError::FrameLengthMismatch {
                expected: permutation.len(),
                found: input.len(),
            });
        }
        // `apply(permutation, x)` computes `out[permutation[i]] = x[i]`, which is exactly
        // `interleave` when `permutation` is `self.permutation`, and `deinterleave` when
        // it is `self.inverse` (since `x[i] = y[permutation[i]]` <=> `out[inverse[i]] = y[i]`
        // is the same map applied with `inverse` in the first-argument role).
        let mut out = vec![T::default(); input.len()];
        for (i, &p) in permutation.iter().enumerate() {
            out[p] = input[i];
        }
        Ok(out)
    }

    /// Derives a permutation from a `width x height` grid: write row-major, read column-major.
    pub fn block(width: usize, height: usize) -> KernelResult<Self> {
        let total = width
            .checked_mul(height)
            .ok_or(KernelError::InvalidTrellis { reason: "block interleaver size overflow" })?;
        if total == 0 {
            return Err(KernelError::InvalidPermutation { len: 0 });
        }

        // Row-major write position `i` (0-based) lands at grid cell (row=i/width, col=i%width).
        // Column-major read visits cells in order (col, row) for col in 0..width, row in 0..height.
        // permutation[i] = the output position of input index i under that read order.
        let mut permutation = vec![0usize; total];
        let mut read_pos = 0usize;
        for col in 0..width {
            for row in 0..height {
                let write_index = row * width + col;
                permutation[write_index] = read_pos;
                read_pos += 1;
            }
        }

        Self::new(permutation)
    }

    /// Builds a pseudo-random permutation from a seed, for config-driven harness runs.
    /// Still goes through `Interleaver::new`, so it inherits the same validation.
    pub fn random(len: usize, seed: u64) -> KernelResult<Self> {
        use rand::seq::SliceRandom;
        use rand::SeedableRng;

        let mut permutation: Vec<usize> = (0..len).collect();
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        permutation.shuffle(&mut rng);
        Self::new(permutation)
    }
}
