//! BPSK-style modulation helpers shared by the encoder, channel and decoder.

/// Maps a logical bit to a modulated sample: `0 -> -1.0`, `1 -> +1.0`, anything else -> `0.0`.
#[inline]
pub fn modulate(bit: u8) -> f64 {
    match bit {
        0 => -1.0,
        1 => 1.0,
        _ => 0.0,
    }
}

/// Modulates a whole sequence of bits.
pub fn modulate_seq(bits: &[u8]) -> Vec<f64> {
    bits.iter().map(|&b| modulate(b)).collect()
}

/// Hard-decision sign of a real sample: negative -> `-1.0`, positive -> `+1.0`, zero -> `0.0`.
#[inline]
pub fn hard(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Demodulates a real sample back to a logical bit: `+1 -> 1`, `-1 -> 0`, anything else -> `0`.
#[inline]
pub fn demodulate(x: f64) -> u8 {
    if x > 0.0 { 1 } else { 0 }
}

/// Hard-decides then demodulates a whole sequence.
pub fn binary_decision_seq(samples: &[f64]) -> Vec<u8> {
    samples.iter().map(|&x| demodulate(hard(x))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modulate_table() {
        assert_eq!(modulate(0), -1.0);
        assert_eq!(modulate(1), 1.0);
        assert_eq!(modulate(2), 0.0);
    }

    #[test]
    fn hard_and_demodulate_roundtrip() {
        assert_eq!(demodulate(hard(-0.3)), 0);
        assert_eq!(demodulate(hard(0.7)), 1);
        assert_eq!(demodulate(hard(0.0)), 0);
    }
}
