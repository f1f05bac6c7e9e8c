//! Turns a validated `RunConfig` into a runnable `Specimen`: picks the named
//! trellis, builds the interleaver, and wires the encode/channel/decode
//! closures the harness drives.

use std::sync::Arc;

use turbo_codec::{Interleaver, Specimen, Termination, Trellis, TurboDecoder, TurboEncoder};

use crate::config::{InterleaverSpec, RunConfig, TrellisFamily};

pub fn build_specimen(run: &RunConfig) -> turbo_core::KernelResult<Specimen> {
    let trellis = Arc::new(match run.trellis {
        TrellisFamily::Rsc4 => Trellis::rsc4(),
        TrellisFamily::Rsc8 => Trellis::rsc8(),
        TrellisFamily::Pass => Trellis::pass1(),
    });
    let termination = match run.trellis {
        TrellisFamily::Pass => Termination::None,
        _ => Termination::RecursiveToZero,
    };

    let interleaver = match &run.interleaver {
        InterleaverSpec::Block { width, height } => Interleaver::block(*width, *height)?,
        InterleaverSpec::Random { seed } => Interleaver::random(run.frame_length, *seed)?,
    };
    if interleaver.len() != run.frame_length {
        return Err(turbo_core::KernelError::FrameLengthMismatch {
            expected: run.frame_length,
            found: interleaver.len(),
        });
    }

    let code_rate = run.code_rate.unwrap_or_else(|| {
        let block_width = 1 + 2 * (trellis.output_width() - 1);
        1.0 / block_width as f64
    });

    let encode_trellis = Arc::clone(&trellis);
    let encode_interleaver = interleaver.clone();
    let encode = move |bits: &[u8]| -> Vec<u8> {
        let enc = TurboEncoder::new(&encode_trellis, termination, encode_interleaver.clone());
        enc.encode(bits).expect("harness always supplies a frame of the configured length")
    };

    let decode_trellis = Arc::clone(&trellis);
    let decode_interleaver = interleaver.clone();
    let iterations = run.iterations;
    let decode = move |noisy: &[f64], ebn0_db: f64| -> Vec<u8> {
        let ebn0_linear = turbo_channel::ebn0_db_to_linear(ebn0_db);
        let lc = 4.0 * code_rate * ebn0_linear;
        let dec = TurboDecoder::new(&decode_trellis, decode_interleaver.clone(), iterations, lc);
        let (bits, report) = dec.decode(noisy).expect("harness always supplies a codeword of the expected length");
        if report.fired {
            tracing::warn!(count = report.count, "BCJR LLR sentinel fired during decode");
        }
        bits
    };

    let channel = move |modulated: &[f64], ebn0_db: f64, code_rate: f64| turbo_channel::transmit(modulated, ebn0_db, code_rate);

    Ok(Specimen {
        description: run.description.clone(),
        frame_length: run.frame_length,
        code_rate,
        ebn0_db: run.ebn0_db.clone(),
        repeat_count: run.repeat_count.clone(),
        encode: Box::new(encode),
        channel: Box::new(channel),
        decode: Box::new(decode),
    })
}

