// src/audio.rs
//! Signal loader collaborator (spec §6 "Consumed interface").
//!
//! Decodes an audio file with `symphonia`, downmixes to mono, and
//! resamples to the fixed core sample rate with `rubato`. The core treats
//! this module's output as opaque `f32` PCM; it is not part of the
//! fingerprinting algorithm itself (spec §2 row A).

use std::fs::File;
use std::path::Path;

use anyhow::{anyhow, Context};
use log::warn;
use rubato::{Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::config::SAMPLE_RATE;
use crate::error::FpError;

/// Loads an audio file, decodes it, downmixes to mono, and resamples to
/// [`SAMPLE_RATE`]. Returns `f32` samples, amplitude in the decoder's
/// native range (already `[-1, 1]` for every symphonia-supported codec).
pub fn load(path: &Path) -> Result<Vec<f32>, FpError> {
    let (samples, native_rate) = decode_to_mono(path).map_err(|e| FpError::InvalidInput {
        path: path.to_path_buf(),
        message: format!("{e:#}"),
    })?;

    if native_rate == SAMPLE_RATE {
        return Ok(samples);
    }

    resample(&samples, native_rate, SAMPLE_RATE).map_err(|e| FpError::InvalidInput {
        path: path.to_path_buf(),
        message: format!("{e:#}"),
    })
}

fn decode_to_mono(path: &Path) -> anyhow::Result<(Vec<f32>, u32)> {
    let src = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|s| s.to_str()) {
        hint.with_extension(extension);
    }

    let meta_opts: MetadataOptions = Default::default();
    let fmt_opts: FormatOptions = Default::default();

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &fmt_opts, &meta_opts)
        .context("unsupported format or error probing file")?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL && t.codec_params.sample_rate.is_some())
        .ok_or_else(|| anyhow!("no compatible audio track found"))?
        .clone();

    let dec_opts: DecoderOptions = Default::default();
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &dec_opts)
        .context("failed to make decoder")?;

    let track_id = track.id;
    let native_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| anyhow!("track has no sample rate"))?;
    let mut mono_samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => {
                return Err(anyhow!("stream reset mid-file, unsupported"));
            }
            Err(err) => return Err(anyhow!("error reading next packet: {err}")),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buf.copy_interleaved_ref(decoded);

                let samples = buf.samples();
                let channels = spec.channels.count();
                match channels {
                    0 => {}
                    1 => mono_samples.extend_from_slice(samples),
                    _ => {
                        for frame in samples.chunks(channels) {
                            let sum: f32 = frame.iter().sum();
                            mono_samples.push(sum / channels as f32);
                        }
                    }
                }
            }
            Err(SymphoniaError::DecodeError(err)) => {
                warn!("decode error, skipping packet: {err}");
            }
            Err(err) => return Err(anyhow!("fatal decoding error: {err}")),
        }
    }

    Ok((mono_samples, native_rate))
}

/// Resamples mono `samples` from `from_rate` to `to_rate` with a windowed
/// sinc filter, processed in fixed-size chunks (the last, partial chunk is
/// zero-padded).
fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> anyhow::Result<Vec<f32>> {
    if samples.is_empty() {
        return Ok(Vec::new());
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let chunk_size = 1024;
    let mut resampler = SincFixedIn::<f32>::new(
        to_rate as f64 / from_rate as f64,
        2.0,
        params,
        chunk_size,
        1,
    )
    .map_err(|e| anyhow!("failed to build resampler: {e}"))?;

    let mut output: Vec<f32> = Vec::with_capacity(samples.len() * to_rate as usize / from_rate as usize);
    let mut pos = 0;
    while pos + chunk_size <= samples.len() {
        let chunk = vec![samples[pos..pos + chunk_size].to_vec()];
        let processed = resampler
            .process(&chunk, None)
            .map_err(|e| anyhow!("resample failed: {e}"))?;
        output.extend_from_slice(&processed[0]);
        pos += chunk_size;
    }

    if pos < samples.len() {
        let mut last = samples[pos..].to_vec();
        last.resize(chunk_size, 0.0);
        let chunk = vec![last];
        let processed = resampler
            .process(&chunk, None)
            .map_err(|e| anyhow!("resample failed: {e}"))?;
        output.extend_from_slice(&processed[0]);
    }

    Ok(output)
}
