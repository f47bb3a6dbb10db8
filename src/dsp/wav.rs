//! WAV encoder: float sample buffers to 16-bit PCM RIFF/WAVE bytes.

/// MIME type of the encoded output.
pub const WAV_MIME: &str = "audio/wav";

const HEADER_LEN: usize = 44;

/// Convert one float sample to 16-bit PCM.
///
/// Clamps to [-1, 1], then scales negatives by 32768 and non-negatives by
/// 32767, truncating toward zero. NaN maps to 0.
pub fn float_to_pcm16(sample: f32) -> i16 {
    let s = (sample as f64).clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

/// Encode planar float channels as an interleaved 16-bit PCM WAV file.
///
/// Every channel must have the same length; the first channel's length sets
/// the frame count.
pub fn encode_wav(channels: &[Vec<f32>], sample_rate: u32) -> Vec<u8> {
    let frames = channels.first().map_or(0, Vec::len);
    let mut pcm = Vec::with_capacity(frames * channels.len());
    for frame in 0..frames {
        for channel in channels {
            let sample = channel.get(frame).copied().unwrap_or(0.0);
            pcm.push(float_to_pcm16(sample));
        }
    }
    write_pcm16(&pcm, sample_rate, channels.len() as u16)
}

/// Write interleaved i16 PCM samples behind a canonical 44-byte header.
fn write_pcm16(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
    let bits_per_sample: u16 = 16;
    let byte_rate = sample_rate * channels as u32 * (bits_per_sample as u32 / 8);
    let block_align = channels * (bits_per_sample / 8);
    let data_size = (samples.len() * 2) as u32;
    let file_size = 36 + data_size;

    let mut buf = Vec::with_capacity(HEADER_LEN + data_size as usize);

    // RIFF header
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&file_size.to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    // fmt chunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM format
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for &sample in samples {
        buf.extend_from_slice(&sample.to_le_bytes());
    }

    buf
}
