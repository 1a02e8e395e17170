//! # Hermes Audio
//!
//! WAV framing helpers for the audio-server message flows: the protocol
//! streams audio as many small WAV-wrapped frames (`audioFrame`,
//! `audioSessionFrame`), so senders need to split a recording into
//! per-frame WAV chunks and receivers need durations and raw PCM back out.
//!
//! Only uncompressed PCM WAV is supported; that is the only encoding the
//! protocol carries.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Sample format of a PCM audio stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavFormat {
    /// Samples per second.
    pub sample_rate: u32,
    /// Bytes per sample (2 for 16-bit audio).
    pub sample_width: u16,
    /// Number of interleaved channels.
    pub channels: u16,
}

impl Default for WavFormat {
    /// 16 kHz, 16-bit, mono: the voice pipeline's native format.
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            sample_width: 2,
            channels: 1,
        }
    }
}

impl WavFormat {
    /// Bytes per frame (one sample across all channels).
    #[must_use]
    pub fn bytes_per_frame(&self) -> usize {
        usize::from(self.sample_width) * usize::from(self.channels)
    }

    /// Bytes per second of audio.
    #[must_use]
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * u32::from(self.sample_width) * u32::from(self.channels)
    }
}

/// Parse a PCM WAV buffer into its format and raw PCM data.
///
/// Unknown RIFF chunks (`LIST`, `fact`, ...) are skipped.
///
/// # Errors
///
/// Returns [`WavError`] if the buffer is not a complete PCM WAV file.
pub fn read_wav(wav: &[u8]) -> Result<(WavFormat, &[u8]), WavError> {
    if wav.len() < 12 || &wav[0..4] != b"RIFF" || &wav[8..12] != b"WAVE" {
        return Err(WavError::NotWav);
    }

    let mut format: Option<WavFormat> = None;
    let mut data: Option<&[u8]> = None;
    let mut offset = 12;

    while offset + 8 <= wav.len() {
        let id = &wav[offset..offset + 4];
        let size = u32::from_le_bytes(
            wav[offset + 4..offset + 8]
                .try_into()
                .map_err(|_| WavError::Truncated)?,
        ) as usize;
        let body_start = offset + 8;
        let body_end = body_start + size;
        if body_end > wav.len() {
            return Err(WavError::Truncated);
        }
        let body = &wav[body_start..body_end];

        match id {
            b"fmt " => {
                if size < 16 {
                    return Err(WavError::Truncated);
                }
                let encoding = u16::from_le_bytes([body[0], body[1]]);
                if encoding != 1 {
                    return Err(WavError::UnsupportedEncoding(encoding));
                }
                let channels = u16::from_le_bytes([body[2], body[3]]);
                let sample_rate = u32::from_le_bytes([body[4], body[5], body[6], body[7]]);
                let bits_per_sample = u16::from_le_bytes([body[14], body[15]]);
                format = Some(WavFormat {
                    sample_rate,
                    sample_width: bits_per_sample / 8,
                    channels,
                });
            }
            b"data" => data = Some(body),
            _ => {}
        }

        // RIFF chunks are word-aligned
        offset = body_end + (size % 2);
    }

    match (format, data) {
        (Some(format), Some(data)) => Ok((format, data)),
        (None, _) => Err(WavError::MissingChunk("fmt ")),
        (_, None) => Err(WavError::MissingChunk("data")),
    }
}

/// Wrap raw PCM data in a WAV header.
#[must_use]
pub fn wrap_pcm(pcm: &[u8], format: &WavFormat) -> Vec<u8> {
    let data_len = u32::try_from(pcm.len()).unwrap_or(u32::MAX);
    let block_align = u16::try_from(format.bytes_per_frame()).unwrap_or(u16::MAX);

    let mut wav = Vec::with_capacity(44 + pcm.len());
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&format.channels.to_le_bytes());
    wav.extend_from_slice(&format.sample_rate.to_le_bytes());
    wav.extend_from_slice(&format.byte_rate().to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&(format.sample_width * 8).to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.extend_from_slice(pcm);
    wav
}

/// Real-time duration of a WAV buffer in seconds.
///
/// # Errors
///
/// Returns [`WavError`] if the buffer is not a complete PCM WAV file.
pub fn wav_duration(wav: &[u8]) -> Result<f64, WavError> {
    let (format, data) = read_wav(wav)?;
    let frames = data.len() / format.bytes_per_frame().max(1);
    #[allow(clippy::cast_precision_loss)]
    Ok(frames as f64 / f64::from(format.sample_rate.max(1)))
}

/// Split one WAV buffer into multiple WAV chunks of at most
/// `frames_per_chunk` frames, each wrapped with its own header.
///
/// # Errors
///
/// Returns [`WavError`] if the buffer is not a complete PCM WAV file or
/// `frames_per_chunk` is zero.
pub fn chunk_wav(wav: &[u8], frames_per_chunk: usize) -> Result<Vec<Vec<u8>>, WavError> {
    if frames_per_chunk == 0 {
        return Err(WavError::EmptyChunk);
    }

    let (format, data) = read_wav(wav)?;
    let chunk_bytes = frames_per_chunk * format.bytes_per_frame();

    Ok(data
        .chunks(chunk_bytes.max(1))
        .map(|chunk| wrap_pcm(chunk, &format))
        .collect())
}

/// Errors reading WAV data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WavError {
    /// Buffer does not start with a RIFF/WAVE header.
    #[error("not a WAV buffer")]
    NotWav,
    /// Buffer ended inside a chunk.
    #[error("truncated WAV buffer")]
    Truncated,
    /// A required RIFF chunk is absent.
    #[error("missing WAV chunk '{0}'")]
    MissingChunk(&'static str),
    /// Audio is not uncompressed PCM.
    #[error("unsupported WAV encoding {0}")]
    UnsupportedEncoding(u16),
    /// A chunk size of zero frames was requested.
    #[error("frames_per_chunk must be non-zero")]
    EmptyChunk,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_second_of_silence() -> Vec<u8> {
        let format = WavFormat::default();
        wrap_pcm(&vec![0u8; format.byte_rate() as usize], &format)
    }

    #[test]
    fn wrap_and_read_roundtrip() {
        let format = WavFormat {
            sample_rate: 44_100,
            sample_width: 2,
            channels: 2,
        };
        let pcm: Vec<u8> = (0..=255).collect();

        let wav = wrap_pcm(&pcm, &format);
        let (read_format, read_pcm) = read_wav(&wav).unwrap();

        assert_eq!(read_format, format);
        assert_eq!(read_pcm, pcm.as_slice());
    }

    #[test]
    fn duration_of_one_second() {
        let wav = one_second_of_silence();
        let duration = wav_duration(&wav).unwrap();

        assert!((duration - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn chunks_cover_the_whole_buffer() {
        let wav = one_second_of_silence();
        // 16000 frames total -> 4 chunks of 0.25 s
        let chunks = chunk_wav(&wav, 4000).unwrap();

        assert_eq!(chunks.len(), 4);
        for chunk in &chunks {
            let duration = wav_duration(chunk).unwrap();
            assert!((duration - 0.25).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn uneven_tail_chunk_is_kept() {
        let format = WavFormat::default();
        let wav = wrap_pcm(&vec![0u8; 5000 * format.bytes_per_frame()], &format);
        let chunks = chunk_wav(&wav, 2048).unwrap();

        assert_eq!(chunks.len(), 3);
        let (_, tail) = read_wav(chunks.last().unwrap()).unwrap();
        assert_eq!(tail.len(), (5000 - 2 * 2048) * format.bytes_per_frame());
    }

    #[test]
    fn rejects_non_wav_buffers() {
        assert_eq!(read_wav(b"not audio").unwrap_err(), WavError::NotWav);
        assert_eq!(chunk_wav(&one_second_of_silence(), 0).unwrap_err(), WavError::EmptyChunk);
    }

    #[test]
    fn skips_unknown_chunks() {
        let format = WavFormat::default();
        let pcm = vec![0u8; 64];
        let mut wav = wrap_pcm(&pcm, &format);

        // Splice a LIST chunk between fmt and data
        let mut spliced = wav[..36].to_vec();
        spliced.extend_from_slice(b"LIST");
        spliced.extend_from_slice(&4u32.to_le_bytes());
        spliced.extend_from_slice(b"INFO");
        spliced.extend_from_slice(&wav.split_off(36));

        let (read_format, read_pcm) = read_wav(&spliced).unwrap();
        assert_eq!(read_format, format);
        assert_eq!(read_pcm.len(), 64);
    }
}
