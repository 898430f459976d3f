/// Stream decoder using Symphonia
use crate::buffer::{AudioChunk, SampleData};
use crate::caps::{AudioInfo, SampleFormat};
use crate::error::FlowError;
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::{AudioBufferRef, SampleBuffer};
use symphonia::core::codecs::{Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Packet-by-packet decoder for one audio track
///
/// Output keeps the codec's native sample container, widened to the
/// nearest format the runtime carries (8-bit to S16, 24-bit and unsigned
/// 16/32-bit to S32).
pub struct StreamDecoder {
    /// Format reader (container parser)
    format: Box<dyn FormatReader>,
    /// Audio decoder
    decoder: Box<dyn Decoder>,
    /// Track ID
    track_id: u32,
}

impl StreamDecoder {
    /// Probe an opened file and set up a decoder for its default track
    pub fn open(file: File, path: &Path) -> Result<Self, FlowError> {
        // Create media source
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        // Create a hint to help the format registry guess the format
        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        // Probe the media source
        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| FlowError::TypeNotFound(format!("Failed to probe file: {}", e)))?;

        let format = probed.format;

        // Find the default track
        let track = format
            .default_track()
            .ok_or_else(|| FlowError::TypeNotFound("No audio tracks found".to_string()))?;
        let track_id = track.id;

        // Create decoder
        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| FlowError::MissingCodec(e.to_string()))?;

        tracing::debug!(
            "Opened {} (track {}, codec {:?})",
            path.display(),
            track_id,
            track.codec_params.codec
        );

        Ok(Self {
            format,
            decoder,
            track_id,
        })
    }

    /// Decode the next chunk; `Ok(None)` at end of stream
    pub fn next_chunk(&mut self) -> Result<Option<AudioChunk>, FlowError> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None);
                }
                Err(SymphoniaError::ResetRequired) => return Ok(None),
                Err(e) => return Err(FlowError::Decode(e.to_string())),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    if decoded.frames() == 0 {
                        continue;
                    }
                    return Ok(Some(Self::convert_buffer(decoded)));
                }
                Err(SymphoniaError::DecodeError(msg)) => {
                    // Corrupt packet, skip it
                    tracing::warn!("Skipping undecodable packet: {}", msg);
                }
                Err(e) => return Err(FlowError::Decode(e.to_string())),
            }
        }
    }

    /// Copy a decoded buffer into an interleaved chunk
    fn convert_buffer(decoded: AudioBufferRef) -> AudioChunk {
        let spec = *decoded.spec();
        let capacity = decoded.capacity() as u64;
        let format = match &decoded {
            AudioBufferRef::F32(_) => SampleFormat::F32,
            AudioBufferRef::F64(_) => SampleFormat::F64,
            AudioBufferRef::S32(_)
            | AudioBufferRef::U32(_)
            | AudioBufferRef::S24(_)
            | AudioBufferRef::U24(_)
            | AudioBufferRef::U16(_) => SampleFormat::S32,
            AudioBufferRef::S16(_) | AudioBufferRef::S8(_) | AudioBufferRef::U8(_) => {
                SampleFormat::S16
            }
        };

        let data = match format {
            SampleFormat::S16 => {
                let mut buf = SampleBuffer::<i16>::new(capacity, spec);
                buf.copy_interleaved_ref(decoded);
                SampleData::S16(buf.samples().to_vec())
            }
            SampleFormat::S32 => {
                let mut buf = SampleBuffer::<i32>::new(capacity, spec);
                buf.copy_interleaved_ref(decoded);
                SampleData::S32(buf.samples().to_vec())
            }
            SampleFormat::F32 => {
                let mut buf = SampleBuffer::<f32>::new(capacity, spec);
                buf.copy_interleaved_ref(decoded);
                SampleData::F32(buf.samples().to_vec())
            }
            SampleFormat::F64 => {
                let mut buf = SampleBuffer::<f64>::new(capacity, spec);
                buf.copy_interleaved_ref(decoded);
                SampleData::F64(buf.samples().to_vec())
            }
        };

        AudioChunk {
            info: AudioInfo::new(format, spec.rate, spec.channels.count() as u16),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_garbage_is_not_a_stream() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0x13u8; 4096]).unwrap();
        let path = file.path().to_path_buf();

        let result = StreamDecoder::open(File::open(&path).unwrap(), &path);
        assert!(matches!(result, Err(FlowError::TypeNotFound(_))));
    }

    #[test]
    fn test_decodes_s16_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..4410 {
            let value = ((i % 100) as i16 - 50) * 200;
            writer.write_sample(value).unwrap();
            writer.write_sample(-value).unwrap();
        }
        writer.finalize().unwrap();

        let mut decoder = StreamDecoder::open(File::open(&path).unwrap(), &path).unwrap();
        let mut frames = 0;
        while let Some(chunk) = decoder.next_chunk().unwrap() {
            assert_eq!(chunk.info, AudioInfo::new(SampleFormat::S16, 22050, 2));
            frames += chunk.frames();
        }
        assert_eq!(frames, 4410);
    }
}
