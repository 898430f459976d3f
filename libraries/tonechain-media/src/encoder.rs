/// WAV container encoder using hound
use crate::buffer::{AudioChunk, Buffer, SampleData};
use crate::caps::{Caps, CapsTemplate};
use crate::error::FlowError;
use crate::processor::Processor;
use hound::{WavSpec, WavWriter};
use std::io::{self, Cursor, Seek, SeekFrom, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// In-memory, cloneable write target
///
/// `WavWriter::finalize` consumes the writer, so the encoder keeps a
/// second handle to get the finished container back.
#[derive(Clone, Default)]
struct SharedCursor(Arc<Mutex<Cursor<Vec<u8>>>>);

impl SharedCursor {
    fn take(&self) -> Vec<u8> {
        let mut cursor = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(cursor.get_mut())
    }
}

impl Write for SharedCursor {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for SharedCursor {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .seek(pos)
    }
}

/// WAV encoder (`wavenc`)
///
/// Writes 32-bit float WAV. The header sizes are only known at end of
/// stream, so the finished container is emitted as a single buffer from
/// `finish()`.
pub struct WavEncoder {
    target: SharedCursor,
    writer: Option<WavWriter<SharedCursor>>,
}

impl WavEncoder {
    /// Create an encoder waiting for caps
    pub fn new() -> Self {
        Self {
            target: SharedCursor::default(),
            writer: None,
        }
    }
}

impl Default for WavEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for WavEncoder {
    fn negotiate(&mut self, caps: &Caps) -> Result<Caps, FlowError> {
        let info = match caps {
            Caps::RawAudio(info) if CapsTemplate::F32_STEREO.accepts(caps) => *info,
            _ => {
                return Err(FlowError::NotNegotiated(format!(
                    "wavenc cannot handle {}",
                    caps
                )))
            }
        };

        let spec = WavSpec {
            channels: info.channels,
            sample_rate: info.rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let writer = WavWriter::new(self.target.clone(), spec)
            .map_err(|e| FlowError::Encode(e.to_string()))?;
        self.writer = Some(writer);

        Ok(Caps::Wav(info))
    }

    fn process(&mut self, buffer: Buffer) -> Result<Option<Buffer>, FlowError> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| FlowError::NotNegotiated("wavenc not negotiated".to_string()))?;
        let Buffer::Audio(AudioChunk {
            data: SampleData::F32(samples),
            ..
        }) = buffer
        else {
            return Err(FlowError::NotNegotiated(
                "wavenc expects f32 audio".to_string(),
            ));
        };

        for sample in samples {
            writer
                .write_sample(sample)
                .map_err(|e| FlowError::Encode(e.to_string()))?;
        }
        Ok(None)
    }

    fn finish(&mut self) -> Result<Option<Buffer>, FlowError> {
        let Some(writer) = self.writer.take() else {
            return Ok(None);
        };
        writer
            .finalize()
            .map_err(|e| FlowError::Encode(e.to_string()))?;

        let bytes = self.target.take();
        tracing::debug!("wavenc: finished {} byte container", bytes.len());
        Ok(Some(Buffer::Bytes(bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caps::{AudioInfo, SampleFormat};

    #[test]
    fn test_encodes_readable_wav() {
        let mut encoder = WavEncoder::new();
        let info = AudioInfo::new(SampleFormat::F32, 8000, 2);
        let caps = encoder.negotiate(&Caps::RawAudio(info)).unwrap();
        assert_eq!(caps, Caps::Wav(info));

        let samples = vec![0.25f32, -0.25, 0.5, -0.5];
        assert!(encoder
            .process(Buffer::Audio(AudioChunk::from_f32(8000, 2, samples.clone())))
            .unwrap()
            .is_none());

        let Some(Buffer::Bytes(bytes)) = encoder.finish().unwrap() else {
            panic!("expected container bytes");
        };

        let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.spec().sample_rate, 8000);
        let decoded: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn test_rejects_integer_audio() {
        let mut encoder = WavEncoder::new();
        let caps = Caps::RawAudio(AudioInfo::new(SampleFormat::S16, 8000, 2));
        assert!(encoder.negotiate(&caps).is_err());
    }
}
