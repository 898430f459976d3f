/// Raw audio format converter
use crate::buffer::{AudioChunk, Buffer, SampleData};
use crate::caps::{AudioInfo, Caps, SampleFormat};
use crate::error::FlowError;
use crate::processor::Processor;

/// ITU-R BS.775-1 coefficient for center and surround channels
const CENTER_MIX: f32 = 0.707; // -3dB

/// Converts any raw audio into interleaved f32
///
/// Mono and stereo keep their layout. Anything wider is downmixed to
/// stereo using ITU-R BS.775-1 coefficients:
/// - L_out = L + 0.707*C + 0.707*Ls
/// - R_out = R + 0.707*C + 0.707*Rs
pub struct AudioConverter {
    input: Option<AudioInfo>,
}

impl AudioConverter {
    /// Create an unconfigured converter
    pub fn new() -> Self {
        Self { input: None }
    }

    /// Normalise samples to f32 in [-1.0, 1.0)
    ///
    /// Uses symmetric scaling for signed integers (divide by 2^(N-1))
    fn to_f32(data: SampleData) -> Vec<f32> {
        match data {
            SampleData::F32(samples) => samples,
            SampleData::F64(samples) => samples.into_iter().map(|s| s as f32).collect(),
            SampleData::S32(samples) => samples
                .into_iter()
                .map(|s| s as f32 / 2147483648.0)
                .collect(),
            SampleData::S16(samples) => samples.into_iter().map(|s| s as f32 / 32768.0).collect(),
        }
    }

    /// Downmix interleaved multi-channel audio to interleaved stereo
    ///
    /// For 5.1 channel layout (FL, FR, C, LFE, SL, SR):
    /// - Channels 0,1: Front Left/Right -> direct to L/R
    /// - Channel 2: Center -> 0.707 to both L and R
    /// - Channel 3: LFE -> 0.707 to both L and R
    /// - Channels 4,5: Surround Left/Right -> 0.707 to L/R respectively
    fn downmix(samples: &[f32], channels: usize) -> Vec<f32> {
        let frames = samples.len() / channels;
        let mut output = Vec::with_capacity(frames * 2);

        for frame in samples.chunks_exact(channels) {
            let (l, r) = (frame[0], frame[1]);
            let (left, right) = match channels {
                3 => {
                    // L, R, C
                    let c = frame[2] * CENTER_MIX;
                    (l + c, r + c)
                }
                4 => {
                    // L, R, SL, SR
                    (l + frame[2] * CENTER_MIX, r + frame[3] * CENTER_MIX)
                }
                5 => {
                    // L, R, C, SL, SR
                    let c = frame[2] * CENTER_MIX;
                    (l + c + frame[3] * CENTER_MIX, r + c + frame[4] * CENTER_MIX)
                }
                _ => {
                    // L, R, C, LFE, SL, SR, ... extra channels dropped
                    let c = frame[2] * CENTER_MIX;
                    let lfe = frame[3] * CENTER_MIX;
                    (
                        l + c + lfe + frame[4] * CENTER_MIX,
                        r + c + lfe + frame[5] * CENTER_MIX,
                    )
                }
            };
            output.push(left.clamp(-1.0, 1.0));
            output.push(right.clamp(-1.0, 1.0));
        }

        output
    }
}

impl Default for AudioConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for AudioConverter {
    fn negotiate(&mut self, caps: &Caps) -> Result<Caps, FlowError> {
        let Caps::RawAudio(info) = caps else {
            return Err(FlowError::NotNegotiated(format!(
                "audioconvert cannot handle {}",
                caps
            )));
        };
        if info.channels == 0 || info.rate == 0 {
            return Err(FlowError::NotNegotiated(format!("invalid input {}", caps)));
        }

        self.input = Some(*info);
        let output = AudioInfo::new(SampleFormat::F32, info.rate, info.channels.min(2));
        tracing::debug!("audioconvert: {} -> {}", caps, Caps::RawAudio(output));
        Ok(Caps::RawAudio(output))
    }

    fn process(&mut self, buffer: Buffer) -> Result<Option<Buffer>, FlowError> {
        let Buffer::Audio(chunk) = buffer else {
            return Err(FlowError::NotNegotiated(
                "audioconvert received non-audio data".to_string(),
            ));
        };
        let input = self
            .input
            .ok_or_else(|| FlowError::NotNegotiated("audioconvert not negotiated".to_string()))?;
        if chunk.info != input {
            return Err(FlowError::NotNegotiated(format!(
                "format changed mid-stream to {}",
                Caps::RawAudio(chunk.info)
            )));
        }

        let channels = input.channels as usize;
        let samples = Self::to_f32(chunk.data);
        let samples = if channels > 2 {
            Self::downmix(&samples, channels)
        } else {
            samples
        };

        Ok(Some(Buffer::Audio(AudioChunk::from_f32(
            input.rate,
            input.channels.min(2),
            samples,
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(info: AudioInfo, data: SampleData) -> Buffer {
        Buffer::Audio(AudioChunk { info, data })
    }

    #[test]
    fn test_s16_to_f32() {
        let info = AudioInfo::new(SampleFormat::S16, 44100, 2);
        let mut converter = AudioConverter::new();
        let caps = converter.negotiate(&Caps::RawAudio(info)).unwrap();
        assert_eq!(
            caps,
            Caps::RawAudio(AudioInfo::new(SampleFormat::F32, 44100, 2))
        );

        let out = converter
            .process(chunk(info, SampleData::S16(vec![16384, -32768])))
            .unwrap()
            .unwrap();
        let Buffer::Audio(AudioChunk {
            data: SampleData::F32(samples),
            ..
        }) = out
        else {
            panic!("expected f32 audio");
        };
        assert_eq!(samples, vec![0.5, -1.0]);
    }

    #[test]
    fn test_surround_downmix() {
        let info = AudioInfo::new(SampleFormat::F32, 48000, 6);
        let mut converter = AudioConverter::new();
        let caps = converter.negotiate(&Caps::RawAudio(info)).unwrap();
        assert_eq!(caps.audio_info().unwrap().channels, 2);

        // Center only
        let out = converter
            .process(chunk(info, SampleData::F32(vec![0.0, 0.0, 0.5, 0.0, 0.0, 0.0])))
            .unwrap()
            .unwrap();
        let Buffer::Audio(out) = out else {
            panic!("expected audio");
        };
        assert_eq!(out.frames(), 1);
        assert_eq!(out.data, SampleData::F32(vec![0.5 * CENTER_MIX, 0.5 * CENTER_MIX]));
    }

    #[test]
    fn test_rejects_encoded_caps() {
        let mut converter = AudioConverter::new();
        let info = AudioInfo::new(SampleFormat::F32, 44100, 2);
        assert!(matches!(
            converter.negotiate(&Caps::Wav(info)),
            Err(FlowError::NotNegotiated(_))
        ));
    }
}
