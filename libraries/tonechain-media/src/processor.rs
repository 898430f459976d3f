/// Streaming-side behaviour of an element
///
/// Every element downstream of the decoder owns one processor. Processors
/// are created with the element on the control thread and handed to the
/// streaming thread once the path from the decoder to the sink is known.
use crate::buffer::Buffer;
use crate::caps::Caps;
use crate::error::FlowError;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Trait for elements that transform buffers on the streaming thread
///
/// # Contract
/// - `negotiate()` is called exactly once, before the first buffer
/// - `process()` may swallow a buffer by returning `Ok(None)`
/// - `finish()` is called once at end of stream and may emit a tail buffer
pub trait Processor: Send {
    /// Accept the upstream caps and return the caps this element produces
    fn negotiate(&mut self, caps: &Caps) -> Result<Caps, FlowError>;

    /// Transform one buffer
    fn process(&mut self, buffer: Buffer) -> Result<Option<Buffer>, FlowError>;

    /// Flush at end of stream
    fn finish(&mut self) -> Result<Option<Buffer>, FlowError> {
        Ok(None)
    }
}

/// Run one processor call, turning a panic into `FlowError::Panicked`
pub(crate) fn guarded<T>(call: impl FnOnce() -> Result<T, FlowError>) -> Result<T, FlowError> {
    panic::catch_unwind(AssertUnwindSafe(call))
        .unwrap_or_else(|payload| Err(FlowError::Panicked(panic_message(payload.as_ref()))))
}

/// Text of a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Push `buffer` through `stages`, each output feeding the next stage
pub(crate) fn push_through(
    stages: &mut [(String, Box<dyn Processor>)],
    buffer: Buffer,
) -> Result<(), (String, FlowError)> {
    let mut current = Some(buffer);
    for (name, stage) in stages.iter_mut() {
        let Some(buffer) = current.take() else {
            break;
        };
        current = guarded(|| stage.process(buffer)).map_err(|err| (name.clone(), err))?;
    }
    Ok(())
}

/// Flush every stage in order, pushing each tail through the stages after it
pub(crate) fn drain(stages: &mut [(String, Box<dyn Processor>)]) -> Result<(), (String, FlowError)> {
    for index in 0..stages.len() {
        let (name, stage) = &mut stages[index];
        let tail = guarded(|| stage.finish()).map_err(|err| (name.clone(), err))?;
        if let Some(buffer) = tail {
            push_through(&mut stages[index + 1..], buffer)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::AudioChunk;
    use std::sync::{Arc, Mutex};

    // Mock stage for testing
    struct GainStage {
        gain: f32,
        tail: Option<f32>,
    }

    impl Processor for GainStage {
        fn negotiate(&mut self, caps: &Caps) -> Result<Caps, FlowError> {
            Ok(caps.clone())
        }

        fn process(&mut self, buffer: Buffer) -> Result<Option<Buffer>, FlowError> {
            match buffer {
                Buffer::Audio(mut chunk) => {
                    if let crate::buffer::SampleData::F32(samples) = &mut chunk.data {
                        for sample in samples.iter_mut() {
                            *sample *= self.gain;
                        }
                    }
                    Ok(Some(Buffer::Audio(chunk)))
                }
                other => Ok(Some(other)),
            }
        }

        fn finish(&mut self) -> Result<Option<Buffer>, FlowError> {
            Ok(self
                .tail
                .take()
                .map(|value| Buffer::Audio(AudioChunk::from_f32(44100, 1, vec![value]))))
        }
    }

    struct Exploding;

    impl Processor for Exploding {
        fn negotiate(&mut self, caps: &Caps) -> Result<Caps, FlowError> {
            Ok(caps.clone())
        }

        fn process(&mut self, _buffer: Buffer) -> Result<Option<Buffer>, FlowError> {
            panic!("gain table corrupted");
        }
    }

    struct Collect(Arc<Mutex<Vec<f32>>>);

    impl Processor for Collect {
        fn negotiate(&mut self, caps: &Caps) -> Result<Caps, FlowError> {
            Ok(caps.clone())
        }

        fn process(&mut self, buffer: Buffer) -> Result<Option<Buffer>, FlowError> {
            if let Buffer::Audio(AudioChunk {
                data: crate::buffer::SampleData::F32(samples),
                ..
            }) = buffer
            {
                self.0.lock().unwrap().extend(samples);
            }
            Ok(None)
        }
    }

    #[test]
    fn push_applies_stages_in_order() {
        let collected = Arc::new(Mutex::new(Vec::new()));
        let mut stages: Vec<(String, Box<dyn Processor>)> = vec![
            ("half".into(), Box::new(GainStage { gain: 0.5, tail: None })),
            ("double".into(), Box::new(GainStage { gain: 4.0, tail: None })),
            ("sink".into(), Box::new(Collect(collected.clone()))),
        ];

        push_through(
            &mut stages,
            Buffer::Audio(AudioChunk::from_f32(44100, 1, vec![1.0, -0.5])),
        )
        .unwrap();

        assert_eq!(*collected.lock().unwrap(), vec![2.0, -1.0]);
    }

    #[test]
    fn drain_pushes_tails_downstream_only() {
        let collected = Arc::new(Mutex::new(Vec::new()));
        let mut stages: Vec<(String, Box<dyn Processor>)> = vec![
            ("first".into(), Box::new(GainStage { gain: 2.0, tail: Some(1.0) })),
            ("second".into(), Box::new(GainStage { gain: 3.0, tail: Some(1.0) })),
            ("sink".into(), Box::new(Collect(collected.clone()))),
        ];

        drain(&mut stages).unwrap();

        // first's tail passes through second (x3); second's own tail does not
        assert_eq!(*collected.lock().unwrap(), vec![3.0, 1.0]);
    }

    #[test]
    fn panicking_stage_becomes_flow_error() {
        let collected = Arc::new(Mutex::new(Vec::new()));
        let mut stages: Vec<(String, Box<dyn Processor>)> = vec![
            ("gain".into(), Box::new(GainStage { gain: 2.0, tail: None })),
            ("broken".into(), Box::new(Exploding)),
            ("sink".into(), Box::new(Collect(collected.clone()))),
        ];

        let (name, err) = push_through(
            &mut stages,
            Buffer::Audio(AudioChunk::from_f32(44100, 1, vec![1.0])),
        )
        .unwrap_err();

        assert_eq!(name, "broken");
        assert!(matches!(&err, FlowError::Panicked(message) if message == "gain table corrupted"));
        assert!(collected.lock().unwrap().is_empty());

        let stream_error = err.into_stream_error(&name);
        assert_eq!(stream_error.message, "Streaming thread panicked");
        assert_eq!(stream_error.debug.as_deref(), Some("gain table corrupted"));
    }
}
