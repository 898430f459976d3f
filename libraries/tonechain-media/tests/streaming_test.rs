//! Streaming tests
//!
//! Drive a full `MediaPipeline` over real files: decode a generated WAV,
//! resolve the decoder's pad on the test thread, and check what lands on
//! disk and on the bus.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tonechain_core::EchoParams;
use tonechain_media::*;

/// Write a 16-bit stereo sine to `path`
fn write_sine_wav(path: &Path, frames: usize, sample_rate: u32) {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..frames {
        let t = i as f32 / sample_rate as f32;
        let value = ((2.0 * std::f32::consts::PI * 440.0 * t).sin() * 16000.0) as i16;
        writer.write_sample(value).unwrap();
        writer.write_sample(value).unwrap();
    }
    writer.finalize().unwrap();
}

struct Graph {
    pipeline: MediaPipeline,
    decoder: ElementId,
    converter: ElementId,
}

/// filesrc ! decodebin ⇢ audioconvert ! [stages] ! wavenc ! filesink
fn build(input: PathBuf, output: PathBuf, stages: Vec<ElementKind>) -> Graph {
    let mut pipeline = MediaPipeline::new("streaming-test");
    let src = pipeline
        .add(ElementFactory::make(ElementKind::FileSource { location: input }))
        .unwrap();
    let decoder = pipeline.add(ElementFactory::make(ElementKind::DecodeBin)).unwrap();
    let converter = pipeline
        .add(ElementFactory::make(ElementKind::AudioConvert))
        .unwrap();
    let encoder = pipeline.add(ElementFactory::make(ElementKind::WavEnc)).unwrap();
    let sink = pipeline
        .add(ElementFactory::make(ElementKind::FileSink { location: output }))
        .unwrap();

    pipeline.link(src, decoder).unwrap();
    let mut previous = converter;
    for kind in stages {
        let stage = pipeline.add(ElementFactory::make(kind)).unwrap();
        pipeline.link(previous, stage).unwrap();
        previous = stage;
    }
    pipeline.link(previous, encoder).unwrap();
    pipeline.link(encoder, sink).unwrap();

    Graph {
        pipeline,
        decoder,
        converter,
    }
}

fn link_to_converter(graph: &mut Graph) {
    let converter = graph.converter;
    graph
        .pipeline
        .connect_pad_added(graph.decoder, move |pipeline, pad| {
            let caps = pipeline.pad(pad).ok().and_then(|p| p.caps.clone()).unwrap();
            if let Some(target) = pipeline.compatible_pad(converter, &caps) {
                pipeline.link_pads(pad, target).unwrap();
            }
        });
}

/// Service the bus until EOS or an error
fn run(pipeline: &mut MediaPipeline) -> Message {
    let bus = pipeline.bus();
    pipeline.set_state(State::Playing).unwrap();
    loop {
        match bus.recv_timeout(Duration::from_secs(30)).unwrap() {
            Message::PadAdded(request) => pipeline.handle_pad_added(request),
            Message::StateChanged { .. } => {}
            terminal => {
                pipeline.set_state(State::Null).unwrap();
                return terminal;
            }
        }
    }
}

#[test]
fn stream_reaches_eos_and_writes_wav() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.wav");
    let output = dir.path().join("out.wav");
    write_sine_wav(&input, 22050, 44100);

    let mut echo = EchoParams::default();
    echo.set_delay_ms(20);
    echo.set_intensity_percent(50.0);
    let mut graph = build(
        input,
        output.clone(),
        vec![ElementKind::AudioEcho(echo)],
    );
    link_to_converter(&mut graph);

    let message = run(&mut graph.pipeline);
    assert!(matches!(message, Message::Eos), "got {:?}", message);

    let reader = hound::WavReader::open(&output).unwrap();
    assert_eq!(reader.spec().channels, 2);
    assert_eq!(reader.spec().sample_rate, 44100);
    assert_eq!(reader.spec().sample_format, hound::SampleFormat::Float);
    assert_eq!(reader.duration(), 22050);
}

#[test]
fn missing_input_is_a_source_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut graph = build(
        dir.path().join("does-not-exist.wav"),
        dir.path().join("out.wav"),
        Vec::new(),
    );
    link_to_converter(&mut graph);

    let Message::Error(err) = run(&mut graph.pipeline) else {
        panic!("expected an error");
    };
    assert_eq!(err.element, "filesrc0");
    assert!(!dir.path().join("out.wav").exists());
}

#[test]
fn garbage_input_is_a_decoder_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("noise.mp3");
    std::fs::write(&input, vec![0x5au8; 8192]).unwrap();
    let mut graph = build(input, dir.path().join("out.wav"), Vec::new());
    link_to_converter(&mut graph);

    let Message::Error(err) = run(&mut graph.pipeline) else {
        panic!("expected an error");
    };
    assert_eq!(err.element, "decodebin0");
}

#[test]
fn unlinked_pad_stalls_until_null() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.wav");
    write_sine_wav(&input, 4410, 44100);
    // No pad-added handler: the decoder pad stays unlinked
    let mut graph = build(input, dir.path().join("out.wav"), Vec::new());

    let bus = graph.pipeline.bus();
    graph.pipeline.set_state(State::Playing).unwrap();

    let mut saw_pad = false;
    while let Ok(message) = bus.recv_timeout(Duration::from_millis(500)) {
        match message {
            Message::PadAdded(request) => {
                graph.pipeline.handle_pad_added(request);
                saw_pad = true;
            }
            Message::StateChanged { .. } => {}
            other => panic!("stream should stall, got {:?}", other),
        }
    }
    assert!(saw_pad);

    // Stopping joins the stalled streaming thread
    graph.pipeline.set_state(State::Null).unwrap();
    assert_eq!(graph.pipeline.state(), State::Null);
    assert!(!dir.path().join("out.wav").exists());
}
