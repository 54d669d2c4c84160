//! Integration tests for av-audio.
//!
//! These drive the full pipeline - ingest, sync, resample, router - with a
//! mock decoder, so they run without any codec library or audio hardware.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use av_audio::{
    AudioStream, ChannelLayout, ChannelSink, CodecChannelLayout, CodecSampleFormat, EncodedPacket,
    GlobalClock, MockDecoder, OutputPacket, QueuePolicy, SampleFormat, SignalParams, Sink,
    SinkError, StreamConfig, StreamEvent, TimeBase,
};
use tokio::sync::mpsc;

fn mono_s16() -> SignalParams {
    SignalParams {
        format: CodecSampleFormat::S16,
        layout: CodecChannelLayout::Mono,
        rate: 48000,
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// A test sink that counts writes.
struct CountingSink {
    name: String,
    count: AtomicUsize,
}

impl CountingSink {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            count: AtomicUsize::new(0),
        }
    }

    fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sink for CountingSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&self, _packet: &OutputPacket) -> Result<(), SinkError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn test_pipeline_end_to_end() {
    init_tracing();

    let mut decoder = MockDecoder::new(mono_s16());
    // Two packets, two frames each
    decoder.queue_packet_frames(vec![
        decoder.sine_frame(Some(0), 1024, 440.0),
        decoder.sine_frame(Some(1024), 1024, 440.0),
    ]);
    decoder.queue_packet_frames(vec![
        decoder.sine_frame(Some(2048), 1024, 440.0),
        decoder.sine_frame(Some(3072), 1024, 440.0),
    ]);

    let (tx, mut rx) = mpsc::channel::<OutputPacket>(32);
    let session = AudioStream::builder()
        .decoder(Box::new(decoder))
        .clock(GlobalClock::new())
        .time_base(TimeBase::new(1, 48000))
        .stream_index(1)
        .stream_id(42)
        .add_sink(ChannelSink::new(tx))
        .start()
        .await
        .unwrap();

    session
        .push_packet(EncodedPacket::new(vec![0u8; 32]))
        .await
        .unwrap();
    session
        .push_packet(EncodedPacket::new(vec![1u8; 32]))
        .await
        .unwrap();
    session.finish().await.unwrap();

    let mut packets = Vec::new();
    while let Some(packet) = rx.recv().await {
        packets.push(packet);
    }

    assert_eq!(packets.len(), 4);
    // Timestamps pass through untouched, in order
    let pts: Vec<i64> = packets.iter().map(|p| p.pts).collect();
    assert_eq!(pts, vec![0, 1024, 2048, 3072]);
    // Identity and caps carried on every packet
    for packet in &packets {
        assert_eq!(packet.stream_index, 1);
        assert_eq!(packet.stream_id, 42);
        assert_eq!(packet.caps.format, SampleFormat::S16);
        assert_eq!(packet.caps.layout, ChannelLayout::Mono);
        assert_eq!(packet.sample_count(), 1024);
    }

    session.stop().await.unwrap();
}

#[tokio::test]
async fn test_pipeline_repairs_missing_timestamps() {
    let mut decoder = MockDecoder::new(mono_s16());
    decoder.queue_packet_frames(vec![
        decoder.silence_frame(None, 512),
        decoder.silence_frame(None, 512),
        decoder.silence_frame(None, 256),
    ]);

    let (tx, mut rx) = mpsc::channel::<OutputPacket>(32);
    let session = AudioStream::builder()
        .decoder(Box::new(decoder))
        .add_sink(ChannelSink::new(tx))
        .start()
        .await
        .unwrap();

    session
        .push_packet(EncodedPacket::new(vec![0u8; 16]))
        .await
        .unwrap();
    session.finish().await.unwrap();

    let mut pts = Vec::new();
    while let Some(packet) = rx.recv().await {
        pts.push(packet.pts);
    }

    // Continuous audio assumed: 0, then +512, then +512
    assert_eq!(pts, vec![0, 512, 1024]);

    session.stop().await.unwrap();
}

#[tokio::test]
async fn test_pipeline_fans_out_to_multiple_sinks() {
    let mut decoder = MockDecoder::new(mono_s16());
    decoder.queue_packet_frames(vec![decoder.silence_frame(Some(0), 512)]);

    let (tx, mut rx) = mpsc::channel::<OutputPacket>(8);
    let counter = Arc::new(CountingSink::new("counter"));
    let counter_sink = counter.clone();

    struct SharedSink(Arc<CountingSink>);

    #[async_trait]
    impl Sink for SharedSink {
        fn name(&self) -> &str {
            self.0.name()
        }

        async fn write(&self, packet: &OutputPacket) -> Result<(), SinkError> {
            self.0.write(packet).await
        }
    }

    let session = AudioStream::builder()
        .decoder(Box::new(decoder))
        .add_sink(ChannelSink::new(tx))
        .add_sink(SharedSink(counter_sink))
        .start()
        .await
        .unwrap();

    session
        .push_packet(EncodedPacket::new(vec![0u8; 16]))
        .await
        .unwrap();
    session.finish().await.unwrap();

    let packet = rx.recv().await.unwrap();
    assert_eq!(packet.pts, 0);
    assert!(rx.recv().await.is_none());

    session.stop().await.unwrap();
    assert_eq!(counter.count(), 1);
}

#[tokio::test]
async fn test_pipeline_unsupported_native_format_falls_back() {
    let params = SignalParams {
        format: CodecSampleFormat::F64P,
        layout: CodecChannelLayout::Surround51,
        rate: 44100,
    };
    let mut decoder = MockDecoder::new(params);
    decoder.queue_packet_frames(vec![decoder.silence_frame(Some(0), 441)]);

    let (tx, mut rx) = mpsc::channel::<OutputPacket>(8);
    let session = AudioStream::builder()
        .decoder(Box::new(decoder))
        .add_sink(ChannelSink::new(tx))
        .start()
        .await
        .unwrap();

    // The capability query answers before any frame flows
    let caps = session.caps();
    assert_eq!(caps.format, SampleFormat::F32);
    assert_eq!(caps.layout, ChannelLayout::Stereo);
    assert_eq!(caps.channels, 2);
    assert_eq!(caps.bits_per_sample, 32);

    session
        .push_packet(EncodedPacket::new(vec![0u8; 16]))
        .await
        .unwrap();
    session.finish().await.unwrap();

    // Converted packets match the advertised caps
    let packet = rx.recv().await.unwrap();
    assert_eq!(packet.caps, caps);
    assert_eq!(packet.sample_count(), 441);

    session.stop().await.unwrap();
}

#[tokio::test]
async fn test_pipeline_hard_resync_on_large_desync() {
    let clock = GlobalClock::new();
    let mut decoder = MockDecoder::new(mono_s16());
    // 100 seconds at the 1/48000 time base
    decoder.queue_packet_frames(vec![decoder.silence_frame(Some(4_800_000), 1024)]);

    let events = Arc::new(Mutex::new(Vec::new()));
    let events_clone = events.clone();

    let (tx, mut rx) = mpsc::channel::<OutputPacket>(8);
    let session = AudioStream::builder()
        .decoder(Box::new(decoder))
        .clock(clock.clone())
        .time_base(TimeBase::new(1, 48000))
        .add_sink(ChannelSink::new(tx))
        .on_event(move |e| events_clone.lock().unwrap().push(e))
        .start()
        .await
        .unwrap();

    session
        .push_packet(EncodedPacket::new(vec![0u8; 16]))
        .await
        .unwrap();
    session.finish().await.unwrap();

    // The frame still converts and arrives
    assert_eq!(rx.recv().await.unwrap().pts, 4_800_000);
    session.stop().await.unwrap();

    // The shared clock was hard-set to the frame's presentation time
    assert_eq!(clock.read(), 100.0);
    let events = events.lock().unwrap();
    assert!(events
        .iter()
        .any(|e| matches!(e, StreamEvent::ClockResynced { pts_seconds } if *pts_seconds == 100.0)));
    assert!(events
        .iter()
        .any(|e| matches!(e, StreamEvent::FrameProduced { .. })));
    assert!(events.iter().any(|e| matches!(e, StreamEvent::EndOfStream)));
}

#[tokio::test]
async fn test_pipeline_exposes_clock_skew() {
    let clock = GlobalClock::starting_at(0.1);
    let mut decoder = MockDecoder::new(mono_s16());
    decoder.queue_packet_frames(vec![
        decoder.silence_frame(Some(0), 512),
        decoder.silence_frame(Some(512), 512),
    ]);

    let (tx, mut rx) = mpsc::channel::<OutputPacket>(8);
    let session = AudioStream::builder()
        .decoder(Box::new(decoder))
        .clock(clock)
        .time_base(TimeBase::new(1, 48000))
        .add_sink(ChannelSink::new(tx))
        .start()
        .await
        .unwrap();

    session
        .push_packet(EncodedPacket::new(vec![0u8; 16]))
        .await
        .unwrap();
    session.finish().await.unwrap();

    // Drain until the router shuts the sink down; processing is done then
    while rx.recv().await.is_some() {}

    // Last frame: pts = 512/48000 s against a clock pinned at 0.1 s
    let expected = 512.0 / 48000.0 - 0.1;
    assert!((session.clock_skew() - expected).abs() < 1e-9);
    assert_eq!(session.stats().compensations, 0);

    session.stop().await.unwrap();
}

#[tokio::test]
async fn test_pipeline_session_stats() {
    let mut decoder = MockDecoder::new(mono_s16());
    decoder.queue_packet_frames(vec![
        decoder.silence_frame(Some(0), 512),
        decoder.silence_frame(Some(512), 512),
    ]);

    let (tx, mut rx) = mpsc::channel::<OutputPacket>(8);
    let session = AudioStream::builder()
        .decoder(Box::new(decoder))
        .add_sink(ChannelSink::new(tx))
        .start()
        .await
        .unwrap();

    session
        .push_packet(EncodedPacket::new(vec![0u8; 16]))
        .await
        .unwrap();
    session.finish().await.unwrap();
    while rx.recv().await.is_some() {}

    let stats = session.stats();
    assert_eq!(stats.frames_decoded, 2);
    assert_eq!(stats.packets_emitted, 2);
    assert_eq!(stats.frames_dropped, 0);
    assert_eq!(stats.queue_overflows, 0);

    session.stop().await.unwrap();
}

#[tokio::test]
async fn test_pipeline_drop_policy_conserves_frames() {
    init_tracing();

    let mut decoder = MockDecoder::new(mono_s16());
    let frames: Vec<_> = (0..20)
        .map(|i| decoder.silence_frame(Some(i * 64), 64))
        .collect();
    decoder.queue_packet_frames(frames);

    let counter = Arc::new(CountingSink::new("counter"));

    struct SharedSink(Arc<CountingSink>);

    #[async_trait]
    impl Sink for SharedSink {
        fn name(&self) -> &str {
            self.0.name()
        }

        async fn write(&self, packet: &OutputPacket) -> Result<(), SinkError> {
            self.0.write(packet).await
        }
    }

    let session = AudioStream::builder()
        .decoder(Box::new(decoder))
        .config(StreamConfig {
            queue_depth: 2,
            queue_policy: QueuePolicy::DropNewest,
            ..Default::default()
        })
        .add_sink(SharedSink(counter.clone()))
        .start()
        .await
        .unwrap();

    session
        .push_packet(EncodedPacket::new(vec![0u8; 16]))
        .await
        .unwrap();
    session.finish().await.unwrap();

    // Every decoded frame is either delivered or accounted as dropped
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(5);
    loop {
        let stats = session.stats();
        if counter.count() as u64 + stats.queue_overflows == 20 {
            assert_eq!(stats.frames_decoded, 20);
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "pipeline stalled");
        tokio::task::yield_now().await;
    }

    session.stop().await.unwrap();
}

#[tokio::test]
async fn test_pipeline_block_policy_loses_nothing() {
    let mut decoder = MockDecoder::new(mono_s16());
    let frames: Vec<_> = (0..20)
        .map(|i| decoder.silence_frame(Some(i * 64), 64))
        .collect();
    decoder.queue_packet_frames(frames);

    let (tx, mut rx) = mpsc::channel::<OutputPacket>(64);
    let session = AudioStream::builder()
        .decoder(Box::new(decoder))
        .config(StreamConfig {
            queue_depth: 2,
            queue_policy: QueuePolicy::Block,
            ..Default::default()
        })
        .add_sink(ChannelSink::new(tx))
        .start()
        .await
        .unwrap();

    session
        .push_packet(EncodedPacket::new(vec![0u8; 16]))
        .await
        .unwrap();
    session.finish().await.unwrap();

    let mut received = 0;
    while rx.recv().await.is_some() {
        received += 1;
    }
    assert_eq!(received, 20);

    let stats = session.stats();
    assert_eq!(stats.queue_overflows, 0);
    session.stop().await.unwrap();
}
