//! Tokio mpsc channel sink implementation.

use crate::error::SinkError;
use crate::frame::OutputPacket;
use crate::sink::Sink;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// A sink that sends finished packets to a tokio mpsc channel.
///
/// This is the primary way to receive packets for downstream processing
/// (playback scheduling, encoding, analysis, etc.). Packet buffers are
/// `Arc`-shared, so the clone per send is cheap.
///
/// # Example
///
/// ```
/// use av_audio::{ChannelSink, OutputPacket};
/// use tokio::sync::mpsc;
///
/// let (tx, mut rx) = mpsc::channel::<OutputPacket>(100);
/// let sink = ChannelSink::new(tx);
///
/// // Use sink with the AudioStream builder...
/// // Then receive packets:
/// // while let Some(packet) = rx.recv().await { ... }
/// ```
pub struct ChannelSink {
    name: String,
    sender: mpsc::Sender<OutputPacket>,
}

impl ChannelSink {
    /// Creates a new channel sink with the given sender.
    ///
    /// The sender should have sufficient buffer capacity for your use case.
    /// A capacity of 100 is typically sufficient for most applications.
    pub fn new(sender: mpsc::Sender<OutputPacket>) -> Self {
        Self {
            name: "channel".to_string(),
            sender,
        }
    }

    /// Creates a new channel sink with a custom name.
    pub fn with_name(name: impl Into<String>, sender: mpsc::Sender<OutputPacket>) -> Self {
        Self {
            name: name.into(),
            sender,
        }
    }
}

#[async_trait]
impl Sink for ChannelSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&self, packet: &OutputPacket) -> Result<(), SinkError> {
        self.sender
            .send(packet.clone())
            .await
            .map_err(|_| SinkError::ChannelClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::tests::test_packet;

    #[tokio::test]
    async fn test_channel_sink_sends_packets() {
        let (tx, mut rx) = mpsc::channel::<OutputPacket>(10);
        let sink = ChannelSink::new(tx);

        sink.write(&test_packet(4800)).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.pts, 4800);
    }

    #[tokio::test]
    async fn test_channel_sink_closed() {
        let (tx, rx) = mpsc::channel::<OutputPacket>(10);
        let sink = ChannelSink::new(tx);

        drop(rx);

        let result = sink.write(&test_packet(0)).await;
        assert!(matches!(result, Err(SinkError::ChannelClosed)));
    }

    #[tokio::test]
    async fn test_channel_sink_custom_name() {
        let (tx, _rx) = mpsc::channel::<OutputPacket>(10);
        let sink = ChannelSink::with_name("playback", tx);
        assert_eq!(sink.name(), "playback");
    }
}
