//! Ingest task - submits encoded packets and drains decoded frames into the
//! bounded frame queue.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::config::QueuePolicy;
use crate::decode::{self, AudioDecoder};
use crate::event::{EventCallback, StreamEvent};
use crate::frame::EncodedPacket;
use crate::pipeline::FrameItem;
use crate::session::SessionState;

/// The ingest stage owns the decoder and feeds the frame queue.
///
/// Each received packet is submitted to the decoder - a rejected submission
/// drops the packet silently - and the decoder is drained completely before
/// the next packet is taken. A `None` input is the end marker: the
/// end-of-stream sentinel is forwarded and the task stops.
pub(crate) struct IngestStage {
    decoder: Box<dyn AudioDecoder>,
    input_rx: mpsc::Receiver<Option<EncodedPacket>>,
    frame_tx: mpsc::Sender<FrameItem>,
    policy: QueuePolicy,
    state: Arc<SessionState>,
    event_callback: Option<EventCallback>,
}

impl IngestStage {
    pub fn new(
        decoder: Box<dyn AudioDecoder>,
        input_rx: mpsc::Receiver<Option<EncodedPacket>>,
        frame_tx: mpsc::Sender<FrameItem>,
        policy: QueuePolicy,
        state: Arc<SessionState>,
        event_callback: Option<EventCallback>,
    ) -> Self {
        Self {
            decoder,
            input_rx,
            frame_tx,
            policy,
            state,
            event_callback,
        }
    }

    /// Runs the ingest loop until the end marker arrives or the input
    /// channel closes.
    pub async fn run(mut self) {
        while let Some(item) = self.input_rx.recv().await {
            let Some(packet) = item else {
                break;
            };

            if let Err(e) = self.decoder.submit(&packet) {
                tracing::trace!(error = %e, "packet submission rejected, dropping");
                continue;
            }

            for frame in decode::drain(self.decoder.as_mut()) {
                self.state.frames_decoded.fetch_add(1, Ordering::SeqCst);
                if !self.forward(FrameItem::Frame(frame)).await {
                    // Processing side is gone, nothing left to feed
                    return;
                }
            }
        }

        // End marker (or closed input): the sentinel always goes through,
        // bypassing the drop policy
        let _ = self.frame_tx.send(FrameItem::EndOfStream).await;
    }

    /// Forwards one frame according to the configured queue policy.
    ///
    /// Returns `false` when the receiving side has shut down.
    async fn forward(&mut self, item: FrameItem) -> bool {
        match self.policy {
            QueuePolicy::Block => self.frame_tx.send(item).await.is_ok(),
            QueuePolicy::DropNewest => match self.frame_tx.try_send(item) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    let dropped = self.state.queue_overflows.fetch_add(1, Ordering::SeqCst) + 1;
                    tracing::warn!(dropped, "frame queue full, dropping newest frame");
                    if let Some(ref callback) = self.event_callback {
                        callback(StreamEvent::QueueOverflow {
                            dropped_frames: dropped,
                        });
                    }
                    true
                }
                Err(TrySendError::Closed(_)) => false,
            },
        }
    }
}
