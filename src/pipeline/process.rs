//! Process task - drains the frame queue through the stream processor and
//! forwards finished packets to the router.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::event::{EventCallback, StreamEvent};
use crate::frame::OutputPacket;
use crate::pipeline::{FrameItem, RouterCommand};
use crate::session::SessionState;
use crate::stream::StreamProcessor;

/// The process stage owns the stream processor and the sync state inside it.
///
/// Frames are handled strictly in arrival order; a frame that produces no
/// packet only bumps the dropped counter. The end-of-stream sentinel stops
/// the stage and tells the router to drain and shut the sinks down.
pub(crate) struct ProcessStage {
    processor: StreamProcessor,
    frame_rx: mpsc::Receiver<FrameItem>,
    packet_tx: mpsc::Sender<OutputPacket>,
    router_cmd_tx: mpsc::Sender<RouterCommand>,
    state: Arc<SessionState>,
    event_callback: Option<EventCallback>,
}

impl ProcessStage {
    pub fn new(
        processor: StreamProcessor,
        frame_rx: mpsc::Receiver<FrameItem>,
        packet_tx: mpsc::Sender<OutputPacket>,
        router_cmd_tx: mpsc::Sender<RouterCommand>,
        state: Arc<SessionState>,
        event_callback: Option<EventCallback>,
    ) -> Self {
        Self {
            processor,
            frame_rx,
            packet_tx,
            router_cmd_tx,
            state,
            event_callback,
        }
    }

    /// Runs the processing loop until the sentinel arrives or the queue
    /// closes.
    pub async fn run(mut self) {
        while let Some(item) = self.frame_rx.recv().await {
            let frame = match item {
                FrameItem::Frame(frame) => frame,
                FrameItem::EndOfStream => break,
            };

            let packet = self.processor.process_frame(&frame);
            self.publish_diagnostics();

            match packet {
                Some(packet) => {
                    let pts = packet.pts;
                    if self.packet_tx.send(packet).await.is_err() {
                        // Router is gone, nothing downstream anymore
                        return;
                    }
                    self.state.packets_emitted.fetch_add(1, Ordering::SeqCst);
                    self.emit_event(StreamEvent::FrameProduced { pts });
                }
                None => {
                    self.state.frames_dropped.fetch_add(1, Ordering::SeqCst);
                }
            }
        }

        self.emit_event(StreamEvent::EndOfStream);
        self.state.running.store(false, Ordering::SeqCst);
        let _ = self.router_cmd_tx.send(RouterCommand::Stop).await;
    }

    /// Mirrors processor diagnostics into the shared session state.
    fn publish_diagnostics(&self) {
        self.state
            .clock_skew_bits
            .store(self.processor.clock_skew().to_bits(), Ordering::SeqCst);
        self.state
            .compensations
            .store(self.processor.compensations(), Ordering::SeqCst);
    }

    fn emit_event(&self, event: StreamEvent) {
        if let Some(ref callback) = self.event_callback {
            callback(event);
        }
    }
}
