//! Router task that fans finished packets out to sinks.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::config::StreamConfig;
use crate::error::AudioStreamError;
use crate::event::{EventCallback, StreamEvent};
use crate::frame::OutputPacket;
use crate::sink::Sink;

/// Command sent to the router task.
pub(crate) enum RouterCommand {
    /// Stop the router gracefully.
    Stop,
}

/// The router receives finished packets and forwards them to all sinks.
pub(crate) struct Router {
    sinks: Vec<Arc<dyn Sink>>,
    event_callback: Option<EventCallback>,
    config: StreamConfig,
}

impl Router {
    /// Creates a new router with the given sinks.
    pub fn new(sinks: Vec<Arc<dyn Sink>>, config: StreamConfig) -> Self {
        Self {
            sinks,
            event_callback: None,
            config,
        }
    }

    /// Sets the event callback.
    pub fn with_event_callback(mut self, callback: EventCallback) -> Self {
        self.event_callback = Some(callback);
        self
    }

    /// Sends an event to the callback if configured.
    fn emit_event(&self, event: StreamEvent) {
        if let Some(ref callback) = self.event_callback {
            callback(event);
        }
    }

    /// Writes a packet to a single sink with retry logic.
    async fn write_to_sink(&self, sink: &Arc<dyn Sink>, packet: &OutputPacket) {
        let mut attempts = 0;
        let mut delay = self.config.sink_retry_delay;

        loop {
            match sink.write(packet).await {
                Ok(()) => return,
                Err(e) => {
                    attempts += 1;
                    self.emit_event(StreamEvent::SinkError {
                        sink_name: sink.name().to_string(),
                        error: e.to_string(),
                    });

                    if attempts >= self.config.sink_retry_attempts {
                        // Max retries reached, give up on this packet
                        return;
                    }

                    // Exponential backoff
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
            }
        }
    }

    /// Writes a packet to all sinks concurrently.
    pub async fn write_packet(&self, packet: &OutputPacket) {
        let futures: Vec<_> = self
            .sinks
            .iter()
            .map(|sink| self.write_to_sink(sink, packet))
            .collect();

        futures::future::join_all(futures).await;
    }

    /// Starts all sinks.
    ///
    /// Returns an error if any sink fails to start.
    pub async fn start_sinks(&self) -> Result<(), AudioStreamError> {
        for sink in &self.sinks {
            sink.on_start()
                .await
                .map_err(|e| AudioStreamError::SinkStartFailed {
                    sink_name: sink.name().to_string(),
                    reason: e.to_string(),
                })?;
        }
        Ok(())
    }

    /// Stops all sinks.
    pub async fn stop_sinks(&self) {
        for sink in &self.sinks {
            if let Err(e) = sink.on_stop().await {
                self.emit_event(StreamEvent::SinkError {
                    sink_name: sink.name().to_string(),
                    error: format!("Error during shutdown: {e}"),
                });
            }
        }
    }

    /// Runs the router, reading from a channel and writing to sinks.
    ///
    /// This is the main entry point for the router task.
    pub async fn run(
        self,
        mut packet_rx: mpsc::Receiver<OutputPacket>,
        mut cmd_rx: mpsc::Receiver<RouterCommand>,
    ) {
        loop {
            tokio::select! {
                Some(packet) = packet_rx.recv() => {
                    self.write_packet(&packet).await;
                }
                Some(cmd) = cmd_rx.recv() => {
                    match cmd {
                        RouterCommand::Stop => {
                            // Drain remaining packets
                            while let Ok(packet) = packet_rx.try_recv() {
                                self.write_packet(&packet).await;
                            }
                            break;
                        }
                    }
                }
                else => break,
            }
        }

        self.stop_sinks().await;
    }
}
