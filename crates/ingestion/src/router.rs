//! Inbound router - transport bytes to typed messages.

use std::sync::Arc;

use async_channel::{bounded, Receiver, Sender};
use bytes::Bytes;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use contracts::InboundMessage;

use crate::decode;
use crate::error::IngestionError;
use crate::metrics::RouterMetrics;

/// Inbound router
///
/// Consumes raw envelope bytes from the transport inbox, decodes and
/// validates them, and emits typed [`InboundMessage`]s downstream.
/// Malformed envelopes are rejected and logged; they never reach the
/// consistency engine.
pub struct InboundRouter {
    /// Raw bytes from the transport endpoint
    inbox: Receiver<Bytes>,

    /// Typed message sender
    tx: Sender<InboundMessage>,

    /// Typed message receiver
    rx: Option<Receiver<InboundMessage>>,

    /// Shared metrics
    metrics: Arc<RouterMetrics>,
}

impl InboundRouter {
    /// Create a router over a transport inbox
    ///
    /// # Arguments
    /// * `inbox` - Raw envelope bytes from the transport
    /// * `channel_capacity` - Typed output channel capacity
    pub fn new(inbox: Receiver<Bytes>, channel_capacity: usize) -> Self {
        let (tx, rx) = bounded(channel_capacity);

        Self {
            inbox,
            tx,
            rx: Some(rx),
            metrics: Arc::new(RouterMetrics::new()),
        }
    }

    /// Get the typed message receiver
    ///
    /// Note: can only be called once, subsequent calls return None
    pub fn take_receiver(&mut self) -> Option<Receiver<InboundMessage>> {
        self.rx.take()
    }

    /// Get metrics reference
    pub fn metrics(&self) -> Arc<RouterMetrics> {
        self.metrics.clone()
    }

    /// Spawn the router loop as a background task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Run the router loop.
    ///
    /// Returns when the transport inbox closes or every downstream
    /// receiver is dropped.
    #[instrument(name = "inbound_router_run", skip(self))]
    pub async fn run(self) {
        info!("Inbound router started");

        while let Ok(bytes) = self.inbox.recv().await {
            self.metrics.inc_received();

            let message = match Self::process(&bytes) {
                Ok(message) => message,
                Err(e) => {
                    self.reject(&e);
                    continue;
                }
            };

            self.metrics.inc_routed();
            if self.tx.send(message).await.is_err() {
                debug!("Downstream closed, router exiting");
                break;
            }
        }

        info!(
            received = self.metrics.received_count(),
            rejected = self.metrics.rejected_count(),
            "Inbound router stopped"
        );
    }

    /// Decode and route one raw envelope
    fn process(bytes: &Bytes) -> Result<InboundMessage, IngestionError> {
        let envelope = decode::decode_envelope(bytes)?;
        decode::route_envelope(envelope)
    }

    fn reject(&self, error: &IngestionError) {
        self.metrics.inc_rejected();
        observability::record_envelope_rejected(error.reason_label());
        warn!(reason = error.reason_label(), error = %error, "Inbound envelope rejected");
    }
}
