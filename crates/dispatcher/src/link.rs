//! In-process transport pair for the two peers.
//!
//! Uses index-based separation for the durable outbox:
//! - VecDeque keeps the delivery order (slab keys only)
//! - Slab stores the encoded envelopes
//!
//! Both endpoints share one link condition (reachability + session
//! activation), flipped by the demo schedule or by tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use slab::Slab;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use contracts::{ContractError, LinkProbe, MessageEnvelope, PeerTransport};

/// Link condition shared by both endpoints
#[derive(Debug, Default)]
struct LinkShared {
    reachable: AtomicBool,
    session_active: AtomicBool,
}

/// Durable outbox: encoded envelopes awaiting a reachable peer
#[derive(Debug, Default)]
struct Outbox {
    order: VecDeque<usize>,
    storage: Slab<Bytes>,
}

impl Outbox {
    fn push(&mut self, bytes: Bytes) {
        let key = self.storage.insert(bytes);
        self.order.push_back(key);
    }

    fn drain_all(&mut self) -> Vec<Bytes> {
        let mut drained = Vec::with_capacity(self.order.len());
        while let Some(key) = self.order.pop_front() {
            drained.push(self.storage.remove(key));
        }
        drained
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

/// One endpoint of an in-process link.
///
/// The immediate tier is a bounded channel into the peer's inbox that
/// fails fast; the durable tier is an outbox drained by a pump task
/// whenever the peers are reachable.
pub struct MemoryLink {
    name: &'static str,
    shared: Arc<LinkShared>,
    peer_tx: async_channel::Sender<Bytes>,
    inbox_rx: async_channel::Receiver<Bytes>,
    outbox: Mutex<Outbox>,
}

impl std::fmt::Debug for MemoryLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryLink")
            .field("name", &self.name)
            .field("durable_pending", &self.durable_pending())
            .finish()
    }
}

impl MemoryLink {
    /// Create a connected endpoint pair.
    ///
    /// `immediate_capacity` bounds the in-flight immediate tier; a full
    /// channel behaves like an unreachable peer. The link starts
    /// unreachable with the session inactive.
    pub fn pair(immediate_capacity: usize) -> (Arc<MemoryLink>, Arc<MemoryLink>) {
        let shared = Arc::new(LinkShared::default());
        let (a_to_b_tx, a_to_b_rx) = async_channel::bounded(immediate_capacity);
        let (b_to_a_tx, b_to_a_rx) = async_channel::bounded(immediate_capacity);

        let a = Arc::new(MemoryLink {
            name: "peer_a",
            shared: Arc::clone(&shared),
            peer_tx: a_to_b_tx,
            inbox_rx: b_to_a_rx,
            outbox: Mutex::new(Outbox::default()),
        });
        let b = Arc::new(MemoryLink {
            name: "peer_b",
            shared,
            peer_tx: b_to_a_tx,
            inbox_rx: a_to_b_rx,
            outbox: Mutex::new(Outbox::default()),
        });

        (a, b)
    }

    /// Receiver for envelopes delivered to this endpoint
    pub fn inbox(&self) -> async_channel::Receiver<Bytes> {
        self.inbox_rx.clone()
    }

    /// Flip transport reachability (affects both endpoints)
    pub fn set_reachable(&self, reachable: bool) {
        self.shared.reachable.store(reachable, Ordering::Relaxed);
    }

    /// Flip session-layer activation (affects both endpoints)
    pub fn set_session_active(&self, active: bool) {
        self.shared.session_active.store(active, Ordering::Relaxed);
    }

    /// Number of envelopes waiting in the durable outbox
    pub fn durable_pending(&self) -> usize {
        self.lock_outbox().len()
    }

    /// Close this endpoint's sending side
    pub fn close(&self) {
        self.peer_tx.close();
    }

    /// Spawn the durable pump: delivers outbox entries in order whenever
    /// the peer is reachable. Exits once the peer's inbox is closed.
    pub fn spawn_pump(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let link = Arc::clone(self);
        tokio::spawn(async move {
            link.run_pump(interval).await;
        })
    }

    #[instrument(name = "durable_pump", skip(self, interval), fields(link = self.name))]
    async fn run_pump(&self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        info!("Durable pump started");

        loop {
            ticker.tick().await;

            if self.peer_tx.is_closed() {
                break;
            }
            if !self.shared.reachable.load(Ordering::Relaxed) {
                continue;
            }

            let drained = self.lock_outbox().drain_all();
            if drained.is_empty() {
                continue;
            }

            debug!(count = drained.len(), "Delivering durable backlog");
            for bytes in drained {
                // Peer inbox closed mid-drain: remaining entries are lost,
                // matching a torn-down link
                if self.peer_tx.send(bytes).await.is_err() {
                    info!("Peer inbox closed, durable pump exiting");
                    return;
                }
            }

            observability::metrics::record_durable_pending(self.durable_pending());
        }

        info!("Durable pump stopped");
    }

    fn lock_outbox(&self) -> std::sync::MutexGuard<'_, Outbox> {
        match self.outbox.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl PeerTransport for MemoryLink {
    fn name(&self) -> &str {
        self.name
    }

    fn probe(&self) -> LinkProbe {
        LinkProbe {
            reachable: self.shared.reachable.load(Ordering::Relaxed),
            session_active: self.shared.session_active.load(Ordering::Relaxed),
        }
    }

    async fn send_immediate(&self, envelope: &MessageEnvelope) -> Result<(), ContractError> {
        if !self.shared.reachable.load(Ordering::Relaxed) {
            return Err(ContractError::link_unreachable("peer not reachable"));
        }

        let bytes = Bytes::from(envelope.encode()?);
        self.peer_tx.try_send(bytes).map_err(|e| match e {
            async_channel::TrySendError::Full(_) => {
                ContractError::link_unreachable("immediate channel full")
            }
            async_channel::TrySendError::Closed(_) => ContractError::LinkClosed,
        })
    }

    async fn enqueue_durable(&self, envelope: &MessageEnvelope) -> Result<(), ContractError> {
        if self.peer_tx.is_closed() {
            return Err(ContractError::LinkClosed);
        }

        let bytes = Bytes::from(envelope.encode()?);
        let mut outbox = self.lock_outbox();
        outbox.push(bytes);
        Ok(())
    }
}
