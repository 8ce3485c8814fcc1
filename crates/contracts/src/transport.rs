//! PeerTransport trait - Transport adapter interface
//!
//! Wraps the two physical delivery primitives behind one abstract seam.

use crate::{ContractError, LinkProbe, MessageEnvelope};

/// Transport adapter trait
///
/// Implementations expose an *immediate* tier (low latency, fails fast while
/// peers are not mutually reachable) and a *durable* tier (always accepted,
/// delivered eventually, survives disconnection). Endpoints are shared
/// between the dispatcher and the session monitor, so all methods take
/// `&self` with interior synchronization.
#[trait_variant::make(PeerTransport: Send)]
pub trait LocalPeerTransport {
    /// Transport name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Observe current reachability and session activation
    fn probe(&self) -> LinkProbe;

    /// Attempt low-latency delivery
    ///
    /// # Errors
    /// Fails fast with `LinkUnreachable` when the peer cannot be reached
    /// right now, or `LinkClosed` when the endpoint has shut down.
    async fn send_immediate(&self, envelope: &MessageEnvelope) -> Result<(), ContractError>;

    /// Hand the envelope to the durable tier
    ///
    /// Always accepted while the endpoint is open; delivery happens
    /// eventually, in enqueue order, once the peer is reachable.
    ///
    /// # Errors
    /// Only `LinkClosed` (endpoint shut down) or an encode failure.
    async fn enqueue_durable(&self, envelope: &MessageEnvelope) -> Result<(), ContractError>;
}
