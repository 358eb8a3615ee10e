//! Outbound messaging surface. The transport owns connections, framing and
//! banning; the pool only pushes messages and reports misbehavior. No method
//! here may block on the network.

pub mod mock;

use crate::domain::messages::PoolWireMessage;
use crate::domain::queue::QueueAdvert;
use crate::domain::tx::Transaction;
use crate::foundation::TxId;
use std::net::SocketAddr;

/// The peer a message arrived from, as the transport saw it.
#[derive(Clone, Copy, Debug)]
pub struct PeerCtx {
    pub id: u64,
    pub addr: SocketAddr,
    /// Protocol version the peer advertised at handshake.
    pub version: i32,
}

pub trait Transport: Send + Sync {
    /// Unicast to a participant by address. Returns false when no such peer is
    /// connected — the caller decides whether that dooms the session.
    fn push_message(&self, addr: &SocketAddr, message: &PoolWireMessage) -> bool;

    /// Explicit REJECT for peers speaking an obsolete protocol version.
    fn push_reject(&self, peer_id: u64, command: &str, reason: &str);

    /// Hand a misbehavior score to the transport's banning logic.
    fn report_misbehavior(&self, peer_id: u64, score: i32);

    /// Gossip a queue advert to all peers.
    fn relay_advert(&self, advert: &QueueAdvert);

    /// Announce a mixed-transaction broadcast network-wide.
    fn relay_inventory(&self, txid: TxId);

    /// Relay a raw transaction (consumed collateral) network-wide.
    fn relay_transaction(&self, tx: &Transaction);
}
