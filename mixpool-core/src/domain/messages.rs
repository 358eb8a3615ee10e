//! Wire messages and status codes.
//!
//! Everything on the wire is the fixed-width bincode encoding behind a
//! little-endian `u16` framing-version prefix.

use crate::domain::entry::PoolEntry;
use crate::domain::queue::QueueAdvert;
use crate::domain::session::PoolStateId;
use crate::domain::tx::{OutPoint, Transaction, TxIn};
use crate::foundation::{Denomination, Hash32, PoolError, Result, SessionId};
use bincode::Options;
use serde::{Deserialize, Serialize};

pub const WIRE_PROTOCOL_VERSION: u16 = 1;

/// Status and rejection reasons relayed to clients. These are protocol data,
/// never process errors.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[repr(i32)]
pub enum PoolMessage {
    ErrAlreadyHave = 0,
    ErrDenom = 1,
    ErrEntriesFull = 2,
    ErrFees = 3,
    ErrInvalidCollateral = 4,
    ErrInvalidInput = 5,
    ErrInvalidScript = 6,
    ErrInvalidTx = 7,
    ErrMaximum = 8,
    ErrMnList = 9,
    ErrMode = 10,
    ErrNonStandardPubkey = 11,
    ErrQueueFull = 12,
    ErrRecent = 13,
    ErrSession = 14,
    ErrMissingTx = 15,
    ErrVersion = 16,
    Noerr = 17,
    Success = 18,
    EntriesAdded = 19,
}

impl PoolMessage {
    pub fn text(&self) -> &'static str {
        match self {
            PoolMessage::ErrAlreadyHave => "Already have that input.",
            PoolMessage::ErrDenom => "No matching denominations found for mixing.",
            PoolMessage::ErrEntriesFull => "Entries are full.",
            PoolMessage::ErrFees => "Transaction fees are too high.",
            PoolMessage::ErrInvalidCollateral => "Collateral not valid.",
            PoolMessage::ErrInvalidInput => "Input is not valid.",
            PoolMessage::ErrInvalidScript => "Invalid script detected.",
            PoolMessage::ErrInvalidTx => "Transaction not valid.",
            PoolMessage::ErrMaximum => "Entry exceeds maximum size.",
            PoolMessage::ErrMnList => "Not in the coordinator list.",
            PoolMessage::ErrMode => "Incompatible mode.",
            PoolMessage::ErrNonStandardPubkey => "Non-standard public key detected.",
            PoolMessage::ErrQueueFull => "Session queue is full.",
            PoolMessage::ErrRecent => "Last queue was created too recently.",
            PoolMessage::ErrSession => "Session not complete.",
            PoolMessage::ErrMissingTx => "Missing input transaction information.",
            PoolMessage::ErrVersion => "Incompatible version.",
            PoolMessage::Noerr => "No errors detected.",
            PoolMessage::Success => "Transaction created successfully.",
            PoolMessage::EntriesAdded => "Your entries added successfully.",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[repr(i32)]
pub enum PoolStatusUpdate {
    Rejected = 0,
    Accepted = 1,
}

/// The `(session_id, phase, reserved, update, reason)` tuple of a status push.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub session_id: SessionId,
    pub state: PoolStateId,
    pub entries_count: i32,
    pub update: PoolStatusUpdate,
    pub message: PoolMessage,
}

/// A mixed transaction broadcast, signed by the coordinator that assembled it.
#[derive(Clone, Debug, Eq, Serialize, Deserialize)]
pub struct MixBroadcastTx {
    pub tx: Transaction,
    pub coordinator_outpoint: OutPoint,
    pub signature: Vec<u8>,
    pub sig_time: i64,
}

impl PartialEq for MixBroadcastTx {
    fn eq(&self, other: &Self) -> bool {
        self.tx == other.tx
    }
}

impl MixBroadcastTx {
    pub fn new(tx: Transaction, coordinator_outpoint: OutPoint, sig_time: i64) -> Self {
        Self { tx, coordinator_outpoint, signature: Vec::new(), sig_time }
    }

    pub fn signing_payload(&self) -> Result<Hash32> {
        let bytes = bincode::DefaultOptions::new()
            .with_fixint_encoding()
            .serialize(&(&self.tx, self.coordinator_outpoint, self.sig_time))?;
        Ok(*blake3::hash(&bytes).as_bytes())
    }
}

/// Every message kind of the mixing protocol, both directions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PoolWireMessage {
    /// `dsa` — candidate asks to join a session for a denomination.
    Accept { denomination: Denomination, collateral: Transaction },
    /// `dsq` — a coordinator advertises its queue.
    Queue(QueueAdvert),
    /// `dsi` — client submits its entry.
    Entry(PoolEntry),
    /// `dss` — client returns unlocking scripts for its inputs.
    SignFinal(Vec<TxIn>),
    /// `dsf` — coordinator sends the unsigned merged transaction.
    FinalTx { session_id: SessionId, tx: Transaction },
    /// `dsc` — coordinator reports the session outcome.
    Complete { session_id: SessionId, message: PoolMessage },
    /// `dssu` — coordinator pushes a status update.
    StatusUpdate(StatusUpdate),
    /// `dstx` — signed mixed-transaction broadcast, relayed network-wide.
    BroadcastTx(MixBroadcastTx),
}

impl PoolWireMessage {
    pub fn command(&self) -> &'static str {
        match self {
            PoolWireMessage::Accept { .. } => "dsa",
            PoolWireMessage::Queue(_) => "dsq",
            PoolWireMessage::Entry(_) => "dsi",
            PoolWireMessage::SignFinal(_) => "dss",
            PoolWireMessage::FinalTx { .. } => "dsf",
            PoolWireMessage::Complete { .. } => "dsc",
            PoolWireMessage::StatusUpdate(_) => "dssu",
            PoolWireMessage::BroadcastTx(_) => "dstx",
        }
    }
}

pub fn encode_message(message: &PoolWireMessage) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    out.extend_from_slice(&WIRE_PROTOCOL_VERSION.to_le_bytes());
    let bytes = bincode::DefaultOptions::new().with_fixint_encoding().serialize(message)?;
    out.extend_from_slice(&bytes);
    Ok(out)
}

pub fn decode_message(bytes: &[u8]) -> Result<PoolWireMessage> {
    if bytes.len() < 2 {
        return Err(PoolError::MessageTooShort { size: bytes.len() });
    }
    let version = u16::from_le_bytes([bytes[0], bytes[1]]);
    if version != WIRE_PROTOCOL_VERSION {
        return Err(PoolError::WireVersionMismatch { expected: WIRE_PROTOCOL_VERSION, actual: version });
    }
    Ok(bincode::DefaultOptions::new().with_fixint_encoding().deserialize(&bytes[2..])?)
}
