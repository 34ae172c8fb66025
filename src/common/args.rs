//! Arguments as they arrive at the call boundary, before normalization.
//!
//! Callers (a CLI, an RPC server, or library code) hand over keys, CIDs and
//! peer ids either already structured or as text. Each argument type here
//! keeps that distinction until [crate::DhtApi] normalizes it, so that
//! malformed input is rejected before any collaborator is called.

use std::str::FromStr;

use bytes::Bytes;
use cid::Cid;
use libp2p_identity::PeerId;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
/// A DHT key. Only [KeyArg::Binary] is accepted by `get` and `put`.
pub enum KeyArg {
    Binary(Bytes),
    Text(String),
}

impl KeyArg {
    /// Returns the binary key, or [Error::InvalidKey] if the key is text.
    pub fn into_binary(self) -> Result<Bytes> {
        match self {
            KeyArg::Binary(bytes) => Ok(bytes),
            KeyArg::Text(_) => Err(Error::InvalidKey("key must be binary, got text")),
        }
    }
}

impl From<Bytes> for KeyArg {
    fn from(value: Bytes) -> Self {
        KeyArg::Binary(value)
    }
}

impl From<Vec<u8>> for KeyArg {
    fn from(value: Vec<u8>) -> Self {
        KeyArg::Binary(value.into())
    }
}

impl From<&[u8]> for KeyArg {
    fn from(value: &[u8]) -> Self {
        KeyArg::Binary(Bytes::copy_from_slice(value))
    }
}

impl<const N: usize> From<&[u8; N]> for KeyArg {
    fn from(value: &[u8; N]) -> Self {
        KeyArg::Binary(Bytes::copy_from_slice(value))
    }
}

impl From<String> for KeyArg {
    fn from(value: String) -> Self {
        KeyArg::Text(value)
    }
}

impl From<&str> for KeyArg {
    fn from(value: &str) -> Self {
        KeyArg::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A content identifier, structured or in its canonical string encoding.
pub enum CidArg {
    Cid(Cid),
    Text(String),
}

impl CidArg {
    /// Parse the text form if needed.
    ///
    /// Fails with [Error::InvalidCid] (`ERR_INVALID_CID`).
    pub fn resolve(self) -> Result<Cid> {
        match self {
            CidArg::Cid(cid) => Ok(cid),
            CidArg::Text(text) => Ok(Cid::from_str(&text)?),
        }
    }
}

impl From<Cid> for CidArg {
    fn from(value: Cid) -> Self {
        CidArg::Cid(value)
    }
}

impl From<&Cid> for CidArg {
    fn from(value: &Cid) -> Self {
        CidArg::Cid(*value)
    }
}

impl From<String> for CidArg {
    fn from(value: String) -> Self {
        CidArg::Text(value)
    }
}

impl From<&str> for CidArg {
    fn from(value: &str) -> Self {
        CidArg::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One or more CIDs, as accepted by `provide`.
pub struct CidList(Vec<CidArg>);

impl CidList {
    /// Resolve every entry, failing on the first malformed one.
    pub fn resolve(self) -> Result<Vec<Cid>> {
        self.0.into_iter().map(CidArg::resolve).collect()
    }
}

impl From<CidArg> for CidList {
    fn from(value: CidArg) -> Self {
        CidList(vec![value])
    }
}

impl From<Cid> for CidList {
    fn from(value: Cid) -> Self {
        CidList(vec![value.into()])
    }
}

impl From<&str> for CidList {
    fn from(value: &str) -> Self {
        CidList(vec![value.into()])
    }
}

impl From<Vec<CidArg>> for CidList {
    fn from(value: Vec<CidArg>) -> Self {
        CidList(value)
    }
}

impl From<Vec<Cid>> for CidList {
    fn from(value: Vec<Cid>) -> Self {
        CidList(value.into_iter().map(CidArg::Cid).collect())
    }
}

impl From<&[Cid]> for CidList {
    fn from(value: &[Cid]) -> Self {
        CidList(value.iter().map(CidArg::from).collect())
    }
}

impl From<Vec<&str>> for CidList {
    fn from(value: Vec<&str>) -> Self {
        CidList(value.into_iter().map(CidArg::from).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A peer identifier, structured or Base58 encoded.
pub enum PeerArg {
    PeerId(PeerId),
    Text(String),
}

impl PeerArg {
    /// Decode the Base58 form if needed.
    ///
    /// Fails with [Error::InvalidPeerId] (`ERR_INVALID_PEER_ID`).
    pub fn resolve(self) -> Result<PeerId> {
        match self {
            PeerArg::PeerId(peer_id) => Ok(peer_id),
            PeerArg::Text(text) => Ok(PeerId::from_str(&text)?),
        }
    }
}

impl From<PeerId> for PeerArg {
    fn from(value: PeerId) -> Self {
        PeerArg::PeerId(value)
    }
}

impl From<&PeerId> for PeerArg {
    fn from(value: &PeerId) -> Self {
        PeerArg::PeerId(*value)
    }
}

impl From<String> for PeerArg {
    fn from(value: String) -> Self {
        PeerArg::Text(value)
    }
}

impl From<&str> for PeerArg {
    fn from(value: &str) -> Self {
        PeerArg::Text(value.to_string())
    }
}
