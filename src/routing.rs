//! Capabilities of the underlying node that [crate::DhtApi] delegates to.
//!
//! These are supplied by the network stack (Kademlia routing, connection
//! management, wire protocol and block storage all live behind them).
//! Every call may block on I/O.

use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use cid::Cid;
use libp2p_identity::PeerId;

use crate::common::PeerRecord;

/// Error type returned by collaborators.
///
/// It is propagated to callers inside [crate::Error::Collaborator] without
/// being reinterpreted.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Raw key/value storage and routing table queries.
pub trait Dht: std::fmt::Debug + Send + Sync {
    /// Get the value stored under `key`.
    ///
    /// `timeout` of `None` means the node's own default.
    fn get(&self, key: &[u8], timeout: Option<Duration>) -> Result<Bytes, BoxError>;

    /// Store `value` under `key`.
    fn put(&self, key: &[u8], value: Bytes) -> Result<(), BoxError>;

    /// Peers closest to `key` in the keyspace, as known by the routing table.
    fn closest_peers(&self, key: &[u8]) -> Result<Vec<PeerId>, BoxError>;
}

/// Content provider advertisement and discovery.
pub trait ContentRouting: std::fmt::Debug + Send + Sync {
    /// Find peers that announced they can supply `cid`.
    fn find_providers(
        &self,
        cid: &Cid,
        timeout: Option<Duration>,
    ) -> Result<Vec<PeerRecord>, BoxError>;

    /// Announce that this node can supply `cid`.
    fn provide(&self, cid: &Cid) -> Result<(), BoxError>;
}

/// Discovering how to reach a peer.
pub trait PeerRouting: std::fmt::Debug + Send + Sync {
    fn find_peer(&self, peer_id: &PeerId) -> Result<PeerRecord, BoxError>;
}

/// The local content-addressed block store.
pub trait BlockStore: std::fmt::Debug + Send + Sync {
    /// Returns `true` if the block is stored locally.
    fn has(&self, cid: &Cid) -> Result<bool, BoxError>;

    /// CIDs linked from the block `cid`.
    ///
    /// Returns `Ok(None)` if this store can't decode links, which is the default.
    fn links(&self, _cid: &Cid) -> Result<Option<Vec<Cid>>, BoxError> {
        Ok(None)
    }
}

impl<T: Dht + ?Sized> Dht for Arc<T> {
    fn get(&self, key: &[u8], timeout: Option<Duration>) -> Result<Bytes, BoxError> {
        (**self).get(key, timeout)
    }

    fn put(&self, key: &[u8], value: Bytes) -> Result<(), BoxError> {
        (**self).put(key, value)
    }

    fn closest_peers(&self, key: &[u8]) -> Result<Vec<PeerId>, BoxError> {
        (**self).closest_peers(key)
    }
}

impl<T: ContentRouting + ?Sized> ContentRouting for Arc<T> {
    fn find_providers(
        &self,
        cid: &Cid,
        timeout: Option<Duration>,
    ) -> Result<Vec<PeerRecord>, BoxError> {
        (**self).find_providers(cid, timeout)
    }

    fn provide(&self, cid: &Cid) -> Result<(), BoxError> {
        (**self).provide(cid)
    }
}

impl<T: PeerRouting + ?Sized> PeerRouting for Arc<T> {
    fn find_peer(&self, peer_id: &PeerId) -> Result<PeerRecord, BoxError> {
        (**self).find_peer(peer_id)
    }
}

impl<T: BlockStore + ?Sized> BlockStore for Arc<T> {
    fn has(&self, cid: &Cid) -> Result<bool, BoxError> {
        (**self).has(cid)
    }

    fn links(&self, cid: &Cid) -> Result<Option<Vec<Cid>>, BoxError> {
        (**self).links(cid)
    }
}
