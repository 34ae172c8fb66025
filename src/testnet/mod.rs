//! In-memory network of nodes implementing every collaborator of [crate::DhtApi].
//!
//! Useful for tests and demos that need working `get`/`put`, content routing,
//! peer routing and block storage without sockets.

mod id;
mod providers;

use std::{
    collections::HashMap,
    net::Ipv4Addr,
    num::NonZeroUsize,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use bytes::Bytes;
use cid::{multihash::Multihash, Cid};
use libp2p_identity::PeerId;
use lru::LruCache;
use multiaddr::{Multiaddr, Protocol};
use sha1_smol::Sha1;
use tracing::{debug, trace, warn};

use crate::{
    api::DhtApi,
    common::PeerRecord,
    routing::{BlockStore, BoxError, ContentRouting, Dht, PeerRouting},
};

pub use id::Id;
pub use providers::{ProvidersStore, MAX_PROVIDERS_RETURNED};

/// Number of peers returned by a closest peers query.
pub const K: usize = 20;

/// Multicodec of blocks without links.
pub const RAW_CODEC: u64 = 0x55;
/// Multicodec of blocks with links.
pub const DAG_PB_CODEC: u64 = 0x70;
/// Multihash code of sha1.
pub const SHA1_CODE: u64 = 0x11;

// Stored data in the shared network.
const MAX_RECORDS: usize = 1000;
const MAX_PROVIDED_CIDS: usize = 2000;
const MAX_PROVIDERS: usize = 500;

const BASE_PORT: u16 = 4001;
/// Most nodes a [Testnet] can hold, each listening on its own TCP port from 4001 up.
pub const MAX_NODES: usize = (u16::MAX - BASE_PORT) as usize + 1;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Errors returned by [MemoryNode] collaborators.
pub enum TestnetError {
    #[error("Record not found")]
    RecordNotFound,

    #[error("Peer {0} not found")]
    PeerNotFound(PeerId),

    #[error("Block {0} not found")]
    BlockNotFound(Cid),
}

#[derive(Debug)]
/// Create a testnet of in-memory nodes sharing one simulated DHT.
pub struct Testnet {
    pub nodes: Vec<Arc<MemoryNode>>,
}

impl Testnet {
    /// Create `count` nodes, capped at [MAX_NODES].
    pub fn new(count: usize) -> Testnet {
        if count > MAX_NODES {
            warn!(count, max = MAX_NODES, "Not enough ports, capping testnet size");
        }

        let network = Arc::new(Network::default());

        let nodes = ports(count)
            .map(|port| {
                let node = Arc::new(MemoryNode::new(network.clone(), port));

                network.state().peers.insert(node.peer_id, node.record());

                node
            })
            .collect();

        debug!(count, "Started testnet");

        Testnet { nodes }
    }
}

#[derive(Debug)]
struct NetworkState {
    records: LruCache<Vec<u8>, Bytes>,
    providers: ProvidersStore,
    peers: HashMap<PeerId, PeerRecord>,
}

#[derive(Debug)]
struct Network(Mutex<NetworkState>);

impl Default for Network {
    fn default() -> Self {
        Network(Mutex::new(NetworkState {
            records: LruCache::new(non_zero(MAX_RECORDS)),
            providers: ProvidersStore::new(non_zero(MAX_PROVIDED_CIDS), non_zero(MAX_PROVIDERS)),
            peers: HashMap::new(),
        }))
    }
}

impl Network {
    fn state(&self) -> MutexGuard<'_, NetworkState> {
        // A panicking test thread must not take the whole network down.
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug, Clone)]
struct Block {
    data: Bytes,
    links: Vec<Cid>,
}

#[derive(Debug)]
/// A node of the [Testnet], with its own identity and local block store.
pub struct MemoryNode {
    peer_id: PeerId,
    addresses: Vec<Multiaddr>,
    blocks: Mutex<HashMap<Cid, Block>>,
    network: Arc<Network>,
}

impl MemoryNode {
    fn new(network: Arc<Network>, port: u16) -> Self {
        MemoryNode {
            peer_id: PeerId::random(),
            addresses: vec![Multiaddr::empty()
                .with(Protocol::Ip4(Ipv4Addr::LOCALHOST))
                .with(Protocol::Tcp(port))],
            blocks: Mutex::new(HashMap::new()),
            network,
        }
    }

    // === Getters ===

    pub fn peer_id(&self) -> PeerId {
        self.peer_id
    }

    pub fn addresses(&self) -> &[Multiaddr] {
        &self.addresses
    }

    /// This node as seen by other peers.
    pub fn record(&self) -> PeerRecord {
        PeerRecord::new(self.peer_id, self.addresses.clone())
    }

    // === Public Methods ===

    /// A [DhtApi] using this node for every collaborator.
    pub fn api(self: &Arc<Self>) -> DhtApi {
        DhtApi::new(self.clone())
    }

    /// Store a block locally and return its CID.
    ///
    /// The CID hashes both the data and the links, with the raw codec if
    /// `links` is empty and dag-pb otherwise.
    pub fn insert_block(&self, data: &[u8], links: Vec<Cid>) -> Cid {
        let mut hasher = Sha1::new();
        hasher.update(data);
        for link in &links {
            hasher.update(&link.to_bytes());
        }

        let hash = Multihash::wrap(SHA1_CODE, &hasher.digest().bytes())
            .expect("sha1 digest fits in a multihash");

        let codec = if links.is_empty() {
            RAW_CODEC
        } else {
            DAG_PB_CODEC
        };
        let cid = Cid::new_v1(codec, hash);

        self.blocks().insert(
            cid,
            Block {
                data: Bytes::copy_from_slice(data),
                links,
            },
        );

        cid
    }

    /// Data of a locally stored block.
    pub fn block(&self, cid: &Cid) -> Option<Bytes> {
        self.blocks().get(cid).map(|block| block.data.clone())
    }

    /// Remove a block from the local store, returns `true` if it was there.
    pub fn remove_block(&self, cid: &Cid) -> bool {
        self.blocks().remove(cid).is_some()
    }

    // === Private Methods ===

    fn blocks(&self) -> MutexGuard<'_, HashMap<Cid, Block>> {
        self.blocks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// The in-memory network answers instantly, timeouts are ignored.
impl Dht for MemoryNode {
    fn get(&self, key: &[u8], _timeout: Option<Duration>) -> Result<Bytes, BoxError> {
        self.network
            .state()
            .records
            .get(key)
            .cloned()
            .ok_or_else(|| TestnetError::RecordNotFound.into())
    }

    fn put(&self, key: &[u8], value: Bytes) -> Result<(), BoxError> {
        trace!(key_len = key.len(), "Storing record");

        self.network.state().records.put(key.to_vec(), value);

        Ok(())
    }

    fn closest_peers(&self, key: &[u8]) -> Result<Vec<PeerId>, BoxError> {
        let target = Id::from_key(key);

        let mut peers: Vec<(Id, PeerId)> = self
            .network
            .state()
            .peers
            .keys()
            .filter(|peer_id| **peer_id != self.peer_id)
            .map(|peer_id| (Id::from_key(&peer_id.to_bytes()).xor(&target), *peer_id))
            .collect();

        peers.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(peers
            .into_iter()
            .take(K)
            .map(|(_, peer_id)| peer_id)
            .collect())
    }
}

impl ContentRouting for MemoryNode {
    fn find_providers(
        &self,
        cid: &Cid,
        _timeout: Option<Duration>,
    ) -> Result<Vec<PeerRecord>, BoxError> {
        Ok(self.network.state().providers.get_random_providers(cid))
    }

    fn provide(&self, cid: &Cid) -> Result<(), BoxError> {
        trace!(%cid, peer_id = %self.peer_id, "Adding provider");

        self.network
            .state()
            .providers
            .add_provider(*cid, self.record());

        Ok(())
    }
}

impl PeerRouting for MemoryNode {
    fn find_peer(&self, peer_id: &PeerId) -> Result<PeerRecord, BoxError> {
        self.network
            .state()
            .peers
            .get(peer_id)
            .cloned()
            .ok_or_else(|| TestnetError::PeerNotFound(*peer_id).into())
    }
}

impl BlockStore for MemoryNode {
    fn has(&self, cid: &Cid) -> Result<bool, BoxError> {
        Ok(self.blocks().contains_key(cid))
    }

    fn links(&self, cid: &Cid) -> Result<Option<Vec<Cid>>, BoxError> {
        match self.blocks().get(cid) {
            Some(block) => Ok(Some(block.links.clone())),
            None => Err(TestnetError::BlockNotFound(*cid).into()),
        }
    }
}

/// A distinct port for each of the first `count` nodes.
fn ports(count: usize) -> impl Iterator<Item = u16> {
    (BASE_PORT..=u16::MAX).take(count)
}

fn non_zero(value: usize) -> NonZeroUsize {
    NonZeroUsize::new(value).unwrap_or(NonZeroUsize::MIN)
}
