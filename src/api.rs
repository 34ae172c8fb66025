//! DhtApi command surface.

use std::{
    collections::HashSet,
    num::NonZeroUsize,
    sync::{Arc, Mutex, PoisonError},
};

use bytes::Bytes;
use cid::Cid;
use tracing::{debug, trace, warn};

use crate::{
    common::{
        CidArg, CidList, ClosestPeer, FindPeerResponse, KeyArg, Options, PeerArg, PeerRecord,
    },
    config::Config,
    fan_out,
    routing::{BlockStore, ContentRouting, Dht, PeerRouting},
    Error, Result,
};

#[derive(Debug, Clone)]
/// Blocking command surface over a DHT node.
///
/// Validates and normalizes arguments, checks pre-conditions, then delegates
/// to the injected collaborators. Holds no state besides them, so clones are
/// cheap and can be used from many threads at once.
pub struct DhtApi {
    dht: Arc<dyn Dht>,
    content_routing: Arc<dyn ContentRouting>,
    peer_routing: Arc<dyn PeerRouting>,
    block_store: Arc<dyn BlockStore>,
    config: Config,
}

impl DhtApi {
    /// Create a DhtApi using one node for every collaborator, with default [Config].
    pub fn new<N>(node: Arc<N>) -> Self
    where
        N: Dht + ContentRouting + PeerRouting + BlockStore + 'static,
    {
        DhtApi {
            dht: node.clone(),
            content_routing: node.clone(),
            peer_routing: node.clone(),
            block_store: node,
            config: Config::default(),
        }
    }

    /// Returns a builder to inject collaborators and edit settings.
    pub fn builder() -> DhtApiBuilder {
        DhtApiBuilder::default()
    }

    // === Getters ===

    pub fn config(&self) -> &Config {
        &self.config
    }

    // === Public Methods ===

    /// Get the value stored under a binary `key`.
    ///
    /// Text keys are rejected with [Error::InvalidKey] before reaching the DHT.
    pub fn get(&self, key: impl Into<KeyArg>, options: Options) -> Result<Bytes> {
        let key = key.into().into_binary()?;

        debug!(key_len = key.len(), timeout = ?options.timeout, "get");

        self.dht
            .get(&key, options.timeout)
            .map_err(Error::Collaborator)
    }

    /// Store `value` under a binary `key`.
    ///
    /// Text keys are rejected with [Error::InvalidKey] before reaching the DHT.
    pub fn put(&self, key: impl Into<KeyArg>, value: impl Into<Bytes>) -> Result<()> {
        let key = key.into().into_binary()?;
        let value = value.into();

        debug!(key_len = key.len(), value_len = value.len(), "put");

        self.dht.put(&key, value).map_err(Error::Collaborator)
    }

    /// Find providers of a CID (`findprovs`).
    ///
    /// Returns the records as found by the content routing, no deduplication.
    pub fn find_providers(
        &self,
        key: impl Into<CidArg>,
        options: Options,
    ) -> Result<Vec<PeerRecord>> {
        let cid = key.into().resolve()?;

        debug!(%cid, timeout = ?options.timeout, "findprovs");

        self.content_routing
            .find_providers(&cid, options.timeout)
            .map_err(Error::Collaborator)
    }

    /// Find the addresses of a peer (`findpeer`).
    pub fn find_peer(&self, peer: impl Into<PeerArg>) -> Result<FindPeerResponse> {
        let peer_id = peer.into().resolve()?;

        debug!(%peer_id, "findpeer");

        let record = self
            .peer_routing
            .find_peer(&peer_id)
            .map_err(Error::Collaborator)?;

        Ok(record.into())
    }

    /// Announce to the network that this node can supply `keys`.
    ///
    /// All keys must be present in the local block store, otherwise nothing is
    /// announced and [Error::NotFoundLocally] is returned.
    ///
    /// With [Options::recursive], every locally stored block reachable from
    /// `keys` is announced too.
    pub fn provide(&self, keys: impl Into<CidList>, options: Options) -> Result<()> {
        let roots = keys.into().resolve()?;

        debug!(count = roots.len(), recursive = options.recursive, "provide");

        self.ensure_local(&roots)?;

        let cids = if options.recursive {
            self.linked_local_blocks(roots)?
        } else {
            roots
        };

        fan_out::attempt_all(&cids, self.config.fan_out, |cid| {
            trace!(%cid, "Announcing");

            self.content_routing
                .provide(cid)
                .map_err(Error::Collaborator)
        })
    }

    /// Peers closest to `peer` according to the routing table.
    ///
    /// Entries carry no addresses, this is a routing table probe, not a lookup.
    pub fn query(&self, peer: impl Into<PeerArg>) -> Result<Vec<ClosestPeer>> {
        let peer_id = peer.into().resolve()?;

        debug!(%peer_id, "query");

        let closest = self
            .dht
            .closest_peers(&peer_id.to_bytes())
            .map_err(Error::Collaborator)?;

        Ok(closest.into_iter().map(ClosestPeer::from).collect())
    }

    // === Private Methods ===

    fn ensure_local(&self, cids: &[Cid]) -> Result<()> {
        fan_out::try_for_each(cids, self.config.fan_out, |cid| {
            if self.block_store.has(cid).map_err(Error::Collaborator)? {
                Ok(())
            } else {
                warn!(%cid, "Block not found locally, refusing to provide");
                Err(Error::NotFoundLocally)
            }
        })
    }

    /// Breadth first walk from `roots` over locally stored blocks.
    ///
    /// Each level's new links are checked for presence with bounded fan-out.
    /// Linked blocks missing locally are skipped along with their subgraph.
    fn linked_local_blocks(&self, roots: Vec<Cid>) -> Result<Vec<Cid>> {
        let mut visited = HashSet::new();
        let mut level: Vec<Cid> = roots
            .into_iter()
            .filter(|root| visited.insert(*root))
            .collect();
        let mut found = Vec::new();

        while !level.is_empty() {
            let mut candidates = Vec::new();

            for cid in &level {
                let links = self
                    .block_store
                    .links(cid)
                    .map_err(Error::Collaborator)?
                    .ok_or(Error::Unsupported("recursive provide"))?;

                for link in links {
                    if visited.insert(link) {
                        candidates.push((*cid, link));
                    }
                }
            }

            found.append(&mut level);
            level = self.local_links(&candidates)?;
        }

        Ok(found)
    }

    /// Links of `(parent, link)` pairs that are stored locally, in order.
    fn local_links(&self, candidates: &[(Cid, Cid)]) -> Result<Vec<Cid>> {
        let present = Mutex::new(HashSet::new());

        fan_out::try_for_each(candidates, self.config.fan_out, |(parent, link)| {
            if self.block_store.has(link).map_err(Error::Collaborator)? {
                present
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(*link);
            } else {
                trace!(%link, %parent, "Skipping linked block missing locally");
            }

            Ok(())
        })?;

        let present = present.into_inner().unwrap_or_else(PoisonError::into_inner);

        Ok(candidates
            .iter()
            .map(|(_, link)| *link)
            .filter(|link| present.contains(link))
            .collect())
    }
}

#[derive(Debug, Default)]
/// Inject collaborators and create a [DhtApi].
pub struct DhtApiBuilder {
    dht: Option<Arc<dyn Dht>>,
    content_routing: Option<Arc<dyn ContentRouting>>,
    peer_routing: Option<Arc<dyn PeerRouting>>,
    block_store: Option<Arc<dyn BlockStore>>,
    config: Config,
}

impl DhtApiBuilder {
    /// Raw key/value storage and closest peers queries.
    pub fn dht(mut self, dht: impl Dht + 'static) -> Self {
        self.dht = Some(Arc::new(dht));
        self
    }

    pub fn content_routing(mut self, content_routing: impl ContentRouting + 'static) -> Self {
        self.content_routing = Some(Arc::new(content_routing));
        self
    }

    pub fn peer_routing(mut self, peer_routing: impl PeerRouting + 'static) -> Self {
        self.peer_routing = Some(Arc::new(peer_routing));
        self
    }

    /// Local block store, consulted before providing.
    pub fn block_store(mut self, block_store: impl BlockStore + 'static) -> Self {
        self.block_store = Some(Arc::new(block_store));
        self
    }

    /// Use one node for all collaborators.
    pub fn node<N>(self, node: Arc<N>) -> Self
    where
        N: Dht + ContentRouting + PeerRouting + BlockStore + 'static,
    {
        self.dht(node.clone())
            .content_routing(node.clone())
            .peer_routing(node.clone())
            .block_store(node)
    }

    /// Set [Config::fan_out]
    pub fn fan_out(mut self, fan_out: NonZeroUsize) -> Self {
        self.config.fan_out = fan_out;
        self
    }

    /// Create a [DhtApi], failing if a collaborator is missing.
    pub fn build(self) -> Result<DhtApi> {
        Ok(DhtApi {
            dht: self.dht.ok_or(Error::MissingCollaborator("dht"))?,
            content_routing: self
                .content_routing
                .ok_or(Error::MissingCollaborator("content_routing"))?,
            peer_routing: self
                .peer_routing
                .ok_or(Error::MissingCollaborator("peer_routing"))?,
            block_store: self
                .block_store
                .ok_or(Error::MissingCollaborator("block_store"))?,
            config: self.config,
        })
    }
}
