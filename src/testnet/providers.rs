//! Manage announced providers for CIDs

use std::num::NonZeroUsize;

use cid::Cid;
use libp2p_identity::PeerId;
use lru::LruCache;
use multiaddr::Multiaddr;
use rand::{thread_rng, Rng};

use crate::common::PeerRecord;

/// Maximum number of providers returned for a single CID.
pub const MAX_PROVIDERS_RETURNED: usize = 20;

#[derive(Debug)]
/// An LRU cache of providers per CID.
///
/// Each CID keeps its own LRU of providers, so the most recent announcements win
/// once either limit is reached.
pub struct ProvidersStore {
    cids: LruCache<Cid, LruCache<PeerId, Vec<Multiaddr>>>,
    max_providers: NonZeroUsize,
}

impl ProvidersStore {
    pub fn new(max_cids: NonZeroUsize, max_providers: NonZeroUsize) -> Self {
        Self {
            cids: LruCache::new(max_cids),
            max_providers,
        }
    }

    pub fn add_provider(&mut self, cid: Cid, provider: PeerRecord) {
        if let Some(cid_lru) = self.cids.get_mut(&cid) {
            cid_lru.put(provider.id, provider.addresses);
        } else {
            let mut cid_lru = LruCache::new(self.max_providers);
            cid_lru.put(provider.id, provider.addresses);
            self.cids.put(cid, cid_lru);
        };
    }

    /// Returns up to [MAX_PROVIDERS_RETURNED] providers, sampled at random if there are more.
    pub fn get_random_providers(&mut self, cid: &Cid) -> Vec<PeerRecord> {
        let Some(cid_lru) = self.cids.get(cid) else {
            return vec![];
        };

        let size = cid_lru.len();
        let target_size = MAX_PROVIDERS_RETURNED;

        if size <= target_size {
            return cid_lru
                .iter()
                .map(|(id, addresses)| PeerRecord::new(*id, addresses.clone()))
                .collect();
        }

        let mut results = Vec::with_capacity(target_size);

        let mut rng = thread_rng();

        for (index, (id, addresses)) in cid_lru.iter().enumerate() {
            // Chance of picking this item given the remaining slots and items
            let remaining_slots = target_size - results.len();
            let remaining_items = size - index;
            let current_chance = remaining_slots as f64 / remaining_items as f64;

            if rng.gen_bool(current_chance) {
                results.push(PeerRecord::new(*id, addresses.clone()));
                if results.len() == target_size {
                    break;
                }
            }
        }

        results
    }
}

#[cfg(test)]
mod test {
    use cid::multihash::Multihash;

    use super::*;

    fn cid(byte: u8) -> Cid {
        Cid::new_v1(0x55, Multihash::wrap(0x11, &[byte; 20]).unwrap())
    }

    fn provider(port: u16) -> PeerRecord {
        PeerRecord::new(
            PeerId::random(),
            vec![format!("/ip4/127.0.0.1/tcp/{port}").parse().unwrap()],
        )
    }

    #[test]
    fn max_cids() {
        let mut store = ProvidersStore::new(
            NonZeroUsize::new(1).unwrap(),
            NonZeroUsize::new(100).unwrap(),
        );

        let a = provider(1);
        let b = provider(2);

        store.add_provider(cid(1), a);
        store.add_provider(cid(2), b.clone());

        assert_eq!(store.cids.len(), 1);
        assert!(store.get_random_providers(&cid(1)).is_empty());
        assert_eq!(store.get_random_providers(&cid(2)), vec![b]);
    }

    #[test]
    fn max_providers() {
        let mut store =
            ProvidersStore::new(NonZeroUsize::new(1).unwrap(), NonZeroUsize::new(2).unwrap());

        let a = provider(1);
        let b = provider(2);
        let c = provider(3);

        store.add_provider(cid(1), a);
        store.add_provider(cid(1), b.clone());
        store.add_provider(cid(1), c.clone());

        assert_eq!(store.get_random_providers(&cid(1)), vec![c, b]);
    }

    #[test]
    fn reannounce_updates_addresses() {
        let mut store = ProvidersStore::new(
            NonZeroUsize::new(1).unwrap(),
            NonZeroUsize::new(10).unwrap(),
        );

        let mut a = provider(1);
        store.add_provider(cid(1), a.clone());

        a.addresses = vec!["/ip4/10.0.0.1/tcp/4001".parse().unwrap()];
        store.add_provider(cid(1), a.clone());

        assert_eq!(store.get_random_providers(&cid(1)), vec![a]);
    }

    #[test]
    fn random_providers_subset() {
        let mut store = ProvidersStore::new(
            NonZeroUsize::new(1).unwrap(),
            NonZeroUsize::new(200).unwrap(),
        );

        for i in 0..200 {
            store.add_provider(cid(1), provider(i))
        }

        assert_eq!(store.cids.get(&cid(1)).unwrap().len(), 200);

        let sample = store.get_random_providers(&cid(1));

        assert_eq!(sample.len(), MAX_PROVIDERS_RETURNED);
    }
}
