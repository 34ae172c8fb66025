//! Peer records returned by collaborators and the shapes handed back to callers.

use libp2p_identity::PeerId;
use multiaddr::Multiaddr;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
/// A peer and the addresses it can be reached at.
pub struct PeerRecord {
    pub id: PeerId,
    pub addresses: Vec<Multiaddr>,
}

impl PeerRecord {
    pub fn new(id: PeerId, addresses: Vec<Multiaddr>) -> Self {
        PeerRecord { id, addresses }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Envelope returned by `findpeer`.
///
/// Serializes to `{"responses":[{"id":"<base58>","addresses":["/ip4/..."]}]}`,
/// which is what other implementations of this command return.
pub struct FindPeerResponse {
    pub responses: Vec<PeerResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerResponse {
    /// Base58 encoded peer id.
    pub id: String,
    /// Multiaddresses in their string form.
    pub addresses: Vec<String>,
}

impl From<PeerRecord> for FindPeerResponse {
    fn from(record: PeerRecord) -> Self {
        FindPeerResponse {
            responses: vec![PeerResponse {
                id: record.id.to_base58(),
                addresses: record.addresses.iter().map(|a| a.to_string()).collect(),
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// An entry returned by `query`.
///
/// Deliberately address-less: `query` probes the routing table, it doesn't dial.
pub struct ClosestPeer {
    /// Base58 encoded peer id.
    pub id: String,
}

impl From<PeerId> for ClosestPeer {
    fn from(peer_id: PeerId) -> Self {
        ClosestPeer {
            id: peer_id.to_base58(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn find_peer_envelope() {
        let id = PeerId::random();
        let addresses: Vec<Multiaddr> = vec![
            "/ip4/127.0.0.1/tcp/4001".parse().unwrap(),
            "/ip6/::1/udp/4001/quic-v1".parse().unwrap(),
        ];

        let response = FindPeerResponse::from(PeerRecord::new(id, addresses));

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            serde_json::json!({
                "responses": [{
                    "id": id.to_base58(),
                    "addresses": ["/ip4/127.0.0.1/tcp/4001", "/ip6/::1/udp/4001/quic-v1"],
                }]
            })
        );
    }

    #[test]
    fn closest_peer_has_no_addresses_field() {
        let id = PeerId::random();

        let value = serde_json::to_value(ClosestPeer::from(id)).unwrap();

        assert_eq!(value, serde_json::json!({ "id": id.to_base58() }));
        assert!(value.get("addresses").is_none());
    }
}
