//! End to end behaviour of DhtApi over an in-memory testnet.

use std::num::NonZeroUsize;

use dht_api::{
    testnet::{Testnet, TestnetError},
    Bytes, Cid, CidArg, CidList, DhtApi, Error, Options, PeerId,
};

#[test]
fn put_get_across_nodes() {
    let testnet = Testnet::new(10);

    testnet.nodes[0]
        .api()
        .put(b"/v/key".to_vec(), Bytes::from_static(b"value"))
        .unwrap();

    let value = testnet.nodes[9]
        .api()
        .get(Bytes::from_static(b"/v/key"), Options::default())
        .unwrap();

    assert_eq!(value, Bytes::from_static(b"value"));
}

#[test]
fn get_missing_record_error_is_preserved() {
    let testnet = Testnet::new(2);

    let error = testnet.nodes[0]
        .api()
        .get(b"/v/missing", Options::default())
        .unwrap_err();

    assert!(matches!(error, Error::Collaborator(_)));
    assert_eq!(
        error
            .collaborator()
            .and_then(|inner| inner.downcast_ref::<TestnetError>()),
        Some(&TestnetError::RecordNotFound)
    );
}

#[test]
fn provide_then_find_providers() {
    let testnet = Testnet::new(10);
    let a = &testnet.nodes[0];
    let b = &testnet.nodes[1];

    let cid_a = a.insert_block(b"block a", vec![]);
    let cid_b = b.insert_block(b"block b", vec![]);

    a.api().provide(cid_a, Options::default()).unwrap();
    b.api().provide(cid_b.to_string().as_str(), Options::default()).unwrap();

    let api = testnet.nodes[5].api();

    let providers = api.find_providers(cid_a, Options::default()).unwrap();
    assert_eq!(providers, vec![a.record()]);

    let providers = api
        .find_providers(cid_b.to_string(), Options::default())
        .unwrap();
    assert_eq!(providers, vec![b.record()]);
}

#[test]
fn find_providers_unknown_cid_is_empty() {
    let testnet = Testnet::new(3);
    let cid = testnet.nodes[0].insert_block(b"never provided", vec![]);

    let providers = testnet.nodes[1]
        .api()
        .find_providers(cid, Options::default())
        .unwrap();

    assert!(providers.is_empty());
}

#[test]
fn find_providers_invalid_cid() {
    let testnet = Testnet::new(1);

    let error = testnet.nodes[0]
        .api()
        .find_providers("not-a-valid-cid", Options::default())
        .unwrap_err();

    assert_eq!(error.code(), "ERR_INVALID_CID");
}

#[test]
fn provide_block_held_elsewhere() {
    let testnet = Testnet::new(3);
    let a = &testnet.nodes[0];
    let b = &testnet.nodes[1];

    let mine = a.insert_block(b"mine", vec![]);
    let theirs = b.insert_block(b"theirs", vec![]);

    let result = a.api().provide(vec![mine, theirs], Options::default());

    assert!(matches!(result, Err(Error::NotFoundLocally)));

    let providers = a.api().find_providers(mine, Options::default()).unwrap();
    assert!(providers.is_empty());
}

#[test]
fn provide_many_with_small_fan_out() {
    let testnet = Testnet::new(4);
    let node = &testnet.nodes[0];

    let cids: Vec<_> = (0..50u8).map(|i| node.insert_block(&[i], vec![])).collect();

    let api = DhtApi::builder()
        .node(node.clone())
        .fan_out(NonZeroUsize::new(2).unwrap())
        .build()
        .unwrap();

    api.provide(cids.clone(), Options::default()).unwrap();

    let other = testnet.nodes[3].api();
    for cid in cids {
        let providers = other.find_providers(cid, Options::default()).unwrap();
        assert_eq!(providers, vec![node.record()]);
    }
}

#[test]
fn recursive_provide() {
    let testnet = Testnet::new(3);
    let node = &testnet.nodes[0];

    let leaf_a = node.insert_block(b"leaf a", vec![]);
    let leaf_b = node.insert_block(b"leaf b", vec![]);
    let middle = node.insert_block(b"middle", vec![leaf_a, leaf_b]);
    let root = node.insert_block(b"root", vec![middle, leaf_a]);

    node.remove_block(&leaf_b);

    node.api()
        .provide(root.to_string().as_str(), Options::default().recursive(true))
        .unwrap();

    let other = testnet.nodes[2].api();
    let provided = |cid: Cid| {
        !other
            .find_providers(cid, Options::default())
            .unwrap()
            .is_empty()
    };

    assert!(provided(root));
    assert!(provided(middle));
    assert!(provided(leaf_a));
    assert!(!provided(leaf_b));
}

#[test]
fn non_recursive_provide_only_announces_roots() {
    let testnet = Testnet::new(2);
    let node = &testnet.nodes[0];

    let leaf = node.insert_block(b"leaf", vec![]);
    let root = node.insert_block(b"root", vec![leaf]);

    node.api().provide(root, Options::default()).unwrap();

    let other = testnet.nodes[1].api();
    assert_eq!(
        other.find_providers(root, Options::default()).unwrap().len(),
        1
    );
    assert!(other
        .find_providers(leaf, Options::default())
        .unwrap()
        .is_empty());
}

#[test]
fn provide_empty_list() {
    let testnet = Testnet::new(1);

    testnet.nodes[0]
        .api()
        .provide(CidList::from(Vec::<CidArg>::new()), Options::default())
        .unwrap();
}

#[test]
fn find_peer_round_trip() {
    let testnet = Testnet::new(5);
    let target = &testnet.nodes[4];
    let input = target.peer_id().to_base58();

    let response = testnet.nodes[0].api().find_peer(input.as_str()).unwrap();

    assert_eq!(response.responses.len(), 1);
    assert_eq!(response.responses[0].id, input);
    assert_eq!(
        response.responses[0].addresses,
        target
            .addresses()
            .iter()
            .map(|address| address.to_string())
            .collect::<Vec<_>>()
    );
}

#[test]
fn find_peer_unknown() {
    let testnet = Testnet::new(2);
    let unknown = PeerId::random();

    let error = testnet.nodes[0].api().find_peer(unknown).unwrap_err();

    assert_eq!(
        error
            .collaborator()
            .and_then(|inner| inner.downcast_ref::<TestnetError>()),
        Some(&TestnetError::PeerNotFound(unknown))
    );
}

#[test]
fn query_closest_peers() {
    let testnet = Testnet::new(25);
    let api = testnet.nodes[0].api();
    let target = testnet.nodes[12].peer_id();

    let closest = api.query(target.to_base58()).unwrap();

    assert_eq!(closest.len(), 20);
    assert_eq!(closest[0].id, target.to_base58());

    let error = api.query("Qm-not-a-peer").unwrap_err();
    assert_eq!(error.code(), "ERR_INVALID_PEER_ID");
}
