//! AsyncDhtApi command surface.

use std::thread;

use bytes::Bytes;

use crate::{
    api::DhtApi,
    common::{CidArg, CidList, ClosestPeer, FindPeerResponse, KeyArg, Options, PeerArg, PeerRecord},
    Error, Result,
};

impl DhtApi {
    /// Return an async version of the DhtApi.
    pub fn as_async(self) -> AsyncDhtApi {
        AsyncDhtApi(self)
    }
}

#[derive(Debug, Clone)]
/// Async version of the [DhtApi].
///
/// Arguments are validated on the calling task. Collaborator calls then run
/// on a worker thread and the result is awaited without blocking the executor.
pub struct AsyncDhtApi(DhtApi);

impl AsyncDhtApi {
    /// Return the blocking [DhtApi] this wraps.
    pub fn as_blocking(&self) -> &DhtApi {
        &self.0
    }

    // === Public Methods ===

    /// Async version of [DhtApi::get].
    pub async fn get(&self, key: impl Into<KeyArg>, options: Options) -> Result<Bytes> {
        let key = key.into().into_binary()?;

        self.run(move |api| api.get(key, options)).await
    }

    /// Async version of [DhtApi::put].
    pub async fn put(&self, key: impl Into<KeyArg>, value: impl Into<Bytes>) -> Result<()> {
        let key = key.into().into_binary()?;
        let value = value.into();

        self.run(move |api| api.put(key, value)).await
    }

    /// Async version of [DhtApi::find_providers].
    pub async fn find_providers(
        &self,
        key: impl Into<CidArg>,
        options: Options,
    ) -> Result<Vec<PeerRecord>> {
        let cid = key.into().resolve()?;

        self.run(move |api| api.find_providers(cid, options)).await
    }

    /// Async version of [DhtApi::find_peer].
    pub async fn find_peer(&self, peer: impl Into<PeerArg>) -> Result<FindPeerResponse> {
        let peer_id = peer.into().resolve()?;

        self.run(move |api| api.find_peer(peer_id)).await
    }

    /// Async version of [DhtApi::provide].
    pub async fn provide(&self, keys: impl Into<CidList>, options: Options) -> Result<()> {
        let cids = keys.into().resolve()?;

        self.run(move |api| api.provide(cids, options)).await
    }

    /// Async version of [DhtApi::query].
    pub async fn query(&self, peer: impl Into<PeerArg>) -> Result<Vec<ClosestPeer>> {
        let peer_id = peer.into().resolve()?;

        self.run(move |api| api.query(peer_id)).await
    }

    // === Private Methods ===

    async fn run<T, F>(&self, operation: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&DhtApi) -> Result<T> + Send + 'static,
    {
        let (sender, receiver) = flume::bounded::<Result<T>>(1);
        let api = self.0.clone();

        thread::spawn(move || {
            let _ = sender.send(operation(&api));
        });

        receiver.recv_async().await.map_err(|_| Error::Interrupted)?
    }
}
