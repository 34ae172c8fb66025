#![doc = include_str!("../README.md")]
//! ## Feature flags
#![doc = document_features::document_features!()]
//!

mod api;
#[cfg(feature = "async")]
pub mod async_api;
mod common;
mod config;
mod error;
mod fan_out;
pub mod routing;
pub mod testnet;

pub use crate::common::{
    CidArg, CidList, ClosestPeer, FindPeerResponse, KeyArg, Options, PeerArg, PeerRecord,
    PeerResponse,
};
pub use api::{DhtApi, DhtApiBuilder};
pub use config::{Config, DEFAULT_FAN_OUT};
pub use error::Error;

pub use bytes::Bytes;
pub use cid::Cid;
pub use libp2p_identity::PeerId;
pub use multiaddr::Multiaddr;

/// Alias for `Result` with the crate's [Error] type.
pub type Result<T, E = Error> = std::result::Result<T, E>;
