//! Main Crate Error

use crate::routing::BoxError;

#[derive(thiserror::Error, Debug)]
/// dht-api crate error enum.
pub enum Error {
    /// A key passed to `get` or `put` was text instead of binary.
    #[error("Invalid key: {0}")]
    InvalidKey(&'static str),

    /// A content identifier string could not be parsed.
    ///
    /// Retrying with the same input will never succeed.
    #[error("Invalid CID: {0}")]
    InvalidCid(#[from] cid::Error),

    /// A Base58 peer identifier string could not be parsed.
    #[error("Invalid peer id: {0}")]
    InvalidPeerId(#[from] libp2p_identity::ParseError),

    /// One or more blocks requested in [crate::DhtApi::provide] are not in the local block store.
    #[error("Block(s) not found locally, cannot provide")]
    NotFoundLocally,

    /// The requested option can't be honoured by the injected collaborators.
    #[error("{0} is not supported")]
    Unsupported(&'static str),

    /// Error returned as-is by one of the collaborators (DHT, routing or block store).
    #[error(transparent)]
    Collaborator(BoxError),

    /// Indicates that the builder is missing one of the required collaborators.
    #[error("{0} is required")]
    MissingCollaborator(&'static str),

    /// The worker running an async operation was dropped before sending a response.
    #[error("Operation was dropped before sending a response")]
    Interrupted,
}

impl Error {
    /// Stable code for callers that need to branch on the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidKey(_) => "ERR_INVALID_KEY",
            Error::InvalidCid(_) => "ERR_INVALID_CID",
            Error::InvalidPeerId(_) => "ERR_INVALID_PEER_ID",
            Error::NotFoundLocally => "ERR_NOT_FOUND",
            Error::Unsupported(_) => "ERR_NOT_SUPPORTED",
            Error::Collaborator(_) => "ERR_COLLABORATOR",
            Error::MissingCollaborator(_) => "ERR_MISSING_COLLABORATOR",
            Error::Interrupted => "ERR_INTERRUPTED",
        }
    }

    /// Returns the untouched collaborator error, if this is one.
    ///
    /// Use [std::error::Error::downcast_ref] on the result to recover the concrete type.
    pub fn collaborator(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Error::Collaborator(error) => Some(error.as_ref()),
            _ => None,
        }
    }
}
