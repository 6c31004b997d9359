pub type Result<T, E = EntityError> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum EntityError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },
    #[error("{caller} may not modify {kind} {id}")]
    Forbidden {
        kind: &'static str,
        id: String,
        caller: String,
    },
    #[error("Reference does not resolve: {0}")]
    InvalidReference(String),
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
    #[error("Unrecognised {kind} status: {value:?}")]
    InvalidStatus { kind: &'static str, value: String },
    #[error("Status may not move from {from} to {to}")]
    IllegalTransition { from: &'static str, to: &'static str },
    #[error("{kind} {id} has no snapshot for version {version}")]
    VersionNotFound {
        kind: &'static str,
        id: String,
        version: u32,
    },
    /// `collision` marks an edit refused because version `version` already has a snapshot.
    #[error("Concurrent write on {id} at version {version}")]
    VersionConflict {
        id: String,
        version: u32,
        collision: bool,
    },
    #[error("Snapshot {id} failed its digest check")]
    Corrupted { id: String },
    #[error("Storage failure: {0}")]
    Storage(#[from] sled::Error),
    #[error("Failed to encode record: {0}")]
    Encoding(String),
    #[error("Failed to decode record: {0}")]
    Decoding(#[from] minicbor::decode::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EntityError {
    /// Only a lost compare-and-swap race is worth retrying unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EntityError::VersionConflict {
                collision: false,
                ..
            }
        )
    }
}

impl<E: std::fmt::Display> From<minicbor::encode::Error<E>> for EntityError {
    fn from(value: minicbor::encode::Error<E>) -> Self {
        EntityError::Encoding(value.to_string())
    }
}
