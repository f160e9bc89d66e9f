use alloy_primitives::B256;
use tessera_core::{Duty, DutyType, PubKey};
use thiserror::Error;

/// Failure of a blocking lookup in one of the await ports.
#[derive(Error, Debug)]
pub enum AwaitError {
    #[error("Await cancelled")]
    Cancelled,

    #[error("Await store closed")]
    Closed,

    #[error("A different value was already stored for this key")]
    Mismatch,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("{0} not registered")]
    MissingCollaborator(&'static str),

    #[error("{0} already registered")]
    AlreadyRegistered(&'static str),

    #[error("Unsupported duty type: {0}")]
    UnsupportedDutyType(DutyType),

    #[error("Definition of {pubkey} is not a {expected} duty")]
    UnexpectedDefinition {
        pubkey: PubKey,
        expected: &'static str,
    },

    #[error("Signed data of {pubkey} for duty {duty} is {actual}, expected {expected}")]
    UnexpectedSignedData {
        duty: Duty,
        pubkey: PubKey,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("aggregate attestation not found by root (retryable): {root}")]
    AggregateNotFound { root: B256 },

    #[error("{context}: {source:#}")]
    Provider {
        context: &'static str,
        source: anyhow::Error,
    },

    #[error("{context}: {source}")]
    Await {
        context: &'static str,
        source: AwaitError,
    },

    #[error("{context}: {source}")]
    Context {
        context: &'static str,
        source: Box<FetchError>,
    },

    #[error("Fetch cancelled")]
    Cancelled,

    #[error(transparent)]
    Subscriber(anyhow::Error),
}

impl FetchError {
    pub fn provider(context: &'static str) -> impl FnOnce(anyhow::Error) -> FetchError {
        move |source| FetchError::Provider { context, source }
    }

    pub fn await_failed(context: &'static str) -> impl FnOnce(AwaitError) -> FetchError {
        move |source| match source {
            AwaitError::Cancelled => FetchError::Cancelled,
            source => FetchError::Await { context, source },
        }
    }

    /// Wraps the error with call-site context. Cancellation is left as is.
    pub fn context(self, context: &'static str) -> FetchError {
        match self {
            FetchError::Cancelled => FetchError::Cancelled,
            source => FetchError::Context {
                context,
                source: Box::new(source),
            },
        }
    }

    /// Whether retrying the same duty may succeed once upstream state catches up.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::AggregateNotFound { .. } => true,
            FetchError::Context { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}
