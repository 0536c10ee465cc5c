//! Error
//!
//! This module provides the errors shared by the number service, its clients
//! and the game session recorder, with [`thiserror`]
//!
use std::io;
use thiserror::Error;

/// Result use the [`NumgenError`] as error.
pub type Result<T> = std::result::Result<T, NumgenError>;

/// NumgenError is the specific error for this crate
#[derive(Error, Debug)]
pub enum NumgenError {
    #[error("io error {0}")]
    /// IO relevant errors
    IOError(#[from] io::Error),
    #[error("serde error {0}")]
    /// Serialized or Deserialized errors
    SerdeError(#[from] serde_json::Error),

    /// A difficulty label outside of easy, medium and hard
    #[error("unknown difficulty '{0}'")]
    InvalidDifficulty(String),

    /// The service answered with an explicit error reply
    #[error("service error: {0}")]
    ServiceError(String),

    /// HTTP transport failure, including non-2xx statuses
    #[error("http error: {0}")]
    HttpError(String),

    /// The reply could not be understood as a number pair
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The service did not answer within the configured timeout
    #[error("timed out waiting for the number service")]
    Timeout,

    /// The client was used after [`crate::NumberSource::close`]
    #[error("client is closed")]
    ClientClosed,

    /// The session store could not be updated
    #[error("session store error: {0}")]
    SessionError(String),
}

impl NumgenError {
    /// Whether another attempt could succeed.
    ///
    /// Only transport level failures are retried; a rejected label will be
    /// rejected again.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            NumgenError::InvalidDifficulty(_)
                | NumgenError::ServiceError(_)
                | NumgenError::ClientClosed
                | NumgenError::SessionError(_)
        )
    }
}
