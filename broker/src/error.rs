//! Error types for the `broker` crate.
use std::error::Error as StdError;
use std::fmt;

/// Failure talking to the messaging backend.
///
/// Every kind except `Config` is treated as transient by callers: publishers
/// log and carry on, the fan-out loop logs and retries its receive.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    // Broker address could not be parsed
    Config,
    // Broker unreachable or connection lost
    Connection,
    // Broker refused or failed a publish
    Publish,
    // A single receive failed (undecodable payload, subscriber lagged)
    Receive,
    // The inbound stream ended
    Closed,
}

impl Error {
    pub fn new(error_kind: ErrorKind) -> Self {
        Self {
            source: None,
            error_kind,
        }
    }

    pub fn with_source<E>(error_kind: ErrorKind, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            source: Some(Box::new(source)),
            error_kind,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.error_kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "Broker Error ({:?}): {source}", self.error_kind),
            None => write!(f, "Broker Error ({:?})", self.error_kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}
