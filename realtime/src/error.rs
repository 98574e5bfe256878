//! Error types for the realtime layer.
//!
//! Neither error ever leaves the connection it happened on: a
//! `TransportError` deregisters that one connection, a `DecodeError`
//! discards that one frame.
use std::error::Error as StdError;
use std::fmt;

/// Read, write or close failure on a single client connection.
#[derive(Debug)]
pub struct TransportError {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: TransportErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    // The transport rejected a write
    Write,
    // The client did not accept a write before the deadline
    Timeout,
    // The connection is already closed
    Closed,
}

impl TransportError {
    pub fn new(error_kind: TransportErrorKind) -> Self {
        Self {
            source: None,
            error_kind,
        }
    }

    pub fn with_source<E>(error_kind: TransportErrorKind, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            source: Some(Box::new(source)),
            error_kind,
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "Transport Error ({:?}): {source}", self.error_kind),
            None => write!(f, "Transport Error ({:?})", self.error_kind),
        }
    }
}

impl StdError for TransportError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

/// A client frame that cannot be routed.
#[derive(Debug)]
pub struct DecodeError {
    pub source: Option<serde_json::Error>,
    pub error_kind: DecodeErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeErrorKind {
    // Not a JSON object
    Malformed,
    // No string "type" field
    MissingType,
    // "type" names no known envelope kind
    UnknownType(String),
    // A debug frame without a string "content" or "message" field
    MissingContent,
}

impl DecodeError {
    pub fn new(error_kind: DecodeErrorKind) -> Self {
        Self {
            source: None,
            error_kind,
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            DecodeErrorKind::Malformed => match &self.source {
                Some(source) => write!(f, "invalid message format: {source}"),
                None => write!(f, "invalid message format: expected a JSON object"),
            },
            DecodeErrorKind::MissingType => write!(f, "message type missing or invalid"),
            DecodeErrorKind::UnknownType(kind) => write!(f, "unknown message type: {kind}"),
            DecodeErrorKind::MissingContent => {
                write!(f, "debug message has no string content")
            }
        }
    }
}

impl StdError for DecodeError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        Self {
            source: Some(err),
            error_kind: DecodeErrorKind::Malformed,
        }
    }
}
