#![forbid(unsafe_code)]

use ns_core::InvariantViolation;
use ns_core::ids::NodeId;

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Sql(rusqlite::Error),
    InvalidInput(&'static str),
    UnknownNode(NodeId),
    InvariantViolation(InvariantViolation),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Sql(err) => write!(f, "sqlite: {err}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::UnknownNode(id) => write!(f, "unknown node (id={id})"),
            Self::InvariantViolation(violation) => write!(f, "invariant violation: {violation}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Sql(err) => Some(err),
            Self::InvariantViolation(violation) => Some(violation),
            Self::InvalidInput(_) | Self::UnknownNode(_) => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sql(value)
    }
}

impl From<InvariantViolation> for StoreError {
    fn from(value: InvariantViolation) -> Self {
        Self::InvariantViolation(value)
    }
}
