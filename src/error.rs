use std::io;

use http::status::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Error as JsonError;
use thiserror::Error;

use crate::{codec::RecordKind, model::Domain, store::StoreError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Declared {domain} type '{declared}' does not match payload kind '{actual}'")]
    DiscriminatorMismatch {
        domain: Domain,
        declared: String,
        actual: String,
    },
    #[error("Envelope carries neither an id nor a payload")]
    EmptyEnvelope,
    #[error("File System error: {0}")]
    Io(String),
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),
    #[error("Malformed {kind} payload: {reason}")]
    MalformedPayload { kind: String, reason: String },
    #[error("Missing required field '{0}'")]
    MissingRequiredField(String),
    #[error("{kind} '{id}' not found")]
    ReferenceNotFound { kind: RecordKind, id: String },
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
    #[error("Graph store error: {0}")]
    Store(String),
    #[error("Unsupported {domain} type '{value}'")]
    UnsupportedDiscriminator { domain: Domain, value: String },
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::DiscriminatorMismatch { .. } => StatusCode::BAD_REQUEST,
            RelayError::EmptyEnvelope => StatusCode::BAD_REQUEST,
            RelayError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::MalformedEnvelope(_) => StatusCode::BAD_REQUEST,
            RelayError::MalformedPayload { .. } => StatusCode::BAD_REQUEST,
            RelayError::MissingRequiredField(_) => StatusCode::BAD_REQUEST,
            RelayError::ReferenceNotFound { .. } => StatusCode::NOT_FOUND,
            RelayError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::UnsupportedDiscriminator { .. } => StatusCode::BAD_REQUEST,
        }
    }

    /// True for errors caused by the request rather than by the service.
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl From<toml::de::Error> for RelayError {
    fn from(src: toml::de::Error) -> RelayError {
        RelayError::Config(format!("Toml deserialization error: {src}"))
    }
}

impl From<JsonError> for RelayError {
    fn from(src: JsonError) -> RelayError {
        RelayError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<io::Error> for RelayError {
    fn from(x: io::Error) -> Self {
        RelayError::Io(format!("IOError: {}: {x}", x.kind()))
    }
}

impl From<StoreError> for RelayError {
    fn from(x: StoreError) -> Self {
        match x {
            StoreError::NotFound { kind, id } => RelayError::ReferenceNotFound { kind, id },
            other => RelayError::Store(other.to_string()),
        }
    }
}
