use thiserror::Error;

use autoshop_service_orders::{LookupError, SubmitError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(String),
    #[error("API error ({0}): {1}")]
    Api(u16, String),
    #[error("parse error: {0}")]
    Parse(String),
}

impl ClientError {
    pub(crate) fn network(err: reqwest::Error) -> Self {
        ClientError::Network(err.to_string())
    }

    pub(crate) fn parse(err: impl std::fmt::Display) -> Self {
        ClientError::Parse(err.to_string())
    }
}

impl From<ClientError> for LookupError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Network(message) => LookupError::Transport(message),
            ClientError::Api(status, message) => LookupError::Backend { status, message },
            ClientError::Parse(message) => LookupError::Parse(message),
        }
    }
}

impl From<ClientError> for SubmitError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Network(message) | ClientError::Parse(message) => {
                SubmitError::Transport(message)
            }
            ClientError::Api(status, message) => SubmitError::Rejected {
                status,
                message: Some(message).filter(|m| !m.trim().is_empty()),
            },
        }
    }
}
