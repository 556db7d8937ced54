// SPDX-License-Identifier: Apache-2.0

//! Normalized error types for the audit gateway
//!
//! Driver, directory and configuration failures are all mapped to these
//! variants so callers get one consistent error surface.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all gateway operations
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum GatewayError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Statement execution error: {message}")]
    ExecutionError { message: String },

    #[error("Round trip timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Target database not found: {name}")]
    TargetNotFound { name: String },

    #[error("Stored credential could not be decoded: {message}")]
    CredentialDecode { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Malformed engine response: {message}")]
    MalformedEngineResponse { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl GatewayError {
    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::ConnectionFailed { message: msg.into() }
    }

    pub fn auth_failed(msg: impl Into<String>) -> Self {
        Self::AuthenticationFailed { message: msg.into() }
    }

    pub fn execution_error(msg: impl Into<String>) -> Self {
        Self::ExecutionError { message: msg.into() }
    }

    pub fn timeout(timeout_ms: u64) -> Self {
        Self::Timeout { timeout_ms }
    }

    pub fn target_not_found(name: impl Into<String>) -> Self {
        Self::TargetNotFound { name: name.into() }
    }

    pub fn credential_decode(msg: impl Into<String>) -> Self {
        Self::CredentialDecode { message: msg.into() }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config { message: msg.into() }
    }

    pub fn malformed_response(msg: impl Into<String>) -> Self {
        Self::MalformedEngineResponse { message: msg.into() }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal { message: msg.into() }
    }

    /// True when the failure happened while talking to the downstream engine
    /// (as opposed to a local lookup or configuration problem).
    pub fn is_downstream(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. }
                | Self::AuthenticationFailed { .. }
                | Self::ExecutionError { .. }
                | Self::Timeout { .. }
                | Self::MalformedEngineResponse { .. }
        )
    }
}

/// Result type alias for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;
