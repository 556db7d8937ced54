//! Target database records
//!
//! A record as it sits in configuration storage (password base64-encoded)
//! and the decoded descriptor used for a single audit call.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use crate::engine::error::{GatewayError, GatewayResult};
use crate::observability::Sensitive;

/// A stored target database entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfigRecord {
    /// Logical name used to look the record up
    pub name: String,
    pub master_host: String,
    pub master_port: u16,
    #[serde(default)]
    pub slave_host: Option<String>,
    #[serde(default)]
    pub slave_port: Option<u16>,
    pub username: String,
    /// Base64 of the UTF-8 password
    pub password: String,
}

/// Decoded connection descriptor for the database under review
#[derive(Debug, Clone)]
pub struct TargetDatabase {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: Sensitive<String>,
}

impl DbConfigRecord {
    /// Decodes the stored password and returns the master-side descriptor
    pub fn resolve(&self) -> GatewayResult<TargetDatabase> {
        let raw = STANDARD.decode(self.password.trim()).map_err(|e| {
            GatewayError::credential_decode(format!(
                "password for '{}' is not valid base64: {}",
                self.name, e
            ))
        })?;
        let password = String::from_utf8(raw).map_err(|_| {
            GatewayError::credential_decode(format!("password for '{}' is not UTF-8", self.name))
        })?;

        Ok(TargetDatabase {
            name: self.name.clone(),
            host: self.master_host.clone(),
            port: self.master_port,
            username: self.username.clone(),
            password: Sensitive::new(password),
        })
    }

    /// Encodes a plaintext password the way records store it
    pub fn encode_password(plain: &str) -> String {
        STANDARD.encode(plain.as_bytes())
    }
}
