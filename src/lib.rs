// inception-gate - SQL audit gateway in front of the Inception review engine
// Core library

pub mod config;
pub mod engine;
pub mod interceptor;
pub mod observability;
pub mod vault;

pub use config::GatewayConfig;
pub use engine::{GatewayError, GatewayResult, StatementExecutor};
pub use interceptor::{AuditGateway, AuditReport, AuditResultRow, ErrorLevel, Verdict};
