//! Audit Interceptor
//!
//! Everything between a submitted SQL batch and the review engine:
//! - **Safety gates**: local rejection of statements the engine cannot safely review
//! - **Envelope**: the directive-wrapped payload the engine consumes
//! - **Pipeline**: gate chain, review and split-review orchestration

pub mod envelope;
pub mod pipeline;
pub mod safety;
pub mod types;

pub use envelope::{build_envelope, EnvelopeMode};
pub use pipeline::AuditGateway;
pub use safety::{is_bare_alter_table, is_critical_ddl, GateRejection, SafetyEngine, SafetyGate};
pub use types::*;
