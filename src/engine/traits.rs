//! StatementExecutor trait definition
//!
//! The single capability the gateway needs from a database client: send one
//! statement string to an endpoint and get every row back.

use async_trait::async_trait;

use crate::engine::error::GatewayResult;
use crate::engine::types::{Endpoint, Row};

/// Fire-once statement execution against an endpoint
///
/// Implementations open a connection per call, run exactly one statement
/// string (which may be a multi-statement envelope understood by the
/// engine), fetch all rows and release the connection on every exit path.
/// There is no retry; a failed round trip surfaces as an error.
#[async_trait]
pub trait StatementExecutor: Send + Sync {
    /// Returns the unique identifier for this executor (e.g., "mysql")
    fn executor_id(&self) -> &'static str;

    /// Runs `sql` against `endpoint` and returns the full row set
    async fn fetch_all(&self, endpoint: &Endpoint, sql: &str) -> GatewayResult<Vec<Row>>;
}
