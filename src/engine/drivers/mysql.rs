//! MySQL Executor
//!
//! Implements the StatementExecutor trait over the MySQL wire protocol using
//! SQLx. The review engine speaks this protocol, so the same executor serves
//! both the engine endpoint and plain MySQL targets.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlRow, MySqlSslMode};
use sqlx::{ConnectOptions, Connection, Executor, Row};
use tracing::{debug, error, warn};

use crate::engine::error::{GatewayError, GatewayResult};
use crate::engine::traits::StatementExecutor;
use crate::engine::types::{Endpoint, Row as GRow, Value};

const CHARSET: &str = "utf8mb4";

/// MySQL executor implementation
pub struct MySqlExecutor {
    round_trip_timeout: Option<Duration>,
}

impl MySqlExecutor {
    /// Bounds every call (connect, execute and fetch) by `timeout`; `None`
    /// leaves hang behaviour to the transport.
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self {
            round_trip_timeout: timeout,
        }
    }

    /// Builds connect options from an endpoint
    ///
    /// Session initialisation statements are switched off: the review engine
    /// rejects anything that is not a directive envelope.
    fn build_connect_options(endpoint: &Endpoint) -> MySqlConnectOptions {
        let mut options = MySqlConnectOptions::new()
            .host(&endpoint.host)
            .port(endpoint.port)
            .username(&endpoint.user)
            .password(endpoint.password.expose())
            .charset(CHARSET)
            .ssl_mode(MySqlSslMode::Disabled)
            .pipes_as_concat(false)
            .no_engine_substitution(false)
            .timezone(None::<String>)
            .set_names(false)
            .disable_statement_logging();

        if let Some(db) = endpoint.database.as_deref().filter(|db| !db.is_empty()) {
            options = options.database(db);
        }

        options
    }

    /// Converts a SQLx row to our positional Row type
    fn convert_row(mysql_row: &MySqlRow) -> GRow {
        let values: Vec<Value> = (0..mysql_row.len())
            .map(|idx| Self::extract_value(mysql_row, idx))
            .collect();

        GRow { values }
    }

    /// Extracts a value from a MySqlRow at the given index
    fn extract_value(row: &MySqlRow, idx: usize) -> Value {
        if let Ok(v) = row.try_get::<Option<u64>, _>(idx) {
            return v.map(Self::unsigned_value).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
            return v.map(Value::Int).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<i32>, _>(idx) {
            return v.map(|i| Value::Int(i64::from(i))).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<u32>, _>(idx) {
            return v.map(|u| Value::Int(i64::from(u))).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
            return v.map(Value::Float).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
            return v.map(Value::Text).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(idx) {
            return v.map(Value::Bytes).unwrap_or(Value::Null);
        }

        Value::Null
    }

    /// BIGINT UNSIGNED past `i64::MAX` is kept as text rather than wrapped
    fn unsigned_value(u: u64) -> Value {
        i64::try_from(u)
            .map(Value::Int)
            .unwrap_or_else(|_| Value::Text(u.to_string()))
    }

    fn map_connect_error(err: sqlx::Error) -> GatewayError {
        let msg = err.to_string();
        if msg.contains("Access denied") {
            GatewayError::auth_failed(msg)
        } else {
            GatewayError::connection_failed(msg)
        }
    }

    async fn round_trip(endpoint: &Endpoint, sql: &str) -> GatewayResult<Vec<GRow>> {
        let mut conn = Self::build_connect_options(endpoint)
            .connect()
            .await
            .map_err(Self::map_connect_error)?;

        let result = Executor::fetch_all(&mut conn, sqlx::raw_sql(sql)).await;

        // Released whether or not the statement succeeded
        if let Err(e) = conn.close().await {
            warn!(endpoint = %endpoint.address(), "Failed to close connection cleanly: {}", e);
        }

        let mysql_rows = result.map_err(|e| GatewayError::execution_error(e.to_string()))?;
        Ok(mysql_rows.iter().map(Self::convert_row).collect())
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[async_trait]
impl StatementExecutor for MySqlExecutor {
    fn executor_id(&self) -> &'static str {
        "mysql"
    }

    async fn fetch_all(&self, endpoint: &Endpoint, sql: &str) -> GatewayResult<Vec<GRow>> {
        let start = Instant::now();

        let result = match self.round_trip_timeout {
            Some(limit) => tokio::time::timeout(limit, Self::round_trip(endpoint, sql))
                .await
                .unwrap_or_else(|_| Err(GatewayError::timeout(millis(limit)))),
            None => Self::round_trip(endpoint, sql).await,
        };

        let elapsed_ms = millis(start.elapsed());
        match &result {
            Ok(rows) => debug!(
                endpoint = %endpoint.address(),
                rows = rows.len(),
                elapsed_ms,
                "Round trip completed"
            ),
            Err(e) => error!(
                endpoint = %endpoint.address(),
                elapsed_ms,
                "Round trip failed: {}",
                e
            ),
        }

        result
    }
}
