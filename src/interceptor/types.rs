//! Interceptor Types
//!
//! Result shapes shared by the local gates and the review engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::error::{GatewayError, GatewayResult};
use crate::engine::types::Row;

/// Severity reported for one statement
///
/// Locally only `OK` and `REJECTED` are produced. Levels coming back from
/// the review engine pass through unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorLevel(pub i64);

impl ErrorLevel {
    pub const OK: Self = Self(0);
    pub const REJECTED: Self = Self(2);

    pub fn is_ok(&self) -> bool {
        *self == Self::OK
    }
}

/// One row of audit output, one per statement
///
/// The field order is the review engine's column order, so rows built by the
/// local gates and rows returned by the engine can be handled the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditResultRow {
    pub stage: String,
    pub stage_status: String,
    pub error_level: ErrorLevel,
    pub error_message: String,
    pub query_tree_summary: String,
    /// Affected rows from the engine, or the statement echoed by a local gate
    pub statement: String,
    pub sql_text: String,
    pub extra1: String,
    pub extra2: String,
    pub extra3: String,
    /// Engine columns past the tenth (e.g. the statement checksum used for
    /// progress tracking); always empty for gate rows
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_columns: Vec<String>,
}

const NO_DETAIL: &str = "None";

impl AuditResultRow {
    pub const FIELD_COUNT: usize = 10;

    /// Row for a statement a gate let through
    pub fn passed(statement: impl Into<String>) -> Self {
        Self {
            error_level: ErrorLevel::OK,
            query_tree_summary: NO_DETAIL.to_string(),
            statement: statement.into(),
            ..Default::default()
        }
    }

    /// Row for a statement a gate rejected
    pub fn rejected(
        statement: impl Into<String>,
        message: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            error_level: ErrorLevel::REJECTED,
            error_message: message.into(),
            query_tree_summary: detail.into(),
            statement: statement.into(),
            ..Default::default()
        }
    }

    /// Maps an engine row onto the fixed shape by position.
    ///
    /// Missing trailing columns become empty strings and columns past the
    /// tenth are kept in `extra_columns`. Column 2 must hold an integer
    /// error level.
    pub fn from_engine_row(row: &Row) -> GatewayResult<Self> {
        let text = |idx: usize| row.get(idx).map(|v| v.to_text()).unwrap_or_default();

        let error_level = row
            .get(2)
            .and_then(|v| v.as_i64())
            .map(ErrorLevel)
            .ok_or_else(|| {
                GatewayError::malformed_response(format!(
                    "engine row has no integer error level in column 2 ({} columns)",
                    row.values.len()
                ))
            })?;

        Ok(Self {
            stage: text(0),
            stage_status: text(1),
            error_level,
            error_message: text(3),
            query_tree_summary: text(4),
            statement: text(5),
            sql_text: text(6),
            extra1: text(7),
            extra2: text(8),
            extra3: text(9),
            extra_columns: row
                .values
                .iter()
                .skip(Self::FIELD_COUNT)
                .map(|v| v.to_text())
                .collect(),
        })
    }
}

/// A raw multi-statement submission
///
/// Splitting is plain `;` splitting after trailing separators are removed.
/// It is not quote or comment aware; the review engine splits the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementBatch {
    raw: String,
}

impl StatementBatch {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// The batch exactly as submitted
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn statements(&self) -> impl Iterator<Item = &str> {
        self.raw.trim_end_matches(';').split(';')
    }

    pub fn len(&self) -> usize {
        self.statements().count()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.trim_end_matches(';').is_empty()
    }
}

/// Which checkpoint produced the rows of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    RejectedCriticalDdl,
    RejectedMalformedAlter,
    Reviewed,
    SplitReviewed,
}

impl Verdict {
    /// True when a local gate stopped the batch before the engine saw it
    pub fn is_local_rejection(&self) -> bool {
        matches!(self, Self::RejectedCriticalDdl | Self::RejectedMalformedAlter)
    }
}

/// Outcome of one completed audit call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub audit_id: Uuid,
    pub audited_at: DateTime<Utc>,
    /// Logical name of the target database
    pub target: String,
    pub verdict: Verdict,
    pub rows: Vec<AuditResultRow>,
}

impl AuditReport {
    pub fn new(audit_id: Uuid, target: &str, verdict: Verdict, rows: Vec<AuditResultRow>) -> Self {
        Self {
            audit_id,
            audited_at: Utc::now(),
            target: target.to_string(),
            verdict,
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn max_error_level(&self) -> ErrorLevel {
        self.rows
            .iter()
            .map(|r| r.error_level)
            .max()
            .unwrap_or(ErrorLevel::OK)
    }
}
