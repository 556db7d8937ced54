// SPDX-License-Identifier: Apache-2.0

//! Audit Pipeline
//!
//! Orchestrates one audit call:
//! 1. Resolve the target database and decode its password
//! 2. Run the safety gates (critical DDL, then malformed ALTER)
//! 3. Otherwise send the batch to the review engine, either in one review
//!    pass or as split discovery followed by one review per piece

use std::sync::Arc;

use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use super::envelope::{build_envelope, EnvelopeMode};
use super::safety::SafetyEngine;
use super::types::{AuditReport, AuditResultRow, StatementBatch, Verdict};
use crate::config::GatewayConfig;
use crate::engine::error::{GatewayError, GatewayResult};
use crate::engine::traits::StatementExecutor;
use crate::engine::types::{Row, Value};
use crate::vault::credentials::TargetDatabase;
use crate::vault::storage::TargetDirectory;

/// Column of a split discovery row holding the re-split statement
const SPLIT_SQL_COLUMN: usize = 1;

/// The gateway entry point
pub struct AuditGateway {
    executor: Arc<dyn StatementExecutor>,
    directory: Arc<dyn TargetDirectory>,
}

impl AuditGateway {
    pub fn new(executor: Arc<dyn StatementExecutor>, directory: Arc<dyn TargetDirectory>) -> Self {
        Self {
            executor,
            directory,
        }
    }

    /// Audits `statements` against the database registered as `target_name`.
    ///
    /// `Ok` carries one row per statement (gate rejection) or the engine's
    /// rows. Any failed round trip fails the whole call; partial results are
    /// never returned.
    pub async fn audit(
        &self,
        config: &GatewayConfig,
        statements: &str,
        target_name: &str,
        split: bool,
    ) -> GatewayResult<AuditReport> {
        let audit_id = Uuid::new_v4();
        let span = info_span!("audit", %audit_id, target = target_name, split);

        async move {
            let target = self.resolve_target(target_name)?;
            let batch = StatementBatch::new(statements);

            let safety = SafetyEngine::from_config(config);
            if let Some(rejection) = safety.check(&batch) {
                return Ok(AuditReport::new(
                    audit_id,
                    target_name,
                    rejection.gate.verdict(),
                    rejection.rows,
                ));
            }

            let (verdict, rows) = if split {
                (Verdict::SplitReviewed, self.split_review(config, &target, &batch).await?)
            } else {
                (Verdict::Reviewed, self.review(config, &target, &batch).await?)
            };

            info!(rows = rows.len(), "Audit completed by review engine");
            Ok(AuditReport::new(audit_id, target_name, verdict, rows))
        }
        .instrument(span)
        .await
    }

    fn resolve_target(&self, name: &str) -> GatewayResult<TargetDatabase> {
        let record = self
            .directory
            .lookup(name)?
            .ok_or_else(|| GatewayError::target_not_found(name))?;
        record.resolve()
    }

    /// Single pass: the whole batch in one review envelope
    async fn review(
        &self,
        config: &GatewayConfig,
        target: &TargetDatabase,
        batch: &StatementBatch,
    ) -> GatewayResult<Vec<AuditResultRow>> {
        let rows = self
            .send(config, target, EnvelopeMode::Review, batch.raw())
            .await?;
        to_result_rows(&rows)
    }

    /// Two passes: let the engine re-split the batch, then review each piece
    /// in order so results line up with how the pieces will later execute.
    async fn split_review(
        &self,
        config: &GatewayConfig,
        target: &TargetDatabase,
        batch: &StatementBatch,
    ) -> GatewayResult<Vec<AuditResultRow>> {
        let split_rows = self
            .send(config, target, EnvelopeMode::SplitDiscovery, batch.raw())
            .await?;
        let pieces = split_statements(&split_rows)?;
        debug!(
            submitted = batch.len(),
            pieces = pieces.len(),
            "Engine re-split batch"
        );

        let mut flattened = Vec::with_capacity(pieces.len());
        for piece in &pieces {
            let rows = self
                .send(config, target, EnvelopeMode::SplitReview, piece)
                .await?;
            flattened.extend(to_result_rows(&rows)?);
        }

        Ok(flattened)
    }

    async fn send(
        &self,
        config: &GatewayConfig,
        target: &TargetDatabase,
        mode: EnvelopeMode,
        body: &str,
    ) -> GatewayResult<Vec<Row>> {
        let envelope = build_envelope(target, mode, body);
        debug!(
            mode = mode.as_str(),
            executor = self.executor.executor_id(),
            bytes = envelope.len(),
            "Sending envelope to review engine"
        );
        self.executor
            .fetch_all(&config.inception_endpoint(), &envelope)
            .await
    }
}

fn to_result_rows(rows: &[Row]) -> GatewayResult<Vec<AuditResultRow>> {
    rows.iter().map(AuditResultRow::from_engine_row).collect()
}

fn split_statements(rows: &[Row]) -> GatewayResult<Vec<String>> {
    rows.iter()
        .enumerate()
        .map(|(idx, row)| match row.get(SPLIT_SQL_COLUMN) {
            Some(value) if *value != Value::Null => Ok(value.to_text()),
            _ => Err(GatewayError::malformed_response(format!(
                "split row {} has no statement in column {}",
                idx, SPLIT_SQL_COLUMN
            ))),
        })
        .collect()
}
