// SPDX-License-Identifier: Apache-2.0

//! Safety Gates
//!
//! Local, network-free checks run over a batch before anything is sent to
//! the review engine. Gates are evaluated in a fixed order and the first one
//! that fires rejects the whole batch.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use super::types::{AuditResultRow, StatementBatch, Verdict};
use crate::config::GatewayConfig;

/// A keyword pair from the set below, followed by whitespace and at least one
/// more non-whitespace character, anywhere in the statement.
static CRITICAL_DDL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)drop\s+database\s+\S|drop\s+table\s+\S|truncate\s+partition\s+\S|truncate\s+table\s+\S",
    )
    .expect("critical DDL pattern is valid")
});

/// `ALTER TABLE <name>` (name optionally `schema.table`) and nothing else.
static BARE_ALTER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*alter\s+table\s+\S+\s*$").expect("bare ALTER pattern is valid")
});

/// True for `DROP DATABASE`, `DROP TABLE`, `TRUNCATE PARTITION` and
/// `TRUNCATE TABLE` statements. The engine can only back up metadata for
/// these, so the data would be unrecoverable.
pub fn is_critical_ddl(statement: &str) -> bool {
    CRITICAL_DDL_PATTERN.is_match(statement)
}

/// True for an `ALTER TABLE` with no option clause. The engine's parser
/// crashes on this shape instead of reporting an error.
pub fn is_bare_alter_table(statement: &str) -> bool {
    BARE_ALTER_PATTERN.is_match(statement)
}

/// Built-in gates, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SafetyGate {
    CriticalDdl,
    MalformedAlter,
}

impl SafetyGate {
    pub fn id(&self) -> &'static str {
        match self {
            Self::CriticalDdl => "critical-ddl",
            Self::MalformedAlter => "malformed-alter",
        }
    }

    pub fn matches(&self, statement: &str) -> bool {
        match self {
            Self::CriticalDdl => is_critical_ddl(statement),
            Self::MalformedAlter => is_bare_alter_table(statement),
        }
    }

    pub fn reject_message(&self) -> &'static str {
        match self {
            Self::CriticalDdl => "reject high-risk SQL",
            Self::MalformedAlter => "SQL syntax error: ALTER must have options",
        }
    }

    pub fn reject_detail(&self) -> &'static str {
        match self {
            Self::CriticalDdl => {
                "must not contain DROP DATABASE, DROP TABLE, TRUNCATE PARTITION or TRUNCATE TABLE"
            }
            Self::MalformedAlter => "ALTER must have options",
        }
    }

    pub fn verdict(&self) -> Verdict {
        match self {
            Self::CriticalDdl => Verdict::RejectedCriticalDdl,
            Self::MalformedAlter => Verdict::RejectedMalformedAlter,
        }
    }

    /// Runs the gate over every statement.
    ///
    /// Returns `None` when nothing matched. Otherwise every statement gets a
    /// row: matches are rejected, the rest are reported as OK. Statements are
    /// echoed lower-cased, as evaluated.
    pub fn evaluate(&self, batch: &StatementBatch) -> Option<Vec<AuditResultRow>> {
        let mut fired = false;
        let rows: Vec<AuditResultRow> = batch
            .statements()
            .map(|statement| {
                let normalized = statement.to_lowercase();
                if self.matches(&normalized) {
                    fired = true;
                    AuditResultRow::rejected(normalized, self.reject_message(), self.reject_detail())
                } else {
                    AuditResultRow::passed(normalized)
                }
            })
            .collect();

        fired.then_some(rows)
    }
}

/// A gate fired; these rows replace the engine's output
#[derive(Debug, Clone)]
pub struct GateRejection {
    pub gate: SafetyGate,
    pub rows: Vec<AuditResultRow>,
}

/// Ordered, short-circuiting gate chain
#[derive(Debug, Clone)]
pub struct SafetyEngine {
    gates: Vec<SafetyGate>,
}

impl SafetyEngine {
    /// The malformed ALTER gate always runs; critical DDL only when enabled.
    pub fn new(critical_ddl_enabled: bool) -> Self {
        let mut gates = Vec::with_capacity(2);
        if critical_ddl_enabled {
            gates.push(SafetyGate::CriticalDdl);
        }
        gates.push(SafetyGate::MalformedAlter);
        Self { gates }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(config.critical_ddl_enabled())
    }

    /// Active gates in evaluation order
    pub fn gates(&self) -> &[SafetyGate] {
        &self.gates
    }

    /// First gate that fires wins
    pub fn check(&self, batch: &StatementBatch) -> Option<GateRejection> {
        for gate in &self.gates {
            if let Some(rows) = gate.evaluate(batch) {
                info!(
                    gate = gate.id(),
                    statements = rows.len(),
                    rejected = rows.iter().filter(|r| !r.error_level.is_ok()).count(),
                    "Safety gate rejected batch"
                );
                return Some(GateRejection { gate: *gate, rows });
            }
            debug!(gate = gate.id(), "Safety gate passed");
        }
        None
    }
}
