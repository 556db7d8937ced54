use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use inception_gate_lib::engine::drivers::mysql::MySqlExecutor;
use inception_gate_lib::engine::types::{Endpoint, Row, Value};
use inception_gate_lib::vault::{DbConfigRecord, JsonDirectory, MemoryDirectory};
use inception_gate_lib::{
    AuditGateway, ErrorLevel, GatewayConfig, GatewayError, GatewayResult, StatementExecutor,
    Verdict,
};

/// Stands in for the review engine: replays canned row sets in order and
/// records every envelope it was sent.
#[derive(Default)]
struct FakeEngine {
    responses: Mutex<VecDeque<GatewayResult<Vec<Row>>>>,
    envelopes: Mutex<Vec<String>>,
}

impl FakeEngine {
    fn with(responses: Vec<GatewayResult<Vec<Row>>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            envelopes: Mutex::new(Vec::new()),
        })
    }

    fn envelopes(&self) -> Vec<String> {
        self.envelopes.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatementExecutor for FakeEngine {
    fn executor_id(&self) -> &'static str {
        "fake"
    }

    async fn fetch_all(&self, _endpoint: &Endpoint, sql: &str) -> GatewayResult<Vec<Row>> {
        self.envelopes.lock().unwrap().push(sql.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::connection_failed("engine unavailable")))
    }
}

fn checked_row(id: i64, level: i64, sql: &str) -> Row {
    Row::new(vec![
        Value::Int(id),
        "CHECKED".into(),
        Value::Int(level),
        "Audit completed".into(),
        "None".into(),
        sql.into(),
        Value::Int(0),
        "'0_0_0'".into(),
        "None".into(),
        "0".into(),
    ])
}

fn orders_record() -> DbConfigRecord {
    DbConfigRecord {
        name: "orders".to_string(),
        master_host: "db-master".to_string(),
        master_port: 3306,
        slave_host: Some("db-replica".to_string()),
        slave_port: Some(3306),
        username: "auditor".to_string(),
        password: DbConfigRecord::encode_password("pw"),
    }
}

fn gateway(engine: Arc<FakeEngine>) -> AuditGateway {
    let directory: MemoryDirectory = [orders_record()].into_iter().collect();
    AuditGateway::new(engine, Arc::new(directory))
}

fn config(critical_ddl: &str) -> GatewayConfig {
    GatewayConfig {
        critical_ddl_on_off: critical_ddl.to_string(),
        ..GatewayConfig::default()
    }
}

#[tokio::test]
async fn drop_table_is_rejected_locally() {
    let engine = FakeEngine::with(vec![]);
    let report = gateway(engine.clone())
        .audit(&config("ON"), "DROP TABLE t1;", "orders", false)
        .await
        .unwrap();

    assert_eq!(report.verdict, Verdict::RejectedCriticalDdl);
    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.rows[0].error_level, ErrorLevel::REJECTED);
    assert_eq!(report.rows[0].error_message, "reject high-risk SQL");
    assert_eq!(report.rows[0].statement, "drop table t1");
    assert!(engine.envelopes().is_empty());
}

#[tokio::test]
async fn critical_batch_reports_every_statement() {
    let engine = FakeEngine::with(vec![]);
    let report = gateway(engine.clone())
        .audit(
            &config("ON"),
            "insert into t values (1);truncate table t;select 1;",
            "orders",
            false,
        )
        .await
        .unwrap();

    let levels: Vec<ErrorLevel> = report.rows.iter().map(|r| r.error_level).collect();
    assert_eq!(levels, vec![ErrorLevel::OK, ErrorLevel::REJECTED, ErrorLevel::OK]);
    assert!(engine.envelopes().is_empty());
}

#[tokio::test]
async fn drop_table_goes_to_engine_when_switch_is_off() {
    let engine = FakeEngine::with(vec![Ok(vec![checked_row(1, 1, "drop table t1")])]);
    let report = gateway(engine.clone())
        .audit(&config("OFF"), "DROP TABLE t1;", "orders", false)
        .await
        .unwrap();

    assert_eq!(report.verdict, Verdict::Reviewed);
    assert_eq!(report.rows[0].error_level, ErrorLevel(1));
    assert_eq!(engine.envelopes().len(), 1);
}

#[tokio::test]
async fn bare_alter_is_rejected_with_either_switch() {
    for switch in ["ON", "OFF"] {
        let engine = FakeEngine::with(vec![]);
        let report = gateway(engine.clone())
            .audit(&config(switch), "ALTER TABLE t1;", "orders", false)
            .await
            .unwrap();

        assert_eq!(report.verdict, Verdict::RejectedMalformedAlter);
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].error_level, ErrorLevel::REJECTED);
        assert!(report.rows[0].error_message.contains("ALTER must have options"));
        assert!(engine.envelopes().is_empty());
    }
}

#[tokio::test]
async fn bare_alter_inside_batch_rejects_only_that_statement() {
    let engine = FakeEngine::with(vec![]);
    let report = gateway(engine.clone())
        .audit(
            &config("OFF"),
            "select 1;alter table test.t1 ;update t set a=1;",
            "orders",
            false,
        )
        .await
        .unwrap();

    assert_eq!(report.verdict, Verdict::RejectedMalformedAlter);
    let levels: Vec<ErrorLevel> = report.rows.iter().map(|r| r.error_level).collect();
    assert_eq!(levels, vec![ErrorLevel::OK, ErrorLevel::REJECTED, ErrorLevel::OK]);
    assert_eq!(report.rows[1].statement, "alter table test.t1 ");
    assert!(report.rows[1].error_message.contains("ALTER must have options"));
    assert!(report.rows[0].error_message.is_empty());
    assert!(report.rows[2].error_message.is_empty());
    assert_eq!(report.max_error_level(), ErrorLevel::REJECTED);
    assert!(engine.envelopes().is_empty());
}

#[tokio::test]
async fn engine_checksum_column_survives_review() {
    let mut row = checked_row(1, 0, "update t set a=1").values;
    row.push("*A1B2C3D4E5".into());
    let engine = FakeEngine::with(vec![Ok(vec![Row::new(row)])]);

    let report = gateway(engine)
        .audit(&config("ON"), "update t set a=1;", "orders", false)
        .await
        .unwrap();

    assert_eq!(report.verdict, Verdict::Reviewed);
    assert_eq!(report.rows[0].extra3, "0");
    assert_eq!(report.rows[0].extra_columns, vec!["*A1B2C3D4E5".to_string()]);
}

#[tokio::test]
async fn critical_gate_wins_over_alter_gate() {
    let engine = FakeEngine::with(vec![]);
    let report = gateway(engine)
        .audit(&config("ON"), "alter table t1;drop database shop;", "orders", false)
        .await
        .unwrap();

    assert_eq!(report.verdict, Verdict::RejectedCriticalDdl);
    assert!(report
        .rows
        .iter()
        .filter(|r| r.error_level == ErrorLevel::REJECTED)
        .all(|r| r.error_message == "reject high-risk SQL"));
}

#[tokio::test]
async fn repeated_review_has_identical_shape() {
    let response = || Ok(vec![checked_row(1, 0, "select 1"), checked_row(2, 0, "select 2")]);
    let engine = FakeEngine::with(vec![response(), response()]);
    let gateway = gateway(engine);

    let first = gateway
        .audit(&config("ON"), "select 1;select 2;", "orders", false)
        .await
        .unwrap();
    let second = gateway
        .audit(&config("ON"), "select 1;select 2;", "orders", false)
        .await
        .unwrap();

    assert_eq!(first.rows, second.rows);
    assert_ne!(first.audit_id, second.audit_id);
}

#[tokio::test]
async fn split_yields_one_row_per_engine_piece() {
    let split = Ok(vec![
        Row::new(vec![Value::Int(1), "use shop;create table a (id int);".into()]),
        Row::new(vec![Value::Int(2), "use shop;insert into a values (1);".into()]),
        Row::new(vec![Value::Int(3), "use shop;insert into a values (2);".into()]),
    ]);
    let engine = FakeEngine::with(vec![
        split,
        Ok(vec![checked_row(1, 0, "create table a (id int)")]),
        Ok(vec![checked_row(1, 0, "insert into a values (1)")]),
        Ok(vec![checked_row(1, 0, "insert into a values (2)")]),
    ]);

    let report = gateway(engine.clone())
        .audit(
            &config("ON"),
            "create table a (id int);insert into a values (1),(2);",
            "orders",
            true,
        )
        .await
        .unwrap();

    // Two submitted statements, three pieces from the engine
    assert_eq!(report.rows.len(), 3);
    assert_eq!(report.rows[1].statement, "insert into a values (1)");
    assert_eq!(report.rows[2].statement, "insert into a values (2)");

    let envelopes = engine.envelopes();
    assert_eq!(envelopes.len(), 4);
    assert!(envelopes[0].contains("--enable-execute;--enable-ignore-warnings;--enable-split;"));
    for envelope in &envelopes[1..] {
        assert!(envelope.contains("--enable-check;--enable-ignore-warnings;"));
    }
}

#[tokio::test]
async fn split_with_no_pieces_is_empty_success() {
    let engine = FakeEngine::with(vec![Ok(vec![])]);
    let report = gateway(engine)
        .audit(&config("ON"), "select 1;", "orders", true)
        .await
        .unwrap();

    assert_eq!(report.verdict, Verdict::SplitReviewed);
    assert!(report.is_empty());
}

#[tokio::test]
async fn engine_failure_fails_the_audit() {
    let engine = FakeEngine::with(vec![Err(GatewayError::execution_error("internal error"))]);
    let result = gateway(engine.clone())
        .audit(&config("ON"), "SELECT 1;", "orders", false)
        .await;

    assert!(matches!(result, Err(GatewayError::ExecutionError { .. })));
    assert_eq!(engine.envelopes().len(), 1);
}

#[tokio::test]
async fn unreachable_engine_fails_the_audit() {
    let dir = tempfile::tempdir().unwrap();
    let targets = dir.path().join("targets.json");
    std::fs::write(&targets, serde_json::to_string(&vec![orders_record()]).unwrap()).unwrap();

    let config = GatewayConfig {
        inception_host: "127.0.0.1".to_string(),
        inception_port: 9,
        round_trip_timeout_secs: 5,
        ..GatewayConfig::default()
    };
    let gateway = AuditGateway::new(
        Arc::new(MySqlExecutor::with_timeout(config.round_trip_timeout())),
        Arc::new(JsonDirectory::open(&targets).unwrap()),
    );

    let err = gateway
        .audit(&config, "SELECT 1;", "orders", false)
        .await
        .unwrap_err();
    assert!(err.is_downstream());
}
