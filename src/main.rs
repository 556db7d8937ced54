use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use inception_gate_lib::engine::drivers::mysql::MySqlExecutor;
use inception_gate_lib::observability::{self, LogSettings};
use inception_gate_lib::vault::JsonDirectory;
use inception_gate_lib::{AuditGateway, GatewayConfig};

/// Audit a SQL batch through the local safety gates and the review engine
#[derive(Parser)]
#[command(name = "inception-gate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Gateway config file (JSON)
    #[arg(short, long, default_value = "gateway.json")]
    config: PathBuf,

    /// Target database records (JSON array)
    #[arg(short, long, default_value = "targets.json")]
    targets: PathBuf,

    /// Logical name of the target database
    #[arg(short, long)]
    database: String,

    /// Split first, then review each piece (progress tracking workflow)
    #[arg(long)]
    split: bool,

    /// SQL batch text (otherwise --file or stdin)
    #[arg(long, conflicts_with = "file")]
    sql: Option<String>,

    /// File holding the SQL batch
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Write JSON logs to a rolling file instead of stderr
    #[arg(long)]
    json_logs: bool,
}

fn read_batch(cli: &Cli) -> Result<String> {
    if let Some(sql) = &cli.sql {
        return Ok(sql.clone());
    }
    if let Some(path) = &cli.file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("reading SQL from {}", path.display()));
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("reading SQL from stdin")?;
    Ok(buf)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    observability::init_tracing(&LogSettings {
        json_file: cli.json_logs,
        ..LogSettings::default()
    });

    match run(&cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("audit could not be completed: {:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: &Cli) -> Result<ExitCode> {
    let config = GatewayConfig::load(&cli.config)?.apply_env()?;
    let directory = JsonDirectory::open(&cli.targets)?;
    let batch = read_batch(cli)?;

    let executor = MySqlExecutor::with_timeout(config.round_trip_timeout());
    let gateway = AuditGateway::new(Arc::new(executor), Arc::new(directory));

    let report = gateway
        .audit(&config, &batch, &cli.database, cli.split)
        .await?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.verdict.is_local_rejection() {
        eprintln!("batch stopped by a safety gate before review");
    }

    Ok(if report.max_error_level().is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}
