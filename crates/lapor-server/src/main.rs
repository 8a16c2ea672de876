//! `lapor` binary: serves the analytics/ETL API and runs one-off batches.
//!
//! Configuration comes from `lapor.toml` (or `--config`) layered under
//! `LAPOR_*` environment variables, with `__` between nested keys:
//!
//! ```text
//! LAPOR_PORT=8080
//! LAPOR_UPSTREAM__BASE_URL=http://reports.internal/api
//! LAPOR_ETL__FAILURE_POLICY=abort-on-first
//! ```
//!
//! # Password hash generation
//!
//! ```text
//! lapor hash-password
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::{Parser, Subcommand};
use lapor_core::batch::run_batch;
use lapor_server::{ServerConfig, upstream::HttpReportSource};
use lapor_store_sqlite::SqliteWarehouse;
use rand_core::OsRng;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Lapor complaint analytics warehouse")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, env = "LAPOR_CONFIG", default_value = "lapor.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Default)]
enum Command {
  /// Serve the HTTP API (default).
  #[default]
  Serve,
  /// Run one ETL batch against the upstream service and print the result.
  Ingest,
  /// Insert the static dimension values and print table counts.
  Seed,
  /// Print the argon2 hash for a password entered on stdin.
  HashPassword,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  match cli.command.unwrap_or_default() {
    Command::HashPassword => hash_password(),
    Command::Seed => seed(load_config(cli.config)?).await,
    Command::Ingest => ingest(load_config(cli.config)?).await,
    Command::Serve => serve(load_config(cli.config)?).await,
  }
}

fn load_config(path: PathBuf) -> anyhow::Result<ServerConfig> {
  let settings = config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(
      config::Environment::with_prefix("LAPOR")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true),
    )
    .build()
    .context("failed to read config")?;

  settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")
}

/// Open the warehouse file (creating its directory) and seed the static
/// dimensions, which is a no-op after the first run.
async fn open_warehouse(cfg: &ServerConfig) -> anyhow::Result<SqliteWarehouse> {
  let store_path = expand_tilde(&cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let warehouse = SqliteWarehouse::open(&store_path)
    .await
    .with_context(|| format!("failed to open warehouse at {store_path:?}"))?;

  let seeded = warehouse
    .seed_dimensions()
    .await
    .context("failed to seed dimensions")?;
  if seeded.total() > 0 {
    tracing::info!(?seeded, "seeded static dimensions");
  }

  Ok(warehouse)
}

async fn seed(cfg: ServerConfig) -> anyhow::Result<()> {
  let warehouse = open_warehouse(&cfg).await?;
  let counts = warehouse.table_counts().await.context("failed to count rows")?;
  for (table, rows) in &counts.0 {
    println!("{table:<26} {rows}");
  }
  Ok(())
}

async fn ingest(cfg: ServerConfig) -> anyhow::Result<()> {
  let warehouse = open_warehouse(&cfg).await?;
  let source = HttpReportSource::new(&cfg.upstream)
    .context("failed to build upstream client")?;

  let report = run_batch(&source, &warehouse, cfg.etl.batch_options())
    .await
    .context("etl batch failed")?;
  println!("{}", serde_json::to_string_pretty(&report)?);
  Ok(())
}

async fn serve(cfg: ServerConfig) -> anyhow::Result<()> {
  let warehouse = open_warehouse(&cfg).await?;
  let source = HttpReportSource::new(&cfg.upstream)
    .context("failed to build upstream client")?;

  let auth = cfg.auth();
  if auth.is_none() {
    tracing::warn!("no credentials configured; /api/etl is unauthenticated");
  }

  let app = lapor_server::router(
    Arc::new(warehouse),
    Arc::new(source),
    cfg.etl.batch_options(),
    auth,
  );
  let address = format!("{}:{}", cfg.host, cfg.port);

  tracing::info!(upstream = %cfg.upstream.base_url, "Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}

fn hash_password() -> anyhow::Result<()> {
  let password = read_password()?;
  let salt = SaltString::generate(&mut OsRng);
  let hash = Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
    .to_string();
  println!("{hash}");
  Ok(())
}

fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
