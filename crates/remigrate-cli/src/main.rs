use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use remigrate::{DesiredState, DropOutcome, PgBackend, Reconciler};
use remigrate_config::{ConfigError, DEFAULT_CONFIG_FILE};

mod connection;
mod output;
mod prompt;

use output::Reporter;
use prompt::StdinPrompt;

/// Create-if-missing reconciliation of a Postgres database, its tables and
/// their secondary indexes.
#[derive(Parser, Debug)]
#[command(name = "remigrate", version)]
struct Cli {
    /// Configuration file declaring the connection and the desired schema
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Drop the configured database instead of reconciling (asks first)
    #[arg(long)]
    dbdrop: bool,

    /// Connection URL, overrides the config file's connection fields
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid database url {url}")]
    DatabaseUrl {
        url: String,
        #[source]
        source: tokio_postgres::Error,
    },

    #[error("refusing to drop [{0}]: the connection starts on that database")]
    DropAdminDatabase(String),

    #[error(transparent)]
    Remigrate(#[from] remigrate::Error),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // a missing .env is fine
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr so nothing interleaves with the status lines on stdout.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = remigrate_config::load(&cli.config)?;
    let desired = config.desired_state();
    let pg = connection::pg_config(&config, cli.database_url.as_deref())?;
    if cli.dbdrop {
        connection::check_drop_target(&pg, &desired.database)?;
    }

    let mut backend = PgBackend::connect(pg).await?;
    let result = if cli.dbdrop {
        dbdrop(&mut backend, &desired.database).await
    } else {
        reconcile(&mut backend, &desired).await
    };
    backend.close().await;
    result
}

async fn reconcile(backend: &mut PgBackend, desired: &DesiredState) -> Result<(), CliError> {
    let outcome = Reconciler::new(backend)
        .with_observer(Reporter::stdout())
        .run(desired)
        .await?;
    println!("{}", outcome.counters);
    Ok(())
}

async fn dbdrop(backend: &mut PgBackend, database: &str) -> Result<(), CliError> {
    let mut prompt = StdinPrompt::new();
    match remigrate::drop_database(backend, &mut prompt, database).await? {
        DropOutcome::Dropped(summary) => println!("{}", summary),
        DropOutcome::Aborted(_) => println!("exiting without dropping database [{}]", database),
    }
    Ok(())
}

fn report(err: &dyn std::error::Error) {
    eprintln!("error: {}", err);
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("caused by: {}", cause);
        source = cause.source();
    }
}
