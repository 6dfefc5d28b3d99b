use harvest_ledger::commands::{self, AppCommand};
use harvest_ledger::config::AppConfig;
use harvest_ledger::storage;
use log::error;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let config = AppConfig::from_env();
    init_logging(&config)?;

    let db = storage::establish_connection(&config.database_url, config.max_connections)
        .await
        .map_err(|e| {
            error!("Cannot connect to {}: {}", config.database_url, e);
            e
        })?;
    let db = Arc::new(db);

    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        return run_one(AppCommand::from_args(&args), &db, &config).await;
    }

    // no arguments: read one command per line until EOF or `quit`
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "quit" | "q" | "exit") {
            break;
        }
        let cmd = line.parse::<AppCommand>().unwrap_or(AppCommand::Help);
        if let Err(e) = run_one(cmd, &db, &config).await {
            eprintln!("error: {:#}", e);
        }
    }
    Ok(())
}

async fn run_one(
    cmd: AppCommand,
    db: &Arc<DatabaseConnection>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let value = commands::execute(cmd, db, config).await?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn init_logging(config: &AppConfig) -> anyhow::Result<()> {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(log::LevelFilter::Warn)
        .filter_module("harvest_ledger", log::LevelFilter::Info)
        .filter_module("sqlx", log::LevelFilter::Error)
        .filter_module("sea_orm", log::LevelFilter::Error)
        .parse_default_env();

    if let Some(path) = &config.log_file {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let file = std::fs::File::create(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.init();
    Ok(())
}
