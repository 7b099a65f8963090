pub mod worker;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use nextq_service::{Providers, QuestionService, Stores};
use nextq_storage::db::Db;

#[derive(Debug, Parser)]
#[command(
	version = nextq_cli::VERSION,
	rename_all = "kebab",
	styles = nextq_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = nextq_config::load(&args.config)?;
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();

	let db = Db::connect(&config.storage.postgres).await?;

	db.ensure_schema().await?;

	let stores = Stores::postgres(&db, &config.cache.backend);
	let state = worker::WorkerState::new(&config.worker);
	let service = QuestionService::new(config, Providers::default(), stores);

	worker::run_worker(&service, state).await
}
