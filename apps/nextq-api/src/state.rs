use std::sync::Arc;

use nextq_service::{Providers, QuestionService, Stores};
use nextq_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<QuestionService>,
}
impl AppState {
	pub async fn new(config: nextq_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let stores = Stores::postgres(&db, &config.cache.backend);

		Ok(Self::from_service(QuestionService::new(config, Providers::default(), stores)))
	}

	pub fn from_service(service: QuestionService) -> Self {
		Self { service: Arc::new(service) }
	}
}
