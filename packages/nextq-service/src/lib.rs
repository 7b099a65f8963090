pub mod cache;
pub mod embedding_cache;
pub mod feedback;
pub mod format;
pub mod generators;
pub mod llm_parse;
pub mod pg;
pub mod ranking;
pub mod suggest;
pub mod time_serde;

mod error;

pub use cache::MemoryCache;
pub use embedding_cache::EmbeddingCache;
pub use error::{Error, Result};
pub use feedback::{CleanupReport, SuggestionView};
pub use format::{Candidate, RankedQuestion};
pub use generators::{GeneratorOutput, QuestionGenerator};
pub use pg::PgStore;
pub use suggest::{SuggestedQuestions, TrendingQuestion};

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use nextq_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use nextq_providers::{embedding, llm};
use nextq_storage::{
	db::Db,
	models::{
		ConceptHit, GoalRecord, ImportantPaper, KnowledgeGap, NewSuggestion, ProjectRecord,
		QueryRecord, ResearcherProfile, SuggestionRecord, TeamActivity, TrendingQuery,
	},
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

pub trait LlmProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		prompt: &'a str,
		max_tokens: u32,
		temperature: f32,
	) -> BoxFuture<'a, color_eyre::Result<String>>;
}

/// Read-only research context behind the generators.
pub trait ResearchStore
where
	Self: Send + Sync,
{
	fn profile<'a>(&'a self, user_id: Uuid) -> BoxFuture<'a, Result<Option<ResearcherProfile>>>;

	/// Newest first.
	fn queries<'a>(
		&'a self,
		user_id: Uuid,
		completed_only: bool,
		limit: i64,
	) -> BoxFuture<'a, Result<Vec<QueryRecord>>>;

	/// Every query text the user has submitted, newest first.
	fn query_texts<'a>(&'a self, user_id: Uuid) -> BoxFuture<'a, Result<Vec<String>>>;

	fn important_papers<'a>(
		&'a self,
		user_id: Uuid,
		query_window: i64,
		limit: i64,
	) -> BoxFuture<'a, Result<Vec<ImportantPaper>>>;

	fn active_projects<'a>(
		&'a self,
		user_id: Uuid,
		limit: i64,
	) -> BoxFuture<'a, Result<Vec<ProjectRecord>>>;

	fn open_goals<'a>(
		&'a self,
		user_id: Uuid,
		limit: i64,
	) -> BoxFuture<'a, Result<Vec<GoalRecord>>>;

	fn team_activity<'a>(
		&'a self,
		department: &'a str,
		since: OffsetDateTime,
		limit: i64,
	) -> BoxFuture<'a, Result<Vec<TeamActivity>>>;

	fn knowledge_gaps<'a>(
		&'a self,
		user_id: Uuid,
		limit: i64,
	) -> BoxFuture<'a, Result<Vec<KnowledgeGap>>>;

	fn peers<'a>(
		&'a self,
		user_id: Uuid,
		department: Option<&'a str>,
		institution: Option<&'a str>,
	) -> BoxFuture<'a, Result<Vec<ResearcherProfile>>>;

	fn positively_rated_queries<'a>(
		&'a self,
		user_id: Uuid,
		since: OffsetDateTime,
		window: i64,
	) -> BoxFuture<'a, Result<Vec<QueryRecord>>>;

	fn trending_queries<'a>(
		&'a self,
		department: Option<&'a str>,
		since: OffsetDateTime,
		limit: i64,
	) -> BoxFuture<'a, Result<Vec<TrendingQuery>>>;
}

/// Durable suggestion records and their feedback flags.
pub trait SuggestionStore
where
	Self: Send + Sync,
{
	/// Returns how many rows were written. Unexpired duplicates are left untouched.
	fn insert_suggestions<'a>(&'a self, rows: &'a [NewSuggestion]) -> BoxFuture<'a, Result<usize>>;

	fn purge_expired<'a>(&'a self, now: OffsetDateTime) -> BoxFuture<'a, Result<u64>>;

	/// Unexpired records for the user, best first.
	fn list_active<'a>(
		&'a self,
		user_id: Uuid,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Vec<SuggestionRecord>>>;

	fn find_suggestion<'a>(
		&'a self,
		suggestion_id: Uuid,
	) -> BoxFuture<'a, Result<Option<SuggestionRecord>>>;

	fn mark_displayed<'a>(
		&'a self,
		user_id: Uuid,
		questions: &'a [String],
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<u64>>;

	fn mark_clicked<'a>(
		&'a self,
		suggestion_id: Uuid,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<()>>;

	fn mark_dismissed<'a>(
		&'a self,
		suggestion_id: Uuid,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<()>>;

	fn mark_executed<'a>(
		&'a self,
		user_id: Uuid,
		question: &'a str,
		query_id: Uuid,
	) -> BoxFuture<'a, Result<Option<Uuid>>>;
}

/// Short-lived key/value cache in front of the pipeline.
pub trait CacheStore
where
	Self: Send + Sync,
{
	fn get<'a>(&'a self, key: &'a str, now: OffsetDateTime) -> BoxFuture<'a, Result<Option<Value>>>;

	fn set<'a>(
		&'a self,
		key: &'a str,
		payload: &'a Value,
		now: OffsetDateTime,
		ttl: Duration,
	) -> BoxFuture<'a, Result<()>>;

	fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<()>>;

	fn purge_expired<'a>(&'a self, now: OffsetDateTime) -> BoxFuture<'a, Result<u64>>;
}

pub trait GraphStore
where
	Self: Send + Sync,
{
	fn unexplored_neighbors<'a>(
		&'a self,
		concepts: &'a [String],
		limit: i64,
	) -> BoxFuture<'a, Result<Vec<ConceptHit>>>;

	fn bridge_concepts<'a>(
		&'a self,
		concepts: &'a [String],
		limit: i64,
	) -> BoxFuture<'a, Result<Vec<ConceptHit>>>;

	fn trending_concepts<'a>(
		&'a self,
		concepts: &'a [String],
		since: OffsetDateTime,
		top_active: i64,
		limit: i64,
	) -> BoxFuture<'a, Result<Vec<ConceptHit>>>;

	fn dense_clusters<'a>(
		&'a self,
		concepts: &'a [String],
		min_strength: i64,
		min_cluster: i64,
		limit: i64,
	) -> BoxFuture<'a, Result<Vec<ConceptHit>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub llm: Arc<dyn LlmProvider>,
}
impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>, llm: Arc<dyn LlmProvider>) -> Self {
		Self { embedding, llm }
	}
}

impl Default for Providers {
	fn default() -> Self {
		Self::new(Arc::new(DefaultProviders), Arc::new(DefaultProviders))
	}
}

#[derive(Clone)]
pub struct Stores {
	pub research: Arc<dyn ResearchStore>,
	pub suggestions: Arc<dyn SuggestionStore>,
	pub cache: Arc<dyn CacheStore>,
	pub graph: Arc<dyn GraphStore>,
}
impl Stores {
	pub fn new(
		research: Arc<dyn ResearchStore>,
		suggestions: Arc<dyn SuggestionStore>,
		cache: Arc<dyn CacheStore>,
		graph: Arc<dyn GraphStore>,
	) -> Self {
		Self { research, suggestions, cache, graph }
	}

	/// Postgres for everything, with the fast cache kept in-process when `cache_backend` asks
	/// for it.
	pub fn postgres(db: &Db, cache_backend: &str) -> Self {
		let store = Arc::new(PgStore::new(db.pool.clone()));
		let cache: Arc<dyn CacheStore> = if cache_backend == nextq_config::CACHE_BACKEND_MEMORY {
			Arc::new(MemoryCache::default())
		} else {
			store.clone()
		};

		Self::new(store.clone(), store.clone(), cache, store)
	}
}

/// Shared state handed to every generator and pipeline stage.
#[derive(Clone)]
pub struct Context {
	pub cfg: Arc<Config>,
	pub providers: Providers,
	pub stores: Stores,
	pub embeddings: Arc<EmbeddingCache>,
}
impl Context {
	/// Embeds `texts` through the bounded cache. Never fails; see [`EmbeddingCache::embed_all`].
	pub async fn embed(&self, texts: &[String]) -> Vec<Vec<f32>> {
		self.embeddings
			.embed_all(self.providers.embedding.as_ref(), &self.cfg.providers.embedding, texts)
			.await
	}
}

pub struct QuestionService {
	pub ctx: Context,
	generators: Vec<Arc<dyn QuestionGenerator>>,
}
impl QuestionService {
	pub fn new(cfg: Config, providers: Providers, stores: Stores) -> Self {
		let embeddings = Arc::new(EmbeddingCache::new(cfg.suggestions.embedding_cache_capacity));

		Self {
			ctx: Context { cfg: Arc::new(cfg), providers, stores, embeddings },
			generators: generators::default_generators(),
		}
	}

	/// Replaces the generator set. Output order follows the order given here.
	pub fn with_generators(mut self, generators: Vec<Arc<dyn QuestionGenerator>>) -> Self {
		self.generators = generators;

		self
	}

	pub fn cfg(&self) -> &Config {
		&self.ctx.cfg
	}
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

impl LlmProvider for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		prompt: &'a str,
		max_tokens: u32,
		temperature: f32,
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(llm::complete(cfg, prompt, max_tokens, temperature))
	}
}
