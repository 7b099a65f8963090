//! Postgres-backed implementations of every store seam.

use serde_json::Value;
use sqlx::{PgPool, Postgres, pool::PoolConnection};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{BoxFuture, CacheStore, GraphStore, ResearchStore, Result, SuggestionStore};
use nextq_storage::{
	cache, graph,
	models::{
		ConceptHit, GoalRecord, ImportantPaper, KnowledgeGap, NewSuggestion, ProjectRecord,
		QueryRecord, ResearcherProfile, SuggestionRecord, TeamActivity, TrendingQuery,
	},
	queries, suggestions,
};

#[derive(Clone)]
pub struct PgStore {
	pool: PgPool,
}
impl PgStore {
	pub fn new(pool: PgPool) -> Self {
		Self { pool }
	}

	async fn conn(&self) -> Result<PoolConnection<Postgres>> {
		Ok(self.pool.acquire().await?)
	}
}

impl ResearchStore for PgStore {
	fn profile<'a>(&'a self, user_id: Uuid) -> BoxFuture<'a, Result<Option<ResearcherProfile>>> {
		Box::pin(async move {
			let mut conn = self.conn().await?;

			Ok(queries::fetch_profile(&mut conn, user_id).await?)
		})
	}

	fn queries<'a>(
		&'a self,
		user_id: Uuid,
		completed_only: bool,
		limit: i64,
	) -> BoxFuture<'a, Result<Vec<QueryRecord>>> {
		Box::pin(async move {
			let mut conn = self.conn().await?;

			Ok(queries::list_queries(&mut conn, user_id, completed_only, limit).await?)
		})
	}

	fn query_texts<'a>(&'a self, user_id: Uuid) -> BoxFuture<'a, Result<Vec<String>>> {
		Box::pin(async move {
			let mut conn = self.conn().await?;

			Ok(queries::list_query_texts(&mut conn, user_id).await?)
		})
	}

	fn important_papers<'a>(
		&'a self,
		user_id: Uuid,
		query_window: i64,
		limit: i64,
	) -> BoxFuture<'a, Result<Vec<ImportantPaper>>> {
		Box::pin(async move {
			let mut conn = self.conn().await?;

			Ok(queries::list_important_papers(&mut conn, user_id, query_window, limit).await?)
		})
	}

	fn active_projects<'a>(
		&'a self,
		user_id: Uuid,
		limit: i64,
	) -> BoxFuture<'a, Result<Vec<ProjectRecord>>> {
		Box::pin(async move {
			let mut conn = self.conn().await?;

			Ok(queries::list_active_projects(&mut conn, user_id, limit).await?)
		})
	}

	fn open_goals<'a>(
		&'a self,
		user_id: Uuid,
		limit: i64,
	) -> BoxFuture<'a, Result<Vec<GoalRecord>>> {
		Box::pin(async move {
			let mut conn = self.conn().await?;

			Ok(queries::list_open_goals(&mut conn, user_id, limit).await?)
		})
	}

	fn team_activity<'a>(
		&'a self,
		department: &'a str,
		since: OffsetDateTime,
		limit: i64,
	) -> BoxFuture<'a, Result<Vec<TeamActivity>>> {
		Box::pin(async move {
			let mut conn = self.conn().await?;

			Ok(queries::list_team_activity(&mut conn, department, since, limit).await?)
		})
	}

	fn knowledge_gaps<'a>(
		&'a self,
		user_id: Uuid,
		limit: i64,
	) -> BoxFuture<'a, Result<Vec<KnowledgeGap>>> {
		Box::pin(async move {
			let mut conn = self.conn().await?;

			Ok(queries::list_knowledge_gaps(&mut conn, user_id, limit).await?)
		})
	}

	fn peers<'a>(
		&'a self,
		user_id: Uuid,
		department: Option<&'a str>,
		institution: Option<&'a str>,
	) -> BoxFuture<'a, Result<Vec<ResearcherProfile>>> {
		Box::pin(async move {
			let mut conn = self.conn().await?;

			Ok(queries::list_peers(&mut conn, user_id, department, institution).await?)
		})
	}

	fn positively_rated_queries<'a>(
		&'a self,
		user_id: Uuid,
		since: OffsetDateTime,
		window: i64,
	) -> BoxFuture<'a, Result<Vec<QueryRecord>>> {
		Box::pin(async move {
			let mut conn = self.conn().await?;

			Ok(queries::list_positively_rated_queries(&mut conn, user_id, since, window).await?)
		})
	}

	fn trending_queries<'a>(
		&'a self,
		department: Option<&'a str>,
		since: OffsetDateTime,
		limit: i64,
	) -> BoxFuture<'a, Result<Vec<TrendingQuery>>> {
		Box::pin(async move {
			let mut conn = self.conn().await?;

			Ok(queries::list_trending_queries(&mut conn, department, since, limit).await?)
		})
	}
}

impl SuggestionStore for PgStore {
	fn insert_suggestions<'a>(&'a self, rows: &'a [NewSuggestion]) -> BoxFuture<'a, Result<usize>> {
		Box::pin(async move {
			let mut tx = self.pool.begin().await?;
			let mut written = 0;

			for row in rows {
				if suggestions::insert_suggestion(&mut tx, row).await? {
					written += 1;
				}
			}

			tx.commit().await?;

			Ok(written)
		})
	}

	fn purge_expired<'a>(&'a self, now: OffsetDateTime) -> BoxFuture<'a, Result<u64>> {
		Box::pin(async move {
			let mut conn = self.conn().await?;

			Ok(suggestions::purge_expired(&mut conn, now).await?)
		})
	}

	fn list_active<'a>(
		&'a self,
		user_id: Uuid,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Vec<SuggestionRecord>>> {
		Box::pin(async move {
			let mut conn = self.conn().await?;

			Ok(suggestions::list_active_for_user(&mut conn, user_id, now).await?)
		})
	}

	fn find_suggestion<'a>(
		&'a self,
		suggestion_id: Uuid,
	) -> BoxFuture<'a, Result<Option<SuggestionRecord>>> {
		Box::pin(async move {
			let mut conn = self.conn().await?;

			Ok(suggestions::get_suggestion(&mut conn, suggestion_id).await?)
		})
	}

	fn mark_displayed<'a>(
		&'a self,
		user_id: Uuid,
		questions: &'a [String],
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<u64>> {
		Box::pin(async move {
			let mut conn = self.conn().await?;

			Ok(suggestions::mark_displayed(&mut conn, user_id, questions, now).await?)
		})
	}

	fn mark_clicked<'a>(
		&'a self,
		suggestion_id: Uuid,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut conn = self.conn().await?;

			Ok(suggestions::mark_clicked(&mut conn, suggestion_id, now).await?)
		})
	}

	fn mark_dismissed<'a>(
		&'a self,
		suggestion_id: Uuid,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut conn = self.conn().await?;

			Ok(suggestions::mark_dismissed(&mut conn, suggestion_id, now).await?)
		})
	}

	fn mark_executed<'a>(
		&'a self,
		user_id: Uuid,
		question: &'a str,
		query_id: Uuid,
	) -> BoxFuture<'a, Result<Option<Uuid>>> {
		Box::pin(async move {
			let mut conn = self.conn().await?;

			Ok(suggestions::mark_executed(&mut conn, user_id, question, query_id).await?)
		})
	}
}

impl CacheStore for PgStore {
	fn get<'a>(
		&'a self,
		key: &'a str,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Option<Value>>> {
		Box::pin(async move {
			let mut conn = self.conn().await?;
			let entry = cache::get_entry(&mut conn, key, now).await?;

			Ok(entry.map(|entry| entry.payload))
		})
	}

	fn set<'a>(
		&'a self,
		key: &'a str,
		payload: &'a Value,
		now: OffsetDateTime,
		ttl: Duration,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut conn = self.conn().await?;

			Ok(cache::put_entry(&mut conn, key, payload, now, now + ttl).await?)
		})
	}

	fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut conn = self.conn().await?;

			Ok(cache::delete_entry(&mut conn, key).await?)
		})
	}

	fn purge_expired<'a>(&'a self, now: OffsetDateTime) -> BoxFuture<'a, Result<u64>> {
		Box::pin(async move {
			let mut conn = self.conn().await?;

			Ok(cache::purge_expired(&mut conn, now).await?)
		})
	}
}

impl GraphStore for PgStore {
	fn unexplored_neighbors<'a>(
		&'a self,
		concepts: &'a [String],
		limit: i64,
	) -> BoxFuture<'a, Result<Vec<ConceptHit>>> {
		Box::pin(async move {
			let mut conn = self.conn().await?;

			Ok(graph::unexplored_neighbors(&mut conn, concepts, limit).await?)
		})
	}

	fn bridge_concepts<'a>(
		&'a self,
		concepts: &'a [String],
		limit: i64,
	) -> BoxFuture<'a, Result<Vec<ConceptHit>>> {
		Box::pin(async move {
			let mut conn = self.conn().await?;

			Ok(graph::bridge_concepts(&mut conn, concepts, limit).await?)
		})
	}

	fn trending_concepts<'a>(
		&'a self,
		concepts: &'a [String],
		since: OffsetDateTime,
		top_active: i64,
		limit: i64,
	) -> BoxFuture<'a, Result<Vec<ConceptHit>>> {
		Box::pin(async move {
			let mut conn = self.conn().await?;

			Ok(graph::trending_concepts(&mut conn, concepts, since, top_active, limit).await?)
		})
	}

	fn dense_clusters<'a>(
		&'a self,
		concepts: &'a [String],
		min_strength: i64,
		min_cluster: i64,
		limit: i64,
	) -> BoxFuture<'a, Result<Vec<ConceptHit>>> {
		Box::pin(async move {
			let mut conn = self.conn().await?;

			Ok(graph::dense_clusters(&mut conn, concepts, min_strength, min_cluster, limit).await?)
		})
	}
}
