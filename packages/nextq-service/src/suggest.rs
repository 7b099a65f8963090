//! The orchestrated read path: cache, fan-out, ranking, persistence.

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{
	QuestionService, RankedQuestion, Result, cache, format,
	generators::{
		self,
		collaborative::{self, CollaborativeQuestion},
	},
	ranking,
};
use nextq_domain::{Category, SourceType};
use nextq_storage::models::NewSuggestion;

const GENERATED_BY: &str = "orchestrator";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SuggestedQuestions {
	pub questions: Vec<RankedQuestion>,
	pub count: usize,
	#[serde(with = "crate::time_serde")]
	pub generated: OffsetDateTime,
	#[serde(default, skip_serializing_if = "std::ops::Not::not")]
	pub refreshed: bool,
}
impl SuggestedQuestions {
	fn new(questions: Vec<RankedQuestion>, refreshed: bool) -> Self {
		Self {
			count: questions.len(),
			questions,
			generated: OffsetDateTime::now_utc(),
			refreshed,
		}
	}
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrendingQuestion {
	pub question: String,
	pub category: Category,
	pub reasoning: String,
	pub score: f32,
	pub source_type: SourceType,
	pub source_ids: Vec<String>,
	pub similar_researchers: Vec<String>,
}
impl From<CollaborativeQuestion> for TrendingQuestion {
	fn from(question: CollaborativeQuestion) -> Self {
		Self {
			question: question.question,
			category: question.category,
			reasoning: question.reasoning,
			score: question.score,
			source_type: SourceType::Collaborative,
			source_ids: question.source_query_ids.iter().map(ToString::to_string).collect(),
			similar_researchers: question.similar_researchers,
		}
	}
}

impl QuestionService {
	/// Best `limit` questions for the user. Never fails: every stage degrades to fewer questions
	/// and total failure is an empty list.
	pub async fn get_top_questions(&self, user_id: Uuid, limit: usize) -> Vec<RankedQuestion> {
		if let Some(mut cached) = cache::load_cached(&self.ctx, user_id).await {
			tracing::debug!(user_id = %user_id, cache_hit = true, "Serving cached suggestions.");

			cached.truncate(limit);

			return cached;
		}

		let outputs = generators::generate_all(&self.ctx, &self.generators, user_id).await;
		let candidates = format::format_candidates(outputs);

		tracing::info!(
			user_id = %user_id,
			cache_hit = false,
			candidate_count = candidates.len(),
			"Generated candidate questions."
		);

		if candidates.is_empty() {
			return Vec::new();
		}

		let retain = limit.max(self.cfg().suggestions.retain_min as usize);
		let ranked = ranking::rank_candidates(&self.ctx, user_id, candidates, retain).await;

		self.persist(user_id, &ranked).await;

		cache::store_cached(&self.ctx, user_id, &ranked).await;

		ranked.into_iter().take(limit).collect()
	}

	/// Top questions for display. Returned questions are marked displayed on a best-effort basis.
	pub async fn suggested(&self, user_id: Uuid, limit: usize) -> SuggestedQuestions {
		let questions = self.get_top_questions(user_id, limit).await;

		if !questions.is_empty() {
			let texts: Vec<String> = questions.iter().map(|q| q.question.clone()).collect();

			if let Err(err) = self.record_displayed(user_id, &texts).await {
				tracing::warn!(
					error = %err,
					user_id = %user_id,
					"Failed to mark suggestions displayed."
				);
			}
		}

		SuggestedQuestions::new(questions, false)
	}

	/// Drops the cached list and regenerates it.
	pub async fn refresh(&self, user_id: Uuid, limit: usize) -> SuggestedQuestions {
		self.clear_cache(user_id).await;

		SuggestedQuestions::new(self.get_top_questions(user_id, limit).await, true)
	}

	/// Invalidates the fast cache for the user. Durable records are left alone.
	pub async fn clear_cache(&self, user_id: Uuid) {
		if let Err(err) = self.ctx.stores.cache.delete(&cache::cache_key(user_id)).await {
			tracing::warn!(error = %err, user_id = %user_id, "Failed to clear suggestion cache.");
		}
	}

	pub async fn trending_questions(
		&self,
		department: Option<&str>,
	) -> Result<Vec<TrendingQuestion>> {
		let questions = collaborative::trending_questions(&self.ctx, department).await?;

		Ok(questions.into_iter().map(TrendingQuestion::from).collect())
	}

	async fn persist(&self, user_id: Uuid, ranked: &[RankedQuestion]) {
		let now = OffsetDateTime::now_utc();
		let expires_at = now + Duration::hours(self.cfg().suggestions.record_ttl_hours);
		let rows: Vec<NewSuggestion> =
			ranked.iter().map(|q| new_suggestion(user_id, q, now, expires_at)).collect();

		match self.ctx.stores.suggestions.insert_suggestions(&rows).await {
			Ok(written) => tracing::debug!(
				user_id = %user_id,
				written,
				skipped = rows.len() - written.min(rows.len()),
				"Persisted suggestions."
			),
			Err(err) => {
				tracing::warn!(error = %err, user_id = %user_id, "Failed to persist suggestions.");
			},
		}
	}
}

pub fn new_suggestion(
	user_id: Uuid,
	question: &RankedQuestion,
	now: OffsetDateTime,
	expires_at: OffsetDateTime,
) -> NewSuggestion {
	NewSuggestion {
		suggestion_id: Uuid::new_v4(),
		user_id,
		question: question.question.clone(),
		reasoning: question.reasoning.clone(),
		category: question.category.as_str().to_string(),
		relevance_score: question.scores.relevance,
		novelty_score: question.scores.novelty,
		actionability_score: question.scores.actionability,
		impact_score: question.scores.impact,
		diversity_score: question.scores.diversity,
		overall_score: question.overall_score,
		source_type: question.source_type.as_str().to_string(),
		source_ids: question.source_ids.clone(),
		generated_by: GENERATED_BY.to_string(),
		generated_at: now,
		expires_at,
	}
}
