//! Display, click, dismissal, and execution tracking on persisted suggestions.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, QuestionService, Result};
use nextq_domain::{Category, SourceType};
use nextq_storage::models::SuggestionRecord;

/// An unexpired persisted suggestion as seen by its owner.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SuggestionView {
	pub suggestion_id: Uuid,
	pub question: String,
	pub reasoning: String,
	pub category: Category,
	pub overall_score: f32,
	pub source_type: SourceType,
	pub displayed: bool,
	pub clicked: bool,
	pub dismissed: bool,
	pub executed: bool,
	#[serde(with = "crate::time_serde")]
	pub expires_at: OffsetDateTime,
}
impl From<SuggestionRecord> for SuggestionView {
	fn from(record: SuggestionRecord) -> Self {
		Self {
			suggestion_id: record.suggestion_id,
			category: Category::parse_lenient(&record.category),
			source_type: SourceType::parse_lenient(&record.source_type),
			question: record.question,
			reasoning: record.reasoning,
			overall_score: record.overall_score,
			displayed: record.displayed,
			clicked: record.clicked,
			dismissed: record.dismissed,
			executed: record.executed,
			expires_at: record.expires_at,
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
	pub expired_suggestions: u64,
	pub expired_cache_entries: u64,
}

impl QuestionService {
	/// Marks the user's not yet displayed records with these texts as displayed.
	pub async fn record_displayed(&self, user_id: Uuid, questions: &[String]) -> Result<u64> {
		if questions.is_empty() {
			return Ok(0);
		}

		let now = OffsetDateTime::now_utc();

		self.ctx.stores.suggestions.mark_displayed(user_id, questions, now).await
	}

	pub async fn record_click(&self, user_id: Uuid, suggestion_id: Uuid) -> Result<()> {
		self.owned_suggestion(user_id, suggestion_id).await?;
		self.ctx.stores.suggestions.mark_clicked(suggestion_id, OffsetDateTime::now_utc()).await?;

		tracing::info!(user_id = %user_id, suggestion_id = %suggestion_id, "Suggestion clicked.");

		Ok(())
	}

	pub async fn record_dismiss(&self, user_id: Uuid, suggestion_id: Uuid) -> Result<()> {
		self.owned_suggestion(user_id, suggestion_id).await?;
		self.ctx.stores.suggestions.mark_dismissed(suggestion_id, OffsetDateTime::now_utc()).await?;

		tracing::info!(user_id = %user_id, suggestion_id = %suggestion_id, "Suggestion dismissed.");

		Ok(())
	}

	/// Links a submitted query to the most recently clicked suggestion with the same text.
	/// Returns the linked suggestion, or `None` when nothing matched.
	pub async fn record_execution(
		&self,
		user_id: Uuid,
		question: &str,
		query_id: Uuid,
	) -> Result<Option<Uuid>> {
		let question = question.trim();

		if question.is_empty() {
			return Err(Error::InvalidRequest {
				message: "question must not be empty.".to_string(),
			});
		}

		let linked =
			self.ctx.stores.suggestions.mark_executed(user_id, question, query_id).await?;

		if let Some(suggestion_id) = linked {
			tracing::info!(
				user_id = %user_id,
				suggestion_id = %suggestion_id,
				query_id = %query_id,
				"Suggestion executed."
			);
		}

		Ok(linked)
	}

	pub async fn active_suggestions(&self, user_id: Uuid) -> Result<Vec<SuggestionView>> {
		let records =
			self.ctx.stores.suggestions.list_active(user_id, OffsetDateTime::now_utc()).await?;

		Ok(records.into_iter().map(SuggestionView::from).collect())
	}

	/// Deletes expired suggestion records and expired fast-cache entries.
	pub async fn cleanup_expired(&self) -> Result<CleanupReport> {
		let now = OffsetDateTime::now_utc();
		let expired_suggestions = self.ctx.stores.suggestions.purge_expired(now).await?;
		let expired_cache_entries = self.ctx.stores.cache.purge_expired(now).await?;

		Ok(CleanupReport { expired_suggestions, expired_cache_entries })
	}

	async fn owned_suggestion(
		&self,
		user_id: Uuid,
		suggestion_id: Uuid,
	) -> Result<SuggestionRecord> {
		let Some(record) = self.ctx.stores.suggestions.find_suggestion(suggestion_id).await? else {
			return Err(Error::NotFound { message: "Suggestion not found.".to_string() });
		};

		if record.user_id != user_id {
			return Err(Error::Forbidden {
				message: "Suggestion belongs to another user.".to_string(),
			});
		}

		Ok(record)
	}
}
