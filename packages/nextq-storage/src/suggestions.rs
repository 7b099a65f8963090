use sqlx::PgConnection;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Result,
	models::{NewSuggestion, SuggestionRecord},
};

const RECORD_COLUMNS: &str = "\
	suggestion_id,
	user_id,
	question,
	reasoning,
	category,
	relevance_score,
	novelty_score,
	actionability_score,
	impact_score,
	diversity_score,
	overall_score,
	source_type,
	source_ids,
	generated_by,
	generated_at,
	expires_at,
	displayed,
	displayed_at,
	clicked,
	clicked_at,
	dismissed,
	dismissed_at,
	executed,
	executed_query_id";

/// Stable per-user identity of a question text.
pub fn question_hash(question: &str) -> String {
	let normalized = question.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();

	blake3::hash(normalized.as_bytes()).to_hex().to_string()
}

/// Inserts a record unless an unexpired one already exists for the same user and question.
/// An expired record with the same question is replaced. Returns whether a row was written.
pub async fn insert_suggestion(executor: &mut PgConnection, row: &NewSuggestion) -> Result<bool> {
	let result = sqlx::query(
		"\
INSERT INTO suggested_questions (
	suggestion_id,
	user_id,
	question,
	question_hash,
	reasoning,
	category,
	relevance_score,
	novelty_score,
	actionability_score,
	impact_score,
	diversity_score,
	overall_score,
	source_type,
	source_ids,
	generated_by,
	generated_at,
	expires_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
ON CONFLICT (user_id, question_hash) DO UPDATE
SET
	suggestion_id = EXCLUDED.suggestion_id,
	question = EXCLUDED.question,
	reasoning = EXCLUDED.reasoning,
	category = EXCLUDED.category,
	relevance_score = EXCLUDED.relevance_score,
	novelty_score = EXCLUDED.novelty_score,
	actionability_score = EXCLUDED.actionability_score,
	impact_score = EXCLUDED.impact_score,
	diversity_score = EXCLUDED.diversity_score,
	overall_score = EXCLUDED.overall_score,
	source_type = EXCLUDED.source_type,
	source_ids = EXCLUDED.source_ids,
	generated_by = EXCLUDED.generated_by,
	generated_at = EXCLUDED.generated_at,
	expires_at = EXCLUDED.expires_at,
	displayed = false,
	displayed_at = NULL,
	clicked = false,
	clicked_at = NULL,
	dismissed = false,
	dismissed_at = NULL,
	executed = false,
	executed_query_id = NULL
WHERE suggested_questions.expires_at <= EXCLUDED.generated_at",
	)
	.bind(row.suggestion_id)
	.bind(row.user_id)
	.bind(row.question.as_str())
	.bind(question_hash(&row.question))
	.bind(row.reasoning.as_str())
	.bind(row.category.as_str())
	.bind(row.relevance_score)
	.bind(row.novelty_score)
	.bind(row.actionability_score)
	.bind(row.impact_score)
	.bind(row.diversity_score)
	.bind(row.overall_score)
	.bind(row.source_type.as_str())
	.bind(&row.source_ids)
	.bind(row.generated_by.as_str())
	.bind(row.generated_at)
	.bind(row.expires_at)
	.execute(&mut *executor)
	.await?;

	Ok(result.rows_affected() > 0)
}

pub async fn purge_expired(executor: &mut PgConnection, now: OffsetDateTime) -> Result<u64> {
	let result = sqlx::query("DELETE FROM suggested_questions WHERE expires_at < $1")
		.bind(now)
		.execute(&mut *executor)
		.await?;

	Ok(result.rows_affected())
}

pub async fn get_suggestion(
	executor: &mut PgConnection,
	suggestion_id: Uuid,
) -> Result<Option<SuggestionRecord>> {
	let sql = format!(
		"\
SELECT
{RECORD_COLUMNS}
FROM suggested_questions
WHERE suggestion_id = $1"
	);
	let row = sqlx::query_as::<_, SuggestionRecord>(&sql)
		.bind(suggestion_id)
		.fetch_optional(&mut *executor)
		.await?;

	Ok(row)
}

pub async fn list_active_for_user(
	executor: &mut PgConnection,
	user_id: Uuid,
	now: OffsetDateTime,
) -> Result<Vec<SuggestionRecord>> {
	let sql = format!(
		"\
SELECT
{RECORD_COLUMNS}
FROM suggested_questions
WHERE user_id = $1
	AND expires_at > $2
ORDER BY overall_score DESC, suggestion_id"
	);
	let rows = sqlx::query_as::<_, SuggestionRecord>(&sql)
		.bind(user_id)
		.bind(now)
		.fetch_all(&mut *executor)
		.await?;

	Ok(rows)
}

/// Matches by [`question_hash`], so a stored record whose text differs only in case or spacing
/// is marked too.
pub async fn mark_displayed(
	executor: &mut PgConnection,
	user_id: Uuid,
	questions: &[String],
	now: OffsetDateTime,
) -> Result<u64> {
	if questions.is_empty() {
		return Ok(0);
	}

	let hashes: Vec<String> = questions.iter().map(|question| question_hash(question)).collect();
	let result = sqlx::query(
		"\
UPDATE suggested_questions
SET displayed = true, displayed_at = $3
WHERE user_id = $1
	AND question_hash = ANY($2::text[])
	AND displayed = false",
	)
	.bind(user_id)
	.bind(hashes)
	.bind(now)
	.execute(&mut *executor)
	.await?;

	Ok(result.rows_affected())
}

pub async fn mark_clicked(
	executor: &mut PgConnection,
	suggestion_id: Uuid,
	now: OffsetDateTime,
) -> Result<()> {
	sqlx::query(
		"UPDATE suggested_questions SET clicked = true, clicked_at = $2 WHERE suggestion_id = $1",
	)
	.bind(suggestion_id)
	.bind(now)
	.execute(&mut *executor)
	.await?;

	Ok(())
}

pub async fn mark_dismissed(
	executor: &mut PgConnection,
	suggestion_id: Uuid,
	now: OffsetDateTime,
) -> Result<()> {
	sqlx::query(
		"\
UPDATE suggested_questions
SET dismissed = true, dismissed_at = $2
WHERE suggestion_id = $1",
	)
	.bind(suggestion_id)
	.bind(now)
	.execute(&mut *executor)
	.await?;

	Ok(())
}

/// Links the most recently clicked, not yet executed record with this question to `query_id`.
pub async fn mark_executed(
	executor: &mut PgConnection,
	user_id: Uuid,
	question: &str,
	query_id: Uuid,
) -> Result<Option<Uuid>> {
	let updated: Option<Uuid> = sqlx::query_scalar(
		"\
UPDATE suggested_questions
SET executed = true, executed_query_id = $3
WHERE suggestion_id = (
	SELECT suggestion_id
	FROM suggested_questions
	WHERE user_id = $1
		AND question = $2
		AND clicked = true
		AND executed = false
	ORDER BY clicked_at DESC NULLS LAST, suggestion_id
	LIMIT 1
)
RETURNING suggestion_id",
	)
	.bind(user_id)
	.bind(question)
	.bind(query_id)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(updated)
}
