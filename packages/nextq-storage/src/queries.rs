//! Read-only research context used by the suggestion generators.

use sqlx::PgConnection;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Result,
	models::{
		GoalRecord, ImportantPaper, KnowledgeGap, ProjectRecord, QueryRecord, ResearcherProfile,
		TeamActivity, TrendingQuery,
	},
};

const PROFILE_COLUMNS: &str = "\
	r.user_id,
	r.name,
	r.department,
	r.institution,
	COALESCE(p.primary_interests, '{}') AS primary_interests,
	COALESCE(p.secondary_interests, '{}') AS secondary_interests,
	COALESCE(p.research_areas, '{}') AS research_areas,
	COALESCE(p.techniques, '{}') AS techniques,
	COALESCE(p.computational_skills, '{}') AS computational_skills,
	p.expertise_level,
	p.phd_focus,
	p.years_in_field,
	p.highest_degree";

pub async fn fetch_profile(
	executor: &mut PgConnection,
	user_id: Uuid,
) -> Result<Option<ResearcherProfile>> {
	let sql = format!(
		"\
SELECT
{PROFILE_COLUMNS}
FROM researchers r
LEFT JOIN research_profiles p ON p.user_id = r.user_id
WHERE r.user_id = $1"
	);
	let row = sqlx::query_as::<_, ResearcherProfile>(&sql)
		.bind(user_id)
		.fetch_optional(&mut *executor)
		.await?;

	Ok(row)
}

/// Researchers sharing the department or institution who have at least one completed query.
pub async fn list_peers(
	executor: &mut PgConnection,
	user_id: Uuid,
	department: Option<&str>,
	institution: Option<&str>,
) -> Result<Vec<ResearcherProfile>> {
	if department.is_none() && institution.is_none() {
		return Ok(vec![]);
	}

	let sql = format!(
		"\
SELECT
{PROFILE_COLUMNS}
FROM researchers r
LEFT JOIN research_profiles p ON p.user_id = r.user_id
WHERE r.user_id <> $1
	AND (r.department = $2 OR r.institution = $3)
	AND EXISTS (
		SELECT 1 FROM queries q WHERE q.user_id = r.user_id AND q.status = 'COMPLETED'
	)
ORDER BY r.user_id"
	);
	let rows = sqlx::query_as::<_, ResearcherProfile>(&sql)
		.bind(user_id)
		.bind(department)
		.bind(institution)
		.fetch_all(&mut *executor)
		.await?;

	Ok(rows)
}

/// Most recent queries first. `completed_only` restricts to successful queries.
pub async fn list_queries(
	executor: &mut PgConnection,
	user_id: Uuid,
	completed_only: bool,
	limit: i64,
) -> Result<Vec<QueryRecord>> {
	let rows = sqlx::query_as::<_, QueryRecord>(
		"\
SELECT query_id, user_id, original_query, status, concepts, created_at
FROM queries
WHERE user_id = $1
	AND ($2 = false OR status = 'COMPLETED')
ORDER BY created_at DESC, query_id
LIMIT $3",
	)
	.bind(user_id)
	.bind(completed_only)
	.bind(limit)
	.fetch_all(&mut *executor)
	.await?;

	Ok(rows)
}

/// Every query text the user has submitted, newest first, regardless of status.
pub async fn list_query_texts(executor: &mut PgConnection, user_id: Uuid) -> Result<Vec<String>> {
	let rows: Vec<String> = sqlx::query_scalar(
		"\
SELECT original_query
FROM queries
WHERE user_id = $1
ORDER BY created_at DESC, query_id",
	)
	.bind(user_id)
	.fetch_all(&mut *executor)
	.await?;

	Ok(rows)
}

/// Responses flagged IMPORTANT within the user's last `query_window` queries.
pub async fn list_important_papers(
	executor: &mut PgConnection,
	user_id: Uuid,
	query_window: i64,
	limit: i64,
) -> Result<Vec<ImportantPaper>> {
	let rows = sqlx::query_as::<_, ImportantPaper>(
		"\
WITH recent AS (
	SELECT query_id, created_at
	FROM queries
	WHERE user_id = $1
	ORDER BY created_at DESC, query_id
	LIMIT $2
)
SELECT r.response_id, r.summary, r.doi, r.concepts
FROM recent q
JOIN responses r ON r.query_id = q.query_id
WHERE EXISTS (
	SELECT 1 FROM feedback f WHERE f.response_id = r.response_id AND f.feedback_type = 'IMPORTANT'
)
ORDER BY q.created_at DESC, r.created_at, r.response_id
LIMIT $3",
	)
	.bind(user_id)
	.bind(query_window)
	.bind(limit)
	.fetch_all(&mut *executor)
	.await?;

	Ok(rows)
}

pub async fn list_active_projects(
	executor: &mut PgConnection,
	user_id: Uuid,
	limit: i64,
) -> Result<Vec<ProjectRecord>> {
	let rows = sqlx::query_as::<_, ProjectRecord>(
		"\
SELECT project_id, title, description, status
FROM projects
WHERE user_id = $1
	AND status IN ('PLANNING', 'IN_PROGRESS', 'ANALYZING')
ORDER BY updated_at DESC, project_id
LIMIT $2",
	)
	.bind(user_id)
	.bind(limit)
	.fetch_all(&mut *executor)
	.await?;

	Ok(rows)
}

pub async fn list_open_goals(
	executor: &mut PgConnection,
	user_id: Uuid,
	limit: i64,
) -> Result<Vec<GoalRecord>> {
	let rows = sqlx::query_as::<_, GoalRecord>(
		"\
SELECT goal_id, goal_type, title, status, target_date
FROM goals
WHERE user_id = $1
	AND status IN ('NOT_STARTED', 'IN_PROGRESS')
ORDER BY target_date ASC NULLS LAST, goal_id
LIMIT $2",
	)
	.bind(user_id)
	.bind(limit)
	.fetch_all(&mut *executor)
	.await?;

	Ok(rows)
}

pub async fn list_team_activity(
	executor: &mut PgConnection,
	department: &str,
	since: OffsetDateTime,
	limit: i64,
) -> Result<Vec<TeamActivity>> {
	let rows = sqlx::query_as::<_, TeamActivity>(
		"\
SELECT r.name AS user_name, q.original_query, q.created_at
FROM queries q
JOIN researchers r ON r.user_id = q.user_id
WHERE r.department = $1
	AND q.status = 'COMPLETED'
	AND q.created_at >= $2
ORDER BY q.created_at DESC, q.query_id
LIMIT $3",
	)
	.bind(department)
	.bind(since)
	.bind(limit)
	.fetch_all(&mut *executor)
	.await?;

	Ok(rows)
}

pub async fn list_knowledge_gaps(
	executor: &mut PgConnection,
	user_id: Uuid,
	limit: i64,
) -> Result<Vec<KnowledgeGap>> {
	let rows = sqlx::query_as::<_, KnowledgeGap>(
		"\
SELECT gap_id, missing_concept, potential_impact
FROM knowledge_gaps
WHERE user_id = $1
	AND addressed = false
ORDER BY potential_impact DESC, gap_id
LIMIT $2",
	)
	.bind(user_id)
	.bind(limit)
	.fetch_all(&mut *executor)
	.await?;

	Ok(rows)
}

/// The user's latest `window` completed queries since `since`, keeping only those whose
/// responses received LIKE or IMPORTANT feedback.
pub async fn list_positively_rated_queries(
	executor: &mut PgConnection,
	user_id: Uuid,
	since: OffsetDateTime,
	window: i64,
) -> Result<Vec<QueryRecord>> {
	let rows = sqlx::query_as::<_, QueryRecord>(
		"\
WITH recent AS (
	SELECT query_id, user_id, original_query, status, concepts, created_at
	FROM queries
	WHERE user_id = $1
		AND status = 'COMPLETED'
		AND created_at >= $2
	ORDER BY created_at DESC, query_id
	LIMIT $3
)
SELECT query_id, user_id, original_query, status, concepts, created_at
FROM recent q
WHERE EXISTS (
	SELECT 1
	FROM responses r
	JOIN feedback f ON f.response_id = r.response_id
	WHERE r.query_id = q.query_id
		AND f.feedback_type IN ('LIKE', 'IMPORTANT')
)
ORDER BY created_at DESC, query_id",
	)
	.bind(user_id)
	.bind(since)
	.bind(window)
	.fetch_all(&mut *executor)
	.await?;

	Ok(rows)
}

/// Positively rated completed queries across the platform, optionally within one department.
pub async fn list_trending_queries(
	executor: &mut PgConnection,
	department: Option<&str>,
	since: OffsetDateTime,
	limit: i64,
) -> Result<Vec<TrendingQuery>> {
	let rows = sqlx::query_as::<_, TrendingQuery>(
		"\
SELECT q.query_id, q.original_query, r.name AS user_name
FROM queries q
JOIN researchers r ON r.user_id = q.user_id
WHERE q.status = 'COMPLETED'
	AND q.created_at >= $1
	AND ($2::text IS NULL OR r.department = $2)
	AND EXISTS (
		SELECT 1
		FROM responses resp
		JOIN feedback f ON f.response_id = resp.response_id
		WHERE resp.query_id = q.query_id
			AND f.feedback_type IN ('LIKE', 'IMPORTANT')
	)
ORDER BY q.created_at DESC, q.query_id
LIMIT $3",
	)
	.bind(since)
	.bind(department)
	.bind(limit)
	.fetch_all(&mut *executor)
	.await?;

	Ok(rows)
}
