//! Concept graph traversals keyed by the names of a user's own concepts.
//!
//! Relations are stored once per pair and walked in both directions.

use sqlx::PgConnection;
use time::OffsetDateTime;

use crate::{Result, models::ConceptHit};

const EDGES_CTE: &str = "\
edges AS (
	SELECT source_id AS a, target_id AS b FROM concept_relations
	UNION ALL
	SELECT target_id AS a, source_id AS b FROM concept_relations
),
seeds AS (
	SELECT concept_id, name FROM concepts WHERE name = ANY($1::text[])
),
paths AS (
	SELECT s.concept_id AS seed_id, s.name AS via, e1.b AS reached
	FROM seeds s
	JOIN edges e1 ON e1.a = s.concept_id
	UNION ALL
	SELECT s.concept_id, s.name, e2.b
	FROM seeds s
	JOIN edges e1 ON e1.a = s.concept_id
	JOIN edges e2 ON e2.a = e1.b
	WHERE e2.b <> s.concept_id
)";

/// Concepts one or two hops from the user's concepts that the user has not touched, ranked by
/// the number of connecting paths.
pub async fn unexplored_neighbors(
	executor: &mut PgConnection,
	user_concepts: &[String],
	limit: i64,
) -> Result<Vec<ConceptHit>> {
	if user_concepts.is_empty() {
		return Ok(vec![]);
	}

	let sql = format!(
		"\
WITH {EDGES_CTE}
SELECT
	c.name AS concept,
	c.category,
	(array_agg(DISTINCT p.via ORDER BY p.via))[1:3] AS via_concepts,
	count(*) AS connection_count,
	0::bigint AS cluster_size
FROM paths p
JOIN concepts c ON c.concept_id = p.reached
WHERE NOT (c.name = ANY($1::text[]))
GROUP BY c.concept_id, c.name, c.category
ORDER BY connection_count DESC, c.name
LIMIT $2"
	);
	let rows = sqlx::query_as::<_, ConceptHit>(&sql)
		.bind(user_concepts)
		.bind(limit)
		.fetch_all(&mut *executor)
		.await?;

	Ok(rows)
}

/// Concepts outside the user's set that sit directly between at least two of the user's
/// concepts. `connection_count` is the number of distinct user concepts bridged.
pub async fn bridge_concepts(
	executor: &mut PgConnection,
	user_concepts: &[String],
	limit: i64,
) -> Result<Vec<ConceptHit>> {
	if user_concepts.len() < 2 {
		return Ok(vec![]);
	}

	let sql = format!(
		"\
WITH {EDGES_CTE}
SELECT
	c.name AS concept,
	c.category,
	array_agg(DISTINCT s.name ORDER BY s.name) AS via_concepts,
	count(DISTINCT s.concept_id) AS connection_count,
	0::bigint AS cluster_size
FROM seeds s
JOIN edges e ON e.a = s.concept_id
JOIN concepts c ON c.concept_id = e.b
WHERE NOT (c.name = ANY($1::text[]))
GROUP BY c.concept_id, c.name, c.category
HAVING count(DISTINCT s.concept_id) >= 2
ORDER BY connection_count DESC, c.name
LIMIT $2"
	);
	let rows = sqlx::query_as::<_, ConceptHit>(&sql)
		.bind(user_concepts)
		.bind(limit)
		.fetch_all(&mut *executor)
		.await?;

	Ok(rows)
}

/// Among the `top_active` concepts with the most papers published since `since`, those within
/// two hops of the user's concepts. `connection_count` is the recent paper count.
pub async fn trending_concepts(
	executor: &mut PgConnection,
	user_concepts: &[String],
	since: OffsetDateTime,
	top_active: i64,
	limit: i64,
) -> Result<Vec<ConceptHit>> {
	if user_concepts.is_empty() {
		return Ok(vec![]);
	}

	let sql = format!(
		"\
WITH {EDGES_CTE},
active AS (
	SELECT concept_id, count(*) AS recent_papers
	FROM concept_papers
	WHERE published_at > $2
	GROUP BY concept_id
	ORDER BY recent_papers DESC, concept_id
	LIMIT $3
)
SELECT
	c.name AS concept,
	c.category,
	(array_agg(DISTINCT p.via ORDER BY p.via))[1:2] AS via_concepts,
	max(a.recent_papers) AS connection_count,
	0::bigint AS cluster_size
FROM active a
JOIN paths p ON p.reached = a.concept_id
JOIN concepts c ON c.concept_id = a.concept_id
GROUP BY c.concept_id, c.name, c.category
ORDER BY connection_count DESC, c.name
LIMIT $4"
	);
	let rows = sqlx::query_as::<_, ConceptHit>(&sql)
		.bind(user_concepts)
		.bind(since)
		.bind(top_active)
		.bind(limit)
		.fetch_all(&mut *executor)
		.await?;

	Ok(rows)
}

/// Unexplored concepts reached by at least `min_strength` paths whose own unexplored
/// neighborhood holds at least `min_cluster` concepts.
pub async fn dense_clusters(
	executor: &mut PgConnection,
	user_concepts: &[String],
	min_strength: i64,
	min_cluster: i64,
	limit: i64,
) -> Result<Vec<ConceptHit>> {
	if user_concepts.is_empty() {
		return Ok(vec![]);
	}

	let sql = format!(
		"\
WITH {EDGES_CTE},
strength AS (
	SELECT p.reached, count(*) AS connection_strength
	FROM paths p
	JOIN concepts c ON c.concept_id = p.reached
	WHERE NOT (c.name = ANY($1::text[]))
	GROUP BY p.reached
	HAVING count(*) >= $2
),
sizes AS (
	SELECT st.reached, count(DISTINCT n.concept_id) AS cluster_size
	FROM strength st
	JOIN edges e ON e.a = st.reached
	JOIN concepts n ON n.concept_id = e.b
	WHERE NOT (n.name = ANY($1::text[]))
	GROUP BY st.reached
	HAVING count(DISTINCT n.concept_id) >= $3
)
SELECT
	c.name AS concept,
	c.category,
	ARRAY[]::text[] AS via_concepts,
	st.connection_strength AS connection_count,
	sz.cluster_size
FROM strength st
JOIN sizes sz ON sz.reached = st.reached
JOIN concepts c ON c.concept_id = st.reached
ORDER BY connection_count DESC, sz.cluster_size DESC, c.name
LIMIT $4"
	);
	let rows = sqlx::query_as::<_, ConceptHit>(&sql)
		.bind(user_concepts)
		.bind(min_strength)
		.bind(min_cluster)
		.bind(limit)
		.fetch_all(&mut *executor)
		.await?;

	Ok(rows)
}
