use serde_json::Value;
use sqlx::PgConnection;
use time::OffsetDateTime;

use crate::{Result, models::CacheEntry};

pub async fn get_entry(
	executor: &mut PgConnection,
	key: &str,
	now: OffsetDateTime,
) -> Result<Option<CacheEntry>> {
	let row = sqlx::query_as::<_, CacheEntry>(
		"\
SELECT cache_key, payload, created_at, expires_at
FROM suggestion_cache
WHERE cache_key = $1
	AND expires_at > $2",
	)
	.bind(key)
	.bind(now)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}

pub async fn put_entry(
	executor: &mut PgConnection,
	key: &str,
	payload: &Value,
	now: OffsetDateTime,
	expires_at: OffsetDateTime,
) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO suggestion_cache (cache_key, payload, created_at, expires_at)
VALUES ($1, $2, $3, $4)
ON CONFLICT (cache_key) DO UPDATE
SET
	payload = EXCLUDED.payload,
	created_at = EXCLUDED.created_at,
	expires_at = EXCLUDED.expires_at",
	)
	.bind(key)
	.bind(payload)
	.bind(now)
	.bind(expires_at)
	.execute(&mut *executor)
	.await?;

	Ok(())
}

pub async fn delete_entry(executor: &mut PgConnection, key: &str) -> Result<()> {
	sqlx::query("DELETE FROM suggestion_cache WHERE cache_key = $1")
		.bind(key)
		.execute(&mut *executor)
		.await?;

	Ok(())
}

pub async fn purge_expired(executor: &mut PgConnection, now: OffsetDateTime) -> Result<u64> {
	let result = sqlx::query("DELETE FROM suggestion_cache WHERE expires_at <= $1")
		.bind(now)
		.execute(&mut *executor)
		.await?;

	Ok(result.rows_affected())
}
