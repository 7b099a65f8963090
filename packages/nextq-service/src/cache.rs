//! Fast ranked-list cache in front of the pipeline.

use std::{
	collections::HashMap,
	sync::{Mutex, MutexGuard, PoisonError},
};

use serde_json::Value;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{BoxFuture, CacheStore, Context, RankedQuestion, Result};

const KEY_PREFIX: &str = "suggested_questions";

pub fn cache_key(user_id: Uuid) -> String {
	format!("{KEY_PREFIX}:{user_id}")
}

/// Returns the cached list for `user_id`. Store errors and undecodable payloads count as a miss.
pub async fn load_cached(ctx: &Context, user_id: Uuid) -> Option<Vec<RankedQuestion>> {
	let key = cache_key(user_id);
	let payload = match ctx.stores.cache.get(&key, OffsetDateTime::now_utc()).await {
		Ok(payload) => payload?,
		Err(err) => {
			tracing::warn!(error = %err, user_id = %user_id, "Failed to read suggestion cache.");

			return None;
		},
	};

	match serde_json::from_value(payload) {
		Ok(questions) => Some(questions),
		Err(err) => {
			tracing::warn!(error = %err, user_id = %user_id, "Discarding undecodable cache entry.");

			None
		},
	}
}

/// Writes the ranked list with the configured TTL. Failures are logged and ignored.
pub async fn store_cached(ctx: &Context, user_id: Uuid, questions: &[RankedQuestion]) {
	let payload = match serde_json::to_value(questions) {
		Ok(payload) => payload,
		Err(err) => {
			tracing::warn!(error = %err, user_id = %user_id, "Failed to encode cache entry.");

			return;
		},
	};
	let key = cache_key(user_id);
	let ttl = Duration::seconds(ctx.cfg.cache.ttl_seconds);

	if let Err(err) = ctx.stores.cache.set(&key, &payload, OffsetDateTime::now_utc(), ttl).await {
		tracing::warn!(error = %err, user_id = %user_id, "Failed to write suggestion cache.");
	}
}

/// In-process cache. An expired entry is dropped when it is read, and every write sweeps the
/// expired entries of all keys, so the map only holds lists written within the last TTL.
#[derive(Default)]
pub struct MemoryCache {
	entries: Mutex<HashMap<String, (Value, OffsetDateTime)>>,
}
impl MemoryCache {
	#[cfg(test)]
	fn len(&self) -> usize {
		self.lock().len()
	}

	#[cfg(test)]
	fn is_empty(&self) -> bool {
		self.lock().is_empty()
	}

	fn lock(&self) -> MutexGuard<'_, HashMap<String, (Value, OffsetDateTime)>> {
		self.entries.lock().unwrap_or_else(PoisonError::into_inner)
	}
}

impl CacheStore for MemoryCache {
	fn get<'a>(
		&'a self,
		key: &'a str,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Option<Value>>> {
		Box::pin(async move {
			let mut entries = self.lock();
			let Some((payload, expires_at)) = entries.get(key) else {
				return Ok(None);
			};

			if *expires_at > now {
				return Ok(Some(payload.clone()));
			}

			entries.remove(key);

			Ok(None)
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
			let mut entries = self.lock();

			entries.retain(|_, (_, expires_at)| *expires_at > now);
			entries.insert(key.to_string(), (payload.clone(), now + ttl));

			Ok(())
		})
	}

	fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			self.lock().remove(key);

			Ok(())
		})
	}

	fn purge_expired<'a>(&'a self, now: OffsetDateTime) -> BoxFuture<'a, Result<u64>> {
		Box::pin(async move {
			let mut entries = self.lock();
			let before = entries.len();

			entries.retain(|_, (_, expires_at)| *expires_at > now);

			Ok((before - entries.len()) as u64)
		})
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[tokio::test]
	async fn entries_expire_after_their_ttl() {
		let cache = MemoryCache::default();
		let now = OffsetDateTime::now_utc();
		let payload = json!([{"question": "q"}]);

		cache.set("k", &payload, now, Duration::seconds(300)).await.expect("Failed to set.");

		let fresh = cache.get("k", now + Duration::seconds(299)).await.expect("Failed to get.");
		let stale = cache.get("k", now + Duration::seconds(300)).await.expect("Failed to get.");

		assert_eq!(fresh, Some(payload));
		assert_eq!(stale, None);
		assert!(cache.is_empty());
	}

	#[tokio::test]
	async fn purge_drops_only_expired_entries() {
		let cache = MemoryCache::default();
		let now = OffsetDateTime::now_utc();

		cache.set("old", &json!(1), now, Duration::seconds(1)).await.expect("Failed to set.");
		cache.set("new", &json!(2), now, Duration::seconds(600)).await.expect("Failed to set.");

		let purged =
			cache.purge_expired(now + Duration::seconds(60)).await.expect("Failed to purge.");

		assert_eq!(purged, 1);
		assert_eq!(cache.len(), 1);
	}

	#[tokio::test]
	async fn writes_evict_expired_entries_of_other_keys() {
		let cache = MemoryCache::default();
		let now = OffsetDateTime::now_utc();
		let ttl = Duration::seconds(300);

		for idx in 0..50 {
			cache.set(&format!("user-{idx}"), &json!(idx), now, ttl).await.expect("Failed to set.");
		}

		assert_eq!(cache.len(), 50);

		let later = now + Duration::seconds(301);

		cache.set("returning", &json!("fresh"), later, ttl).await.expect("Failed to set.");

		assert_eq!(cache.len(), 1);
		assert_eq!(
			cache.get("returning", later).await.expect("Failed to get."),
			Some(json!("fresh"))
		);
	}

	#[test]
	fn keys_are_namespaced_by_user() {
		assert_eq!(
			cache_key(Uuid::nil()),
			"suggested_questions:00000000-0000-0000-0000-000000000000"
		);
	}
}
