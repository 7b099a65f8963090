//! Bounded, process-wide embedding cache keyed by normalized text.

use std::{
	collections::HashMap,
	num::NonZeroUsize,
	sync::{Mutex, MutexGuard, PoisonError},
};

use lru::LruCache;

use crate::EmbeddingProvider;
use nextq_config::EmbeddingProviderConfig;
use nextq_domain::text;

pub struct EmbeddingCache {
	entries: Mutex<LruCache<String, Vec<f32>>>,
}
impl EmbeddingCache {
	pub fn new(capacity: usize) -> Self {
		let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);

		Self { entries: Mutex::new(LruCache::new(capacity)) }
	}

	/// Returns one vector per input text, in input order.
	///
	/// Cached texts are served without a provider call and the remaining distinct texts go out in
	/// one batch. Texts the provider could not embed come back as zero vectors of the configured
	/// dimension and are not cached.
	pub async fn embed_all(
		&self,
		provider: &dyn EmbeddingProvider,
		cfg: &EmbeddingProviderConfig,
		texts: &[String],
	) -> Vec<Vec<f32>> {
		if texts.is_empty() {
			return Vec::new();
		}

		let keys: Vec<String> = texts.iter().map(|raw| text::normalize_key(raw)).collect();
		let mut resolved: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
		let mut missing_keys: Vec<String> = Vec::new();
		let mut missing_texts: Vec<String> = Vec::new();

		{
			let mut entries = self.lock();

			for (idx, key) in keys.iter().enumerate() {
				if let Some(vector) = entries.get(key) {
					resolved[idx] = Some(vector.clone());
				} else if !missing_keys.contains(key) {
					missing_keys.push(key.clone());
					missing_texts.push(texts[idx].clone());
				}
			}
		}

		let mut fetched: HashMap<String, Vec<f32>> = HashMap::new();

		if !missing_texts.is_empty() {
			match provider.embed(cfg, &missing_texts).await {
				Ok(vectors) if vectors.len() == missing_keys.len() => {
					let mut entries = self.lock();

					for (key, vector) in missing_keys.into_iter().zip(vectors) {
						entries.put(key.clone(), vector.clone());
						fetched.insert(key, vector);
					}
				},
				Ok(vectors) => {
					tracing::warn!(
						expected = missing_keys.len(),
						actual = vectors.len(),
						"Embedding provider returned a mismatched batch. Using zero vectors."
					);
				},
				Err(err) => {
					tracing::warn!(
						error = %err,
						count = missing_keys.len(),
						"Embedding provider failed. Using zero vectors."
					);
				},
			}
		}

		let dimensions = cfg.dimensions as usize;

		resolved
			.into_iter()
			.zip(keys)
			.map(|(vector, key)| {
				vector
					.or_else(|| fetched.get(&key).cloned())
					.unwrap_or_else(|| vec![0.0; dimensions])
			})
			.collect()
	}

	fn lock(&self) -> MutexGuard<'_, LruCache<String, Vec<f32>>> {
		self.entries.lock().unwrap_or_else(PoisonError::into_inner)
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};

	use serde_json::Map;

	use super::*;
	use crate::BoxFuture;

	#[derive(Default)]
	struct CountingProvider {
		calls: AtomicUsize,
		texts: AtomicUsize,
	}
	impl EmbeddingProvider for CountingProvider {
		fn embed<'a>(
			&'a self,
			_cfg: &'a EmbeddingProviderConfig,
			texts: &'a [String],
		) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
			Box::pin(async move {
				self.calls.fetch_add(1, Ordering::SeqCst);
				self.texts.fetch_add(texts.len(), Ordering::SeqCst);

				Ok(texts.iter().map(|text| vec![text.len() as f32, 1.0]).collect())
			})
		}
	}

	fn cfg() -> EmbeddingProviderConfig {
		EmbeddingProviderConfig {
			provider_id: "test".to_string(),
			api_base: "http://localhost".to_string(),
			api_key: "test-key".to_string(),
			path: "/embeddings".to_string(),
			model: "test-embedding".to_string(),
			dimensions: 2,
			timeout_ms: 1_000,
			default_headers: Map::new(),
		}
	}

	#[tokio::test]
	async fn cached_texts_skip_the_provider() {
		let cache = EmbeddingCache::new(8);
		let provider = CountingProvider::default();
		let cfg = cfg();
		let first = vec!["Tumor hypoxia".to_string(), " tumor hypoxia ".to_string()];
		let second = vec!["TUMOR HYPOXIA".to_string(), "Immune escape".to_string()];
		let vectors = cache.embed_all(&provider, &cfg, &first).await;

		assert_eq!(vectors.len(), 2);
		assert_eq!(provider.texts.load(Ordering::SeqCst), 1);

		let vectors = cache.embed_all(&provider, &cfg, &second).await;

		assert_eq!(vectors[0], vec!["Tumor hypoxia".len() as f32, 1.0]);
		assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
		assert_eq!(provider.texts.load(Ordering::SeqCst), 2);
	}
}
