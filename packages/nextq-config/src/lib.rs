mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Cache, Config, EmbeddingProviderConfig, LlmProviderConfig, Postgres, Providers, Service,
	Storage, Suggestions, Worker,
};

use std::{fs, path::Path};

pub const CACHE_BACKEND_POSTGRES: &str = "postgres";
pub const CACHE_BACKEND_MEMORY: &str = "memory";

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}

	for (label, key) in
		[("embedding", &cfg.providers.embedding.api_key), ("llm", &cfg.providers.llm.api_key)]
	{
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	let suggestions = &cfg.suggestions;

	if suggestions.max_limit == 0 {
		return Err(Error::Validation {
			message: "suggestions.max_limit must be greater than zero.".to_string(),
		});
	}
	if suggestions.default_limit == 0 || suggestions.default_limit > suggestions.max_limit {
		return Err(Error::Validation {
			message: "suggestions.default_limit must be in the range 1-max_limit.".to_string(),
		});
	}
	if suggestions.record_ttl_hours <= 0 {
		return Err(Error::Validation {
			message: "suggestions.record_ttl_hours must be greater than zero.".to_string(),
		});
	}
	if suggestions.embedding_cache_capacity == 0 {
		return Err(Error::Validation {
			message: "suggestions.embedding_cache_capacity must be greater than zero.".to_string(),
		});
	}
	if !matches!(cfg.cache.backend.as_str(), CACHE_BACKEND_POSTGRES | CACHE_BACKEND_MEMORY) {
		return Err(Error::Validation {
			message: "cache.backend must be one of postgres or memory.".to_string(),
		});
	}
	if cfg.cache.ttl_seconds <= 0 {
		return Err(Error::Validation {
			message: "cache.ttl_seconds must be greater than zero.".to_string(),
		});
	}
	if cfg.worker.cleanup_interval_seconds <= 0 {
		return Err(Error::Validation {
			message: "worker.cleanup_interval_seconds must be greater than zero.".to_string(),
		});
	}
	if cfg.worker.poll_interval_ms == 0 {
		return Err(Error::Validation {
			message: "worker.poll_interval_ms must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.cache.backend = cfg.cache.backend.trim().to_ascii_lowercase();
	cfg.providers.embedding.api_base =
		cfg.providers.embedding.api_base.trim_end_matches('/').to_string();
	cfg.providers.llm.api_base = cfg.providers.llm.api_base.trim_end_matches('/').to_string();
}
