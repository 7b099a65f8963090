use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub suggestions: Suggestions,
	#[serde(default)]
	pub cache: Cache,
	#[serde(default)]
	pub worker: Worker,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub llm: LlmProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Suggestions {
	/// Number of questions returned when the caller does not ask for a specific count.
	#[serde(default = "default_limit")]
	pub default_limit: u32,
	#[serde(default = "default_max_limit")]
	pub max_limit: u32,
	/// Minimum number of ranked questions kept for persistence and caching.
	#[serde(default = "default_retain_min")]
	pub retain_min: u32,
	#[serde(default = "default_record_ttl_hours")]
	pub record_ttl_hours: i64,
	#[serde(default = "default_embedding_cache_capacity")]
	pub embedding_cache_capacity: usize,
}
impl Default for Suggestions {
	fn default() -> Self {
		Self {
			default_limit: default_limit(),
			max_limit: default_max_limit(),
			retain_min: default_retain_min(),
			record_ttl_hours: default_record_ttl_hours(),
			embedding_cache_capacity: default_embedding_cache_capacity(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cache {
	/// Either "postgres" or "memory".
	#[serde(default = "default_cache_backend")]
	pub backend: String,
	#[serde(default = "default_cache_ttl_seconds")]
	pub ttl_seconds: i64,
}
impl Default for Cache {
	fn default() -> Self {
		Self { backend: default_cache_backend(), ttl_seconds: default_cache_ttl_seconds() }
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Worker {
	#[serde(default = "default_cleanup_interval_seconds")]
	pub cleanup_interval_seconds: i64,
	#[serde(default = "default_poll_interval_ms")]
	pub poll_interval_ms: u64,
}
impl Default for Worker {
	fn default() -> Self {
		Self {
			cleanup_interval_seconds: default_cleanup_interval_seconds(),
			poll_interval_ms: default_poll_interval_ms(),
		}
	}
}

fn default_limit() -> u32 {
	5
}

fn default_max_limit() -> u32 {
	20
}

fn default_retain_min() -> u32 {
	10
}

fn default_record_ttl_hours() -> i64 {
	24
}

fn default_embedding_cache_capacity() -> usize {
	1_000
}

fn default_cache_backend() -> String {
	"postgres".to_string()
}

fn default_cache_ttl_seconds() -> i64 {
	300
}

fn default_cleanup_interval_seconds() -> i64 {
	900
}

fn default_poll_interval_ms() -> u64 {
	5_000
}
