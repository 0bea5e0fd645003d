use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub classifier: Classifier,
	pub retrieval: Retrieval,
	pub agent: Agent,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Storage {
	pub qdrant: Qdrant,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Providers {
	pub chat: LlmProviderConfig,
	pub embedding: EmbeddingProviderConfig,
	pub rerank: ProviderConfig,
	pub web_search: WebSearchConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
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

#[derive(Clone, Debug, Deserialize)]
pub struct ProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

/// Web search is an optional capability; a disabled or unconfigured
/// provider yields empty results rather than request failures.
#[derive(Clone, Debug, Deserialize)]
pub struct WebSearchConfig {
	pub enabled: bool,
	#[serde(default)]
	pub endpoint: String,
	#[serde(default)]
	pub api_key: String,
	#[serde(default = "default_web_max_results")]
	pub max_results: u32,
	#[serde(default = "default_web_timeout_ms")]
	pub timeout_ms: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Classifier {
	pub use_llm: bool,
	#[serde(default = "default_high_confidence")]
	pub high_confidence: f32,
	#[serde(default = "default_low_confidence")]
	pub low_confidence: f32,
	#[serde(default = "default_cache_ttl_secs")]
	pub cache_ttl_secs: u64,
	#[serde(default = "default_cache_max_entries")]
	pub cache_max_entries: usize,
	#[serde(default = "default_min_cache_confidence")]
	pub min_cache_confidence: f32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Retrieval {
	#[serde(default = "default_max_rounds")]
	pub max_rounds: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Agent {
	#[serde(default = "default_max_iterations")]
	pub max_iterations: u32,
	#[serde(default = "default_max_sub_questions")]
	pub max_sub_questions: u8,
}

fn default_web_max_results() -> u32 {
	5
}

fn default_web_timeout_ms() -> u64 {
	10_000
}

fn default_high_confidence() -> f32 {
	0.7
}

fn default_low_confidence() -> f32 {
	0.5
}

fn default_cache_ttl_secs() -> u64 {
	300
}

fn default_cache_max_entries() -> usize {
	1_000
}

fn default_min_cache_confidence() -> f32 {
	0.5
}

fn default_max_rounds() -> u32 {
	3
}

fn default_max_iterations() -> u32 {
	5
}

fn default_max_sub_questions() -> u8 {
	5
}
