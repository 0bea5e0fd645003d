mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Agent, Classifier, Config, EmbeddingProviderConfig, LlmProviderConfig, ProviderConfig,
	Providers, Qdrant, Retrieval, Service, Storage, WebSearchConfig,
};

use std::{fs, path::Path};

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
	if cfg.storage.qdrant.vector_dim == 0 {
		return Err(Error::Validation {
			message: "storage.qdrant.vector_dim must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}

	for (label, key) in [
		("chat", &cfg.providers.chat.api_key),
		("embedding", &cfg.providers.embedding.api_key),
		("rerank", &cfg.providers.rerank.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	for (label, value) in [
		("classifier.high_confidence", cfg.classifier.high_confidence),
		("classifier.low_confidence", cfg.classifier.low_confidence),
		("classifier.min_cache_confidence", cfg.classifier.min_cache_confidence),
	] {
		if !(0.0..=1.0).contains(&value) {
			return Err(Error::Validation {
				message: format!("{label} must be in the range 0.0-1.0."),
			});
		}
	}

	if cfg.classifier.low_confidence > cfg.classifier.high_confidence {
		return Err(Error::Validation {
			message: "classifier.low_confidence must not exceed classifier.high_confidence."
				.to_string(),
		});
	}
	if cfg.classifier.cache_ttl_secs == 0 {
		return Err(Error::Validation {
			message: "classifier.cache_ttl_secs must be greater than zero.".to_string(),
		});
	}
	if cfg.classifier.cache_max_entries == 0 {
		return Err(Error::Validation {
			message: "classifier.cache_max_entries must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.max_rounds == 0 {
		return Err(Error::Validation {
			message: "retrieval.max_rounds must be greater than zero.".to_string(),
		});
	}
	if cfg.agent.max_iterations == 0 {
		return Err(Error::Validation {
			message: "agent.max_iterations must be greater than zero.".to_string(),
		});
	}
	if !(1..=5).contains(&cfg.agent.max_sub_questions) {
		return Err(Error::Validation {
			message: "agent.max_sub_questions must be in the range 1-5.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.providers.web_search.endpoint = cfg.providers.web_search.endpoint.trim().to_string();
	cfg.providers.web_search.api_key = cfg.providers.web_search.api_key.trim().to_string();
}

#[cfg(test)]
mod tests {
	use super::*;

	fn base_toml() -> String {
		r#"
[service]
http_bind = "127.0.0.1:8080"
log_level = "info"

[storage.qdrant]
url        = "http://127.0.0.1:6334"
collection = "sift"
vector_dim = 4

[providers.chat]
provider_id = "openai"
api_base    = "https://api.example.com"
api_key     = "k"
path        = "/v1/chat/completions"
model       = "m"
temperature = 0.0
timeout_ms  = 30000

[providers.embedding]
provider_id = "openai"
api_base    = "https://api.example.com"
api_key     = "k"
path        = "/v1/embeddings"
model       = "m"
dimensions  = 4
timeout_ms  = 30000

[providers.rerank]
provider_id = "jina"
api_base    = "https://api.example.com"
api_key     = "k"
path        = "/v1/rerank"
model       = "m"
timeout_ms  = 30000

[providers.web_search]
enabled = false

[classifier]
use_llm = true

[retrieval]

[agent]
"#
		.to_string()
	}

	#[test]
	fn parses_with_defaults() {
		let cfg: Config = toml::from_str(&base_toml()).expect("parse failed");

		assert_eq!(cfg.classifier.high_confidence, 0.7);
		assert_eq!(cfg.classifier.low_confidence, 0.5);
		assert_eq!(cfg.retrieval.max_rounds, 3);
		assert_eq!(cfg.agent.max_iterations, 5);
		assert!(validate(&cfg).is_ok());
	}

	#[test]
	fn rejects_dimension_mismatch() {
		let toml_text = base_toml().replace("vector_dim = 4", "vector_dim = 8");
		let cfg: Config = toml::from_str(&toml_text).expect("parse failed");

		assert!(validate(&cfg).is_err());
	}

	#[test]
	fn rejects_inverted_thresholds() {
		let mut cfg: Config = toml::from_str(&base_toml()).expect("parse failed");

		cfg.classifier.low_confidence = 0.9;

		assert!(validate(&cfg).is_err());
	}
}
