use serde_json::{Map, Value};

use sift_config::Config;
use sift_providers::web_search::to_documents;

use crate::{
	AgentError, AgentResult, BoxFuture, Providers, RetrievalRequest, Retriever,
	tool::{Tool, ToolOutput},
};

pub const RETRIEVAL_TOOL_NAME: &str = "rag_retriever";
pub const WEB_SEARCH_TOOL_NAME: &str = "web_search";

const DEFAULT_TOP_K: u32 = 5;
const DEFAULT_SCORE: f32 = 0.2;

/// Knowledge-base retrieval as an agent-invocable capability.
pub struct RetrievalTool {
	cfg: Config,
	providers: Providers,
}
impl RetrievalTool {
	pub fn new(cfg: Config, providers: Providers) -> Self {
		Self { cfg, providers }
	}
}
impl Tool for RetrievalTool {
	fn name(&self) -> &str {
		RETRIEVAL_TOOL_NAME
	}

	fn description(&self) -> &str {
		"Search documents from a knowledge base using semantic similarity. \
		Use this tool to retrieve relevant information for answering questions."
	}

	fn execute<'a>(&'a self, input: &'a Map<String, Value>) -> BoxFuture<'a, AgentResult<ToolOutput>> {
		Box::pin(async move {
			let query = string_field(input, "query");

			if query.is_empty() {
				return Err(AgentError::Validation { message: "query is required".to_string() });
			}

			let knowledge_name = string_field(input, "knowledge_name");

			if knowledge_name.is_empty() {
				return Err(AgentError::Validation {
					message: "knowledge_name is required".to_string(),
				});
			}

			let top_k = u32_field(input, "top_k").unwrap_or(DEFAULT_TOP_K);
			let score = f32_field(input, "score").unwrap_or(DEFAULT_SCORE);
			let retriever = Retriever::new(self.cfg.clone(), self.providers.clone());
			let documents = retriever
				.retrieve(&RetrievalRequest {
					query,
					top_k: if top_k == 0 { DEFAULT_TOP_K } else { top_k },
					score_threshold: score,
					knowledge_name,
				})
				.await?;
			let payload = serde_json::json!({ "count": documents.len() });

			Ok(ToolOutput { documents, payload })
		})
	}
}

/// Internet search as an agent-invocable capability. Disabled or
/// unconfigured search yields an empty, labeled result rather than an
/// error, so reasoning loops keep moving.
pub struct WebSearchTool {
	cfg: Config,
	providers: Providers,
}
impl WebSearchTool {
	pub fn new(cfg: Config, providers: Providers) -> Self {
		Self { cfg, providers }
	}

	fn labeled_output(source: &str, query: &str) -> ToolOutput {
		ToolOutput {
			documents: Vec::new(),
			payload: serde_json::json!({ "results": [], "source": source, "query": query }),
		}
	}
}
impl Tool for WebSearchTool {
	fn name(&self) -> &str {
		WEB_SEARCH_TOOL_NAME
	}

	fn description(&self) -> &str {
		"Search the internet for the latest information and real-time data. \
		Use this tool to retrieve up-to-date information that may not be present in the knowledge base."
	}

	fn execute<'a>(&'a self, input: &'a Map<String, Value>) -> BoxFuture<'a, AgentResult<ToolOutput>> {
		Box::pin(async move {
			let web_cfg = &self.cfg.providers.web_search;
			let query = string_field(input, "query");

			if !web_cfg.enabled {
				return Ok(Self::labeled_output("disabled", &query));
			}
			if query.is_empty() {
				return Ok(Self::labeled_output("invalid_input", &query));
			}
			if !sift_providers::web_search::is_configured(web_cfg) {
				return Ok(Self::labeled_output("not_configured", &query));
			}

			let max_results = u32_field(input, "max_results").unwrap_or(web_cfg.max_results);

			match self.providers.web.search(web_cfg, &query, max_results).await {
				Ok(items) => {
					let documents = to_documents(&items);
					let payload = serde_json::json!({
						"results": items,
						"source": "web",
						"query": query,
					});

					Ok(ToolOutput { documents, payload })
				},
				Err(err) => {
					tracing::warn!(error = %err, "Web search failed, returning empty result.");

					Ok(Self::labeled_output("error", &query))
				},
			}
		})
	}
}

fn string_field(input: &Map<String, Value>, key: &str) -> String {
	input.get(key).and_then(|v| v.as_str()).unwrap_or_default().trim().to_string()
}

fn u32_field(input: &Map<String, Value>, key: &str) -> Option<u32> {
	match input.get(key)? {
		Value::Number(number) => number.as_u64().map(|v| v as u32),
		Value::String(text) => text.parse().ok(),
		_ => None,
	}
}

fn f32_field(input: &Map<String, Value>, key: &str) -> Option<f32> {
	match input.get(key)? {
		Value::Number(number) => number.as_f64().map(|v| v as f32),
		Value::String(text) => text.parse().ok(),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fields_coerce_from_numbers_and_strings() {
		let mut input = Map::new();

		input.insert("top_k".to_string(), Value::from(7));
		input.insert("score".to_string(), Value::String("1.5".to_string()));
		input.insert("query".to_string(), Value::String("  padded  ".to_string()));

		assert_eq!(u32_field(&input, "top_k"), Some(7));
		assert_eq!(f32_field(&input, "score"), Some(1.5));
		assert_eq!(string_field(&input, "query"), "padded");
		assert_eq!(string_field(&input, "missing"), "");
	}
}
