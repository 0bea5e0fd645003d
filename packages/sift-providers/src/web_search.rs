use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use sift_domain::document::Document;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WebSearchItem {
	pub title: String,
	pub url: String,
	pub snippet: String,
}

pub fn is_configured(cfg: &sift_config::WebSearchConfig) -> bool {
	!cfg.endpoint.is_empty() && !cfg.api_key.is_empty()
}

/// Bing-compatible web search. Transport and protocol failures are real
/// errors here; operational gating (disabled, unconfigured) is the
/// caller's concern.
pub async fn search(
	cfg: &sift_config::WebSearchConfig,
	query: &str,
	max_results: u32,
) -> Result<Vec<WebSearchItem>> {
	if query.is_empty() {
		return Ok(Vec::new());
	}

	let count = if max_results == 0 { cfg.max_results.max(1) } else { max_results };
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let res = client
		.get(&cfg.endpoint)
		.query(&[("q", query), ("count", &count.to_string())])
		.header("Ocp-Apim-Subscription-Key", &cfg.api_key)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_search_response(json)
}

/// Web results carry no store id; the snippet becomes the document
/// content and title/url land in metadata.
pub fn to_documents(items: &[WebSearchItem]) -> Vec<Document> {
	items
		.iter()
		.map(|item| {
			let mut metadata = serde_json::Map::new();

			metadata.insert("title".to_string(), Value::String(item.title.clone()));
			metadata.insert("url".to_string(), Value::String(item.url.clone()));
			metadata.insert("source".to_string(), Value::String("web_search".to_string()));

			Document {
				id: String::new(),
				content: item.snippet.clone(),
				score: 0.0,
				metadata,
			}
		})
		.collect()
}

fn parse_search_response(json: Value) -> Result<Vec<WebSearchItem>> {
	let values = json
		.get("webPages")
		.and_then(|v| v.get("value"))
		.and_then(|v| v.as_array())
		.ok_or_else(|| eyre::eyre!("Web search response is missing webPages.value."))?;
	let mut items = Vec::with_capacity(values.len());

	for value in values {
		let title = value.get("name").and_then(|v| v.as_str()).unwrap_or_default();
		let url = value.get("url").and_then(|v| v.as_str()).unwrap_or_default();
		let snippet = value.get("snippet").and_then(|v| v.as_str()).unwrap_or_default();

		items.push(WebSearchItem {
			title: title.to_string(),
			url: url.to_string(),
			snippet: snippet.to_string(),
		});
	}

	Ok(items)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_bing_shaped_response() {
		let json = serde_json::json!({
			"webPages": {
				"value": [
					{ "name": "t", "url": "https://example.com", "snippet": "s" }
				]
			}
		});
		let items = parse_search_response(json).expect("parse failed");
		assert_eq!(items.len(), 1);
		assert_eq!(items[0].title, "t");
	}

	#[test]
	fn missing_web_pages_is_an_error() {
		assert!(parse_search_response(serde_json::json!({})).is_err());
	}

	#[test]
	fn converted_documents_carry_url_metadata() {
		let items = vec![WebSearchItem {
			title: "t".to_string(),
			url: "https://example.com".to_string(),
			snippet: "snippet text".to_string(),
		}];
		let docs = to_documents(&items);
		assert_eq!(docs[0].content, "snippet text");
		assert_eq!(
			docs[0].metadata.get("url").and_then(|v| v.as_str()),
			Some("https://example.com")
		);
	}
}
