use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

use sift_domain::document::{Document, sort_by_score_desc};

/// Scores documents against a query. The returned vector aligns with the
/// input document order; documents the provider skips keep a zero score.
pub async fn rerank(
	cfg: &sift_config::ProviderConfig,
	query: &str,
	docs: &[Document],
) -> Result<Vec<f32>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let contents: Vec<&str> = docs.iter().map(|doc| doc.content.as_str()).collect();
	let body = serde_json::json!({
		"model": cfg.model,
		"query": query,
		"documents": contents,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_rerank_response(json, docs.len())
}

/// Applies rerank scores to a document set and keeps the `top_k` best.
pub fn apply_scores(mut docs: Vec<Document>, scores: &[f32], top_k: usize) -> Vec<Document> {
	for (doc, score) in docs.iter_mut().zip(scores) {
		doc.score = *score;
	}

	sort_by_score_desc(&mut docs);

	if top_k > 0 {
		docs.truncate(top_k);
	}

	docs
}

fn parse_rerank_response(json: Value, doc_count: usize) -> Result<Vec<f32>> {
	let mut scores = vec![0.0f32; doc_count];
	let results = json
		.get("results")
		.or_else(|| json.get("data"))
		.and_then(|v| v.as_array())
		.ok_or_else(|| eyre::eyre!("Rerank response is missing results array."))?;

	for item in results {
		let index = item
			.get("index")
			.and_then(|v| v.as_u64())
			.ok_or_else(|| eyre::eyre!("Rerank result missing index."))? as usize;
		let score = item
			.get("relevance_score")
			.or_else(|| item.get("score"))
			.and_then(|v| v.as_f64())
			.ok_or_else(|| eyre::eyre!("Rerank result missing score."))? as f32;

		if index < scores.len() {
			scores[index] = score;
		}
	}

	Ok(scores)
}
