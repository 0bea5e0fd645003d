use std::collections::HashMap;

use sift_config::Config;
use sift_domain::{
	document::{Document, merge_by_id, rank_score, sort_by_score_desc},
	intent::now_rfc3339,
	message::ChatMessage,
};
use sift_providers::rerank::apply_scores;
use sift_storage::qdrant::{CONTENT_VECTOR_NAME, QA_VECTOR_NAME};

use crate::{AgentError, AgentResult, Providers};

#[derive(Clone, Debug)]
pub struct RetrievalRequest {
	pub query: String,
	pub top_k: u32,
	/// Consumer-facing threshold; vendor similarity scores arrive on a
	/// 1-2 scale, hence the rank-score shift before filtering.
	pub score_threshold: f32,
	pub knowledge_name: String,
}

/// Iterative retrieve-rewrite-rerank-merge pipeline. Each round rewrites
/// the query (steered away from previously used rewrites), probes both
/// vector fields, reranks the merged candidates, and folds survivors into
/// a cross-round accumulator that keeps the best score per document id.
pub struct Retriever {
	cfg: Config,
	providers: Providers,
}
impl Retriever {
	pub fn new(cfg: Config, providers: Providers) -> Self {
		Self { cfg, providers }
	}

	pub async fn retrieve(&self, req: &RetrievalRequest) -> AgentResult<Vec<Document>> {
		let rank_cutoff = rank_score(req.score_threshold);
		let top_k = req.top_k.max(1);
		let mut used: Vec<String> = Vec::new();
		let mut accumulator: HashMap<String, Document> = HashMap::new();
		let mut search_successes = 0u32;
		let mut search_errors = 0u32;

		for round in 0..self.cfg.retrieval.max_rounds {
			let optimized = match self.rewrite_query(&req.query, &used, &req.knowledge_name).await {
				Ok(rewrite) if !rewrite.trim().is_empty() => rewrite.trim().to_string(),
				Ok(_) => req.query.clone(),
				Err(err) => {
					tracing::warn!(round, error = %err, "Query rewrite failed, using raw query.");

					req.query.clone()
				},
			};

			used.push(optimized.clone());

			let mut candidates = Vec::new();

			for field in [CONTENT_VECTOR_NAME, QA_VECTOR_NAME] {
				match self
					.providers
					.store
					.search(
						&self.cfg,
						&optimized,
						field,
						&req.knowledge_name,
						top_k,
						req.score_threshold,
					)
					.await
				{
					Ok(docs) => {
						search_successes += 1;
						candidates.extend(docs);
					},
					Err(err) => {
						search_errors += 1;
						tracing::warn!(round, field, error = %err, "Field search failed.");
					},
				}
			}

			if candidates.is_empty() {
				continue;
			}

			let merged = merge_by_id(candidates);
			let ranked = match self
				.providers
				.reranker
				.rerank(&self.cfg.providers.rerank, &optimized, &merged)
				.await
			{
				Ok(scores) => apply_scores(merged, &scores, top_k as usize),
				Err(err) => {
					tracing::warn!(round, error = %err, "Rerank failed, keeping retrieval order.");

					let mut fallback = merged;

					fallback.truncate(top_k as usize);

					fallback
				},
			};

			for doc in ranked {
				if doc.score < rank_cutoff {
					tracing::debug!(id = %doc.id, score = doc.score, "Below rank cutoff.");

					continue;
				}

				match accumulator.get(&doc.id) {
					Some(existing) if existing.score >= doc.score => {},
					_ => {
						accumulator.insert(doc.id.clone(), doc);
					},
				}
			}
		}

		// Zero results from working searches is a normal outcome; zero
		// results because every search call failed is not.
		if search_successes == 0 && search_errors > 0 {
			return Err(AgentError::Upstream {
				message: "every retrieval search failed".to_string(),
			});
		}

		let mut out: Vec<Document> = accumulator.into_values().collect();

		sort_by_score_desc(&mut out);
		out.truncate(top_k as usize);

		Ok(out)
	}

	async fn rewrite_query(
		&self,
		question: &str,
		used: &[String],
		knowledge_name: &str,
	) -> color_eyre::Result<String> {
		let messages = build_rewrite_messages(question, used, knowledge_name);
		let response = self.providers.chat.generate(&self.cfg.providers.chat, &messages).await?;

		Ok(response.content)
	}
}

fn build_rewrite_messages(
	question: &str,
	used: &[String],
	knowledge_name: &str,
) -> Vec<ChatMessage> {
	let system = format!(
		"You are very skilled at using rag for data retrieval. \
		Your goal is to perform vectorized retrieval after fully understanding the user's question. \
		Current time {now}. \
		The target knowledge base is named {knowledge_name:?}; do not simply echo that name as a keyword. \
		You need to extract and optimize the search query content. \
		Please rewrite the query according to the following rules: \n \
		- Rewrite the keywords that should be searched based on the user's question and context.\n\
		- If time is required, the specific date and time information to be queried will be provided based on the current time.\n\
		- Keep your search concise; your search should typically contain no more than three keywords, and at most five.\n\
		- Rewrite the keywords according to the current search engine query habits, and directly return the optimized search terms without any additional explanation.\n\
		- Try to avoid using the keywords listed below, as previous searches using these keywords did not yield the expected results.\n\
		- Keywords already used: {used}\n",
		now = now_rfc3339(),
		used = used.join(" "),
	);

	vec![
		ChatMessage::system(system),
		ChatMessage::user(format!("The following are user questions: {question}")),
	]
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rewrite_prompt_carries_used_keywords_and_kb_name() {
		let messages = build_rewrite_messages(
			"why is retrieval slow",
			&["vector index latency".to_string(), "qdrant tuning".to_string()],
			"ops-kb",
		);

		assert_eq!(messages.len(), 2);
		assert!(messages[0].content.contains("vector index latency qdrant tuning"));
		assert!(messages[0].content.contains("ops-kb"));
		assert!(messages[1].content.contains("why is retrieval slow"));
	}
}
