use sift_config::Config;
use sift_domain::{
	document::{Document, truncate_chars},
	intent::{Intent, IntentKind},
};
use sift_providers::web_search::to_documents;

use crate::{AgentError, AgentResult, Providers, RetrievalRequest, Retriever};

const CONTENT_KEY_CHARS: usize = 100;
const MERGE_HARD_CAP: usize = 20;
const MERGE_DEFAULT_CAP: usize = 10;

/// Gate for the concurrent web+RAG strategy: the intent must want
/// external data, the caller's allowed-tools set (when non-empty) must
/// include web search, and web search must be operationally enabled.
pub fn should_run_hybrid(
	cfg: &Config,
	providers: &Providers,
	intent: &Intent,
	enabled_tools: &[String],
) -> bool {
	let wants_external = intent.requires_external
		|| matches!(intent.kind, IntentKind::HybridSearch | IntentKind::RealtimeQuery);

	if !wants_external {
		return false;
	}
	if !enabled_tools.is_empty() && !enabled_tools.iter().any(|tool| tool == "web_search") {
		return false;
	}

	providers.web.enabled(&cfg.providers.web_search)
}

/// Runs retrieval and web search concurrently and merges the survivors.
/// One failing path degrades with a warning; both failing is fatal for
/// this strategy.
pub async fn run(
	cfg: &Config,
	providers: &Providers,
	retriever: &Retriever,
	req: &RetrievalRequest,
	intent: &Intent,
) -> AgentResult<Vec<Document>> {
	let web_cfg = &cfg.providers.web_search;
	let rag_fut = retriever.retrieve(req);
	let web_fut = providers.web.search(web_cfg, &req.query, web_cfg.max_results);
	let (rag_result, web_result) = tokio::join!(rag_fut, web_fut);
	let (rag_docs, web_docs) = match (rag_result, web_result) {
		(Err(rag_err), Err(web_err)) => {
			tracing::error!(rag_error = %rag_err, web_error = %web_err, "Both hybrid paths failed.");

			return Err(AgentError::HybridPathsFailed);
		},
		(Ok(rag_docs), Err(web_err)) => {
			tracing::warn!(error = %web_err, "Web search failed, continuing with retrieval only.");

			(rag_docs, Vec::new())
		},
		(Err(rag_err), Ok(items)) => {
			tracing::warn!(error = %rag_err, "Retrieval failed, continuing with web results only.");

			(Vec::new(), to_documents(&items))
		},
		(Ok(rag_docs), Ok(items)) => (rag_docs, to_documents(&items)),
	};
	let web_first = intent.kind == IntentKind::RealtimeQuery;

	Ok(merge_documents(rag_docs, web_docs, web_first, req.top_k))
}

/// Merge with source precedence. Web results carry no store id, so the
/// dedup key is the first 100 characters of content.
pub fn merge_documents(
	rag_docs: Vec<Document>,
	web_docs: Vec<Document>,
	web_first: bool,
	top_k: u32,
) -> Vec<Document> {
	let cap = if top_k == 0 {
		MERGE_DEFAULT_CAP
	} else {
		((top_k as usize) * 2).min(MERGE_HARD_CAP)
	};
	let ordered = if web_first {
		web_docs.into_iter().chain(rag_docs)
	} else {
		rag_docs.into_iter().chain(web_docs)
	};
	let mut seen = std::collections::HashSet::new();
	let mut out = Vec::new();

	for doc in ordered {
		let key = truncate_chars(&doc.content, CONTENT_KEY_CHARS).to_string();

		if !seen.insert(key) {
			continue;
		}

		out.push(doc);

		if out.len() >= cap {
			break;
		}
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	fn doc(content: &str, score: f32) -> Document {
		Document {
			id: String::new(),
			content: content.to_string(),
			score,
			metadata: serde_json::Map::new(),
		}
	}

	#[test]
	fn web_first_wins_content_key_ties() {
		let rag = vec![doc("shared snippet", 0.9)];
		let web = vec![doc("shared snippet", 0.0), doc("web only", 0.0)];
		let merged = merge_documents(rag, web, true, 5);

		assert_eq!(merged.len(), 2);
		assert_eq!(merged[0].content, "shared snippet");
		assert_eq!(merged[0].score, 0.0, "web copy should win under web-first precedence");
		assert_eq!(merged[1].content, "web only");
	}

	#[test]
	fn rag_first_keeps_store_copy() {
		let rag = vec![doc("shared snippet", 0.9)];
		let web = vec![doc("shared snippet", 0.0)];
		let merged = merge_documents(rag, web, false, 5);

		assert_eq!(merged.len(), 1);
		assert_eq!(merged[0].score, 0.9);
	}

	#[test]
	fn merge_caps_at_twice_top_k_bounded_by_twenty() {
		let rag: Vec<Document> = (0..30).map(|i| doc(&format!("rag {i}"), 0.5)).collect();
		let merged = merge_documents(rag, Vec::new(), false, 2);
		assert_eq!(merged.len(), 4);

		let rag: Vec<Document> = (0..30).map(|i| doc(&format!("rag {i}"), 0.5)).collect();
		let merged = merge_documents(rag, Vec::new(), false, 15);
		assert_eq!(merged.len(), 20);

		let rag: Vec<Document> = (0..30).map(|i| doc(&format!("rag {i}"), 0.5)).collect();
		let merged = merge_documents(rag, Vec::new(), false, 0);
		assert_eq!(merged.len(), 10);
	}
}
