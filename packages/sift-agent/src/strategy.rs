use std::time::Instant;

use serde::{Deserialize, Serialize};

use sift_domain::{
	document::{Document, truncate_chars},
	intent::{Intent, IntentKind, Strategy},
	message::ChatMessage,
	reasoning::ReasoningStep,
};

use crate::{
	AgentError, AgentResult, AgentService, RetrievalRequest, hybrid,
	multi_hop::MultiHopExecutor, react::ReactExecutor,
};

const ANSWER_DOC_CHARS: usize = 1_500;

#[derive(Clone, Debug, Deserialize)]
pub struct AgenticRequest {
	pub question: String,
	pub knowledge_name: String,
	#[serde(default = "default_top_k")]
	pub top_k: u32,
	#[serde(default = "default_score")]
	pub score: f32,
	#[serde(default)]
	pub conversation_id: String,
	#[serde(default)]
	pub history: Vec<String>,
	#[serde(default)]
	pub enabled_tools: Vec<String>,
	#[serde(default)]
	pub max_iterations: Option<u32>,
	#[serde(default)]
	pub return_intent: bool,
	#[serde(default)]
	pub return_steps: bool,
}

#[derive(Debug, Serialize)]
pub struct AgenticResponse {
	pub answer: String,
	pub references: Vec<Document>,
	pub strategy_used: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub intent: Option<Intent>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub reasoning_steps: Option<Vec<ReasoningStep>>,
	pub execution_time_ms: u64,
}

struct StrategyOutcome {
	answer: String,
	references: Vec<Document>,
	steps: Vec<ReasoningStep>,
	strategy_used: &'static str,
}

impl AgentService {
	/// Top-level entry: classify (through the cache), dispatch on the
	/// intent's strategy, degrade to plain retrieval when a reasoning
	/// strategy fails.
	pub async fn agentic_chat(&self, req: AgenticRequest) -> AgentResult<AgenticResponse> {
		let started = Instant::now();

		if req.question.trim().is_empty() {
			return Err(AgentError::Validation { message: "question is required".to_string() });
		}
		if req.knowledge_name.trim().is_empty() {
			return Err(AgentError::Validation {
				message: "knowledge_name is required".to_string(),
			});
		}

		let intent = self.classify_cached(&req).await?;

		tracing::info!(
			kind = ?intent.kind,
			confidence = intent.confidence,
			strategy = ?intent.strategy,
			method = ?intent.classification_method,
			"Intent classified."
		);

		let outcome = match intent.strategy {
			Strategy::SimpleRag => self.run_simple(&req).await?,
			Strategy::ReactAgent => match self.run_reasoning(&req, &intent).await {
				Ok(outcome) => outcome,
				Err(AgentError::HybridPathsFailed) => return Err(AgentError::HybridPathsFailed),
				Err(err) => {
					tracing::warn!(error = %err, "Reasoning strategy failed, degrading to simple retrieval.");

					self.run_simple(&req).await?
				},
			},
			Strategy::Hybrid => self.run_hybrid(&req, &intent).await?,
		};

		Ok(AgenticResponse {
			answer: outcome.answer,
			references: outcome.references,
			strategy_used: outcome.strategy_used.to_string(),
			intent: req.return_intent.then_some(intent),
			reasoning_steps: (req.return_steps && !outcome.steps.is_empty())
				.then_some(outcome.steps),
			execution_time_ms: started.elapsed().as_millis() as u64,
		})
	}

	pub async fn classify_intent(
		&self,
		question: &str,
		history: &[String],
	) -> AgentResult<Intent> {
		self.classifier.classify_with_history(question, history).await
	}

	async fn classify_cached(&self, req: &AgenticRequest) -> AgentResult<Intent> {
		if let Some(cached) = self.cache.get(&req.conversation_id, &req.question) {
			tracing::debug!("Intent cache hit.");

			return Ok(cached);
		}

		let intent =
			self.classifier.classify_with_history(&req.question, &req.history).await?;

		if intent.confidence >= self.cfg.classifier.min_cache_confidence {
			self.cache.set(&req.conversation_id, &req.question, intent.clone());
		}

		Ok(intent)
	}

	fn retrieval_request(&self, req: &AgenticRequest) -> RetrievalRequest {
		RetrievalRequest {
			query: req.question.clone(),
			top_k: req.top_k,
			score_threshold: req.score,
			knowledge_name: req.knowledge_name.clone(),
		}
	}

	async fn run_simple(&self, req: &AgenticRequest) -> AgentResult<StrategyOutcome> {
		let references = self.retriever().retrieve(&self.retrieval_request(req)).await?;
		let answer = self.answer_from_documents(&req.question, &references, &req.history).await?;

		Ok(StrategyOutcome {
			answer,
			references,
			steps: Vec::new(),
			strategy_used: "simple_rag",
		})
	}

	async fn run_reasoning(
		&self,
		req: &AgenticRequest,
		intent: &Intent,
	) -> AgentResult<StrategyOutcome> {
		if wants_decomposition(intent) {
			let executor = MultiHopExecutor::new(&self.cfg, &self.providers, &self.registry);
			let outcome = executor
				.run(intent, &req.question, &req.knowledge_name, req.top_k, req.score)
				.await?;

			return Ok(StrategyOutcome {
				answer: outcome.final_answer,
				references: outcome.references,
				steps: outcome.steps,
				strategy_used: "multi_hop",
			});
		}

		let executor =
			ReactExecutor::new(&self.cfg, &self.providers, &self.registry, req.max_iterations);
		let outcome = executor.run(&req.question).await?;
		let references = sift_domain::document::merge_by_id(outcome.references);

		Ok(StrategyOutcome {
			answer: outcome.answer,
			references,
			steps: outcome.steps,
			strategy_used: "react_agent",
		})
	}

	async fn run_hybrid(
		&self,
		req: &AgenticRequest,
		intent: &Intent,
	) -> AgentResult<StrategyOutcome> {
		if !hybrid::should_run_hybrid(&self.cfg, &self.providers, intent, &req.enabled_tools) {
			tracing::debug!("Hybrid gate closed, using simple retrieval.");

			return self.run_simple(req).await;
		}

		let retriever = self.retriever();
		let references = hybrid::run(
			&self.cfg,
			&self.providers,
			&retriever,
			&self.retrieval_request(req),
			intent,
		)
		.await?;

		if references.is_empty() {
			tracing::warn!("Hybrid merge produced no documents, degrading to simple retrieval.");

			return self.run_simple(req).await;
		}

		let answer = self.answer_from_documents(&req.question, &references, &req.history).await?;

		Ok(StrategyOutcome { answer, references, steps: Vec::new(), strategy_used: "hybrid" })
	}

	/// Grounded answer synthesis over retrieved references. The model is
	/// held to the references; an empty reference set is answered with an
	/// explicit "cannot answer from the available information".
	async fn answer_from_documents(
		&self,
		question: &str,
		references: &[Document],
		history: &[String],
	) -> AgentResult<String> {
		let mut rendered = String::new();

		for (i, doc) in references.iter().enumerate() {
			let snippet = truncate_chars(&doc.content, ANSWER_DOC_CHARS);

			rendered.push_str(&format!("[{}] {snippet}\n", i + 1));
		}

		if rendered.is_empty() {
			rendered.push_str("(no reference content was retrieved)\n");
		}

		let mut system = format!(
			"You are a professional AI assistant that can accurately answer user questions based on the reference information provided. \
			Please strictly abide by the following rules:\n\
			1. Answers must be based on the references provided and not rely on external knowledge\n\
			2. If the reference content has a clear answer, use the reference content directly to answer\n\
			3. If the reference is incomplete or vague, reasonable inferences can be made but the information must be explained\n\
			4. If the reference content is completely irrelevant or does not exist, inform the user that the question cannot be answered based on the available information\n\
			5. Keep your answers professional, concise, and accurate\n\
			6. When necessary, you can quote specific data or original text from the reference content\n\n\
			Currently available reference content:\n{rendered}"
		);

		if !history.is_empty() {
			system.push_str("\nConversation history:\n");

			for (i, message) in history.iter().enumerate() {
				system.push_str(&format!("{}. {message}\n", i + 1));
			}
		}

		let messages =
			[ChatMessage::system(system), ChatMessage::user(format!("Question: {question}"))];
		let response = self
			.providers
			.chat
			.generate(&self.cfg.providers.chat, &messages)
			.await
			.map_err(|err| AgentError::Upstream {
				message: format!("answer synthesis failed: {err}"),
			})?;

		Ok(response.content.trim().to_string())
	}
}

fn wants_decomposition(intent: &Intent) -> bool {
	!intent.sub_questions.is_empty()
		|| matches!(intent.kind, IntentKind::MultiHopQa | IntentKind::Comparison)
}

fn default_top_k() -> u32 {
	5
}

fn default_score() -> f32 {
	0.2
}

#[cfg(test)]
mod tests {
	use super::*;
	use sift_domain::intent::ClassificationMethod;

	#[test]
	fn decomposition_wanted_for_multi_hop_kinds_and_supplied_sub_questions() {
		let mut intent = Intent::unknown("q", 0.6, ClassificationMethod::Rule);
		assert!(!wants_decomposition(&intent));

		intent.kind = IntentKind::MultiHopQa;
		assert!(wants_decomposition(&intent));

		intent.kind = IntentKind::Procedural;
		intent.sub_questions = vec!["a".to_string()];
		assert!(wants_decomposition(&intent));
	}
}
