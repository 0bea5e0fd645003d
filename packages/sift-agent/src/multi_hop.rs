use serde_json::{Map, Value};

use sift_config::Config;
use sift_domain::{
	document::{Document, merge_by_id, truncate_chars},
	message::ChatMessage,
	intent::Intent,
	reasoning::{ReasoningStep, StepKind, StepTrace},
};

use crate::{
	AgentError, AgentResult, Providers,
	decompose::Decomposer,
	tool::ToolRegistry,
	tools::RETRIEVAL_TOOL_NAME,
};

const SYNTHESIS_DOC_CHARS: usize = 500;

#[derive(Debug)]
pub struct SubQuestionOutcome {
	pub sub_question: String,
	pub documents: Vec<Document>,
	pub answer: String,
	pub step: usize,
}

#[derive(Debug)]
pub struct MultiHopOutcome {
	pub final_answer: String,
	pub references: Vec<Document>,
	pub sub_results: Vec<SubQuestionOutcome>,
	pub steps: Vec<ReasoningStep>,
}

/// Sequential sub-question retrieval plus one synthesis call. Individual
/// sub-question failures are skipped; a run where every sub-question
/// comes back empty is an error.
pub struct MultiHopExecutor<'a> {
	cfg: &'a Config,
	providers: &'a Providers,
	registry: &'a ToolRegistry,
}
impl<'a> MultiHopExecutor<'a> {
	pub fn new(cfg: &'a Config, providers: &'a Providers, registry: &'a ToolRegistry) -> Self {
		Self { cfg, providers, registry }
	}

	pub async fn run(
		&self,
		intent: &Intent,
		question: &str,
		knowledge_name: &str,
		top_k: u32,
		score: f32,
	) -> AgentResult<MultiHopOutcome> {
		let decomposer =
			Decomposer::new(self.providers.chat.clone(), self.cfg.providers.chat.clone());
		let decomposition = decomposer.decompose(question, intent).await;
		let mut sub_questions = decomposition.sub_questions;

		sub_questions.truncate(self.cfg.agent.max_sub_questions as usize);

		let mut trace = StepTrace::new();

		trace.push(
			StepKind::Thought,
			format!(
				"Decomposing question into {} sub-questions (source: {:?})",
				sub_questions.len(),
				decomposition.source,
			),
		);

		let tool = self.registry.get(RETRIEVAL_TOOL_NAME);
		let total = sub_questions.len();
		let mut sub_results: Vec<SubQuestionOutcome> = Vec::new();

		for (i, sub_question) in sub_questions.into_iter().enumerate() {
			trace.push(
				StepKind::Thought,
				format!("Analyzing sub-question {}/{total}: {sub_question:?}", i + 1),
			);

			let mut action_input = Map::new();

			action_input.insert("query".to_string(), Value::String(sub_question.clone()));
			action_input
				.insert("knowledge_name".to_string(), Value::String(knowledge_name.to_string()));
			action_input.insert("top_k".to_string(), Value::from(top_k));
			action_input.insert("score".to_string(), Value::from(score as f64));
			trace.push_action(RETRIEVAL_TOOL_NAME, action_input.clone());

			let Some(tool) = tool.as_ref() else {
				trace.push(
					StepKind::Observation,
					format!("Found 0 documents for sub-question {} (tool not available)", i + 1),
				);

				continue;
			};
			let documents = match tool.execute(&action_input).await {
				Ok(output) => output.documents,
				Err(err) => {
					trace.push(
						StepKind::Observation,
						format!("Found 0 documents for sub-question {} (error: {err})", i + 1),
					);

					continue;
				},
			};

			trace.push(
				StepKind::Observation,
				format!("Found {} documents for sub-question {}", documents.len(), i + 1),
			);

			if documents.is_empty() {
				continue;
			}

			sub_results.push(SubQuestionOutcome {
				sub_question,
				documents,
				answer: String::new(),
				step: i + 1,
			});
		}

		if sub_results.is_empty() {
			return Err(AgentError::AllSubQuestionsFailed);
		}

		let mut references =
			merge_by_id(sub_results.iter().flat_map(|sub| sub.documents.iter().cloned()));

		references.truncate((top_k as usize).saturating_mul(2).max(1));

		let final_answer = match self.synthesize(question, &sub_results).await {
			Ok(answer) => answer,
			Err(err) => {
				// Degrade to whatever per-sub-question answers exist.
				let parts: Vec<&str> = sub_results
					.iter()
					.filter(|sub| !sub.answer.is_empty())
					.map(|sub| sub.answer.as_str())
					.collect();

				if parts.is_empty() {
					return Err(AgentError::Upstream {
						message: format!("multi-hop synthesis failed: {err}"),
					});
				}

				tracing::warn!(error = %err, "Synthesis failed, concatenating partial answers.");

				parts.join("\n\n")
			},
		};

		trace.push(
			StepKind::FinalAnswer,
			format!("Synthesized answer from {} sub-questions", sub_results.len()),
		);

		Ok(MultiHopOutcome {
			final_answer,
			references,
			sub_results,
			steps: trace.into_steps(),
		})
	}

	async fn synthesize(
		&self,
		question: &str,
		sub_results: &[SubQuestionOutcome],
	) -> color_eyre::Result<String> {
		let mut context = String::new();

		for (i, sub) in sub_results.iter().enumerate() {
			context.push_str(&format!("Sub-question {}: {}\n", i + 1, sub.sub_question));
			context.push_str("Documents: ");

			for (j, doc) in sub.documents.iter().enumerate() {
				if j > 0 {
					context.push('\n');
				}

				let snippet = truncate_chars(&doc.content, SYNTHESIS_DOC_CHARS);

				context.push_str(snippet);

				if snippet.len() < doc.content.len() {
					context.push_str("...");
				}
			}

			context.push_str("\n\n");
		}

		let system_prompt = format!(
			"You are a professional AI assistant synthesizing answers from multiple retrieved documents.\n\n\
			Original question: {question}\n\n\
			Sub-questions and retrieved context:\n{context}\n\
			Instructions:\n\
			1. Synthesize a comprehensive answer to the original question using all the retrieved information\n\
			2. If sub-questions have contradictory information, note the discrepancy\n\
			3. Be concise but complete\n\
			4. Cite specific information from the documents when relevant"
		);
		let messages = [ChatMessage::system(system_prompt), ChatMessage::user(question)];
		let response = self.providers.chat.generate(&self.cfg.providers.chat, &messages).await?;

		Ok(response.content.trim().to_string())
	}
}
