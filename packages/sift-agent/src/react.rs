use serde_json::{Map, Value};

use sift_config::Config;
use sift_domain::{
	document::{Document, truncate_chars},
	message::ChatMessage,
	react_protocol::{self, Completion},
	reasoning::{ReasoningStep, StepKind, StepTrace},
};

use crate::{AgentError, AgentResult, Providers, tool::ToolRegistry};

const OBSERVATION_SNIPPETS: usize = 3;
const OBSERVATION_SNIPPET_CHARS: usize = 200;

#[derive(Debug)]
pub struct ReactOutcome {
	pub answer: String,
	pub references: Vec<Document>,
	pub steps: Vec<ReasoningStep>,
}

/// Bounded Thought/Action/Observation loop over the tool registry.
/// Iterations that parse to an action keep going even when the tool
/// fails; a completion that parses to neither an action nor a final
/// answer ends the run with an explicit error.
pub struct ReactExecutor<'a> {
	cfg: &'a Config,
	providers: &'a Providers,
	registry: &'a ToolRegistry,
	max_iterations: u32,
}
impl<'a> ReactExecutor<'a> {
	pub fn new(
		cfg: &'a Config,
		providers: &'a Providers,
		registry: &'a ToolRegistry,
		max_iterations: Option<u32>,
	) -> Self {
		let max_iterations = match max_iterations {
			Some(value) if value > 0 => value,
			_ => cfg.agent.max_iterations,
		};

		Self { cfg, providers, registry, max_iterations }
	}

	pub async fn run(&self, question: &str) -> AgentResult<ReactOutcome> {
		let system_prompt = build_system_prompt(&self.registry.catalog(), question);
		let mut messages =
			vec![ChatMessage::system(system_prompt), ChatMessage::user(question.to_string())];
		let mut trace = StepTrace::new();
		let mut references: Vec<Document> = Vec::new();

		for iteration in 0..self.max_iterations {
			let response = self
				.providers
				.chat
				.generate(&self.cfg.providers.chat, &messages)
				.await
				.map_err(|err| AgentError::Upstream {
					message: format!("react generate failed at iteration {iteration}: {err}"),
				})?;
			let content = response.content.clone();

			match react_protocol::parse(&content) {
				Completion::FinalAnswer { thought, answer } => {
					if let Some(thought) = thought {
						trace.push(StepKind::Thought, thought);
					}

					trace.push(StepKind::FinalAnswer, answer.clone());

					return Ok(ReactOutcome { answer, references, steps: trace.into_steps() });
				},
				Completion::Action { thought, name, input } => {
					if let Some(thought) = thought {
						trace.push(StepKind::Thought, thought);
					}

					let action_input = parse_action_input(&input);

					trace.push_action(name.clone(), action_input.clone());

					let observation = match self.registry.get(&name) {
						None => format!("Error: tool {name:?} not found"),
						Some(tool) => match tool.execute(&action_input).await {
							Err(err) => format!("Error: {err}"),
							Ok(output) => {
								let summary = summarize_documents(&output.documents, &output.payload);

								references.extend(output.documents);

								summary
							},
						},
					};

					trace.push(StepKind::Observation, observation.clone());
					messages.push(ChatMessage::assistant(content));
					messages.push(ChatMessage::user(format!("Observation: {observation}")));
				},
				Completion::Unparsable => {
					let preview = truncate_chars(&content, 200).to_string();

					return Err(AgentError::UnparsableCompletion { preview });
				},
			}
		}

		// Out of iterations: one summarization request over everything
		// gathered so far.
		messages.push(ChatMessage::user(
			"Please summarize your findings and provide a final answer based on what you have gathered so far.",
		));

		let response = self
			.providers
			.chat
			.generate(&self.cfg.providers.chat, &messages)
			.await
			.map_err(|err| AgentError::Upstream {
				message: format!("react summary generate failed: {err}"),
			})?;
		let answer = react_protocol::strip_final_answer_marker(&response.content).to_string();

		trace.push(StepKind::FinalAnswer, answer.clone());

		Ok(ReactOutcome { answer, references, steps: trace.into_steps() })
	}
}

fn build_system_prompt(catalog: &str, question: &str) -> String {
	format!(
		"You are a professional AI assistant that uses the ReAct (Reasoning + Acting) framework.\n\n\
		Available tools:\n{catalog}\n\n\
		Instructions:\n\
		1. Analyze the question step by step using Thought → Action → Observation cycles\n\
		2. Use tools to retrieve relevant information when needed\n\
		3. When you have enough information to answer, output \"Final Answer: <your answer>\"\n\n\
		Format:\n\
		Thought: <your reasoning about what to do>\n\
		Action: <tool_name>\n\
		Action Input: <JSON input for the tool>\n\n\
		OR when ready to answer:\n\
		Thought: <your final reasoning>\n\
		Final Answer: <your complete answer>\n\n\
		Current question: {question}"
	)
}

/// Malformed action input degrades to a bare query instead of killing the
/// iteration.
fn parse_action_input(raw: &str) -> Map<String, Value> {
	if raw.is_empty() {
		return Map::new();
	}

	match serde_json::from_str::<Map<String, Value>>(raw) {
		Ok(map) => map,
		Err(_) => {
			let mut map = Map::new();

			map.insert("query".to_string(), Value::String(raw.to_string()));

			map
		},
	}
}

fn summarize_documents(documents: &[Document], payload: &Value) -> String {
	if documents.is_empty() {
		return match payload {
			Value::Null => "Found 0 documents.".to_string(),
			other => other.to_string(),
		};
	}

	let mut out = format!("Found {} documents.", documents.len());

	for (i, doc) in documents.iter().take(OBSERVATION_SNIPPETS).enumerate() {
		let snippet = truncate_chars(&doc.content, OBSERVATION_SNIPPET_CHARS);
		let ellipsis = if snippet.len() < doc.content.len() { "..." } else { "" };

		out.push_str(&format!("\n[{}] {snippet}{ellipsis}", i + 1));
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn action_input_falls_back_to_query() {
		let map = parse_action_input("not json at all");
		assert_eq!(map.get("query").and_then(|v| v.as_str()), Some("not json at all"));

		let map = parse_action_input("{\"query\": \"x\", \"top_k\": 3}");
		assert_eq!(map.get("top_k").and_then(|v| v.as_u64()), Some(3));
	}

	#[test]
	fn summary_lists_at_most_three_snippets() {
		let docs: Vec<Document> = (0..5)
			.map(|i| Document {
				id: i.to_string(),
				content: format!("doc {i}"),
				..Default::default()
			})
			.collect();
		let summary = summarize_documents(&docs, &Value::Null);
		assert!(summary.starts_with("Found 5 documents."));
		assert!(summary.contains("[3] doc 2"));
		assert!(!summary.contains("[4]"));
	}

	#[test]
	fn long_snippets_are_truncated() {
		let docs = vec![Document {
			id: "a".to_string(),
			content: "x".repeat(500),
			..Default::default()
		}];
		let summary = summarize_documents(&docs, &Value::Null);
		assert!(summary.contains(&format!("[1] {}...", "x".repeat(200))));
	}
}
