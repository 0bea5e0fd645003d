use std::sync::Arc;

use sift_config::LlmProviderConfig;
use sift_domain::{intent::Intent, message::ChatMessage};

use crate::ChatModel;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecomposeSource {
	/// Sub-questions arrived with the classified intent.
	Intent,
	/// The model produced the decomposition.
	Llm,
	/// Decomposition failed; the original question is the only entry.
	Original,
}

#[derive(Debug)]
pub struct DecomposeOutcome {
	pub sub_questions: Vec<String>,
	pub source: DecomposeSource,
}

pub struct Decomposer {
	chat: Arc<dyn ChatModel>,
	cfg: LlmProviderConfig,
}
impl Decomposer {
	pub fn new(chat: Arc<dyn ChatModel>, cfg: LlmProviderConfig) -> Self {
		Self { chat, cfg }
	}

	/// Splits a question into independently retrievable sub-questions.
	/// Never fails: any decomposition trouble degrades to the original
	/// question as a single-element list.
	pub async fn decompose(&self, question: &str, intent: &Intent) -> DecomposeOutcome {
		if !intent.sub_questions.is_empty() {
			return DecomposeOutcome {
				sub_questions: dedup_and_filter(&intent.sub_questions),
				source: DecomposeSource::Intent,
			};
		}

		let max_sub_questions = intent.estimated_steps.clamp(1, 5);
		let system_prompt = format!(
			"You are an expert at breaking down complex questions into simpler sub-questions.\n\n\
			Given a complex question, decompose it into {max_sub_questions} or fewer specific, \n\
			searchable sub-questions. Each sub-question should be independently answerable \n\
			through document retrieval.\n\n\
			Output format (JSON array only, no other text):\n\
			[\"sub-question 1\", \"sub-question 2\", ...]\n\n\
			Question type: {kind}\n\
			Complexity: {complexity}",
			kind = serde_json::to_string(&intent.kind).unwrap_or_default().trim_matches('"'),
			complexity =
				serde_json::to_string(&intent.complexity).unwrap_or_default().trim_matches('"'),
		);
		let messages = [ChatMessage::system(system_prompt), ChatMessage::user(question)];
		let original = || DecomposeOutcome {
			sub_questions: vec![question.to_string()],
			source: DecomposeSource::Original,
		};

		let response = match self.chat.generate(&self.cfg, &messages).await {
			Ok(response) => response,
			Err(err) => {
				tracing::warn!(error = %err, "Decomposition call failed, using original question.");

				return original();
			},
		};
		let Some(sub_questions) = parse_sub_questions(&response.content) else {
			tracing::warn!("Decomposition output unparsable, using original question.");

			return original();
		};
		let filtered = dedup_and_filter(&sub_questions);

		if filtered.is_empty() {
			return original();
		}

		DecomposeOutcome { sub_questions: filtered, source: DecomposeSource::Llm }
	}
}

/// Extracts the array substring between the first `[` and last `]` before
/// parsing, tolerating prose wrapping around the JSON.
fn parse_sub_questions(content: &str) -> Option<Vec<String>> {
	let content = content.trim();
	let start = content.find('[')?;
	let end = content.rfind(']')?;

	if end <= start {
		return None;
	}

	serde_json::from_str(&content[start..=end]).ok()
}

/// Case-preserving dedup with whitespace trimming; blanks are dropped.
fn dedup_and_filter(questions: &[String]) -> Vec<String> {
	let mut seen = std::collections::HashSet::new();
	let mut out = Vec::with_capacity(questions.len());

	for question in questions {
		let trimmed = question.trim();

		if trimmed.is_empty() || !seen.insert(trimmed.to_string()) {
			continue;
		}

		out.push(trimmed.to_string());
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_array_with_prose_wrapping() {
		let content = "Here you go:\n[\"first question\", \"second question\"]\nDone.";
		let parsed = parse_sub_questions(content).expect("expected array");
		assert_eq!(parsed, vec!["first question".to_string(), "second question".to_string()]);
	}

	#[test]
	fn garbage_yields_none() {
		assert!(parse_sub_questions("no array here").is_none());
		assert!(parse_sub_questions("] backwards [").is_none());
	}

	#[test]
	fn dedup_preserves_case_and_drops_blanks() {
		let questions = vec![
			" What is X ".to_string(),
			"What is X".to_string(),
			String::new(),
			"what is x".to_string(),
		];
		let filtered = dedup_and_filter(&questions);
		assert_eq!(filtered, vec!["What is X".to_string(), "what is x".to_string()]);
	}
}
