use std::sync::Arc;

use sift_config::{Classifier as ClassifierConfig, LlmProviderConfig};
use sift_domain::{
	intent::{ClassificationMethod, Intent, IntentKind, now_rfc3339},
	message::ChatMessage,
	rules::RuleClassifier,
};

use crate::{AgentError, AgentResult, ChatModel};

/// Prompt-based intent scoring. One chat call per classification; the
/// response is expected to be the intent JSON and nothing else, but the
/// parser tolerates prose wrapping.
pub struct LlmClassifier {
	chat: Arc<dyn ChatModel>,
	cfg: LlmProviderConfig,
}
impl LlmClassifier {
	pub fn new(chat: Arc<dyn ChatModel>, cfg: LlmProviderConfig) -> Self {
		Self { chat, cfg }
	}

	pub async fn classify(&self, text: &str, history: &[String]) -> AgentResult<Intent> {
		let messages = [
			ChatMessage::system(build_intent_prompt(history)),
			ChatMessage::user(format!("Question: {text}")),
		];
		// A transport or model failure is a genuine error; malformed
		// output is not, and degrades to a default intent below.
		let response =
			self.chat.generate(&self.cfg, &messages).await.map_err(|err| AgentError::Upstream {
				message: format!("llm classification failed: {err}"),
			})?;

		let Some(mut intent) = parse_intent_json(&response.content) else {
			tracing::warn!("LLM intent response unparsable, using default intent.");

			return Ok(Intent::unknown(text, 0.5, ClassificationMethod::Llm));
		};

		intent.raw_text = text.to_string();
		intent.classification_method = ClassificationMethod::Llm;
		intent.timestamp = now_rfc3339();
		intent.clamp();

		Ok(intent)
	}
}

/// Rule-first decision policy with LLM fallback under confidence
/// thresholds. Thresholds are runtime-adjustable; a rule-only instance
/// never touches the model.
pub struct HybridClassifier {
	rules: RuleClassifier,
	llm: Option<LlmClassifier>,
	high_confidence: f32,
	low_confidence: f32,
}
impl HybridClassifier {
	pub fn new(cfg: &ClassifierConfig, llm: Option<LlmClassifier>) -> Self {
		Self {
			rules: RuleClassifier::new(),
			llm,
			high_confidence: cfg.high_confidence,
			low_confidence: cfg.low_confidence,
		}
	}

	pub fn rule_only(cfg: &ClassifierConfig) -> Self {
		Self::new(cfg, None)
	}

	pub fn set_thresholds(&mut self, high: f32, low: f32) {
		self.high_confidence = high.clamp(0.0, 1.0);
		self.low_confidence = low.clamp(0.0, 1.0);
	}

	pub async fn classify(&self, text: &str) -> AgentResult<Intent> {
		self.classify_with_history(text, &[]).await
	}

	pub async fn classify_with_history(
		&self,
		text: &str,
		history: &[String],
	) -> AgentResult<Intent> {
		let mut rule_intent = self.rules.classify(text);

		rule_intent.clamp();
		tracing::debug!(
			kind = ?rule_intent.kind,
			confidence = rule_intent.confidence,
			"Rule classification."
		);

		// High confidence: the rule result stands alone.
		if rule_intent.confidence >= self.high_confidence {
			rule_intent.classification_method = ClassificationMethod::Rule;

			return Ok(rule_intent);
		}

		// Low confidence or unknown: consult the model, keep whichever
		// side is more confident.
		if let Some(llm) = &self.llm
			&& (rule_intent.confidence < self.low_confidence
				|| rule_intent.kind == IntentKind::Unknown)
		{
			match llm.classify(text, history).await {
				Ok(mut llm_intent) =>
					if llm_intent.confidence > rule_intent.confidence {
						llm_intent.classification_method = ClassificationMethod::HybridLlm;

						return Ok(llm_intent);
					},
				Err(err) => {
					tracing::warn!(error = %err, "LLM classification failed, keeping rule result.");
				},
			}
		}

		rule_intent.classification_method = ClassificationMethod::HybridRule;

		Ok(rule_intent)
	}

	pub async fn classify_batch(&self, texts: &[String]) -> AgentResult<Vec<Intent>> {
		let mut intents = Vec::with_capacity(texts.len());

		for text in texts {
			intents.push(self.classify(text).await?);
		}

		Ok(intents)
	}
}

fn parse_intent_json(content: &str) -> Option<Intent> {
	if let Ok(intent) = serde_json::from_str::<Intent>(content) {
		return Some(intent);
	}

	let span = extract_json_object(content)?;

	serde_json::from_str(span).ok()
}

/// Isolates the first balanced `{...}` span, skipping braces inside JSON
/// string literals so prose wrapping around the object does not break
/// extraction.
pub fn extract_json_object(content: &str) -> Option<&str> {
	let start = content.find('{')?;
	let mut depth = 0usize;
	let mut in_string = false;
	let mut escaped = false;

	for (offset, ch) in content[start..].char_indices() {
		if escaped {
			escaped = false;

			continue;
		}

		match ch {
			'\\' if in_string => escaped = true,
			'"' => in_string = !in_string,
			'{' if !in_string => depth += 1,
			'}' if !in_string => {
				depth -= 1;

				if depth == 0 {
					return Some(&content[start..start + offset + ch.len_utf8()]);
				}
			},
			_ => {},
		}
	}

	None
}

fn build_intent_prompt(history: &[String]) -> String {
	let mut prompt = r#"You are an expert intent classifier for a RAG (Retrieval-Augmented Generation) system.

Your task is to analyze user questions and classify them into specific intent types.

Intent Types:
1. simple_qa: Simple factual questions (e.g., "What is RAG?")
2. fact_check: Verification questions (e.g., "Is it true that...")
3. multi_hop_qa: Multi-step reasoning (e.g., "Why does X cause Y?")
4. causal_reasoning: Cause-effect analysis (e.g., "What caused...")
5. procedural: How-to questions (e.g., "How to configure...")
6. comparison: Comparison analysis (e.g., "Compare A vs B")
7. summarization: Summary requests (e.g., "Summarize...")
8. aggregation: Data aggregation (e.g., "How many...", "Calculate...")
9. trend_analysis: Trend analysis (e.g., "What's the trend...")
10. hybrid_search: Needs external data (e.g., "Latest news about...")
11. realtime_query: Real-time data (e.g., "Current status...")
12. code_generation: Code generation (e.g., "Write code to...")
13. content_creation: Content creation (e.g., "Write an article about...")
14. clarification: Unclear questions
15. unknown: Cannot classify

Output JSON format:
{
  "type": "intent_type",
  "confidence": 0.85,
  "strategy": "simple_rag|react_agent|hybrid",
  "need_tools": ["rag", "web_search"],
  "estimated_steps": 3,
  "complexity": "simple|medium|complex",
  "requires_external": false,
  "knowledge_domains": ["machine_learning"],
  "sub_questions": ["sub question 1", "sub question 2"]
}

Examples:

Question: "什么是RAG?"
{
  "type": "simple_qa",
  "confidence": 0.95,
  "strategy": "simple_rag",
  "need_tools": ["rag"],
  "estimated_steps": 1,
  "complexity": "simple",
  "requires_external": false,
  "knowledge_domains": ["nlp"],
  "sub_questions": []
}

Question: "对比 Elasticsearch 和 Milvus 的性能，并给出推荐"
{
  "type": "comparison",
  "confidence": 0.9,
  "strategy": "react_agent",
  "need_tools": ["rag", "web_search"],
  "estimated_steps": 4,
  "complexity": "complex",
  "requires_external": false,
  "knowledge_domains": ["database", "vector_search"],
  "sub_questions": [
    "Elasticsearch 的性能特点",
    "Milvus 的性能特点",
    "两者性能对比",
    "推荐方案"
  ]
}

Question: "最新的 GPT-5 有什么新功能?"
{
  "type": "hybrid_search",
  "confidence": 0.88,
  "strategy": "hybrid",
  "need_tools": ["rag", "web_search"],
  "estimated_steps": 2,
  "complexity": "medium",
  "requires_external": true,
  "knowledge_domains": ["ai", "llm"],
  "sub_questions": []
}

Now analyze the following question and return ONLY the JSON output, no additional text:"#
		.to_string();

	if !history.is_empty() {
		prompt.push_str("\n\nConversation History:\n");

		for (i, message) in history.iter().enumerate() {
			prompt.push_str(&format!("{}. {message}\n", i + 1));
		}

		prompt.push_str("\nConsider the context when classifying the current question.");
	}

	prompt
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn extracts_balanced_object_from_prose() {
		let content = "Sure, here is the result: {\"type\": \"simple_qa\", \"nested\": {\"a\": 1}} hope it helps";
		let span = extract_json_object(content).expect("expected span");
		assert_eq!(span, "{\"type\": \"simple_qa\", \"nested\": {\"a\": 1}}");
	}

	#[test]
	fn braces_inside_strings_do_not_unbalance() {
		let content = "{\"note\": \"a } inside\", \"ok\": true} trailing";
		let span = extract_json_object(content).expect("expected span");
		assert_eq!(span, "{\"note\": \"a } inside\", \"ok\": true}");
	}

	#[test]
	fn unbalanced_content_yields_none() {
		assert!(extract_json_object("{\"never\": \"closed\"").is_none());
		assert!(extract_json_object("no braces at all").is_none());
	}

	#[test]
	fn history_is_numbered_into_the_prompt() {
		let prompt = build_intent_prompt(&["first".to_string(), "second".to_string()]);
		assert!(prompt.contains("1. first"));
		assert!(prompt.contains("2. second"));
	}
}
