use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
	SimpleQa,
	FactCheck,
	MultiHopQa,
	CausalReasoning,
	Procedural,
	Comparison,
	Summarization,
	Aggregation,
	TrendAnalysis,
	HybridSearch,
	RealtimeQuery,
	CodeGeneration,
	ContentCreation,
	Clarification,
	Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
	Simple,
	Medium,
	Complex,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
	SimpleRag,
	ReactAgent,
	Hybrid,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationMethod {
	Rule,
	Llm,
	HybridRule,
	HybridLlm,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeConstraint {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub start_time: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub end_time: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub relative: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScopeConstraint {
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub knowledge_bases: Vec<String>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub categories: Vec<String>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub entities: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Intent {
	#[serde(rename = "type")]
	pub kind: IntentKind,
	pub confidence: f32,
	#[serde(default)]
	pub raw_text: String,
	pub strategy: Strategy,
	#[serde(default)]
	pub need_tools: Vec<String>,
	pub estimated_steps: u8,
	pub complexity: Complexity,
	#[serde(default)]
	pub requires_external: bool,
	#[serde(default)]
	pub knowledge_domains: Vec<String>,
	#[serde(default)]
	pub sub_questions: Vec<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub time_constraint: Option<TimeConstraint>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scope_constraint: Option<ScopeConstraint>,
	#[serde(default = "default_method")]
	pub classification_method: ClassificationMethod,
	#[serde(default)]
	pub timestamp: String,
}
impl Intent {
	pub fn unknown(raw_text: &str, confidence: f32, method: ClassificationMethod) -> Self {
		Self {
			kind: IntentKind::Unknown,
			confidence: confidence.clamp(0.0, 1.0),
			raw_text: raw_text.to_string(),
			strategy: Strategy::SimpleRag,
			need_tools: vec!["rag".to_string()],
			estimated_steps: 1,
			complexity: Complexity::Simple,
			requires_external: false,
			knowledge_domains: Vec::new(),
			sub_questions: Vec::new(),
			time_constraint: None,
			scope_constraint: None,
			classification_method: method,
			timestamp: now_rfc3339(),
		}
	}

	/// Enforces the model invariants: confidence stays in [0, 1] and
	/// estimated_steps in [1, 5]. Applied to every intent before use,
	/// regardless of which classifier produced it.
	pub fn clamp(&mut self) {
		self.confidence = self.confidence.clamp(0.0, 1.0);
		self.estimated_steps = self.estimated_steps.clamp(1, 5);
	}
}

fn default_method() -> ClassificationMethod {
	ClassificationMethod::Rule
}

pub fn now_rfc3339() -> String {
	OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn clamp_enforces_invariants() {
		let mut intent = Intent::unknown("q", 0.0, ClassificationMethod::Rule);

		intent.confidence = 1.7;
		intent.estimated_steps = 9;
		intent.clamp();
		assert_eq!(intent.confidence, 1.0);
		assert_eq!(intent.estimated_steps, 5);

		intent.confidence = -0.4;
		intent.estimated_steps = 0;
		intent.clamp();
		assert_eq!(intent.confidence, 0.0);
		assert_eq!(intent.estimated_steps, 1);
	}

	#[test]
	fn kind_serializes_snake_case() {
		let json = serde_json::to_string(&IntentKind::MultiHopQa).expect("serialize failed");
		assert_eq!(json, "\"multi_hop_qa\"");
	}

	#[test]
	fn intent_deserializes_from_classifier_json() {
		let json = serde_json::json!({
			"type": "comparison",
			"confidence": 0.9,
			"strategy": "react_agent",
			"need_tools": ["rag"],
			"estimated_steps": 4,
			"complexity": "complex",
			"requires_external": false,
			"knowledge_domains": ["database"],
			"sub_questions": ["a", "b"]
		});
		let intent: Intent = serde_json::from_value(json).expect("deserialize failed");
		assert_eq!(intent.kind, IntentKind::Comparison);
		assert_eq!(intent.strategy, Strategy::ReactAgent);
		assert_eq!(intent.sub_questions.len(), 2);
	}
}
