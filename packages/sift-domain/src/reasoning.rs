use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::intent::now_rfc3339;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
	Thought,
	Action,
	Observation,
	FinalAnswer,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReasoningStep {
	pub step: u32,
	#[serde(rename = "type")]
	pub kind: StepKind,
	pub content: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub action_input: Option<Map<String, Value>>,
	pub timestamp: String,
}

/// Ordered reasoning trace for one execution. Step numbers are assigned
/// here and only here, so they start at 1 and never repeat or go
/// backward within a run.
#[derive(Debug, Default)]
pub struct StepTrace {
	steps: Vec<ReasoningStep>,
}
impl StepTrace {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, kind: StepKind, content: impl Into<String>) {
		let step = self.steps.len() as u32 + 1;

		self.steps.push(ReasoningStep {
			step,
			kind,
			content: content.into(),
			action_input: None,
			timestamp: now_rfc3339(),
		});
	}

	pub fn push_action(&mut self, content: impl Into<String>, input: Map<String, Value>) {
		let step = self.steps.len() as u32 + 1;

		self.steps.push(ReasoningStep {
			step,
			kind: StepKind::Action,
			content: content.into(),
			action_input: Some(input),
			timestamp: now_rfc3339(),
		});
	}

	pub fn len(&self) -> usize {
		self.steps.len()
	}

	pub fn is_empty(&self) -> bool {
		self.steps.is_empty()
	}

	pub fn into_steps(self) -> Vec<ReasoningStep> {
		self.steps
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn step_numbers_are_monotonic_from_one() {
		let mut trace = StepTrace::new();

		trace.push(StepKind::Thought, "t");
		trace.push_action("rag_retriever", Map::new());
		trace.push(StepKind::Observation, "o");

		let steps = trace.into_steps();
		let numbers: Vec<u32> = steps.iter().map(|s| s.step).collect();
		assert_eq!(numbers, vec![1, 2, 3]);
		assert_eq!(steps[1].kind, StepKind::Action);
	}
}
