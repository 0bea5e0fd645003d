//! Line-oriented grammar for the ReAct completion protocol. The model is
//! instructed to emit "Thought:", "Action:", "Action Input:" and
//! "Final Answer:" sections; this parser is the single place those token
//! rules live.

pub const THOUGHT: &str = "Thought:";
pub const ACTION: &str = "Action:";
pub const ACTION_INPUT: &str = "Action Input:";
pub const FINAL_ANSWER: &str = "Final Answer:";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Completion {
	FinalAnswer { thought: Option<String>, answer: String },
	Action { thought: Option<String>, name: String, input: String },
	Unparsable,
}

pub fn parse(content: &str) -> Completion {
	if let Some(idx) = content.find(FINAL_ANSWER) {
		let thought = extract_thought(&content[..idx]);
		let answer = content[idx + FINAL_ANSWER.len()..].trim().to_string();

		return Completion::FinalAnswer { thought, answer };
	}

	let thought = extract_thought(content);
	let Some((name, input)) = extract_action(content) else {
		return Completion::Unparsable;
	};

	Completion::Action { thought, name, input }
}

/// Strips a residual "Final Answer:" prefix from a summarization
/// completion; the summary request does not require the marker but models
/// trained on the loop format often emit it anyway.
pub fn strip_final_answer_marker(content: &str) -> &str {
	match content.find(FINAL_ANSWER) {
		Some(idx) => content[idx + FINAL_ANSWER.len()..].trim(),
		None => content.trim(),
	}
}

fn extract_thought(content: &str) -> Option<String> {
	let idx = content.find(THOUGHT)?;
	let rest = &content[idx + THOUGHT.len()..];
	let mut end = rest.len();

	for keyword in [ACTION, FINAL_ANSWER] {
		if let Some(pos) = rest.find(keyword)
			&& pos < end
		{
			end = pos;
		}
	}

	let thought = rest[..end].trim();

	if thought.is_empty() { None } else { Some(thought.to_string()) }
}

fn extract_action(content: &str) -> Option<(String, String)> {
	let action_idx = content.find(ACTION)?;
	let rest = &content[action_idx + ACTION.len()..];
	let Some(newline) = rest.find('\n') else {
		return Some((rest.trim().to_string(), String::new()));
	};
	let name = rest[..newline].trim().to_string();

	if name.is_empty() {
		return None;
	}

	let rest = &rest[newline + 1..];
	let Some(input_idx) = rest.find(ACTION_INPUT) else {
		return Some((name, String::new()));
	};
	let input_rest = rest[input_idx + ACTION_INPUT.len()..].trim_start();
	// The input block runs until the next blank line.
	let input = match input_rest.find("\n\n") {
		Some(end) => input_rest[..end].trim(),
		None => input_rest.trim(),
	};

	Some((name, input.to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_thought_action_input() {
		let content = "Thought: I should search the knowledge base.\n\
			Action: rag_retriever\n\
			Action Input: {\"query\": \"vector databases\"}\n\n\
			trailing prose";
		let parsed = parse(content);
		assert_eq!(parsed, Completion::Action {
			thought: Some("I should search the knowledge base.".to_string()),
			name: "rag_retriever".to_string(),
			input: "{\"query\": \"vector databases\"}".to_string(),
		});
	}

	#[test]
	fn parses_final_answer_with_preceding_thought() {
		let content = "Thought: enough context gathered.\nFinal Answer: RAG grounds generation.";
		let parsed = parse(content);
		assert_eq!(parsed, Completion::FinalAnswer {
			thought: Some("enough context gathered.".to_string()),
			answer: "RAG grounds generation.".to_string(),
		});
	}

	#[test]
	fn final_answer_without_thought() {
		let parsed = parse("Final Answer: done");
		assert_eq!(parsed, Completion::FinalAnswer { thought: None, answer: "done".to_string() });
	}

	#[test]
	fn action_without_input_block() {
		let parsed = parse("Thought: try listing.\nAction: web_search\nno input follows");
		assert_eq!(parsed, Completion::Action {
			thought: Some("try listing.".to_string()),
			name: "web_search".to_string(),
			input: String::new(),
		});
	}

	#[test]
	fn input_stops_at_blank_line() {
		let content = "Action: rag_retriever\nAction Input: {\"query\": \"a\"}\n\nObservation: stale";
		let parsed = parse(content);
		let Completion::Action { input, .. } = parsed else { panic!("expected action") };
		assert_eq!(input, "{\"query\": \"a\"}");
	}

	#[test]
	fn free_prose_is_unparsable() {
		assert_eq!(parse("I am not sure what to do next."), Completion::Unparsable);
	}

	#[test]
	fn action_input_alone_is_unparsable() {
		// An input line without an action name is not a valid step.
		assert_eq!(parse("Action Input: {\"query\": \"a\"}"), Completion::Unparsable);
	}

	#[test]
	fn strips_residual_marker() {
		assert_eq!(strip_final_answer_marker("Final Answer:  concluded"), "concluded");
		assert_eq!(strip_final_answer_marker("plain summary"), "plain summary");
	}
}
