use std::{collections::HashMap, fmt::Write, sync::Arc};

use serde_json::{Map, Value};

use sift_domain::document::Document;

use crate::{AgentResult, BoxFuture};

/// Typed result of one tool invocation. Retrieval-flavored tools fill
/// `documents`; everything else rides in `payload`.
#[derive(Debug, Default)]
pub struct ToolOutput {
	pub documents: Vec<Document>,
	pub payload: Value,
}

/// Capability contract for everything the executors can invoke. The
/// description must be usable verbatim inside a model prompt and should
/// document the expected JSON input shape.
pub trait Tool
where
	Self: Send + Sync,
{
	fn name(&self) -> &str;

	fn description(&self) -> &str;

	fn execute<'a>(&'a self, input: &'a Map<String, Value>) -> BoxFuture<'a, AgentResult<ToolOutput>>;
}

/// Name-keyed tool map. Lookup misses are a normal signal, not a crash.
#[derive(Default)]
pub struct ToolRegistry {
	tools: HashMap<String, Arc<dyn Tool>>,
}
impl ToolRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&mut self, tool: Arc<dyn Tool>) {
		self.tools.insert(tool.name().to_string(), tool);
	}

	pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
		self.tools.get(name).cloned()
	}

	pub fn len(&self) -> usize {
		self.tools.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tools.is_empty()
	}

	/// Renders the tool catalog for the reasoning prompt. The map is
	/// unordered, so entries are sorted by name to keep prompts
	/// reproducible.
	pub fn catalog(&self) -> String {
		let mut names: Vec<&String> = self.tools.keys().collect();

		names.sort();

		let mut out = String::new();

		for name in names {
			let Some(tool) = self.tools.get(name) else { continue };

			let _ = write!(
				out,
				"Tool: {}\nDescription: {}\nInput: {{\"query\": \"search keywords\", \"knowledge_name\": \"kb_name\", \"top_k\": 5, \"score\": 0.3}}\n\n",
				tool.name(),
				tool.description(),
			);
		}

		out.trim_end().to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	struct EchoTool {
		name: &'static str,
	}
	impl Tool for EchoTool {
		fn name(&self) -> &str {
			self.name
		}

		fn description(&self) -> &str {
			"Echoes input."
		}

		fn execute<'a>(
			&'a self,
			_input: &'a Map<String, Value>,
		) -> BoxFuture<'a, AgentResult<ToolOutput>> {
			Box::pin(async { Ok(ToolOutput::default()) })
		}
	}

	#[test]
	fn lookup_miss_is_none() {
		let registry = ToolRegistry::new();
		assert!(registry.get("absent").is_none());
	}

	#[test]
	fn catalog_is_sorted_by_name() {
		let mut registry = ToolRegistry::new();

		registry.register(Arc::new(EchoTool { name: "web_search" }));
		registry.register(Arc::new(EchoTool { name: "rag_retriever" }));

		let catalog = registry.catalog();
		let rag = catalog.find("Tool: rag_retriever").expect("expected rag tool");
		let web = catalog.find("Tool: web_search").expect("expected web tool");
		assert!(rag < web);
	}

	#[test]
	fn register_overwrites_same_name() {
		let mut registry = ToolRegistry::new();

		registry.register(Arc::new(EchoTool { name: "rag_retriever" }));
		registry.register(Arc::new(EchoTool { name: "rag_retriever" }));

		assert_eq!(registry.len(), 1);
	}
}
