pub mod cache;
pub mod classify;
pub mod decompose;
pub mod hybrid;
pub mod multi_hop;
pub mod react;
pub mod retrieve;
pub mod strategy;
pub mod tool;
pub mod tools;

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use tokio::sync::mpsc;

use sift_config::{Config, LlmProviderConfig, ProviderConfig, WebSearchConfig};
use sift_domain::{document::Document, message::ChatMessage};
use sift_providers::web_search::WebSearchItem;
use sift_storage::qdrant::QdrantStore;

pub use cache::{IntentCache, SweeperHandle, spawn_sweeper};
pub use classify::{HybridClassifier, LlmClassifier};
pub use retrieve::{RetrievalRequest, Retriever};
pub use strategy::{AgenticRequest, AgenticResponse};

pub type AgentResult<T> = Result<T, AgentError>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait ChatModel
where
	Self: Send + Sync,
{
	fn generate<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [ChatMessage],
	) -> BoxFuture<'a, color_eyre::Result<ChatMessage>>;

	fn stream<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [ChatMessage],
	) -> BoxFuture<'a, color_eyre::Result<mpsc::Receiver<String>>>;
}

pub trait DocumentStore
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		cfg: &'a Config,
		query: &'a str,
		vector_field: &'a str,
		knowledge_name: &'a str,
		top_k: u32,
		score_threshold: f32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Document>>>;
}

pub trait Reranker
where
	Self: Send + Sync,
{
	fn rerank<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		query: &'a str,
		docs: &'a [Document],
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>>;
}

pub trait WebSearch
where
	Self: Send + Sync,
{
	fn enabled(&self, cfg: &WebSearchConfig) -> bool {
		cfg.enabled && sift_providers::web_search::is_configured(cfg)
	}

	fn search<'a>(
		&'a self,
		cfg: &'a WebSearchConfig,
		query: &'a str,
		max_results: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<WebSearchItem>>>;
}

#[derive(Debug)]
pub enum AgentError {
	Validation { message: String },
	Upstream { message: String },
	Parse { message: String },
	AllSubQuestionsFailed,
	UnparsableCompletion { preview: String },
	HybridPathsFailed,
}
impl std::fmt::Display for AgentError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Validation { message } => write!(f, "Invalid input: {message}"),
			Self::Upstream { message } => write!(f, "Upstream call failed: {message}"),
			Self::Parse { message } => write!(f, "Malformed model output: {message}"),
			Self::AllSubQuestionsFailed => {
				write!(f, "All sub-questions failed to retrieve documents.")
			},
			Self::UnparsableCompletion { preview } => {
				write!(f, "Completion does not follow the reasoning protocol: {preview}")
			},
			Self::HybridPathsFailed => {
				write!(f, "Both retrieval and web search paths failed.")
			},
		}
	}
}
impl std::error::Error for AgentError {}
impl From<color_eyre::Report> for AgentError {
	fn from(err: color_eyre::Report) -> Self {
		Self::Upstream { message: err.to_string() }
	}
}

#[derive(Clone)]
pub struct Providers {
	pub chat: Arc<dyn ChatModel>,
	pub store: Arc<dyn DocumentStore>,
	pub reranker: Arc<dyn Reranker>,
	pub web: Arc<dyn WebSearch>,
}
impl Providers {
	pub fn new(
		chat: Arc<dyn ChatModel>,
		store: Arc<dyn DocumentStore>,
		reranker: Arc<dyn Reranker>,
		web: Arc<dyn WebSearch>,
	) -> Self {
		Self { chat, store, reranker, web }
	}

	pub fn with_qdrant(qdrant: QdrantStore) -> Self {
		let provider = Arc::new(HttpProviders);

		Self {
			chat: provider.clone(),
			store: Arc::new(QdrantDocumentStore { qdrant }),
			reranker: provider.clone(),
			web: provider,
		}
	}
}

struct HttpProviders;

struct QdrantDocumentStore {
	qdrant: QdrantStore,
}

impl ChatModel for HttpProviders {
	fn generate<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [ChatMessage],
	) -> BoxFuture<'a, color_eyre::Result<ChatMessage>> {
		Box::pin(sift_providers::chat::generate(cfg, messages))
	}

	fn stream<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [ChatMessage],
	) -> BoxFuture<'a, color_eyre::Result<mpsc::Receiver<String>>> {
		Box::pin(sift_providers::chat::stream(cfg, messages))
	}
}
impl Reranker for HttpProviders {
	fn rerank<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		query: &'a str,
		docs: &'a [Document],
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>> {
		Box::pin(sift_providers::rerank::rerank(cfg, query, docs))
	}
}
impl WebSearch for HttpProviders {
	fn search<'a>(
		&'a self,
		cfg: &'a WebSearchConfig,
		query: &'a str,
		max_results: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<WebSearchItem>>> {
		Box::pin(sift_providers::web_search::search(cfg, query, max_results))
	}
}
impl DocumentStore for QdrantDocumentStore {
	fn search<'a>(
		&'a self,
		cfg: &'a Config,
		query: &'a str,
		vector_field: &'a str,
		knowledge_name: &'a str,
		top_k: u32,
		score_threshold: f32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Document>>> {
		Box::pin(async move {
			let embeddings =
				sift_providers::embedding::embed(&cfg.providers.embedding, &[query.to_string()])
					.await?;
			let Some(vector) = embeddings.into_iter().next() else {
				return Err(color_eyre::eyre::eyre!("Embedding provider returned no vectors."));
			};
			let docs = self
				.qdrant
				.search(vector, vector_field, knowledge_name, top_k as u64, score_threshold)
				.await?;

			Ok(docs)
		})
	}
}

pub struct AgentService {
	pub cfg: Config,
	pub providers: Providers,
	pub registry: tool::ToolRegistry,
	pub classifier: HybridClassifier,
	pub cache: Arc<IntentCache>,
}
impl AgentService {
	pub fn new(cfg: Config, qdrant: QdrantStore) -> Self {
		Self::with_providers(cfg, Providers::with_qdrant(qdrant))
	}

	pub fn with_providers(cfg: Config, providers: Providers) -> Self {
		let classifier = if cfg.classifier.use_llm {
			HybridClassifier::new(
				&cfg.classifier,
				Some(LlmClassifier::new(providers.chat.clone(), cfg.providers.chat.clone())),
			)
		} else {
			HybridClassifier::rule_only(&cfg.classifier)
		};
		let cache = Arc::new(IntentCache::new(
			Duration::from_secs(cfg.classifier.cache_ttl_secs),
			cfg.classifier.cache_max_entries,
		));
		let mut registry = tool::ToolRegistry::new();

		registry.register(Arc::new(tools::RetrievalTool::new(cfg.clone(), providers.clone())));
		registry.register(Arc::new(tools::WebSearchTool::new(cfg.clone(), providers.clone())));

		Self { cfg, providers, registry, classifier, cache }
	}

	pub fn retriever(&self) -> Retriever {
		Retriever::new(self.cfg.clone(), self.providers.clone())
	}
}
