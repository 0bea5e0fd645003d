use std::sync::Arc;

use sift_agent::{AgentService, SweeperHandle, spawn_sweeper};
use sift_storage::qdrant::QdrantStore;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<AgentService>,
	// Held so the cache sweep task lives as long as the server.
	_sweeper: Arc<SweeperHandle>,
}
impl AppState {
	pub fn new(config: sift_config::Config) -> color_eyre::Result<Self> {
		let qdrant = QdrantStore::new(&config.storage.qdrant)?;
		let service = Arc::new(AgentService::new(config, qdrant));
		let sweeper = Arc::new(spawn_sweeper(&service.cache));

		Ok(Self { service, _sweeper: sweeper })
	}
}
