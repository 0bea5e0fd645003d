use std::{
	collections::HashMap,
	sync::{Arc, RwLock},
	time::{Duration, Instant},
};

use tokio::task::JoinHandle;

use sift_domain::intent::Intent;

struct CacheEntry {
	intent: Intent,
	expires_at: Instant,
}

/// TTL-bounded memo of classification results. Entries are never updated
/// in place; they are replaced by a later `set` after expiry or dropped
/// by the sweeper. Insertion past `max_entries` is refused outright, so a
/// full cache of unexpired entries stays full until TTL passes.
pub struct IntentCache {
	entries: RwLock<HashMap<String, CacheEntry>>,
	ttl: Duration,
	max_entries: usize,
}
impl IntentCache {
	pub fn new(ttl: Duration, max_entries: usize) -> Self {
		Self { entries: RwLock::new(HashMap::new()), ttl, max_entries }
	}

	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	/// Stable key over the conversation and question. An empty
	/// conversation id shares classifications across sessions, which is
	/// what stateless questions want.
	fn key(conversation_id: &str, question: &str) -> String {
		blake3::hash(format!("{conversation_id}:{question}").as_bytes()).to_hex().to_string()
	}

	pub fn get(&self, conversation_id: &str, question: &str) -> Option<Intent> {
		let key = Self::key(conversation_id, question);
		let now = Instant::now();

		{
			let entries = self.entries.read().unwrap_or_else(|err| err.into_inner());
			let entry = entries.get(&key)?;

			if now < entry.expires_at {
				return Some(entry.intent.clone());
			}
		}

		// Expired: evict on read.
		let mut entries = self.entries.write().unwrap_or_else(|err| err.into_inner());

		if let Some(entry) = entries.get(&key)
			&& now >= entry.expires_at
		{
			entries.remove(&key);
		}

		None
	}

	pub fn set(&self, conversation_id: &str, question: &str, intent: Intent) {
		let key = Self::key(conversation_id, question);
		let mut entries = self.entries.write().unwrap_or_else(|err| err.into_inner());

		if entries.len() >= self.max_entries && !entries.contains_key(&key) {
			tracing::debug!(max_entries = self.max_entries, "Intent cache full, refusing insert.");

			return;
		}

		entries.insert(key, CacheEntry { intent, expires_at: Instant::now() + self.ttl });
	}

	pub fn len(&self) -> usize {
		self.entries.read().unwrap_or_else(|err| err.into_inner()).len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn sweep(&self) {
		let now = Instant::now();
		let mut entries = self.entries.write().unwrap_or_else(|err| err.into_inner());

		entries.retain(|_, entry| now < entry.expires_at);
	}
}

/// Cancellation handle for the background sweep task. Dropping the handle
/// stops the sweep; process exit needs nothing further.
pub struct SweeperHandle {
	handle: JoinHandle<()>,
}
impl SweeperHandle {
	pub fn stop(&self) {
		self.handle.abort();
	}
}
impl Drop for SweeperHandle {
	fn drop(&mut self) {
		self.handle.abort();
	}
}

/// Spawns the periodic sweep at half the TTL. The task holds only a weak
/// reference, so dropping the cache ends the loop on the next tick.
pub fn spawn_sweeper(cache: &Arc<IntentCache>) -> SweeperHandle {
	let weak = Arc::downgrade(cache);
	let period = cache.ttl() / 2;
	let handle = tokio::spawn(async move {
		let mut ticker = tokio::time::interval(period.max(Duration::from_millis(1)));

		ticker.tick().await;

		loop {
			ticker.tick().await;

			let Some(cache) = weak.upgrade() else { break };

			cache.sweep();
		}
	});

	SweeperHandle { handle }
}
