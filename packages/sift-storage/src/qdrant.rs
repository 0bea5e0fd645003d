//! Qdrant-backed document store. Documents carry two named vectors: one
//! for raw chunk content and one for synthesized question/answer text, so
//! retrieval can probe both embedding spaces for the same corpus.

use qdrant_client::qdrant::{
	Condition, Filter, PointId, Query, QueryPointsBuilder, ScoredPoint, Value,
	point_id::PointIdOptions, value::Kind,
};

use crate::Result;
use sift_domain::document::Document;

pub const CONTENT_VECTOR_NAME: &str = "content";
pub const QA_VECTOR_NAME: &str = "qa_content";
pub const CONTENT_FIELD: &str = "content";
pub const KNOWLEDGE_FIELD: &str = "knowledge_name";

pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl QdrantStore {
	pub fn new(cfg: &sift_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	/// Nearest-neighbor query against one named vector field, scoped to a
	/// knowledge base and cut at the store-side score threshold.
	pub async fn search(
		&self,
		vector: Vec<f32>,
		vector_field: &str,
		knowledge_name: &str,
		top_k: u64,
		score_threshold: f32,
	) -> Result<Vec<Document>> {
		let filter = Filter::must([Condition::matches(
			KNOWLEDGE_FIELD,
			knowledge_name.to_string(),
		)]);
		let mut query = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector))
			.using(vector_field)
			.filter(filter)
			.limit(top_k)
			.with_payload(true);

		if score_threshold > 0.0 {
			query = query.score_threshold(score_threshold);
		}

		let response = self.client.query(query).await?;

		Ok(response.result.iter().filter_map(point_to_document).collect())
	}
}

fn point_to_document(point: &ScoredPoint) -> Option<Document> {
	let id = point.id.as_ref().and_then(point_id_to_string)?;
	let mut content = String::new();
	let mut metadata = serde_json::Map::new();

	for (key, value) in &point.payload {
		if key == CONTENT_FIELD {
			if let Some(Kind::StringValue(text)) = &value.kind {
				content = text.clone();
			}

			continue;
		}
		if let Some(json) = payload_to_json(value) {
			metadata.insert(key.clone(), json);
		}
	}

	if content.is_empty() {
		tracing::warn!(id = %id, "Document payload missing content field.");

		return None;
	}

	Some(Document { id, content, score: point.score, metadata })
}

fn point_id_to_string(point_id: &PointId) -> Option<String> {
	match &point_id.point_id_options {
		Some(PointIdOptions::Uuid(id)) => Some(id.clone()),
		Some(PointIdOptions::Num(id)) => Some(id.to_string()),
		None => None,
	}
}

fn payload_to_json(value: &Value) -> Option<serde_json::Value> {
	match &value.kind {
		Some(Kind::StringValue(text)) => Some(serde_json::Value::String(text.clone())),
		Some(Kind::IntegerValue(number)) => Some(serde_json::Value::from(*number)),
		Some(Kind::DoubleValue(number)) => serde_json::Number::from_f64(*number).map(Into::into),
		Some(Kind::BoolValue(flag)) => Some(serde_json::Value::Bool(*flag)),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use super::*;

	fn scored_point(id: &str, content: &str, score: f32) -> ScoredPoint {
		let mut payload = HashMap::new();

		payload.insert(CONTENT_FIELD.to_string(), Value::from(content.to_string()));
		payload.insert(KNOWLEDGE_FIELD.to_string(), Value::from("kb".to_string()));

		ScoredPoint {
			id: Some(PointId { point_id_options: Some(PointIdOptions::Uuid(id.to_string())) }),
			payload,
			score,
			..Default::default()
		}
	}

	#[test]
	fn maps_point_to_document() {
		let point = scored_point("doc-1", "body text", 1.4);
		let doc = point_to_document(&point).expect("expected document");
		assert_eq!(doc.id, "doc-1");
		assert_eq!(doc.content, "body text");
		assert_eq!(doc.score, 1.4);
		assert_eq!(
			doc.metadata.get(KNOWLEDGE_FIELD).and_then(|v| v.as_str()),
			Some("kb")
		);
	}

	#[test]
	fn contentless_point_is_dropped() {
		let mut point = scored_point("doc-2", "body", 0.5);

		point.payload.remove(CONTENT_FIELD);

		assert!(point_to_document(&point).is_none());
	}
}
