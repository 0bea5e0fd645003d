use std::{cmp::Ordering, collections::HashMap};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Document {
	pub id: String,
	pub content: String,
	pub score: f32,
	#[serde(default)]
	pub metadata: Map<String, Value>,
}

/// Merges document sets by id, keeping the highest-scoring instance of
/// each id. Document identity is never rewritten here; only selection and
/// ordering happen.
pub fn merge_by_id(docs: impl IntoIterator<Item = Document>) -> Vec<Document> {
	let mut best: HashMap<String, Document> = HashMap::new();

	for doc in docs {
		match best.get(&doc.id) {
			Some(existing) if existing.score >= doc.score => {},
			_ => {
				best.insert(doc.id.clone(), doc);
			},
		}
	}

	let mut merged: Vec<Document> = best.into_values().collect();

	sort_by_score_desc(&mut merged);

	merged
}

pub fn sort_by_score_desc(docs: &mut [Document]) {
	docs.sort_by(|left, right| {
		cmp_f32_desc(left.score, right.score).then_with(|| left.id.cmp(&right.id))
	});
}

pub fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}

/// Normalizes a consumer-facing score threshold to rank-score space.
/// Vendor similarity scores arrive on a 1-2 scale; thresholds at or above
/// 1 are shifted down by 1, anything else passes through unchanged.
pub fn rank_score(score_threshold: f32) -> f32 {
	if score_threshold >= 1.0 { score_threshold - 1.0 } else { score_threshold }
}

/// Char-boundary-safe prefix, used for snippet rendering and
/// content-keyed deduplication.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
	match text.char_indices().nth(max_chars) {
		Some((idx, _)) => &text[..idx],
		None => text,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn doc(id: &str, score: f32) -> Document {
		Document { id: id.to_string(), content: id.to_string(), score, metadata: Map::new() }
	}

	#[test]
	fn merge_keeps_highest_score_per_id() {
		let merged = merge_by_id([doc("a", 0.4), doc("a", 0.9), doc("b", 0.5)]);
		assert_eq!(merged.len(), 2);
		assert_eq!(merged[0].id, "a");
		assert_eq!(merged[0].score, 0.9);
	}

	#[test]
	fn sort_is_descending_and_stable_on_ties() {
		let mut docs = vec![doc("b", 0.5), doc("a", 0.5), doc("c", 0.9)];
		sort_by_score_desc(&mut docs);
		assert_eq!(docs[0].id, "c");
		assert_eq!(docs[1].id, "a");
		assert_eq!(docs[2].id, "b");
	}

	#[test]
	fn rank_score_shifts_vendor_scale() {
		assert_eq!(rank_score(1.5), 0.5);
		assert_eq!(rank_score(0.2), 0.2);
	}

	#[test]
	fn truncate_respects_char_boundaries() {
		assert_eq!(truncate_chars("什么是向量", 3), "什么是");
		assert_eq!(truncate_chars("ab", 5), "ab");
	}
}
