use unicode_normalization::UnicodeNormalization;

/// Canonicalizes question text before rule matching: trim, NFKC fold
/// (which maps full-width punctuation and Latin forms to their half-width
/// counterparts), then collapse internal whitespace runs to single spaces.
pub fn normalize(text: &str) -> String {
	let folded: String = text.trim().nfkc().collect();

	folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn trims_and_collapses_whitespace() {
		assert_eq!(normalize("  what   is\tRAG ?  "), "what is RAG ?");
	}

	#[test]
	fn folds_fullwidth_punctuation() {
		assert_eq!(normalize("什么是ＲＡＧ？"), "什么是RAG?");
	}

	#[test]
	fn leaves_cjk_ideographs_untouched() {
		assert_eq!(normalize("什么是向量数据库"), "什么是向量数据库");
	}
}
