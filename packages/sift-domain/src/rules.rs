//! Deterministic, weighted-signal intent scoring. The rule table mixes
//! Chinese and English signals because the corpus this engine serves does;
//! scoring is pure, so identical normalized input always yields the same
//! score vector.

use regex::Regex;

use crate::{
	intent::{
		ClassificationMethod, Complexity, Intent, IntentKind, ScopeConstraint, Strategy,
		TimeConstraint, now_rfc3339,
	},
	normalize::normalize,
};

const KEYWORD_WEIGHT: f64 = 1.0;
const HOT_WORD_WEIGHT: f64 = 2.0;
const PATTERN_WEIGHT: f64 = 3.0;
const DOMAIN_WEIGHT: f64 = 1.5;

/// Winning rules below this score classify as unknown.
const MIN_CONFIDENCE: f64 = 0.3;

struct IntentRule {
	kind: IntentKind,
	keywords: Vec<&'static str>,
	hot_words: Vec<&'static str>,
	patterns: Vec<Regex>,
	domain_keywords: Vec<&'static str>,
	weight: f64,
	strategy: Strategy,
	tools: Vec<&'static str>,
	estimated_steps: u8,
}

struct SlotParser {
	name: &'static str,
	pattern: Regex,
}

pub struct RuleClassifier {
	rules: Vec<IntentRule>,
	slot_parsers: Vec<SlotParser>,
}
impl RuleClassifier {
	pub fn new() -> Self {
		Self { rules: build_rules(), slot_parsers: build_slot_parsers() }
	}

	pub fn classify(&self, text: &str) -> Intent {
		let normalized = normalize(text);
		let scores = self.score(&normalized);
		let slots = self.extract_slots(text);
		// Highest score wins; ties resolve by rule-table order so the
		// result is reproducible.
		let best = scores
			.iter()
			.enumerate()
			.filter(|(_, score)| **score >= MIN_CONFIDENCE)
			.max_by(|(left_idx, left), (right_idx, right)| {
				left.partial_cmp(right)
					.unwrap_or(std::cmp::Ordering::Equal)
					.then_with(|| right_idx.cmp(left_idx))
			});
		let Some((idx, score)) = best else {
			return Intent::unknown(text, 0.0, ClassificationMethod::Rule);
		};
		let rule = &self.rules[idx];

		Intent {
			kind: rule.kind,
			confidence: (*score as f32).clamp(0.0, 1.0),
			raw_text: text.to_string(),
			strategy: rule.strategy,
			need_tools: rule.tools.iter().map(|tool| tool.to_string()).collect(),
			estimated_steps: rule.estimated_steps.clamp(1, 5),
			complexity: estimate_complexity(text, rule.estimated_steps),
			requires_external: requires_external(rule.kind, text),
			knowledge_domains: extract_domains(text),
			sub_questions: Vec::new(),
			time_constraint: time_constraint(&slots),
			scope_constraint: scope_constraint(&slots),
			classification_method: ClassificationMethod::Rule,
			timestamp: now_rfc3339(),
		}
	}

	/// Per-rule scores for normalized text, in rule-table order. Exposed
	/// so purity can be asserted directly over the full vector.
	pub fn scores(&self, text: &str) -> Vec<(IntentKind, f64)> {
		let normalized = normalize(text);

		self.score(&normalized)
			.into_iter()
			.enumerate()
			.map(|(idx, score)| (self.rules[idx].kind, score))
			.collect()
	}

	fn score(&self, normalized: &str) -> Vec<f64> {
		let lower = normalized.to_lowercase();

		self.rules
			.iter()
			.map(|rule| {
				let mut raw = 0.0;
				let mut hits = 0usize;
				let total = rule.keywords.len()
					+ rule.hot_words.len()
					+ rule.patterns.len()
					+ rule.domain_keywords.len();

				for keyword in &rule.keywords {
					if lower.contains(keyword) {
						raw += KEYWORD_WEIGHT;
						hits += 1;
					}
				}
				for hot_word in &rule.hot_words {
					if lower.contains(hot_word) {
						raw += HOT_WORD_WEIGHT;
						hits += 1;
					}
				}
				for pattern in &rule.patterns {
					if pattern.is_match(normalized) {
						raw += PATTERN_WEIGHT;
						hits += 1;
					}
				}
				for domain_keyword in &rule.domain_keywords {
					if lower.contains(domain_keyword) {
						raw += DOMAIN_WEIGHT;
						hits += 1;
					}
				}

				if raw <= 0.0 || total == 0 {
					return 0.0;
				}

				// Saturating hit-rate term keeps sparse-but-strong matches
				// from being drowned by long signal lists; the log term
				// normalizes the raw mass against the rule's ceiling.
				let hit_rate = hits as f64 / total as f64;
				let saturation = 1.0 - (-3.0 * hit_rate).exp();
				let max_raw = (rule.keywords.len() as f64 * KEYWORD_WEIGHT
					+ rule.hot_words.len() as f64 * HOT_WORD_WEIGHT
					+ rule.patterns.len() as f64 * PATTERN_WEIGHT
					+ rule.domain_keywords.len() as f64 * DOMAIN_WEIGHT)
					* rule.weight;
				let log_norm = (raw * rule.weight).ln_1p() / max_raw.ln_1p();

				0.6 * log_norm + 0.4 * saturation
			})
			.collect()
	}

	fn extract_slots(&self, text: &str) -> Vec<(&'static str, Vec<String>)> {
		self.slot_parsers
			.iter()
			.filter_map(|parser| {
				let matches: Vec<String> =
					parser.pattern.find_iter(text).map(|m| m.as_str().to_string()).collect();

				if matches.is_empty() { None } else { Some((parser.name, matches)) }
			})
			.collect()
	}
}
impl Default for RuleClassifier {
	fn default() -> Self {
		Self::new()
	}
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
	patterns.iter().map(|p| Regex::new(p).expect("hard-coded intent pattern")).collect()
}

fn build_rules() -> Vec<IntentRule> {
	vec![
		IntentRule {
			kind: IntentKind::SimpleQa,
			keywords: vec!["什么是", "what is", "define"],
			hot_words: vec!["什么是", "是什么"],
			patterns: compile(&[
				r"^什么是[\p{Han}A-Za-z0-9 ]{1,24}[?？]?$",
				r"(?i)^(what is|define|explain)\b",
			]),
			domain_keywords: vec![],
			weight: 1.2,
			strategy: Strategy::SimpleRag,
			tools: vec!["rag"],
			estimated_steps: 1,
		},
		IntentRule {
			kind: IntentKind::FactCheck,
			keywords: vec!["是否", "真的", "确认", "verify", "check"],
			hot_words: vec!["是不是", "对不对", "有没有"],
			patterns: compile(&[r"(?i)(is it true|verify|confirm)", r"是(真的|假的|对的|错的)"]),
			domain_keywords: vec![],
			weight: 1.1,
			strategy: Strategy::SimpleRag,
			tools: vec!["rag"],
			estimated_steps: 2,
		},
		IntentRule {
			kind: IntentKind::MultiHopQa,
			keywords: vec!["为什么", "原因", "如何", "怎么", "影响", "导致", "关系"],
			hot_words: vec!["背后的原因", "如何实现", "工作原理", "为什么会"],
			patterns: compile(&[
				r"(为什么|why).*(导致|影响|实现|会)",
				r"(如何|how).*(实现|工作|运行)",
			]),
			domain_keywords: vec!["原理", "机制", "过程"],
			weight: 1.2,
			strategy: Strategy::ReactAgent,
			tools: vec!["rag"],
			estimated_steps: 3,
		},
		IntentRule {
			kind: IntentKind::CausalReasoning,
			keywords: vec!["因为", "所以", "导致", "造成", "引起", "产生"],
			hot_words: vec!["根本原因", "直接原因", "间接影响"],
			patterns: compile(&[
				r"(因为|because).*(所以|therefore)",
				r"(导致|cause|lead to).*(结果|result)",
			]),
			domain_keywords: vec![],
			weight: 1.3,
			strategy: Strategy::ReactAgent,
			tools: vec!["rag"],
			estimated_steps: 4,
		},
		IntentRule {
			kind: IntentKind::Procedural,
			keywords: vec!["步骤", "如何做", "怎么做", "流程", "操作", "教程"],
			hot_words: vec!["一步一步", "详细步骤", "操作指南"],
			patterns: compile(&[r"(如何|怎么)(做|操作|实现|配置)", r"(?i)(step by step|how to)"]),
			domain_keywords: vec![],
			weight: 1.1,
			strategy: Strategy::SimpleRag,
			tools: vec!["rag"],
			estimated_steps: 2,
		},
		IntentRule {
			kind: IntentKind::Comparison,
			keywords: vec!["对比", "比较", "区别", "差异", "compare", "difference", "vs", "versus"],
			hot_words: vec!["哪个更好", "优缺点", "选择哪个", "异同点"],
			patterns: compile(&[
				r"(对比|比较|compare).*(和|与|vs|versus)",
				r"(?i)\w+\s+(vs|versus)\s+\w+",
				r"(?i)(优缺点|pros and cons)",
			]),
			domain_keywords: vec![],
			weight: 1.3,
			strategy: Strategy::ReactAgent,
			tools: vec!["rag"],
			estimated_steps: 4,
		},
		IntentRule {
			kind: IntentKind::Summarization,
			keywords: vec!["总结", "概括", "summarize", "摘要", "归纳", "概述"],
			hot_words: vec!["用一句话", "简要说明", "核心内容"],
			patterns: compile(&[r"(总结|summarize|概括).*(所有|全部|整个)", r"简要(说明|介绍|描述)"]),
			domain_keywords: vec![],
			weight: 1.0,
			strategy: Strategy::SimpleRag,
			tools: vec!["rag"],
			estimated_steps: 2,
		},
		IntentRule {
			kind: IntentKind::Aggregation,
			keywords: vec!["统计", "计算", "总共", "平均", "最大", "最小", "多少"],
			hot_words: vec!["一共有", "总数", "数量"],
			patterns: compile(&[
				r"(?i)(统计|计算|count|sum).*(数量|总数|平均)",
				r"(?i)(有多少|how many)",
			]),
			domain_keywords: vec![],
			weight: 1.4,
			strategy: Strategy::ReactAgent,
			tools: vec!["rag", "calculator"],
			estimated_steps: 3,
		},
		IntentRule {
			kind: IntentKind::TrendAnalysis,
			keywords: vec!["趋势", "变化", "增长", "下降", "发展", "演变"],
			hot_words: vec!["发展趋势", "变化趋势", "未来走向"],
			patterns: compile(&[
				r"(?i)(趋势|trend|变化|change).*(分析|analysis)",
				r"(增长|下降).*(率|速度)",
			]),
			domain_keywords: vec![],
			weight: 1.3,
			strategy: Strategy::ReactAgent,
			tools: vec!["rag", "calculator"],
			estimated_steps: 4,
		},
		IntentRule {
			kind: IntentKind::HybridSearch,
			keywords: vec!["最新", "最近", "当前", "现在", "latest", "current", "recent"],
			hot_words: vec!["最新进展", "当前状态", "最近发生"],
			patterns: compile(&[
				r"(?i)(最新|latest|最近|recent).*(消息|进展|状态|新闻|news)",
				r"(?i)(当前|current|现在|now)",
			]),
			domain_keywords: vec![],
			weight: 1.4,
			strategy: Strategy::Hybrid,
			tools: vec!["rag", "web_search"],
			estimated_steps: 3,
		},
		IntentRule {
			kind: IntentKind::RealtimeQuery,
			keywords: vec!["今天", "昨天", "明天", "现在", "实时", "当前"],
			hot_words: vec!["实时数据", "最新数据", "当前值"],
			patterns: compile(&[
				r"(?i)(今天|昨天|明天|today|yesterday|tomorrow)",
				r"(?i)(实时|real-time|即时)",
			]),
			domain_keywords: vec![],
			weight: 1.5,
			strategy: Strategy::Hybrid,
			tools: vec!["rag", "web_search"],
			estimated_steps: 2,
		},
		IntentRule {
			kind: IntentKind::CodeGeneration,
			keywords: vec!["代码", "实现", "code", "implement", "写一个", "生成"],
			hot_words: vec!["写代码", "代码示例", "实现代码"],
			patterns: compile(&[
				r"(?i)(写|生成|create).*(代码|code)",
				r"(?i)(implement|实现).*(function|函数|方法)",
			]),
			domain_keywords: vec!["python", "go", "rust", "java", "javascript", "function", "class"],
			weight: 1.2,
			strategy: Strategy::ReactAgent,
			tools: vec!["rag"],
			estimated_steps: 3,
		},
		IntentRule {
			kind: IntentKind::ContentCreation,
			keywords: vec!["写", "创作", "生成", "制作", "设计"],
			hot_words: vec!["帮我写", "帮我生成", "创作一个"],
			patterns: compile(&[
				r"(?i)(写|创作|生成|create).*(文章|方案|报告|计划)",
				r"(?i)(帮我|help me).*(写|生成|create)",
			]),
			domain_keywords: vec![],
			weight: 1.1,
			strategy: Strategy::ReactAgent,
			tools: vec!["rag"],
			estimated_steps: 4,
		},
		IntentRule {
			kind: IntentKind::Clarification,
			keywords: vec!["不太明白", "什么意思", "能详细", "具体", "再说一遍"],
			hot_words: vec!["不太理解", "没听懂", "解释一下"],
			patterns: compile(&[
				r"(?i)(不(太)?(明白|理解|懂)|what do you mean)",
				r"(详细|具体)说明",
			]),
			domain_keywords: vec![],
			weight: 0.9,
			strategy: Strategy::SimpleRag,
			tools: vec!["rag"],
			estimated_steps: 1,
		},
	]
}

fn build_slot_parsers() -> Vec<SlotParser> {
	vec![
		SlotParser {
			name: "time",
			pattern: Regex::new(
				r"\d{4}[-/年]\d{1,2}[-/月]\d{1,2}日?|\d{1,2}[-/月]\d{1,2}日?|今天|明天|昨天|上周|本月|去年|last week|yesterday|today|tomorrow|\d+\s*(minutes?|hours?|days?|weeks?|months?|years?)\s*(ago|later|前|后)",
			)
			.expect("hard-coded slot pattern"),
		},
		SlotParser {
			name: "number",
			pattern: Regex::new(r"\d+(?:\.\d+)?|[一二三四五六七八九十百千万亿]+")
				.expect("hard-coded slot pattern"),
		},
		SlotParser {
			name: "entity",
			pattern: Regex::new(r"[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*|\p{Han}{2,}")
				.expect("hard-coded slot pattern"),
		},
	]
}

fn estimate_complexity(text: &str, steps: u8) -> Complexity {
	let chars = text.chars().count();

	if steps <= 2 && chars < 30 {
		Complexity::Simple
	} else if steps >= 5 || chars > 100 {
		Complexity::Complex
	} else {
		Complexity::Medium
	}
}

fn requires_external(kind: IntentKind, text: &str) -> bool {
	if matches!(kind, IntentKind::HybridSearch | IntentKind::RealtimeQuery) {
		return true;
	}

	let lower = text.to_lowercase();

	["最新", "实时", "latest", "current", "今天", "昨天", "now"]
		.iter()
		.any(|keyword| lower.contains(keyword))
}

fn extract_domains(text: &str) -> Vec<String> {
	let domain_map: [(&str, &[&str]); 4] = [
		("machine_learning", &["机器学习", "深度学习", "神经网络", "模型", "训练"]),
		("database", &["数据库", "sql", "查询", "索引", "事务"]),
		("web_development", &["前端", "后端", "api", "接口", "框架"]),
		("devops", &["运维", "部署", "容器", "k8s", "docker"]),
	];
	let lower = text.to_lowercase();

	domain_map
		.iter()
		.filter(|(_, keywords)| keywords.iter().any(|keyword| lower.contains(keyword)))
		.map(|(domain, _)| domain.to_string())
		.collect()
}

fn time_constraint(slots: &[(&'static str, Vec<String>)]) -> Option<TimeConstraint> {
	slots.iter().find(|(name, _)| *name == "time").and_then(|(_, matches)| {
		matches.first().map(|first| TimeConstraint {
			start_time: None,
			end_time: None,
			relative: Some(first.clone()),
		})
	})
}

fn scope_constraint(slots: &[(&'static str, Vec<String>)]) -> Option<ScopeConstraint> {
	slots.iter().find(|(name, _)| *name == "entity").map(|(_, matches)| ScopeConstraint {
		knowledge_bases: Vec::new(),
		categories: Vec::new(),
		entities: matches.clone(),
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn definitional_chinese_question_scores_high() {
		let classifier = RuleClassifier::new();
		let intent = classifier.classify("什么是RAG?");

		assert_eq!(intent.kind, IntentKind::SimpleQa);
		assert_eq!(intent.strategy, Strategy::SimpleRag);
		assert!(intent.confidence >= 0.7, "confidence {}", intent.confidence);
	}

	#[test]
	fn scoring_is_pure() {
		let classifier = RuleClassifier::new();
		let first = classifier.scores("对比 Elasticsearch 和 Milvus 的性能");
		let second = classifier.scores("对比 Elasticsearch 和 Milvus 的性能");

		assert_eq!(first, second);
	}

	#[test]
	fn comparison_question_routes_to_react() {
		let classifier = RuleClassifier::new();
		let intent = classifier.classify("对比 Elasticsearch 和 Milvus 的优缺点");

		assert_eq!(intent.kind, IntentKind::Comparison);
		assert_eq!(intent.strategy, Strategy::ReactAgent);
	}

	#[test]
	fn realtime_question_requires_external() {
		let classifier = RuleClassifier::new();
		let intent = classifier.classify("今天的实时数据是多少");

		assert_eq!(intent.kind, IntentKind::RealtimeQuery);
		assert!(intent.requires_external);
		assert_eq!(intent.strategy, Strategy::Hybrid);
	}

	#[test]
	fn unmatched_text_is_unknown_with_zero_confidence() {
		let classifier = RuleClassifier::new();
		let intent = classifier.classify("qwzx ptlk vbnm");

		assert_eq!(intent.kind, IntentKind::Unknown);
		assert_eq!(intent.confidence, 0.0);
		assert_eq!(intent.estimated_steps, 1);
	}

	#[test]
	fn confidence_stays_in_unit_interval() {
		let classifier = RuleClassifier::new();

		for question in [
			"什么是RAG?",
			"对比 A 和 B 的优缺点并给出推荐",
			"今天的最新进展是什么，帮我总结所有变化趋势",
			"how to configure the index step by step",
		] {
			let intent = classifier.classify(question);

			assert!((0.0..=1.0).contains(&intent.confidence));
			assert!((1..=5).contains(&intent.estimated_steps));
		}
	}

	#[test]
	fn fullwidth_punctuation_folds_before_matching() {
		let classifier = RuleClassifier::new();
		let intent = classifier.classify("什么是向量数据库？");

		assert_eq!(intent.kind, IntentKind::SimpleQa);
	}

	#[test]
	fn time_slot_becomes_relative_constraint() {
		let classifier = RuleClassifier::new();
		let intent = classifier.classify("昨天的实时数据是多少");
		let constraint = intent.time_constraint.expect("expected time constraint");

		assert_eq!(constraint.relative.as_deref(), Some("昨天"));
	}
}
