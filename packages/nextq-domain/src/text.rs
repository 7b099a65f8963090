use std::{collections::HashSet, sync::OnceLock};

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::Category;

pub const MAX_KEYWORDS: usize = 5;

const STOPWORDS: [&str; 25] = [
	"the", "a", "an", "in", "on", "at", "for", "to", "of", "and", "or", "how", "what", "when",
	"where", "why", "which", "who", "is", "are", "was", "were", "be", "been", "being",
];
const COMPARISON_KEYWORDS: [&str; 8] =
	["vs", "versus", "compare", "comparison", "difference", "better", "alternative", "instead"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryPattern {
	DeepDive,
	Comparison,
	Exploration,
	ProblemSolving,
	NewUser,
}
impl QueryPattern {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::DeepDive => "deep_dive",
			Self::Comparison => "comparison",
			Self::Exploration => "exploration",
			Self::ProblemSolving => "problem_solving",
			Self::NewUser => "new_user",
		}
	}
}

/// Cache key form of a text: NFKC, lower-cased, trimmed.
pub fn normalize_key(text: &str) -> String {
	text.nfkc().collect::<String>().to_lowercase().trim().to_string()
}

/// The first few content words of a query, in order of appearance.
pub fn extract_keywords(query: &str) -> Vec<String> {
	let lowered = query.to_lowercase();
	let cleaned = punctuation_regex().replace_all(&lowered, " ").into_owned();

	cleaned
		.split_whitespace()
		.filter(|word| word.chars().count() > 3 && !STOPWORDS.contains(word))
		.take(MAX_KEYWORDS)
		.map(str::to_string)
		.collect()
}

pub fn jaccard<T>(left: &[T], right: &[T]) -> f32
where
	T: Eq + std::hash::Hash,
{
	let left: HashSet<&T> = left.iter().collect();
	let right: HashSet<&T> = right.iter().collect();
	let union = left.union(&right).count();

	if union == 0 {
		return 0.0;
	}

	left.intersection(&right).count() as f32 / union as f32
}

/// Shared items over the larger of the two sets, never dividing by zero.
pub fn overlap_ratio(left: &HashSet<String>, right: &HashSet<String>) -> f32 {
	let shared = left.intersection(right).count();
	let denominator = left.len().max(right.len()).max(1);

	shared as f32 / denominator as f32
}

/// Overlap between the two most recent keyword sets. Older sets do not take part.
pub fn keyword_overlap(topics: &[Vec<String>]) -> f32 {
	match topics {
		[first, second, ..] => jaccard(first, second),
		_ => 0.0,
	}
}

pub fn is_comparison<S>(queries: &[S]) -> bool
where
	S: AsRef<str>,
{
	queries.iter().any(|query| {
		let lowered = query.as_ref().to_lowercase();

		COMPARISON_KEYWORDS.iter().any(|keyword| lowered.contains(keyword))
	})
}

/// Classifies a non-empty recent query window, newest first.
pub fn classify_pattern<S>(recent: &[S], topics: &[Vec<String>]) -> QueryPattern
where
	S: AsRef<str>,
{
	if recent.is_empty() {
		return QueryPattern::NewUser;
	}

	let overlap = keyword_overlap(topics);
	let comparison = is_comparison(recent);

	if overlap > 0.7 && !comparison {
		QueryPattern::DeepDive
	} else if comparison {
		QueryPattern::Comparison
	} else if overlap < 0.3 {
		QueryPattern::Exploration
	} else {
		QueryPattern::ProblemSolving
	}
}

pub fn infer_category(query: &str) -> Category {
	let lowered = query.to_lowercase();
	let has_any = |terms: &[&str]| terms.iter().any(|term| lowered.contains(term));

	if has_any(&["compare", "vs", "versus", "difference"]) {
		Category::Comparison
	} else if has_any(&["latest", "recent", "new", "emerging", "breakthrough"]) {
		Category::Trend
	} else if has_any(&["how does", "mechanism", "why", "what causes"]) {
		Category::Deepening
	} else if has_any(&["clinical", "patient", "treatment", "therapy"]) {
		Category::Practical
	} else if has_any(&["relationship", "connection", "link", "related"]) {
		Category::Bridging
	} else {
		Category::Exploration
	}
}

/// Truncates to at most `max_chars` characters without splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
	match text.char_indices().nth(max_chars) {
		Some((idx, _)) => &text[..idx],
		None => text,
	}
}

fn punctuation_regex() -> &'static Regex {
	static RE: OnceLock<Regex> = OnceLock::new();

	// `\w` is Unicode-aware here, so accented letters are kept as word characters.
	RE.get_or_init(|| Regex::new(r"[^\w\s-]").expect("Punctuation pattern must compile."))
}
