use serde::{Deserialize, Serialize};

/// Fixed weights for relevance, novelty, actionability, impact, and diversity, in that order.
pub const WEIGHTS: [f32; 5] = [0.35, 0.20, 0.20, 0.15, 0.10];
pub const DEFAULT_BASE_SCORE: f32 = 0.5;
pub const NEUTRAL_RELEVANCE: f32 = 0.5;
pub const CATEGORY_REPEAT_PENALTY: f32 = 0.15;
pub const CLUSTER_REPEAT_PENALTY: f32 = 0.2;

const VAGUE_PHRASES: [&str; 5] =
	["everything about", "all aspects of", "complete guide to", "cure cancer", "solve"];
const ACTIONABLE_TERMS: [&str; 10] = [
	"latest",
	"recent",
	"current",
	"effective",
	"mechanism",
	"role",
	"impact",
	"relationship",
	"compare",
	"development",
];

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
	pub relevance: f32,
	pub novelty: f32,
	pub actionability: f32,
	pub impact: f32,
	pub diversity: f32,
}

pub fn overall_score(scores: &ScoreBreakdown) -> f32 {
	let [relevance, novelty, actionability, impact, diversity] = WEIGHTS;

	scores.relevance * relevance
		+ scores.novelty * novelty
		+ scores.actionability * actionability
		+ scores.impact * impact
		+ scores.diversity * diversity
}

/// Word count is taken over single-space splits, so repeated spaces count as extra words.
pub fn actionability(question: &str) -> f32 {
	let lowered = question.to_lowercase();
	let words = question.split(' ').count();
	let mut score: f32 = 0.5;

	if (5..=25).contains(&words) {
		score += 0.2;
	}
	if !VAGUE_PHRASES.iter().any(|phrase| lowered.contains(phrase)) {
		score += 0.2;
	}
	if ACTIONABLE_TERMS.iter().any(|term| lowered.contains(term)) {
		score += 0.1;
	}

	score.min(1.0)
}

/// Novelty against the best-matching prior query. No history means maximal novelty.
pub fn novelty(similarities: &[f32]) -> f32 {
	if similarities.is_empty() {
		return 1.0;
	}

	let max = similarities.iter().copied().fold(0.0_f32, f32::max);

	(1.0 - max).max(0.0)
}

pub fn relevance(similarities: &[f32]) -> f32 {
	if similarities.is_empty() {
		return NEUTRAL_RELEVANCE;
	}

	similarities.iter().copied().fold(0.0_f32, f32::max)
}

pub fn diversity(prior_category_count: usize, shares_earlier_cluster: bool) -> f32 {
	let category_penalty = prior_category_count as f32 * CATEGORY_REPEAT_PENALTY;
	let cluster_penalty = if shares_earlier_cluster { CLUSTER_REPEAT_PENALTY } else { 0.0 };

	(1.0 - category_penalty - cluster_penalty).max(0.0)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn weights_sum_to_one() {
		let total: f32 = WEIGHTS.iter().sum();

		assert!((total - 1.0).abs() < 1e-6, "Weights sum to {total}.");
	}

	#[test]
	fn overall_score_is_weighted_sum() {
		let ones = ScoreBreakdown {
			relevance: 1.0,
			novelty: 1.0,
			actionability: 1.0,
			impact: 1.0,
			diversity: 1.0,
		};

		assert!((overall_score(&ones) - 1.0).abs() < 1e-6);

		let relevance_only = ScoreBreakdown {
			relevance: 1.0,
			novelty: 0.0,
			actionability: 0.0,
			impact: 0.0,
			diversity: 0.0,
		};

		assert!((overall_score(&relevance_only) - 0.35).abs() < 1e-6);
	}

	#[test]
	fn actionability_rewards_specific_research_language() {
		let specific = "What are the latest developments in CAR-T therapy?";

		assert!((actionability(specific) - 1.0).abs() < 1e-6);

		let vague = "How to cure cancer";

		// Four words and a vague phrase: base only.
		assert!((actionability(vague) - 0.5).abs() < 1e-6);

		let plain = "Which groups publish on tumor hypoxia?";

		assert!((actionability(plain) - 0.9).abs() < 1e-6);
	}

	#[test]
	fn novelty_and_relevance_defaults() {
		assert_eq!(novelty(&[]), 1.0);
		assert!((novelty(&[0.2, 0.6]) - 0.4).abs() < 1e-6);
		assert_eq!(novelty(&[1.2]), 0.0);
		assert_eq!(relevance(&[]), 0.5);
		assert_eq!(relevance(&[-0.4]), 0.0);
	}

	#[test]
	fn diversity_penalties_stack_and_floor_at_zero() {
		assert_eq!(diversity(0, false), 1.0);
		assert!((diversity(1, true) - 0.65).abs() < 1e-6);
		assert_eq!(diversity(9, true), 0.0);
	}
}
