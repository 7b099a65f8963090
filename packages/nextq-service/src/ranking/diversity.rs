use std::collections::HashMap;

use crate::{RankedQuestion, ranking::ScoredCandidate};
use nextq_domain::{
	scoring,
	vector::{self, CLUSTER_THRESHOLD},
};

/// Penalizes repeated categories and topic clusters in list order and recomputes each overall
/// score. The list order is not changed.
pub fn balance_diversity(scored: Vec<ScoredCandidate>) -> Vec<RankedQuestion> {
	let embeddings: Vec<Vec<f32>> = scored.iter().map(|item| item.embedding.clone()).collect();
	let clusters = vector::cluster(&embeddings, CLUSTER_THRESHOLD);
	let repeats_cluster = vector::shares_earlier_cluster(&clusters, scored.len());
	let mut seen = HashMap::new();

	scored
		.into_iter()
		.zip(repeats_cluster)
		.map(|(item, in_earlier_cluster)| {
			let mut question = item.question;
			let prior = seen.entry(question.category).or_insert(0_usize);

			question.scores.diversity = scoring::diversity(*prior, in_earlier_cluster);
			question.overall_score = scoring::overall_score(&question.scores);
			*prior += 1;

			question
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use nextq_domain::{Category, ScoreBreakdown, SourceType};

	fn scored(category: Category, embedding: Vec<f32>) -> ScoredCandidate {
		let scores = ScoreBreakdown {
			relevance: 0.6,
			novelty: 0.6,
			actionability: 0.6,
			impact: 0.6,
			diversity: 1.0,
		};

		ScoredCandidate {
			question: RankedQuestion {
				question: format!("{category:?}?"),
				category,
				reasoning: String::new(),
				overall_score: scoring::overall_score(&scores),
				scores,
				source_type: SourceType::Hybrid,
				source_ids: Vec::new(),
			},
			embedding,
		}
	}

	#[test]
	fn new_categories_outrank_repeated_ones() {
		let balanced = balance_diversity(vec![
			scored(Category::Trend, vec![1.0, 0.0, 0.0]),
			scored(Category::Trend, vec![0.0, 1.0, 0.0]),
			scored(Category::Gap, vec![0.0, 0.0, 1.0]),
		]);

		assert_eq!(balanced[0].scores.diversity, 1.0);
		assert!((balanced[1].scores.diversity - 0.85).abs() < 1e-6);
		assert_eq!(balanced[2].scores.diversity, 1.0);
		assert!(balanced[2].overall_score > balanced[1].overall_score);
	}

	#[test]
	fn cluster_and_category_penalties_stack() {
		let balanced = balance_diversity(vec![
			scored(Category::Trend, vec![1.0, 0.0]),
			scored(Category::Trend, vec![0.9, 0.1]),
			scored(Category::Deepening, vec![0.95, 0.05]),
		]);

		assert!((balanced[1].scores.diversity - 0.65).abs() < 1e-6);
		assert!((balanced[2].scores.diversity - 0.8).abs() < 1e-6);
		assert!((balanced[1].overall_score - (0.6 * 0.9 + 0.065)).abs() < 1e-6);
	}
}
