use uuid::Uuid;

use crate::{
	Context, RankedQuestion,
	ranking::{EmbeddedCandidate, ScoredCandidate},
};
use nextq_domain::{ScoreBreakdown, scoring, vector};

const NOVELTY_WINDOW: i64 = 10;

/// Embedded interests and recent completed queries of the user being scored for.
#[derive(Clone, Debug, Default)]
pub struct UserSignals {
	pub interests: Vec<Vec<f32>>,
	pub history: Vec<Vec<f32>>,
}

/// Loads the user's interests and recent history. A store failure leaves that side empty, which
/// scores as neutral relevance or full novelty.
pub async fn load_signals(ctx: &Context, user_id: Uuid) -> UserSignals {
	let research = ctx.stores.research.as_ref();
	let interests = match research.profile(user_id).await {
		Ok(profile) => profile.map(|profile| profile.all_interests()).unwrap_or_default(),
		Err(err) => {
			tracing::warn!(
				error = %err,
				user_id = %user_id,
				"Failed to load interests for scoring."
			);

			Vec::new()
		},
	};
	let history: Vec<String> = match research.queries(user_id, true, NOVELTY_WINDOW).await {
		Ok(queries) => queries.into_iter().map(|query| query.original_query).collect(),
		Err(err) => {
			tracing::warn!(error = %err, user_id = %user_id, "Failed to load history for scoring.");

			Vec::new()
		},
	};

	UserSignals { interests: ctx.embed(&interests).await, history: ctx.embed(&history).await }
}

/// Scores one candidate with diversity left at 1.0 for the balancer to settle.
pub fn score_candidate(item: EmbeddedCandidate, signals: &UserSignals) -> ScoredCandidate {
	let EmbeddedCandidate { candidate, embedding } = item;
	let scores = ScoreBreakdown {
		relevance: scoring::relevance(&vector::similarities(&embedding, &signals.interests)),
		novelty: scoring::novelty(&vector::similarities(&embedding, &signals.history)),
		actionability: scoring::actionability(&candidate.question),
		impact: candidate.base_score,
		diversity: 1.0,
	};

	ScoredCandidate {
		question: RankedQuestion {
			question: candidate.question,
			category: candidate.category,
			reasoning: candidate.reasoning,
			overall_score: scoring::overall_score(&scores),
			scores,
			source_type: candidate.source_type,
			source_ids: candidate.source_ids,
		},
		embedding,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::Candidate;
	use nextq_domain::{Category, SourceType};

	fn embedded(question: &str, embedding: Vec<f32>) -> EmbeddedCandidate {
		EmbeddedCandidate {
			candidate: Candidate {
				question: question.to_string(),
				category: Category::Trend,
				reasoning: String::new(),
				base_score: 0.8,
				source_type: SourceType::LlmGenerated,
				source_ids: Vec::new(),
			},
			embedding,
		}
	}

	#[test]
	fn new_users_get_neutral_relevance_and_full_novelty() {
		let scored = score_candidate(
			embedded("What are the latest developments in CAR-T therapy?", vec![1.0, 0.0]),
			&UserSignals::default(),
		);
		let scores = scored.question.scores;

		assert_eq!(scores.relevance, 0.5);
		assert_eq!(scores.novelty, 1.0);
		assert_eq!(scores.impact, 0.8);
		assert_eq!(scores.diversity, 1.0);
		assert!((scored.question.overall_score - scoring::overall_score(&scores)).abs() < 1e-6);
	}

	#[test]
	fn history_lowers_novelty_and_interests_raise_relevance() {
		let signals = UserSignals {
			interests: vec![vec![0.0, 1.0], vec![1.0, 0.0]],
			history: vec![vec![0.6, 0.8]],
		};
		let scored = score_candidate(embedded("Repeat?", vec![1.0, 0.0]), &signals);

		assert!((scored.question.scores.relevance - 1.0).abs() < 1e-6);
		assert!((scored.question.scores.novelty - 0.4).abs() < 1e-6);
	}
}
