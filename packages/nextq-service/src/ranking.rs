//! Dedup, scoring, diversity balancing, and ordering of formatted candidates.

mod dedup;
mod diversity;
mod score;

pub use dedup::{dedup_candidates, dedup_embedded};
pub use diversity::balance_diversity;
pub use score::{UserSignals, load_signals, score_candidate};

use std::cmp::Ordering;

use uuid::Uuid;

use crate::{Candidate, Context, RankedQuestion};

/// A candidate paired with the embedding of its question text.
#[derive(Clone, Debug)]
pub struct EmbeddedCandidate {
	pub candidate: Candidate,
	pub embedding: Vec<f32>,
}

#[derive(Clone, Debug)]
pub struct ScoredCandidate {
	pub question: RankedQuestion,
	pub embedding: Vec<f32>,
}

/// Dedup, score, and balance `candidates`, then keep the best `retain` by overall score.
pub async fn rank_candidates(
	ctx: &Context,
	user_id: Uuid,
	candidates: Vec<Candidate>,
	retain: usize,
) -> Vec<RankedQuestion> {
	if candidates.is_empty() {
		return Vec::new();
	}

	let unique = dedup_candidates(ctx, candidates).await;
	let signals = load_signals(ctx, user_id).await;
	let scored: Vec<ScoredCandidate> =
		unique.into_iter().map(|item| score_candidate(item, &signals)).collect();

	tracing::debug!(user_id = %user_id, candidate_count = scored.len(), "Candidates scored.");

	sort_and_truncate(balance_diversity(scored), retain)
}

/// Stable descending sort by overall score. Ties keep their incoming order.
pub fn sort_and_truncate(mut questions: Vec<RankedQuestion>, retain: usize) -> Vec<RankedQuestion> {
	questions.sort_by(|a, b| cmp_f32_desc(a.overall_score, b.overall_score));
	questions.truncate(retain);

	questions
}

pub fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}
