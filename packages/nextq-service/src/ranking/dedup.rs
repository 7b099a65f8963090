use std::collections::HashSet;

use crate::{Candidate, Context, ranking::EmbeddedCandidate};
use nextq_domain::vector::{self, DEDUP_THRESHOLD};

/// Embeds every candidate in one batch and drops near-duplicates of earlier candidates.
pub async fn dedup_candidates(ctx: &Context, candidates: Vec<Candidate>) -> Vec<EmbeddedCandidate> {
	let texts: Vec<String> = candidates.iter().map(|c| c.question.clone()).collect();
	let embeddings = ctx.embed(&texts).await;

	dedup_embedded(candidates, embeddings)
}

/// Order-preserving. A candidate survives only when it is below the dedup threshold against
/// every candidate already kept.
pub fn dedup_embedded(
	candidates: Vec<Candidate>,
	embeddings: Vec<Vec<f32>>,
) -> Vec<EmbeddedCandidate> {
	let keep: HashSet<usize> =
		vector::dedup_indices(&embeddings, DEDUP_THRESHOLD).into_iter().collect();

	candidates
		.into_iter()
		.zip(embeddings)
		.enumerate()
		.filter(|(idx, _)| keep.contains(idx))
		.map(|(_, (candidate, embedding))| EmbeddedCandidate { candidate, embedding })
		.collect()
}
