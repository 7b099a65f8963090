pub const DEDUP_THRESHOLD: f32 = 0.85;
pub const CLUSTER_THRESHOLD: f32 = 0.75;

/// Cosine similarity. A zero-norm vector is dissimilar to everything, itself included.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
	let mut dot = 0.0_f32;
	let mut norm_a = 0.0_f32;
	let mut norm_b = 0.0_f32;

	for (x, y) in a.iter().zip(b) {
		dot += x * y;
		norm_a += x * x;
		norm_b += y * y;
	}

	if norm_a == 0.0 || norm_b == 0.0 {
		return 0.0;
	}

	dot / (norm_a.sqrt() * norm_b.sqrt())
}

pub fn similarities(target: &[f32], others: &[Vec<f32>]) -> Vec<f32> {
	others.iter().map(|other| cosine(target, other)).collect()
}

/// Largest similarity against `others`, floored at zero.
pub fn max_similarity(target: &[f32], others: &[Vec<f32>]) -> f32 {
	others.iter().map(|other| cosine(target, other)).fold(0.0_f32, f32::max)
}

/// Greedy order-preserving near-duplicate removal. Returns the indices to keep.
pub fn dedup_indices(embeddings: &[Vec<f32>], threshold: f32) -> Vec<usize> {
	let mut kept: Vec<usize> = Vec::new();

	for (idx, embedding) in embeddings.iter().enumerate() {
		let duplicate = kept.iter().any(|&k| cosine(&embeddings[k], embedding) >= threshold);

		if !duplicate {
			kept.push(idx);
		}
	}

	kept
}

/// Seed-based greedy clustering. Each unassigned item seeds a cluster and absorbs every later
/// unassigned item within `threshold` of the seed.
pub fn cluster(embeddings: &[Vec<f32>], threshold: f32) -> Vec<Vec<usize>> {
	let mut assigned = vec![false; embeddings.len()];
	let mut clusters = Vec::new();

	for seed in 0..embeddings.len() {
		if assigned[seed] {
			continue;
		}

		let mut members = vec![seed];

		assigned[seed] = true;

		for candidate in (seed + 1)..embeddings.len() {
			if assigned[candidate] {
				continue;
			}
			if cosine(&embeddings[seed], &embeddings[candidate]) >= threshold {
				members.push(candidate);
				assigned[candidate] = true;
			}
		}

		clusters.push(members);
	}

	clusters
}

/// For each index, whether its cluster holds an earlier index.
pub fn shares_earlier_cluster(clusters: &[Vec<usize>], len: usize) -> Vec<bool> {
	let mut flags = vec![false; len];

	for members in clusters {
		let Some(&first) = members.iter().min() else {
			continue;
		};

		for &idx in members {
			if idx != first && idx < len {
				flags[idx] = true;
			}
		}
	}

	flags
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cosine_handles_zero_vectors() {
		assert_eq!(cosine(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
		assert_eq!(cosine(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
		assert!((cosine(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
		assert!(cosine(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
	}

	#[test]
	fn dedup_keeps_first_of_each_group() {
		let embeddings = vec![
			vec![1.0, 0.0],
			vec![0.99, 0.05],
			vec![0.0, 1.0],
			vec![0.98, 0.1],
			vec![0.0, 0.0],
			vec![0.0, 0.0],
		];
		let kept = dedup_indices(&embeddings, DEDUP_THRESHOLD);

		assert_eq!(kept, vec![0, 2, 4, 5]);

		for (pos, &a) in kept.iter().enumerate() {
			for &b in &kept[pos + 1..] {
				assert!(cosine(&embeddings[a], &embeddings[b]) < DEDUP_THRESHOLD);
			}
		}
	}

	#[test]
	fn clusters_are_seeded_greedily() {
		let embeddings = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.9, 0.1], vec![0.1, 0.9]];
		let clusters = cluster(&embeddings, CLUSTER_THRESHOLD);

		assert_eq!(clusters, vec![vec![0, 2], vec![1, 3]]);
		assert_eq!(shares_earlier_cluster(&clusters, 4), vec![false, false, true, true]);
	}
}
