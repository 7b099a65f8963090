//! Questions that similar researchers found valuable, plus platform-wide trending questions.

use std::collections::HashSet;

use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{
	BoxFuture, Context, Result,
	generators::{GeneratorOutput, QuestionGenerator},
};
use nextq_domain::{
	Category,
	text::{self, overlap_ratio},
	vector,
};
use nextq_storage::models::{ResearcherProfile, TrendingQuery};

pub const PEER_SIMILARITY_THRESHOLD: f32 = 0.3;
/// Interests, research areas, query texts, techniques, and expertise level, in that order.
pub const PEER_WEIGHTS: [f32; 5] = [0.25, 0.25, 0.30, 0.10, 0.10];

const HISTORY_WINDOW: i64 = 20;
const QUERY_SAMPLE: usize = 5;
const MAX_PEERS: usize = 5;
const PEER_LOOKBACK_DAYS: i64 = 30;
const PEER_QUERY_WINDOW: i64 = 10;
const RECENT_DUPLICATE_WINDOW: usize = 10;
const NEAR_DUPLICATE_THRESHOLD: f32 = 0.8;
const PEER_SCORE_FACTOR: f32 = 0.8;
const MAX_QUESTIONS: usize = 5;

const TRENDING_LOOKBACK_DAYS: i64 = 7;
const TRENDING_SCAN_LIMIT: i64 = 50;
const TRENDING_KEY_CHARS: usize = 50;
const TRENDING_MIN_GROUP: usize = 2;
const TRENDING_SATURATION: f32 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollaborativeSource {
	Peer,
	Trending,
}

#[derive(Clone, Debug)]
pub struct CollaborativeQuestion {
	pub question: String,
	pub reasoning: String,
	pub score: f32,
	pub category: Category,
	pub source: CollaborativeSource,
	pub source_query_ids: Vec<Uuid>,
	pub similar_researchers: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SimilarResearcher {
	pub user_id: Uuid,
	pub name: String,
	pub similarity: f32,
	/// The user's own interests that the peer shares, in the user's order.
	pub shared_interests: Vec<String>,
}

pub struct CollaborativeGenerator;

impl QuestionGenerator for CollaborativeGenerator {
	fn name(&self) -> &'static str {
		"collaborative"
	}

	fn generate<'a>(
		&'a self,
		ctx: &'a Context,
		user_id: Uuid,
	) -> BoxFuture<'a, Result<GeneratorOutput>> {
		Box::pin(async move {
			generate_from_collaboration(ctx, user_id).await.map(GeneratorOutput::Collaborative)
		})
	}
}

pub async fn generate_from_collaboration(
	ctx: &Context,
	user_id: Uuid,
) -> Result<Vec<CollaborativeQuestion>> {
	let peers = find_similar_researchers(ctx, user_id).await?;

	if peers.is_empty() {
		return Ok(Vec::new());
	}

	questions_from_peers(ctx, user_id, &peers).await
}

/// Researchers in the same department or institution ranked by weighted similarity. Only
/// peers above [`PEER_SIMILARITY_THRESHOLD`] are kept.
pub async fn find_similar_researchers(
	ctx: &Context,
	user_id: Uuid,
) -> Result<Vec<SimilarResearcher>> {
	let research = ctx.stores.research.as_ref();
	let history = research.queries(user_id, true, HISTORY_WINDOW).await?;

	if history.is_empty() {
		return Ok(Vec::new());
	}

	let profile = research.profile(user_id).await?.unwrap_or_default();
	let candidates = research
		.peers(user_id, profile.department.as_deref(), profile.institution.as_deref())
		.await?;
	let user_texts: Vec<String> =
		history.iter().take(QUERY_SAMPLE).map(|query| query.original_query.clone()).collect();
	let user_vectors = ctx.embed(&user_texts).await;
	let mut similar = Vec::new();

	for peer in candidates {
		let peer_history = research.queries(peer.user_id, true, QUERY_SAMPLE as i64).await?;

		if peer_history.is_empty() {
			continue;
		}

		let peer_texts: Vec<String> =
			peer_history.into_iter().map(|query| query.original_query).collect();
		let peer_vectors = ctx.embed(&peer_texts).await;
		let query_similarity = average_best_match(&user_vectors, &peer_vectors);
		let (similarity, shared_interests) = peer_similarity(&profile, &peer, query_similarity);

		if similarity > PEER_SIMILARITY_THRESHOLD {
			similar.push(SimilarResearcher {
				user_id: peer.user_id,
				name: peer.name,
				similarity,
				shared_interests,
			});
		}
	}

	similar.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
	similar.truncate(MAX_PEERS);

	Ok(similar)
}

/// Weighted similarity between two researchers given their query-text similarity, and the
/// user's interests the peer shares.
pub fn peer_similarity(
	user: &ResearcherProfile,
	peer: &ResearcherProfile,
	query_similarity: f32,
) -> (f32, Vec<String>) {
	let user_interests = user.all_interests();
	let user_interest_set: HashSet<String> = user_interests.iter().cloned().collect();
	let peer_interest_set: HashSet<String> = peer.all_interests().into_iter().collect();
	let shared: Vec<String> = user_interests
		.into_iter()
		.filter(|interest| peer_interest_set.contains(interest))
		.collect();
	let interests = overlap_ratio(&user_interest_set, &peer_interest_set);
	let areas = overlap_ratio(&to_set(&user.research_areas), &to_set(&peer.research_areas));
	let techniques = overlap_ratio(&to_set(&user.techniques), &to_set(&peer.techniques));
	let expertise = match (&user.expertise_level, &peer.expertise_level) {
		(Some(mine), Some(theirs)) if mine == theirs => 1.0,
		_ => 0.0,
	};
	let [w_interests, w_areas, w_queries, w_techniques, w_expertise] = PEER_WEIGHTS;
	let similarity = interests * w_interests
		+ areas * w_areas
		+ query_similarity * w_queries
		+ techniques * w_techniques
		+ expertise * w_expertise;

	(similarity, shared)
}

/// Mean over the user's vectors of the best non-negative match among the peer's vectors.
pub fn average_best_match(user_vectors: &[Vec<f32>], peer_vectors: &[Vec<f32>]) -> f32 {
	if user_vectors.is_empty() || peer_vectors.is_empty() {
		return 0.0;
	}

	let total: f32 =
		user_vectors.iter().map(|vector| vector::max_similarity(vector, peer_vectors)).sum();

	total / user_vectors.len() as f32
}

async fn questions_from_peers(
	ctx: &Context,
	user_id: Uuid,
	peers: &[SimilarResearcher],
) -> Result<Vec<CollaborativeQuestion>> {
	let research = ctx.stores.research.as_ref();
	let asked: Vec<String> =
		research.query_texts(user_id).await?.iter().map(|query| query.to_lowercase()).collect();
	let recent: Vec<String> = asked.iter().take(RECENT_DUPLICATE_WINDOW).cloned().collect();
	let recent_vectors = ctx.embed(&recent).await;
	let since = OffsetDateTime::now_utc() - Duration::days(PEER_LOOKBACK_DAYS);
	let mut pending: Vec<(&SimilarResearcher, Uuid, String)> = Vec::new();

	for peer in peers {
		let rated =
			research.positively_rated_queries(peer.user_id, since, PEER_QUERY_WINDOW).await?;

		for query in rated {
			if asked.contains(&query.original_query.to_lowercase()) {
				continue;
			}

			pending.push((peer, query.query_id, query.original_query));
		}
	}

	let texts: Vec<String> = pending.iter().map(|(_, _, text)| text.clone()).collect();
	let vectors = ctx.embed(&texts).await;
	let mut questions: Vec<CollaborativeQuestion> = pending
		.into_iter()
		.zip(vectors)
		.filter(|(_, vector)| {
			vector::max_similarity(vector, &recent_vectors) < NEAR_DUPLICATE_THRESHOLD
		})
		.map(|((peer, query_id, question), _)| peer_question(peer, query_id, question))
		.collect();

	questions.sort_by(|a, b| b.score.total_cmp(&a.score));
	questions.truncate(MAX_QUESTIONS);

	Ok(questions)
}

fn peer_question(
	peer: &SimilarResearcher,
	query_id: Uuid,
	question: String,
) -> CollaborativeQuestion {
	let shared = if peer.shared_interests.is_empty() {
		String::new()
	} else {
		let first_two: Vec<&str> =
			peer.shared_interests.iter().take(2).map(String::as_str).collect();

		format!(". You share interest in: {}", first_two.join(", "))
	};

	CollaborativeQuestion {
		reasoning: format!(
			"{} ({}% similar to you) found this question valuable{shared}.",
			peer.name,
			(peer.similarity * 100.0).round() as i64
		),
		score: peer.similarity * PEER_SCORE_FACTOR,
		category: text::infer_category(&question),
		source: CollaborativeSource::Peer,
		source_query_ids: vec![query_id],
		similar_researchers: vec![peer.name.clone()],
		question,
	}
}

/// Positively rated questions asked by several researchers over the last week.
pub async fn trending_questions(
	ctx: &Context,
	department: Option<&str>,
) -> Result<Vec<CollaborativeQuestion>> {
	let since = OffsetDateTime::now_utc() - Duration::days(TRENDING_LOOKBACK_DAYS);
	let rows = ctx.stores.research.trending_queries(department, since, TRENDING_SCAN_LIMIT).await?;

	Ok(group_trending(&rows, department))
}

/// Groups rows by the first characters of their lower-cased text. The first row of a group
/// supplies the question.
pub fn group_trending(
	rows: &[TrendingQuery],
	department: Option<&str>,
) -> Vec<CollaborativeQuestion> {
	let mut groups: Vec<(String, Vec<&TrendingQuery>)> = Vec::new();

	for row in rows {
		let lowered = row.original_query.to_lowercase();
		let key = text::truncate_chars(&lowered, TRENDING_KEY_CHARS);

		match groups.iter_mut().find(|(existing, _)| existing.as_str() == key) {
			Some((_, members)) => members.push(row),
			None => groups.push((key.to_string(), vec![row])),
		}
	}

	groups.retain(|(_, members)| members.len() >= TRENDING_MIN_GROUP);
	groups.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
	groups.truncate(MAX_QUESTIONS);

	let scope = department.unwrap_or("the platform");

	groups
		.into_iter()
		.map(|(_, members)| {
			let count = members.len();
			let example = &members[0].original_query;

			CollaborativeQuestion {
				question: example.clone(),
				reasoning: format!(
					"{count} researchers asked about this in the last 7 days. Trending topic in {scope}."
				),
				score: (count as f32 / TRENDING_SATURATION).min(1.0),
				category: text::infer_category(example),
				source: CollaborativeSource::Trending,
				source_query_ids: members.iter().map(|member| member.query_id).collect(),
				similar_researchers: members.iter().map(|m| m.user_name.clone()).collect(),
			}
		})
		.collect()
}

fn to_set(items: &[String]) -> HashSet<String> {
	items.iter().cloned().collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn profile(interests: &[&str], areas: &[&str], level: Option<&str>) -> ResearcherProfile {
		ResearcherProfile {
			name: "Peer".to_string(),
			primary_interests: interests.iter().map(|s| s.to_string()).collect(),
			research_areas: areas.iter().map(|s| s.to_string()).collect(),
			expertise_level: level.map(str::to_string),
			..Default::default()
		}
	}

	fn trending(text: &str, name: &str) -> TrendingQuery {
		TrendingQuery {
			query_id: Uuid::new_v4(),
			original_query: text.to_string(),
			user_name: name.to_string(),
		}
	}

	#[test]
	fn identical_profiles_reach_full_weight_without_techniques() {
		let user = profile(&["glioma"], &["neuro-oncology"], Some("POSTDOC"));
		let (similarity, shared) = peer_similarity(&user, &user.clone(), 1.0);

		assert!((similarity - 0.9).abs() < 1e-6);
		assert_eq!(shared, vec!["glioma".to_string()]);
	}

	#[test]
	fn expertise_bonus_needs_both_levels() {
		let user = profile(&[], &[], None);
		let peer = profile(&[], &[], None);
		let (similarity, _) = peer_similarity(&user, &peer, 0.0);

		assert_eq!(similarity, 0.0);

		let user = profile(&[], &[], Some("FACULTY"));
		let peer = profile(&[], &[], Some("FACULTY"));
		let (similarity, _) = peer_similarity(&user, &peer, 0.0);

		assert!((similarity - 0.1).abs() < 1e-6);
	}

	#[test]
	fn average_best_match_floors_negative_similarity() {
		let user = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
		let peer = vec![vec![-1.0, 0.0]];

		assert_eq!(average_best_match(&user, &peer), 0.0);
		assert_eq!(average_best_match(&user, &[]), 0.0);
		assert!((average_best_match(&user, &[vec![1.0, 0.0]]) - 0.5).abs() < 1e-6);
	}

	#[test]
	fn trending_groups_need_two_members() {
		let rows = vec![
			trending("What are the latest KRAS inhibitors?", "Ana"),
			trending("what are the latest KRAS inhibitors?", "Ben"),
			trending("Single mention", "Cy"),
			trending("What are the latest KRAS inhibitors?", "Di"),
		];
		let questions = group_trending(&rows, Some("Oncology"));

		assert_eq!(questions.len(), 1);
		assert_eq!(questions[0].question, "What are the latest KRAS inhibitors?");
		assert!((questions[0].score - 0.6).abs() < 1e-6);
		assert_eq!(questions[0].category, Category::Trend);
		assert_eq!(questions[0].source_query_ids.len(), 3);
		assert!(questions[0].reasoning.ends_with("Trending topic in Oncology."));
	}
}
