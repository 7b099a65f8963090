//! Questions from the concept graph around the user's past queries.

use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{BoxFuture, Context, Result, generators::{GeneratorOutput, QuestionGenerator}};
use nextq_domain::Category;
use nextq_storage::models::{ConceptHit, QueryRecord};

const FOOTPRINT_QUERY_WINDOW: i64 = 50;
const UNEXPLORED_LIMIT: i64 = 10;
const BRIDGE_LIMIT: i64 = 5;
const TRENDING_WINDOW_DAYS: i64 = 90;
const TRENDING_TOP_ACTIVE: i64 = 20;
const TRENDING_LIMIT: i64 = 8;
const CLUSTER_MIN_STRENGTH: i64 = 2;
const CLUSTER_MIN_SIZE: i64 = 3;
const CLUSTER_LIMIT: i64 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphInsightKind {
	UnexploredConnection,
	ResearchGap,
	TrendingPath,
	RelatedCluster,
}

#[derive(Clone, Debug)]
pub struct GraphInsight {
	pub kind: GraphInsightKind,
	/// The suggested concept first, then the user concepts it was reached through.
	pub concepts: Vec<String>,
	pub question: String,
	pub reasoning: String,
	pub score: f32,
	pub category: Category,
}

pub struct GraphGenerator;

impl QuestionGenerator for GraphGenerator {
	fn name(&self) -> &'static str {
		"graph"
	}

	fn generate<'a>(
		&'a self,
		ctx: &'a Context,
		user_id: Uuid,
	) -> BoxFuture<'a, Result<GeneratorOutput>> {
		Box::pin(async move { generate_from_graph(ctx, user_id).await.map(GeneratorOutput::Graph) })
	}
}

pub async fn generate_from_graph(ctx: &Context, user_id: Uuid) -> Result<Vec<GraphInsight>> {
	let history = ctx.stores.research.queries(user_id, false, FOOTPRINT_QUERY_WINDOW).await?;
	let concepts = concept_footprint(&history);

	if concepts.is_empty() {
		return Ok(Vec::new());
	}

	let graph = ctx.stores.graph.as_ref();
	let since = OffsetDateTime::now_utc() - Duration::days(TRENDING_WINDOW_DAYS);
	let bridges = async {
		if concepts.len() < 2 {
			return Ok(Vec::new());
		}

		graph.bridge_concepts(&concepts, BRIDGE_LIMIT).await
	};
	let (unexplored, bridges, trending, clusters) = tokio::join!(
		graph.unexplored_neighbors(&concepts, UNEXPLORED_LIMIT),
		bridges,
		graph.trending_concepts(&concepts, since, TRENDING_TOP_ACTIVE, TRENDING_LIMIT),
		graph.dense_clusters(&concepts, CLUSTER_MIN_STRENGTH, CLUSTER_MIN_SIZE, CLUSTER_LIMIT),
	);
	let mut insights = Vec::new();

	insights.extend(
		settle("unexplored", unexplored, user_id).into_iter().filter_map(unexplored_insight),
	);
	insights.extend(settle("bridges", bridges, user_id).into_iter().map(gap_insight));
	insights.extend(
		settle("trending", trending, user_id).into_iter().filter_map(trending_insight),
	);
	insights.extend(settle("clusters", clusters, user_id).into_iter().map(cluster_insight));

	Ok(insights)
}

/// Distinct concepts across the user's queries, newest query first.
pub fn concept_footprint(history: &[QueryRecord]) -> Vec<String> {
	let mut concepts: Vec<String> = Vec::new();

	for concept in history.iter().flat_map(|query| query.concepts.iter()) {
		let concept = concept.trim();

		if !concept.is_empty() && !concepts.iter().any(|seen| seen == concept) {
			concepts.push(concept.to_string());
		}
	}

	concepts
}

fn settle(
	traversal: &'static str,
	rows: Result<Vec<ConceptHit>>,
	user_id: Uuid,
) -> Vec<ConceptHit> {
	rows.unwrap_or_else(|err| {
		tracing::warn!(error = %err, user_id = %user_id, traversal, "Graph traversal failed.");

		Vec::new()
	})
}

fn ratio(value: i64, denominator: f32) -> f32 {
	(value as f32 / denominator).min(1.0)
}

fn with_via(concept: &str, via: &[String]) -> Vec<String> {
	let mut concepts = vec![concept.to_string()];

	concepts.extend(via.iter().cloned());

	concepts
}

fn unexplored_insight(hit: ConceptHit) -> Option<GraphInsight> {
	let via = hit.via_concepts.first()?;

	Some(GraphInsight {
		kind: GraphInsightKind::UnexploredConnection,
		question: format!("How does {} relate to {via}?", hit.concept),
		reasoning: format!(
			"You've researched {via}, but not {}. They're closely connected ({} links in the knowledge graph).",
			hit.concept, hit.connection_count
		),
		score: ratio(hit.connection_count, 10.0),
		category: Category::Bridging,
		concepts: with_via(&hit.concept, &hit.via_concepts),
	})
}

fn gap_insight(hit: ConceptHit) -> GraphInsight {
	GraphInsight {
		kind: GraphInsightKind::ResearchGap,
		question: format!("What role does {} play in your research area?", hit.concept),
		reasoning: format!(
			"{} connects {} of your research topics, but you haven't explored it directly. This may be a critical bridge concept.",
			hit.concept, hit.connection_count
		),
		score: ratio(hit.connection_count, 5.0),
		category: Category::Gap,
		concepts: with_via(&hit.concept, &hit.via_concepts),
	}
}

fn trending_insight(hit: ConceptHit) -> Option<GraphInsight> {
	let via = hit.via_concepts.first()?;

	Some(GraphInsight {
		kind: GraphInsightKind::TrendingPath,
		question: format!("What are the latest breakthroughs in {}?", hit.concept),
		reasoning: format!(
			"{} papers on {} published in last 3 months. Related to your work on {via}.",
			hit.connection_count, hit.concept
		),
		score: ratio(hit.connection_count, 20.0),
		category: Category::Trend,
		concepts: with_via(&hit.concept, &hit.via_concepts),
	})
}

fn cluster_insight(hit: ConceptHit) -> GraphInsight {
	GraphInsight {
		kind: GraphInsightKind::RelatedCluster,
		question: format!("How does {} fit into your research area?", hit.concept),
		reasoning: format!(
			"{} is part of a cluster with {} related concepts you haven't explored yet. It's well-connected to your current interests.",
			hit.concept, hit.cluster_size
		),
		score: ratio(hit.connection_count * hit.cluster_size, 20.0),
		category: Category::Exploration,
		concepts: vec![hit.concept],
	}
}
