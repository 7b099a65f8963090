use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Debug, Default, sqlx::FromRow)]
pub struct ResearcherProfile {
	pub user_id: Uuid,
	pub name: String,
	pub department: Option<String>,
	pub institution: Option<String>,
	pub primary_interests: Vec<String>,
	pub secondary_interests: Vec<String>,
	pub research_areas: Vec<String>,
	pub techniques: Vec<String>,
	pub computational_skills: Vec<String>,
	pub expertise_level: Option<String>,
	pub phd_focus: Option<String>,
	pub years_in_field: Option<i32>,
	pub highest_degree: Option<String>,
}
impl ResearcherProfile {
	/// Primary interests first, then secondary, without duplicates.
	pub fn all_interests(&self) -> Vec<String> {
		let mut out: Vec<String> = Vec::new();

		for interest in self.primary_interests.iter().chain(&self.secondary_interests) {
			if !out.contains(interest) {
				out.push(interest.clone());
			}
		}

		out
	}
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct QueryRecord {
	pub query_id: Uuid,
	pub user_id: Uuid,
	pub original_query: String,
	pub status: String,
	pub concepts: Vec<String>,
	pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct ImportantPaper {
	pub response_id: Uuid,
	pub summary: String,
	pub doi: Option<String>,
	pub concepts: Vec<String>,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct ProjectRecord {
	pub project_id: Uuid,
	pub title: String,
	pub description: Option<String>,
	pub status: String,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct GoalRecord {
	pub goal_id: Uuid,
	pub goal_type: String,
	pub title: String,
	pub status: String,
	pub target_date: Option<OffsetDateTime>,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct TeamActivity {
	pub user_name: String,
	pub original_query: String,
	pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct KnowledgeGap {
	pub gap_id: Uuid,
	pub missing_concept: String,
	pub potential_impact: f32,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct TrendingQuery {
	pub query_id: Uuid,
	pub original_query: String,
	pub user_name: String,
}

/// One concept returned by a graph traversal.
#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct ConceptHit {
	pub concept: String,
	pub category: Option<String>,
	/// The user's own concepts through which this one was reached.
	pub via_concepts: Vec<String>,
	pub connection_count: i64,
	pub cluster_size: i64,
}

#[derive(Clone, Debug)]
pub struct NewSuggestion {
	pub suggestion_id: Uuid,
	pub user_id: Uuid,
	pub question: String,
	pub reasoning: String,
	pub category: String,
	pub relevance_score: f32,
	pub novelty_score: f32,
	pub actionability_score: f32,
	pub impact_score: f32,
	pub diversity_score: f32,
	pub overall_score: f32,
	pub source_type: String,
	pub source_ids: Vec<String>,
	pub generated_by: String,
	pub generated_at: OffsetDateTime,
	pub expires_at: OffsetDateTime,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct SuggestionRecord {
	pub suggestion_id: Uuid,
	pub user_id: Uuid,
	pub question: String,
	pub reasoning: String,
	pub category: String,
	pub relevance_score: f32,
	pub novelty_score: f32,
	pub actionability_score: f32,
	pub impact_score: f32,
	pub diversity_score: f32,
	pub overall_score: f32,
	pub source_type: String,
	pub source_ids: Vec<String>,
	pub generated_by: String,
	pub generated_at: OffsetDateTime,
	pub expires_at: OffsetDateTime,
	pub displayed: bool,
	pub displayed_at: Option<OffsetDateTime>,
	pub clicked: bool,
	pub clicked_at: Option<OffsetDateTime>,
	pub dismissed: bool,
	pub dismissed_at: Option<OffsetDateTime>,
	pub executed: bool,
	pub executed_query_id: Option<Uuid>,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct CacheEntry {
	pub cache_key: String,
	pub payload: Value,
	pub created_at: OffsetDateTime,
	pub expires_at: OffsetDateTime,
}
