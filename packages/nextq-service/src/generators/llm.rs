//! Model-written questions from a full picture of the user's research context.

use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{
	BoxFuture, Context, Error, Result,
	generators::{GeneratorOutput, QuestionGenerator},
	llm_parse,
};
use nextq_domain::text;
use nextq_storage::models::{
	GoalRecord, ImportantPaper, KnowledgeGap, ProjectRecord, QueryRecord, ResearcherProfile,
	TeamActivity,
};

const RECENT_QUERY_WINDOW: i64 = 10;
const SECTION_LIMIT: i64 = 5;
const TEAM_ACTIVITY_DAYS: i64 = 7;
const TEAM_ACTIVITY_LIMIT: i64 = 10;
const URGENT_GOAL_DAYS: i64 = 30;
const DEFAULT_DEPARTMENT: &str = "General";
const DEFAULT_EXPERTISE: &str = "STUDENT";

const MAX_TOKENS: u32 = 3_000;
const TEMPERATURE: f32 = 0.8;
const NEW_USER_MAX_TOKENS: u32 = 2_000;
const NEW_USER_TEMPERATURE: f32 = 0.7;

#[derive(Clone, Debug, PartialEq)]
pub struct LlmQuestion {
	pub question: String,
	/// The category label exactly as the model wrote it.
	pub kind: String,
	pub reasoning: String,
	pub priority: String,
	pub score: f32,
}

/// Everything the prompt is built from.
#[derive(Clone, Debug)]
pub struct ResearchContext {
	pub profile: ResearcherProfile,
	pub recent_queries: Vec<QueryRecord>,
	pub important_papers: Vec<ImportantPaper>,
	pub projects: Vec<ProjectRecord>,
	pub goals: Vec<GoalRecord>,
	pub team_activity: Vec<TeamActivity>,
	pub gaps: Vec<KnowledgeGap>,
	pub now: OffsetDateTime,
}
impl ResearchContext {
	fn department(&self) -> &str {
		self.profile.department.as_deref().filter(|d| !d.is_empty()).unwrap_or(DEFAULT_DEPARTMENT)
	}

	fn expertise(&self) -> &str {
		self.profile.expertise_level.as_deref().unwrap_or(DEFAULT_EXPERTISE)
	}

	fn interests(&self) -> String {
		if self.profile.primary_interests.is_empty() {
			"Not specified yet".to_string()
		} else {
			self.profile.primary_interests.join(", ")
		}
	}

	fn days_until(&self, goal: &GoalRecord) -> Option<i64> {
		let target = goal.target_date?;

		Some(((target - self.now).as_seconds_f64() / 86_400.0).ceil() as i64)
	}

	fn has_urgent_goal(&self) -> bool {
		self.goals.iter().filter_map(|goal| self.days_until(goal)).any(|days| {
			(0..=URGENT_GOAL_DAYS).contains(&days)
		})
	}
}

pub struct LlmGenerator;

impl QuestionGenerator for LlmGenerator {
	fn name(&self) -> &'static str {
		"llm"
	}

	fn generate<'a>(
		&'a self,
		ctx: &'a Context,
		user_id: Uuid,
	) -> BoxFuture<'a, Result<GeneratorOutput>> {
		Box::pin(async move { generate_from_context(ctx, user_id).await.map(GeneratorOutput::Llm) })
	}
}

pub async fn generate_from_context(ctx: &Context, user_id: Uuid) -> Result<Vec<LlmQuestion>> {
	let context = gather_context(ctx, user_id).await?;
	let cfg = &ctx.cfg.providers.llm;

	if context.recent_queries.is_empty() {
		let prompt = build_new_user_prompt(&context);

		return match ctx
			.providers
			.llm
			.complete(cfg, &prompt, NEW_USER_MAX_TOKENS, NEW_USER_TEMPERATURE)
			.await
		{
			Ok(content) => Ok(parse_or_empty(&content, user_id)),
			Err(err) => {
				tracing::warn!(
					error = %err,
					user_id = %user_id,
					"Starter question prompt failed. Using fallback questions."
				);

				Ok(fallback_new_user_questions(context.department()))
			},
		};
	}

	let prompt = build_prompt(&context);
	let content = ctx.providers.llm.complete(cfg, &prompt, MAX_TOKENS, TEMPERATURE).await?;

	Ok(parse_or_empty(&content, user_id))
}

pub async fn gather_context(ctx: &Context, user_id: Uuid) -> Result<ResearchContext> {
	let research = ctx.stores.research.as_ref();
	let Some(profile) = research.profile(user_id).await? else {
		return Err(Error::NotFound { message: format!("Researcher {user_id} not found.") });
	};
	let now = OffsetDateTime::now_utc();
	let recent_queries = research.queries(user_id, false, RECENT_QUERY_WINDOW).await?;
	let important_papers =
		research.important_papers(user_id, RECENT_QUERY_WINDOW, SECTION_LIMIT).await?;
	let projects = research.active_projects(user_id, SECTION_LIMIT).await?;
	let goals = research.open_goals(user_id, SECTION_LIMIT).await?;
	let team_since = now - Duration::days(TEAM_ACTIVITY_DAYS);
	let team_activity = match profile.department.as_deref().filter(|d| !d.is_empty()) {
		Some(department) => research
			.team_activity(department, team_since, TEAM_ACTIVITY_LIMIT)
			.await
			.unwrap_or_else(|err| {
				tracing::warn!(error = %err, user_id = %user_id, "Team activity lookup failed.");

				Vec::new()
			}),
		None => Vec::new(),
	};
	let gaps = research.knowledge_gaps(user_id, SECTION_LIMIT).await.unwrap_or_else(|err| {
		tracing::warn!(error = %err, user_id = %user_id, "Knowledge gap lookup failed.");

		Vec::new()
	});

	Ok(ResearchContext {
		profile,
		recent_queries,
		important_papers,
		projects,
		goals,
		team_activity,
		gaps,
		now,
	})
}

fn parse_or_empty(content: &str, user_id: Uuid) -> Vec<LlmQuestion> {
	llm_parse::parse_questions(content).unwrap_or_else(|err| {
		tracing::warn!(error = %err, user_id = %user_id, "Model output could not be parsed.");

		Vec::new()
	})
}

fn bullet_list<T>(items: &[T], empty: &str, render: impl Fn(&T) -> String) -> String {
	if items.is_empty() {
		return empty.to_string();
	}

	items.iter().map(|item| format!("- {}", render(item))).collect::<Vec<_>>().join("\n")
}

fn profile_section(context: &ResearchContext) -> String {
	let profile = &context.profile;
	let mut lines = vec![
		format!("- Name: {}", profile.name),
		format!("- Department: {}", context.department()),
		format!(
			"- Highest Degree: {}",
			profile.highest_degree.as_deref().unwrap_or("Not specified")
		),
		format!("- Expertise Level: {}", context.expertise()),
	];

	if let Some(years) = profile.years_in_field.filter(|years| *years > 0) {
		lines.push(format!("- Years in Field: {years}"));
	}
	if let Some(focus) = profile.phd_focus.as_deref().filter(|focus| !focus.is_empty()) {
		lines.push(format!("- PhD Research Focus: {focus}"));
	}

	lines.push(format!("- Primary Research Interests: {}", context.interests()));

	if !profile.techniques.is_empty() {
		lines.push(format!("- Laboratory Techniques: {}", profile.techniques.join(", ")));
	}
	if !profile.computational_skills.is_empty() {
		lines.push(format!("- Computational Skills: {}", profile.computational_skills.join(", ")));
	}

	lines.join("\n")
}

fn goal_line(context: &ResearchContext, goal: &GoalRecord) -> String {
	let due = match context.days_until(goal) {
		Some(days) if days > 0 => format!(" (in {days} days)"),
		Some(0) => " (TODAY!)".to_string(),
		Some(days) => format!(" ({} days overdue)", days.abs()),
		None => String::new(),
	};

	format!("[{}] {}{due}", goal.goal_type, goal.title)
}

/// The full ten-question prompt for users with history.
pub fn build_prompt(context: &ResearchContext) -> String {
	let profile = &context.profile;
	let phd_focus = profile.phd_focus.as_deref().filter(|focus| !focus.is_empty());
	let recent = bullet_list(&context.recent_queries, "No recent queries", |query| {
		format!("\"{}\" ({})", query.original_query, query.created_at.date())
	});
	let papers = bullet_list(&context.important_papers, "None yet", |paper| {
		let title = text::truncate_chars(&paper.summary, 100);

		if paper.concepts.is_empty() {
			title.to_string()
		} else {
			format!("{title} [Concepts: {}]", paper.concepts.join(", "))
		}
	});
	let projects = bullet_list(&context.projects, "No active projects specified", |project| {
		let description = project
			.description
			.as_deref()
			.filter(|d| !d.is_empty())
			.map(|d| format!(": {}", text::truncate_chars(d, 100)))
			.unwrap_or_default();

		format!("{}{description} [Status: {}]", project.title, project.status)
	});
	let goals = bullet_list(&context.goals, "No upcoming goals", |goal| goal_line(context, goal));
	let team = bullet_list(&context.team_activity, "No team activity data", |activity| {
		format!("{}: {}", activity.user_name, text::truncate_chars(&activity.original_query, 60))
	});
	let gaps = if context.gaps.is_empty() {
		"No gaps identified".to_string()
	} else {
		context.gaps.iter().map(|gap| gap.missing_concept.as_str()).collect::<Vec<_>>().join(", ")
	};
	let techniques_hint = if profile.techniques.is_empty() {
		String::new()
	} else {
		format!(" (relevant to their techniques: {})", profile.techniques.join(", "))
	};
	let years_hint = profile
		.years_in_field
		.filter(|years| *years > 0)
		.map(|years| format!(" with {years} years experience"))
		.unwrap_or_default();
	let lab_hint = first_three(&profile.techniques);
	let compute_hint = first_three(&profile.computational_skills);
	let mut instructions = vec![
		format!(
			"1. Highly relevant to their current research trajectory{}",
			phd_focus.map(|focus| format!(" and PhD focus ({focus})")).unwrap_or_default()
		),
		"2. Actionable (can be researched using available tools)".to_string(),
		"3. Progressive (build on existing knowledge and expertise)".to_string(),
		"4. Diverse (cover different aspects and question types)".to_string(),
		format!(
			"5. Timely (consider current trends{})",
			if context.goals.is_empty() { "" } else { " and upcoming deadlines" }
		),
		format!(
			"6. Valuable (high potential to advance their research{})",
			if context.projects.is_empty() { "" } else { " projects" }
		),
	];

	if context.has_urgent_goal() {
		instructions.push(
			"7. URGENT: Prioritize questions that help with upcoming goals/deadlines (within 30 days)"
				.to_string(),
		);
	}

	format!(
		"You are an AI research advisor for a researcher at ACM Research Platform.

USER PROFILE:
{profile_section}

RECENT RESEARCH ACTIVITY (Last 10 queries):
{recent}

PAPERS MARKED AS IMPORTANT:
{papers}

CURRENT RESEARCH PROJECTS:
{projects}

UPCOMING GOALS & DEADLINES:
{goals}

TEAM RESEARCH ACTIVITY (Same department):
{team}

KNOWLEDGE GAPS (Areas not yet explored):
{gaps}

INSTRUCTIONS:
Generate 10 highly relevant research questions this person should explore next. Make them:
{instructions}

Mix these question types:
- CONTINUATION: Natural follow-ups to recent work
- DEEPENING: Dig into specific mechanisms or details
- BRIDGING: Connect different research areas
- TREND: What's new and emerging in the field
- PRACTICAL: Clinical/translational applications{techniques_hint}
- GAP: Unexplored but relevant areas
- COMPARISON: Compare approaches or concepts
- EXPLORATION: New promising directions

For each question, consider:
- The researcher's expertise level ({expertise}){years_hint}
- Their recent query patterns and research trajectory
- Active research projects and their current status
- Upcoming goals and deadlines (especially urgent ones)
- Their laboratory skills{lab_hint}
- Their computational abilities{compute_hint}
- Team interests and potential collaborations
- Identified knowledge gaps

Return ONLY a valid JSON object with this exact structure:
{{
  \"questions\": [
    {{
      \"question\": \"The specific research question\",
      \"type\": \"CONTINUATION|DEEPENING|BRIDGING|TREND|PRACTICAL|GAP|COMPARISON|EXPLORATION\",
      \"reasoning\": \"Why this question is relevant and valuable (1-2 sentences)\",
      \"priority\": \"high|medium|low\"
    }}
  ]
}}

Make questions natural, specific, and genuinely useful for advancing their research.",
		profile_section = profile_section(context),
		instructions = instructions.join("\n"),
		expertise = context.expertise(),
	)
}

/// The reduced five-question prompt for users without history.
pub fn build_new_user_prompt(context: &ResearchContext) -> String {
	let department = context.department();

	format!(
		"You are an AI research advisor for a new researcher at ACM Research Platform.

USER PROFILE:
- Department: {department}
- Expertise Level: {expertise}
- Stated Interests: {interests}

This is a NEW USER with no query history yet.

Generate 5 excellent starter questions for someone in {department} to help them:
1. Get familiar with the research platform
2. Explore their field effectively
3. Discover relevant recent breakthroughs
4. Understand current trends
5. Find impactful research directions

Return ONLY a valid JSON object:
{{
  \"questions\": [
    {{
      \"question\": \"The specific research question\",
      \"type\": \"TREND|EXPLORATION|PRACTICAL\",
      \"reasoning\": \"Why this is a great starting question\",
      \"priority\": \"high\"
    }}
  ]
}}",
		expertise = context.expertise(),
		interests = context.interests(),
	)
}

/// Used only when the starter prompt itself fails.
pub fn fallback_new_user_questions(department: &str) -> Vec<LlmQuestion> {
	let entries: &[(&str, &str)] = match department {
		"Cancer Research" => &[
			(
				"What are the latest breakthroughs in CAR-T cell therapy for solid tumors?",
				"CAR-T therapy is rapidly evolving. Understanding recent advances is crucial.",
			),
			(
				"Which immunotherapy approaches show the most promise in 2025?",
				"Staying current with immunotherapy trends is essential for cancer research.",
			),
		],
		_ => &[(
			"What are the most cited cancer research papers published this year?",
			"High-impact papers shape the direction of research.",
		)],
	};

	entries
		.iter()
		.map(|(question, reasoning)| LlmQuestion {
			question: question.to_string(),
			kind: "TREND".to_string(),
			reasoning: reasoning.to_string(),
			priority: "high".to_string(),
			score: llm_parse::priority_score("high"),
		})
		.collect()
}

fn first_three(items: &[String]) -> String {
	if items.is_empty() {
		return String::new();
	}

	format!(" ({})", items.iter().take(3).map(String::as_str).collect::<Vec<_>>().join(", "))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn context(now: OffsetDateTime) -> ResearchContext {
		ResearchContext {
			profile: ResearcherProfile {
				name: "Ada".to_string(),
				department: Some("Cancer Research".to_string()),
				primary_interests: vec!["tumor immunology".to_string()],
				phd_focus: Some("T-cell exhaustion".to_string()),
				..Default::default()
			},
			recent_queries: Vec::new(),
			important_papers: Vec::new(),
			projects: Vec::new(),
			goals: Vec::new(),
			team_activity: Vec::new(),
			gaps: Vec::new(),
			now,
		}
	}

	fn goal(target: Option<OffsetDateTime>) -> GoalRecord {
		GoalRecord {
			goal_id: Uuid::new_v4(),
			goal_type: "GRANT".to_string(),
			title: "Submit R01".to_string(),
			status: "IN_PROGRESS".to_string(),
			target_date: target,
		}
	}

	#[test]
	fn near_deadlines_mark_the_prompt_urgent() {
		let now = OffsetDateTime::now_utc();
		let mut ctx = context(now);

		assert!(!build_prompt(&ctx).contains("URGENT"));

		ctx.goals.push(goal(Some(now + Duration::days(12))));

		let prompt = build_prompt(&ctx);

		assert!(prompt.contains("7. URGENT"));
		assert!(prompt.contains("- [GRANT] Submit R01 (in 12 days)"));
		assert!(prompt.contains("and PhD focus (T-cell exhaustion)"));
	}

	#[test]
	fn overdue_goals_are_not_urgent() {
		let now = OffsetDateTime::now_utc();
		let mut ctx = context(now);

		ctx.goals.push(goal(Some(now - Duration::days(3))));

		let prompt = build_prompt(&ctx);

		assert!(prompt.contains("(3 days overdue)"));
		assert!(!prompt.contains("URGENT"));
	}

	#[test]
	fn empty_sections_use_placeholders() {
		let prompt = build_prompt(&context(OffsetDateTime::now_utc()));

		assert!(prompt.contains("No recent queries"));
		assert!(prompt.contains("No active projects specified"));
		assert!(prompt.contains("No gaps identified"));
		assert!(prompt.contains("- Expertise Level: STUDENT"));
	}

	#[test]
	fn fallback_is_department_keyed() {
		assert_eq!(fallback_new_user_questions("Cancer Research").len(), 2);
		assert_eq!(fallback_new_user_questions("Physics").len(), 1);
		assert!(fallback_new_user_questions("Physics").iter().all(|q| q.score == 0.9));
	}
}
