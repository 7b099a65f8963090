//! Templated follow-up questions chosen from the shape of the user's recent queries.

use uuid::Uuid;

use crate::{
	BoxFuture, Context, Result,
	generators::{GeneratorOutput, QuestionGenerator},
};
use nextq_domain::{
	Category,
	text::{self, QueryPattern},
};
use nextq_storage::models::{QueryRecord, ResearcherProfile};

const HISTORY_WINDOW: i64 = 20;
const PATTERN_WINDOW: usize = 5;

/// Where a pattern question came from. Starter questions have no source queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatternKind {
	Detected(QueryPattern),
	NewUserStarter,
	NewUserInterest,
}

#[derive(Clone, Debug)]
pub struct PatternQuestion {
	pub question: String,
	pub reasoning: String,
	pub score: f32,
	pub category: Category,
	pub kind: PatternKind,
	pub source_query_ids: Vec<Uuid>,
}

pub struct PatternGenerator;

impl QuestionGenerator for PatternGenerator {
	fn name(&self) -> &'static str {
		"pattern"
	}

	fn generate<'a>(
		&'a self,
		ctx: &'a Context,
		user_id: Uuid,
	) -> BoxFuture<'a, Result<GeneratorOutput>> {
		Box::pin(async move {
			generate_from_patterns(ctx, user_id).await.map(GeneratorOutput::Pattern)
		})
	}
}

pub async fn generate_from_patterns(ctx: &Context, user_id: Uuid) -> Result<Vec<PatternQuestion>> {
	let history = ctx.stores.research.queries(user_id, true, HISTORY_WINDOW).await?;

	if history.is_empty() {
		let profile = ctx.stores.research.profile(user_id).await?.unwrap_or_default();

		return Ok(new_user_questions(&profile));
	}

	Ok(questions_for_history(&history))
}

/// Classifies the newest queries and expands the matching templates.
pub fn questions_for_history(history: &[QueryRecord]) -> Vec<PatternQuestion> {
	let recent = &history[..history.len().min(PATTERN_WINDOW)];
	let texts: Vec<&str> = recent.iter().map(|query| query.original_query.as_str()).collect();
	let topics: Vec<Vec<String>> = texts.iter().map(|q| text::extract_keywords(q)).collect();
	let pattern = text::classify_pattern(&texts, &topics);
	let source_ids: Vec<Uuid> = recent.iter().map(|query| query.query_id).collect();
	let lead = |idx: usize| topics.get(idx).and_then(|words| words.first()).map(String::as_str);
	let templates = match pattern {
		QueryPattern::DeepDive => deep_dive(lead(0).unwrap_or("your research area")),
		QueryPattern::Comparison =>
			comparison(lead(0).unwrap_or("approach A"), lead(1).unwrap_or("approach B")),
		QueryPattern::Exploration =>
			exploration(lead(0).unwrap_or("your recent topic"), lead(1).unwrap_or("related areas")),
		QueryPattern::ProblemSolving => problem_solving(lead(0).unwrap_or("this problem")),
		QueryPattern::NewUser => Vec::new(),
	};

	templates
		.into_iter()
		.map(|(question, reasoning, score, category)| PatternQuestion {
			question,
			reasoning,
			score,
			category,
			kind: PatternKind::Detected(pattern),
			source_query_ids: source_ids.clone(),
		})
		.collect()
}

/// Interest-keyed questions when the profile names primary interests, otherwise the
/// department's starter set.
pub fn new_user_questions(profile: &ResearcherProfile) -> Vec<PatternQuestion> {
	if !profile.primary_interests.is_empty() {
		return profile
			.primary_interests
			.iter()
			.map(|interest| PatternQuestion {
				question: format!("What are the latest developments in {interest}?"),
				reasoning: format!("This aligns with your stated research interest in {interest}."),
				score: 0.9,
				category: Category::Trend,
				kind: PatternKind::NewUserInterest,
				source_query_ids: Vec::new(),
			})
			.collect();
	}

	let starters: &[(&str, &str, f32, Category)] = match profile.department.as_deref() {
		Some("Cancer Research") => &CANCER_RESEARCH_STARTERS,
		_ => &GENERAL_STARTERS,
	};

	starters
		.iter()
		.map(|(question, reasoning, score, category)| PatternQuestion {
			question: question.to_string(),
			reasoning: reasoning.to_string(),
			score: *score,
			category: *category,
			kind: PatternKind::NewUserStarter,
			source_query_ids: Vec::new(),
		})
		.collect()
}

type Template = (String, String, f32, Category);

fn deep_dive(topic: &str) -> Vec<Template> {
	vec![
		(
			format!("What are the current limitations of {topic} approaches?"),
			format!(
				"You've been exploring {topic} in depth. Understanding limitations is key to advancing the field."
			),
			0.85,
			Category::Deepening,
		),
		(
			format!("How has {topic} research evolved in the last 2 years?"),
			format!(
				"You're focused on {topic}. Tracking recent developments will reveal emerging trends."
			),
			0.8,
			Category::Trend,
		),
		(
			format!("What are the clinical applications of {topic}?"),
			format!("Deep knowledge of {topic} enables exploration of practical applications."),
			0.75,
			Category::Practical,
		),
		(
			format!("Which research groups are leading {topic} development?"),
			format!(
				"Your deep interest in {topic} suggests tracking key contributors would be valuable."
			),
			0.7,
			Category::Exploration,
		),
	]
}

fn comparison(first: &str, second: &str) -> Vec<Template> {
	vec![
		(
			format!("How do {first} and {second} compare in terms of clinical efficacy?"),
			"You're comparing different approaches. Clinical outcomes are the ultimate test."
				.to_string(),
			0.85,
			Category::Comparison,
		),
		(
			format!("What are the cost-benefit tradeoffs between {first} and {second}?"),
			"Practical implementation requires understanding economic factors beyond efficacy."
				.to_string(),
			0.8,
			Category::Practical,
		),
		(
			format!("Can {first} and {second} be combined for synergistic effects?"),
			"Your comparative analysis suggests exploring combination strategies could be valuable."
				.to_string(),
			0.75,
			Category::Exploration,
		),
		(
			format!("Which patient populations benefit most from {first} vs {second}?"),
			"Personalized medicine requires understanding which approach works best for whom."
				.to_string(),
			0.7,
			Category::Practical,
		),
	]
}

fn exploration(first: &str, second: &str) -> Vec<Template> {
	vec![
		(
			format!("What connects {first} and {second}?"),
			"You're exploring diverse topics. Finding connections could reveal new research directions."
				.to_string(),
			0.85,
			Category::Bridging,
		),
		(
			format!("What's the current state of the art in {first}?"),
			"Your broad exploration would benefit from understanding the frontier in each area."
				.to_string(),
			0.75,
			Category::Trend,
		),
		(
			"How do these different areas inform each other?".to_string(),
			"Exploring multiple fields creates opportunity for cross-pollination of ideas."
				.to_string(),
			0.7,
			Category::Bridging,
		),
	]
}

fn problem_solving(topic: &str) -> Vec<Template> {
	vec![
		(
			format!("What are alternative approaches to solving {topic}?"),
			"You seem focused on a specific challenge. Exploring alternatives often leads to breakthroughs."
				.to_string(),
			0.85,
			Category::Exploration,
		),
		(
			format!("What barriers have prevented progress on {topic}?"),
			"Understanding obstacles is crucial when working on specific problems.".to_string(),
			0.8,
			Category::Deepening,
		),
		(
			"How have others successfully addressed similar challenges?".to_string(),
			"Learning from analogous problems can provide valuable insights.".to_string(),
			0.75,
			Category::Exploration,
		),
	]
}

const CANCER_RESEARCH_STARTERS: [(&str, &str, f32, Category); 4] = [
	(
		"What are the latest CAR-T cell therapy breakthroughs in solid tumors?",
		"CAR-T is revolutionizing cancer treatment. Understanding latest advances is essential.",
		0.9,
		Category::Trend,
	),
	(
		"How effective are checkpoint inhibitors in different cancer types?",
		"Checkpoint inhibitors are a cornerstone of modern immunotherapy.",
		0.85,
		Category::Exploration,
	),
	(
		"What are emerging biomarkers for immunotherapy response prediction?",
		"Predicting treatment response is critical for personalized medicine.",
		0.85,
		Category::Practical,
	),
	(
		"How can we overcome tumor microenvironment barriers to therapy?",
		"The TME is a major obstacle to effective cancer treatment.",
		0.8,
		Category::Deepening,
	),
];
const GENERAL_STARTERS: [(&str, &str, f32, Category); 3] = [
	(
		"What are the most highly cited papers in my research area this year?",
		"High-impact papers shape the direction of the field.",
		0.8,
		Category::Trend,
	),
	(
		"What conferences should I attend in the next 6 months?",
		"Conferences are crucial for networking and staying current.",
		0.75,
		Category::Practical,
	),
	(
		"What are the emerging trends in cancer biology research?",
		"Understanding trends helps identify promising research directions.",
		0.75,
		Category::Trend,
	),
];

#[cfg(test)]
mod tests {
	use time::OffsetDateTime;

	use super::*;

	fn query(text: &str) -> QueryRecord {
		QueryRecord {
			query_id: Uuid::new_v4(),
			user_id: Uuid::nil(),
			original_query: text.to_string(),
			status: "COMPLETED".to_string(),
			concepts: Vec::new(),
			created_at: OffsetDateTime::UNIX_EPOCH,
		}
	}

	#[test]
	fn comparison_history_uses_the_two_lead_keywords() {
		let history = vec![
			query("pembrolizumab versus nivolumab response rates"),
			query("nivolumab toxicity profile"),
		];
		let questions = questions_for_history(&history);

		assert_eq!(questions.len(), 4);
		assert_eq!(
			questions[0].question,
			"How do pembrolizumab and nivolumab compare in terms of clinical efficacy?"
		);
		assert_eq!(questions[0].kind, PatternKind::Detected(QueryPattern::Comparison));
		assert_eq!(questions[0].source_query_ids.len(), 2);
	}

	#[test]
	fn repeated_focus_is_a_deep_dive() {
		let history = vec![
			query("tumor hypoxia signaling pathways"),
			query("tumor hypoxia signaling pathways"),
		];
		let questions = questions_for_history(&history);

		assert_eq!(questions[0].kind, PatternKind::Detected(QueryPattern::DeepDive));
		assert_eq!(questions[0].question, "What are the current limitations of tumor approaches?");
		assert!(questions.windows(2).all(|pair| pair[0].score >= pair[1].score));
	}

	#[test]
	fn single_query_history_falls_back_to_placeholder_topics() {
		let history = vec![query("microbiome diversity colorectal")];
		let questions = questions_for_history(&history);

		assert_eq!(questions[0].kind, PatternKind::Detected(QueryPattern::Exploration));
		assert_eq!(questions[0].question, "What connects microbiome and related areas?");
	}

	#[test]
	fn new_users_get_department_starters() {
		let cancer = ResearcherProfile {
			department: Some("Cancer Research".to_string()),
			..Default::default()
		};
		let unknown =
			ResearcherProfile { department: Some("Astronomy".to_string()), ..Default::default() };

		assert_eq!(new_user_questions(&cancer).len(), 4);
		assert_eq!(new_user_questions(&unknown).len(), 3);
		assert!(new_user_questions(&unknown).iter().all(|q| q.source_query_ids.is_empty()));
	}

	#[test]
	fn stated_interests_replace_starters() {
		let profile = ResearcherProfile {
			primary_interests: vec!["ferroptosis".to_string(), "glioma".to_string()],
			..Default::default()
		};
		let questions = new_user_questions(&profile);

		assert_eq!(questions.len(), 2);
		assert_eq!(questions[1].question, "What are the latest developments in glioma?");
		assert_eq!(questions[1].kind, PatternKind::NewUserInterest);
	}
}
