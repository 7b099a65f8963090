//! Canonical candidate and ranked-question shapes, and the conversions from each generator's
//! native output.

use serde::{Deserialize, Serialize};

use crate::generators::{
	GeneratorOutput, collaborative::CollaborativeQuestion, graph::GraphInsight, llm::LlmQuestion,
	pattern::PatternQuestion,
};
use nextq_domain::{Category, ScoreBreakdown, SourceType, scoring::DEFAULT_BASE_SCORE};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
	pub question: String,
	pub category: Category,
	pub reasoning: String,
	pub base_score: f32,
	pub source_type: SourceType,
	pub source_ids: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedQuestion {
	pub question: String,
	pub category: Category,
	pub reasoning: String,
	pub scores: ScoreBreakdown,
	pub overall_score: f32,
	pub source_type: SourceType,
	pub source_ids: Vec<String>,
}

/// Flattens generator outputs into candidates, keeping generator order and each generator's
/// own order. Blank questions are dropped.
pub fn format_candidates(outputs: Vec<GeneratorOutput>) -> Vec<Candidate> {
	let mut out = Vec::new();

	for output in outputs {
		match output {
			GeneratorOutput::Graph(items) => out.extend(items.into_iter().map(Candidate::from)),
			GeneratorOutput::Pattern(items) => out.extend(items.into_iter().map(Candidate::from)),
			GeneratorOutput::Llm(items) => out.extend(items.into_iter().map(Candidate::from)),
			GeneratorOutput::Collaborative(items) =>
				out.extend(items.into_iter().map(Candidate::from)),
		}
	}

	out.retain(|candidate| !candidate.question.is_empty());

	out
}

/// Zero, negative, and non-finite scores count as missing.
fn base_score(raw: f32) -> f32 {
	if raw.is_finite() && raw > 0.0 { raw.min(1.0) } else { DEFAULT_BASE_SCORE }
}

impl From<GraphInsight> for Candidate {
	fn from(insight: GraphInsight) -> Self {
		Self {
			question: insight.question.trim().to_string(),
			category: insight.category,
			reasoning: insight.reasoning,
			base_score: base_score(insight.score),
			source_type: SourceType::KnowledgeGraph,
			source_ids: Vec::new(),
		}
	}
}

impl From<PatternQuestion> for Candidate {
	fn from(question: PatternQuestion) -> Self {
		Self {
			question: question.question.trim().to_string(),
			category: question.category,
			reasoning: question.reasoning,
			base_score: base_score(question.score),
			source_type: SourceType::Pattern,
			source_ids: question.source_query_ids.iter().map(ToString::to_string).collect(),
		}
	}
}

impl From<LlmQuestion> for Candidate {
	fn from(question: LlmQuestion) -> Self {
		Self {
			question: question.question.trim().to_string(),
			category: Category::parse_lenient(&question.kind),
			reasoning: question.reasoning,
			base_score: base_score(question.score),
			source_type: SourceType::LlmGenerated,
			source_ids: Vec::new(),
		}
	}
}

impl From<CollaborativeQuestion> for Candidate {
	fn from(question: CollaborativeQuestion) -> Self {
		Self {
			question: question.question.trim().to_string(),
			category: question.category,
			reasoning: question.reasoning,
			base_score: base_score(question.score),
			source_type: SourceType::Collaborative,
			source_ids: question.source_query_ids.iter().map(ToString::to_string).collect(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn llm(question: &str, kind: &str, score: f32) -> LlmQuestion {
		LlmQuestion {
			question: question.to_string(),
			kind: kind.to_string(),
			reasoning: "Because.".to_string(),
			priority: "medium".to_string(),
			score,
		}
	}

	#[test]
	fn unknown_llm_type_defaults_to_exploration() {
		let candidates = format_candidates(vec![GeneratorOutput::Llm(vec![
			llm("What drives relapse?", "SPECULATIVE", 0.9),
			llm("Which biomarkers predict response?", "gap", 0.5),
		])]);

		assert_eq!(candidates.len(), 2);
		assert_eq!(candidates[0].category, Category::Exploration);
		assert_eq!(candidates[1].category, Category::Gap);
		assert_eq!(candidates[0].source_type, SourceType::LlmGenerated);
	}

	#[test]
	fn missing_or_invalid_scores_use_the_default() {
		let candidates = format_candidates(vec![GeneratorOutput::Llm(vec![
			llm("A question with no score?", "TREND", f32::NAN),
			llm("A question with a runaway score?", "TREND", 7.0),
			llm("A question with a zero score?", "TREND", 0.0),
		])]);
		let scores: Vec<f32> = candidates.iter().map(|c| c.base_score).collect();

		assert_eq!(scores, vec![DEFAULT_BASE_SCORE, 1.0, DEFAULT_BASE_SCORE]);
	}

	#[test]
	fn blank_questions_are_dropped() {
		let candidates =
			format_candidates(vec![GeneratorOutput::Llm(vec![llm("   ", "GAP", 0.9)])]);

		assert!(candidates.is_empty());
	}
}
