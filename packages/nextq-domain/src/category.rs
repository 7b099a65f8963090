use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
	Continuation,
	Deepening,
	#[serde(alias = "TRENDING")]
	Trend,
	Gap,
	Practical,
	Bridging,
	Exploration,
	Comparison,
}
impl Category {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Continuation => "CONTINUATION",
			Self::Deepening => "DEEPENING",
			Self::Trend => "TREND",
			Self::Gap => "GAP",
			Self::Practical => "PRACTICAL",
			Self::Bridging => "BRIDGING",
			Self::Exploration => "EXPLORATION",
			Self::Comparison => "COMPARISON",
		}
	}

	/// Parses a category label case-insensitively. Unknown or empty labels map to
	/// [`Category::Exploration`].
	pub fn parse_lenient(raw: &str) -> Self {
		match raw.trim().to_ascii_uppercase().as_str() {
			"CONTINUATION" => Self::Continuation,
			"DEEPENING" => Self::Deepening,
			"TREND" | "TRENDING" => Self::Trend,
			"GAP" => Self::Gap,
			"PRACTICAL" => Self::Practical,
			"BRIDGING" => Self::Bridging,
			"COMPARISON" => Self::Comparison,
			_ => Self::Exploration,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceType {
	KnowledgeGraph,
	Pattern,
	LlmGenerated,
	Collaborative,
	/// Used when a candidate arrives without a source tag.
	Hybrid,
}
impl SourceType {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::KnowledgeGraph => "KNOWLEDGE_GRAPH",
			Self::Pattern => "PATTERN",
			Self::LlmGenerated => "LLM_GENERATED",
			Self::Collaborative => "COLLABORATIVE",
			Self::Hybrid => "HYBRID",
		}
	}

	pub fn parse_lenient(raw: &str) -> Self {
		match raw.trim().to_ascii_uppercase().as_str() {
			"KNOWLEDGE_GRAPH" => Self::KnowledgeGraph,
			"PATTERN" => Self::Pattern,
			"LLM_GENERATED" => Self::LlmGenerated,
			"COLLABORATIVE" => Self::Collaborative,
			_ => Self::Hybrid,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedbackKind {
	Like,
	Dislike,
	Wrong,
	Important,
	Irrelevant,
}
impl FeedbackKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Like => "LIKE",
			Self::Dislike => "DISLIKE",
			Self::Wrong => "WRONG",
			Self::Important => "IMPORTANT",
			Self::Irrelevant => "IRRELEVANT",
		}
	}

	pub fn is_positive(self) -> bool {
		matches!(self, Self::Like | Self::Important)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryStatus {
	Pending,
	Processing,
	Completed,
	Failed,
}
impl QueryStatus {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Pending => "PENDING",
			Self::Processing => "PROCESSING",
			Self::Completed => "COMPLETED",
			Self::Failed => "FAILED",
		}
	}
}
