//! Extraction of structured questions from free-form model output.
//!
//! The model is asked for `{"questions": [{question, type, reasoning, priority}]}` but may wrap
//! it in prose or markdown fences. Only the first balanced object is considered.

use serde_json::Value;

use crate::{Error, Result, generators::llm::LlmQuestion};

const DEFAULT_PRIORITY: &str = "medium";

/// Returns the first balanced `{...}` substring, ignoring braces inside JSON strings.
pub fn first_json_object(content: &str) -> Option<&str> {
	let start = content.find('{')?;
	let mut depth = 0_usize;
	let mut in_string = false;
	let mut escaped = false;

	for (offset, ch) in content[start..].char_indices() {
		if in_string {
			match ch {
				_ if escaped => escaped = false,
				'\\' => escaped = true,
				'"' => in_string = false,
				_ => {},
			}

			continue;
		}

		match ch {
			'"' => in_string = true,
			'{' => depth += 1,
			'}' => {
				depth -= 1;

				if depth == 0 {
					return Some(&content[start..start + offset + 1]);
				}
			},
			_ => {},
		}
	}

	None
}

pub fn priority_score(priority: &str) -> f32 {
	match priority {
		"high" => 0.9,
		"medium" => 0.7,
		"low" => 0.5,
		_ => 0.7,
	}
}

/// Parses model output into questions. Items without a question string are skipped.
pub fn parse_questions(content: &str) -> Result<Vec<LlmQuestion>> {
	let Some(object) = first_json_object(content) else {
		return Err(Error::Parse { message: "No JSON object found in model output.".to_string() });
	};
	let value: Value = serde_json::from_str(object)?;
	let Some(items) = value.get("questions").and_then(Value::as_array) else {
		return Err(Error::Parse {
			message: "Model output is missing a questions array.".to_string(),
		});
	};

	Ok(items.iter().filter_map(question_from_value).collect())
}

fn question_from_value(item: &Value) -> Option<LlmQuestion> {
	let text_field = |key: &str| item.get(key).and_then(Value::as_str).map(str::trim);
	let question = text_field("question").filter(|question| !question.is_empty())?;
	let priority = text_field("priority").unwrap_or(DEFAULT_PRIORITY);

	Some(LlmQuestion {
		question: question.to_string(),
		kind: text_field("type").unwrap_or_default().to_string(),
		reasoning: text_field("reasoning").unwrap_or_default().to_string(),
		priority: priority.to_string(),
		score: priority_score(priority),
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn extracts_object_wrapped_in_prose() {
		let content = "Here you go:\n```json\n{\"questions\": [{\"question\": \"Why {x}?\"}]}\n```\nDone {not json}";

		assert_eq!(
			first_json_object(content),
			Some("{\"questions\": [{\"question\": \"Why {x}?\"}]}")
		);
	}

	#[test]
	fn unbalanced_or_missing_objects_are_rejected() {
		assert_eq!(first_json_object("no braces at all"), None);
		assert_eq!(first_json_object("{\"questions\": ["), None);
		assert!(matches!(parse_questions("plain text"), Err(Error::Parse { .. })));
		assert!(matches!(parse_questions("{\"items\": []}"), Err(Error::Parse { .. })));
		assert!(matches!(parse_questions("{\"questions\": 3}"), Err(Error::Parse { .. })));
	}

	#[test]
	fn maps_priorities_and_skips_invalid_items() {
		let content = r#"{"questions": [
			{"question": "What limits CAR-T persistence?", "type": "DEEPENING", "reasoning": "r", "priority": "high"},
			{"question": "", "type": "GAP", "priority": "low"},
			{"type": "TREND"},
			{"question": "Which trials compare PD-1 agents?", "priority": "urgent"},
			{"question": "What is new in spatial omics?", "priority": "low"}
		]}"#;
		let questions = parse_questions(content).expect("Failed to parse questions.");

		assert_eq!(questions.len(), 3);
		assert_eq!(questions[0].score, 0.9);
		assert_eq!(questions[0].kind, "DEEPENING");
		assert_eq!(questions[1].score, 0.7);
		assert_eq!(questions[1].kind, "");
		assert_eq!(questions[2].score, 0.5);
	}
}
