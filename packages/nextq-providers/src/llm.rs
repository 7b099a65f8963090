use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

/// Sends a single-turn chat completion and returns the raw text of the first choice.
pub async fn complete(
	cfg: &nextq_config::LlmProviderConfig,
	prompt: &str,
	max_tokens: u32,
	temperature: f32,
) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": temperature,
		"max_tokens": max_tokens,
		"messages": [{ "role": "user", "content": prompt }],
	});
	let res = client
		.post(&url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_completion_text(&json)
}

fn parse_completion_text(json: &Value) -> Result<String> {
	if let Some(content) = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
	{
		return Ok(content.to_string());
	}

	for key in ["content", "text"] {
		if let Some(text) = json.get(key).and_then(|v| v.as_str()) {
			return Ok(text.to_string());
		}
	}

	Err(eyre::eyre!("Completion response is missing text content."))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_choice_content() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "Here you go: {\"questions\": []}" } }
			]
		});
		let text = parse_completion_text(&json).expect("parse failed");

		assert!(text.starts_with("Here you go"));
	}

	#[test]
	fn falls_back_to_top_level_text() {
		let json = serde_json::json!({ "text": "plain" });

		assert_eq!(parse_completion_text(&json).expect("parse failed"), "plain");
		assert!(parse_completion_text(&serde_json::json!({})).is_err());
	}
}
