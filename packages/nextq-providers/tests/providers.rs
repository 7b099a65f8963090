use reqwest::header::{AUTHORIZATION, HeaderName};
use serde_json::{Map, Value};

#[test]
fn builds_bearer_auth_header() {
	let headers =
		nextq_providers::auth_headers("secret", &Map::new()).expect("Failed to build headers.");
	let value = headers.get(AUTHORIZATION).expect("Missing authorization header.");

	assert_eq!(value, "Bearer secret");
}

#[test]
fn merges_default_headers() {
	let mut defaults = Map::new();

	defaults.insert("x-org".to_string(), Value::String("lab-7".to_string()));

	let headers =
		nextq_providers::auth_headers("secret", &defaults).expect("Failed to build headers.");

	assert_eq!(headers.get(HeaderName::from_static("x-org")).expect("Missing x-org."), "lab-7");
}

#[test]
fn rejects_non_string_default_headers() {
	let mut defaults = Map::new();

	defaults.insert("x-retries".to_string(), Value::from(3));

	assert!(nextq_providers::auth_headers("secret", &defaults).is_err());
}
