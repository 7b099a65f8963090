pub fn render_schema() -> String {
	let init = include_str!("../../../sql/init.sql");

	expand_includes(init)
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"tables/001_researchers.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_researchers.sql")),
				"tables/002_research_profiles.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_research_profiles.sql")),
				"tables/003_queries.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_queries.sql")),
				"tables/004_responses.sql" =>
					out.push_str(include_str!("../../../sql/tables/004_responses.sql")),
				"tables/005_feedback.sql" =>
					out.push_str(include_str!("../../../sql/tables/005_feedback.sql")),
				"tables/006_projects.sql" =>
					out.push_str(include_str!("../../../sql/tables/006_projects.sql")),
				"tables/007_goals.sql" =>
					out.push_str(include_str!("../../../sql/tables/007_goals.sql")),
				"tables/008_knowledge_gaps.sql" =>
					out.push_str(include_str!("../../../sql/tables/008_knowledge_gaps.sql")),
				"tables/009_concepts.sql" =>
					out.push_str(include_str!("../../../sql/tables/009_concepts.sql")),
				"tables/010_concept_relations.sql" =>
					out.push_str(include_str!("../../../sql/tables/010_concept_relations.sql")),
				"tables/011_concept_papers.sql" =>
					out.push_str(include_str!("../../../sql/tables/011_concept_papers.sql")),
				"tables/012_suggested_questions.sql" =>
					out.push_str(include_str!("../../../sql/tables/012_suggested_questions.sql")),
				"tables/013_suggestion_cache.sql" =>
					out.push_str(include_str!("../../../sql/tables/013_suggestion_cache.sql")),
				_ => {},
			}

			out.push('\n');

			continue;
		}

		out.push_str(line);
		out.push('\n');
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn every_include_is_expanded() {
		let sql = render_schema();

		assert!(!sql.contains("\\ir "));

		for table in ["researchers", "queries", "concept_relations", "suggested_questions"] {
			assert!(
				sql.contains(&format!("CREATE TABLE IF NOT EXISTS {table} (")),
				"Missing table {table}."
			);
		}
	}
}
