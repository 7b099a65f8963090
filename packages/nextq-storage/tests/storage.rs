use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use nextq_config::Postgres;
use nextq_storage::{
	cache,
	db::Db,
	graph,
	models::NewSuggestion,
	queries, suggestions,
};
use nextq_testkit::TestDatabase;

async fn bootstrap(test_db: &TestDatabase) -> Db {
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 2 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	db
}

fn new_suggestion(user_id: Uuid, question: &str, generated_at: OffsetDateTime) -> NewSuggestion {
	NewSuggestion {
		suggestion_id: Uuid::new_v4(),
		user_id,
		question: question.to_string(),
		reasoning: "Because.".to_string(),
		category: "TREND".to_string(),
		relevance_score: 0.5,
		novelty_score: 1.0,
		actionability_score: 0.9,
		impact_score: 0.8,
		diversity_score: 1.0,
		overall_score: 0.76,
		source_type: "PATTERN".to_string(),
		source_ids: vec![],
		generated_by: "orchestrator".to_string(),
		generated_at,
		expires_at: generated_at + Duration::hours(24),
	}
}

async fn insert_concept(db: &Db, name: &str) -> Uuid {
	let id = Uuid::new_v4();

	sqlx::query("INSERT INTO concepts (concept_id, name, category) VALUES ($1, $2, 'topic')")
		.bind(id)
		.bind(name)
		.execute(&db.pool)
		.await
		.expect("Failed to insert concept.");

	id
}

async fn relate(db: &Db, a: Uuid, b: Uuid) {
	sqlx::query("INSERT INTO concept_relations (source_id, target_id) VALUES ($1, $2)")
		.bind(a)
		.bind(b)
		.execute(&db.pool)
		.await
		.expect("Failed to insert relation.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set NEXTQ_PG_DSN to run."]
async fn schema_bootstrap_is_idempotent() {
	let Some(base_dsn) = nextq_testkit::env_dsn() else {
		eprintln!("Skipping schema_bootstrap_is_idempotent; set NEXTQ_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = bootstrap(&test_db).await;

	db.ensure_schema().await.expect("Second bootstrap failed.");

	let count: i64 = sqlx::query_scalar(
		"SELECT count(*) FROM information_schema.tables WHERE table_name = 'suggested_questions'",
	)
	.fetch_one(&db.pool)
	.await
	.expect("Failed to query schema tables.");

	assert_eq!(count, 1);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set NEXTQ_PG_DSN to run."]
async fn duplicate_inserts_keep_live_records_and_replace_expired_ones() {
	let Some(base_dsn) = nextq_testkit::env_dsn() else {
		eprintln!("Skipping duplicate insert test; set NEXTQ_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = bootstrap(&test_db).await;
	let mut conn = db.pool.acquire().await.expect("Failed to acquire connection.");
	let user_id = Uuid::new_v4();
	let now = OffsetDateTime::now_utc();
	let first = new_suggestion(user_id, "What is tumor hypoxia?", now);

	assert!(suggestions::insert_suggestion(&mut conn, &first).await.expect("Insert failed."));

	let again = new_suggestion(user_id, "What is tumor hypoxia?", now + Duration::minutes(1));

	assert!(!suggestions::insert_suggestion(&mut conn, &again).await.expect("Insert failed."));

	let later = new_suggestion(user_id, "What is tumor hypoxia?", now + Duration::hours(25));

	assert!(suggestions::insert_suggestion(&mut conn, &later).await.expect("Insert failed."));

	let stored = suggestions::get_suggestion(&mut conn, later.suggestion_id)
		.await
		.expect("Lookup failed.")
		.expect("Replacement record missing.");

	assert!(!stored.displayed);
	assert_eq!(stored.generated_at.unix_timestamp(), later.generated_at.unix_timestamp());

	let purged = suggestions::purge_expired(&mut conn, now + Duration::hours(60))
		.await
		.expect("Purge failed.");

	assert_eq!(purged, 1);

	drop(conn);
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set NEXTQ_PG_DSN to run."]
async fn display_marks_match_by_question_hash() {
	let Some(base_dsn) = nextq_testkit::env_dsn() else {
		eprintln!("Skipping display_marks_match_by_question_hash; set NEXTQ_PG_DSN to run.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = bootstrap(&test_db).await;
	let mut conn = db.pool.acquire().await.expect("Failed to acquire connection.");
	let user_id = Uuid::new_v4();
	let now = OffsetDateTime::now_utc();
	let row = new_suggestion(user_id, "What is tumor hypoxia?", now);

	suggestions::insert_suggestion(&mut conn, &row).await.expect("Insert failed.");

	let variant = vec!["what is  TUMOR hypoxia?".to_string()];
	let displayed = suggestions::mark_displayed(&mut conn, user_id, &variant, now)
		.await
		.expect("Display update failed.");

	assert_eq!(displayed, 1);

	let stored = suggestions::get_suggestion(&mut conn, row.suggestion_id)
		.await
		.expect("Lookup failed.")
		.expect("Record missing.");

	assert!(stored.displayed);

	drop(conn);
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set NEXTQ_PG_DSN to run."]
async fn feedback_flags_follow_the_lifecycle() {
	let Some(base_dsn) = nextq_testkit::env_dsn() else {
		eprintln!("Skipping feedback lifecycle test; set NEXTQ_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = bootstrap(&test_db).await;
	let mut conn = db.pool.acquire().await.expect("Failed to acquire connection.");
	let user_id = Uuid::new_v4();
	let now = OffsetDateTime::now_utc();
	let row = new_suggestion(user_id, "How does hypoxia drive resistance?", now);

	suggestions::insert_suggestion(&mut conn, &row).await.expect("Insert failed.");

	let displayed = suggestions::mark_displayed(&mut conn, user_id, &[row.question.clone()], now)
		.await
		.expect("Display update failed.");

	assert_eq!(displayed, 1);

	suggestions::mark_clicked(&mut conn, row.suggestion_id, now).await.expect("Click failed.");

	let query_id = Uuid::new_v4();
	let executed = suggestions::mark_executed(&mut conn, user_id, &row.question, query_id)
		.await
		.expect("Execution update failed.");

	assert_eq!(executed, Some(row.suggestion_id));

	let stored = suggestions::get_suggestion(&mut conn, row.suggestion_id)
		.await
		.expect("Lookup failed.")
		.expect("Record missing.");

	assert!(stored.displayed && stored.clicked && stored.executed);
	assert!(!stored.dismissed);
	assert_eq!(stored.executed_query_id, Some(query_id));

	drop(conn);
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set NEXTQ_PG_DSN to run."]
async fn cache_entries_expire() {
	let Some(base_dsn) = nextq_testkit::env_dsn() else {
		eprintln!("Skipping cache_entries_expire; set NEXTQ_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = bootstrap(&test_db).await;
	let mut conn = db.pool.acquire().await.expect("Failed to acquire connection.");
	let now = OffsetDateTime::now_utc();
	let payload = serde_json::json!([{ "question": "q" }]);

	cache::put_entry(&mut conn, "k", &payload, now, now + Duration::seconds(300))
		.await
		.expect("Cache write failed.");

	let hit = cache::get_entry(&mut conn, "k", now).await.expect("Cache read failed.");

	assert_eq!(hit.map(|entry| entry.payload), Some(payload));

	let miss = cache::get_entry(&mut conn, "k", now + Duration::seconds(301))
		.await
		.expect("Cache read failed.");

	assert!(miss.is_none());

	cache::delete_entry(&mut conn, "k").await.expect("Cache delete failed.");

	assert!(cache::get_entry(&mut conn, "k", now).await.expect("Cache read failed.").is_none());

	drop(conn);
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set NEXTQ_PG_DSN to run."]
async fn graph_traversals_find_neighbors_and_bridges() {
	let Some(base_dsn) = nextq_testkit::env_dsn() else {
		eprintln!("Skipping graph traversal test; set NEXTQ_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = bootstrap(&test_db).await;
	let hypoxia = insert_concept(&db, "hypoxia").await;
	let angiogenesis = insert_concept(&db, "angiogenesis").await;
	let hif1a = insert_concept(&db, "HIF-1a").await;
	let vegf = insert_concept(&db, "VEGF").await;

	relate(&db, hypoxia, hif1a).await;
	relate(&db, hif1a, angiogenesis).await;
	relate(&db, hif1a, vegf).await;

	let mut conn = db.pool.acquire().await.expect("Failed to acquire connection.");
	let user_concepts = vec!["hypoxia".to_string(), "angiogenesis".to_string()];
	let neighbors = graph::unexplored_neighbors(&mut conn, &user_concepts, 10)
		.await
		.expect("Neighbor traversal failed.");
	let names: Vec<&str> = neighbors.iter().map(|hit| hit.concept.as_str()).collect();

	assert_eq!(names, vec!["HIF-1a", "VEGF"]);
	assert_eq!(neighbors[0].connection_count, 2);
	assert_eq!(neighbors[0].via_concepts, vec!["angiogenesis", "hypoxia"]);

	let bridges =
		graph::bridge_concepts(&mut conn, &user_concepts, 5).await.expect("Bridge query failed.");

	assert_eq!(bridges.len(), 1);
	assert_eq!(bridges[0].concept, "HIF-1a");
	assert_eq!(bridges[0].connection_count, 2);

	let profile = queries::fetch_profile(&mut conn, Uuid::new_v4()).await.expect("Lookup failed.");

	assert!(profile.is_none());

	drop(conn);
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
