pub mod collaborative;
pub mod graph;
pub mod llm;
pub mod pattern;

use std::sync::Arc;

use tokio::task::JoinSet;
use uuid::Uuid;

use crate::{BoxFuture, Context, Result};
use collaborative::{CollaborativeGenerator, CollaborativeQuestion};
use graph::{GraphGenerator, GraphInsight};
use llm::{LlmGenerator, LlmQuestion};
use pattern::{PatternGenerator, PatternQuestion};

/// One strategy for proposing questions to a user.
pub trait QuestionGenerator
where
	Self: Send + Sync,
{
	fn name(&self) -> &'static str;

	fn generate<'a>(
		&'a self,
		ctx: &'a Context,
		user_id: Uuid,
	) -> BoxFuture<'a, Result<GeneratorOutput>>;
}

#[derive(Clone, Debug)]
pub enum GeneratorOutput {
	Graph(Vec<GraphInsight>),
	Pattern(Vec<PatternQuestion>),
	Llm(Vec<LlmQuestion>),
	Collaborative(Vec<CollaborativeQuestion>),
}
impl GeneratorOutput {
	pub(crate) fn len(&self) -> usize {
		match self {
			Self::Graph(items) => items.len(),
			Self::Pattern(items) => items.len(),
			Self::Llm(items) => items.len(),
			Self::Collaborative(items) => items.len(),
		}
	}
}

pub fn default_generators() -> Vec<Arc<dyn QuestionGenerator>> {
	vec![
		Arc::new(GraphGenerator),
		Arc::new(PatternGenerator),
		Arc::new(LlmGenerator),
		Arc::new(CollaborativeGenerator),
	]
}

/// Runs every generator as its own task and waits for all of them.
///
/// Failed or panicked generators contribute nothing. Outputs come back in the order of
/// `generators`, not completion order.
pub async fn generate_all(
	ctx: &Context,
	generators: &[Arc<dyn QuestionGenerator>],
	user_id: Uuid,
) -> Vec<GeneratorOutput> {
	let mut tasks = JoinSet::new();

	for (idx, generator) in generators.iter().enumerate() {
		let generator = Arc::clone(generator);
		let ctx = ctx.clone();

		tasks.spawn(async move {
			let outcome = generator.generate(&ctx, user_id).await;

			(idx, generator.name(), outcome)
		});
	}

	let mut settled = Vec::with_capacity(generators.len());

	while let Some(joined) = tasks.join_next().await {
		match joined {
			Ok((idx, name, Ok(output))) => {
				tracing::debug!(
					user_id = %user_id,
					generator = name,
					candidate_count = output.len(),
					"Question generator finished."
				);

				settled.push((idx, output));
			},
			Ok((_, name, Err(err))) => {
				tracing::warn!(
					error = %err,
					user_id = %user_id,
					generator = name,
					"Question generator failed."
				);
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					user_id = %user_id,
					"Question generator task aborted."
				);
			},
		}
	}

	settled.sort_by_key(|(idx, _)| *idx);

	settled.into_iter().map(|(_, output)| output).collect()
}
