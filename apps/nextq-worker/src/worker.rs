//! Periodic purge of expired suggestion records and cache entries.

use std::time::Duration as StdDuration;

use time::{Duration, OffsetDateTime};
use tokio::time as tokio_time;

use nextq_service::QuestionService;

pub struct WorkerState {
	cleanup_interval: Duration,
	poll_interval: StdDuration,
	last_cleanup: Option<OffsetDateTime>,
}
impl WorkerState {
	pub fn new(cfg: &nextq_config::Worker) -> Self {
		Self {
			cleanup_interval: Duration::seconds(cfg.cleanup_interval_seconds.max(1)),
			poll_interval: StdDuration::from_millis(cfg.poll_interval_ms.max(1)),
			last_cleanup: None,
		}
	}

	/// The first poll always runs a cleanup.
	pub fn cleanup_due(&self, now: OffsetDateTime) -> bool {
		match self.last_cleanup {
			Some(last) => now - last >= self.cleanup_interval,
			None => true,
		}
	}
}

pub async fn run_worker(
	service: &QuestionService,
	mut state: WorkerState,
) -> color_eyre::Result<()> {
	tracing::info!(
		interval_seconds = state.cleanup_interval.whole_seconds(),
		"Cleanup worker started."
	);

	loop {
		let now = OffsetDateTime::now_utc();

		if state.cleanup_due(now) {
			match service.cleanup_expired().await {
				Ok(report) => {
					state.last_cleanup = Some(now);

					if report.expired_suggestions > 0 || report.expired_cache_entries > 0 {
						tracing::info!(
							suggestions = report.expired_suggestions,
							cache_entries = report.expired_cache_entries,
							"Purged expired suggestion data."
						);
					}
				},
				Err(err) => tracing::error!(error = %err, "Suggestion cleanup failed."),
			}
		}

		tokio_time::sleep(state.poll_interval).await;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn state(interval_seconds: i64) -> WorkerState {
		WorkerState::new(&nextq_config::Worker {
			cleanup_interval_seconds: interval_seconds,
			poll_interval_ms: 500,
		})
	}

	#[test]
	fn cleanup_runs_on_first_poll_then_waits_for_the_interval() {
		let mut state = state(900);
		let start = OffsetDateTime::UNIX_EPOCH;

		assert!(state.cleanup_due(start));

		state.last_cleanup = Some(start);

		assert!(!state.cleanup_due(start + Duration::seconds(899)));
		assert!(state.cleanup_due(start + Duration::seconds(900)));
	}

	#[test]
	fn non_positive_intervals_are_clamped() {
		let mut state = state(0);
		let start = OffsetDateTime::UNIX_EPOCH;

		state.last_cleanup = Some(start);

		assert!(!state.cleanup_due(start));
		assert!(state.cleanup_due(start + Duration::seconds(1)));
	}
}
