use std::time::Instant;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{AggregatedResult, Error, ResolverService, Result, StageOutcome, aggregate};
use facet_domain::{CanonicalQuery, normalize_extraction};

/// Which resolver branches a canonical query activates. Pure function of the
/// normalized decomposition.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Route {
	Empty,
	AttributesOnly,
	EventsOnly,
	Both,
}

pub(crate) fn route(query: &CanonicalQuery) -> Route {
	match (query.person_attributes.is_empty(), query.events.is_empty()) {
		(true, true) => Route::Empty,
		(false, true) => Route::AttributesOnly,
		(true, false) => Route::EventsOnly,
		(false, false) => Route::Both,
	}
}

impl ResolverService {
	/// Resolve a free-text query against the catalog. Infallible from the
	/// caller's view: every failure mode collapses into a well-formed result,
	/// with `error` set when the whole query could not be processed.
	pub async fn resolve(&self, query_text: &str) -> AggregatedResult {
		let started = Instant::now();
		let trace_id = Uuid::new_v4();

		match self.resolve_inner(query_text, trace_id).await {
			Ok(mut result) => {
				result.execution_time = started.elapsed().as_secs_f64();

				info!(
					%trace_id,
					total_results = result.total_results,
					has_ambiguity = result.has_ambiguity,
					"Query resolution completed.",
				);

				result
			},
			Err(err) => {
				warn!(%trace_id, error = %err, "Query resolution failed.");

				AggregatedResult::failed(trace_id, started.elapsed().as_secs_f64(), err.to_string())
			},
		}
	}

	async fn resolve_inner(&self, query_text: &str, trace_id: Uuid) -> Result<AggregatedResult> {
		if query_text.trim().is_empty() {
			return Err(Error::InvalidRequest { message: "Query text is empty.".to_string() });
		}

		let payload = self.extract_structured(query_text).await;
		let canonical = normalize_extraction(&payload);

		info!(
			%trace_id,
			attribute_queries = canonical.person_attributes.len(),
			event_queries = canonical.events.len(),
			"Normalized the extraction payload.",
		);

		// The attribute and event branches are independent; the
		// event-attribute stage must wait for finalized event matches.
		let (attributes, events) = match route(&canonical) {
			Route::Empty => (StageOutcome::Skipped, StageOutcome::Skipped),
			Route::AttributesOnly =>
				(self.resolve_attributes(&canonical.person_attributes).await, StageOutcome::Skipped),
			Route::EventsOnly =>
				(StageOutcome::Skipped, self.resolve_events(&canonical.events).await),
			Route::Both => tokio::join!(
				self.resolve_attributes(&canonical.person_attributes),
				self.resolve_events(&canonical.events),
			),
		};
		let event_attributes = match &events {
			StageOutcome::Resolved(matches) if !matches.is_empty() =>
				self.resolve_event_attributes(matches).await,
			_ => StageOutcome::Skipped,
		};

		Ok(aggregate::aggregate(&self.cfg.search, trace_id, &attributes, &events, &event_attributes))
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn routes_follow_list_emptiness() {
		let empty = normalize_extraction(&json!({}));
		let attributes = normalize_extraction(&json!({ "person_attributes": ["age"] }));
		let events = normalize_extraction(&json!({
			"behavioral_events": [{ "event_type": "purchase" }]
		}));
		let both = normalize_extraction(&json!({
			"person_attributes": ["age"],
			"behavioral_events": [{ "event_type": "purchase" }]
		}));

		assert_eq!(route(&empty), Route::Empty);
		assert_eq!(route(&attributes), Route::AttributesOnly);
		assert_eq!(route(&events), Route::EventsOnly);
		assert_eq!(route(&both), Route::Both);
	}
}
