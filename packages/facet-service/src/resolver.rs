use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{CatalogHit, ResolverService};
use facet_config::Search;
use facet_domain::{AttributeQuery, EventQuery, FieldCategory};

/// Outcome of one resolver stage. `Skipped` means the stage had no input or
/// its dependency produced none — distinct from resolving to zero matches.
#[derive(Clone, Debug)]
pub enum StageOutcome<T> {
	Resolved(Vec<T>),
	Skipped,
}
impl<T> StageOutcome<T> {
	pub fn matches(&self) -> &[T] {
		match self {
			Self::Resolved(matches) => matches,
			Self::Skipped => &[],
		}
	}

	pub fn is_skipped(&self) -> bool {
		matches!(self, Self::Skipped)
	}
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Candidate {
	pub field_id: String,
	pub display_name: String,
	pub field_name: String,
	pub score: f32,
}

/// One accepted match for a canonical query.
#[derive(Clone, Debug)]
pub struct ResolvedMatch {
	pub field_id: String,
	pub score: f32,
	pub category: FieldCategory,
	pub source_query: String,
	pub display_name: String,
	pub field_name: String,
	pub parent_event_id: Option<String>,
	pub parent_event_display_name: Option<String>,
	pub ambiguous_with_sibling: bool,
	/// Every candidate that cleared the similarity threshold, best first.
	/// The aggregator mines this trail for ambiguity groups.
	pub candidates: Vec<Candidate>,
}

/// An event match plus the attribute queries declared under the event,
/// carried forward unchanged so the dependent stage does not re-derive them.
#[derive(Clone, Debug)]
pub struct EventMatch {
	pub resolved: ResolvedMatch,
	pub attribute_queries: Vec<String>,
}

impl ResolverService {
	pub(crate) async fn resolve_attributes(
		&self,
		queries: &[AttributeQuery],
	) -> StageOutcome<ResolvedMatch> {
		if queries.is_empty() {
			return StageOutcome::Skipped;
		}

		let texts: Vec<String> = queries.iter().map(|query| query.query_text.clone()).collect();
		let vectors = match self.embed_cached(&texts).await {
			Ok(vectors) => vectors,
			Err(err) => {
				warn!(error = %err, "Embedding failed; the attribute stage resolves nothing.");

				return StageOutcome::Resolved(Vec::new());
			},
		};
		let mut matches = Vec::new();

		for (text, vector) in texts.iter().zip(vectors) {
			let hits = self
				.catalog
				.search(
					vector,
					FieldCategory::PersonAttribute,
					None,
					self.cfg.search.attribute_limit,
				)
				.await;

			match hits {
				Ok(hits) => matches.extend(select_match(text, hits, &self.cfg.search)),
				Err(err) => {
					warn!(query = %text, error = %err, "Catalog search failed for an attribute query.");
				},
			}
		}

		StageOutcome::Resolved(matches)
	}

	pub(crate) async fn resolve_events(&self, queries: &[EventQuery]) -> StageOutcome<EventMatch> {
		if queries.is_empty() {
			return StageOutcome::Skipped;
		}

		let texts: Vec<String> = queries.iter().map(|query| query.description.clone()).collect();
		let vectors = match self.embed_cached(&texts).await {
			Ok(vectors) => vectors,
			Err(err) => {
				warn!(error = %err, "Embedding failed; the event stage resolves nothing.");

				return StageOutcome::Resolved(Vec::new());
			},
		};
		let mut matches = Vec::new();

		for (query, vector) in queries.iter().zip(vectors) {
			let hits = self
				.catalog
				.search(vector, FieldCategory::Event, None, self.cfg.search.event_limit)
				.await;

			match hits {
				Ok(hits) => {
					if let Some(resolved) = select_match(&query.description, hits, &self.cfg.search)
					{
						matches.push(EventMatch {
							resolved,
							attribute_queries: query.attribute_queries.clone(),
						});
					}
				},
				Err(err) => {
					warn!(query = %query.description, error = %err, "Catalog search failed for an event query.");
				},
			}
		}

		StageOutcome::Resolved(matches)
	}

	/// Dependent stage: searches the event-attribute partition scoped to each
	/// resolved parent event. Never crosses event boundaries.
	pub(crate) async fn resolve_event_attributes(
		&self,
		events: &[EventMatch],
	) -> StageOutcome<ResolvedMatch> {
		if events.is_empty() {
			return StageOutcome::Skipped;
		}

		let mut matches = Vec::new();

		for event in events {
			if event.attribute_queries.is_empty() {
				continue;
			}

			let vectors = match self.embed_cached(&event.attribute_queries).await {
				Ok(vectors) => vectors,
				Err(err) => {
					warn!(
						event = %event.resolved.field_id,
						error = %err,
						"Embedding failed; skipping this event's attribute queries.",
					);

					continue;
				},
			};

			for (text, vector) in event.attribute_queries.iter().zip(vectors) {
				let hits = self
					.catalog
					.search(
						vector,
						FieldCategory::EventAttribute,
						Some(&event.resolved.field_id),
						self.cfg.search.event_attribute_limit,
					)
					.await;

				match hits {
					Ok(hits) => {
						if let Some(mut resolved) = select_match(text, hits, &self.cfg.search) {
							resolved.parent_event_id = Some(event.resolved.field_id.clone());
							resolved.parent_event_display_name =
								Some(event.resolved.display_name.clone());

							matches.push(resolved);
						}
					},
					Err(err) => {
						warn!(
							query = %text,
							event = %event.resolved.field_id,
							error = %err,
							"Catalog search failed for an event attribute query.",
						);
					},
				}
			}
		}

		StageOutcome::Resolved(matches)
	}
}

/// Shared selection rule for every resolver stage: re-sort, threshold-filter,
/// accept the best survivor, flag a near-tie with the runner-up.
pub(crate) fn select_match(
	source_query: &str,
	mut hits: Vec<CatalogHit>,
	search: &Search,
) -> Option<ResolvedMatch> {
	hits.sort_by(|a, b| b.score.total_cmp(&a.score));
	hits.retain(|hit| hit.score >= search.similarity_threshold);

	let best = hits.first()?.clone();
	let ambiguous = hits
		.get(1)
		.map(|second| best.score - second.score < search.ambiguity_margin)
		.unwrap_or(false);
	let candidates = hits
		.iter()
		.map(|hit| Candidate {
			field_id: hit.field_id.clone(),
			display_name: hit.display_name.clone(),
			field_name: hit.field_name.clone(),
			score: hit.score,
		})
		.collect();

	Some(ResolvedMatch {
		field_id: best.field_id,
		score: best.score,
		category: best.category,
		source_query: source_query.to_string(),
		display_name: best.display_name,
		field_name: best.field_name,
		parent_event_id: best.parent_event_id,
		parent_event_display_name: None,
		ambiguous_with_sibling: ambiguous,
		candidates,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	fn hit(field_id: &str, score: f32) -> CatalogHit {
		CatalogHit {
			field_id: field_id.to_string(),
			score,
			category: FieldCategory::PersonAttribute,
			display_name: field_id.to_string(),
			field_name: field_id.to_string(),
			parent_event_id: None,
			description: String::new(),
		}
	}

	#[test]
	fn accepts_the_best_candidate_above_threshold() {
		let hits = vec![hit("second", 0.70), hit("best", 0.90), hit("below", 0.50)];
		let resolved =
			select_match("age", hits, &Search::default()).expect("Expected a resolved match.");

		assert_eq!(resolved.field_id, "best");
		assert_eq!(resolved.source_query, "age");
		assert!(!resolved.ambiguous_with_sibling);
		assert_eq!(resolved.candidates.len(), 2);
	}

	#[test]
	fn yields_nothing_when_every_candidate_is_below_threshold() {
		let hits = vec![hit("a", 0.60), hit("b", 0.40)];

		assert!(select_match("age", hits, &Search::default()).is_none());
	}

	#[test]
	fn flags_a_gap_inside_the_margin() {
		let hits = vec![hit("a", 0.80), hit("b", 0.76)];
		let resolved =
			select_match("age", hits, &Search::default()).expect("Expected a resolved match.");

		assert!(resolved.ambiguous_with_sibling);
	}

	#[test]
	fn does_not_flag_a_gap_outside_the_margin() {
		let hits = vec![hit("a", 0.80), hit("b", 0.70)];
		let resolved =
			select_match("age", hits, &Search::default()).expect("Expected a resolved match.");

		assert!(!resolved.ambiguous_with_sibling);
	}

	#[test]
	fn single_candidate_is_never_ambiguous() {
		let hits = vec![hit("only", 0.66)];
		let resolved =
			select_match("age", hits, &Search::default()).expect("Expected a resolved match.");

		assert!(!resolved.ambiguous_with_sibling);
		assert_eq!(resolved.candidates.len(), 1);
	}
}
