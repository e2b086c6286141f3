use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::resolver::{Candidate, EventMatch, ResolvedMatch, StageOutcome};
use facet_config::Search;
use facet_domain::{ConfidenceLevel, FieldCategory, confidence_level};

/// One entry of the final, deduplicated display lists.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ResolvedField {
	pub field_id: String,
	pub category: FieldCategory,
	pub display_name: String,
	pub field_name: String,
	pub score: f32,
	pub confidence: ConfidenceLevel,
	pub source_query: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub parent_event_id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub parent_event_display_name: Option<String>,
	pub ambiguous_with_sibling: bool,
}

/// Candidates for one source query that are close enough in score that
/// picking one over the others is not well justified.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AmbiguousGroup {
	pub category: FieldCategory,
	pub source_query: String,
	pub candidates: Vec<Candidate>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AggregatedResult {
	pub trace_id: Uuid,
	pub profile_attributes: Vec<ResolvedField>,
	pub events: Vec<ResolvedField>,
	pub event_attributes: Vec<ResolvedField>,
	pub has_ambiguity: bool,
	pub ambiguous_options: Vec<AmbiguousGroup>,
	pub confidence_score: f32,
	pub total_results: usize,
	pub summary: String,
	pub execution_time: f64,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}
impl AggregatedResult {
	pub fn failed(trace_id: Uuid, execution_time: f64, message: String) -> Self {
		Self {
			trace_id,
			profile_attributes: Vec::new(),
			events: Vec::new(),
			event_attributes: Vec::new(),
			has_ambiguity: false,
			ambiguous_options: Vec::new(),
			confidence_score: 0.0,
			total_results: 0,
			summary: "Query resolution failed.".to_string(),
			execution_time,
			error: Some(message),
		}
	}

	/// Machine-readable form; mirrors the struct one-to-one.
	pub fn to_value(&self) -> Value {
		serde_json::to_value(self).unwrap_or(Value::Null)
	}
}

pub(crate) fn aggregate(
	search: &Search,
	trace_id: Uuid,
	attributes: &StageOutcome<ResolvedMatch>,
	events: &StageOutcome<EventMatch>,
	event_attributes: &StageOutcome<ResolvedMatch>,
) -> AggregatedResult {
	let attribute_matches: Vec<&ResolvedMatch> = attributes.matches().iter().collect();
	let event_matches: Vec<&ResolvedMatch> =
		events.matches().iter().map(|event| &event.resolved).collect();
	let event_attribute_matches: Vec<&ResolvedMatch> = event_attributes.matches().iter().collect();

	let profile_attributes = dedup_and_rank(&attribute_matches, search.min_display_score);
	let resolved_events = dedup_and_rank(&event_matches, search.min_display_score);
	let resolved_event_attributes =
		dedup_and_rank(&event_attribute_matches, search.min_display_score);

	// Ambiguity is judged on the pre-dedup candidate trails, not on the
	// deduplicated display lists.
	let all_matches: Vec<&ResolvedMatch> = attribute_matches
		.iter()
		.chain(event_matches.iter())
		.chain(event_attribute_matches.iter())
		.copied()
		.collect();
	let ambiguous_options = ambiguity_groups(&all_matches, search.group_ambiguity_threshold);

	let confidence_score =
		mean_score(&[&profile_attributes, &resolved_events, &resolved_event_attributes]);
	let summary = build_summary(&profile_attributes, &resolved_events, &resolved_event_attributes);
	let total_results =
		profile_attributes.len() + resolved_events.len() + resolved_event_attributes.len();

	AggregatedResult {
		trace_id,
		profile_attributes,
		events: resolved_events,
		event_attributes: resolved_event_attributes,
		has_ambiguity: !ambiguous_options.is_empty(),
		ambiguous_options,
		confidence_score,
		total_results,
		summary,
		execution_time: 0.0,
		error: None,
	}
}

/// Sort score-descending, keep the first occurrence of each catalog id, drop
/// entries below the display threshold.
fn dedup_and_rank(matches: &[&ResolvedMatch], min_display_score: f32) -> Vec<ResolvedField> {
	let mut ranked: Vec<&ResolvedMatch> = matches.to_vec();

	ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

	let mut seen = HashSet::new();
	let mut out = Vec::new();

	for resolved in ranked {
		if resolved.score < min_display_score {
			continue;
		}
		if !seen.insert(resolved.field_id.as_str()) {
			continue;
		}

		out.push(ResolvedField {
			field_id: resolved.field_id.clone(),
			category: resolved.category,
			display_name: resolved.display_name.clone(),
			field_name: resolved.field_name.clone(),
			score: resolved.score,
			confidence: confidence_level(resolved.score),
			source_query: resolved.source_query.clone(),
			parent_event_id: resolved.parent_event_id.clone(),
			parent_event_display_name: resolved.parent_event_display_name.clone(),
			ambiguous_with_sibling: resolved.ambiguous_with_sibling,
		});
	}

	out
}

fn ambiguity_groups(matches: &[&ResolvedMatch], threshold: f32) -> Vec<AmbiguousGroup> {
	let mut groups: Vec<AmbiguousGroup> = Vec::new();

	for resolved in matches {
		let qualified: Vec<Candidate> = resolved
			.candidates
			.iter()
			.filter(|candidate| candidate.score >= threshold)
			.cloned()
			.collect();

		if let Some(group) = groups.iter_mut().find(|group| {
			group.category == resolved.category && group.source_query == resolved.source_query
		}) {
			for candidate in qualified {
				if !group.candidates.iter().any(|known| known.field_id == candidate.field_id) {
					group.candidates.push(candidate);
				}
			}
		} else {
			groups.push(AmbiguousGroup {
				category: resolved.category,
				source_query: resolved.source_query.clone(),
				candidates: qualified,
			});
		}
	}

	groups.retain(|group| group.candidates.len() >= 2);

	for group in &mut groups {
		group.candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
	}

	groups
}

fn mean_score(lists: &[&Vec<ResolvedField>]) -> f32 {
	let mut total = 0.0f32;
	let mut count = 0usize;

	for list in lists {
		for field in list.iter() {
			total += field.score;
			count += 1;
		}
	}

	if count == 0 { 0.0 } else { total / count as f32 }
}

fn build_summary(
	profiles: &[ResolvedField],
	events: &[ResolvedField],
	event_attributes: &[ResolvedField],
) -> String {
	let mut parts = Vec::new();

	for (label, list) in [
		("Profile attributes", profiles),
		("Events", events),
		("Event attributes", event_attributes),
	] {
		if list.is_empty() {
			continue;
		}

		let names = list
			.iter()
			.take(3)
			.map(|field| format!("{} ({})", field.display_name, field.confidence.as_str()))
			.collect::<Vec<_>>()
			.join(", ");

		parts.push(format!("{label}: {names}"));
	}

	if parts.is_empty() {
		return "No matching catalog fields were found.".to_string();
	}

	parts.join("; ")
}
