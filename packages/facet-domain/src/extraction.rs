use serde_json::{Map, Value};
use tracing::warn;

/// Canonical decomposition of a free-text query, ready for embedding.
/// Ordering follows the extraction payload; nothing is sorted.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CanonicalQuery {
	pub person_attributes: Vec<AttributeQuery>,
	pub events: Vec<EventQuery>,
}
impl CanonicalQuery {
	pub fn is_empty(&self) -> bool {
		self.person_attributes.is_empty() && self.events.is_empty()
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct AttributeQuery {
	pub attribute_name: String,
	pub query_text: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EventQuery {
	pub description: String,
	pub attribute_queries: Vec<String>,
}

/// Convert a structured-extraction payload into a `CanonicalQuery`.
///
/// The payload shape is not controlled by this system: attributes arrive as a
/// name-to-value object or a bare list of names, the event list under either
/// `behavioral_events` or `events`, an event description under `event_type`
/// or `event_description`. Anything else is treated as absent. Total — a
/// malformed entry is skipped with a warning, never an error.
pub fn normalize_extraction(payload: &Value) -> CanonicalQuery {
	let Some(root) = structured_root(payload) else {
		return CanonicalQuery::default();
	};

	CanonicalQuery {
		person_attributes: attribute_queries(root.get("person_attributes")),
		events: event_queries(root),
	}
}

/// The extraction service emits the decomposition either at the top level or
/// nested under `structured_query`; the nested form wins when both exist.
fn structured_root(payload: &Value) -> Option<&Map<String, Value>> {
	let object = payload.as_object()?;

	if let Some(nested) = object.get("structured_query").and_then(Value::as_object) {
		return Some(nested);
	}

	Some(object)
}

fn attribute_queries(value: Option<&Value>) -> Vec<AttributeQuery> {
	match value {
		Some(Value::Object(entries)) => entries
			.iter()
			.filter_map(|(name, value)| {
				let name = name.trim();
				if name.is_empty() {
					return None;
				}

				let Some(rendered) = scalar_text(value) else {
					warn!(name, "Skipped an attribute entry with a non-scalar or empty value.");

					return None;
				};

				Some(AttributeQuery {
					attribute_name: name.to_string(),
					query_text: format!("{name}: {rendered}"),
				})
			})
			.collect(),
		Some(Value::Array(entries)) => entries
			.iter()
			.filter_map(|entry| {
				let Some(name) = entry.as_str().map(str::trim).filter(|name| !name.is_empty())
				else {
					warn!("Skipped a non-string or empty attribute name.");

					return None;
				};

				Some(AttributeQuery {
					attribute_name: name.to_string(),
					query_text: name.to_string(),
				})
			})
			.collect(),
		_ => Vec::new(),
	}
}

fn event_queries(root: &Map<String, Value>) -> Vec<EventQuery> {
	let Some(entries) =
		root.get("behavioral_events").or_else(|| root.get("events")).and_then(Value::as_array)
	else {
		return Vec::new();
	};

	entries
		.iter()
		.filter_map(|entry| {
			let Some(object) = entry.as_object() else {
				warn!("Skipped a non-object event entry.");

				return None;
			};
			// An event with no usable description is dropped whole, even when
			// its attributes would have been usable.
			let Some(description) = ["event_type", "event_description"]
				.iter()
				.filter_map(|key| object.get(*key))
				.filter_map(Value::as_str)
				.map(str::trim)
				.find(|description| !description.is_empty())
			else {
				warn!("Skipped an event entry without a usable description.");

				return None;
			};

			Some(EventQuery {
				description: description.to_string(),
				attribute_queries: attribute_queries(object.get("attributes"))
					.into_iter()
					.map(|attribute| attribute.query_text)
					.collect(),
			})
		})
		.collect()
}

fn scalar_text(value: &Value) -> Option<String> {
	match value {
		Value::String(text) => {
			let text = text.trim();

			(!text.is_empty()).then(|| text.to_string())
		},
		Value::Number(number) => Some(number.to_string()),
		Value::Bool(flag) => Some(flag.to_string()),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn attribute_names(query: &CanonicalQuery) -> Vec<&str> {
		query.person_attributes.iter().map(|attr| attr.attribute_name.as_str()).collect()
	}

	#[test]
	fn object_and_list_shapes_agree_on_names() {
		let from_object = normalize_extraction(&json!({
			"person_attributes": { "年龄": "25到35岁", "性别": "男性" }
		}));
		let from_list = normalize_extraction(&json!({
			"person_attributes": ["年龄", "性别"]
		}));

		assert_eq!(attribute_names(&from_object), attribute_names(&from_list));
		assert_eq!(from_object.person_attributes[0].query_text, "年龄: 25到35岁");
		assert_eq!(from_list.person_attributes[0].query_text, "年龄");
	}

	#[test]
	fn drops_blank_attribute_names() {
		let query = normalize_extraction(&json!({
			"person_attributes": ["age", "", "  "]
		}));

		assert_eq!(query.person_attributes.len(), 1);
		assert_eq!(query.person_attributes[0].attribute_name, "age");
	}

	#[test]
	fn drops_object_entries_with_empty_values() {
		let query = normalize_extraction(&json!({
			"person_attributes": { "age": "  ", "city": "Beijing" }
		}));

		assert_eq!(query.person_attributes.len(), 1);
		assert_eq!(query.person_attributes[0].query_text, "city: Beijing");
	}

	#[test]
	fn renders_numeric_and_boolean_values() {
		let query = normalize_extraction(&json!({
			"person_attributes": { "age": 30, "active": true }
		}));

		assert_eq!(query.person_attributes[0].query_text, "age: 30");
		assert_eq!(query.person_attributes[1].query_text, "active: true");
	}

	#[test]
	fn accepts_both_event_list_keys() {
		let new_shape = normalize_extraction(&json!({
			"behavioral_events": [{ "event_type": "purchase", "attributes": ["amount"] }]
		}));
		let old_shape = normalize_extraction(&json!({
			"events": [{ "event_description": "purchase", "attributes": ["amount"] }]
		}));

		assert_eq!(new_shape.events, old_shape.events);
		assert_eq!(new_shape.events[0].description, "purchase");
		assert_eq!(new_shape.events[0].attribute_queries, vec!["amount".to_string()]);
	}

	#[test]
	fn event_attributes_support_object_shape() {
		let query = normalize_extraction(&json!({
			"behavioral_events": [{
				"event_type": "下单",
				"attributes": { "时间范围": "过去90天内", "渠道": "App端" }
			}]
		}));

		assert_eq!(
			query.events[0].attribute_queries,
			vec!["时间范围: 过去90天内".to_string(), "渠道: App端".to_string()]
		);
	}

	#[test]
	fn drops_events_without_usable_description() {
		let query = normalize_extraction(&json!({
			"behavioral_events": [
				{ "event_type": "  ", "attributes": ["amount"] },
				{ "attributes": ["amount"] },
				"not-an-object",
				{ "event_type": "login" }
			]
		}));

		assert_eq!(query.events.len(), 1);
		assert_eq!(query.events[0].description, "login");
		assert!(query.events[0].attribute_queries.is_empty());
	}

	#[test]
	fn prefers_nested_structured_query() {
		let query = normalize_extraction(&json!({
			"person_attributes": ["outer"],
			"structured_query": { "person_attributes": ["inner"] }
		}));

		assert_eq!(attribute_names(&query), vec!["inner"]);
	}

	#[test]
	fn tolerates_absent_and_malformed_payloads() {
		assert!(normalize_extraction(&Value::Null).is_empty());
		assert!(normalize_extraction(&json!("free text")).is_empty());
		assert!(normalize_extraction(&json!({ "person_attributes": 42 })).is_empty());
		assert!(normalize_extraction(&json!({ "behavioral_events": { "not": "a list" } })).is_empty());
	}

	#[test]
	fn preserves_input_ordering() {
		let query = normalize_extraction(&json!({
			"person_attributes": ["gender", "age", "city"],
			"behavioral_events": [
				{ "event_type": "login" },
				{ "event_type": "purchase" }
			]
		}));

		assert_eq!(attribute_names(&query), vec!["gender", "age", "city"]);
		assert_eq!(query.events[0].description, "login");
		assert_eq!(query.events[1].description, "purchase");
	}
}
