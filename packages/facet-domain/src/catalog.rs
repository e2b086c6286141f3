use serde::{Deserialize, Serialize};

/// Partition of the metadata catalog a field belongs to.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldCategory {
	PersonAttribute,
	Event,
	EventAttribute,
}
impl FieldCategory {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::PersonAttribute => "person_attribute",
			Self::Event => "event",
			Self::EventAttribute => "event_attribute",
		}
	}

	pub fn parse(value: &str) -> Option<Self> {
		match value {
			"person_attribute" => Some(Self::PersonAttribute),
			"event" => Some(Self::Event),
			"event_attribute" => Some(Self::EventAttribute),
			_ => None,
		}
	}

	pub fn label(self) -> &'static str {
		match self {
			Self::PersonAttribute => "profile attribute",
			Self::Event => "event",
			Self::EventAttribute => "event attribute",
		}
	}
}

/// One resolvable entity of the catalog. Written by the offline ingestion
/// path and immutable during query resolution.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CatalogField {
	pub id: String,
	pub category: FieldCategory,
	/// Present only for `EventAttribute`; identifies the owning `Event`.
	pub parent_event_id: Option<String>,
	pub display_name: String,
	pub field_name: String,
	/// Free text the field's embedding is produced from; may include
	/// enumerated value lists.
	pub description: String,
}
