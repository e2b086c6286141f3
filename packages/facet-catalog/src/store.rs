use std::collections::HashMap;

use qdrant_client::{
	client::Payload,
	qdrant::{
		Condition, CreateCollectionBuilder, Distance, Filter, PointStruct, Query,
		QueryPointsBuilder, UpsertPointsBuilder, Value, VectorParamsBuilder, value::Kind,
	},
};
use tracing::warn;
use uuid::Uuid;

use crate::{Error, Result};
use facet_domain::{CatalogField, FieldCategory};

/// One catalog entry returned by a similarity search, ordering unspecified;
/// callers re-sort by score.
#[derive(Clone, Debug)]
pub struct CatalogHit {
	pub field_id: String,
	pub score: f32,
	pub category: FieldCategory,
	pub display_name: String,
	pub field_name: String,
	pub parent_event_id: Option<String>,
	pub description: String,
}

/// Explicitly owned handle to the vector store. Constructed once and passed
/// to whoever needs it; holds no state beyond the connection itself.
pub struct CatalogStore {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl CatalogStore {
	pub fn new(cfg: &facet_config::VectorStore) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	/// Idempotent collection bootstrap for the ingestion path.
	pub async fn ensure_collection(&self) -> Result<()> {
		if self.client.collection_exists(&self.collection).await? {
			return Ok(());
		}

		self.client
			.create_collection(CreateCollectionBuilder::new(self.collection.clone()).vectors_config(
				VectorParamsBuilder::new(u64::from(self.vector_dim), Distance::Cosine),
			))
			.await?;

		Ok(())
	}

	/// Offline ingestion write path. `vectors` must align one-to-one with
	/// `fields`; point ids are derived deterministically from the field id so
	/// re-ingestion overwrites in place.
	pub async fn upsert_fields(
		&self,
		fields: &[CatalogField],
		vectors: &[Vec<f32>],
	) -> Result<()> {
		if fields.len() != vectors.len() {
			return Err(Error::InvalidArgument(
				"Field and vector counts must match.".to_string(),
			));
		}

		let mut points = Vec::with_capacity(fields.len());

		for (field, vector) in fields.iter().zip(vectors) {
			if vector.len() != self.vector_dim as usize {
				return Err(Error::InvalidArgument(format!(
					"Vector for field {:?} has dimension {}, expected {}.",
					field.id,
					vector.len(),
					self.vector_dim,
				)));
			}

			let mut payload = Payload::new();

			payload.insert("field_id", field.id.clone());
			payload.insert("category", field.category.as_str().to_string());
			payload.insert(
				"parent_event_id",
				field
					.parent_event_id
					.clone()
					.map(serde_json::Value::String)
					.unwrap_or(serde_json::Value::Null),
			);
			payload.insert("display_name", field.display_name.clone());
			payload.insert("field_name", field.field_name.clone());
			payload.insert("description", field.description.clone());

			let point_id = Uuid::new_v5(&Uuid::NAMESPACE_OID, field.id.as_bytes());

			points.push(PointStruct::new(point_id.to_string(), vector.clone(), payload));
		}

		self.client
			.upsert_points(UpsertPointsBuilder::new(self.collection.clone(), points).wait(true))
			.await?;

		Ok(())
	}

	/// Nearest-field search within one catalog partition. The
	/// `parent_event_id` filter scopes event-attribute searches to their
	/// owning event; it is never applied to the other partitions.
	pub async fn search(
		&self,
		vector: Vec<f32>,
		category: FieldCategory,
		parent_event_id: Option<&str>,
		limit: u32,
	) -> Result<Vec<CatalogHit>> {
		let mut must = vec![Condition::matches("category", category.as_str().to_string())];

		if let Some(parent) = parent_event_id {
			must.push(Condition::matches("parent_event_id", parent.to_string()));
		}

		let filter = Filter { must, should: Vec::new(), must_not: Vec::new(), min_should: None };
		let query = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector))
			.filter(filter)
			.with_payload(true)
			.limit(u64::from(limit));
		let response = self.client.query(query).await?;
		let hits = response
			.result
			.iter()
			.filter_map(|point| {
				let hit = parse_hit(point.score, &point.payload);

				if hit.is_none() {
					warn!("Skipped a catalog hit with a malformed payload.");
				}

				hit
			})
			.collect();

		Ok(hits)
	}
}

fn parse_hit(score: f32, payload: &HashMap<String, Value>) -> Option<CatalogHit> {
	let field_id = payload_str(payload, "field_id")?;
	let category = FieldCategory::parse(&payload_str(payload, "category")?)?;

	Some(CatalogHit {
		field_id,
		score,
		category,
		display_name: payload_str(payload, "display_name").unwrap_or_default(),
		field_name: payload_str(payload, "field_name").unwrap_or_default(),
		parent_event_id: payload_str(payload, "parent_event_id"),
		description: payload_str(payload, "description").unwrap_or_default(),
	})
}

fn payload_str(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	let value = payload.get(key)?;
	match &value.kind {
		Some(Kind::StringValue(text)) => Some(text.clone()),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn payload_with(entries: &[(&str, &str)]) -> HashMap<String, Value> {
		entries
			.iter()
			.map(|(key, value)| {
				(key.to_string(), Value { kind: Some(Kind::StringValue(value.to_string())) })
			})
			.collect()
	}

	#[test]
	fn parses_a_complete_payload() {
		let payload = payload_with(&[
			("field_id", "evtattr_amount"),
			("category", "event_attribute"),
			("parent_event_id", "evt_purchase"),
			("display_name", "Order amount"),
			("field_name", "amount"),
			("description", "Total paid for one order."),
		]);
		let hit = parse_hit(0.91, &payload).expect("Expected a parsed hit.");

		assert_eq!(hit.field_id, "evtattr_amount");
		assert_eq!(hit.category, FieldCategory::EventAttribute);
		assert_eq!(hit.parent_event_id.as_deref(), Some("evt_purchase"));
		assert_eq!(hit.score, 0.91);
	}

	#[test]
	fn rejects_payloads_without_identity() {
		let missing_id = payload_with(&[("category", "event")]);
		let unknown_category = payload_with(&[("field_id", "x"), ("category", "segment")]);

		assert!(parse_hit(0.5, &missing_id).is_none());
		assert!(parse_hit(0.5, &unknown_category).is_none());
	}

	#[test]
	fn tolerates_null_parent_event_id() {
		let mut payload = payload_with(&[("field_id", "prof_age"), ("category", "person_attribute")]);

		payload.insert("parent_event_id".to_string(), Value { kind: Some(Kind::NullValue(0)) });

		let hit = parse_hit(0.7, &payload).expect("Expected a parsed hit.");

		assert!(hit.parent_event_id.is_none());
	}
}
