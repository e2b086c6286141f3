//! Shared fixtures for tests that exercise the resolution pipeline without
//! live collaborators.

use serde_json::Map;

use facet_config::{
	Cache, Config, EmbeddingProviderConfig, LlmProviderConfig, Providers, Search, Service, Storage,
	VectorStore,
};
use facet_domain::{CatalogField, FieldCategory};

/// Dimension used by the test vectors below; small enough to write one-hot
/// axes by hand.
pub const TEST_VECTOR_DIM: u32 = 8;

pub fn test_config() -> Config {
	Config {
		service: Service { log_level: "info".to_string() },
		storage: Storage {
			vector: VectorStore {
				url: "http://localhost:6334".to_string(),
				collection: "catalog_fields_test".to_string(),
				vector_dim: TEST_VECTOR_DIM,
			},
		},
		providers: Providers {
			embedding: EmbeddingProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://localhost".to_string(),
				api_key: "key".to_string(),
				path: "/v1/embeddings".to_string(),
				model: "test-embed".to_string(),
				dimensions: TEST_VECTOR_DIM,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			llm_extractor: LlmProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://localhost".to_string(),
				api_key: "key".to_string(),
				path: "/v1/chat/completions".to_string(),
				model: "test-extractor".to_string(),
				temperature: 0.1,
				timeout_ms: 1_000,
				default_headers: Map::new(),
				system_prompt: None,
				extraction_prompt: None,
			},
		},
		search: Search::default(),
		cache: Cache::default(),
	}
}

/// One-hot vector along `axis`, scaled by `value`. Dot products against these
/// give exact, hand-controllable similarity scores.
pub fn axis_vector(axis: usize, value: f32) -> Vec<f32> {
	let mut vector = vec![0.0; TEST_VECTOR_DIM as usize];

	vector[axis % TEST_VECTOR_DIM as usize] = value;

	vector
}

fn field(
	id: &str,
	category: FieldCategory,
	parent_event_id: Option<&str>,
	display_name: &str,
	field_name: &str,
	description: &str,
) -> CatalogField {
	CatalogField {
		id: id.to_string(),
		category,
		parent_event_id: parent_event_id.map(str::to_string),
		display_name: display_name.to_string(),
		field_name: field_name.to_string(),
		description: description.to_string(),
	}
}

/// A small bilingual catalog: three profile attributes, two events, and
/// event attributes that share a field name across both events.
pub fn catalog_fixture() -> Vec<CatalogField> {
	vec![
		field(
			"prof_age",
			FieldCategory::PersonAttribute,
			None,
			"年龄",
			"age",
			"用户的年龄信息 (user age in years)",
		),
		field(
			"prof_gender",
			FieldCategory::PersonAttribute,
			None,
			"性别",
			"gender",
			"用户性别 (user gender)",
		),
		field(
			"prof_city",
			FieldCategory::PersonAttribute,
			None,
			"城市",
			"city",
			"用户所在城市 (city of residence)",
		),
		field(
			"evt_purchase",
			FieldCategory::Event,
			None,
			"下单",
			"purchase",
			"用户下单购买商品 (user places an order)",
		),
		field(
			"evt_login",
			FieldCategory::Event,
			None,
			"登录",
			"login",
			"用户登录应用 (user signs in)",
		),
		field(
			"evtattr_purchase_amount",
			FieldCategory::EventAttribute,
			Some("evt_purchase"),
			"购买金额",
			"amount",
			"订单总金额 (total order amount)",
		),
		field(
			"evtattr_purchase_channel",
			FieldCategory::EventAttribute,
			Some("evt_purchase"),
			"下单渠道",
			"channel",
			"下单使用的渠道 (channel the order was placed through)",
		),
		field(
			"evtattr_login_channel",
			FieldCategory::EventAttribute,
			Some("evt_login"),
			"登录渠道",
			"channel",
			"登录使用的渠道 (channel the sign-in came from)",
		),
	]
}
