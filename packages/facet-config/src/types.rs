use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub cache: Cache,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub vector: VectorStore,
}

#[derive(Debug, Deserialize)]
pub struct VectorStore {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub llm_extractor: LlmProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
	/// Optional. Replaces the built-in extraction system prompt.
	pub system_prompt: Option<String>,
	/// Optional. Replaces the built-in extraction instruction; `{query}` is substituted.
	pub extraction_prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Search {
	pub similarity_threshold: f32,
	pub ambiguity_margin: f32,
	pub group_ambiguity_threshold: f32,
	pub min_display_score: f32,
	pub attribute_limit: u32,
	pub event_limit: u32,
	pub event_attribute_limit: u32,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			similarity_threshold: 0.65,
			ambiguity_margin: 0.05,
			group_ambiguity_threshold: 0.75,
			min_display_score: 0.65,
			attribute_limit: 5,
			event_limit: 5,
			event_attribute_limit: 5,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Cache {
	pub enabled: bool,
	pub ttl_secs: u64,
	pub max_entries: usize,
}
impl Default for Cache {
	fn default() -> Self {
		Self { enabled: true, ttl_secs: 3_600, max_entries: 1_024 }
	}
}
