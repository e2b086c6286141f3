use serde_json::Value;
use tracing::warn;

use crate::ResolverService;

pub(crate) const DEFAULT_SYSTEM_PROMPT: &str = "\
You are an information extraction engine. You decompose audience descriptions \
into structured JSON. Reply with strict JSON only, no commentary.";

pub(crate) const DEFAULT_EXTRACTION_PROMPT: &str = r#"Analyze the text below, which describes a group of people, and extract:
1. Every static person attribute, into a "person_attributes" object. Derive each key from the text; each value must be a verbatim fragment of the text.
2. Every behavioral event, into a "behavioral_events" list. Each entry carries an "event_type" summarizing the action and an "attributes" object of key-value pairs scoped to that event.

Return strict JSON. When nothing can be extracted, return empty containers.

Text:
{query}"#;

impl ResolverService {
	/// Best-effort structured extraction. A provider failure degrades to
	/// `Value::Null`, which normalizes into an empty decomposition.
	pub(crate) async fn extract_structured(&self, query: &str) -> Value {
		let cfg = &self.cfg.providers.llm_extractor;
		let system = cfg.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT);
		let instruction = cfg
			.extraction_prompt
			.as_deref()
			.unwrap_or(DEFAULT_EXTRACTION_PROMPT)
			.replace("{query}", query);
		let messages = [
			serde_json::json!({ "role": "system", "content": system }),
			serde_json::json!({ "role": "user", "content": instruction }),
		];

		match self.providers.extractor.extract(cfg, &messages).await {
			Ok(payload) => payload,
			Err(err) => {
				warn!(error = %err, "Structured extraction failed; continuing with an empty decomposition.");

				Value::Null
			},
		}
	}
}
