mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Cache, Config, EmbeddingProviderConfig, LlmProviderConfig, Providers, Search, Service, Storage,
	VectorStore,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.storage.vector.collection.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.vector.collection must be non-empty.".to_string(),
		});
	}
	if cfg.storage.vector.vector_dim == 0 {
		return Err(Error::Validation {
			message: "storage.vector.vector_dim must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.vector.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.vector.vector_dim."
				.to_string(),
		});
	}

	for (label, value) in [
		("search.similarity_threshold", cfg.search.similarity_threshold),
		("search.group_ambiguity_threshold", cfg.search.group_ambiguity_threshold),
		("search.min_display_score", cfg.search.min_display_score),
	] {
		if !value.is_finite() || !(0.0..=1.0).contains(&value) {
			return Err(Error::Validation {
				message: format!("{label} must be in the range 0.0-1.0."),
			});
		}
	}

	if !cfg.search.ambiguity_margin.is_finite()
		|| cfg.search.ambiguity_margin <= 0.0
		|| cfg.search.ambiguity_margin > 1.0
	{
		return Err(Error::Validation {
			message: "search.ambiguity_margin must be greater than zero and at most 1.0."
				.to_string(),
		});
	}

	for (label, value) in [
		("search.attribute_limit", cfg.search.attribute_limit),
		("search.event_limit", cfg.search.event_limit),
		("search.event_attribute_limit", cfg.search.event_attribute_limit),
	] {
		if value == 0 {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero."),
			});
		}
	}

	if cfg.cache.enabled {
		if cfg.cache.ttl_secs == 0 {
			return Err(Error::Validation {
				message: "cache.ttl_secs must be greater than zero when the cache is enabled."
					.to_string(),
			});
		}
		if cfg.cache.max_entries == 0 {
			return Err(Error::Validation {
				message: "cache.max_entries must be greater than zero when the cache is enabled."
					.to_string(),
			});
		}
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("llm_extractor", &cfg.providers.llm_extractor.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg
		.providers
		.llm_extractor
		.system_prompt
		.as_deref()
		.map(|prompt| prompt.trim().is_empty())
		.unwrap_or(false)
	{
		cfg.providers.llm_extractor.system_prompt = None;
	}
	if cfg
		.providers
		.llm_extractor
		.extraction_prompt
		.as_deref()
		.map(|prompt| prompt.trim().is_empty())
		.unwrap_or(false)
	{
		cfg.providers.llm_extractor.extraction_prompt = None;
	}
}
