pub mod aggregate;
pub mod cache;
pub mod extract;
pub mod resolve;
pub mod resolver;

mod error;

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;

pub use aggregate::{AggregatedResult, AmbiguousGroup, ResolvedField};
pub use cache::EmbeddingCache;
pub use error::{Error, Result};
pub use resolver::{Candidate, EventMatch, ResolvedMatch, StageOutcome};

pub use facet_catalog::CatalogHit;

use facet_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use facet_domain::FieldCategory;
use facet_providers::{embedding, extractor};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;
}

pub trait ExtractorProvider
where
	Self: Send + Sync,
{
	fn extract<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, Result<Value>>;
}

/// Boundary to the vector similarity store. Result ordering is unspecified;
/// the resolver stages always re-sort by score.
pub trait CatalogSearch
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		vector: Vec<f32>,
		category: FieldCategory,
		parent_event_id: Option<&'a str>,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<CatalogHit>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub extractor: Arc<dyn ExtractorProvider>,
}

pub struct ResolverService {
	pub cfg: Config,
	pub catalog: Arc<dyn CatalogSearch>,
	pub providers: Providers,
	pub(crate) cache: EmbeddingCache,
}

struct DefaultProviders;

struct QdrantCatalog {
	store: facet_catalog::CatalogStore,
}

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(async move {
			embedding::embed(cfg, texts)
				.await
				.map_err(|err| Error::Provider { message: err.to_string() })
		})
	}
}

impl ExtractorProvider for DefaultProviders {
	fn extract<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, Result<Value>> {
		Box::pin(async move {
			extractor::extract(cfg, messages)
				.await
				.map_err(|err| Error::Provider { message: err.to_string() })
		})
	}
}

impl CatalogSearch for QdrantCatalog {
	fn search<'a>(
		&'a self,
		vector: Vec<f32>,
		category: FieldCategory,
		parent_event_id: Option<&'a str>,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<CatalogHit>>> {
		Box::pin(async move {
			self.store
				.search(vector, category, parent_event_id, limit)
				.await
				.map_err(|err| Error::Catalog { message: err.to_string() })
		})
	}
}

impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>, extractor: Arc<dyn ExtractorProvider>) -> Self {
		Self { embedding, extractor }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);
		Self { embedding: provider.clone(), extractor: provider }
	}
}

impl ResolverService {
	pub fn new(cfg: Config, store: facet_catalog::CatalogStore) -> Self {
		let cache = EmbeddingCache::new(&cfg.cache);

		Self { cfg, catalog: Arc::new(QdrantCatalog { store }), providers: Providers::default(), cache }
	}

	pub fn with_providers(
		cfg: Config,
		catalog: Arc<dyn CatalogSearch>,
		providers: Providers,
	) -> Self {
		let cache = EmbeddingCache::new(&cfg.cache);

		Self { cfg, catalog, providers, cache }
	}
}
