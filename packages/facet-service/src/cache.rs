use std::{
	num::NonZeroUsize,
	sync::Mutex,
	time::{Duration, Instant},
};

use lru::LruCache;

use crate::{Error, Result, ResolverService};

/// Read-through embedding cache keyed by exact query text. Entries expire
/// after the configured TTL and the least recently used entry is evicted once
/// the cache is full. This is the only state shared across queries.
pub struct EmbeddingCache {
	entries: Option<Mutex<LruCache<String, CachedVector>>>,
	ttl: Duration,
}

struct CachedVector {
	vector: Vec<f32>,
	stored_at: Instant,
}

impl EmbeddingCache {
	pub fn new(cfg: &facet_config::Cache) -> Self {
		let entries = cfg
			.enabled
			.then(|| NonZeroUsize::new(cfg.max_entries))
			.flatten()
			.map(|capacity| Mutex::new(LruCache::new(capacity)));

		Self { entries, ttl: Duration::from_secs(cfg.ttl_secs) }
	}

	pub fn len(&self) -> usize {
		self.entries
			.as_ref()
			.map(|entries| entries.lock().unwrap_or_else(|err| err.into_inner()).len())
			.unwrap_or(0)
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn get(&self, text: &str) -> Option<Vec<f32>> {
		let entries = self.entries.as_ref()?;
		let mut entries = entries.lock().unwrap_or_else(|err| err.into_inner());
		let key = cache_key(text);

		match entries.get(&key) {
			Some(cached) if cached.stored_at.elapsed() < self.ttl => Some(cached.vector.clone()),
			Some(_) => {
				entries.pop(&key);

				None
			},
			None => None,
		}
	}

	fn put(&self, text: &str, vector: Vec<f32>) {
		let Some(entries) = self.entries.as_ref() else {
			return;
		};
		let mut entries = entries.lock().unwrap_or_else(|err| err.into_inner());

		entries.put(cache_key(text), CachedVector { vector, stored_at: Instant::now() });
	}
}

fn cache_key(text: &str) -> String {
	blake3::hash(text.as_bytes()).to_hex().to_string()
}

impl ResolverService {
	/// Embed a batch of texts through the cache: hits short-circuit, every
	/// miss goes to the provider in a single batched call, and vectors come
	/// back in input order.
	pub(crate) async fn embed_cached(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
		let mut resolved: Vec<Option<Vec<f32>>> =
			texts.iter().map(|text| self.cache.get(text)).collect();
		let missing: Vec<usize> = resolved
			.iter()
			.enumerate()
			.filter_map(|(index, slot)| slot.is_none().then_some(index))
			.collect();

		if !missing.is_empty() {
			let batch: Vec<String> = missing.iter().map(|&index| texts[index].clone()).collect();
			let vectors =
				self.providers.embedding.embed(&self.cfg.providers.embedding, &batch).await?;

			if vectors.len() != batch.len() {
				return Err(Error::Provider {
					message: format!(
						"Embedding provider returned {} vectors for {} inputs.",
						vectors.len(),
						batch.len(),
					),
				});
			}

			for (&index, vector) in missing.iter().zip(vectors) {
				if vector.len() != self.cfg.providers.embedding.dimensions as usize {
					return Err(Error::Provider {
						message: "Embedding vector dimension mismatch.".to_string(),
					});
				}

				self.cache.put(&texts[index], vector.clone());

				resolved[index] = Some(vector);
			}
		}

		Ok(resolved.into_iter().flatten().collect())
	}
}

#[cfg(test)]
mod tests {
	use std::sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	};

	use super::*;
	use crate::{BoxFuture, CatalogHit, CatalogSearch, EmbeddingProvider, Providers};
	use facet_config::EmbeddingProviderConfig;
	use facet_domain::FieldCategory;

	struct AxisEmbedding {
		calls: Arc<AtomicUsize>,
	}
	impl EmbeddingProvider for AxisEmbedding {
		fn embed<'a>(
			&'a self,
			cfg: &'a EmbeddingProviderConfig,
			texts: &'a [String],
		) -> BoxFuture<'a, crate::Result<Vec<Vec<f32>>>> {
			self.calls.fetch_add(1, Ordering::SeqCst);

			let dim = cfg.dimensions as usize;
			let vectors = texts
				.iter()
				.map(|text| {
					let mut vector = vec![0.0; dim];
					vector[text.len() % dim] = 1.0;
					vector
				})
				.collect();

			Box::pin(async move { Ok(vectors) })
		}
	}

	struct NoopCatalog;
	impl CatalogSearch for NoopCatalog {
		fn search<'a>(
			&'a self,
			_vector: Vec<f32>,
			_category: FieldCategory,
			_parent_event_id: Option<&'a str>,
			_limit: u32,
		) -> BoxFuture<'a, crate::Result<Vec<CatalogHit>>> {
			Box::pin(async move { Ok(Vec::new()) })
		}
	}

	struct NoopExtractor;
	impl crate::ExtractorProvider for NoopExtractor {
		fn extract<'a>(
			&'a self,
			_cfg: &'a facet_config::LlmProviderConfig,
			_messages: &'a [serde_json::Value],
		) -> BoxFuture<'a, crate::Result<serde_json::Value>> {
			Box::pin(async move { Ok(serde_json::Value::Null) })
		}
	}

	fn service_with_counter(cfg: facet_config::Config) -> (ResolverService, Arc<AtomicUsize>) {
		let calls = Arc::new(AtomicUsize::new(0));
		let providers = Providers::new(
			Arc::new(AxisEmbedding { calls: calls.clone() }),
			Arc::new(NoopExtractor),
		);
		let service = ResolverService::with_providers(cfg, Arc::new(NoopCatalog), providers);

		(service, calls)
	}

	fn texts(raw: &[&str]) -> Vec<String> {
		raw.iter().map(|text| text.to_string()).collect()
	}

	#[tokio::test]
	async fn second_lookup_is_served_from_cache() {
		let (service, calls) = service_with_counter(facet_testkit::test_config());
		let batch = texts(&["age", "gender"]);
		let first = service.embed_cached(&batch).await.expect("first embed failed");
		let second = service.embed_cached(&batch).await.expect("second embed failed");

		assert_eq!(first, second);
		assert_eq!(calls.load(Ordering::SeqCst), 1);
		assert_eq!(service.cache.len(), 2);
	}

	#[tokio::test]
	async fn mixed_batch_only_embeds_misses() {
		let (service, calls) = service_with_counter(facet_testkit::test_config());

		service.embed_cached(&texts(&["age"])).await.expect("warmup embed failed");

		let batch = texts(&["city", "age", "gender"]);
		let vectors = service.embed_cached(&batch).await.expect("mixed embed failed");

		assert_eq!(vectors.len(), 3);
		assert_eq!(calls.load(Ordering::SeqCst), 2);
	}

	#[tokio::test]
	async fn zero_ttl_expires_immediately() {
		let mut cfg = facet_testkit::test_config();

		cfg.cache.ttl_secs = 0;

		let (service, calls) = service_with_counter(cfg);
		let batch = texts(&["age"]);

		service.embed_cached(&batch).await.expect("first embed failed");
		service.embed_cached(&batch).await.expect("second embed failed");

		assert_eq!(calls.load(Ordering::SeqCst), 2);
	}

	#[tokio::test]
	async fn capacity_bound_evicts_least_recently_used() {
		let mut cfg = facet_testkit::test_config();

		cfg.cache.max_entries = 2;

		let (service, calls) = service_with_counter(cfg);

		service.embed_cached(&texts(&["a", "bb"])).await.expect("warmup embed failed");
		// Touch "a" so "bb" becomes the eviction victim.
		service.embed_cached(&texts(&["a"])).await.expect("touch embed failed");
		service.embed_cached(&texts(&["ccc"])).await.expect("evicting embed failed");
		service.embed_cached(&texts(&["a"])).await.expect("cached embed failed");

		assert_eq!(calls.load(Ordering::SeqCst), 2);

		service.embed_cached(&texts(&["bb"])).await.expect("refetched embed failed");

		assert_eq!(calls.load(Ordering::SeqCst), 3);
	}

	#[tokio::test]
	async fn disabled_cache_always_calls_the_provider() {
		let mut cfg = facet_testkit::test_config();

		cfg.cache.enabled = false;

		let (service, calls) = service_with_counter(cfg);
		let batch = texts(&["age"]);

		service.embed_cached(&batch).await.expect("first embed failed");
		service.embed_cached(&batch).await.expect("second embed failed");

		assert_eq!(calls.load(Ordering::SeqCst), 2);
		assert!(service.cache.is_empty());
	}
}
