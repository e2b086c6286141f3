use std::{fs, path::PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre;
use tracing_subscriber::EnvFilter;

use facet_catalog::CatalogStore;
use facet_service::ResolverService;

#[derive(Debug, Parser)]
#[command(version, rename_all = "kebab")]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Resolve a free-text query against the catalog.
	Resolve {
		query: String,
		/// Print the machine-readable JSON form instead of the summary.
		#[arg(long)]
		json: bool,
	},
	/// Embed and upsert catalog fields from a JSON file.
	Ingest { catalog: PathBuf },
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let cfg = facet_config::load(&args.config)?;
	init_tracing(&cfg)?;

	match args.command {
		Command::Resolve { query, json } => resolve(cfg, &query, json).await,
		Command::Ingest { catalog } => ingest(cfg, &catalog).await,
	}
}

async fn resolve(cfg: facet_config::Config, query: &str, json: bool) -> color_eyre::Result<()> {
	let store = CatalogStore::new(&cfg.storage.vector)?;
	let service = ResolverService::new(cfg, store);
	let result = service.resolve(query).await;

	if json {
		println!("{}", serde_json::to_string_pretty(&result.to_value())?);

		return Ok(());
	}

	println!("{}", result.summary);

	for fields in [&result.profile_attributes, &result.events, &result.event_attributes] {
		for field in fields {
			let ambiguity = if field.ambiguous_with_sibling { " (ambiguous)" } else { "" };

			println!(
				"[{}] {} -> {} ({}, score {:.3}){ambiguity}",
				field.category.label(),
				field.source_query,
				field.display_name,
				field.confidence.as_str(),
				field.score,
			);
		}
	}

	println!(
		"confidence {:.3}, {} results in {:.2}s",
		result.confidence_score, result.total_results, result.execution_time,
	);

	Ok(())
}

async fn ingest(cfg: facet_config::Config, catalog: &PathBuf) -> color_eyre::Result<()> {
	let raw = fs::read_to_string(catalog)?;
	let fields: Vec<facet_domain::CatalogField> = serde_json::from_str(&raw)?;

	if fields.is_empty() {
		return Err(eyre::eyre!("Catalog file contains no fields."));
	}

	let store = CatalogStore::new(&cfg.storage.vector)?;

	store.ensure_collection().await?;

	let texts: Vec<String> = fields.iter().map(|field| field.description.clone()).collect();
	let vectors = facet_providers::embedding::embed(&cfg.providers.embedding, &texts).await?;

	store.upsert_fields(&fields, &vectors).await?;

	tracing::info!(count = fields.len(), "Catalog fields ingested.");

	Ok(())
}

fn init_tracing(cfg: &facet_config::Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&cfg.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::fmt().with_env_filter(filter).init();
	Ok(())
}
