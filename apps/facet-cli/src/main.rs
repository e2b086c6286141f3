use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = facet_cli::Args::parse();
	facet_cli::run(args).await
}
