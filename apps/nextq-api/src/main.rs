use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = nextq_api::Args::parse();

	nextq_api::run(args).await
}
