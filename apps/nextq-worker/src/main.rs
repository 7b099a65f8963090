use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = nextq_worker::Args::parse();

	nextq_worker::run(args).await
}
