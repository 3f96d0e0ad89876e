use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = notemaker_api::Args::parse();

	notemaker_api::run(args).await
}
