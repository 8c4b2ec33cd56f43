use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	retrace_worker::run(retrace_worker::Args::parse()).await
}
