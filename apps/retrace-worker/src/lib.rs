use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

pub mod worker;

#[derive(Debug, Parser)]
#[command(
	version = retrace_cli::VERSION,
	rename_all = "kebab",
	styles = retrace_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: std::path::PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Index on a schedule until interrupted.
	Run,
	/// Run one indexing cycle, then exit.
	Scan,
	/// Search the index and print the response as JSON.
	Search { query: String },
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = retrace_config::load(&args.config)?;
	let filter = EnvFilter::new(config.service.log_level.clone());

	tracing_subscriber::fmt().with_env_filter(filter).init();

	let service = worker::build_service(config)?;

	match args.command {
		Command::Run => worker::run_worker(&service).await,
		Command::Scan => worker::scan_once(&service).await,
		Command::Search { query } => worker::search(&service, &query).await,
	}
}
