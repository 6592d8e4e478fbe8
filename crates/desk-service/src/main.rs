//! Main entry point for the desk service.
//!
//! Loads the configuration, builds the engine with every shipped price
//! source, runs the demo scenario and prints its report as JSON.

use clap::Parser;
use desk_config::Config;
use desk_core::{DemoReport, DeskBuilder};
use std::path::{Path, PathBuf};

mod factory_registry;

use factory_registry::FactoryRegistry;

/// Command-line arguments for the desk service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, env = "DESK_CONFIG", default_value = "config/demo.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.with_writer(std::io::stderr)
		.init();

	tracing::info!("Started desk");

	let report = run(&args.config).await?;
	println!("{}", serde_json::to_string_pretty(&report)?);

	tracing::info!("Stopped desk");
	Ok(())
}

/// Loads the configuration at `config_path`, builds the engine and runs the
/// demo scenario.
async fn run(config_path: &Path) -> Result<DemoReport, Box<dyn std::error::Error>> {
	let config = Config::from_file(config_path).await?;
	tracing::info!("Loaded configuration [{}]", config.desk.id);

	let registry = FactoryRegistry::with_all_implementations();
	let engine = DeskBuilder::new(config).build(registry.desk_factories())?;

	let logger = engine.spawn_event_logger();
	let report = engine.run_demo().await;
	logger.abort();

	Ok(report?)
}
