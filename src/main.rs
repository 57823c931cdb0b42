use algodeck::{package::ApkgWriter, run, types::config::Config};
use eyre::{Result, bail};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
	color_eyre::install()?;
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	let config = Config::load()?;
	info!("Looking for decks in {:?}", config.decks_dir);

	let summary = run(&config, &ApkgWriter::default())?;

	for package in &summary.converted {
		info!("Created {:?}", package);
	}
	for (folder, e) in &summary.failed {
		error!("{:?}: {}", folder, e);
	}

	if !summary.is_success() {
		bail!("{} of {} decks failed to convert", summary.failed.len(), summary.failed.len() + summary.converted.len());
	}
	Ok(())
}
