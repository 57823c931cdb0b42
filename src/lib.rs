use std::path::{Path, PathBuf};

use tracing::{error, info, instrument, warn};

use crate::{classify::classify_and_stage, deck_locator::{find_deck_folders, scan_deck_folder}, error::{ConvertError, Result}, package::PackageWriter, parse::extract_cards_from_file, staging::StagingArea, types::{card::Deck, config::{Config, ErrorPolicy}}};

pub mod classify;
pub mod deck_locator;
pub mod error;
pub mod id_generator;
pub mod package;
pub mod parse;
pub mod rewrite;
pub mod sanitize;
pub mod staging;
pub mod types;

/// Converts one deck folder into one package in the configured output
/// directory. The deck's media is staged in a scratch directory that is gone
/// once this returns.
#[instrument(skip(config, writer))]
pub fn convert_deck(deck_path: &Path, config: &Config, writer: &dyn PackageWriter) -> Result<PathBuf> {
	let source = scan_deck_folder(deck_path)?;
	info!("Starting conversion of deck {}", source.name);

	let staging = StagingArea::create(config.staging_root.as_deref())?;
	let (blob_map, media_files) = classify_and_stage(&source.blob_dir, &staging)?;
	let cards = extract_cards_from_file(&source.document, &blob_map)?;

	let deck = Deck { name: source.name, cards, media_files };
	writer.write(&deck, &config.output_dir)
}

/// Outcome of a run over every deck folder
#[derive(Debug, Default)]
pub struct RunSummary {
	pub converted: Vec<PathBuf>,
	pub failed:    Vec<(PathBuf, ConvertError)>,
}

impl RunSummary {
	pub fn is_success(&self) -> bool { self.failed.is_empty() }
}

/// Converts every deck under `config.decks_dir`, one after another
#[instrument(skip_all, fields(decks_dir = ?config.decks_dir))]
pub fn run(config: &Config, writer: &dyn PackageWriter) -> Result<RunSummary> {
	let folders = find_deck_folders(&config.decks_dir)?;
	fs_err::create_dir_all(&config.output_dir)?;

	let mut summary = RunSummary::default();
	let delay = config.deck_delay();

	for (index, folder) in folders.iter().enumerate() {
		match convert_deck(folder, config, writer) {
			Ok(package) => summary.converted.push(package),
			Err(e) if config.on_deck_error == ErrorPolicy::Halt => {
				error!("Deck {:?} failed, stopping: {}", folder, e);
				return Err(e);
			}
			Err(e) => {
				warn!("Deck {:?} failed, moving on: {}", folder, e);
				summary.failed.push((folder.clone(), e));
			}
		}

		if !delay.is_zero() && index + 1 < folders.len() {
			info!("Waiting {:?} before the next deck", delay);
			std::thread::sleep(delay);
		}
	}

	info!("Converted {} decks, {} failed", summary.converted.len(), summary.failed.len());
	Ok(summary)
}
