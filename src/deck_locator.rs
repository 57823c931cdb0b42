use std::path::{Path, PathBuf};

use fs_err as fs;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{ConvertError, Result};

/// Finder metadata that shows up next to the deck folders
const IGNORED_ENTRIES: [&str; 1] = [".DS_Store"];

/// Name of the optional media directory inside a deck folder
pub const BLOB_DIR_NAME: &str = "blobs";

/// Where the pieces of one deck live on disk
#[derive(Debug, Clone, PartialEq)]
pub struct DeckSource {
	pub name:     String,
	pub document: PathBuf,
	pub blob_dir: PathBuf,
}

/// Lists every deck folder under `decks_dir`, in name order
#[instrument]
pub fn find_deck_folders(decks_dir: &Path) -> Result<Vec<PathBuf>> {
	info!("Searching for deck folders");

	if !decks_dir.is_dir() {
		error!("Decks folder is missing");
		return Err(ConvertError::NoDecksFolder(decks_dir.to_path_buf()));
	}

	let mut folders = Vec::new();
	for entry in fs::read_dir(decks_dir)? {
		let path = entry?.path();
		let ignored = path
			.file_name()
			.and_then(|n| n.to_str())
			.is_some_and(|name| IGNORED_ENTRIES.contains(&name));

		if ignored || !path.is_dir() {
			debug!("Skipping {:?}", path);
			continue;
		}
		folders.push(path);
	}

	folders.sort();
	info!("Found {} deck folders", folders.len());
	Ok(folders)
}

/// Locates the document and blob directory of one deck folder
#[instrument]
pub fn scan_deck_folder(deck_path: &Path) -> Result<DeckSource> {
	let mut documents = Vec::new();

	for entry in fs::read_dir(deck_path)? {
		let path = entry?.path();
		let is_xml = path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("xml"));

		if is_xml && path.is_file() {
			debug!("Found document: {:?}", path);
			documents.push(path);
		}
	}

	documents.sort();
	if documents.len() > 1 {
		warn!("Deck folder holds {} documents, using {:?}", documents.len(), documents[0]);
	}

	let document =
		documents.into_iter().next().ok_or_else(|| ConvertError::NoDocument(deck_path.to_path_buf()))?;

	Ok(DeckSource { name: deck_name(&document), blob_dir: deck_path.join(BLOB_DIR_NAME), document })
}

/// Deck name is the document's stem without trailing whitespace
pub fn deck_name(document: &Path) -> String {
	document.file_stem().map(|s| s.to_string_lossy().trim_end().to_string()).unwrap_or_default()
}
