use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
	#[error("No .xml document found in deck folder {0:?}")]
	NoDocument(PathBuf),

	#[error("Decks folder {0:?} does not exist")]
	NoDecksFolder(PathBuf),

	#[error("Malformed document {path:?} at byte {position}: {message}")]
	Document { path: PathBuf, position: u64, message: String },

	#[error("Failed to stage blob {from:?} as {to:?}")]
	Stage {
		from:   PathBuf,
		to:     PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Media file {path:?} is unreadable")]
	MediaUnreadable {
		path:   PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Invalid configuration in {path:?}: {source}")]
	Config {
		path:   PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error("SQLite error: {0}")]
	Sqlite(#[from] rusqlite::Error),

	#[error("ZIP error: {0}")]
	Zip(#[from] zip::result::ZipError),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConvertError>;
