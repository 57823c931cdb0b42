use std::{path::{Path, PathBuf}, time::Duration};

use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::error::{ConvertError, Result};

/// Environment variable pointing at an explicit configuration file
pub const CONFIG_ENV: &str = "ALGODECK_CONFIG";

/// Configuration file picked up from the working directory when present
pub const DEFAULT_CONFIG_FILE: &str = "algodeck.toml";

/// What the driver does once a deck fails to convert
#[derive(Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
	/// Log the failure and move on to the next deck
	#[default]
	Skip,
	/// Stop the whole run at the first failing deck
	Halt,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
	pub decks_dir:     PathBuf,
	pub output_dir:    PathBuf,
	// Parent for the per-deck staging directories, the system temp dir when unset
	pub staging_root:  Option<PathBuf>,
	pub deck_delay_ms: u64,
	pub on_deck_error: ErrorPolicy,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			decks_dir:     PathBuf::from("algo_decks"),
			output_dir:    PathBuf::from("output"),
			staging_root:  None,
			deck_delay_ms: 0,
			on_deck_error: ErrorPolicy::Skip,
		}
	}
}

impl Config {
	pub fn deck_delay(&self) -> Duration { Duration::from_millis(self.deck_delay_ms) }

	#[instrument]
	pub fn from_file(path: &Path) -> Result<Self> {
		debug!("Reading configuration from {:?}", path);
		let content = fs_err::read_to_string(path)?;
		toml::from_str(&content)
			.map_err(|source| ConvertError::Config { path: path.to_path_buf(), source })
	}

	/// Resolves the configuration for a run: an explicit file from the
	/// environment, then `algodeck.toml` in the working directory, then the
	/// defaults.
	#[instrument]
	pub fn load() -> Result<Self> {
		if let Some(path) = std::env::var_os(CONFIG_ENV) {
			return Self::from_file(Path::new(&path));
		}

		let local = Path::new(DEFAULT_CONFIG_FILE);
		if local.is_file() {
			return Self::from_file(local);
		}

		info!("No configuration file found, using defaults");
		Ok(Self::default())
	}
}

/// A card template of the note model
#[derive(Clone, PartialEq, Debug)]
pub struct Template {
	pub name:            &'static str,
	pub order:           i32,
	pub question_format: &'static str,
	pub answer_format:   &'static str,
}

/// The one presentation every generated package shares
#[derive(Clone, PartialEq, Debug)]
pub struct CardLayout {
	pub model_name: &'static str,
	pub fields:     [&'static str; 2],
	pub template:   Template,
	pub css:        &'static str,
}

pub const FRONT_BACK_LAYOUT: CardLayout = CardLayout {
	model_name: "Front Back Model with Embeded Media",
	fields:     ["Question", "Answer"],
	template:   Template {
		name:            "Card 1",
		order:           0,
		question_format: "{{Question}}",
		answer_format:   "{{FrontSide}}<hr id='answer'>{{Answer}}",
	},
	css:        r#"
.card {
    font-family: arial;
    font-size: 20px;
    text-align: center;
    color: black;
    background-color: white;
}
"#,
};
