use std::{collections::HashMap, path::PathBuf};

/// The sniffed type of a blob. Every kind maps to exactly one extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobKind {
	Jpeg,
	Png,
	Gif,
	// Any RIFF container lands here, WAVE included
	Webp,
	Mp3,
	Unknown,
}

impl BlobKind {
	pub fn extension(self) -> &'static str {
		match self {
			BlobKind::Jpeg => ".jpg",
			BlobKind::Png => ".png",
			BlobKind::Gif => ".gif",
			BlobKind::Webp => ".webp",
			BlobKind::Mp3 => ".mp3",
			BlobKind::Unknown => ".bin",
		}
	}
}

/// A classified blob, before or after staging
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
	pub id:       String,
	pub raw_path: PathBuf,
	pub kind:     BlobKind,
}

impl Blob {
	/// Canonical name of the staged copy
	pub fn file_name(&self) -> String { format!("{}{}", self.id, self.kind.extension()) }
}

const IMAGE_EXTENSIONS: [&str; 4] = [".jpg", ".png", ".gif", ".webp"];
const AUDIO_EXTENSIONS: [&str; 1] = [".mp3"];

/// What a placeholder id points at once looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobRef<'a> {
	Image(&'a str),
	Audio(&'a str),
	/// Staged, but under an extension the card can't embed
	Unknown(&'a str),
	Missing,
}

/// Blob id to staged filename, for one deck
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BlobMap(HashMap<String, String>);

impl BlobMap {
	pub fn new() -> Self { Self::default() }

	pub fn insert(&mut self, id: impl Into<String>, file_name: impl Into<String>) {
		self.0.insert(id.into(), file_name.into());
	}

	pub fn get(&self, id: &str) -> Option<&str> { self.0.get(id).map(String::as_str) }

	pub fn len(&self) -> usize { self.0.len() }

	pub fn is_empty(&self) -> bool { self.0.is_empty() }

	pub fn resolve(&self, id: &str) -> BlobRef<'_> {
		let Some(file_name) = self.get(id) else {
			return BlobRef::Missing;
		};

		if IMAGE_EXTENSIONS.iter().any(|ext| file_name.ends_with(ext)) {
			BlobRef::Image(file_name)
		} else if AUDIO_EXTENSIONS.iter().any(|ext| file_name.ends_with(ext)) {
			BlobRef::Audio(file_name)
		} else {
			BlobRef::Unknown(file_name)
		}
	}
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for BlobMap {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}
