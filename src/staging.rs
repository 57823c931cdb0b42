use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, instrument};

use crate::error::Result;

/// Scratch directory holding one deck's renamed media. The directory and
/// everything in it is removed when the area is dropped.
#[derive(Debug)]
pub struct StagingArea {
	dir: TempDir,
}

impl StagingArea {
	/// Creates a fresh, empty staging directory, under `root` when given
	#[instrument]
	pub fn create(root: Option<&Path>) -> Result<Self> {
		let mut builder = tempfile::Builder::new();
		builder.prefix("algodeck-media-");

		let dir = match root {
			Some(root) => {
				fs_err::create_dir_all(root)?;
				builder.tempdir_in(root)?
			}
			None => builder.tempdir()?,
		};

		debug!("Staging media in {:?}", dir.path());
		Ok(Self { dir })
	}

	pub fn path(&self) -> &Path { self.dir.path() }

	pub fn file_path(&self, file_name: &str) -> PathBuf { self.dir.path().join(file_name) }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn directory_is_removed_on_drop() {
		let root = tempfile::tempdir().unwrap();
		let staging = StagingArea::create(Some(root.path())).unwrap();
		let path = staging.path().to_path_buf();

		fs_err::write(staging.file_path("a.png"), b"x").unwrap();
		assert!(path.join("a.png").is_file());

		drop(staging);
		assert!(!path.exists());
	}

	#[test]
	fn each_area_starts_empty() {
		let root = tempfile::tempdir().unwrap();
		let first = StagingArea::create(Some(root.path())).unwrap();
		fs_err::write(first.file_path("a.png"), b"x").unwrap();

		let second = StagingArea::create(Some(root.path())).unwrap();
		assert_ne!(first.path(), second.path());
		assert_eq!(fs_err::read_dir(second.path()).unwrap().count(), 0);
	}
}
