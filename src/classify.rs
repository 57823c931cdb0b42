use std::{collections::BTreeSet, io::Read, path::{Path, PathBuf}, sync::LazyLock};

use fs_err as fs;
use regex::Regex;
use tracing::{debug, info, instrument};

use crate::{error::{ConvertError, Result}, staging::StagingArea, types::blob::{Blob, BlobKind, BlobMap}};

/// How many leading bytes are read to sniff a blob
pub const SIGNATURE_LEN: u64 = 10;

const GENERIC_BINARY_EXTENSION: &str = ".bin";

static CONTENT_ID: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^[a-f0-9]{32}$").expect("content id pattern is valid"));

/// Checked in order, the first matching signature decides the kind
const SIGNATURES: &[(&[u8], BlobKind)] = &[
	(b"\xFF\xD8\xFF", BlobKind::Jpeg),
	(b"\x89PNG", BlobKind::Png),
	(b"GIF8", BlobKind::Gif),
	(b"RIFF", BlobKind::Webp),
	(b"ID3", BlobKind::Mp3),
];

/// Sniffs a blob's kind from its leading bytes
pub fn classify(header: &[u8]) -> BlobKind {
	let header = &header[..header.len().min(SIGNATURE_LEN as usize)];
	SIGNATURES
		.iter()
		.find(|(magic, _)| header.starts_with(magic))
		.map(|(_, kind)| *kind)
		.unwrap_or(BlobKind::Unknown)
}

/// Whether a directory entry name looks like an exported blob
pub fn is_blob_candidate(file_name: &str) -> bool {
	CONTENT_ID.is_match(file_name) || file_name.ends_with(GENERIC_BINARY_EXTENSION)
}

fn read_signature(path: &Path) -> Result<Vec<u8>> {
	let mut header = Vec::with_capacity(SIGNATURE_LEN as usize);
	fs::File::open(path)?.take(SIGNATURE_LEN).read_to_end(&mut header)?;
	Ok(header)
}

fn blob_id(path: &Path) -> String {
	path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
}

/// Reads and classifies a single candidate
#[instrument]
pub fn classify_file(path: &Path) -> Result<Blob> {
	let kind = classify(&read_signature(path)?);
	Ok(Blob { id: blob_id(path), raw_path: path.to_path_buf(), kind })
}

/// Classifies every blob in `blob_dir` and copies it into the staging area
/// under its canonical name. A missing directory means a deck without media.
#[instrument(skip(staging))]
pub fn classify_and_stage(
	blob_dir: &Path,
	staging: &StagingArea,
) -> Result<(BlobMap, BTreeSet<PathBuf>)> {
	let mut blob_map = BlobMap::new();
	let mut media_files = BTreeSet::new();

	if !blob_dir.is_dir() {
		info!("No blob folder found, deck has no media");
		return Ok((blob_map, media_files));
	}

	let mut candidates = Vec::new();
	for entry in fs::read_dir(blob_dir)? {
		let path = entry?.path();
		let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();

		if is_blob_candidate(&name) && path.is_file() {
			candidates.push(path);
		} else {
			debug!("Ignoring {:?}", path);
		}
	}
	candidates.sort();

	for path in candidates {
		let blob = classify_file(&path)?;
		let file_name = blob.file_name();
		let staged = staging.file_path(&file_name);

		debug!("Blob {} detected as {:?}, copying to {:?}", blob.id, blob.kind, staged);
		std::fs::copy(&blob.raw_path, &staged).map_err(|source| ConvertError::Stage {
			from: blob.raw_path.clone(),
			to: staged.clone(),
			source,
		})?;

		blob_map.insert(blob.id, file_name);
		media_files.insert(staged);
	}

	info!("Staged {} blobs", blob_map.len());
	Ok((blob_map, media_files))
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	const JPEG_ID: &str = "0123456789abcdef0123456789abcdef";

	#[rstest]
	#[case(b"\xFF\xD8\xFF\xE0\x00\x10JFIF", BlobKind::Jpeg)]
	#[case(b"\x89PNG\r\n\x1a\n", BlobKind::Png)]
	#[case(b"GIF89a", BlobKind::Gif)]
	#[case(b"GIF87a", BlobKind::Gif)]
	#[case(b"RIFF\x24\x00\x00\x00WEBP", BlobKind::Webp)]
	#[case(b"RIFF\x24\x00\x00\x00WAVE", BlobKind::Webp)]
	#[case(b"ID3\x04\x00", BlobKind::Mp3)]
	#[case(b"\xFF\xFB\x90\x00", BlobKind::Unknown)]
	#[case(b"", BlobKind::Unknown)]
	#[case(b"\xFF\xD8", BlobKind::Unknown)]
	fn sniffs_signatures(#[case] header: &[u8], #[case] expected: BlobKind) {
		assert_eq!(classify(header), expected);
	}

	#[rstest]
	#[case(b"\xFF\xD8\xFF", BlobKind::Jpeg)]
	#[case(b"\x89PNG", BlobKind::Png)]
	#[case(b"ID3", BlobKind::Mp3)]
	fn trailing_bytes_do_not_matter(#[case] magic: &[u8], #[case] expected: BlobKind) {
		let tails: [&[u8]; 4] = [b"", b"\x00\x00\x00\x00\x00\x00\x00", b"GIF8RIFFID3\xFF\xD8\xFF", &[0xAB; 4096]];
		for tail in tails {
			let mut bytes = magic.to_vec();
			bytes.extend_from_slice(tail);
			assert_eq!(classify(&bytes), expected);
		}
	}

	#[test]
	fn signature_is_limited_to_leading_bytes() {
		let mut bytes = vec![0u8; SIGNATURE_LEN as usize];
		bytes.extend_from_slice(b"\x89PNG");
		assert_eq!(classify(&bytes), BlobKind::Unknown);
	}

	#[rstest]
	#[case(JPEG_ID, true)]
	#[case("whatever.bin", true)]
	#[case("0123456789ABCDEF0123456789ABCDEF", false)]
	#[case("0123456789abcdef0123456789abcde", false)]
	#[case("0123456789abcdef0123456789abcdef.png", false)]
	#[case(".DS_Store", false)]
	fn recognises_candidates(#[case] name: &str, #[case] expected: bool) {
		assert_eq!(is_blob_candidate(name), expected);
	}

	#[test]
	fn missing_blob_dir_is_empty() {
		let root = tempfile::tempdir().unwrap();
		let staging = StagingArea::create(Some(root.path())).unwrap();

		let (map, files) = classify_and_stage(&root.path().join("blobs"), &staging).unwrap();
		assert!(map.is_empty());
		assert!(files.is_empty());
	}

	#[test]
	fn stages_every_candidate_once() {
		let root = tempfile::tempdir().unwrap();
		let blob_dir = root.path().join("blobs");
		fs::create_dir(&blob_dir).unwrap();
		fs::write(blob_dir.join(JPEG_ID), b"\xFF\xD8\xFF\xE0rest").unwrap();
		fs::write(blob_dir.join("cafe.bin"), b"ID3\x03\x00").unwrap();
		fs::write(blob_dir.join("beef.bin"), b"plain text").unwrap();
		fs::write(blob_dir.join(".DS_Store"), b"\x00\x00").unwrap();
		fs::write(blob_dir.join("notes.txt"), b"GIF89a").unwrap();

		let staging = StagingArea::create(Some(root.path())).unwrap();
		let (map, files) = classify_and_stage(&blob_dir, &staging).unwrap();

		assert_eq!(map.len(), 3);
		assert_eq!(files.len(), 3);
		assert_eq!(map.get(JPEG_ID), Some(format!("{JPEG_ID}.jpg").as_str()));
		assert_eq!(map.get("cafe"), Some("cafe.mp3"));
		assert_eq!(map.get("beef"), Some("beef.bin"));

		let staged_jpeg = staging.file_path(&format!("{JPEG_ID}.jpg"));
		assert!(files.contains(&staged_jpeg));
		assert_eq!(fs::read(staged_jpeg).unwrap(), b"\xFF\xD8\xFF\xE0rest");
	}

	#[test]
	fn copy_failure_is_fatal() {
		let root = tempfile::tempdir().unwrap();
		let blob_dir = root.path().join("blobs");
		fs::create_dir(&blob_dir).unwrap();
		fs::write(blob_dir.join("cafe.bin"), b"ID3").unwrap();

		let staging = StagingArea::create(Some(root.path())).unwrap();
		// Occupy the target name with a directory so the copy cannot land
		fs::create_dir(staging.file_path("cafe.mp3")).unwrap();

		let result = classify_and_stage(&blob_dir, &staging);
		assert!(matches!(result, Err(ConvertError::Stage { .. })));
	}
}
