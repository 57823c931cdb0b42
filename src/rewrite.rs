use std::{borrow::Cow, sync::LazyLock};

use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::types::blob::{BlobMap, BlobRef};

static PLACEHOLDER: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\{\{blob ([a-f0-9]+)\}\}").expect("placeholder pattern is valid"));

/// Markup a placeholder is replaced with
pub fn render(id: &str, target: BlobRef<'_>) -> String {
	match target {
		BlobRef::Image(file) => format!(r#"<img src="{file}">"#),
		BlobRef::Audio(file) => format!(r#"<audio controls src="{file}"></audio>"#),
		BlobRef::Unknown(_) => format!("[unknown blob: {id}]"),
		BlobRef::Missing => format!("[missing or unknown blob: {id}]"),
	}
}

/// Replaces every `{{blob <id>}}` in `markup` with the tag for the blob it
/// names, or with a visible marker when the blob can't be embedded.
pub fn rewrite_placeholders<'a>(markup: &'a str, blobs: &BlobMap) -> Cow<'a, str> {
	PLACEHOLDER.replace_all(markup, |caps: &Captures| {
		let id = &caps[1];
		let target = blobs.resolve(id);

		match target {
			BlobRef::Missing => warn!("Card references missing blob {}", id),
			BlobRef::Unknown(file) => warn!("Blob {} has unrecognised type ({})", id, file),
			_ => debug!("Resolved blob {} to {:?}", id, target),
		}

		render(id, target)
	})
}
