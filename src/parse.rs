use std::path::Path;

use quick_xml::{Reader, events::{BytesStart, Event}};
use tracing::{debug, info, instrument, warn};

use crate::{error::{ConvertError, Result}, rewrite::rewrite_placeholders, sanitize::{clean_html, has_content}, types::{blob::BlobMap, card::Card}};

const CARD_TAG: &[u8] = b"card";
const FIELD_TAG: &[u8] = b"rich-text";

/// The document could not be read as markup
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentError {
	pub position: u64,
	pub message:  String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Side {
	Front,
	Back,
}

/// Fields collected for the card currently open in the document
#[derive(Default)]
struct CardBuilder {
	depth: usize,
	front: String,
	back:  String,
	seen:  usize,
}

impl CardBuilder {
	fn is_open(&self) -> bool { self.depth > 0 }

	fn open(&mut self) {
		if self.depth == 0 {
			self.front.clear();
			self.back.clear();
		}
		self.depth += 1;
	}

	fn set(&mut self, side: Side, markup: String) {
		match side {
			Side::Front => self.front = markup,
			Side::Back => self.back = markup,
		}
	}

	/// Closes one card level, yielding the card once the outermost one ends
	fn close(&mut self) -> Option<Option<Card>> {
		self.depth = self.depth.checked_sub(1)?;
		if self.depth > 0 {
			return None;
		}

		self.seen += 1;
		Some(Card::new(&self.front, &self.back))
	}
}

fn is_tag(name: &[u8], tag: &[u8]) -> bool { name.eq_ignore_ascii_case(tag) }

/// Which side a `rich-text` element fills, if any. Broken attributes skip
/// the field rather than the whole document.
fn field_side(element: &BytesStart) -> Option<Side> {
	for attr in element.html_attributes() {
		let attr = match attr {
			Ok(attr) => attr,
			Err(e) => {
				warn!("Skipping field with malformed attribute: {}", e);
				return None;
			}
		};

		if !attr.key.as_ref().eq_ignore_ascii_case(b"name") {
			continue;
		}

		return match attr.unescape_value() {
			Ok(value) if value == "front" => Some(Side::Front),
			Ok(value) if value == "back" => Some(Side::Back),
			Ok(_) => None,
			Err(e) => {
				warn!("Skipping field with undecodable name: {}", e);
				None
			}
		};
	}
	None
}

/// Rewrites, sanitizes and trims one field's inner markup
pub fn render_field(raw: &str, blobs: &BlobMap) -> String {
	let cleaned = clean_html(&rewrite_placeholders(raw, blobs));
	let cleaned = cleaned.trim();
	if has_content(cleaned) { cleaned.to_string() } else { String::new() }
}

/// Pulls the front/back pairs out of an exported document, in document
/// order. Cards missing either side are left out.
pub fn extract_cards(document: &str, blobs: &BlobMap) -> std::result::Result<Vec<Card>, DocumentError> {
	let mut reader = Reader::from_str(document);
	// Field bodies are HTML, which is rarely balanced
	reader.config_mut().check_end_names = false;

	let fail = |reader: &Reader<&[u8]>, err: quick_xml::Error| DocumentError {
		position: reader.error_position(),
		message:  err.to_string(),
	};

	let mut builder = CardBuilder::default();
	let mut cards = Vec::new();

	loop {
		let event = reader.read_event().map_err(|err| fail(&reader, err))?;

		match event {
			Event::Eof if builder.is_open() => {
				return Err(DocumentError {
					position: reader.buffer_position(),
					message:  format!("card {} is never closed", builder.seen + 1),
				});
			}
			Event::Eof => break,

			Event::Start(e) if is_tag(e.name().as_ref(), CARD_TAG) => builder.open(),

			Event::End(e) if is_tag(e.name().as_ref(), CARD_TAG) => match builder.close() {
				Some(Some(card)) => {
					debug!("Extracted card {}", builder.seen);
					cards.push(card);
				}
				Some(None) => warn!("Dropping card {}: front or back is empty", builder.seen),
				None => {}
			},

			Event::Empty(e) if is_tag(e.name().as_ref(), CARD_TAG) => {
				builder.seen += 1;
				warn!("Dropping card {}: it has no fields", builder.seen);
			}

			Event::Start(e) if builder.is_open() && is_tag(e.name().as_ref(), FIELD_TAG) => {
				let raw = reader.read_text(e.name()).map_err(|err| fail(&reader, err))?;
				if let Some(side) = field_side(&e) {
					builder.set(side, render_field(&raw, blobs));
				}
			}

			Event::Empty(e) if builder.is_open() && is_tag(e.name().as_ref(), FIELD_TAG) => {
				if let Some(side) = field_side(&e) {
					builder.set(side, String::new());
				}
			}

			_ => {}
		}
	}

	Ok(cards)
}

/// Reads a deck document from disk and extracts its cards
#[instrument(skip(blobs))]
pub fn extract_cards_from_file(path: &Path, blobs: &BlobMap) -> Result<Vec<Card>> {
	let bytes = fs_err::read(path)?;
	let document = String::from_utf8(bytes).map_err(|e| ConvertError::Document {
		path:     path.to_path_buf(),
		position: e.utf8_error().valid_up_to() as u64,
		message:  e.utf8_error().to_string(),
	})?;

	let cards = extract_cards(&document, blobs).map_err(|e| ConvertError::Document {
		path:     path.to_path_buf(),
		position: e.position,
		message:  e.message,
	})?;

	info!("Extracted {} cards", cards.len());
	Ok(cards)
}
