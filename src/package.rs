//! Serializes a converted deck into an Anki `.apkg` package.

use std::{collections::BTreeMap, io::Write, path::{Path, PathBuf}};

use rusqlite::{Connection, params};
use sha1::{Digest, Sha1};
use tracing::{debug, info, instrument};
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use crate::{error::{ConvertError, Result}, id_generator::{self, TimestampIds}, sanitize::strip_html, types::{anki::{CollectionConf, DEFAULT_CONF_ID, DEFAULT_DECK_ID, Deck as AnkiDeck, DeckConfig, NoteModel, keyed}, card::Deck, config::{CardLayout, FRONT_BACK_LAYOUT}}};

pub const PACKAGE_EXTENSION: &str = "apkg";

const COLLECTION_ENTRY: &str = "collection.anki2";
const MEDIA_ENTRY: &str = "media";
const FIELD_SEPARATOR: &str = "\u{1f}";

const SCHEMA: &str = r#"
CREATE TABLE col (
    id              integer primary key,
    crt             integer not null,
    mod             integer not null,
    scm             integer not null,
    ver             integer not null,
    dty             integer not null,
    usn             integer not null,
    ls              integer not null,
    conf            text not null,
    models          text not null,
    decks           text not null,
    dconf           text not null,
    tags            text not null
);
CREATE TABLE notes (
    id              integer primary key,
    guid            text not null,
    mid             integer not null,
    mod             integer not null,
    usn             integer not null,
    tags            text not null,
    flds            text not null,
    sfld            integer not null,
    csum            integer not null,
    flags           integer not null,
    data            text not null
);
CREATE TABLE cards (
    id              integer primary key,
    nid             integer not null,
    did             integer not null,
    ord             integer not null,
    mod             integer not null,
    usn             integer not null,
    type            integer not null,
    queue           integer not null,
    due             integer not null,
    ivl             integer not null,
    factor          integer not null,
    reps            integer not null,
    lapses          integer not null,
    left            integer not null,
    odue            integer not null,
    odid            integer not null,
    flags           integer not null,
    data            text not null
);
CREATE TABLE revlog (
    id              integer primary key,
    cid             integer not null,
    usn             integer not null,
    ease            integer not null,
    ivl             integer not null,
    lastIvl         integer not null,
    factor          integer not null,
    time            integer not null,
    type            integer not null
);
CREATE TABLE graves (
    usn             integer not null,
    oid             integer not null,
    type            integer not null
);
CREATE INDEX ix_notes_usn on notes (usn);
CREATE INDEX ix_cards_usn on cards (usn);
CREATE INDEX ix_revlog_usn on revlog (usn);
CREATE INDEX ix_cards_nid on cards (nid);
CREATE INDEX ix_cards_sched on cards (did, queue, due);
CREATE INDEX ix_revlog_cid on revlog (cid);
CREATE INDEX ix_notes_csum on notes (csum);
"#;

/// Turns a converted deck into one artifact on disk
pub trait PackageWriter {
	/// Writes the package for `deck` into `output_dir` and returns its path.
	/// Nothing is left in `output_dir` when this fails.
	fn write(&self, deck: &Deck, output_dir: &Path) -> Result<PathBuf>;
}

/// Path of the package a deck is written to
pub fn package_path(output_dir: &Path, deck_name: &str) -> PathBuf {
	output_dir.join(format!("{deck_name}.{PACKAGE_EXTENSION}"))
}

/// Anki's duplicate-detection checksum: the first 8 hex digits of the SHA-1
/// of the sort field
pub fn field_checksum(sort_field: &str) -> i64 {
	let digest = Sha1::digest(sort_field.as_bytes());
	u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]) as i64
}

/// A media file as it is bundled: original name and content
struct MediaEntry {
	name:  String,
	bytes: Vec<u8>,
}

fn read_media(media_files: impl IntoIterator<Item = impl AsRef<Path>>) -> Result<Vec<MediaEntry>> {
	media_files
		.into_iter()
		.map(|path| {
			let path = path.as_ref();
			let bytes = std::fs::read(path)
				.map_err(|source| ConvertError::MediaUnreadable { path: path.to_path_buf(), source })?;
			let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
			Ok(MediaEntry { name, bytes })
		})
		.collect()
}

/// Writes `.apkg` files: a ZIP holding a schema 11 collection, the media
/// manifest and the numbered media files
#[derive(Debug, Clone)]
pub struct ApkgWriter {
	layout: CardLayout,
}

impl Default for ApkgWriter {
	fn default() -> Self { Self { layout: FRONT_BACK_LAYOUT } }
}

impl ApkgWriter {
	/// Creates the collection database for `deck` at `db_path`
	#[instrument(skip(self, deck))]
	fn build_collection(&self, deck: &Deck, db_path: &Path) -> Result<()> {
		let model_id = id_generator::random_id();
		let deck_id = loop {
			let id = id_generator::random_id();
			if id != model_id {
				break id;
			}
		};
		debug!("Model id {}, deck id {}", model_id, deck_id);

		let now = id_generator::now_secs();
		let mut ids = TimestampIds::starting_now();
		let host_uuid = id_generator::create_host_uuid(&deck.name);

		let model = NoteModel::from_layout(&self.layout, model_id, deck_id, now);
		let models = serde_json::to_string(&keyed([(model_id, model)]))?;
		let decks = serde_json::to_string(&keyed([
			(DEFAULT_DECK_ID, AnkiDeck::fallback(now)),
			(deck_id, AnkiDeck::new(deck_id, &deck.name, now)),
		]))?;
		let dconf = serde_json::to_string(&keyed([(DEFAULT_CONF_ID, DeckConfig::default())]))?;
		let conf = serde_json::to_string(&CollectionConf::new(deck_id, model_id, deck.cards.len() as i64 + 1))?;

		let mut conn = Connection::open(db_path)?;
		conn.execute_batch(SCHEMA)?;

		let tx = conn.transaction()?;
		tx.execute(
			"INSERT INTO col (id, crt, mod, scm, ver, dty, usn, ls, conf, models, decks, dconf, tags)
			 VALUES (1, ?1, ?2, ?3, 11, 0, 0, 0, ?4, ?5, ?6, ?7, '{}')",
			params![now, now * 1000, now * 1000, conf, models, decks, dconf],
		)?;

		{
			let mut insert_note = tx.prepare(
				"INSERT INTO notes (id, guid, mid, mod, usn, tags, flds, sfld, csum, flags, data)
				 VALUES (?1, ?2, ?3, ?4, -1, '', ?5, ?6, ?7, 0, '')",
			)?;
			let mut insert_card = tx.prepare(
				"INSERT INTO cards (id, nid, did, ord, mod, usn, type, queue, due, ivl, factor, reps, lapses, left, odue, odid, flags, data)
				 VALUES (?1, ?2, ?3, 0, ?4, -1, 0, 0, ?5, 0, 0, 0, 0, 0, 0, 0, 0, '')",
			)?;

			for (position, card) in deck.cards.iter().enumerate() {
				let fields = card.fields().join(FIELD_SEPARATOR);
				let sort_field = strip_html(&card.front);
				let guid = id_generator::generate_note_guid(&host_uuid, position, &fields);
				let (note_id, card_id) = (ids.next().unwrap_or_default(), ids.next().unwrap_or_default());

				insert_note.execute(params![
					note_id,
					guid,
					model_id,
					now,
					fields,
					sort_field,
					field_checksum(&sort_field)
				])?;
				insert_card.execute(params![card_id, note_id, deck_id, now, position as i64 + 1])?;
			}
		}

		tx.commit()?;
		info!("Wrote {} notes to the collection", deck.cards.len());
		Ok(())
	}
}

impl PackageWriter for ApkgWriter {
	#[instrument(skip(self, deck), fields(deck = %deck.name))]
	fn write(&self, deck: &Deck, output_dir: &Path) -> Result<PathBuf> {
		let media = read_media(&deck.media_files)?;

		let scratch = tempfile::tempdir()?;
		let db_path = scratch.path().join(COLLECTION_ENTRY);
		self.build_collection(deck, &db_path)?;
		let collection = fs_err::read(&db_path)?;

		fs_err::create_dir_all(output_dir)?;
		let mut staged = tempfile::NamedTempFile::new_in(output_dir)?;
		{
			let mut zip = ZipWriter::new(staged.as_file_mut());
			let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

			zip.start_file(COLLECTION_ENTRY, options)?;
			zip.write_all(&collection)?;

			let manifest: BTreeMap<String, &str> =
				media.iter().enumerate().map(|(index, entry)| (index.to_string(), entry.name.as_str())).collect();

			for (index, entry) in media.iter().enumerate() {
				debug!("Bundling {} as {}", entry.name, index);
				zip.start_file(index.to_string(), options)?;
				zip.write_all(&entry.bytes)?;
			}

			zip.start_file(MEDIA_ENTRY, options)?;
			zip.write_all(serde_json::to_string(&manifest)?.as_bytes())?;
			zip.finish()?;
		}

		let target = package_path(output_dir, &deck.name);
		staged.persist(&target).map_err(|e| ConvertError::Io(e.error))?;

		info!("Created package {:?} with {} media files", target, media.len());
		Ok(target)
	}
}
