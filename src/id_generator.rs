use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Lower bound of model/deck ids, keeps them clear of Anki's built-in ids
pub const MIN_RANDOM_ID: i64 = 1 << 30;
pub const MAX_RANDOM_ID: i64 = 1 << 31;

// Anki's guid alphabet
const BASE91: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!#$%&()*+,-./:;<=>?@[]^_`{|}~";

/// Id for a model or deck, drawn fresh on every build
pub fn random_id() -> i64 { rand::thread_rng().gen_range(MIN_RANDOM_ID..MAX_RANDOM_ID) }

/// Namespace for the note guids of one package build
#[instrument]
pub fn create_host_uuid(deck_name: &str) -> Uuid {
	let host = Uuid::new_v4();
	debug!("Host UUID for deck {}: {}", deck_name, host);
	host
}

/// Guid for a note, derived from its position and content within the build
#[instrument(skip(content))]
pub fn generate_note_guid(host_uuid: &Uuid, position: usize, content: &str) -> String {
	let name = format!("{position}\u{1f}{content}");
	let uuid = Uuid::new_v5(host_uuid, name.as_bytes());
	let (high, _) = uuid.as_u64_pair();
	encode_base91(high)
}

fn encode_base91(mut value: u64) -> String {
	let mut digits = Vec::new();
	loop {
		digits.push(BASE91[(value % BASE91.len() as u64) as usize]);
		value /= BASE91.len() as u64;
		if value == 0 {
			break;
		}
	}
	digits.reverse();
	String::from_utf8_lossy(&digits).into_owned()
}

/// Seconds since the epoch, Anki's `mod` columns
pub fn now_secs() -> i64 {
	SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or_default()
}

/// Hands out strictly increasing millisecond timestamps for note and card
/// ids, the way Anki allocates them
#[derive(Debug)]
pub struct TimestampIds {
	next: i64,
}

impl TimestampIds {
	pub fn starting_now() -> Self {
		let millis =
			SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as i64).unwrap_or_default();
		Self { next: millis }
	}

	pub fn starting_at(next: i64) -> Self { Self { next } }
}

impl Iterator for TimestampIds {
	type Item = i64;

	fn next(&mut self) -> Option<i64> {
		let id = self.next;
		self.next += 1;
		Some(id)
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use super::*;

	#[test]
	fn random_ids_stay_in_range() {
		for _ in 0..1000 {
			let id = random_id();
			assert!((MIN_RANDOM_ID..MAX_RANDOM_ID).contains(&id));
		}
	}

	#[test]
	fn guids_are_stable_within_a_build() {
		let host = Uuid::new_v4();
		assert_eq!(generate_note_guid(&host, 0, "q\u{1f}a"), generate_note_guid(&host, 0, "q\u{1f}a"));
	}

	#[test]
	fn guids_differ_by_position_content_and_build() {
		let host = Uuid::new_v4();
		let guids: HashSet<_> = [
			generate_note_guid(&host, 0, "q\u{1f}a"),
			generate_note_guid(&host, 1, "q\u{1f}a"),
			generate_note_guid(&host, 0, "q\u{1f}b"),
			generate_note_guid(&Uuid::new_v4(), 0, "q\u{1f}a"),
		]
		.into_iter()
		.collect();
		assert_eq!(guids.len(), 4);
	}

	#[test]
	fn base91_encoding() {
		assert_eq!(encode_base91(0), "a");
		assert_eq!(encode_base91(91), "ba");
		assert!(encode_base91(u64::MAX).bytes().all(|b| BASE91.contains(&b)));
	}

	#[test]
	fn timestamp_ids_increase() {
		let ids: Vec<_> = TimestampIds::starting_at(10).take(3).collect();
		assert_eq!(ids, vec![10, 11, 12]);
	}
}
