use std::{collections::BTreeSet, path::PathBuf};

/// One question/answer pair, already rewritten and sanitized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
	pub front: String,
	pub back:  String,
}

impl Card {
	/// Builds a card, or nothing when either side is empty after trimming
	pub fn new(front: &str, back: &str) -> Option<Self> {
		let (front, back) = (front.trim(), back.trim());
		if front.is_empty() || back.is_empty() {
			return None;
		}
		Some(Self { front: front.to_string(), back: back.to_string() })
	}

	/// The fields in note model order
	pub fn fields(&self) -> [&str; 2] { [&self.front, &self.back] }
}

/// Everything one package is built from
#[derive(Debug, Clone, PartialEq)]
pub struct Deck {
	pub name:        String,
	pub cards:       Vec<Card>,
	pub media_files: BTreeSet<PathBuf>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejects_blank_sides() {
		assert!(Card::new("q", "  ").is_none());
		assert!(Card::new("", "a").is_none());
		assert_eq!(Card::new(" q ", "a\n"), Some(Card { front: "q".into(), back: "a".into() }));
	}
}
