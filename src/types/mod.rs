pub mod anki;
pub mod blob;
pub mod card;
pub mod config;
