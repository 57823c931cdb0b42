//! JSON shapes stored in the `col` row of a schema 11 Anki collection.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::config::CardLayout;

pub const DEFAULT_DECK_ID: i64 = 1;
pub const DEFAULT_CONF_ID: i64 = 1;

const LATEX_PRE: &str = "\\documentclass[12pt]{article}\n\\special{papersize=3in,5in}\n\\usepackage[utf8]{inputenc}\n\\usepackage{amssymb,amsmath}\n\\pagestyle{empty}\n\\setlength{\\parindent}{0in}\n\\begin{document}\n";
const LATEX_POST: &str = "\\end{document}";

// Anki's model type for plain front/back notes
const STANDARD_MODEL_TYPE: i32 = 0;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NoteModel {
	pub id:   i64,
	pub name: String,

	#[serde(rename = "type")]
	pub kind: i32,

	#[serde(rename = "mod")]
	pub modified: i64,
	pub usn:      i32,
	pub sortf:    i32,
	pub did:      i64,

	pub flds:  Vec<Field>,
	pub tmpls: Vec<Template>,
	pub css:   String,

	#[serde(rename = "latexPre")]
	pub latex_pre:  String,
	#[serde(rename = "latexPost")]
	pub latex_post: String,
	#[serde(rename = "latexsvg")]
	pub latex_svg:  bool,

	// Every template needs field 0 to be non-empty
	pub req:  Vec<(i32, String, Vec<i32>)>,
	pub tags: Vec<String>,
	pub vers: Vec<String>,
}

impl NoteModel {
	pub fn from_layout(layout: &CardLayout, id: i64, deck_id: i64, modified: i64) -> Self {
		let flds = layout
			.fields
			.iter()
			.enumerate()
			.map(|(ord, name)| Field {
				name:   name.to_string(),
				ord:    ord as i32,
				sticky: false,
				rtl:    false,
				font:   "Arial".to_string(),
				size:   20,
				media:  Vec::new(),
			})
			.collect();

		let tmpls = vec![Template {
			name:  layout.template.name.to_string(),
			ord:   layout.template.order,
			qfmt:  layout.template.question_format.to_string(),
			afmt:  layout.template.answer_format.to_string(),
			bqfmt: String::new(),
			bafmt: String::new(),
			did:   None,
		}];

		Self {
			id,
			name: layout.model_name.to_string(),
			kind: STANDARD_MODEL_TYPE,
			modified,
			usn: -1,
			sortf: 0,
			did: deck_id,
			flds,
			tmpls,
			css: layout.css.to_string(),
			latex_pre: LATEX_PRE.to_string(),
			latex_post: LATEX_POST.to_string(),
			latex_svg: false,
			req: vec![(0, "any".to_string(), vec![0])],
			tags: Vec::new(),
			vers: Vec::new(),
		}
	}
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Field {
	pub name:   String,
	pub ord:    i32,
	pub sticky: bool,
	pub rtl:    bool,
	pub font:   String,
	pub size:   i32,
	pub media:  Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Template {
	pub name:  String,
	pub ord:   i32,
	pub qfmt:  String,
	pub afmt:  String,
	pub bafmt: String,
	pub bqfmt: String,
	pub did:   Option<i64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Deck {
	pub id:   i64,
	pub name: String,
	pub desc: String,
	pub conf: i64,

	#[serde(rename = "mod")]
	pub modified: i64,
	pub usn:      i32,

	#[serde(rename = "dyn")]
	pub is_dynamic: i32,

	pub collapsed: bool,
	#[serde(rename = "browserCollapsed")]
	pub browser_collapsed: bool,

	#[serde(rename = "extendNew")]
	pub extend_new: i32,
	#[serde(rename = "extendRev")]
	pub extend_rev: i32,

	// (day, count) pairs Anki keeps for its daily limits
	#[serde(rename = "newToday")]
	pub new_today:  (i32, i32),
	#[serde(rename = "revToday")]
	pub rev_today:  (i32, i32),
	#[serde(rename = "lrnToday")]
	pub lrn_today:  (i32, i32),
	#[serde(rename = "timeToday")]
	pub time_today: (i32, i32),
}

impl Deck {
	pub fn new(id: i64, name: &str, modified: i64) -> Self {
		Self {
			id,
			name: name.to_string(),
			desc: String::new(),
			conf: DEFAULT_CONF_ID,
			modified,
			usn: -1,
			is_dynamic: 0,
			collapsed: false,
			browser_collapsed: false,
			extend_new: 10,
			extend_rev: 50,
			new_today: (0, 0),
			rev_today: (0, 0),
			lrn_today: (0, 0),
			time_today: (0, 0),
		}
	}

	/// The deck every collection must contain
	pub fn fallback(modified: i64) -> Self {
		Self { usn: 0, ..Self::new(DEFAULT_DECK_ID, "Default", modified) }
	}
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DeckConfig {
	pub id:   i64,
	pub name: String,

	#[serde(rename = "mod")]
	pub modified: i64,
	pub usn:      i32,

	#[serde(rename = "dyn")]
	pub is_dynamic: bool,

	#[serde(rename = "maxTaken")]
	pub max_taken: i32,
	pub new:       NewConfig,
	pub rev:       RevConfig,
	pub lapse:     LapseConfig,

	pub autoplay: bool,
	pub replayq:  bool,
	pub timer:    i32,
}

impl Default for DeckConfig {
	fn default() -> Self {
		Self {
			id:         DEFAULT_CONF_ID,
			name:       "Default".to_string(),
			modified:   0,
			usn:        0,
			is_dynamic: false,
			max_taken:  60,
			new:        NewConfig {
				delays:         vec![1.0, 10.0],
				ints:           vec![1, 4, 7],
				initial_factor: 2500,
				per_day:        20,
				order:          1,
				bury:           true,
				separate:       true,
			},
			rev:        RevConfig {
				per_day:   100,
				ease4:     1.3,
				ivl_fct:   1.0,
				fuzz:      0.05,
				max_ivl:   36500,
				min_space: 1,
				bury:      true,
			},
			lapse:      LapseConfig {
				delays:       vec![10.0],
				mult:         0.0,
				min_int:      1,
				leech_action: 0,
				leech_fails:  8,
			},
			autoplay:   true,
			replayq:    true,
			timer:      0,
		}
	}
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewConfig {
	pub delays:         Vec<f32>,
	pub ints:           Vec<i32>,
	pub initial_factor: i32,
	pub per_day:        i32,
	pub order:          i32,
	pub bury:           bool,
	pub separate:       bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RevConfig {
	pub per_day:   i32,
	pub ease4:     f32,
	pub ivl_fct:   f32,
	pub fuzz:      f32,
	pub max_ivl:   i32,
	pub min_space: i32,
	pub bury:      bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LapseConfig {
	pub delays:       Vec<f32>,
	pub mult:         f32,
	pub min_int:      i32,
	pub leech_action: i32,
	pub leech_fails:  i32,
}

/// Collection-wide settings, the `col.conf` column
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CollectionConf {
	pub active_decks:   Vec<i64>,
	pub cur_deck:       i64,
	pub cur_model:      String,
	pub add_to_cur:     bool,
	pub collapse_time:  i32,
	pub due_counts:     bool,
	pub est_times:      bool,
	pub new_bury:       bool,
	pub new_spread:     i32,
	pub next_pos:       i64,
	pub sort_backwards: bool,
	pub sort_type:      String,
	pub time_lim:       i32,
}

impl CollectionConf {
	pub fn new(deck_id: i64, model_id: i64, next_pos: i64) -> Self {
		Self {
			active_decks: vec![deck_id],
			cur_deck: deck_id,
			cur_model: model_id.to_string(),
			add_to_cur: true,
			collapse_time: 1200,
			due_counts: true,
			est_times: true,
			new_bury: true,
			new_spread: 0,
			next_pos,
			sort_backwards: false,
			sort_type: "noteFld".to_string(),
			time_lim: 0,
		}
	}
}

/// Anki stores its id-keyed dictionaries with string keys
pub fn keyed<T>(entries: impl IntoIterator<Item = (i64, T)>) -> BTreeMap<String, T> {
	entries.into_iter().map(|(id, value)| (id.to_string(), value)).collect()
}
