//! Reduces card markup to the small set of tags a card template can render.

use std::sync::LazyLock;

use regex::{Captures, Regex};

macro_rules! pattern {
	($name:ident, $regex:expr) => {
		static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).expect("sanitizer pattern is valid"));
	};
}

pattern!(CDATA, r"(?s)<!\[CDATA\[(.*?)\]\]>");
pattern!(COMMENT, r"(?s)<!--.*?-->");
pattern!(SCRIPT, r"(?is)<script\b[^>]*>.*?</script\s*>");
pattern!(STYLE, r"(?is)<style\b[^>]*>.*?</style\s*>");
pattern!(DECLARATION, r"(?s)<[!?][^>]*>");
pattern!(TAG, r"(?s)<\s*(/?)\s*([a-zA-Z][a-zA-Z0-9-]*)([^>]*)>");
pattern!(SRC, r#"(?i)\bsrc\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>"']+))"#);
pattern!(WHITESPACE, r"[ \t\r\n]+");

/// Formatting tags kept as-is, stripped of their attributes
const FORMATTING: &[&str] = &[
	"b", "i", "u", "em", "strong", "sub", "sup", "br", "p", "div", "span", "ul", "ol", "li", "hr",
	"table", "thead", "tbody", "tr", "td", "th", "code", "pre",
];

const VOID: &[&str] = &["br", "hr", "img"];

fn src_attribute(attrs: &str) -> Option<String> {
	let caps = SRC.captures(attrs)?;
	let value = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3))?.as_str();
	Some(value.replace('"', "&quot;"))
}

fn rebuild_tag(caps: &Captures) -> String {
	let closing = !caps[1].is_empty();
	let name = caps[2].to_ascii_lowercase();
	let attrs = &caps[3];

	match name.as_str() {
		"img" if !closing => match src_attribute(attrs) {
			Some(src) => format!(r#"<img src="{src}">"#),
			None => String::new(),
		},
		"audio" if closing => "</audio>".to_string(),
		"audio" => match src_attribute(attrs) {
			Some(src) => format!(r#"<audio controls src="{src}">"#),
			None => "<audio controls>".to_string(),
		},
		name if VOID.contains(&name) && closing => String::new(),
		name if FORMATTING.contains(&name) => {
			if closing { format!("</{name}>") } else { format!("<{name}>") }
		}
		_ => String::new(),
	}
}

/// Keeps text, formatting tags and embedded media, drops everything else
pub fn clean_html(raw: &str) -> String {
	let text = CDATA.replace_all(raw, "$1");
	let text = COMMENT.replace_all(&text, "");
	let text = SCRIPT.replace_all(&text, "");
	let text = STYLE.replace_all(&text, "");
	let text = DECLARATION.replace_all(&text, "");
	let text = TAG.replace_all(&text, rebuild_tag);
	WHITESPACE.replace_all(&text, " ").into_owned()
}

/// Whether cleaned markup shows anything: text or embedded media
pub fn has_content(markup: &str) -> bool {
	!strip_html(markup).is_empty() || markup.contains("<img") || markup.contains("<audio")
}

/// Plain text of a field, used for sorting and duplicate checksums
pub fn strip_html(markup: &str) -> String {
	let text = TAG.replace_all(markup, "");
	WHITESPACE.replace_all(&text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn keeps_formatting_and_drops_attributes() {
		assert_eq!(
			clean_html(r#"<p class="x" style="color:red">Hi <B>there</B><br/></p>"#),
			"<p>Hi <b>there</b><br></p>"
		);
	}

	#[test]
	fn keeps_media_tags() {
		let markup = r#"<img src="a.png"> <audio controls src="b.mp3"></audio>"#;
		assert_eq!(clean_html(markup), markup);
	}

	#[test]
	fn drops_unknown_tags_but_keeps_text() {
		assert_eq!(clean_html("<font face='x'>word</font> <a href='y'>link</a>"), "word link");
	}

	#[test]
	fn removes_scripts_styles_and_comments() {
		let raw = "a<script>alert(1)</script>b<style>p{}</style>c<!-- hidden -->d";
		assert_eq!(clean_html(raw), "abcd");
	}

	#[test]
	fn unwraps_cdata() {
		assert_eq!(clean_html("<![CDATA[<b>bold</b>]]>"), "<b>bold</b>");
	}

	#[test]
	fn collapses_whitespace() {
		assert_eq!(clean_html("  one\n\n\ttwo  "), " one two ");
	}

	#[test]
	fn office_namespaced_tags_vanish() {
		assert_eq!(clean_html("<o:p></o:p>  ").trim(), "");
	}

	#[test]
	fn content_means_text_or_media() {
		assert!(!has_content("<div><span> </span></div><br>"));
		assert!(has_content(r#"<img src="a.png">"#));
		assert!(has_content("<p>x</p>"));
	}

	#[test]
	fn img_without_src_is_dropped() {
		assert_eq!(clean_html("x<img alt='none'>y"), "xy");
	}

	#[test]
	fn strip_html_leaves_text() {
		assert_eq!(strip_html("<b>Capital</b> of <i>France</i>?<br>"), "Capital of France?");
	}
}
