//! Rich text values
//!
//! Rich text is stored as HTML markup produced by the editor. The store never
//! rewrites the markup; it only inspects it for emptiness and plain-text
//! extraction.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static TAG_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag pattern"));
static WHITESPACE_PATTERN: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Formatted rich text (HTML markup)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RichText(String);

impl RichText {
	/// Create rich text from markup
	pub fn new(markup: impl Into<String>) -> Self {
		Self(markup.into())
	}

	/// The raw markup
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Consume the value and return the markup
	pub fn into_inner(self) -> String {
		self.0
	}

	/// True when the markup carries no visible text.
	///
	/// `"<p></p>"` counts as empty, which is what an editor submits for a
	/// cleared field.
	pub fn is_empty(&self) -> bool {
		self.plain_text().is_empty()
	}

	/// The text content with tags stripped and whitespace collapsed
	///
	/// # Examples
	///
	/// ```
	/// use homesite_cms::rich_text::RichText;
	///
	/// let text = RichText::new("<p>Hello <b>world</b></p>");
	/// assert_eq!(text.plain_text(), "Hello world");
	/// ```
	pub fn plain_text(&self) -> String {
		let stripped = TAG_PATTERN.replace_all(&self.0, " ");
		WHITESPACE_PATTERN
			.replace_all(stripped.trim(), " ")
			.into_owned()
	}
}

impl From<&str> for RichText {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}

impl From<String> for RichText {
	fn from(value: String) -> Self {
		Self(value)
	}
}

impl fmt::Display for RichText {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}
