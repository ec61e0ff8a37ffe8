//! Admin panel tables
//!
//! A page type lists its editable fields as [`Panel`]s: the field name and the
//! editor widget used for it, in presentation order. [`EditHandler`] groups a
//! type's content panels with the promote panels shared by every page.

use serde::{Deserialize, Serialize};

/// Editor widget used for a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetKind {
	/// Large single-line title input
	TitleInput,
	/// Single-line text input
	TextInput,
	/// Multi-line plain text
	Textarea,
	/// Slug input
	SlugInput,
	/// Checkbox
	Checkbox,
	/// Rich text editor
	RichTextEditor,
	/// Image chooser
	ImageChooser,
	/// Stream field block editor
	StreamEditor,
}

impl WidgetKind {
	/// CSS class name used by the admin form
	pub fn css_class(&self) -> &'static str {
		match self {
			WidgetKind::TitleInput => "title",
			WidgetKind::TextInput => "char_field",
			WidgetKind::Textarea => "text_field",
			WidgetKind::SlugInput => "slug_field",
			WidgetKind::Checkbox => "boolean_field",
			WidgetKind::RichTextEditor => "rich_text_field",
			WidgetKind::ImageChooser => "model_choice_field",
			WidgetKind::StreamEditor => "stream_field",
		}
	}
}

/// One editable field in an admin form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Panel {
	/// Field name
	pub field: &'static str,

	/// Editor widget
	pub widget: WidgetKind,

	/// Heading overriding the field's label
	#[serde(skip_serializing_if = "Option::is_none")]
	pub heading: Option<&'static str>,
}

impl Panel {
	/// Panel for `field` edited with `widget`
	pub fn new(field: &'static str, widget: WidgetKind) -> Self {
		Self {
			field,
			widget,
			heading: None,
		}
	}

	/// Override the heading
	pub fn heading(mut self, heading: &'static str) -> Self {
		self.heading = Some(heading);
		self
	}
}

/// Panels on the promote tab of every page type
pub fn promote_panels() -> Vec<Panel> {
	vec![
		Panel::new("slug", WidgetKind::SlugInput),
		Panel::new("seo_title", WidgetKind::TextInput),
		Panel::new("show_in_menus", WidgetKind::Checkbox),
		Panel::new("search_description", WidgetKind::Textarea),
	]
}

/// A labelled group of panels
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tab {
	/// Tab label
	pub label: &'static str,
	/// Panels in order
	pub panels: Vec<Panel>,
}

/// The complete editing interface of a page type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditHandler {
	tabs: Vec<Tab>,
}

impl EditHandler {
	/// Content tab from `content_panels`, followed by the promote tab
	pub fn new(content_panels: Vec<Panel>) -> Self {
		Self {
			tabs: vec![
				Tab {
					label: "Content",
					panels: content_panels,
				},
				Tab {
					label: "Promote",
					panels: promote_panels(),
				},
			],
		}
	}

	/// Tabs in order
	pub fn tabs(&self) -> &[Tab] {
		&self.tabs
	}

	/// Every panel across all tabs, in order
	pub fn panels(&self) -> impl Iterator<Item = &Panel> {
		self.tabs.iter().flat_map(|t| t.panels.iter())
	}

	/// Field names across all tabs, in order
	pub fn field_names(&self) -> Vec<&'static str> {
		self.panels().map(|p| p.field).collect()
	}
}
