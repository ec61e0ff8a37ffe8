//! Page types
//!
//! Every page is a [`Page`]: the base fields shared by all pages plus a
//! [`PageVariant`] carrying the type-specific fields. The page types declare
//! their schema through [`PageType`]: field definitions, content panels and
//! template.

use crate::blocks::{BlockKind, StreamBlockDefinition, StreamField};
use crate::fields::{CascadeAction, FieldDef, ValidationErrors};
use crate::media::{ImageId, ImageResolver};
use crate::pages::PageId;
use crate::panels::{Panel, WidgetKind};
use crate::rich_text::RichText;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// App label of the bundled page types
pub const APP_LABEL: &str = "home";

/// Maximum length of the title, slug, SEO title and subtitle
pub const MAX_CHAR_LENGTH: usize = 255;

/// Schema of a page type
pub trait PageType {
	/// Type name, e.g. `WebPage`
	fn type_name() -> &'static str;

	/// Human-readable name
	fn verbose_name() -> &'static str;

	/// Fields declared by this type, on top of [`base_fields`]
	fn fields() -> Vec<FieldDef>;

	/// Editable panels in presentation order, extending [`base_content_panels`]
	fn content_panels() -> Vec<Panel>;

	/// Explicit template, `None` to use the default derived from the type name
	fn template() -> Option<&'static str> {
		None
	}

	/// Content type label, e.g. `home.webpage`
	fn content_type() -> String {
		format!("{}.{}", APP_LABEL, Self::type_name().to_lowercase())
	}

	/// Check the type-specific field values
	fn validate(&self, images: &dyn ImageResolver, errors: &mut ValidationErrors);

	/// Images referenced by this page
	fn image_references(&self) -> Vec<ImageId>;

	/// Apply the declared on-delete action for a deleted image; returns true
	/// when the page changed
	fn on_image_deleted(&mut self, image_id: ImageId) -> bool;
}

/// Fields common to all pages
pub fn base_fields() -> Vec<FieldDef> {
	vec![
		FieldDef::char("title", MAX_CHAR_LENGTH)
			.verbose_name("Title")
			.help_text("The page title as you'd like it to be seen by the public"),
		FieldDef::slug("slug", MAX_CHAR_LENGTH)
			.verbose_name("Slug")
			.help_text("The name of the page as it will appear in URLs"),
		FieldDef::char("seo_title", MAX_CHAR_LENGTH)
			.null()
			.blank()
			.verbose_name("Title tag"),
		FieldDef::text("search_description")
			.null()
			.blank()
			.verbose_name("Meta description"),
		FieldDef::boolean("show_in_menus").verbose_name("Show in menus"),
	]
}

/// Content panels common to all pages
pub fn base_content_panels() -> Vec<Panel> {
	vec![Panel::new("title", WidgetKind::TitleInput)]
}

fn field(fields: &[FieldDef], name: &str) -> Option<FieldDef> {
	fields.iter().find(|f| f.name == name).cloned()
}

/// Landing page with a rich-text introduction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomePage {
	/// An introduction to the site
	#[serde(default)]
	pub body: RichText,
}

impl PageType for HomePage {
	fn type_name() -> &'static str {
		"HomePage"
	}

	fn verbose_name() -> &'static str {
		"home page"
	}

	fn fields() -> Vec<FieldDef> {
		vec![FieldDef::rich_text("body").blank().verbose_name("Body")]
	}

	fn content_panels() -> Vec<Panel> {
		let mut panels = base_content_panels();
		panels.push(Panel::new("body", WidgetKind::RichTextEditor));
		panels
	}

	fn validate(&self, _images: &dyn ImageResolver, errors: &mut ValidationErrors) {
		if let Some(def) = field(&Self::fields(), "body") {
			let value = (!self.body.is_empty()).then(|| self.body.as_str());
			def.check_str(value, errors);
		}
	}

	fn image_references(&self) -> Vec<ImageId> {
		Vec::new()
	}

	fn on_image_deleted(&mut self, _image_id: ImageId) -> bool {
		false
	}
}

/// Generic web page with cover image, subtitle and block content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebPage {
	/// Cover image, unset when the image is deleted
	#[serde(default)]
	pub cover_image: Option<ImageId>,

	/// Short subtitle
	#[serde(default)]
	pub subtitle: Option<String>,

	/// Ordered text and image blocks
	#[serde(default)]
	pub body: StreamField,
}

impl WebPage {
	/// Block kinds accepted by `body`
	pub fn body_blocks() -> StreamBlockDefinition {
		StreamBlockDefinition::new()
			.child("text", BlockKind::Text)
			.child("image", BlockKind::Image)
	}
}

impl PageType for WebPage {
	fn type_name() -> &'static str {
		"WebPage"
	}

	fn verbose_name() -> &'static str {
		"web page"
	}

	fn fields() -> Vec<FieldDef> {
		vec![
			FieldDef::image("cover_image", CascadeAction::SetNull)
				.null()
				.blank()
				.verbose_name("Cover image"),
			FieldDef::char("subtitle", MAX_CHAR_LENGTH)
				.null()
				.blank()
				.verbose_name("Subtitle"),
			FieldDef::stream("body", Self::body_blocks())
				.blank()
				.verbose_name("Body"),
		]
	}

	fn content_panels() -> Vec<Panel> {
		let mut panels = base_content_panels();
		panels.extend([
			Panel::new("cover_image", WidgetKind::ImageChooser),
			Panel::new("subtitle", WidgetKind::TextInput),
			Panel::new("body", WidgetKind::StreamEditor),
		]);
		panels
	}

	fn template() -> Option<&'static str> {
		Some("home/web_page.html")
	}

	fn validate(&self, images: &dyn ImageResolver, errors: &mut ValidationErrors) {
		let fields = Self::fields();
		if let Some(def) = field(&fields, "cover_image") {
			def.check_image(self.cover_image, images, errors);
		}
		if let Some(def) = field(&fields, "subtitle") {
			def.check_str(self.subtitle.as_deref(), errors);
		}
		if let Some(def) = field(&fields, "body") {
			def.check_stream(&self.body, images, errors);
		}
	}

	fn image_references(&self) -> Vec<ImageId> {
		let mut ids: Vec<ImageId> = self.cover_image.into_iter().collect();
		ids.extend(self.body.image_ids());
		ids
	}

	fn on_image_deleted(&mut self, image_id: ImageId) -> bool {
		if self.cover_image != Some(image_id) {
			return false;
		}
		let action = field(&Self::fields(), "cover_image")
			.and_then(|def| def.on_delete())
			.unwrap_or_default();
		match action {
			CascadeAction::SetNull | CascadeAction::SetDefault => {
				self.cover_image = None;
				true
			}
			other => {
				tracing::warn!(image_id = %image_id, action = ?other, "cover image reference left dangling");
				false
			}
		}
	}
}

/// The type-specific part of a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "content_type")]
pub enum PageVariant {
	/// A [`HomePage`]
	#[serde(rename = "home.homepage")]
	HomePage(HomePage),
	/// A [`WebPage`]
	#[serde(rename = "home.webpage")]
	WebPage(WebPage),
}

macro_rules! dispatch {
	($variant:expr, $page:ident => $body:expr) => {
		match $variant {
			PageVariant::HomePage($page) => $body,
			PageVariant::WebPage($page) => $body,
		}
	};
}

macro_rules! dispatch_type {
	($variant:expr, $ty:ident => $body:expr) => {
		match $variant {
			PageVariant::HomePage(_) => {
				type $ty = HomePage;
				$body
			}
			PageVariant::WebPage(_) => {
				type $ty = WebPage;
				$body
			}
		}
	};
}

impl PageVariant {
	/// Type name of the variant
	pub fn type_name(&self) -> &'static str {
		dispatch_type!(self, T => T::type_name())
	}

	/// Human-readable type name
	pub fn verbose_name(&self) -> &'static str {
		dispatch_type!(self, T => T::verbose_name())
	}

	/// Content type label
	pub fn content_type(&self) -> String {
		dispatch_type!(self, T => T::content_type())
	}

	/// Type-specific field definitions
	pub fn fields(&self) -> Vec<FieldDef> {
		dispatch_type!(self, T => T::fields())
	}

	/// Content panels in presentation order
	pub fn content_panels(&self) -> Vec<Panel> {
		dispatch_type!(self, T => T::content_panels())
	}

	/// Explicit template
	pub fn template(&self) -> Option<&'static str> {
		dispatch_type!(self, T => T::template())
	}

	/// Referenced images
	pub fn image_references(&self) -> Vec<ImageId> {
		dispatch!(self, page => page.image_references())
	}

	fn validate(&self, images: &dyn ImageResolver, errors: &mut ValidationErrors) {
		dispatch!(self, page => page.validate(images, errors))
	}

	fn on_image_deleted(&mut self, image_id: ImageId) -> bool {
		dispatch!(self, page => page.on_image_deleted(image_id))
	}
}

/// A page: shared base fields plus the type-specific variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
	/// Page id
	pub id: PageId,

	/// Title
	pub title: String,

	/// URL slug
	pub slug: String,

	/// Title used in the HTML `<title>` tag
	#[serde(default)]
	pub seo_title: Option<String>,

	/// Meta description
	#[serde(default)]
	pub search_description: Option<String>,

	/// Whether the page appears in navigation menus
	#[serde(default)]
	pub show_in_menus: bool,

	/// Type-specific fields
	#[serde(flatten)]
	pub specific: PageVariant,
}

impl Page {
	/// Create a page with a fresh id
	pub fn new(title: impl Into<String>, slug: impl Into<String>, specific: PageVariant) -> Self {
		Self {
			id: Uuid::new_v4(),
			title: title.into(),
			slug: slug.into(),
			seo_title: None,
			search_description: None,
			show_in_menus: false,
			specific,
		}
	}

	/// An empty home page
	pub fn home(title: impl Into<String>, slug: impl Into<String>) -> Self {
		Self::new(title, slug, PageVariant::HomePage(HomePage::default()))
	}

	/// An empty web page
	pub fn web(title: impl Into<String>, slug: impl Into<String>) -> Self {
		Self::new(title, slug, PageVariant::WebPage(WebPage::default()))
	}

	/// Type name of the page
	pub fn type_name(&self) -> &'static str {
		self.specific.type_name()
	}

	/// The home page fields, if this is a home page
	pub fn as_home(&self) -> Option<&HomePage> {
		match &self.specific {
			PageVariant::HomePage(home) => Some(home),
			PageVariant::WebPage(_) => None,
		}
	}

	/// The web page fields, if this is a web page
	pub fn as_web(&self) -> Option<&WebPage> {
		match &self.specific {
			PageVariant::WebPage(web) => Some(web),
			PageVariant::HomePage(_) => None,
		}
	}

	/// Mutable web page fields, if this is a web page
	pub fn as_web_mut(&mut self) -> Option<&mut WebPage> {
		match &mut self.specific {
			PageVariant::WebPage(web) => Some(web),
			PageVariant::HomePage(_) => None,
		}
	}

	/// Mutable home page fields, if this is a home page
	pub fn as_home_mut(&mut self) -> Option<&mut HomePage> {
		match &mut self.specific {
			PageVariant::HomePage(home) => Some(home),
			PageVariant::WebPage(_) => None,
		}
	}

	/// All field definitions: base fields followed by the type's own
	pub fn fields(&self) -> Vec<FieldDef> {
		let mut fields = base_fields();
		fields.extend(self.specific.fields());
		fields
	}

	/// Validate base and type-specific fields.
	///
	/// Image references must resolve in `images`.
	pub fn validate(&self, images: &dyn ImageResolver) -> Result<(), ValidationErrors> {
		let mut errors = ValidationErrors::new();
		for def in base_fields() {
			match def.name {
				"title" => def.check_str(Some(&self.title), &mut errors),
				"slug" => def.check_str(Some(&self.slug), &mut errors),
				"seo_title" => def.check_str(self.seo_title.as_deref(), &mut errors),
				"search_description" => {
					def.check_str(self.search_description.as_deref(), &mut errors)
				}
				_ => {}
			}
		}
		self.specific.validate(images, &mut errors);
		errors.into_result()
	}

	/// Apply on-delete actions for a deleted image
	pub fn on_image_deleted(&mut self, image_id: ImageId) -> bool {
		self.specific.on_image_deleted(image_id)
	}
}
