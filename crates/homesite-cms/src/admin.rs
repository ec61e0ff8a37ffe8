//! Admin UI integration
//!
//! The registry lists the page types editors can create. [`PageEditor`] turns a
//! page type's panels into an edit form and binds submitted form data back onto
//! a page.

use crate::blocks::StreamField;
use crate::error::CmsResult;
use crate::fields::{ValidationError, ValidationErrors};
use crate::html;
use crate::media::ImageResolver;
use crate::models::{HomePage, Page, PageType, PageVariant, WebPage};
use crate::panels::{EditHandler, WidgetKind};
use crate::rich_text::RichText;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Admin page registry
pub struct AdminPageRegistry {
	pages: BTreeMap<String, Box<dyn PageTypeDescriptor>>,
}

impl AdminPageRegistry {
	/// Create a new admin page registry
	pub fn new() -> Self {
		Self {
			pages: BTreeMap::new(),
		}
	}

	/// Registry with the bundled page types
	pub fn with_defaults() -> Self {
		let mut registry = Self::new();
		registry.register(HomePageType);
		registry.register(WebPageType);
		registry
	}

	/// Register a page type
	pub fn register<T: PageTypeDescriptor + 'static>(&mut self, page_type: T) {
		self.pages
			.insert(page_type.type_name().to_string(), Box::new(page_type));
	}

	/// Get a page type descriptor
	pub fn get(&self, type_name: &str) -> Option<&dyn PageTypeDescriptor> {
		self.pages.get(type_name).map(|b| b.as_ref())
	}

	/// Registered type names, sorted
	pub fn type_names(&self) -> Vec<&str> {
		self.pages.keys().map(String::as_str).collect()
	}

	/// Page types that may be created under `parent`
	pub fn creatable_at(&self, parent: Option<&Page>) -> Vec<&dyn PageTypeDescriptor> {
		self.pages
			.values()
			.map(|b| b.as_ref())
			.filter(|d| d.can_create_at(parent))
			.collect()
	}
}

impl Default for AdminPageRegistry {
	fn default() -> Self {
		Self::new()
	}
}

/// Descriptor for a page type in the admin
pub trait PageTypeDescriptor: Send + Sync {
	/// Get the type name
	fn type_name(&self) -> &str;

	/// Get the human-readable label
	fn label(&self) -> &str;

	/// Get the icon class/name
	fn icon(&self) -> &str;

	/// Can this page type be created as a child of the given parent?
	fn can_create_at(&self, parent: Option<&Page>) -> bool;

	/// Panels of the edit interface
	fn edit_handler(&self) -> EditHandler;

	/// A new, empty page of this type
	fn new_page(&self, title: &str, slug: &str) -> Page;
}

/// Admin descriptor of [`HomePage`]
#[derive(Debug, Clone, Copy, Default)]
pub struct HomePageType;

impl PageTypeDescriptor for HomePageType {
	fn type_name(&self) -> &str {
		HomePage::type_name()
	}

	fn label(&self) -> &str {
		HomePage::verbose_name()
	}

	fn icon(&self) -> &str {
		"home"
	}

	fn can_create_at(&self, _parent: Option<&Page>) -> bool {
		true
	}

	fn edit_handler(&self) -> EditHandler {
		EditHandler::new(HomePage::content_panels())
	}

	fn new_page(&self, title: &str, slug: &str) -> Page {
		Page::home(title, slug)
	}
}

/// Admin descriptor of [`WebPage`]
#[derive(Debug, Clone, Copy, Default)]
pub struct WebPageType;

impl PageTypeDescriptor for WebPageType {
	fn type_name(&self) -> &str {
		WebPage::type_name()
	}

	fn label(&self) -> &str {
		WebPage::verbose_name()
	}

	fn icon(&self) -> &str {
		"doc-full"
	}

	fn can_create_at(&self, _parent: Option<&Page>) -> bool {
		true
	}

	fn edit_handler(&self) -> EditHandler {
		EditHandler::new(WebPage::content_panels())
	}

	fn new_page(&self, title: &str, slug: &str) -> Page {
		Page::web(title, slug)
	}
}

/// One input of an edit form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormField {
	/// Field name
	pub name: &'static str,
	/// Label
	pub label: &'static str,
	/// Tab the field is shown on
	pub tab: &'static str,
	/// Editor widget
	pub widget: WidgetKind,
	/// Editors must supply a value
	pub required: bool,
	/// Maximum length in characters
	pub max_length: Option<usize>,
	/// Help text
	pub help_text: Option<&'static str>,
	/// Current value
	pub initial: Value,
}

/// Page editor interface
#[derive(Debug, Default)]
pub struct PageEditor;

impl PageEditor {
	/// Create a new page editor
	pub fn new() -> Self {
		Self
	}

	/// Form fields for a page in panel order, content tab first, holding
	/// the page's current values
	pub fn edit_form(&self, page: &Page) -> CmsResult<Vec<FormField>> {
		let current = serde_json::to_value(page)?;
		let mut form = self.layout(page);
		for field in &mut form {
			field.initial = current.get(field.name).cloned().unwrap_or(Value::Null);
		}
		Ok(form)
	}

	fn layout(&self, page: &Page) -> Vec<FormField> {
		let fields = page.fields();
		let handler = EditHandler::new(page.specific.content_panels());

		let mut form = Vec::new();
		for tab in handler.tabs() {
			for panel in &tab.panels {
				let Some(def) = fields.iter().find(|f| f.name == panel.field) else {
					tracing::warn!(field = panel.field, "panel refers to an undeclared field");
					continue;
				};
				form.push(FormField {
					name: def.name,
					label: panel.heading.unwrap_or(def.verbose_name),
					tab: tab.label,
					widget: panel.widget,
					required: def.is_required(),
					max_length: def.max_length(),
					help_text: def.help_text,
					initial: Value::Null,
				});
			}
		}
		form
	}

	/// Render the edit form of a page to HTML
	pub fn render_edit_form(&self, page: &Page) -> CmsResult<String> {
		let mut out = format!(
			r#"<form id="page-edit-form" data-page-id="{}" data-page-type="{}">"#,
			page.id,
			page.type_name()
		);
		out.push('\n');

		let mut current_tab = "";
		for field in self.edit_form(page)? {
			if field.tab != current_tab {
				if !current_tab.is_empty() {
					out.push_str("\t</fieldset>\n");
				}
				out.push_str(&format!("\t<fieldset class=\"tab\">\n\t\t<legend>{}</legend>\n", field.tab));
				current_tab = field.tab;
			}
			out.push_str(&render_field(&field));
		}
		if !current_tab.is_empty() {
			out.push_str("\t</fieldset>\n");
		}
		out.push_str("\t<div class=\"form-actions\">\n\t\t<button type=\"submit\" class=\"btn btn-primary\">Save</button>\n\t</div>\n</form>");
		Ok(out)
	}

	/// Apply submitted form data to a copy of `page` and validate it.
	///
	/// Keys that are not form fields are ignored; form fields missing from
	/// `data` keep their current value.
	pub fn bind(
		&self,
		page: &Page,
		data: &Value,
		images: &dyn ImageResolver,
	) -> Result<Page, ValidationErrors> {
		let Some(data) = data.as_object() else {
			return Err(ValidationErrors::single(
				"__all__",
				ValidationError::InvalidValue("form data must be an object".to_string()),
			));
		};

		let mut bound = page.clone();
		let mut errors = ValidationErrors::new();
		for field in self.layout(page) {
			if let Some(value) = data.get(field.name) {
				bind_field(&mut bound, field.name, value, &mut errors);
			}
		}

		if let Err(invalid) = bound.validate(images) {
			errors.extend(invalid);
		}
		errors.into_result()?;

		tracing::debug!(page_id = %page.id, "form data bound");
		Ok(bound)
	}

	/// Bind form data onto a new page of a registered type
	pub fn bind_new(
		&self,
		descriptor: &dyn PageTypeDescriptor,
		data: &Value,
		images: &dyn ImageResolver,
	) -> Result<Page, ValidationErrors> {
		let page = descriptor.new_page("", "");
		self.bind(&page, data, images)
	}
}

fn render_field(field: &FormField) -> String {
	let id = format!("id_{}", field.name);
	let class = field.widget.css_class();
	let required = if field.required { " required" } else { "" };
	let text = match &field.initial {
		Value::String(s) => s.clone(),
		Value::Null => String::new(),
		other => other.to_string(),
	};

	let input = match field.widget {
		WidgetKind::TitleInput | WidgetKind::TextInput | WidgetKind::SlugInput => {
			let max_length = field
				.max_length
				.map(|max| format!(r#" maxlength="{max}""#))
				.unwrap_or_default();
			format!(
				r#"<input type="text" id="{id}" name="{}" value="{}" class="{class}"{max_length}{required} />"#,
				field.name,
				html::escape(&text)
			)
		}
		WidgetKind::Textarea | WidgetKind::RichTextEditor | WidgetKind::StreamEditor => format!(
			r#"<textarea id="{id}" name="{}" class="{class}"{required}>{}</textarea>"#,
			field.name,
			html::escape(&text)
		),
		WidgetKind::Checkbox => {
			let checked = if field.initial == Value::Bool(true) { " checked" } else { "" };
			format!(
				r#"<input type="checkbox" id="{id}" name="{}" class="{class}"{checked} />"#,
				field.name
			)
		}
		WidgetKind::ImageChooser => format!(
			r#"<input type="hidden" id="{id}" name="{}" value="{}" class="{class}" />"#,
			field.name,
			html::escape(&text)
		),
	};

	let help = field
		.help_text
		.map(|h| format!("\n\t\t\t<p class=\"help\">{}</p>", html::escape(h)))
		.unwrap_or_default();
	format!(
		"\t\t<div class=\"form-group\">\n\t\t\t<label for=\"{id}\">{}</label>\n\t\t\t{input}{help}\n\t\t</div>\n",
		html::escape(field.label)
	)
}

fn bind_field(page: &mut Page, name: &'static str, value: &Value, errors: &mut ValidationErrors) {
	match name {
		"title" => {
			if let Some(v) = string_value(name, value, errors) {
				page.title = v.unwrap_or_default();
			}
		}
		"slug" => {
			if let Some(v) = string_value(name, value, errors) {
				page.slug = v.unwrap_or_default();
			}
		}
		"seo_title" => {
			if let Some(v) = string_value(name, value, errors) {
				page.seo_title = v;
			}
		}
		"search_description" => {
			if let Some(v) = string_value(name, value, errors) {
				page.search_description = v;
			}
		}
		"show_in_menus" => match value {
			Value::Bool(b) => page.show_in_menus = *b,
			Value::Null => page.show_in_menus = false,
			other => errors.add(name, invalid("a boolean", other)),
		},
		"body" => match &mut page.specific {
			PageVariant::HomePage(home) => {
				if let Some(v) = string_value(name, value, errors) {
					home.body = RichText::new(v.unwrap_or_default());
				}
			}
			PageVariant::WebPage(web) => match value {
				Value::Null => web.body = StreamField::new(),
				other => match serde_json::from_value::<StreamField>(other.clone()) {
					Ok(body) => web.body = body,
					Err(e) => errors.add(name, ValidationError::InvalidValue(e.to_string())),
				},
			},
		},
		"cover_image" => {
			if let (Some(v), PageVariant::WebPage(web)) =
				(string_value(name, value, errors), &mut page.specific)
			{
				match v.as_deref().map(Uuid::parse_str).transpose() {
					Ok(id) => web.cover_image = id,
					Err(e) => errors.add(name, ValidationError::InvalidValue(e.to_string())),
				}
			}
		}
		"subtitle" => {
			if let (Some(v), PageVariant::WebPage(web)) =
				(string_value(name, value, errors), &mut page.specific)
			{
				web.subtitle = v;
			}
		}
		other => tracing::warn!(field = other, "no binding for form field"),
	}
}

/// `Some(None)` for null or empty input, `None` after recording an error
fn string_value(
	name: &'static str,
	value: &Value,
	errors: &mut ValidationErrors,
) -> Option<Option<String>> {
	match value {
		Value::Null => Some(None),
		Value::String(s) if s.is_empty() => Some(None),
		Value::String(s) => Some(Some(s.clone())),
		other => {
			errors.add(name, invalid("a string", other));
			None
		}
	}
}

fn invalid(expected: &str, got: &Value) -> ValidationError {
	ValidationError::InvalidValue(format!("expected {expected}, got {got}"))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::media::{Image, ImageId};
	use rstest::rstest;
	use serde_json::json;

	struct NoImages;

	impl ImageResolver for NoImages {
		fn resolve(&self, _id: ImageId) -> Option<Image> {
			None
		}
	}

	#[rstest]
	fn test_registry_defaults() {
		let registry = AdminPageRegistry::with_defaults();

		assert_eq!(registry.type_names(), vec!["HomePage", "WebPage"]);
		assert_eq!(registry.get("WebPage").unwrap().label(), "web page");
		assert_eq!(registry.creatable_at(None).len(), 2);
	}

	#[rstest]
	fn test_edit_form_follows_panel_order() {
		let page = Page::web("About", "about");

		let names: Vec<&str> = PageEditor::new()
			.edit_form(&page)
			.unwrap()
			.iter()
			.map(|f| f.name)
			.collect();

		assert_eq!(
			names,
			vec![
				"title",
				"cover_image",
				"subtitle",
				"body",
				"slug",
				"seo_title",
				"show_in_menus",
				"search_description"
			]
		);
	}

	#[rstest]
	fn test_render_escapes_values() {
		let page = Page::web("Tom & \"Jerry\"", "tom-and-jerry");

		let html = PageEditor::new().render_edit_form(&page).unwrap();

		assert!(html.contains(r#"value="Tom &amp; &quot;Jerry&quot;""#));
		assert!(html.contains(r#"maxlength="255""#));
		assert!(html.contains("<legend>Promote</legend>"));
	}

	#[rstest]
	fn test_bind_empty_subtitle_is_none() {
		let page = Page::web("About", "about");

		let bound = PageEditor::new()
			.bind(&page, &json!({"subtitle": ""}), &NoImages)
			.unwrap();

		assert_eq!(bound.as_web().unwrap().subtitle, None);
	}

	#[rstest]
	fn test_bind_rejects_unknown_block_type() {
		let page = Page::web("About", "about");
		let data = json!({"body": [{"type": "quote", "value": "x"}]});

		let errors = PageEditor::new().bind(&page, &data, &NoImages).unwrap_err();

		assert!(matches!(
			errors.field("body"),
			[ValidationError::InvalidValue(_)]
		));
	}

	#[rstest]
	fn test_bind_rejects_non_object() {
		let page = Page::home("Home", "home");

		let errors = PageEditor::new().bind(&page, &json!([1]), &NoImages).unwrap_err();

		assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["__all__"]);
	}
}
