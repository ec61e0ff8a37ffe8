//! Template resolution and rendering context
//!
//! The CMS does not render HTML pages itself. It resolves which template a
//! page uses and builds the data handed to the rendering layer.

use crate::blocks::{BlockId, ContentBlock, StreamField};
use crate::error::CmsResult;
use crate::media::{Image, ImageId, ImageResolver};
use crate::models::{APP_LABEL, Page, PageVariant};
use crate::pages::{PageId, PageNode};
use crate::workflow::PageState;
use serde::Serialize;

/// Template used to render a page.
///
/// Page types without an explicit template use `<app>/<snake_case_type>.html`.
pub fn template_name(page: &Page) -> String {
	match page.specific.template() {
		Some(template) => template.to_string(),
		None => default_template(page.type_name()),
	}
}

fn default_template(type_name: &str) -> String {
	format!("{APP_LABEL}/{}.html", snake_case(type_name))
}

fn snake_case(name: &str) -> String {
	let mut out = String::with_capacity(name.len() + 4);
	for (i, ch) in name.chars().enumerate() {
		if ch.is_uppercase() {
			if i > 0 {
				out.push('_');
			}
			out.extend(ch.to_lowercase());
		} else {
			out.push(ch);
		}
	}
	out
}

/// Image data exposed to templates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageContext {
	/// Image id
	pub id: ImageId,
	/// Title, used as alt text
	pub title: String,
	/// Public URL
	pub url: String,
	/// Pixel width
	pub width: Option<u32>,
	/// Pixel height
	pub height: Option<u32>,
	/// MIME type
	pub mime_type: String,
}

impl ImageContext {
	fn from_image(image: Image, media_url: &str) -> Self {
		Self {
			url: image.url(media_url),
			id: image.id,
			title: image.title,
			width: image.width,
			height: image.height,
			mime_type: image.mime_type,
		}
	}
}

/// Payload of a block in the context
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BlockValue {
	/// Rich text markup
	Text(String),
	/// Resolved image, `None` when it no longer exists
	Image(Option<ImageContext>),
}

/// A stream block in the context
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockContext {
	/// Block id
	pub id: BlockId,
	/// Block type tag
	#[serde(rename = "type")]
	pub block_type: &'static str,
	/// Payload
	pub value: BlockValue,
}

/// Type-specific part of the context
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SpecificContext {
	/// Home page fields
	Home {
		/// Rich text body
		body: String,
	},
	/// Web page fields
	Web {
		/// Cover image, `None` when unset
		cover_image: Option<ImageContext>,
		/// Subtitle
		subtitle: Option<String>,
		/// Body blocks in order
		body: Vec<BlockContext>,
	},
}

/// Base page data in the context
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageContext {
	/// Page id
	pub id: PageId,
	/// Type name
	pub page_type: &'static str,
	/// Title
	pub title: String,
	/// Slug
	pub slug: String,
	/// URL path
	pub url: String,
	/// Tree depth
	pub depth: usize,
	/// Title for the `<title>` tag, falling back to the title
	pub seo_title: String,
	/// Meta description
	pub search_description: Option<String>,
	/// Shown in menus
	pub show_in_menus: bool,
	/// Lifecycle state
	pub state: PageState,
}

/// Everything a template receives
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateContext {
	/// Template to render with
	pub template: String,
	/// Base page data
	pub page: PageContext,
	/// Type-specific fields
	#[serde(flatten)]
	pub specific: SpecificContext,
}

impl TemplateContext {
	/// Build the context of a page at its tree position.
	///
	/// Image references are resolved through `images`; references to deleted
	/// images become `null`.
	pub fn build(
		page: &Page,
		node: &PageNode,
		state: PageState,
		images: &dyn ImageResolver,
		media_url: &str,
	) -> Self {
		let resolve = |id: ImageId| {
			images
				.resolve(id)
				.map(|image| ImageContext::from_image(image, media_url))
		};

		let specific = match &page.specific {
			PageVariant::HomePage(home) => SpecificContext::Home {
				body: home.body.as_str().to_string(),
			},
			PageVariant::WebPage(web) => SpecificContext::Web {
				cover_image: web.cover_image.and_then(&resolve),
				subtitle: web.subtitle.clone(),
				body: block_contexts(&web.body, &resolve),
			},
		};

		Self {
			template: template_name(page),
			page: PageContext {
				id: page.id,
				page_type: page.type_name(),
				title: page.title.clone(),
				slug: page.slug.clone(),
				url: format!("{}/", node.path),
				depth: node.depth,
				seo_title: page.seo_title.clone().unwrap_or_else(|| page.title.clone()),
				search_description: page.search_description.clone(),
				show_in_menus: page.show_in_menus,
				state,
			},
			specific,
		}
	}

	/// The context as a JSON value
	pub fn to_value(&self) -> CmsResult<serde_json::Value> {
		Ok(serde_json::to_value(self)?)
	}
}

fn block_contexts(
	field: &StreamField,
	resolve: impl Fn(ImageId) -> Option<ImageContext>,
) -> Vec<BlockContext> {
	field
		.iter()
		.map(|block| BlockContext {
			id: block.id,
			block_type: block.kind().as_str(),
			value: match &block.content {
				ContentBlock::Text(text) => BlockValue::Text(text.as_str().to_string()),
				ContentBlock::Image(id) => BlockValue::Image(resolve(*id)),
			},
		})
		.collect()
}
