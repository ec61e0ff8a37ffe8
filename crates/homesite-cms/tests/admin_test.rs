//! Tests for admin forms and the page type registry

use homesite_cms::admin::{AdminPageRegistry, PageEditor};
use homesite_cms::blocks::{BlockKind, ContentBlock};
use homesite_cms::fields::ValidationError;
use homesite_cms::models::Page;
use homesite_cms::panels::WidgetKind;
use homesite_cms::site::Site;
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn editor() -> PageEditor {
	PageEditor::new()
}

#[rstest]
fn test_home_page_form(editor: PageEditor) {
	// Arrange
	let mut page = Page::home("Home", "home");
	page.as_home_mut().unwrap().body = "<p>Welcome</p>".into();

	// Act
	let form = editor.edit_form(&page).unwrap();

	// Assert
	let content: Vec<(&str, WidgetKind)> = form
		.iter()
		.filter(|f| f.tab == "Content")
		.map(|f| (f.name, f.widget))
		.collect();
	assert_eq!(
		content,
		vec![
			("title", WidgetKind::TitleInput),
			("body", WidgetKind::RichTextEditor)
		]
	);
	assert_eq!(form[1].initial, json!("<p>Welcome</p>"));
	assert!(form[0].required);
	assert!(!form[1].required);
}

#[rstest]
fn test_bind_rejects_overlong_subtitle(editor: PageEditor) {
	// Arrange
	let site = Site::new();
	let page = Page::web("About", "about");
	let data = json!({"subtitle": "x".repeat(300)});

	// Act
	let errors = editor.bind(&page, &data, site.images()).unwrap_err();

	// Assert
	assert_eq!(
		errors.field("subtitle"),
		&[ValidationError::TooLong {
			length: 300,
			max: 255
		}]
	);
}

#[rstest]
#[tokio::test]
async fn test_bound_page_is_created(editor: PageEditor) {
	// Arrange
	let registry = AdminPageRegistry::with_defaults();
	let mut site = Site::new();
	let image = site
		.upload_image("Cover", "cover.gif", vec![0u8; 16])
		.await
		.unwrap();
	let data = json!({
		"title": "About",
		"slug": "about",
		"cover_image": image.id.to_string(),
		"subtitle": "Our Story",
		"show_in_menus": true,
		"body": [
			{"type": "text", "value": "<p>Hello</p>"},
			{"type": "image", "value": image.id.to_string()}
		],
		"unknown": "ignored"
	});

	// Act
	let page = editor
		.bind_new(registry.get("WebPage").unwrap(), &data, site.images())
		.unwrap();
	let node = site.create_page(None, page).await.unwrap();

	// Assert
	let stored = site.get_page(node.id).await.unwrap();
	assert!(stored.show_in_menus);
	let web = stored.as_web().unwrap();
	assert_eq!(web.cover_image, Some(image.id));
	assert_eq!(web.subtitle.as_deref(), Some("Our Story"));
	let kinds: Vec<BlockKind> = web.body.iter().map(|b| b.kind()).collect();
	assert_eq!(kinds, vec![BlockKind::Text, BlockKind::Image]);
	assert_eq!(web.body.blocks()[0].content, ContentBlock::text("<p>Hello</p>"));
}

#[rstest]
#[tokio::test]
async fn test_bind_missing_cover_image(editor: PageEditor) {
	// Arrange
	let site = Site::new();
	let page = Page::web("About", "about");
	let data = json!({"cover_image": uuid::Uuid::new_v4().to_string()});

	// Act
	let errors = editor.bind(&page, &data, site.images()).unwrap_err();

	// Assert
	assert!(matches!(
		errors.field("cover_image"),
		[ValidationError::MissingImage(_)]
	));
}

#[rstest]
fn test_render_edit_form_lists_every_panel(editor: PageEditor) {
	// Arrange
	let mut page = Page::web("About", "about");
	page.as_web_mut().unwrap().subtitle = Some("<Our Story>".to_string());

	// Act
	let html = editor.render_edit_form(&page).unwrap();

	// Assert
	let names = [
		"title",
		"cover_image",
		"subtitle",
		"body",
		"slug",
		"seo_title",
		"show_in_menus",
		"search_description",
	];
	for name in names {
		assert!(html.contains(&format!(r#"name="{name}""#)), "missing {name}");
	}
	assert!(html.contains("&lt;Our Story&gt;"));
	assert!(html.contains(r#"class="stream_field""#));
}
