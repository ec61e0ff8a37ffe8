//! End-to-end use of the facade crate

use homesite::prelude::*;
use rstest::rstest;

#[rstest]
#[tokio::test]
async fn test_about_page_survives_snapshot() {
	// Arrange
	let mut site = Site::new();
	let home = site
		.create_page(None, Page::home("Home", "home"))
		.await
		.unwrap();
	let image = site
		.upload_image("Team", "team.gif", vec![0u8; 8])
		.await
		.unwrap();
	let mut about = Page::web("About", "about");
	if let Some(web) = about.as_web_mut() {
		web.subtitle = Some("Our Story".to_string());
		web.body.push(ContentBlock::text("<p>Hello</p>"));
		web.body.push(ContentBlock::image(image.id));
	}
	let node = site.create_page(Some(home.id), about).await.unwrap();

	// Act
	let json = site.snapshot().to_json().unwrap();
	let restored = Site::restore(SiteSnapshot::from_json(&json).unwrap(), "/media/").unwrap();

	// Assert
	let page = restored.get_page(node.id).await.unwrap();
	assert_eq!(page.title, "About");
	let web = page.as_web().unwrap();
	assert_eq!(web.subtitle.as_deref(), Some("Our Story"));
	let body: Vec<&ContentBlock> = web.body.iter().map(|b| &b.content).collect();
	assert_eq!(
		body,
		vec![&ContentBlock::text("<p>Hello</p>"), &ContentBlock::image(image.id)]
	);
}

#[rstest]
fn test_default_settings_are_exported() {
	let settings = Settings::default();

	assert_eq!(settings.media_url, "/media/");
	assert!(settings.validate().is_ok());
}
