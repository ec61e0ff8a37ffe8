//! Command implementations
//!
//! Each command works on a [`Site`] loaded from the snapshot file named by
//! the [`CommandContext`]. `main` loads the site, runs one command, prints
//! the result and saves the site back when the command changed it.

use anyhow::{Context, bail};
use homesite_cms::admin::{AdminPageRegistry, PageEditor};
use homesite_cms::blocks::BlockLibrary;
use homesite_cms::error::CmsError;
use homesite_cms::media::{Image, ImageId};
use homesite_cms::pages::{PageId, PageNode};
use homesite_cms::site::Site;
use homesite_cms::workflow::PageState;
use homesite_conf::Settings;
use serde_json::{Map, Value, json};
use std::fs;
use std::path::{Path, PathBuf};

/// Where the site lives on disk
#[derive(Debug, Clone)]
pub(crate) struct CommandContext {
	pub data_file: PathBuf,
	pub media_root: PathBuf,
	pub media_url: String,
}

impl CommandContext {
	pub(crate) fn from_settings(settings: &Settings, data_file: Option<PathBuf>) -> Self {
		Self {
			data_file: data_file.unwrap_or_else(|| settings.data_file.clone()),
			media_root: settings.media_root.clone(),
			media_url: settings.media_url.clone(),
		}
	}

	pub(crate) fn load_site(&self) -> anyhow::Result<Site> {
		if !self.data_file.exists() {
			bail!(
				"no site at {}; run `homesite-admin init` first",
				self.data_file.display()
			);
		}
		Site::load(&self.data_file, self.media_url.clone())
			.with_context(|| format!("failed to load {}", self.data_file.display()))
	}

	pub(crate) fn save_site(&self, site: &Site) -> anyhow::Result<()> {
		site.save(&self.data_file)
			.with_context(|| format!("failed to write {}", self.data_file.display()))
	}
}

/// Create an empty site
pub(crate) fn init(ctx: &CommandContext, force: bool) -> anyhow::Result<()> {
	if ctx.data_file.exists() && !force {
		bail!(
			"{} already exists (use --force to overwrite)",
			ctx.data_file.display()
		);
	}
	ctx.save_site(&Site::with_media_url(ctx.media_url.clone()))?;
	fs::create_dir_all(&ctx.media_root)
		.with_context(|| format!("failed to create {}", ctx.media_root.display()))?;

	tracing::info!(data_file = %ctx.data_file.display(), "site initialized");
	Ok(())
}

async fn page_id_at(site: &Site, path: &str) -> anyhow::Result<PageId> {
	let page = site
		.find_by_path(path)
		.await
		.with_context(|| format!("no page at {path}"))?;
	Ok(page.id)
}

/// One line per page, indented by depth
pub(crate) async fn tree(site: &Site) -> anyhow::Result<Vec<String>> {
	let mut lines = Vec::new();
	for node in site.tree().walk() {
		let page = site.get_page(node.id).await?;
		let state = site.state(node.id).await?;
		lines.push(format!(
			"{}{} [{}] {} {}",
			"  ".repeat(node.depth),
			node.title,
			page.type_name(),
			state,
			node.path
		));
	}
	Ok(lines)
}

/// Arguments of `add-page`
#[derive(Debug, Clone, Default)]
pub(crate) struct NewPage {
	pub page_type: String,
	pub parent: Option<String>,
	pub title: String,
	pub slug: String,
	pub subtitle: Option<String>,
	pub cover_image: Option<String>,
	/// Rich-text body of a home page
	pub body: Option<String>,
	/// Body blocks of a web page, each `KIND:VALUE`
	pub blocks: Vec<String>,
	pub show_in_menus: bool,
}

impl NewPage {
	fn form_data(&self) -> anyhow::Result<Value> {
		let mut data = Map::new();
		data.insert("title".to_string(), json!(self.title));
		data.insert("slug".to_string(), json!(self.slug));
		data.insert("show_in_menus".to_string(), json!(self.show_in_menus));
		if let Some(subtitle) = &self.subtitle {
			data.insert("subtitle".to_string(), json!(subtitle));
		}
		if let Some(cover) = &self.cover_image {
			data.insert("cover_image".to_string(), json!(cover));
		}
		if let Some(body) = &self.body {
			data.insert("body".to_string(), json!(body));
		}
		if !self.blocks.is_empty() {
			let blocks = self
				.blocks
				.iter()
				.map(|block| parse_block(block))
				.collect::<anyhow::Result<Vec<_>>>()?;
			data.insert("body".to_string(), Value::Array(blocks));
		}
		Ok(Value::Object(data))
	}
}

fn parse_block(block: &str) -> anyhow::Result<Value> {
	let Some((kind, value)) = block.split_once(':') else {
		bail!("block `{block}` must look like KIND:VALUE, e.g. text:<p>Hello</p>");
	};
	Ok(json!({"type": kind, "value": value}))
}

/// Create a page through the admin form of its type
pub(crate) async fn add_page(site: &mut Site, new_page: &NewPage) -> anyhow::Result<PageNode> {
	let registry = AdminPageRegistry::with_defaults();
	let Some(descriptor) = registry.get(&new_page.page_type) else {
		bail!(
			"unknown page type `{}` (expected one of: {})",
			new_page.page_type,
			registry.type_names().join(", ")
		);
	};

	let parent = match &new_page.parent {
		Some(path) => Some(
			site.find_by_path(path)
				.await
				.with_context(|| format!("no page at {path}"))?,
		),
		None => None,
	};
	if !descriptor.can_create_at(parent.as_ref()) {
		bail!("a {} cannot be created here", descriptor.label());
	}

	let page = PageEditor::new()
		.bind_new(descriptor, &new_page.form_data()?, site.images())
		.map_err(CmsError::from)?;
	let node = site.create_page(parent.map(|p| p.id), page).await?;
	Ok(node)
}

/// Upload an image file and copy it under the media root
pub(crate) async fn upload_image(
	site: &mut Site,
	ctx: &CommandContext,
	file: &Path,
	title: Option<&str>,
) -> anyhow::Result<Image> {
	let data = fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
	let filename = file
		.file_name()
		.and_then(|name| name.to_str())
		.with_context(|| format!("{} has no usable file name", file.display()))?
		.to_string();

	let image = site
		.upload_image(title.unwrap_or_default(), filename, data.clone())
		.await?;

	let target = ctx.media_root.join(image.file_path());
	if let Some(dir) = target.parent() {
		fs::create_dir_all(dir)?;
	}
	fs::write(&target, &data).with_context(|| format!("failed to write {}", target.display()))?;
	Ok(image)
}

/// Delete an image, returning it with the pages that referenced it
pub(crate) async fn delete_image(
	site: &mut Site,
	ctx: &CommandContext,
	id: &str,
) -> anyhow::Result<(Image, Vec<PageId>)> {
	let id: ImageId = id
		.parse()
		.with_context(|| format!("`{id}` is not an image id"))?;
	let referencing = site.pages_using_image(id);
	let image = site.delete_image(id).await?;

	let file = ctx.media_root.join(image.file_path());
	if file.exists() {
		fs::remove_file(&file).with_context(|| format!("failed to remove {}", file.display()))?;
	}
	Ok((image, referencing))
}

/// Publish or unpublish the page at `path`
pub(crate) async fn set_published(
	site: &mut Site,
	path: &str,
	published: bool,
) -> anyhow::Result<PageState> {
	let id = page_id_at(site, path).await?;
	let state = if published {
		site.publish(id).await?
	} else {
		site.unpublish(id).await?
	};
	Ok(state)
}

/// Template context of a page as JSON, or its rendered body.
///
/// Shows the served content unless `preview` asks for the latest draft.
pub(crate) async fn show(
	site: &Site,
	path: &str,
	body: bool,
	preview: bool,
) -> anyhow::Result<String> {
	let id = page_id_at(site, path).await?;
	if body {
		let library = BlockLibrary::standard(site.media_url());
		let html = if preview {
			site.preview_body(id, &library).await?
		} else {
			site.render_body(id, &library).await?
		};
		return Ok(html);
	}
	let context = if preview {
		site.preview_context(id).await?
	} else {
		site.render_context(id).await?
	};
	Ok(serde_json::to_string_pretty(&context)?)
}

/// Validation failures of stored pages
pub(crate) fn check(site: &Site) -> Vec<String> {
	site.check()
		.into_iter()
		.map(|(node, errors)| format!("{}: {}", node.path, errors))
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};
	use tempfile::TempDir;

	struct Workspace {
		_dir: TempDir,
		ctx: CommandContext,
	}

	#[fixture]
	fn workspace() -> Workspace {
		let dir = TempDir::new().unwrap();
		let ctx = CommandContext {
			data_file: dir.path().join("data/site.json"),
			media_root: dir.path().join("media"),
			media_url: "/media/".to_string(),
		};
		init(&ctx, false).unwrap();
		Workspace { _dir: dir, ctx }
	}

	fn about(cover: Option<String>) -> NewPage {
		NewPage {
			page_type: "WebPage".to_string(),
			parent: Some("/home".to_string()),
			title: "About".to_string(),
			slug: "about".to_string(),
			subtitle: Some("Our Story".to_string()),
			cover_image: cover,
			blocks: vec!["text:<p>Hello</p>".to_string()],
			..NewPage::default()
		}
	}

	async fn with_home(ctx: &CommandContext) -> Site {
		let mut site = ctx.load_site().unwrap();
		let home = NewPage {
			page_type: "HomePage".to_string(),
			title: "Home".to_string(),
			slug: "home".to_string(),
			body: Some("<p>Welcome</p>".to_string()),
			..NewPage::default()
		};
		add_page(&mut site, &home).await.unwrap();
		site
	}

	#[rstest]
	fn test_init_refuses_to_overwrite(workspace: Workspace) {
		let result = init(&workspace.ctx, false);

		assert!(result.is_err());
		assert!(init(&workspace.ctx, true).is_ok());
		assert!(workspace.ctx.media_root.is_dir());
	}

	#[rstest]
	fn test_load_without_init_fails() {
		let dir = TempDir::new().unwrap();
		let ctx = CommandContext {
			data_file: dir.path().join("missing.json"),
			media_root: dir.path().join("media"),
			media_url: "/media/".to_string(),
		};

		let err = ctx.load_site().unwrap_err();

		assert!(err.to_string().contains("homesite-admin init"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_add_pages_and_list_tree(workspace: Workspace) {
		// Arrange
		let mut site = with_home(&workspace.ctx).await;

		// Act
		add_page(&mut site, &about(None)).await.unwrap();
		set_published(&mut site, "/home", true).await.unwrap();
		workspace.ctx.save_site(&site).unwrap();
		let reloaded = workspace.ctx.load_site().unwrap();

		// Assert
		assert_eq!(
			tree(&reloaded).await.unwrap(),
			vec![
				"Home [HomePage] live /home".to_string(),
				"  About [WebPage] draft /home/about".to_string(),
			]
		);
	}

	#[rstest]
	#[case("BlogPage", "unknown page type")]
	#[case("WebPage", "no page at /missing")]
	#[tokio::test]
	async fn test_add_page_errors(
		workspace: Workspace,
		#[case] page_type: &str,
		#[case] message: &str,
	) {
		let mut site = workspace.ctx.load_site().unwrap();
		let new_page = NewPage {
			page_type: page_type.to_string(),
			parent: Some("/missing".to_string()),
			title: "About".to_string(),
			slug: "about".to_string(),
			..NewPage::default()
		};

		let err = add_page(&mut site, &new_page).await.unwrap_err();

		assert!(err.to_string().contains(message), "{err}");
		assert_eq!(site.page_count(), 0);
	}

	#[rstest]
	#[tokio::test]
	async fn test_add_page_rejects_overlong_subtitle(workspace: Workspace) {
		let mut site = with_home(&workspace.ctx).await;
		let mut new_page = about(None);
		new_page.subtitle = Some("x".repeat(256));

		let result = add_page(&mut site, &new_page).await;

		assert!(result.is_err());
		assert_eq!(site.page_count(), 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_add_page_rejects_unknown_block_kind(workspace: Workspace) {
		let mut site = with_home(&workspace.ctx).await;
		let mut new_page = about(None);
		new_page.blocks.push("video:intro.mp4".to_string());

		let result = add_page(&mut site, &new_page).await;

		assert!(result.is_err());
		assert_eq!(site.page_count(), 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_delete_image_unsets_cover(workspace: Workspace) {
		// Arrange
		let mut site = with_home(&workspace.ctx).await;
		let source = workspace.ctx.media_root.join("upload.gif");
		fs::write(&source, [0u8; 16]).unwrap();
		let image = upload_image(&mut site, &workspace.ctx, &source, Some("Cover"))
			.await
			.unwrap();
		let exported = workspace.ctx.media_root.join(image.file_path());
		let node = add_page(&mut site, &about(Some(image.id.to_string())))
			.await
			.unwrap();

		// Act
		let (deleted, referencing) =
			delete_image(&mut site, &workspace.ctx, &image.id.to_string())
				.await
				.unwrap();

		// Assert
		assert_eq!(deleted.title, "Cover");
		assert_eq!(referencing, vec![node.id]);
		assert!(!exported.exists());
		let page = site.get_page(node.id).await.unwrap();
		assert_eq!(page.as_web().unwrap().cover_image, None);
		assert!(check(&site).is_empty());
	}

	#[rstest]
	#[tokio::test]
	async fn test_show_renders_context_and_body(workspace: Workspace) {
		let mut site = with_home(&workspace.ctx).await;
		add_page(&mut site, &about(None)).await.unwrap();

		let context: Value =
			serde_json::from_str(&show(&site, "/home/about/", false, false).await.unwrap()).unwrap();
		let body = show(&site, "/home/about", true, false).await.unwrap();

		assert_eq!(context["subtitle"], json!("Our Story"));
		assert_eq!(context["cover_image"], Value::Null);
		assert!(body.contains("<p>Hello</p>"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_show_preview_includes_unpublished_edits(workspace: Workspace) {
		// Arrange
		let mut site = with_home(&workspace.ctx).await;
		set_published(&mut site, "/home", true).await.unwrap();
		let mut home = site.find_by_path("/home").await.unwrap();
		home.as_home_mut().unwrap().body = "<p>Coming soon</p>".into();
		site.update_page(home, None).await.unwrap();

		// Act
		let served = show(&site, "/home", true, false).await.unwrap();
		let preview = show(&site, "/home", true, true).await.unwrap();

		// Assert
		assert_eq!(served, "<p>Welcome</p>");
		assert_eq!(preview, "<p>Coming soon</p>");
	}

	#[rstest]
	#[tokio::test]
	async fn test_same_named_uploads_keep_separate_files(workspace: Workspace) {
		// Arrange
		let mut site = with_home(&workspace.ctx).await;
		let first_dir = workspace.ctx.media_root.join("a");
		let second_dir = workspace.ctx.media_root.join("b");
		fs::create_dir_all(&first_dir).unwrap();
		fs::create_dir_all(&second_dir).unwrap();
		fs::write(first_dir.join("cover.gif"), [1u8; 16]).unwrap();
		fs::write(second_dir.join("cover.gif"), [2u8; 16]).unwrap();
		let first = upload_image(&mut site, &workspace.ctx, &first_dir.join("cover.gif"), None)
			.await
			.unwrap();
		let second = upload_image(&mut site, &workspace.ctx, &second_dir.join("cover.gif"), None)
			.await
			.unwrap();

		// Act
		delete_image(&mut site, &workspace.ctx, &first.id.to_string())
			.await
			.unwrap();

		// Assert
		let kept = workspace.ctx.media_root.join(second.file_path());
		assert!(!workspace.ctx.media_root.join(first.file_path()).exists());
		assert_eq!(fs::read(&kept).unwrap(), vec![2u8; 16]);
	}

	#[rstest]
	#[tokio::test]
	async fn test_unpublish_draft_fails(workspace: Workspace) {
		let mut site = with_home(&workspace.ctx).await;

		let result = set_published(&mut site, "/home", false).await;

		assert!(result.is_err());
	}
}
