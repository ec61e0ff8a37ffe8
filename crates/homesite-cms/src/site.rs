//! Content store
//!
//! [`Site`] owns the page tree, the page records, the image store and the
//! lifecycle engine, and keeps them consistent: every page record has exactly
//! one tree node, every saved edit becomes a revision, and deleting an image
//! unsets the cover images pointing at it.

use crate::blocks::{BlockId, BlockLibrary, ContentBlock};
use crate::error::{CmsError, CmsResult};
use crate::fields::ValidationErrors;
use crate::media::{Image, ImageId, ImageStore};
use crate::models::{Page, PageVariant};
use crate::pages::{PageId, PageNode, PageTree};
use crate::snapshot::{PageEntry, SiteSnapshot};
use crate::templates::TemplateContext;
use crate::workflow::{LifecycleStatus, PageState, Revision, WorkflowEngine, WorkflowTransition};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Default prefix of image URLs
pub const DEFAULT_MEDIA_URL: &str = "/media/";

const SET_NULL_RECEIVER: &str = "homesite.cover_image.set_null";

type PageMap = Arc<RwLock<HashMap<PageId, Page>>>;

/// The content store of one site
#[derive(Debug)]
pub struct Site {
	tree: PageTree,
	pages: PageMap,
	images: ImageStore,
	workflow: WorkflowEngine,
	media_url: String,
}

impl Site {
	/// Create an empty site
	pub fn new() -> Self {
		Self::with_media_url(DEFAULT_MEDIA_URL)
	}

	/// Create an empty site serving images under `media_url`
	pub fn with_media_url(media_url: impl Into<String>) -> Self {
		let site = Self {
			tree: PageTree::new(),
			pages: Arc::new(RwLock::new(HashMap::new())),
			images: ImageStore::new(),
			workflow: WorkflowEngine::new(),
			media_url: media_url.into(),
		};
		site.connect_image_receivers();
		site
	}

	fn connect_image_receivers(&self) {
		let pages = Arc::clone(&self.pages);
		self.images
			.post_delete
			.connect(SET_NULL_RECEIVER, move |event| {
				let mut pages = pages.write();
				for page in pages.values_mut() {
					if page.on_image_deleted(event.image_id) {
						tracing::info!(
							page_id = %page.id,
							image_id = %event.image_id,
							"cover image unset after image deletion"
						);
					}
				}
			});
	}

	/// URL prefix of image files
	pub fn media_url(&self) -> &str {
		&self.media_url
	}

	/// The page tree
	pub fn tree(&self) -> &PageTree {
		&self.tree
	}

	/// The image store
	pub fn images(&self) -> &ImageStore {
		&self.images
	}

	/// The lifecycle engine
	pub fn workflow(&self) -> &WorkflowEngine {
		&self.workflow
	}

	/// Number of pages
	pub fn page_count(&self) -> usize {
		self.tree.len()
	}

	/// Validate a page and place it under `parent`.
	///
	/// The first revision is saved; the page starts as a draft.
	pub async fn create_page(&mut self, parent: Option<PageId>, page: Page) -> CmsResult<PageNode> {
		page.validate(&self.images)?;
		let content = serde_json::to_value(&page)?;

		let node = self
			.tree
			.insert(page.id, parent, page.title.clone(), page.slug.clone())?;
		self.workflow
			.create_revision(page.id, content, Some("Created".to_string()))
			.await?;

		tracing::info!(page_id = %page.id, page_type = page.type_name(), path = %node.path, "page created");
		self.pages.write().insert(page.id, page);
		Ok(node)
	}

	/// Get a page record
	pub async fn get_page(&self, id: PageId) -> CmsResult<Page> {
		self.pages
			.read()
			.get(&id)
			.cloned()
			.ok_or_else(|| CmsError::PageNotFound(id.to_string()))
	}

	/// Get a page's tree node
	pub async fn node(&self, id: PageId) -> CmsResult<PageNode> {
		self.tree.get_page(id).await
	}

	/// Find a page by URL path
	pub async fn find_by_path(&self, path: &str) -> CmsResult<Page> {
		let id = self
			.tree
			.find_by_path(path)
			.map(|node| node.id)
			.ok_or_else(|| CmsError::PageNotFound(path.to_string()))?;
		self.get_page(id).await
	}

	/// Children of `parent` with their records, in sibling order
	pub fn children(&self, parent: Option<PageId>) -> Vec<(PageNode, Page)> {
		let pages = self.pages.read();
		self.tree
			.children(parent)
			.into_iter()
			.filter_map(|node| pages.get(&node.id).cloned().map(|page| (node, page)))
			.collect()
	}

	/// Save an edited page as a new revision.
	///
	/// The page type cannot change. A slug change re-derives the paths of the
	/// page's subtree.
	pub async fn update_page(&mut self, page: Page, message: Option<String>) -> CmsResult<Revision> {
		let current = self.get_page(page.id).await?;
		if current.type_name() != page.type_name() {
			return Err(CmsError::InvalidHierarchy(format!(
				"cannot change page {} from {} to {}",
				page.id,
				current.type_name(),
				page.type_name()
			)));
		}
		page.validate(&self.images)?;
		let content = serde_json::to_value(&page)?;

		self.apply(&current, page).await?;
		self.workflow.create_revision(current.id, content, message).await
	}

	async fn apply(&mut self, current: &Page, page: Page) -> CmsResult<()> {
		if current.slug != page.slug {
			self.tree.update_slug(page.id, page.slug.clone()).await?;
		}
		if current.title != page.title {
			self.tree.set_title(page.id, page.title.clone()).await?;
		}
		tracing::debug!(page_id = %page.id, "page record updated");
		self.pages.write().insert(page.id, page);
		Ok(())
	}

	/// Move a page and its subtree
	pub async fn move_page(
		&mut self,
		id: PageId,
		new_parent: Option<PageId>,
		position: Option<usize>,
	) -> CmsResult<PageNode> {
		self.tree.move_page(id, new_parent, position).await
	}

	/// Delete a page and its subtree, returning the removed ids
	pub async fn delete_page(&mut self, id: PageId) -> CmsResult<Vec<PageId>> {
		let removed = self.tree.remove_page(id).await?;
		let mut pages = self.pages.write();
		for page_id in &removed {
			pages.remove(page_id);
			self.workflow.forget(*page_id);
		}
		tracing::info!(page_id = %id, removed = removed.len(), "page deleted");
		Ok(removed)
	}

	/// Make a page live
	pub async fn publish(&mut self, id: PageId) -> CmsResult<PageState> {
		self.tree.get_page(id).await?;
		self.workflow.transition(id, WorkflowTransition::Publish).await
	}

	/// Take a live page offline
	pub async fn unpublish(&mut self, id: PageId) -> CmsResult<PageState> {
		self.tree.get_page(id).await?;
		self.workflow
			.transition(id, WorkflowTransition::Unpublish)
			.await
	}

	/// Lifecycle state of a page
	pub async fn state(&self, id: PageId) -> CmsResult<PageState> {
		self.tree.get_page(id).await?;
		self.workflow.get_state(id).await
	}

	/// Full lifecycle status of a page
	pub async fn status(&self, id: PageId) -> CmsResult<LifecycleStatus> {
		self.tree.get_page(id).await?;
		Ok(self.workflow.status(id))
	}

	/// Revisions of a page, oldest first
	pub async fn revisions(&self, id: PageId) -> CmsResult<Vec<Revision>> {
		self.tree.get_page(id).await?;
		self.workflow.revisions(id).await
	}

	/// Bring back an older revision's content as a new revision
	pub async fn restore_revision(&mut self, id: PageId, revision_id: Uuid) -> CmsResult<Page> {
		let current = self.get_page(id).await?;
		let revision = self
			.workflow
			.revisions(id)
			.await?
			.into_iter()
			.find(|r| r.id == revision_id)
			.ok_or_else(|| CmsError::RevisionNotFound(revision_id.to_string()))?;

		let mut restored: Page = serde_json::from_value(revision.content)?;
		self.detach_deleted_images(&mut restored)?;
		restored.validate(&self.images)?;

		self.apply(&current, restored.clone()).await?;
		self.workflow.restore_revision(id, revision_id).await?;
		Ok(restored)
	}

	/// Images deleted since `page` was saved stay deleted: the cover is unset
	/// and body blocks showing them are dropped.
	fn detach_deleted_images(&self, page: &mut Page) -> CmsResult<()> {
		for image_id in page.specific.image_references() {
			if !self.images.exists(image_id) {
				page.on_image_deleted(image_id);
			}
		}
		if let PageVariant::WebPage(web) = &mut page.specific {
			let dangling: Vec<BlockId> = web
				.body
				.iter()
				.filter(|block| {
					matches!(block.content, ContentBlock::Image(id) if !self.images.exists(id))
				})
				.map(|block| block.id)
				.collect();
			for block_id in dangling {
				web.body.remove(block_id)?;
			}
		}
		Ok(())
	}

	/// Upload an image
	pub async fn upload_image(
		&mut self,
		title: impl Into<String>,
		filename: impl Into<String>,
		data: Vec<u8>,
	) -> CmsResult<Image> {
		self.images.upload(title, filename, data).await
	}

	/// Get image metadata
	pub async fn image(&self, id: ImageId) -> CmsResult<Image> {
		self.images.get(id).await
	}

	/// Delete an image; cover images referencing it are unset
	pub async fn delete_image(&mut self, id: ImageId) -> CmsResult<Image> {
		self.images.delete(id).await
	}

	/// Pages referencing an image, as cover or in a body block
	pub fn pages_using_image(&self, id: ImageId) -> Vec<PageId> {
		let mut ids: Vec<PageId> = self
			.pages
			.read()
			.values()
			.filter(|page| page.specific.image_references().contains(&id))
			.map(|page| page.id)
			.collect();
		ids.sort();
		ids
	}

	/// Re-validate every page, returning the failures
	pub fn check(&self) -> Vec<(PageNode, ValidationErrors)> {
		let pages = self.pages.read();
		self.tree
			.walk()
			.into_iter()
			.filter_map(|node| {
				let page = pages.get(&node.id)?;
				page.validate(&self.images).err().map(|errors| (node, errors))
			})
			.collect()
	}

	/// Content served for a page.
	///
	/// A live page with unpublished changes serves its live revision. Any
	/// other page serves its latest saved record.
	pub async fn live_page(&self, id: PageId) -> CmsResult<Page> {
		let current = self.get_page(id).await?;
		let status = self.workflow.status(id);
		if status.state != PageState::Live || !status.has_unpublished_changes {
			return Ok(current);
		}
		let Some(revision) = self.workflow.live_revision(id) else {
			return Ok(current);
		};

		let mut page: Page = serde_json::from_value(revision.content)?;
		self.detach_deleted_images(&mut page)?;
		Ok(page)
	}

	/// Data handed to the template of a page, from its served content
	pub async fn render_context(&self, id: PageId) -> CmsResult<TemplateContext> {
		let page = self.live_page(id).await?;
		self.context_for(&page).await
	}

	/// Data handed to the template of a page, from its latest saved record
	pub async fn preview_context(&self, id: PageId) -> CmsResult<TemplateContext> {
		let page = self.get_page(id).await?;
		self.context_for(&page).await
	}

	async fn context_for(&self, page: &Page) -> CmsResult<TemplateContext> {
		let node = self.tree.get_page(page.id).await?;
		let state = self.workflow.get_state(page.id).await?;
		Ok(TemplateContext::build(
			page,
			&node,
			state,
			&self.images,
			&self.media_url,
		))
	}

	/// Render the served body of a page to HTML
	pub async fn render_body(&self, id: PageId, library: &BlockLibrary) -> CmsResult<String> {
		let page = self.live_page(id).await?;
		self.body_html(&page, library)
	}

	/// Render the latest saved body of a page to HTML
	pub async fn preview_body(&self, id: PageId, library: &BlockLibrary) -> CmsResult<String> {
		let page = self.get_page(id).await?;
		self.body_html(&page, library)
	}

	fn body_html(&self, page: &Page, library: &BlockLibrary) -> CmsResult<String> {
		match &page.specific {
			PageVariant::HomePage(home) => Ok(home.body.as_str().to_string()),
			PageVariant::WebPage(web) => web.body.render(library, &self.images),
		}
	}

	/// Capture the whole site
	pub fn snapshot(&self) -> SiteSnapshot {
		let pages = self.pages.read();
		let entries = self
			.tree
			.walk()
			.into_iter()
			.filter_map(|node| {
				pages.get(&node.id).cloned().map(|page| PageEntry { node, page })
			})
			.collect();
		SiteSnapshot::new(entries, self.images.records(), self.workflow.clone())
	}

	/// Rebuild a site from a snapshot
	pub fn restore(snapshot: SiteSnapshot, media_url: impl Into<String>) -> CmsResult<Self> {
		let mut site = Self::with_media_url(media_url);
		for record in snapshot.images {
			site.images.insert_record(record);
		}

		let mut pages = HashMap::with_capacity(snapshot.pages.len());
		let mut nodes = Vec::with_capacity(snapshot.pages.len());
		for PageEntry { node, page } in snapshot.pages {
			if node.id != page.id {
				return Err(CmsError::InvalidHierarchy(format!(
					"node {} holds page {}",
					node.id, page.id
				)));
			}
			pages.insert(page.id, page);
			nodes.push(node);
		}
		site.tree = PageTree::from_nodes(nodes)?;
		*site.pages.write() = pages;
		site.workflow = snapshot.workflow;

		tracing::info!(pages = site.tree.len(), images = site.images.len(), "site restored");
		Ok(site)
	}

	/// Write a snapshot to a JSON file
	pub fn save(&self, path: impl AsRef<Path>) -> CmsResult<()> {
		self.snapshot().save(path)
	}

	/// Load a site from a JSON snapshot file
	pub fn load(path: impl AsRef<Path>, media_url: impl Into<String>) -> CmsResult<Self> {
		Self::restore(SiteSnapshot::load(path)?, media_url)
	}
}

impl Default for Site {
	fn default() -> Self {
		Self::new()
	}
}
