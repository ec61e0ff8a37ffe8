//! Hierarchical page tree
//!
//! Pages form a forest: each node has at most one parent and an ordered list
//! of children. A node's URL path is derived from the slugs of its ancestors
//! and is recomputed for a whole subtree whenever a slug changes or the
//! subtree moves.

use crate::error::{CmsError, CmsResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Page identifier
pub type PageId = Uuid;

/// A node in the page tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageNode {
	/// Page id
	pub id: PageId,

	/// Parent page, `None` for root pages
	pub parent: Option<PageId>,

	/// Page title
	pub title: String,

	/// URL slug, unique among siblings
	pub slug: String,

	/// URL path, e.g. `/home/about`
	pub path: String,

	/// Distance from the root (roots have depth 0)
	pub depth: usize,
}

/// Tree of pages with ordered siblings
#[derive(Debug, Default)]
pub struct PageTree {
	nodes: HashMap<PageId, PageNode>,
	children: HashMap<Option<PageId>, Vec<PageId>>,
}

impl PageTree {
	/// Create an empty tree
	pub fn new() -> Self {
		Self::default()
	}

	/// Add a page with a generated id as the last child of `parent`
	pub async fn add_page(
		&mut self,
		parent: Option<PageId>,
		title: String,
		slug: String,
	) -> CmsResult<PageNode> {
		self.insert(Uuid::new_v4(), parent, title, slug)
	}

	/// Add a page with a known id as the last child of `parent`
	pub(crate) fn insert(
		&mut self,
		id: PageId,
		parent: Option<PageId>,
		title: String,
		slug: String,
	) -> CmsResult<PageNode> {
		if self.nodes.contains_key(&id) {
			return Err(CmsError::InvalidHierarchy(format!(
				"page {id} is already in the tree"
			)));
		}
		let (parent_path, depth) = match parent {
			Some(parent_id) => {
				let parent_node = self.node(parent_id)?;
				(parent_node.path.clone(), parent_node.depth + 1)
			}
			None => (String::new(), 0),
		};
		self.ensure_unique_slug(parent, &slug, None)?;

		let node = PageNode {
			id,
			parent,
			path: format!("{parent_path}/{slug}"),
			title,
			slug,
			depth,
		};
		self.nodes.insert(id, node.clone());
		self.children.entry(parent).or_default().push(id);

		tracing::debug!(page_id = %id, path = %node.path, "page added to tree");
		Ok(node)
	}

	/// Get a page node
	pub fn get(&self, id: PageId) -> Option<&PageNode> {
		self.nodes.get(&id)
	}

	/// Get a page node, failing when it does not exist
	pub async fn get_page(&self, id: PageId) -> CmsResult<PageNode> {
		self.node(id).cloned()
	}

	/// Whether the tree contains a page
	pub fn contains(&self, id: PageId) -> bool {
		self.nodes.contains_key(&id)
	}

	/// Number of pages
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	/// True when the tree has no pages
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Children of `parent` in sibling order (`None` lists the roots)
	pub fn children(&self, parent: Option<PageId>) -> Vec<PageNode> {
		self.child_ids(parent)
			.iter()
			.filter_map(|id| self.nodes.get(id).cloned())
			.collect()
	}

	/// Ancestors of a page, root first, excluding the page itself
	pub fn ancestors(&self, id: PageId) -> CmsResult<Vec<PageNode>> {
		let mut ancestors = Vec::new();
		let mut current = self.node(id)?.parent;
		while let Some(parent_id) = current {
			let parent = self.node(parent_id)?;
			ancestors.push(parent.clone());
			current = parent.parent;
		}
		ancestors.reverse();
		Ok(ancestors)
	}

	/// Descendants of a page in depth-first order, excluding the page itself
	pub fn descendants(&self, id: PageId) -> CmsResult<Vec<PageNode>> {
		self.node(id)?;
		let mut out = Vec::new();
		self.collect_subtree(Some(id), &mut out);
		Ok(out)
	}

	/// Every page in depth-first, sibling order
	pub fn walk(&self) -> Vec<PageNode> {
		let mut out = Vec::new();
		self.collect_subtree(None, &mut out);
		out
	}

	/// Find a page by URL path; a trailing slash is ignored
	pub fn find_by_path(&self, path: &str) -> Option<&PageNode> {
		let normalized = format!("/{}", path.trim_matches('/'));
		self.nodes.values().find(|n| n.path == normalized)
	}

	/// Change a page's title
	pub async fn set_title(&mut self, id: PageId, title: String) -> CmsResult<()> {
		self.node_mut(id)?.title = title;
		Ok(())
	}

	/// Change a page's slug, re-deriving paths of its subtree
	pub async fn update_slug(&mut self, id: PageId, slug: String) -> CmsResult<PageNode> {
		let parent = self.node(id)?.parent;
		self.ensure_unique_slug(parent, &slug, Some(id))?;
		self.node_mut(id)?.slug = slug;
		self.refresh_subtree(id)?;
		self.node(id).cloned()
	}

	/// Move a page (with its subtree) under `new_parent`.
	///
	/// `position` is the index among the new siblings; `None` appends.
	pub async fn move_page(
		&mut self,
		id: PageId,
		new_parent: Option<PageId>,
		position: Option<usize>,
	) -> CmsResult<PageNode> {
		let node = self.node(id)?.clone();
		if let Some(target) = new_parent {
			self.node(target)?;
			if target == id || self.is_descendant(target, id) {
				return Err(CmsError::InvalidHierarchy(format!(
					"cannot move page {id} under its own subtree"
				)));
			}
		}
		self.ensure_unique_slug(new_parent, &node.slug, Some(id))?;

		let target_len = self.child_ids(new_parent).iter().filter(|c| **c != id).count();
		let position = position.unwrap_or(target_len);
		if position > target_len {
			return Err(CmsError::InvalidPosition {
				position,
				len: target_len,
			});
		}

		self.detach(id, node.parent);
		self.children
			.entry(new_parent)
			.or_default()
			.insert(position, id);
		self.node_mut(id)?.parent = new_parent;
		self.refresh_subtree(id)?;

		let moved = self.node(id)?.clone();
		tracing::info!(page_id = %id, path = %moved.path, "page moved");
		Ok(moved)
	}

	/// Move a page to `position` among its current siblings
	pub async fn reorder(&mut self, id: PageId, position: usize) -> CmsResult<()> {
		let parent = self.node(id)?.parent;
		self.move_page(id, parent, Some(position)).await.map(|_| ())
	}

	/// Remove a page and its subtree, returning the removed ids (page first)
	pub async fn remove_page(&mut self, id: PageId) -> CmsResult<Vec<PageId>> {
		let node = self.node(id)?.clone();
		let mut removed = vec![id];
		removed.extend(self.descendants(id)?.into_iter().map(|n| n.id));

		self.detach(id, node.parent);
		for page_id in &removed {
			self.nodes.remove(page_id);
			self.children.remove(&Some(*page_id));
		}
		tracing::info!(page_id = %id, removed = removed.len(), "page subtree removed");
		Ok(removed)
	}

	/// Rebuild a tree from nodes listed parents-before-children.
	///
	/// Paths and depths are recomputed rather than trusted.
	pub fn from_nodes(nodes: impl IntoIterator<Item = PageNode>) -> CmsResult<Self> {
		let mut tree = Self::new();
		for node in nodes {
			tree.insert(node.id, node.parent, node.title, node.slug)?;
		}
		Ok(tree)
	}

	fn node(&self, id: PageId) -> CmsResult<&PageNode> {
		self.nodes
			.get(&id)
			.ok_or_else(|| CmsError::PageNotFound(id.to_string()))
	}

	fn node_mut(&mut self, id: PageId) -> CmsResult<&mut PageNode> {
		self.nodes
			.get_mut(&id)
			.ok_or_else(|| CmsError::PageNotFound(id.to_string()))
	}

	fn child_ids(&self, parent: Option<PageId>) -> &[PageId] {
		self.children.get(&parent).map(Vec::as_slice).unwrap_or(&[])
	}

	fn ensure_unique_slug(
		&self,
		parent: Option<PageId>,
		slug: &str,
		except: Option<PageId>,
	) -> CmsResult<()> {
		let taken = self
			.child_ids(parent)
			.iter()
			.filter(|id| Some(**id) != except)
			.filter_map(|id| self.nodes.get(id))
			.any(|n| n.slug == slug);
		if taken {
			return Err(CmsError::DuplicateSlug(slug.to_string()));
		}
		Ok(())
	}

	fn is_descendant(&self, candidate: PageId, ancestor: PageId) -> bool {
		let mut current = self.nodes.get(&candidate).and_then(|n| n.parent);
		while let Some(id) = current {
			if id == ancestor {
				return true;
			}
			current = self.nodes.get(&id).and_then(|n| n.parent);
		}
		false
	}

	fn detach(&mut self, id: PageId, parent: Option<PageId>) {
		if let Some(siblings) = self.children.get_mut(&parent) {
			siblings.retain(|c| *c != id);
			if siblings.is_empty() {
				self.children.remove(&parent);
			}
		}
	}

	fn collect_subtree(&self, parent: Option<PageId>, out: &mut Vec<PageNode>) {
		for child in self.child_ids(parent) {
			if let Some(node) = self.nodes.get(child) {
				out.push(node.clone());
				self.collect_subtree(Some(*child), out);
			}
		}
	}

	fn refresh_subtree(&mut self, id: PageId) -> CmsResult<()> {
		let (parent_path, depth) = match self.node(id)?.parent {
			Some(parent_id) => {
				let parent = self.node(parent_id)?;
				(parent.path.clone(), parent.depth + 1)
			}
			None => (String::new(), 0),
		};
		let node = self.node_mut(id)?;
		node.path = format!("{parent_path}/{}", node.slug);
		node.depth = depth;

		let children = self.child_ids(Some(id)).to_vec();
		for child in children {
			self.refresh_subtree(child)?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[tokio::test]
	async fn test_paths_follow_slugs() {
		let mut tree = PageTree::new();
		let home = tree
			.add_page(None, "Home".to_string(), "home".to_string())
			.await
			.unwrap();
		let about = tree
			.add_page(Some(home.id), "About".to_string(), "about".to_string())
			.await
			.unwrap();

		assert_eq!(home.path, "/home");
		assert_eq!(about.path, "/home/about");
		assert_eq!(about.depth, 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_slug_change_updates_descendants() {
		let mut tree = PageTree::new();
		let home = tree
			.add_page(None, "Home".to_string(), "home".to_string())
			.await
			.unwrap();
		let about = tree
			.add_page(Some(home.id), "About".to_string(), "about".to_string())
			.await
			.unwrap();
		let team = tree
			.add_page(Some(about.id), "Team".to_string(), "team".to_string())
			.await
			.unwrap();

		tree.update_slug(about.id, "who-we-are".to_string())
			.await
			.unwrap();

		assert_eq!(tree.get(team.id).unwrap().path, "/home/who-we-are/team");
	}

	#[rstest]
	#[tokio::test]
	async fn test_remove_clears_child_lists() {
		let mut tree = PageTree::new();
		let home = tree
			.add_page(None, "Home".to_string(), "home".to_string())
			.await
			.unwrap();
		let about = tree
			.add_page(Some(home.id), "About".to_string(), "about".to_string())
			.await
			.unwrap();

		tree.remove_page(about.id).await.unwrap();

		assert!(tree.children(Some(home.id)).is_empty());
		assert!(!tree.children.contains_key(&Some(home.id)));
	}
}
