//! Page lifecycle and revisions
//!
//! Pages start as drafts. Publishing makes the latest revision live; edits
//! saved afterwards stay unpublished changes until the next publish, and the
//! live revision keeps being served meanwhile. Unpublishing takes a live page
//! offline without discarding it. Every saved edit is recorded as a numbered
//! revision that can be restored later.

use crate::error::{CmsError, CmsResult};
use crate::pages::PageId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Lifecycle state of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageState {
	/// Never published
	#[default]
	Draft,
	/// Publicly visible
	Live,
	/// Was live, taken offline
	Unpublished,
}

impl fmt::Display for PageState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let label = match self {
			PageState::Draft => "draft",
			PageState::Live => "live",
			PageState::Unpublished => "unpublished",
		};
		f.write_str(label)
	}
}

/// Lifecycle transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowTransition {
	/// Make the latest revision live
	Publish,
	/// Take a live page offline
	Unpublish,
}

/// Lifecycle bookkeeping for one page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LifecycleStatus {
	/// Current state
	pub state: PageState,

	/// Saved revisions newer than the live one
	pub has_unpublished_changes: bool,

	/// First time the page went live
	pub first_published_at: Option<DateTime<Utc>>,

	/// Most recent publish
	pub last_published_at: Option<DateTime<Utc>>,

	/// Revision currently live
	pub live_revision: Option<Uuid>,
}

/// A saved version of a page's content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
	/// Revision id
	pub id: Uuid,

	/// Page the revision belongs to
	pub page_id: PageId,

	/// Sequential number, starting at 1
	pub revision_number: u32,

	/// Serialized page content
	pub content: serde_json::Value,

	/// Editor's log message
	pub message: Option<String>,

	/// When the revision was saved
	pub created_at: DateTime<Utc>,
}

/// Lifecycle state machine and revision history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowEngine {
	statuses: HashMap<PageId, LifecycleStatus>,
	revisions: HashMap<PageId, Vec<Revision>>,
}

impl WorkflowEngine {
	/// Create a new engine
	pub fn new() -> Self {
		Self::default()
	}

	/// Current state; unknown pages are drafts
	pub async fn get_state(&self, page_id: PageId) -> CmsResult<PageState> {
		Ok(self.status(page_id).state)
	}

	/// Full lifecycle status
	pub fn status(&self, page_id: PageId) -> LifecycleStatus {
		self.statuses.get(&page_id).cloned().unwrap_or_default()
	}

	/// Apply a transition, returning the new state
	pub async fn transition(
		&mut self,
		page_id: PageId,
		transition: WorkflowTransition,
	) -> CmsResult<PageState> {
		let live_revision = self.latest(page_id).map(|r| r.id);
		let status = self.statuses.entry(page_id).or_default();

		match (status.state, transition) {
			(_, WorkflowTransition::Publish) => {
				let now = Utc::now();
				status.state = PageState::Live;
				status.has_unpublished_changes = false;
				status.first_published_at.get_or_insert(now);
				status.last_published_at = Some(now);
				status.live_revision = live_revision;
			}
			(PageState::Live, WorkflowTransition::Unpublish) => {
				status.state = PageState::Unpublished;
				status.has_unpublished_changes = true;
			}
			(state, transition) => {
				return Err(CmsError::InvalidWorkflowTransition(format!(
					"{transition:?} from {state}"
				)));
			}
		}

		tracing::info!(page_id = %page_id, state = %status.state, "page state changed");
		Ok(status.state)
	}

	/// Save a revision of a page's content
	pub async fn create_revision(
		&mut self,
		page_id: PageId,
		content: serde_json::Value,
		message: Option<String>,
	) -> CmsResult<Revision> {
		let history = self.revisions.entry(page_id).or_default();
		let revision = Revision {
			id: Uuid::new_v4(),
			page_id,
			revision_number: history.last().map_or(1, |r| r.revision_number + 1),
			content,
			message,
			created_at: Utc::now(),
		};
		history.push(revision.clone());

		self.statuses.entry(page_id).or_default().has_unpublished_changes = true;
		tracing::debug!(page_id = %page_id, revision = revision.revision_number, "revision saved");
		Ok(revision)
	}

	/// Revisions of a page, oldest first
	pub async fn revisions(&self, page_id: PageId) -> CmsResult<Vec<Revision>> {
		Ok(self.revisions.get(&page_id).cloned().unwrap_or_default())
	}

	/// Most recent revision
	pub fn latest_revision(&self, page_id: PageId) -> Option<Revision> {
		self.latest(page_id).cloned()
	}

	/// The revision being served, while the page is live
	pub fn live_revision(&self, page_id: PageId) -> Option<Revision> {
		let status = self.statuses.get(&page_id)?;
		if status.state != PageState::Live {
			return None;
		}
		let live = status.live_revision?;
		self.revisions
			.get(&page_id)?
			.iter()
			.find(|r| r.id == live)
			.cloned()
	}

	/// Copy an older revision's content into a new revision
	pub async fn restore_revision(
		&mut self,
		page_id: PageId,
		revision_id: Uuid,
	) -> CmsResult<Revision> {
		let source = self
			.revisions
			.get(&page_id)
			.and_then(|history| history.iter().find(|r| r.id == revision_id))
			.ok_or_else(|| CmsError::RevisionNotFound(revision_id.to_string()))?;

		let content = source.content.clone();
		let message = Some(format!("Restored revision {}", source.revision_number));
		self.create_revision(page_id, content, message).await
	}

	/// Drop all lifecycle data of a deleted page
	pub fn forget(&mut self, page_id: PageId) {
		self.statuses.remove(&page_id);
		self.revisions.remove(&page_id);
	}

	fn latest(&self, page_id: PageId) -> Option<&Revision> {
		self.revisions.get(&page_id).and_then(|history| history.last())
	}
}
