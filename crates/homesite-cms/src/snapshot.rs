//! JSON persistence of a whole site
//!
//! A snapshot lists pages parents-first with their tree nodes, the image
//! records with base64-encoded bytes, and the lifecycle engine state.

use crate::error::{CmsError, CmsResult};
use crate::media::ImageRecord;
use crate::models::Page;
use crate::pages::PageNode;
use crate::workflow::WorkflowEngine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// A page with its tree position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageEntry {
	/// Tree node
	pub node: PageNode,
	/// Page record
	pub page: Page,
}

/// Serializable state of a site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSnapshot {
	/// Format version
	pub version: u32,

	/// When the snapshot was taken
	pub created_at: DateTime<Utc>,

	/// Pages, parents before children
	pub pages: Vec<PageEntry>,

	/// Images with their bytes
	#[serde(default)]
	pub images: Vec<ImageRecord>,

	/// Lifecycle states and revisions
	#[serde(default)]
	pub workflow: WorkflowEngine,
}

impl SiteSnapshot {
	/// Snapshot of the given parts, stamped now
	pub fn new(pages: Vec<PageEntry>, images: Vec<ImageRecord>, workflow: WorkflowEngine) -> Self {
		Self {
			version: SNAPSHOT_VERSION,
			created_at: Utc::now(),
			pages,
			images,
			workflow,
		}
	}

	/// Serialize to pretty-printed JSON
	pub fn to_json(&self) -> CmsResult<String> {
		Ok(serde_json::to_string_pretty(self)?)
	}

	/// Parse a snapshot, rejecting newer format versions
	pub fn from_json(json: &str) -> CmsResult<Self> {
		let snapshot: Self = serde_json::from_str(json)?;
		if snapshot.version > SNAPSHOT_VERSION {
			return Err(CmsError::Serialization(serde::de::Error::custom(format!(
				"unsupported snapshot version {} (expected at most {SNAPSHOT_VERSION})",
				snapshot.version
			))));
		}
		Ok(snapshot)
	}

	/// Write to a file, creating parent directories
	pub fn save(&self, path: impl AsRef<Path>) -> CmsResult<()> {
		let path = path.as_ref();
		if let Some(parent) = path.parent()
			&& !parent.as_os_str().is_empty()
		{
			fs::create_dir_all(parent)?;
		}
		fs::write(path, self.to_json()?)?;
		tracing::info!(path = %path.display(), pages = self.pages.len(), "snapshot saved");
		Ok(())
	}

	/// Read from a file
	pub fn load(path: impl AsRef<Path>) -> CmsResult<Self> {
		let path = path.as_ref();
		let snapshot = Self::from_json(&fs::read_to_string(path)?)?;
		tracing::debug!(path = %path.display(), pages = snapshot.pages.len(), "snapshot loaded");
		Ok(snapshot)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_newer_version_is_rejected() {
		let mut snapshot = SiteSnapshot::new(Vec::new(), Vec::new(), WorkflowEngine::new());
		snapshot.version = SNAPSHOT_VERSION + 1;
		let json = snapshot.to_json().unwrap();

		assert!(matches!(
			SiteSnapshot::from_json(&json),
			Err(CmsError::Serialization(_))
		));
	}

	#[rstest]
	fn test_save_creates_parent_directories() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("data").join("site.json");
		let snapshot = SiteSnapshot::new(Vec::new(), Vec::new(), WorkflowEngine::new());

		snapshot.save(&path).unwrap();

		assert_eq!(SiteSnapshot::load(&path).unwrap().pages, Vec::new());
	}
}
