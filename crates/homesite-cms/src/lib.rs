//! # Homesite CMS
//!
//! Page types and content structures for the homesite content service.
//!
//! ## Features
//!
//! - **Page Types**: `HomePage` (rich-text body) and `WebPage` (cover image,
//!   subtitle and a stream of text/image blocks) sharing one base record
//! - **Stream Blocks**: Ordered, typed content blocks restricted to the kinds
//!   declared by the page schema
//! - **Hierarchical Page Tree**: Parent-child placement, sibling ordering and
//!   URL path derivation
//! - **Image Assets**: Uploaded images referenced weakly by pages; deleting an
//!   image unsets the references instead of deleting pages
//! - **Lifecycle**: Draft/live/unpublished states and revision history
//! - **Admin Integration**: Panel tables and edit forms per page type
//!
//! ## Architecture
//!
//! ```text
//! homesite-cms
//! ├── pages      - Page tree, URL paths
//! ├── models     - HomePage / WebPage and the shared base record
//! ├── fields     - Field definitions, on-delete actions, validators
//! ├── blocks     - Stream field blocks (text | image)
//! ├── media      - Image asset store
//! ├── signals    - Post-delete hooks
//! ├── panels     - Admin panel tables
//! ├── admin      - Page type registry, edit forms
//! ├── templates  - Template names and rendering context
//! ├── workflow   - Lifecycle states and revisions
//! ├── site       - The content store tying everything together
//! └── snapshot   - JSON persistence
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use homesite_cms::prelude::*;
//!
//! let mut site = Site::new();
//! let home = site.create_page(None, Page::home("Home", "home")).await?;
//!
//! let mut about = Page::web("About", "about");
//! if let PageVariant::WebPage(web) = &mut about.specific {
//!     web.subtitle = Some("Our Story".to_string());
//!     web.body.push(ContentBlock::text("<p>Hello</p>"));
//! }
//! site.create_page(Some(home.id), about).await?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

// Re-export for callers building JSON payloads
pub use serde;
pub use serde_json;

// Module declarations
pub mod admin;
pub mod blocks;
pub mod fields;
mod html;
pub mod media;
pub mod models;
pub mod pages;
pub mod panels;
pub mod rich_text;
pub mod signals;
pub mod site;
pub mod snapshot;
pub mod templates;
pub mod workflow;

// Prelude for convenient imports
pub mod prelude {
	//! Convenient re-exports of commonly used items

	// Pages
	pub use crate::pages::{PageId, PageNode, PageTree};

	// Models
	pub use crate::models::{HomePage, Page, PageType, PageVariant, WebPage};

	// Blocks
	pub use crate::blocks::{
		Block, BlockKind, BlockLibrary, ContentBlock, StreamBlock, StreamBlockDefinition,
		StreamField,
	};
	pub use crate::rich_text::RichText;

	// Media
	pub use crate::media::{Image, ImageId, ImageResolver, ImageStore};

	// Fields
	pub use crate::fields::{CascadeAction, FieldDef, ValidationError, ValidationErrors};

	// Panels and admin
	pub use crate::admin::{AdminPageRegistry, PageEditor, PageTypeDescriptor};
	pub use crate::panels::{EditHandler, Panel, WidgetKind};

	// Workflow
	pub use crate::workflow::{PageState, Revision, WorkflowEngine, WorkflowTransition};

	// Store
	pub use crate::site::Site;
	pub use crate::snapshot::SiteSnapshot;
	pub use crate::templates::TemplateContext;
}

/// CMS error types
pub mod error {
	use crate::fields::ValidationErrors;
	use thiserror::Error;

	/// CMS-related errors
	#[derive(Error, Debug)]
	pub enum CmsError {
		/// Page not found
		#[error("Page not found: {0}")]
		PageNotFound(String),

		/// Invalid page hierarchy (e.g., moving a page under its own descendant)
		#[error("Invalid page hierarchy: {0}")]
		InvalidHierarchy(String),

		/// Another page under the same parent already uses the slug
		#[error("Duplicate slug under the same parent: {0}")]
		DuplicateSlug(String),

		/// Block type not allowed or unknown
		#[error("Block type not registered: {0}")]
		UnknownBlockType(String),

		/// Block not found in a stream field
		#[error("Block not found: {0}")]
		BlockNotFound(String),

		/// Position outside the bounds of a sequence
		#[error("Invalid position {position} (length {len})")]
		InvalidPosition {
			/// Requested position
			position: usize,
			/// Current sequence length
			len: usize,
		},

		/// Media file not found
		#[error("Media file not found: {0}")]
		MediaNotFound(String),

		/// Field validation failed
		#[error("Validation failed: {0}")]
		Validation(ValidationErrors),

		/// Invalid workflow transition
		#[error("Invalid workflow transition: {0}")]
		InvalidWorkflowTransition(String),

		/// Revision not found
		#[error("Revision not found: {0}")]
		RevisionNotFound(String),

		/// Serialization error
		#[error("Serialization error: {0}")]
		Serialization(#[from] serde_json::Error),

		/// I/O error while persisting or loading a snapshot
		#[error("I/O error: {0}")]
		Io(#[from] std::io::Error),
	}

	impl From<ValidationErrors> for CmsError {
		fn from(errors: ValidationErrors) -> Self {
			CmsError::Validation(errors)
		}
	}

	/// Result type for CMS operations
	pub type CmsResult<T> = Result<T, CmsError>;
}
