//! # Homesite
//!
//! A small content service: a tree of typed pages, stream-block bodies and
//! an image store whose deletions unset the cover images pointing at them.
//!
//! This facade re-exports the workspace crates:
//!
//! - [`cms`] - page types, blocks, page tree, images, lifecycle, snapshots
//! - [`conf`] - layered settings and logging setup (feature `conf`, default)
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use homesite::prelude::*;
//!
//! let settings = Settings::load(None)?;
//! let mut site = Site::with_media_url(settings.media_url.clone());
//! let home = site.create_page(None, Page::home("Home", "home")).await?;
//!
//! let mut about = Page::web("About", "about");
//! if let Some(web) = about.as_web_mut() {
//!     web.subtitle = Some("Our Story".to_string());
//!     web.body.push(ContentBlock::text("<p>Hello</p>"));
//! }
//! site.create_page(Some(home.id), about).await?;
//! site.save(&settings.data_file)?;
//! ```

pub use homesite_cms as cms;

#[cfg(feature = "conf")]
pub use homesite_conf as conf;

pub use homesite_cms::error::{CmsError, CmsResult};

/// Re-exports of commonly used items
pub mod prelude {
	pub use homesite_cms::prelude::*;

	pub use homesite_cms::error::{CmsError, CmsResult};

	#[cfg(feature = "conf")]
	pub use homesite_conf::{LoggingSettings, Settings, SettingsError, init_logging};
}
