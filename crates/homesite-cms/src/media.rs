//! Image asset store
//!
//! Images are uploaded once and referenced by id from pages. Pages never own
//! an image: deleting one fires [`ImageStore::post_delete`] and the receivers
//! decide what happens to references (the site unsets them).

use crate::error::{CmsError, CmsResult};
use crate::fields::{ValidationError, ValidationErrors};
use crate::signals::Signal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use uuid::Uuid;

/// Image identifier
pub type ImageId = Uuid;

/// File extensions accepted by the store
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp", "svg"];

/// Image metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
	/// Image id
	pub id: ImageId,

	/// Human-readable title
	pub title: String,

	/// Original filename
	pub filename: String,

	/// MIME type derived from the extension
	pub mime_type: String,

	/// Size in bytes
	pub size: usize,

	/// Pixel width when the data could be decoded
	pub width: Option<u32>,

	/// Pixel height when the data could be decoded
	pub height: Option<u32>,

	/// Upload time
	pub created_at: DateTime<Utc>,
}

impl Image {
	/// Path of the original file relative to the media root.
	///
	/// The image id prefixes the uploaded name, so uploads sharing a file
	/// name never share a path.
	pub fn file_path(&self) -> String {
		format!("original_images/{}_{}", self.id, self.filename)
	}

	/// Public URL under the given media URL prefix
	///
	/// # Examples
	///
	/// ```
	/// use homesite_cms::media::Image;
	///
	/// let image = Image {
	///     id: uuid::Uuid::nil(),
	///     title: "Logo".to_string(),
	///     filename: "logo.png".to_string(),
	///     mime_type: "image/png".to_string(),
	///     size: 0,
	///     width: None,
	///     height: None,
	///     created_at: chrono::Utc::now(),
	/// };
	/// assert_eq!(
	///     image.url("/media/"),
	///     "/media/original_images/00000000-0000-0000-0000-000000000000_logo.png"
	/// );
	/// ```
	pub fn url(&self, media_url: &str) -> String {
		format!("{}/{}", media_url.trim_end_matches('/'), self.file_path())
	}
}

/// An image together with its bytes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
	/// Metadata
	#[serde(flatten)]
	pub image: Image,

	/// Original file contents
	#[serde(with = "base64_bytes")]
	pub data: Vec<u8>,
}

/// Event sent after an image has been removed from the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDeleted {
	/// Id of the removed image
	pub image_id: ImageId,
}

/// Lookup of images by id, used by validation and rendering
pub trait ImageResolver {
	/// Resolve an image, `None` if it does not exist (any more)
	fn resolve(&self, id: ImageId) -> Option<Image>;

	/// Whether the image exists
	fn contains(&self, id: ImageId) -> bool {
		self.resolve(id).is_some()
	}
}

/// In-memory image store
#[derive(Debug, Default)]
pub struct ImageStore {
	images: HashMap<ImageId, ImageRecord>,

	/// Fired after an image is deleted
	pub post_delete: Signal<ImageDeleted>,
}

impl ImageStore {
	/// Create an empty store
	pub fn new() -> Self {
		Self::default()
	}

	/// Upload an image.
	///
	/// The extension must be one of [`ALLOWED_EXTENSIONS`]. Dimensions are
	/// read from the data when it decodes as a raster image and left unset
	/// otherwise.
	pub async fn upload(
		&mut self,
		title: impl Into<String>,
		filename: impl Into<String>,
		data: Vec<u8>,
	) -> CmsResult<Image> {
		let filename = filename.into();
		let extension = extension_of(&filename);
		if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
			return Err(ValidationErrors::single(
				"file",
				ValidationError::InvalidImageFormat(filename),
			)
			.into());
		}

		let title = title.into();
		let (width, height) = match read_dimensions(&data) {
			Some((w, h)) => (Some(w), Some(h)),
			None => {
				tracing::debug!(filename = %filename, "image dimensions could not be read");
				(None, None)
			}
		};

		let image = Image {
			id: Uuid::new_v4(),
			title: if title.trim().is_empty() {
				file_stem(&filename)
			} else {
				title
			},
			mime_type: mime_type_for(&extension).to_string(),
			size: data.len(),
			filename,
			width,
			height,
			created_at: Utc::now(),
		};

		tracing::info!(image_id = %image.id, filename = %image.filename, "image uploaded");
		self.images.insert(
			image.id,
			ImageRecord {
				image: image.clone(),
				data,
			},
		);
		Ok(image)
	}

	/// Get image metadata
	pub async fn get(&self, id: ImageId) -> CmsResult<Image> {
		self.images
			.get(&id)
			.map(|record| record.image.clone())
			.ok_or_else(|| CmsError::MediaNotFound(id.to_string()))
	}

	/// Get the original bytes of an image
	pub async fn data(&self, id: ImageId) -> CmsResult<Vec<u8>> {
		self.images
			.get(&id)
			.map(|record| record.data.clone())
			.ok_or_else(|| CmsError::MediaNotFound(id.to_string()))
	}

	/// Whether an image exists
	pub fn exists(&self, id: ImageId) -> bool {
		self.images.contains_key(&id)
	}

	/// All images, oldest first
	pub fn list(&self) -> Vec<Image> {
		let mut images: Vec<Image> = self.images.values().map(|r| r.image.clone()).collect();
		images.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
		images
	}

	/// Number of stored images
	pub fn len(&self) -> usize {
		self.images.len()
	}

	/// True when no images are stored
	pub fn is_empty(&self) -> bool {
		self.images.is_empty()
	}

	/// Delete an image and notify [`post_delete`](Self::post_delete) receivers
	pub async fn delete(&mut self, id: ImageId) -> CmsResult<Image> {
		let record = self
			.images
			.remove(&id)
			.ok_or_else(|| CmsError::MediaNotFound(id.to_string()))?;

		let notified = self.post_delete.send(&ImageDeleted { image_id: id });
		tracing::info!(image_id = %id, receivers = notified, "image deleted");
		Ok(record.image)
	}

	/// Records in upload order, for snapshots
	pub(crate) fn records(&self) -> Vec<ImageRecord> {
		let mut records: Vec<ImageRecord> = self.images.values().cloned().collect();
		records.sort_by(|a, b| {
			a.image
				.created_at
				.cmp(&b.image.created_at)
				.then(a.image.id.cmp(&b.image.id))
		});
		records
	}

	/// Put back a previously stored record without firing signals
	pub(crate) fn insert_record(&mut self, record: ImageRecord) {
		self.images.insert(record.image.id, record);
	}
}

impl ImageResolver for ImageStore {
	fn resolve(&self, id: ImageId) -> Option<Image> {
		self.images.get(&id).map(|record| record.image.clone())
	}

	fn contains(&self, id: ImageId) -> bool {
		self.exists(id)
	}
}

fn extension_of(filename: &str) -> String {
	Path::new(filename)
		.extension()
		.and_then(|ext| ext.to_str())
		.map(|ext| ext.to_ascii_lowercase())
		.unwrap_or_default()
}

fn file_stem(filename: &str) -> String {
	Path::new(filename)
		.file_stem()
		.and_then(|stem| stem.to_str())
		.unwrap_or(filename)
		.to_string()
}

fn mime_type_for(extension: &str) -> &'static str {
	match extension {
		"jpg" | "jpeg" => "image/jpeg",
		"png" => "image/png",
		"gif" => "image/gif",
		"webp" => "image/webp",
		"bmp" => "image/bmp",
		"svg" => "image/svg+xml",
		_ => "application/octet-stream",
	}
}

fn read_dimensions(data: &[u8]) -> Option<(u32, u32)> {
	if data.is_empty() {
		return None;
	}
	image::ImageReader::new(Cursor::new(data))
		.with_guessed_format()
		.ok()?
		.into_dimensions()
		.ok()
}

mod base64_bytes {
	use base64::Engine as _;
	use base64::engine::general_purpose::STANDARD;
	use serde::{Deserialize, Deserializer, Serializer};

	pub(super) fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&STANDARD.encode(data))
	}

	pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
		let encoded = String::deserialize(deserializer)?;
		STANDARD.decode(encoded).map_err(serde::de::Error::custom)
	}
}
