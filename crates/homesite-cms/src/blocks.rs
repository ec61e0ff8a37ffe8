//! Stream field content blocks
//!
//! A [`StreamField`] is an ordered sequence of typed blocks. Each block is
//! either rich text or an image reference; the kinds a field accepts are fixed
//! by its [`StreamBlockDefinition`] when the page type is declared.
//!
//! Blocks serialize as `{"type": "text", "value": "<p>..</p>", "id": "..."}`,
//! preserving both kind and order.

use crate::error::{CmsError, CmsResult};
use crate::fields::ValidationError;
use crate::html;
use crate::media::{ImageId, ImageResolver};
use crate::rich_text::RichText;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Block identifier, stable across edits
pub type BlockId = Uuid;

/// The kinds of content block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
	/// Rich text
	Text,
	/// Image reference
	Image,
}

impl BlockKind {
	/// The type tag used in serialized blocks
	pub fn as_str(&self) -> &'static str {
		match self {
			BlockKind::Text => "text",
			BlockKind::Image => "image",
		}
	}

	/// Parse a type tag
	pub fn from_name(name: &str) -> Option<Self> {
		match name {
			"text" => Some(BlockKind::Text),
			"image" => Some(BlockKind::Image),
			_ => None,
		}
	}
}

impl fmt::Display for BlockKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// The payload of a block. It is always present while the block exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
	/// Rich text markup
	Text(RichText),
	/// Reference to an image asset
	Image(ImageId),
}

impl ContentBlock {
	/// Text block from markup
	pub fn text(markup: impl Into<String>) -> Self {
		ContentBlock::Text(RichText::new(markup))
	}

	/// Image block
	pub fn image(id: ImageId) -> Self {
		ContentBlock::Image(id)
	}

	/// Kind of this block
	pub fn kind(&self) -> BlockKind {
		match self {
			ContentBlock::Text(_) => BlockKind::Text,
			ContentBlock::Image(_) => BlockKind::Image,
		}
	}

	fn value_json(&self) -> JsonValue {
		match self {
			ContentBlock::Text(text) => JsonValue::String(text.as_str().to_string()),
			ContentBlock::Image(id) => JsonValue::String(id.to_string()),
		}
	}

	fn from_parts(block_type: &str, value: JsonValue) -> Result<Self, String> {
		let kind = BlockKind::from_name(block_type)
			.ok_or_else(|| format!("unknown block type '{block_type}'"))?;
		match (kind, value) {
			(BlockKind::Text, JsonValue::String(markup)) => Ok(ContentBlock::text(markup)),
			(BlockKind::Image, JsonValue::String(id)) => Uuid::parse_str(&id)
				.map(ContentBlock::Image)
				.map_err(|e| format!("invalid image id '{id}': {e}")),
			(kind, JsonValue::Null) => Err(format!("block '{kind}' requires a value")),
			(kind, other) => Err(format!("invalid value for block '{kind}': {other}")),
		}
	}
}

/// A block instance in a StreamField
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawStreamBlock", into = "RawStreamBlock")]
pub struct StreamBlock {
	/// Block id
	pub id: BlockId,

	/// Block content
	pub content: ContentBlock,
}

impl StreamBlock {
	/// New block with a fresh id
	pub fn new(content: ContentBlock) -> Self {
		Self {
			id: Uuid::new_v4(),
			content,
		}
	}

	/// Kind of this block
	pub fn kind(&self) -> BlockKind {
		self.content.kind()
	}
}

#[derive(Serialize, Deserialize)]
struct RawStreamBlock {
	#[serde(rename = "type")]
	block_type: String,
	#[serde(default)]
	value: JsonValue,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	id: Option<BlockId>,
}

impl TryFrom<RawStreamBlock> for StreamBlock {
	type Error = String;

	fn try_from(raw: RawStreamBlock) -> Result<Self, Self::Error> {
		let content = ContentBlock::from_parts(&raw.block_type, raw.value)?;
		Ok(Self {
			// Blocks submitted without an id (new in the editor) get one here.
			id: raw.id.unwrap_or_else(Uuid::new_v4),
			content,
		})
	}
}

impl From<StreamBlock> for RawStreamBlock {
	fn from(block: StreamBlock) -> Self {
		Self {
			block_type: block.kind().as_str().to_string(),
			value: block.content.value_json(),
			id: Some(block.id),
		}
	}
}

/// StreamField containing an ordered sequence of blocks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamField {
	blocks: Vec<StreamBlock>,
}

impl StreamField {
	/// Create a new empty StreamField
	pub fn new() -> Self {
		Self { blocks: Vec::new() }
	}

	/// Build a field from contents, in order
	pub fn from_contents(contents: impl IntoIterator<Item = ContentBlock>) -> Self {
		Self {
			blocks: contents.into_iter().map(StreamBlock::new).collect(),
		}
	}

	/// Append a block, returning its id
	pub fn push(&mut self, content: ContentBlock) -> BlockId {
		let block = StreamBlock::new(content);
		let id = block.id;
		self.blocks.push(block);
		id
	}

	/// Insert a block at `position` (0 ..= len)
	pub fn insert(&mut self, position: usize, content: ContentBlock) -> CmsResult<BlockId> {
		if position > self.blocks.len() {
			return Err(CmsError::InvalidPosition {
				position,
				len: self.blocks.len(),
			});
		}
		let block = StreamBlock::new(content);
		let id = block.id;
		self.blocks.insert(position, block);
		Ok(id)
	}

	/// Remove a block by id
	pub fn remove(&mut self, id: BlockId) -> CmsResult<StreamBlock> {
		let index = self.index_of(id)?;
		Ok(self.blocks.remove(index))
	}

	/// Move a block to `position` (0 .. len), shifting the others
	pub fn move_block(&mut self, id: BlockId, position: usize) -> CmsResult<()> {
		let index = self.index_of(id)?;
		if position >= self.blocks.len() {
			return Err(CmsError::InvalidPosition {
				position,
				len: self.blocks.len(),
			});
		}
		let block = self.blocks.remove(index);
		self.blocks.insert(position, block);
		Ok(())
	}

	/// Replace the content of a block, keeping its id and position
	pub fn replace(&mut self, id: BlockId, content: ContentBlock) -> CmsResult<()> {
		let index = self.index_of(id)?;
		self.blocks[index].content = content;
		Ok(())
	}

	/// Get a block by id
	pub fn get(&self, id: BlockId) -> Option<&StreamBlock> {
		self.blocks.iter().find(|b| b.id == id)
	}

	/// Get all blocks
	pub fn blocks(&self) -> &[StreamBlock] {
		&self.blocks
	}

	/// Iterate over blocks in order
	pub fn iter(&self) -> std::slice::Iter<'_, StreamBlock> {
		self.blocks.iter()
	}

	/// Number of blocks
	pub fn len(&self) -> usize {
		self.blocks.len()
	}

	/// True when there are no blocks
	pub fn is_empty(&self) -> bool {
		self.blocks.is_empty()
	}

	/// Ids of all images referenced by image blocks, in block order
	pub fn image_ids(&self) -> Vec<ImageId> {
		self.blocks
			.iter()
			.filter_map(|b| match b.content {
				ContentBlock::Image(id) => Some(id),
				ContentBlock::Text(_) => None,
			})
			.collect()
	}

	/// Render all blocks to HTML
	pub fn render(&self, library: &BlockLibrary, images: &dyn ImageResolver) -> CmsResult<String> {
		let mut html = String::new();
		for block in &self.blocks {
			html.push_str(&library.render(&block.content, images)?);
		}
		Ok(html)
	}

	fn index_of(&self, id: BlockId) -> CmsResult<usize> {
		self.blocks
			.iter()
			.position(|b| b.id == id)
			.ok_or_else(|| CmsError::BlockNotFound(id.to_string()))
	}
}

impl<'a> IntoIterator for &'a StreamField {
	type Item = &'a StreamBlock;
	type IntoIter = std::slice::Iter<'a, StreamBlock>;

	fn into_iter(self) -> Self::IntoIter {
		self.blocks.iter()
	}
}

/// The block kinds a stream field accepts, declared with the page type
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamBlockDefinition {
	children: Vec<(&'static str, BlockKind)>,
}

impl StreamBlockDefinition {
	/// A definition accepting nothing yet
	pub fn new() -> Self {
		Self::default()
	}

	/// Accept a block kind under the given name
	pub fn child(mut self, name: &'static str, kind: BlockKind) -> Self {
		self.children.retain(|(n, _)| *n != name);
		self.children.push((name, kind));
		self
	}

	/// Whether blocks of `kind` are accepted
	pub fn allows(&self, kind: BlockKind) -> bool {
		self.children.iter().any(|(_, k)| *k == kind)
	}

	/// Declared child names and kinds, in declaration order
	pub fn children(&self) -> &[(&'static str, BlockKind)] {
		&self.children
	}

	/// Validation failures for blocks this definition does not accept
	pub fn validate(&self, field: &StreamField) -> Vec<ValidationError> {
		field
			.iter()
			.filter(|b| !self.allows(b.kind()))
			.map(|b| ValidationError::DisallowedBlock {
				block_type: b.kind().as_str().to_string(),
			})
			.collect()
	}
}

/// Renderer for one kind of block
pub trait Block: Send + Sync {
	/// The kind this renderer handles
	fn block_type(&self) -> BlockKind;

	/// Render a block of this kind to HTML
	fn render(&self, content: &ContentBlock, images: &dyn ImageResolver) -> CmsResult<String>;
}

/// Renders text blocks as their markup
#[derive(Debug, Clone, Default)]
pub struct TextBlock;

impl Block for TextBlock {
	fn block_type(&self) -> BlockKind {
		BlockKind::Text
	}

	fn render(&self, content: &ContentBlock, _images: &dyn ImageResolver) -> CmsResult<String> {
		match content {
			ContentBlock::Text(text) => Ok(text.as_str().to_string()),
			other => Err(CmsError::UnknownBlockType(other.kind().to_string())),
		}
	}
}

/// Renders image blocks as `<img>` tags under a media URL
#[derive(Debug, Clone)]
pub struct ImageBlock {
	media_url: String,
}

impl ImageBlock {
	/// Renderer resolving image files under `media_url`
	pub fn new(media_url: impl Into<String>) -> Self {
		Self {
			media_url: media_url.into(),
		}
	}
}

impl Block for ImageBlock {
	fn block_type(&self) -> BlockKind {
		BlockKind::Image
	}

	fn render(&self, content: &ContentBlock, images: &dyn ImageResolver) -> CmsResult<String> {
		let ContentBlock::Image(id) = content else {
			return Err(CmsError::UnknownBlockType(content.kind().to_string()));
		};
		// A deleted image renders as nothing; the block itself stays.
		let Some(image) = images.resolve(*id) else {
			tracing::debug!(image_id = %id, "skipping image block with missing image");
			return Ok(String::new());
		};

		let mut tag = format!(
			r#"<img src="{}" alt="{}""#,
			html::escape(&image.url(&self.media_url)),
			html::escape(&image.title)
		);
		if let (Some(width), Some(height)) = (image.width, image.height) {
			tag.push_str(&format!(r#" width="{width}" height="{height}""#));
		}
		tag.push('>');
		Ok(tag)
	}
}

/// Registry of block renderers
pub struct BlockLibrary {
	blocks: HashMap<BlockKind, Box<dyn Block>>,
}

impl BlockLibrary {
	/// Create a new, empty block library
	pub fn new() -> Self {
		Self {
			blocks: HashMap::new(),
		}
	}

	/// Library with the text and image renderers
	pub fn standard(media_url: impl Into<String>) -> Self {
		let mut library = Self::new();
		library.register(TextBlock);
		library.register(ImageBlock::new(media_url));
		library
	}

	/// Register a renderer, replacing any previous one for the same kind
	pub fn register<B: Block + 'static>(&mut self, block: B) {
		self.blocks.insert(block.block_type(), Box::new(block));
	}

	/// Render one block
	pub fn render(&self, content: &ContentBlock, images: &dyn ImageResolver) -> CmsResult<String> {
		let renderer = self
			.blocks
			.get(&content.kind())
			.ok_or_else(|| CmsError::UnknownBlockType(content.kind().to_string()))?;
		renderer.render(content, images)
	}
}

impl Default for BlockLibrary {
	fn default() -> Self {
		Self::new()
	}
}
