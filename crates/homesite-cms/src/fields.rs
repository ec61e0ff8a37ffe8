//! Field definitions and validation
//!
//! Page types declare their fields as [`FieldDef`]s. The definitions are the
//! single source for form generation, reference handling on delete and the
//! checks run when a page is written.

use crate::blocks::{StreamBlockDefinition, StreamField};
use crate::media::{ImageId, ImageResolver};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

static SLUG_PATTERN: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"^[-\w]+$").expect("valid slug pattern"));

/// Action taken on a referencing field when the referenced object is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CascadeAction {
	/// Leave the reference untouched
	#[default]
	NoAction,
	/// Refuse to delete while references exist
	Restrict,
	/// Set the reference to null
	SetNull,
	/// Set the reference to its default value
	SetDefault,
	/// Delete the referencing object as well
	Cascade,
}

/// The type of a declared field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
	/// Bounded single-line string
	Char {
		/// Maximum length in characters
		max_length: usize,
	},
	/// Unbounded plain text
	Text,
	/// Slug (letters, digits, hyphens, underscores)
	Slug {
		/// Maximum length in characters
		max_length: usize,
	},
	/// Boolean flag
	Boolean,
	/// Formatted rich text
	RichText,
	/// Reference to an image asset
	ImageReference {
		/// What happens to the reference when the image is deleted
		on_delete: CascadeAction,
	},
	/// Ordered sequence of typed blocks
	Stream(StreamBlockDefinition),
}

/// A declared field of a page type
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
	/// Attribute name
	pub name: &'static str,
	/// Human-readable label
	pub verbose_name: &'static str,
	/// Field type and type-specific constraints
	pub kind: FieldKind,
	/// The field may hold no value at all
	pub null: bool,
	/// The field may be left empty by editors
	pub blank: bool,
	/// Help text shown next to the form input
	pub help_text: Option<&'static str>,
}

impl FieldDef {
	fn new(name: &'static str, kind: FieldKind) -> Self {
		Self {
			name,
			verbose_name: name,
			kind,
			null: false,
			blank: false,
			help_text: None,
		}
	}

	/// Bounded string field
	pub fn char(name: &'static str, max_length: usize) -> Self {
		Self::new(name, FieldKind::Char { max_length })
	}

	/// Unbounded text field
	pub fn text(name: &'static str) -> Self {
		Self::new(name, FieldKind::Text)
	}

	/// Slug field
	pub fn slug(name: &'static str, max_length: usize) -> Self {
		Self::new(name, FieldKind::Slug { max_length })
	}

	/// Boolean field
	pub fn boolean(name: &'static str) -> Self {
		let mut def = Self::new(name, FieldKind::Boolean);
		def.blank = true;
		def
	}

	/// Rich text field
	pub fn rich_text(name: &'static str) -> Self {
		Self::new(name, FieldKind::RichText)
	}

	/// Image reference
	pub fn image(name: &'static str, on_delete: CascadeAction) -> Self {
		Self::new(name, FieldKind::ImageReference { on_delete })
	}

	/// Stream field restricted to the kinds in `definition`
	pub fn stream(name: &'static str, definition: StreamBlockDefinition) -> Self {
		Self::new(name, FieldKind::Stream(definition))
	}

	/// Allow a missing value
	pub fn null(mut self) -> Self {
		self.null = true;
		self
	}

	/// Allow an empty value
	pub fn blank(mut self) -> Self {
		self.blank = true;
		self
	}

	/// Set the label
	pub fn verbose_name(mut self, verbose_name: &'static str) -> Self {
		self.verbose_name = verbose_name;
		self
	}

	/// Set the help text
	pub fn help_text(mut self, help_text: &'static str) -> Self {
		self.help_text = Some(help_text);
		self
	}

	/// Maximum length for string-like fields
	pub fn max_length(&self) -> Option<usize> {
		match self.kind {
			FieldKind::Char { max_length } | FieldKind::Slug { max_length } => Some(max_length),
			_ => None,
		}
	}

	/// Whether editors must supply a value
	pub fn is_required(&self) -> bool {
		!self.blank
	}

	/// On-delete action for reference fields
	pub fn on_delete(&self) -> Option<CascadeAction> {
		match self.kind {
			FieldKind::ImageReference { on_delete } => Some(on_delete),
			_ => None,
		}
	}

	/// Check a string value against this definition.
	///
	/// `None` is only accepted for `null` fields; an empty string only for
	/// `blank` ones. Values longer than `max_length` are rejected as-is.
	pub fn check_str(&self, value: Option<&str>, errors: &mut ValidationErrors) {
		let Some(value) = value else {
			if !self.null && !self.blank {
				errors.add(self.name, ValidationError::Required);
			}
			return;
		};

		if let Some(max) = self.max_length()
			&& let Err(err) = MaxLengthValidator::new(max).validate(value)
		{
			errors.add(self.name, err);
		}

		if value.trim().is_empty() {
			if !self.blank {
				errors.add(self.name, ValidationError::Required);
			}
			return;
		}

		if matches!(self.kind, FieldKind::Slug { .. })
			&& let Err(err) = SlugValidator.validate(value)
		{
			errors.add(self.name, err);
		}
	}

	/// Check an image reference: it must resolve at write time
	pub fn check_image(
		&self,
		value: Option<ImageId>,
		images: &dyn ImageResolver,
		errors: &mut ValidationErrors,
	) {
		match value {
			Some(id) if !images.contains(id) => {
				errors.add(self.name, ValidationError::MissingImage(id));
			}
			Some(_) => {}
			None if !self.null && !self.blank => errors.add(self.name, ValidationError::Required),
			None => {}
		}
	}

	/// Check a stream value: allowed kinds, and non-empty unless blank.
	///
	/// Image blocks are references like any image field and must resolve.
	pub fn check_stream(
		&self,
		value: &StreamField,
		images: &dyn ImageResolver,
		errors: &mut ValidationErrors,
	) {
		let FieldKind::Stream(definition) = &self.kind else {
			return;
		};
		if value.is_empty() && !self.blank {
			errors.add(self.name, ValidationError::Required);
		}
		for err in definition.validate(value) {
			errors.add(self.name, err);
		}
		for id in value.image_ids() {
			if !images.contains(id) {
				errors.add(self.name, ValidationError::MissingImage(id));
			}
		}
	}
}

/// A single validation failure
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationError {
	/// A required value is missing or empty
	#[error("This field is required.")]
	Required,

	/// The value exceeds the maximum length
	#[error("Ensure this value has at most {max} characters (it has {length}).")]
	TooLong {
		/// Actual length in characters
		length: usize,
		/// Allowed maximum
		max: usize,
	},

	/// The value is not a valid slug
	#[error("Enter a valid slug consisting of letters, numbers, underscores or hyphens.")]
	InvalidSlug,

	/// A block kind the stream field does not allow
	#[error("Block type '{block_type}' is not allowed here.")]
	DisallowedBlock {
		/// Name of the rejected block type
		block_type: String,
	},

	/// The value could not be parsed
	#[error("Invalid value: {0}")]
	InvalidValue(String),

	/// An image reference that does not resolve
	#[error("Image {0} does not exist.")]
	MissingImage(ImageId),

	/// A file that is not a supported image
	#[error("Not a supported image file: {0}")]
	InvalidImageFormat(String),
}

/// Validation failures grouped by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors {
	errors: BTreeMap<String, Vec<ValidationError>>,
}

impl ValidationErrors {
	/// An empty error set
	pub fn new() -> Self {
		Self::default()
	}

	/// An error set with one failure
	pub fn single(field: &str, error: ValidationError) -> Self {
		let mut errors = Self::new();
		errors.add(field, error);
		errors
	}

	/// Record a failure for a field
	pub fn add(&mut self, field: &str, error: ValidationError) {
		self.errors.entry(field.to_string()).or_default().push(error);
	}

	/// Merge another error set into this one
	pub fn extend(&mut self, other: ValidationErrors) {
		for (field, errors) in other.errors {
			self.errors.entry(field).or_default().extend(errors);
		}
	}

	/// True when there are no failures
	pub fn is_empty(&self) -> bool {
		self.errors.is_empty()
	}

	/// Failures for one field
	pub fn field(&self, name: &str) -> &[ValidationError] {
		self.errors.get(name).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Names of the fields with failures
	pub fn fields(&self) -> impl Iterator<Item = &str> {
		self.errors.keys().map(String::as_str)
	}

	/// `Ok(())` when empty, otherwise `Err(self)`
	pub fn into_result(self) -> Result<(), ValidationErrors> {
		if self.is_empty() { Ok(()) } else { Err(self) }
	}
}

impl fmt::Display for ValidationErrors {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut first = true;
		for (field, errors) in &self.errors {
			for error in errors {
				if !first {
					f.write_str("; ")?;
				}
				write!(f, "{field}: {error}")?;
				first = false;
			}
		}
		Ok(())
	}
}

/// Trait for validators
pub trait Validator<T: ?Sized> {
	/// Validate a value
	fn validate(&self, value: &T) -> Result<(), ValidationError>;
}

/// Maximum length validator, counting characters rather than bytes
pub struct MaxLengthValidator {
	max: usize,
}

impl MaxLengthValidator {
	/// Creates a new MaxLengthValidator with the specified maximum length.
	///
	/// # Examples
	///
	/// ```
	/// use homesite_cms::fields::{MaxLengthValidator, Validator};
	///
	/// let validator = MaxLengthValidator::new(5);
	/// assert!(validator.validate("héllo").is_ok());
	/// assert!(validator.validate("hello!").is_err());
	/// ```
	pub fn new(max: usize) -> Self {
		Self { max }
	}
}

impl Validator<str> for MaxLengthValidator {
	fn validate(&self, value: &str) -> Result<(), ValidationError> {
		let length = value.chars().count();
		if length <= self.max {
			Ok(())
		} else {
			Err(ValidationError::TooLong {
				length,
				max: self.max,
			})
		}
	}
}

/// Slug validator (unicode word characters and hyphens)
pub struct SlugValidator;

impl Validator<str> for SlugValidator {
	fn validate(&self, value: &str) -> Result<(), ValidationError> {
		if SLUG_PATTERN.is_match(value) {
			Ok(())
		} else {
			Err(ValidationError::InvalidSlug)
		}
	}
}
