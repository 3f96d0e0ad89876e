use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

pub type NoteId = i64;

/// A persisted note. Equality is by identity: only two notes that both carry the same id are
/// equal, and a note without an id equals nothing else.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Note {
	pub id: Option<NoteId>,
	pub text: Option<String>,
}
impl Note {
	pub fn new(id: Option<NoteId>, text: Option<String>) -> Self {
		Self { id, text }
	}

	pub fn with_text(text: impl Into<String>) -> Self {
		Self { id: None, text: Some(text.into()) }
	}

	pub fn with_id(mut self, id: NoteId) -> Self {
		self.id = Some(id);

		self
	}

	pub fn is_new(&self) -> bool {
		self.id.is_none()
	}

	/// Field-by-field comparison, for checking that a mirrored copy matches its source.
	pub fn same_fields(&self, other: &Self) -> bool {
		self.id == other.id && self.text == other.text
	}
}
impl PartialEq for Note {
	fn eq(&self, other: &Self) -> bool {
		identity_eq(self.id, other.id)
	}
}
impl Hash for Note {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id.hash(state);
	}
}

/// Transport shape of [`Note`]. Same fields, same identity rule.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NoteDto {
	#[serde(default)]
	pub id: Option<NoteId>,
	#[serde(default)]
	pub text: Option<String>,
}
impl PartialEq for NoteDto {
	fn eq(&self, other: &Self) -> bool {
		identity_eq(self.id, other.id)
	}
}
impl Hash for NoteDto {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id.hash(state);
	}
}

// Not reflexive for `None`, so neither type implements `Eq`.
fn identity_eq(left: Option<NoteId>, right: Option<NoteId>) -> bool {
	match (left, right) {
		(Some(left), Some(right)) => left == right,
		_ => false,
	}
}
