use serde::Serialize;

use crate::{Error, NoteService, Result};
use notemaker_config::EmptyQuery;
use notemaker_domain::{Note, NoteId, NoteQuery, Page, PageRequest, Sort};

/// Outcome of the search-index step that follows a committed primary write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IndexSync {
	Synced,
	/// The primary write stands; the index keeps its previous state for this id.
	Stale { reason: String },
}
impl IndexSync {
	pub fn is_stale(&self) -> bool {
		matches!(self, Self::Stale { .. })
	}
}

#[derive(Clone, Debug)]
pub struct Saved {
	pub note: Note,
	/// Whether the write carried no id, so the primary store assigned one.
	pub created: bool,
	pub index: IndexSync,
}

#[derive(Clone, Debug)]
pub struct Deleted {
	pub id: NoteId,
	pub removed: bool,
	pub index: IndexSync,
}

impl NoteService {
	/// Upserts into the primary store, then mirrors the stored record into the search index.
	pub async fn save(&self, note: Note) -> Result<Saved> {
		tracing::debug!(note_id = ?note.id, "Request to save note.");

		if let Some(id) = note.id {
			check_id(id)?;
		}
		if note.text.as_deref().is_some_and(|text| text.contains('\0')) {
			return Err(Error::InvalidRequest {
				message: "Note text must not contain NUL characters.".to_string(),
			});
		}

		let created = note.is_new();
		let stored = self.store.save(&note).await?;
		let Some(note_id) = stored.id else {
			return Err(Error::InvalidState {
				message: "Primary store returned a note without an id.".to_string(),
			});
		};
		let index = match self.index.index(&stored).await {
			Ok(()) => IndexSync::Synced,
			Err(err) => {
				tracing::warn!(note_id, error = %err, "Search index update failed after save.");

				IndexSync::Stale { reason: err.to_string() }
			},
		};

		Ok(Saved { note: stored, created, index })
	}

	pub async fn get(&self, id: NoteId) -> Result<Note> {
		tracing::debug!(note_id = id, "Request to get note.");

		self.store
			.find_by_id(id)
			.await?
			.ok_or_else(|| Error::NotFound { message: format!("Note {id} does not exist.") })
	}

	pub async fn list(&self, request: PageRequest, sort: Sort) -> Result<Page<Note>> {
		tracing::debug!(page = request.page, size = request.size, %sort, "Request to list notes.");

		self.store.find_all(request, sort).await
	}

	/// Removes from the primary store, then from the search index. Deleting a missing id succeeds.
	pub async fn delete(&self, id: NoteId) -> Result<Deleted> {
		tracing::debug!(note_id = id, "Request to delete note.");

		check_id(id)?;

		let removed = self.store.delete_by_id(id).await?;
		let index = match self.index.delete_by_id(id).await {
			Ok(()) => IndexSync::Synced,
			Err(err) => {
				tracing::warn!(
					note_id = id,
					error = %err,
					"Search index removal failed after delete."
				);

				IndexSync::Stale { reason: err.to_string() }
			},
		};

		Ok(Deleted { id, removed, index })
	}

	/// Runs a query-string search against the search index only.
	pub async fn search(&self, query: &str, request: PageRequest) -> Result<Page<Note>> {
		tracing::debug!(
			query,
			page = request.page,
			size = request.size,
			"Request to search notes."
		);

		let parsed = if query.trim().is_empty() {
			match self.settings.empty_query {
				EmptyQuery::MatchAll => NoteQuery::match_all(),
				EmptyQuery::Reject => {
					return Err(Error::InvalidRequest {
						message: "Search query must not be empty.".to_string(),
					});
				},
			}
		} else {
			NoteQuery::parse(query)?
		};

		self.index.query(&parsed, request).await
	}

	/// The search index's copy of a note, if it has one.
	pub async fn indexed(&self, id: NoteId) -> Result<Option<Note>> {
		self.index.find_by_id(id).await
	}

	pub async fn count(&self) -> Result<u64> {
		self.store.count().await
	}
}

// Ids below 1 are never assigned, so neither store can hold them.
fn check_id(id: NoteId) -> Result<()> {
	if id < 1 {
		return Err(Error::InvalidRequest { message: "Note id must be positive.".to_string() });
	}

	Ok(())
}
