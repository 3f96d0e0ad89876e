use crate::{BoxFuture, Error, NoteIndex, NoteStore, Result, Store};
use notemaker_domain::{Note, NoteId, NoteQuery, Page, PageRequest, Sort};
use notemaker_storage::{db::Db, qdrant::QdrantStore, queries};

fn primary(err: notemaker_storage::Error) -> Error {
	Error::from_storage(Store::Primary, err)
}

fn index(err: notemaker_storage::Error) -> Error {
	Error::from_storage(Store::Index, err)
}

/// Postgres-backed [`NoteStore`].
pub struct PgNoteStore {
	pub db: Db,
}
impl PgNoteStore {
	pub fn new(db: Db) -> Self {
		Self { db }
	}

	async fn save_note(&self, note: &Note) -> Result<Note> {
		let text = note.text.as_deref();
		let row = match note.id {
			None => queries::insert_note(&self.db.pool, text).await,
			Some(id) => queries::upsert_note(&self.db, id, text).await,
		}
		.map_err(primary)?;

		Ok(row.into())
	}

	async fn page(&self, request: PageRequest, sort: Sort) -> Result<Page<Note>> {
		let (offset, limit) = request.sql_window()?;
		let rows =
			queries::list_notes(&self.db.pool, sort, offset, limit).await.map_err(primary)?;
		let total = queries::count_notes(&self.db.pool).await.map_err(primary)?;
		let items = rows.into_iter().map(Note::from).collect();

		Ok(Page::new(items, u64::try_from(total).unwrap_or_default(), request))
	}
}
impl NoteStore for PgNoteStore {
	fn save<'a>(&'a self, note: &'a Note) -> BoxFuture<'a, Result<Note>> {
		Box::pin(self.save_note(note))
	}

	fn find_by_id(&self, id: NoteId) -> BoxFuture<'_, Result<Option<Note>>> {
		Box::pin(async move {
			let row = queries::find_note(&self.db.pool, id).await.map_err(primary)?;

			Ok(row.map(Note::from))
		})
	}

	fn find_all(&self, request: PageRequest, sort: Sort) -> BoxFuture<'_, Result<Page<Note>>> {
		Box::pin(self.page(request, sort))
	}

	fn delete_by_id(&self, id: NoteId) -> BoxFuture<'_, Result<bool>> {
		Box::pin(async move { queries::delete_note(&self.db.pool, id).await.map_err(primary) })
	}

	fn count(&self) -> BoxFuture<'_, Result<u64>> {
		Box::pin(async move {
			let total = queries::count_notes(&self.db.pool).await.map_err(primary)?;

			Ok(u64::try_from(total).unwrap_or_default())
		})
	}
}

/// Qdrant-backed [`NoteIndex`].
pub struct QdrantNoteIndex {
	pub qdrant: QdrantStore,
}
impl QdrantNoteIndex {
	pub fn new(qdrant: QdrantStore) -> Self {
		Self { qdrant }
	}
}
impl NoteIndex for QdrantNoteIndex {
	fn index<'a>(&'a self, note: &'a Note) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move { self.qdrant.upsert_note(note).await.map_err(index) })
	}

	fn delete_by_id(&self, id: NoteId) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move { self.qdrant.delete_note(id).await.map_err(index) })
	}

	fn query<'a>(
		&'a self,
		query: &'a NoteQuery,
		request: PageRequest,
	) -> BoxFuture<'a, Result<Page<Note>>> {
		Box::pin(async move { self.qdrant.search(query, request).await.map_err(index) })
	}

	fn delete_all(&self) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move { self.qdrant.reset().await.map_err(index) })
	}

	fn find_by_id(&self, id: NoteId) -> BoxFuture<'_, Result<Option<Note>>> {
		Box::pin(async move { self.qdrant.get_note(id).await.map_err(index) })
	}
}
