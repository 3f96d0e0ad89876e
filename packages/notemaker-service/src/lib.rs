pub mod admin;
pub mod backends;
pub mod memory;
pub mod notes;

mod error;

pub use admin::ReindexReport;
pub use backends::{PgNoteStore, QdrantNoteIndex};
pub use error::{Error, Result, Store};
pub use notes::{Deleted, IndexSync, Saved};

use std::{future::Future, pin::Pin, sync::Arc};

use notemaker_config::{Config, EmptyQuery};
use notemaker_domain::{Note, NoteId, NoteQuery, Page, PageLimits, PageRequest, Sort};
use notemaker_storage::{db::Db, qdrant::QdrantStore};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Authoritative note storage.
pub trait NoteStore
where
	Self: Send + Sync,
{
	/// Inserts when `note.id` is absent, otherwise replaces or inserts under that id. Returns the
	/// stored record.
	fn save<'a>(&'a self, note: &'a Note) -> BoxFuture<'a, Result<Note>>;

	fn find_by_id(&self, id: NoteId) -> BoxFuture<'_, Result<Option<Note>>>;

	fn find_all(&self, request: PageRequest, sort: Sort) -> BoxFuture<'_, Result<Page<Note>>>;

	/// Returns whether a record was removed; a missing id is not an error.
	fn delete_by_id(&self, id: NoteId) -> BoxFuture<'_, Result<bool>>;

	fn count(&self) -> BoxFuture<'_, Result<u64>>;
}

/// Query-optimized mirror of the primary store. May lag behind it.
pub trait NoteIndex
where
	Self: Send + Sync,
{
	fn index<'a>(&'a self, note: &'a Note) -> BoxFuture<'a, Result<()>>;

	fn delete_by_id(&self, id: NoteId) -> BoxFuture<'_, Result<()>>;

	fn query<'a>(
		&'a self,
		query: &'a NoteQuery,
		request: PageRequest,
	) -> BoxFuture<'a, Result<Page<Note>>>;

	fn delete_all(&self) -> BoxFuture<'_, Result<()>>;

	fn find_by_id(&self, id: NoteId) -> BoxFuture<'_, Result<Option<Note>>>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Settings {
	pub page_limits: PageLimits,
	pub empty_query: EmptyQuery,
}
impl Settings {
	pub fn from_config(cfg: &Config) -> Self {
		Self {
			page_limits: PageLimits {
				default_size: cfg.pagination.default_page_size,
				max_size: cfg.pagination.max_page_size,
			},
			empty_query: cfg.search.empty_query,
		}
	}
}

pub struct NoteService {
	pub settings: Settings,
	store: Arc<dyn NoteStore>,
	index: Arc<dyn NoteIndex>,
}
impl NoteService {
	pub fn new(cfg: &Config, db: Db, qdrant: QdrantStore) -> Self {
		Self::with_backends(
			Settings::from_config(cfg),
			Arc::new(PgNoteStore::new(db)),
			Arc::new(QdrantNoteIndex::new(qdrant)),
		)
	}

	pub fn with_backends(
		settings: Settings,
		store: Arc<dyn NoteStore>,
		index: Arc<dyn NoteIndex>,
	) -> Self {
		Self { settings, store, index }
	}

	/// Resolves raw paging parameters against the configured defaults and cap.
	pub fn page_request(&self, page: Option<u32>, size: Option<u32>) -> Result<PageRequest> {
		Ok(PageRequest::resolve(page, size, self.settings.page_limits)?)
	}
}
