//! In-process backends. Each one can be switched offline to simulate an unreachable store.

use std::{
	cmp::Ordering as CmpOrdering,
	collections::BTreeMap,
	sync::{
		Mutex, MutexGuard,
		atomic::{AtomicBool, Ordering},
	},
};

use crate::{BoxFuture, Error, NoteIndex, NoteStore, Result, Store};
use notemaker_domain::{Note, NoteId, NoteQuery, Page, PageRequest, Sort, SortDirection, SortField};

#[derive(Default)]
pub struct MemoryNoteStore {
	state: Mutex<StoreState>,
	offline: AtomicBool,
}
impl MemoryNoteStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn set_offline(&self, offline: bool) {
		self.offline.store(offline, Ordering::SeqCst);
	}

	pub fn len(&self) -> usize {
		self.lock().notes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn lock(&self) -> MutexGuard<'_, StoreState> {
		self.state.lock().unwrap_or_else(|err| err.into_inner())
	}

	fn check(&self) -> Result<()> {
		if self.offline.load(Ordering::SeqCst) {
			return Err(Error::unavailable(Store::Primary, "Primary store is offline."));
		}

		Ok(())
	}

	fn save_now(&self, note: &Note) -> Result<Note> {
		self.check()?;

		let mut state = self.lock();
		let id = match note.id {
			Some(id) => id,
			None => state.next_id,
		};
		let stored = Note::new(Some(id), note.text.clone());

		state.next_id = state.next_id.max(id.saturating_add(1));
		state.notes.insert(id, stored.clone());

		Ok(stored)
	}

	fn page_now(&self, request: PageRequest, sort: Sort) -> Result<Page<Note>> {
		self.check()?;

		let state = self.lock();
		let mut notes = state.notes.values().cloned().collect::<Vec<_>>();

		notes.sort_by(|left, right| compare(left, right, sort));

		Ok(slice(notes, request))
	}
}
impl NoteStore for MemoryNoteStore {
	fn save<'a>(&'a self, note: &'a Note) -> BoxFuture<'a, Result<Note>> {
		let result = self.save_now(note);

		Box::pin(async move { result })
	}

	fn find_by_id(&self, id: NoteId) -> BoxFuture<'_, Result<Option<Note>>> {
		let result = self.check().map(|()| self.lock().notes.get(&id).cloned());

		Box::pin(async move { result })
	}

	fn find_all(&self, request: PageRequest, sort: Sort) -> BoxFuture<'_, Result<Page<Note>>> {
		let result = self.page_now(request, sort);

		Box::pin(async move { result })
	}

	fn delete_by_id(&self, id: NoteId) -> BoxFuture<'_, Result<bool>> {
		let result = self.check().map(|()| self.lock().notes.remove(&id).is_some());

		Box::pin(async move { result })
	}

	fn count(&self) -> BoxFuture<'_, Result<u64>> {
		let result = self.check().map(|()| self.len() as u64);

		Box::pin(async move { result })
	}
}

struct StoreState {
	next_id: NoteId,
	notes: BTreeMap<NoteId, Note>,
}
impl Default for StoreState {
	fn default() -> Self {
		Self { next_id: 1, notes: BTreeMap::new() }
	}
}

#[derive(Default)]
pub struct MemoryNoteIndex {
	notes: Mutex<BTreeMap<NoteId, Note>>,
	offline: AtomicBool,
}
impl MemoryNoteIndex {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn set_offline(&self, offline: bool) {
		self.offline.store(offline, Ordering::SeqCst);
	}

	pub fn len(&self) -> usize {
		self.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn lock(&self) -> MutexGuard<'_, BTreeMap<NoteId, Note>> {
		self.notes.lock().unwrap_or_else(|err| err.into_inner())
	}

	fn check(&self) -> Result<()> {
		if self.offline.load(Ordering::SeqCst) {
			return Err(Error::unavailable(Store::Index, "Search index is offline."));
		}

		Ok(())
	}

	fn index_now(&self, note: &Note) -> Result<()> {
		self.check()?;

		let id = note.id.ok_or_else(|| Error::InvalidRequest {
			message: "Indexed notes must carry an id.".to_string(),
		})?;

		self.lock().insert(id, note.clone());

		Ok(())
	}

	fn query_now(&self, query: &NoteQuery, request: PageRequest) -> Result<Page<Note>> {
		self.check()?;

		let matches = self.lock().values().filter(|note| query.matches(note)).cloned().collect();

		Ok(slice(matches, request))
	}
}
impl NoteIndex for MemoryNoteIndex {
	fn index<'a>(&'a self, note: &'a Note) -> BoxFuture<'a, Result<()>> {
		let result = self.index_now(note);

		Box::pin(async move { result })
	}

	fn delete_by_id(&self, id: NoteId) -> BoxFuture<'_, Result<()>> {
		let result = self.check().map(|()| {
			self.lock().remove(&id);
		});

		Box::pin(async move { result })
	}

	fn query<'a>(
		&'a self,
		query: &'a NoteQuery,
		request: PageRequest,
	) -> BoxFuture<'a, Result<Page<Note>>> {
		let result = self.query_now(query, request);

		Box::pin(async move { result })
	}

	fn delete_all(&self) -> BoxFuture<'_, Result<()>> {
		let result = self.check().map(|()| self.lock().clear());

		Box::pin(async move { result })
	}

	fn find_by_id(&self, id: NoteId) -> BoxFuture<'_, Result<Option<Note>>> {
		let result = self.check().map(|()| self.lock().get(&id).cloned());

		Box::pin(async move { result })
	}
}

fn compare(left: &Note, right: &Note, sort: Sort) -> CmpOrdering {
	let ordering = match sort.field {
		SortField::Id => left.id.cmp(&right.id),
		SortField::Text => left.text.cmp(&right.text).then_with(|| left.id.cmp(&right.id)),
	};

	match sort.direction {
		SortDirection::Asc => ordering,
		SortDirection::Desc => ordering.reverse(),
	}
}

fn slice(notes: Vec<Note>, request: PageRequest) -> Page<Note> {
	let total = notes.len() as u64;
	let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
	let items = notes.into_iter().skip(offset).take(request.size as usize).collect();

	Page::new(items, total, request)
}
