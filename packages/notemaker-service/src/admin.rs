use serde::{Deserialize, Serialize};

use crate::{NoteService, Result};
use notemaker_domain::{PageRequest, Sort};

const REINDEX_BATCH_SIZE: u32 = 100;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ReindexReport {
	pub indexed_count: u64,
	pub error_count: u64,
}

impl NoteService {
	/// Rebuilds the search index from the primary store. Per-note index failures are counted and
	/// skipped; failures to clear the index or read the primary store abort the rebuild.
	pub async fn reindex(&self) -> Result<ReindexReport> {
		let mut report = ReindexReport::default();

		self.index.delete_all().await?;

		for page in 0.. {
			let request = PageRequest::new(page, REINDEX_BATCH_SIZE)?;
			let batch = self.store.find_all(request, Sort::default()).await?;

			if batch.items.is_empty() {
				break;
			}

			for note in &batch.items {
				match self.index.index(note).await {
					Ok(()) => report.indexed_count += 1,
					Err(err) => {
						tracing::warn!(note_id = ?note.id, error = %err, "Reindex skipped note.");

						report.error_count += 1;
					},
				}
			}

			if !batch.has_next() {
				break;
			}
		}

		tracing::info!(
			indexed_count = report.indexed_count,
			error_count = report.error_count,
			"Search index rebuilt."
		);

		Ok(report)
	}
}
