use std::sync::Arc;

use notemaker_config::Config;
use notemaker_service::NoteService;
use notemaker_storage::{db::Db, qdrant::QdrantStore};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<NoteService>,
}
impl AppState {
	/// Connects both stores and prepares their schema before serving.
	pub async fn new(config: Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let qdrant = QdrantStore::new(&config.storage.qdrant)?;

		qdrant.ensure_collection().await?;

		Ok(Self::from_service(NoteService::new(&config, db, qdrant)))
	}

	pub fn from_service(service: NoteService) -> Self {
		Self { service: Arc::new(service) }
	}
}
