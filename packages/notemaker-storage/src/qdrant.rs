pub const BM25_VECTOR_NAME: &str = "bm25";
pub const BM25_MODEL: &str = "qdrant/bm25";
pub const TEXT_FIELD: &str = "text";
pub const NOTE_ID_FIELD: &str = "note_id";

use std::collections::HashMap;

use qdrant_client::{
	Payload, Qdrant, QdrantError,
	qdrant::{
		CollectionExistsRequest, Condition, CountPointsBuilder, CreateCollectionBuilder,
		CreateFieldIndexCollection, DeletePointsBuilder, Document, FieldType, Filter,
		GetPointsBuilder, Modifier, PointId, PointStruct, PointsIdsList, Query, QueryPointsBuilder,
		SparseVectorParamsBuilder, SparseVectorsConfigBuilder, UpsertPointsBuilder, Value, Vector,
		VectorsConfigBuilder, point_id::PointIdOptions, value::Kind,
	},
};
use serde_json::Value as JsonValue;

use crate::{Error, Result};
use notemaker_domain::{Note, NoteId, NoteQuery, Page, PageRequest, Term};

pub struct QdrantStore {
	pub client: Qdrant,
	pub collection: String,
}
impl QdrantStore {
	pub fn new(cfg: &notemaker_config::Qdrant) -> Result<Self> {
		let client = Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone() })
	}

	/// Creates the collection and its payload indexes when it does not exist yet.
	pub async fn ensure_collection(&self) -> Result<()> {
		let request = CollectionExistsRequest { collection_name: self.collection.clone() };

		if self.client.collection_exists(request).await? {
			return Ok(());
		}

		self.create_collection().await
	}

	/// Drops every point by recreating the collection.
	pub async fn reset(&self) -> Result<()> {
		if let Err(err) = self.client.delete_collection(self.collection.clone()).await
			&& !is_not_found_error(&err)
		{
			return Err(err.into());
		}

		self.create_collection().await
	}

	pub async fn upsert_note(&self, note: &Note) -> Result<()> {
		let id = note
			.id
			.ok_or_else(|| Error::InvalidArgument("Indexed notes must carry an id.".to_string()))?;
		let payload = Payload::from(note_payload(id, note));
		let point = PointStruct::new(point_id(id)?, note_vectors(note), payload);

		self.client
			.upsert_points(UpsertPointsBuilder::new(self.collection.clone(), vec![point]).wait(true))
			.await?;

		Ok(())
	}

	/// Removing an id that was never indexed is not an error.
	pub async fn delete_note(&self, id: NoteId) -> Result<()> {
		let points = PointsIdsList { ids: vec![point_id(id)?] };
		let delete = DeletePointsBuilder::new(self.collection.clone()).points(points).wait(true);

		match self.client.delete_points(delete).await {
			Ok(_) => Ok(()),
			Err(err) if is_not_found_error(&err) => Ok(()),
			Err(err) => Err(err.into()),
		}
	}

	pub async fn get_note(&self, id: NoteId) -> Result<Option<Note>> {
		let request =
			GetPointsBuilder::new(self.collection.clone(), vec![point_id(id)?]).with_payload(true);
		let response = self.client.get_points(request).await?;

		Ok(response
			.result
			.into_iter()
			.next()
			.map(|point| note_from_payload(point.id.as_ref(), &point.payload)))
	}

	pub async fn search(&self, query: &NoteQuery, request: PageRequest) -> Result<Page<Note>> {
		let plan = query.plan();

		if plan.matches_nothing {
			return Ok(Page::empty(request));
		}

		let filter = Filter {
			must: plan.required.iter().map(term_condition).collect(),
			should: plan.optional.iter().map(term_condition).collect(),
			must_not: plan.excluded.iter().map(term_condition).collect(),
			..Default::default()
		};
		let count_request =
			CountPointsBuilder::new(self.collection.clone()).filter(filter.clone()).exact(true);
		let count = self.client.count(count_request).await?;
		let total = count.result.map(|result| result.count).unwrap_or(0);
		let expected = total.saturating_sub(request.offset()).min(u64::from(request.size));

		if expected == 0 {
			return Ok(Page::new(Vec::new(), total, request));
		}

		let ranking_text = match query.ranking_text() {
			Some(text) if self.ranks_every_match(&filter, &text, total).await? => Some(text),
			_ => None,
		};
		let items = self
			.fetch(filter, request.offset(), u64::from(request.size), ranking_text)
			.await?;

		Ok(Page::new(items, total, request))
	}

	/// Whether bm25 scores every one of the `total` filter matches. Decided per query, never per
	/// page, so all pages of one search share an order.
	async fn ranks_every_match(&self, filter: &Filter, text: &str, total: u64) -> Result<bool> {
		let last = self
			.fetch(filter.clone(), total.saturating_sub(1), 1, Some(text.to_string()))
			.await?;

		Ok(!last.is_empty())
	}

	async fn fetch(
		&self,
		filter: Filter,
		offset: u64,
		limit: u64,
		ranking_text: Option<String>,
	) -> Result<Vec<Note>> {
		let mut builder = QueryPointsBuilder::new(self.collection.clone())
			.filter(filter)
			.offset(offset)
			.limit(limit)
			.with_payload(true);

		if let Some(text) = ranking_text {
			builder = builder
				.query(Query::new_nearest(Document::new(text, BM25_MODEL)))
				.using(BM25_VECTOR_NAME);
		}

		let response = self.client.query(builder).await?;

		Ok(response
			.result
			.iter()
			.map(|point| note_from_payload(point.id.as_ref(), &point.payload))
			.collect())
	}

	async fn create_collection(&self) -> Result<()> {
		let mut sparse_vectors_config = SparseVectorsConfigBuilder::default();

		sparse_vectors_config.add_named_vector_params(
			BM25_VECTOR_NAME,
			SparseVectorParamsBuilder::default().modifier(Modifier::Idf as i32),
		);

		let builder = CreateCollectionBuilder::new(self.collection.clone())
			.vectors_config(VectorsConfigBuilder::default())
			.sparse_vectors_config(sparse_vectors_config);

		self.client.create_collection(builder).await?;

		for (field_name, field_type) in
			[(TEXT_FIELD, FieldType::Text), (NOTE_ID_FIELD, FieldType::Integer)]
		{
			let request = CreateFieldIndexCollection {
				collection_name: self.collection.clone(),
				wait: Some(true),
				field_name: field_name.to_string(),
				field_type: Some(field_type as i32),
				field_index_params: None,
				ordering: None,
			};

			self.client.create_field_index(request).await?;
		}

		Ok(())
	}
}

fn point_id(id: NoteId) -> Result<PointId> {
	let id = u64::try_from(id)
		.map_err(|_| Error::InvalidArgument(format!("Note id {id} cannot be indexed.")))?;

	Ok(PointId::from(id))
}

fn note_payload(id: NoteId, note: &Note) -> HashMap<String, Value> {
	let mut payload = HashMap::new();

	payload.insert(NOTE_ID_FIELD.to_string(), Value::from(id));
	payload.insert(
		TEXT_FIELD.to_string(),
		note.text
			.as_ref()
			.map(|text| Value::from(text.clone()))
			.unwrap_or_else(|| Value::from(JsonValue::Null)),
	);

	payload
}

fn note_vectors(note: &Note) -> HashMap<String, Vector> {
	let mut vectors = HashMap::new();

	if let Some(text) = note.text.as_ref().filter(|text| !text.trim().is_empty()) {
		vectors.insert(
			BM25_VECTOR_NAME.to_string(),
			Vector::from(Document::new(text.clone(), BM25_MODEL)),
		);
	}

	vectors
}

fn term_condition(term: &Term) -> Condition {
	match term {
		Term::Id(id) => Condition::matches(NOTE_ID_FIELD, *id),
		Term::Text(value) => Condition::matches_text(TEXT_FIELD, value.clone()),
		// Plans never carry `All`; an empty filter matches every point.
		Term::All => Condition::from(Filter::default()),
	}
}

fn note_from_payload(fallback_id: Option<&PointId>, payload: &HashMap<String, Value>) -> Note {
	let id = match payload.get(NOTE_ID_FIELD).and_then(|value| value.kind.as_ref()) {
		Some(Kind::IntegerValue(id)) => Some(*id),
		_ => fallback_id.and_then(|point_id| match point_id.point_id_options.as_ref() {
			Some(PointIdOptions::Num(id)) => NoteId::try_from(*id).ok(),
			_ => None,
		}),
	};
	let text = match payload.get(TEXT_FIELD).and_then(|value| value.kind.as_ref()) {
		Some(Kind::StringValue(text)) => Some(text.clone()),
		_ => None,
	};

	Note::new(id, text)
}

fn is_not_found_error(err: &QdrantError) -> bool {
	let message = err.to_string().to_lowercase();

	message.contains("not found") || message.contains("404") || message.contains("doesn't exist")
}
